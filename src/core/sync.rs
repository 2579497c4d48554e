//! Pull, scoped commit and push of the pack directory
//!
//! One run walks the states
//! `Start → Pulled → {CleanExit, NoScopedChangesExit, Committing → Pushing → Done}`,
//! with `CommittingFailed` / `PushingFailed` ending the run with an error.
//! A failed pull is only a warning; a failed push ends the run. At most one
//! commit and one push attempt happen per run.

use secrecy::SecretString;
use tracing::{debug, warn};

use crate::core::changes::ChangeSet;
use crate::core::config::Config;
use crate::core::git::GitRepository;
use crate::core::input::InputProvider;
use crate::core::remote::AuthenticatedRemote;
use crate::core::transport::Transport;
use crate::error::{FailureKind, PackSyncError, Result};

/// What a sync run needs to know about the deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Top-level directory whose changes are committed
    pub pack_dir: String,
    /// Remote pulled from and pushed to
    pub remote: String,
    /// Message used when the input provides none
    pub default_message: String,
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            pack_dir: config.pack_dir.clone(),
            remote: config.remote.clone(),
            default_message: config.default_message.clone(),
        }
    }
}

/// State of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Start,
    Pulled,
    CleanExit,
    NoScopedChangesExit,
    Committing,
    CommittingFailed,
    Pushing,
    PushingFailed,
    Done,
}

/// Result of the pull leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullStatus {
    Pulled,
    /// Pull failed and the run continued; holds the user-facing reason
    Failed(String),
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing changed anywhere in the working copy
    Clean,
    /// Only paths outside the pack changed; they were left alone
    OutOfScopeOnly { paths: Vec<String> },
    /// The pack was committed and the branch pushed
    CommittedAndPushed { commit: String, files: Vec<String> },
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub branch: String,
    pub pull: PullStatus,
    pub outcome: SyncOutcome,
}

/// Sequences one sync run
pub struct SyncOrchestrator<'a> {
    repo: &'a GitRepository,
    remote: AuthenticatedRemote<'a>,
    transport: &'a dyn Transport,
    input: &'a dyn InputProvider,
    token: SecretString,
    settings: SyncSettings,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        repo: &'a GitRepository,
        transport: &'a dyn Transport,
        input: &'a dyn InputProvider,
        token: SecretString,
        settings: SyncSettings,
    ) -> Self {
        Self {
            repo,
            remote: AuthenticatedRemote::new(repo, settings.remote.as_str()),
            transport,
            input,
            token,
            settings,
        }
    }

    /// Token-free remote URL left unrestored by this run, if any
    ///
    /// `Some` means the token may still be persisted in `.git/config`,
    /// whether the run itself succeeded or failed.
    pub fn unrestored_url(&self) -> Option<String> {
        self.remote.unrestored_url()
    }

    /// Run the sync to completion
    pub fn run(&self) -> Result<SyncReport> {
        let branch = self.repo.current_branch()?;
        let pack = self.settings.pack_dir.as_str();

        enter(SyncState::Start);
        let pull = self.pull(&branch)?;
        enter(SyncState::Pulled);

        let changes = ChangeSet::scan(self.repo)?;
        let report = |outcome| SyncReport {
            branch: branch.clone(),
            pull: pull.clone(),
            outcome,
        };

        if changes.is_clean() {
            enter(SyncState::CleanExit);
            return Ok(report(SyncOutcome::Clean));
        }

        let scoped = changes.scoped_changes(pack);
        if scoped.is_empty() {
            enter(SyncState::NoScopedChangesExit);
            let paths = changes.files().iter().map(|f| f.path.clone()).collect();
            return Ok(report(SyncOutcome::OutOfScopeOnly { paths }));
        }

        enter(SyncState::Committing);
        let commit = self.commit(pack).inspect_err(|_| enter(SyncState::CommittingFailed))?;
        self.warn_if_behind(&branch);

        enter(SyncState::Pushing);
        self.push(&branch)
            .inspect_err(|_| enter(SyncState::PushingFailed))?;
        enter(SyncState::Done);

        Ok(report(SyncOutcome::CommittedAndPushed {
            commit,
            files: scoped,
        }))
    }

    fn pull(&self, branch: &str) -> Result<PullStatus> {
        let result = self
            .remote
            .with_authenticated_remote(&self.token, |name| self.transport.pull(name, branch));

        match result {
            Ok(()) => Ok(PullStatus::Pulled),
            Err(e @ PackSyncError::RemoteNotFound(_)) => Err(e),
            Err(e) => {
                let e = as_transport_failure(e, self.remote.name(), false);
                warn!("{}\nContinuing without the latest remote changes.", e);
                Ok(PullStatus::Failed(e.to_string()))
            }
        }
    }

    fn commit(&self, pack: &str) -> Result<String> {
        let message = self
            .input
            .commit_message()?
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.settings.default_message.clone());

        self.repo
            .stage_directory(pack)
            .and_then(|()| self.repo.commit_directory(pack, &message))
            .map_err(|e| match e {
                PackSyncError::NothingToCommit(_) => e,
                other => PackSyncError::CommitFailed(other.to_string()),
            })
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.remote
            .with_authenticated_remote(&self.token, |name| self.transport.push(name, branch))
            .map_err(|e| match e {
                PackSyncError::RemoteNotFound(_) => e,
                other => as_transport_failure(other, self.remote.name(), true),
            })
    }

    /// Warn before pushing when the remote-tracking branch has commits we lack
    fn warn_if_behind(&self, branch: &str) {
        match self.repo.branch_status(&self.settings.remote, branch) {
            Ok(Some((_, behind))) if behind > 0 => warn!(
                "'{}' is {} commit(s) behind {}/{}; the push will likely be rejected.",
                branch, behind, self.settings.remote, branch
            ),
            Ok(_) => {}
            Err(e) => debug!("could not compare with the remote branch: {}", e),
        }
    }
}

fn enter(state: SyncState) {
    debug!(?state, "sync state");
}

/// Keep pull/push failures as they are; wrap anything else that surfaced
/// during a network leg
fn as_transport_failure(err: PackSyncError, remote: &str, push: bool) -> PackSyncError {
    match err {
        PackSyncError::PullFailed { .. } if !push => err,
        PackSyncError::PushFailed { .. } if push => err,
        other => {
            let detail = other.to_string();
            let remote = remote.to_string();
            if push {
                PackSyncError::PushFailed {
                    remote,
                    kind: FailureKind::Other,
                    detail,
                }
            } else {
                PackSyncError::PullFailed {
                    remote,
                    kind: FailureKind::Other,
                    detail,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::PresetInput;
    use crate::core::test_support::{
        commit_count, commit_paths, git_config_text, init_repo, persisted_origin_url, write_file,
        ORIGIN_URL,
    };
    use crate::core::transport::MockTransport;
    use crate::error::ErrorClass;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    const TOKEN: &str = "ghp_sync_test_token";

    fn settings() -> SyncSettings {
        SyncSettings::from(&Config::default())
    }

    fn unreachable(remote: &str) -> PackSyncError {
        PackSyncError::PullFailed {
            remote: remote.to_string(),
            kind: FailureKind::Unreachable,
            detail: "Could not resolve host: host".into(),
        }
    }

    fn rejected(remote: &str) -> PackSyncError {
        PackSyncError::PushFailed {
            remote: remote.to_string(),
            kind: FailureKind::Rejected,
            detail: "! [rejected] main -> main (fetch first)".into(),
        }
    }

    /// Transport that records the persisted URL at each call
    fn recording_transport(
        root: &Path,
        pull_ok: bool,
        push_ok: bool,
    ) -> (MockTransport, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut transport = MockTransport::new();

        let pull_root: PathBuf = root.to_path_buf();
        let pull_seen = Arc::clone(&seen);
        transport.expect_pull().times(1).returning(move |remote, _| {
            pull_seen
                .lock()
                .unwrap()
                .push(persisted_origin_url(&pull_root));
            if pull_ok {
                Ok(())
            } else {
                Err(unreachable(remote))
            }
        });

        let push_root: PathBuf = root.to_path_buf();
        let push_seen = Arc::clone(&seen);
        transport.expect_push().returning(move |remote, _| {
            push_seen
                .lock()
                .unwrap()
                .push(persisted_origin_url(&push_root));
            if push_ok {
                Ok(())
            } else {
                Err(rejected(remote))
            }
        });

        (transport, seen)
    }

    fn run(
        repo_root: &Path,
        transport: &MockTransport,
        input: &PresetInput,
        token: &str,
    ) -> Result<SyncReport> {
        let git = GitRepository::discover(repo_root).unwrap();
        let orchestrator = SyncOrchestrator::new(
            &git,
            transport,
            input,
            SecretString::from(token),
            settings(),
        );
        orchestrator.run()
    }

    #[test]
    fn test_clean_working_copy_is_a_noop() {
        let (dir, repo) = init_repo();
        let mut transport = MockTransport::new();
        transport.expect_pull().times(1).returning(|_, _| Ok(()));
        transport.expect_push().times(0);

        let report = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap();

        assert_eq!(report.outcome, SyncOutcome::Clean);
        assert_eq!(report.pull, PullStatus::Pulled);
        assert_eq!(commit_count(&repo), 1);
    }

    #[test]
    fn test_out_of_scope_changes_are_left_alone() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "README.md", "edited outside the pack");
        let mut transport = MockTransport::new();
        transport.expect_pull().times(1).returning(|_, _| Ok(()));
        transport.expect_push().times(0);

        let report = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap();

        assert_eq!(
            report.outcome,
            SyncOutcome::OutOfScopeOnly {
                paths: vec!["README.md".to_string()]
            }
        );
        assert_eq!(commit_count(&repo), 1);

        let git = GitRepository::discover(dir.path()).unwrap();
        let readme = git.changed_files().unwrap();
        assert_eq!(readme.len(), 1);
        assert!(readme[0].is_modified && !readme[0].is_staged);
    }

    #[test]
    fn test_new_pack_file_is_committed_and_pushed_with_token() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "pack/new.txt", "fresh");
        let (transport, seen) = recording_transport(dir.path(), true, true);

        let report = run(dir.path(), &transport, &PresetInput::default(), "T").unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                "https://T@host/user/repo.git".to_string(),
                "https://T@host/user/repo.git".to_string(),
            ]
        );
        assert_eq!(persisted_origin_url(dir.path()), ORIGIN_URL);
        assert_eq!(commit_count(&repo), 2);
        assert_eq!(commit_paths(&repo), vec!["pack/new.txt".to_string()]);

        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("Update pack"));

        match report.outcome {
            SyncOutcome::CommittedAndPushed { commit, files } => {
                assert_eq!(commit, head.id().to_string());
                assert_eq!(files, vec!["pack/new.txt".to_string()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_pull_failure_still_commits_and_push_failure_aborts() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "pack/new.txt", "fresh");
        let (transport, seen) = recording_transport(dir.path(), false, false);

        let err = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap_err();

        assert_eq!(err.class(), ErrorClass::FatalNetwork);
        assert!(matches!(err, PackSyncError::PushFailed { .. }));
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(commit_count(&repo), 2);
        assert_eq!(persisted_origin_url(dir.path()), ORIGIN_URL);
        assert!(!git_config_text(&repo).contains(TOKEN));
    }

    #[test]
    fn test_pull_failure_is_reported_on_success() {
        let (dir, _repo) = init_repo();
        write_file(dir.path(), "pack/new.txt", "fresh");
        let (transport, _seen) = recording_transport(dir.path(), false, true);

        let report = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap();

        match report.pull {
            PullStatus::Failed(reason) => assert!(reason.contains("Could not resolve host")),
            PullStatus::Pulled => panic!("pull should have failed"),
        }
        assert!(matches!(
            report.outcome,
            SyncOutcome::CommittedAndPushed { .. }
        ));
    }

    #[test]
    fn test_only_pack_changes_enter_the_commit() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "pack/base.txt", "changed");
        write_file(dir.path(), "README.md", "also changed");
        write_file(dir.path(), "scratch.txt", "untracked");
        let (transport, _seen) = recording_transport(dir.path(), true, true);

        run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap();

        assert_eq!(commit_paths(&repo), vec!["pack/base.txt".to_string()]);

        let git = GitRepository::discover(dir.path()).unwrap();
        let mut left: Vec<String> = git
            .changed_files()
            .unwrap()
            .into_iter()
            .map(|f| f.path)
            .collect();
        left.sort();
        assert_eq!(left, vec!["README.md", "scratch.txt"]);
    }

    #[test]
    fn test_second_run_is_clean() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "pack/new.txt", "fresh");
        let mut transport = MockTransport::new();
        transport.expect_pull().times(2).returning(|_, _| Ok(()));
        transport.expect_push().times(1).returning(|_, _| Ok(()));

        let first = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap();
        let second = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap();

        assert!(matches!(first.outcome, SyncOutcome::CommittedAndPushed { .. }));
        assert_eq!(second.outcome, SyncOutcome::Clean);
        assert_eq!(commit_count(&repo), 2);
    }

    #[test]
    fn test_commit_message_from_input() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "pack/new.txt", "fresh");
        let (transport, _seen) = recording_transport(dir.path(), true, true);
        let input = PresetInput::new(None, Some("  Add new level \n".to_string()));

        run(dir.path(), &transport, &input, TOKEN).unwrap();

        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("Add new level"));
    }

    #[test]
    fn test_blank_commit_message_uses_default() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "pack/new.txt", "fresh");
        let (transport, _seen) = recording_transport(dir.path(), true, true);
        let input = PresetInput::new(None, Some("   ".to_string()));

        run(dir.path(), &transport, &input, TOKEN).unwrap();

        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("Update pack"));
    }

    #[test]
    fn test_commit_failure_stops_before_push() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "pack/new.txt", "fresh");
        fs::write(repo.path().join("index.lock"), "").unwrap();

        let mut transport = MockTransport::new();
        transport.expect_pull().times(1).returning(|_, _| Ok(()));
        transport.expect_push().times(0);

        let err = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap_err();

        assert!(matches!(err, PackSyncError::CommitFailed(_)));
        assert_eq!(err.class(), ErrorClass::LocalState);
        assert_eq!(commit_count(&repo), 1);
        assert_eq!(persisted_origin_url(dir.path()), ORIGIN_URL);
    }

    #[test]
    fn test_detached_head_fails_before_any_network_call() {
        let (dir, repo) = init_repo();
        let head = repo.head().unwrap().target().unwrap();
        repo.set_head_detached(head).unwrap();

        let mut transport = MockTransport::new();
        transport.expect_pull().times(0);
        transport.expect_push().times(0);

        let err = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap_err();
        assert!(matches!(err, PackSyncError::DetachedHead));
    }

    #[test]
    fn test_missing_remote_is_a_configuration_error() {
        let (dir, repo) = init_repo();
        repo.remote_delete("origin").unwrap();
        write_file(dir.path(), "pack/new.txt", "fresh");

        let mut transport = MockTransport::new();
        transport.expect_pull().times(0);
        transport.expect_push().times(0);

        let err = run(dir.path(), &transport, &PresetInput::default(), TOKEN).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Configuration);
        assert_eq!(commit_count(&repo), 1);
    }

    #[test]
    fn test_as_transport_failure_wraps_foreign_errors() {
        let wrapped = as_transport_failure(PackSyncError::Config("locked".into()), "origin", true);
        assert!(matches!(
            wrapped,
            PackSyncError::PushFailed { kind: FailureKind::Other, .. }
        ));

        let kept = as_transport_failure(unreachable("origin"), "origin", false);
        assert!(matches!(
            kept,
            PackSyncError::PullFailed { kind: FailureKind::Unreachable, .. }
        ));
    }

    #[test]
    fn test_unrestored_url_is_surfaced_after_successful_push() {
        let (dir, _repo) = init_repo();
        write_file(dir.path(), "pack/new.txt", "fresh");
        let lock = dir.path().join(".git").join("config.lock");

        let mut transport = MockTransport::new();
        transport.expect_pull().times(1).returning(|_, _| Ok(()));
        let push_lock = lock.clone();
        transport.expect_push().times(1).returning(move |_, _| {
            fs::write(&push_lock, "").unwrap();
            Ok(())
        });

        let git = GitRepository::discover(dir.path()).unwrap();
        let input = PresetInput::default();
        let orchestrator = SyncOrchestrator::new(
            &git,
            &transport,
            &input,
            SecretString::from(TOKEN),
            settings(),
        );

        let report = orchestrator.run().unwrap();
        assert!(matches!(report.outcome, SyncOutcome::CommittedAndPushed { .. }));
        assert_eq!(orchestrator.unrestored_url().as_deref(), Some(ORIGIN_URL));

        fs::remove_file(&lock).unwrap();
    }

    #[test]
    fn test_clean_run_leaves_nothing_unrestored() {
        let (dir, _repo) = init_repo();
        let transport = {
            let mut t = MockTransport::new();
            t.expect_pull().times(1).returning(|_, _| Ok(()));
            t.expect_push().times(0);
            t
        };

        let git = GitRepository::discover(dir.path()).unwrap();
        let input = PresetInput::default();
        let orchestrator = SyncOrchestrator::new(
            &git,
            &transport,
            &input,
            SecretString::from(TOKEN),
            settings(),
        );

        orchestrator.run().unwrap();
        assert_eq!(orchestrator.unrestored_url(), None);
    }

    #[test]
    fn test_pack_name_with_glob_characters_is_committed() {
        let (dir, repo) = init_repo();
        write_file(dir.path(), "pack[1]/item.txt", "item");

        let mut transport = MockTransport::new();
        transport.expect_pull().times(1).returning(|_, _| Ok(()));
        transport.expect_push().times(1).returning(|_, _| Ok(()));

        let git = GitRepository::discover(dir.path()).unwrap();
        let input = PresetInput::default();
        let orchestrator = SyncOrchestrator::new(
            &git,
            &transport,
            &input,
            SecretString::from(TOKEN),
            SyncSettings {
                pack_dir: "pack[1]".to_string(),
                ..settings()
            },
        );

        let report = orchestrator.run().unwrap();
        match report.outcome {
            SyncOutcome::CommittedAndPushed { files, .. } => {
                assert_eq!(files, vec!["pack[1]/item.txt".to_string()]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(commit_paths(&repo), vec!["pack[1]/item.txt".to_string()]);
    }
}
