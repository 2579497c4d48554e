//! Repository fixtures shared by the unit tests

use std::fs;
use std::path::Path;

use git2::{IndexAddOption, Repository, RepositoryInitOptions};
use tempfile::TempDir;

/// Remote URL every fixture repository starts with
pub const ORIGIN_URL: &str = "https://host/user/repo.git";

/// Write a file relative to the repository root, creating parent directories
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Repository on `main` with one commit holding `README.md` and
/// `pack/base.txt`, and an `origin` remote at [`ORIGIN_URL`]
pub fn init_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(dir.path(), &opts).unwrap();

    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }

    write_file(dir.path(), "README.md", "# Test Project");
    write_file(dir.path(), "pack/base.txt", "base");

    {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = repo.signature().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
    }

    repo.remote("origin", ORIGIN_URL).unwrap();
    (dir, repo)
}

/// Number of commits reachable from HEAD
pub fn commit_count(repo: &Repository) -> usize {
    let mut walk = repo.revwalk().unwrap();
    walk.push_head().unwrap();
    walk.count()
}

/// Paths changed by the HEAD commit relative to its first parent
pub fn commit_paths(repo: &Repository) -> Vec<String> {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    let tree = head.tree().unwrap();
    let parent_tree = head.parent(0).ok().map(|p| p.tree().unwrap());

    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .unwrap();
    let mut paths: Vec<String> = diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    paths.sort();
    paths
}

/// Raw text of `.git/config`
pub fn git_config_text(repo: &Repository) -> String {
    fs::read_to_string(repo.path().join("config")).unwrap()
}

/// URL currently persisted for `origin`, read through a fresh handle
pub fn persisted_origin_url(root: &Path) -> String {
    let repo = Repository::open(root).unwrap();
    let remote = repo.find_remote("origin").unwrap();
    remote.url().unwrap().to_string()
}
