#![allow(dead_code)]

use anyhow::{ensure, Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;

/// Run a git command inside `repo_path`, ensuring it succeeds.
pub fn git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let output = std::process::Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    ensure!(
        output.status.success(),
        "git command failed: git {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(output)
}

/// Trimmed stdout of a git command.
pub fn git_stdout(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = git(repo_path, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Write a file relative to `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// A working copy on `main` pushed to a bare `origin`, plus a config file path.
pub struct Fixture {
    pub temp: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
    pub config: PathBuf,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let work = temp.path().join("work");
        let remote = temp.path().join("remote.git");
        let config = temp.path().join("pack-sync").join("config.toml");

        fs::create_dir_all(&remote)?;
        git(&remote, &["init", "--bare"])?;
        git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"])?;

        fs::create_dir_all(&work)?;
        git(&work, &["init"])?;
        git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
        git(&work, &["config", "user.email", "test@example.com"])?;
        git(&work, &["config", "user.name", "Test User"])?;

        write_file(&work, "README.md", "# Test Project")?;
        write_file(&work, "pack/base.txt", "base")?;
        git(&work, &["add", "."])?;
        git(&work, &["commit", "-m", "Initial commit"])?;

        let remote_url = remote.to_string_lossy().to_string();
        git(&work, &["remote", "add", "origin", &remote_url])?;
        git(&work, &["push", "origin", "main"])?;

        Ok(Self {
            temp,
            work,
            remote,
            config,
        })
    }

    /// `pack-sync` running in the working copy with an isolated config.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("pack-sync").expect("pack-sync binary");
        cmd.current_dir(&self.work);
        cmd.arg("--config").arg(&self.config);
        cmd.env_remove("GITHUB_TOKEN");
        cmd.env_remove("PACK_SYNC_CONFIG");
        for proxy in ["http_proxy", "https_proxy", "HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "all_proxy"] {
            cmd.env_remove(proxy);
        }
        cmd
    }

    /// Same as [`Fixture::command`] with a token in the environment.
    pub fn command_with_token(&self, token: &str) -> Command {
        let mut cmd = self.command();
        cmd.env("GITHUB_TOKEN", token);
        cmd
    }

    pub fn origin_url(&self) -> Result<String> {
        git_stdout(&self.work, &["config", "--get", "remote.origin.url"])
    }

    pub fn local_commit_count(&self) -> Result<usize> {
        Ok(git_stdout(&self.work, &["rev-list", "--count", "HEAD"])?.parse()?)
    }

    pub fn remote_head_subject(&self) -> Result<String> {
        git_stdout(&self.remote, &["log", "-1", "--format=%s", "main"])
    }

    pub fn remote_head_files(&self) -> Result<Vec<String>> {
        let out = git_stdout(
            &self.remote,
            &["show", "--name-only", "--format=", "main"],
        )?;
        Ok(out.lines().map(str::to_string).collect())
    }
}
