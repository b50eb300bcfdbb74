use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::diff::StagedDiff;
use crate::domain::message::CommitMessage;
use crate::error::{AppError, AppResult};
use crate::services::VersionControlService;

const GIT_PROGRAM: &str = "git";

/// Shells out to the system `git`, inheriting the user's config and hooks.
pub struct GitCli {
    workspace_root: PathBuf,
    program: String,
}

impl GitCli {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self::with_program(workspace_root, GIT_PROGRAM)
    }

    pub fn with_program(workspace_root: PathBuf, program: &str) -> Self {
        Self {
            workspace_root,
            program: program.to_string(),
        }
    }

    async fn run(&self, dir: &Path, args: &[String]) -> AppResult<Output> {
        debug!(?args, dir = %dir.display(), program = %self.program, "running git");
        Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(spawn_error)
    }

    /// Top level of the work tree containing `workspace_root`.
    async fn repository_root(&self) -> AppResult<PathBuf> {
        if which::which(&self.program).is_err() {
            return Err(AppError::VcsUnavailable(format!(
                "{} executable not found on PATH",
                self.program
            )));
        }

        let output = self
            .run(
                &self.workspace_root,
                &["rev-parse".to_string(), "--show-toplevel".to_string()],
            )
            .await?;
        if !output.status.success() {
            return Err(rev_parse_error(&String::from_utf8_lossy(&output.stderr)));
        }
        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(AppError::NotARepository);
        }
        Ok(PathBuf::from(root))
    }
}

#[async_trait]
impl VersionControlService for GitCli {
    async fn staged_diff(&self, excluded_paths: &[String]) -> AppResult<StagedDiff> {
        let root = self.repository_root().await?;

        let mut args = vec![
            "diff".to_string(),
            "--staged".to_string(),
            "--".to_string(),
            ".".to_string(),
        ];
        args.extend(excluded_paths.iter().map(|path| exclude_pathspec(path)));

        let output = self.run(&root, &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::VersionControl(format!(
                "git diff --staged failed: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(chars = text.chars().count(), "collected staged diff");
        Ok(StagedDiff::new(text))
    }

    async fn commit(&self, message: &CommitMessage) -> AppResult<String> {
        let root = self.repository_root().await?;
        let args = [
            "commit".to_string(),
            "-m".to_string(),
            message.as_str().to_string(),
        ];

        let output = self.run(&root, &args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let details = [stderr, stdout]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(AppError::CommitFailed(details));
        }
        Ok(stdout)
    }
}

/// Bare names match at any depth; paths with a slash are anchored at the root.
fn exclude_pathspec(path: &str) -> String {
    let path = path.trim_start_matches("./");
    if path.contains('/') {
        format!(":(exclude,glob){}", path.trim_start_matches('/'))
    } else {
        format!(":(exclude,glob)**/{path}")
    }
}

/// Only git's own "not a git repository" refusal means we are outside a work
/// tree; anything else (e.g. `safe.directory`) is reported verbatim.
fn rev_parse_error(stderr: &str) -> AppError {
    let stderr = stderr.trim();
    if stderr.to_lowercase().contains("not a git repository") {
        AppError::NotARepository
    } else {
        AppError::VersionControl(format!("git rev-parse failed: {stderr}"))
    }
}

fn spawn_error(err: io::Error) -> AppError {
    if err.kind() == io::ErrorKind::NotFound {
        AppError::VcsUnavailable(err.to_string())
    } else {
        AppError::Io(err)
    }
}
