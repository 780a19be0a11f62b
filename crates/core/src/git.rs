//! Git worktree bridge: subprocess invocation and error translation.
//!
//! Each operation spawns its own `git` process rooted at the project path
//! and runs to completion independently. Nothing is serialized between
//! concurrent calls; two simultaneous adds may race at the filesystem
//! level, which git itself arbitrates.

use std::path::{Path, PathBuf};
use std::process::Output;

use thiserror::Error;
use tokio::process::Command;

use arbor_protocol::{NewWorktree, WorktreeRecord};

use crate::worktree_parser::parse_worktree_list;

/// Errors surfaced to the UI layer by worktree operations
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{0}")]
    QueryFailed(String),

    #[error("{0}")]
    CreateFailed(String),
}

async fn run_git(args: &[&str], cwd: &Path) -> Result<Output, std::io::Error> {
    Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .await
}

fn stderr_or(output: &Output, fallback: &str) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        fallback.to_string()
    } else {
        stderr.to_string()
    }
}

/// List the worktrees of the repository at `project_path`.
pub async fn list_worktrees(project_path: &Path) -> Result<Vec<WorktreeRecord>, WorktreeError> {
    let output = run_git(&["worktree", "list", "--porcelain"], project_path).await?;
    if !output.status.success() {
        return Err(WorktreeError::QueryFailed(stderr_or(
            &output,
            "Failed to list worktrees",
        )));
    }
    Ok(parse_worktree_list(&String::from_utf8_lossy(&output.stdout)))
}

/// Where a new worktree for `branch` lives: a sibling of the project
/// directory named `<project-basename>-<branch>`.
fn sibling_worktree_path(project_path: &Path, branch: &str) -> PathBuf {
    let basename = project_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = format!("{basename}-{branch}");
    match project_path.parent() {
        Some(parent) => parent.join(dir),
        None => PathBuf::from(dir),
    }
}

/// Create a worktree with a new branch checked out at a sibling path.
///
/// No rollback is attempted if git partially succeeds; callers re-list to
/// reconcile.
pub async fn add_worktree(
    project_path: &Path,
    branch: &str,
) -> Result<NewWorktree, WorktreeError> {
    let worktree_path = sibling_worktree_path(project_path, branch);
    let path_str = worktree_path.to_string_lossy().into_owned();

    let output = run_git(&["worktree", "add", "-b", branch, &path_str], project_path).await?;
    if !output.status.success() {
        return Err(WorktreeError::CreateFailed(stderr_or(
            &output,
            "Failed to create worktree",
        )));
    }

    Ok(NewWorktree {
        path: path_str,
        branch: branch.to_string(),
    })
}
