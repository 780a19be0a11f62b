//! Core types shared across the protocol

use serde::{Deserialize, Serialize};

/// Lifecycle event kind reported by an assistant hook process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "claude-needs-input")]
    NeedsInput,
    #[serde(rename = "claude-finished")]
    Finished,
}

/// Payload POSTed to the relay's `/notification` endpoint.
///
/// Built from untrusted local input; an unknown `type` or a missing
/// `worktree` fails deserialization and the request is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub worktree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// In-app event delivered to the UI shell: the raw notification plus the
/// display name derived from the worktree path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiNotification {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub worktree: String,
    #[serde(rename = "projectName")]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One entry of `git worktree list --porcelain` output.
///
/// Recomputed on every listing request; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorktreeRecord {
    /// Absolute path of the worktree checkout
    pub path: String,
    /// Commit id the worktree is checked out at
    pub head: String,
    /// Branch ref the worktree has checked out
    pub branch: String,
}

/// Result of a successful `worktree add`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorktree {
    pub path: String,
    pub branch: String,
}
