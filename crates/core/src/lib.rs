//! Arbor Core
//!
//! The event-relay and worktree-state core of Arbor, a desktop coordinator
//! that runs one coding-assistant session per git worktree. The windowing
//! shell consumes this crate: it calls the git bridge to populate worktree
//! lists, runs hook injection at startup and when a project is opened, and
//! hands the relay a desktop notifier plus a weak handle to itself for
//! event delivery.

pub mod git;
pub mod hooks;
pub mod logging;
pub mod relay;
pub mod sinks;
pub mod worktree_parser;

pub use relay::{NotificationRelay, DEFAULT_RELAY_PORT};
pub use sinks::{DesktopNotifier, UiContext};
