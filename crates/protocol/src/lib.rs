//! Arbor Protocol
//!
//! Shared types for communication between the Arbor core and its clients:
//! the loopback notification payload posted by assistant hook processes,
//! the in-app event delivered to the UI shell, and the worktree records
//! returned by the git bridge. Everything here is serialized as JSON.

pub mod types;

pub use types::*;
