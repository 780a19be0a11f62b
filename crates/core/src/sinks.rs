//! Collaborator boundaries for notification delivery.
//!
//! The relay never owns the UI surface. It holds a `Weak` handle and
//! upgrades it at dispatch time, so the listener lifecycle and the window
//! lifecycle stay uncoupled; a window being torn down concurrently with a
//! dispatch resolves to "absent" rather than a dangling reference.

use arbor_protocol::UiNotification;

/// UI surface consumed by the relay.
///
/// Uses `#[async_trait]` (Send) so implementations can be held as
/// `Arc<dyn UiContext>` across tasks.
#[async_trait::async_trait]
pub trait UiContext: Send + Sync {
    /// Whether the user wants desktop notifications. This crosses into
    /// UI-owned execution and may fail; the relay treats a failure as
    /// "enabled".
    async fn notifications_enabled(&self) -> anyhow::Result<bool>;

    /// Deliver an in-app event. Fire-and-forget; a failure is logged by
    /// the caller and otherwise dropped.
    fn deliver_notification(&self, notification: UiNotification) -> anyhow::Result<()>;

    /// Bring the shell to the foreground and select the given worktree.
    fn focus_worktree(&self, worktree_path: &str) -> anyhow::Result<()>;
}

/// Desktop notification presenter.
pub trait DesktopNotifier: Send + Sync {
    /// Present a notification; `on_click` fires if the user interacts
    /// with it.
    fn show(
        &self,
        title: &str,
        body: &str,
        on_click: Box<dyn FnOnce() + Send + 'static>,
    ) -> anyhow::Result<()>;
}
