//! Loopback notification relay.
//!
//! Assistant hook processes POST lifecycle events here. The relay
//! validates the untrusted payload, correlates it to the originating
//! worktree, and fans it out to the desktop notifier and the UI shell.
//! The hook process is blocked on the HTTP response, so the relay answers
//! as soon as the payload is accepted and does sink work on its own task;
//! nothing a sink does can fail the response or crash the listener.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use arbor_protocol::{EventKind, NotificationEvent, UiNotification};

use crate::sinks::{DesktopNotifier, UiContext};

/// Default relay port. The injected hook commands always target this
/// port, even when the relay itself fell back to a higher one.
pub const DEFAULT_RELAY_PORT: u16 = 7878;

/// Delay between bind attempts while the target port is taken.
const BIND_RETRY_DELAY: Duration = Duration::from_secs(1);

enum ListenerState {
    Stopped,
    Starting,
    Listening {
        port: u16,
        shutdown: oneshot::Sender<()>,
    },
}

/// Loopback listener turning hook POSTs into desktop and in-app
/// notifications.
pub struct NotificationRelay {
    base_port: u16,
    state: Mutex<ListenerState>,
    shared: Arc<RelayShared>,
}

struct RelayShared {
    ui: RwLock<Option<Weak<dyn UiContext>>>,
    notifier: Arc<dyn DesktopNotifier>,
}

impl RelayShared {
    fn ui_handle(&self) -> Option<Weak<dyn UiContext>> {
        self.ui.read().expect("ui context lock poisoned").clone()
    }

    fn live_ui(&self) -> Option<Arc<dyn UiContext>> {
        self.ui_handle().and_then(|weak| weak.upgrade())
    }
}

impl NotificationRelay {
    pub fn new(notifier: Arc<dyn DesktopNotifier>) -> Self {
        Self::with_base_port(DEFAULT_RELAY_PORT, notifier)
    }

    /// Like [`NotificationRelay::new`], starting the port search at
    /// `base_port`.
    pub fn with_base_port(base_port: u16, notifier: Arc<dyn DesktopNotifier>) -> Self {
        Self {
            base_port,
            state: Mutex::new(ListenerState::Stopped),
            shared: Arc::new(RelayShared {
                ui: RwLock::new(None),
                notifier,
            }),
        }
    }

    /// Replace (or clear) the UI context used for preference queries and
    /// event delivery. Callable at any time relative to [`start`].
    ///
    /// [`start`]: NotificationRelay::start
    pub fn set_ui_context(&self, ctx: Option<Weak<dyn UiContext>>) {
        *self.shared.ui.write().expect("ui context lock poisoned") = ctx;
    }

    /// Port currently listened on, if any.
    pub fn local_port(&self) -> Option<u16> {
        match *self.state.lock().expect("listener state lock poisoned") {
            ListenerState::Listening { port, .. } => Some(port),
            _ => None,
        }
    }

    /// Bind the loopback listener and serve. No-op when already starting
    /// or listening.
    ///
    /// A port that is already in use moves the search to the next port
    /// after a fixed delay, indefinitely. Any other bind error (say,
    /// permission denied) is fatal for the relay and propagates; the host
    /// process decides what to do with it.
    pub async fn start(&self) -> anyhow::Result<()> {
        {
            let mut state = self.state.lock().expect("listener state lock poisoned");
            if !matches!(*state, ListenerState::Stopped) {
                return Ok(());
            }
            *state = ListenerState::Starting;
        }

        let mut port = self.base_port;
        let listener = loop {
            match TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await {
                Ok(listener) => break listener,
                Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
                    warn!(port, "relay port in use, moving to the next one");
                    port += 1;
                    tokio::time::sleep(BIND_RETRY_DELAY).await;
                }
                Err(err) => {
                    *self.state.lock().expect("listener state lock poisoned") =
                        ListenerState::Stopped;
                    return Err(err)
                        .with_context(|| format!("binding relay listener on 127.0.0.1:{port}"));
                }
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let serve = axum::serve(listener, router(self.shared.clone()))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
        let handle = tokio::spawn(async move {
            if let Err(err) = serve.await {
                warn!(error = %err, "relay listener exited with error");
            }
        });

        let mut state = self.state.lock().expect("listener state lock poisoned");
        if !matches!(*state, ListenerState::Starting) {
            // stop() won the race while we were binding
            let _ = shutdown_tx.send(());
            handle.abort();
            return Ok(());
        }
        info!(port, "notification relay listening on 127.0.0.1");
        *state = ListenerState::Listening {
            port,
            shutdown: shutdown_tx,
        };
        Ok(())
    }

    /// Close the listener if open. Idempotent, safe when never started.
    pub fn stop(&self) {
        let mut state = self.state.lock().expect("listener state lock poisoned");
        match std::mem::replace(&mut *state, ListenerState::Stopped) {
            ListenerState::Listening { port, shutdown } => {
                let _ = shutdown.send(());
                info!(port, "notification relay stopped");
            }
            ListenerState::Starting | ListenerState::Stopped => {}
        }
    }
}

fn router(shared: Arc<RelayShared>) -> Router {
    // Callers are local unauthenticated processes, so the policy is
    // deliberately permissive.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/notification", post(handle_notification).fallback(fallback))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared)
}

/// Everything except `POST /notification`: pre-flight OPTIONS gets an
/// empty 200, the rest a plain 404.
async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        (StatusCode::NOT_FOUND, "Not found").into_response()
    }
}

async fn handle_notification(
    State(shared): State<Arc<RelayShared>>,
    body: Bytes,
) -> Response {
    let event: NotificationEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            debug!(error = %err, "rejecting malformed notification payload");
            return invalid_payload();
        }
    };
    if event.worktree.trim().is_empty() {
        debug!("rejecting notification payload with empty worktree");
        return invalid_payload();
    }

    tokio::spawn(dispatch(shared, event));

    (StatusCode::OK, Json(json!({ "success": true }))).into_response()
}

fn invalid_payload() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid payload" })),
    )
        .into_response()
}

/// Fan a validated event out to the desktop notifier and the UI shell.
async fn dispatch(shared: Arc<RelayShared>, event: NotificationEvent) {
    let project_name = project_name_from_path(&event.worktree);
    let ui = shared.live_ui();

    // A preference we cannot read counts as enabled.
    let enabled = match &ui {
        Some(ctx) => ctx.notifications_enabled().await.unwrap_or_else(|err| {
            debug!(error = %err, "notification preference query failed, defaulting to enabled");
            true
        }),
        None => true,
    };

    if enabled {
        let (title, default_body) = match event.kind {
            EventKind::NeedsInput => ("Claude needs your input", "Waiting for your response"),
            EventKind::Finished => ("Claude finished", "Task completed"),
        };
        let body = format!(
            "{project_name}: {}",
            event.message.as_deref().unwrap_or(default_body)
        );

        let click_ui = shared.ui_handle();
        let worktree = event.worktree.clone();
        let on_click = Box::new(move || {
            if let Some(ctx) = click_ui.and_then(|weak| weak.upgrade()) {
                if let Err(err) = ctx.focus_worktree(&worktree) {
                    warn!(error = %err, worktree, "failed to focus worktree from notification");
                }
            }
        });
        if let Err(err) = shared.notifier.show(title, &body, on_click) {
            warn!(error = %err, "failed to present desktop notification");
        }
    }

    // In-app delivery is unconditional; only an absent UI skips it.
    if let Some(ctx) = ui {
        let notification = UiNotification {
            kind: event.kind,
            worktree: event.worktree,
            project_name,
            message: event.message,
        };
        if let Err(err) = ctx.deliver_notification(notification) {
            warn!(error = %err, "failed to deliver in-app notification");
        }
    }
}

/// Final path segment of a worktree path, for display.
fn project_name_from_path(worktree: &str) -> String {
    Path::new(worktree)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| worktree.to_string())
}
