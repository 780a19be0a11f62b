//! Hook injection into the assistant CLI's settings documents.
//!
//! The external CLI fires lifecycle hooks by running arbitrary commands
//! from its `settings.json`. Injection guarantees those documents carry
//! the two commands that reach the relay, without touching anything else
//! the user put there. The whole operation is best-effort: a corrupt or
//! unwritable settings file must never block startup or project opening,
//! so every failure is logged and swallowed here.

use std::path::Path;

use anyhow::Context;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::relay::DEFAULT_RELAY_PORT;

const SETTINGS_DIR: &str = ".claude";
const SETTINGS_FILE: &str = "settings.json";

/// Hook fired when the assistant asks for input.
fn notification_command() -> String {
    format!(
        r#"curl -X POST http://127.0.0.1:{DEFAULT_RELAY_PORT}/notification -H "Content-Type: application/json" -d '{{"type": "claude-needs-input", "worktree": "'$PWD'", "message": "'$CLAUDE_NOTIFICATION'"}}' --silent --fail || true"#
    )
}

/// Hook fired when the assistant finishes a turn. Guarded by the CLI's
/// own stop-hook-active flag so the stop hook cannot re-trigger itself.
fn stop_command() -> String {
    format!(
        r#"[ "$CLAUDE_STOP_HOOK_ACTIVE" != "true" ] && curl -X POST http://127.0.0.1:{DEFAULT_RELAY_PORT}/notification -H "Content-Type: application/json" -d '{{"type": "claude-finished", "worktree": "'$PWD'", "message": "Task completed"}}' --silent --fail || true"#
    )
}

fn command_hook_entry(command: String) -> Value {
    json!([
        {
            "hooks": [
                {
                    "type": "command",
                    "command": command,
                }
            ]
        }
    ])
}

/// Ensure `~/.claude/settings.json` declares the relay hooks.
pub fn ensure_global_hooks() {
    let Some(home) = dirs::home_dir() else {
        warn!("home directory not found, skipping global hook setup");
        return;
    };
    let settings_file = home.join(SETTINGS_DIR).join(SETTINGS_FILE);
    if let Err(err) = install_owned_hooks(&settings_file) {
        warn!(
            path = %settings_file.display(),
            error = %format!("{err:#}"),
            "failed to set up global hooks"
        );
    }
}

/// Ensure `<project>/.claude/settings.json` declares the relay hooks.
pub fn ensure_project_hooks(project_path: &Path) {
    let settings_file = project_path.join(SETTINGS_DIR).join(SETTINGS_FILE);
    if let Err(err) = install_owned_hooks(&settings_file) {
        warn!(
            path = %settings_file.display(),
            error = %format!("{err:#}"),
            "failed to set up project hooks"
        );
    }
}

/// Read-merge-write one settings document.
///
/// `hooks.Notification` and `hooks.Stop` are fully owned and overwritten;
/// every other top-level key and every other `hooks.*` key is carried
/// over untouched. A document that cannot be read or parsed is treated as
/// empty rather than an error, so a corrupt file heals on the next run.
fn install_owned_hooks(settings_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = settings_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let existing = std::fs::read_to_string(settings_file)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .unwrap_or_else(|| json!({}));

    let mut root = match existing {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut hooks = match root.get("hooks") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    hooks.insert(
        "Notification".to_string(),
        command_hook_entry(notification_command()),
    );
    hooks.insert("Stop".to_string(), command_hook_entry(stop_command()));
    root.insert("hooks".to_string(), Value::Object(hooks));

    let formatted = serde_json::to_string_pretty(&Value::Object(root))?;
    std::fs::write(settings_file, formatted)
        .with_context(|| format!("writing {}", settings_file.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_settings(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).expect("read settings"))
            .expect("parse settings")
    }

    #[test]
    fn creates_directory_and_document_from_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = dir.path().join("proj");
        std::fs::create_dir(&project).expect("mkdir");

        ensure_project_hooks(&project);

        let settings_file = project.join(".claude").join("settings.json");
        let settings = read_settings(&settings_file);
        assert!(settings["hooks"]["Notification"].is_array());
        assert!(settings["hooks"]["Stop"].is_array());
    }

    #[test]
    fn repeated_injection_is_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings_file = dir.path().join("settings.json");
        std::fs::write(
            &settings_file,
            r#"{"model": "opus", "hooks": {"PreToolUse": [{"hooks": []}]}}"#,
        )
        .expect("seed settings");

        install_owned_hooks(&settings_file).expect("first injection");
        let first = std::fs::read(&settings_file).expect("read first");
        install_owned_hooks(&settings_file).expect("second injection");
        let second = std::fs::read(&settings_file).expect("read second");
        assert_eq!(first, second);
    }

    #[test]
    fn preserves_unrelated_keys_and_overwrites_owned_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings_file = dir.path().join("settings.json");
        std::fs::write(
            &settings_file,
            r#"{
                "model": "opus",
                "permissions": {"allow": ["Bash(ls)"]},
                "hooks": {
                    "PreToolUse": [{"hooks": [{"type": "command", "command": "echo hi"}]}],
                    "Notification": [{"hooks": [{"type": "command", "command": "stale"}]}]
                }
            }"#,
        )
        .expect("seed settings");

        install_owned_hooks(&settings_file).expect("injection");

        let settings = read_settings(&settings_file);
        assert_eq!(settings["model"], "opus");
        assert_eq!(settings["permissions"]["allow"][0], "Bash(ls)");
        assert_eq!(
            settings["hooks"]["PreToolUse"][0]["hooks"][0]["command"],
            "echo hi"
        );

        let notification = settings["hooks"]["Notification"][0]["hooks"][0]["command"]
            .as_str()
            .expect("notification command");
        assert_eq!(notification, notification_command());
        let stop = settings["hooks"]["Stop"][0]["hooks"][0]["command"]
            .as_str()
            .expect("stop command");
        assert_eq!(stop, stop_command());
    }

    #[test]
    fn corrupt_document_is_replaced_rather_than_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings_file = dir.path().join("settings.json");
        std::fs::write(&settings_file, "{definitely not json").expect("seed garbage");

        install_owned_hooks(&settings_file).expect("injection over garbage");

        let settings = read_settings(&settings_file);
        assert!(settings["hooks"]["Notification"].is_array());
        assert!(settings["hooks"]["Stop"].is_array());
    }

    #[test]
    fn non_object_document_starts_fresh() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings_file = dir.path().join("settings.json");
        std::fs::write(&settings_file, "[1, 2, 3]").expect("seed array");

        install_owned_hooks(&settings_file).expect("injection over array");

        let settings = read_settings(&settings_file);
        assert!(settings.is_object());
        assert!(settings["hooks"]["Stop"].is_array());
    }

    #[test]
    fn injected_commands_target_the_default_relay_port() {
        let notification = notification_command();
        assert!(notification.contains("http://127.0.0.1:7878/notification"));
        assert!(notification.contains(r#""type": "claude-needs-input""#));
        assert!(notification.contains("$CLAUDE_NOTIFICATION"));
        assert!(notification.ends_with("--silent --fail || true"));

        let stop = stop_command();
        assert!(stop.starts_with(r#"[ "$CLAUDE_STOP_HOOK_ACTIVE" != "true" ]"#));
        assert!(stop.contains(r#""type": "claude-finished""#));
        assert!(stop.contains(r#""message": "Task completed""#));
        assert!(stop.ends_with("--silent --fail || true"));
    }
}
