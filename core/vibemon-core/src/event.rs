//! Hook event parsing and payload construction.
//!
//! Claude Code invokes the hook with a JSON object on stdin. Parsing is
//! forgiving by design: malformed JSON or missing fields fall back to
//! defaults and never abort the event pipeline.
//!
//! # State mapping
//!
//! ```text
//! SessionStart     → start
//! UserPromptSubmit → thinking
//! PreToolUse       → working
//! Notification     → notification
//! Stop             → done
//! (anything else)  → working
//! ```
//!
//! In plan permission mode, `thinking` and `working` remap to `planning` so
//! plan-mode activity reads differently on the display. The override does
//! not touch `start`, `done`, or `notification`.

use std::env;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheEntry;

/// Tag identifying this client in outbound payloads.
pub const CHARACTER: &str = "clawd";

/// Abstract state shown on the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Start,
    Thinking,
    Working,
    Planning,
    Notification,
    Done,
}

/// Input received from Claude Code via stdin.
///
/// Every field is optional; hooks must tolerate schema drift from the host.
#[derive(Debug, Default)]
pub struct HookInput {
    pub hook_event_name: Option<String>,
    pub tool_name: Option<String>,
    pub cwd: Option<String>,
    pub transcript_path: Option<String>,
    pub permission_mode: Option<String>,
}

impl HookInput {
    /// Parses hook input. Fields are extracted independently so one
    /// malformed or type-mismatched field defaults alone without discarding
    /// the others; malformed JSON reads as an empty input.
    pub fn parse(raw: &str) -> HookInput {
        let value: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
        HookInput {
            hook_event_name: str_field(&value, "hook_event_name"),
            tool_name: str_field(&value, "tool_name"),
            cwd: str_field(&value, "cwd"),
            transcript_path: str_field(&value, "transcript_path"),
            permission_mode: str_field(&value, "permission_mode"),
        }
    }

    pub fn event_name(&self) -> &str {
        self.hook_event_name.as_deref().unwrap_or("Unknown")
    }

    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    pub fn permission_mode(&self) -> &str {
        self.permission_mode.as_deref().unwrap_or("default")
    }
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Maps a hook event name to a monitor state, honoring plan mode.
pub fn state_for_event(event_name: &str, permission_mode: &str) -> MonitorState {
    let state = match event_name {
        "SessionStart" => MonitorState::Start,
        "UserPromptSubmit" => MonitorState::Thinking,
        "PreToolUse" => MonitorState::Working,
        "Notification" => MonitorState::Notification,
        "Stop" => MonitorState::Done,
        _ => MonitorState::Working,
    };

    if permission_mode == "plan"
        && matches!(state, MonitorState::Thinking | MonitorState::Working)
    {
        return MonitorState::Planning;
    }

    state
}

/// Derives the project name from the working directory, falling back to the
/// transcript's parent directory, then the process working directory.
pub fn project_name(cwd: Option<&str>, transcript_path: Option<&str>) -> String {
    if let Some(cwd) = cwd.filter(|c| !c.is_empty()) {
        return basename(cwd);
    }
    if let Some(transcript) = transcript_path.filter(|t| !t.is_empty()) {
        if let Some(parent) = Path::new(transcript).parent() {
            return basename(&parent.to_string_lossy());
        }
    }
    env::current_dir()
        .map(|d| basename(&d.to_string_lossy()))
        .unwrap_or_default()
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Wire payload sent to every target.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub state: MonitorState,
    pub tool: String,
    pub project: String,
    pub model: String,
    pub memory: String,
    pub character: String,
    #[serde(rename = "terminalId")]
    pub terminal_id: String,
}

impl StatusPayload {
    pub fn build(
        state: MonitorState,
        tool: &str,
        project: &str,
        metadata: Option<CacheEntry>,
    ) -> StatusPayload {
        let (model, memory) = metadata
            .map(|entry| (entry.model, entry.memory))
            .unwrap_or_default();
        StatusPayload {
            state,
            tool: tool.to_string(),
            project: project.to_string(),
            model,
            memory,
            character: CHARACTER.to_string(),
            terminal_id: terminal_id(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serialization of a string/enum struct cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Identifies the terminal session hosting the agent, when detectable.
fn terminal_id() -> String {
    terminal_id_from(
        env::var("ITERM_SESSION_ID").ok(),
        env::var("GHOSTTY_PID").ok(),
    )
}

fn terminal_id_from(iterm_session: Option<String>, ghostty_pid: Option<String>) -> String {
    if let Some(session) = iterm_session.filter(|s| !s.is_empty()) {
        return format!("iterm2:{session}");
    }
    if let Some(pid) = ghostty_pid.filter(|p| !p.is_empty()) {
        return format!("ghostty:{pid}");
    }
    String::new()
}
