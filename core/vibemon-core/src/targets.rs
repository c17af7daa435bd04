//! Delivery targets and dispatch.
//!
//! Up to three destinations can be configured: the desktop app (HTTP), the
//! ESP32 over HTTP, and the ESP32 over USB serial. Each is a [`Target`];
//! the [`Dispatcher`] holds them in fixed priority order (desktop → ESP32
//! HTTP → serial) and applies one of two strategies:
//!
//! - **first-success chain** for command operations: stop at the first
//!   target that accepts the command, earlier failures are not surfaced;
//! - **fan-out broadcast** for state notifications: every target is tried
//!   independently, failures are logged at debug and otherwise ignored.
//!
//! Any subset of targets may be absent or unreachable; a hung target costs
//! at most the transport timeout before the dispatcher moves on.

use std::path::PathBuf;
use std::str::FromStr;

use serde_json::json;

use crate::config::Config;
use crate::desktop;
use crate::error::{Result, VibemonError};
use crate::http;
use crate::serial;

/// Remote lock-mode setting. Validated client-side before any delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    FirstProject,
    OnThinking,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::FirstProject => "first-project",
            LockMode::OnThinking => "on-thinking",
        }
    }
}

impl FromStr for LockMode {
    type Err = VibemonError;

    fn from_str(value: &str) -> Result<LockMode> {
        match value {
            "first-project" => Ok(LockMode::FirstProject),
            "on-thinking" => Ok(LockMode::OnThinking),
            other => Err(VibemonError::InvalidLockMode(other.to_string())),
        }
    }
}

/// A command-style operation carried over the first-success chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorCommand {
    Lock { project: String },
    Unlock,
    Status,
    GetLockMode,
    SetLockMode { mode: LockMode },
    Reboot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl MonitorCommand {
    pub fn endpoint(&self) -> &'static str {
        match self {
            MonitorCommand::Lock { .. } => "/lock",
            MonitorCommand::Unlock => "/unlock",
            MonitorCommand::Status => "/status",
            MonitorCommand::GetLockMode | MonitorCommand::SetLockMode { .. } => "/lock-mode",
            MonitorCommand::Reboot => "/reboot",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            MonitorCommand::Status | MonitorCommand::GetLockMode => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    pub fn http_body(&self) -> Option<String> {
        match self {
            MonitorCommand::Lock { project } => Some(json!({ "project": project }).to_string()),
            MonitorCommand::SetLockMode { mode } => {
                Some(json!({ "mode": mode.as_str() }).to_string())
            }
            _ => None,
        }
    }

    /// Newline-delimited JSON form for the serial transport. The `command`
    /// field replaces the HTTP endpoint.
    pub fn serial_line(&self) -> String {
        match self {
            MonitorCommand::Lock { project } => {
                json!({ "command": "lock", "project": project }).to_string()
            }
            MonitorCommand::Unlock => json!({ "command": "unlock" }).to_string(),
            MonitorCommand::Status => json!({ "command": "status" }).to_string(),
            MonitorCommand::GetLockMode => json!({ "command": "lock-mode" }).to_string(),
            MonitorCommand::SetLockMode { mode } => {
                json!({ "command": "lock-mode", "mode": mode.as_str() }).to_string()
            }
            MonitorCommand::Reboot => json!({ "command": "reboot" }).to_string(),
        }
    }

    /// The desktop app has no reboot capability, so reboot only ever goes
    /// to ESP32 transports.
    pub fn esp32_only(&self) -> bool {
        matches!(self, MonitorCommand::Reboot)
    }

    /// Reply printed when a target accepted the command but produced no
    /// response body (serial, or an empty HTTP reply).
    pub fn fallback_reply(&self) -> String {
        match self {
            MonitorCommand::Lock { project } => {
                json!({ "success": true, "locked": project }).to_string()
            }
            MonitorCommand::Unlock => json!({ "success": true, "locked": null }).to_string(),
            MonitorCommand::Status => {
                json!({ "info": "Status command sent via serial. Check device output." })
                    .to_string()
            }
            MonitorCommand::GetLockMode => {
                json!({ "info": "Lock-mode command sent via serial. Check device output." })
                    .to_string()
            }
            MonitorCommand::SetLockMode { mode } => {
                json!({ "success": true, "lockMode": mode.as_str() }).to_string()
            }
            MonitorCommand::Reboot => json!({ "success": true, "rebooting": true }).to_string(),
        }
    }
}

/// Outcome of a successful command delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetReply {
    /// Response body from an HTTP target.
    Body(String),
    /// Accepted with nothing to read back (serial).
    NoResponse,
}

/// One configured destination.
///
/// Implementations are capability-tagged: a target that cannot carry an
/// operation reports `supports() == false` and the chain skips it.
pub trait Target {
    fn name(&self) -> &'static str;

    fn supports(&self, command: &MonitorCommand) -> bool;

    /// Attempts a command delivery. `None` means the target failed or was
    /// unreachable; the dispatcher moves on.
    fn try_command(&self, command: &MonitorCommand) -> Option<TargetReply>;

    /// Best-effort state broadcast. Returns whether delivery succeeded.
    fn send_status(&self, payload: &str) -> bool;

    /// Called before a session-start broadcast. Default no-op.
    fn prepare_session_start(&self) {}
}

/// Desktop app over HTTP.
pub struct DesktopHttp {
    base_url: String,
}

impl DesktopHttp {
    pub fn new(base_url: &str) -> Self {
        DesktopHttp {
            base_url: base_url.to_string(),
        }
    }
}

impl Target for DesktopHttp {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn supports(&self, command: &MonitorCommand) -> bool {
        !command.esp32_only()
    }

    fn try_command(&self, command: &MonitorCommand) -> Option<TargetReply> {
        send_http_command(&self.base_url, command)
    }

    fn send_status(&self, payload: &str) -> bool {
        http::post(&self.base_url, "/status", Some(payload)).is_some()
    }

    fn prepare_session_start(&self) {
        if !desktop::is_running(&self.base_url) {
            tracing::debug!("Desktop app not running, launching");
            desktop::launch();
        }
        desktop::show_window(&self.base_url);
    }
}

/// ESP32 over HTTP.
pub struct Esp32Http {
    base_url: String,
}

impl Esp32Http {
    pub fn new(base_url: &str) -> Self {
        Esp32Http {
            base_url: base_url.to_string(),
        }
    }
}

impl Target for Esp32Http {
    fn name(&self) -> &'static str {
        "esp32-http"
    }

    fn supports(&self, _command: &MonitorCommand) -> bool {
        true
    }

    fn try_command(&self, command: &MonitorCommand) -> Option<TargetReply> {
        send_http_command(&self.base_url, command)
    }

    fn send_status(&self, payload: &str) -> bool {
        http::post(&self.base_url, "/status", Some(payload)).is_some()
    }
}

fn send_http_command(base_url: &str, command: &MonitorCommand) -> Option<TargetReply> {
    let body = command.http_body();
    let response = match command.method() {
        HttpMethod::Get => http::get(base_url, command.endpoint()),
        HttpMethod::Post => http::post(base_url, command.endpoint(), body.as_deref()),
    };
    response.map(TargetReply::Body)
}

/// ESP32 over USB serial. Holds the configured path or glob pattern;
/// resolution happens at send time since devices come and go.
pub struct SerialTarget {
    pattern: String,
}

impl SerialTarget {
    pub fn new(pattern: &str) -> Self {
        SerialTarget {
            pattern: pattern.to_string(),
        }
    }
}

impl Target for SerialTarget {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn supports(&self, _command: &MonitorCommand) -> bool {
        true
    }

    fn try_command(&self, command: &MonitorCommand) -> Option<TargetReply> {
        let port = resolve_serial_port(&self.pattern)?;
        if serial::send(&port, &command.serial_line()) {
            Some(TargetReply::NoResponse)
        } else {
            None
        }
    }

    fn send_status(&self, payload: &str) -> bool {
        match resolve_serial_port(&self.pattern) {
            Some(port) => serial::send(&port, payload),
            None => {
                tracing::debug!(pattern = %self.pattern, "No serial port matches pattern");
                false
            }
        }
    }
}

/// Resolves a serial port path or glob pattern to a concrete device path.
///
/// A pattern without a wildcard is returned unchanged. With a wildcard,
/// matches are sorted lexicographically and the first one wins; no match
/// resolves to `None`.
pub fn resolve_serial_port(pattern: &str) -> Option<PathBuf> {
    if !pattern.contains('*') {
        return Some(PathBuf::from(pattern));
    }

    let entries = match glob::glob(pattern) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(pattern = %pattern, error = %err, "Invalid serial port pattern");
            return None;
        }
    };

    let mut matches: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
    matches.sort();

    match matches.into_iter().next() {
        Some(port) => {
            tracing::debug!(port = %port.display(), "Resolved serial port");
            Some(port)
        }
        None => {
            tracing::debug!(pattern = %pattern, "No serial port found matching pattern");
            None
        }
    }
}

/// Ordered collection of configured targets.
pub struct Dispatcher {
    targets: Vec<Box<dyn Target>>,
}

impl Dispatcher {
    pub fn new(targets: Vec<Box<dyn Target>>) -> Self {
        Dispatcher { targets }
    }

    /// Builds the chain from configuration, in priority order.
    pub fn from_config(config: &Config) -> Self {
        let mut targets: Vec<Box<dyn Target>> = Vec::new();
        if let Some(url) = &config.desktop_url {
            targets.push(Box::new(DesktopHttp::new(url)));
        }
        if let Some(url) = &config.esp32_url {
            targets.push(Box::new(Esp32Http::new(url)));
        }
        if let Some(pattern) = &config.serial_port {
            targets.push(Box::new(SerialTarget::new(pattern)));
        }
        Dispatcher::new(targets)
    }

    /// First-success chain: returns the winning target's reply, or the
    /// command's canned reply when the winner had nothing to say.
    pub fn dispatch(&self, command: &MonitorCommand) -> Result<String> {
        for target in &self.targets {
            if !target.supports(command) {
                tracing::debug!(target = target.name(), "Target skipped for this command");
                continue;
            }
            tracing::debug!(target = target.name(), "Trying target");
            match target.try_command(command) {
                Some(TargetReply::Body(body)) if !body.is_empty() => return Ok(body),
                Some(_) => return Ok(command.fallback_reply()),
                None => tracing::debug!(target = target.name(), "Target failed"),
            }
        }

        if command.esp32_only() {
            Err(VibemonError::NoEsp32Target)
        } else {
            Err(VibemonError::NoTarget)
        }
    }

    /// Fan-out broadcast: every target gets the payload; one target's
    /// failure never prevents the others.
    pub fn broadcast(&self, payload: &str, session_start: bool) {
        for target in &self.targets {
            if session_start {
                target.prepare_session_start();
            }
            let delivered = target.send_status(payload);
            tracing::debug!(target = target.name(), delivered, "Status broadcast");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
