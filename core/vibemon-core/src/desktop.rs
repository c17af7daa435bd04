//! Desktop app lifecycle helpers.
//!
//! The desktop monitor is an npx-launched app the hook can start on demand:
//! probe `/health`, and if nobody answers, spawn the app detached through
//! the user's login shell so it inherits the usual PATH and node setup. The
//! broadcast proceeds whether or not the launch worked.

use std::env;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::http;

const LAUNCH_COMMAND: &str = "npx vibe-monitor@latest";
const LAUNCH_GRACE: Duration = Duration::from_secs(3);

/// Liveness probe against the desktop app's `/health` endpoint.
pub fn is_running(base_url: &str) -> bool {
    http::get(base_url, "/health").is_some()
}

/// Raises the desktop app window.
pub fn show_window(base_url: &str) {
    http::post(base_url, "/show", None);
}

/// Launches the desktop app as a detached background process, then waits a
/// fixed grace period so it can start listening before the first broadcast.
pub fn launch() {
    let shell = login_shell();
    tracing::debug!(shell = %shell, "Launching desktop app");

    let mut command = Command::new(&shell);
    command
        .arg("-l")
        .arg("-c")
        .arg(LAUNCH_COMMAND)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // New process group: the app must outlive this short-lived hook.
        command.process_group(0);
    }

    match command.spawn() {
        Ok(_child) => thread::sleep(LAUNCH_GRACE),
        Err(err) => {
            tracing::debug!(error = %err, "Failed to launch desktop app");
        }
    }
}

fn login_shell() -> String {
    env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_shell_has_a_value() {
        assert!(!login_shell().is_empty());
    }

    #[test]
    fn test_is_running_false_when_nothing_listens() {
        assert!(!is_running("http://127.0.0.1:9"));
    }
}
