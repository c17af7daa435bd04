//! USB serial write primitive.
//!
//! Fire-and-forget: configure the device's baud rate (best effort), write
//! one newline-terminated JSON line, never read back. The ESP32 firmware
//! parses line-delimited JSON at 115200 baud.

use std::io::Write;
use std::path::Path;
use std::process::Command;

const BAUD_RATE: &str = "115200";

/// Writes `line` (newline-terminated) to the serial device at `path`.
///
/// Returns false if the device does not exist or the write fails.
pub fn send(path: &Path, line: &str) -> bool {
    if !path.exists() {
        tracing::debug!(device = %path.display(), "Serial device not found");
        return false;
    }

    configure_baud(path);

    match std::fs::OpenOptions::new().write(true).open(path) {
        Ok(mut device) => match writeln!(device, "{line}") {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(device = %path.display(), error = %err, "Serial write failed");
                false
            }
        },
        Err(err) => {
            tracing::debug!(device = %path.display(), error = %err, "Serial open failed");
            false
        }
    }
}

/// Sets the device baud rate via stty. Failure does not abort the send; a
/// previously configured device still accepts the write.
fn configure_baud(path: &Path) {
    let flag = if cfg!(target_os = "macos") { "-f" } else { "-F" };
    let result = Command::new("stty")
        .arg(flag)
        .arg(path)
        .arg(BAUD_RATE)
        .output();
    if let Err(err) = result {
        tracing::debug!(device = %path.display(), error = %err, "stty failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_fails_when_device_missing() {
        assert!(!send(Path::new("/dev/does-not-exist-vibemon"), "{}"));
    }

    #[test]
    fn test_send_writes_newline_terminated_line() {
        // A regular file stands in for the device node; stty will fail,
        // which must not abort the write.
        let temp = tempfile::tempdir().unwrap();
        let device = temp.path().join("ttyUSB0");
        std::fs::write(&device, "").unwrap();

        assert!(send(&device, r#"{"command":"unlock"}"#));
        let written = std::fs::read_to_string(&device).unwrap();
        assert_eq!(written, "{\"command\":\"unlock\"}\n");
    }
}
