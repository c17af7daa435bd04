//! Command operations over the first-success target chain.
//!
//! Each function prints one JSON line to stdout (the winning target's reply,
//! a canned acknowledgement, or an error naming the remediating environment
//! variables) and returns whether delivery succeeded.

use std::env;

use serde_json::json;

use vibemon_core::{Dispatcher, LockMode, MonitorCommand, VibemonError};

pub fn lock(dispatcher: &Dispatcher, project: Option<String>) -> bool {
    let project = project
        .filter(|p| !p.is_empty())
        .unwrap_or_else(current_dir_name);
    tracing::debug!(project = %project, "Locking project");
    run(dispatcher, &MonitorCommand::Lock { project })
}

pub fn unlock(dispatcher: &Dispatcher) -> bool {
    run(dispatcher, &MonitorCommand::Unlock)
}

pub fn status(dispatcher: &Dispatcher) -> bool {
    run(dispatcher, &MonitorCommand::Status)
}

/// With a mode value: validate client-side, then set. Without: query.
pub fn lock_mode(dispatcher: &Dispatcher, mode: Option<String>) -> bool {
    match mode {
        Some(raw) => match raw.parse::<LockMode>() {
            Ok(mode) => run(dispatcher, &MonitorCommand::SetLockMode { mode }),
            Err(err) => {
                // Validation failure: report before any delivery attempt.
                print_error(&err);
                false
            }
        },
        None => run(dispatcher, &MonitorCommand::GetLockMode),
    }
}

pub fn reboot(dispatcher: &Dispatcher) -> bool {
    run(dispatcher, &MonitorCommand::Reboot)
}

fn run(dispatcher: &Dispatcher, command: &MonitorCommand) -> bool {
    match dispatcher.dispatch(command) {
        Ok(reply) => {
            println!("{reply}");
            true
        }
        Err(err) => {
            print_error(&err);
            false
        }
    }
}

fn print_error(err: &VibemonError) {
    println!("{}", json!({ "error": err.to_string() }));
}

fn current_dir_name() -> String {
    env::current_dir()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use vibemon_core::{Target, TargetReply};

    struct SpyTarget {
        calls: Arc<Mutex<u32>>,
    }

    impl Target for SpyTarget {
        fn name(&self) -> &'static str {
            "spy"
        }
        fn supports(&self, _command: &MonitorCommand) -> bool {
            true
        }
        fn try_command(&self, _command: &MonitorCommand) -> Option<TargetReply> {
            *self.calls.lock().unwrap() += 1;
            Some(TargetReply::NoResponse)
        }
        fn send_status(&self, _payload: &str) -> bool {
            true
        }
    }

    fn spy_dispatcher() -> (Dispatcher, Arc<Mutex<u32>>) {
        let calls = Arc::new(Mutex::new(0));
        let dispatcher = Dispatcher::new(vec![Box::new(SpyTarget {
            calls: Arc::clone(&calls),
        })]);
        (dispatcher, calls)
    }

    #[test]
    fn test_invalid_lock_mode_makes_zero_delivery_attempts() {
        let (dispatcher, calls) = spy_dispatcher();
        assert!(!lock_mode(&dispatcher, Some("always".to_string())));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_valid_lock_mode_dispatches() {
        let (dispatcher, calls) = spy_dispatcher();
        assert!(lock_mode(&dispatcher, Some("first-project".to_string())));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_lock_mode_without_value_queries() {
        let (dispatcher, calls) = spy_dispatcher();
        assert!(lock_mode(&dispatcher, None));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_commands_fail_with_no_targets() {
        let dispatcher = Dispatcher::new(vec![]);
        assert!(!unlock(&dispatcher));
        assert!(!status(&dispatcher));
        assert!(!reboot(&dispatcher));
    }

    #[test]
    fn test_lock_defaults_to_current_dir_name() {
        let name = current_dir_name();
        assert!(!name.is_empty());
    }
}
