//! vibemon-hook: CLI hook handler that forwards status notifications.
//!
//! Called directly by Claude Code hooks configured in ~/.claude/settings.json.
//! Without a command flag it reads a hook event from stdin and broadcasts a
//! state notification to every configured target; with a flag it sends one
//! command down the first-success target chain.
//!
//! Exit code is 0 on success or no-op, 1 when a command found no target.

mod commands;
mod handle;
mod logging;
mod statusline;

use clap::Parser;
use std::process::ExitCode;

use vibemon_core::{load_env_file, Config, Dispatcher};

#[derive(Parser)]
#[command(name = "vibemon-hook")]
#[command(about = "Forwards agent status events to vibe monitor targets")]
#[command(version)]
struct Cli {
    /// Lock the monitor to a project (defaults to the current directory name)
    #[arg(long, value_name = "PROJECT", num_args = 0..=1)]
    lock: Option<Option<String>>,

    /// Unlock the monitor
    #[arg(long)]
    unlock: bool,

    /// Query the monitor's current status
    #[arg(long)]
    status: bool,

    /// Get the lock mode, or set it when a value is given
    #[arg(long, value_name = "MODE", num_args = 0..=1)]
    lock_mode: Option<Option<String>>,

    /// Reboot the ESP32 device
    #[arg(long)]
    reboot: bool,

    /// Statusline mode: print a status line and record project metadata
    #[arg(long)]
    statusline: bool,

    /// Bare event name, as an alternative to the JSON object on stdin
    #[arg(value_name = "EVENT")]
    event: Option<String>,
}

fn main() -> ExitCode {
    load_env_file();
    logging::init();

    let cli = Cli::parse();
    let config = Config::from_env();

    if cli.statusline {
        statusline::run(&config);
        return ExitCode::SUCCESS;
    }

    let dispatcher = Dispatcher::from_config(&config);

    let ok = if let Some(project) = cli.lock {
        commands::lock(&dispatcher, project)
    } else if cli.unlock {
        commands::unlock(&dispatcher)
    } else if cli.status {
        commands::status(&dispatcher)
    } else if let Some(mode) = cli.lock_mode {
        commands::lock_mode(&dispatcher, mode)
    } else if cli.reboot {
        commands::reboot(&dispatcher)
    } else {
        // Event path is always a clean exit: a failed broadcast must never
        // block the host pipeline.
        handle::run(&config, &dispatcher, cli.event.as_deref());
        true
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
