//! Statusline mode: the cache-feeding side of the system.
//!
//! Claude Code pipes statusline JSON to this mode on every refresh. We print
//! a minimal status line (project, model, context usage) and record the
//! model/memory pair in the project metadata cache so the notification path
//! can enrich its payloads later.
//!
//! The line is printed and flushed before the cache write starts, so the
//! host never waits on disk I/O or lock contention for its status display.

use std::io::{self, Read, Write};
use std::path::Path;

use serde_json::Value;

use vibemon_core::{Config, MetadataCache};

pub fn run(config: &Config) {
    let mut raw = String::new();
    let _ = io::stdin().read_to_string(&mut raw);
    let input: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

    let model = model_name(&input);
    let project = input
        .pointer("/workspace/current_dir")
        .and_then(Value::as_str)
        .map(basename)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(current_dir_name);
    let memory = context_usage(&input);

    // No trailing newline: the host renders the line verbatim.
    print!("{}", render_line(&project, &model, &memory));
    let _ = io::stdout().flush();

    // Cache write happens strictly after the visible output.
    MetadataCache::new(config.cache_path.clone()).upsert(&project, &model, &memory);
}

fn render_line(project: &str, model: &str, memory: &str) -> String {
    [project, model, memory]
        .iter()
        .filter(|segment| !segment.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Context window usage as a whole percentage, e.g. `"63%"`.
///
/// Prefers the host's pre-calculated `used_percentage`; otherwise derives it
/// from current token usage over the window size. Empty when neither is
/// available.
fn context_usage(input: &Value) -> String {
    if let Some(pct) = number_at(input, "/context_window/used_percentage") {
        if pct > 0.0 {
            return format!("{}%", pct as i64);
        }
    }

    let window_size = number_at(input, "/context_window/context_window_size").unwrap_or(0.0);
    if window_size > 0.0 {
        let used = ["input_tokens", "cache_creation_input_tokens", "cache_read_input_tokens"]
            .iter()
            .filter_map(|field| {
                number_at(input, &format!("/context_window/current_usage/{field}"))
            })
            .sum::<f64>();
        if used > 0.0 {
            return format!("{}%", (used * 100.0 / window_size) as i64);
        }
    }

    String::new()
}

/// Model display name, defaulting to the generic `"Claude"`.
fn model_name(input: &Value) -> String {
    input
        .pointer("/model/display_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or("Claude")
        .to_string()
}

/// Reads a numeric field that the host may emit as a number or a string.
fn number_at(input: &Value, pointer: &str) -> Option<f64> {
    match input.pointer(pointer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn current_dir_name() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default()
}
