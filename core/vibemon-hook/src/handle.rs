//! Event handler for agent hooks.
//!
//! Reads the hook event (JSON on stdin, or a bare event-name argument),
//! maps it to a monitor state, enriches the payload with cached project
//! metadata, and broadcasts to every configured target. Nothing on this
//! path is allowed to fail loudly.

use std::io::{self, Read};

use vibemon_core::{
    project_name, state_for_event, Config, Dispatcher, HookInput, MetadataCache, StatusPayload,
};

pub fn run(config: &Config, dispatcher: &Dispatcher, event_arg: Option<&str>) {
    let input = match event_arg {
        Some(event) => HookInput {
            hook_event_name: Some(event.to_string()),
            ..HookInput::default()
        },
        None => HookInput::parse(&read_stdin()),
    };

    let event = input.event_name().to_string();
    let state = state_for_event(&event, input.permission_mode());
    let project = project_name(input.cwd.as_deref(), input.transcript_path.as_deref());

    let metadata = MetadataCache::new(config.cache_path.clone()).lookup(&project);
    let payload = StatusPayload::build(state, input.tool_name(), &project, metadata).to_json();

    tracing::debug!(
        event = %event,
        tool = input.tool_name(),
        project = %project,
        payload = %payload,
        "Broadcasting status"
    );

    dispatcher.broadcast(&payload, event == "SessionStart");
}

fn read_stdin() -> String {
    let mut raw = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut raw) {
        tracing::debug!(error = %err, "Failed to read stdin");
    }
    raw
}
