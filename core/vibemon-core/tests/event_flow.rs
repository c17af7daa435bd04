//! End-to-end flow: raw hook input → state mapping → cached metadata →
//! wire payload → dispatch.

use std::sync::{Arc, Mutex};

use tempfile::tempdir;
use vibemon_core::{
    project_name, state_for_event, Dispatcher, HookInput, MetadataCache, MonitorCommand,
    MonitorState, StatusPayload, Target, TargetReply,
};

struct RecordingTarget {
    statuses: Arc<Mutex<Vec<String>>>,
}

impl Target for RecordingTarget {
    fn name(&self) -> &'static str {
        "recorder"
    }
    fn supports(&self, _command: &MonitorCommand) -> bool {
        true
    }
    fn try_command(&self, _command: &MonitorCommand) -> Option<TargetReply> {
        Some(TargetReply::NoResponse)
    }
    fn send_status(&self, payload: &str) -> bool {
        self.statuses.lock().unwrap().push(payload.to_string());
        true
    }
}

#[test]
fn session_start_in_plan_mode_broadcasts_start_state() {
    let temp = tempdir().unwrap();
    let cache = MetadataCache::new(temp.path().join("cache.json"));
    cache.upsert("my-proj", "Opus", "37%");

    let input = HookInput::parse(
        r#"{"hook_event_name":"SessionStart","cwd":"/work/my-proj","permission_mode":"plan"}"#,
    );
    let state = state_for_event(input.event_name(), input.permission_mode());
    assert_eq!(state, MonitorState::Start);

    let project = project_name(input.cwd.as_deref(), input.transcript_path.as_deref());
    let payload = StatusPayload::build(state, input.tool_name(), &project, cache.lookup(&project));

    let statuses = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Dispatcher::new(vec![Box::new(RecordingTarget {
        statuses: Arc::clone(&statuses),
    })]);
    dispatcher.broadcast(&payload.to_json(), true);

    let sent = statuses.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let wire: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
    assert_eq!(wire["state"], "start");
    assert_eq!(wire["project"], "my-proj");
    assert_eq!(wire["model"], "Opus");
    assert_eq!(wire["memory"], "37%");
    assert_eq!(wire["character"], "clawd");
}

#[test]
fn tool_use_in_plan_mode_broadcasts_planning_state() {
    let input = HookInput::parse(
        r#"{"hook_event_name":"PreToolUse","tool_name":"Bash","cwd":"/w/p","permission_mode":"plan"}"#,
    );
    let state = state_for_event(input.event_name(), input.permission_mode());
    assert_eq!(state, MonitorState::Planning);

    let payload = StatusPayload::build(state, input.tool_name(), "p", None);
    let wire: serde_json::Value = serde_json::from_str(&payload.to_json()).unwrap();
    assert_eq!(wire["state"], "planning");
    assert_eq!(wire["tool"], "Bash");
    assert_eq!(wire["model"], "");
}

#[test]
fn malformed_stdin_still_produces_a_broadcastable_payload() {
    let input = HookInput::parse("definitely not json");
    let state = state_for_event(input.event_name(), input.permission_mode());
    assert_eq!(state, MonitorState::Working);

    let project = project_name(input.cwd.as_deref(), input.transcript_path.as_deref());
    let payload = StatusPayload::build(state, input.tool_name(), &project, None);
    let wire: serde_json::Value = serde_json::from_str(&payload.to_json()).unwrap();
    assert_eq!(wire["state"], "working");
}
