//! # vibemon-core
//!
//! Core library for the vibe monitor hooks: forwards "project X is
//! thinking/working/done" status notifications from agent events to a small
//! set of external displays (desktop app over HTTP, ESP32 over HTTP or USB
//! serial).
//!
//! ## Design Principles
//!
//! - **Synchronous**: Each hook invocation is a short-lived process; blocking
//!   I/O with fixed timeouts is the whole concurrency model.
//! - **Best effort**: No guaranteed delivery, no retries beyond the fixed
//!   fallback chain, no queuing. An unreachable target is logged, not fatal.
//! - **Graceful degradation**: Malformed input and missing files read as
//!   defaults; nothing here may abort the host's event pipeline.

pub mod cache;
pub mod config;
pub mod desktop;
pub mod error;
pub mod event;
pub mod http;
pub mod serial;
pub mod targets;

pub use cache::{CacheEntry, MetadataCache, MAX_PROJECTS};
pub use config::{load_env_file, Config};
pub use error::{Result, VibemonError};
pub use event::{project_name, state_for_event, HookInput, MonitorState, StatusPayload};
pub use targets::{
    resolve_serial_port, DesktopHttp, Dispatcher, Esp32Http, LockMode, MonitorCommand,
    SerialTarget, Target, TargetReply,
};
