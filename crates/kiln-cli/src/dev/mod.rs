//! Live-reload development loop.
//!
//! ```text
//! file change ─▶ ChangeWatcher (debounce) ─▶ RebuildSignal ─▶ BuildTrigger
//!                                                                │
//!                       browser tabs ◀── ReloadServer ◀── Hub ◀──┘ publish
//! ```
//!
//! - [`watcher`] folds file-system bursts into single change notifications
//! - [`trigger`] runs at most one rebuild at a time, coalescing the rest
//! - [`hub`] owns the connected clients and fans messages out to them
//! - [`server`] is the HTTP/WebSocket front end
//! - [`protocol`] defines build outcomes and the text frames clients receive

pub mod config;
pub mod hub;
pub mod protocol;
pub mod server;
pub mod trigger;
pub mod watcher;
mod websocket;

// Re-exports
pub use config::DevConfig;
pub use hub::{BroadcastReport, Client, ClientId, Hub, HubCommand, HubError, HubHandle};
pub use protocol::{BuildOutcome, ReloadMessage};
pub use server::{RELOAD_SCRIPT_PATH, ReloadServer};
pub use trigger::{BuildTrigger, ChangeListener, RebuildSignal};
pub use watcher::{ChangeWatcher, FileChange, debounce};
