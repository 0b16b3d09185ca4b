//! Development server for forgedoc.
//!
//! Serves the content build, rebuilds it when sources change, pushes
//! live-reload messages over WebSocket and answers playground expansion
//! requests.

mod api;
pub mod reload;
pub mod server;
pub mod watcher;

pub use reload::{reload_client_script, ReloadHub, ReloadMessage};
pub use server::{DevServer, DevServerConfig, ServerError, RELOAD_PATH};
pub use watcher::{FileWatcher, WatchEvent};
