//! Development server with live reload for vellum sites.
//!
//! Watches the content directory, rebuilds the site on change, and tells
//! connected browsers to reload over a WebSocket.

pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{ReloadHub, ReloadMessage};
