// src/reload/mod.rs

//! Live-reload broadcast layer.
//!
//! A small WebSocket server pushes "reload" and "css" signals to
//! connected browsers after a watched change has been rebuilt. Local
//! development only; nothing here crosses a trust boundary.
//!
//! - [`message`] defines the JSON wire protocol.
//! - [`hub`] owns the connected-client set and the broadcast logic.
//! - [`server`] accepts sockets and hands them to the hub.
//! - [`client`] is the embedded browser-side script.

pub mod client;
pub mod hub;
pub mod message;
pub mod server;

pub use client::{client_js, script_tag, CLIENT_JS_PATH};
pub use hub::ReloadHub;
pub use message::ReloadMessage;
pub use server::{start_reload_server, ReloadServer};
