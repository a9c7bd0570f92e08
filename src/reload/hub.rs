// src/reload/hub.rs

use std::net::TcpStream;
use std::sync::Mutex;

use tracing::{debug, warn};
use tungstenite::protocol::Message;
use tungstenite::WebSocket;

use crate::engine::ReloadSink;
use crate::reload::message::ReloadMessage;

/// The set of connected live-reload clients.
///
/// Purely transient in-memory state: grows as browsers connect, shrinks
/// when a send fails (the client went away). Broadcasting to zero clients
/// is a no-op, not an error.
#[derive(Default)]
pub struct ReloadHub {
    clients: Mutex<Vec<WebSocket<TcpStream>>>,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted client and greet it.
    pub fn register(&self, mut ws: WebSocket<TcpStream>) {
        let greeting = ReloadMessage::connected().to_json();
        if let Err(err) = ws.send(Message::Text(greeting.into())) {
            debug!("client dropped during greeting: {err}");
            return;
        }

        let Ok(mut clients) = self.clients.lock() else {
            warn!("client list mutex poisoned; dropping connection");
            return;
        };
        clients.push(ws);
        debug!(clients = clients.len(), "live-reload client connected");
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Push a reload (`full == true`) or stylesheet-refresh signal to
    /// every connected client.
    pub fn notify(&self, full: bool) {
        let msg = if full {
            ReloadMessage::reload()
        } else {
            ReloadMessage::css()
        };
        self.broadcast(Message::Text(msg.to_json().into()));
    }

    /// Broadcast a message to all connected clients, dropping any that
    /// fail to receive it.
    fn broadcast(&self, msg: Message) {
        let Ok(mut clients) = self.clients.lock() else {
            warn!("client list mutex poisoned; skipping broadcast");
            return;
        };

        let count = clients.len();
        if count == 0 {
            debug!("no live-reload clients connected");
            return;
        }

        clients.retain_mut(|client| match client.send(msg.clone()) {
            Ok(_) => true,
            Err(err) => {
                debug!("live-reload client disconnected: {err}");
                false
            }
        });
        debug!(clients = count, "broadcast live-reload message");
    }

    /// Close every client connection.
    pub fn shutdown(&self) {
        let Ok(mut clients) = self.clients.lock() else {
            return;
        };
        for mut client in clients.drain(..) {
            let _ = client.close(None);
        }
        debug!("live-reload clients disconnected");
    }
}

impl ReloadSink for ReloadHub {
    fn notify(&self, full: bool) {
        ReloadHub::notify(self, full);
    }
}
