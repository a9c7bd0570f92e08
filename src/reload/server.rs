// src/reload/server.rs

use std::net::TcpListener;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{BuildError, Result};
use crate::reload::hub::ReloadHub;

/// Maximum port retry attempts when the base port is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// A running live-reload WebSocket server.
///
/// Dropping it disconnects all clients; the acceptor thread dies with the
/// process.
pub struct ReloadServer {
    hub: Arc<ReloadHub>,
    port: u16,
}

impl ReloadServer {
    pub fn hub(&self) -> Arc<ReloadHub> {
        Arc::clone(&self.hub)
    }

    /// The actually bound port (may differ from the configured base port).
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for ReloadServer {
    fn drop(&mut self) {
        self.hub.shutdown();
    }
}

/// Bind the WebSocket listener and spawn the acceptor thread.
pub fn start_reload_server(base_port: u16) -> Result<ReloadServer> {
    let (listener, port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    let hub = Arc::new(ReloadHub::new());

    let accept_hub = Arc::clone(&hub);
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => match tungstenite::accept(stream) {
                    Ok(ws) => accept_hub.register(ws),
                    Err(err) => debug!("websocket handshake failed: {err}"),
                },
                Err(err) => {
                    warn!("live-reload accept error: {err}");
                }
            }
        }
    });

    info!(port, "live-reload server listening");
    Ok(ReloadServer { hub, port })
}

/// Try binding to `base_port`, retrying on consecutive ports if in use.
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{port}")) {
            Ok(listener) => {
                let actual_port = listener
                    .local_addr()
                    .map(|a| a.port())
                    .unwrap_or(port);
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(BuildError::WatchSetup(format!(
        "failed to bind live-reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}
