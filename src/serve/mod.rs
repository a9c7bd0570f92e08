// src/serve/mod.rs

//! Local development HTTP server.
//!
//! Serves static files from the build output with a source-tree fallback
//! (so assets that aren't part of a staged pipeline are still reachable
//! during development), injecting the live-reload client into HTML
//! responses. Local use only.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info, warn};

use crate::errors::{BuildError, Result};
use crate::reload::{client_js, script_tag, CLIENT_JS_PATH};

/// A running dev server. Dropping the handle unblocks the request loop.
pub struct HttpServer {
    server: Arc<Server>,
    port: u16,
}

impl HttpServer {
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

/// Bind the server and spawn its request loop thread.
///
/// `roots` are tried in order for every request; the first root holding
/// the requested file wins.
pub fn spawn_http_server(port: u16, roots: Vec<PathBuf>, ws_port: u16) -> Result<HttpServer> {
    let server = Server::http(("127.0.0.1", port))
        .map_err(|e| BuildError::WatchSetup(format!("binding dev server on port {port}: {e}")))?;
    let server = Arc::new(server);

    let loop_server = Arc::clone(&server);
    std::thread::spawn(move || {
        for request in loop_server.incoming_requests() {
            if let Err(err) = handle_request(request, &roots, ws_port) {
                warn!("dev server request error: {err}");
            }
        }
        debug!("dev server request loop ended");
    });

    info!("dev server at http://127.0.0.1:{port}/");
    Ok(HttpServer { server, port })
}

/// Handle a single HTTP request.
fn handle_request(request: Request, roots: &[PathBuf], ws_port: u16) -> anyhow::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("");

    if path == CLIENT_JS_PATH {
        let response = Response::from_string(client_js(ws_port))
            .with_header(header("Content-Type", "application/javascript"));
        request.respond(response)?;
        return Ok(());
    }

    let Some(rel) = sanitize(path) else {
        return respond_not_found(request);
    };

    for root in roots {
        if let Some(file) = resolve_file(root, &rel) {
            return respond_file(request, &file);
        }
    }

    respond_not_found(request)
}

/// Map a URL path to a safe relative filesystem path.
///
/// Rejects anything that would escape the roots; maps directories to
/// their `index.html`.
fn sanitize(url_path: &str) -> Option<PathBuf> {
    let trimmed = url_path.trim_start_matches('/');
    let candidate = if trimmed.is_empty() {
        PathBuf::from("index.html")
    } else {
        PathBuf::from(trimmed)
    };

    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            _ => return None,
        }
    }

    Some(candidate)
}

fn resolve_file(root: &Path, rel: &Path) -> Option<PathBuf> {
    let candidate = root.join(rel);
    if candidate.is_file() {
        return Some(candidate);
    }
    if candidate.is_dir() {
        let index = candidate.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }
    None
}

/// Respond with a static file, injecting the live-reload script into
/// HTML.
fn respond_file(request: Request, path: &Path) -> anyhow::Result<()> {
    let content_type = mime_for(path);
    let mut body = fs::read(path)?;

    if content_type == "text/html" {
        body = inject_livereload(body);
    }

    let response =
        Response::from_data(body).with_header(header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn respond_not_found(request: Request) -> anyhow::Result<()> {
    let response = Response::from_string("404 Not Found")
        .with_status_code(404)
        .with_header(header("Content-Type", "text/plain"));
    request.respond(response)?;
    Ok(())
}

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field, value).expect("static header")
}

/// Insert the live-reload script tag before `</body>`, or append it when
/// the page has no closing body tag.
fn inject_livereload(body: Vec<u8>) -> Vec<u8> {
    let html = match String::from_utf8(body) {
        Ok(html) => html,
        Err(err) => return err.into_bytes(),
    };

    let tag = script_tag();
    let injected = match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + tag.len() + 1);
            out.push_str(&html[..pos]);
            out.push_str(tag);
            out.push('\n');
            out.push_str(&html[pos..]);
            out
        }
        None => {
            let mut out = html;
            out.push('\n');
            out.push_str(tag);
            out
        }
    };

    injected.into_bytes()
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        "txt" => "text/plain",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}
