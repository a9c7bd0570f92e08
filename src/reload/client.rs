// src/reload/client.rs

//! Embedded browser-side live-reload client.
//!
//! Served from memory by the dev server; the script tag is injected into
//! every HTML response.

/// URL path the dev server answers with the client script.
pub const CLIENT_JS_PATH: &str = "/__sitebuild/livereload.js";

/// The tag injected before `</body>` of served HTML.
pub fn script_tag() -> &'static str {
    r#"<script src="/__sitebuild/livereload.js"></script>"#
}

/// Render the client script for the given WebSocket port.
pub fn client_js(ws_port: u16) -> String {
    CLIENT_JS_TEMPLATE.replace("__WS_PORT__", &ws_port.to_string())
}

const CLIENT_JS_TEMPLATE: &str = r#"(function () {
  'use strict';

  var RETRY_MS = 1000;

  function refreshStylesheets() {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    for (var i = 0; i < links.length; i++) {
      var link = links[i];
      var href = link.getAttribute('href');
      if (!href) { continue; }
      href = href.replace(/([?&])_sb=\d+(&?)/, function (_m, sep, amp) {
        return amp ? sep : '';
      });
      var joiner = href.indexOf('?') < 0 ? '?' : '&';
      link.setAttribute('href', href + joiner + '_sb=' + Date.now());
    }
  }

  function connect() {
    var ws = new WebSocket('ws://' + location.hostname + ':__WS_PORT__');

    ws.onmessage = function (ev) {
      var msg;
      try { msg = JSON.parse(ev.data); } catch (e) { return; }
      if (msg.type === 'reload') {
        location.reload();
      } else if (msg.type === 'css') {
        refreshStylesheets();
      }
    };

    ws.onclose = function () {
      setTimeout(connect, RETRY_MS);
    };
  }

  connect();
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_js_embeds_the_port() {
        let js = client_js(35729);
        assert!(js.contains(":35729"));
        assert!(!js.contains("__WS_PORT__"));
    }
}
