// src/reload/message.rs

//! Live-reload message protocol.
//!
//! JSON messages sent over the WebSocket to browser clients:
//!
//! - `reload`: reload the whole page (structural change)
//! - `css`: re-fetch stylesheets in place (style-only change)
//! - `connected`: greeting sent once per connection

use serde::{Deserialize, Serialize};

/// A message pushed to live-reload clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload.
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Stylesheet-only refresh, no navigation.
    Css,

    /// Connection established.
    Connected { version: String },
}

impl ReloadMessage {
    pub fn reload() -> Self {
        Self::Reload { reason: None }
    }

    pub fn reload_with_reason(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn css() -> Self {
        Self::Css
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from a JSON string.
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_message_carries_type_tag() {
        let json = ReloadMessage::reload_with_reason("pages changed").to_json();
        assert!(json.contains(r#""type":"reload""#));
        assert!(json.contains(r#""reason":"pages changed""#));
    }

    #[test]
    fn css_message_is_bare() {
        assert_eq!(ReloadMessage::css().to_json(), r#"{"type":"css"}"#);
    }

    #[test]
    fn messages_round_trip() {
        let msg = ReloadMessage::reload();
        let parsed = ReloadMessage::from_json(&msg.to_json()).unwrap();
        assert_eq!(parsed, msg);

        assert_eq!(
            ReloadMessage::from_json(r#"{"type":"css"}"#),
            Some(ReloadMessage::Css)
        );
    }
}
