// WebSocket-Protokoll-Definitionen
//
// Client → Server: reine Textzeilen im Kommando-Format (z.B. "FASE,2"),
// mehrere Zeilen pro Nachricht erlaubt.
// Server → Client: JSON-Nachrichten mit "type"-Tag.

use esp_core::StatusSnapshot;
use serde::Serialize;

/// Server → Client Nachrichten
/// Status-Updates, Bestätigungen und Fehler vom ESP32 an den Browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum WsServerMessage<'a> {
    #[serde(rename = "status")]
    Status {
        status: &'a StatusSnapshot,
        timestamp_ms: u64,
    },
    #[serde(rename = "reply")]
    Reply { message: &'a str },
    #[serde(rename = "error")]
    Error { message: &'a str },
}

impl<'a> WsServerMessage<'a> {
    /// Antwort des Controllers; Texte mit "Error" werden als Fehler markiert
    pub fn from_reply(text: &'a str) -> Self {
        if text.starts_with("Error") {
            WsServerMessage::Error { message: text }
        } else {
            WsServerMessage::Reply { message: text }
        }
    }

    /// Serialisiert in `buffer`, `None` wenn der Buffer zu klein ist
    pub fn to_json<'b>(&self, buffer: &'b mut [u8]) -> Option<&'b str> {
        let n = serde_json_core::to_slice(self, buffer).ok()?;
        core::str::from_utf8(&buffer[..n]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_json() {
        let mut buffer = [0u8; 128];
        let json = WsServerMessage::from_reply("Sequence started").to_json(&mut buffer);
        assert_eq!(json, Some(r#"{"type":"reply","message":"Sequence started"}"#));
    }

    #[test]
    fn test_error_reply_is_tagged_as_error() {
        let mut buffer = [0u8; 128];
        let json = WsServerMessage::from_reply("Error: invalid number").to_json(&mut buffer);
        assert_eq!(json, Some(r#"{"type":"error","message":"Error: invalid number"}"#));
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buffer = [0u8; 8];
        assert_eq!(WsServerMessage::from_reply("Transition started").to_json(&mut buffer), None);
    }
}
