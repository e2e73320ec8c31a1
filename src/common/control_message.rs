//! messages exchanged with subscribers on the websocket control channel.
//!
//! Both directions are JSON objects with an "event" name and an event
//! specific "data" object.  Parsing is strict on purpose: a client that
//! sends anything malformed or unrecognized gets dropped, so every parse
//! failure here surfaces as an error to the caller.
use serde_json::{json, Value};
use simple_error::bail;

use crate::common::{audio_mode::AudioMode, box_error::BoxError};

/// a command received from a subscriber.
#[derive(Debug, PartialEq)]
pub enum ClientCommand {
    /// select which channel the client wants frames for
    Tune { channel: String },
}

impl ClientCommand {
    pub fn from_string(data: &str) -> Result<ClientCommand, BoxError> {
        let raw: Value = serde_json::from_str(data)?;
        Self::from_json(&raw)
    }
    pub fn from_json(raw: &Value) -> Result<ClientCommand, BoxError> {
        if !raw["event"].is_string() {
            bail!("no event in message");
        }
        if !raw["data"].is_object() {
            bail!("no data in message");
        }
        match raw["event"].as_str().unwrap() {
            "tune" => match raw["data"]["channel"].as_str() {
                Some(channel) => Ok(ClientCommand::Tune {
                    channel: String::from(channel),
                }),
                None => {
                    bail!("non-string channel in tune");
                }
            },
            other => {
                bail!("unknown event: {}", other);
            }
        }
    }
}

/// build the mode announcement sent to subscribers on connect, on tune, and
/// whenever a channel's mode is (re)established.
pub fn mode_event(mode: &AudioMode) -> Value {
    json!({
        "event": "mode",
        "data": mode,
    })
}

#[cfg(test)]
mod test_control_message {
    use super::*;

    #[test]
    fn parse_tune() {
        let data = r#"{ "event": "tune", "data": { "channel": "vm2" } }"#;
        let cmd = ClientCommand::from_string(data).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Tune {
                channel: String::from("vm2")
            }
        );
    }
    #[test]
    fn reject_unknown_event() {
        let data = r#"{ "event": "bogus", "data": {} }"#;
        assert!(ClientCommand::from_string(data).is_err());
    }
    #[test]
    fn reject_missing_data() {
        let data = r#"{ "event": "tune" }"#;
        assert!(ClientCommand::from_string(data).is_err());
    }
    #[test]
    fn reject_non_string_channel() {
        let data = r#"{ "event": "tune", "data": { "channel": 7 } }"#;
        assert!(ClientCommand::from_string(data).is_err());
    }
    #[test]
    fn reject_garbage() {
        assert!(ClientCommand::from_string("not json at all").is_err());
    }
    #[test]
    fn mode_event_shape() {
        let v = mode_event(&AudioMode::new(48000, 2));
        assert_eq!(v["event"], "mode");
        assert_eq!(v["data"]["rate"], 48000);
        assert_eq!(v["data"]["channels"], 2);
    }
}
