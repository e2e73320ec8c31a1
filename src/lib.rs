//! hurl - network audio gateway library
//!
//! provides library elements to take raw PCM off the wire from scream style
//! senders, transcode it to opus frames, and fan each named channel out to
//! the websocket subscribers tuned to it.
pub mod common;
pub mod scream;
pub mod server;
