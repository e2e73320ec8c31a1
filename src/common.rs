//! These modules are shared between the inbound (scream) and outbound
//! (gateway) sides of the relay.
pub mod audio_mode;
pub mod box_error;
pub mod config;
pub mod control_message;
