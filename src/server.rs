//! outbound side of the relay: channel sessions, opus encoding, and the
//! websocket fanout to subscribers.
pub mod channel_session;
pub mod client_thread;
pub mod encoder_session;
pub mod gateway;
pub mod gateway_server;
pub mod subscriber_list;
