//! inbound side of the relay: scream datagram parsing and the UDP sink
//! that routes decoded chunks to their channels.
pub mod packet;
pub mod sink;
