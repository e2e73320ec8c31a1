//! listen for scream datagrams and route them to their channel's queue
//!
//! The socket read is non-blocking with a short timeout so the thread can
//! notice a dead gateway.  Sources that nobody associated are ignored; that
//! is just noise from unrelated traffic on the port, not an error.
use log::{error, info, warn};
use socket2::{Domain, SockAddr, Socket, Type};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
    sync::Arc,
    time::Duration,
};

use crate::{
    common::box_error::BoxError,
    scream::packet,
    server::gateway::Gateway,
};

// biggest datagram a sender will produce: 5 byte header plus 1152 PCM bytes.
// Leave headroom rather than splitting hairs over sender builds.
const MAX_DATAGRAM: usize = 2048;

/// maps an inbound source address to the logical channel it feeds.
///
/// Bindings come from configuration at startup.  Last write per source wins;
/// nothing stops two sources from feeding one channel but the result is
/// whatever interleaving the network gives you.
pub struct SourceRegistry {
    bindings: HashMap<String, String>,
}

impl SourceRegistry {
    pub fn new() -> SourceRegistry {
        SourceRegistry {
            bindings: HashMap::new(),
        }
    }
    /// bind a source address to a channel name
    pub fn associate(&mut self, channel: &str, source: &str) -> () {
        self.bindings
            .insert(source.to_string(), channel.to_string());
    }
    /// channel fed by this source, if anyone associated it
    pub fn channel_for(&self, source: &str) -> Option<&str> {
        self.bindings.get(source).map(|s| s.as_str())
    }
}

fn new_sock(port: u32) -> Result<UdpSocket, BoxError> {
    let raw_sock = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
    raw_sock.set_tos(0x10)?;
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port as u16);
    raw_sock.bind(&SockAddr::from(addr))?;
    Ok(UdpSocket::from(raw_sock))
}

/// run the sink loop.  Call this on its own thread; it returns only if the
/// socket goes bad.
pub fn run(port: u32, registry: SourceRegistry, gateway: Arc<Gateway>) -> Result<(), BoxError> {
    let sock = new_sock(port)?;
    sock.set_read_timeout(Some(Duration::new(0, 250_000_000)))?;
    info!("listening for scream packets on port {}", port);
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        match sock.recv_from(&mut buf) {
            Ok((amt, src)) => {
                let source = src.ip().to_string();
                let channel = match registry.channel_for(&source) {
                    Some(c) => c,
                    None => {
                        // unrecognized source address
                        continue;
                    }
                };
                match packet::decode(&buf[0..amt]) {
                    Ok(chunk) => {
                        gateway.feed(channel, chunk);
                    }
                    Err(e) => {
                        warn!("dropping packet from {}: {}", source, e);
                    }
                }
            }
            Err(e) => match e.kind() {
                std::io::ErrorKind::WouldBlock => {}
                std::io::ErrorKind::TimedOut => {}
                other_error => {
                    error!("scream socket went nuts: {}", other_error);
                    return Err(e.into());
                }
            },
        }
    }
}
