//! one thread per websocket subscriber
//!
//! The socket is polled with a short read timeout; between reads the thread
//! drains its outbox of mode announcements and frames queued by the bridge
//! threads.  A malformed or unrecognized control message drops the client;
//! that is the whole error policy, there is no partial recovery.
use log::{debug, warn};
use std::{net::TcpStream, sync::mpsc, sync::Arc, time::Duration};
use tungstenite::{accept, Error, Message};

use crate::{
    common::{box_error::BoxError, control_message},
    server::{gateway::Gateway, subscriber_list::ClientEvent},
};

pub fn run(stream: TcpStream, gateway: Arc<Gateway>) -> Result<(), BoxError> {
    let mut sock = match accept(stream) {
        Ok(sock) => sock,
        Err(e) => {
            warn!("websocket handshake failed: {}", e);
            return Ok(());
        }
    };
    // poll the socket so we can interleave reads with outbox drains
    sock.get_ref()
        .set_read_timeout(Some(Duration::new(0, 20_000_000)))?;

    let (outbox_tx, outbox_rx) = mpsc::channel();
    let id = gateway.on_connect(outbox_tx);
    debug!("client {} connected", id);

    loop {
        match sock.read_message() {
            Ok(Message::Text(payload)) => {
                if let Err(e) = gateway.on_client_message(id, &payload) {
                    warn!("dropping client {}: {}", id, e);
                    let _res = sock.close(None);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // handled by the library
            }
            Ok(_) => {
                // binary from a client is not part of the protocol
                warn!("dropping client {}: binary payload", id);
                let _res = sock.close(None);
                break;
            }
            Err(Error::Io(e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // nothing to read right now
            }
            Err(Error::ConnectionClosed) | Err(Error::AlreadyClosed) => {
                break;
            }
            Err(e) => {
                debug!("client {} read error: {}", id, e);
                break;
            }
        }
        // deliver whatever the bridges queued for this client.  The outbox
        // is unbounded, so a stalled write here is what ultimately sheds a
        // client that stopped draining its socket
        let mut dead = false;
        for event in outbox_rx.try_iter() {
            let msg = match event {
                ClientEvent::Mode(mode) => {
                    Message::Text(control_message::mode_event(&mode).to_string())
                }
                ClientEvent::Frame(frame) => Message::Binary(frame),
            };
            if let Err(e) = sock.write_message(msg) {
                debug!("client {} write error: {}", id, e);
                dead = true;
                break;
            }
        }
        if dead {
            break;
        }
    }

    gateway.on_disconnect(id);
    debug!("client {} disconnected", id);
    Ok(())
}
