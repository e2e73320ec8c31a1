//! ties the two sides together: channel table, bridge threads, subscribers
//!
//! Each channel gets one mpsc queue and one bridge thread that is the sole
//! consumer of it.  The sink thread pushes decoded chunks in; the bridge
//! drains them through the channel's encoder session and hands frames and
//! mode announcements to the subscriber list.  Channels are created lazily,
//! on the first configured association or the first tune that names them,
//! and live for the life of the process.
use log::{debug, error, info};
use std::{
    collections::HashMap,
    sync::{mpsc, Arc, Mutex},
    thread,
};

use crate::{
    common::{audio_mode::AudioMode, box_error::BoxError, control_message::ClientCommand},
    scream::packet::AudioChunk,
    server::{
        channel_session::ChannelSession,
        subscriber_list::{ClientEvent, SubscriberList},
    },
};

// per channel entry in the table.  mode is the bridge thread's published
// snapshot, read for tune and connect replies.
struct ChannelHandle {
    mode: Option<AudioMode>,
    feed: mpsc::Sender<AudioChunk>,
}

pub struct Gateway {
    default_channel: String,
    channels: Mutex<HashMap<String, ChannelHandle>>,
    subscribers: Mutex<SubscriberList>,
}

impl Gateway {
    pub fn new(default_channel: &str) -> Arc<Gateway> {
        Arc::new(Gateway {
            default_channel: String::from(default_channel),
            channels: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(SubscriberList::new()),
        })
    }

    /// make sure a channel exists, spawning its bridge thread if this is the
    /// first reference to the name.  Channels are never destroyed.
    pub fn ensure_channel(self: &Arc<Self>, name: &str) -> () {
        let mut channels = self.channels.lock().unwrap();
        if channels.contains_key(name) {
            return ();
        }
        let (tx, rx) = mpsc::channel();
        channels.insert(
            String::from(name),
            ChannelHandle {
                mode: None,
                feed: tx,
            },
        );
        let gateway = Arc::clone(self);
        let channel = String::from(name);
        info!("creating channel {}", channel);
        thread::spawn(move || {
            gateway.bridge(&channel, rx);
        });
    }

    /// push a decoded chunk into a channel's queue.  Called by the sink
    /// thread; a name it was never told about is ignored.
    pub fn feed(&self, name: &str, chunk: AudioChunk) -> () {
        let channels = self.channels.lock().unwrap();
        if let Some(handle) = channels.get(name) {
            let _res = handle.feed.send(chunk);
        }
    }

    /// current mode of a channel, if it has one established
    pub fn mode_of(&self, name: &str) -> Option<AudioMode> {
        let channels = self.channels.lock().unwrap();
        channels.get(name).and_then(|h| h.mode)
    }

    fn set_mode(&self, name: &str, mode: Option<AudioMode>) -> () {
        let mut channels = self.channels.lock().unwrap();
        if let Some(handle) = channels.get_mut(name) {
            handle.mode = mode;
        }
    }

    // the bridge: sole consumer of one channel's queue.  recv blocks when
    // the channel is silent without holding any lock, so other channels and
    // new connections are unaffected.
    fn bridge(&self, channel: &str, rx: mpsc::Receiver<AudioChunk>) -> () {
        let mut session = ChannelSession::new(channel);
        for chunk in rx.iter() {
            match session.feed(chunk) {
                Ok(result) => {
                    if let Some(mode) = result.new_mode {
                        info!("channel {} mode is now {}", channel, mode);
                        self.set_mode(channel, Some(mode));
                        self.subscribers
                            .lock()
                            .unwrap()
                            .broadcast_mode(channel, &mode);
                    }
                    if !result.frames.is_empty() {
                        let subscribers = self.subscribers.lock().unwrap();
                        for frame in &result.frames {
                            subscribers.broadcast_frame(channel, frame);
                        }
                    }
                }
                Err(e) => {
                    error!("encoder fault on channel {}: {}", channel, e);
                    self.set_mode(channel, None);
                }
            }
        }
        // all senders dropped; nothing will ever feed this channel again
        debug!("bridge for channel {} exiting", channel);
    }

    /// a client connected.  Registers it tuned to the default channel and
    /// replies with the channel's mode if one is established.
    ///
    /// The list stays locked across the add and the reply so a bridge can't
    /// slip a frame into the outbox ahead of the mode event.
    pub fn on_connect(&self, outbox: mpsc::Sender<ClientEvent>) -> u64 {
        let mut subscribers = self.subscribers.lock().unwrap();
        let id = subscribers.add(&self.default_channel, outbox);
        if let Some(mode) = self.mode_of(&self.default_channel) {
            subscribers.send_to(id, ClientEvent::Mode(mode));
        }
        id
    }

    /// a client sent a text payload.  Any parse failure is a protocol
    /// violation and the caller closes the connection.
    pub fn on_client_message(self: &Arc<Self>, id: u64, payload: &str) -> Result<(), BoxError> {
        match ClientCommand::from_string(payload)? {
            ClientCommand::Tune { channel } => {
                debug!("client {} tuning to {}", id, channel);
                self.ensure_channel(&channel);
                // one lock across the retune and the reply: a bridge that
                // broadcasts between the two would put a frame in the
                // client's outbox ahead of the mode event
                let mut subscribers = self.subscribers.lock().unwrap();
                subscribers.tune(id, &channel);
                if let Some(mode) = self.mode_of(&channel) {
                    subscribers.send_to(id, ClientEvent::Mode(mode));
                }
            }
        }
        Ok(())
    }

    /// a client went away
    pub fn on_disconnect(&self, id: u64) -> () {
        self.subscribers.lock().unwrap().remove(id);
    }
}
