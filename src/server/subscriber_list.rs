//! List of currently connected subscribers.  Used to fan frames out to them
//!
//! The gateway adds a subscriber on connect, retunes it on a tune command,
//! and removes it on disconnect.  Delivery is one mpsc sender per client;
//! the client's own websocket thread drains it.  A send that fails means
//! that client is on its way out and is ignored; it never affects delivery
//! to the rest of the list.
use std::fmt;

use crate::common::audio_mode::AudioMode;
use std::sync::mpsc;

/// what gets queued for a client's websocket thread to deliver
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// mode announcement, goes out as a JSON text message
    Mode(AudioMode),
    /// one complete compressed frame, goes out as one binary message
    Frame(Vec<u8>),
}

/// structure that represents one connected subscriber
///
/// - id - handed out by the list when the client connects
/// - channel - the channel the client is currently tuned to
/// - outbox - queue drained by the client's websocket thread.  Unbounded:
///   if the client's writes stall, the queue grows until the write fails
///   and the client thread tears the whole connection down
pub struct Subscriber {
    pub id: u64,
    pub channel: String,
    outbox: mpsc::Sender<ClientEvent>,
}

impl Subscriber {
    fn send(&self, event: ClientEvent) -> () {
        // a dead receiver just means the client thread is tearing down
        let _res = self.outbox.send(event);
    }
}

impl fmt::Display for Subscriber {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ id: {}, channel: {} }}", self.id, self.channel)
    }
}

/// Structure to hold the list of subscribers
pub struct SubscriberList {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl SubscriberList {
    pub fn new() -> SubscriberList {
        SubscriberList {
            subscribers: vec![],
            next_id: 1,
        }
    }
    /// add a newly connected client, tuned to the given channel.  Returns
    /// the id used for all later calls about this client.
    pub fn add(&mut self, channel: &str, outbox: mpsc::Sender<ClientEvent>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            channel: String::from(channel),
            outbox,
        });
        id
    }
    /// drop a client on disconnect
    pub fn remove(&mut self, id: u64) -> () {
        self.subscribers.retain(|s| s.id != id);
    }
    /// point a client at a different channel
    pub fn tune(&mut self, id: u64, channel: &str) -> () {
        for sub in &mut self.subscribers {
            if sub.id == id {
                sub.channel = String::from(channel);
                return ();
            }
        }
    }
    /// which channel is this client tuned to
    pub fn channel_of(&self, id: u64) -> Option<String> {
        self.subscribers
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.channel.clone())
    }
    /// ids of everyone tuned to a channel
    pub fn subscribers_of(&self, channel: &str) -> Vec<u64> {
        self.subscribers
            .iter()
            .filter(|s| s.channel == channel)
            .map(|s| s.id)
            .collect()
    }
    /// queue an event for one client only (connect and tune replies)
    pub fn send_to(&self, id: u64, event: ClientEvent) -> () {
        for sub in &self.subscribers {
            if sub.id == id {
                sub.send(event);
                return ();
            }
        }
    }
    /// announce a channel's mode to everyone tuned to it
    pub fn broadcast_mode(&self, channel: &str, mode: &AudioMode) -> () {
        for sub in &self.subscribers {
            if sub.channel == channel {
                sub.send(ClientEvent::Mode(*mode));
            }
        }
    }
    /// push one compressed frame to everyone tuned to the channel
    pub fn broadcast_frame(&self, channel: &str, frame: &[u8]) -> () {
        for sub in &self.subscribers {
            if sub.channel == channel {
                sub.send(ClientEvent::Frame(frame.to_vec()));
            }
        }
    }
}

impl fmt::Display for SubscriberList {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[ ")?;
        for sub in &self.subscribers {
            write!(f, " {},", sub)?;
        }
        write!(f, " ]")
    }
}

#[cfg(test)]
mod test_subscriber_list {
    use super::*;

    fn connect(list: &mut SubscriberList, channel: &str) -> (u64, mpsc::Receiver<ClientEvent>) {
        let (tx, rx) = mpsc::channel();
        let id = list.add(channel, tx);
        (id, rx)
    }

    #[test]
    fn add_and_remove() {
        let mut list = SubscriberList::new();
        let (id, _rx) = connect(&mut list, "default");
        assert_eq!(list.channel_of(id), Some("default".to_string()));
        list.remove(id);
        assert_eq!(list.channel_of(id), None);
    }
    #[test]
    fn tune_moves_subscriber() {
        let mut list = SubscriberList::new();
        let (id, _rx) = connect(&mut list, "default");
        list.tune(id, "vm2");
        assert_eq!(list.channel_of(id), Some("vm2".to_string()));
        assert_eq!(list.subscribers_of("vm2"), vec![id]);
        assert_eq!(list.subscribers_of("default").len(), 0);
    }
    #[test]
    fn frames_only_reach_tuned_clients() {
        let mut list = SubscriberList::new();
        let (a, rx_a) = connect(&mut list, "vm2");
        let (_b, rx_b) = connect(&mut list, "vm3");
        list.broadcast_frame("vm2", &[1, 2, 3]);
        assert_eq!(rx_a.try_recv().unwrap(), ClientEvent::Frame(vec![1, 2, 3]));
        assert!(rx_b.try_recv().is_err());
        assert_eq!(list.subscribers_of("vm2"), vec![a]);
    }
    #[test]
    fn broadcast_with_no_subscribers_is_a_noop() {
        let list = SubscriberList::new();
        list.broadcast_frame("empty", &[9]);
        list.broadcast_mode("empty", &AudioMode::new(48000, 2));
    }
    #[test]
    fn dead_outbox_does_not_stop_fanout() {
        let mut list = SubscriberList::new();
        let (dead_tx, dead_rx) = mpsc::channel();
        list.add("vm2", dead_tx);
        drop(dead_rx); // client thread already gone
        let (_id, rx) = connect(&mut list, "vm2");
        list.broadcast_frame("vm2", &[7]);
        assert_eq!(rx.try_recv().unwrap(), ClientEvent::Frame(vec![7]));
    }
    #[test]
    fn mode_goes_to_one_client_on_send_to() {
        let mut list = SubscriberList::new();
        let (a, rx_a) = connect(&mut list, "vm2");
        let (_b, rx_b) = connect(&mut list, "vm2");
        let mode = AudioMode::new(48000, 2);
        list.send_to(a, ClientEvent::Mode(mode));
        assert_eq!(rx_a.try_recv().unwrap(), ClientEvent::Mode(mode));
        assert!(rx_b.try_recv().is_err());
    }
}
