//! per channel encoding state machine
//!
//! A channel is Uninitialized until its first chunk arrives, then Active
//! with the mode and encoder session that chunk established.  A chunk in a
//! different mode retires the old session and installs a new one before any
//! of its samples are encoded; whatever partial frame the old session was
//! holding is dropped.  The bridge thread that owns this struct is the only
//! consumer of the channel's queue, so the transition can't race an encode.
use log::warn;

use crate::{
    common::{audio_mode::AudioMode, box_error::BoxError},
    scream::packet::AudioChunk,
    server::encoder_session::EncoderSession,
};

/// what feeding one chunk produced
pub struct FeedResult {
    /// set when this chunk (re)established the channel's mode.  The caller
    /// announces it to subscribers.
    pub new_mode: Option<AudioMode>,
    /// complete compressed frames, in arrival order
    pub frames: Vec<Vec<u8>>,
}

pub struct ChannelSession {
    name: String,
    session: Option<EncoderSession>,
}

impl ChannelSession {
    pub fn new(name: &str) -> ChannelSession {
        ChannelSession {
            name: String::from(name),
            session: None,
        }
    }
    /// current mode, if the channel has seen audio since it was created or
    /// last torn down
    pub fn mode(&self) -> Option<AudioMode> {
        self.session.as_ref().map(|s| s.mode())
    }
    /// feed one chunk through the encoder
    ///
    /// An encode fault tears the session down; the next valid chunk builds
    /// a fresh one and counts as a mode establishment again.
    pub fn feed(&mut self, chunk: AudioChunk) -> Result<FeedResult, BoxError> {
        let mut new_mode: Option<AudioMode> = None;
        if self.mode() != Some(chunk.mode) {
            if let Some(old) = self.mode() {
                warn!(
                    "channel {} mode switch {} -> {}",
                    self.name, old, chunk.mode
                );
            }
            // the new session replaces the old one before any of this
            // chunk's samples are touched
            self.session = Some(EncoderSession::new(chunk.mode)?);
            new_mode = Some(chunk.mode);
        }
        let frames = match self.session.as_mut() {
            Some(session) => match session.push(&chunk.samples) {
                Ok(frames) => frames,
                Err(e) => {
                    // corrupted stream signal, not a transient.  Drop the
                    // whole session and let the next chunk rebuild it.
                    self.session = None;
                    return Err(e);
                }
            },
            // unreachable, the session was just installed above
            None => Vec::new(),
        };
        Ok(FeedResult { new_mode, frames })
    }
}

#[cfg(test)]
mod test_channel_session {
    use super::*;
    use crate::server::encoder_session::FRAME_SAMPLES;

    fn chunk(mode: AudioMode, samples_per_chan: usize) -> AudioChunk {
        AudioChunk {
            samples: vec![0.25; samples_per_chan * mode.channels as usize],
            mode,
        }
    }

    #[test]
    fn first_chunk_establishes_mode() {
        let mut session = ChannelSession::new("vm2");
        assert_eq!(session.mode(), None);
        let mode = AudioMode::new(48000, 2);
        let res = session.feed(chunk(mode, FRAME_SAMPLES)).unwrap();
        assert_eq!(res.new_mode, Some(mode));
        assert_eq!(res.frames.len(), 1);
        assert_eq!(session.mode(), Some(mode));
    }
    #[test]
    fn same_mode_does_not_reannounce() {
        let mut session = ChannelSession::new("vm2");
        let mode = AudioMode::new(48000, 2);
        session.feed(chunk(mode, FRAME_SAMPLES)).unwrap();
        let res = session.feed(chunk(mode, FRAME_SAMPLES)).unwrap();
        assert_eq!(res.new_mode, None);
    }
    #[test]
    fn mode_switch_retires_old_session() {
        let mut session = ChannelSession::new("vm2");
        let stereo = AudioMode::new(48000, 2);
        let mono = AudioMode::new(44100, 1);
        session.feed(chunk(stereo, FRAME_SAMPLES)).unwrap();
        // leave half a frame buffered in the stereo session
        let res = session.feed(chunk(stereo, FRAME_SAMPLES / 2)).unwrap();
        assert_eq!(res.frames.len(), 0);
        // the mono chunk flips the mode exactly once and the buffered half
        // frame is gone: a full mono frame's worth yields exactly one frame
        let res = session.feed(chunk(mono, FRAME_SAMPLES)).unwrap();
        assert_eq!(res.new_mode, Some(mono));
        assert_eq!(res.frames.len(), 1);
        assert_eq!(session.mode(), Some(mono));
        // and it sticks
        let res = session.feed(chunk(mono, FRAME_SAMPLES)).unwrap();
        assert_eq!(res.new_mode, None);
    }
    #[test]
    fn encode_fault_tears_down() {
        let mut session = ChannelSession::new("vm2");
        let mode = AudioMode::new(48000, 2);
        session.feed(chunk(mode, FRAME_SAMPLES)).unwrap();
        let bad = AudioChunk {
            samples: vec![3.0; 8],
            mode,
        };
        assert!(session.feed(bad).is_err());
        assert_eq!(session.mode(), None);
        // next good chunk re-establishes the mode
        let res = session.feed(chunk(mode, FRAME_SAMPLES)).unwrap();
        assert_eq!(res.new_mode, Some(mode));
    }
}
