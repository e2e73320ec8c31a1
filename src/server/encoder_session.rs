//! one live opus encoder bound to one audio mode
//!
//! The session takes normalized f32 chunks of whatever size the network
//! delivered, converts them to 16 bit PCM, and clocks out fixed size opus
//! frames whenever enough samples have accumulated.  Partial frames ride in
//! the accumulator across chunk boundaries; they are lost if the session is
//! retired, which is the documented cost of a mode switch.
use simple_error::bail;

use crate::common::{audio_mode::AudioMode, box_error::BoxError};

/// samples per channel in one compressed frame.  10msec at 48k.  This is a
/// tunable constant, not derived from the stream's rate.
pub const FRAME_SAMPLES: usize = 480;

// opus wants one of its native rates; the announced mode rate just tells the
// subscriber what the source PCM claimed.
const OPUS_RATE: u32 = 48000;
const OPUS_BITRATE: i32 = 48000;

pub struct EncoderSession {
    mode: AudioMode,
    encoder: opus::Encoder,
    accum: Vec<i16>,
}

impl EncoderSession {
    pub fn new(mode: AudioMode) -> Result<EncoderSession, BoxError> {
        let channels = match mode.channels {
            1 => opus::Channels::Mono,
            2 => opus::Channels::Stereo,
            n => {
                bail!("can't encode {} channels", n);
            }
        };
        let mut encoder = opus::Encoder::new(OPUS_RATE, channels, opus::Application::Audio)?;
        encoder.set_bitrate(opus::Bitrate::Bits(OPUS_BITRATE))?;
        Ok(EncoderSession {
            mode,
            encoder,
            accum: Vec::new(),
        })
    }
    /// the mode this session was built for.  Chunks of any other mode must
    /// never reach [`push`](Self::push).
    pub fn mode(&self) -> AudioMode {
        self.mode
    }
    /// feed one chunk of normalized samples; returns the complete frames
    /// that became available.
    ///
    /// A sample that doesn't convert to a 16 bit integer means the upstream
    /// audio is out of range or corrupt.  That is fatal for this session;
    /// the caller tears it down and rebuilds on the next good chunk.
    pub fn push(&mut self, samples: &[f32]) -> Result<Vec<Vec<u8>>, BoxError> {
        for &s in samples {
            let v = (s * 32767.0).floor();
            if v < i16::MIN as f32 || v > i16::MAX as f32 {
                bail!("sample out of range: {}", s);
            }
            self.accum.push(v as i16);
        }
        let frame_len = FRAME_SAMPLES * self.mode.channels as usize;
        let mut frames: Vec<Vec<u8>> = Vec::new();
        while self.accum.len() >= frame_len {
            let frame = self
                .encoder
                .encode_vec(&self.accum[0..frame_len], frame_len)?;
            self.accum.drain(0..frame_len);
            frames.push(frame);
        }
        Ok(frames)
    }
}
