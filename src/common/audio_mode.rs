//! the (sample rate, channel count) pair an audio stream is running at.
//!
//! Both sides of the relay speak in terms of this.  The scream decoder tags
//! every chunk with the mode it was recorded in, and the gateway announces a
//! channel's mode to subscribers so they can configure their decoder before
//! the frames start.
use std::fmt;

use serde::Serialize;

/// mode of an audio stream.  Compared by value; two chunks with equal modes
/// can be fed to the same encoder session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioMode {
    pub rate: u32,
    pub channels: u8,
}

impl AudioMode {
    pub fn new(rate: u32, channels: u8) -> AudioMode {
        AudioMode { rate, channels }
    }
}

impl fmt::Display for AudioMode {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ rate: {}, channels: {} }}", self.rate, self.channels)
    }
}
