//! one datagram's worth of audio off the wire
//!
//! Scream style senders put a tiny header in front of raw interleaved PCM.
//! This module turns one datagram into an [`AudioChunk`]: normalized f32
//! samples plus the mode they were recorded in.  It is a stateless decode;
//! anything the header declares that we can't handle is an error and the
//! caller drops the datagram.
use byteorder::{ByteOrder, LittleEndian};
use simple_error::bail;

use crate::common::{audio_mode::AudioMode, box_error::BoxError};

// The wire layout, one datagram per packet:
//   byte 0: high bit set -> 44100Hz base, clear -> 48000Hz base
//           low 7 bits   -> rate multiplier (carried but not applied, the
//                           senders in the field never set it)
//   byte 1: bit depth (8, 16 or 32)
//   byte 2: channel count (1 or 2)
//   byte 3..4: reserved
//   byte 5..: interleaved little-endian signed PCM at the declared depth
//
// Header length is fixed at 5.  Some sender builds pad to 6; we do not chase
// that and a sender that pads will decode with one garbage sample byte.
pub const SCREAM_HEADER_SIZE: usize = 5;

/// one decoded unit of PCM derived from one inbound datagram.
///
/// samples are interleaved, normalized to [-1, 1].  Ownership moves from the
/// decoder through the channel queue to the encoder and is never retained.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub mode: AudioMode,
}

/// decode one datagram.  Unsupported depth or channel count, or a buffer
/// shorter than the header, is a decode fault.
pub fn decode(buf: &[u8]) -> Result<AudioChunk, BoxError> {
    if buf.len() < SCREAM_HEADER_SIZE {
        bail!("truncated header: {} bytes", buf.len());
    }
    let rate: u32 = if buf[0] & 0x80 != 0 { 44100 } else { 48000 };
    let _multiplier = buf[0] & 0x7f;
    let depth = buf[1];
    let channels = buf[2];
    if channels < 1 || channels > 2 {
        bail!("unsupported channel count: {}", channels);
    }
    let pcm = &buf[SCREAM_HEADER_SIZE..];
    let samples: Vec<f32> = match depth {
        8 => pcm.iter().map(|&b| b as i8 as f32 / 128.0).collect(),
        16 => pcm
            .chunks_exact(2)
            .map(|b| LittleEndian::read_i16(b) as f32 / 32768.0)
            .collect(),
        32 => pcm
            .chunks_exact(4)
            .map(|b| LittleEndian::read_i32(b) as f32 / 2147483648.0)
            .collect(),
        _ => {
            bail!("unsupported bit depth: {}", depth);
        }
    };
    Ok(AudioChunk {
        samples,
        mode: AudioMode::new(rate, channels),
    })
}

#[cfg(test)]
mod test_packet {
    use super::*;

    fn header(rate_flag: u8, depth: u8, channels: u8) -> Vec<u8> {
        vec![rate_flag, depth, channels, 0, 0]
    }

    #[test]
    fn decode_16_bit_stereo() {
        let mut buf = header(0, 16, 2);
        for v in [16384i16, -16384, 32767, -32768] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let chunk = decode(&buf).unwrap();
        assert_eq!(chunk.mode, AudioMode::new(48000, 2));
        assert_eq!(chunk.samples.len(), 4);
        assert!((chunk.samples[0] - 0.5).abs() < f32::EPSILON);
        assert!((chunk.samples[1] + 0.5).abs() < f32::EPSILON);
        assert!((chunk.samples[2] - 32767.0 / 32768.0).abs() < f32::EPSILON);
        assert!((chunk.samples[3] + 1.0).abs() < f32::EPSILON);
    }
    #[test]
    fn decode_8_bit_mono() {
        let mut buf = header(0, 8, 1);
        buf.extend_from_slice(&[64u8, (-64i8) as u8, 127]);
        let chunk = decode(&buf).unwrap();
        assert_eq!(chunk.mode, AudioMode::new(48000, 1));
        assert!((chunk.samples[0] - 0.5).abs() < f32::EPSILON);
        assert!((chunk.samples[1] + 0.5).abs() < f32::EPSILON);
        assert!((chunk.samples[2] - 127.0 / 128.0).abs() < f32::EPSILON);
    }
    #[test]
    fn decode_32_bit() {
        let mut buf = header(0, 32, 2);
        buf.extend_from_slice(&(1i32 << 30).to_le_bytes());
        buf.extend_from_slice(&(-(1i32 << 30)).to_le_bytes());
        let chunk = decode(&buf).unwrap();
        assert!((chunk.samples[0] - 0.25).abs() < f32::EPSILON);
        assert!((chunk.samples[1] + 0.25).abs() < f32::EPSILON);
    }
    #[test]
    fn rate_flag_selects_base_rate() {
        let chunk = decode(&header(0x80, 16, 2)).unwrap();
        assert_eq!(chunk.mode.rate, 44100);
        let chunk = decode(&header(0x00, 16, 2)).unwrap();
        assert_eq!(chunk.mode.rate, 48000);
    }
    #[test]
    fn multiplier_bits_do_not_change_rate() {
        // low 7 bits are carried on the wire but not applied
        let chunk = decode(&header(0x02, 16, 2)).unwrap();
        assert_eq!(chunk.mode.rate, 48000);
    }
    #[test]
    fn reject_24_bit() {
        assert!(decode(&header(0, 24, 2)).is_err());
    }
    #[test]
    fn reject_three_channels() {
        assert!(decode(&header(0, 16, 3)).is_err());
    }
    #[test]
    fn reject_truncated_header() {
        assert!(decode(&[0, 16]).is_err());
    }
    #[test]
    fn trailing_partial_sample_is_ignored() {
        let mut buf = header(0, 16, 1);
        buf.extend_from_slice(&[0x00, 0x40, 0xff]); // one sample plus a stray byte
        let chunk = decode(&buf).unwrap();
        assert_eq!(chunk.samples.len(), 1);
    }
}
