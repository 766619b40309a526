//! # G7231-Core: ITU-T G.723.1 Speech Decoder
//!
//! A bit-exact fixed-point implementation of the G.723.1 decoder for VoIP
//! applications, covering both active bitrates (6.3 and 5.3 kbit/s), the
//! silence compression extension (SID and untransmitted frames with comfort
//! noise generation), frame erasure concealment and the optional pitch +
//! formant postfilter.
//!
//! ## Features
//!
//! - **Bit-exact arithmetic**: saturating 16/32-bit fixed point throughout,
//!   matching the reference decoder's rounding in every path
//! - **Silence compression**: SID gain tracking and deterministic comfort
//!   noise from the decoder-local random generator
//! - **Concealment**: voiced/unvoiced classification and residual
//!   interpolation over up to three consecutive erased frames
//! - **Zero allocation**: fixed-size state, no heap use on the decode path
//!
//! ## Usage
//!
//! ```rust
//! use g7231_core::{AudioDecoder, DecoderConfig, G7231Decoder};
//!
//! let mut decoder = G7231Decoder::new(DecoderConfig::new())?;
//!
//! // Packet size is selected by the two mode bits of byte 0:
//! // 24 bytes (6.3k), 20 bytes (5.3k), 4 bytes (SID), 1 byte (untransmitted)
//! let packet = [0x03u8];
//! let samples = decoder.decode(&packet)?;
//! assert_eq!(samples.len(), 240); // 30 ms at 8 kHz
//! # Ok::<(), g7231_core::CodecError>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`error::Result`]. Packets shorter than their
//! declared mode are consumed without emitting a frame; corrupted active
//! frames are concealed rather than reported, so the only decode-time error
//! callers see is an undersized output buffer.

#![warn(missing_docs)]

pub mod codecs;
pub mod error;
pub mod types;

pub use codecs::g7231::G7231Decoder;
pub use error::{CodecError, Result};
pub use types::{AudioDecoder, CodecInfo, DecoderConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supported codec names
pub const SUPPORTED_CODECS: &[&str] = &["G.723.1"];

/// Initialize the library (logs version info)
pub fn init() {
    tracing::info!("G7231-Core v{} initialized", VERSION);
    tracing::info!("Supported codecs: {:?}", SUPPORTED_CODECS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_decoder_reexport() {
        let decoder = G7231Decoder::default();
        assert_eq!(decoder.frame_size(), 240);
    }
}
