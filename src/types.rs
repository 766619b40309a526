//! Core types and traits for the decoder library.
//!
//! This module defines the fundamental types and traits that form the
//! foundation of the library's API.

use crate::error::Result;

/// Primary trait for audio decoders
///
/// One call consumes one compressed packet and produces zero samples (for
/// skipped packets) or exactly one frame of 16-bit PCM.
pub trait AudioDecoder: Send + Sync {
    /// Decode one packet to audio samples
    ///
    /// # Arguments
    ///
    /// * `data` - One compressed packet
    ///
    /// # Returns
    ///
    /// Decoded audio samples as 16-bit PCM; empty when the packet was too
    /// short for its declared mode and was skipped
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails in a way frame concealment cannot
    /// absorb
    fn decode(&mut self, data: &[u8]) -> Result<Vec<i16>>;

    /// Decode one packet into a pre-allocated output buffer (zero-copy)
    ///
    /// # Arguments
    ///
    /// * `data` - One compressed packet
    /// * `output` - Buffer with room for at least one frame
    ///
    /// # Returns
    ///
    /// Number of samples written (zero or one frame)
    fn decode_to_buffer(&mut self, data: &[u8], output: &mut [i16]) -> Result<usize>;

    /// Get codec information
    fn info(&self) -> CodecInfo;

    /// Reset decoder state
    ///
    /// This clears all internal state and prepares the decoder for fresh
    /// input. Useful for handling stream discontinuities.
    fn reset(&mut self) -> Result<()>;

    /// Get the frame size in samples
    fn frame_size(&self) -> usize;
}

/// Audio codec information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecInfo {
    /// Codec name (e.g., "G.723.1")
    pub name: &'static str,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u8,
    /// Nominal bitrate in bits per second
    pub bitrate: u32,
    /// Frame size in samples
    pub frame_size: usize,
    /// RTP payload type (if standard)
    pub payload_type: Option<u8>,
}

/// Decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Enable the pitch + formant postfilter chain
    pub postfilter: bool,
}

impl DecoderConfig {
    /// Create the default decoder configuration
    pub fn new() -> Self {
        Self { postfilter: true }
    }

    /// Set postfilter enablement
    pub fn with_postfilter(mut self, postfilter: bool) -> Self {
        self.postfilter = postfilter;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert!(config.postfilter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = DecoderConfig::new().with_postfilter(false);
        assert!(!config.postfilter);
    }
}
