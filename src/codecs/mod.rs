//! # Audio Codec Implementations
//!
//! This module contains the codec implementations shipped by this crate.
//!
//! ## Available Codecs
//!
//! ### G.723.1 - [`g7231`]
//! - **Standard**: ITU-T G.723.1
//! - **Sample Rate**: 8 kHz
//! - **Bitrate**: 6.3 / 5.3 kbps active frames, SID + untransmitted frames
//!   during silence
//! - **Use Case**: legacy VoIP and H.324 interoperability
//!
//! ## Usage
//!
//! ```rust
//! use g7231_core::codecs::g7231::G7231Decoder;
//! use g7231_core::types::{AudioDecoder, DecoderConfig};
//!
//! let mut decoder = G7231Decoder::new(DecoderConfig::new())?;
//!
//! // A 1-byte untransmitted frame yields 240 samples of comfort noise
//! let samples = decoder.decode(&[0x03])?;
//! assert_eq!(samples.len(), 240);
//! # Ok::<(), g7231_core::error::CodecError>(())
//! ```

pub mod g7231;
