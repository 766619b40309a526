//! ITU-T G.723.1 speech decoder.
//!
//! Decodes 24-byte (6.3 kbit/s) and 20-byte (5.3 kbit/s) active frames,
//! 4-byte silence insertion descriptors and 1-byte untransmitted frames
//! into 240 samples of 16-bit PCM at 8 kHz. The arithmetic is bit-exact
//! fixed point throughout: excitation history, pitch lags, filter memories
//! and the comfort noise generator state all stay synchronized with a
//! conforming encoder only if every rounding step below is preserved.
//!
//! Pipeline per frame: bitstream unpack, LSP inverse quantization and
//! interpolation, adaptive + fixed codebook excitation (or concealment /
//! comfort noise), LP synthesis, then an optional pitch and formant
//! postfilter chain.

mod acelp;
mod basic_ops;
mod bitstream;
mod cng;
mod excitation;
mod lsp;
mod postfilter;
mod tables;

use tracing::{debug, trace, warn};

use crate::error::{CodecError, Result};
use crate::types::{AudioDecoder, CodecInfo, DecoderConfig};

use acelp::{dot_product, lp_synthesis_filter, scale_vector, weighted_vector_sum};
use basic_ops::{clip_int16, sat_add32, Word16, Word32};
use bitstream::{unpack_frame, FrameParams};
use cng::sid_gain_from_index;
use excitation::{autocorr_max, gen_acb_excitation, gen_fcb_excitation, residual_interp};
use lsp::{inverse_quant, lsp_interpolate};
use postfilter::PpfParam;
use tables::{FIXED_CB_GAIN, FRAME_SIZE};

pub(crate) const FRAME_LEN: usize = 240;
pub(crate) const SUBFRAME_LEN: usize = 60;
pub(crate) const SUBFRAMES: usize = 4;
pub(crate) const LPC_ORDER: usize = 10;
pub(crate) const PITCH_MIN: usize = 18;
pub(crate) const PITCH_MAX: usize = PITCH_MIN + 127;
pub(crate) const PITCH_ORDER: usize = 5;
pub(crate) const GRID_SIZE: usize = 2;
pub(crate) const PULSE_MAX: usize = 6;
pub(crate) const GAIN_LEVELS: usize = 24;
pub(crate) const LSP_BANDS: usize = 3;
pub(crate) const LSP_CB_SIZE: usize = 256;

const CNG_RANDOM_SEED: Word32 = 12345;

/// Frame classification from the 2-bit mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameType {
    /// Active speech
    Active,
    /// Silence insertion descriptor
    Sid,
    Untransmitted,
}

/// Active frame bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rate {
    Rate6300,
    Rate5300,
}

/// G.723.1 decoder with all persistent state owned inline.
///
/// Instances are independent; decoding the same packet sequence on two
/// fresh decoders produces byte-identical output.
#[derive(Clone)]
pub struct G7231Decoder {
    postfilter: bool,

    params: FrameParams,
    past_frame_type: FrameType,
    erased_frames: i32,

    prev_lsp: [Word16; LPC_ORDER],
    sid_lsp: [Word16; LPC_ORDER],
    prev_excitation: [Word16; PITCH_MAX],
    excitation: [Word16; PITCH_MAX + FRAME_LEN + 4],
    synth_mem: [Word16; LPC_ORDER],
    fir_mem: [Word16; LPC_ORDER],
    iir_mem: [Word32; LPC_ORDER],

    random_seed: Word32,
    cng_random_seed: Word32,
    interp_index: i32,
    interp_gain: Word32,
    sid_gain: Word32,
    cur_gain: Word32,
    reflection_coef: Word32,
    pf_gain: Word32,

    /// Working buffer shared by the scaled-excitation analysis, the
    /// synthesis filter and the comfort noise generator.
    audio: [Word16; FRAME_LEN + LPC_ORDER + PITCH_MAX + 4],
}

impl G7231Decoder {
    /// Create a decoder from a configuration.
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        debug!(postfilter = config.postfilter, "creating G.723.1 decoder");

        Ok(Self {
            postfilter: config.postfilter,
            params: FrameParams::default(),
            past_frame_type: FrameType::Sid,
            erased_frames: 0,
            prev_lsp: tables::DC_LSP,
            sid_lsp: tables::DC_LSP,
            prev_excitation: [0; PITCH_MAX],
            excitation: [0; PITCH_MAX + FRAME_LEN + 4],
            synth_mem: [0; LPC_ORDER],
            fir_mem: [0; LPC_ORDER],
            iir_mem: [0; LPC_ORDER],
            random_seed: 0,
            cng_random_seed: CNG_RANDOM_SEED,
            interp_index: 0,
            interp_gain: 0,
            sid_gain: 0,
            cur_gain: 0,
            reflection_coef: 0,
            pf_gain: 1 << 12,
            audio: [0; FRAME_LEN + LPC_ORDER + PITCH_MAX + 4],
        })
    }

    /// Enable or disable the pitch + formant postfilter chain. Toggling
    /// touches no decoder state besides the flag itself.
    pub fn set_postfilter(&mut self, enabled: bool) {
        self.postfilter = enabled;
    }

    /// Classify the concealment mode of the frame that just decoded as
    /// voiced or unvoiced by the backward correlation of its excitation.
    /// Leaves the scaled excitation in the working buffer and captures its
    /// energy and scale for later SID gain estimation.
    fn comp_interp_index(&mut self, pitch_lag: i32) -> i32 {
        let offset = PITCH_MAX + 2 * SUBFRAME_LEN;

        let scale = scale_vector(
            &mut self.audio[LPC_ORDER..LPC_ORDER + FRAME_LEN + PITCH_MAX],
            &self.excitation[..FRAME_LEN + PITCH_MAX],
            FRAME_LEN + PITCH_MAX,
        );
        let pos = LPC_ORDER + offset;

        let mut ccr: Word32 = 0;
        let index = autocorr_max(
            &self.audio,
            pos,
            offset,
            &mut ccr,
            pitch_lag,
            SUBFRAME_LEN * 2,
            -1,
        );
        let ccr = sat_add32(ccr, 1 << 15) >> 16;

        let tgt_eng = dot_product(&self.audio[pos..], &self.audio[pos..], SUBFRAME_LEN * 2);
        self.sid_gain = sat_add32(tgt_eng, 1 << 15) >> 16;
        self.cur_gain = scale;

        if ccr <= 0 {
            return 0;
        }

        let back = pos - index as usize;
        let best_eng = dot_product(&self.audio[back..], &self.audio[back..], SUBFRAME_LEN * 2);
        let best_eng = sat_add32(best_eng, 1 << 15) >> 16;

        if best_eng * self.sid_gain >> 3 < ccr * ccr {
            index
        } else {
            0
        }
    }

    /// Decode the active frame excitation into the working buffers.
    fn decode_active_frame(&mut self, bad_frame: bool, lpc: &mut [Word16; SUBFRAMES * LPC_ORDER]) {
        if !bad_frame {
            self.erased_frames = 0;
        } else if self.erased_frames != 3 {
            self.erased_frames += 1;
        }

        let mut cur_lsp = [0 as Word16; LPC_ORDER];
        inverse_quant(&mut cur_lsp, &self.prev_lsp, &mut self.params.lsp_index, bad_frame);
        lsp_interpolate(lpc, &cur_lsp, &self.prev_lsp);
        self.prev_lsp = cur_lsp;

        self.excitation[..PITCH_MAX].copy_from_slice(&self.prev_excitation);

        if self.erased_frames == 0 {
            self.interp_gain = FIXED_CB_GAIN[((self.params.subframe[2].amp_index
                + self.params.subframe[3].amp_index)
                >> 1) as usize] as Word32;

            for i in 0..SUBFRAMES {
                let base = PITCH_MAX + i * SUBFRAME_LEN;
                let pitch_lag = self.params.pitch_lag[i >> 1];

                // The fixed codebook slice carries 4 spill samples for the
                // top 5.3 kbit/s pulse position
                gen_fcb_excitation(
                    &mut self.excitation[base..base + SUBFRAME_LEN + 4],
                    &self.params.subframe[i],
                    self.params.rate,
                    pitch_lag,
                    i,
                );
                let acb = gen_acb_excitation(
                    &self.excitation[i * SUBFRAME_LEN..i * SUBFRAME_LEN + PITCH_MAX],
                    pitch_lag,
                    &self.params.subframe[i],
                    self.params.rate,
                );

                for j in 0..SUBFRAME_LEN {
                    let fcb = clip_int16((self.excitation[base + j] as Word32) << 1);
                    self.excitation[base + j] = clip_int16(fcb as Word32 + acb[j] as Word32);
                }
            }

            self.interp_index = self.comp_interp_index(self.params.pitch_lag[1]);

            if self.postfilter {
                let mut ppf = [PpfParam::default(); SUBFRAMES];
                for (j, param) in ppf.iter_mut().enumerate() {
                    *param = self.comp_ppf_coeff(
                        PITCH_MAX + j * SUBFRAME_LEN,
                        self.params.pitch_lag[j >> 1],
                        self.params.rate,
                    );
                }
                for (j, param) in ppf.iter().enumerate() {
                    let src = PITCH_MAX + j * SUBFRAME_LEN;
                    let delayed = (src as i32 + param.index) as usize;
                    weighted_vector_sum(
                        &mut self.audio[LPC_ORDER + j * SUBFRAME_LEN..],
                        &self.excitation[src..],
                        &self.excitation[delayed..],
                        param.sc_gain,
                        param.opt_gain,
                        1 << 14,
                        15,
                        SUBFRAME_LEN,
                    );
                }
            } else {
                self.audio[LPC_ORDER..LPC_ORDER + FRAME_LEN]
                    .copy_from_slice(&self.excitation[PITCH_MAX..PITCH_MAX + FRAME_LEN]);
            }

            self.prev_excitation
                .copy_from_slice(&self.excitation[FRAME_LEN..FRAME_LEN + PITCH_MAX]);
        } else {
            self.interp_gain = (self.interp_gain * 3 + 2) >> 2;

            if self.erased_frames == 3 {
                // Third consecutive erasure: silence the frame entirely,
                // including the synthesis and postfilter memories, so the
                // normal filter tail emits exact zeros
                debug!("three consecutive erased frames, muting output");
                self.excitation.fill(0);
                self.prev_excitation.fill(0);
                self.audio.fill(0);
                self.synth_mem.fill(0);
                self.fir_mem.fill(0);
                self.iir_mem.fill(0);
            } else {
                debug!(erased = self.erased_frames, "concealing erased frame");
                residual_interp(
                    &mut self.excitation,
                    &mut self.audio[LPC_ORDER..],
                    self.interp_index,
                    self.interp_gain,
                    &mut self.random_seed,
                );
                self.prev_excitation.copy_from_slice(
                    &self.audio[LPC_ORDER + FRAME_LEN - PITCH_MAX..LPC_ORDER + FRAME_LEN],
                );
            }
        }

        self.cng_random_seed = CNG_RANDOM_SEED;
    }

    /// Decode a SID or untransmitted frame: refresh the comfort noise gain
    /// and regenerate noise excitation.
    fn decode_inactive_frame(&mut self, lpc: &mut [Word16; SUBFRAMES * LPC_ORDER]) {
        if self.params.frame_type == FrameType::Sid {
            self.sid_gain = sid_gain_from_index(self.params.subframe[0].amp_index);
            let prev_lsp = self.prev_lsp;
            inverse_quant(&mut self.sid_lsp, &prev_lsp, &mut self.params.lsp_index, false);
        } else if self.past_frame_type == FrameType::Active {
            self.sid_gain = self.estimate_sid_gain();
        }

        if self.past_frame_type == FrameType::Active {
            self.cur_gain = self.sid_gain;
        } else {
            self.cur_gain = (self.cur_gain * 7 + self.sid_gain) >> 3;
        }
        self.generate_noise();

        lsp_interpolate(lpc, &self.sid_lsp, &self.prev_lsp);
        self.prev_lsp = self.sid_lsp;
    }
}

impl AudioDecoder for G7231Decoder {
    fn decode(&mut self, data: &[u8]) -> Result<Vec<i16>> {
        let mut output = vec![0i16; FRAME_LEN];
        let written = self.decode_to_buffer(data, &mut output)?;
        output.truncate(written);
        Ok(output)
    }

    fn decode_to_buffer(&mut self, data: &[u8], output: &mut [i16]) -> Result<usize> {
        if data.is_empty() {
            warn!("empty packet - skipping");
            return Ok(0);
        }

        let dec_mode = (data[0] & 3) as usize;
        if data.len() < FRAME_SIZE[dec_mode] {
            warn!(
                expected = FRAME_SIZE[dec_mode],
                got = data.len(),
                "truncated packet - skipping"
            );
            return Ok(0);
        }
        trace!(mode = dec_mode, len = data.len(), "decoding frame");

        let mut bad_frame = false;
        if !unpack_frame(&mut self.params, data) {
            bad_frame = true;
            self.params.frame_type = if self.past_frame_type == FrameType::Active {
                FrameType::Active
            } else {
                FrameType::Untransmitted
            };
        }

        if output.len() < FRAME_LEN {
            return Err(CodecError::BufferTooSmall {
                needed: FRAME_LEN,
                actual: output.len(),
            });
        }

        let mut lpc = [0 as Word16; SUBFRAMES * LPC_ORDER];
        match self.params.frame_type {
            FrameType::Active => self.decode_active_frame(bad_frame, &mut lpc),
            FrameType::Sid | FrameType::Untransmitted => self.decode_inactive_frame(&mut lpc),
        }
        self.past_frame_type = self.params.frame_type;

        // LP synthesis in place over the working buffer, seeded by the
        // previous frame's tail
        self.audio[..LPC_ORDER].copy_from_slice(&self.synth_mem);
        for j in 0..SUBFRAMES {
            lp_synthesis_filter(
                &mut self.audio,
                LPC_ORDER + j * SUBFRAME_LEN,
                &lpc[j * LPC_ORDER..(j + 1) * LPC_ORDER],
                SUBFRAME_LEN,
                LPC_ORDER,
                1,
                1 << 12,
            );
        }
        self.synth_mem
            .copy_from_slice(&self.audio[FRAME_LEN..FRAME_LEN + LPC_ORDER]);

        if self.postfilter {
            self.formant_postfilter(&lpc, &mut output[..FRAME_LEN]);
        } else {
            // Unpostfiltered output is scaled by two
            for i in 0..FRAME_LEN {
                output[i] = clip_int16((self.audio[LPC_ORDER + i] as Word32) << 1);
            }
        }

        Ok(FRAME_LEN)
    }

    fn info(&self) -> CodecInfo {
        CodecInfo {
            name: "G.723.1",
            sample_rate: 8000,
            channels: 1,
            bitrate: 6300,
            frame_size: FRAME_LEN,
            payload_type: Some(4),
        }
    }

    fn reset(&mut self) -> Result<()> {
        let postfilter = self.postfilter;
        *self = Self::new(DecoderConfig::new().with_postfilter(postfilter))?;
        Ok(())
    }

    fn frame_size(&self) -> usize {
        FRAME_LEN
    }
}

impl Default for G7231Decoder {
    fn default() -> Self {
        Self::new(DecoderConfig::new()).expect("default configuration is valid")
    }
}
