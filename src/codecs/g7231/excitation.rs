//! Excitation synthesis: fixed and adaptive codebook decoding, plus the
//! residual interpolation used for frame erasure concealment.

use super::acelp::dot_product;
use super::basic_ops::{sat_dadd32, Word16, Word32};
use super::bitstream::Subframe;
use super::tables::{
    ADAPTIVE_CB_GAIN170, ADAPTIVE_CB_GAIN85, COMBINATORIAL_TABLE, FIXED_CB_GAIN, MAX_POS,
    PITCH_CONTRIB, PULSES,
};
use super::{Rate, FRAME_LEN, GRID_SIZE, PITCH_MAX, PITCH_ORDER, PULSE_MAX, SUBFRAME_LEN};

/// Overlay a periodic train on the pulse vector: `buf[i+j] += buf[j]` for
/// every multiple of the pitch lag.
fn gen_dirac_train(buf: &mut [Word16], pitch_lag: i32) {
    let mut vector = [0 as Word16; SUBFRAME_LEN];
    vector.copy_from_slice(&buf[..SUBFRAME_LEN]);

    let lag = pitch_lag as usize;
    let mut i = lag;
    while i < SUBFRAME_LEN {
        for j in 0..SUBFRAME_LEN - i {
            buf[i + j] = buf[i + j].wrapping_add(vector[j]);
        }
        i += lag;
    }
}

/// Generate the fixed codebook excitation vector for one subframe.
///
/// `vector` must extend 4 samples past the subframe: the top 5.3 kbit/s
/// pulse position can land at index 63 and the overflow area is discarded
/// by the caller's buffer layout.
pub(super) fn gen_fcb_excitation(
    vector: &mut [Word16],
    subfrm: &Subframe,
    cur_rate: Rate,
    pitch_lag: i32,
    index: usize,
) {
    vector[..SUBFRAME_LEN].fill(0);

    if cur_rate == Rate::Rate6300 {
        if subfrm.pulse_pos >= MAX_POS[index] {
            return;
        }

        // Decode amplitudes and positions by walking the binomial table;
        // the row advances only when a pulse is placed
        let mut j = (PULSE_MAX as i32 - PULSES[index]) as usize;
        let mut temp = subfrm.pulse_pos;
        for i in 0..SUBFRAME_LEN / GRID_SIZE {
            temp -= COMBINATORIAL_TABLE[j][i];
            if temp >= 0 {
                continue;
            }
            temp += COMBINATORIAL_TABLE[j][i];
            j += 1;
            let gain = FIXED_CB_GAIN[subfrm.amp_index as usize];
            let negative = (subfrm.pulse_sign & (1 << (PULSE_MAX - j))) != 0;
            vector[subfrm.grid_index as usize + GRID_SIZE * i] =
                if negative { -gain } else { gain };
            if j == PULSE_MAX {
                break;
            }
        }
        if subfrm.dirac_train == 1 {
            gen_dirac_train(vector, pitch_lag);
        }
    } else {
        let cb_gain = FIXED_CB_GAIN[subfrm.amp_index as usize] as Word32;
        let cb_shift = subfrm.grid_index;
        let mut cb_sign = subfrm.pulse_sign;
        let mut cb_pos = subfrm.pulse_pos;

        for i in (0..8).step_by(2) {
            let offset = (((cb_pos & 7) << 3) + cb_shift + i) as usize;
            let pulse = if (cb_sign & 1) != 0 { cb_gain } else { -cb_gain };
            vector[offset] = pulse as Word16;
            cb_pos >>= 3;
            cb_sign >>= 1;
        }

        // Enhance harmonic components
        let gain_idx = (subfrm.ad_cb_gain << 1) as usize;
        let lag = PITCH_CONTRIB[gain_idx] as i32 + pitch_lag + subfrm.ad_cb_lag - 1;
        let beta = PITCH_CONTRIB[gain_idx + 1] as Word32;

        if lag < (SUBFRAME_LEN - 2) as i32 {
            let lag = lag as usize;
            for i in lag..SUBFRAME_LEN {
                let contrib = (beta * vector[i - lag] as Word32 >> 15) as Word16;
                vector[i] = vector[i].wrapping_add(contrib);
            }
        }
    }
}

/// Copy the delayed contribution out of the excitation history. The first
/// two taps are read directly; the rest wrap modulo the lag.
fn get_residual(residual: &mut [Word16; SUBFRAME_LEN + PITCH_ORDER - 1], prev: &[Word16], lag: i32) {
    let offset = (PITCH_MAX as i32 - (PITCH_ORDER / 2) as i32 - lag) as usize;

    residual[0] = prev[offset];
    residual[1] = prev[offset + 1];

    for i in 2..SUBFRAME_LEN + PITCH_ORDER - 1 {
        residual[i] = prev[offset + 2 + (i - 2) % lag as usize];
    }
}

/// Generate the adaptive codebook excitation for one subframe.
///
/// `history` is the `PITCH_MAX` samples immediately preceding the output
/// position; the result is the residual convolved with the 5-tap gain
/// vector selected by `ad_cb_gain`.
pub(super) fn gen_acb_excitation(
    history: &[Word16],
    pitch_lag: i32,
    subfrm: &Subframe,
    cur_rate: Rate,
) -> [Word16; SUBFRAME_LEN] {
    let mut residual = [0 as Word16; SUBFRAME_LEN + PITCH_ORDER - 1];
    let lag = pitch_lag + subfrm.ad_cb_lag - 1;

    get_residual(&mut residual, history, lag);

    let cb: &[Word16; PITCH_ORDER] =
        if cur_rate == Rate::Rate6300 && pitch_lag < (SUBFRAME_LEN - 2) as i32 {
            &ADAPTIVE_CB_GAIN85[subfrm.ad_cb_gain as usize]
        } else {
            &ADAPTIVE_CB_GAIN170[subfrm.ad_cb_gain as usize]
        };

    let mut vector = [0 as Word16; SUBFRAME_LEN];
    for (i, out) in vector.iter_mut().enumerate() {
        let sum = dot_product(&residual[i..], cb, PITCH_ORDER);
        *out = (sat_dadd32(1 << 15, sum) >> 16) as Word16;
    }
    vector
}

/// Find the lag of the maximum autocorrelation within +-3 of the decoded
/// pitch lag. `pos` is the analysis position inside `buf`; `offset` bounds
/// the forward search window the same way the excitation layout does.
pub(super) fn autocorr_max(
    buf: &[Word16],
    pos: usize,
    offset: usize,
    ccr_max: &mut Word32,
    pitch_lag: i32,
    length: usize,
    dir: i32,
) -> i32 {
    let pitch_lag = pitch_lag.min(PITCH_MAX as i32 - 3);
    let limit = if dir > 0 {
        ((FRAME_LEN + PITCH_MAX) as i32 - (offset + length) as i32).min(pitch_lag + 3)
    } else {
        pitch_lag + 3
    };

    let mut lag = 0;
    let mut i = pitch_lag - 3;
    while i <= limit {
        let other = (pos as i32 + dir * i) as usize;
        let ccr = dot_product(&buf[pos..], &buf[other..], length);
        if ccr > *ccr_max {
            *ccr_max = ccr;
            lag = i;
        }
        i += 1;
    }
    lag
}

/// Regenerate a frame from the previous excitation after an erasure.
///
/// Voiced frames replicate the pitch cycle at three quarters amplitude;
/// unvoiced frames emit scaled LCG noise and zero the excitation history.
pub(super) fn residual_interp(
    buf: &mut [Word16],
    out: &mut [Word16],
    lag: i32,
    gain: Word32,
    rseed: &mut Word32,
) {
    if lag != 0 {
        let lag = lag as usize;
        for i in 0..lag {
            out[i] = (buf[PITCH_MAX + i - lag] as Word32 * 3 >> 2) as Word16;
        }
        for i in lag..FRAME_LEN {
            out[i] = out[i - lag];
        }
    } else {
        for value in out.iter_mut().take(FRAME_LEN) {
            *rseed = rseed.wrapping_mul(521).wrapping_add(259);
            *value = (gain.wrapping_mul(*rseed) >> 15) as Word16;
        }
        buf[..FRAME_LEN + PITCH_MAX].fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subframe() -> Subframe {
        Subframe {
            ad_cb_lag: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_fcb_6300_out_of_range_position_is_silent() {
        let mut vector = [99 as Word16; SUBFRAME_LEN + 4];
        let mut sf = subframe();
        sf.pulse_pos = MAX_POS[0];
        gen_fcb_excitation(&mut vector, &sf, Rate::Rate6300, 60, 0);
        assert!(vector[..SUBFRAME_LEN].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_fcb_6300_pulse_pos_zero_places_leading_pulses() {
        // Position code 0 selects the first 6 grid slots in order
        let mut vector = [0 as Word16; SUBFRAME_LEN + 4];
        let mut sf = subframe();
        sf.amp_index = 10;
        sf.pulse_sign = 0;
        gen_fcb_excitation(&mut vector, &sf, Rate::Rate6300, 60, 0);
        let gain = FIXED_CB_GAIN[10];
        for i in 0..PULSE_MAX {
            assert_eq!(vector[GRID_SIZE * i], gain, "pulse {i}");
        }
        assert!(vector[GRID_SIZE * PULSE_MAX..SUBFRAME_LEN].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_fcb_6300_sign_bits() {
        let mut vector = [0 as Word16; SUBFRAME_LEN + 4];
        let mut sf = subframe();
        sf.amp_index = 10;
        sf.pulse_sign = 0b100001; // first and last placed pulses negative
        gen_fcb_excitation(&mut vector, &sf, Rate::Rate6300, 60, 0);
        let gain = FIXED_CB_GAIN[10];
        assert_eq!(vector[0], -gain);
        assert_eq!(vector[2], gain);
        assert_eq!(vector[10], -gain);
    }

    #[test]
    fn test_fcb_5300_positions_and_signs() {
        let mut vector = [0 as Word16; SUBFRAME_LEN + 4];
        let mut sf = subframe();
        sf.amp_index = 12;
        sf.grid_index = 1;
        // pulse k at ((code >> 3k & 7) << 3) + grid + 2k
        sf.pulse_pos = 0b001_010_011_100; // codes 4, 3, 2, 1 from low bits
        sf.pulse_sign = 0b0101;
        sf.ad_cb_gain = 0; // pitch_contrib entry 0 disables enhancement
        gen_fcb_excitation(&mut vector, &sf, Rate::Rate5300, 60, 1);
        let gain = FIXED_CB_GAIN[12];
        assert_eq!(vector[(4 << 3) + 1], gain);
        assert_eq!(vector[(3 << 3) + 1 + 2], -gain);
        assert_eq!(vector[(2 << 3) + 1 + 4], gain);
        assert_eq!(vector[(1 << 3) + 1 + 6], -gain);
    }

    #[test]
    fn test_dirac_train_superposition() {
        let mut vector = [0 as Word16; SUBFRAME_LEN];
        vector[0] = 1000;
        vector[3] = -500;
        gen_dirac_train(&mut vector, 20);
        assert_eq!(vector[20], 1000);
        assert_eq!(vector[23], -500);
        assert_eq!(vector[40], 1000);
        assert_eq!(vector[43], -500);
    }

    #[test]
    fn test_acb_zero_history_gives_zero_vector() {
        let history = [0 as Word16; PITCH_MAX];
        let mut sf = subframe();
        sf.ad_cb_gain = 40;
        let vector = gen_acb_excitation(&history, 80, &sf, Rate::Rate6300);
        assert!(vector.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_acb_table_selection_short_lag() {
        // Short lags at 6.3 kbit/s use the 85-entry table; identical input
        // through the 170-entry table must diverge for a nonzero entry
        let mut history = [0 as Word16; PITCH_MAX];
        for (i, v) in history.iter_mut().enumerate() {
            *v = ((i as i32 * 37) % 2048 - 1024) as Word16;
        }
        let mut sf = subframe();
        sf.ad_cb_gain = 30;
        let short = gen_acb_excitation(&history, 40, &sf, Rate::Rate6300);
        let long = gen_acb_excitation(&history, 40, &sf, Rate::Rate5300);
        assert_ne!(short, long);
    }

    #[test]
    fn test_residual_interp_voiced_replicates_cycle() {
        let mut buf = [0 as Word16; PITCH_MAX + FRAME_LEN + 4];
        for i in 0..PITCH_MAX {
            buf[i] = (i as Word16).wrapping_mul(13);
        }
        let mut out = [0 as Word16; FRAME_LEN];
        let mut seed = 0;
        residual_interp(&mut buf, &mut out, 25, 0, &mut seed);
        for i in 0..25 {
            assert_eq!(out[i], (buf[PITCH_MAX + i - 25] as i32 * 3 >> 2) as i16);
        }
        for i in 25..FRAME_LEN {
            assert_eq!(out[i], out[i - 25]);
        }
        assert_eq!(seed, 0);
    }

    #[test]
    fn test_residual_interp_unvoiced_zeroes_excitation() {
        let mut buf = [1234 as Word16; PITCH_MAX + FRAME_LEN + 4];
        let mut out = [0 as Word16; FRAME_LEN];
        let mut seed = 0x1357;
        residual_interp(&mut buf, &mut out, 0, 180, &mut seed);
        assert!(buf[..FRAME_LEN + PITCH_MAX].iter().all(|&v| v == 0));
        assert_ne!(seed, 0x1357);
        // LCG noise is deterministic
        let mut seed2 = 0x1357;
        let mut buf2 = [1234 as Word16; PITCH_MAX + FRAME_LEN + 4];
        let mut out2 = [0 as Word16; FRAME_LEN];
        residual_interp(&mut buf2, &mut out2, 0, 180, &mut seed2);
        assert_eq!(out, out2);
    }

    #[test]
    fn test_autocorr_max_finds_period() {
        let mut buf = [0 as Word16; FRAME_LEN + PITCH_MAX + 10];
        // Periodic signal with period 40
        for i in 0..buf.len() {
            buf[i] = if i % 40 == 0 { 3000 } else { 0 };
        }
        let pos = 200;
        let mut ccr = 0;
        let lag = autocorr_max(&buf, pos, pos, &mut ccr, 40, SUBFRAME_LEN, -1);
        assert_eq!(lag, 40);
        assert!(ccr > 0);
    }
}
