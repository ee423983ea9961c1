//! Convolutional Code K=7, Rate 1/2 — encoder and hard-decision Viterbi
//!
//! The NASA-standard constraint-length-7 code with generator polynomials
//! g0 = 133₈ and g1 = 171₈, as used by Voyager, CCSDS, and IEEE 802.11a/g.
//! Frames are zero-terminated: six flush bits force the encoder back to
//! the all-zero state, giving the decoder a known traceback anchor.
//!
//! The decoder is the classic trellis dynamic program: 64 states, branch
//! metrics by Hamming distance on 2-bit coded symbols, add-compare-select
//! into each destination state, then a single traceback from state 0.
//!
//! ## Example
//!
//! ```rust
//! use bersweep_core::fec::{Coder, ConvK7R12};
//!
//! let coder = ConvK7R12::new();
//! let info = vec![true, false, true, true, false, false, true, false];
//! let mut coded = Vec::new();
//! let mut decoded = Vec::new();
//!
//! coder.encode(&info, &mut coded);
//! assert_eq!(coded.len(), 2 * (info.len() + 6));
//!
//! coder.decode(&coded, &mut decoded);
//! assert_eq!(decoded, info);
//! ```

use super::Coder;

/// Generator polynomial g0 = 133₈ (taps 1011011).
const G0: u32 = 0o133;
/// Generator polynomial g1 = 171₈ (taps 1111001).
const G1: u32 = 0o171;
/// Encoder memory (constraint length 7 minus the input bit).
const MEMORY: usize = 6;
/// Trellis states: 2^MEMORY.
const NUM_STATES: usize = 1 << MEMORY;
/// Mask keeping the full 7-bit shift register.
const SR_MASK: u32 = (1 << (MEMORY + 1)) - 1;

#[inline]
fn parity(x: u32) -> bool {
    x.count_ones() & 1 == 1
}

/// Rate-1/2, K=7 convolutional coder with zero-terminated frames.
///
/// The trellis (next state and 2-bit reference output per state and
/// input bit) is tabulated once at construction; encode and decode are
/// then allocation-free apart from the decoder's survivor memory.
#[derive(Debug, Clone)]
pub struct ConvK7R12 {
    /// next_state[s][b]: state reached from `s` on input bit `b`.
    next_state: [[u8; 2]; NUM_STATES],
    /// output[s][b]: reference coded symbol (v0 << 1) | v1.
    output: [[u8; 2]; NUM_STATES],
}

impl ConvK7R12 {
    pub fn new() -> Self {
        let mut next_state = [[0u8; 2]; NUM_STATES];
        let mut output = [[0u8; 2]; NUM_STATES];
        for s in 0..NUM_STATES {
            for b in 0..2u32 {
                let sr = (((s as u32) << 1) | b) & SR_MASK;
                let v0 = parity(sr & G0) as u8;
                let v1 = parity(sr & G1) as u8;
                next_state[s][b as usize] = (sr & (NUM_STATES as u32 - 1)) as u8;
                output[s][b as usize] = (v0 << 1) | v1;
            }
        }
        Self { next_state, output }
    }

    /// Shift one bit into the register and emit its two coded bits.
    #[inline]
    fn shift(sr: &mut u32, bit: bool, coded: &mut Vec<bool>) {
        *sr = ((*sr << 1) | bit as u32) & SR_MASK;
        coded.push(parity(*sr & G0));
        coded.push(parity(*sr & G1));
    }
}

impl Default for ConvK7R12 {
    fn default() -> Self {
        Self::new()
    }
}

impl Coder for ConvK7R12 {
    /// Encode `info` and append the six zero-termination flush bits.
    /// Output length is `2·(info.len() + 6)`.
    fn encode(&self, info: &[bool], coded: &mut Vec<bool>) {
        coded.clear();
        coded.reserve(2 * (info.len() + MEMORY));
        let mut sr = 0u32;
        for &bit in info {
            Self::shift(&mut sr, bit, coded);
        }
        for _ in 0..MEMORY {
            Self::shift(&mut sr, false, coded);
        }
    }

    /// Hard-decision Viterbi decode of a zero-terminated frame.
    ///
    /// Consumes `received` in 2-bit symbols (a trailing odd bit is
    /// ignored) and emits the first `n_sym − 6` decided bits; frames of
    /// six symbols or fewer carry no information.
    fn decode(&self, received: &[bool], info_out: &mut Vec<bool>) {
        let n_sym = received.len() / 2;
        info_out.clear();
        if n_sym == 0 {
            return;
        }

        const INF: u32 = u32::MAX;
        let mut pm_prev = [INF; NUM_STATES];
        let mut pm_curr = [INF; NUM_STATES];
        // The encoder starts in the zero state; anchor the survivor there.
        pm_prev[0] = 0;

        let mut pred = vec![-1i16; n_sym * NUM_STATES];
        let mut dec = vec![0u8; n_sym * NUM_STATES];

        for t in 0..n_sym {
            let r = ((received[2 * t] as u8) << 1) | received[2 * t + 1] as u8;
            pm_curr.fill(INF);
            for s in 0..NUM_STATES {
                let pm = pm_prev[s];
                if pm == INF {
                    continue;
                }
                for b in 0..2 {
                    let ns = self.next_state[s][b] as usize;
                    let cand = pm + (self.output[s][b] ^ r).count_ones();
                    if cand < pm_curr[ns] {
                        pm_curr[ns] = cand;
                        pred[t * NUM_STATES + ns] = s as i16;
                        dec[t * NUM_STATES + ns] = b as u8;
                    }
                }
            }
            std::mem::swap(&mut pm_prev, &mut pm_curr);
        }

        // Zero-termination guarantees the transmitted path ends in state 0,
        // so trace back from there regardless of the final metrics. An
        // unreachable predecessor falls back to state 0 to keep the
        // traceback total on pathological inputs.
        let n_info = n_sym.saturating_sub(MEMORY);
        info_out.resize(n_info, false);
        let mut state = 0usize;
        for t in (0..n_sym).rev() {
            let idx = t * NUM_STATES + state;
            if t < n_info {
                info_out[t] = dec[idx] == 1;
            }
            let p = pred[idx];
            state = if p >= 0 { p as usize } else { 0 };
        }
    }

    #[inline]
    fn rate(&self) -> f64 {
        0.5
    }
}
