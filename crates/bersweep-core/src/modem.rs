//! Amplitude-Shift Keying Modems — bit-group ↔ amplitude mapping
//!
//! Maps groups of bits onto real-valued amplitudes and back. Two
//! constellations are provided: antipodal 2-ASK (one bit per symbol) and
//! 4-ASK over {-3, -1, +1, +3} (two bits per symbol) with either Gray or
//! Natural bit labeling.
//!
//! Hard demapping slices the received amplitude against fixed thresholds;
//! soft demapping produces per-bit log-likelihood ratios from the full
//! Gaussian likelihoods of all constellation points. Positive LLR means
//! bit 0 is the more likely hypothesis.
//!
//! ## Example
//!
//! ```rust
//! use bersweep_core::modem::{Ask4Mapping, Ask4Modem, Modem};
//!
//! let modem = Ask4Modem::new(Ask4Mapping::Gray);
//! assert_eq!(modem.bits_per_symbol(), 2);
//! assert_eq!(modem.modulate(&[true, false]), 3.0); // Gray 10 → +3
//!
//! let mut bits = [false; 2];
//! modem.demodulate(2.7, &mut bits);
//! assert_eq!(bits, [true, false]);
//! ```

/// Scratch slots a caller must provide per symbol. No modem maps more
/// bits than this per channel use.
pub const MAX_BITS_PER_SYMBOL: usize = 8;

/// A memoryless mapper between bit groups and real amplitudes.
///
/// `modulate` consumes exactly `bits_per_symbol()` leading entries of its
/// input slice and ignores the rest; `demodulate` and `demodulate_llr`
/// fill exactly that many leading entries of their output slices.
pub trait Modem: Send + Sync {
    /// Map the leading `bits_per_symbol()` bits to one amplitude.
    fn modulate(&self, bits: &[bool]) -> f64;

    /// Hard-decide the received amplitude back into bits.
    fn demodulate(&self, r: f64, bits_out: &mut [bool]);

    /// Per-bit log-likelihood ratios for the received amplitude, given
    /// Gaussian noise of variance `sigma2`. Positive ⇒ bit 0 more likely.
    fn demodulate_llr(&self, r: f64, sigma2: f64, llr_out: &mut [f64]);

    /// Bits carried per channel use.
    fn bits_per_symbol(&self) -> usize;

    /// Mean symbol energy of the constellation.
    fn symbol_energy(&self) -> f64;
}

/// Antipodal 2-ASK: bit 0 → +1, bit 1 → −1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ask2Modem;

impl Modem for Ask2Modem {
    fn modulate(&self, bits: &[bool]) -> f64 {
        if bits[0] {
            -1.0
        } else {
            1.0
        }
    }

    fn demodulate(&self, r: f64, bits_out: &mut [bool]) {
        bits_out[0] = r < 0.0;
    }

    fn demodulate_llr(&self, r: f64, sigma2: f64, llr_out: &mut [f64]) {
        llr_out[0] = 2.0 * r / sigma2;
    }

    #[inline]
    fn bits_per_symbol(&self) -> usize {
        1
    }

    #[inline]
    fn symbol_energy(&self) -> f64 {
        1.0
    }
}

/// Bit labeling for the 4-ASK constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ask4Mapping {
    /// Adjacent symbols differ in exactly one bit: 00→−3, 01→−1, 11→+1, 10→+3.
    Gray,
    /// Binary counting order: 00→−3, 01→−1, 10→+1, 11→+3.
    Natural,
}

/// 4-ASK constellation points in ascending order.
const ASK4_SYMBOLS: [f64; 4] = [-3.0, -1.0, 1.0, 3.0];

/// 4-ASK over {−3, −1, +1, +3} with configurable bit labeling.
///
/// Mean symbol energy is (9 + 1 + 1 + 9) / 4 = 5. Hard demapping slices at
/// −2, 0, +2 to recover the symbol index, then inverts the labeling table.
#[derive(Debug, Clone, Copy)]
pub struct Ask4Modem {
    mapping: Ask4Mapping,
}

impl Ask4Modem {
    pub fn new(mapping: Ask4Mapping) -> Self {
        Self { mapping }
    }

    #[inline]
    pub fn mapping(&self) -> Ask4Mapping {
        self.mapping
    }

    /// Symbol index 0..4 for a received amplitude (thresholds −2, 0, +2).
    #[inline]
    fn slice(r: f64) -> usize {
        if r < -2.0 {
            0
        } else if r < 0.0 {
            1
        } else if r < 2.0 {
            2
        } else {
            3
        }
    }
}

impl Modem for Ask4Modem {
    fn modulate(&self, bits: &[bool]) -> f64 {
        let label = ((bits[0] as usize) << 1) | bits[1] as usize;
        match self.mapping {
            // Gray: 00→−3, 01→−1, 11→+1, 10→+3
            Ask4Mapping::Gray => match label {
                0 => -3.0,
                1 => -1.0,
                3 => 1.0,
                _ => 3.0,
            },
            // Natural: 00→−3, 01→−1, 10→+1, 11→+3
            Ask4Mapping::Natural => ASK4_SYMBOLS[label],
        }
    }

    fn demodulate(&self, r: f64, bits_out: &mut [bool]) {
        let sym = Self::slice(r);
        let (b0, b1) = match self.mapping {
            Ask4Mapping::Gray => match sym {
                0 => (false, false), // −3 → 00
                1 => (false, true),  // −1 → 01
                2 => (true, true),   // +1 → 11
                _ => (true, false),  // +3 → 10
            },
            Ask4Mapping::Natural => match sym {
                0 => (false, false),
                1 => (false, true),
                2 => (true, false),
                _ => (true, true),
            },
        };
        bits_out[0] = b0;
        bits_out[1] = b1;
    }

    fn demodulate_llr(&self, r: f64, sigma2: f64, llr_out: &mut [f64]) {
        // Gaussian likelihood of each constellation point.
        let mut p = [0.0f64; 4];
        for (k, &s) in ASK4_SYMBOLS.iter().enumerate() {
            let d = r - s;
            p[k] = (-d * d / (2.0 * sigma2)).exp();
        }

        // MSB partitions {−3,−1} against {+1,+3} under both labelings.
        llr_out[0] = ((p[0] + p[1]) / (p[2] + p[3])).ln();
        llr_out[1] = match self.mapping {
            // Gray LSB: {−3,+3} vs {−1,+1}
            Ask4Mapping::Gray => ((p[0] + p[3]) / (p[1] + p[2])).ln(),
            // Natural LSB: {−3,+1} vs {−1,+3}
            Ask4Mapping::Natural => ((p[0] + p[2]) / (p[1] + p[3])).ln(),
        };
    }

    #[inline]
    fn bits_per_symbol(&self) -> usize {
        2
    }

    #[inline]
    fn symbol_energy(&self) -> f64 {
        5.0
    }
}
