//! Forward Error Correction — channel coders for the simulation chain
//!
//! A [`Coder`] turns information bits into coded bits and recovers
//! information bits from (possibly corrupted) received bits. Decoding
//! comes in a hard-decision flavor and an optional soft (LLR) flavor;
//! a coder advertises the latter via [`Coder::supports_soft`].
//!
//! Encode/decode use caller-owned output buffers so the Monte Carlo hot
//! loop can reuse its scratch allocations frame after frame.

pub mod convolutional;

pub use convolutional::ConvK7R12;

/// A block channel coder.
pub trait Coder: Send + Sync {
    /// Encode information bits into `coded` (cleared first).
    fn encode(&self, info: &[bool], coded: &mut Vec<bool>);

    /// Hard-decision decode received bits into `info_out` (cleared first).
    fn decode(&self, received: &[bool], info_out: &mut Vec<bool>);

    /// Soft-decision decode from per-bit LLRs (positive ⇒ bit 0).
    ///
    /// Only meaningful when `supports_soft()` returns true; the default
    /// produces no output.
    fn decode_soft(&self, llrs: &[f64], info_out: &mut Vec<bool>) {
        let _ = llrs;
        info_out.clear();
    }

    /// Code rate: information bits per coded bit.
    fn rate(&self) -> f64;

    /// Whether `decode_soft` is implemented.
    fn supports_soft(&self) -> bool {
        false
    }
}

/// Uncoded passthrough: rate 1, encode and decode are the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncoded;

impl Coder for Uncoded {
    fn encode(&self, info: &[bool], coded: &mut Vec<bool>) {
        coded.clear();
        coded.extend_from_slice(info);
    }

    fn decode(&self, received: &[bool], info_out: &mut Vec<bool>) {
        info_out.clear();
        info_out.extend_from_slice(received);
    }

    #[inline]
    fn rate(&self) -> f64 {
        1.0
    }
}
