//! Channel Models — per-symbol gain and additive Gaussian noise
//!
//! A channel turns one transmitted amplitude into one observed amplitude
//! together with the effective gain it applied. The gain lets the receiver
//! equalize coherently: whenever `gain > 0`, dividing the observation by
//! it yields a unit-gain sample whose noise variance is `σ²/gain²`.
//!
//! Two models are provided: AWGN (thermal noise only, gain 1) and flat
//! real-valued Rayleigh fading (one-tap gain `|N(0,1)|` plus noise).
//!
//! Channels hold no state; the noise source is the caller's RNG, so a
//! seeded caller reproduces the exact same realization. Draw order within
//! a single `transmit` call is fixed.

use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

/// One channel use: the observed amplitude and the gain that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelOutput {
    /// Observed post-channel sample.
    pub y: f64,
    /// Effective channel amplitude (1 for pure AWGN).
    pub gain: f64,
}

/// A memoryless channel: amplitude in, noisy observation and gain out.
///
/// The function is total; `sigma` is the per-dimension noise standard
/// deviation already calibrated by the caller from Eb/N0.
pub trait Channel: Send + Sync {
    fn transmit(&self, s: f64, rng: &mut dyn RngCore, sigma: f64) -> ChannelOutput;
}

/// Additive white Gaussian noise: `y = s + n`, `n ~ N(0, σ²)`, gain 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwgnChannel;

impl Channel for AwgnChannel {
    fn transmit(&self, s: f64, rng: &mut dyn RngCore, sigma: f64) -> ChannelOutput {
        let n: f64 = StandardNormal.sample(&mut *rng);
        ChannelOutput {
            y: s + sigma * n,
            gain: 1.0,
        }
    }
}

/// Flat real-valued Rayleigh fading: `y = h·s + n` with `h = |N(0,1)|`,
/// `n ~ N(0, σ²)`, and the realized `h` reported as the gain.
///
/// `E[h²] = 1`, so the average received energy matches the AWGN case and
/// the Eb/N0 → σ calibration is independent of the fading realization.
/// The fading draw precedes the noise draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayleighChannel;

impl Channel for RayleighChannel {
    fn transmit(&self, s: f64, rng: &mut dyn RngCore, sigma: f64) -> ChannelOutput {
        let g: f64 = StandardNormal.sample(&mut *rng);
        let h = g.abs();
        let n: f64 = StandardNormal.sample(&mut *rng);
        ChannelOutput {
            y: h * s + sigma * n,
            gain: h,
        }
    }
}
