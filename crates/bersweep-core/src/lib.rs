//! # Link-Simulation Building Blocks
//!
//! This crate provides the signal-chain blocks used by the `bersweep`
//! Monte Carlo BER simulator:
//!
//! - **Modems**: bit-group ↔ amplitude mapping (2-ASK, 4-ASK Gray/Natural)
//! - **Channels**: per-symbol gain plus additive Gaussian noise (AWGN,
//!   real one-tap Rayleigh fading)
//! - **FEC**: rate-1/2 constraint-length-7 convolutional code with a
//!   hard-decision Viterbi decoder, plus an uncoded passthrough
//! - **Statistics**: inverse normal CDF and Wilson score intervals for
//!   binomial error counts
//!
//! All blocks are immutable after construction and safe to share across
//! worker threads by reference; randomness always comes in through an
//! explicit caller-owned RNG.
//!
//! ## Signal Flow
//!
//! ```text
//! info bits → Coder::encode → Modem::modulate → Channel::transmit
//!           → equalize → Modem::demodulate → Coder::decode → info bits
//! ```

pub mod channel;
pub mod fec;
pub mod modem;
pub mod stats;

pub use channel::{AwgnChannel, Channel, ChannelOutput, RayleighChannel};
pub use fec::{Coder, ConvK7R12, Uncoded};
pub use modem::{Ask2Modem, Ask4Mapping, Ask4Modem, Modem, MAX_BITS_PER_SYMBOL};
