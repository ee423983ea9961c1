//! # Monte Carlo BER Sweep
//!
//! The simulation layer of `bersweep`: for each SNR on a configured grid,
//! a pool of worker threads pushes random frames through the
//! coder → modem → channel → modem → coder chain from `bersweep-core`,
//! counts information-bit errors against shared adaptive stopping
//! criteria, and reports the estimated BER with a Wilson score interval.
//!
//! - [`config`]: INI configuration loading and component selection
//! - [`engine`]: the concurrent per-SNR-point Monte Carlo loop
//! - [`sweep`]: grid enumeration and the sweep driver
//! - [`sink`]: output path resolution and CSV records

pub mod config;
pub mod engine;
pub mod sink;
pub mod sweep;

pub use config::{ConfigError, SimConfig};
pub use engine::{make_seed, simulate_point, BerResult, EngineParams};
