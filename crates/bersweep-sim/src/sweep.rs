//! SNR Sweep Driver — one engine run per grid point
//!
//! Walks the inclusive SNR grid, hands each point to the Monte Carlo
//! engine, appends one CSV record per point, and prints a progress line.
//! When a BER floor is configured, the sweep ends at the first point
//! whose interval upper bound (or point estimate, when no interval was
//! computed) reaches the floor: higher SNRs only get better.

use rand_chacha::ChaCha8Rng;
use std::io;

use bersweep_core::{Channel, Coder, Modem};

use crate::config::SimConfig;
use crate::engine::{resolve_worker_count, simulate_point, EngineParams};
use crate::sink::CsvSink;

/// Inclusive SNR grid: `start, start+step, …, stop` with
/// `⌊(stop−start)/step + 0.5⌋ + 1` points.
pub fn snr_grid(start_db: f64, stop_db: f64, step_db: f64) -> Vec<f64> {
    let n = ((stop_db - start_db) / step_db + 0.5).floor() as i64 + 1;
    (0..n.max(0))
        .map(|i| start_db + i as f64 * step_db)
        .collect()
}

/// Run the full sweep, writing one record per simulated point.
pub fn run_sweep(
    cfg: &SimConfig,
    modem: &dyn Modem,
    channel: &dyn Channel,
    coder: &dyn Coder,
    rng: &mut ChaCha8Rng,
    sink: &mut CsvSink,
) -> io::Result<()> {
    let workers = resolve_worker_count(cfg.threads);
    println!("Using {} worker threads", workers);

    let params = EngineParams {
        min_errors: cfg.min_errors,
        max_bits: cfg.max_bits,
        ber_floor: cfg.ber_floor,
        frame_len: cfg.frame_len,
        ci_level: cfg.ci_level,
        ci_abs: cfg.ci_abs,
        ci_rel: cfg.ci_rel,
        ci_min_bits: cfg.ci_min_bits,
        workers,
    };

    for snr_db in snr_grid(cfg.snr_start_db, cfg.snr_stop_db, cfg.snr_step_db) {
        let result = simulate_point(snr_db, &params, modem, channel, coder, rng);
        sink.write_record(snr_db, &result)?;

        println!(
            "SNR(dB)={:6.2}  BER={:.6}  bits={}  errors={}",
            snr_db, result.ber, result.bits, result.errs
        );

        // Upper bound when a CI was computed, point estimate otherwise.
        let ber_for_stop = result.ci_hi.max(result.ber);
        if cfg.ber_floor > 0.0 && ber_for_stop <= cfg.ber_floor {
            println!(
                "Stopping sweep early: BER floor reached at SNR={:.2} dB",
                snr_db
            );
            break;
        }
    }

    sink.flush()
}
