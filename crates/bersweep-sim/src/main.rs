//! BER sweep command-line tool.
//!
//! Loads an INI configuration (path given as the first argument,
//! `config.ini` by default), builds the coder/modem/channel chain, sweeps
//! the SNR grid, and writes one CSV record per point.
//!
//! Exit codes: 0 on success, 1 for configuration/component/runtime
//! errors, 2 when the output sink cannot be opened.

use std::path::Path;
use std::process::ExitCode;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use bersweep_core::{Channel, Coder, Modem};
use bersweep_sim::config::{ConfigError, SimConfig};
use bersweep_sim::engine::make_seed;
use bersweep_sim::sink::{resolve_output_path, CsvSink};
use bersweep_sim::sweep::run_sweep;

type Chain = (Box<dyn Modem>, Box<dyn Channel>, Box<dyn Coder>);

fn build_chain(cfg: &SimConfig) -> Result<Chain, ConfigError> {
    Ok((cfg.build_modem()?, cfg.build_channel()?, cfg.build_coder()?))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.ini".to_string());

    let cfg = match SimConfig::load_from(Path::new(&config_path)) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Fatal: {}", err);
            return ExitCode::from(1);
        }
    };
    info!(path = %config_path, "loaded configuration");

    let (modem, channel, coder) = match build_chain(&cfg) {
        Ok(chain) => chain,
        Err(err) => {
            eprintln!("Fatal: {}", err);
            return ExitCode::from(1);
        }
    };

    let out_path = match resolve_output_path(&cfg.outfile, &cfg.coder, &cfg.modem, &cfg.channel) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Error: cannot resolve output path: {}", err);
            return ExitCode::from(2);
        }
    };
    let mut sink = match CsvSink::create(&out_path) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!(
                "Error: cannot open output file {}: {}",
                out_path.display(),
                err
            );
            return ExitCode::from(2);
        }
    };
    println!("Saving results to: {}", out_path.display());

    let mut rng = ChaCha8Rng::seed_from_u64(make_seed(cfg.seed));

    if let Err(err) = run_sweep(
        &cfg,
        modem.as_ref(),
        channel.as_ref(),
        coder.as_ref(),
        &mut rng,
        &mut sink,
    ) {
        eprintln!("Fatal: {}", err);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
