//! End-to-end sweep tests: INI text in, CSV records out.

use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use bersweep_sim::config::SimConfig;
use bersweep_sim::engine::make_seed;
use bersweep_sim::sink::{resolve_output_path, CsvSink};
use bersweep_sim::sweep::run_sweep;

fn config_text(outfile: &str) -> String {
    format!(
        r#"
[snr]
start_db = 0.0
stop_db = 4.0
step_db = 2.0

[stopping]
min_errors = 200
max_bits = 500000
ber_floor = 0.0

[io]
file = {outfile}

[rng]
seed = 7

[model]
modem = ask2
channel = awgn
coder = uncoded
frame_len = 1024

[ci]
level = 0.95
abs = 0.0
rel = 0.0
min_bits = 0

[parallel]
threads = 1
"#
    )
}

fn run(cfg: &SimConfig) -> PathBuf {
    let modem = cfg.build_modem().unwrap();
    let channel = cfg.build_channel().unwrap();
    let coder = cfg.build_coder().unwrap();

    let path = resolve_output_path(&cfg.outfile, &cfg.coder, &cfg.modem, &cfg.channel).unwrap();
    let mut sink = CsvSink::create(&path).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(make_seed(cfg.seed));

    run_sweep(
        cfg,
        modem.as_ref(),
        channel.as_ref(),
        coder.as_ref(),
        &mut rng,
        &mut sink,
    )
    .unwrap();
    path
}

#[test]
fn test_sweep_writes_header_and_one_record_per_point() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.csv");
    let cfg = SimConfig::parse(&config_text(out.to_str().unwrap())).unwrap();

    let path = run(&cfg);
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines[0], "snr_db,ber,num_bits,num_errors,ci_low,ci_high");
    // Grid 0, 2, 4 dB.
    assert_eq!(lines.len(), 1 + 3);
    for record in &lines[1..] {
        assert_eq!(record.split(',').count(), 6);
    }
    assert!(lines[1].starts_with("0.000000,"));
    assert!(lines[3].starts_with("4.000000,"));
}

#[test]
fn test_directory_output_gets_component_filename() {
    let dir = TempDir::new().unwrap();
    let outdir = format!("{}/", dir.path().display());
    let cfg = SimConfig::parse(&config_text(&outdir)).unwrap();

    let path = run(&cfg);
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "uncoded_ask2_awgn.csv"
    );
    assert!(path.exists());
}

#[test]
fn test_identical_seed_reproduces_csv_bytes() {
    let dir = TempDir::new().unwrap();
    let out_a = dir.path().join("a.csv");
    let out_b = dir.path().join("b.csv");

    let cfg_a = SimConfig::parse(&config_text(out_a.to_str().unwrap())).unwrap();
    let cfg_b = SimConfig::parse(&config_text(out_b.to_str().unwrap())).unwrap();

    run(&cfg_a);
    run(&cfg_b);

    let a = std::fs::read(&out_a).unwrap();
    let b = std::fs::read(&out_b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_ber_floor_ends_sweep_at_first_quiet_point() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("floor.csv");
    let text = config_text(out.to_str().unwrap())
        .replace("stop_db = 4.0", "stop_db = 20.0")
        .replace("min_errors = 200", "min_errors = 50")
        .replace("ber_floor = 0.0", "ber_floor = 0.001")
        .replace("min_bits = 0", "min_bits = 20000");
    let cfg = SimConfig::parse(&text).unwrap();

    let path = run(&cfg);
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    // Uncoded 2-ASK crosses BER 1e-3 between 6 and 8 dB, so the sweep
    // must cover 0..6 dB, stop at 8 dB, and skip the rest of the grid.
    assert_eq!(lines.len(), 1 + 5, "records: {:?}", &lines[1..]);
    assert!(lines[5].starts_with("8.000000,"));

    // Every earlier point is above the floor.
    for record in &lines[1..5] {
        let ber: f64 = record.split(',').nth(1).unwrap().parse().unwrap();
        assert!(ber > 0.001, "record {} should be above the floor", record);
    }
}
