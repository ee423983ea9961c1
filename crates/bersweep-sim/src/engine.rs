//! Monte Carlo Engine — concurrent BER estimation at one SNR point
//!
//! For a single Eb/N0 value, the engine spawns a pool of worker threads
//! that independently synthesize frames, run them through the
//! coder → modem → channel → modem → coder chain, and fold their error
//! counts into two shared atomic totals. Workers consult three stop
//! predicates after publishing each frame (maximum bits, BER floor with
//! statistical evidence, confidence-interval goals) and terminate
//! cooperatively through a shared flag.
//!
//! Accounting is unbiased by construction: a worker always publishes a
//! frame before testing the predicates, so totals only grow, and the
//! post-increment snapshot it tests against includes its own
//! contribution. Workers already inside a frame when the flag goes up
//! finish that frame, so totals may overshoot a threshold by at most one
//! frame per worker.
//!
//! All counter traffic uses relaxed ordering: correctness depends only on
//! the sums observed after every worker has joined, and the thread join
//! itself orders the final reads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use bersweep_core::modem::MAX_BITS_PER_SYMBOL;
use bersweep_core::stats::{inv_norm_cdf, wilson_interval};
use bersweep_core::{Channel, Coder, Modem};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Weyl-sequence increment (2^64 / φ) used to spread worker seeds.
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Estimated BER at one SNR point, with the counts behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BerResult {
    /// Errors divided by bits (0 when no bits were simulated).
    pub ber: f64,
    /// Information bits simulated.
    pub bits: u64,
    /// Information bit errors counted.
    pub errs: u64,
    /// Wilson lower bound, or 0 when no interval was computed.
    pub ci_lo: f64,
    /// Wilson upper bound, or 0 when no interval was computed.
    pub ci_hi: f64,
}

/// Stopping and sizing knobs for one engine invocation.
#[derive(Debug, Clone)]
pub struct EngineParams {
    /// Errors to accumulate before CI goals may stop the run (0 disables).
    pub min_errors: u64,
    /// Hard cap on simulated bits (0 disables).
    pub max_bits: u64,
    /// Declare the point "good enough" once the Wilson upper bound drops
    /// to this BER (0 disables).
    pub ber_floor: f64,
    /// Information bits per frame.
    pub frame_len: usize,
    /// Two-sided confidence level in (0, 1).
    pub ci_level: f64,
    /// Absolute half-width goal (0 disables).
    pub ci_abs: f64,
    /// Relative half-width goal (0 disables).
    pub ci_rel: f64,
    /// Bits required before any CI-based predicate may fire.
    pub ci_min_bits: u64,
    /// Worker threads (already resolved, ≥ 1).
    pub workers: usize,
}

/// Shared per-point state. Counters are independent atomics on purpose;
/// the hot path must stay lock-free.
struct Shared {
    bits: AtomicU64,
    errs: AtomicU64,
    stop: AtomicBool,
}

/// Per-dimension noise standard deviation for an Eb/N0 point.
///
/// The SNR knob is energy per information bit, so the noise density is
/// scaled by the bits per channel use: `N0 = Es / (R·m·10^(dB/10))`,
/// `σ = √(N0/2)`.
pub fn noise_sigma(ebn0_db: f64, rate: f64, bits_per_symbol: usize, symbol_energy: f64) -> f64 {
    let ebn0_lin = 10f64.powf(ebn0_db / 10.0);
    let n0 = symbol_energy / (rate * bits_per_symbol as f64 * ebn0_lin);
    (0.5 * n0).sqrt()
}

/// Resolve a configured worker count: 0 means detected concurrency.
pub fn resolve_worker_count(requested: u32) -> usize {
    if requested > 0 {
        requested as usize
    } else {
        thread::available_parallelism().map_or(1, |n| n.get())
    }
}

/// Choose the master seed: 0 requests one derived from the wall clock
/// and the system entropy source.
pub fn make_seed(requested: u64) -> u64 {
    if requested != 0 {
        return requested;
    }
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64);
    t ^ (rand::rngs::OsRng.next_u64() << 1)
}

/// Estimate the BER at one Eb/N0 point.
///
/// The caller's RNG is consumed exactly once (to derive worker seeds),
/// so a seeded caller gets reproducible per-worker streams. Component
/// blocks are shared by reference across all workers and must stay
/// immutable, which every block in `bersweep-core` is.
pub fn simulate_point(
    ebn0_db: f64,
    params: &EngineParams,
    modem: &dyn Modem,
    channel: &dyn Channel,
    coder: &dyn Coder,
    rng: &mut ChaCha8Rng,
) -> BerResult {
    let sigma = noise_sigma(
        ebn0_db,
        coder.rate(),
        modem.bits_per_symbol(),
        modem.symbol_energy(),
    );

    let z = if params.ci_level > 0.0 && params.ci_level < 1.0 {
        let alpha = 1.0 - params.ci_level;
        inv_norm_cdf(1.0 - alpha / 2.0)
    } else {
        0.0
    };

    let workers = params.workers.max(1);
    let base = rng.next_u64();
    let seeds: Vec<u64> = (0..workers as u64)
        .map(|t| base ^ GOLDEN_GAMMA.wrapping_mul(t + 1))
        .collect();

    let shared = Shared {
        bits: AtomicU64::new(0),
        errs: AtomicU64::new(0),
        stop: AtomicBool::new(false),
    };
    let shared_ref = &shared;

    thread::scope(|scope| {
        for &seed in &seeds {
            scope.spawn(move || run_worker(seed, sigma, z, params, modem, channel, coder, shared_ref));
        }
    });

    let bits = shared.bits.load(Ordering::Relaxed);
    let errs = shared.errs.load(Ordering::Relaxed);

    let ci_enabled = params.ci_abs > 0.0 || params.ci_rel > 0.0;
    let (ci_lo, ci_hi) = if ci_enabled && z > 0.0 && bits > 0 {
        let wi = wilson_interval(errs, bits, z);
        (wi.lo, wi.hi)
    } else {
        (0.0, 0.0)
    };

    BerResult {
        ber: if bits > 0 { errs as f64 / bits as f64 } else { 0.0 },
        bits,
        errs,
        ci_lo,
        ci_hi,
    }
}

/// CI goals on a post-increment snapshot. Trivially met when both
/// half-width goals are disabled.
fn ci_goals_met(params: &EngineParams, z: f64, bits: u64, errs: u64) -> bool {
    if params.ci_abs <= 0.0 && params.ci_rel <= 0.0 {
        return true;
    }
    if bits == 0 || bits < params.ci_min_bits {
        return false;
    }
    let wi = wilson_interval(errs, bits, z);
    let p = errs as f64 / bits as f64;
    let ok_abs = params.ci_abs <= 0.0 || wi.half <= params.ci_abs;
    let ok_rel = params.ci_rel <= 0.0 || wi.half <= params.ci_rel * p.max(1e-12);
    ok_abs && ok_rel
}

/// BER-floor test: declaring "below the floor" requires the Wilson
/// *upper* bound to be at or under it, not just the point estimate.
fn floor_met(params: &EngineParams, z: f64, bits: u64, errs: u64) -> bool {
    if params.ber_floor <= 0.0 {
        return false;
    }
    if bits == 0 || bits < params.ci_min_bits {
        return false;
    }
    wilson_interval(errs, bits, z).hi <= params.ber_floor
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    seed: u64,
    sigma: f64,
    z: f64,
    params: &EngineParams,
    modem: &dyn Modem,
    channel: &dyn Channel,
    coder: &dyn Coder,
    shared: &Shared,
) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let sigma2 = sigma * sigma;
    let m = modem.bits_per_symbol();
    let soft = coder.supports_soft();

    // Scratch buffers live for the whole worker; the frame loop itself
    // does not allocate.
    let mut info: Vec<bool> = Vec::with_capacity(params.frame_len);
    let mut coded: Vec<bool> = Vec::with_capacity(2 * params.frame_len + 16);
    let mut hard: Vec<bool> = Vec::with_capacity(2 * params.frame_len + 16);
    let mut llrs: Vec<f64> = Vec::with_capacity(2 * params.frame_len + 16);
    let mut decoded: Vec<bool> = Vec::with_capacity(params.frame_len);

    while !shared.stop.load(Ordering::Relaxed) {
        info.clear();
        for _ in 0..params.frame_len {
            info.push(rng.gen_bool(0.5));
        }

        coder.encode(&info, &mut coded);

        hard.clear();
        llrs.clear();
        let mut i = 0;
        while i < coded.len() {
            // Zero-pad a ragged trailing group into the scratch slots.
            let mut group = [false; MAX_BITS_PER_SYMBOL];
            for k in 0..m {
                if i + k < coded.len() {
                    group[k] = coded[i + k];
                }
            }
            let s = modem.modulate(&group);
            let out = channel.transmit(s, &mut rng, sigma);

            // Coherent one-tap equalization against the reported gain.
            let g = if out.gain > 0.0 { out.gain } else { 1.0 };
            let r_eq = out.y / g;
            let sigma2_eq = sigma2 / (g * g);

            if soft {
                let mut l = [0.0f64; MAX_BITS_PER_SYMBOL];
                modem.demodulate_llr(r_eq, sigma2_eq, &mut l);
                for k in 0..m {
                    if i + k < coded.len() {
                        llrs.push(l[k]);
                    }
                }
            } else {
                let mut b = [false; MAX_BITS_PER_SYMBOL];
                modem.demodulate(r_eq, &mut b);
                for k in 0..m {
                    if i + k < coded.len() {
                        hard.push(b[k]);
                    }
                }
            }
            i += m;
        }

        if soft {
            coder.decode_soft(&llrs, &mut decoded);
        } else {
            coder.decode(&hard, &mut decoded);
        }

        let n = info.len().min(decoded.len());
        let mut local_errs = 0u64;
        for j in 0..n {
            if info[j] != decoded[j] {
                local_errs += 1;
            }
        }

        // Publish, then test the predicates on the post-increment
        // snapshot (fetch_add returns the prior value).
        let bits_after = shared.bits.fetch_add(n as u64, Ordering::Relaxed) + n as u64;
        let errs_after = shared.errs.fetch_add(local_errs, Ordering::Relaxed) + local_errs;

        let stop_by_max = params.max_bits > 0 && bits_after >= params.max_bits;
        let stop_by_floor = floor_met(params, z, bits_after, errs_after);
        let stop_by_ci = (params.min_errors == 0 || errs_after >= params.min_errors)
            && ci_goals_met(params, z, bits_after, errs_after);

        if stop_by_max || stop_by_floor || stop_by_ci {
            shared.stop.store(true, Ordering::Relaxed);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bersweep_core::modem::{Ask4Mapping, Ask4Modem};
    use bersweep_core::{Ask2Modem, AwgnChannel, ConvK7R12, RayleighChannel, Uncoded};

    fn params(min_errors: u64, max_bits: u64, workers: usize) -> EngineParams {
        EngineParams {
            min_errors,
            max_bits,
            ber_floor: 0.0,
            frame_len: 1024,
            ci_level: 0.95,
            ci_abs: 0.0,
            ci_rel: 0.0,
            ci_min_bits: 0,
            workers,
        }
    }

    #[test]
    fn test_noise_sigma_reference_points() {
        // 2-ASK uncoded at 0 dB: N0 = 1, σ = √0.5.
        let s = noise_sigma(0.0, 1.0, 1, 1.0);
        assert!((s - 0.5f64.sqrt()).abs() < 1e-12);

        // Rate-1/2 coding doubles N0 at the same Eb/N0.
        let s_coded = noise_sigma(0.0, 0.5, 1, 1.0);
        assert!((s_coded - 1.0).abs() < 1e-12);

        // 4-ASK: Es = 5, two bits per symbol.
        let s4 = noise_sigma(10.0, 1.0, 2, 5.0);
        assert!((s4 - (0.5f64 * 5.0 / 20.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_worker_seeds_distinct_and_deterministic() {
        let base = 0xDEAD_BEEFu64;
        let a: Vec<u64> = (0..8u64).map(|t| base ^ GOLDEN_GAMMA.wrapping_mul(t + 1)).collect();
        let b: Vec<u64> = (0..8u64).map(|t| base ^ GOLDEN_GAMMA.wrapping_mul(t + 1)).collect();
        assert_eq!(a, b);
        for i in 0..a.len() {
            for j in (i + 1)..a.len() {
                assert_ne!(a[i], a[j]);
            }
        }
    }

    #[test]
    fn test_make_seed_passthrough() {
        assert_eq!(make_seed(42), 42);
        // Derived seeds come from clock and entropy; just exercise the path.
        let _ = make_seed(0);
    }

    #[test]
    fn test_resolve_worker_count() {
        assert_eq!(resolve_worker_count(3), 3);
        assert!(resolve_worker_count(0) >= 1);
    }

    #[test]
    fn test_high_snr_produces_no_errors() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let r = simulate_point(
            60.0,
            &params(1, 50_000, 2),
            &Ask2Modem,
            &AwgnChannel,
            &Uncoded,
            &mut rng,
        );
        assert_eq!(r.errs, 0);
        assert_eq!(r.ber, 0.0);
        assert!(r.bits >= 50_000);
        assert_eq!((r.ci_lo, r.ci_hi), (0.0, 0.0));
    }

    #[test]
    fn test_result_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut p = params(500, 1_000_000, 2);
        p.ci_abs = 1.0; // enable CI computation without letting it stop early
        p.ci_min_bits = 0;
        let r = simulate_point(0.0, &p, &Ask2Modem, &AwgnChannel, &Uncoded, &mut rng);
        assert!(r.errs <= r.bits);
        assert!((0.0..=1.0).contains(&r.ber));
        assert!(r.ci_lo <= r.ber && r.ber <= r.ci_hi);
        assert!(r.ci_hi <= 1.0);
    }

    #[test]
    fn test_deterministic_with_fixed_seed_single_worker() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let p = params(200, 1_000_000, 1);
        let ra = simulate_point(4.0, &p, &Ask2Modem, &AwgnChannel, &Uncoded, &mut a);
        let rb = simulate_point(4.0, &p, &Ask2Modem, &AwgnChannel, &Uncoded, &mut b);
        assert_eq!(ra, rb);
    }

    #[test]
    fn test_max_bits_overshoot_is_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // min_errors = 0 with CI disabled would stop at the first
        // published frame; force max_bits to govern instead.
        let mut p = params(0, 100_000, 4);
        p.min_errors = u64::MAX;
        let r = simulate_point(0.0, &p, &Ask2Modem, &AwgnChannel, &Uncoded, &mut rng);
        assert!(r.bits >= p.max_bits);
        // Every worker may finish the frame it is in when the flag goes
        // up; allow one further frame of scheduling slack per worker.
        assert!(r.bits <= p.max_bits + (2 * p.workers * p.frame_len) as u64);
    }

    /// 2-ASK over AWGN at 4 dB matches Q(√(2·Eb/N0)) ≈ 0.01250.
    #[test]
    fn test_awgn_ask2_calibration_4db() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let r = simulate_point(
            4.0,
            &params(2000, 10_000_000, 2),
            &Ask2Modem,
            &AwgnChannel,
            &Uncoded,
            &mut rng,
        );
        assert!(r.ber > 0.010 && r.ber < 0.014, "ber = {}", r.ber);
    }

    /// Same link at 0 dB: Q(√2) ≈ 0.0786.
    #[test]
    fn test_awgn_ask2_calibration_0db() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let r = simulate_point(
            0.0,
            &params(20_000, 10_000_000, 2),
            &Ask2Modem,
            &AwgnChannel,
            &Uncoded,
            &mut rng,
        );
        assert!(r.ber > 0.075 && r.ber < 0.081, "ber = {}", r.ber);
    }

    /// Gray labeling beats Natural at the same SNR: adjacent symbol slips
    /// cost one bit under Gray but sometimes two under Natural. At 8 dB
    /// the Gray BER is (3/4)·Q(√(4·Eb/N0/5)) ≈ 0.0092 and Natural runs
    /// 4/3 of that.
    #[test]
    fn test_ask4_gray_beats_natural() {
        let p = params(2000, 10_000_000, 2);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let gray = simulate_point(
            8.0,
            &p,
            &Ask4Modem::new(Ask4Mapping::Gray),
            &AwgnChannel,
            &Uncoded,
            &mut rng,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let natural = simulate_point(
            8.0,
            &p,
            &Ask4Modem::new(Ask4Mapping::Natural),
            &AwgnChannel,
            &Uncoded,
            &mut rng,
        );

        assert!(gray.ber > 0.0075 && gray.ber < 0.011, "gray = {}", gray.ber);
        assert!(
            natural.ber > gray.ber * 1.15,
            "natural = {}, gray = {}",
            natural.ber,
            gray.ber
        );
    }

    /// The K=7 code at 6 dB sits at least an order of magnitude below
    /// the uncoded link.
    #[test]
    fn test_conv_coding_gain() {
        let mut p = params(100, 1_000_000, 2);
        p.frame_len = 4096;

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let uncoded = simulate_point(6.0, &p, &Ask2Modem, &AwgnChannel, &Uncoded, &mut rng);

        let coder = ConvK7R12::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let coded = simulate_point(6.0, &p, &Ask2Modem, &AwgnChannel, &coder, &mut rng);

        assert!(
            coded.ber * 10.0 <= uncoded.ber,
            "coded = {}, uncoded = {}",
            coded.ber,
            uncoded.ber
        );
    }

    /// Real-valued Rayleigh with coherent equalization: the exact
    /// average is arctan(1/√(2·Eb/N0))/π ≈ 0.0701 at 10 dB.
    #[test]
    fn test_rayleigh_ask2_calibration_10db() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let r = simulate_point(
            10.0,
            &params(2000, 10_000_000, 2),
            &Ask2Modem,
            &RayleighChannel,
            &Uncoded,
            &mut rng,
        );
        let expected = (1.0 / (2.0 * 10f64).sqrt()).atan() / std::f64::consts::PI;
        assert!(
            (r.ber - expected).abs() < 0.006,
            "ber = {}, expected = {}",
            r.ber,
            expected
        );
    }

    /// The floor predicate needs Wilson evidence, not just a low estimate.
    #[test]
    fn test_ber_floor_stops_with_evidence() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut p = params(u64::MAX, 5_000_000, 2);
        p.ber_floor = 1e-3;
        p.ci_min_bits = 10_000;
        // 12 dB: true BER ≈ 9e-6, far under the floor.
        let r = simulate_point(12.0, &p, &Ask2Modem, &AwgnChannel, &Uncoded, &mut rng);
        assert!(r.bits >= p.ci_min_bits);
        assert!(r.bits < p.max_bits, "floor should stop before max_bits");
    }

    /// CI goals: run until the absolute half-width target is met.
    #[test]
    fn test_ci_absolute_goal() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut p = params(100, 50_000_000, 2);
        p.ci_abs = 2e-3;
        p.ci_min_bits = 1_000;
        let r = simulate_point(0.0, &p, &Ask2Modem, &AwgnChannel, &Uncoded, &mut rng);
        assert!(r.ci_hi > r.ci_lo);
        let half = (r.ci_hi - r.ci_lo) / 2.0;
        // Published interval honors the goal (modulo one frame of overshoot
        // tightening it further).
        assert!(half <= 2.1e-3, "half = {}", half);
        assert!(r.bits < p.max_bits);
    }
}
