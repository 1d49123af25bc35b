//! End-to-end scenarios exercising the protocol components together,
//! without going through the beacon/tag orchestrator threads (except for
//! the final PONG round-trip scenario, which drives the real state
//! machines against a pair of `SimulatedRadio` endpoints).

use std::thread;
use std::time::Duration;

use num_complex::Complex32;

use ranging::cancel::CancelToken;
use ranging::config::Config;
use ranging::correlator;
use ranging::detector::{self, DetectOutcome};
use ranging::orchestrator::{beacon, tag};
use ranging::radio::simulator::{RadioSimulatorConfig, SimulatedRadio};
use ranging::timebase;
use ranging::waveform;

fn test_config() -> Config {
    let mut cfg = Config::default();
    // Shrink the timeline so these tests run in milliseconds, not the
    // default 10ms-period / 512-chip production sizing.
    cfg.tx_burst_length_chip = 64;
    cfg.extra_samples_filter = 0.125;
    cfg.burst_period = 2e-3;
    cfg.novs_tx = 2;
    cfg.novs_rx = 2;
    cfg.f_clk = 122.88e6;
    cfg.pong_delay = 0.2e-3;
    cfg.pong_delay_processing = 0.1e-3;
    cfg.time_in_future = 0.05;
    cfg.validate().unwrap();
    cfg
}

/// Embeds a shaped burst inside a buffer of low-level noise at `offset`,
/// matching the shape a real RX capture would show.
fn embed_burst(burst: &[Complex32], total_len: usize, offset: usize) -> Vec<Complex32> {
    let mut rx = vec![Complex32::new(0.0, 0.0); total_len];
    for (i, &s) in burst.iter().enumerate() {
        if offset + i < rx.len() {
            rx[offset + i] = s;
        }
    }
    rx
}

// Scenario 1: clean loopback. A PING burst embedded with no noise and no
// timing error must be found exactly at its true offset by direct
// correlation.
#[test]
fn clean_loopback_finds_burst_at_true_offset() {
    let cfg = test_config();
    let reference = waveform::rx_reference(&cfg, cfg.ping_scr_code);
    let burst = waveform::tx_burst(&cfg, cfg.ping_scr_code, 1.0);

    let offset = 137;
    let rx = embed_burst(&burst, offset + burst.len() + 200, offset);

    let trace = correlator::correlate_direct(&reference, &rx);
    let (peak_ix, _) = trace.argmax().unwrap();
    assert_eq!(peak_ix, offset);
}

// Scenario 2: jittered spacing. Two PING-shaped peaks spaced a few samples
// off the nominal burst period must still pair for initial sync as long as
// they're within `max_sync_error`, and must be rejected once they drift
// past it.
#[test]
fn jittered_spacing_stays_within_sync_tolerance() {
    let cfg = test_config();
    let period = cfg.burst_period_samples();

    let accepted = detector::detect_initial_sync(
        &detector_trace(period, 4),
        cfg.threshold_factor,
        cfg.min_peak_distance,
        period,
        cfg.max_sync_error,
    );
    assert!(matches!(accepted, DetectOutcome::InitialSync(_)));

    let rejected = detector::detect_initial_sync(
        &detector_trace(period, cfg.max_sync_error + 1),
        cfg.threshold_factor,
        cfg.min_peak_distance,
        period,
        cfg.max_sync_error,
    );
    assert_eq!(rejected, DetectOutcome::NotFound);
}

fn detector_trace(period: i64, jitter: i64) -> ranging::correlator::CorrelationTrace {
    let len = (period * 3) as usize;
    let mut v = vec![0.01f32; len];
    let first = 50usize;
    let second = (first as i64 + period + jitter) as usize;
    v[first] = 10.0;
    v[second] = 10.0;
    ranging::correlator::CorrelationTrace(v)
}

// Scenario 3: tracking. Once an anchor is established, the expected index
// for the *next* period's buffer must land close to where the burst
// actually is, even though the anchor is now almost a full period stale
// relative to the new capture time (the common SEARCH_FOR_PING case).
#[test]
fn tracking_predicts_next_burst_near_true_position() {
    let cfg = test_config();
    let sample_rate = cfg.sampling_rate_rx();
    let burst_period_ns = cfg.burst_period_ns();

    let capture_ns = 10 * burst_period_ns;
    let anchor_ns = capture_ns - burst_period_ns + 1_000; // almost a full period behind

    let expected_ix = timebase::expected_ping_ix(anchor_ns, capture_ns, burst_period_ns, sample_rate);
    let true_next_ns = anchor_ns + burst_period_ns;
    let true_ix = ((true_next_ns - capture_ns) as f64 * sample_rate / 1e9).round() as i64;

    assert!((expected_ix - true_ix).abs() <= 1);
}

// Scenario 4: degenerate timestamp. An anchor that has drifted wildly from
// the capture time (a clock glitch) must not be trusted for a multi-period
// wraparound; it re-anchors to the start of the current buffer instead of
// producing an arbitrary index.
#[test]
fn degenerate_anchor_does_not_alias_to_wrong_cycle() {
    let cfg = test_config();
    let sample_rate = cfg.sampling_rate_rx();
    let burst_period_ns = cfg.burst_period_ns();
    let capture_ns = 5_000_000_000i64;

    let garbage_anchor_ns = capture_ns + 60_000_000_000i64; // far beyond any plausible drift
    let ix = timebase::expected_ping_ix(garbage_anchor_ns, capture_ns, burst_period_ns, sample_rate);
    assert_eq!(ix, 0);
}

// Scenario 5: scheduling past. A TX schedule that has already elapsed by
// the time the beacon gets around to checking it must be rejected and
// re-anchored forward by whole burst periods, never transmitted late.
#[test]
fn scheduling_past_reanchors_to_next_future_period() {
    let cfg = test_config();
    let ticks_per_period = cfg.burst_period_samples();

    let last_tx = 0i64;
    let now = ticks_per_period * 7 + 3; // well past several missed periods
    let next = timebase::schedule_tx_after(last_tx, ticks_per_period, now);

    assert!(timebase::check_scheduled_time(next, now));
    assert_eq!((next - last_tx) % ticks_per_period, 0);
}

// Scenario 6: full PONG round-trip. Runs the real beacon and tag state
// machines, each on its own thread, against a connected pair of simulated
// radios with a small propagation delay and light noise, and checks that
// the beacon recovers a round-trip time measurement in the right
// ballpark (at least one period, since the tag replies only after the
// configured PONG delay, and well under a handful of periods).
#[test]
fn pong_round_trip_produces_plausible_rtt() {
    let cfg = test_config();

    let sim_cfg = RadioSimulatorConfig {
        sample_rate: cfg.sampling_rate_rx(),
        noise_stddev: 0.02,
        propagation_delay_ns: 300,
        max_cfo_hz: 0.0,
        phase_noise_stddev: 0.0,
        seed: 7,
    };
    let (beacon_radio, tag_radio) = SimulatedRadio::new_pair(sim_cfg);

    let beacon_cancel = CancelToken::new();
    let tag_cancel = CancelToken::new();

    let beacon_cfg = cfg.clone();
    let beacon_cancel_for_thread = beacon_cancel.clone();
    let beacon_handle = thread::spawn(move || {
        beacon::run(Box::new(beacon_radio), beacon_cfg, beacon_cancel_for_thread)
    });

    let tag_cfg = cfg.clone();
    let tag_cancel_for_thread = tag_cancel.clone();
    let mut tag_radio = tag_radio;
    let tag_handle = thread::spawn(move || tag::run(&mut tag_radio, &tag_cfg, &tag_cancel_for_thread));

    // Let a handful of burst periods elapse so at least one full PING/PONG
    // cycle completes, then ask both sides to stop.
    let run_for = Duration::from_millis(200);
    thread::sleep(run_for);
    beacon_cancel.cancel();
    tag_cancel.cancel();

    let beacon_summary = beacon_handle.join().expect("beacon thread panicked").expect("beacon run failed");
    let tag_summary = tag_handle.join().expect("tag thread panicked").expect("tag run failed");

    assert!(tag_summary.pings_found >= 1, "tag never found a PING: {tag_summary}");
    assert!(tag_summary.pongs_sent >= 1, "tag never sent a PONG: {tag_summary}");
    assert!(beacon_summary.pongs_found >= 1, "beacon never found a PONG: {beacon_summary}");

    let rtt_ns = beacon_summary
        .measured_rtt_ns
        .expect("beacon should have measured at least one RTT");
    assert!(rtt_ns > 0, "measured RTT must be positive, got {rtt_ns}");
    assert!(
        rtt_ns < cfg.burst_period_ns() * 3,
        "measured RTT {rtt_ns} implausibly large for burst_period_ns={}",
        cfg.burst_period_ns()
    );
}
