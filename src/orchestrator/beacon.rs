//! Beacon state machine: a TX task that emits PING bursts at a fixed period
//! and an independent RX/detect task that looks for the PONG reply to each
//! one, coordinated through the shared [`LastBurstNs`] cell, [`CancelToken`],
//! and [`SharedBeaconState`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use log::{info, warn};
use num_complex::Complex32;

use crate::cancel::{CancelToken, LastBurstNs};
use crate::config::Config;
use crate::correlator;
use crate::detector::{self, DetectOutcome};
use crate::error::{OrchestratorError, RetryOutcome};
use crate::radio::status::RadioStatus;
use crate::radio::RadioDevice;
use crate::timebase;
use crate::waveform;

use super::state::{BeaconState, SharedBeaconState};
use super::RangingSummary;

/// Runs the beacon to completion. Takes ownership of the radio so it can be
/// shared behind an `Arc` between the TX and RX/detect threads; it is
/// connected, configured, started, and closed here.
pub fn run(
    mut radio: Box<dyn RadioDevice>,
    cfg: Config,
    cancel: CancelToken,
) -> Result<RangingSummary, OrchestratorError> {
    radio.connect(None)?;
    radio.configure(&cfg)?;
    radio.start()?;

    let cfg = Arc::new(cfg);
    let last_burst_ns = LastBurstNs::new();
    let pings_sent = Arc::new(AtomicU64::new(0));
    let state = SharedBeaconState::new();

    let radio: Arc<dyn RadioDevice> = Arc::from(radio);

    let tx_handle = {
        let radio = radio.clone();
        let cfg = cfg.clone();
        let cancel = cancel.clone();
        let last_burst_ns = last_burst_ns.clone();
        let pings_sent = pings_sent.clone();
        let state = state.clone();
        thread::spawn(move || tx_task(&*radio, &cfg, &cancel, &last_burst_ns, &pings_sent, &state))
    };

    let rx_handle = {
        let radio = radio.clone();
        let cfg = cfg.clone();
        let cancel = cancel.clone();
        let last_burst_ns = last_burst_ns.clone();
        let state = state.clone();
        thread::spawn(move || rx_task(&*radio, &cfg, &cancel, &last_burst_ns, &state))
    };

    // LIFO join: TX was spawned first, so it is joined last.
    let rx_summary = rx_handle
        .join()
        .map_err(|_| OrchestratorError::DriverFatal("RX/detect task panicked".into()))?;
    cancel.cancel();
    tx_handle
        .join()
        .map_err(|_| OrchestratorError::DriverFatal("TX task panicked".into()))?;
    state.set(BeaconState::Done);

    let mut radio = radio;
    let handle = Arc::get_mut(&mut radio)
        .expect("TX and RX tasks have been joined; no other Arc clone should remain");
    handle.close()?;

    let mut summary = rx_summary;
    summary.pings_sent = pings_sent.load(Ordering::SeqCst);
    Ok(summary)
}

fn tx_task(
    radio: &dyn RadioDevice,
    cfg: &Config,
    cancel: &CancelToken,
    last_burst_ns: &LastBurstNs,
    pings_sent: &AtomicU64,
    state: &SharedBeaconState,
) {
    let burst = waveform::tx_burst(cfg, cfg.ping_scr_code, 1.0);
    let ticks_per_period = cfg.burst_period_samples();
    // Lead time before the first burst: the configured scheduling horizon
    // plus two full burst periods of slack, so the very first PING lands
    // comfortably past any RX/detect task startup lag on the tag side.
    let lead_ns = ((cfg.time_in_future + 2.0 * cfg.burst_period) * 1e9).round() as i64;
    let mut next_tick = radio.hardware_time_ns() + lead_ns;

    while !cancel.is_cancelled() {
        if !timebase::check_scheduled_time(next_tick, radio.hardware_time_ns()) {
            // RetryOutcome::SchedulingPast: re-anchor to the next future
            // burst boundary instead of transmitting late.
            next_tick = timebase::schedule_tx_after(next_tick, ticks_per_period, radio.hardware_time_ns());
            continue;
        }

        let status = radio.write(&burst, next_tick);
        if status != RadioStatus::Ok && !status.is_recoverable() {
            warn!("beacon tx: fatal status {status:?}, stopping TX task");
            cancel.cancel();
            return;
        }
        match RetryOutcome::from_radio_status(status) {
            RetryOutcome::Ok => {
                last_burst_ns.publish(next_tick);
                pings_sent.fetch_add(1, Ordering::SeqCst);
                state.set(BeaconState::AwaitPong);
            }
            RetryOutcome::RecoverableIo => {
                warn!("beacon tx: recoverable status {status:?}, retrying this slot");
            }
            RetryOutcome::SchedulingPast | RetryOutcome::DetectMiss => unreachable!(),
        }

        next_tick = timebase::schedule_tx_after(next_tick, ticks_per_period, next_tick);
    }
}

fn rx_task(
    radio: &dyn RadioDevice,
    cfg: &Config,
    cancel: &CancelToken,
    last_burst_ns: &LastBurstNs,
    state: &SharedBeaconState,
) -> RangingSummary {
    let pong_reference = waveform::rx_reference(cfg, cfg.pong_scr_code);
    let mut summary = RangingSummary::default();

    while !cancel.is_cancelled() {
        let Some(anchor_ns) = last_burst_ns.latest() else {
            thread::yield_now();
            continue;
        };

        let mut buf = vec![Complex32::new(0.0, 0.0); cfg.rx_samples_single_burst()];
        let (status, capture_ns) = radio.read(&mut buf);
        if status != RadioStatus::Ok && !status.is_recoverable() {
            warn!("beacon rx: fatal status {status:?}, stopping RX task");
            break;
        }
        if RetryOutcome::from_radio_status(status) == RetryOutcome::RecoverableIo {
            continue;
        }

        let expected_pong_ns = anchor_ns + cfg.pong_delay_ns();
        let expected_ix = radio.expected_pong_pos_ix(
            expected_pong_ns,
            capture_ns,
            cfg.burst_period_ns(),
            cfg.pong_pos_offset,
        );
        let trace = correlator::correlate_fft(&pong_reference, &buf);
        let outcome = detector::detect_single_burst(
            &trace,
            cfg.threshold_factor,
            pong_reference.len(),
            expected_ix,
            cfg.tx_burst_length_samples() as i64,
            cfg.ping_burst_guard,
        );

        match outcome {
            DetectOutcome::SingleBurst(ix) => {
                let pong_ns = radio.ix_to_ns(ix as i64, capture_ns);
                summary.pongs_found += 1;
                summary.measured_rtt_ns = Some(pong_ns - anchor_ns);
                info!("beacon: PONG found, rtt_ns={}", pong_ns - anchor_ns);
                state.set(BeaconState::Done);
                // One localized PONG is a complete measurement; stop the
                // run rather than waiting on external cancellation.
                cancel.cancel();
                break;
            }
            DetectOutcome::NotFound => {
                // RetryOutcome::DetectMiss
                summary.ping_misses += 1;
                state.set(BeaconState::TxEnabled);
            }
            DetectOutcome::InitialSync(_) => unreachable!(),
        }
    }

    summary
}
