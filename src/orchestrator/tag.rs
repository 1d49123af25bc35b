//! Tag state machine: `INITIAL_SYNC -> SEARCH_FOR_PING -> SEND_PONG -> (loop)`.
//!
//! Single-threaded: the tag never transmits and receives at the same time,
//! so one causal loop suffices, unlike the beacon's concurrent TX/RX tasks.

use log::{info, warn};
use num_complex::Complex32;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::correlator;
use crate::detector::{self, DetectOutcome};
use crate::error::{OrchestratorError, RetryOutcome};
use crate::radio::status::RadioStatus;
use crate::radio::RadioDevice;
use crate::timebase;
use crate::waveform;

use super::state::TagState;
use super::RangingSummary;

pub fn run(
    radio: &mut dyn RadioDevice,
    cfg: &Config,
    cancel: &CancelToken,
) -> Result<RangingSummary, OrchestratorError> {
    radio.connect(None)?;
    radio.configure(cfg)?;
    radio.start()?;

    let result = run_loop(radio, cfg, cancel);

    radio.close()?;
    result
}

fn run_loop(
    radio: &mut dyn RadioDevice,
    cfg: &Config,
    cancel: &CancelToken,
) -> Result<RangingSummary, OrchestratorError> {
    let ping_reference = waveform::rx_reference(cfg, cfg.ping_scr_code);

    let mut summary = RangingSummary::default();
    let mut state = TagState::InitialSync;
    let mut anchor_ns: i64 = 0;
    let mut ping_tries: u64 = 0;

    while !cancel.is_cancelled() {
        match state {
            TagState::InitialSync => {
                let mut buf = vec![Complex32::new(0.0, 0.0); cfg.rx_samples_initial_sync()];
                let (status, capture_ns) = radio.read(&mut buf);
                if status != RadioStatus::Ok && !status.is_recoverable() {
                    return Err(OrchestratorError::DriverFatal(format!("{status:?}")));
                }
                if RetryOutcome::from_radio_status(status) == RetryOutcome::RecoverableIo {
                    continue;
                }

                let trace = correlator::correlate_fft(&ping_reference, &buf);
                let outcome = detector::detect_initial_sync(
                    &trace,
                    cfg.threshold_factor,
                    cfg.min_peak_distance,
                    cfg.burst_period_samples(),
                    cfg.max_sync_error,
                );
                match outcome {
                    DetectOutcome::InitialSync(ix) => {
                        anchor_ns = radio.ix_to_ns(ix as i64, capture_ns);
                        ping_tries = 0;
                        info!("tag: initial sync achieved at ix={ix}");
                        state = TagState::SearchForPing;
                    }
                    _ => continue,
                }
            }

            TagState::SearchForPing => {
                let mut buf = vec![Complex32::new(0.0, 0.0); cfg.rx_samples_single_burst()];
                let (status, capture_ns) = radio.read(&mut buf);
                if status != RadioStatus::Ok && !status.is_recoverable() {
                    return Err(OrchestratorError::DriverFatal(format!("{status:?}")));
                }
                if RetryOutcome::from_radio_status(status) == RetryOutcome::RecoverableIo {
                    continue;
                }

                let expected_ix = radio.expected_ping_pos_ix(anchor_ns, capture_ns, cfg.burst_period_ns());
                let trace = correlator::correlate_fft(&ping_reference, &buf);
                let outcome = detector::detect_single_burst(
                    &trace,
                    cfg.threshold_factor,
                    ping_reference.len(),
                    expected_ix,
                    cfg.tx_burst_length_samples() as i64,
                    cfg.ping_burst_guard,
                );
                match outcome {
                    DetectOutcome::SingleBurst(ix) => {
                        anchor_ns = radio.ix_to_ns(ix as i64, capture_ns);
                        ping_tries = 0;
                        summary.pings_found += 1;
                        state = TagState::SendPong;
                    }
                    DetectOutcome::NotFound => {
                        // RetryOutcome::DetectMiss
                        ping_tries += 1;
                        summary.ping_misses += 1;
                        if ping_tries > cfg.num_of_ping_tries {
                            warn!("tag: lost sync after {ping_tries} missed PINGs, re-syncing");
                            summary.resyncs += 1;
                            state = TagState::InitialSync;
                        }
                    }
                    DetectOutcome::InitialSync(_) => unreachable!(),
                }
            }

            TagState::SendPong => {
                let mut tx_time_ns = anchor_ns + cfg.pong_delay_ns();
                if !timebase::check_scheduled_time(tx_time_ns, radio.hardware_time_ns()) {
                    // RetryOutcome::SchedulingPast: the computed schedule
                    // already passed (e.g. we spent too long in
                    // SEARCH_FOR_PING). Re-anchor by whole burst periods
                    // rather than hand the radio a stale timestamp.
                    warn!("tag: PONG schedule {tx_time_ns} already past, re-anchoring");
                    while !timebase::check_scheduled_time(tx_time_ns, radio.hardware_time_ns()) {
                        tx_time_ns += cfg.burst_period_ns();
                    }
                }
                let burst = waveform::tx_burst(cfg, cfg.pong_scr_code, 1.0);
                let status = radio.write(&burst, tx_time_ns);
                if status != RadioStatus::Ok && !status.is_recoverable() {
                    return Err(OrchestratorError::DriverFatal(format!("{status:?}")));
                }
                if RetryOutcome::from_radio_status(status) == RetryOutcome::RecoverableIo {
                    continue;
                }
                summary.pongs_sent += 1;
                state = TagState::SearchForPing;
            }
        }
    }

    Ok(summary)
}
