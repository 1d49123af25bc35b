//! Time-base coordinator (C5): pure functions converting between sample
//! index, hardware tick, and device nanosecond coordinates, and deriving
//! the schedule the orchestrator drives off of.
//!
//! None of these functions touch a radio or a clock; they take every input
//! explicitly so they can be unit tested without any device.

/// Converts a sample index captured at `capture_ns` into an absolute device
/// nanosecond timestamp, given the RX sample rate.
pub fn ix_to_ns_device(ix: i64, capture_ns: i64, sample_rate: f64) -> i64 {
    capture_ns + ((ix as f64) * 1e9 / sample_rate).round() as i64
}

/// Expected sample index of the next PING inside a buffer captured at
/// `capture_ns`, given the last known PING anchor (`anchor_ns`) and the
/// burst period.
///
/// The anchor is periodic: the true next occurrence is `anchor_ns` advanced
/// (or pulled back) by whole burst periods until it falls in
/// `[capture_ns, capture_ns + burst_period_ns)`. That wrap is computed in
/// closed form with `rem_euclid` rather than an iterative per-period loop,
/// since `anchor_ns` and `capture_ns` can legitimately be many periods apart
/// (e.g. after a long run of missed PINGs) and a loop stepping one period at
/// a time would not be obviously bounded.
///
/// If the anchor has drifted more than 2 seconds away from the capture time,
/// that is treated as a degenerate/garbage timestamp (a clock glitch) rather
/// than a legitimately distant-but-periodic anchor: trusting the periodic
/// wrap over such a large span risks aliasing onto the wrong cycle, so the
/// anchor is reset to `capture_ns` directly, which wraps to index 0 — the
/// safe "expect it right at the start of this buffer" fallback.
pub fn expected_ping_ix(
    anchor_ns: i64,
    capture_ns: i64,
    burst_period_ns: i64,
    sample_rate: f64,
) -> i64 {
    debug_assert!(burst_period_ns > 0);
    let anchor = if (anchor_ns - capture_ns).abs() > 2_000_000_000 {
        capture_ns
    } else {
        anchor_ns
    };
    let rel_ns = (anchor - capture_ns).rem_euclid(burst_period_ns);
    ((rel_ns as f64) * sample_rate / 1e9).round() as i64
}

/// Expected sample index of the PONG reply inside a buffer captured at
/// `capture_ns`, given the absolute device time the PONG is due
/// (`expected_pong_ns`, typically `last_published_tx_ns + pong_delay_ns`).
///
/// Reuses [`expected_ping_ix`]'s re-anchor-by-whole-periods logic: a PONG
/// anchor is just another periodic event relative to the buffer's capture
/// time, offset by the constant `pong_pos_offset`, wrapped into
/// `[0, rx_samples_per_period)` per spec §4.5.
pub fn expected_pong_ix(
    expected_pong_ns: i64,
    capture_ns: i64,
    burst_period_ns: i64,
    pong_pos_offset: i64,
    sample_rate: f64,
) -> i64 {
    let ix = expected_ping_ix(expected_pong_ns, capture_ns, burst_period_ns, sample_rate) + pong_pos_offset;
    let rx_samples_per_period = ((burst_period_ns as f64) * sample_rate / 1e9).round() as i64;
    ix.rem_euclid(rx_samples_per_period)
}

/// The absolute hardware tick at which the next TX burst should be
/// scheduled: the last TX tick advanced by whole burst periods until it is
/// strictly in the future relative to `now_ticks`.
pub fn schedule_tx_after(last_tx_ticks: i64, ticks_per_period: i64, now_ticks: i64) -> i64 {
    debug_assert!(ticks_per_period > 0);
    let mut next = last_tx_ticks + ticks_per_period;
    if next <= now_ticks {
        let periods_behind = (now_ticks - next) / ticks_per_period + 1;
        next += periods_behind * ticks_per_period;
    }
    next
}

/// Whether a scheduled TX tick is still in the future relative to `now_ticks`.
pub fn check_scheduled_time(scheduled_ticks: i64, now_ticks: i64) -> bool {
    scheduled_ticks > now_ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 7.68e6; // sampling_rate_rx for novs_rx=2, f_clk=122.88e6

    #[test]
    fn ix_to_ns_roundtrip() {
        let capture_ns = 1_000_000_000i64;
        let ns = ix_to_ns_device(100, capture_ns, SR);
        assert!(ns > capture_ns);
    }

    #[test]
    fn expected_ping_ix_is_inverse_of_ix_to_ns_mod_period() {
        let capture_ns = 1_000_000_000i64;
        let burst_period_ns = 10_000_000i64;
        let anchor_ns = capture_ns + burst_period_ns / 2;
        let ix = expected_ping_ix(anchor_ns, capture_ns, burst_period_ns, SR);
        let ns = ix_to_ns_device(ix, capture_ns, SR);
        assert!((ns - anchor_ns).abs() < 1_000);
    }

    #[test]
    fn anchor_behind_capture_wraps_forward_to_next_occurrence() {
        // The common tracking case: the anchor is the *previous* PING,
        // typically about one burst period behind the new buffer's capture
        // time. The expected index must wrap forward to the next occurrence
        // inside this buffer, not go negative.
        let capture_ns = 1_000_000_000i64;
        let burst_period_ns = 10_000_000i64;
        let anchor_ns = capture_ns - burst_period_ns / 4;
        let ix = expected_ping_ix(anchor_ns, capture_ns, burst_period_ns, SR);
        assert!(ix > 0);
        let ns = ix_to_ns_device(ix, capture_ns, SR);
        assert!((ns - (anchor_ns + burst_period_ns)).abs() < 1_000);
    }

    #[test]
    fn degenerate_anchor_reanchors_within_window() {
        let capture_ns = 1_000_000_000i64;
        let burst_period_ns = 10_000_000i64;
        // Anchor is far in the past: must re-anchor by whole periods.
        let anchor_ns = capture_ns - 5_000_000_000i64;
        let ix = expected_ping_ix(anchor_ns, capture_ns, burst_period_ns, SR);
        let ns = ix_to_ns_device(ix, capture_ns, SR);
        assert!((ns - capture_ns).abs() <= 2_000_000_000);
    }

    #[test]
    fn degenerate_anchor_future_reanchors_too() {
        let capture_ns = 1_000_000_000i64;
        let burst_period_ns = 10_000_000i64;
        let anchor_ns = capture_ns + 5_000_000_000i64;
        let ix = expected_ping_ix(anchor_ns, capture_ns, burst_period_ns, SR);
        let ns = ix_to_ns_device(ix, capture_ns, SR);
        assert!((ns - capture_ns).abs() <= 2_000_000_000);
    }

    #[test]
    fn expected_pong_ix_matches_ping_ix_at_same_anchor() {
        let capture_ns = 1_000_000_000i64;
        let burst_period_ns = 10_000_000i64;
        let expected_pong_ns = capture_ns + burst_period_ns / 2;
        let ping_ix = expected_ping_ix(expected_pong_ns, capture_ns, burst_period_ns, SR);
        let pong_ix = expected_pong_ix(expected_pong_ns, capture_ns, burst_period_ns, 0, SR);
        assert_eq!(pong_ix, ping_ix);
    }

    #[test]
    fn expected_pong_ix_applies_pos_offset() {
        let capture_ns = 1_000_000_000i64;
        let burst_period_ns = 10_000_000i64;
        let expected_pong_ns = capture_ns + burst_period_ns / 2;
        let base = expected_pong_ix(expected_pong_ns, capture_ns, burst_period_ns, 0, SR);
        let offset = expected_pong_ix(expected_pong_ns, capture_ns, burst_period_ns, 7, SR);
        assert_eq!(offset, base + 7);
    }

    #[test]
    fn schedule_tx_after_is_strictly_future_and_monotonic() {
        let ticks_per_period = 1_228_800i64; // 10ms at 122.88MHz
        let last = 0i64;
        let next = schedule_tx_after(last, ticks_per_period, 100);
        assert!(check_scheduled_time(next, 100));
        assert_eq!(next, last + ticks_per_period);
    }

    #[test]
    fn schedule_tx_after_skips_missed_periods() {
        let ticks_per_period = 1000i64;
        let last = 0i64;
        // "now" is way past last+one period: must jump forward by whole
        // periods, not just add one.
        let next = schedule_tx_after(last, ticks_per_period, 5500);
        assert!(check_scheduled_time(next, 5500));
        assert_eq!((next - last) % ticks_per_period, 0);
    }

    #[test]
    fn scheduling_past_is_detected() {
        assert!(!check_scheduled_time(100, 200));
        assert!(check_scheduled_time(300, 200));
    }
}
