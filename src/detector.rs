//! Burst detector (C4): adaptive thresholding and peak selection over a
//! correlation trace.

use crate::correlator::CorrelationTrace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectOutcome {
    /// Initial sync found an ascending pair of peaks at the expected
    /// spacing; carries the later peak's index.
    InitialSync(usize),
    /// A single burst was found inside the guard window; carries its index.
    SingleBurst(usize),
    /// No qualifying peak was found. A normal outcome, not an error.
    NotFound,
}

fn mean_stddev(trace: &[f32]) -> (f32, f32) {
    let n = trace.len() as f32;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = trace.iter().sum::<f32>() / n;
    let var = trace.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (mean, var.sqrt())
}

/// Indices in `trace` that exceed `mean + threshold_factor * stddev`,
/// ascending, after collapsing runs of adjacent crossings closer than
/// `min_peak_distance` into their local maximum.
fn threshold_crossings(trace: &[f32], threshold_factor: u32, min_peak_distance: u64) -> Vec<usize> {
    let (mean, stddev) = mean_stddev(trace);
    let threshold = mean + threshold_factor as f32 * stddev;

    let raw: Vec<usize> = trace
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > threshold)
        .map(|(i, _)| i)
        .collect();

    let min_dist = min_peak_distance as usize;
    let mut merged: Vec<usize> = Vec::new();
    let mut run_start = 0usize;
    for (pos, &ix) in raw.iter().enumerate() {
        if pos == 0 {
            run_start = pos;
            continue;
        }
        if ix - raw[pos - 1] > min_dist {
            merged.push(local_max_index(trace, &raw[run_start..pos]));
            run_start = pos;
        }
    }
    if !raw.is_empty() {
        merged.push(local_max_index(trace, &raw[run_start..]));
    }
    merged
}

fn local_max_index(trace: &[f32], run: &[usize]) -> usize {
    *run.iter()
        .max_by(|&&a, &&b| trace[a].partial_cmp(&trace[b]).unwrap())
        .unwrap()
}

/// Initial-sync search: looks over the whole trace for the first ascending
/// pair of peaks spaced within `max_sync_error` of `burst_period_samples`.
pub fn detect_initial_sync(
    trace: &CorrelationTrace,
    threshold_factor: u32,
    min_peak_distance: u64,
    burst_period_samples: i64,
    max_sync_error: i64,
) -> DetectOutcome {
    let peaks = threshold_crossings(&trace.0, threshold_factor, min_peak_distance);
    if peaks.len() < 2 {
        return DetectOutcome::NotFound;
    }
    let n = peaks.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (pi, pj) = (peaks[i] as i64, peaks[j] as i64);
            if (pj - pi - burst_period_samples).abs() <= max_sync_error {
                return DetectOutcome::InitialSync(peaks[j] as usize);
            }
        }
    }
    DetectOutcome::NotFound
}

/// Single-burst search restricted to a guard window around `expected_ix`.
///
/// The adaptive threshold is computed from a window of width `l_ref`
/// centered on the trace's global arg-max, per spec; the guard window used
/// for the actual peak search is independent and centered on `expected_ix`.
pub fn detect_single_burst(
    trace: &CorrelationTrace,
    threshold_factor: u32,
    l_ref: usize,
    expected_ix: i64,
    tx_burst_length: i64,
    ping_burst_guard: i64,
) -> DetectOutcome {
    if trace.is_empty() {
        return DetectOutcome::NotFound;
    }
    let (global_max_ix, _) = trace.argmax().unwrap();
    let half_l = (l_ref / 2).max(1);
    let stat_lo = global_max_ix.saturating_sub(half_l);
    let stat_hi = (global_max_ix + half_l).min(trace.len() - 1);
    let (mean, stddev) = mean_stddev(&trace.0[stat_lo..=stat_hi]);
    let threshold = mean + threshold_factor as f32 * stddev;

    let half_w = tx_burst_length / 2 + ping_burst_guard;
    let lo = (expected_ix - half_w).max(0) as usize;
    let hi = ((expected_ix + half_w).max(0) as usize).min(trace.len().saturating_sub(1));
    if lo > hi {
        return DetectOutcome::NotFound;
    }

    let window = &trace.0[lo..=hi];
    let (local_ix, &peak_val) = window
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .unwrap();

    if peak_val > threshold {
        DetectOutcome::SingleBurst(lo + local_ix)
    } else {
        DetectOutcome::NotFound
    }
}
