//! Cross-correlator (C3): slides a reference waveform against a captured RX
//! buffer and returns the magnitude trace at every valid offset.

use num_complex::Complex32;
use rustfft::FftPlanner;

/// `c[k] = |sum_m conj(r[m]) * s[k+m]|` for `k` in `0 ..= rx.len() - reference.len()`.
#[derive(Debug, Clone, Default)]
pub struct CorrelationTrace(pub Vec<f32>);

impl CorrelationTrace {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn argmax(&self) -> Option<(usize, f32)> {
        self.0
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((i, v)),
            })
    }
}

/// Direct time-domain correlation. `O(reference.len() * rx.len())`; intended
/// for short reference windows (initial sync, unit tests). Produces an empty
/// trace when `rx` is shorter than `reference`.
pub fn correlate_direct(reference: &[Complex32], rx: &[Complex32]) -> CorrelationTrace {
    let m = reference.len();
    let n = rx.len();
    if n < m || m == 0 {
        return CorrelationTrace(Vec::new());
    }
    let mut out = Vec::with_capacity(n - m + 1);
    for k in 0..=(n - m) {
        let mut acc = Complex32::new(0.0, 0.0);
        for (r, s) in reference.iter().zip(&rx[k..k + m]) {
            acc += r.conj() * s;
        }
        out.push(acc.norm());
    }
    CorrelationTrace(out)
}

/// FFT-based (overlap-save style) correlation, used for the long RX windows
/// the live orchestrator loops work with, where direct correlation would
/// dominate each period's CPU budget.
pub fn correlate_fft(reference: &[Complex32], rx: &[Complex32]) -> CorrelationTrace {
    let m = reference.len();
    let n = rx.len();
    if n < m || m == 0 {
        return CorrelationTrace(Vec::new());
    }

    let fft_len = (n + m).next_power_of_two();
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    // Matched filter: correlation is convolution with the time-reversed,
    // conjugated reference.
    let mut h = vec![Complex32::new(0.0, 0.0); fft_len];
    for (i, r) in reference.iter().rev().enumerate() {
        h[i] = r.conj();
    }
    let mut x = vec![Complex32::new(0.0, 0.0); fft_len];
    x[..n].copy_from_slice(rx);

    fft.process(&mut h);
    fft.process(&mut x);
    for (a, b) in x.iter_mut().zip(h.iter()) {
        *a *= *b;
    }
    ifft.process(&mut x);

    let scale = 1.0 / fft_len as f32;
    // Full convolution sample k (0-based, length n+m-1) corresponds to
    // reference anchored so that output index k == 0 aligns with rx index
    // m-1 in the direct formulation above; the valid region is k in
    // [m-1, n-1].
    let mut out = Vec::with_capacity(n - m + 1);
    for k in (m - 1)..n {
        out.push((x[k] * scale).norm());
    }
    CorrelationTrace(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rx_with_embedded_ref(reference: &[Complex32], offset: usize, tail: usize) -> Vec<Complex32> {
        let mut rx = vec![Complex32::new(0.0, 0.0); offset];
        rx.extend_from_slice(reference);
        rx.extend(vec![Complex32::new(0.0, 0.0); tail]);
        rx
    }

    #[test]
    fn peak_at_offset_direct() {
        let chips = crate::codegen::generate(2, 64);
        let reference: Vec<Complex32> = chips.iter().map(|c| Complex32::new(c.re as f32, c.im as f32)).collect();
        let rx = make_rx_with_embedded_ref(&reference, 37, 20);
        let trace = correlate_direct(&reference, &rx);
        let (peak_ix, _) = trace.argmax().unwrap();
        assert_eq!(peak_ix, 37);
    }

    #[test]
    fn peak_at_offset_fft_matches_direct() {
        let chips = crate::codegen::generate(12, 80);
        let reference: Vec<Complex32> = chips.iter().map(|c| Complex32::new(c.re as f32, c.im as f32)).collect();
        let rx = make_rx_with_embedded_ref(&reference, 123, 50);
        let direct = correlate_direct(&reference, &rx);
        let fft = correlate_fft(&reference, &rx);
        assert_eq!(direct.len(), fft.len());
        for (d, f) in direct.0.iter().zip(fft.0.iter()) {
            approx::assert_abs_diff_eq!(d, f, epsilon = 1e-2);
        }
    }

    #[test]
    fn too_short_rx_yields_empty_trace() {
        let reference = vec![Complex32::new(1.0, 0.0); 10];
        let rx = vec![Complex32::new(1.0, 0.0); 5];
        assert!(correlate_direct(&reference, &rx).is_empty());
        assert!(correlate_fft(&reference, &rx).is_empty());
    }
}
