//! Pulse shaper (C2): upsample by sample repetition, FIR-filter I/Q
//! independently, then scrap the filter warm-up region.

use num_complex::{Complex32, Complex64};

use crate::fir_tables;

/// Repeats each input sample `novs` times.
pub fn upsample(chips: &[Complex64], novs: u16) -> Vec<Complex64> {
    let novs = novs as usize;
    let mut out = Vec::with_capacity(chips.len() * novs);
    for &c in chips {
        for _ in 0..novs {
            out.push(c);
        }
    }
    out
}

/// Direct-form FIR convolution of a real signal with a real kernel,
/// truncated to the input length (discarding the `h.len() - 1` trailing
/// tail a full convolution would otherwise produce).
fn conv_same_len(x: &[f32], h: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0f32; x.len()];
    for n in 0..x.len() {
        let mut acc = 0.0f32;
        let k_max = h.len().min(n + 1);
        for k in 0..k_max {
            acc += h[k] * x[n - k];
        }
        out[n] = acc;
    }
    out
}

/// Filters I and Q independently with the coefficient bank matching `novs`.
pub fn filter(samples: &[Complex64], novs: u16) -> Vec<Complex32> {
    let coeffs = fir_tables::coefficients(novs);
    let i: Vec<f32> = samples.iter().map(|c| c.re as f32).collect();
    let q: Vec<f32> = samples.iter().map(|c| c.im as f32).collect();
    let i_filt = conv_same_len(&i, coeffs);
    let q_filt = conv_same_len(&q, coeffs);
    i_filt
        .into_iter()
        .zip(q_filt)
        .map(|(re, im)| Complex32::new(re, im))
        .collect()
}

/// Drops the leading `n` samples, the filter warm-up region.
pub fn scrap(samples: &[Complex32], n: usize) -> Vec<Complex32> {
    if n >= samples.len() {
        return Vec::new();
    }
    samples[n..].to_vec()
}

/// Full pipeline: generate chips for `code_index`, upsample, filter, scrap
/// the warm-up, and scale by `amplitude`. `chip_count` is the number of
/// chips *before* the warm-up padding described by
/// `extra_samples_filter`; callers that want a burst with extra warm-up
/// chips already folded in should pass that larger count and an
/// appropriately sized `scrap_samples`.
pub fn shape_burst(
    code_index: u16,
    chip_count: usize,
    novs: u16,
    scrap_samples: usize,
    amplitude: f32,
) -> Vec<Complex32> {
    let chips = crate::codegen::generate(code_index, chip_count);
    let upsampled = upsample(&chips, novs);
    let filtered = filter(&upsampled, novs);
    let scrapped = scrap(&filtered, scrap_samples);
    scrapped.into_iter().map(|c| c * amplitude).collect()
}
