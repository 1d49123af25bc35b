//! Builds the shaped chip waveforms the orchestrator transmits and
//! correlates against, wiring together C1 (codegen) and C2 (shaper) with the
//! burst-length/warm-up parameters from [`Config`].

use num_complex::Complex32;

use crate::config::Config;
use crate::shaper;

/// The shaped TX burst for `code_index`, ready to hand to a radio's `write`.
pub fn tx_burst(cfg: &Config, code_index: u16, amplitude: f32) -> Vec<Complex32> {
    shaper::shape_burst(
        code_index,
        cfg.total_chip_count(),
        cfg.novs_tx,
        cfg.scrap_samples(cfg.novs_tx),
        amplitude,
    )
}

/// The reference waveform correlated against RX captures, shaped at the RX
/// oversampling factor (which may differ from the TX factor when the two
/// nodes' radios run different decimations).
pub fn rx_reference(cfg: &Config, code_index: u16) -> Vec<Complex32> {
    shaper::shape_burst(
        code_index,
        cfg.total_chip_count(),
        cfg.novs_rx,
        cfg.scrap_samples(cfg.novs_rx),
        1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_burst_nonempty_and_unit_ish_amplitude() {
        let cfg = Config::default();
        let burst = tx_burst(&cfg, cfg.ping_scr_code, 1.0);
        assert!(!burst.is_empty());
    }

    #[test]
    fn rx_reference_matches_expected_length() {
        let cfg = Config::default();
        let reference = rx_reference(&cfg, cfg.ping_scr_code);
        let expected_len =
            cfg.total_chip_count() * cfg.novs_rx as usize - cfg.scrap_samples(cfg.novs_rx);
        assert_eq!(reference.len(), expected_len);
    }
}
