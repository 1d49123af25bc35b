//! The immutable configuration record shared by every component.
//!
//! One `Config` is built once at startup (from CLI flags, optionally overlaid
//! with a `--config` TOML file) and validated before any radio I/O happens;
//! from then on it is only ever read, never mutated, and is shared by `Arc`
//! between the TX and RX/detect tasks.

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run this node as the beacon (`true`) or the tag (`false`).
    pub is_beacon: bool,

    /// Center frequency used for PING, in Hz.
    pub ping_frequency: f64,
    /// Center frequency used for PONG, in Hz.
    pub pong_frequency: f64,
    /// TX gain, in dB.
    pub tx_gain: f64,
    /// RX gain, in dB.
    pub rx_gain: f64,

    /// TX oversampling factor, one of 2, 4, 8.
    pub novs_tx: u16,
    /// RX oversampling factor, one of 2, 4, 8.
    pub novs_rx: u16,

    /// TX clock divider; TX sample rate = `f_clk / d_tx`.
    pub d_tx: u16,
    /// RX clock divider; RX sample rate = `f_clk / d_rx`.
    pub d_rx: u16,

    /// TX antenna port name, passed through to the radio driver verbatim.
    pub antenna_tx: String,
    /// RX antenna port name, passed through to the radio driver verbatim.
    pub antenna_rx: String,

    /// SDR system clock, in Hz. Sample rate is derived as `f_clk / decimation`.
    pub f_clk: f64,

    /// Time between PING transmissions, in seconds.
    pub burst_period: f64,
    /// PING burst length, in chips, before oversampling/filtering.
    pub tx_burst_length_chip: usize,
    /// Fraction of the burst length (in chips) reserved as filter warm-up to
    /// scrap from the front of every shaped waveform.
    pub extra_samples_filter: f64,

    /// Scrambling code index used for PING.
    pub ping_scr_code: u16,
    /// Scrambling code index used for PONG.
    pub pong_scr_code: u16,

    /// Maximum allowed deviation, in samples, between the observed and
    /// expected spacing of the two peaks used for initial sync.
    pub max_sync_error: i64,
    /// Minimum distance, in samples, enforced between two distinct peaks.
    pub min_peak_distance: u64,
    /// Adaptive threshold = mean + `threshold_factor` * stddev.
    pub threshold_factor: u32,
    /// Number of PING search attempts allowed before returning to initial sync.
    pub num_of_ping_tries: u64,
    /// Guard samples padded on either side of the expected PING position when
    /// searching for a single burst.
    pub ping_burst_guard: i64,

    /// Tag-side delay from PING reception to PONG transmission, in seconds.
    pub pong_delay: f64,
    /// Extra processing slack added on top of `pong_delay` before the beacon
    /// expects to see the PONG, in seconds.
    pub pong_delay_processing: f64,
    /// Constant offset applied to the expected PONG sample index. Defaults
    /// to zero; set explicitly if a deployment needs a fixed compensation.
    pub pong_pos_offset: i64,

    /// How far into the future, in seconds, the first TX is scheduled.
    pub time_in_future: f64,
    /// Stream read/write timeout, in seconds.
    pub timeout: f64,

    pub tx_active: bool,
    pub rx_active: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            is_beacon: true,

            ping_frequency: 800e6,
            pong_frequency: 500e6,
            tx_gain: 50.0,
            rx_gain: 20.0,

            novs_tx: 2,
            novs_rx: 2,
            d_tx: 16,
            d_rx: 16,

            antenna_tx: "TX/RX".to_string(),
            antenna_rx: "RX2".to_string(),

            f_clk: 122.88e6,

            burst_period: 10e-3,
            tx_burst_length_chip: 512,
            extra_samples_filter: 0.125,

            ping_scr_code: 2,
            pong_scr_code: 12,

            max_sync_error: 5,
            min_peak_distance: 10,
            threshold_factor: 8,
            num_of_ping_tries: 10,
            ping_burst_guard: 2,

            pong_delay: 5e-3,
            pong_delay_processing: 2.0 * 10e-3,
            pong_pos_offset: 0,

            time_in_future: 1.0,
            timeout: 2.0,

            tx_active: true,
            rx_active: true,
        }
    }
}

impl Config {
    pub fn sampling_rate_tx(&self) -> f64 {
        self.f_clk / self.d_tx as f64
    }

    pub fn sampling_rate_rx(&self) -> f64 {
        self.f_clk / self.d_rx as f64
    }

    /// Samples per burst period at the RX sample rate.
    pub fn burst_period_samples(&self) -> i64 {
        (self.burst_period * self.sampling_rate_rx()).round() as i64
    }

    /// Shaped PING burst length, in samples, at the TX oversampling rate.
    pub fn tx_burst_length_samples(&self) -> usize {
        self.tx_burst_length_chip * self.novs_tx as usize
    }

    /// Read-buffer size for the initial-sync search: two full burst periods.
    pub fn rx_samples_initial_sync(&self) -> usize {
        (2.0 * self.sampling_rate_rx() * self.burst_period).round() as usize
    }

    /// Read-buffer size for a single-burst (PING or PONG) search: one burst period.
    pub fn rx_samples_single_burst(&self) -> usize {
        (self.sampling_rate_rx() * self.burst_period).round() as usize
    }

    /// Extra filter warm-up chips appended ahead of the burst proper.
    pub fn warmup_chips(&self) -> f64 {
        self.tx_burst_length_chip as f64 * self.extra_samples_filter
    }

    /// Total chip count to generate for one shaped burst: the burst length
    /// plus the warm-up padding that gets scrapped after filtering.
    pub fn total_chip_count(&self) -> usize {
        self.tx_burst_length_chip + self.warmup_chips().round() as usize
    }

    /// Warm-up region to scrap from the front of a shaped, upsampled burst,
    /// in samples at the given oversampling factor.
    pub fn scrap_samples(&self, novs: u16) -> usize {
        (self.warmup_chips() * novs as f64).round() as usize
    }

    /// Tag-side delay from PING reception to PONG transmission, in whole
    /// nanoseconds: `pong_delay + pong_delay_processing`.
    pub fn pong_delay_ns(&self) -> i64 {
        ((self.pong_delay + self.pong_delay_processing) * 1e9).round() as i64
    }

    /// `burst_period` expressed in nanoseconds.
    pub fn burst_period_ns(&self) -> i64 {
        (self.burst_period * 1e9).round() as i64
    }

    /// Checks every invariant the rest of the crate assumes; called once at
    /// startup before any radio I/O.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        let bad = |msg: &str| Err(OrchestratorError::ConfigInvalid(msg.to_string()));

        if !matches!(self.novs_tx, 2 | 4 | 8) {
            return bad("novs_tx must be one of 2, 4, 8");
        }
        if !matches!(self.novs_rx, 2 | 4 | 8) {
            return bad("novs_rx must be one of 2, 4, 8");
        }
        if self.d_tx == 0 {
            return bad("d_tx must be positive");
        }
        if self.d_rx == 0 {
            return bad("d_rx must be positive");
        }
        if self.f_clk <= 0.0 {
            return bad("f_clk must be positive");
        }
        // f_clk must be an exact multiple of each divider, or the derived
        // sample rate is not representable on the device's own clock grid.
        if (self.f_clk % self.d_tx as f64).abs() > 1e-3 {
            return bad("d_tx does not evenly divide f_clk");
        }
        if (self.f_clk % self.d_rx as f64).abs() > 1e-3 {
            return bad("d_rx does not evenly divide f_clk");
        }
        if self.burst_period <= 0.0 {
            return bad("burst_period must be positive");
        }
        if self.tx_burst_length_chip == 0 {
            return bad("tx_burst_length_chip must be positive");
        }
        if self.extra_samples_filter <= 0.0 {
            return bad("extra_samples_filter must be positive");
        }
        if self.threshold_factor == 0 {
            return bad("threshold_factor must be positive");
        }
        if self.num_of_ping_tries == 0 {
            return bad("num_of_ping_tries must be positive");
        }
        if self.timeout <= 0.0 {
            return bad("timeout must be positive");
        }
        if self.burst_period_samples() <= 0 {
            return bad("burst_period_samples must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_novs() {
        let mut cfg = Config::default();
        cfg.novs_tx = 3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sampling_rate_matches_f_clk_over_divider() {
        let cfg = Config::default();
        assert_eq!(cfg.sampling_rate_tx(), cfg.f_clk / cfg.d_tx as f64);
        assert_eq!(cfg.sampling_rate_rx(), cfg.f_clk / cfg.d_rx as f64);
    }

    #[test]
    fn rejects_divider_that_does_not_divide_f_clk() {
        let mut cfg = Config::default();
        cfg.d_tx = 17;
        assert!(cfg.validate().is_err());
    }
}
