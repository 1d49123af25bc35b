//! Radio Adapter contract: the boundary between the protocol core and a
//! concrete SDR driver. This crate ships one implementation,
//! [`simulator::SimulatedRadio`]; driving real hardware means implementing
//! [`RadioDevice`] against a vendor SDK and is outside this crate's scope.

pub mod simulator;
pub mod status;

use num_complex::Complex32;

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::timebase;
use status::RadioStatus;

/// The contract every radio driver (real or simulated) must satisfy.
///
/// Modeled directly on the connect/configure/stream lifecycle of a
/// timed-streaming SDR API: a device is connected, configured once,
/// activated, then driven through repeated blocking `write`/`read` calls
/// bounded by a timeout, and finally closed. `write`/`read` return an
/// abstract [`RadioStatus`] rather than throwing, so the orchestrator's
/// loops can treat timeouts/overflows/underflows as ordinary control flow.
///
/// `connect`/`configure`/`start`/`close` run once, single-threaded, during
/// setup and teardown and so take `&mut self`. `write`/`read` are the hot
/// path the beacon's TX and RX/detect tasks call concurrently from two
/// threads against the same device handle; real timed-streaming SDR APIs
/// guarantee their TX and RX streams are independent and safe to drive from
/// separate threads, so this contract asks implementations for the same
/// guarantee by taking `&self` there and requires `Send + Sync` so the
/// orchestrator can share one handle behind an `Arc`.
pub trait RadioDevice: Send + Sync {
    /// Enumerates available devices, for `--list-devices`.
    fn list_devices(&self) -> Vec<String>;

    /// Opens the device at `device_index` (or the first available device if
    /// `None`).
    fn connect(&mut self, device_index: Option<usize>) -> Result<(), OrchestratorError>;

    /// Applies frequency/gain/sample-rate/antenna settings from `cfg`.
    fn configure(&mut self, cfg: &Config) -> Result<(), OrchestratorError>;

    /// Activates the TX and RX streams.
    fn start(&mut self) -> Result<(), OrchestratorError>;

    /// Transmits `samples` as one burst scheduled at device time `time_ns`
    /// (hardware-timed, end-of-burst framing). Blocks up to the configured
    /// timeout.
    fn write(&self, samples: &[Complex32], time_ns: i64) -> RadioStatus;

    /// Reads up to `buf.len()` samples into `buf`. Returns the status and,
    /// on success, the device-clock timestamp of the first sample read.
    fn read(&self, buf: &mut [Complex32]) -> (RadioStatus, i64);

    /// Current device hardware time, in nanoseconds.
    fn hardware_time_ns(&self) -> i64;

    /// Active RX sample rate, in Hz.
    fn sample_rate(&self) -> f64;

    /// Deactivates streams and releases the device.
    fn close(&mut self) -> Result<(), OrchestratorError>;

    /// Converts a sample index captured at `capture_ns` to an absolute
    /// device timestamp. Provided by C5; a driver may override this if its
    /// hardware exposes a more precise mapping.
    fn ix_to_ns(&self, ix: i64, capture_ns: i64) -> i64 {
        timebase::ix_to_ns_device(ix, capture_ns, self.sample_rate())
    }

    /// Expected sample index of the next PING inside a buffer captured at
    /// `capture_ns`, given the last known anchor. Provided by C5.
    fn expected_ping_pos_ix(&self, anchor_ns: i64, capture_ns: i64, burst_period_ns: i64) -> i64 {
        timebase::expected_ping_ix(anchor_ns, capture_ns, burst_period_ns, self.sample_rate())
    }

    /// Expected sample index of the PONG reply inside a buffer captured at
    /// `capture_ns`, given the absolute device time the PONG is due
    /// (`expected_pong_ns`). Provided by C5.
    fn expected_pong_pos_ix(
        &self,
        expected_pong_ns: i64,
        capture_ns: i64,
        burst_period_ns: i64,
        pong_pos_offset: i64,
    ) -> i64 {
        timebase::expected_pong_ix(
            expected_pong_ns,
            capture_ns,
            burst_period_ns,
            pong_pos_offset,
            self.sample_rate(),
        )
    }
}
