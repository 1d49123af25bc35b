//! Ranging orchestrator (C6): the beacon and tag state machines that drive
//! the radio, detector, and time-base coordinator to produce a round-trip
//! time measurement.

pub mod beacon;
pub mod state;
pub mod tag;

use std::fmt;

/// Final accounting for one run, logged as a summary line on exit.
///
/// The beacon populates `pings_sent`/`pongs_found`; the tag populates
/// `pings_found`/`pongs_sent`. Both share `ping_misses`/`resyncs`.
#[derive(Debug, Clone, Default)]
pub struct RangingSummary {
    pub pings_sent: u64,
    pub pings_found: u64,
    pub pongs_sent: u64,
    pub pongs_found: u64,
    pub ping_misses: u64,
    pub resyncs: u64,
    pub measured_rtt_ns: Option<i64>,
}

impl fmt::Display for RangingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pings_sent={} pings_found={} pongs_sent={} pongs_found={} ping_misses={} resyncs={} measured_rtt_ns={}",
            self.pings_sent,
            self.pings_found,
            self.pongs_sent,
            self.pongs_found,
            self.ping_misses,
            self.resyncs,
            self.measured_rtt_ns
                .map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string())
        )
    }
}
