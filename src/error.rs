use thiserror::Error;

use crate::radio::status::RadioStatus;

/// Errors that abort a beacon or tag run outright.
///
/// Everything else a run encounters (a timed-out read, a burst that never
/// correlated, a TX scheduled slightly in the past) is not fatal and is folded
/// back into the state machine via [`RetryOutcome`] instead of propagated here.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("radio driver reported a fatal condition: {0}")]
    DriverFatal(String),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
}

/// Outcome of one iteration of a radio-facing loop.
///
/// Distinguishes the handful of non-fatal conditions the orchestrator has to
/// react to without aborting the run, mirroring the stream-status codes a
/// loop polls on every read/write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The call succeeded.
    Ok,
    /// A recoverable I/O condition (timeout, overflow, underflow): log and retry.
    RecoverableIo,
    /// A TX was scheduled for a time that has already passed; re-anchor to the
    /// next future burst boundary and re-dispatch.
    SchedulingPast,
    /// No burst was found where one was expected; counts against the miss budget.
    DetectMiss,
}

impl RetryOutcome {
    /// Classifies a successful or recoverable radio status. Callers must
    /// have already handled fatal (non-recoverable, non-`Ok`) statuses
    /// themselves, since those abort the run rather than loop.
    pub fn from_radio_status(status: RadioStatus) -> RetryOutcome {
        debug_assert!(status == RadioStatus::Ok || status.is_recoverable());
        if status == RadioStatus::Ok {
            RetryOutcome::Ok
        } else {
            RetryOutcome::RecoverableIo
        }
    }
}
