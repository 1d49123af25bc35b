//! Cooperative cancellation and the single-word "latest burst" publish cell
//! shared between the beacon's TX and RX/detect tasks.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

/// Wraps one shared stop flag. Cloning shares the same underlying flag, so
/// every task spawned from a `CancelToken` observes the same SIGINT.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Installs a SIGINT handler that sets this token's flag. Call once per
    /// process; a second call installs a second handler harmlessly.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let flag = self.flag.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-word publish cell for the beacon's last transmitted burst
/// timestamp. `i64::MIN` means "nothing published yet". Last-writer-wins;
/// the RX/detect task only ever wants the latest value, never a queue of
/// past ones.
#[derive(Clone)]
pub struct LastBurstNs {
    inner: Arc<AtomicI64>,
}

impl LastBurstNs {
    pub const UNSET: i64 = i64::MIN;

    pub fn new() -> Self {
        LastBurstNs {
            inner: Arc::new(AtomicI64::new(Self::UNSET)),
        }
    }

    pub fn publish(&self, burst_ns: i64) {
        self.inner.store(burst_ns, Ordering::Release);
    }

    pub fn latest(&self) -> Option<i64> {
        match self.inner.load(Ordering::Acquire) {
            v if v == Self::UNSET => None,
            v => Some(v),
        }
    }
}

impl Default for LastBurstNs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_reads_as_none() {
        let cell = LastBurstNs::new();
        assert_eq!(cell.latest(), None);
    }

    #[test]
    fn publish_then_read() {
        let cell = LastBurstNs::new();
        cell.publish(12345);
        assert_eq!(cell.latest(), Some(12345));
    }

    #[test]
    fn clone_shares_state() {
        let cell = LastBurstNs::new();
        let clone = cell.clone();
        clone.publish(99);
        assert_eq!(cell.latest(), Some(99));
    }

    #[test]
    fn cancel_token_clone_shares_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
