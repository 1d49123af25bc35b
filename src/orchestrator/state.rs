//! States of the two orchestrator state machines.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    /// Searching the whole trace for the first spaced pair of PING bursts.
    InitialSync,
    /// Synced; waiting for the next expected PING inside a guard window.
    SearchForPing,
    /// A PING was found; transmit the PONG reply at the scheduled delay.
    SendPong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconState {
    /// The TX task is actively scheduling and emitting PING bursts.
    TxEnabled,
    /// Waiting for the PONG reply to a just-sent PING.
    AwaitPong,
    /// Run has been asked to stop; tasks are being joined.
    Done,
}

impl BeaconState {
    fn to_tag(self) -> u8 {
        match self {
            BeaconState::TxEnabled => 0,
            BeaconState::AwaitPong => 1,
            BeaconState::Done => 2,
        }
    }

    fn from_tag(tag: u8) -> Self {
        match tag {
            0 => BeaconState::TxEnabled,
            1 => BeaconState::AwaitPong,
            _ => BeaconState::Done,
        }
    }
}

/// Shared, observable cell for the beacon's current state, set by whichever
/// of the TX/RX tasks last caused a transition. Unlike the tag's single-loop
/// `TagState` (a plain local variable), the beacon's two concurrent tasks
/// need a cross-thread cell to publish this to; the cheap atomic tag keeps
/// it lock-free, same as [`super::super::cancel::LastBurstNs`].
#[derive(Clone)]
pub struct SharedBeaconState {
    inner: Arc<AtomicU8>,
}

impl SharedBeaconState {
    pub fn new() -> Self {
        SharedBeaconState {
            inner: Arc::new(AtomicU8::new(BeaconState::TxEnabled.to_tag())),
        }
    }

    pub fn set(&self, state: BeaconState) {
        self.inner.store(state.to_tag(), Ordering::Release);
    }

    pub fn get(&self) -> BeaconState {
        BeaconState::from_tag(self.inner.load(Ordering::Acquire))
    }
}

impl Default for SharedBeaconState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_tx_enabled() {
        assert_eq!(SharedBeaconState::new().get(), BeaconState::TxEnabled);
    }

    #[test]
    fn set_then_get_round_trips_every_variant() {
        let shared = SharedBeaconState::new();
        for state in [BeaconState::TxEnabled, BeaconState::AwaitPong, BeaconState::Done] {
            shared.set(state);
            assert_eq!(shared.get(), state);
        }
    }

    #[test]
    fn clone_shares_state() {
        let shared = SharedBeaconState::new();
        let clone = shared.clone();
        clone.set(BeaconState::AwaitPong);
        assert_eq!(shared.get(), BeaconState::AwaitPong);
    }
}
