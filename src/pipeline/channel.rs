//! Bounded record hand-off channel with a hot-swappable identity.
//!
//! Producers load a snapshot of the active sender, try-send, and release.
//! Reconfiguration installs a new sender first and then drops the old one,
//! so a racing producer sees either the new channel or a disconnect; both
//! are ordinary outcomes, never a panic.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::record::Record;

/// Why a non-blocking send did not enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SendFailure {
    /// Channel at capacity.
    Full,
    /// Receiver gone (processor exited or channel being swapped).
    Closed,
    /// No channel installed (logger stopped or not configured).
    Inactive,
}

/// Create a bounded record channel of the given capacity.
pub(crate) fn record_channel(capacity: usize) -> (Sender<Record>, Receiver<Record>) {
    bounded(capacity)
}

/// The swappable identity of the live record channel.
#[derive(Debug, Default)]
pub(crate) struct SwapChannel {
    active: ArcSwapOption<Sender<Record>>,
}

impl SwapChannel {
    pub fn new() -> Self {
        Self {
            active: ArcSwapOption::const_empty(),
        }
    }

    /// Install a new sender as the live identity. The previous sender (if
    /// any) is dropped once outstanding producer snapshots release it.
    pub fn install(&self, tx: Sender<Record>) {
        self.active.store(Some(Arc::new(tx)));
    }

    /// Remove the live identity. The processor drains whatever is buffered
    /// and then observes the disconnect.
    pub fn close(&self) {
        self.active.store(None);
    }

    /// Non-blocking send. Never blocks, never panics.
    pub fn try_send(&self, record: Record) -> Result<(), SendFailure> {
        let guard = self.active.load();
        match guard.as_ref() {
            None => Err(SendFailure::Inactive),
            Some(tx) => match tx.try_send(record) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => Err(SendFailure::Full),
                Err(TrySendError::Disconnected(_)) => Err(SendFailure::Closed),
            },
        }
    }
}
