//! Observable fetch state, published through a `tokio::sync::watch` channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use wxstrip_core::{FetchPhase, FetchStatus, SessionSnapshot};

/// What observers see: the lifecycle phase, the status banner and the last
/// completed snapshot.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    pub phase: FetchPhase,
    pub status: FetchStatus,
    pub snapshot: Option<Arc<SessionSnapshot>>,
}

impl FetchState {
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.phase == FetchPhase::Fetching
    }
}

/// Marks a fetch cycle as running for as long as it is alive.
///
/// Dropping it mid-cycle (the cycle future was cancelled) returns the state
/// to idle so the next cycle can start.
pub(crate) struct CycleGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a watch::Sender<FetchState>,
}

impl<'a> CycleGuard<'a> {
    /// `None` if another cycle holds the flag.
    pub(crate) fn acquire(
        in_flight: &'a AtomicBool,
        state: &'a watch::Sender<FetchState>,
    ) -> Option<Self> {
        in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { in_flight, state })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            if !state.is_fetching() {
                return false;
            }
            state.phase = FetchPhase::Idle;
            state.status = FetchStatus::ready();
            true
        });
        self.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_first_is_dropped() {
        let flag = AtomicBool::new(false);
        let (tx, _rx) = watch::channel(FetchState::default());

        let first = CycleGuard::acquire(&flag, &tx);
        assert!(first.is_some());
        assert!(CycleGuard::acquire(&flag, &tx).is_none());
        drop(first);
        assert!(CycleGuard::acquire(&flag, &tx).is_some());
    }

    #[test]
    fn dropping_mid_cycle_resets_to_idle() {
        let flag = AtomicBool::new(false);
        let (tx, rx) = watch::channel(FetchState::default());
        {
            let _guard = CycleGuard::acquire(&flag, &tx);
            tx.send_modify(|s| {
                s.phase = FetchPhase::Fetching;
                s.status = FetchStatus::fetching(2);
            });
        }
        let state = rx.borrow();
        assert_eq!(state.phase, FetchPhase::Idle);
        assert_eq!(state.status, FetchStatus::ready());
    }

    #[test]
    fn finished_cycle_keeps_terminal_phase() {
        let flag = AtomicBool::new(false);
        let (tx, rx) = watch::channel(FetchState::default());
        {
            let _guard = CycleGuard::acquire(&flag, &tx);
            tx.send_modify(|s| {
                s.phase = FetchPhase::Complete;
                s.status = FetchStatus::complete();
            });
        }
        assert_eq!(rx.borrow().phase, FetchPhase::Complete);
    }
}
