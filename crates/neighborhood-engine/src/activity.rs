use tokio::sync::watch;
use tracing::debug;

use neighborhood_types::models::ActivityState;

/// Single flag tracking whether a provider round trip is outstanding.
///
/// It covers the round trip only; staggered reply delivery happens after the
/// flag is already back to `Idle`.
#[derive(Debug)]
pub struct ActivityIndicator {
    tx: watch::Sender<ActivityState>,
}

impl ActivityIndicator {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ActivityState::Idle);
        Self { tx }
    }

    /// `Idle -> AwaitingResponse`. Returns whether the state changed.
    pub fn start(&self) -> bool {
        self.transition(ActivityState::AwaitingResponse)
    }

    /// `AwaitingResponse -> Idle`. Returns whether the state changed.
    pub fn stop(&self) -> bool {
        self.transition(ActivityState::Idle)
    }

    pub fn state(&self) -> ActivityState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActivityState> {
        self.tx.subscribe()
    }

    fn transition(&self, next: ActivityState) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            debug!("activity -> {:?}", next);
        }
        changed
    }
}

impl Default for ActivityIndicator {
    fn default() -> Self {
        Self::new()
    }
}
