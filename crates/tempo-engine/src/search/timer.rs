//! One-shot search deadline.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::search::control::SearchSignals;

/// A one-shot deadline on its own thread.
///
/// The thread parks on a condvar until the budget elapses, then reports
/// expiry through the shared signals. Cancelling wakes the thread early
/// and joins it; after expiry the fire cannot be taken back (the flags
/// are monotone).
pub(crate) struct SearchTimer {
    cancelled: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl SearchTimer {
    pub fn schedule(signals: Arc<SearchSignals>, budget: Duration) -> SearchTimer {
        let cancelled = Arc::new((Mutex::new(false), Condvar::new()));
        let shared = Arc::clone(&cancelled);
        let handle = thread::spawn(move || {
            let (lock, condvar) = &*shared;
            let guard = lock.lock().expect("timer mutex poisoned");
            let (guard, result) = condvar
                .wait_timeout_while(guard, budget, |cancelled| !*cancelled)
                .expect("timer mutex poisoned");
            if result.timed_out() && !*guard {
                drop(guard);
                signals.timer_fired();
            }
        });
        SearchTimer {
            cancelled,
            handle: Some(handle),
        }
    }

    /// Disarm the deadline. A no-op if it already fired.
    pub fn cancel(mut self) {
        {
            let (lock, condvar) = &*self.cancelled;
            *lock.lock().expect("timer mutex poisoned") = true;
            condvar.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::SearchTimer;
    use crate::search::control::SearchSignals;

    #[test]
    fn fires_after_the_budget() {
        let signals = Arc::new(SearchSignals::new(false));
        let timer = SearchTimer::schedule(Arc::clone(&signals), Duration::from_millis(10));
        thread::sleep(Duration::from_millis(100));
        assert!(signals.timer_stopped());
        assert!(signals.is_aborted());
        timer.cancel();
    }

    #[test]
    fn cancel_before_expiry_prevents_the_fire() {
        let signals = Arc::new(SearchSignals::new(false));
        let timer = SearchTimer::schedule(Arc::clone(&signals), Duration::from_secs(600));
        timer.cancel();
        assert!(!signals.timer_stopped());
        assert!(!signals.is_aborted());
    }
}
