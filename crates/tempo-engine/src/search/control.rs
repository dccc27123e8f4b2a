//! Shared search signals: stop flag, timer state, and published progress.
//!
//! The stop flag and `timer_stopped` are monotone booleans (they only go
//! false to true within one search), so relaxed atomics are sufficient:
//! a missed observation costs at most one extra node visit before the
//! next poll point. The published depth, root-move count, and best root
//! score let the timer callback and `ponderhit` evaluate stop conditions
//! without touching worker-owned state.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::eval::{CHECKMATE, CHECKMATE_THRESHOLD, INFINITY};
use crate::search::timer::SearchTimer;
use crate::search::INITIAL_DEPTH;

pub(crate) struct SearchSignals {
    abort: AtomicBool,
    timer_stopped: AtomicBool,
    time_management: bool,
    current_depth: AtomicI32,
    root_move_count: AtomicUsize,
    best_root_value: AtomicI32,
    timer: Mutex<Option<SearchTimer>>,
}

impl SearchSignals {
    pub fn new(time_management: bool) -> SearchSignals {
        SearchSignals {
            abort: AtomicBool::new(false),
            timer_stopped: AtomicBool::new(false),
            time_management,
            current_depth: AtomicI32::new(INITIAL_DEPTH),
            root_move_count: AtomicUsize::new(0),
            best_root_value: AtomicI32::new(-INFINITY),
            timer: Mutex::new(None),
        }
    }

    /// Request termination. Never cleared within a search.
    pub fn set_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    pub fn timer_stopped(&self) -> bool {
        self.timer_stopped.load(Ordering::Relaxed)
    }

    pub fn publish_depth(&self, depth: i32) {
        self.current_depth.store(depth, Ordering::Relaxed);
    }

    pub fn current_depth(&self) -> i32 {
        self.current_depth.load(Ordering::Relaxed)
    }

    pub fn publish_root_move_count(&self, count: usize) {
        self.root_move_count.store(count, Ordering::Relaxed);
    }

    pub fn root_move_count(&self) -> usize {
        self.root_move_count.load(Ordering::Relaxed)
    }

    pub fn publish_best_root_value(&self, value: i32) {
        self.best_root_value.store(value, Ordering::Relaxed);
    }

    pub fn best_root_value(&self) -> i32 {
        self.best_root_value.load(Ordering::Relaxed)
    }

    /// Deadline expiry, called from the timer thread.
    ///
    /// Always records that the timer fired. The stop flag follows
    /// immediately, except under time management before the first
    /// iteration has completed: there the deepener's stop-condition check
    /// decides, which guarantees at least one full iteration and thus a
    /// legal best move.
    pub fn timer_fired(&self) {
        self.timer_stopped.store(true, Ordering::Relaxed);
        if !self.time_management || self.current_depth() > INITIAL_DEPTH {
            self.set_abort();
        }
    }

    /// Schedule the one-shot deadline. Replaces any previous timer.
    pub fn arm_timer(self: &Arc<Self>, budget: Duration) {
        let timer = SearchTimer::schedule(Arc::clone(self), budget);
        let previous = self
            .timer
            .lock()
            .expect("timer mutex poisoned")
            .replace(timer);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    /// Cancel and drop the deadline, if one is armed.
    pub fn disarm_timer(&self) {
        let timer = self.timer.lock().expect("timer mutex poisoned").take();
        if let Some(timer) = timer {
            timer.cancel();
        }
    }

    fn timer_armed(&self) -> bool {
        self.timer.lock().expect("timer mutex poisoned").is_some()
    }

    /// Time-management stop check, run between iterations and on
    /// `ponderhit`. Inactive unless a timer is armed and time management
    /// is on. Stops when the deadline has fired, when there is only one
    /// root move to choose from, or when the held score proves a mate
    /// within the already-searched depth.
    pub fn check_stop_conditions(&self) {
        if !self.timer_armed() || !self.time_management {
            return;
        }
        if self.timer_stopped() {
            self.set_abort();
            return;
        }
        if self.root_move_count() == 1 {
            self.set_abort();
            return;
        }
        let best = self.best_root_value().abs();
        if best >= CHECKMATE_THRESHOLD && self.current_depth() >= CHECKMATE - best {
            self.set_abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::SearchSignals;
    use crate::eval::CHECKMATE;
    use crate::search::INITIAL_DEPTH;

    #[test]
    fn abort_is_monotone() {
        let signals = SearchSignals::new(false);
        assert!(!signals.is_aborted());
        signals.set_abort();
        signals.set_abort();
        assert!(signals.is_aborted());
    }

    #[test]
    fn timer_fire_without_time_management_aborts_immediately() {
        let signals = SearchSignals::new(false);
        signals.timer_fired();
        assert!(signals.timer_stopped());
        assert!(signals.is_aborted());
    }

    #[test]
    fn timer_fire_before_first_iteration_waits_under_time_management() {
        let signals = SearchSignals::new(true);
        signals.publish_depth(INITIAL_DEPTH);
        signals.timer_fired();
        assert!(signals.timer_stopped());
        assert!(!signals.is_aborted(), "must allow the first iteration to finish");
    }

    #[test]
    fn timer_fire_after_first_iteration_aborts_under_time_management() {
        let signals = SearchSignals::new(true);
        signals.publish_depth(INITIAL_DEPTH + 1);
        signals.timer_fired();
        assert!(signals.is_aborted());
    }

    #[test]
    fn stop_check_requires_armed_timer() {
        let signals = Arc::new(SearchSignals::new(true));
        signals.publish_root_move_count(1);
        signals.check_stop_conditions();
        assert!(!signals.is_aborted(), "no timer armed, no stop");
    }

    #[test]
    fn stop_check_single_root_move() {
        let signals = Arc::new(SearchSignals::new(true));
        signals.arm_timer(Duration::from_secs(600));
        signals.publish_root_move_count(1);
        signals.check_stop_conditions();
        assert!(signals.is_aborted());
        signals.disarm_timer();
    }

    #[test]
    fn stop_check_proven_mate() {
        let signals = Arc::new(SearchSignals::new(true));
        signals.arm_timer(Duration::from_secs(600));
        signals.publish_root_move_count(20);
        // Mate in one: value CHECKMATE - 1, proven once depth >= 1
        signals.publish_best_root_value(CHECKMATE - 1);
        signals.publish_depth(2);
        signals.check_stop_conditions();
        assert!(signals.is_aborted());
        signals.disarm_timer();
    }

    #[test]
    fn stop_check_unproven_mate_keeps_searching() {
        let signals = Arc::new(SearchSignals::new(true));
        signals.arm_timer(Duration::from_secs(600));
        signals.publish_root_move_count(20);
        // Mate in three (distance 5) but only two plies searched
        signals.publish_best_root_value(CHECKMATE - 5);
        signals.publish_depth(2);
        signals.check_stop_conditions();
        assert!(!signals.is_aborted());
        signals.disarm_timer();
    }

    #[test]
    fn stop_check_without_time_management_is_inert() {
        let signals = Arc::new(SearchSignals::new(false));
        signals.arm_timer(Duration::from_secs(600));
        signals.publish_root_move_count(1);
        signals.check_stop_conditions();
        assert!(!signals.is_aborted());
        signals.disarm_timer();
    }
}
