//! Search construction and control.
//!
//! A [`Search`] is built by one of seven validating constructors, started
//! exactly once, optionally stopped or ponder-hit, and then terminal. The
//! worker thread runs the iterative deepener; the constructing thread gets
//! control back as soon as the root move list exists. The stop flag is
//! never cleared: a `Search` is single-shot by design.

pub(crate) mod control;
pub(crate) mod report;
pub(crate) mod timer;
pub mod variation;
mod worker;

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tempo_core::{Board, Color, Move};

use crate::protocol::Protocol;
use control::SearchSignals;
use worker::SearchWorker;

/// Recursion bound of the search, in plies.
pub const MAX_PLY: usize = 256;
/// Deepest configurable iterative-deepening depth.
pub const MAX_DEPTH: i32 = 64;

pub(crate) const INITIAL_DEPTH: i32 = 1;

/// Upper bound on how long [`Search::stop`] waits for the worker.
const JOIN_DEADLINE: Duration = Duration::from_secs(5);

/// Moves-to-go assumed when the clock does not say.
const DEFAULT_MOVES_TO_GO: u32 = 40;

/// Rejected search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Depth outside 1..=[`MAX_DEPTH`].
    #[error("search depth must be between 1 and 64, got {depth}")]
    InvalidDepth { depth: i32 },
    /// Node ceiling below 1.
    #[error("node limit must be at least 1")]
    InvalidNodes,
    /// Time budget below 1 ms.
    #[error("time budget must be at least 1 ms")]
    InvalidTime,
    /// A side's remaining clock time below 1 ms.
    #[error("remaining clock time must be at least 1 ms per side")]
    InvalidClock,
}

/// Remaining time and increments for both sides, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    pub white_time: u64,
    pub white_increment: u64,
    pub black_time: u64,
    pub black_increment: u64,
    /// Moves until the next time control; 0 when unknown.
    pub moves_to_go: u32,
}

/// Everything the worker needs, held until `start()` consumes it.
struct PendingWorker {
    board: Board,
    protocol: Arc<dyn Protocol>,
    search_depth: i32,
    search_nodes: u64,
    search_moves: Vec<Move>,
    arm_timer_at_start: bool,
}

/// A configured, single-shot search.
pub struct Search {
    signals: Arc<SearchSignals>,
    pending: Option<PendingWorker>,
    handle: Option<JoinHandle<()>>,
    done: Option<Receiver<()>>,
    budget: Option<Duration>,
}

impl Search {
    /// Search to a fixed depth.
    pub fn new_depth(
        protocol: Arc<dyn Protocol>,
        board: Board,
        depth: i32,
    ) -> Result<Search, SearchError> {
        if !(1..=MAX_DEPTH).contains(&depth) {
            return Err(SearchError::InvalidDepth { depth });
        }
        Ok(Search::build(
            protocol,
            board,
            depth,
            u64::MAX,
            Vec::new(),
            None,
            false,
            false,
        ))
    }

    /// Search until a node ceiling is reached.
    pub fn new_nodes(
        protocol: Arc<dyn Protocol>,
        board: Board,
        nodes: u64,
    ) -> Result<Search, SearchError> {
        if nodes < 1 {
            return Err(SearchError::InvalidNodes);
        }
        Ok(Search::build(
            protocol,
            board,
            MAX_DEPTH,
            nodes,
            Vec::new(),
            None,
            false,
            false,
        ))
    }

    /// Search for a fixed wall-clock budget in milliseconds.
    pub fn new_time(
        protocol: Arc<dyn Protocol>,
        board: Board,
        millis: u64,
    ) -> Result<Search, SearchError> {
        if millis < 1 {
            return Err(SearchError::InvalidTime);
        }
        Ok(Search::build(
            protocol,
            board,
            MAX_DEPTH,
            u64::MAX,
            Vec::new(),
            Some(Duration::from_millis(millis)),
            true,
            false,
        ))
    }

    /// Search only the given root moves, otherwise unbounded.
    pub fn new_moves(
        protocol: Arc<dyn Protocol>,
        board: Board,
        moves: Vec<Move>,
    ) -> Result<Search, SearchError> {
        Ok(Search::build(
            protocol,
            board,
            MAX_DEPTH,
            u64::MAX,
            moves,
            None,
            false,
            false,
        ))
    }

    /// Search until explicitly stopped.
    pub fn new_infinite(protocol: Arc<dyn Protocol>, board: Board) -> Result<Search, SearchError> {
        Ok(Search::build(
            protocol,
            board,
            MAX_DEPTH,
            u64::MAX,
            Vec::new(),
            None,
            false,
            false,
        ))
    }

    /// Search on the game clock: derives a budget for the active side and
    /// enables adaptive early termination.
    pub fn new_clock(
        protocol: Arc<dyn Protocol>,
        board: Board,
        clock: Clock,
    ) -> Result<Search, SearchError> {
        let budget = Search::clock_budget(&board, clock)?;
        Ok(Search::build(
            protocol,
            board,
            MAX_DEPTH,
            u64::MAX,
            Vec::new(),
            Some(budget),
            true,
            true,
        ))
    }

    /// Like [`new_clock`](Self::new_clock), but the deadline stays unarmed
    /// until [`ponderhit`](Self::ponderhit).
    pub fn new_ponder(
        protocol: Arc<dyn Protocol>,
        board: Board,
        clock: Clock,
    ) -> Result<Search, SearchError> {
        let budget = Search::clock_budget(&board, clock)?;
        Ok(Search::build(
            protocol,
            board,
            MAX_DEPTH,
            u64::MAX,
            Vec::new(),
            Some(budget),
            false,
            true,
        ))
    }

    /// Derive the time budget for the side to move.
    ///
    /// Spend at most 95% of the remaining clock, always keeping a one
    /// second buffer; spread that over the remaining moves, crediting the
    /// increments the next `moves_to_go - 1` moves will earn.
    fn clock_budget(board: &Board, clock: Clock) -> Result<Duration, SearchError> {
        if clock.white_time < 1 || clock.black_time < 1 {
            return Err(SearchError::InvalidClock);
        }

        let (time_left, increment) = match board.active_color() {
            Color::White => (clock.white_time, clock.white_increment),
            Color::Black => (clock.black_time, clock.black_increment),
        };

        let mut max_search = (time_left as f64 * 0.95) as i64 - 1_000;
        if max_search < 1 {
            // Nearly out of time; get a result as fast as possible.
            max_search = 1;
        }

        let moves_to_go = if clock.moves_to_go == 0 {
            DEFAULT_MOVES_TO_GO
        } else {
            clock.moves_to_go
        } as i64;

        let mut budget = (max_search + (moves_to_go - 1) * increment as i64) / moves_to_go;
        if budget > max_search {
            budget = max_search;
        }

        Ok(Duration::from_millis(budget as u64))
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        protocol: Arc<dyn Protocol>,
        board: Board,
        search_depth: i32,
        search_nodes: u64,
        search_moves: Vec<Move>,
        budget: Option<Duration>,
        arm_timer_at_start: bool,
        time_management: bool,
    ) -> Search {
        Search {
            signals: Arc::new(SearchSignals::new(time_management)),
            pending: Some(PendingWorker {
                board,
                protocol,
                search_depth,
                search_nodes,
                search_moves,
                arm_timer_at_start,
            }),
            handle: None,
            done: None,
            budget,
        }
    }

    /// Spawn the worker. Blocks only until the worker has populated the
    /// root move list, so any command issued afterwards cannot race root
    /// setup. A second call is a no-op.
    pub fn start(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let signals = Arc::clone(&self.signals);
        let initial_budget = if pending.arm_timer_at_start {
            self.budget
        } else {
            None
        };

        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            // Dropped when the worker exits; `stop()` keys off it.
            let _done = done_tx;
            SearchWorker::new(
                pending.board,
                pending.protocol,
                signals,
                pending.search_depth,
                pending.search_nodes,
                pending.search_moves,
                initial_budget,
            )
            .run(ready_tx);
        });

        self.handle = Some(handle);
        self.done = Some(done_rx);

        // A dropped sender (worker died early) also releases us.
        let _ = ready_rx.recv();
    }

    /// Set the stop flag and wait for the worker, bounded by the join
    /// deadline. Best-effort: on timeout the worker is detached and the
    /// call returns anyway.
    pub fn stop(&mut self) {
        self.signals.set_abort();

        if let Some(done) = self.done.take() {
            match done.recv_timeout(JOIN_DEADLINE) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if let Some(handle) = self.handle.take() {
                        let _ = handle.join();
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.handle = None;
                }
            }
        }
    }

    /// The predicted opponent move arrived: arm the deadline with the
    /// configured budget and, if a full iteration has already completed,
    /// evaluate the stop conditions right away (the held result may
    /// already be decisive).
    pub fn ponderhit(&self) {
        let running = self
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        if !running {
            return;
        }

        if let Some(budget) = self.budget {
            self.signals.arm_timer(budget);
        }

        if self.signals.current_depth() > INITIAL_DEPTH {
            self.signals.check_stop_conditions();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Clock, Search, SearchError, MAX_DEPTH};
    use crate::protocol::{BestMoveReport, Protocol, SearchInfo};
    use std::sync::Arc;
    use tempo_core::Board;

    struct NullProtocol;

    impl Protocol for NullProtocol {
        fn send_info(&self, _info: SearchInfo) {}
        fn send_best_move(&self, _best_move: BestMoveReport) {}
    }

    fn sink() -> Arc<NullProtocol> {
        Arc::new(NullProtocol)
    }

    #[test]
    fn depth_bounds_are_validated() {
        let board = Board::starting_position();
        assert!(matches!(
            Search::new_depth(sink(), board.clone(), 0),
            Err(SearchError::InvalidDepth { depth: 0 })
        ));
        assert!(matches!(
            Search::new_depth(sink(), board.clone(), MAX_DEPTH + 1),
            Err(SearchError::InvalidDepth { .. })
        ));
        assert!(Search::new_depth(sink(), board, 1).is_ok());
    }

    #[test]
    fn nodes_and_time_are_validated() {
        let board = Board::starting_position();
        assert!(matches!(
            Search::new_nodes(sink(), board.clone(), 0),
            Err(SearchError::InvalidNodes)
        ));
        assert!(matches!(
            Search::new_time(sink(), board.clone(), 0),
            Err(SearchError::InvalidTime)
        ));
        assert!(Search::new_nodes(sink(), board.clone(), 1).is_ok());
        assert!(Search::new_time(sink(), board, 1).is_ok());
    }

    #[test]
    fn clock_requires_time_on_both_sides() {
        let board = Board::starting_position();
        let clock = Clock {
            white_time: 0,
            white_increment: 0,
            black_time: 60_000,
            black_increment: 0,
            moves_to_go: 0,
        };
        assert!(matches!(
            Search::new_clock(sink(), board, clock),
            Err(SearchError::InvalidClock)
        ));
    }

    #[test]
    fn clock_budget_formula() {
        // 300s, no increment, 40 moves to go:
        // max_search = 300000 * 0.95 - 1000 = 284000; budget = 284000 / 40 = 7100
        let board = Board::starting_position();
        let clock = Clock {
            white_time: 300_000,
            white_increment: 0,
            black_time: 300_000,
            black_increment: 0,
            moves_to_go: 40,
        };
        assert_eq!(
            Search::clock_budget(&board, clock).unwrap(),
            Duration::from_millis(7_100)
        );
    }

    #[test]
    fn clock_budget_clamps_to_max_search() {
        // Huge increments cannot push the budget past the 95% cap.
        let board = Board::starting_position();
        let clock = Clock {
            white_time: 10_000,
            white_increment: 60_000,
            black_time: 10_000,
            black_increment: 60_000,
            moves_to_go: 2,
        };
        // max_search = 9500 - 1000 = 8500; raw = (8500 + 60000) / 2 > 8500
        assert_eq!(
            Search::clock_budget(&board, clock).unwrap(),
            Duration::from_millis(8_500)
        );
    }

    #[test]
    fn clock_budget_floors_at_one_ms() {
        // 1s left: max_search = 950 - 1000 < 1, so search one millisecond.
        let board = Board::starting_position();
        let clock = Clock {
            white_time: 1_000,
            white_increment: 0,
            black_time: 1_000,
            black_increment: 0,
            moves_to_go: 1,
        };
        assert_eq!(
            Search::clock_budget(&board, clock).unwrap(),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn clock_budget_uses_the_active_side() {
        let board: Board = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1"
            .parse()
            .unwrap();
        let clock = Clock {
            white_time: 300_000,
            white_increment: 0,
            black_time: 60_000,
            black_increment: 0,
            moves_to_go: 10,
        };
        // Black to move: max_search = 57000 - 1000 = 56000; budget = 5600
        assert_eq!(
            Search::clock_budget(&board, clock).unwrap(),
            Duration::from_millis(5_600)
        );
    }
}
