//! The search worker: root setup, iterative deepening, alpha-beta, and
//! quiescence.
//!
//! The worker owns the board for the whole search. Every `make_move` is
//! balanced by an `undo_move` on every exit path, so cooperative
//! cancellation can never leave the position corrupted.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use tempo_core::{Board, Move, MoveGenerator};

use crate::eval::{evaluate, CHECKMATE, DRAW, INFINITY};
use crate::protocol::Protocol;
use crate::search::control::SearchSignals;
use crate::search::report::{Progress, ProgressReporter};
use crate::search::variation::{MoveVariation, RootMoveList};
use crate::search::{INITIAL_DEPTH, MAX_PLY};

pub(crate) struct SearchWorker {
    board: Board,
    signals: Arc<SearchSignals>,
    reporter: ProgressReporter,
    search_depth: i32,
    search_nodes: u64,
    search_moves: Vec<Move>,
    initial_budget: Option<Duration>,
    root_moves: RootMoveList,
    pv: Vec<MoveVariation>,
    total_nodes: u64,
    current_depth: i32,
    current_max_depth: i32,
    current_move: Move,
    current_move_number: usize,
}

impl SearchWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        board: Board,
        protocol: Arc<dyn Protocol>,
        signals: Arc<SearchSignals>,
        search_depth: i32,
        search_nodes: u64,
        search_moves: Vec<Move>,
        initial_budget: Option<Duration>,
    ) -> SearchWorker {
        SearchWorker {
            board,
            signals,
            reporter: ProgressReporter::new(protocol),
            search_depth,
            search_nodes,
            search_moves,
            initial_budget,
            root_moves: RootMoveList::new(),
            pv: vec![MoveVariation::new(); MAX_PLY + 1],
            total_nodes: 0,
            current_depth: INITIAL_DEPTH,
            current_max_depth: 0,
            current_move: Move::NONE,
            current_move_number: 0,
        }
    }

    /// Run the search to completion. `ready` is released once the root
    /// move list is populated, so the controller can hand out control
    /// commands without racing root setup.
    pub fn run(mut self, ready: Sender<()>) {
        if let Some(budget) = self.initial_budget {
            self.signals.arm_timer(budget);
        }

        let is_check = self.board.is_check();
        for mv in MoveGenerator::new(&mut self.board, 1, 0, is_check) {
            self.root_moves.push(mv);
        }
        self.signals.publish_root_move_count(self.root_moves.len());

        let _ = ready.send(());

        for depth in INITIAL_DEPTH..=self.search_depth {
            self.current_depth = depth;
            self.current_max_depth = 0;
            self.signals.publish_depth(depth);
            let progress = self.progress();
            self.reporter.status(false, &progress);

            self.search_root(depth, -INFINITY, INFINITY);

            // Best move first for the next iteration (and for the verdict).
            self.root_moves.sort();
            if let Some(first) = self.root_moves.first() {
                self.signals.publish_best_root_value(first.value);
            }

            self.signals.check_stop_conditions();

            if self.signals.is_aborted() {
                break;
            }
        }

        self.signals.disarm_timer();

        let progress = self.progress();
        self.reporter.status(true, &progress);

        let (best, ponder) = match self.root_moves.first() {
            Some(entry) => (Some(entry.mv), entry.pv.get(1)),
            None => (None, None),
        };
        self.reporter.best_move(best, ponder);
    }

    fn progress(&self) -> Progress {
        Progress {
            depth: self.current_depth,
            max_depth: self.current_max_depth,
            nodes: self.total_nodes,
            current_move: self.current_move,
            current_move_number: self.current_move_number,
        }
    }

    /// Per-node bookkeeping: node count, selective depth, the node
    /// ceiling, the PV slot for this ply, and a rate-limited status.
    fn update_search(&mut self, ply: i32) {
        self.total_nodes += 1;
        if ply > self.current_max_depth {
            self.current_max_depth = ply;
        }
        if self.search_nodes <= self.total_nodes {
            self.signals.set_abort();
        }
        self.pv[ply as usize].clear();
        let progress = self.progress();
        self.reporter.status(false, &progress);
    }

    /// Root search: score every allowed root move. Fail-soft negamax with
    /// alpha advancement only; no beta cut, because every root move needs
    /// a score for the sort.
    fn search_root(&mut self, depth: i32, mut alpha: i32, beta: i32) {
        self.update_search(0);
        if self.signals.is_aborted() {
            return;
        }

        // Unsearched and cut entries must sort below any scored entry.
        self.root_moves.reset_values();

        for i in 0..self.root_moves.len() {
            let mv = self.root_moves.entry(i).mv;

            if !self.search_moves.is_empty() && !self.search_moves.contains(&mv) {
                continue;
            }

            self.current_move = mv;
            self.current_move_number = i + 1;
            let progress = self.progress();
            self.reporter.status(false, &progress);

            self.board.make_move(mv);
            let value = -self.search(depth - 1, -beta, -alpha, 1);
            self.board.undo_move(mv);

            if self.signals.is_aborted() {
                // Entries updated so far stay; the later sort keeps the
                // best-so-far at index 0.
                return;
            }

            if value > alpha {
                alpha = value;
                {
                    let child = &self.pv[1];
                    let entry = self.root_moves.entry_mut(i);
                    entry.value = value;
                    entry.pv.assign(mv, child);
                }
                let progress = self.progress();
                self.reporter.best_line(&progress, self.root_moves.entry(i));
            }
        }

        if self.root_moves.is_empty() {
            // Mate or stalemate at the root; nothing to search.
            self.signals.set_abort();
        }
    }

    /// Interior alpha-beta, negamax convention, fail-soft: the returned
    /// value may exceed beta on a cut.
    fn search(&mut self, depth: i32, mut alpha: i32, beta: i32, ply: i32) -> i32 {
        if depth <= 0 {
            return self.quiescent(0, alpha, beta, ply);
        }

        self.update_search(ply);

        if self.signals.is_aborted() || ply == MAX_PLY as i32 {
            return evaluate(&self.board);
        }

        if self.board.has_insufficient_material()
            || self.board.is_repetition()
            || self.board.halfmove_clock() >= 100
        {
            return DRAW;
        }

        let mut best_value = -INFINITY;
        let mut searched_moves = 0;
        let is_check = self.board.is_check();

        for mv in MoveGenerator::new(&mut self.board, depth, ply, is_check) {
            searched_moves += 1;

            self.board.make_move(mv);
            let value = -self.search(depth - 1, -beta, -alpha, ply + 1);
            self.board.undo_move(mv);

            if self.signals.is_aborted() {
                return best_value;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    alpha = value;
                    self.save_pv(mv, ply);
                    if value >= beta {
                        break;
                    }
                }
            }
        }

        if searched_moves == 0 {
            // Shorter mates carry larger magnitudes.
            return if is_check { -CHECKMATE + ply } else { DRAW };
        }

        best_value
    }

    /// Quiescence: resolve tactical noise at the horizon. Outside check
    /// the static evaluation is a floor (stand pat); the generator limits
    /// moves to captures and promotions, or all evasions in check.
    fn quiescent(&mut self, depth: i32, mut alpha: i32, beta: i32, ply: i32) -> i32 {
        self.update_search(ply);

        if self.signals.is_aborted() || ply == MAX_PLY as i32 {
            return evaluate(&self.board);
        }

        if self.board.has_insufficient_material()
            || self.board.is_repetition()
            || self.board.halfmove_clock() >= 100
        {
            return DRAW;
        }

        let mut best_value = -INFINITY;
        let mut searched_moves = 0;
        let is_check = self.board.is_check();

        if !is_check {
            best_value = evaluate(&self.board);
            if best_value > alpha {
                alpha = best_value;
                if best_value >= beta {
                    return best_value;
                }
            }
        }

        for mv in MoveGenerator::new(&mut self.board, depth, ply, is_check) {
            searched_moves += 1;

            self.board.make_move(mv);
            let value = -self.quiescent(depth - 1, -beta, -alpha, ply + 1);
            self.board.undo_move(mv);

            if self.signals.is_aborted() {
                return best_value;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    alpha = value;
                    self.save_pv(mv, ply);
                    if value >= beta {
                        break;
                    }
                }
            }
        }

        if searched_moves == 0 && is_check {
            return -CHECKMATE + ply;
        }

        best_value
    }

    /// Record `mv` followed by the child's line as this ply's best line.
    fn save_pv(&mut self, mv: Move, ply: i32) {
        let ply = ply as usize;
        let (head, tail) = self.pv.split_at_mut(ply + 1);
        head[ply].assign(mv, &tail[0]);
    }
}
