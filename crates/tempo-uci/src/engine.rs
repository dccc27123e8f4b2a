//! Line-driven UCI engine loop.
//!
//! Commands arrive on stdin; search output leaves through a stdout sink
//! implementing the engine's [`Protocol`] trait. Searches run on their own
//! worker thread, so the loop stays responsive to `stop` and `ponderhit`.

use std::io::{self, BufRead};
use std::sync::Arc;

use tracing::{debug, info, warn};

use tempo_core::{find_uci_move, Board, Move};
use tempo_engine::{BestMoveReport, Clock, Protocol, Score, Search, SearchError, SearchInfo};

use crate::command::{parse_command, Command, GoParams};
use crate::error::UciError;

/// Renders search records as UCI `info` and `bestmove` lines.
struct StdoutSink;

impl Protocol for StdoutSink {
    fn send_info(&self, info: SearchInfo) {
        let mut line = format!(
            "info depth {} seldepth {} nodes {} time {} nps {}",
            info.depth, info.max_depth, info.nodes, info.time_ms, info.nps
        );
        match info.score {
            Some(Score::Centipawns(cp)) => line.push_str(&format!(" score cp {cp}")),
            Some(Score::Mate(moves)) => line.push_str(&format!(" score mate {moves}")),
            None => {}
        }
        if let (Some(mv), Some(number)) = (info.current_move, info.current_move_number) {
            line.push_str(&format!(" currmove {mv} currmovenumber {number}"));
        }
        if let Some(pv) = &info.pv {
            if !pv.is_empty() {
                line.push_str(" pv");
                for mv in pv {
                    line.push_str(&format!(" {mv}"));
                }
            }
        }
        println!("{line}");
    }

    fn send_best_move(&self, best_move: BestMoveReport) {
        match (best_move.best, best_move.ponder) {
            (Some(best), Some(ponder)) => println!("bestmove {best} ponder {ponder}"),
            (Some(best), None) => println!("bestmove {best}"),
            (None, _) => println!("bestmove 0000"),
        }
    }
}

/// The UCI engine: current position plus the active search, if any.
pub struct UciEngine {
    board: Board,
    sink: Arc<StdoutSink>,
    active: Option<Search>,
}

impl UciEngine {
    pub fn new() -> UciEngine {
        UciEngine {
            board: Board::starting_position(),
            sink: Arc::new(StdoutSink),
            active: None,
        }
    }

    /// Read commands from stdin until `quit` or end of input.
    pub fn run(mut self) -> Result<(), UciError> {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            debug!(cmd = %trimmed, "received UCI command");

            match parse_command(trimmed) {
                Ok(Command::Uci) => self.handle_uci(),
                Ok(Command::IsReady) => println!("readyok"),
                Ok(Command::UciNewGame) => self.handle_ucinewgame(),
                Ok(Command::Position(board)) => self.board = *board,
                Ok(Command::Go(params)) => self.handle_go(params),
                Ok(Command::PonderHit) => self.handle_ponderhit(),
                Ok(Command::Stop) => self.finish_search(),
                Ok(Command::Quit) => {
                    self.finish_search();
                    break;
                }
                Ok(Command::Unknown(_)) => {}
                Err(e) => warn!(error = %e, "UCI parse error"),
            }
        }

        info!("tempo shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name tempo");
        println!("id author the tempo authors");
        println!("option name Ponder type check default false");
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.finish_search();
        self.board = Board::starting_position();
    }

    fn handle_go(&mut self, params: GoParams) {
        // Searches are single-shot; a still-active one is stopped first.
        self.finish_search();

        match self.build_search(&params) {
            Ok(mut search) => {
                search.start();
                self.active = Some(search);
            }
            Err(e) => warn!(error = %e, "go rejected"),
        }
    }

    fn handle_ponderhit(&mut self) {
        match &self.active {
            Some(search) => search.ponderhit(),
            None => warn!("ponderhit received with no active search, ignoring"),
        }
    }

    /// Stop and discard the active search, if any. Its best move has
    /// already been (or is about to be) emitted by the worker.
    fn finish_search(&mut self) {
        if let Some(mut search) = self.active.take() {
            search.stop();
        }
    }

    /// Map `go` parameters onto exactly one search constructor, in
    /// priority order: ponder, clock, movetime, nodes, depth,
    /// searchmoves, infinite.
    fn build_search(&mut self, params: &GoParams) -> Result<Search, SearchError> {
        let sink = Arc::clone(&self.sink) as Arc<dyn Protocol>;
        let board = self.board.clone();

        if params.wtime.is_some() || params.btime.is_some() {
            let clock = Clock {
                white_time: params.wtime.unwrap_or(1),
                white_increment: params.winc.unwrap_or(0),
                black_time: params.btime.unwrap_or(1),
                black_increment: params.binc.unwrap_or(0),
                moves_to_go: params.movestogo.unwrap_or(0),
            };
            return if params.ponder {
                Search::new_ponder(sink, board, clock)
            } else {
                Search::new_clock(sink, board, clock)
            };
        }

        if let Some(movetime) = params.movetime {
            return Search::new_time(sink, board, movetime);
        }
        if let Some(nodes) = params.nodes {
            return Search::new_nodes(sink, board, nodes);
        }
        if let Some(depth) = params.depth {
            return Search::new_depth(sink, board, depth);
        }

        if !params.searchmoves.is_empty() {
            let mut parse_board = self.board.clone();
            let moves: Vec<Move> = params
                .searchmoves
                .iter()
                .filter_map(|uci| find_uci_move(&mut parse_board, uci))
                .collect();
            if moves.len() < params.searchmoves.len() {
                warn!("some searchmoves are not legal here and were dropped");
            }
            return Search::new_moves(sink, board, moves);
        }

        Search::new_infinite(sink, board)
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}
