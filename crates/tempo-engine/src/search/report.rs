//! Rate-limited progress reporting to the protocol sink.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempo_core::Move;

use crate::eval::{CHECKMATE, CHECKMATE_THRESHOLD};
use crate::protocol::{BestMoveReport, Protocol, Score, SearchInfo};
use crate::search::variation::RootEntry;

/// Minimum gap between unforced status records.
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// A snapshot of the worker's counters, taken at emission time.
pub(crate) struct Progress {
    pub depth: i32,
    pub max_depth: i32,
    pub nodes: u64,
    pub current_move: Move,
    pub current_move_number: usize,
}

pub(crate) struct ProgressReporter {
    protocol: Arc<dyn Protocol>,
    start: Instant,
    last_emission: Instant,
}

impl ProgressReporter {
    pub fn new(protocol: Arc<dyn Protocol>) -> ProgressReporter {
        let now = Instant::now();
        ProgressReporter {
            protocol,
            start: now,
            last_emission: now,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Status record. Unforced emissions are dropped until a second has
    /// passed since the previous record; forced ones always go out.
    pub fn status(&mut self, force: bool, progress: &Progress) {
        if !force && self.last_emission.elapsed() < STATUS_INTERVAL {
            return;
        }
        let elapsed_ms = self.elapsed_ms();
        let (current_move, current_move_number) = if progress.current_move.is_none() {
            (None, None)
        } else {
            (
                Some(progress.current_move),
                Some(progress.current_move_number),
            )
        };
        self.protocol.send_info(SearchInfo {
            depth: progress.depth,
            max_depth: progress.max_depth,
            nodes: progress.nodes,
            time_ms: elapsed_ms,
            nps: nps(progress.nodes, elapsed_ms),
            current_move,
            current_move_number,
            pv: None,
            score: None,
        });
        self.last_emission = Instant::now();
    }

    /// New best line at the root: always emitted, with PV and score.
    pub fn best_line(&mut self, progress: &Progress, entry: &RootEntry) {
        let elapsed_ms = self.elapsed_ms();
        self.protocol.send_info(SearchInfo {
            depth: progress.depth,
            max_depth: progress.max_depth,
            nodes: progress.nodes,
            time_ms: elapsed_ms,
            nps: nps(progress.nodes, elapsed_ms),
            current_move: None,
            current_move_number: None,
            pv: Some(entry.pv.as_slice().to_vec()),
            score: Some(score_of(entry.value)),
        });
        self.last_emission = Instant::now();
    }

    /// The final verdict.
    pub fn best_move(&self, best: Option<Move>, ponder: Option<Move>) {
        self.protocol.send_best_move(BestMoveReport { best, ponder });
    }
}

/// Nodes per second. Reported as 0 until a full second has elapsed, when
/// the rate becomes meaningful.
fn nps(nodes: u64, elapsed_ms: u64) -> u64 {
    if elapsed_ms >= 1000 {
        nodes * 1000 / elapsed_ms
    } else {
        0
    }
}

/// Mate-distance rendering: scores within the mate window become
/// moves-until-mate with the mating side's sign; everything else is
/// centipawns.
pub(crate) fn score_of(value: i32) -> Score {
    if value.abs() >= CHECKMATE_THRESHOLD {
        let distance = CHECKMATE - value.abs();
        Score::Mate(value.signum() * (distance + 1) / 2)
    } else {
        Score::Centipawns(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{nps, score_of};
    use crate::eval::CHECKMATE;
    use crate::protocol::Score;

    #[test]
    fn mate_in_one_each_side() {
        assert_eq!(score_of(CHECKMATE - 1), Score::Mate(1));
        assert_eq!(score_of(-(CHECKMATE - 2)), Score::Mate(-1));
    }

    #[test]
    fn longer_mates_round_up_to_full_moves() {
        assert_eq!(score_of(CHECKMATE - 3), Score::Mate(2));
        assert_eq!(score_of(CHECKMATE - 5), Score::Mate(3));
        assert_eq!(score_of(-(CHECKMATE - 4)), Score::Mate(-2));
    }

    #[test]
    fn ordinary_scores_stay_centipawns() {
        assert_eq!(score_of(37), Score::Centipawns(37));
        assert_eq!(score_of(-512), Score::Centipawns(-512));
    }

    #[test]
    fn nps_is_zero_for_subsecond_searches() {
        assert_eq!(nps(50_000, 999), 0);
        assert_eq!(nps(50_000, 1000), 50_000);
        assert_eq!(nps(50_000, 2000), 25_000);
    }
}
