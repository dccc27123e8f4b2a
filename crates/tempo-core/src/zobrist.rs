//! Zobrist hashing keys, generated at compile time.

use crate::board::Board;
use crate::color::Color;

/// Key per (piece, square). Indexed by `[Piece::index()][Square::index()]`;
/// the table spans the whole 0x88 address space so no index translation is
/// needed (off-board slots are simply never read).
pub(crate) static PIECE_SQUARE: [[u64; 128]; 12] = {
    let mut table = [[0u64; 128]; 12];
    let mut state = SEED;
    let mut piece = 0;
    while piece < 12 {
        let mut sq = 0;
        while sq < 128 {
            let (val, next) = xorshift64(state);
            table[piece][sq] = val;
            state = next;
            sq += 1;
        }
        piece += 1;
    }
    table
};

/// Key XORed in when Black is to move.
pub(crate) static SIDE_TO_MOVE: u64 = {
    let (val, _) = xorshift64(advance(SEED, 12 * 128));
    val
};

/// Key per castling-rights configuration, indexed by `CastleRights::bits()`.
pub(crate) static CASTLING: [u64; 16] = {
    let mut table = [0u64; 16];
    let mut state = advance(SEED, 12 * 128 + 1);
    let mut idx = 0;
    while idx < 16 {
        let (val, next) = xorshift64(state);
        table[idx] = val;
        state = next;
        idx += 1;
    }
    table
};

/// Key per en-passant file.
pub(crate) static EN_PASSANT_FILE: [u64; 8] = {
    let mut table = [0u64; 8];
    let mut state = advance(SEED, 12 * 128 + 1 + 16);
    let mut idx = 0;
    while idx < 8 {
        let (val, next) = xorshift64(state);
        table[idx] = val;
        state = next;
        idx += 1;
    }
    table
};

const SEED: u64 = 0x7465_6d70_6f21_2121; // "tempo!!!"

/// Xorshift64 step. Returns (value, next state).
const fn xorshift64(mut state: u64) -> (u64, u64) {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    (state, state)
}

/// Skip `n` keys from `state`.
const fn advance(mut state: u64, n: usize) -> u64 {
    let mut i = 0;
    while i < n {
        let (_, next) = xorshift64(state);
        state = next;
        i += 1;
    }
    state
}

/// Recompute the position key from scratch. The board maintains its key
/// incrementally; this is the reference the incremental updates must match.
pub(crate) fn key_from_scratch(board: &Board) -> u64 {
    let mut key = 0u64;

    for color in Color::ALL {
        for (sq, piece) in board.pieces(color) {
            key ^= PIECE_SQUARE[piece.index()][sq.index()];
        }
    }

    if board.active_color() == Color::Black {
        key ^= SIDE_TO_MOVE;
    }

    key ^= CASTLING[board.castling().bits() as usize];

    if let Some(ep) = board.en_passant() {
        key ^= EN_PASSANT_FILE[ep.file() as usize];
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn starting_position_key_matches_scratch() {
        let board = Board::starting_position();
        assert_ne!(board.key(), 0);
        assert_eq!(board.key(), key_from_scratch(&board));
    }

    #[test]
    fn different_positions_different_keys() {
        let starting = Board::starting_position();
        let sicilian: Board = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2"
            .parse()
            .unwrap();
        assert_ne!(starting.key(), sicilian.key());
    }

    #[test]
    fn incremental_key_tracks_scratch_through_play() {
        use crate::movegen::MoveGenerator;

        // Kiwipete reaches castling, en passant, captures, and promotions.
        let mut board: Board =
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
                .parse()
                .unwrap();

        // Walk the first legal move at each ply for a handful of plies,
        // checking the incremental key against a full recomputation.
        for _ in 0..6 {
            let is_check = board.is_check();
            let Some(mv) = MoveGenerator::new(&mut board, 1, 0, is_check).next() else {
                break;
            };
            board.make_move(mv);
            assert_eq!(
                board.key(),
                key_from_scratch(&board),
                "incremental key diverged after {mv}"
            );
        }
    }

    #[test]
    fn special_moves_keep_the_key_consistent() {
        use crate::movegen::find_uci_move;

        let cases: [(&str, &[&str]); 3] = [
            // Both sides castle
            ("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", &["e1g1", "e8c8"]),
            // Double push then en passant capture
            (
                "4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1",
                &["e2e4", "d4e3"],
            ),
            // Under-promotion with capture
            ("3r4/2P5/8/8/8/4k3/8/4K3 w - - 0 1", &["c7d8n"]),
        ];

        for (fen, moves) in cases {
            let mut board: Board = fen.parse().unwrap();
            for uci in moves {
                let mv = find_uci_move(&mut board, uci)
                    .unwrap_or_else(|| panic!("{uci} must be legal in {fen}"));
                board.make_move(mv);
                assert_eq!(
                    board.key(),
                    key_from_scratch(&board),
                    "incremental key diverged after {uci} from {fen}"
                );
            }
        }
    }

    #[test]
    fn piece_square_keys_are_unique() {
        let mut keys = Vec::new();
        for piece_keys in &PIECE_SQUARE {
            keys.extend_from_slice(piece_keys);
        }
        keys.push(SIDE_TO_MOVE);
        keys.extend_from_slice(&CASTLING);
        keys.extend_from_slice(&EN_PASSANT_FILE);

        let count = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), count, "Zobrist keys collide");
    }
}
