//! Static evaluation: material and mobility.

use tempo_core::{
    Board, Color, PieceKind, Square, BISHOP_DIRECTIONS, KING_DELTAS, KNIGHT_DELTAS,
    ROOK_DIRECTIONS,
};

use crate::search::MAX_PLY;

/// Unreachable bound on any score.
pub const INFINITY: i32 = 200_000;
/// Base checkmate score; mate-distance scores count down from here by ply.
pub const CHECKMATE: i32 = 100_000;
/// Scores at or above this magnitude encode a forced mate.
pub const CHECKMATE_THRESHOLD: i32 = CHECKMATE - MAX_PLY as i32;
/// Score of a drawn position.
pub const DRAW: i32 = 0;

const PAWN_VALUE: i32 = 100;
const KNIGHT_VALUE: i32 = 325;
const BISHOP_VALUE: i32 = 325;
const ROOK_VALUE: i32 = 500;
const QUEEN_VALUE: i32 = 975;

const MOBILITY_WEIGHT: i32 = 5;

/// Evaluate the position in centipawns from the active side's perspective.
pub fn evaluate(board: &Board) -> i32 {
    let us = board.active_color();
    let them = !us;

    let material = material(board, us) - material(board, them);
    let mobility = mobility(board, us) - mobility(board, them);

    material + MOBILITY_WEIGHT * mobility
}

fn material(board: &Board, color: Color) -> i32 {
    board
        .pieces(color)
        .map(|(_, piece)| piece_value(piece.kind()))
        .sum()
}

fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => PAWN_VALUE,
        PieceKind::Knight => KNIGHT_VALUE,
        PieceKind::Bishop => BISHOP_VALUE,
        PieceKind::Rook => ROOK_VALUE,
        PieceKind::Queen => QUEEN_VALUE,
        PieceKind::King => 0,
    }
}

/// Count pseudo-mobility: squares each piece could step to, ignoring pins
/// and checks. Pawns are excluded; their worth is structural, not mobile.
fn mobility(board: &Board, color: Color) -> i32 {
    let mut count = 0;
    for (sq, piece) in board.pieces(color) {
        count += match piece.kind() {
            PieceKind::Pawn => 0,
            PieceKind::Knight => leaper_mobility(board, sq, color, &KNIGHT_DELTAS),
            PieceKind::Bishop => slider_mobility(board, sq, color, &BISHOP_DIRECTIONS),
            PieceKind::Rook => slider_mobility(board, sq, color, &ROOK_DIRECTIONS),
            PieceKind::Queen => {
                slider_mobility(board, sq, color, &BISHOP_DIRECTIONS)
                    + slider_mobility(board, sq, color, &ROOK_DIRECTIONS)
            }
            PieceKind::King => leaper_mobility(board, sq, color, &KING_DELTAS),
        };
    }
    count
}

fn leaper_mobility(board: &Board, origin: Square, color: Color, deltas: &[i32]) -> i32 {
    let mut count = 0;
    for &delta in deltas {
        if let Some(target) = Square::from_index(origin.index() as i32 + delta) {
            match board.piece_on(target) {
                Some(piece) if piece.color() == color => {}
                _ => count += 1,
            }
        }
    }
    count
}

fn slider_mobility(board: &Board, origin: Square, color: Color, dirs: &[i32]) -> i32 {
    let mut count = 0;
    for &dir in dirs {
        let mut index = origin.index() as i32 + dir;
        while let Some(target) = Square::from_index(index) {
            match board.piece_on(target) {
                None => count += 1,
                Some(piece) => {
                    if piece.color() != color {
                        count += 1;
                    }
                    break;
                }
            }
            index += dir;
        }
    }
    count
}
