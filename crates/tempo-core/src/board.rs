//! The position: a single mutable board with reversible make/undo.
//!
//! Every `make_move` pushes the irreversible state (key, castling rights,
//! en-passant square, halfmove clock) onto an internal stack; `undo_move`
//! pops it and walks the pieces back. The pair are exact inverses,
//! including the Zobrist key.

use std::str::FromStr;

use crate::castle_rights::CastleRights;
use crate::chess_move::{Move, MoveKind};
use crate::color::Color;
use crate::error::FenError;
use crate::fen;
use crate::movegen::{BISHOP_DIRECTIONS, KING_DELTAS, KNIGHT_DELTAS, ROOK_DIRECTIONS};
use crate::piece::{Piece, PieceKind};
use crate::square::Square;
use crate::zobrist;

/// Irreversible state saved per ply for undo.
#[derive(Clone)]
struct State {
    key: u64,
    castling: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
}

/// A chess position.
#[derive(Clone)]
pub struct Board {
    squares: [Option<Piece>; Square::SPACE],
    king_square: [Square; 2],
    active_color: Color,
    castling: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    key: u64,
    history: Vec<State>,
}

impl Board {
    /// The standard starting position.
    pub fn starting_position() -> Board {
        fen::STARTING_FEN.parse().expect("starting FEN is valid")
    }

    pub(crate) fn from_parts(
        squares: [Option<Piece>; Square::SPACE],
        active_color: Color,
        castling: CastleRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Result<Board, FenError> {
        let mut kings: [Option<Square>; 2] = [None, None];
        for sq in Square::all() {
            if let Some(piece) = squares[sq.index()] {
                if piece.kind() == PieceKind::King {
                    let slot = &mut kings[piece.color().index()];
                    if slot.is_some() {
                        return Err(FenError::BadKingCount {
                            color: piece.color(),
                        });
                    }
                    *slot = Some(sq);
                }
            }
        }
        let king_square = match kings {
            [Some(white), Some(black)] => [white, black],
            [None, _] => return Err(FenError::BadKingCount { color: Color::White }),
            [_, None] => return Err(FenError::BadKingCount { color: Color::Black }),
        };

        let mut board = Board {
            squares,
            king_square,
            active_color,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            key: 0,
            history: Vec::new(),
        };
        board.key = zobrist::key_from_scratch(&board);
        Ok(board)
    }

    #[inline]
    pub fn active_color(&self) -> Color {
        self.active_color
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// The incremental Zobrist key of the current position.
    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_square[color.index()]
    }

    /// All pieces of one color with their squares, a1 through h8.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| {
            self.squares[sq.index()]
                .filter(|piece| piece.color() == color)
                .map(|piece| (sq, piece))
        })
    }

    /// True if the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.is_attacked(self.king_square(self.active_color), !self.active_color)
    }

    /// True if the current position already occurred in the reversible
    /// history (the plies covered by the halfmove clock).
    pub fn is_repetition(&self) -> bool {
        let lookback = (self.halfmove_clock as usize).min(self.history.len());
        self.history
            .iter()
            .rev()
            .take(lookback)
            .any(|state| state.key == self.key)
    }

    /// True if neither side can possibly deliver mate: bare kings, a lone
    /// minor piece, or bishops all confined to one square color.
    pub fn has_insufficient_material(&self) -> bool {
        let mut knights = 0u32;
        let mut light_bishops = 0u32;
        let mut dark_bishops = 0u32;
        for color in Color::ALL {
            for (sq, piece) in self.pieces(color) {
                match piece.kind() {
                    PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                    PieceKind::Knight => knights += 1,
                    PieceKind::Bishop => {
                        if (sq.file() + sq.rank()) % 2 == 0 {
                            dark_bishops += 1;
                        } else {
                            light_bishops += 1;
                        }
                    }
                    PieceKind::King => {}
                }
            }
        }
        if knights + light_bishops + dark_bishops <= 1 {
            return true;
        }
        knights == 0 && (light_bishops == 0 || dark_bishops == 0)
    }

    /// True if `sq` is attacked by any piece of `by`.
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        let target = sq.index() as i32;

        // A pawn of `by` attacks `sq` from one rank behind, adjacent file.
        for vector in [by.forward() - 1, by.forward() + 1] {
            if self.piece_matches(target - vector, by, |k| k == PieceKind::Pawn) {
                return true;
            }
        }

        for delta in KNIGHT_DELTAS {
            if self.piece_matches(target + delta, by, |k| k == PieceKind::Knight) {
                return true;
            }
        }

        for delta in KING_DELTAS {
            if self.piece_matches(target + delta, by, |k| k == PieceKind::King) {
                return true;
            }
        }

        for dir in ROOK_DIRECTIONS {
            if self.slider_hits(target, dir, by, PieceKind::Rook) {
                return true;
            }
        }
        for dir in BISHOP_DIRECTIONS {
            if self.slider_hits(target, dir, by, PieceKind::Bishop) {
                return true;
            }
        }

        false
    }

    fn piece_matches(&self, index: i32, by: Color, kind: impl Fn(PieceKind) -> bool) -> bool {
        if !Square::is_on_board(index) {
            return false;
        }
        match self.squares[index as usize] {
            Some(piece) => piece.color() == by && kind(piece.kind()),
            None => false,
        }
    }

    /// Walk one slider ray from `target`; true on the first occupied square
    /// if it holds a `by` piece of `kind` or a queen.
    fn slider_hits(&self, target: i32, dir: i32, by: Color, kind: PieceKind) -> bool {
        let mut index = target + dir;
        while Square::is_on_board(index) {
            if let Some(piece) = self.squares[index as usize] {
                return piece.color() == by
                    && (piece.kind() == kind || piece.kind() == PieceKind::Queen);
            }
            index += dir;
        }
        false
    }

    /// Apply `mv` to the position. Must be balanced by [`undo_move`](Self::undo_move).
    pub fn make_move(&mut self, mv: Move) {
        self.history.push(State {
            key: self.key,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
        });

        let us = self.active_color;
        let origin = mv.origin();
        let target = mv.target();

        if let Some(ep) = self.en_passant.take() {
            self.key ^= zobrist::EN_PASSANT_FILE[ep.file() as usize];
        }

        match mv.kind() {
            MoveKind::Normal => {
                if mv.captured().is_some() {
                    self.remove(target);
                }
                let piece = self.remove(origin);
                self.put(target, piece);
            }
            MoveKind::PawnDouble => {
                let piece = self.remove(origin);
                self.put(target, piece);
                let ep = Square::new(origin.file(), (origin.rank() + target.rank()) / 2);
                self.en_passant = Some(ep);
                self.key ^= zobrist::EN_PASSANT_FILE[ep.file() as usize];
            }
            MoveKind::EnPassant => {
                // The captured pawn stands beside the origin, behind the target.
                self.remove(Square::new(target.file(), origin.rank()));
                let pawn = self.remove(origin);
                self.put(target, pawn);
            }
            MoveKind::Castling => {
                let king = self.remove(origin);
                self.put(target, king);
                let (rook_from, rook_to) = rook_hop(target);
                let rook = self.remove(rook_from);
                self.put(rook_to, rook);
            }
            MoveKind::Promotion => {
                if mv.captured().is_some() {
                    self.remove(target);
                }
                self.remove(origin);
                let kind = mv.promotion().unwrap_or(PieceKind::Queen);
                self.put(target, Piece::new(us, kind));
            }
        }

        let new_castling = self
            .castling
            .clear(rights_touched(origin))
            .clear(rights_touched(target));
        if new_castling != self.castling {
            self.key ^= zobrist::CASTLING[self.castling.bits() as usize];
            self.key ^= zobrist::CASTLING[new_castling.bits() as usize];
            self.castling = new_castling;
        }

        if mv.piece().kind() == PieceKind::Pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.active_color = !us;
        self.key ^= zobrist::SIDE_TO_MOVE;
    }

    /// Reverse the most recent [`make_move`](Self::make_move), which must
    /// have been `mv`.
    pub fn undo_move(&mut self, mv: Move) {
        let Some(state) = self.history.pop() else {
            unreachable!("undo_move without a matching make_move");
        };

        let us = !self.active_color;
        let origin = mv.origin();
        let target = mv.target();

        if us == Color::Black {
            self.fullmove_number -= 1;
        }

        match mv.kind() {
            MoveKind::Normal => {
                let piece = self.remove(target);
                self.put(origin, piece);
                if let Some(captured) = mv.captured() {
                    self.put(target, captured);
                }
            }
            MoveKind::PawnDouble => {
                let piece = self.remove(target);
                self.put(origin, piece);
            }
            MoveKind::EnPassant => {
                let pawn = self.remove(target);
                self.put(origin, pawn);
                if let Some(captured) = mv.captured() {
                    self.put(Square::new(target.file(), origin.rank()), captured);
                }
            }
            MoveKind::Castling => {
                let (rook_from, rook_to) = rook_hop(target);
                let rook = self.remove(rook_to);
                self.put(rook_from, rook);
                let king = self.remove(target);
                self.put(origin, king);
            }
            MoveKind::Promotion => {
                self.remove(target);
                self.put(origin, mv.piece());
                if let Some(captured) = mv.captured() {
                    self.put(target, captured);
                }
            }
        }

        self.active_color = us;
        self.castling = state.castling;
        self.en_passant = state.en_passant;
        self.halfmove_clock = state.halfmove_clock;
        self.key = state.key;
    }

    /// Render the position as a FEN string.
    pub fn to_fen(&self) -> String {
        fen::format(self)
    }

    fn put(&mut self, sq: Square, piece: Piece) {
        self.squares[sq.index()] = Some(piece);
        self.key ^= zobrist::PIECE_SQUARE[piece.index()][sq.index()];
        if piece.kind() == PieceKind::King {
            self.king_square[piece.color().index()] = sq;
        }
    }

    fn remove(&mut self, sq: Square) -> Piece {
        let Some(piece) = self.squares[sq.index()].take() else {
            unreachable!("remove from empty square {sq}");
        };
        self.key ^= zobrist::PIECE_SQUARE[piece.index()][sq.index()];
        piece
    }
}

impl FromStr for Board {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Board, FenError> {
        fen::parse(s)
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Board({})", self.to_fen())
    }
}

/// Rook origin and destination for a castling move, keyed by the king's
/// destination square.
fn rook_hop(king_target: Square) -> (Square, Square) {
    match king_target {
        Square::G1 => (Square::H1, Square::F1),
        Square::C1 => (Square::A1, Square::D1),
        Square::G8 => (Square::H8, Square::F8),
        Square::C8 => (Square::A8, Square::D8),
        _ => unreachable!("castling king target {king_target}"),
    }
}

/// Castling rights invalidated when a move touches `sq`.
fn rights_touched(sq: Square) -> u8 {
    match sq {
        Square::A1 => CastleRights::WHITE_QUEENSIDE,
        Square::H1 => CastleRights::WHITE_KINGSIDE,
        Square::E1 => CastleRights::WHITE_KINGSIDE | CastleRights::WHITE_QUEENSIDE,
        Square::A8 => CastleRights::BLACK_QUEENSIDE,
        Square::H8 => CastleRights::BLACK_KINGSIDE,
        Square::E8 => CastleRights::BLACK_KINGSIDE | CastleRights::BLACK_QUEENSIDE,
        _ => 0,
    }
}
