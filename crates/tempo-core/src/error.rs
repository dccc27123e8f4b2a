//! Error types for FEN parsing and position validation.

use crate::color::Color;

/// Errors from parsing a FEN string into a [`Board`](crate::board::Board).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// The FEN string does not have exactly 6 space-separated fields.
    #[error("expected 6 FEN fields, found {found}")]
    WrongFieldCount {
        /// Number of fields found.
        found: usize,
    },
    /// The piece placement does not describe exactly 8 ranks.
    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount {
        /// Number of ranks found.
        found: usize,
    },
    /// A rank describes more or fewer than 8 squares.
    #[error("rank {rank} describes {length} squares, expected 8")]
    BadRankLength {
        /// Rank number 1..8 as written on the board.
        rank: u8,
        /// Number of squares described.
        length: usize,
    },
    /// An unrecognized character in the piece placement.
    #[error("invalid piece character: '{character}'")]
    InvalidPieceChar {
        /// The offending character.
        character: char,
    },
    /// The active color field is not "w" or "b".
    #[error("invalid active color: \"{found}\"")]
    InvalidColor {
        /// The offending field.
        found: String,
    },
    /// An unrecognized character in the castling rights field.
    #[error("invalid castling character: '{character}'")]
    InvalidCastlingChar {
        /// The offending character.
        character: char,
    },
    /// The en passant field is not "-" or a valid square.
    #[error("invalid en passant square: \"{found}\"")]
    InvalidEnPassant {
        /// The offending field.
        found: String,
    },
    /// A move counter is not a valid number.
    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter {
        /// Which counter ("halfmove clock" or "fullmove number").
        field: &'static str,
        /// The offending field.
        found: String,
    },
    /// A side does not have exactly one king.
    #[error("{color} must have exactly one king")]
    BadKingCount {
        /// The side with the wrong king count.
        color: Color,
    },
}
