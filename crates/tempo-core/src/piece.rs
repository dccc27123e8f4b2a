//! Pieces and piece kinds.

use std::fmt;

use crate::color::Color;

/// The six kinds of chess piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    /// All kinds in index order.
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Index into per-kind tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Reconstruct a kind from its index. Indices above 5 are a caller bug.
    #[inline]
    pub(crate) const fn from_index_unchecked(index: u8) -> PieceKind {
        match index {
            0 => PieceKind::Pawn,
            1 => PieceKind::Knight,
            2 => PieceKind::Bishop,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            _ => PieceKind::King,
        }
    }

    /// Lowercase algebraic letter, as used in FEN for Black pieces.
    pub const fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// A colored piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Piece {
        Piece { color, kind }
    }

    #[inline]
    pub const fn color(self) -> Color {
        self.color
    }

    #[inline]
    pub const fn kind(self) -> PieceKind {
        self.kind
    }

    /// Dense index 0..12: White P,N,B,R,Q,K then Black P,N,B,R,Q,K.
    #[inline]
    pub const fn index(self) -> usize {
        self.color.index() * 6 + self.kind.index()
    }

    /// Inverse of [`index`](Self::index). Indices above 11 are a caller bug.
    #[inline]
    pub(crate) const fn from_index_unchecked(index: u8) -> Piece {
        let color = if index < 6 { Color::White } else { Color::Black };
        Piece::new(color, PieceKind::from_index_unchecked(index % 6))
    }

    /// FEN character: uppercase for White, lowercase for Black.
    pub const fn fen_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parse a FEN piece character.
    pub fn from_fen_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(Piece::new(color, kind))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::{Piece, PieceKind};
    use crate::color::Color;

    #[test]
    fn index_roundtrip() {
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                let piece = Piece::new(color, kind);
                assert_eq!(Piece::from_index_unchecked(piece.index() as u8), piece);
            }
        }
    }

    #[test]
    fn index_range() {
        assert_eq!(Piece::new(Color::White, PieceKind::Pawn).index(), 0);
        assert_eq!(Piece::new(Color::Black, PieceKind::King).index(), 11);
    }

    #[test]
    fn fen_chars() {
        assert_eq!(Piece::new(Color::White, PieceKind::King).fen_char(), 'K');
        assert_eq!(Piece::new(Color::Black, PieceKind::Knight).fen_char(), 'n');
        assert_eq!(
            Piece::from_fen_char('Q'),
            Some(Piece::new(Color::White, PieceKind::Queen))
        );
        assert_eq!(
            Piece::from_fen_char('p'),
            Some(Piece::new(Color::Black, PieceKind::Pawn))
        );
        assert_eq!(Piece::from_fen_char('x'), None);
    }
}
