//! FEN parsing and formatting.

use crate::board::Board;
use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::error::FenError;
use crate::piece::Piece;
use crate::square::Square;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a 6-field FEN string.
pub fn parse(s: &str) -> Result<Board, FenError> {
    let fields: Vec<&str> = s.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(FenError::WrongFieldCount {
            found: fields.len(),
        });
    }

    let squares = parse_placement(fields[0])?;

    let active_color = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => {
            return Err(FenError::InvalidColor {
                found: other.to_string(),
            })
        }
    };

    let castling = parse_castling(fields[2])?;

    let en_passant = match fields[3] {
        "-" => None,
        other => Some(Square::from_algebraic(other).ok_or_else(|| {
            FenError::InvalidEnPassant {
                found: other.to_string(),
            }
        })?),
    };

    let halfmove_clock =
        fields[4]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidMoveCounter {
                field: "halfmove clock",
                found: fields[4].to_string(),
            })?;
    let fullmove_number =
        fields[5]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidMoveCounter {
                field: "fullmove number",
                found: fields[5].to_string(),
            })?;

    Board::from_parts(
        squares,
        active_color,
        castling,
        en_passant,
        halfmove_clock,
        fullmove_number,
    )
}

fn parse_placement(placement: &str) -> Result<[Option<Piece>; Square::SPACE], FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() });
    }

    let mut squares = [None; Square::SPACE];
    for (row, rank_str) in ranks.iter().enumerate() {
        // FEN lists rank 8 first
        let rank = 7 - row as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as u8;
                if file > 8 {
                    return Err(FenError::BadRankLength {
                        rank: rank + 1,
                        length: file as usize,
                    });
                }
            } else {
                let piece =
                    Piece::from_fen_char(c).ok_or(FenError::InvalidPieceChar { character: c })?;
                if file >= 8 {
                    return Err(FenError::BadRankLength {
                        rank: rank + 1,
                        length: file as usize + 1,
                    });
                }
                squares[Square::new(file, rank).index()] = Some(piece);
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenError::BadRankLength {
                rank: rank + 1,
                length: file as usize,
            });
        }
    }
    Ok(squares)
}

fn parse_castling(field: &str) -> Result<CastleRights, FenError> {
    if field == "-" {
        return Ok(CastleRights::NONE);
    }
    let mut bits = 0u8;
    for c in field.chars() {
        bits |= match c {
            'K' => CastleRights::WHITE_KINGSIDE,
            'Q' => CastleRights::WHITE_QUEENSIDE,
            'k' => CastleRights::BLACK_KINGSIDE,
            'q' => CastleRights::BLACK_QUEENSIDE,
            _ => return Err(FenError::InvalidCastlingChar { character: c }),
        };
    }
    Ok(CastleRights::from_bits(bits))
}

/// Render a position as a FEN string.
pub fn format(board: &Board) -> String {
    use std::fmt::Write;

    let mut out = String::new();

    for rank in (0..8).rev() {
        let mut empty = 0;
        for file in 0..8 {
            match board.piece_on(Square::new(file, rank)) {
                Some(piece) => {
                    if empty > 0 {
                        let _ = write!(out, "{empty}");
                        empty = 0;
                    }
                    out.push(piece.fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            let _ = write!(out, "{empty}");
        }
        if rank > 0 {
            out.push('/');
        }
    }

    let en_passant = match board.en_passant() {
        Some(sq) => sq.to_string(),
        None => "-".to_string(),
    };

    let _ = write!(
        out,
        " {} {} {} {} {}",
        board.active_color(),
        board.castling(),
        en_passant,
        board.halfmove_clock(),
        board.fullmove_number()
    );

    out
}
