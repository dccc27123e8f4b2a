//! UCI command parsing.

use tempo_core::{find_uci_move, Board};

use crate::error::UciError;

/// Parameters of the `go` command. All durations are milliseconds.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<u64>,
    /// Black's remaining time.
    pub btime: Option<u64>,
    /// White's increment per move.
    pub winc: Option<u64>,
    /// Black's increment per move.
    pub binc: Option<u64>,
    /// Moves until the next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<i32>,
    /// Search this many nodes only.
    pub nodes: Option<u64>,
    /// Search for exactly this long.
    pub movetime: Option<u64>,
    /// Restrict the root to these moves (UCI strings, resolved later
    /// against the current position).
    pub searchmoves: Vec<String>,
    /// Search until `stop`.
    pub infinite: bool,
    /// Search in pondering mode.
    pub ponder: bool,
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset for a new game.
    UciNewGame,
    /// `position` -- set the board, with optional moves applied.
    Position(Box<Board>),
    /// `go` -- start a search.
    Go(GoParams),
    /// `ponderhit` -- the predicted move was played.
    PonderHit,
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit.
    Quit,
    /// Anything unrecognized (ignored per UCI convention).
    Unknown(String),
}

/// Parse one line of UCI input.
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Command::Unknown(String::new()));
    }

    match tokens[0] {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "ponderhit" => Ok(Command::PonderHit),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        _ => Ok(Command::Unknown(tokens[0].to_string())),
    }
}

/// Parse `position startpos|fen <fen> [moves ...]`.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (mut board, rest) = if tokens[0] == "startpos" {
        (Board::starting_position(), &tokens[1..])
    } else if tokens[0] == "fen" {
        if tokens.len() < 7 {
            return Err(UciError::MalformedPosition);
        }
        let fen = tokens[1..7].join(" ");
        let board: Board = fen.parse().map_err(|source| UciError::InvalidFen {
            fen: fen.clone(),
            source,
        })?;
        (board, &tokens[7..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    if let Some((&"moves", move_tokens)) = rest.split_first() {
        for uci in move_tokens {
            let mv = find_uci_move(&mut board, uci).ok_or_else(|| UciError::InvalidMove {
                uci_move: uci.to_string(),
            })?;
            board.make_move(mv);
        }
    }

    Ok(Command::Position(Box::new(board)))
}

/// Parse the `go` arguments. Unknown tokens are skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    const KEYWORDS: [&str; 11] = [
        "wtime",
        "btime",
        "winc",
        "binc",
        "movestogo",
        "depth",
        "nodes",
        "movetime",
        "searchmoves",
        "infinite",
        "ponder",
    ];

    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "wtime" => {
                params.wtime = Some(parse_value(tokens.get(i + 1), "wtime")?);
                i += 2;
            }
            "btime" => {
                params.btime = Some(parse_value(tokens.get(i + 1), "btime")?);
                i += 2;
            }
            "winc" => {
                params.winc = Some(parse_value(tokens.get(i + 1), "winc")?);
                i += 2;
            }
            "binc" => {
                params.binc = Some(parse_value(tokens.get(i + 1), "binc")?);
                i += 2;
            }
            "movestogo" => {
                params.movestogo = Some(parse_value(tokens.get(i + 1), "movestogo")?);
                i += 2;
            }
            "depth" => {
                params.depth = Some(parse_value(tokens.get(i + 1), "depth")?);
                i += 2;
            }
            "nodes" => {
                params.nodes = Some(parse_value(tokens.get(i + 1), "nodes")?);
                i += 2;
            }
            "movetime" => {
                params.movetime = Some(parse_value(tokens.get(i + 1), "movetime")?);
                i += 2;
            }
            "searchmoves" => {
                // Consume move tokens until the next keyword.
                i += 1;
                while i < tokens.len() && !KEYWORDS.contains(&tokens[i]) {
                    params.searchmoves.push(tokens[i].to_string());
                    i += 1;
                }
            }
            "infinite" => {
                params.infinite = true;
                i += 1;
            }
            "ponder" => {
                params.ponder = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    Ok(Command::Go(params))
}

fn parse_value<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_commands() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
        assert!(matches!(
            parse_command("ucinewgame").unwrap(),
            Command::UciNewGame
        ));
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
        assert!(matches!(parse_command("quit").unwrap(), Command::Quit));
        assert!(matches!(
            parse_command("ponderhit").unwrap(),
            Command::PonderHit
        ));
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert!(matches!(parse_command("foobar").unwrap(), Command::Unknown(_)));
        assert!(matches!(parse_command("").unwrap(), Command::Unknown(_)));
    }

    #[test]
    fn parse_position_startpos() {
        let cmd = parse_command("position startpos").unwrap();
        match cmd {
            Command::Position(board) => {
                assert_eq!(board.to_fen(), tempo_core::STARTING_FEN);
            }
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_position_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5 g1f3").unwrap();
        match cmd {
            Command::Position(board) => {
                assert!(board.to_fen().starts_with(
                    "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b"
                ));
            }
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_position_fen() {
        let fen = "8/8/8/8/8/1Q6/2K5/k7 b - - 0 1";
        let cmd = parse_command(&format!("position fen {fen}")).unwrap();
        match cmd {
            Command::Position(board) => assert_eq!(board.to_fen(), fen),
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_position_rejects_illegal_move() {
        assert!(parse_command("position startpos moves e2e5").is_err());
        assert!(parse_command("position startpos moves xyzzy").is_err());
    }

    #[test]
    fn parse_position_rejects_missing_keyword() {
        assert!(parse_command("position").is_err());
        assert!(parse_command("position sideways").is_err());
    }

    #[test]
    fn parse_go_depth_and_nodes() {
        match parse_command("go depth 6").unwrap() {
            Command::Go(params) => assert_eq!(params.depth, Some(6)),
            _ => panic!("expected Go"),
        }
        match parse_command("go nodes 100000").unwrap() {
            Command::Go(params) => assert_eq!(params.nodes, Some(100_000)),
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_clock() {
        match parse_command("go wtime 300000 btime 290000 winc 2000 binc 2000 movestogo 35")
            .unwrap()
        {
            Command::Go(params) => {
                assert_eq!(params.wtime, Some(300_000));
                assert_eq!(params.btime, Some(290_000));
                assert_eq!(params.winc, Some(2_000));
                assert_eq!(params.binc, Some(2_000));
                assert_eq!(params.movestogo, Some(35));
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_searchmoves_stops_at_keywords() {
        match parse_command("go searchmoves e2e4 d2d4 depth 3").unwrap() {
            Command::Go(params) => {
                assert_eq!(params.searchmoves, vec!["e2e4", "d2d4"]);
                assert_eq!(params.depth, Some(3));
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_flags() {
        match parse_command("go ponder wtime 60000 btime 60000").unwrap() {
            Command::Go(params) => assert!(params.ponder),
            _ => panic!("expected Go"),
        }
        match parse_command("go infinite").unwrap() {
            Command::Go(params) => assert!(params.infinite),
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_missing_and_bad_values() {
        assert!(parse_command("go wtime").is_err());
        assert!(parse_command("go depth abc").is_err());
    }

    #[test]
    fn parse_go_bare_defaults() {
        match parse_command("go").unwrap() {
            Command::Go(params) => {
                assert!(params.depth.is_none());
                assert!(params.wtime.is_none());
                assert!(params.searchmoves.is_empty());
                assert!(!params.infinite);
                assert!(!params.ponder);
            }
            _ => panic!("expected Go"),
        }
    }
}
