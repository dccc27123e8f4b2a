//! UCI protocol errors.

/// Errors that can occur while handling UCI input.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command is missing its `startpos` or `fen` keyword.
    #[error("malformed position command: expected startpos or fen")]
    MalformedPosition,

    /// A FEN string could not be parsed.
    #[error("invalid FEN \"{fen}\": {source}")]
    InvalidFen {
        /// The FEN string that failed.
        fen: String,
        /// The underlying parse error.
        source: tempo_core::FenError,
    },

    /// A move in the `position` command does not exist in its position.
    #[error("illegal or unparsable move: {uci_move}")]
    InvalidMove {
        /// The offending move string.
        uci_move: String,
    },

    /// A `go` parameter is missing its value.
    #[error("missing value for go parameter {param}")]
    MissingGoValue {
        /// The parameter name.
        param: String,
    },

    /// A `go` parameter value could not be parsed.
    #[error("invalid value for go parameter {param}: {value}")]
    InvalidGoValue {
        /// The parameter name.
        param: String,
        /// The offending value.
        value: String,
    },

    /// Reading from stdin failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
