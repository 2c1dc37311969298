use std::net::SocketAddr;
use std::path::PathBuf;

/// Retryable input problems, reported to the offending client as `ERR <reason>`.
///
/// The `Display` text is exactly what follows `ERR ` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Expected: NAME yourname")]
    ExpectedName,

    #[error("Expected: WORD ABCDE")]
    ExpectedWord,

    #[error("Word must be exactly 5 letters A-Z. Try again.")]
    InvalidWord,

    #[error("Expected: GUESS X")]
    ExpectedGuess,

    #[error("Guess must be a single letter A-Z.")]
    InvalidGuess,

    #[error("Not your turn.")]
    NotYourTurn,

    /// The turn ended (game over or reset) while the player was typing
    #[error("Not your turn (race).")]
    TurnLost,

    #[error("Unrecognized command")]
    UnknownCommand,
}

/// Failures that end a player's session. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("peer closed the connection")]
    Closed,

    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("socket I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to read score file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write score file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Fatal resource errors. The process reports them and exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("failed to open audit log {path}: {source}")]
    AuditLog {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
