//! Line protocol spoken over each player's TCP connection.
//!
//! Every message is one UTF-8 line. Positions and pass numbers are kept
//! 0-based in memory and rendered 1-based on the wire.

use std::fmt;

use crate::error::ProtocolError;
use crate::types::{
    parse_letter, GuessResult, SecretWord, Slot, Winner, MAX_NAME_LEN, MAX_PASSES,
};

/// Lines a client may send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Name(String),
    Word(SecretWord),
    Guess(char),
}

impl ClientMessage {
    /// Parse one received line (carriage returns already stripped)
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "NAME" => {
                let name = rest.trim();
                if name.is_empty() {
                    Err(ProtocolError::ExpectedName)
                } else {
                    Ok(ClientMessage::Name(name.chars().take(MAX_NAME_LEN).collect()))
                }
            }
            "WORD" => rest.parse().map(ClientMessage::Word),
            "GUESS" => parse_letter(rest).map(ClientMessage::Guess),
            _ => Err(ProtocolError::UnknownCommand),
        }
    }
}

/// What a guesser needs to see before choosing a letter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnPrompt {
    pub pass: usize,
    pub position: usize,
    pub display: String,
}

/// Result of one applied guess, shared with all three players
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub from: Slot,
    pub pass: usize,
    pub position: usize,
    pub guess: char,
    pub result: GuessResult,
    pub display: String,
    pub score_a: u32,
    pub score_b: u32,
    pub next_pass: usize,
    pub next_position: usize,
    /// `None` once the game is over
    pub next_turn: Option<Slot>,
}

/// End-of-game summary. This is the only message that reveals the word to guessers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub game_number: u32,
    pub word: SecretWord,
    pub display: String,
    pub passes: usize,
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Winner,
}

/// Lines the server sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Welcome,
    Role(Slot),
    Info(String),
    EnterWord,
    Ok(String),
    Error(ProtocolError),
    YourTurn(TurnPrompt),
    State(TurnReport),
    GameOver(GameSummary),
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome => f.write_str("WELCOME Please identify: NAME yourname"),
            ServerMessage::Role(Slot::Wordmaster) => f.write_str("ROLE WORDMASTER"),
            ServerMessage::Role(slot) => write!(f, "ROLE GUESSER {slot}"),
            ServerMessage::Info(text) => write!(f, "INFO {text}"),
            ServerMessage::EnterWord => f.write_str("ENTER_WORD Please send: WORD ABCDE"),
            ServerMessage::Ok(text) => write!(f, "OK {text}"),
            ServerMessage::Error(e) => write!(f, "ERR {e}"),
            ServerMessage::YourTurn(prompt) => write!(
                f,
                "YOUR_TURN pass={}/{MAX_PASSES} pos={} display={} (send: GUESS X)",
                prompt.pass + 1,
                prompt.position + 1,
                prompt.display
            ),
            ServerMessage::State(report) => write!(
                f,
                "STATE from={} pass={}/{MAX_PASSES} pos={} guess={} result={} display={} \
                 scoreA={} scoreB={} next_pass={}/{MAX_PASSES} next_pos={} turn={}",
                report.from,
                report.pass + 1,
                report.position + 1,
                report.guess,
                report.result,
                report.display,
                report.score_a,
                report.score_b,
                report.next_pass + 1,
                report.next_position + 1,
                report.next_turn.map(Slot::index).unwrap_or(0)
            ),
            ServerMessage::GameOver(summary) => write!(
                f,
                "GAME_OVER word={} display={} passes={} scoreA={} scoreB={} winner={}",
                summary.word,
                summary.display,
                summary.passes,
                summary.score_a,
                summary.score_b,
                summary.winner
            ),
        }
    }
}
