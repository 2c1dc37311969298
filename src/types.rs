use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Letters in a secret word
pub const WORD_LEN: usize = 5;
/// Full position sweeps before a game ends undecided
pub const MAX_PASSES: usize = 5;
/// Wordmaster plus two guessers
pub const PLAYER_SLOTS: usize = 3;

/// Longest line accepted from a client, excluding the newline
pub const MAX_LINE_LEN: usize = 256;
/// Player names are cut to this many characters
pub const MAX_NAME_LEN: usize = 31;

/// Placeholder for an unrevealed letter in the display mask
pub const HIDDEN: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    AwaitingPlayers,
    AwaitingWord,
    InProgress,
    GameOver,
}

/// Fixed player identity, assigned by connection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Wordmaster,
    Guesser1,
    Guesser2,
}

impl Slot {
    pub const ALL: [Slot; PLAYER_SLOTS] = [Slot::Wordmaster, Slot::Guesser1, Slot::Guesser2];
    pub const GUESSERS: [Slot; 2] = [Slot::Guesser1, Slot::Guesser2];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Numeric slot id as used on the wire and in the score file
    pub fn index(self) -> usize {
        match self {
            Slot::Wordmaster => 0,
            Slot::Guesser1 => 1,
            Slot::Guesser2 => 2,
        }
    }

    pub fn is_guesser(self) -> bool {
        self != Slot::Wordmaster
    }

    /// The other guesser. The wordmaster has no opponent and maps to itself.
    pub fn opponent(self) -> Self {
        match self {
            Slot::Guesser1 => Slot::Guesser2,
            Slot::Guesser2 => Slot::Guesser1,
            Slot::Wordmaster => Slot::Wordmaster,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessResult {
    Correct,
    Present,
    Absent,
}

impl fmt::Display for GuessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GuessResult::Correct => "CORRECT",
            GuessResult::Present => "PRESENT",
            GuessResult::Absent => "ABSENT",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Draw,
    Player(Slot),
}

impl Winner {
    /// Higher score wins; equal scores are a draw
    pub fn from_scores(score_a: u32, score_b: u32) -> Self {
        match score_a.cmp(&score_b) {
            std::cmp::Ordering::Greater => Winner::Player(Slot::Guesser1),
            std::cmp::Ordering::Less => Winner::Player(Slot::Guesser2),
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }

    pub fn slot(self) -> Option<Slot> {
        match self {
            Winner::Draw => None,
            Winner::Player(slot) => Some(slot),
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Draw => f.write_str("DRAW"),
            Winner::Player(slot) => write!(f, "PLAYER{}", slot.index()),
        }
    }
}

/// A validated secret word: exactly five letters A-Z
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretWord([u8; WORD_LEN]);

impl SecretWord {
    pub fn letter_at(&self, position: usize) -> char {
        self.0[position] as char
    }

    pub fn contains(&self, letter: char) -> bool {
        self.0.iter().any(|&b| b as char == letter)
    }
}

impl FromStr for SecretWord {
    type Err = ProtocolError;

    /// Case-normalizes before validating, so `crane` is accepted as `CRANE`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bytes = upper.as_bytes();
        if bytes.len() != WORD_LEN || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(ProtocolError::InvalidWord);
        }
        let mut letters = [0u8; WORD_LEN];
        letters.copy_from_slice(bytes);
        Ok(SecretWord(letters))
    }
}

impl fmt::Display for SecretWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

/// Parses a single guessed letter, case-normalized to A-Z
pub fn parse_letter(s: &str) -> Result<char, ProtocolError> {
    let mut chars = s.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_uppercase()),
        _ => Err(ProtocolError::InvalidGuess),
    }
}
