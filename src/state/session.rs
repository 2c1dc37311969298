//! The single in-memory game record, reused across games.
//!
//! Nothing in here locks or performs I/O; callers hold the store lock
//! (see `AppState::with_session`) for every read and write.

use crate::error::ProtocolError;
use crate::protocol::{GameSummary, TurnPrompt, TurnReport};
use crate::types::*;

#[derive(Debug, Clone)]
pub struct GameSession {
    pub phase: GamePhase,
    pub secret_word: Option<SecretWord>,
    display: [char; WORD_LEN],
    pub position: usize,
    pub pass: usize,
    pub current_turn: Slot,
    /// Set by the scheduler when it wakes a guesser, cleared once that turn is applied
    pub turn_gate: bool,
    scores: [u32; PLAYER_SLOTS],
    connected: [bool; PLAYER_SLOTS],
    names: [String; PLAYER_SLOTS],
    pub game_number: u32,
}

/// What applying a guess produced
#[derive(Debug, Clone)]
pub struct GuessOutcome {
    pub report: TurnReport,
    /// Present when this guess ended the game
    pub summary: Option<GameSummary>,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::AwaitingPlayers,
            secret_word: None,
            display: [HIDDEN; WORD_LEN],
            position: 0,
            pass: 0,
            current_turn: Slot::Wordmaster,
            turn_gate: false,
            scores: [0; PLAYER_SLOTS],
            connected: [false; PLAYER_SLOTS],
            names: Default::default(),
            game_number: 0,
        }
    }

    pub fn display(&self) -> String {
        self.display.iter().collect()
    }

    pub fn score(&self, slot: Slot) -> u32 {
        self.scores[slot.index()]
    }

    pub fn is_connected(&self, slot: Slot) -> bool {
        self.connected[slot.index()]
    }

    pub fn all_connected(&self) -> bool {
        self.connected.iter().all(|&c| c)
    }

    pub fn guessers_connected(&self) -> bool {
        Slot::GUESSERS.iter().all(|&slot| self.is_connected(slot))
    }

    pub fn name(&self, slot: Slot) -> &str {
        &self.names[slot.index()]
    }

    pub fn connect(&mut self, slot: Slot, name: &str) {
        self.connected[slot.index()] = true;
        self.names[slot.index()] = name.to_string();
    }

    /// Marks the slot gone. Releases the turn gate if it was this slot's turn.
    pub fn disconnect(&mut self, slot: Slot) {
        self.connected[slot.index()] = false;
        if self.current_turn == slot {
            self.turn_gate = false;
        }
    }

    pub fn is_revealed(&self) -> bool {
        !self.display.contains(&HIDDEN)
    }

    /// Start-of-game values for everything a game mutates
    pub fn reset(&mut self) {
        self.secret_word = None;
        self.display = [HIDDEN; WORD_LEN];
        self.position = 0;
        self.pass = 0;
        self.scores = [0; PLAYER_SLOTS];
        self.current_turn = Slot::Wordmaster;
        self.turn_gate = false;
    }

    /// Whether the wordmaster is the one being waited on for a word
    pub fn awaiting_word(&self) -> bool {
        self.phase == GamePhase::AwaitingWord && self.current_turn == Slot::Wordmaster
    }

    /// Installs the secret word and opens play with guesser 1
    pub fn accept_word(&mut self, word: SecretWord) -> Result<(), ProtocolError> {
        if !self.awaiting_word() {
            return Err(ProtocolError::TurnLost);
        }
        self.secret_word = Some(word);
        self.position = 0;
        self.pass = 0;
        self.current_turn = Slot::Guesser1;
        self.turn_gate = false;
        self.phase = GamePhase::InProgress;
        Ok(())
    }

    /// Whether `slot` holds a turn the scheduler actually handed out
    pub fn holds_turn(&self, slot: Slot) -> bool {
        self.phase == GamePhase::InProgress && self.current_turn == slot && self.turn_gate
    }

    /// Snapshot for the turn prompt, or `None` on a stale wake
    pub fn turn_prompt(&self, slot: Slot) -> Option<TurnPrompt> {
        self.holds_turn(slot).then(|| TurnPrompt {
            pass: self.pass,
            position: self.position,
            display: self.display(),
        })
    }

    /// Applies one guess for the current position and advances the game.
    ///
    /// Fails without mutating anything if `slot` no longer holds the turn.
    pub fn apply_guess(&mut self, slot: Slot, letter: char) -> Result<GuessOutcome, ProtocolError> {
        let word = match self.secret_word {
            Some(word) if self.holds_turn(slot) => word,
            _ => return Err(ProtocolError::TurnLost),
        };

        let pass = self.pass;
        let position = self.position;

        let result = if word.letter_at(position) == letter {
            GuessResult::Correct
        } else if word.contains(letter) {
            GuessResult::Present
        } else {
            GuessResult::Absent
        };

        if result == GuessResult::Correct {
            self.scores[slot.index()] += 1;
            self.display[position] = letter;
        }

        self.position += 1;
        if self.position == WORD_LEN {
            self.position = 0;
            self.pass += 1;
        }

        let over = self.is_revealed() || self.pass >= MAX_PASSES;
        if over {
            self.phase = GamePhase::GameOver;
        } else {
            self.current_turn = slot.opponent();
        }
        self.turn_gate = false;

        let report = TurnReport {
            from: slot,
            pass,
            position,
            guess: letter,
            result,
            display: self.display(),
            score_a: self.score(Slot::Guesser1),
            score_b: self.score(Slot::Guesser2),
            next_pass: self.pass,
            next_position: self.position,
            next_turn: (!over).then_some(self.current_turn),
        };
        let summary = over.then(|| self.summary(word));

        Ok(GuessOutcome { report, summary })
    }

    fn summary(&self, word: SecretWord) -> GameSummary {
        let score_a = self.score(Slot::Guesser1);
        let score_b = self.score(Slot::Guesser2);
        GameSummary {
            game_number: self.game_number,
            word,
            display: self.display(),
            passes: self.pass,
            score_a,
            score_b,
            winner: Winner::from_scores(score_a, score_b),
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
