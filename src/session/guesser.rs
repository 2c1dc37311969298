use super::{wait_for_turn, Connection, Wake};
use crate::error::{ProtocolError, SessionError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Slot;

/// Guesser loop for slot 1 or 2: one guess per turn handed out by the scheduler
pub(super) async fn run(
    state: &AppState,
    conn: &mut Connection,
    slot: Slot,
) -> Result<(), SessionError> {
    loop {
        if wait_for_turn(state, conn, slot).await? == Wake::Shutdown {
            return Ok(());
        }

        // A permit left over from an ended game or a disconnect is dropped here
        let Some(prompt) = state.with_session(|s| s.turn_prompt(slot)).await else {
            tracing::debug!(slot = slot.index(), "Stale turn signal ignored");
            continue;
        };
        conn.writer.send(&ServerMessage::YourTurn(prompt)).await?;

        let letter = loop {
            let line = conn.reader.next_line().await?;
            match ClientMessage::parse(&line) {
                Ok(ClientMessage::Guess(letter)) => break letter,
                Err(ProtocolError::InvalidGuess) => {
                    conn.writer
                        .send(&ServerMessage::Error(ProtocolError::InvalidGuess))
                        .await?
                }
                _ => {
                    conn.writer
                        .send(&ServerMessage::Error(ProtocolError::ExpectedGuess))
                        .await?
                }
            }
        };

        let outcome = match state.submit_guess(slot, letter).await {
            Ok(outcome) => outcome,
            Err(e) => {
                conn.writer.send(&ServerMessage::Error(e)).await?;
                continue;
            }
        };

        if let Some(summary) = &outcome.summary {
            state.settle_game(summary).await;
        }
        conn.writer.send(&ServerMessage::State(outcome.report)).await?;
        if let Some(summary) = outcome.summary {
            conn.writer.send(&ServerMessage::GameOver(summary)).await?;
        }
    }
}
