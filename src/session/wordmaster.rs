use super::{wait_for_turn, Connection, Wake};
use crate::error::{ProtocolError, SessionError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Slot;

/// Wordmaster loop: one secret word per wake while a word is wanted
pub(super) async fn run(state: &AppState, conn: &mut Connection) -> Result<(), SessionError> {
    loop {
        if wait_for_turn(state, conn, Slot::Wordmaster).await? == Wake::Shutdown {
            return Ok(());
        }
        if !state.with_session(|s| s.awaiting_word()).await {
            continue;
        }

        conn.writer.send(&ServerMessage::EnterWord).await?;
        loop {
            let line = conn.reader.next_line().await?;
            let word = match ClientMessage::parse(&line) {
                Ok(ClientMessage::Word(word)) => word,
                Err(ProtocolError::InvalidWord) => {
                    conn.writer
                        .send(&ServerMessage::Error(ProtocolError::InvalidWord))
                        .await?;
                    continue;
                }
                _ => {
                    conn.writer
                        .send(&ServerMessage::Error(ProtocolError::ExpectedWord))
                        .await?;
                    continue;
                }
            };

            let reply = match state.submit_word(word).await {
                Ok(_) => ServerMessage::Ok("Word accepted. Game started.".to_string()),
                Err(e) => ServerMessage::Error(e),
            };
            conn.writer.send(&reply).await?;
            break;
        }
    }
}
