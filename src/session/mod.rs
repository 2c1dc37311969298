//! Per-connection session workers.
//!
//! Each accepted socket gets one task that performs the name handshake and
//! then runs the wordmaster or guesser loop for its slot until the peer goes
//! away or the server shuts down.

pub mod conn;
mod guesser;
mod wordmaster;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::broadcast::Inbox;
use crate::error::{ProtocolError, SessionError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Slot;

pub use conn::{LineReader, LineWriter};

/// Everything a worker owns for its player
pub struct Connection {
    pub reader: LineReader,
    pub writer: LineWriter,
    pub inbox: Inbox,
    shutdown: watch::Receiver<bool>,
}

/// Why `wait_for_turn` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Turn,
    Shutdown,
}

/// Drive one player's connection from handshake to disconnect
pub async fn run_session(state: Arc<AppState>, slot: Slot, stream: TcpStream, peer: SocketAddr) {
    let Some(inbox) = state.mailboxes.take_inbox(slot).await else {
        tracing::warn!(slot = slot.index(), %peer, "Slot already has a session");
        return;
    };

    let (read, write) = stream.into_split();
    let mut conn = Connection {
        reader: LineReader::new(read),
        writer: LineWriter::new(write),
        inbox,
        shutdown: state.subscribe_shutdown(),
    };

    let result = async {
        let name = handshake(&mut conn, slot).await?;
        state.register_player(slot, &name).await;
        match slot {
            Slot::Wordmaster => wordmaster::run(&state, &mut conn).await,
            _ => guesser::run(&state, &mut conn, slot).await,
        }
    }
    .await;

    match result {
        Ok(()) => tracing::debug!(slot = slot.index(), %peer, "Session closed for shutdown"),
        Err(e) => {
            tracing::info!(slot = slot.index(), %peer, "Session ended: {}", e);
            state.mark_disconnected(slot).await;
        }
    }
}

/// Greet the player and wait for a usable `NAME`, then announce its role
async fn handshake(conn: &mut Connection, slot: Slot) -> Result<String, SessionError> {
    conn.writer.send(&ServerMessage::Welcome).await?;
    let name = loop {
        let line = conn.reader.next_line().await?;
        match ClientMessage::parse(&line) {
            Ok(ClientMessage::Name(name)) => break name,
            _ => {
                conn.writer
                    .send(&ServerMessage::Error(ProtocolError::ExpectedName))
                    .await?
            }
        }
    };

    let intro = match slot {
        Slot::Wordmaster => "You will enter a 5-letter secret word (A-Z).",
        _ => "You will guess letters (A-Z) for each position 1..5 when prompted: GUESS X",
    };
    conn.writer.send(&ServerMessage::Role(slot)).await?;
    conn.writer
        .send(&ServerMessage::Info(intro.to_string()))
        .await?;
    Ok(name)
}

/// Block until the scheduler signals `slot`, delivering mailbox messages as
/// they arrive and answering any input with `ERR Not your turn.`.
///
/// Messages still queued when the signal arrives are flushed before returning.
async fn wait_for_turn(
    state: &AppState,
    conn: &mut Connection,
    slot: Slot,
) -> Result<Wake, SessionError> {
    enum Event {
        Turn,
        Mail(Option<ServerMessage>),
        Line(Result<String, SessionError>),
        Shutdown,
    }

    loop {
        if *conn.shutdown.borrow() {
            return Ok(Wake::Shutdown);
        }

        let event = tokio::select! {
            _ = state.turn_gate(slot).notified() => Event::Turn,
            msg = conn.inbox.recv() => Event::Mail(msg),
            line = conn.reader.next_line() => Event::Line(line),
            changed = conn.shutdown.changed() => match changed {
                Ok(()) => continue,
                Err(_) => Event::Shutdown,
            },
        };

        match event {
            Event::Turn => {
                let pending = conn.inbox.drain();
                conn.writer.send_all(pending).await?;
                return Ok(Wake::Turn);
            }
            Event::Mail(Some(msg)) => conn.writer.send(&msg).await?,
            Event::Mail(None) | Event::Shutdown => return Ok(Wake::Shutdown),
            Event::Line(line) => {
                line?;
                conn.writer
                    .send(&ServerMessage::Error(ProtocolError::NotYourTurn))
                    .await?;
            }
        }
    }
}
