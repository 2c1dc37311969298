//! Turn scheduler: the only place that advances the game between actions.
//!
//! `step` is the phase machine over a locked session. The spawned loop runs it
//! on every poll tick and whenever a worker kicks it, then posts wake signals
//! and audit events for whatever changed.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::protocol::ServerMessage;
use crate::state::{AppState, GameSession};
use crate::types::*;

/// One phase-machine move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Slot whose turn gate should be signalled
    pub wake: Option<Slot>,
    pub audit: String,
    /// Notice for every player's mailbox
    pub notice: Option<ServerMessage>,
}

impl Transition {
    fn wake(slot: Slot, audit: String) -> Self {
        Self {
            wake: Some(slot),
            audit,
            notice: None,
        }
    }
}

/// Advance `session` by at most one move. `None` means nothing to do.
pub fn step(session: &mut GameSession) -> Option<Transition> {
    match session.phase {
        GamePhase::AwaitingPlayers => {
            if !session.all_connected() {
                return None;
            }
            session.game_number += 1;
            session.phase = GamePhase::AwaitingWord;
            session.current_turn = Slot::Wordmaster;
            session.turn_gate = false;
            Some(Transition::wake(
                Slot::Wordmaster,
                format!(
                    "All players connected. Starting game #{}. Waiting for wordmaster.",
                    session.game_number
                ),
            ))
        }

        GamePhase::AwaitingWord => None,

        GamePhase::InProgress => {
            if !session.guessers_connected() {
                session.phase = GamePhase::GameOver;
                session.turn_gate = false;
                return Some(Transition {
                    wake: None,
                    audit: format!(
                        "A guesser disconnected. Ending game #{}.",
                        session.game_number
                    ),
                    notice: Some(ServerMessage::Info(format!(
                        "Game #{} aborted: a guesser disconnected.",
                        session.game_number
                    ))),
                });
            }
            if session.turn_gate {
                return None;
            }
            if !session.current_turn.is_guesser() {
                session.current_turn = Slot::Guesser1;
            }
            session.turn_gate = true;
            let slot = session.current_turn;
            Some(Transition::wake(
                slot,
                format!(
                    "Turn: player {} (pass={}/{} pos={} display={} scoreA={} scoreB={})",
                    slot,
                    session.pass + 1,
                    MAX_PASSES,
                    session.position + 1,
                    session.display(),
                    session.score(Slot::Guesser1),
                    session.score(Slot::Guesser2)
                ),
            ))
        }

        GamePhase::GameOver => {
            session.reset();
            session.game_number += 1;
            session.phase = GamePhase::AwaitingWord;
            Some(Transition::wake(
                Slot::Wordmaster,
                format!(
                    "Reset complete. Waiting for wordmaster for game #{}.",
                    session.game_number
                ),
            ))
        }
    }
}

/// Spawn the scheduler loop. It exits once shutdown is raised.
pub fn spawn_turn_scheduler(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut shutdown = state.subscribe_shutdown();
        let mut ticker = tokio::time::interval(state.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if state.is_shutting_down() {
                break;
            }

            // Drain every move available right now; each runs under the lock
            // with its signal and notice posted before the lock is released.
            while let Some(transition) = state
                .with_session(|s| {
                    let transition = step(s)?;
                    if let Some(notice) = &transition.notice {
                        for slot in Slot::ALL {
                            state.mailboxes.enqueue(slot, notice.clone());
                        }
                    }
                    if let Some(slot) = transition.wake {
                        state.signal_turn(slot);
                    }
                    Some(transition)
                })
                .await
            {
                tracing::debug!(wake = ?transition.wake, "{}", transition.audit);
                state.audit.record(transition.audit).await;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = state.scheduler_kicked() => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::debug!("Turn scheduler stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_session() -> GameSession {
        let mut session = GameSession::new();
        for slot in Slot::ALL {
            session.connect(slot, "p");
        }
        session
    }

    #[test]
    fn test_waits_for_all_players() {
        let mut session = GameSession::new();
        session.connect(Slot::Wordmaster, "w");
        session.connect(Slot::Guesser1, "a");
        assert!(step(&mut session).is_none());

        session.connect(Slot::Guesser2, "b");
        let t = step(&mut session).unwrap();
        assert_eq!(t.wake, Some(Slot::Wordmaster));
        assert_eq!(
            t.audit,
            "All players connected. Starting game #1. Waiting for wordmaster."
        );
        assert_eq!(session.phase, GamePhase::AwaitingWord);
        assert!(step(&mut session).is_none());
    }

    #[test]
    fn test_turn_is_signalled_once_per_gate() {
        let mut session = connected_session();
        step(&mut session);
        session.accept_word("CRANE".parse().unwrap()).unwrap();

        let t = step(&mut session).unwrap();
        assert_eq!(t.wake, Some(Slot::Guesser1));
        assert_eq!(
            t.audit,
            "Turn: player 1 (pass=1/5 pos=1 display=_____ scoreA=0 scoreB=0)"
        );
        assert!(session.turn_gate);
        assert!(step(&mut session).is_none());

        session.apply_guess(Slot::Guesser1, 'C').unwrap();
        let t = step(&mut session).unwrap();
        assert_eq!(t.wake, Some(Slot::Guesser2));
        assert!(t.audit.contains("pos=2 display=C____ scoreA=1"));
    }

    #[test]
    fn test_guesser_disconnect_ends_game_then_resets() {
        let mut session = connected_session();
        step(&mut session);
        session.accept_word("CRANE".parse().unwrap()).unwrap();
        step(&mut session);

        session.disconnect(Slot::Guesser2);
        let t = step(&mut session).unwrap();
        assert_eq!(session.phase, GamePhase::GameOver);
        assert_eq!(t.wake, None);
        assert_eq!(
            t.notice,
            Some(ServerMessage::Info(
                "Game #1 aborted: a guesser disconnected.".to_string()
            ))
        );

        let t = step(&mut session).unwrap();
        assert_eq!(t.wake, Some(Slot::Wordmaster));
        assert_eq!(session.phase, GamePhase::AwaitingWord);
        assert_eq!(session.game_number, 2);
        assert_eq!(session.display(), "_____");
        assert!(session.secret_word.is_none());
    }

    #[test]
    fn test_wordmaster_disconnect_does_not_end_game() {
        let mut session = connected_session();
        step(&mut session);
        session.accept_word("CRANE".parse().unwrap()).unwrap();
        step(&mut session);

        session.disconnect(Slot::Wordmaster);
        assert!(step(&mut session).is_none());
        assert_eq!(session.phase, GamePhase::InProgress);
    }

    #[test]
    fn test_invalid_turn_defaults_to_first_guesser() {
        let mut session = connected_session();
        step(&mut session);
        session.accept_word("CRANE".parse().unwrap()).unwrap();
        session.current_turn = Slot::Wordmaster;
        let t = step(&mut session).unwrap();
        assert_eq!(t.wake, Some(Slot::Guesser1));
    }

    #[tokio::test]
    async fn test_scheduler_wakes_wordmaster_and_stops_on_shutdown() {
        let (state, _audit_rx) = crate::state::tests::test_state();
        let state = Arc::new(state);
        let handle = spawn_turn_scheduler(state.clone());

        for slot in Slot::ALL {
            state.register_player(slot, "p").await;
        }
        tokio::time::timeout(
            std::time::Duration::from_secs(2),
            state.turn_gate(Slot::Wordmaster).notified(),
        )
        .await
        .unwrap();
        assert_eq!(state.with_session(|s| s.phase).await, GamePhase::AwaitingWord);

        state.begin_shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
