use super::{AppState, GuessOutcome};
use crate::error::ProtocolError;
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Record a player as connected under `name`
    pub async fn register_player(&self, slot: Slot, name: &str) {
        self.with_session(|s| s.connect(slot, name)).await;
        tracing::info!(slot = slot.index(), name, "Player connected");
        self.audit
            .record(format!("Player {} connected as '{}'.", slot, name))
            .await;
        self.kick_scheduler();
    }

    /// Install the wordmaster's secret word and open play.
    ///
    /// Guessers learn about the new game through their mailboxes. Returns the game number.
    pub async fn submit_word(&self, word: SecretWord) -> Result<u32, ProtocolError> {
        let game_number = self
            .with_session(|s| {
                s.accept_word(word)?;
                let notice = ServerMessage::Info(format!("Game #{} started.", s.game_number));
                self.mailboxes.enqueue_others(Slot::Wordmaster, &notice);
                Ok::<_, ProtocolError>(s.game_number)
            })
            .await?;

        tracing::info!(game_number, "Secret word set");
        self.audit
            .record(format!(
                "Wordmaster set secret word for game #{}.",
                game_number
            ))
            .await;
        self.kick_scheduler();
        Ok(game_number)
    }

    /// Apply `slot`'s guess for the current position.
    ///
    /// The outcome (and the summary, if this guess ended the game) is queued for
    /// the other two players before the lock is released, so it always reaches
    /// them ahead of anything the next turn produces. The caller sends the
    /// acting player's own copy.
    pub async fn submit_guess(
        &self,
        slot: Slot,
        letter: char,
    ) -> Result<GuessOutcome, ProtocolError> {
        let outcome = self
            .with_session(|s| {
                let outcome = s.apply_guess(slot, letter)?;
                self.mailboxes
                    .enqueue_others(slot, &ServerMessage::State(outcome.report.clone()));
                if let Some(summary) = &outcome.summary {
                    self.mailboxes
                        .enqueue_others(slot, &ServerMessage::GameOver(summary.clone()));
                }
                Ok::<_, ProtocolError>(outcome)
            })
            .await?;

        let report = &outcome.report;
        self.audit
            .record(format!(
                "Player {} guessed '{}' for pos {} -> {} (scoreA={} scoreB={})",
                slot,
                letter,
                report.position + 1,
                report.result,
                report.score_a,
                report.score_b
            ))
            .await;

        if let Some(summary) = &outcome.summary {
            tracing::info!(
                game_number = summary.game_number,
                winner = %summary.winner,
                "Game over"
            );
            self.audit
                .record(format!(
                    "Game #{} over: word={} display={} scoreA={} scoreB={} winner={}",
                    summary.game_number,
                    summary.word,
                    summary.display,
                    summary.score_a,
                    summary.score_b,
                    summary.winner
                ))
                .await;
        }

        self.kick_scheduler();
        Ok(outcome)
    }

    /// Mark `slot` gone, releasing its turn if it held one
    pub async fn mark_disconnected(&self, slot: Slot) {
        self.with_session(|s| s.disconnect(slot)).await;
        tracing::info!(slot = slot.index(), "Player disconnected");
        self.audit
            .record(format!("Player {} disconnected.", slot))
            .await;
        self.kick_scheduler();
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ProtocolError;
    use crate::protocol::ServerMessage;
    use crate::state::tests::test_state;
    use crate::types::*;

    async fn ready_for_word(state: &crate::state::AppState) {
        for slot in Slot::ALL {
            state.register_player(slot, "p").await;
        }
        state
            .with_session(|s| {
                s.phase = GamePhase::AwaitingWord;
                s.game_number = 1;
            })
            .await;
    }

    #[tokio::test]
    async fn test_submit_word_notifies_guessers() {
        let (state, mut audit_rx) = test_state();
        let mut g1 = state.mailboxes.take_inbox(Slot::Guesser1).await.unwrap();
        let mut wm = state.mailboxes.take_inbox(Slot::Wordmaster).await.unwrap();
        ready_for_word(&state).await;

        let game = state.submit_word("crane".parse().unwrap()).await.unwrap();
        assert_eq!(game, 1);
        assert_eq!(g1.drain(), vec![ServerMessage::Info("Game #1 started.".to_string())]);
        assert!(wm.drain().is_empty());

        let mut last = None;
        while let Ok(entry) = audit_rx.try_recv() {
            last = Some(entry.message);
        }
        assert_eq!(last.as_deref(), Some("Wordmaster set secret word for game #1."));

        // A second word is refused once play has started
        assert!(state.submit_word("apple".parse().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_submit_guess_broadcasts_to_others() {
        let (state, _audit_rx) = test_state();
        let mut wm = state.mailboxes.take_inbox(Slot::Wordmaster).await.unwrap();
        let mut g1 = state.mailboxes.take_inbox(Slot::Guesser1).await.unwrap();
        let mut g2 = state.mailboxes.take_inbox(Slot::Guesser2).await.unwrap();
        ready_for_word(&state).await;
        state.submit_word("CRANE".parse().unwrap()).await.unwrap();
        g1.drain();
        g2.drain();
        state.with_session(|s| s.turn_gate = true).await;

        let outcome = state.submit_guess(Slot::Guesser1, 'C').await.unwrap();
        assert_eq!(outcome.report.result, GuessResult::Correct);

        let expected = ServerMessage::State(outcome.report.clone());
        assert_eq!(wm.drain(), vec![expected.clone()]);
        assert_eq!(g2.drain(), vec![expected]);
        assert!(g1.drain().is_empty());
    }

    #[tokio::test]
    async fn test_stale_guess_is_refused() {
        let (state, _audit_rx) = test_state();
        ready_for_word(&state).await;
        state.submit_word("CRANE".parse().unwrap()).await.unwrap();

        // The scheduler has not handed out the turn yet
        let err = state.submit_guess(Slot::Guesser1, 'C').await.unwrap_err();
        assert_eq!(err, ProtocolError::TurnLost);
    }

    #[tokio::test]
    async fn test_mark_disconnected_releases_turn() {
        let (state, _audit_rx) = test_state();
        ready_for_word(&state).await;
        state.submit_word("CRANE".parse().unwrap()).await.unwrap();
        state.with_session(|s| s.turn_gate = true).await;

        state.mark_disconnected(Slot::Guesser1).await;
        let (gate, connected) = state
            .with_session(|s| (s.turn_gate, s.is_connected(Slot::Guesser1)))
            .await;
        assert!(!gate);
        assert!(!connected);
    }
}
