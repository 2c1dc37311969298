use super::AppState;
use crate::error::LedgerError;
use crate::protocol::GameSummary;

impl AppState {
    /// Credit the winner of a finished game (if any) and persist the ledger.
    ///
    /// The winning slot's ledger name is updated to the name it connected with.
    /// A failed save is logged; the win stays counted in memory.
    pub async fn settle_game(&self, summary: &GameSummary) {
        let winner = summary.winner.slot();
        let name = match winner {
            Some(slot) => Some(self.with_session(|s| s.name(slot).to_string()).await),
            None => None,
        };

        let mut ledger = self.ledger.lock().await;
        if let Some(slot) = winner {
            ledger.credit_win(slot, name.as_deref());
            if let Some(entry) = ledger.entry(slot) {
                tracing::info!(
                    slot = slot.index(),
                    name = %entry.name,
                    wins = entry.wins,
                    "Win credited"
                );
            }
        }
        if let Err(e) = ledger.save(&self.config.score_path).await {
            tracing::error!("Failed to save scores after game #{}: {}", summary.game_number, e);
        }
    }

    /// Write the ledger as it stands
    pub async fn persist_ledger(&self) -> Result<(), LedgerError> {
        let ledger = self.ledger.lock().await;
        ledger.save(&self.config.score_path).await
    }
}

#[cfg(test)]
mod tests {
    use crate::audit;
    use crate::config::ServerConfig;
    use crate::ledger::ScoreLedger;
    use crate::protocol::GameSummary;
    use crate::state::AppState;
    use crate::types::*;

    fn state_in(dir: &std::path::Path) -> (AppState, audit::AuditReceiver) {
        let config = ServerConfig {
            score_path: dir.join("scores.txt"),
            audit_log_path: dir.join("game.log"),
            ..ServerConfig::default()
        };
        let (log, rx) = audit::channel(16);
        (AppState::new(config, log, ScoreLedger::default()), rx)
    }

    fn summary(score_a: u32, score_b: u32) -> GameSummary {
        GameSummary {
            game_number: 1,
            word: "CRANE".parse().unwrap(),
            display: "CRANE".to_string(),
            passes: 1,
            score_a,
            score_b,
            winner: Winner::from_scores(score_a, score_b),
        }
    }

    #[tokio::test]
    async fn test_settle_credits_winner_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _rx) = state_in(dir.path());
        state
            .with_session(|s| s.connect(Slot::Guesser2, "Bea"))
            .await;

        state.settle_game(&summary(1, 4)).await;

        let saved = std::fs::read_to_string(dir.path().join("scores.txt")).unwrap();
        assert_eq!(saved, "1 0 GuesserA\n2 1 Bea\n");
    }

    #[tokio::test]
    async fn test_settle_draw_persists_without_credit() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _rx) = state_in(dir.path());

        state.settle_game(&summary(2, 2)).await;

        let saved = std::fs::read_to_string(dir.path().join("scores.txt")).unwrap();
        assert_eq!(saved, "1 0 GuesserA\n2 0 GuesserB\n");
    }

    #[tokio::test]
    async fn test_settle_tolerates_unwritable_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _rx) = state_in(&dir.path().join("gone"));

        state.settle_game(&summary(3, 2)).await;

        let ledger = state.ledger.lock().await;
        assert_eq!(ledger.entry(Slot::Guesser1).unwrap().wins, 1);
        drop(ledger);
        assert!(state.persist_ledger().await.is_err());
    }
}
