mod game;
mod score;
pub mod session;

pub use session::{GameSession, GuessOutcome};

use crate::audit::AuditLog;
use crate::broadcast::Mailboxes;
use crate::config::ServerConfig;
use crate::ledger::ScoreLedger;
use crate::types::{Slot, PLAYER_SLOTS};
use tokio::sync::{watch, Mutex, Notify};

/// Shared application state
pub struct AppState {
    /// The game store. Only reachable through `with_session`.
    session: Mutex<GameSession>,
    /// One wake signal per slot, posted by the turn scheduler
    turn_gates: [Notify; PLAYER_SLOTS],
    /// Lets workers nudge the scheduler right after a mutation
    scheduler_wake: Notify,
    pub mailboxes: Mailboxes,
    pub audit: AuditLog,
    pub ledger: Mutex<ScoreLedger>,
    pub config: ServerConfig,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: ServerConfig, audit: AuditLog, ledger: ScoreLedger) -> Self {
        let (shutdown, _rx) = watch::channel(false);
        Self {
            session: Mutex::new(GameSession::new()),
            turn_gates: [Notify::new(), Notify::new(), Notify::new()],
            scheduler_wake: Notify::new(),
            mailboxes: Mailboxes::new(config.outbox_capacity),
            audit,
            ledger: Mutex::new(ledger),
            config,
            shutdown,
        }
    }

    /// Run `f` with the session locked. `f` is synchronous, so the lock is
    /// never held across I/O.
    pub async fn with_session<R>(&self, f: impl FnOnce(&mut GameSession) -> R) -> R {
        let mut session = self.session.lock().await;
        f(&mut session)
    }

    pub fn turn_gate(&self, slot: Slot) -> &Notify {
        &self.turn_gates[slot.index()]
    }

    /// Post a wake for `slot`. A slot that is not waiting keeps it as a permit.
    pub fn signal_turn(&self, slot: Slot) {
        self.turn_gate(slot).notify_one();
    }

    pub fn kick_scheduler(&self) {
        self.scheduler_wake.notify_one();
    }

    pub async fn scheduler_kicked(&self) {
        self.scheduler_wake.notified().await;
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
