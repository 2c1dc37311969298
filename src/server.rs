//! Connection acceptor and the server's start/stop contract

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::audit;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::ledger::ScoreLedger;
use crate::scheduler::spawn_turn_scheduler;
use crate::session::run_session;
use crate::state::AppState;
use crate::types::Slot;

/// A running server. Dropping it leaves the background tasks running; call
/// `shutdown` to stop cleanly.
pub struct ServerHandle {
    state: Arc<AppState>,
    local_addr: SocketAddr,
    scheduler: JoinHandle<()>,
    audit_writer: JoinHandle<()>,
    /// Stops the audit writer. Raised only once nothing else will record.
    audit_stop: watch::Sender<bool>,
    acceptor: JoinHandle<()>,
}

/// Load persisted scores, open the audit log and start serving on `listener`
pub async fn start(config: ServerConfig, listener: TcpListener) -> Result<ServerHandle, ServerError> {
    let local_addr = listener.local_addr()?;

    let ledger = ScoreLedger::load(&config.score_path).await?;
    let audit_file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.audit_log_path)
        .await
        .map_err(|source| ServerError::AuditLog {
            path: config.audit_log_path.clone(),
            source,
        })?;

    let (audit_log, audit_rx) = audit::channel(config.audit_capacity);
    let state = Arc::new(AppState::new(config, audit_log, ledger));

    let (audit_stop, audit_stop_rx) = watch::channel(false);
    let audit_writer = audit::spawn_audit_writer(audit_rx, audit_file, audit_stop_rx);
    state
        .audit
        .record(format!("Server starting on port {}.", local_addr.port()))
        .await;

    let scheduler = spawn_turn_scheduler(state.clone());
    let acceptor = spawn_acceptor(state.clone(), listener);

    tracing::info!("Listening on {}", local_addr);

    Ok(ServerHandle {
        state,
        local_addr,
        scheduler,
        audit_writer,
        audit_stop,
        acceptor,
    })
}

/// Accept exactly one connection per slot, in arrival order
fn spawn_acceptor(state: Arc<AppState>, listener: TcpListener) -> JoinHandle<()> {
    tokio::spawn(async move {
        for slot in Slot::ALL {
            let (stream, peer) = loop {
                match listener.accept().await {
                    Ok(accepted) => break accepted,
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    }
                }
            };
            tracing::info!(slot = slot.index(), %peer, "Accepted connection");
            tokio::spawn(run_session(state.clone(), slot, stream, peer));
        }
        tracing::info!("All player slots taken, no longer accepting connections");
    })
}

impl ServerHandle {
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Save scores, stop the background loops and wait for the audit log to drain
    pub async fn shutdown(self) {
        tracing::info!("Shutting down");
        self.state
            .audit
            .record("Server shutting down. Saving scores and cleaning up.")
            .await;
        if let Err(e) = self.state.persist_ledger().await {
            tracing::error!("Failed to save scores on shutdown: {}", e);
        }

        self.acceptor.abort();
        self.state.begin_shutdown();

        if let Err(e) = self.scheduler.await {
            tracing::error!("Turn scheduler task failed: {}", e);
        }

        // The scheduler has recorded its last transition by now
        self.audit_stop.send_replace(true);
        if let Err(e) = self.audit_writer.await {
            tracing::error!("Audit writer task failed: {}", e);
        }
    }
}
