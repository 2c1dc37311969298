//! Server settings read from the environment

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Persisted win counts, one line per guesser slot
    pub score_path: PathBuf,
    /// Append-only audit log
    pub audit_log_path: PathBuf,
    /// How often the turn scheduler looks at the session when not kicked
    pub poll_interval: Duration,
    /// Per-player outbound queue bound; overflow is dropped
    pub outbox_capacity: usize,
    /// Audit queue bound; producers wait when it is full
    pub audit_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            score_path: PathBuf::from("scores.txt"),
            audit_log_path: PathBuf::from("game.log"),
            poll_interval: Duration::from_millis(10),
            outbox_capacity: 256,
            audit_capacity: 1024,
        }
    }
}

impl ServerConfig {
    /// Load config from WORDDUEL_* environment variables, keeping defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let score_path = env_path("WORDDUEL_SCORE_FILE").unwrap_or(defaults.score_path);
        let audit_log_path = env_path("WORDDUEL_AUDIT_LOG").unwrap_or(defaults.audit_log_path);

        let poll_interval = env_positive("WORDDUEL_POLL_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);
        let outbox_capacity = env_positive("WORDDUEL_OUTBOX_CAPACITY")
            .map(|v| v as usize)
            .unwrap_or(defaults.outbox_capacity);
        let audit_capacity = env_positive("WORDDUEL_AUDIT_CAPACITY")
            .map(|v| v as usize)
            .unwrap_or(defaults.audit_capacity);

        tracing::info!(
            score_path = %score_path.display(),
            audit_log_path = %audit_log_path.display(),
            poll_ms = poll_interval.as_millis() as u64,
            outbox_capacity,
            audit_capacity,
            "Server config loaded"
        );

        Self {
            score_path,
            audit_log_path,
            poll_interval,
            outbox_capacity,
            audit_capacity,
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// A strictly positive integer, or `None` (with a warning when the value is bad)
fn env_positive(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            tracing::warn!("{} must be a positive integer, ignoring {:?}", key, raw);
            None
        }
    }
}
