//! Audit log: a bounded queue of game events drained by one writer task.
//!
//! Producers wait when the queue is full rather than drop, and the writer
//! drains whatever is left once it is told to stop, so every recorded event
//! reaches the file on a graceful stop.

use chrono::{DateTime, Local};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl AuditEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            message: message.into(),
        }
    }

    /// `YYYY-MM-DD HH:MM:SS | <event>`
    pub fn to_line(&self) -> String {
        format!("{} | {}\n", self.at.format("%Y-%m-%d %H:%M:%S"), self.message)
    }
}

/// Producer side, cheap to clone
#[derive(Debug, Clone)]
pub struct AuditLog {
    tx: mpsc::Sender<AuditEntry>,
}

pub type AuditReceiver = mpsc::Receiver<AuditEntry>;

pub fn channel(capacity: usize) -> (AuditLog, AuditReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (AuditLog { tx }, rx)
}

impl AuditLog {
    pub async fn record(&self, message: impl Into<String>) {
        let entry = AuditEntry::new(message);
        tracing::debug!(target: "audit", "{}", entry.message);
        if self.tx.send(entry).await.is_err() {
            tracing::warn!("Audit writer has stopped, event not recorded");
        }
    }
}

/// Spawn the task that appends queued entries to `file`.
///
/// It runs until `stop` is raised or every `AuditLog` is dropped, then writes
/// whatever is still queued. Dropping the `stop` sender without raising it
/// leaves the writer running.
pub fn spawn_audit_writer(
    mut rx: AuditReceiver,
    mut file: File,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stop_open = true;
        loop {
            tokio::select! {
                biased;
                entry = rx.recv() => match entry {
                    Some(entry) => write_entry(&mut file, &entry).await,
                    None => break,
                },
                changed = stop.changed(), if stop_open => match changed {
                    Ok(()) if *stop.borrow() => break,
                    Ok(()) => {}
                    Err(_) => stop_open = false,
                },
            }
        }

        while let Ok(entry) = rx.try_recv() {
            write_entry(&mut file, &entry).await;
        }
        tracing::debug!("Audit writer stopped");
    })
}

async fn write_entry(file: &mut File, entry: &AuditEntry) {
    let line = entry.to_line();
    let result = async {
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = result {
        tracing::error!("Failed to write audit log entry: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_append(path: &std::path::Path) -> File {
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .unwrap()
    }

    #[test]
    fn test_entry_line_format() {
        let entry = AuditEntry::new("Player 1 connected as 'Ann'.");
        let line = entry.to_line();
        assert!(line.ends_with(" | Player 1 connected as 'Ann'.\n"));
        // "YYYY-MM-DD HH:MM:SS" is 19 characters
        assert_eq!(&line[19..22], " | ");
    }

    #[tokio::test]
    async fn test_writer_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");
        std::fs::write(&path, "earlier line\n").unwrap();

        let (log, rx) = channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let writer = spawn_audit_writer(rx, open_append(&path).await, shutdown_rx);

        log.record("first").await;
        log.record("second").await;
        shutdown_tx.send(true).unwrap();
        writer.await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "earlier line");
        assert!(lines[1].ends_with("| first"));
        assert!(lines[2].ends_with("| second"));
    }

    #[tokio::test]
    async fn test_shutdown_drains_backlog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");

        let (log, rx) = channel(64);
        for i in 0..50 {
            log.record(format!("event {}", i)).await;
        }

        // Shutdown is raised before the writer ever runs
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();
        let writer = spawn_audit_writer(rx, open_append(&path).await, shutdown_rx);
        writer.await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 50);
        assert!(contents.lines().last().unwrap().ends_with("| event 49"));
    }

    #[tokio::test]
    async fn test_writer_outlives_dropped_stop_sender() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");

        let (log, rx) = channel(4);
        let (stop_tx, stop_rx) = watch::channel(false);
        let writer = spawn_audit_writer(rx, open_append(&path).await, stop_rx);
        drop(stop_tx);
        tokio::task::yield_now().await;

        log.record("after stop sender dropped").await;
        drop(log);
        writer.await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with("| after stop sender dropped\n"));
    }

    #[tokio::test]
    async fn test_writer_stops_when_all_producers_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");

        let (log, rx) = channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let writer = spawn_audit_writer(rx, open_append(&path).await, shutdown_rx);

        log.record("only").await;
        drop(log);
        writer.await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with("| only\n"));
    }
}
