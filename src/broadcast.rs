//! Per-player outbound queues for messages caused by other players' actions.
//!
//! Enqueueing never waits: a full or closed queue drops the message. Each
//! queue is drained only by the session task that owns that slot's socket.

use crate::protocol::ServerMessage;
use crate::types::{Slot, PLAYER_SLOTS};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;

pub struct Mailboxes {
    senders: [mpsc::Sender<ServerMessage>; PLAYER_SLOTS],
    inboxes: Mutex<[Option<Inbox>; PLAYER_SLOTS]>,
}

/// Receiving end of one slot's queue
pub struct Inbox {
    rx: mpsc::Receiver<ServerMessage>,
}

impl Mailboxes {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx0, rx0) = mpsc::channel(capacity);
        let (tx1, rx1) = mpsc::channel(capacity);
        let (tx2, rx2) = mpsc::channel(capacity);
        let inbox = |rx| Some(Inbox { rx });
        Self {
            senders: [tx0, tx1, tx2],
            inboxes: Mutex::new([inbox(rx0), inbox(rx1), inbox(rx2)]),
        }
    }

    /// Queue `msg` for `slot` without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, slot: Slot, msg: ServerMessage) -> bool {
        match self.senders[slot.index()].try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                tracing::warn!(slot = slot.index(), "Outbound queue full, dropping: {}", msg);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Queue `msg` for every slot except `except`
    pub fn enqueue_others(&self, except: Slot, msg: &ServerMessage) {
        for slot in Slot::ALL.into_iter().filter(|&s| s != except) {
            self.enqueue(slot, msg.clone());
        }
    }

    /// Hand a slot's receiving end to its session. Each inbox can be taken once.
    pub async fn take_inbox(&self, slot: Slot) -> Option<Inbox> {
        self.inboxes.lock().await[slot.index()].take()
    }
}

impl Inbox {
    /// Wait for the next queued message
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.rx.recv().await
    }

    /// Everything currently queued, in send order
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut pending = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            pending.push(msg);
        }
        pending
    }
}
