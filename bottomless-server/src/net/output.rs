use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use crate::net::protocol::SyncMessage;
use crate::net::sink::ClientSink;

/// A sync message queued for one connection.
#[derive(Debug, Clone)]
pub struct OutEvent {
    /// Per-session sequence number, used for logging
    pub seq: u64,
    pub message: SyncMessage,
}

/// Fire-and-forget sender for sync messages.
///
/// Backed by an unbounded channel so sending never blocks the action path.
/// Order is preserved per outlet.
#[derive(Clone, Debug)]
pub struct SyncOutlet {
    /// Sender for output events
    tx: mpsc::UnboundedSender<OutEvent>,
    /// Next sequence number for outgoing messages
    next_seq: Arc<AtomicU64>,
}

impl SyncOutlet {
    pub fn new(tx: mpsc::UnboundedSender<OutEvent>) -> Self {
        Self {
            tx,
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    #[inline]
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn send(&self, message: SyncMessage) {
        let seq = self.next_seq();
        tracing::trace!(seq, %message, "queueing sync");
        if self.tx.send(OutEvent { seq, message }).is_err() {
            tracing::debug!(seq, "sync outlet closed, message dropped");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half; drained by the connection's writer task.
pub struct SessionOut {
    rx: mpsc::UnboundedReceiver<OutEvent>,
}

impl SessionOut {
    pub fn new(rx: mpsc::UnboundedReceiver<OutEvent>) -> Self {
        Self { rx }
    }

    pub async fn recv(&mut self) -> Option<OutEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<OutEvent> {
        self.rx.try_recv().ok()
    }

    /// Forward every queued message to the sink until all outlets are dropped.
    pub async fn run<C>(mut self, mut client: C) -> anyhow::Result<()>
    where
        C: ClientSink,
    {
        while let Some(event) = self.rx.recv().await {
            client.send_sync(&event.message, event.seq).await?;
        }

        Ok(())
    }
}

pub fn channel() -> (SyncOutlet, SessionOut) {
    let (tx, rx) = mpsc::unbounded_channel::<OutEvent>();
    (SyncOutlet::new(tx), SessionOut::new(rx))
}
