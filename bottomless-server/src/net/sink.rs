pub mod tcp;

use crate::net::protocol::SyncMessage;
use async_trait::async_trait;

#[async_trait]
pub trait ClientSink: Send {
    async fn send_sync(&mut self, message: &SyncMessage, seq: u64) -> anyhow::Result<()>;
}
