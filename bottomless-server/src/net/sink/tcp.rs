use async_trait::async_trait;
use tokio::io::AsyncWrite;
use crate::net::codec::encode_sync_frames;
use crate::net::frame::write_frame;
use crate::net::protocol::SyncMessage;
use crate::net::sink::ClientSink;

/// Writes each sync message as length-prefixed frames, splitting syncs that
/// would not fit in one frame.
pub struct TcpSink<W> {
    writer: W,
}

impl<W> TcpSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W> ClientSink for TcpSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_sync(&mut self, message: &SyncMessage, seq: u64) -> anyhow::Result<()> {
        let frames = encode_sync_frames(message)?;
        let mut bytes = 0;
        for payload in &frames {
            write_frame(&mut self.writer, payload).await?;
            bytes += payload.len();
        }
        tracing::trace!(seq, %message, frames = frames.len(), bytes, "sync written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bottomless_core::ItemStack;
    use crate::hardening::MAX_SYNC_ENTRIES;
    use crate::net::codec::decode_sync;
    use crate::net::frame::read_frame;
    use crate::net::protocol::{SyncBody, SyncEntry};

    #[tokio::test]
    async fn oversized_sync_goes_out_as_several_frames() {
        let entries: Vec<_> = (0..MAX_SYNC_ENTRIES + 1)
            .map(|i| SyncEntry::new(ItemStack::empty(), i as u64 + 1))
            .collect();
        let msg = SyncMessage { version: 1, body: SyncBody::Full(entries) };

        let mut sink = TcpSink::new(Vec::new());
        sink.send_sync(&msg, 1).await.unwrap();

        let mut reader = &sink.writer[..];
        let mut seen = 0;
        let mut kinds = Vec::new();
        while let Some(payload) = read_frame(&mut reader).await.unwrap() {
            let part = decode_sync(&payload).unwrap();
            seen += part.entry_count();
            kinds.push(part.kind_name());
        }
        assert_eq!(seen, MAX_SYNC_ENTRIES + 1);
        assert_eq!(kinds, vec!["full", "incremental"]);
    }
}
