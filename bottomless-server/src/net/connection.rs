use std::sync::Arc;
use tokio::io::{AsyncRead, BufReader};
use tokio::net::TcpStream;

use crate::models::types::OwnerId;
use crate::net::codec::decode_client_frame;
use crate::net::frame::read_frame;
use crate::net::output::channel;
use crate::net::protocol::ClientFrame;
use crate::net::sink::ClientSink;
use crate::net::sink::tcp::TcpSink;
use crate::state::registry::Registry;

/// Drive one client connection: hello, join, actions until EOF, leave.
pub async fn handle_connection(stream: TcpStream, registry: Arc<Registry>) -> anyhow::Result<()> {
    stream.set_nodelay(true)?;
    let (r, w) = stream.into_split();
    serve(BufReader::new(r), TcpSink::new(w), registry).await
}

/// Runs a session over any reader/sink pair.
///
/// The connection ends when the client stops sending or when the writer
/// can no longer deliver syncs; either way the owner leaves.
pub async fn serve<R, C>(mut reader: R, sink: C, registry: Arc<Registry>) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    C: ClientSink + 'static,
{
    let Some(owner) = read_hello(&mut reader).await? else {
        return Ok(());
    };

    let (outlet, session_out) = channel();
    let mut writer = tokio::spawn(session_out.run(sink));
    registry.join(owner, outlet).await?;

    let result = tokio::select! {
        r = action_loop(&mut reader, &registry, owner) => r,
        w = &mut writer => {
            match w {
                Ok(Ok(())) => tracing::debug!(%owner, "session output closed"),
                Ok(Err(e)) => tracing::warn!(%owner, error = %e, "sync delivery failed, closing connection"),
                Err(e) => tracing::error!(%owner, error = %e, "writer task aborted"),
            }
            Ok(())
        }
    };

    if let Err(e) = registry.leave(owner).await {
        tracing::error!(%owner, error = %e, "failed to save store on leave");
    }
    writer.abort();
    result
}

async fn read_hello<R>(reader: &mut R) -> anyhow::Result<Option<OwnerId>>
where
    R: AsyncRead + Unpin,
{
    let Some(payload) = read_frame(reader).await? else {
        tracing::debug!("connection closed before hello");
        return Ok(None);
    };

    match decode_client_frame(&payload) {
        Ok(ClientFrame::Hello { owner }) => Ok(Some(owner)),
        Ok(ClientFrame::Action(_)) => {
            tracing::warn!("action received before hello, closing connection");
            Ok(None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "undecodable hello, closing connection");
            Ok(None)
        }
    }
}

async fn action_loop<R>(reader: &mut R, registry: &Registry, owner: OwnerId) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
{
    while let Some(payload) = read_frame(reader).await? {
        match decode_client_frame(&payload) {
            Ok(ClientFrame::Action(req)) => {
                registry.handle_action(owner, &req)?;
            }
            Ok(ClientFrame::Hello { .. }) => {
                tracing::warn!(%owner, "repeated hello ignored");
            }
            Err(e) => {
                tracing::warn!(%owner, error = %e, "dropping undecodable frame");
            }
        }
    }

    tracing::debug!(%owner, "client closed connection");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use async_trait::async_trait;
    use crate::db::repo::MemoryStoreRepo;
    use crate::net::codec::encode_client_frame;
    use crate::net::protocol::SyncMessage;
    use crate::services::StoreService;

    struct BrokenSink;

    #[async_trait]
    impl ClientSink for BrokenSink {
        async fn send_sync(&mut self, _message: &SyncMessage, _seq: u64) -> anyhow::Result<()> {
            anyhow::bail!("peer unreachable")
        }
    }

    #[tokio::test]
    async fn failed_sync_delivery_ends_the_session() {
        let registry = Arc::new(Registry::new(StoreService::new(Arc::new(MemoryStoreRepo::new()))));
        let owner = OwnerId::new();

        // the client keeps its side open and never sends anything after hello
        let (mut client, server) = tokio::io::duplex(1024);
        let hello = encode_client_frame(&ClientFrame::Hello { owner }).unwrap();
        crate::net::frame::write_frame(&mut client, &hello).await.unwrap();

        let task = tokio::spawn(serve(server, BrokenSink, registry.clone()));
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("session should end once the writer fails")
            .unwrap()
            .unwrap();

        assert!(!registry.is_online(owner));
        drop(client);
    }
}
