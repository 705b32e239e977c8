use anyhow::Context;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use crate::models::types::OwnerId;
use crate::net::codec::{decode_sync, encode_client_frame};
use crate::net::frame::{read_frame, write_frame};
use crate::net::protocol::{ActionRequest, ClientFrame, SyncMessage};

/// Client end of a server connection.
pub struct ClientLink {
    owner: OwnerId,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ClientLink {
    /// Connect and introduce ourselves as `owner`.
    pub async fn connect(addr: impl ToSocketAddrs, owner: OwnerId) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("connecting to server")?;
        stream.set_nodelay(true)?;
        let (r, w) = stream.into_split();

        let mut link = Self {
            owner,
            reader: BufReader::new(r),
            writer: w,
        };
        link.send(&ClientFrame::Hello { owner }).await?;
        Ok(link)
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub async fn send_action(&mut self, req: &ActionRequest) -> anyhow::Result<()> {
        self.send(&ClientFrame::Action(req.clone())).await
    }

    /// Next sync from the server, or `None` once the server closed the connection.
    pub async fn next_sync(&mut self) -> anyhow::Result<Option<SyncMessage>> {
        match read_frame(&mut self.reader).await? {
            Some(payload) => Ok(Some(decode_sync(&payload)?)),
            None => Ok(None),
        }
    }

    async fn send(&mut self, frame: &ClientFrame) -> anyhow::Result<()> {
        let payload = encode_client_frame(frame)?;
        write_frame(&mut self.writer, &payload).await?;
        Ok(())
    }
}
