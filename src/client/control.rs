//! Client side of the control plane.

use crate::error::{Error, Result};
use crate::protocol::{expect_line, Command, HELLO, OK};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

/// A control connection that has been greeted by the server.
///
/// Requests are strictly synchronous: each one waits for its reply before
/// the next can be issued.
pub struct ControlClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: String,
}

impl ControlClient {
    /// Connect to `addr` and require the `HELLO` greeting.
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| Error::Connect {
                addr: addr.to_string(),
                source,
            })?;
        let (reader, writer) = stream.into_split();
        let mut client = ControlClient {
            reader: BufReader::new(reader),
            writer,
            line: String::new(),
        };

        let greeting = client.read_line().await?;
        expect_line(&greeting, HELLO)?;
        Ok(client)
    }

    /// Send `cmd` and require an `OK` reply.
    pub async fn request(&mut self, cmd: Command) -> Result<()> {
        self.writer.write_all(&cmd.request()).await?;
        let reply = self.read_line().await?;
        debug!(command = cmd.as_str(), reply = reply.trim(), "Control reply");
        expect_line(&reply, OK)
    }

    /// Close the write side; the server sees EOF.
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line).await?;
        if n == 0 {
            return Err(Error::Closed);
        }
        Ok(self.line.clone())
    }
}
