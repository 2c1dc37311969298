//! Newline-delimited text over one player's TCP stream

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::SessionError;
use crate::protocol::ServerMessage;
use crate::types::MAX_LINE_LEN;

pub struct LineReader<R = OwnedReadHalf> {
    inner: BufReader<R>,
    /// Bytes of the line read so far, kept across cancelled calls
    partial: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            partial: Vec::new(),
        }
    }

    /// Next line with any carriage return stripped. Cancel safe.
    ///
    /// End of stream is `SessionError::Closed`; a line longer than
    /// `MAX_LINE_LEN` bytes is `SessionError::LineTooLong`.
    pub async fn next_line(&mut self) -> Result<String, SessionError> {
        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                return Err(SessionError::Closed);
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = &available[..newline.unwrap_or(available.len())];
            if self.partial.len() + chunk.len() > MAX_LINE_LEN {
                self.partial.clear();
                return Err(SessionError::LineTooLong { limit: MAX_LINE_LEN });
            }
            self.partial.extend_from_slice(chunk);

            let used = newline.map_or(available.len(), |i| i + 1);
            self.inner.consume(used);

            if newline.is_some() {
                let line = String::from_utf8_lossy(&self.partial).replace('\r', "");
                self.partial.clear();
                return Ok(line);
            }
        }
    }
}

pub struct LineWriter<W = OwnedWriteHalf> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn send(&mut self, msg: &ServerMessage) -> Result<(), SessionError> {
        let mut line = msg.to_string();
        line.push('\n');
        self.inner.write_all(line.as_bytes()).await?;
        Ok(())
    }

    pub async fn send_all(
        &mut self,
        msgs: impl IntoIterator<Item = ServerMessage>,
    ) -> Result<(), SessionError> {
        for msg in msgs {
            self.send(&msg).await?;
        }
        Ok(())
    }
}
