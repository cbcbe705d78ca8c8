use crate::frame::Frame;
use anyhow::{bail, Result};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Connection {
            stream,
            buffer: BytesMut::with_capacity(512),
        }
    }

    /// Reads the next frame. `Ok(None)` means the peer closed the connection
    /// cleanly between frames.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some((frame, len)) = Frame::parse(&self.buffer)? {
                self.buffer.advance(len);
                return Ok(Some(frame));
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                bail!("connection reset by peer mid-frame");
            }
        }
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.stream.write_all(&frame.serialize()).await?;
        self.stream.flush().await?;

        Ok(())
    }
}
