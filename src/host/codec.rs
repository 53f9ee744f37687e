use std::io::ErrorKind;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Browsers never send more than this in one message.
pub const MAX_INCOMING_FRAME: u32 = 64 * 1024 * 1024;

/// Browsers refuse host messages above this size.
pub const MAX_OUTGOING_FRAME: usize = 1024 * 1024;

/// Reads one native-messaging frame: a little-endian `u32` length followed by the payload.
/// Returns `None` once the browser closed the stream between frames.
pub async fn read_frame(reader: &mut (impl AsyncRead + Unpin)) -> Result<Option<Vec<u8>>> {
    let length = match reader.read_u32_le().await {
        Ok(length) => length,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if length > MAX_INCOMING_FRAME {
        bail!("Incoming frame of {length} bytes exceeds {MAX_INCOMING_FRAME}");
    }

    let mut payload = vec![0; length as usize];
    reader
        .read_exact(&mut payload)
        .await
        .with_context(|| format!("Stream ended inside a {length} byte frame"))?;
    Ok(Some(payload))
}

pub async fn write_frame(writer: &mut (impl AsyncWrite + Unpin), payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_OUTGOING_FRAME {
        bail!(
            "Outgoing frame of {} bytes exceeds {MAX_OUTGOING_FRAME}",
            payload.len()
        );
    }
    writer.write_u32_le(payload.len() as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_message<T: Serialize>(
    writer: &mut (impl AsyncWrite + Unpin),
    message: &T,
) -> Result<()> {
    let payload = serde_json::to_vec(message)?;
    write_frame(writer, &payload).await
}
