//! Line framing over the worker pipes.
//!
//! - Reads: one `\n`-terminated line => `Response` (decode failure is fatal
//!   to the reader task)
//! - Writes: one encoded request line, flushed before the next one starts

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use deltabot_core::error::Result;
use deltabot_core::protocol::rpc::{decode_response, Response};

/// Read the next response. `Ok(None)` means end-of-stream.
pub async fn read_response<R>(reader: &mut R, line: &mut String) -> Result<Option<Response>>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    if reader.read_line(line).await? == 0 {
        return Ok(None);
    }
    tracing::trace!(line = %line.trim_end(), "recv");
    decode_response(line).map(Some)
}

/// Write one already-encoded line.
pub async fn write_line<W>(writer: &mut W, line: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    tracing::trace!(line = %line.trim_end(), "send");
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
