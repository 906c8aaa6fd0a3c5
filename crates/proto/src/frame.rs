//! Length-prefixed postcard framing.
//!
//! Each frame is a little-endian `u32` byte length followed by a postcard-encoded [`IpcFrame`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::IpcFrame;

/// Default upper bound on a single frame, large enough for a sizeable spreadsheet export.
pub const DEFAULT_MAX_FRAME: usize = 32 * 1024 * 1024;

/// Framing failure.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
	/// The underlying stream failed or closed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	/// Declared or encoded length is over the configured limit.
	#[error("frame of {len} bytes exceeds limit of {max}")]
	TooLarge {
		/// Frame length in bytes.
		len: usize,
		/// Configured limit.
		max: usize,
	},
	/// The body is not a valid postcard [`IpcFrame`].
	#[error("undecodable frame: {0}")]
	Codec(#[from] postcard::Error),
}

impl FrameError {
	/// True when the peer closed the stream cleanly between frames.
	pub fn is_eof(&self) -> bool {
		matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
	}
}

/// Writes one frame and flushes.
pub async fn write_frame<W>(writer: &mut W, frame: &IpcFrame, max: usize) -> Result<(), FrameError>
where
	W: AsyncWrite + Unpin,
{
	let buf = postcard::to_allocvec(frame)?;
	if buf.len() > max {
		return Err(FrameError::TooLarge { len: buf.len(), max });
	}
	let len = u32::try_from(buf.len()).map_err(|_| FrameError::TooLarge { len: buf.len(), max })?;
	writer.write_u32_le(len).await?;
	writer.write_all(&buf).await?;
	writer.flush().await?;
	Ok(())
}

/// Reads one frame. Oversized frames are refused before their body is read.
pub async fn read_frame<R>(reader: &mut R, max: usize) -> Result<IpcFrame, FrameError>
where
	R: AsyncRead + Unpin,
{
	let len = reader.read_u32_le().await? as usize;
	if len > max {
		return Err(FrameError::TooLarge { len, max });
	}
	let mut buf = vec![0u8; len];
	reader.read_exact(&mut buf).await?;
	Ok(postcard::from_bytes(&buf)?)
}
