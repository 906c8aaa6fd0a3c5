//! Minimal request/response client for the daemon socket.

use std::path::Path;

use tokio::net::UnixStream;
use watchreg_proto::{DEFAULT_MAX_FRAME, ErrorPayload, FrameError, IpcFrame, Request, RequestId, RequestPayload, ResponsePayload, read_frame, write_frame};

/// Client-side failure.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
	#[error(transparent)]
	Frame(#[from] FrameError),
	/// The daemon answered with an error.
	#[error("{0}")]
	Remote(ErrorPayload),
	#[error("protocol violation: {0}")]
	Protocol(&'static str),
}

/// One connection to the daemon. Requests are sent one at a time.
#[derive(Debug)]
pub struct Client {
	stream: UnixStream,
	next_id: u64,
	max_frame: usize,
}

impl Client {
	pub async fn connect(path: impl AsRef<Path>) -> Result<Self, ClientError> {
		let stream = UnixStream::connect(path).await.map_err(FrameError::from)?;
		Ok(Self::from_stream(stream))
	}

	pub fn from_stream(stream: UnixStream) -> Self {
		Self {
			stream,
			next_id: 1,
			max_frame: DEFAULT_MAX_FRAME,
		}
	}

	pub fn with_max_frame(mut self, max_frame: usize) -> Self {
		self.max_frame = max_frame;
		self
	}

	/// Sends `payload` and waits for the matching response.
	pub async fn request(&mut self, payload: RequestPayload) -> Result<ResponsePayload, ClientError> {
		let id = RequestId(self.next_id);
		self.next_id += 1;

		let frame = IpcFrame::Request(Request { id, payload });
		write_frame(&mut self.stream, &frame, self.max_frame).await?;

		let IpcFrame::Response(resp) = read_frame(&mut self.stream, self.max_frame).await? else {
			return Err(ClientError::Protocol("daemon sent a request frame"));
		};
		// Id 0 marks a connection-level error the daemon could not attribute to a request.
		if resp.request_id != id && !(resp.request_id == RequestId(0) && resp.error.is_some()) {
			return Err(ClientError::Protocol("response id does not match request"));
		}
		match (resp.payload, resp.error) {
			(_, Some(err)) => Err(ClientError::Remote(err)),
			(Some(payload), None) => Ok(payload),
			(None, None) => Err(ClientError::Protocol("empty response")),
		}
	}
}
