//! IPC server for watchreg clients.
//!
//! Each connection is its own task. The requester's identity is the peer uid
//! reported by the kernel for the Unix socket; it is absent when unavailable.

use std::future::Future;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use watchreg_proto::{ErrorPayload, FrameError, IpcFrame, RequestId, Response, read_frame, write_frame};
use watchreg_store::Identity;

use crate::service::RegistryService;
use crate::transport::TransportError;

/// Serve clients on a Unix domain socket until `shutdown` fires.
///
/// # Errors
///
/// Returns a transient [`TransportError`] if the socket cannot be bound or
/// accepting fails; the caller is expected to retry after a backoff.
pub async fn serve(
	socket_path: impl AsRef<Path>,
	service: RegistryService,
	max_frame: usize,
	shutdown: CancellationToken,
) -> Result<(), TransportError> {
	// Remove existing socket file
	let path = socket_path.as_ref();
	if path.exists() {
		tokio::fs::remove_file(path).await?;
	}

	let listener = UnixListener::bind(path)?;
	tracing::info!(path = %path.display(), "IPC server listening");

	let listener = &listener;
	let result = accept_loop(
		move || async move {
			let (stream, _addr) = listener.accept().await?;
			let identity = peer_identity(&stream);
			Ok::<_, std::io::Error>((stream, identity))
		},
		service,
		max_frame,
		&shutdown,
	)
	.await;

	if let Err(e) = std::fs::remove_file(path) {
		tracing::debug!(error = %e, "socket cleanup skipped");
	}
	result
}

/// Spawns a connection task per accepted stream. A failed accept ends the loop
/// instead of retrying in place.
async fn accept_loop<A, Fut, S>(
	mut accept: A,
	service: RegistryService,
	max_frame: usize,
	shutdown: &CancellationToken,
) -> Result<(), TransportError>
where
	A: FnMut() -> Fut,
	Fut: Future<Output = std::io::Result<(S, Option<Identity>)>>,
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	loop {
		tokio::select! {
			_ = shutdown.cancelled() => {
				tracing::info!("IPC server shutting down");
				return Ok(());
			}
			res = accept() => {
				let (stream, identity) = res.inspect_err(|e| tracing::error!(error = %e, "Failed to accept connection"))?;
				tokio::spawn(handle_connection(stream, identity, service.clone(), max_frame));
			}
		}
	}
}

fn peer_identity(stream: &UnixStream) -> Option<Identity> {
	match stream.peer_cred() {
		Ok(cred) => Some(Identity(u64::from(cred.uid()))),
		Err(e) => {
			tracing::warn!(error = %e, "peer credentials unavailable; treating connection as anonymous");
			None
		}
	}
}

/// Handle a single connection: one response per request, until the peer hangs up.
pub async fn handle_connection<S>(stream: S, identity: Option<Identity>, service: RegistryService, max_frame: usize)
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	tracing::debug!(identity = identity.map(|i| i.0), "connection opened");
	let (mut reader, mut writer) = tokio::io::split(stream);

	loop {
		let (request_id, result) = match read_frame(&mut reader, max_frame).await {
			Ok(IpcFrame::Request(req)) => {
				let result = service.handle(identity, req.payload).await;
				(req.id, result)
			}
			Ok(IpcFrame::Response(_)) => (RequestId(0), Err(ErrorPayload::Protocol("unexpected response frame".into()))),
			Err(e) if e.is_eof() => break,
			Err(e @ FrameError::Codec(_)) => (RequestId(0), Err(ErrorPayload::Protocol(e.to_string()))),
			Err(e) => {
				// Oversized or broken stream: the rest of the stream cannot be framed.
				tracing::warn!(error = %e, "dropping connection");
				let reply = error_frame(RequestId(0), ErrorPayload::Protocol(e.to_string()));
				let _ = write_frame(&mut writer, &reply, max_frame).await;
				break;
			}
		};

		let frame = match result {
			Ok(payload) => IpcFrame::Response(Response {
				request_id,
				payload: Some(payload),
				error: None,
			}),
			Err(err) => error_frame(request_id, err),
		};
		if let Err(e) = write_frame(&mut writer, &frame, max_frame).await {
			tracing::warn!(error = %e, "failed to send response");
			break;
		}
	}

	tracing::debug!(identity = identity.map(|i| i.0), "connection closed");
}

fn error_frame(request_id: RequestId, error: ErrorPayload) -> IpcFrame {
	IpcFrame::Response(Response {
		request_id,
		payload: None,
		error: Some(error),
	})
}
