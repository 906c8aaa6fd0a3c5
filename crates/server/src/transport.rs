//! Transport supervision: re-establish a failed listener after a fixed backoff.
//!
//! Connectivity failures belong to the transport, not the registry. They are
//! logged and retried forever; only shutdown ends the loop.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// A connectivity failure of the transport. Always retried.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
	#[error("transport failure: {0}")]
	Transient(#[from] std::io::Error),
}

/// Fixed-delay, unbounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub backoff: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			backoff: Duration::from_secs(10),
		}
	}
}

/// Runs `run` until it returns `Ok` or `shutdown` fires, sleeping `policy.backoff` between failed attempts.
///
/// Returns the number of restarts performed.
pub async fn supervise<F, Fut>(policy: RetryPolicy, shutdown: CancellationToken, mut run: F) -> usize
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<(), TransportError>>,
{
	let mut restarts = 0;
	loop {
		let outcome = tokio::select! {
			_ = shutdown.cancelled() => return restarts,
			outcome = run() => outcome,
		};

		match outcome {
			Ok(()) => return restarts,
			Err(err) => {
				tracing::warn!(
					error = %err,
					backoff_secs = policy.backoff.as_secs(),
					restarts,
					"transport failed; retrying after backoff"
				);
			}
		}

		tokio::select! {
			_ = shutdown.cancelled() => return restarts,
			_ = tokio::time::sleep(policy.backoff) => {}
		}
		restarts += 1;
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use tokio::time::Instant;

	use super::*;

	fn flaky(failures: usize, calls: Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<Result<(), TransportError>> {
		move || {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			std::future::ready(if n < failures {
				Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset).into())
			} else {
				Ok(())
			})
		}
	}

	#[tokio::test(flavor = "current_thread", start_paused = true)]
	async fn retries_with_fixed_backoff() {
		let calls = Arc::new(AtomicUsize::new(0));
		let started = Instant::now();

		let restarts = supervise(RetryPolicy::default(), CancellationToken::new(), flaky(3, calls.clone())).await;

		assert_eq!(restarts, 3);
		assert_eq!(calls.load(Ordering::SeqCst), 4);
		assert_eq!(started.elapsed(), Duration::from_secs(30));
	}

	#[tokio::test(flavor = "current_thread", start_paused = true)]
	async fn shutdown_interrupts_backoff() {
		let calls = Arc::new(AtomicUsize::new(0));
		let shutdown = CancellationToken::new();
		let task = tokio::spawn(supervise(
			RetryPolicy {
				backoff: Duration::from_secs(10),
			},
			shutdown.clone(),
			flaky(usize::MAX, calls.clone()),
		));

		// First attempt fails immediately; each advance releases one backoff.
		tokio::task::yield_now().await;
		for step in [10, 10, 5] {
			tokio::time::advance(Duration::from_secs(step)).await;
			tokio::task::yield_now().await;
		}
		shutdown.cancel();

		let restarts = task.await.unwrap();
		assert_eq!(restarts, 2);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}
}
