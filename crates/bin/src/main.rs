//! watchreg binary.
//!
//! `watchreg serve` runs the registry daemon on a Unix socket; the remaining
//! subcommands are one-shot clients of that daemon.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use watchreg_proto::RequestPayload;
use watchreg_server::{Client, ClientError, RegistryService, RetryPolicy, ServerConfig, supervise};
use watchreg_store::{Registry, Reloader};

mod cli;
mod format;

use cli::{Cli, Command};

fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();
	let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

	let payload = match cli.command {
		Command::Serve => {
			setup_tracing(cli.verbose);
			let mut config = ServerConfig::load(cli.config.as_deref()).context("loading configuration")?;
			if let Some(socket) = cli.socket {
				config.socket = socket;
			}
			runtime.block_on(serve(config))?;
			return Ok(ExitCode::SUCCESS);
		}
		Command::Lookup { text } => RequestPayload::Lookup {
			text: Command::lookup_text(&text),
		},
		Command::Replace { file } => {
			let bytes = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
			let filename = file
				.file_name()
				.map(|n| n.to_string_lossy().into_owned())
				.unwrap_or_default();
			RequestPayload::Replace { filename, bytes }
		}
		Command::Status => RequestPayload::Status,
		Command::Whoami => RequestPayload::WhoAmI,
	};

	let socket = match cli.socket {
		Some(socket) => socket,
		None => ServerConfig::load(cli.config.as_deref()).context("loading configuration")?.socket,
	};
	runtime.block_on(request(socket, payload))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
	info!("starting watchreg");

	if let Some(parent) = config.socket.parent()
		&& !parent.exists()
	{
		std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
	}
	info!(socket = %config.socket.display(), data_dir = %config.data_dir.display(), admins = config.admins.len(), "configuration loaded");
	if config.admins.is_empty() {
		tracing::warn!("no admin identities configured; table replacement is disabled");
	}

	let reloader = Arc::new(Reloader::new(Arc::new(Registry::new()), config.guard(), config.schema()).with_data_dir(config.data_dir.clone()));
	let restoring = Arc::clone(&reloader);
	let restored = tokio::task::spawn_blocking(move || restoring.restore())
		.await
		.context("restoring persisted table")?;
	if restored.is_none() {
		info!("no persisted table; waiting for an upload");
	}
	let service = RegistryService::new(reloader);

	let shutdown = CancellationToken::new();
	let signal = shutdown.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("interrupt received; shutting down");
		}
		signal.cancel();
	});

	let policy = RetryPolicy {
		backoff: config.retry_backoff(),
	};
	let restarts = supervise(policy, shutdown.clone(), || {
		watchreg_server::ipc::serve(config.socket.clone(), service.clone(), config.max_frame_bytes, shutdown.clone())
	})
	.await;

	info!(restarts, "watchreg stopped");
	Ok(())
}

/// Sends one request and prints the reply.
async fn request(socket: PathBuf, payload: RequestPayload) -> anyhow::Result<ExitCode> {
	let mut client = Client::connect(&socket)
		.await
		.with_context(|| format!("connecting to {}", socket.display()))?;

	match client.request(payload).await {
		Ok(reply) => {
			println!("{}", format::reply(&reply));
			Ok(ExitCode::SUCCESS)
		}
		Err(ClientError::Remote(err)) => {
			eprintln!("{}", format::error(&err));
			Ok(ExitCode::FAILURE)
		}
		Err(err) => Err(err.into()),
	}
}

/// Installs the global subscriber: a per-pid file under `WATCHREG_LOG_DIR` when set, stderr otherwise.
fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::prelude::*;

	let Some((log_path, file)) = open_log_file() else {
		let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
		tracing_subscriber::fmt().with_max_level(level).init();
		return;
	};

	let default_directives = if verbose { "watchreg=trace,debug" } else { "watchreg=debug,info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
	let file_layer = tracing_subscriber::fmt::layer()
		.with_writer(file)
		.with_ansi(false)
		.with_span_events(FmtSpan::CLOSE)
		.with_target(true);
	tracing_subscriber::registry().with(filter).with(file_layer).init();

	tracing::info!(path = %log_path.display(), "tracing initialized");
}

fn open_log_file() -> Option<(PathBuf, std::fs::File)> {
	let dir = PathBuf::from(std::env::var_os("WATCHREG_LOG_DIR")?);
	std::fs::create_dir_all(&dir).ok()?;
	let path = dir.join(format!("watchreg.{}.log", std::process::id()));
	let file = std::fs::OpenOptions::new().create(true).append(true).open(&path).ok()?;
	Some((path, file))
}
