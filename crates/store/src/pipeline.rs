//! Validate-then-swap reload pipeline.
//!
//! # Data flow
//!
//! 1. Access guard: the requester must be privileged.
//! 2. File name: the declared extension selects the table format.
//! 3. Parse: bytes become a [`RawTable`].
//! 4. Validate: the schema re-keys the table; tables without usable rows are refused.
//! 5. Publish: [`Registry::replace`] installs the new snapshot.
//! 6. Persist: the accepted bytes are written to the data directory for restart recovery.
//!
//! Steps 1-4 are side-effect free, so any failure there leaves the registry as it was.
//! A failed persist is logged and does not undo the publish.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::guard::{AccessGuard, Identity};
use crate::registry::Registry;
use crate::schema::{Schema, SchemaError, ValidatedTable};
use crate::snapshot::Snapshot;
use crate::table::{ParseError, RawTable, TableFormat};

/// Base name of the persisted dataset inside the data directory.
const ARTIFACT_STEM: &str = "dataset";

/// Why a replacement was refused. The registry is unchanged in every case.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
	#[error("not authorized to replace the registry")]
	Unauthorized { identity: Option<Identity> },
	#[error("unsupported file {0:?}: expected a .xlsx, .xls, .csv or .tsv table")]
	UnsupportedFile(String),
	#[error("malformed table: {0}")]
	Parse(#[from] ParseError),
	#[error("{0}")]
	Schema(#[from] SchemaError),
}

impl ReloadError {
	/// Short name of the pipeline stage that refused the request, for logs.
	pub fn stage(&self) -> &'static str {
		match self {
			Self::Unauthorized { .. } => "guard",
			Self::UnsupportedFile(_) => "file",
			Self::Parse(_) => "parse",
			Self::Schema(_) => "schema",
		}
	}
}

/// Runs replacement requests against one registry.
#[derive(Debug)]
pub struct Reloader {
	registry: Arc<Registry>,
	guard: AccessGuard,
	schema: Schema,
	data_dir: Option<PathBuf>,
}

impl Reloader {
	pub fn new(registry: Arc<Registry>, guard: AccessGuard, schema: Schema) -> Self {
		Self {
			registry,
			guard,
			schema,
			data_dir: None,
		}
	}

	/// Persists accepted datasets under `dir` and restores from it in [`Reloader::restore`].
	#[must_use]
	pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.data_dir = Some(dir.into());
		self
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	pub fn guard(&self) -> &AccessGuard {
		&self.guard
	}

	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// Replaces the active dataset with the document `bytes` declared as `filename`.
	pub fn reload(&self, identity: Option<Identity>, filename: &str, bytes: &[u8]) -> Result<Arc<Snapshot>, ReloadError> {
		let result = self.authorize(identity).and_then(|()| self.prepare(filename, bytes));
		let table = match result {
			Ok(table) => table,
			Err(err) => {
				tracing::warn!(
					identity = identity.map(|i| i.0),
					file = filename,
					stage = err.stage(),
					error = %err,
					"reload refused"
				);
				return Err(err);
			}
		};

		let snap = self.registry.replace(table, Some(filename));
		if let Some(dir) = &self.data_dir
			&& let Err(err) = persist(dir, filename, bytes)
		{
			tracing::warn!(dir = %dir.display(), error = %err, "failed to persist dataset");
		}
		Ok(snap)
	}

	/// Reloads the last persisted dataset, if any. Best-effort: failures are logged and leave the registry as is.
	pub fn restore(&self) -> Option<Arc<Snapshot>> {
		let dir = self.data_dir.as_deref()?;
		let path = latest_artifact(dir)?;
		let name = path.file_name()?.to_string_lossy().into_owned();

		let bytes = match std::fs::read(&path) {
			Ok(bytes) => bytes,
			Err(err) => {
				tracing::warn!(path = %path.display(), error = %err, "cannot read persisted dataset");
				return None;
			}
		};

		match self.prepare(&name, &bytes) {
			Ok(table) => {
				let snap = self.registry.replace(table, Some(&name));
				tracing::info!(path = %path.display(), version = snap.version(), "restored persisted dataset");
				Some(snap)
			}
			Err(err) => {
				tracing::warn!(path = %path.display(), stage = err.stage(), error = %err, "persisted dataset rejected");
				None
			}
		}
	}

	fn authorize(&self, identity: Option<Identity>) -> Result<(), ReloadError> {
		if self.guard.is_authorized(identity) {
			Ok(())
		} else {
			Err(ReloadError::Unauthorized { identity })
		}
	}

	fn prepare(&self, filename: &str, bytes: &[u8]) -> Result<ValidatedTable, ReloadError> {
		let format = TableFormat::from_filename(filename).ok_or_else(|| ReloadError::UnsupportedFile(filename.to_owned()))?;
		let raw = RawTable::parse(bytes, format)?;
		let table = self.schema.validate(raw)?;
		if table.is_empty() {
			return Err(ParseError::NoRecords.into());
		}
		Ok(table)
	}
}

fn artifact_path(dir: &Path, format: TableFormat) -> PathBuf {
	dir.join(format!("{ARTIFACT_STEM}.{}", format.extension()))
}

/// Atomically writes `bytes` as the persisted dataset and drops artifacts of the other format.
fn persist(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
	let Some(format) = TableFormat::from_filename(filename) else {
		return Ok(());
	};
	std::fs::create_dir_all(dir)?;

	let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
	tmp.write_all(bytes)?;
	tmp.as_file().sync_all()?;
	let target = artifact_path(dir, format);
	tmp.persist(&target).map_err(|e| e.error)?;

	for other in TableFormat::ALL {
		let path = artifact_path(dir, other);
		if path != target
			&& let Err(err) = std::fs::remove_file(&path)
			&& err.kind() != std::io::ErrorKind::NotFound
		{
			return Err(err);
		}
	}
	tracing::debug!(path = %target.display(), bytes = bytes.len(), "dataset persisted");
	Ok(())
}

/// Most recently written artifact in `dir`.
fn latest_artifact(dir: &Path) -> Option<PathBuf> {
	TableFormat::ALL
		.into_iter()
		.map(|f| artifact_path(dir, f))
		.filter_map(|p| {
			let modified = std::fs::metadata(&p).and_then(|m| m.modified()).ok()?;
			Some((modified, p))
		})
		.max_by_key(|(modified, _)| *modified)
		.map(|(_, p)| p)
}
