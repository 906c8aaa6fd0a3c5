//! Daemon configuration: optional TOML file plus environment overrides.
//!
//! Errors here are the only fatal ones; the binary exits instead of running degraded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use watchreg_proto::paths;
use watchreg_store::schema::{MONITORING_ASSIGNEE, OBJECT_NAME, PROCUREMENT_TYPE, REGION};
use watchreg_store::{AccessGuard, Identity, Schema, Slot};

/// Environment variable holding comma-separated privileged identities.
pub const ADMIN_IDS_ENV: &str = "WATCHREG_ADMIN_IDS";
pub const SOCKET_ENV: &str = "WATCHREG_SOCKET";
pub const DATA_DIR_ENV: &str = "WATCHREG_DATA_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	/// Error parsing TOML syntax or shape.
	#[error("config parse error in {path}: {error}")]
	Toml { path: PathBuf, error: toml::de::Error },

	/// An admin identity is not a non-negative integer.
	#[error("invalid admin id {0:?} (expected a number)")]
	InvalidAdminId(String),

	/// A value is out of range.
	#[error("invalid config: {0}")]
	Invalid(String),
}

/// Keyword overrides for the required columns. Unset slots keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
	pub object_name: Option<Vec<String>>,
	pub region: Option<Vec<String>>,
	pub procurement_type: Option<Vec<String>>,
	pub monitoring_assignee: Option<Vec<String>>,
}

/// Daemon settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
	/// Unix socket the daemon listens on.
	pub socket: PathBuf,
	/// Directory for the persisted dataset.
	pub data_dir: PathBuf,
	/// Identities allowed to replace the dataset.
	pub admins: Vec<u64>,
	/// Fixed delay before re-establishing a failed listener.
	pub retry_backoff_secs: u64,
	/// Largest accepted IPC frame.
	pub max_frame_bytes: usize,
	pub schema: SchemaConfig,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			socket: paths::default_socket_path(),
			data_dir: paths::default_data_dir(),
			admins: Vec::new(),
			retry_backoff_secs: 10,
			max_frame_bytes: watchreg_proto::DEFAULT_MAX_FRAME,
			schema: SchemaConfig::default(),
		}
	}
}

impl ServerConfig {
	/// Loads `path` (or the default config file when it exists), then applies environment overrides.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let file = match path {
			Some(p) => Some(p.to_path_buf()),
			None => paths::default_config_path().filter(|p| p.is_file()),
		};

		let mut config = match file {
			Some(p) => Self::from_file(&p)?,
			None => Self::default(),
		};
		config.apply_overrides(|key| std::env::var(key).ok())?;
		config.check()?;
		Ok(config)
	}

	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		toml::from_str(&text).map_err(|error| ConfigError::Toml {
			path: path.to_path_buf(),
			error,
		})
	}

	/// Applies `WATCHREG_*` overrides looked up through `var`.
	pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
		if let Some(ids) = var(ADMIN_IDS_ENV) {
			self.admins = parse_admin_ids(&ids)?;
		}
		if let Some(socket) = var(SOCKET_ENV).filter(|s| !s.is_empty()) {
			self.socket = PathBuf::from(socket);
		}
		if let Some(dir) = var(DATA_DIR_ENV).filter(|s| !s.is_empty()) {
			self.data_dir = PathBuf::from(dir);
		}
		Ok(())
	}

	fn check(&self) -> Result<(), ConfigError> {
		if self.retry_backoff_secs == 0 {
			return Err(ConfigError::Invalid("retry_backoff_secs must be at least 1".into()));
		}
		if self.max_frame_bytes == 0 || u32::try_from(self.max_frame_bytes).is_err() {
			return Err(ConfigError::Invalid(format!(
				"max_frame_bytes must be between 1 and {}",
				u32::MAX
			)));
		}
		for (slot, keywords) in self.schema.overrides() {
			if keywords.iter().all(|k| k.trim().is_empty()) {
				return Err(ConfigError::Invalid(format!("schema.{slot} needs at least one keyword")));
			}
		}
		Ok(())
	}

	pub fn guard(&self) -> AccessGuard {
		AccessGuard::new(self.admins.iter().copied().map(Identity))
	}

	pub fn schema(&self) -> Schema {
		let defaults = Schema::monitoring();
		let slots = defaults
			.slots()
			.iter()
			.map(|slot| match self.schema.get(&slot.id) {
				Some(keywords) => Slot::new(slot.id.clone(), keywords),
				None => slot.clone(),
			})
			.collect();
		Schema::new(slots)
	}

	pub fn retry_backoff(&self) -> Duration {
		Duration::from_secs(self.retry_backoff_secs)
	}
}

impl SchemaConfig {
	fn get(&self, slot: &str) -> Option<&Vec<String>> {
		match slot {
			OBJECT_NAME => self.object_name.as_ref(),
			REGION => self.region.as_ref(),
			PROCUREMENT_TYPE => self.procurement_type.as_ref(),
			MONITORING_ASSIGNEE => self.monitoring_assignee.as_ref(),
			_ => None,
		}
	}

	fn overrides(&self) -> impl Iterator<Item = (&'static str, &Vec<String>)> {
		[OBJECT_NAME, REGION, PROCUREMENT_TYPE, MONITORING_ASSIGNEE]
			.into_iter()
			.filter_map(|slot| Some((slot, self.get(slot)?)))
	}
}

/// Parses a comma-separated identity list. Blank entries are skipped; anything else must be numeric.
pub fn parse_admin_ids(raw: &str) -> Result<Vec<u64>, ConfigError> {
	raw.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(|s| s.parse::<u64>().map_err(|_| ConfigError::InvalidAdminId(s.to_owned())))
		.collect()
}
