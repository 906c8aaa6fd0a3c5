//! Platform default locations. Environment overrides are applied by the daemon config.

use std::path::PathBuf;

const APP_DIR: &str = "watchreg";

/// Daemon socket: `$XDG_RUNTIME_DIR/watchreg.sock`, or the temp dir when there is no runtime dir.
#[must_use]
pub fn default_socket_path() -> PathBuf {
	dirs::runtime_dir()
		.unwrap_or_else(std::env::temp_dir)
		.join(format!("{APP_DIR}.sock"))
}

/// Directory holding the last accepted dataset: `$XDG_DATA_HOME/watchreg`.
#[must_use]
pub fn default_data_dir() -> PathBuf {
	dirs::data_dir().unwrap_or_else(std::env::temp_dir).join(APP_DIR)
}

/// Conventional config file, `$XDG_CONFIG_HOME/watchreg/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_namespaced() {
		assert!(default_socket_path().ends_with("watchreg.sock"));
		assert!(default_data_dir().ends_with("watchreg"));
		if let Some(path) = default_config_path() {
			assert!(path.ends_with("watchreg/config.toml"));
		}
	}
}
