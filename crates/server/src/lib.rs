//! watchreg daemon library.
//!
//! Wires the registry from `watchreg-store` to a Unix socket:
//!
//! * [`config`]: TOML file plus `WATCHREG_*` environment overrides.
//! * [`service`]: maps wire requests onto registry operations.
//! * [`ipc`]: per-connection framing with peer-uid identity.
//! * [`transport`]: restarts a failed listener after a fixed backoff.
//! * [`client`]: request/response client used by the CLI.

pub mod client;
pub mod config;
pub mod ipc;
pub mod service;
pub mod transport;

pub use client::{Client, ClientError};
pub use config::{ConfigError, ServerConfig};
pub use service::RegistryService;
pub use transport::{RetryPolicy, TransportError, supervise};
pub use watchreg_proto as proto;
