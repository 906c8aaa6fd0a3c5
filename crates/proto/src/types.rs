//! Wire types for the watchreg IPC protocol.
//!
//! Requests come from clients (the CLI, chat adapters); the daemon answers each with
//! exactly one [`Response`] carrying the same [`RequestId`].

use serde::{Deserialize, Serialize};
use watchreg_store::{Identity, Value};

/// Unique identifier for requests and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Classification of frames transmitted over the IPC socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IpcFrame {
	/// A request initiated by a client.
	Request(Request),
	/// The daemon's answer to a request.
	Response(Response),
}

/// A request from a client to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request identifier for correlation.
	pub id: RequestId,
	/// The request payload.
	pub payload: RequestPayload,
}

/// Request payload variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RequestPayload {
	/// Connectivity check.
	Ping,
	/// Find records whose object name contains `text`.
	Lookup {
		/// Free-form query text.
		text: String,
	},
	/// Replace the whole dataset with an uploaded table.
	Replace {
		/// Declared file name; its extension selects the table format.
		filename: String,
		/// Raw document bytes.
		bytes: Vec<u8>,
	},
	/// Report whether a dataset is loaded.
	Status,
	/// Echo the identity the daemon sees for this connection.
	WhoAmI,
}

/// A response from the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Corresponding request identifier.
	pub request_id: RequestId,
	/// The response payload, absent on error.
	pub payload: Option<ResponsePayload>,
	/// Failure description, if the request failed.
	pub error: Option<ErrorPayload>,
}

/// Response payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponsePayload {
	/// Reply to Ping.
	Pong,
	/// Lookup result. An empty list means the dataset is loaded but nothing matched.
	Matches {
		/// Snapshot version the matches were read from.
		version: u64,
		/// At most three records, in dataset order.
		records: Vec<WireRecord>,
	},
	/// The dataset was replaced.
	Replaced {
		/// Version of the newly active snapshot.
		version: u64,
		/// Number of records it holds.
		records: usize,
	},
	/// Registry summary.
	Status {
		/// Whether a non-empty dataset is active.
		loaded: bool,
		/// Active snapshot version, 0 before the first load.
		version: u64,
		/// Number of records in the active snapshot.
		records: usize,
	},
	/// Identity of the requesting connection, if the transport could establish one.
	Identity {
		/// Peer identity.
		id: Option<Identity>,
	},
}

/// One record as `(column, value)` pairs in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
	/// Canonical column identifiers paired with their values.
	pub fields: Vec<(String, Value)>,
}

impl WireRecord {
	/// Value of `column`, if present.
	pub fn get(&self, column: &str) -> Option<&Value> {
		self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
	}
}

/// Why a request failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorPayload {
	/// No dataset has been loaded yet.
	StoreEmpty,
	/// The requester may not replace the dataset.
	Unauthorized,
	/// The declared file name has an unsupported extension.
	UnsupportedFile(String),
	/// The document could not be read as a table.
	Parse(String),
	/// The table lacks required columns.
	Schema {
		/// Required columns that were not found.
		missing: Vec<String>,
		/// Required columns matched by more than one header.
		ambiguous: Vec<String>,
		/// Header names as written in the document.
		observed: Vec<String>,
	},
	/// The request was not understood.
	Protocol(String),
}

impl std::fmt::Display for ErrorPayload {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::StoreEmpty => f.write_str("dataset not loaded"),
			Self::Unauthorized => f.write_str("not authorized"),
			Self::UnsupportedFile(name) => write!(f, "unsupported file: {name}"),
			Self::Parse(msg) => write!(f, "malformed table: {msg}"),
			Self::Schema { missing, ambiguous, observed } => {
				write!(f, "required columns not resolved")?;
				if !missing.is_empty() {
					write!(f, "; missing: {}", missing.join(", "))?;
				}
				if !ambiguous.is_empty() {
					write!(f, "; ambiguous: {}", ambiguous.join(", "))?;
				}
				write!(f, "; observed columns: [{}]", observed.join(", "))
			}
			Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
		}
	}
}
