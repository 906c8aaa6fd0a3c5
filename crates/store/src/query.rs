//! Substring lookup over a snapshot.
//!
//! Matching is containment of the folded query in the folded object name.
//! Results keep the snapshot's row order and stop at [`MATCH_LIMIT`]; there is no scoring.

use std::sync::Arc;

use crate::fold::fold_key;
use crate::registry::Registry;
use crate::snapshot::{Record, Snapshot};

/// Maximum number of records returned by one lookup.
pub const MATCH_LIMIT: usize = 3;

/// A lookup against a registry that has never been loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
	#[error("registry is not loaded yet")]
	StoreEmpty,
}

/// Lookup result pinned to the snapshot it was computed from.
#[derive(Debug, Clone)]
pub struct Matches {
	snap: Arc<Snapshot>,
	hits: Vec<usize>,
}

impl Matches {
	/// Version of the snapshot the matches came from.
	pub fn version(&self) -> u64 {
		self.snap.version()
	}

	pub fn len(&self) -> usize {
		self.hits.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hits.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
		self.hits.iter().map(|&i| &self.snap.records()[i])
	}

	pub fn snapshot(&self) -> &Arc<Snapshot> {
		&self.snap
	}
}

/// Runs `query` against `snap`.
///
/// The empty query matches every record. Searching the empty snapshot yields no matches;
/// use [`lookup`] to tell that apart from a miss.
pub fn search(snap: &Arc<Snapshot>, query: &str) -> Matches {
	let needle = fold_key(query);
	let hits = snap
		.records()
		.iter()
		.enumerate()
		.filter(|(_, r)| r.key.contains(needle.as_str()))
		.map(|(i, _)| i)
		.take(MATCH_LIMIT)
		.collect();
	Matches { snap: snap.clone(), hits }
}

/// Loads the active snapshot once and searches it.
pub fn lookup(registry: &Registry, query: &str) -> Result<Matches, QueryError> {
	let snap = registry.current();
	if snap.is_empty() {
		return Err(QueryError::StoreEmpty);
	}
	let matches = search(&snap, query);
	tracing::debug!(version = snap.version(), hits = matches.len(), "lookup");
	Ok(matches)
}
