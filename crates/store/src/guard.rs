//! Privilege check for dataset replacement.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric identity of a requester as asserted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(pub u64);

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Fixed set of identities allowed to replace the dataset.
///
/// Fail-closed: an absent identity is always denied and an empty set admits nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessGuard {
	privileged: BTreeSet<Identity>,
}

impl AccessGuard {
	pub fn new(privileged: impl IntoIterator<Item = Identity>) -> Self {
		Self {
			privileged: privileged.into_iter().collect(),
		}
	}

	pub fn is_authorized(&self, identity: Option<Identity>) -> bool {
		identity.is_some_and(|id| self.privileged.contains(&id))
	}

	pub fn len(&self) -> usize {
		self.privileged.len()
	}

	pub fn is_empty(&self) -> bool {
		self.privileged.is_empty()
	}
}
