//! Atomic-snapshot registry of monitored objects.
//!
//! # Purpose
//!
//! Answer "is this object already monitored, and by whom?" over a dataset that an
//! operator replaces wholesale at runtime, without any lookup ever seeing a
//! half-replaced dataset.
//!
//! # Mental model
//!
//! * An uploaded table is parsed, validated against a [`Schema`] and frozen into a [`Snapshot`].
//! * The [`Registry`] holds exactly one active snapshot behind an `ArcSwap`.
//! * Lookups load the active snapshot once and search that immutable view.
//! * The [`Reloader`] is the only write path: guard, parse, validate, then swap.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`Schema`] | Required column slots | First slot is the searched field | [`Schema::monitoring`] |
//! | [`Snapshot`] | Immutable versioned table | Never mutated after publish | [`Registry::replace`] |
//! | [`Registry`] | Active snapshot holder | Publishes via CAS; versions strictly increase | [`Registry::replace`] |
//! | [`Matches`] | Lookup result | Pins its snapshot; at most [`MATCH_LIMIT`] rows | [`search`] |
//! | [`AccessGuard`] | Privileged identity set | Fail-closed | [`AccessGuard::new`] |
//! | [`Reloader`] | Replacement pipeline | No registry change unless every stage passes | [`Reloader::reload`] |
//!
//! # Failure modes & recovery
//!
//! * Unprivileged requester: [`ReloadError::Unauthorized`], nothing else runs.
//! * Malformed document: [`ReloadError::Parse`]; missing columns: [`ReloadError::Schema`].
//! * Lookup before the first load: [`QueryError::StoreEmpty`], distinct from a miss.
//! * Unreadable persisted dataset at startup: logged, registry stays empty.

pub mod fold;
pub mod guard;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod schema;
pub mod snapshot;
pub mod table;
pub mod value;

#[cfg(test)]
mod invariants;

pub use guard::{AccessGuard, Identity};
pub use pipeline::{ReloadError, Reloader};
pub use query::{MATCH_LIMIT, Matches, QueryError, lookup, search};
pub use registry::{Registry, Status};
pub use schema::{Schema, SchemaError, Slot, ValidatedTable};
pub use snapshot::{Record, Snapshot};
pub use table::{ParseError, RawTable, TableFormat};
pub use value::Value;
