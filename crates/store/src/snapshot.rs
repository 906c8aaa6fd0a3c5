//! Immutable published registry state.
//!
//! # Role
//!
//! Pure view types: a [`Snapshot`] is built once by [`crate::Registry::replace`] and
//! never mutated afterwards. Readers hold it through an `Arc`.

use std::sync::Arc;

use crate::fold::fold_text;
use crate::schema::ValidatedTable;
use crate::value::Value;

/// One row of the dataset, keyed by canonical column identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	columns: Arc<[Box<str>]>,
	values: Box<[Value]>,
	/// Folded primary field, precomputed for lookups.
	pub(crate) key: Box<str>,
}

impl Record {
	fn new(columns: Arc<[Box<str>]>, values: Box<[Value]>) -> Self {
		let key = values.first().map(|v| fold_text(v.as_text())).unwrap_or_default().into_boxed_str();
		Self { columns, values, key }
	}

	/// Value of the column with canonical identifier `column`.
	pub fn get(&self, column: &str) -> Option<&Value> {
		let idx = self.columns.iter().position(|c| &**c == column)?;
		self.values.get(idx)
	}

	/// The primary (searched) field.
	pub fn primary(&self) -> &Value {
		&self.values[0]
	}

	/// `(column, value)` pairs in schema order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.columns.iter().map(|c| &**c).zip(self.values.iter())
	}

	pub fn values(&self) -> &[Value] {
		&self.values
	}
}

/// Single source of truth for lookups at one point in time.
#[derive(Debug)]
pub struct Snapshot {
	version: u64,
	columns: Arc<[Box<str>]>,
	records: Arc<[Record]>,
	source: Option<Arc<str>>,
}

impl Snapshot {
	/// The state every registry starts in: version 0, no columns, no records.
	pub fn empty() -> Self {
		Self {
			version: 0,
			columns: Arc::from(Vec::new()),
			records: Arc::from(Vec::new()),
			source: None,
		}
	}

	pub(crate) fn build(version: u64, table: ValidatedTable, source: Option<Arc<str>>) -> Self {
		let ValidatedTable { columns, rows } = table;
		let records = rows.into_iter().map(|values| Record::new(columns.clone(), values)).collect();
		Self {
			version,
			columns,
			records,
			source,
		}
	}

	/// Same contents under another version; used when a publish attempt loses a race.
	pub(crate) fn with_version(&self, version: u64) -> Self {
		Self {
			version,
			columns: self.columns.clone(),
			records: self.records.clone(),
			source: self.source.clone(),
		}
	}

	pub fn version(&self) -> u64 {
		self.version
	}

	/// Canonical column identifiers, empty for the initial snapshot.
	pub fn columns(&self) -> &[Box<str>] {
		&self.columns
	}

	pub fn records(&self) -> &[Record] {
		&self.records
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// True for the initial snapshot. Published snapshots always hold at least one record.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Declared file name of the document this snapshot was loaded from.
	pub fn source(&self) -> Option<&str> {
		self.source.as_deref()
	}
}
