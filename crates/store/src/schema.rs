//! Required column set and the validator that re-keys raw tables onto it.
//!
//! # Matching rule
//!
//! Every column name and keyword is folded with [`fold_key`]. A column qualifies
//! for a slot when its folded name equals the slot identifier or a keyword, or
//! contains a keyword. Columns are considered in any order, but each slot must end
//! up with exactly one column and no column may serve two slots.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::fold::fold_key;
use crate::table::RawTable;
use crate::value::Value;

/// Identifier of the object-name slot; lookups match against this column.
pub const OBJECT_NAME: &str = "object_name";
pub const REGION: &str = "region";
pub const PROCUREMENT_TYPE: &str = "procurement_type";
pub const MONITORING_ASSIGNEE: &str = "monitoring_assignee";

/// One required column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
	/// Canonical identifier the column is re-keyed to.
	pub id: String,
	/// Keyword tokens a header may contain to fill this slot.
	pub keywords: Vec<String>,
}

impl Slot {
	/// Folds `keywords`; blank ones are dropped so they can never match a blank header.
	pub fn new(id: impl Into<String>, keywords: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
		Self {
			id: id.into(),
			keywords: keywords
				.into_iter()
				.map(|k| fold_key(k.as_ref()))
				.filter(|k| !k.is_empty())
				.collect(),
		}
	}

	fn accepts(&self, folded_column: &str) -> bool {
		folded_column == self.id
			|| self
				.keywords
				.iter()
				.any(|k| !k.is_empty() && folded_column.contains(k.as_str()))
	}
}

/// Ordered set of required columns. The first slot is the primary (searched) field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
	slots: Vec<Slot>,
}

impl Default for Schema {
	fn default() -> Self {
		Self::monitoring()
	}
}

impl Schema {
	/// Builds a schema. The first slot becomes the primary field.
	///
	/// # Panics
	///
	/// Panics if `slots` is empty.
	pub fn new(slots: Vec<Slot>) -> Self {
		assert!(!slots.is_empty(), "schema needs at least one slot");
		Self { slots }
	}

	/// The object monitoring register: object name, region, procurement type, monitoring assignee.
	pub fn monitoring() -> Self {
		Self::new(vec![
			Slot::new(OBJECT_NAME, ["обʼєкт", "object"]),
			Slot::new(REGION, ["область", "region", "oblast"]),
			Slot::new(PROCUREMENT_TYPE, ["конкурс", "procurement", "tender"]),
			Slot::new(MONITORING_ASSIGNEE, ["моніторинг", "monitoring", "assignee"]),
		])
	}

	pub fn slots(&self) -> &[Slot] {
		&self.slots
	}

	/// Canonical identifiers in slot order.
	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.slots.iter().map(|s| s.id.as_str())
	}

	pub fn primary(&self) -> &str {
		&self.slots[0].id
	}

	/// Resolves every slot against `raw.columns` and re-keys the rows onto the canonical identifiers.
	///
	/// Rows with an empty primary field are dropped.
	pub fn validate(&self, raw: RawTable) -> Result<ValidatedTable, SchemaError> {
		let folded: Vec<String> = raw.columns.iter().map(|c| fold_key(c)).collect();

		let mut missing = Vec::new();
		let mut ambiguous = Vec::new();
		let mut positions = Vec::with_capacity(self.slots.len());

		for slot in &self.slots {
			let exact: Vec<usize> = folded
				.iter()
				.enumerate()
				.filter(|(_, c)| **c == slot.id || slot.keywords.iter().any(|k| k == *c))
				.map(|(i, _)| i)
				.collect();
			let candidates: Vec<usize> = if exact.is_empty() {
				folded
					.iter()
					.enumerate()
					.filter(|(_, c)| slot.accepts(c))
					.map(|(i, _)| i)
					.collect()
			} else {
				exact
			};
			match candidates.as_slice() {
				[] => missing.push(slot.id.clone()),
				[only] => positions.push(*only),
				_ => ambiguous.push(slot.id.clone()),
			}
		}

		if missing.is_empty() && ambiguous.is_empty() {
			for (i, slot) in self.slots.iter().enumerate() {
				if positions[..i].contains(&positions[i]) {
					ambiguous.push(slot.id.clone());
				}
			}
		}

		if !missing.is_empty() || !ambiguous.is_empty() {
			return Err(SchemaError {
				missing,
				ambiguous,
				observed: raw.columns,
			});
		}

		let primary = positions[0];
		let rows = raw
			.rows
			.into_iter()
			.filter(|row| row.get(primary).is_some_and(|v| !v.is_empty()))
			.map(|mut row| {
				positions
					.iter()
					.map(|&p| row.get_mut(p).map(std::mem::take).unwrap_or_default())
					.collect()
			})
			.collect();

		Ok(ValidatedTable {
			columns: self.ids().map(Into::into).collect(),
			rows,
		})
	}
}

/// A table re-keyed onto a schema: columns are canonical identifiers in slot order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
	pub(crate) columns: Arc<[Box<str>]>,
	pub(crate) rows: Vec<Box<[Value]>>,
}

impl ValidatedTable {
	pub fn columns(&self) -> &[Box<str>] {
		&self.columns
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}

/// A parsed table whose headers do not satisfy the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
	/// Slots no column qualified for.
	pub missing: Vec<String>,
	/// Slots more than one column qualified for, or sharing a column with another slot.
	pub ambiguous: Vec<String>,
	/// Column names exactly as written in the document.
	pub observed: Vec<String>,
}

impl fmt::Display for SchemaError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("required columns not resolved")?;
		if !self.missing.is_empty() {
			write!(f, "; missing: {}", self.missing.join(", "))?;
		}
		if !self.ambiguous.is_empty() {
			write!(f, "; ambiguous: {}", self.ambiguous.join(", "))?;
		}
		write!(f, "; observed columns: [{}]", self.observed.join(", "))
	}
}

impl std::error::Error for SchemaError {}
