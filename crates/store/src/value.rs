//! Typed cell values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One cell of a record.
///
/// Numeric cells keep the text they were written as; matching and display always
/// use that text, so "007" stays "007".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
	/// Blank cell.
	#[default]
	Empty,
	/// Whole number, e.g. the procurement type code.
	Integer { value: i64, text: String },
	/// Non-integral number.
	Float { value: f64, text: String },
	/// Anything else, trimmed.
	Text(String),
}

impl Value {
	/// Types a raw cell. Numbers are recognised only when the whole trimmed cell parses.
	pub fn from_cell(raw: &str) -> Self {
		let cell = raw.trim();
		if cell.is_empty() {
			return Self::Empty;
		}
		if let Ok(value) = cell.parse::<i64>() {
			return Self::Integer {
				value,
				text: cell.to_owned(),
			};
		}
		if let Ok(value) = cell.parse::<f64>()
			&& value.is_finite()
		{
			return Self::Float {
				value,
				text: cell.to_owned(),
			};
		}
		Self::Text(cell.to_owned())
	}

	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	/// The cell as written, trimmed. Used for matching and display.
	pub fn as_text(&self) -> &str {
		match self {
			Self::Empty => "",
			Self::Integer { text, .. } | Self::Float { text, .. } | Self::Text(text) => text,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Integer { value, .. } => Some(*value),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Integer { value, .. } => Some(*value as f64),
			Self::Float { value, .. } => Some(*value),
			_ => None,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_text())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cells_are_typed() {
		assert_eq!(Value::from_cell("  "), Value::Empty);
		assert_eq!(Value::from_cell(" 2 ").as_i64(), Some(2));
		assert_eq!(Value::from_cell("1.5").as_f64(), Some(1.5));
		assert_eq!(Value::from_cell(" Central Bridge "), Value::Text("Central Bridge".into()));
	}

	#[test]
	fn non_finite_numbers_stay_text() {
		assert_eq!(Value::from_cell("NaN"), Value::Text("NaN".into()));
		assert_eq!(Value::from_cell("inf"), Value::Text("inf".into()));
	}

	#[test]
	fn numbers_keep_their_written_form() {
		for raw in ["007", "+380", "1e3", "12.50", "-0"] {
			let value = Value::from_cell(raw);
			assert!(value.as_f64().is_some(), "{raw} should be numeric");
			assert_eq!(value.as_text(), raw);
			assert_eq!(value.to_string(), raw);
		}
		assert_eq!(Value::from_cell(" 007 ").as_i64(), Some(7));
	}

	#[test]
	fn display_is_the_cell_text() {
		assert_eq!(Value::Empty.to_string(), "");
		assert_eq!(Value::from_cell("Kyiv").as_text(), "Kyiv");
	}
}
