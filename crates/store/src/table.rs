//! Raw tabular documents as uploaded, before schema validation.
//!
//! Spreadsheets are read with `calamine` (first worksheet, first row is the header);
//! delimited text with `csv`. Both end up as the same [`RawTable`].

use std::fmt::Display;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Reader, Xls, Xlsx, open_workbook_from_rs};

use crate::value::Value;

/// Format of an uploaded document, chosen by its declared extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
	Csv,
	Tsv,
	/// Office Open XML workbook.
	Xlsx,
	/// Legacy binary workbook.
	Xls,
}

impl TableFormat {
	/// Picks the format from a declared file name. Returns `None` for unsupported extensions.
	pub fn from_filename(name: &str) -> Option<Self> {
		let ext = Path::new(name.trim()).extension()?.to_str()?;
		if ext.eq_ignore_ascii_case("csv") {
			Some(Self::Csv)
		} else if ext.eq_ignore_ascii_case("tsv") {
			Some(Self::Tsv)
		} else if ext.eq_ignore_ascii_case("xlsx") {
			Some(Self::Xlsx)
		} else if ext.eq_ignore_ascii_case("xls") {
			Some(Self::Xls)
		} else {
			None
		}
	}

	/// File extension used when persisting a document of this format.
	pub fn extension(self) -> &'static str {
		match self {
			Self::Csv => "csv",
			Self::Tsv => "tsv",
			Self::Xlsx => "xlsx",
			Self::Xls => "xls",
		}
	}

	pub const ALL: [Self; 4] = [Self::Csv, Self::Tsv, Self::Xlsx, Self::Xls];
}

/// Failure to read an uploaded document as a table.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error("document has no header row")]
	MissingHeader,
	#[error("row {row}: {message}")]
	Malformed { row: u64, message: String },
	#[error("document is not a table: {0}")]
	Unreadable(String),
	#[error("document has no rows with an object name")]
	NoRecords,
}

impl From<csv::Error> for ParseError {
	fn from(err: csv::Error) -> Self {
		match err.position() {
			Some(pos) => Self::Malformed {
				row: pos.record(),
				message: describe(&err),
			},
			None => Self::Unreadable(err.to_string()),
		}
	}
}

fn unreadable(err: impl Display) -> ParseError {
	ParseError::Unreadable(err.to_string())
}

fn describe(err: &csv::Error) -> String {
	match err.kind() {
		csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
			format!("expected {expected_len} fields, found {len}")
		}
		csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8 in field {}", err.field()),
		_ => err.to_string(),
	}
}

/// A parsed document: header names as written and typed rows of equal width.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
	pub columns: Vec<String>,
	pub rows: Vec<Vec<Value>>,
}

impl RawTable {
	/// Parses an uploaded document.
	pub fn parse(bytes: &[u8], format: TableFormat) -> Result<Self, ParseError> {
		match format {
			TableFormat::Csv => Self::parse_delimited(bytes, b','),
			TableFormat::Tsv => Self::parse_delimited(bytes, b'\t'),
			TableFormat::Xlsx => Self::parse_workbook(open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes)).map_err(unreadable)?),
			TableFormat::Xls => Self::parse_workbook(open_workbook_from_rs::<Xls<_>, _>(Cursor::new(bytes)).map_err(unreadable)?),
		}
	}

	/// Reads the first worksheet. Numeric cells take their spreadsheet rendering ("1", "2.5").
	fn parse_workbook<RS, W>(mut workbook: W) -> Result<Self, ParseError>
	where
		RS: Read + Seek,
		W: Reader<RS>,
		W::Error: Display,
	{
		let range = workbook
			.worksheet_range_at(0)
			.ok_or(ParseError::MissingHeader)?
			.map_err(unreadable)?;

		let mut rows = range.rows();
		let columns: Vec<String> = match rows.next() {
			Some(header) => header.iter().map(ToString::to_string).collect(),
			None => return Err(ParseError::MissingHeader),
		};
		if columns.iter().all(|c| c.trim().is_empty()) {
			return Err(ParseError::MissingHeader);
		}

		let rows = rows
			.map(|row| row.iter().map(|cell| Value::from_cell(&cell.to_string())).collect())
			.collect();
		Ok(Self { columns, rows })
	}

	/// Parses delimited text. Ragged rows and non-UTF-8 content are errors.
	fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<Self, ParseError> {
		let mut reader = csv::ReaderBuilder::new()
			.delimiter(delimiter)
			.has_headers(true)
			.flexible(false)
			.from_reader(bytes);

		let columns: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
		if columns.iter().all(|c| c.trim().is_empty()) {
			return Err(ParseError::MissingHeader);
		}

		let mut rows = Vec::new();
		for record in reader.records() {
			let record = record?;
			rows.push(record.iter().map(Value::from_cell).collect());
		}

		Ok(Self { columns, rows })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn format_follows_extension() {
		assert_eq!(TableFormat::from_filename("monitoring.CSV"), Some(TableFormat::Csv));
		assert_eq!(TableFormat::from_filename("monitoring.tsv"), Some(TableFormat::Tsv));
		assert_eq!(TableFormat::from_filename("monitoring.xlsx"), Some(TableFormat::Xlsx));
		assert_eq!(TableFormat::from_filename("Monitoring.XLS"), Some(TableFormat::Xls));
		assert_eq!(TableFormat::from_filename("monitoring.ods"), None);
		assert_eq!(TableFormat::from_filename("monitoring"), None);
	}

	#[test]
	fn parses_header_and_typed_rows() {
		let table = RawTable::parse(b"name,code\nBridge,1\nSchool,\n", TableFormat::Csv).unwrap();
		assert_eq!(table.columns, vec!["name", "code"]);
		assert_eq!(
			table.rows,
			vec![
				vec![Value::Text("Bridge".into()), Value::from_cell("1")],
				vec![Value::Text("School".into()), Value::Empty],
			]
		);
	}

	#[test]
	fn tab_separated() {
		let table = RawTable::parse(b"a\tb\nx, y\t2\n", TableFormat::Tsv).unwrap();
		assert_eq!(table.rows[0][0], Value::Text("x, y".into()));
	}

	#[test]
	fn ragged_row_is_malformed() {
		let err = RawTable::parse(b"a,b\n1,2\n3\n", TableFormat::Csv).unwrap_err();
		assert!(matches!(err, ParseError::Malformed { .. }), "{err:?}");
	}

	#[test]
	fn binary_payload_is_rejected() {
		let err = RawTable::parse(b"a,b\n\xff\xfe,1\n", TableFormat::Csv).unwrap_err();
		assert!(matches!(err, ParseError::Malformed { .. } | ParseError::Unreadable(_)), "{err:?}");
	}

	fn workbook(rows: &[&[&str]]) -> Vec<u8> {
		let mut book = rust_xlsxwriter::Workbook::new();
		let sheet = book.add_worksheet();
		for (r, row) in rows.iter().enumerate() {
			for (c, cell) in row.iter().enumerate() {
				let (r, c) = (r as u32, c as u16);
				match cell.parse::<f64>() {
					Ok(n) => sheet.write_number(r, c, n).unwrap(),
					Err(_) => sheet.write_string(r, c, *cell).unwrap(),
				};
			}
		}
		book.save_to_buffer().unwrap()
	}

	#[test]
	fn reads_first_worksheet_of_xlsx() {
		let bytes = workbook(&[
			&["Обʼєкт", "Область", "Конкурс (1 – відновлення, 2 закупівлі)", "Хто здійснює моніторинг"],
			&["Центральний міст", "Київська", "1", "ГО Варта"],
			&["Школа №5", "Львівська", "2", ""],
		]);

		let table = RawTable::parse(&bytes, TableFormat::Xlsx).unwrap();
		assert_eq!(table.columns[0], "Обʼєкт");
		assert_eq!(table.rows.len(), 2);
		assert_eq!(table.rows[0][0], Value::Text("Центральний міст".into()));
		assert_eq!(table.rows[0][2].as_i64(), Some(1));
		assert_eq!(table.rows[0][2].as_text(), "1");
		assert_eq!(table.rows[1][3], Value::Empty);
	}

	#[test]
	fn malformed_workbook_is_unreadable() {
		let err = RawTable::parse(b"PK\x03\x04 definitely not a zip archive", TableFormat::Xlsx).unwrap_err();
		assert!(matches!(err, ParseError::Unreadable(_)), "{err:?}");

		let err = RawTable::parse(b"a,b\n1,2\n", TableFormat::Xls).unwrap_err();
		assert!(matches!(err, ParseError::Unreadable(_)), "{err:?}");
	}

	#[test]
	fn empty_document_has_no_header() {
		let err = RawTable::parse(b"", TableFormat::Csv).unwrap_err();
		assert!(matches!(err, ParseError::MissingHeader), "{err:?}");
	}
}
