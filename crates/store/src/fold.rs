//! Text folding shared by column matching and lookups.
//!
//! Spreadsheets exported from different tools spell the same header in
//! different ways: composed vs decomposed Cyrillic, three flavours of
//! apostrophe, a stray byte-order mark. Everything that compares text
//! in this crate goes through [`fold_text`] so those variants compare equal.

use unicode_normalization::UnicodeNormalization;

/// Apostrophe look-alikes collapsed to ASCII `'`.
const APOSTROPHES: &[char] = &['\u{02BC}', '\u{2019}', '\u{2018}', '\u{02B9}', '`', '\u{00B4}'];

/// Case-folds `s` under NFKC with apostrophe variants unified.
///
/// Does not trim; callers that want trimming use [`fold_key`].
pub fn fold_text(s: &str) -> String {
	s.nfkc()
		.map(|c| if APOSTROPHES.contains(&c) { '\'' } else { c })
		.flat_map(char::to_lowercase)
		.collect()
}

/// Folds a column name or query: strips BOM and surrounding whitespace, then [`fold_text`].
pub fn fold_key(s: &str) -> String {
	fold_text(s.trim_start_matches('\u{FEFF}').trim())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn apostrophe_variants_fold_together() {
		assert_eq!(fold_key("Обʼєкт"), fold_key("Об'єкт"));
		assert_eq!(fold_key("Об’єкт"), "об'єкт");
	}

	#[test]
	fn decomposed_and_composed_forms_fold_together() {
		// "й" as a single code point vs "и" + combining breve.
		assert_eq!(fold_text("\u{0439}"), fold_text("\u{0438}\u{0306}"));
	}

	#[test]
	fn key_strips_bom_and_whitespace() {
		assert_eq!(fold_key("\u{FEFF}  Region \t"), "region");
	}

	#[test]
	fn text_keeps_inner_whitespace() {
		assert_eq!(fold_text(" Central  Bridge "), " central  bridge ");
	}
}
