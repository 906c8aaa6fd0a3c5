//! Human-readable replies, in the wording monitoring volunteers already know.

use watchreg_proto::{ErrorPayload, ResponsePayload, WireRecord};
use watchreg_store::schema::{MONITORING_ASSIGNEE, OBJECT_NAME, PROCUREMENT_TYPE, REGION};

const LABELS: [(&str, &str); 4] = [
	(OBJECT_NAME, "🏗 Обʼєкт"),
	(REGION, "📍 Область"),
	(PROCUREMENT_TYPE, "🏛 Конкурс"),
	(MONITORING_ASSIGNEE, "👀 Моніторинг"),
];

pub const NOT_FOUND: &str = "❌ Обʼєкт не знайдено в таблиці.";
pub const NOT_LOADED: &str = "⚠️ База не завантажена. Надішліть Excel-файл або таблицю .csv/.tsv.";

/// Renders a successful reply.
pub fn reply(payload: &ResponsePayload) -> String {
	match payload {
		ResponsePayload::Pong => "pong".to_owned(),
		ResponsePayload::Matches { records, .. } => matches(records),
		ResponsePayload::Replaced { version, records } => {
			format!("✅ Таблиця успішно завантажена | Записів: {records} | Версія: {version}")
		}
		ResponsePayload::Status { loaded, version, records } => {
			let state = if *loaded { "✅ Завантажено" } else { "❌ Не завантажено" };
			format!("📊 Стан таблиці: {state} | Записів: {records} | Версія: {version}")
		}
		ResponsePayload::Identity { id: Some(id) } => format!("🆔 Ваш ID: {id}"),
		ResponsePayload::Identity { id: None } => "🆔 Ідентифікатор недоступний".to_owned(),
	}
}

/// Renders a refusal from the daemon.
pub fn error(err: &ErrorPayload) -> String {
	match err {
		ErrorPayload::StoreEmpty => NOT_LOADED.to_owned(),
		ErrorPayload::Unauthorized => "⛔ Лише адміністратори можуть оновлювати таблицю.".to_owned(),
		other => format!("❌ {other}"),
	}
}

fn matches(records: &[WireRecord]) -> String {
	if records.is_empty() {
		return NOT_FOUND.to_owned();
	}
	let blocks: Vec<String> = records.iter().map(record).collect();
	format!("🔍 Знайдено:\n\n{}", blocks.join("\n\n"))
}

fn record(rec: &WireRecord) -> String {
	LABELS
		.iter()
		.map(|(column, label)| {
			let value = rec.get(column).map(ToString::to_string).unwrap_or_default();
			format!("{label}: {value}")
		})
		.collect::<Vec<_>>()
		.join("\n")
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use watchreg_store::{Identity, Value};

	use super::*;

	fn bridge() -> WireRecord {
		WireRecord {
			fields: vec![
				(OBJECT_NAME.into(), Value::Text("Центральний міст".into())),
				(REGION.into(), Value::Text("Київська".into())),
				(PROCUREMENT_TYPE.into(), Value::from_cell("1")),
				(MONITORING_ASSIGNEE.into(), Value::Text("ГО Варта".into())),
			],
		}
	}

	#[test]
	fn found_lists_every_field() {
		let out = reply(&ResponsePayload::Matches {
			version: 1,
			records: vec![bridge()],
		});
		assert_eq!(
			out,
			"🔍 Знайдено:\n\n🏗 Обʼєкт: Центральний міст\n📍 Область: Київська\n🏛 Конкурс: 1\n👀 Моніторинг: ГО Варта"
		);
	}

	#[test]
	fn records_are_separated_by_blank_lines() {
		let out = reply(&ResponsePayload::Matches {
			version: 1,
			records: vec![bridge(), bridge()],
		});
		assert_eq!(out.matches("🏗").count(), 2);
		assert!(out.contains("ГО Варта\n\n🏗 Обʼєкт"));
	}

	#[test]
	fn miss_and_empty_store_read_differently() {
		let miss = reply(&ResponsePayload::Matches {
			version: 3,
			records: vec![],
		});
		assert_eq!(miss, NOT_FOUND);
		assert_eq!(error(&ErrorPayload::StoreEmpty), NOT_LOADED);
	}

	#[test]
	fn status_and_identity() {
		assert_eq!(
			reply(&ResponsePayload::Status {
				loaded: false,
				version: 0,
				records: 0
			}),
			"📊 Стан таблиці: ❌ Не завантажено | Записів: 0 | Версія: 0"
		);
		assert_eq!(reply(&ResponsePayload::Identity { id: Some(Identity(1000)) }), "🆔 Ваш ID: 1000");
	}

	#[test]
	fn schema_error_names_missing_columns() {
		let out = error(&ErrorPayload::Schema {
			missing: vec!["region".into()],
			ambiguous: vec![],
			observed: vec!["Обʼєкт".into()],
		});
		assert!(out.contains("missing: region"));
		assert!(out.contains("[Обʼєкт]"));
	}
}
