//! Request dispatch from wire payloads to the registry.

use std::sync::Arc;

use watchreg_proto::{ErrorPayload, RequestPayload, ResponsePayload, WireRecord};
use watchreg_store::{Identity, Matches, QueryError, Record, ReloadError, Reloader, lookup};

/// Answers requests against one registry. Cheap to clone; shared by every connection.
#[derive(Debug, Clone)]
pub struct RegistryService {
	reloader: Arc<Reloader>,
}

impl RegistryService {
	pub fn new(reloader: Arc<Reloader>) -> Self {
		Self { reloader }
	}

	pub fn reloader(&self) -> &Arc<Reloader> {
		&self.reloader
	}

	/// Handles one request on behalf of `identity`. Never touches the registry on error.
	///
	/// Replacement parses and persists the upload on the blocking pool; everything else
	/// is an in-memory snapshot read.
	pub async fn handle(&self, identity: Option<Identity>, payload: RequestPayload) -> Result<ResponsePayload, ErrorPayload> {
		match payload {
			RequestPayload::Ping => Ok(ResponsePayload::Pong),
			RequestPayload::Lookup { text } => {
				let matches = lookup(self.reloader.registry(), &text).map_err(query_error)?;
				Ok(matches_payload(&matches))
			}
			RequestPayload::Replace { filename, bytes } => {
				tracing::info!(
					identity = identity.map(|i| i.0),
					file = %filename,
					bytes = bytes.len(),
					"replacement requested"
				);
				let reloader = Arc::clone(&self.reloader);
				let snap = tokio::task::spawn_blocking(move || reloader.reload(identity, &filename, &bytes))
					.await
					.map_err(|e| {
						tracing::error!(error = %e, "reload task failed");
						ErrorPayload::Protocol("reload task failed".into())
					})?
					.map_err(reload_error)?;
				Ok(ResponsePayload::Replaced {
					version: snap.version(),
					records: snap.len(),
				})
			}
			RequestPayload::Status => {
				let status = self.reloader.registry().status();
				Ok(ResponsePayload::Status {
					loaded: status.loaded,
					version: status.version,
					records: status.records,
				})
			}
			RequestPayload::WhoAmI => Ok(ResponsePayload::Identity { id: identity }),
		}
	}
}

fn matches_payload(matches: &Matches) -> ResponsePayload {
	ResponsePayload::Matches {
		version: matches.version(),
		records: matches.iter().map(wire_record).collect(),
	}
}

fn wire_record(record: &Record) -> WireRecord {
	WireRecord {
		fields: record.iter().map(|(c, v)| (c.to_owned(), v.clone())).collect(),
	}
}

fn query_error(err: QueryError) -> ErrorPayload {
	match err {
		QueryError::StoreEmpty => ErrorPayload::StoreEmpty,
	}
}

fn reload_error(err: ReloadError) -> ErrorPayload {
	match err {
		ReloadError::Unauthorized { .. } => ErrorPayload::Unauthorized,
		ReloadError::UnsupportedFile(name) => ErrorPayload::UnsupportedFile(name),
		ReloadError::Parse(e) => ErrorPayload::Parse(e.to_string()),
		ReloadError::Schema(e) => ErrorPayload::Schema {
			missing: e.missing,
			ambiguous: e.ambiguous,
			observed: e.observed,
		},
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use watchreg_store::schema::{MONITORING_ASSIGNEE, REGION};
	use watchreg_store::{AccessGuard, Registry, Schema, Value};

	use super::*;

	const ADMIN: Identity = Identity(500);
	const DATASET: &[u8] = "Обʼєкт,Область,Конкурс,Хто здійснює моніторинг\n\
		Центральний міст,Київська,1,ГО Варта\n\
		Школа №5,Львівська,2,ГО Варта\n"
		.as_bytes();

	fn service() -> RegistryService {
		let reloader = Reloader::new(Arc::new(Registry::new()), AccessGuard::new([ADMIN]), Schema::monitoring());
		RegistryService::new(Arc::new(reloader))
	}

	async fn replace(svc: &RegistryService, identity: Option<Identity>, filename: &str, bytes: &[u8]) -> Result<ResponsePayload, ErrorPayload> {
		svc.handle(
			identity,
			RequestPayload::Replace {
				filename: filename.into(),
				bytes: bytes.to_vec(),
			},
		)
		.await
	}

	#[tokio::test]
	async fn lookup_before_load_is_store_empty() {
		let svc = service();
		let err = svc.handle(None, RequestPayload::Lookup { text: "міст".into() }).await.unwrap_err();
		assert_eq!(err, ErrorPayload::StoreEmpty);
	}

	#[tokio::test]
	async fn replace_then_lookup() {
		let svc = service();
		let replaced = replace(&svc, Some(ADMIN), "monitoring.csv", DATASET).await.unwrap();
		assert_eq!(replaced, ResponsePayload::Replaced { version: 1, records: 2 });

		let ResponsePayload::Matches { version, records } = svc.handle(None, RequestPayload::Lookup { text: "МІСТ".into() }).await.unwrap() else {
			panic!("expected matches");
		};
		assert_eq!(version, 1);
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].get(REGION), Some(&Value::Text("Київська".into())));
		assert_eq!(records[0].get(MONITORING_ASSIGNEE), Some(&Value::Text("ГО Варта".into())));
	}

	#[tokio::test]
	async fn miss_is_an_empty_match_list() {
		let svc = service();
		replace(&svc, Some(ADMIN), "monitoring.csv", DATASET).await.unwrap();

		let resp = svc.handle(None, RequestPayload::Lookup { text: "тунель".into() }).await.unwrap();
		assert_eq!(resp, ResponsePayload::Matches { version: 1, records: vec![] });
	}

	#[tokio::test]
	async fn errors_map_to_wire_codes() {
		let svc = service();
		assert_eq!(replace(&svc, Some(Identity(1)), "m.csv", DATASET).await, Err(ErrorPayload::Unauthorized));
		assert_eq!(
			replace(&svc, Some(ADMIN), "m.ods", DATASET).await,
			Err(ErrorPayload::UnsupportedFile("m.ods".into()))
		);
		assert!(matches!(replace(&svc, Some(ADMIN), "m.csv", b"a,b\n1\n").await, Err(ErrorPayload::Parse(_))));

		let Err(ErrorPayload::Schema { missing, observed, .. }) = replace(&svc, Some(ADMIN), "m.csv", b"Object,Region\nBridge,Kyiv\n").await else {
			panic!("expected schema error");
		};
		assert_eq!(missing, vec!["procurement_type".to_owned(), "monitoring_assignee".to_owned()]);
		assert_eq!(observed, vec!["Object".to_owned(), "Region".to_owned()]);
	}

	#[tokio::test]
	async fn status_and_identity() {
		let svc = service();
		assert_eq!(
			svc.handle(None, RequestPayload::Status).await.unwrap(),
			ResponsePayload::Status {
				loaded: false,
				version: 0,
				records: 0
			}
		);
		replace(&svc, Some(ADMIN), "monitoring.csv", DATASET).await.unwrap();
		assert_eq!(
			svc.handle(None, RequestPayload::Status).await.unwrap(),
			ResponsePayload::Status {
				loaded: true,
				version: 1,
				records: 2
			}
		);
		assert_eq!(
			svc.handle(Some(Identity(42)), RequestPayload::WhoAmI).await.unwrap(),
			ResponsePayload::Identity { id: Some(Identity(42)) }
		);
	}
}
