//! Concurrency invariants of the registry, exercised with real threads.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::query::{MATCH_LIMIT, lookup, search};
use crate::registry::Registry;
use crate::schema::{REGION, Schema, ValidatedTable};
use crate::table::{RawTable, TableFormat};
use crate::value::Value;

const READERS: usize = 8;
const GENERATIONS: i64 = 200;

/// A dataset whose every row carries `generation` in the region column.
fn generation(generation: i64) -> ValidatedTable {
	let mut doc = String::from("object,region,procurement,monitoring\n");
	for row in 0..5 {
		doc.push_str(&format!("site {row},{generation},1,team\n"));
	}
	Schema::monitoring()
		.validate(RawTable::parse(doc.as_bytes(), TableFormat::Csv).unwrap())
		.unwrap()
}

/// Invariant: a lookup never mixes records of two snapshots.
#[test]
fn test_readers_never_see_mixed_snapshots() {
	let registry = Arc::new(Registry::new());
	registry.replace(generation(0), None);
	let done = Arc::new(AtomicBool::new(false));
	let start = Arc::new(Barrier::new(READERS + 1));

	let readers: Vec<_> = (0..READERS)
		.map(|_| {
			let registry = registry.clone();
			let done = done.clone();
			let start = start.clone();
			thread::spawn(move || {
				start.wait();
				let mut last_version = 0;
				while !done.load(Ordering::Acquire) {
					let matches = lookup(&registry, "site").unwrap();
					assert_eq!(matches.len(), MATCH_LIMIT);

					let expected = matches.version() as i64 - 1;
					for record in matches.iter() {
						assert_eq!(record.get(REGION).and_then(Value::as_i64), Some(expected), "records from two snapshots");
					}

					assert!(matches.version() >= last_version, "version went backwards");
					last_version = matches.version();
				}
			})
		})
		.collect();

	start.wait();
	for g in 1..=GENERATIONS {
		registry.replace(generation(g), None);
	}
	done.store(true, Ordering::Release);

	for reader in readers {
		reader.join().expect("reader panicked");
	}
	assert_eq!(registry.version(), GENERATIONS as u64 + 1);
}

/// Invariant: racing writers never publish the same version twice.
#[test]
fn test_racing_replacements_get_distinct_versions() {
	const WRITERS: usize = 4;
	const PER_WRITER: i64 = 50;

	let registry = Arc::new(Registry::new());
	let start = Arc::new(Barrier::new(WRITERS));

	let writers: Vec<_> = (0..WRITERS)
		.map(|w| {
			let registry = registry.clone();
			let start = start.clone();
			thread::spawn(move || {
				start.wait();
				(0..PER_WRITER)
					.map(|i| registry.replace(generation(w as i64 * 1000 + i), None).version())
					.collect::<Vec<u64>>()
			})
		})
		.collect();

	let mut versions = BTreeSet::new();
	for writer in writers {
		let mine = writer.join().expect("writer panicked");
		assert!(mine.windows(2).all(|w| w[0] < w[1]), "per-writer versions must increase");
		versions.extend(mine);
	}

	let total = WRITERS as u64 * PER_WRITER as u64;
	assert_eq!(versions.len() as u64, total);
	assert_eq!(versions.into_iter().collect::<Vec<_>>(), (1..=total).collect::<Vec<_>>());
	assert_eq!(registry.version(), total);
}

/// Invariant: a pinned snapshot is unaffected by later swaps.
#[test]
fn test_pinned_snapshot_is_stable_across_swap() {
	let registry = Registry::new();
	registry.replace(generation(1), None);
	let pinned = registry.current();
	let before: Vec<Vec<Value>> = search(&pinned, "").iter().map(|r| r.values().to_vec()).collect();

	registry.replace(generation(2), None);

	let after: Vec<Vec<Value>> = search(&pinned, "").iter().map(|r| r.values().to_vec()).collect();
	assert_eq!(before, after);
	assert_ne!(registry.current().version(), pinned.version());
}
