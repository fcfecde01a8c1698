//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `homestay_core` linkage.
//! - Exercise the open/create/commit path against a local snapshot.

use homestay_core::{FileStorage, RecordKind, RecordService};

const SNAPSHOT_FILE: &str = "homestay.json";

fn main() {
    println!("homestay_core ping={}", homestay_core::ping());
    println!("homestay_core version={}", homestay_core::core_version());

    let storage = match FileStorage::open(SNAPSHOT_FILE) {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("failed to open snapshot `{SNAPSHOT_FILE}`: {err}");
            std::process::exit(1);
        }
    };

    let mut service = RecordService::new(storage);
    println!("records_loaded={}", service.all().len());

    let key = service.create(RecordKind::Base);
    if let Err(err) = service.commit_update(&key) {
        eprintln!("failed to persist record `{key}`: {err}");
        std::process::exit(1);
    }

    if let Some(record) = service.get(&key) {
        println!("created {record}");
    }
    println!("records_total={}", service.all().len());
}
