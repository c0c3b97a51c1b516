//! Shared test helpers for `tagbook-core` unit tests.
//!
//! Builds in-memory catalogs wired to the mock id generator and the small
//! request values most tests need, so every module constructs fixtures the
//! same way.

use std::sync::{Arc, Once};

use crate::catalog::ItemCatalog;
use crate::idgen::mock::MockIdGenerator;
use crate::store::Datastore;
use crate::types::{DisplayOrderChange, NewItem};

// ==============================================================================
// Catalogs
// ==============================================================================

/// Two in-memory partitions, so neighbouring uids land in different files.
pub fn catalog_with(ids: MockIdGenerator) -> ItemCatalog {
    init_tracing();
    let db = Datastore::open_in_memory(2).expect("open in-memory datastore");
    ItemCatalog::new(Arc::new(db), Arc::new(ids))
}

/// Catalog whose ids start at 1000 and never run out.
pub fn catalog() -> ItemCatalog {
    catalog_with(MockIdGenerator::builder().starting_at(1000).build())
}

// ==============================================================================
// Request Builders
// ==============================================================================

pub fn new_item(group_id: i64, name: &str) -> NewItem {
    NewItem {
        group_id,
        name: name.to_string(),
    }
}

pub fn order(id: i64, display_order: i32) -> DisplayOrderChange {
    DisplayOrderChange { id, display_order }
}

// ==============================================================================
// Tracing
// ==============================================================================

/// Route `tracing` output through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
