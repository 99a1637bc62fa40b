//! Duplicate detection against previously stored quotations
//!
//! Records are matched by natural key (the trimmed reference code). The check
//! is a best-effort read-then-decide step: two concurrent imports can both
//! pass it, so a hard guarantee has to come from the store itself.

use anyhow::{Context, Result};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::db::models::{QuotationRecord, StoredRecord};
use crate::db::RecordStore;

/// Candidates split into new records and records whose key already exists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateResolution {
    pub new_items: Vec<QuotationRecord>,
    pub duplicates: Vec<QuotationRecord>,
    /// Colliding keys, each listed once, in first-seen order
    pub duplicate_keys: Vec<String>,
}

/// Partition `candidates` by whether their key exists in `existing`
///
/// Every candidate sharing an existing key is a duplicate; candidates that
/// only share a key with each other are all new.
pub fn resolve(candidates: Vec<QuotationRecord>, existing: &[StoredRecord]) -> DuplicateResolution {
    let known: HashSet<&str> = existing.iter().map(|s| s.record.natural_key()).collect();

    let (duplicates, new_items): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|candidate| known.contains(candidate.natural_key()));

    let duplicate_keys = duplicates
        .iter()
        .map(|record| record.natural_key().to_string())
        .unique()
        .collect::<Vec<_>>();

    debug!("Duplicate keys: {:?}", duplicate_keys);

    DuplicateResolution {
        new_items,
        duplicates,
        duplicate_keys,
    }
}

/// Fetch the store's records fresh and resolve `candidates` against them
pub fn resolve_against_store<S: RecordStore + ?Sized>(
    candidates: Vec<QuotationRecord>,
    store: &S,
) -> Result<DuplicateResolution> {
    let existing = store
        .list_all()
        .context("Failed to list stored quotations for duplicate check")?;

    let resolution = resolve(candidates, &existing);
    info!(
        "Duplicate check against {} stored records: {} new, {} duplicates",
        existing.len(),
        resolution.new_items.len(),
        resolution.duplicates.len()
    );
    Ok(resolution)
}
