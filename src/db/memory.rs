//! In-memory record store, used for previews and tests

use anyhow::Result;

use super::models::{QuotationRecord, RecordKey, RecordPatch, StoredRecord};
use super::RecordStore;
use crate::error::QuoteError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<StoredRecord>,
    next_key: RecordKey,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes all fail with a persistence error
    pub fn read_only(records: Vec<StoredRecord>) -> Self {
        let next_key = records.iter().map(|s| s.key).max().unwrap_or(0);
        Self {
            records,
            next_key,
            read_only: true,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(QuoteError::Persistence("store is read-only".to_string()).into());
        }
        Ok(())
    }

    fn position(&self, key: RecordKey) -> Result<usize> {
        self.records
            .iter()
            .position(|s| s.key == key)
            .ok_or_else(|| QuoteError::RecordNotFound(key).into())
    }
}

impl RecordStore for MemoryStore {
    fn insert(&mut self, record: &QuotationRecord) -> Result<RecordKey> {
        self.check_writable()?;
        self.next_key += 1;
        self.records.push(StoredRecord {
            key: self.next_key,
            record: record.clone(),
        });
        Ok(self.next_key)
    }

    fn list_all(&self) -> Result<Vec<StoredRecord>> {
        Ok(self.records.clone())
    }

    fn update(&mut self, key: RecordKey, patch: &RecordPatch) -> Result<()> {
        self.check_writable()?;
        let idx = self.position(key)?;
        patch.apply_to(&mut self.records[idx].record);
        Ok(())
    }

    fn delete(&mut self, key: RecordKey) -> Result<()> {
        self.check_writable()?;
        let idx = self.position(key)?;
        self.records.remove(idx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_sequential() {
        let mut store = MemoryStore::new();
        let a = store.insert(&QuotationRecord::default()).unwrap();
        let b = store.insert(&QuotationRecord::default()).unwrap();
        assert_eq!((a, b), (1, 2));
        store.delete(a).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.delete(a).is_err());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let mut store = MemoryStore::read_only(vec![]);
        let err = store.insert(&QuotationRecord::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QuoteError>(),
            Some(QuoteError::Persistence(_))
        ));
        assert!(store.list_all().unwrap().is_empty());
    }
}
