//! In-memory resource store
//!
//! Provides [`ResourceStore`], an insertion-ordered collection of
//! [`SharedRecord`]s with identifier lookup and identity-based removal.

use crate::pagination::{offset, PaginatedCollection};
use crate::resource::{Resource, ResourceId, SharedRecord};
use parking_lot::RwLock;

/// Ordered store of resource records
///
/// One lock guards the whole collection: insert and remove take it
/// exclusively, so identifier uniqueness is checked and enforced atomically.
/// Lookups scan linearly in insertion order.
#[derive(Debug)]
pub struct ResourceStore<R: Resource> {
    records: RwLock<Vec<SharedRecord<R>>>,
}

impl<R: Resource> ResourceStore<R> {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Create store seeded with records (in order)
    ///
    /// # Errors
    /// Returns error on the first record without identifier or with a
    /// duplicate identifier
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Result<Self, StoreError> {
        let store = Self::new();
        for record in records {
            store.insert(SharedRecord::new(record))?;
        }
        Ok(store)
    }

    /// Append a record
    ///
    /// # Errors
    /// - `StoreError::MissingId` if the record has no identifier
    /// - `StoreError::DuplicateId` if the identifier is already stored
    pub fn insert(&self, record: SharedRecord<R>) -> Result<SharedRecord<R>, StoreError> {
        let id = match record.id() {
            Some(id) if !id.is_empty() => id,
            _ => return Err(StoreError::MissingId { kind: R::KIND }),
        };

        let mut records = self.records.write();
        if records.iter().any(|r| r.has_id(&id)) {
            return Err(StoreError::DuplicateId {
                kind: R::KIND,
                id: id.to_string(),
            });
        }
        records.push(record.clone());
        tracing::info!(kind = R::KIND, %id, "record inserted");

        Ok(record)
    }

    /// Remove a record by identity
    ///
    /// Returns `true` if that exact instance was stored.
    pub fn remove(&self, record: &SharedRecord<R>) -> bool {
        let mut records = self.records.write();
        let Some(pos) = records.iter().position(|r| r.ptr_eq(record)) else {
            return false;
        };
        let removed = records.remove(pos);
        tracing::info!(kind = R::KIND, id = ?removed.id(), "record removed");
        true
    }

    /// Find record by identifier
    #[must_use]
    pub fn find_by_id(&self, id: &ResourceId) -> Option<SharedRecord<R>> {
        self.records.read().iter().find(|r| r.has_id(id)).cloned()
    }

    /// Find first record matching predicate
    pub fn find(&self, predicate: impl Fn(&R) -> bool) -> Option<SharedRecord<R>> {
        self.records
            .read()
            .iter()
            .find(|r| predicate(&r.read()))
            .cloned()
    }

    /// Records matching predicate, in insertion order
    pub fn filter(&self, predicate: impl Fn(&R) -> bool) -> Vec<SharedRecord<R>> {
        self.records
            .read()
            .iter()
            .filter(|r| predicate(&r.read()))
            .cloned()
            .collect()
    }

    /// Check if identifier is stored
    #[inline]
    #[must_use]
    pub fn contains_id(&self, id: &ResourceId) -> bool {
        self.records.read().iter().any(|r| r.has_id(id))
    }

    /// One page of record snapshots, in insertion order
    ///
    /// `page` is 1-based. Pages past the end are empty.
    #[must_use]
    pub fn page(&self, page: usize, per_page: usize) -> Vec<R> {
        self.records
            .read()
            .iter()
            .skip(offset(page, per_page))
            .take(per_page)
            .map(SharedRecord::snapshot)
            .collect()
    }

    /// One page plus the full store size, read under a single lock
    #[must_use]
    pub fn paginate(&self, page: usize, per_page: usize) -> PaginatedCollection<R> {
        let records = self.records.read();
        let slice = records
            .iter()
            .skip(offset(page, per_page))
            .take(per_page)
            .map(SharedRecord::snapshot)
            .collect();
        PaginatedCollection::new(slice, page, per_page, records.len())
    }

    /// Snapshot of every record
    #[must_use]
    pub fn snapshot(&self) -> Vec<R> {
        self.records.read().iter().map(SharedRecord::snapshot).collect()
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Remove every record
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl<R: Resource> Default for ResourceStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from store mutation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Record has no identifier
    #[error("{kind} record has no identifier")]
    MissingId { kind: &'static str },

    /// Identifier already stored
    #[error("{kind} with id '{id}' already exists")]
    DuplicateId { kind: &'static str, id: String },
}
