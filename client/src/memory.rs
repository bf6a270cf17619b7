//! In-memory metadata store
//!
//! Keeps records in publication order and evaluates queries with the same
//! semantics the remote store documents. Useful offline and in tests.

use std::cmp::Ordering;
use std::sync::Mutex;
use async_trait::async_trait;
use mantaray_core::{AssetQuery, AssetRecord, Did, QueryFilter, SortDirection};

use crate::error::{ClientError, Result};
use crate::store::MetadataStore;

/// Metadata store backed by a vector
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: Mutex<Vec<AssetRecord>>,
}

impl InMemoryMetadataStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with records
    pub fn with_records(records: Vec<AssetRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Snapshot of every record
    pub fn records(&self) -> Vec<AssetRecord> {
        self.lock().clone()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AssetRecord>> {
        // A poisoned lock still holds consistent data: every mutation is a single push or remove
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn matches_filter(record: &AssetRecord, filter: &QueryFilter) -> bool {
    match filter {
        QueryFilter::PriceRange { low, high } => (*low..=*high).contains(&record.metadata.price()),
        QueryFilter::Text(terms) => {
            let name = record.metadata.base.name.to_lowercase();
            let description = record.metadata.base.description.to_lowercase();
            terms.iter().any(|term| {
                let term = term.to_lowercase();
                name.contains(&term) || description.contains(&term)
            })
        }
    }
}

fn compare_by(field: &str, a: &AssetRecord, b: &AssetRecord) -> Ordering {
    match field {
        "price" => a.metadata.price().cmp(&b.metadata.price()),
        "name" => a.metadata.name().cmp(b.metadata.name()),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn publish(&self, record: &AssetRecord) -> Result<AssetRecord> {
        let mut records = self.lock();
        if records.iter().any(|r| r.did == record.did) {
            return Err(ClientError::Registration(format!("{} is already registered", record.did)));
        }
        records.push(record.clone());
        Ok(record.clone())
    }

    async fn resolve(&self, did: &Did) -> Result<Option<AssetRecord>> {
        Ok(self.lock().iter().find(|r| r.did == *did).cloned())
    }

    async fn query(&self, query: &AssetQuery) -> Result<Vec<AssetRecord>> {
        let mut results: Vec<AssetRecord> = self
            .lock()
            .iter()
            .filter(|record| query.filters().iter().all(|f| matches_filter(record, f)))
            .cloned()
            .collect();

        if let Some(sort) = query.sort() {
            results.sort_by(|a, b| {
                let ordering = compare_by(&sort.field, a, b);
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        if query.offset() > 0 {
            let start = query.offset().saturating_mul(query.page());
            results = results.into_iter().skip(start).take(query.offset()).collect();
        }

        Ok(results)
    }

    async fn list_dids(&self) -> Result<Vec<Did>> {
        Ok(self.lock().iter().map(|r| r.did.clone()).collect())
    }

    async fn retire(&self, did: &Did) -> Result<()> {
        let mut records = self.lock();
        let position = records
            .iter()
            .position(|r| r.did == *did)
            .ok_or_else(|| ClientError::NotFound(did.to_string()))?;
        records.remove(position);
        Ok(())
    }

    fn ddo_url(&self, did: &Did) -> String {
        format!("memory://ddo/{}", did)
    }
}
