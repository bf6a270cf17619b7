//! Metadata store interface

use async_trait::async_trait;
use mantaray_core::{AssetQuery, AssetRecord, Did};

use crate::error::Result;

/// Remote document store holding asset records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Store a new record; a rejected document is a `Registration` error
    async fn publish(&self, record: &AssetRecord) -> Result<AssetRecord>;

    /// Fetch one record
    async fn resolve(&self, did: &Did) -> Result<Option<AssetRecord>>;

    /// Records matching the query, in the store's order
    async fn query(&self, query: &AssetQuery) -> Result<Vec<AssetRecord>>;

    /// Every registered identifier
    async fn list_dids(&self) -> Result<Vec<Did>>;

    /// Delete the metadata record; unknown identifiers are `NotFound`
    async fn retire(&self, did: &Did) -> Result<()>;

    /// Where the store serves the record for `did`
    fn ddo_url(&self, did: &Did) -> String;
}
