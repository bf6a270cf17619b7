//! Asset registration and discovery
//!
//! An asset exists in two places: its metadata record lives in the metadata
//! store, and its DID is anchored on the ledger together with a checksum of
//! that metadata and the URL the record is served from.

use std::sync::Arc;
use ethers::utils::keccak256;
use log::{error, info, warn};
use mantaray_core::{AssetQuery, AssetRecord, Did, Metadata, ServiceDescriptor, User};

use crate::error::{ClientError, Result};
use crate::ledger::LedgerClient;
use crate::store::MetadataStore;

/// Asset operations over a ledger and a metadata store
#[derive(Debug)]
pub struct AssetService<L: ?Sized, M: ?Sized> {
    ledger: Arc<L>,
    store: Arc<M>,
}

impl<L: ?Sized, M: ?Sized> Clone for AssetService<L, M> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            store: self.store.clone(),
        }
    }
}

impl<L, M> AssetService<L, M>
where
    L: LedgerClient + ?Sized,
    M: MetadataStore + ?Sized,
{
    /// Create a service over the ledger and the store
    pub fn new(ledger: Arc<L>, store: Arc<M>) -> Self {
        Self { ledger, store }
    }

    /// Publish metadata and anchor a fresh DID for it
    ///
    /// When anchoring fails the published record is retired again before
    /// the error is returned.
    pub async fn register_asset(
        &self,
        metadata: Metadata,
        owner: &User,
        services: Vec<ServiceDescriptor>,
    ) -> Result<AssetRecord> {
        metadata
            .validate()
            .map_err(|e| ClientError::Registration(e.to_string()))?;
        owner.require_credential()?;

        let did = Did::generate();
        let checksum = keccak256(serde_json::to_vec(&metadata)?);
        let record = AssetRecord::new(did, owner.address(), metadata, services);

        let published = self.store.publish(&record).await?;
        info!("Published {} for {}", published.did, owner.name());

        if let Err(e) = self.anchor(owner, &published.did, checksum).await {
            warn!("Anchoring {} failed, retiring its metadata", published.did);
            if let Err(retire_err) = self.store.retire(&published.did).await {
                error!("Could not retire unanchored {}: {}", published.did, retire_err);
            }
            return Err(e);
        }

        Ok(published)
    }

    async fn anchor(&self, owner: &User, did: &Did, checksum: [u8; 32]) -> Result<()> {
        let url = self.store.ddo_url(did);
        let confirmed = async {
            let tx_hash = self.ledger.anchor_did(owner, did, checksum, &url).await?;
            self.ledger.wait_for_receipt(tx_hash).await
        }
        .await
        .map_err(|e| match e {
            ClientError::Ledger(_) => e,
            other => ClientError::Ledger(format!("Cannot anchor {}: {}", did, other)),
        })?;
        if !confirmed {
            return Err(ClientError::Ledger(format!("DID registration for {} reverted", did)));
        }
        info!("Anchored {} at {}", did, url);
        Ok(())
    }

    /// Records matching the query, in the store's order
    pub async fn query_assets(&self, query: &AssetQuery) -> Result<Vec<AssetRecord>> {
        let results = self.store.query(query).await?;
        info!("Query matched {} assets", results.len());
        Ok(results)
    }

    /// Remove the metadata record; the ledger anchor stays
    pub async fn retire_asset(&self, did: &Did) -> Result<()> {
        self.store.retire(did).await?;
        info!("Retired {}", did);
        Ok(())
    }

    /// Fetch one record
    pub async fn resolve(&self, did: &Did) -> Result<Option<AssetRecord>> {
        self.store.resolve(did).await
    }

    /// Every registered DID
    pub async fn list_dids(&self) -> Result<Vec<Did>> {
        self.store.list_dids().await
    }
}
