//! DID Document wire format
//!
//! The metadata store keeps assets as DDO documents. The metadata block
//! lives inside a `Metadata` service and every access descriptor is its own
//! `Access` service.

use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use super::asset::{AssetRecord, Did, Metadata, ServiceDescriptor};
use crate::error::{CoreError, Result};

/// JSON-LD context of every DDO
pub const DDO_CONTEXT: &str = "https://w3id.org/future-method/v1";

/// Public key entry naming the owner of the asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    /// Key identifier
    pub id: String,

    /// Key type
    #[serde(rename = "type")]
    pub key_type: String,

    /// Controlling DID
    #[serde(default)]
    pub owner: String,

    /// Owner address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethereum_address: Option<Address>,
}

/// One entry of the DDO `service` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DdoService {
    /// Holds the metadata block
    Metadata {
        /// Identifier of the service within the DDO
        #[serde(rename = "serviceDefinitionId", default)]
        service_definition_id: String,

        /// Where the DDO can be fetched
        #[serde(rename = "serviceEndpoint", default)]
        service_endpoint: String,

        /// Metadata block
        metadata: Metadata,
    },

    /// Dataset access
    Access(ServiceDescriptor),

    /// Any service type this crate does not model
    #[serde(other)]
    Unsupported,
}

/// DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ddo {
    /// JSON-LD context
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,

    /// Asset DID
    pub id: Did,

    /// Owner keys
    #[serde(rename = "publicKey", default)]
    pub public_key: Vec<PublicKey>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Services
    #[serde(default)]
    pub service: Vec<DdoService>,
}

fn default_context() -> String {
    DDO_CONTEXT.to_string()
}

impl Ddo {
    /// Build the document for a record; `ddo_endpoint` is where the store serves it
    pub fn from_record(record: &AssetRecord, ddo_endpoint: &str) -> Self {
        let public_key = record
            .owner
            .map(|address| PublicKey {
                id: format!("{}#keys-1", record.did),
                key_type: "EthereumECDSAKey".to_string(),
                owner: record.did.to_string(),
                ethereum_address: Some(address),
            })
            .into_iter()
            .collect();

        let mut service = vec![DdoService::Metadata {
            service_definition_id: "0".to_string(),
            service_endpoint: ddo_endpoint.to_string(),
            metadata: record.metadata.clone(),
        }];
        service.extend(record.services.iter().cloned().map(DdoService::Access));

        Self {
            context: default_context(),
            id: record.did.clone(),
            public_key,
            created: record.created,
            service,
        }
    }

    /// Turn the document back into a record; the metadata service is required
    pub fn into_record(self) -> Result<AssetRecord> {
        let owner = self.public_key.iter().find_map(|key| key.ethereum_address);
        let mut metadata = None;
        let mut services = Vec::new();

        for service in self.service {
            match service {
                DdoService::Metadata { metadata: block, .. } => {
                    if metadata.is_none() {
                        metadata = Some(block);
                    }
                }
                DdoService::Access(descriptor) => services.push(descriptor),
                DdoService::Unsupported => {}
            }
        }

        let metadata = metadata.ok_or_else(|| {
            CoreError::InvalidMetadata(format!("DDO {} has no metadata service", self.id))
        })?;

        Ok(AssetRecord {
            did: self.id,
            owner,
            created: self.created,
            metadata,
            services,
        })
    }
}
