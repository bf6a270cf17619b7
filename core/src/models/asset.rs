//! Published data assets
//!
//! An asset is identified by a DID, described by a metadata block and made
//! purchasable through one or more service descriptors.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Method prefix of every asset DID
pub const DID_PREFIX: &str = "did:op:";

/// Decentralized identifier of an asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Generate a fresh identifier from two random UUIDs
    pub fn generate() -> Self {
        let id = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        Did(format!("{}{}", DID_PREFIX, id))
    }

    /// Parse `did:op:<64 hex>`; a `0x` prefix on the id part is accepted
    pub fn parse(value: &str) -> Result<Self> {
        let id = value
            .strip_prefix(DID_PREFIX)
            .ok_or_else(|| CoreError::InvalidDid(value.to_string()))?;
        let id = id.strip_prefix("0x").unwrap_or(id);
        if id.len() != 64 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidDid(value.to_string()));
        }
        Ok(Did(format!("{}{}", DID_PREFIX, id.to_ascii_lowercase())))
    }

    /// The id part, without the method prefix
    pub fn id(&self) -> &str {
        &self.0[DID_PREFIX.len()..]
    }

    /// The 32 bytes anchored on the ledger
    pub fn to_bytes32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        // parse() and generate() guarantee 64 hex characters
        if let Ok(bytes) = hex::decode(self.id()) {
            out.copy_from_slice(&bytes);
        }
        out
    }

    /// Full string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Did {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Did::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Did::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

/// The `base` block of asset metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBase {
    /// Asset name
    pub name: String,

    /// Free text description
    #[serde(default)]
    pub description: String,

    /// Price in whole tokens
    #[serde(default)]
    pub price: u64,

    /// Asset type, e.g. `dataset`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,

    /// Author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// License
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Creation date as published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,

    /// Tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Any other published field
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Asset metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Base attributes
    pub base: MetadataBase,

    /// Additional blocks (curation, additionalInformation, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Minimal metadata with a name, description and price
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: u64) -> Self {
        Self {
            base: MetadataBase {
                name: name.into(),
                description: description.into(),
                price,
                asset_type: Some("dataset".to_string()),
                author: None,
                license: None,
                date_created: None,
                tags: Vec::new(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Sample metadata for a weather dataset
    pub fn example() -> Self {
        let mut metadata = Metadata::new(
            "UK Weather information 2011",
            "Weather information of UK including temperature and humidity",
            10,
        );
        metadata.base.author = Some("Met Office".to_string());
        metadata.base.license = Some("CC-BY".to_string());
        metadata.base.date_created = Some("2012-02-01T10:55:11Z".to_string());
        metadata.base.tags = vec!["weather".to_string(), "uk".to_string(), "2011".to_string()];
        for (key, value) in [
            ("copyrightHolder", "Met Office"),
            ("encoding", "UTF-8"),
            ("compression", "zip"),
            ("contentType", "text/csv"),
            ("inLanguage", "en"),
        ] {
            metadata.base.extra.insert(key.to_string(), Value::String(value.to_string()));
        }
        metadata.extra.insert(
            "curation".to_string(),
            serde_json::json!({"rating": 0.93, "numVotes": 123, "schema": "Binary Voting"}),
        );
        metadata
    }

    /// Name of the asset
    pub fn name(&self) -> &str {
        &self.base.name
    }

    /// Price of the asset in whole tokens
    pub fn price(&self) -> u64 {
        self.base.price
    }

    /// Check the only locally enforced rule: a non-blank name
    pub fn validate(&self) -> Result<()> {
        if self.base.name.trim().is_empty() {
            return Err(CoreError::InvalidMetadata("metadata name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Kind of service offered for an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    /// Dataset access
    Access,
}

/// How to purchase and access an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Identifier of the service within the DDO
    #[serde(default)]
    pub service_definition_id: String,

    /// Price in whole tokens
    pub price: u64,

    /// Endpoint that initializes a purchase
    pub purchase_endpoint: String,

    /// Endpoint that serves the asset
    pub service_endpoint: String,

    /// Seconds the access agreement stays valid
    pub timeout: u64,

    /// Service agreement template
    pub template_id: String,
}

impl ServiceDescriptor {
    /// Access service descriptor
    pub fn access(
        price: u64,
        purchase_endpoint: impl Into<String>,
        service_endpoint: impl Into<String>,
        timeout: u64,
        template_id: impl Into<String>,
    ) -> Self {
        Self {
            service_definition_id: String::new(),
            price,
            purchase_endpoint: purchase_endpoint.into(),
            service_endpoint: service_endpoint.into(),
            timeout,
            template_id: template_id.into(),
        }
    }

    /// Service type
    pub fn service_type(&self) -> ServiceType {
        ServiceType::Access
    }
}

/// A registered asset
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    /// Identifier
    pub did: Did,

    /// Publishing account, when known
    pub owner: Option<Address>,

    /// Creation time
    pub created: Option<DateTime<Utc>>,

    /// Metadata block
    pub metadata: Metadata,

    /// Access services
    pub services: Vec<ServiceDescriptor>,
}

impl AssetRecord {
    /// Bundle a new record; service definition ids are numbered from 1
    pub fn new(
        did: Did,
        owner: Address,
        metadata: Metadata,
        services: Vec<ServiceDescriptor>,
    ) -> Self {
        let services = services
            .into_iter()
            .enumerate()
            .map(|(i, mut service)| {
                if service.service_definition_id.is_empty() {
                    service.service_definition_id = (i + 1).to_string();
                }
                service
            })
            .collect();

        Self {
            did,
            owner: Some(owner),
            created: Some(Utc::now()),
            metadata,
            services,
        }
    }
}
