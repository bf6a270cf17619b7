//! HTTP client for the Aquarius metadata store
//!
//! Aquarius keeps asset DDOs keyed by DID and exposes a small query API
//! over its document database.

use std::time::Duration;
use async_trait::async_trait;
use log::{debug, warn};
use mantaray_core::{AssetQuery, AssetRecord, Ddo, Did};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{ClientError, Result};
use crate::store::MetadataStore;

/// API prefix of the asset endpoints
const ASSETS_PATH: &str = "/api/v1/aquarius/assets";

/// Response of the listing endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DidList {
    Bare(Vec<Did>),
    Wrapped { ids: Vec<Did> },
}

/// Response of the query endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryResponse {
    Bare(Vec<Ddo>),
    Paged { results: Vec<Ddo> },
}

/// Client for the metadata store
#[derive(Debug, Clone)]
pub struct AquariusClient {
    /// Base URL of the metadata store
    base_url: String,

    /// HTTP client
    client: Client,

    /// Timeout for requests
    timeout: Duration,
}

impl AquariusClient {
    /// Create a new metadata store client
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the timeout for requests
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Base URL of the store
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn assets_url(&self) -> String {
        format!("{}{}", self.base_url, ASSETS_PATH)
    }

    async fn server_error(response: reqwest::Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(text) if !text.is_empty() => format!("{} - {}", status, text),
            _ => status.to_string(),
        }
    }

    fn into_records(ddos: Vec<Ddo>) -> Vec<AssetRecord> {
        ddos.into_iter()
            .filter_map(|ddo| {
                let did = ddo.id.clone();
                match ddo.into_record() {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping unreadable DDO {}: {}", did, e);
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
impl MetadataStore for AquariusClient {
    async fn publish(&self, record: &AssetRecord) -> Result<AssetRecord> {
        let url = format!("{}/ddo", self.assets_url());
        debug!("Publishing {} to {}", record.did, url);

        let ddo = Ddo::from_record(record, &self.ddo_url(&record.did));
        let response = self.client
            .post(&url)
            .timeout(self.timeout)
            .json(&ddo)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = Self::server_error(response).await;
            return Err(ClientError::Registration(format!(
                "{} rejected by metadata store: {}",
                record.did, error
            )));
        }

        Ok(record.clone())
    }

    async fn resolve(&self, did: &Did) -> Result<Option<AssetRecord>> {
        let url = self.ddo_url(did);
        let response = self.client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ClientError::Server(Self::server_error(response).await));
        }

        let ddo: Ddo = response.json().await?;
        Ok(Some(ddo.into_record()?))
    }

    async fn query(&self, query: &AssetQuery) -> Result<Vec<AssetRecord>> {
        let url = format!("{}/ddo/query", self.assets_url());
        let request = query.to_request();
        debug!("Querying {} with {}", url, serde_json::to_string(&request)?);

        let response = self.client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Server(Self::server_error(response).await));
        }

        let ddos = match response.json::<QueryResponse>().await? {
            QueryResponse::Bare(ddos) => ddos,
            QueryResponse::Paged { results } => results,
        };
        Ok(Self::into_records(ddos))
    }

    async fn list_dids(&self) -> Result<Vec<Did>> {
        let url = self.assets_url();
        let response = self.client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Server(Self::server_error(response).await));
        }

        let dids = match response.json::<DidList>().await? {
            DidList::Bare(ids) => ids,
            DidList::Wrapped { ids } => ids,
        };
        Ok(dids)
    }

    async fn retire(&self, did: &Did) -> Result<()> {
        let url = self.ddo_url(did);
        debug!("Retiring {}", did);

        let response = self.client
            .delete(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(did.to_string()));
        }
        if !response.status().is_success() {
            return Err(ClientError::Server(Self::server_error(response).await));
        }

        Ok(())
    }

    fn ddo_url(&self, did: &Did) -> String {
        format!("{}/ddo/{}", self.assets_url(), did)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mantaray_core::{Address, Metadata, ServiceDescriptor};
    use mockito::Matcher;
    use serde_json::json;

    fn record(name: &str, price: u64) -> AssetRecord {
        AssetRecord::new(
            Did::generate(),
            Address::repeat_byte(1),
            Metadata::new(name, format!("{} dataset", name), price),
            vec![ServiceDescriptor::access(price, "/purchase", "/consume", 600, "0x01")],
        )
    }

    fn ddo_json(record: &AssetRecord, client: &AquariusClient) -> serde_json::Value {
        serde_json::to_value(Ddo::from_record(record, &client.ddo_url(&record.did))).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = AquariusClient::new("http://localhost:5000/");
        let did = Did::parse(&format!("did:op:{}", "ab".repeat(32))).unwrap();

        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.ddo_url(&did),
            format!("http://localhost:5000/api/v1/aquarius/assets/ddo/did:op:{}", "ab".repeat(32))
        );
    }

    #[tokio::test]
    async fn test_publish_posts_ddo() {
        let mut server = mockito::Server::new_async().await;
        let client = AquariusClient::new(&server.url());
        let asset = record("Weather", 10);

        let mock = server
            .mock("POST", "/api/v1/aquarius/assets/ddo")
            .match_body(Matcher::PartialJson(json!({
                "@context": mantaray_core::models::DDO_CONTEXT,
                "id": asset.did.as_str()
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(ddo_json(&asset, &client).to_string())
            .create_async()
            .await;

        let published = client.publish(&asset).await.unwrap();
        assert_eq!(published, asset);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_publish_rejected() {
        let mut server = mockito::Server::new_async().await;
        let client = AquariusClient::new(&server.url());

        server
            .mock("POST", "/api/v1/aquarius/assets/ddo")
            .with_status(400)
            .with_body("Invalid DDO format")
            .create_async()
            .await;

        match client.publish(&record("Weather", 10)).await {
            Err(ClientError::Registration(msg)) => assert!(msg.contains("Invalid DDO format")),
            other => panic!("Expected Registration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve() {
        let mut server = mockito::Server::new_async().await;
        let client = AquariusClient::new(&server.url());
        let asset = record("Rain", 4);
        let missing = Did::generate();

        server
            .mock("GET", format!("/api/v1/aquarius/assets/ddo/{}", asset.did).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ddo_json(&asset, &client).to_string())
            .create_async()
            .await;
        server
            .mock("GET", format!("/api/v1/aquarius/assets/ddo/{}", missing).as_str())
            .with_status(404)
            .create_async()
            .await;

        assert_eq!(client.resolve(&asset.did).await.unwrap(), Some(asset));
        assert_eq!(client.resolve(&missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_query_sends_typed_request() {
        let mut server = mockito::Server::new_async().await;
        let client = AquariusClient::new(&server.url());
        let cheap = record("Weather cheap", 5);
        let pricey = record("Weather pricey", 11);

        let mock = server
            .mock("POST", "/api/v1/aquarius/assets/ddo/query")
            .match_body(Matcher::Json(json!({
                "query": {"price": [0, 11], "text": ["Weather"]},
                "offset": 0,
                "page": 0
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([ddo_json(&pricey, &client), ddo_json(&cheap, &client)]).to_string())
            .create_async()
            .await;

        let query = AssetQuery::all().with_text(["Weather"]).unwrap().with_price(0, 11).unwrap();
        let results = client.query(&query).await.unwrap();

        // Store order is kept
        assert_eq!(results, vec![pricey, cheap]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_paged_response_and_empty_result() {
        let mut server = mockito::Server::new_async().await;
        let client = AquariusClient::new(&server.url());
        let asset = record("Solar", 3);
        let broken = json!({"id": Did::generate().as_str(), "service": []});

        server
            .mock("POST", "/api/v1/aquarius/assets/ddo/query")
            .match_body(Matcher::PartialJson(json!({"query": {"price": [0, 20]}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({
                "results": [ddo_json(&asset, &client), broken],
                "page": 0,
                "total_pages": 1,
                "total_results": 2
            }).to_string())
            .create_async()
            .await;
        server
            .mock("POST", "/api/v1/aquarius/assets/ddo/query")
            .match_body(Matcher::PartialJson(json!({"query": {"text": ["nothing"]}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let results = client.query(&AssetQuery::all().with_price(0, 20).unwrap()).await.unwrap();
        assert_eq!(results, vec![asset]);

        let empty = client.query(&AssetQuery::all().with_text(["nothing"]).unwrap()).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_list_dids_accepts_both_shapes() {
        let did = Did::generate();

        let mut bare_server = mockito::Server::new_async().await;
        bare_server
            .mock("GET", "/api/v1/aquarius/assets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([did.as_str()]).to_string())
            .create_async()
            .await;
        let client = AquariusClient::new(&bare_server.url());
        assert_eq!(client.list_dids().await.unwrap(), vec![did.clone()]);

        let mut wrapped_server = mockito::Server::new_async().await;
        wrapped_server
            .mock("GET", "/api/v1/aquarius/assets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"ids": [did.as_str()]}).to_string())
            .create_async()
            .await;
        let client = AquariusClient::new(&wrapped_server.url());
        assert_eq!(client.list_dids().await.unwrap(), vec![did]);
    }

    #[tokio::test]
    async fn test_retire() {
        let mut server = mockito::Server::new_async().await;
        let client = AquariusClient::new(&server.url());
        let known = Did::generate();
        let unknown = Did::generate();

        let delete = server
            .mock("DELETE", format!("/api/v1/aquarius/assets/ddo/{}", known).as_str())
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("DELETE", format!("/api/v1/aquarius/assets/ddo/{}", unknown).as_str())
            .with_status(404)
            .create_async()
            .await;

        client.retire(&known).await.unwrap();
        delete.assert_async().await;

        match client.retire(&unknown).await {
            Err(ClientError::NotFound(id)) => assert_eq!(id, unknown.to_string()),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error() {
        let mut server = mockito::Server::new_async().await;
        let client = AquariusClient::new(&server.url());

        server
            .mock("GET", "/api/v1/aquarius/assets")
            .with_status(500)
            .with_body("database down")
            .create_async()
            .await;

        match client.list_dids().await {
            Err(ClientError::Server(msg)) => assert!(msg.contains("database down")),
            other => panic!("Expected Server error, got {:?}", other),
        }
    }
}
