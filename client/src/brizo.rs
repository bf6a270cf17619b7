//! Access agent endpoints
//!
//! Publishing an asset publishes *access* to it. The publisher's access
//! agent (Brizo) negotiates purchases and serves the files; its two
//! endpoints go into every access service descriptor.

use mantaray_core::ServiceDescriptor;

/// Template of the standard access service agreement
pub const ACCESS_TEMPLATE_ID: &str = "0x044852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116d";

/// Endpoints of one access agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrizoEndpoints {
    base_url: String,
}

impl BrizoEndpoints {
    /// Endpoints under `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Where a consumer initializes a purchase
    pub fn purchase_endpoint(&self) -> String {
        format!("{}/api/v1/brizo/services/access/initialize", self.base_url)
    }

    /// Where a consumer downloads the asset
    pub fn service_endpoint(&self) -> String {
        format!("{}/api/v1/brizo/services/consume", self.base_url)
    }

    /// Access service descriptor served by this agent
    pub fn access_service(&self, price: u64, timeout: u64) -> ServiceDescriptor {
        ServiceDescriptor::access(
            price,
            self.purchase_endpoint(),
            self.service_endpoint(),
            timeout,
            ACCESS_TEMPLATE_ID,
        )
    }
}
