//! Gumroad license verification

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{LicenseLookup, LicenseRegistry, LicenseVerdict};
use crate::error::LicenseError;
use crate::types::DEFAULT_PRODUCT_ID;

/// Gumroad license verification endpoint
pub const DEFAULT_VERIFY_URL: &str = "https://api.gumroad.com/v2/licenses/verify";

/// Gumroad client configuration
#[derive(Debug, Clone)]
pub struct GumroadConfig {
    /// Verification endpoint
    pub verify_url: String,
    /// Product every key is checked against
    pub product_id: String,
    /// Seller access token, sent as a bearer token
    pub access_token: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for GumroadConfig {
    fn default() -> Self {
        Self {
            verify_url: DEFAULT_VERIFY_URL.to_string(),
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            access_token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifyBody<'a> {
    product_id: &'a str,
    license_key: &'a str,
}

/// License registry talking to Gumroad directly
///
/// Needs the seller access token, so it belongs on a server. Clients that
/// must not hold the token use [`super::RelayRegistry`] instead.
pub struct GumroadRegistry {
    config: GumroadConfig,
    client: Client,
}

impl GumroadRegistry {
    pub fn new(config: GumroadConfig) -> Result<Self, LicenseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GumroadConfig {
        &self.config
    }
}

#[async_trait]
impl LicenseRegistry for GumroadRegistry {
    async fn check(&self, license_key: &str) -> Result<LicenseVerdict, LicenseError> {
        let mut request = self
            .client
            .post(&self.config.verify_url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&VerifyBody {
                product_id: &self.config.product_id,
                license_key,
            });
        if let Some(ref token) = self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        // Unknown keys come back as 404 with a JSON body
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            warn!(status = status.as_u16(), "License registry unavailable");
            return Err(LicenseError::Transient(format!(
                "license registry returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response.bytes().await?;
        let lookup: LicenseLookup = serde_json::from_slice(&body).map_err(|e| {
            warn!(status = status.as_u16(), "Unreadable license registry response: {}", e);
            LicenseError::Transient(format!("HTTP {} with unreadable body", status.as_u16()))
        })?;

        let verdict = lookup.verdict();
        debug!(
            status = status.as_u16(),
            success = lookup.success,
            ?verdict,
            "License registry answered"
        );
        Ok(verdict)
    }
}
