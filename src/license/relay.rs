//! Client for the `/api/verify-license` relay

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{LicenseRegistry, LicenseVerdict};
use crate::error::LicenseError;

/// Relay request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyLicenseRequest {
    #[serde(rename = "licenseKey", default)]
    pub license_key: Option<String>,
}

/// Relay response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyLicenseResponse {
    pub valid: bool,
}

/// License registry reached through a relay server that holds the
/// registry token
pub struct RelayRegistry {
    endpoint: String,
    client: Client,
}

impl RelayRegistry {
    /// `base_url` is the relay origin, e.g. `https://seal.example.com`
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, LicenseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: format!("{}/api/verify-license", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LicenseRegistry for RelayRegistry {
    async fn check(&self, license_key: &str) -> Result<LicenseVerdict, LicenseError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&VerifyLicenseRequest {
                license_key: Some(license_key.to_string()),
            })
            .send()
            .await?;

        let ok = response.status().is_success();
        let body = response.bytes().await?;
        let answer: VerifyLicenseResponse = serde_json::from_slice(&body)
            .map_err(|e| LicenseError::Transient(format!("unreadable relay response: {}", e)))?;

        debug!(ok, valid = answer.valid, "License relay answered");
        if ok && answer.valid {
            Ok(LicenseVerdict::Valid)
        } else {
            Ok(LicenseVerdict::Invalid)
        }
    }
}
