//! License registry seam
//!
//! A key is valid only when the registry reports success for the configured
//! product and the purchase behind it has not been refunded.

mod gumroad;
mod relay;

pub use gumroad::{GumroadConfig, GumroadRegistry, DEFAULT_VERIFY_URL};
pub use relay::{RelayRegistry, VerifyLicenseRequest, VerifyLicenseResponse};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LicenseError;

/// Registry answer for a key that could be checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseVerdict {
    Valid,
    Invalid,
}

/// Something that can look up a license key
///
/// `Err` means the key could not be checked (network, malformed reply);
/// it never counts as valid.
#[async_trait]
pub trait LicenseRegistry: Send + Sync {
    async fn check(&self, license_key: &str) -> Result<LicenseVerdict, LicenseError>;
}

/// Registry response body
#[derive(Debug, Clone, Deserialize)]
pub struct LicenseLookup {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub purchase: Option<Purchase>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Purchase attached to a license
#[derive(Debug, Clone, Deserialize)]
pub struct Purchase {
    #[serde(default)]
    pub refunded: Option<bool>,
}

impl LicenseLookup {
    /// Success with an explicitly non-refunded purchase
    pub fn verdict(&self) -> LicenseVerdict {
        let refunded = self.purchase.as_ref().and_then(|p| p.refunded);
        if self.success && refunded == Some(false) {
            LicenseVerdict::Valid
        } else {
            LicenseVerdict::Invalid
        }
    }
}
