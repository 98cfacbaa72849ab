//! License verification and local unlock
//!
//! A verified key flips the profile's unlock flag in the local store. Nothing
//! is recorded server-side, so an unlock cannot be revoked remotely.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::LicenseError;
use crate::identity::{self, LocalStore};
use crate::license::{LicenseRegistry, LicenseVerdict};

/// Proof that a key was accepted and the unlock persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unlocked;

/// Verifies license keys against a registry and persists the unlock
#[derive(Clone)]
pub struct LicenseService {
    registry: Arc<dyn LicenseRegistry>,
    local: Arc<dyn LocalStore>,
}

impl LicenseService {
    pub fn new(registry: Arc<dyn LicenseRegistry>, local: Arc<dyn LocalStore>) -> Self {
        Self { registry, local }
    }

    /// Whether this profile is already unlocked
    pub fn is_unlocked(&self) -> bool {
        identity::is_unlocked(self.local.as_ref())
    }

    /// Verify a key; on success the unlock flag is persisted
    ///
    /// Empty keys fail with `EmptyKey` without contacting the registry.
    /// Registry failures are `Transient` and never unlock.
    pub async fn verify(&self, license_key: &str) -> Result<Unlocked, LicenseError> {
        if license_key.trim().is_empty() {
            return Err(LicenseError::EmptyKey);
        }

        match self.registry.check(license_key).await {
            Ok(LicenseVerdict::Valid) => {
                identity::mark_unlocked(self.local.as_ref())?;
                info!("License verified, unlimited thoughts unlocked");
                Ok(Unlocked)
            }
            Ok(LicenseVerdict::Invalid) => {
                info!("License key rejected");
                Err(LicenseError::Invalid)
            }
            Err(e) => {
                warn!("License verification failed: {}", e);
                Err(e)
            }
        }
    }
}
