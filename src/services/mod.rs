//! Thought Seal services
//!
//! - **Thoughts**: seal workflow (quota, validation, hashing, visibility) and reads
//! - **Licensing**: license key verification and local unlock

pub mod licensing;
pub mod thoughts;

pub use licensing::{LicenseService, Unlocked};
pub use thoughts::ThoughtService;
