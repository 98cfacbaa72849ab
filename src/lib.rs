//! Thought Seal - immutable declarations, predictions and commitments
//!
//! A client writes a short thought, the crate hashes it with SHA-256 and
//! stores it in a hosted PostgREST table. Locked clients get three thoughts;
//! a verified license key unlocks unlimited sealing and public sharing.
//!
//! ## Components
//!
//! - **Identity**: random client id and unlock flag kept in a local state file
//! - **Store**: `ThoughtStore` seam with PostgREST and in-memory backends
//! - **License**: `LicenseRegistry` seam with Gumroad and relay backends
//! - **Services**: sealing/reading workflow and license verification
//! - **View**: immutable view snapshots folded by a pure reducer
//! - **Session**: ties the above together for a single client profile
//! - **Server**: HTTP relay exposing `POST /api/verify-license`

pub mod config;
pub mod error;
pub mod hash;
pub mod identity;
pub mod license;
pub mod server;
pub mod services;
pub mod session;
pub mod store;
pub mod types;
pub mod view;

pub use config::Args;
pub use error::{LicenseError, SealError, StateError, StoreError};
pub use identity::{ClientId, FileStore, LocalStore, MemoryLocalStore};
pub use license::{GumroadRegistry, LicenseRegistry, LicenseVerdict, RelayRegistry};
pub use services::{LicenseService, ThoughtService};
pub use session::Session;
pub use store::{MemoryThoughtStore, PostgrestStore, ThoughtStore};
pub use types::{NewThought, Thought};
pub use view::{Action, Status, ViewState};
