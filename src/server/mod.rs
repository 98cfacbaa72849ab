//! License relay server
//!
//! Keeps the registry access token server-side and answers
//! `POST /api/verify-license` with `{"valid": bool}`.

pub mod http;

pub use http::{run, serve, AppState};
