//! Thought records and the constants that bound them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum thought length, counted in characters
pub const MAX_CONTENT_CHARS: usize = 800;

/// Number of thoughts a locked client may seal
pub const FREE_QUOTA: u64 = 3;

/// Product the license registry checks keys against
pub const DEFAULT_PRODUCT_ID: &str = "geB67dAseGRaqslhf1BrXQ==";

/// Where locked clients are sent to buy a license
pub const PURCHASE_URL: &str = "https://ppcreators.gumroad.com/l/dhxtwg";

/// A sealed thought as stored in the `thoughts` table
///
/// Rows are never updated or deleted once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
    /// Server-generated identifier (numeric or uuid, normalised to a string)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// The thought text, exactly as entered
    pub content: String,
    /// Lowercase hex SHA-256 of `content`
    pub hash: String,
    /// Whether the thought is listed publicly
    #[serde(default)]
    pub is_public: bool,
    /// Owning client profile
    pub client_id: String,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewThought {
    pub content: String,
    pub hash: String,
    pub is_public: bool,
    pub client_id: String,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
