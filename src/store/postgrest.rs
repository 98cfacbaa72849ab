//! HTTP client for a PostgREST `thoughts` table (Supabase REST API)

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::ThoughtStore;
use crate::error::{StoreError, StoreResult};
use crate::identity::ClientId;
use crate::types::{NewThought, Thought};

/// PostgREST client configuration
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub base_url: String,
    /// Anon (public) API key
    pub api_key: Option<String>,
    /// Table holding sealed thoughts
    pub table: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for PostgrestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            table: "thoughts".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Thought store backed by PostgREST
pub struct PostgrestStore {
    config: PostgrestConfig,
    client: Client,
}

impl PostgrestStore {
    /// Create a new store client
    pub fn new(config: PostgrestConfig) -> StoreResult<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let key = header::HeaderValue::from_str(api_key)
                .map_err(|e| StoreError::Config(format!("invalid API key: {}", e)))?;
            let bearer = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| StoreError::Config(format!("invalid API key: {}", e)))?;
            headers.insert("apikey", key);
            headers.insert(header::AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PostgrestConfig {
        &self.config
    }

    /// `<base>/rest/v1/<table>?<query>`
    fn table_url(&self, query: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if query.is_empty() {
            format!("{}/rest/v1/{}", base, self.config.table)
        } else {
            format!("{}/rest/v1/{}?{}", base, self.config.table, query)
        }
    }

    async fn fetch_rows(&self, query: &str) -> StoreResult<Vec<Thought>> {
        let url = self.table_url(query);
        debug!(url = %url, "Querying thoughts");
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> StoreResult<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Server {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// Filter expression `column=eq.value` with the value url-encoded
fn eq_filter(column: &str, value: &str) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(value))
}

const NEWEST_FIRST: &str = "order=created_at.desc";

/// Total from a `Content-Range` header such as `0-2/3` or `*/0`
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl ThoughtStore for PostgrestStore {
    async fn insert(&self, thought: NewThought) -> StoreResult<Thought> {
        let url = self.table_url("");

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .json(&[&thought])
            .send()
            .await?;

        let mut rows: Vec<Thought> = self.handle_response(response).await?;
        if rows.is_empty() {
            return Err(StoreError::InvalidResponse(
                "insert returned no rows".to_string(),
            ));
        }
        Ok(rows.swap_remove(0))
    }

    async fn count_by_client(&self, client_id: &ClientId) -> StoreResult<u64> {
        let url = self.table_url(&format!(
            "select=*&{}",
            eq_filter("client_id", client_id.as_str())
        ));

        let response = self
            .client
            .head(&url)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        // 206 Partial Content is a success here
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Server {
                status: status.as_u16(),
                message: "count query failed".to_string(),
            });
        }

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| StoreError::InvalidResponse("missing Content-Range total".to_string()))
    }

    async fn list_public(&self) -> StoreResult<Vec<Thought>> {
        self.fetch_rows(&format!("select=*&is_public=eq.true&{}", NEWEST_FIRST))
            .await
    }

    async fn list_by_client(&self, client_id: &ClientId) -> StoreResult<Vec<Thought>> {
        self.fetch_rows(&format!(
            "select=*&{}&{}",
            eq_filter("client_id", client_id.as_str()),
            NEWEST_FIRST
        ))
        .await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Thought>> {
        let url = self.table_url(&format!("select=*&{}&limit=1", eq_filter("id", id)));
        debug!(url = %url, "Fetching thought");
        let response = self.client.get(&url).send().await?;

        // An id the column type rejects (22P02) cannot name a row
        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            debug!(id, status = status.as_u16(), "Thought lookup rejected, not found");
            return Ok(None);
        }

        let rows: Vec<Thought> = self.handle_response(response).await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base_url: &str) -> PostgrestStore {
        PostgrestStore::new(PostgrestConfig {
            base_url: base_url.to_string(),
            api_key: Some("anon-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-2/3"), Some(3));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_table_url() {
        let store = store("https://abcd.supabase.co/");
        assert_eq!(store.table_url(""), "https://abcd.supabase.co/rest/v1/thoughts");
        assert_eq!(
            store.table_url("select=*&is_public=eq.true"),
            "https://abcd.supabase.co/rest/v1/thoughts?select=*&is_public=eq.true"
        );
    }

    #[test]
    fn test_eq_filter_encodes_value() {
        assert_eq!(eq_filter("client_id", "abc-123"), "client_id=eq.abc-123");
        assert_eq!(eq_filter("client_id", "a&b=c"), "client_id=eq.a%26b%3Dc");
    }

    #[test]
    fn test_rejects_unencodable_api_key() {
        let result = PostgrestStore::new(PostgrestConfig {
            api_key: Some("bad\nkey".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_insert_payload_shape() {
        let payload = NewThought {
            content: "x".to_string(),
            hash: "h".to_string(),
            is_public: false,
            client_id: "c".to_string(),
        };
        let json = serde_json::to_value([&payload]).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "content": "x",
                "hash": "h",
                "is_public": false,
                "client_id": "c"
            }])
        );
    }

    mod wire {
        use super::*;
        use serde_json::json;
        use wiremock::matchers::{self, body_json, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const TABLE: &str = "/rest/v1/thoughts";

        fn row(id: serde_json::Value, content: &str, created_at: &str) -> serde_json::Value {
            json!({
                "id": id,
                "content": content,
                "hash": crate::hash::seal_hash(content),
                "is_public": true,
                "client_id": "c1",
                "created_at": created_at
            })
        }

        #[tokio::test]
        async fn test_count_reads_content_range_total() {
            let server = MockServer::start().await;
            Mock::given(method("HEAD"))
                .and(path(TABLE))
                .and(query_param("client_id", "eq.c1"))
                .and(matchers::header("Prefer", "count=exact"))
                .and(matchers::header("apikey", "anon-key"))
                .and(matchers::header("authorization", "Bearer anon-key"))
                .respond_with(ResponseTemplate::new(206).insert_header("Content-Range", "0-2/3"))
                .expect(1)
                .mount(&server)
                .await;

            let count = store(&server.uri())
                .count_by_client(&ClientId::from("c1"))
                .await
                .unwrap();
            assert_eq!(count, 3);
        }

        #[tokio::test]
        async fn test_count_filter_value_is_encoded() {
            let server = MockServer::start().await;
            Mock::given(method("HEAD"))
                .and(path(TABLE))
                .and(query_param("client_id", "eq.a&b=c"))
                .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "*/0"))
                .expect(1)
                .mount(&server)
                .await;

            let count = store(&server.uri())
                .count_by_client(&ClientId::from("a&b=c"))
                .await
                .unwrap();
            assert_eq!(count, 0);
        }

        #[tokio::test]
        async fn test_count_without_content_range_is_invalid() {
            let server = MockServer::start().await;
            Mock::given(method("HEAD"))
                .and(path(TABLE))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;

            let result = store(&server.uri())
                .count_by_client(&ClientId::from("c1"))
                .await;
            assert!(matches!(result, Err(StoreError::InvalidResponse(_))));
        }

        #[tokio::test]
        async fn test_count_server_error_propagates() {
            let server = MockServer::start().await;
            Mock::given(method("HEAD"))
                .and(path(TABLE))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let result = store(&server.uri())
                .count_by_client(&ClientId::from("c1"))
                .await;
            assert!(matches!(result, Err(StoreError::Server { status: 500, .. })));
        }

        #[tokio::test]
        async fn test_insert_returns_first_representation_row() {
            let server = MockServer::start().await;
            let hash = crate::hash::seal_hash("Bitcoin hits 100k by EOY");
            Mock::given(method("POST"))
                .and(path(TABLE))
                .and(matchers::header("Prefer", "return=representation"))
                .and(body_json(json!([{
                    "content": "Bitcoin hits 100k by EOY",
                    "hash": hash,
                    "is_public": false,
                    "client_id": "c1"
                }])))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                    "id": 7,
                    "content": "Bitcoin hits 100k by EOY",
                    "hash": hash,
                    "is_public": false,
                    "client_id": "c1",
                    "created_at": "2025-01-05T10:20:30.123456+00:00"
                }])))
                .expect(1)
                .mount(&server)
                .await;

            let row = store(&server.uri())
                .insert(NewThought {
                    content: "Bitcoin hits 100k by EOY".to_string(),
                    hash: hash.clone(),
                    is_public: false,
                    client_id: "c1".to_string(),
                })
                .await
                .unwrap();
            assert_eq!(row.id, "7");
            assert_eq!(row.hash, hash);
            assert!(!row.is_public);
        }

        #[tokio::test]
        async fn test_insert_with_empty_representation_fails() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(TABLE))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
                .mount(&server)
                .await;

            let result = store(&server.uri())
                .insert(NewThought {
                    content: "x".to_string(),
                    hash: crate::hash::seal_hash("x"),
                    is_public: false,
                    client_id: "c1".to_string(),
                })
                .await;
            assert!(matches!(result, Err(StoreError::InvalidResponse(_))));
        }

        #[tokio::test]
        async fn test_list_public_filters_and_orders_on_the_server() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(TABLE))
                .and(query_param("select", "*"))
                .and(query_param("is_public", "eq.true"))
                .and(query_param("order", "created_at.desc"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    row(json!(2), "newer", "2025-01-06T00:00:00+00:00"),
                    row(json!(1), "older", "2025-01-05T00:00:00+00:00"),
                ])))
                .expect(1)
                .mount(&server)
                .await;

            let rows = store(&server.uri()).list_public().await.unwrap();
            let ids: Vec<_> = rows.iter().map(|t| t.id.as_str()).collect();
            assert_eq!(ids, vec!["2", "1"]);
        }

        #[tokio::test]
        async fn test_list_by_client_sends_owner_filter() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(TABLE))
                .and(query_param("client_id", "eq.c1"))
                .and(query_param("order", "created_at.desc"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(
                    json!("0b6f7c1e-58d4-4a59-9f43-2f6f2bb0d0a1"),
                    "mine",
                    "2025-01-05T00:00:00+00:00"
                )])))
                .expect(1)
                .mount(&server)
                .await;

            let rows = store(&server.uri())
                .list_by_client(&ClientId::from("c1"))
                .await
                .unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].content, "mine");
        }

        #[tokio::test]
        async fn test_get_existing_row() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(TABLE))
                .and(query_param("id", "eq.42"))
                .and(query_param("limit", "1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(
                    json!(42),
                    "found",
                    "2025-01-05T00:00:00+00:00"
                )])))
                .mount(&server)
                .await;

            let thought = store(&server.uri()).get("42").await.unwrap();
            assert_eq!(thought.map(|t| t.content), Some("found".to_string()));
        }

        #[tokio::test]
        async fn test_get_unknown_id_is_none() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(TABLE))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
                .mount(&server)
                .await;

            assert_eq!(store(&server.uri()).get("999").await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_get_id_rejected_by_column_type_is_none() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(TABLE))
                .and(query_param("id", "eq.abc"))
                .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                    "code": "22P02",
                    "details": null,
                    "hint": null,
                    "message": "invalid input syntax for type bigint: \"abc\""
                })))
                .mount(&server)
                .await;

            assert_eq!(store(&server.uri()).get("abc").await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_get_server_error_is_not_hidden() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(TABLE))
                .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
                .mount(&server)
                .await;

            let result = store(&server.uri()).get("42").await;
            assert!(matches!(result, Err(StoreError::Server { status: 503, .. })));
        }
    }
}
