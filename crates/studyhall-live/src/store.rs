//! Thin reader/writer for the backend's row store.
//!
//! Dashboards read historical rows once, then keep them fresh with a
//! change feed. The store is treated as an opaque collaborator: requests
//! either succeed with rows or fail with a `StoreError`.

use studyhall_common::StoreError;
use tracing::debug;

use crate::feed::FieldFilter;

/// Coordinates for the row store.
#[derive(Clone)]
pub struct StoreConfig {
    pub project_ref: String,
    pub api_key: String,
    /// Optional auth JWT; falls back to the anon key.
    pub access_token: Option<String>,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("project_ref", &self.project_ref)
            .field("api_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Client for reading and writing rows in the backend store.
pub struct StoreClient {
    http: reqwest::Client,
    config: StoreConfig,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Read rows from a collection, optionally narrowed by an equality
    /// filter and a row limit.
    pub async fn select(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
        limit: Option<u32>,
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        let url = build_select_url(&self.config.project_ref, collection, filter, limit);
        debug!(collection = %collection, "Store select");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(StoreError::Request(format!("HTTP {status}: {text}")));
        }

        response
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Insert one row into a collection.
    pub async fn insert(
        &self,
        collection: &str,
        row: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let url = format!(
            "https://{}.supabase.co/rest/v1/{}",
            self.config.project_ref, collection
        );
        debug!(collection = %collection, "Store insert");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(StoreError::Request(format!("HTTP {status}: {text}")));
        }
        Ok(())
    }

    fn bearer(&self) -> &str {
        self.config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.api_key)
    }
}

fn build_select_url(
    project_ref: &str,
    collection: &str,
    filter: Option<&FieldFilter>,
    limit: Option<u32>,
) -> String {
    let mut url = format!(
        "https://{project_ref}.supabase.co/rest/v1/{collection}?select=*"
    );
    if let Some(f) = filter {
        url.push('&');
        url.push_str(&f.to_expr());
    }
    if let Some(n) = limit {
        url.push_str(&format!("&limit={n}"));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_url_without_filter() {
        let url = build_select_url("abcdefghij", "course_progress", None, None);
        assert_eq!(
            url,
            "https://abcdefghij.supabase.co/rest/v1/course_progress?select=*"
        );
    }

    #[test]
    fn select_url_with_filter_and_limit() {
        let filter = FieldFilter::eq("user_id", "u1");
        let url = build_select_url("abcdefghij", "orders", Some(&filter), Some(50));
        assert_eq!(
            url,
            "https://abcdefghij.supabase.co/rest/v1/orders?select=*&user_id=eq.u1&limit=50"
        );
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = StoreConfig {
            project_ref: "abcdefghij".into(),
            api_key: "anon-secret".into(),
            access_token: Some("jwt-secret".into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("anon-secret"));
        assert!(!debug.contains("jwt-secret"));
    }

    #[test]
    fn bearer_falls_back_to_api_key() {
        let client = StoreClient::new(StoreConfig {
            project_ref: "p".into(),
            api_key: "anon".into(),
            access_token: None,
        });
        assert_eq!(client.bearer(), "anon");

        let client = StoreClient::new(StoreConfig {
            project_ref: "p".into(),
            api_key: "anon".into(),
            access_token: Some("jwt".into()),
        });
        assert_eq!(client.bearer(), "jwt");
    }
}
