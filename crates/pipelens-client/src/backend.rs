// HTTP client for the dashboard backend proxy

use crate::config::ClientConfig;
use crate::error::{FetchError, Result};
use crate::source::{LogQuery, LogSource};
use async_trait::async_trait;
use pipelens_core::LogRecord;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // GET an endpoint and decode its JSON body
    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, "fetching");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), "backend returned an error");
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| FetchError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn get_records(&self, endpoint: &str) -> Result<Vec<LogRecord>> {
        let raw: Vec<Value> = self.get(endpoint).await?;
        let records = decode_records(endpoint, raw);
        info!(endpoint, count = records.len(), "fetched log records");
        Ok(records)
    }

    async fn get_names(&self, endpoint: &str) -> Result<Vec<String>> {
        let names: Vec<String> = self.get(endpoint).await?;
        info!(endpoint, count = names.len(), "fetched names");
        Ok(names)
    }
}

/// Decode records one by one; entries that are not JSON objects are skipped
/// so one bad entry never drops the whole response.
pub fn decode_records(endpoint: &str, raw: Vec<Value>) -> Vec<LogRecord> {
    let total = raw.len();
    let records: Vec<LogRecord> = raw
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(endpoint, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!(endpoint, skipped = total - records.len(), "skipped malformed records");
    }
    records
}

#[async_trait]
impl LogSource for BackendClient {
    async fn projects(&self) -> Result<Vec<String>> {
        self.get_names("/projects").await
    }

    async fn environments(&self) -> Result<Vec<String>> {
        self.get_names("/environments").await
    }

    async fn servers(&self) -> Result<Vec<String>> {
        self.get_names("/servers").await
    }

    async fn analysis(&self) -> Result<Vec<LogRecord>> {
        self.get_records("/analysis").await
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<LogRecord>> {
        self.get_records(&query.path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let config = ClientConfig {
            base_url: "http://localhost:4000/api/".to_string(),
            ..Default::default()
        };
        let client = BackendClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000/api");
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = ClientConfig {
            base_url: "localhost:4000".to_string(),
            ..Default::default()
        };
        assert!(matches!(BackendClient::new(&config), Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_decode_skips_non_objects() {
        let raw = vec![
            json!({"project": "a", "tool": "git"}),
            json!("oops"),
            json!(null),
            json!({"project": "b", "build_error_count": "NaN-ish"}),
        ];
        let records = decode_records("/analysis", raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].project.as_deref(), Some("b"));
    }
}
