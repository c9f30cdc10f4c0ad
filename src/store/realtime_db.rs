//! Firebase Realtime Database over its REST interface.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use super::{StoreError, TelemetryStore};
use crate::config::StoreConfig;
use crate::domain::{KeyedHistory, TelemetrySample};

/// Marker the database puts in a 400 body when an ordered query targets a
/// child without an `.indexOn` rule.
const MISSING_INDEX_MARKER: &str = "Index not defined";

pub struct RealtimeDbStore {
    client: Client,
    base_url: String,
    path: String,
    auth_token: Option<String>,
}

impl RealtimeDbStore {
    pub fn new(base_url: &str, cfg: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(cfg.timeout()).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            path: cfg.path.trim_matches('/').to_string(),
            auth_token: cfg.auth_token.clone(),
        })
    }

    fn node_url(&self) -> String {
        format!("{}/{}.json", self.base_url, self.path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => req.query(&[("auth", token.as_str())]),
            None => req,
        }
    }

    /// Decode a node snapshot. `null` is an empty node; entries that are not
    /// telemetry samples are skipped.
    fn decode_snapshot(body: &str) -> Result<KeyedHistory, StoreError> {
        let node: Option<BTreeMap<String, Value>> =
            serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;

        let mut history = KeyedHistory::new();
        for (key, value) in node.unwrap_or_default() {
            match serde_json::from_value::<TelemetrySample>(value) {
                Ok(sample) => {
                    history.insert(key, sample);
                }
                Err(e) => warn!(key = %key, error = %e, "skipping malformed telemetry entry"),
            }
        }
        Ok(history)
    }
}

#[async_trait]
impl TelemetryStore for RealtimeDbStore {
    fn backend(&self) -> &'static str {
        "realtime_db"
    }

    async fn fetch_since(&self, start_ts: i64) -> Result<KeyedHistory, StoreError> {
        let req = self.client.get(self.node_url()).query(&[
            ("orderBy", "\"timestamp\"".to_string()),
            ("startAt", start_ts.to_string()),
        ]);

        debug!(path = %self.path, start_ts, "querying telemetry");
        let resp = self.authorized(req).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::BAD_REQUEST && body.contains(MISSING_INDEX_MARKER) {
            error!(path = %self.path, body = %body, "telemetry query rejected, add an index on timestamp");
            return Err(StoreError::Index(body));
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let history = Self::decode_snapshot(&body)?;
        Ok(history
            .into_iter()
            .filter(|(_, s)| s.timestamp >= start_ts)
            .collect())
    }

    async fn write_batch(&self, batch: KeyedHistory) -> Result<usize, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let written = batch.len();
        let req = self.client.patch(self.node_url()).json(&batch);
        let resp = self.authorized(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(path = %self.path, written, "telemetry batch written");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer, auth_token: Option<&str>) -> RealtimeDbStore {
        let cfg = StoreConfig {
            auth_token: auth_token.map(str::to_string),
            ..Default::default()
        };
        RealtimeDbStore::new(&server.uri(), &cfg).unwrap()
    }

    #[test]
    fn test_decode_null_snapshot() {
        assert!(RealtimeDbStore::decode_snapshot("null").unwrap().is_empty());
    }

    #[test]
    fn test_decode_skips_malformed_entries() {
        let body = r#"{
            "-Nx1": {"timestamp": 1700000000, "battery_soc_perc": 64.2},
            "-Nx2": "garbage",
            "-Nx3": {"battery_soc_perc": 12.0}
        }"#;
        let history = RealtimeDbStore::decode_snapshot(body).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history["-Nx1"].battery_soc_perc, 64.2);
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(matches!(
            RealtimeDbStore::decode_snapshot("[1, 2"),
            Err(StoreError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_since_sends_ordered_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solar_telemetry.json"))
            .and(query_param("orderBy", "\"timestamp\""))
            .and(query_param("startAt", "1700000000"))
            .and(query_param("auth", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "-Nx1": {"timestamp": 1700000100, "sunlight_lux": 5000, "battery_soc_perc": 80.0},
                "mock_1700003700": {"timestamp": 1700003700, "battery_soc_perc": 81.0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, Some("secret"));
        let history = store.fetch_since(1_700_000_000).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history["-Nx1"].sunlight_lux, 5000);
    }

    #[tokio::test]
    async fn test_missing_index_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Index not defined, add \".indexOn\": \"timestamp\", for path \"/solar_telemetry\", to the rules"
            })))
            .mount(&server)
            .await;

        let err = store_for(&server, None).fetch_since(0).await.unwrap_err();
        assert!(matches!(err, StoreError::Index(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Permission denied"))
            .mount(&server)
            .await;

        match store_for(&server, None).fetch_since(0).await {
            Err(StoreError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Permission denied");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_batch_patches_node() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/solar_telemetry.json"))
            .and(body_partial_json(json!({
                "mock_1700000000": {"timestamp": 1700000000}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut batch = KeyedHistory::new();
        batch.insert(
            "mock_1700000000".to_string(),
            TelemetrySample {
                timestamp: 1_700_000_000,
                sunlight_lux: 0,
                panel_temp_c: 20.0,
                dc_voltage_v: 0.0,
                dc_current_ma: 0,
                dc_power_w: 0.0,
                battery_soc_perc: 47.4,
            },
        );

        let written = store_for(&server, None).write_batch(batch).await.unwrap();
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let written = store_for(&server, None)
            .write_batch(KeyedHistory::new())
            .await
            .unwrap();
        assert_eq!(written, 0);
    }
}
