use crate::config::Settings;
use crate::domain::contract::UniverseSnapshot;
use crate::ingest::error::ProviderDiagnosticsError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/universe";
const DEFAULT_RETRIES: u32 = 3;

#[async_trait::async_trait]
pub trait UniverseProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// `as_of_date` is forwarded to the source when given; matching it is
    /// checked later by the snapshot contract.
    async fn fetch_universe(&self, as_of_date: Option<NaiveDate>) -> Result<UniverseSnapshot>;
}

#[derive(Debug, Clone)]
pub struct JsonFileUniverseProvider {
    path: PathBuf,
}

impl JsonFileUniverseProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl UniverseProvider for JsonFileUniverseProvider {
    fn provider_name(&self) -> &'static str {
        "json_file"
    }

    async fn fetch_universe(&self, _as_of_date: Option<NaiveDate>) -> Result<UniverseSnapshot> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read universe file {}", self.path.display()))?;
        serde_json::from_str::<UniverseSnapshot>(&text).with_context(|| {
            format!(
                "universe file {} does not match the snapshot schema",
                self.path.display()
            )
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpJsonUniverseProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonUniverseProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_universe_base_url()?.to_string();
        let api_key = settings.universe_api_key.clone();

        let timeout_secs = std::env::var("UNIVERSE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("UNIVERSE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let path = std::env::var("UNIVERSE_SNAPSHOT_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build universe provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        join_url(&self.base_url, &self.path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, as_of_date: Option<NaiveDate>) -> Result<UniverseSnapshot> {
        let mut req = self.http.get(self.url()).headers(self.headers()?);
        if let Some(date) = as_of_date {
            req = req.query(&[("as_of_date", date.to_string())]);
        }
        let res = req.send().await.context("universe provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read universe provider response")?;
        let raw_json = check_response(self.provider_name(), status, &text)?;

        serde_json::from_value::<UniverseSnapshot>(raw_json)
            .context("failed to parse provider response into UniverseSnapshot")
    }
}

#[async_trait::async_trait]
impl UniverseProvider for HttpJsonUniverseProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_universe(&self, as_of_date: Option<NaiveDate>) -> Result<UniverseSnapshot> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(as_of_date).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "universe fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Parses the body as JSON; non-success statuses and non-JSON bodies become
/// `ProviderDiagnosticsError` carrying the raw text.
fn check_response(provider: &'static str, status: StatusCode, text: &str) -> Result<Value> {
    let raw_json = serde_json::from_str::<Value>(text).ok();
    if !status.is_success() {
        return Err(ProviderDiagnosticsError {
            provider,
            stage: "http",
            detail: format!("status={status}"),
            raw_body: Some(text.to_string()),
            raw_response_json: raw_json,
        }
        .into());
    }
    raw_json.ok_or_else(|| {
        ProviderDiagnosticsError {
            provider,
            stage: "decode",
            detail: "response is not valid JSON".to_string(),
            raw_body: Some(text.to_string()),
            raw_response_json: None,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_base_and_path() {
        assert_eq!(
            join_url("https://data.example.com/", "v1/universe"),
            "https://data.example.com/v1/universe"
        );
        assert_eq!(
            join_url("https://data.example.com", DEFAULT_PATH),
            "https://data.example.com/v1/universe"
        );
    }

    #[test]
    fn http_failure_keeps_raw_body() {
        let err = check_response(
            "external_http_json",
            StatusCode::BAD_GATEWAY,
            r#"{"error":"upstream"}"#,
        )
        .unwrap_err();
        let diag = err.downcast_ref::<ProviderDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "http");
        assert_eq!(diag.raw_response_json, Some(json!({"error": "upstream"})));
    }

    #[test]
    fn non_json_success_is_a_decode_error() {
        let err = check_response("external_http_json", StatusCode::OK, "<html>").unwrap_err();
        let diag = err.downcast_ref::<ProviderDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "decode");
        assert_eq!(diag.raw_body.as_deref(), Some("<html>"));
    }

    #[test]
    fn snapshot_shape_round_trips_from_json() {
        let v = json!({"as_of_date": "2026-03-13", "securities": []});
        let raw = check_response("external_http_json", StatusCode::OK, &v.to_string()).unwrap();
        let snapshot: UniverseSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(
            snapshot.as_of_date,
            NaiveDate::from_ymd_opt(2026, 3, 13).unwrap()
        );
    }
}
