use serde_json::Value;
use std::fmt;

/// Upstream failure that keeps the raw response for diagnosis.
#[derive(Debug, Clone)]
pub struct ProviderDiagnosticsError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
    pub raw_body: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl fmt::Display for ProviderDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "universe provider error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for ProviderDiagnosticsError {}
