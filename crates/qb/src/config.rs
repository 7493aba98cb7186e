use std::path::Path;

use serde::Deserialize;

use crate::error::GatewayError;

/// Connection settings for the request processor.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Application name registered with QuickBooks on first connect.
    pub app_name: String,
    /// Base URL of the qbXML bridge.
    pub endpoint: String,
    /// Company file path; empty means the file currently open in QuickBooks.
    pub company_file: String,
    /// qbXML version declared on query requests.
    pub query_version: String,
    /// qbXML version declared on add requests.
    pub add_version: String,
    /// HTTP timeout per call.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            app_name: "Quickbooks Connector".into(),
            endpoint: "http://127.0.0.1:8080/qbxml".into(),
            company_file: String::new(),
            query_version: "16.0".into(),
            add_version: "13.0".into(),
            timeout_secs: 60,
        }
    }
}

impl GatewayConfig {
    pub fn from_toml(input: &str) -> Result<Self, GatewayError> {
        let config: GatewayConfig =
            toml::from_str(input).map_err(|e| GatewayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.app_name.trim().is_empty() {
            return Err(GatewayError::Config("app_name must not be empty".into()));
        }

        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(GatewayError::Config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }

        for (key, version) in [("query_version", &self.query_version), ("add_version", &self.add_version)] {
            if !is_qbxml_version(version) {
                return Err(GatewayError::Config(format!(
                    "{key} must look like '16.0', got '{version}'"
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(GatewayError::Config("timeout_secs must be positive".into()));
        }

        Ok(())
    }
}

fn is_qbxml_version(v: &str) -> bool {
    match v.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
