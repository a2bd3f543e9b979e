//! Runner configuration.
//!
//! Provides [`RunnerConfig`] for the process that drives a reconciliation.
//! Values are loaded from environment variables; the host's own
//! configuration arrives separately as the service definition file.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default location of the host's resolved service definition.
pub const DEFAULT_SERVICE_DEFINITION: &str = ".serverless/service.json";

/// Runner configuration.
///
/// # Examples
///
/// ```
/// use deploybucket_core::config::RunnerConfig;
///
/// let config = RunnerConfig::default();
/// assert_eq!(config.region, "us-east-1");
/// assert_eq!(config.wait_timeout_secs, 100);
/// assert!(config.endpoint_url.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Path to the resolved service definition (JSON).
    #[builder(default = String::from(DEFAULT_SERVICE_DEFINITION))]
    pub service_definition: String,

    /// Host framework version, used to locate the provider bucket key.
    #[builder(default = String::from("3.0.0"))]
    pub framework_version: String,

    /// AWS region the bucket lives in.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Custom S3 endpoint (e.g. a local emulator).
    #[builder(default, setter(strip_option))]
    pub endpoint_url: Option<String>,

    /// Whether to use path-style bucket addressing.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Upper bound for the bucket-exists waiter, in seconds.
    #[builder(default = 100)]
    pub wait_timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            service_definition: String::from(DEFAULT_SERVICE_DEFINITION),
            framework_version: String::from("3.0.0"),
            region: String::from("us-east-1"),
            endpoint_url: None,
            force_path_style: false,
            wait_timeout_secs: 100,
            log_level: String::from("info"),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SERVICE_DEFINITION` | `.serverless/service.json` |
    /// | `FRAMEWORK_VERSION` | `3.0.0` |
    /// | `DEFAULT_REGION` / `AWS_REGION` | `us-east-1` |
    /// | `S3_ENDPOINT_URL` | unset |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `WAIT_TIMEOUT_SECS` | `100` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("SERVICE_DEFINITION") {
            config.service_definition = v;
        }
        if let Some(v) = lookup("FRAMEWORK_VERSION") {
            config.framework_version = v;
        }
        if let Some(v) = lookup("DEFAULT_REGION").or_else(|| lookup("AWS_REGION")) {
            config.region = v;
        }
        if let Some(v) = lookup("S3_ENDPOINT_URL").filter(|v| !v.is_empty()) {
            config.endpoint_url = Some(v);
        }
        if let Some(v) = lookup("S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        if let Some(n) = lookup("WAIT_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            config.wait_timeout_secs = n;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The waiter bound as a [`Duration`].
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
