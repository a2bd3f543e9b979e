//! Host configuration model.
//!
//! The host framework hands over its fully resolved service definition as
//! JSON. Only two sections matter here:
//!
//! - `provider.deploymentBucket` (or `provider.deploymentBucketObject` on
//!   framework versions before 2.10): bucket name and encryption.
//! - `custom.deploymentBucket`: everything else this tool manages.
//!
//! Both are parsed once into typed structs and resolved into an immutable
//! [`DesiredConfiguration`]. Unknown keys in the `custom.deploymentBucket`
//! section are rejected rather than guessed at.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::error::{ConfigError, ConfigResult};
use crate::tags::TagSet;
use crate::types::{AccessLogging, BucketName, ServerSideEncryption};

/// Key of the plugin section under `custom`.
const PLUGIN_SECTION: &str = "deploymentBucket";

// ---------------------------------------------------------------------------
// FrameworkVersion
// ---------------------------------------------------------------------------

/// Version of the host framework, used to locate the provider bucket section.
///
/// # Examples
///
/// ```
/// use deploybucket_model::FrameworkVersion;
///
/// let v: FrameworkVersion = "2.9.0".parse().unwrap();
/// assert_eq!(v.deployment_bucket_key(), "deploymentBucketObject");
///
/// let v: FrameworkVersion = "3.38.0".parse().unwrap();
/// assert_eq!(v.deployment_bucket_key(), "deploymentBucket");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameworkVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl FrameworkVersion {
    /// Create a version from its major and minor components.
    #[must_use]
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Provider key holding the deployment bucket object.
    ///
    /// Version 2.10.0 moved the object from `deploymentBucketObject` to
    /// `deploymentBucket`.
    #[must_use]
    pub fn deployment_bucket_key(self) -> &'static str {
        if self >= Self::new(2, 10) {
            "deploymentBucket"
        } else {
            "deploymentBucketObject"
        }
    }
}

impl Default for FrameworkVersion {
    fn default() -> Self {
        Self::new(3, 0)
    }
}

impl FromStr for FrameworkVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidFrameworkVersion(s.to_owned());
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        Ok(Self::new(major, minor))
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ---------------------------------------------------------------------------
// Raw host sections
// ---------------------------------------------------------------------------

/// The parts of the host's resolved service definition this tool reads.
///
/// Every other top-level key is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceDefinition {
    /// The `provider` section.
    #[serde(default)]
    pub provider: Option<Map<String, Value>>,
    /// The `custom` section.
    #[serde(default)]
    pub custom: Option<Map<String, Value>>,
}

/// `provider.deploymentBucket`: identity and encryption of the bucket.
///
/// The host defines more fields here than this tool uses; they are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDeploymentBucket {
    /// Bucket name. Missing or empty disables the tool.
    #[serde(default)]
    pub name: Option<String>,
    /// `AES256` or `aws:kms`.
    #[serde(default)]
    pub server_side_encryption: Option<String>,
    /// KMS key for `aws:kms`.
    #[serde(default, rename = "kmsKeyID")]
    pub kms_key_id: Option<String>,
}

/// `custom.deploymentBucket`: plugin settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginSettings {
    /// Explicit `false` disables the tool; defaults to enabled.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Desired versioning state (default `false`).
    #[serde(default)]
    pub versioning: Option<bool>,
    /// Desired transfer acceleration state (default `false`).
    #[serde(default)]
    pub accelerate: Option<bool>,
    /// Bucket policy document.
    #[serde(default)]
    pub policy: Option<Value>,
    /// Raw tag list, filtered through [`TagSet::filter`].
    #[serde(default)]
    pub tags: Option<Value>,
    /// Tri-state public access block.
    #[serde(default)]
    pub block_public_access: Option<bool>,
    /// Server access logging destination.
    #[serde(default)]
    pub access_log: Option<AccessLogSettings>,
}

impl PluginSettings {
    /// Whether the tool is enabled (anything but an explicit `false`).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }
}

/// `custom.deploymentBucket.accessLog`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessLogSettings {
    /// Target bucket for access logs.
    pub bucket: String,
    /// Key prefix for access logs.
    #[serde(default)]
    pub prefix: String,
}

// ---------------------------------------------------------------------------
// DesiredConfiguration
// ---------------------------------------------------------------------------

/// Immutable snapshot of the declared bucket state for one run.
///
/// # Examples
///
/// ```
/// use deploybucket_model::{BucketName, DesiredConfiguration};
///
/// let desired = DesiredConfiguration::builder()
///     .bucket_name(BucketName::new("b1").unwrap())
///     .versioning(true)
///     .build();
/// assert!(desired.versioning);
/// assert!(!desired.accelerate);
/// assert!(desired.tags.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct DesiredConfiguration {
    /// The deployment bucket.
    pub bucket_name: BucketName,
    /// Default encryption; `None` leaves encryption untouched.
    #[builder(default, setter(strip_option))]
    pub server_side_encryption: Option<ServerSideEncryption>,
    /// Whether versioning should be enabled.
    #[builder(default)]
    pub versioning: bool,
    /// Whether transfer acceleration should be enabled.
    #[builder(default)]
    pub accelerate: bool,
    /// Bucket policy document, applied verbatim on every run.
    #[builder(default, setter(strip_option))]
    pub policy: Option<Value>,
    /// Bucket tags; `None` means the bucket should carry no tags.
    #[builder(default, setter(strip_option))]
    pub tags: Option<TagSet>,
    /// Public access block: `Some(true)` blocks, `Some(false)` or `None` clears.
    #[builder(default, setter(strip_option))]
    pub block_public_access: Option<bool>,
    /// Access logging destination; `None` means logging should be off.
    #[builder(default, setter(strip_option))]
    pub access_logging: Option<AccessLogging>,
}

impl DesiredConfiguration {
    /// Resolve the desired state from the host's service definition.
    ///
    /// Returns `Ok(None)` when the tool is disabled: either
    /// `custom.deploymentBucket.enabled` is `false` or no bucket name is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for malformed sections, unknown plugin keys,
    /// empty access log bucket names or unsupported encryption algorithms.
    pub fn resolve(
        service: &ServiceDefinition,
        version: FrameworkVersion,
    ) -> ConfigResult<Option<Self>> {
        let settings = plugin_settings(service)?;
        if !settings.is_enabled() {
            debug!("deployment bucket management disabled by configuration");
            return Ok(None);
        }

        let provider = provider_bucket(service, version)?;
        let Some(name) = provider.name.filter(|n| !n.is_empty()) else {
            debug!("no deployment bucket name configured");
            return Ok(None);
        };
        let bucket_name = BucketName::new(name)?;

        let server_side_encryption = provider
            .server_side_encryption
            .filter(|a| !a.is_empty())
            .map(|a| ServerSideEncryption::parse(&a, provider.kms_key_id))
            .transpose()?;

        let access_logging = settings
            .access_log
            .map(|log| {
                let target = BucketName::new(log.bucket)?;
                Ok::<_, ConfigError>(AccessLogging {
                    target_bucket: target.into(),
                    target_prefix: log.prefix,
                })
            })
            .transpose()?;

        Ok(Some(Self {
            bucket_name,
            server_side_encryption,
            versioning: settings.versioning.unwrap_or(false),
            accelerate: settings.accelerate.unwrap_or(false),
            policy: settings.policy,
            tags: settings.tags.as_ref().and_then(TagSet::filter),
            block_public_access: settings.block_public_access,
            access_logging,
        }))
    }

    /// The policy document as sent to the backend.
    ///
    /// A JSON string is taken to be an already serialized document and is
    /// passed through unchanged.
    #[must_use]
    pub fn policy_document(&self) -> Option<String> {
        self.policy.as_ref().map(|policy| match policy {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        })
    }
}

fn plugin_settings(service: &ServiceDefinition) -> ConfigResult<PluginSettings> {
    let section = service
        .custom
        .as_ref()
        .and_then(|custom| custom.get(PLUGIN_SECTION))
        .filter(|v| !v.is_null());

    match section {
        None => Ok(PluginSettings::default()),
        Some(value) => {
            PluginSettings::deserialize(value).map_err(|source| ConfigError::Malformed {
                section: format!("custom.{PLUGIN_SECTION}"),
                source,
            })
        }
    }
}

fn provider_bucket(
    service: &ServiceDefinition,
    version: FrameworkVersion,
) -> ConfigResult<ProviderDeploymentBucket> {
    let key = version.deployment_bucket_key();
    let section = service
        .provider
        .as_ref()
        .and_then(|provider| provider.get(key))
        .filter(|v| !v.is_null());

    match section {
        None => Ok(ProviderDeploymentBucket::default()),
        Some(value @ Value::Object(_)) => {
            ProviderDeploymentBucket::deserialize(value).map_err(|source| {
                ConfigError::Malformed {
                    section: format!("provider.{key}"),
                    source,
                }
            })
        }
        Some(_) => Err(ConfigError::LegacyDeploymentBucket { key }),
    }
}
