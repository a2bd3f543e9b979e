//! Bucket configuration value types.
//!
//! These are the comparable, backend-agnostic shapes of every property the
//! reconciler manages. Backends translate them to and from their wire types.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

// ---------------------------------------------------------------------------
// BucketName
// ---------------------------------------------------------------------------

/// A non-empty S3 bucket name.
///
/// Only emptiness is rejected here. Legacy buckets in us-east-1 may still
/// carry uppercase letters or underscores, so names breaking the current
/// naming rules are accepted with a warning and the backend has the final
/// say. The current rules (per AWS documentation):
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and dots
/// - Must start and end with a letter or number
/// - No consecutive dots (`..`)
/// - Not formatted as an IPv4 address
///
/// # Examples
///
/// ```
/// use deploybucket_model::BucketName;
///
/// assert!(BucketName::new("my-deployment-bucket").is_ok());
/// assert!(BucketName::new("b1").is_ok());
/// assert!(BucketName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketName(String);

impl BucketName {
    /// Wrap a bucket name, warning when it breaks the current naming rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBucketName`] if the name is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::InvalidBucketName {
                name,
                reason: "must not be empty".to_owned(),
            });
        }

        let bucket = Self(name);
        if let Some(reason) = bucket.naming_violation() {
            warn!(bucket = %bucket, reason = %reason, "bucket name breaks the S3 naming rules");
        }
        Ok(bucket)
    }

    /// Get the bucket name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first current S3 naming rule this name breaks, if any.
    #[must_use]
    pub fn naming_violation(&self) -> Option<String> {
        let name = self.0.as_str();
        let len = name.len();
        if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
            return Some(format!(
                "must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
            ));
        }

        if !name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
        {
            return Some(
                "must only contain lowercase letters, numbers, hyphens, and dots".to_owned(),
            );
        }

        let bytes = name.as_bytes();
        let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
        if !alnum(bytes[0]) || !alnum(bytes[len - 1]) {
            return Some("must start and end with a letter or number".to_owned());
        }

        if name.contains("..") {
            return Some("must not contain consecutive dots".to_owned());
        }

        if name.parse::<Ipv4Addr>().is_ok() {
            return Some("must not be formatted as an IP address".to_owned());
        }

        None
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BucketName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BucketName> for String {
    fn from(value: BucketName) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// FeatureStatus
// ---------------------------------------------------------------------------

/// On/off status shared by bucket versioning and transfer acceleration.
///
/// S3 has no way to return a bucket to the "never configured" state once
/// either feature has been touched, so the only writable values are
/// `Enabled` and `Suspended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureStatus {
    /// The feature is active.
    Enabled,
    /// The feature was active and has been turned off.
    Suspended,
}

impl FeatureStatus {
    /// Map a desired boolean onto the status that expresses it.
    #[must_use]
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Suspended
        }
    }

    /// Whether this status means the feature is active.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }

    /// The wire value (`"Enabled"` / `"Suspended"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ServerSideEncryption
// ---------------------------------------------------------------------------

/// Default server-side encryption to apply to the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerSideEncryption {
    /// SSE-S3 (`AES256`).
    Aes256,
    /// SSE-KMS (`aws:kms`), optionally with a customer managed key.
    AwsKms {
        /// KMS key id or ARN; `None` uses the AWS managed `aws/s3` key.
        kms_key_id: Option<String>,
    },
}

impl ServerSideEncryption {
    /// Wire value for SSE-S3.
    pub const AES256: &str = "AES256";
    /// Wire value for SSE-KMS.
    pub const AWS_KMS: &str = "aws:kms";

    /// Build from the host's `serverSideEncryption` / `kmsKeyID` pair.
    ///
    /// The key id is only meaningful for `aws:kms` and is dropped otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedEncryption`] for any other algorithm.
    ///
    /// # Examples
    ///
    /// ```
    /// use deploybucket_model::ServerSideEncryption;
    ///
    /// let sse = ServerSideEncryption::parse("aws:kms", Some("k1".to_owned())).unwrap();
    /// assert_eq!(sse.algorithm(), "aws:kms");
    /// assert_eq!(sse.kms_key_id(), Some("k1"));
    /// ```
    pub fn parse(algorithm: &str, kms_key_id: Option<String>) -> Result<Self, ConfigError> {
        match algorithm {
            Self::AES256 => Ok(Self::Aes256),
            Self::AWS_KMS => Ok(Self::AwsKms { kms_key_id }),
            other => Err(ConfigError::UnsupportedEncryption(other.to_owned())),
        }
    }

    /// The SSE algorithm wire value.
    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Aes256 => Self::AES256,
            Self::AwsKms { .. } => Self::AWS_KMS,
        }
    }

    /// The KMS key id, if any.
    #[must_use]
    pub fn kms_key_id(&self) -> Option<&str> {
        match self {
            Self::Aes256 => None,
            Self::AwsKms { kms_key_id } => kms_key_id.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// PublicAccessBlockConfig
// ---------------------------------------------------------------------------

/// Public access block configuration for a bucket.
///
/// AWS defines exactly four boolean fields for this configuration. The
/// deployment bucket only ever uses the all-on or all-off shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct PublicAccessBlockConfig {
    /// Whether Amazon S3 should block public ACLs for this bucket.
    #[serde(default)]
    pub block_public_acls: bool,
    /// Whether Amazon S3 should ignore public ACLs for this bucket.
    #[serde(default)]
    pub ignore_public_acls: bool,
    /// Whether Amazon S3 should block public bucket policies.
    #[serde(default)]
    pub block_public_policy: bool,
    /// Whether Amazon S3 should restrict public bucket policies.
    #[serde(default)]
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockConfig {
    /// All four flags set to `block`.
    #[must_use]
    pub fn from_block(block: bool) -> Self {
        Self {
            block_public_acls: block,
            ignore_public_acls: block,
            block_public_policy: block,
            restrict_public_buckets: block,
        }
    }

    /// Whether every flag is on.
    #[must_use]
    pub fn is_fully_blocked(&self) -> bool {
        *self == Self::from_block(true)
    }

    /// Whether every flag is off.
    #[must_use]
    pub fn is_fully_open(&self) -> bool {
        *self == Self::from_block(false)
    }
}

// ---------------------------------------------------------------------------
// AccessLogging
// ---------------------------------------------------------------------------

/// Server access logging destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogging {
    /// Bucket that receives the access log objects.
    pub target_bucket: String,
    /// Key prefix for the log objects (may be empty).
    pub target_prefix: String,
}
