//! Configuration error types.

/// Error raised while resolving the host configuration into a desired state.
///
/// All variants describe problems with user input; they are reported once at
/// startup and never reach the reconciler.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The host framework version string could not be parsed.
    #[error("invalid framework version: {0} (expected MAJOR.MINOR[.PATCH])")]
    InvalidFrameworkVersion(String),

    /// The configured bucket name is empty.
    #[error("invalid bucket name {name:?}: {reason}")]
    InvalidBucketName {
        /// The rejected name.
        name: String,
        /// The rule that was violated.
        reason: String,
    },

    /// The requested server-side encryption algorithm is not supported.
    #[error("unsupported server-side encryption algorithm: {0} (expected AES256 or aws:kms)")]
    UnsupportedEncryption(String),

    /// The provider deployment bucket was given in a form this tool does not accept.
    #[error("provider.{key} must be an object with a `name` field")]
    LegacyDeploymentBucket {
        /// The provider key holding the offending value.
        key: &'static str,
    },

    /// A configuration section failed to deserialize.
    #[error("invalid `{section}` configuration: {source}")]
    Malformed {
        /// Dotted path of the section (e.g. `custom.deploymentBucket`).
        section: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience result type for configuration resolution.
pub type ConfigResult<T> = Result<T, ConfigError>;
