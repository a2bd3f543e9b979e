//! Desired-state model for the deployment bucket.
//!
//! This crate holds the strongly-typed vocabulary shared by the reconciler and
//! the storage backends: bucket names, tags, encryption, versioning and
//! acceleration status, public access block and access logging settings. It
//! also owns the host configuration model and its one-shot resolution into a
//! [`DesiredConfiguration`].
//!
//! # Architecture
//!
//! ```text
//! host service definition (JSON)
//!        |
//!        v
//! ServiceDefinition  --(FrameworkVersion)-->  DesiredConfiguration
//!                                                    |
//!                                                    v
//!                                     reconciler (deploybucket-core)
//! ```

pub mod config;
pub mod error;
pub mod tags;
pub mod types;

pub use config::{
    AccessLogSettings, DesiredConfiguration, FrameworkVersion, PluginSettings,
    ProviderDeploymentBucket, ServiceDefinition,
};
pub use error::{ConfigError, ConfigResult};
pub use tags::{Tag, TagSet};
pub use types::{
    AccessLogging, BucketName, FeatureStatus, PublicAccessBlockConfig, ServerSideEncryption,
};
