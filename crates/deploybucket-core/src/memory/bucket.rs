//! In-memory bucket state.
//!
//! A [`MemoryBucket`] holds the configuration surface the reconciler manages.
//! Interior mutability is achieved through `parking_lot::RwLock` for each
//! single-valued configuration field.

use deploybucket_model::{AccessLogging, FeatureStatus, PublicAccessBlockConfig, Tag};
use parking_lot::RwLock;
use tracing::debug;

use crate::backend::AppliedEncryption;

/// A bucket with all its managed configuration.
pub struct MemoryBucket {
    /// Bucket name.
    pub name: String,
    /// Account that owns the bucket.
    pub owner: String,
    /// Versioning status; `None` if never configured.
    pub versioning: RwLock<Option<FeatureStatus>>,
    /// Transfer acceleration status; `None` if never configured.
    pub accelerate: RwLock<Option<FeatureStatus>>,
    /// Server-side encryption configuration.
    pub encryption: RwLock<Option<AppliedEncryption>>,
    /// Bucket policy (JSON string).
    pub policy: RwLock<Option<String>>,
    /// Bucket tags.
    pub tags: RwLock<Vec<Tag>>,
    /// Public access block settings.
    pub public_access_block: RwLock<Option<PublicAccessBlockConfig>>,
    /// Access logging destination.
    pub logging: RwLock<Option<AccessLogging>>,
}

impl std::fmt::Debug for MemoryBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBucket")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("versioning", &*self.versioning.read())
            .finish_non_exhaustive()
    }
}

impl MemoryBucket {
    /// Create an unconfigured bucket owned by `owner`.
    #[must_use]
    pub fn new(name: String, owner: String) -> Self {
        Self {
            name,
            owner,
            versioning: RwLock::new(None),
            accelerate: RwLock::new(None),
            encryption: RwLock::new(None),
            policy: RwLock::new(None),
            tags: RwLock::new(Vec::new()),
            public_access_block: RwLock::new(None),
            logging: RwLock::new(None),
        }
    }

    /// Set the versioning status.
    pub fn set_versioning(&self, status: FeatureStatus) {
        debug!(bucket = %self.name, %status, "setting versioning");
        *self.versioning.write() = Some(status);
    }

    /// Set the transfer acceleration status.
    pub fn set_accelerate(&self, status: FeatureStatus) {
        debug!(bucket = %self.name, %status, "setting acceleration");
        *self.accelerate.write() = Some(status);
    }

    /// Replace the tag set.
    pub fn set_tags(&self, tags: Vec<Tag>) {
        *self.tags.write() = tags;
    }

    /// Set (or remove) the public access block.
    pub fn set_public_access_block(&self, config: Option<PublicAccessBlockConfig>) {
        *self.public_access_block.write() = config;
    }

    /// Set (or remove) the access logging destination.
    pub fn set_logging(&self, logging: Option<AccessLogging>) {
        *self.logging.write() = logging;
    }

    /// Set (or remove) the default encryption rule.
    pub fn set_encryption(&self, encryption: Option<AppliedEncryption>) {
        *self.encryption.write() = encryption;
    }
}
