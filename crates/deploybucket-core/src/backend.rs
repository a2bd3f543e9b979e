//! The storage backend boundary.
//!
//! [`BucketBackend`] is the only way the reconciler talks to the outside
//! world. Read operations report "not configured" as a
//! [`BackendErrorKind::NotFound`](crate::error::BackendErrorKind::NotFound)
//! error, exactly like S3 does, and leave the interpretation to the probes.
//!
//! # Object safety
//!
//! The trait uses `#[async_trait]` so the reconciler can hold an
//! `Arc<dyn BucketBackend>` and tests can swap in the in-memory backend.

use async_trait::async_trait;
use deploybucket_model::{
    AccessLogging, BucketName, FeatureStatus, PublicAccessBlockConfig, ServerSideEncryption, Tag,
    TagSet,
};
use serde::{Deserialize, Serialize};

use crate::error::BackendResult;

/// The default encryption rule currently configured on a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedEncryption {
    /// The encryption algorithm (e.g. `AES256`, `aws:kms`, `aws:kms:dsse`).
    pub sse_algorithm: String,
    /// KMS master key ID (only for `aws:kms` or `aws:kms:dsse`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_master_key_id: Option<String>,
}

impl From<&ServerSideEncryption> for AppliedEncryption {
    fn from(sse: &ServerSideEncryption) -> Self {
        Self {
            sse_algorithm: sse.algorithm().to_owned(),
            kms_master_key_id: sse.kms_key_id().map(ToOwned::to_owned),
        }
    }
}

/// Read and write access to the bucket configuration surface.
#[async_trait]
pub trait BucketBackend: Send + Sync + std::fmt::Debug {
    /// Check that the bucket exists and is accessible.
    async fn head_bucket(&self, bucket: &BucketName) -> BackendResult<()>;

    /// Create the bucket with a private canned ACL.
    async fn create_bucket(&self, bucket: &BucketName) -> BackendResult<()>;

    /// Block until the bucket is visible, within a backend-defined bound.
    async fn wait_until_exists(&self, bucket: &BucketName) -> BackendResult<()>;

    /// Read the default encryption rule.
    async fn get_bucket_encryption(&self, bucket: &BucketName) -> BackendResult<AppliedEncryption>;

    /// Set the default encryption rule.
    async fn put_bucket_encryption(
        &self,
        bucket: &BucketName,
        encryption: &ServerSideEncryption,
    ) -> BackendResult<()>;

    /// Read the versioning status; `None` if versioning was never configured.
    async fn get_bucket_versioning(&self, bucket: &BucketName)
    -> BackendResult<Option<FeatureStatus>>;

    /// Set the versioning status.
    async fn put_bucket_versioning(
        &self,
        bucket: &BucketName,
        status: FeatureStatus,
    ) -> BackendResult<()>;

    /// Read the transfer acceleration status; `None` if never configured.
    async fn get_bucket_accelerate(&self, bucket: &BucketName)
    -> BackendResult<Option<FeatureStatus>>;

    /// Set the transfer acceleration status.
    async fn put_bucket_accelerate(
        &self,
        bucket: &BucketName,
        status: FeatureStatus,
    ) -> BackendResult<()>;

    /// Replace the bucket policy with a serialized policy document.
    async fn put_bucket_policy(&self, bucket: &BucketName, policy: &str) -> BackendResult<()>;

    /// Read the bucket's tag set.
    async fn get_bucket_tagging(&self, bucket: &BucketName) -> BackendResult<Vec<Tag>>;

    /// Replace the bucket's entire tag set.
    async fn put_bucket_tagging(&self, bucket: &BucketName, tags: &TagSet) -> BackendResult<()>;

    /// Remove all tags from the bucket.
    async fn delete_bucket_tagging(&self, bucket: &BucketName) -> BackendResult<()>;

    /// Read the public access block.
    async fn get_public_access_block(
        &self,
        bucket: &BucketName,
    ) -> BackendResult<PublicAccessBlockConfig>;

    /// Set the public access block.
    async fn put_public_access_block(
        &self,
        bucket: &BucketName,
        config: &PublicAccessBlockConfig,
    ) -> BackendResult<()>;

    /// Remove the public access block.
    async fn delete_public_access_block(&self, bucket: &BucketName) -> BackendResult<()>;

    /// Read the access logging destination; `None` if logging is off.
    async fn get_bucket_logging(&self, bucket: &BucketName) -> BackendResult<Option<AccessLogging>>;

    /// Turn access logging on with the given destination.
    async fn put_bucket_logging(
        &self,
        bucket: &BucketName,
        logging: &AccessLogging,
    ) -> BackendResult<()>;

    /// Turn access logging off.
    async fn clear_bucket_logging(&self, bucket: &BucketName) -> BackendResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_convert_desired_encryption_to_applied_rule() {
        let kms = ServerSideEncryption::AwsKms {
            kms_key_id: Some("k1".to_owned()),
        };
        let applied = AppliedEncryption::from(&kms);
        assert_eq!(applied.sse_algorithm, "aws:kms");
        assert_eq!(applied.kms_master_key_id.as_deref(), Some("k1"));

        let aes = AppliedEncryption::from(&ServerSideEncryption::Aes256);
        assert_eq!(aes.sse_algorithm, "AES256");
        assert!(aes.kms_master_key_id.is_none());
    }
}
