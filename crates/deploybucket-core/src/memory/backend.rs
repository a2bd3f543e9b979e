//! In-memory [`BucketBackend`].
//!
//! [`InMemoryBackend`] mirrors the S3 semantics the reconciler relies on
//! (not-found errors for unconfigured properties, `403` on foreign buckets),
//! records every call in a journal, and lets callers inject failures per
//! operation.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::one::Ref;
use deploybucket_model::{
    AccessLogging, BucketName, FeatureStatus, PublicAccessBlockConfig, ServerSideEncryption, Tag,
    TagSet,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::bucket::MemoryBucket;
use crate::backend::{AppliedEncryption, BucketBackend};
use crate::error::{BackendError, BackendErrorKind, BackendResult};
use crate::operation::Operation;

/// Account that owns buckets created through the backend.
pub const DEFAULT_ACCOUNT: &str = "000000000000";

/// One journaled backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The operation.
    pub operation: Operation,
    /// Target bucket.
    pub bucket: String,
    /// Operation argument in a compact form (status, algorithm, ...).
    pub detail: Option<String>,
}

impl std::fmt::Display for RecordedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}({}, {detail})", self.operation, self.bucket),
            None => write!(f, "{}({})", self.operation, self.bucket),
        }
    }
}

/// Bucket store with a call journal and failure injection.
pub struct InMemoryBackend {
    /// Account of the deploying principal.
    account: String,
    /// Bucket name to `MemoryBucket` mapping.
    buckets: DashMap<String, MemoryBucket>,
    /// Every call received, in order.
    journal: Mutex<Vec<RecordedCall>>,
    /// Operations that fail with the given kind.
    faults: DashMap<Operation, BackendErrorKind>,
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("account", &self.account)
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create an empty backend for [`DEFAULT_ACCOUNT`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            account: DEFAULT_ACCOUNT.to_owned(),
            buckets: DashMap::new(),
            journal: Mutex::new(Vec::new()),
            faults: DashMap::new(),
        }
    }

    /// Seed a bucket owned by the deploying account, without journaling.
    pub fn insert_bucket(&self, bucket: &BucketName) {
        self.insert_foreign_bucket(bucket, &self.account.clone());
    }

    /// Seed a bucket owned by `owner`, without journaling.
    pub fn insert_foreign_bucket(&self, bucket: &BucketName, owner: &str) {
        self.buckets.insert(
            bucket.as_str().to_owned(),
            MemoryBucket::new(bucket.as_str().to_owned(), owner.to_owned()),
        );
    }

    /// Get an immutable reference to a bucket.
    #[must_use]
    pub fn bucket(&self, bucket: &BucketName) -> Option<Ref<'_, String, MemoryBucket>> {
        self.buckets.get(bucket.as_str())
    }

    /// Make every future call of `operation` fail with `kind`.
    pub fn fail(&self, operation: Operation, kind: BackendErrorKind) {
        self.faults.insert(operation, kind);
    }

    /// Remove all injected failures.
    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// All calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.journal.lock().clone()
    }

    /// The mutating calls received so far.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedCall> {
        self.journal
            .lock()
            .iter()
            .filter(|call| call.operation.is_mutation())
            .cloned()
            .collect()
    }

    /// Number of calls of `operation` received so far.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.journal
            .lock()
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Forget all journaled calls.
    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }

    fn enter(
        &self,
        operation: Operation,
        bucket: &BucketName,
        detail: Option<String>,
    ) -> BackendResult<()> {
        self.journal.lock().push(RecordedCall {
            operation,
            bucket: bucket.as_str().to_owned(),
            detail,
        });

        if let Some(kind) = self.faults.get(&operation) {
            debug!(bucket = %bucket, %operation, "injected failure");
            return Err(BackendError::new(
                operation,
                bucket.as_str(),
                *kind,
                "injected failure",
            ));
        }
        Ok(())
    }

    fn get(
        &self,
        operation: Operation,
        bucket: &BucketName,
    ) -> BackendResult<Ref<'_, String, MemoryBucket>> {
        self.buckets.get(bucket.as_str()).ok_or_else(|| {
            BackendError::new(
                operation,
                bucket.as_str(),
                BackendErrorKind::NotFound,
                "The specified bucket does not exist",
            )
            .with_code("NoSuchBucket")
        })
    }

    fn get_owned(
        &self,
        operation: Operation,
        bucket: &BucketName,
    ) -> BackendResult<Ref<'_, String, MemoryBucket>> {
        let entry = self.get(operation, bucket)?;
        if entry.owner != self.account {
            return Err(BackendError::new(
                operation,
                bucket.as_str(),
                BackendErrorKind::AccessDenied,
                "Access Denied",
            )
            .with_code("AccessDenied"));
        }
        Ok(entry)
    }
}

fn not_configured(operation: Operation, bucket: &BucketName, code: &str) -> BackendError {
    BackendError::new(
        operation,
        bucket.as_str(),
        BackendErrorKind::NotFound,
        format!("{code} for bucket {bucket}"),
    )
    .with_code(code)
}

#[async_trait]
impl BucketBackend for InMemoryBackend {
    async fn head_bucket(&self, bucket: &BucketName) -> BackendResult<()> {
        self.enter(Operation::HeadBucket, bucket, None)?;
        self.get_owned(Operation::HeadBucket, bucket).map(|_| ())
    }

    async fn create_bucket(&self, bucket: &BucketName) -> BackendResult<()> {
        let op = Operation::CreateBucket;
        self.enter(op, bucket, Some("private".to_owned()))?;

        if let Some(existing) = self.buckets.get(bucket.as_str()) {
            let code = if existing.owner == self.account {
                "BucketAlreadyOwnedByYou"
            } else {
                "BucketAlreadyExists"
            };
            return Err(
                BackendError::new(op, bucket.as_str(), BackendErrorKind::Other, code)
                    .with_code(code),
            );
        }

        self.insert_bucket(bucket);
        info!(bucket = %bucket, "bucket created");
        Ok(())
    }

    async fn wait_until_exists(&self, bucket: &BucketName) -> BackendResult<()> {
        self.enter(Operation::WaitUntilBucketExists, bucket, None)?;
        self.get(Operation::WaitUntilBucketExists, bucket).map(|_| ())
    }

    async fn get_bucket_encryption(&self, bucket: &BucketName) -> BackendResult<AppliedEncryption> {
        let op = Operation::GetBucketEncryption;
        self.enter(op, bucket, None)?;
        self.get(op, bucket)?
            .encryption
            .read()
            .clone()
            .ok_or_else(|| {
                not_configured(op, bucket, "ServerSideEncryptionConfigurationNotFoundError")
            })
    }

    async fn put_bucket_encryption(
        &self,
        bucket: &BucketName,
        encryption: &ServerSideEncryption,
    ) -> BackendResult<()> {
        let op = Operation::PutBucketEncryption;
        let detail = match encryption.kms_key_id() {
            Some(key) => format!("{} {key}", encryption.algorithm()),
            None => encryption.algorithm().to_owned(),
        };
        self.enter(op, bucket, Some(detail))?;
        self.get(op, bucket)?
            .set_encryption(Some(AppliedEncryption::from(encryption)));
        Ok(())
    }

    async fn get_bucket_versioning(
        &self,
        bucket: &BucketName,
    ) -> BackendResult<Option<FeatureStatus>> {
        let op = Operation::GetBucketVersioning;
        self.enter(op, bucket, None)?;
        Ok(*self.get(op, bucket)?.versioning.read())
    }

    async fn put_bucket_versioning(
        &self,
        bucket: &BucketName,
        status: FeatureStatus,
    ) -> BackendResult<()> {
        let op = Operation::PutBucketVersioning;
        self.enter(op, bucket, Some(status.as_str().to_owned()))?;
        self.get(op, bucket)?.set_versioning(status);
        Ok(())
    }

    async fn get_bucket_accelerate(
        &self,
        bucket: &BucketName,
    ) -> BackendResult<Option<FeatureStatus>> {
        let op = Operation::GetBucketAccelerateConfiguration;
        self.enter(op, bucket, None)?;
        Ok(*self.get(op, bucket)?.accelerate.read())
    }

    async fn put_bucket_accelerate(
        &self,
        bucket: &BucketName,
        status: FeatureStatus,
    ) -> BackendResult<()> {
        let op = Operation::PutBucketAccelerateConfiguration;
        self.enter(op, bucket, Some(status.as_str().to_owned()))?;
        self.get(op, bucket)?.set_accelerate(status);
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &BucketName, policy: &str) -> BackendResult<()> {
        let op = Operation::PutBucketPolicy;
        self.enter(op, bucket, Some(policy.to_owned()))?;
        *self.get_owned(op, bucket)?.policy.write() = Some(policy.to_owned());
        Ok(())
    }

    async fn get_bucket_tagging(&self, bucket: &BucketName) -> BackendResult<Vec<Tag>> {
        let op = Operation::GetBucketTagging;
        self.enter(op, bucket, None)?;
        let tags = self.get(op, bucket)?.tags.read().clone();
        if tags.is_empty() {
            return Err(not_configured(op, bucket, "NoSuchTagSet"));
        }
        Ok(tags)
    }

    async fn put_bucket_tagging(&self, bucket: &BucketName, tags: &TagSet) -> BackendResult<()> {
        let op = Operation::PutBucketTagging;
        let detail = tags
            .iter()
            .map(|t| format!("{}={}", t.key, t.value))
            .collect::<Vec<_>>()
            .join(",");
        self.enter(op, bucket, Some(detail))?;
        self.get(op, bucket)?.set_tags(tags.as_slice().to_vec());
        Ok(())
    }

    async fn delete_bucket_tagging(&self, bucket: &BucketName) -> BackendResult<()> {
        let op = Operation::DeleteBucketTagging;
        self.enter(op, bucket, None)?;
        self.get(op, bucket)?.set_tags(Vec::new());
        Ok(())
    }

    async fn get_public_access_block(
        &self,
        bucket: &BucketName,
    ) -> BackendResult<PublicAccessBlockConfig> {
        let op = Operation::GetPublicAccessBlock;
        self.enter(op, bucket, None)?;
        let config = *self.get(op, bucket)?.public_access_block.read();
        config.ok_or_else(|| not_configured(op, bucket, "NoSuchPublicAccessBlockConfiguration"))
    }

    async fn put_public_access_block(
        &self,
        bucket: &BucketName,
        config: &PublicAccessBlockConfig,
    ) -> BackendResult<()> {
        let op = Operation::PutPublicAccessBlock;
        let detail = if config.is_fully_blocked() {
            "all-blocked"
        } else {
            "partial"
        };
        self.enter(op, bucket, Some(detail.to_owned()))?;
        self.get(op, bucket)?.set_public_access_block(Some(*config));
        Ok(())
    }

    async fn delete_public_access_block(&self, bucket: &BucketName) -> BackendResult<()> {
        let op = Operation::DeletePublicAccessBlock;
        self.enter(op, bucket, None)?;
        self.get(op, bucket)?.set_public_access_block(None);
        Ok(())
    }

    async fn get_bucket_logging(&self, bucket: &BucketName) -> BackendResult<Option<AccessLogging>> {
        let op = Operation::GetBucketLogging;
        self.enter(op, bucket, None)?;
        Ok(self.get(op, bucket)?.logging.read().clone())
    }

    async fn put_bucket_logging(
        &self,
        bucket: &BucketName,
        logging: &AccessLogging,
    ) -> BackendResult<()> {
        let op = Operation::PutBucketLogging;
        let detail = format!("{}/{}", logging.target_bucket, logging.target_prefix);
        self.enter(op, bucket, Some(detail))?;
        self.get(op, bucket)?.set_logging(Some(logging.clone()));
        Ok(())
    }

    async fn clear_bucket_logging(&self, bucket: &BucketName) -> BackendResult<()> {
        let op = Operation::ClearBucketLogging;
        self.enter(op, bucket, None)?;
        self.get(op, bucket)?.set_logging(None);
        Ok(())
    }
}
