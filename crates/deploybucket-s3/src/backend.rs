//! [`BucketBackend`] over `aws-sdk-s3`.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::client::Waiters;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{
    AccelerateConfiguration, BucketAccelerateStatus, BucketCannedAcl, BucketLocationConstraint,
    BucketLoggingStatus, BucketVersioningStatus, CreateBucketConfiguration, LoggingEnabled,
    PublicAccessBlockConfiguration, ServerSideEncryption as SseAlgorithm,
    ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration, ServerSideEncryptionRule,
    Tag as S3Tag, Tagging, VersioningConfiguration,
};
use deploybucket_core::{
    AppliedEncryption, BackendError, BackendErrorKind, BackendResult, BucketBackend, Operation,
    RunnerConfig,
};
use deploybucket_model::{
    AccessLogging, BucketName, FeatureStatus, PublicAccessBlockConfig, ServerSideEncryption, Tag,
    TagSet,
};
use tracing::debug;

use crate::client::build_client;
use crate::error::{from_build_error, from_sdk_error, not_configured};

/// Region whose buckets are created without a location constraint.
const US_EAST_1: &str = "us-east-1";

/// S3 implementation of [`BucketBackend`].
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    region: String,
    wait_timeout: Duration,
}

impl S3Backend {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client, region: impl Into<String>, wait_timeout: Duration) -> Self {
        Self {
            client,
            region: region.into(),
            wait_timeout,
        }
    }

    /// Build a client from the runner configuration and wrap it.
    pub async fn from_config(config: &RunnerConfig) -> Self {
        Self::new(
            build_client(config).await,
            config.region.clone(),
            config.wait_timeout(),
        )
    }

    fn create_bucket_configuration(&self) -> Option<CreateBucketConfiguration> {
        if self.region == US_EAST_1 {
            return None;
        }
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build(),
        )
    }
}

fn versioning_status(status: &BucketVersioningStatus) -> Option<FeatureStatus> {
    match status {
        BucketVersioningStatus::Enabled => Some(FeatureStatus::Enabled),
        BucketVersioningStatus::Suspended => Some(FeatureStatus::Suspended),
        _ => None,
    }
}

fn accelerate_status(status: &BucketAccelerateStatus) -> Option<FeatureStatus> {
    match status {
        BucketAccelerateStatus::Enabled => Some(FeatureStatus::Enabled),
        BucketAccelerateStatus::Suspended => Some(FeatureStatus::Suspended),
        _ => None,
    }
}

fn public_access_block(config: &PublicAccessBlockConfiguration) -> PublicAccessBlockConfig {
    PublicAccessBlockConfig {
        block_public_acls: config.block_public_acls().unwrap_or(false),
        ignore_public_acls: config.ignore_public_acls().unwrap_or(false),
        block_public_policy: config.block_public_policy().unwrap_or(false),
        restrict_public_buckets: config.restrict_public_buckets().unwrap_or(false),
    }
}

#[async_trait]
impl BucketBackend for S3Backend {
    async fn head_bucket(&self, bucket: &BucketName) -> BackendResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::HeadBucket, bucket, &e))?;
        Ok(())
    }

    async fn create_bucket(&self, bucket: &BucketName) -> BackendResult<()> {
        debug!(bucket = %bucket, region = %self.region, "creating bucket");
        self.client
            .create_bucket()
            .bucket(bucket.as_str())
            .acl(BucketCannedAcl::Private)
            .set_create_bucket_configuration(self.create_bucket_configuration())
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::CreateBucket, bucket, &e))?;
        Ok(())
    }

    async fn wait_until_exists(&self, bucket: &BucketName) -> BackendResult<()> {
        self.client
            .wait_until_bucket_exists()
            .bucket(bucket.as_str())
            .wait(self.wait_timeout)
            .await
            .map_err(|e| {
                BackendError::new(
                    Operation::WaitUntilBucketExists,
                    bucket.as_str(),
                    BackendErrorKind::Other,
                    DisplayErrorContext(&e).to_string(),
                )
            })?;
        Ok(())
    }

    async fn get_bucket_encryption(&self, bucket: &BucketName) -> BackendResult<AppliedEncryption> {
        let op = Operation::GetBucketEncryption;
        let output = self
            .client
            .get_bucket_encryption()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(op, bucket, &e))?;

        output
            .server_side_encryption_configuration()
            .and_then(|config| config.rules().first())
            .and_then(ServerSideEncryptionRule::apply_server_side_encryption_by_default)
            .map(|default| AppliedEncryption {
                sse_algorithm: default.sse_algorithm().as_str().to_owned(),
                kms_master_key_id: default.kms_master_key_id().map(ToOwned::to_owned),
            })
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
        let default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(SseAlgorithm::from(encryption.algorithm()))
            .set_kms_master_key_id(encryption.kms_key_id().map(ToOwned::to_owned))
            .build()
            .map_err(|e| from_build_error(op, bucket, &e))?;
        let config = ServerSideEncryptionConfiguration::builder()
            .rules(
                ServerSideEncryptionRule::builder()
                    .apply_server_side_encryption_by_default(default)
                    .build(),
            )
            .build()
            .map_err(|e| from_build_error(op, bucket, &e))?;

        self.client
            .put_bucket_encryption()
            .bucket(bucket.as_str())
            .server_side_encryption_configuration(config)
            .send()
            .await
            .map_err(|e| from_sdk_error(op, bucket, &e))?;
        Ok(())
    }

    async fn get_bucket_versioning(
        &self,
        bucket: &BucketName,
    ) -> BackendResult<Option<FeatureStatus>> {
        let output = self
            .client
            .get_bucket_versioning()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::GetBucketVersioning, bucket, &e))?;
        Ok(output.status().and_then(versioning_status))
    }

    async fn put_bucket_versioning(
        &self,
        bucket: &BucketName,
        status: FeatureStatus,
    ) -> BackendResult<()> {
        let config = VersioningConfiguration::builder()
            .status(BucketVersioningStatus::from(status.as_str()))
            .build();
        self.client
            .put_bucket_versioning()
            .bucket(bucket.as_str())
            .versioning_configuration(config)
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::PutBucketVersioning, bucket, &e))?;
        Ok(())
    }

    async fn get_bucket_accelerate(
        &self,
        bucket: &BucketName,
    ) -> BackendResult<Option<FeatureStatus>> {
        let op = Operation::GetBucketAccelerateConfiguration;
        let output = self
            .client
            .get_bucket_accelerate_configuration()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(op, bucket, &e))?;
        Ok(output.status().and_then(accelerate_status))
    }

    async fn put_bucket_accelerate(
        &self,
        bucket: &BucketName,
        status: FeatureStatus,
    ) -> BackendResult<()> {
        let op = Operation::PutBucketAccelerateConfiguration;
        let config = AccelerateConfiguration::builder()
            .status(BucketAccelerateStatus::from(status.as_str()))
            .build();
        self.client
            .put_bucket_accelerate_configuration()
            .bucket(bucket.as_str())
            .accelerate_configuration(config)
            .send()
            .await
            .map_err(|e| from_sdk_error(op, bucket, &e))?;
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &BucketName, policy: &str) -> BackendResult<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket.as_str())
            .policy(policy)
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::PutBucketPolicy, bucket, &e))?;
        Ok(())
    }

    async fn get_bucket_tagging(&self, bucket: &BucketName) -> BackendResult<Vec<Tag>> {
        let output = self
            .client
            .get_bucket_tagging()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::GetBucketTagging, bucket, &e))?;
        Ok(output
            .tag_set()
            .iter()
            .map(|tag| Tag::new(tag.key(), tag.value()))
            .collect())
    }

    async fn put_bucket_tagging(&self, bucket: &BucketName, tags: &TagSet) -> BackendResult<()> {
        let op = Operation::PutBucketTagging;
        let tag_set = tags
            .iter()
            .map(|tag| S3Tag::builder().key(&tag.key).value(&tag.value).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| from_build_error(op, bucket, &e))?;
        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| from_build_error(op, bucket, &e))?;

        self.client
            .put_bucket_tagging()
            .bucket(bucket.as_str())
            .tagging(tagging)
            .send()
            .await
            .map_err(|e| from_sdk_error(op, bucket, &e))?;
        Ok(())
    }

    async fn delete_bucket_tagging(&self, bucket: &BucketName) -> BackendResult<()> {
        self.client
            .delete_bucket_tagging()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::DeleteBucketTagging, bucket, &e))?;
        Ok(())
    }

    async fn get_public_access_block(
        &self,
        bucket: &BucketName,
    ) -> BackendResult<PublicAccessBlockConfig> {
        let op = Operation::GetPublicAccessBlock;
        let output = self
            .client
            .get_public_access_block()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(op, bucket, &e))?;
        output
            .public_access_block_configuration()
            .map(public_access_block)
            .ok_or_else(|| not_configured(op, bucket, "NoSuchPublicAccessBlockConfiguration"))
    }

    async fn put_public_access_block(
        &self,
        bucket: &BucketName,
        config: &PublicAccessBlockConfig,
    ) -> BackendResult<()> {
        let block = PublicAccessBlockConfiguration::builder()
            .block_public_acls(config.block_public_acls)
            .ignore_public_acls(config.ignore_public_acls)
            .block_public_policy(config.block_public_policy)
            .restrict_public_buckets(config.restrict_public_buckets)
            .build();
        self.client
            .put_public_access_block()
            .bucket(bucket.as_str())
            .public_access_block_configuration(block)
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::PutPublicAccessBlock, bucket, &e))?;
        Ok(())
    }

    async fn delete_public_access_block(&self, bucket: &BucketName) -> BackendResult<()> {
        self.client
            .delete_public_access_block()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::DeletePublicAccessBlock, bucket, &e))?;
        Ok(())
    }

    async fn get_bucket_logging(&self, bucket: &BucketName) -> BackendResult<Option<AccessLogging>> {
        let output = self
            .client
            .get_bucket_logging()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::GetBucketLogging, bucket, &e))?;
        Ok(output.logging_enabled().map(|enabled| AccessLogging {
            target_bucket: enabled.target_bucket().to_owned(),
            target_prefix: enabled.target_prefix().to_owned(),
        }))
    }

    async fn put_bucket_logging(
        &self,
        bucket: &BucketName,
        logging: &AccessLogging,
    ) -> BackendResult<()> {
        let op = Operation::PutBucketLogging;
        let enabled = LoggingEnabled::builder()
            .target_bucket(&logging.target_bucket)
            .target_prefix(&logging.target_prefix)
            .build()
            .map_err(|e| from_build_error(op, bucket, &e))?;
        self.client
            .put_bucket_logging()
            .bucket(bucket.as_str())
            .bucket_logging_status(BucketLoggingStatus::builder().logging_enabled(enabled).build())
            .send()
            .await
            .map_err(|e| from_sdk_error(op, bucket, &e))?;
        Ok(())
    }

    async fn clear_bucket_logging(&self, bucket: &BucketName) -> BackendResult<()> {
        // An empty status turns logging off.
        self.client
            .put_bucket_logging()
            .bucket(bucket.as_str())
            .bucket_logging_status(BucketLoggingStatus::builder().build())
            .send()
            .await
            .map_err(|e| from_sdk_error(Operation::ClearBucketLogging, bucket, &e))?;
        Ok(())
    }
}
