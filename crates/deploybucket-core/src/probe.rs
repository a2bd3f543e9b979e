//! Remote state probes.
//!
//! Each probe is a read-only query for one bucket property. Probes never
//! fail: a not-found response becomes [`Observed::Absent`], and any other
//! error is resolved by the property's [`ProbePolicy`].
//!
//! | Property | Policy |
//! |----------|--------|
//! | encryption, versioning, acceleration | [`ProbePolicy::FailClosed`] |
//! | tags, public access block | [`ProbePolicy::FailOpen`] |
//! | access logging | [`ProbePolicy::Advisory`] |
//!
//! Fail-closed properties have a cheap, safe "off" state: assuming it and
//! re-applying on the next run is harmless. Fail-open properties are
//! security relevant, so an unreadable state is treated as drift whenever
//! there is a desired value to push.

use deploybucket_model::{AccessLogging, BucketName, FeatureStatus, PublicAccessBlockConfig, Tag};
use tracing::{debug, warn};

use crate::backend::{AppliedEncryption, BucketBackend};
use crate::error::BackendError;

/// The observed value of one bucket property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed<T> {
    /// The backend returned a concrete value.
    Present(T),
    /// The property is not configured on the bucket.
    Absent,
    /// The probe failed and the property's policy did not map it to `Absent`.
    Unknown,
}

impl<T> Observed<T> {
    /// Whether a concrete value was observed.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl Observed<FeatureStatus> {
    /// Whether the observed status is `Enabled`.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Present(FeatureStatus::Enabled))
    }
}

/// What a probe failure means for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePolicy {
    /// Assume the property is not set.
    FailClosed,
    /// Report the state as unknown; the comparator treats it as drift.
    FailOpen,
    /// Report the state as unknown and warn; the property is left alone.
    Advisory,
}

/// The bucket properties the reconciler reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// Default server-side encryption.
    Encryption,
    /// Object versioning.
    Versioning,
    /// Transfer acceleration.
    Acceleration,
    /// Bucket tags.
    Tags,
    /// Public access block.
    PublicAccessBlock,
    /// Server access logging.
    AccessLogging,
}

impl Property {
    /// The failure policy for this property.
    #[must_use]
    pub fn policy(self) -> ProbePolicy {
        match self {
            Self::Encryption | Self::Versioning | Self::Acceleration => ProbePolicy::FailClosed,
            Self::Tags | Self::PublicAccessBlock => ProbePolicy::FailOpen,
            Self::AccessLogging => ProbePolicy::Advisory,
        }
    }

    /// Short name used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Encryption => "encryption",
            Self::Versioning => "versioning",
            Self::Acceleration => "acceleration",
            Self::Tags => "tags",
            Self::PublicAccessBlock => "public_access_block",
            Self::AccessLogging => "access_logging",
        }
    }

    fn observe<T>(self, result: Result<T, BackendError>) -> Observed<T> {
        let err = match result {
            Ok(value) => return Observed::Present(value),
            Err(err) => err,
        };

        if err.is_not_found() {
            return Observed::Absent;
        }

        match self.policy() {
            ProbePolicy::FailClosed => {
                debug!(property = self.as_str(), error = %err, "probe failed, assuming not set");
                Observed::Absent
            }
            ProbePolicy::FailOpen => {
                debug!(property = self.as_str(), error = %err, "probe failed, assuming drift");
                Observed::Unknown
            }
            ProbePolicy::Advisory => {
                warn!(property = self.as_str(), error = %err, "probe failed, leaving property unchanged");
                Observed::Unknown
            }
        }
    }
}

/// Outcome of the existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    /// The bucket exists and belongs to the deploying account.
    Exists,
    /// The bucket does not exist (or could not be confirmed).
    Missing,
    /// The bucket exists but the deploying principal was denied access.
    ForeignOwned,
}

/// Read-only view of the bucket's current configuration.
#[derive(Debug, Clone, Copy)]
pub struct StateProbe<'a> {
    backend: &'a dyn BucketBackend,
}

impl<'a> StateProbe<'a> {
    /// Create a probe over `backend`.
    #[must_use]
    pub fn new(backend: &'a dyn BucketBackend) -> Self {
        Self { backend }
    }

    /// Does the bucket exist, and is it ours?
    pub async fn existence(&self, bucket: &BucketName) -> Existence {
        match self.backend.head_bucket(bucket).await {
            Ok(()) => Existence::Exists,
            Err(err) if err.is_access_denied() => {
                debug!(bucket = %bucket, error = %err, "bucket owned by another account");
                Existence::ForeignOwned
            }
            Err(err) => {
                if !err.is_not_found() {
                    debug!(bucket = %bucket, error = %err, "head bucket failed, treating as missing");
                }
                Existence::Missing
            }
        }
    }

    /// Current default encryption rule.
    pub async fn encryption(&self, bucket: &BucketName) -> Observed<AppliedEncryption> {
        Property::Encryption.observe(self.backend.get_bucket_encryption(bucket).await)
    }

    /// Current versioning status.
    pub async fn versioning(&self, bucket: &BucketName) -> Observed<FeatureStatus> {
        flatten(Property::Versioning.observe(self.backend.get_bucket_versioning(bucket).await))
    }

    /// Current transfer acceleration status.
    pub async fn acceleration(&self, bucket: &BucketName) -> Observed<FeatureStatus> {
        flatten(Property::Acceleration.observe(self.backend.get_bucket_accelerate(bucket).await))
    }

    /// Current tag set. An empty set is reported as absent.
    pub async fn tags(&self, bucket: &BucketName) -> Observed<Vec<Tag>> {
        match Property::Tags.observe(self.backend.get_bucket_tagging(bucket).await) {
            Observed::Present(tags) if tags.is_empty() => Observed::Absent,
            other => other,
        }
    }

    /// Current public access block.
    pub async fn public_access_block(
        &self,
        bucket: &BucketName,
    ) -> Observed<PublicAccessBlockConfig> {
        Property::PublicAccessBlock.observe(self.backend.get_public_access_block(bucket).await)
    }

    /// Current access logging destination.
    pub async fn access_logging(&self, bucket: &BucketName) -> Observed<AccessLogging> {
        flatten(Property::AccessLogging.observe(self.backend.get_bucket_logging(bucket).await))
    }
}

fn flatten<T>(observed: Observed<Option<T>>) -> Observed<T> {
    match observed {
        Observed::Present(Some(value)) => Observed::Present(value),
        Observed::Present(None) | Observed::Absent => Observed::Absent,
        Observed::Unknown => Observed::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendErrorKind;
    use crate::memory::InMemoryBackend;
    use crate::operation::Operation;

    fn bucket() -> BucketName {
        BucketName::new("probe-bucket").expect("valid name")
    }

    #[test]
    fn test_should_assign_named_policies() {
        assert_eq!(Property::Encryption.policy(), ProbePolicy::FailClosed);
        assert_eq!(Property::Versioning.policy(), ProbePolicy::FailClosed);
        assert_eq!(Property::Acceleration.policy(), ProbePolicy::FailClosed);
        assert_eq!(Property::Tags.policy(), ProbePolicy::FailOpen);
        assert_eq!(Property::PublicAccessBlock.policy(), ProbePolicy::FailOpen);
        assert_eq!(Property::AccessLogging.policy(), ProbePolicy::Advisory);
    }

    #[test]
    fn test_should_map_not_found_to_absent_under_every_policy() {
        let not_found = || {
            Err::<(), _>(BackendError::new(
                Operation::GetBucketTagging,
                "b",
                BackendErrorKind::NotFound,
                "NoSuchTagSet",
            ))
        };
        for property in [Property::Encryption, Property::Tags, Property::AccessLogging] {
            assert_eq!(property.observe(not_found()), Observed::Absent);
        }
    }

    #[test]
    fn test_should_map_other_errors_by_policy() {
        let failure = || {
            Err::<(), _>(BackendError::new(
                Operation::GetBucketVersioning,
                "b",
                BackendErrorKind::Other,
                "SlowDown",
            ))
        };
        assert_eq!(Property::Versioning.observe(failure()), Observed::Absent);
        assert_eq!(Property::PublicAccessBlock.observe(failure()), Observed::Unknown);
        assert_eq!(Property::AccessLogging.observe(failure()), Observed::Unknown);
    }

    #[tokio::test]
    async fn test_should_detect_existence_states() {
        let backend = InMemoryBackend::new();
        let probe = StateProbe::new(&backend);
        assert_eq!(probe.existence(&bucket()).await, Existence::Missing);

        backend.insert_bucket(&bucket());
        assert_eq!(probe.existence(&bucket()).await, Existence::Exists);

        let foreign = BucketName::new("foreign-bucket").expect("valid name");
        backend.insert_foreign_bucket(&foreign, "111122223333");
        assert_eq!(probe.existence(&foreign).await, Existence::ForeignOwned);
    }

    #[tokio::test]
    async fn test_should_report_unset_properties_as_absent() {
        let backend = InMemoryBackend::new();
        backend.insert_bucket(&bucket());
        let probe = StateProbe::new(&backend);

        assert_eq!(probe.encryption(&bucket()).await, Observed::Absent);
        assert_eq!(probe.versioning(&bucket()).await, Observed::Absent);
        assert_eq!(probe.acceleration(&bucket()).await, Observed::Absent);
        assert_eq!(probe.tags(&bucket()).await, Observed::Absent);
        assert_eq!(probe.public_access_block(&bucket()).await, Observed::Absent);
        assert_eq!(probe.access_logging(&bucket()).await, Observed::Absent);
    }

    #[tokio::test]
    async fn test_should_fail_open_on_public_access_block_errors() {
        let backend = InMemoryBackend::new();
        backend.insert_bucket(&bucket());
        backend.fail(Operation::GetPublicAccessBlock, BackendErrorKind::AccessDenied);
        let probe = StateProbe::new(&backend);

        assert_eq!(probe.public_access_block(&bucket()).await, Observed::Unknown);
    }

    #[tokio::test]
    async fn test_should_fail_closed_on_versioning_errors() {
        let backend = InMemoryBackend::new();
        backend.insert_bucket(&bucket());
        backend
            .bucket(&bucket())
            .expect("bucket exists")
            .set_versioning(FeatureStatus::Enabled);
        backend.fail(Operation::GetBucketVersioning, BackendErrorKind::Other);
        let probe = StateProbe::new(&backend);

        let observed = probe.versioning(&bucket()).await;
        assert_eq!(observed, Observed::Absent);
        assert!(!observed.is_enabled());
    }
}
