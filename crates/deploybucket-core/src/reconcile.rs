//! The reconciliation engine.
//!
//! [`Reconciler::reconcile`] converges one bucket in a fixed order:
//!
//! ```text
//! exists -> encryption -> versioning -> acceleration -> policy
//!        -> tags -> public access block -> access logging
//! ```
//!
//! Every step probes, compares, and mutates only on drift. The bucket policy
//! is the exception: it is written on every run. Steps run strictly one after
//! another; the first failed mutation ends the run and nothing is rolled back.

use std::sync::Arc;

use deploybucket_model::{BucketName, DesiredConfiguration, FeatureStatus, PublicAccessBlockConfig};
use tracing::debug;

use crate::backend::BucketBackend;
use crate::error::ReconcileResult;
use crate::probe::{Existence, Observed, StateProbe};
use crate::report::{Notice, ReconcileReport};
use crate::run::{BucketOrigin, ReconciliationRun};

/// Drives a bucket toward its desired configuration.
#[derive(Debug, Clone)]
pub struct Reconciler {
    backend: Arc<dyn BucketBackend>,
}

impl Reconciler {
    /// Create a reconciler over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn BucketBackend>) -> Self {
        Self { backend }
    }

    fn probe(&self) -> StateProbe<'_> {
        StateProbe::new(self.backend.as_ref())
    }

    /// Run all steps against `desired`, recording notices into `report`.
    ///
    /// # Errors
    ///
    /// Returns the first failed mutation. Notices recorded before the failure
    /// stay in `report`.
    pub async fn reconcile(
        &self,
        desired: &DesiredConfiguration,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<ReconciliationRun> {
        let run = self.ensure_exists(&desired.bucket_name, report).await?;
        self.ensure_encryption(&run, desired, report).await?;
        self.ensure_versioning(&run, desired, report).await?;
        self.ensure_acceleration(&run, desired, report).await?;
        self.ensure_policy(&run, desired, report).await?;
        self.ensure_tags(&run, desired, report).await?;
        self.ensure_public_access_block(&run, desired, report).await?;
        self.ensure_access_logging(&run, desired, report).await?;
        Ok(run)
    }

    async fn ensure_exists(
        &self,
        bucket: &BucketName,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<ReconciliationRun> {
        let origin = match self.probe().existence(bucket).await {
            Existence::Exists => {
                report.push(Notice::UsingBucket(bucket.clone()));
                BucketOrigin::Existing
            }
            Existence::ForeignOwned => {
                debug!(bucket = %bucket, "deployment bucket is owned by another account");
                report.push(Notice::UsingBucket(bucket.clone()));
                BucketOrigin::CrossAccount
            }
            Existence::Missing => {
                report.push(Notice::CreatingBucket(bucket.clone()));
                self.backend.create_bucket(bucket).await?;
                if let Err(err) = self.backend.wait_until_exists(bucket).await {
                    report.push(Notice::WaitFailed {
                        message: err.message,
                    });
                }
                BucketOrigin::NewlyCreated
            }
        };
        Ok(ReconciliationRun::new(bucket.clone(), origin))
    }

    async fn ensure_encryption(
        &self,
        run: &ReconciliationRun,
        desired: &DesiredConfiguration,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<()> {
        let Some(sse) = &desired.server_side_encryption else {
            return Ok(());
        };

        // An existing rule is never replaced, even if it differs.
        if self.probe().encryption(run.bucket()).await.is_present() {
            return Ok(());
        }

        self.backend.put_bucket_encryption(run.bucket(), sse).await?;
        report.push(Notice::AppliedEncryption {
            algorithm: sse.algorithm(),
        });
        Ok(())
    }

    async fn ensure_versioning(
        &self,
        run: &ReconciliationRun,
        desired: &DesiredConfiguration,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<()> {
        let observed = self.probe().versioning(run.bucket()).await;
        if observed.is_enabled() == desired.versioning {
            return Ok(());
        }

        let status = FeatureStatus::from_enabled(desired.versioning);
        self.backend.put_bucket_versioning(run.bucket(), status).await?;
        report.push(Notice::Versioning(status));
        Ok(())
    }

    async fn ensure_acceleration(
        &self,
        run: &ReconciliationRun,
        desired: &DesiredConfiguration,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<()> {
        let observed = self.probe().acceleration(run.bucket()).await;
        if observed.is_enabled() == desired.accelerate {
            return Ok(());
        }

        let status = FeatureStatus::from_enabled(desired.accelerate);
        self.backend.put_bucket_accelerate(run.bucket(), status).await?;
        report.push(Notice::Acceleration(status));
        Ok(())
    }

    async fn ensure_policy(
        &self,
        run: &ReconciliationRun,
        desired: &DesiredConfiguration,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<()> {
        let Some(policy) = desired.policy_document() else {
            return Ok(());
        };

        if run.is_cross_account() {
            report.push(Notice::SkippedPolicy);
            return Ok(());
        }

        self.backend.put_bucket_policy(run.bucket(), &policy).await?;
        report.push(Notice::AppliedPolicy);
        Ok(())
    }

    async fn ensure_tags(
        &self,
        run: &ReconciliationRun,
        desired: &DesiredConfiguration,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<()> {
        let bucket = run.bucket();

        if run.is_newly_created()
            && let Some(tags) = &desired.tags
        {
            self.backend.put_bucket_tagging(bucket, tags).await?;
            report.push(Notice::UpdatedTags);
            return Ok(());
        }

        let observed = self.probe().tags(bucket).await;
        match (&desired.tags, observed) {
            (Some(tags), Observed::Present(current)) if tags.matches(&current) => {}
            (Some(tags), _) => {
                self.backend.put_bucket_tagging(bucket, tags).await?;
                report.push(Notice::UpdatedTags);
            }
            (None, Observed::Present(_)) => {
                self.backend.delete_bucket_tagging(bucket).await?;
                report.push(Notice::UpdatedTags);
            }
            (None, Observed::Absent | Observed::Unknown) => {}
        }
        Ok(())
    }

    async fn ensure_public_access_block(
        &self,
        run: &ReconciliationRun,
        desired: &DesiredConfiguration,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<()> {
        let bucket = run.bucket();
        let block = desired.block_public_access.unwrap_or(false);

        let drifted = if run.is_newly_created() && desired.block_public_access.is_some() {
            true
        } else {
            match self.probe().public_access_block(bucket).await {
                Observed::Present(current) if block => !current.is_fully_blocked(),
                Observed::Present(current) => !current.is_fully_open(),
                // Unreadable or missing: only a desired block is worth pushing.
                Observed::Absent | Observed::Unknown => block,
            }
        };
        if !drifted {
            return Ok(());
        }

        if block {
            self.backend
                .put_public_access_block(bucket, &PublicAccessBlockConfig::from_block(true))
                .await?;
        } else {
            self.backend.delete_public_access_block(bucket).await?;
        }
        report.push(Notice::UpdatedPublicAccessBlock);
        Ok(())
    }

    async fn ensure_access_logging(
        &self,
        run: &ReconciliationRun,
        desired: &DesiredConfiguration,
        report: &mut ReconcileReport,
    ) -> ReconcileResult<()> {
        let bucket = run.bucket();
        let observed = self.probe().access_logging(bucket).await;

        match (&desired.access_logging, observed) {
            (_, Observed::Unknown) => report.push(Notice::AccessLoggingUnknown),
            (Some(target), Observed::Present(current)) if *target == current => {}
            (Some(target), _) => {
                self.backend.put_bucket_logging(bucket, target).await?;
                report.push(Notice::AccessLogging(FeatureStatus::Enabled));
            }
            (None, Observed::Present(_)) => {
                self.backend.clear_bucket_logging(bucket).await?;
                report.push(Notice::AccessLogging(FeatureStatus::Suspended));
            }
            (None, Observed::Absent) => {}
        }
        Ok(())
    }
}
