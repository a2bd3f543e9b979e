//! Diagnostic notices produced by a reconciliation run.

use deploybucket_model::{BucketName, FeatureStatus};
use tracing::{info, warn};

/// One diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The bucket already exists (or belongs to another account).
    UsingBucket(BucketName),
    /// The bucket is about to be created.
    CreatingBucket(BucketName),
    /// The bucket-exists waiter gave up.
    WaitFailed {
        /// Waiter failure description.
        message: String,
    },
    /// Default encryption was applied.
    AppliedEncryption {
        /// The SSE algorithm name.
        algorithm: &'static str,
    },
    /// Versioning changed.
    Versioning(FeatureStatus),
    /// Transfer acceleration changed.
    Acceleration(FeatureStatus),
    /// The bucket policy was written.
    AppliedPolicy,
    /// The bucket policy was not written because the bucket is foreign.
    SkippedPolicy,
    /// The tag set was replaced or removed.
    UpdatedTags,
    /// The public access block was written or removed.
    UpdatedPublicAccessBlock,
    /// Access logging changed.
    AccessLogging(FeatureStatus),
    /// Access logging state could not be read.
    AccessLoggingUnknown,
}

impl Notice {
    /// Whether this notice is a warning rather than progress.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::WaitFailed { .. } | Self::AccessLoggingUnknown)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsingBucket(bucket) => write!(f, "Using deployment bucket '{bucket}'"),
            Self::CreatingBucket(bucket) => write!(f, "Creating deployment bucket '{bucket}'..."),
            Self::WaitFailed { message } => {
                write!(f, "Unable to wait for 'bucketExists' - {message}")
            }
            Self::AppliedEncryption { algorithm } => {
                write!(f, "Applied SSE ({algorithm}) to deployment bucket")
            }
            Self::Versioning(status) => write!(f, "{status} versioning on deployment bucket"),
            Self::Acceleration(status) => write!(f, "{status} acceleration on deployment bucket"),
            Self::AppliedPolicy => f.write_str("Applied deployment bucket policy"),
            Self::SkippedPolicy => {
                f.write_str("Skipping deployment bucket policy (cross-account bucket)")
            }
            Self::UpdatedTags => f.write_str("Updated deployment bucket tags"),
            Self::UpdatedPublicAccessBlock => {
                f.write_str("Updated deployment bucket public access block")
            }
            Self::AccessLogging(status) => {
                write!(f, "{status} access logging on deployment bucket")
            }
            Self::AccessLoggingUnknown => f.write_str(
                "Unable to read access logging on deployment bucket, leaving it unchanged",
            ),
        }
    }
}

/// Ordered notices for one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    bucket: BucketName,
    notices: Vec<Notice>,
}

impl ReconcileReport {
    /// Start an empty report.
    #[must_use]
    pub fn new(bucket: BucketName) -> Self {
        Self {
            bucket,
            notices: Vec::new(),
        }
    }

    /// Record a notice and emit it.
    pub fn push(&mut self, notice: Notice) {
        if notice.is_warning() {
            warn!(bucket = %self.bucket, "{notice}");
        } else {
            info!(bucket = %self.bucket, "{notice}");
        }
        self.notices.push(notice);
    }

    /// The bucket the report is about.
    #[must_use]
    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    /// Recorded notices, in order.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Recorded notices rendered as lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.notices.iter().map(ToString::to_string).collect()
    }

    /// Whether a notice equal to `notice` was recorded.
    #[must_use]
    pub fn contains(&self, notice: &Notice) -> bool {
        self.notices.contains(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_render_notice_lines() {
        let bucket = BucketName::new("b1").expect("valid name");
        let cases = [
            (Notice::UsingBucket(bucket.clone()), "Using deployment bucket 'b1'"),
            (
                Notice::CreatingBucket(bucket),
                "Creating deployment bucket 'b1'...",
            ),
            (
                Notice::AppliedEncryption { algorithm: "aws:kms" },
                "Applied SSE (aws:kms) to deployment bucket",
            ),
            (
                Notice::Versioning(FeatureStatus::Enabled),
                "Enabled versioning on deployment bucket",
            ),
            (
                Notice::Acceleration(FeatureStatus::Suspended),
                "Suspended acceleration on deployment bucket",
            ),
            (
                Notice::SkippedPolicy,
                "Skipping deployment bucket policy (cross-account bucket)",
            ),
            (
                Notice::AccessLogging(FeatureStatus::Enabled),
                "Enabled access logging on deployment bucket",
            ),
        ];
        for (notice, expected) in cases {
            assert_eq!(notice.to_string(), expected);
        }
    }

    #[test]
    fn test_should_keep_notices_in_order() {
        let bucket = BucketName::new("b1").expect("valid name");
        let mut report = ReconcileReport::new(bucket);
        report.push(Notice::AppliedPolicy);
        report.push(Notice::UpdatedTags);

        assert_eq!(
            report.lines(),
            vec![
                "Applied deployment bucket policy".to_owned(),
                "Updated deployment bucket tags".to_owned(),
            ]
        );
        assert!(report.contains(&Notice::UpdatedTags));
        assert!(!report.contains(&Notice::SkippedPolicy));
    }
}
