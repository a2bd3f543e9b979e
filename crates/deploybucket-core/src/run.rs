//! Per-run context shared by the reconciliation steps.

use deploybucket_model::BucketName;

/// How the bucket came to be part of this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOrigin {
    /// The bucket already existed in the deploying account.
    Existing,
    /// The bucket was created by this run.
    NewlyCreated,
    /// The bucket exists but is owned by another account.
    CrossAccount,
}

/// Immutable record produced by the existence step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationRun {
    bucket: BucketName,
    origin: BucketOrigin,
}

impl ReconciliationRun {
    /// Create the run context.
    #[must_use]
    pub fn new(bucket: BucketName, origin: BucketOrigin) -> Self {
        Self { bucket, origin }
    }

    /// The bucket being reconciled.
    #[must_use]
    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    /// How the bucket came to be part of this run.
    #[must_use]
    pub fn origin(&self) -> BucketOrigin {
        self.origin
    }

    /// Whether the bucket was created by this run.
    #[must_use]
    pub fn is_newly_created(&self) -> bool {
        self.origin == BucketOrigin::NewlyCreated
    }

    /// Whether the bucket belongs to another account.
    #[must_use]
    pub fn is_cross_account(&self) -> bool {
        self.origin == BucketOrigin::CrossAccount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expose_origin_flags() {
        let name = BucketName::new("run-bucket").expect("valid name");
        let run = ReconciliationRun::new(name.clone(), BucketOrigin::NewlyCreated);
        assert!(run.is_newly_created());
        assert!(!run.is_cross_account());
        assert_eq!(run.bucket(), &name);

        let run = ReconciliationRun::new(name, BucketOrigin::CrossAccount);
        assert!(run.is_cross_account());
        assert_eq!(run.origin(), BucketOrigin::CrossAccount);
    }
}
