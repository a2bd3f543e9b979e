//! Remote operations issued against the storage backend.

/// Every backend call the reconciler can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// The HeadBucket operation.
    HeadBucket,
    /// The CreateBucket operation.
    CreateBucket,
    /// Polling until a freshly created bucket is visible.
    WaitUntilBucketExists,
    /// The GetBucketEncryption operation.
    GetBucketEncryption,
    /// The PutBucketEncryption operation.
    PutBucketEncryption,
    /// The GetBucketVersioning operation.
    GetBucketVersioning,
    /// The PutBucketVersioning operation.
    PutBucketVersioning,
    /// The GetBucketAccelerateConfiguration operation.
    GetBucketAccelerateConfiguration,
    /// The PutBucketAccelerateConfiguration operation.
    PutBucketAccelerateConfiguration,
    /// The PutBucketPolicy operation.
    PutBucketPolicy,
    /// The GetBucketTagging operation.
    GetBucketTagging,
    /// The PutBucketTagging operation.
    PutBucketTagging,
    /// The DeleteBucketTagging operation.
    DeleteBucketTagging,
    /// The GetPublicAccessBlock operation.
    GetPublicAccessBlock,
    /// The PutPublicAccessBlock operation.
    PutPublicAccessBlock,
    /// The DeletePublicAccessBlock operation.
    DeletePublicAccessBlock,
    /// The GetBucketLogging operation.
    GetBucketLogging,
    /// The PutBucketLogging operation with a logging target.
    PutBucketLogging,
    /// The PutBucketLogging operation with an empty status (logging off).
    ClearBucketLogging,
}

impl Operation {
    /// Returns the operation name as a static string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeadBucket => "HeadBucket",
            Self::CreateBucket => "CreateBucket",
            Self::WaitUntilBucketExists => "WaitUntilBucketExists",
            Self::GetBucketEncryption => "GetBucketEncryption",
            Self::PutBucketEncryption => "PutBucketEncryption",
            Self::GetBucketVersioning => "GetBucketVersioning",
            Self::PutBucketVersioning => "PutBucketVersioning",
            Self::GetBucketAccelerateConfiguration => "GetBucketAccelerateConfiguration",
            Self::PutBucketAccelerateConfiguration => "PutBucketAccelerateConfiguration",
            Self::PutBucketPolicy => "PutBucketPolicy",
            Self::GetBucketTagging => "GetBucketTagging",
            Self::PutBucketTagging => "PutBucketTagging",
            Self::DeleteBucketTagging => "DeleteBucketTagging",
            Self::GetPublicAccessBlock => "GetPublicAccessBlock",
            Self::PutPublicAccessBlock => "PutPublicAccessBlock",
            Self::DeletePublicAccessBlock => "DeletePublicAccessBlock",
            Self::GetBucketLogging => "GetBucketLogging",
            Self::PutBucketLogging => "PutBucketLogging",
            Self::ClearBucketLogging => "ClearBucketLogging",
        }
    }

    /// Whether the operation changes remote state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateBucket
                | Self::PutBucketEncryption
                | Self::PutBucketVersioning
                | Self::PutBucketAccelerateConfiguration
                | Self::PutBucketPolicy
                | Self::PutBucketTagging
                | Self::DeleteBucketTagging
                | Self::PutPublicAccessBlock
                | Self::DeletePublicAccessBlock
                | Self::PutBucketLogging
                | Self::ClearBucketLogging
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_classify_mutations() {
        assert!(Operation::CreateBucket.is_mutation());
        assert!(Operation::ClearBucketLogging.is_mutation());
        assert!(!Operation::HeadBucket.is_mutation());
        assert!(!Operation::WaitUntilBucketExists.is_mutation());
        assert!(!Operation::GetPublicAccessBlock.is_mutation());
    }

    #[test]
    fn test_should_display_operation_name() {
        assert_eq!(Operation::PutBucketVersioning.to_string(), "PutBucketVersioning");
    }
}
