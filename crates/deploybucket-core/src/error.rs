//! Backend and reconciliation error types.
//!
//! Backends report every failure as a [`BackendError`] classified into a
//! [`BackendErrorKind`]. Probes absorb these locally; mutations propagate
//! them as [`ReconcileError`] to the error boundary in
//! [`crate::plugin::DeploymentBucketPlugin`].

use crate::operation::Operation;

/// Coarse classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// The bucket, or the requested configuration on it, does not exist.
    NotFound,
    /// The caller is not allowed to perform the operation.
    AccessDenied,
    /// Anything else (throttling, transport, validation, ...).
    Other,
}

/// A failed call against the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} on bucket '{bucket}' failed: {message}")]
pub struct BackendError {
    /// The operation that failed.
    pub operation: Operation,
    /// The bucket the operation targeted.
    pub bucket: String,
    /// Failure classification.
    pub kind: BackendErrorKind,
    /// Service error code, when the backend returned one.
    pub code: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl BackendError {
    /// Create an error of the given kind.
    #[must_use]
    pub fn new(
        operation: Operation,
        bucket: impl Into<String>,
        kind: BackendErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            bucket: bucket.into(),
            kind,
            code: None,
            message: message.into(),
        }
    }

    /// Attach the service error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether this is a not-found / not-configured response.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == BackendErrorKind::NotFound
    }

    /// Whether this is a permission-denied response.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        self.kind == BackendErrorKind::AccessDenied
    }
}

/// Convenience result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// A failure that aborts a reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A mutating backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Convenience result type for reconciliation steps.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_format_backend_error() {
        let err = BackendError::new(
            Operation::PutBucketPolicy,
            "b1",
            BackendErrorKind::Other,
            "Policy has invalid resource",
        )
        .with_code("MalformedPolicy");
        assert_eq!(
            err.to_string(),
            "PutBucketPolicy on bucket 'b1' failed: Policy has invalid resource"
        );
        assert_eq!(err.code.as_deref(), Some("MalformedPolicy"));
        assert!(!err.is_not_found());
        assert!(!err.is_access_denied());
    }

    #[test]
    fn test_should_wrap_backend_error_transparently() {
        let backend = BackendError::new(
            Operation::CreateBucket,
            "b1",
            BackendErrorKind::AccessDenied,
            "Access Denied",
        );
        let err = ReconcileError::from(backend.clone());
        assert_eq!(err.to_string(), backend.to_string());
    }
}
