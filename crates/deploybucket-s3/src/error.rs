//! Mapping from AWS SDK errors to [`BackendError`].

use aws_sdk_s3::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use deploybucket_core::{BackendError, BackendErrorKind, Operation};
use deploybucket_model::BucketName;

/// Service error codes meaning "the bucket or the requested configuration
/// does not exist".
const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NotFound",
    "NoSuchTagSet",
    "NoSuchPublicAccessBlockConfiguration",
    "ServerSideEncryptionConfigurationNotFoundError",
    "NoSuchBucketPolicy",
];

/// Service error codes meaning "the caller may not do this".
const ACCESS_DENIED_CODES: &[&str] = &["AccessDenied", "Forbidden", "AllAccessDisabled"];

/// Classify a failure by service error code, falling back to HTTP status.
#[must_use]
pub fn classify(status: Option<u16>, code: Option<&str>) -> BackendErrorKind {
    if let Some(code) = code {
        if NOT_FOUND_CODES.contains(&code) {
            return BackendErrorKind::NotFound;
        }
        if ACCESS_DENIED_CODES.contains(&code) {
            return BackendErrorKind::AccessDenied;
        }
    }

    match status {
        Some(404) => BackendErrorKind::NotFound,
        Some(403) => BackendErrorKind::AccessDenied,
        _ => BackendErrorKind::Other,
    }
}

/// Convert a failed SDK call into a [`BackendError`].
pub(crate) fn from_sdk_error<E>(
    operation: Operation,
    bucket: &BucketName,
    err: &SdkError<E, HttpResponse>,
) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|raw| raw.status().as_u16());
    let code = err.code();
    let kind = classify(status, code);

    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(err).to_string(), ToOwned::to_owned);

    let mapped = BackendError::new(operation, bucket.as_str(), kind, message);
    match code {
        Some(code) => mapped.with_code(code),
        None => mapped,
    }
}

/// Convert a request that could not be built into a [`BackendError`].
pub(crate) fn from_build_error(
    operation: Operation,
    bucket: &BucketName,
    err: &BuildError,
) -> BackendError {
    BackendError::new(
        operation,
        bucket.as_str(),
        BackendErrorKind::Other,
        format!("invalid request: {}", DisplayErrorContext(err)),
    )
}

/// A read that succeeded but carried no configuration.
pub(crate) fn not_configured(operation: Operation, bucket: &BucketName, code: &str) -> BackendError {
    BackendError::new(
        operation,
        bucket.as_str(),
        BackendErrorKind::NotFound,
        format!("{code} for bucket {bucket}"),
    )
    .with_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_classify_not_found_codes() {
        for code in NOT_FOUND_CODES {
            assert_eq!(classify(Some(400), Some(*code)), BackendErrorKind::NotFound);
        }
        assert_eq!(classify(Some(404), None), BackendErrorKind::NotFound);
    }

    #[test]
    fn test_should_classify_access_denied() {
        assert_eq!(
            classify(Some(403), Some("AccessDenied")),
            BackendErrorKind::AccessDenied
        );
        // HeadBucket responses carry no body, so only the status is known.
        assert_eq!(classify(Some(403), None), BackendErrorKind::AccessDenied);
    }

    #[test]
    fn test_should_classify_everything_else_as_other() {
        assert_eq!(classify(Some(503), Some("SlowDown")), BackendErrorKind::Other);
        assert_eq!(classify(Some(400), Some("MalformedPolicy")), BackendErrorKind::Other);
        assert_eq!(classify(None, None), BackendErrorKind::Other);
    }

    #[test]
    fn test_should_describe_missing_configuration() {
        let bucket = BucketName::new("b1").expect("valid name");
        let err = not_configured(
            Operation::GetPublicAccessBlock,
            &bucket,
            "NoSuchPublicAccessBlockConfiguration",
        );
        assert!(err.is_not_found());
        assert_eq!(
            err.code.as_deref(),
            Some("NoSuchPublicAccessBlockConfiguration")
        );
    }
}
