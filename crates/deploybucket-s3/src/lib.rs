//! Amazon S3 backend for the deployment bucket reconciler.
//!
//! [`S3Backend`] implements [`BucketBackend`](deploybucket_core::BucketBackend)
//! on top of `aws-sdk-s3`. Service errors are classified into
//! [`BackendErrorKind`](deploybucket_core::BackendErrorKind) so the probes can
//! tell "not configured" apart from real failures.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::S3Backend;
pub use client::build_client;
