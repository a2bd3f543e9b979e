//! Deployment bucket reconciliation engine.
//!
//! This crate drives an S3 deployment bucket toward the state declared in a
//! [`DesiredConfiguration`](deploybucket_model::DesiredConfiguration). It owns
//! the backend boundary, the per-property state probes, the ordered
//! reconciliation steps, and the error boundary the host hook runs inside.
//!
//! # Architecture
//!
//! ```text
//! DeploymentBucketPlugin (hook registration, error boundary)
//!        |
//!        v
//!   Reconciler (exists -> encryption -> ... -> access logging)
//!        |
//!        v
//!   StateProbe (not-found -> Absent, per-property failure policy)
//!        |
//!        v
//!   BucketBackend (S3 or in-memory)
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod operation;
pub mod plugin;
pub mod probe;
pub mod reconcile;
pub mod report;
pub mod run;

pub use backend::{AppliedEncryption, BucketBackend};
pub use config::RunnerConfig;
pub use error::{BackendError, BackendErrorKind, BackendResult, ReconcileError, ReconcileResult};
pub use operation::Operation;
pub use plugin::{DeploymentBucketPlugin, HOOK_BEFORE_VALIDATE, Invocation, RunOutcome};
pub use reconcile::Reconciler;
pub use report::{Notice, ReconcileReport};
pub use run::{BucketOrigin, ReconciliationRun};
