//! In-memory bucket backend.
//!
//! Used by the reconciliation tests and available to downstream crates that
//! want to dry-run a configuration without touching S3.

mod backend;
mod bucket;

pub use backend::{DEFAULT_ACCOUNT, InMemoryBackend, RecordedCall};
pub use bucket::MemoryBucket;
