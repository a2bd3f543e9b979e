//! Host lifecycle integration and the top-level error boundary.
//!
//! The host framework calls registered hooks by name. This tool registers a
//! single hook that runs before the host validates its deployment package;
//! the callback reconciles the bucket and never lets a failure escape.

use std::sync::Arc;

use deploybucket_model::{ConfigResult, DesiredConfiguration, FrameworkVersion, ServiceDefinition};
use tracing::{debug, error};
use typed_builder::TypedBuilder;

use crate::backend::BucketBackend;
use crate::error::ReconcileError;
use crate::reconcile::Reconciler;
use crate::report::ReconcileReport;

/// The lifecycle event this tool hooks into.
pub const HOOK_BEFORE_VALIDATE: &str = "before:aws:common:validate:validate";

/// Host command that only builds artifacts and must not touch the bucket.
const PACKAGE_COMMAND: &str = "package";

/// Banner printed above an aborted run's error message.
const ERROR_BANNER: &str = "-------- Deployment Bucket Error --------";

/// How the host was invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
pub struct Invocation {
    /// Commands the host is processing (e.g. `["deploy"]`).
    #[builder(default)]
    pub commands: Vec<String>,
    /// Host framework version.
    #[builder(default)]
    pub framework_version: FrameworkVersion,
}

impl Invocation {
    /// Whether the host is only packaging.
    #[must_use]
    pub fn is_packaging(&self) -> bool {
        self.commands.iter().any(|c| c == PACKAGE_COMMAND)
    }
}

/// Result of one hook invocation.
#[derive(Debug)]
pub enum RunOutcome {
    /// All steps finished.
    Completed(ReconcileReport),
    /// A mutation failed; later steps were not run.
    Aborted {
        /// Notices recorded before the failure.
        report: ReconcileReport,
        /// The failure.
        error: ReconcileError,
    },
}

impl RunOutcome {
    /// The notices recorded during the run.
    #[must_use]
    pub fn report(&self) -> &ReconcileReport {
        match self {
            Self::Completed(report) | Self::Aborted { report, .. } => report,
        }
    }

    /// Whether every step finished.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The user-facing error block for an aborted run.
    #[must_use]
    pub fn error_block(&self) -> Option<String> {
        match self {
            Self::Completed(_) => None,
            Self::Aborted { error, .. } => Some(format!("\n{ERROR_BANNER}\n{error}")),
        }
    }
}

/// The deployment bucket plugin as seen by the host.
#[derive(Debug, Clone)]
pub struct DeploymentBucketPlugin {
    desired: Option<DesiredConfiguration>,
    hooks: Vec<&'static str>,
}

impl DeploymentBucketPlugin {
    /// Resolve the configuration and decide which hooks to register.
    ///
    /// No hook is registered when the plugin is disabled, no bucket name is
    /// configured, or the host is only packaging.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the service definition is invalid.
    pub fn new(service: &ServiceDefinition, invocation: &Invocation) -> ConfigResult<Self> {
        let desired = DesiredConfiguration::resolve(service, invocation.framework_version)?;

        let hooks = match &desired {
            Some(_) if invocation.is_packaging() => {
                debug!("packaging only, deployment bucket hook not registered");
                Vec::new()
            }
            Some(_) => vec![HOOK_BEFORE_VALIDATE],
            None => Vec::new(),
        };

        Ok(Self { desired, hooks })
    }

    /// Registered hook names.
    #[must_use]
    pub fn hooks(&self) -> &[&'static str] {
        &self.hooks
    }

    /// The resolved desired configuration, if the plugin is enabled.
    #[must_use]
    pub fn desired(&self) -> Option<&DesiredConfiguration> {
        self.desired.as_ref()
    }

    /// Run the callback registered for `hook`.
    ///
    /// Returns `None` when `hook` is not registered.
    pub async fn invoke(&self, hook: &str, backend: Arc<dyn BucketBackend>) -> Option<RunOutcome> {
        if !self.hooks.iter().any(|h| *h == hook) {
            debug!(hook, "hook not registered");
            return None;
        }
        let desired = self.desired.as_ref()?;
        Some(apply_deployment_bucket(desired, backend).await)
    }
}

/// Reconcile the bucket, containing any failure.
///
/// The first failed mutation is logged as an error block and returned in
/// [`RunOutcome::Aborted`]. Nothing is retried.
pub async fn apply_deployment_bucket(
    desired: &DesiredConfiguration,
    backend: Arc<dyn BucketBackend>,
) -> RunOutcome {
    let mut report = ReconcileReport::new(desired.bucket_name.clone());
    let reconciler = Reconciler::new(backend);

    let outcome = match reconciler.reconcile(desired, &mut report).await {
        Ok(run) => {
            debug!(bucket = %run.bucket(), origin = ?run.origin(), "deployment bucket reconciled");
            RunOutcome::Completed(report)
        }
        Err(error) => RunOutcome::Aborted { report, error },
    };

    if let Some(block) = outcome.error_block() {
        error!("{block}");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::BackendErrorKind;
    use crate::memory::InMemoryBackend;
    use crate::operation::Operation;
    use crate::report::Notice;

    fn service(value: serde_json::Value) -> ServiceDefinition {
        serde_json::from_value(value).expect("valid service definition")
    }

    fn deploy() -> Invocation {
        Invocation::builder()
            .commands(vec!["deploy".to_owned()])
            .build()
    }

    fn with_bucket() -> ServiceDefinition {
        service(json!({
            "provider": { "deploymentBucket": { "name": "b1" } },
            "custom": { "deploymentBucket": { "versioning": true } }
        }))
    }

    #[test]
    fn test_should_register_hook_when_bucket_named() {
        let plugin = DeploymentBucketPlugin::new(&with_bucket(), &deploy()).expect("valid");
        assert_eq!(plugin.hooks(), &[HOOK_BEFORE_VALIDATE]);
        assert!(plugin.desired().is_some_and(|d| d.versioning));
    }

    #[test]
    fn test_should_not_register_hook_when_packaging() {
        let invocation = Invocation::builder()
            .commands(vec!["package".to_owned()])
            .build();
        let plugin = DeploymentBucketPlugin::new(&with_bucket(), &invocation).expect("valid");
        assert!(plugin.hooks().is_empty());
    }

    #[test]
    fn test_should_not_register_hook_when_disabled() {
        let service = service(json!({
            "provider": { "deploymentBucket": { "name": "b1" } },
            "custom": { "deploymentBucket": { "enabled": false } }
        }));
        let plugin = DeploymentBucketPlugin::new(&service, &deploy()).expect("valid");
        assert!(plugin.hooks().is_empty());
        assert!(plugin.desired().is_none());
    }

    #[test]
    fn test_should_not_register_hook_without_bucket_name() {
        let service = service(json!({ "provider": { "name": "aws" } }));
        let plugin = DeploymentBucketPlugin::new(&service, &deploy()).expect("valid");
        assert!(plugin.hooks().is_empty());
    }

    #[test]
    fn test_should_read_legacy_provider_key_on_old_framework() {
        let service = service(json!({
            "provider": { "deploymentBucketObject": { "name": "b1" } }
        }));
        let invocation = Invocation::builder()
            .framework_version(FrameworkVersion::new(2, 9))
            .build();
        let plugin = DeploymentBucketPlugin::new(&service, &invocation).expect("valid");
        assert_eq!(plugin.hooks(), &[HOOK_BEFORE_VALIDATE]);
    }

    #[test]
    fn test_should_reject_unknown_plugin_keys() {
        let service = service(json!({
            "provider": { "deploymentBucket": { "name": "b1" } },
            "custom": { "deploymentBucket": { "acceleration": true } }
        }));
        assert!(DeploymentBucketPlugin::new(&service, &deploy()).is_err());
    }

    #[tokio::test]
    async fn test_should_ignore_unregistered_hook() {
        let plugin = DeploymentBucketPlugin::new(&with_bucket(), &deploy()).expect("valid");
        let backend = Arc::new(InMemoryBackend::new());

        let outcome = plugin.invoke("after:deploy:deploy", backend.clone()).await;
        assert!(outcome.is_none());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_complete_run_through_hook() {
        let plugin = DeploymentBucketPlugin::new(&with_bucket(), &deploy()).expect("valid");
        let backend = Arc::new(InMemoryBackend::new());

        let outcome = plugin
            .invoke(HOOK_BEFORE_VALIDATE, backend.clone())
            .await
            .expect("hook registered");

        assert!(outcome.is_completed());
        assert!(outcome.error_block().is_none());
        assert!(
            outcome
                .report()
                .contains(&Notice::Versioning(deploybucket_model::FeatureStatus::Enabled))
        );
    }

    #[tokio::test]
    async fn test_should_contain_failure_in_error_block() {
        let plugin = DeploymentBucketPlugin::new(&with_bucket(), &deploy()).expect("valid");
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail(Operation::CreateBucket, BackendErrorKind::Other);

        let outcome = plugin
            .invoke(HOOK_BEFORE_VALIDATE, backend.clone())
            .await
            .expect("hook registered");

        assert!(!outcome.is_completed());
        let block = outcome.error_block().expect("aborted run has an error block");
        assert!(block.starts_with("\n-------- Deployment Bucket Error --------\n"));
        assert!(block.ends_with("CreateBucket on bucket 'b1' failed: injected failure"));
        assert_eq!(backend.count(Operation::CreateBucket), 1);
        assert_eq!(backend.count(Operation::GetBucketVersioning), 0);
    }

    #[tokio::test]
    async fn test_should_route_rejected_bucket_name_through_error_block() {
        let service = service(json!({
            "provider": { "deploymentBucket": { "name": "My_Legacy_Bucket" } }
        }));
        let plugin = DeploymentBucketPlugin::new(&service, &deploy()).expect("valid");
        assert_eq!(plugin.hooks(), &[HOOK_BEFORE_VALIDATE]);

        let backend = Arc::new(InMemoryBackend::new());
        backend.fail(Operation::CreateBucket, BackendErrorKind::Other);
        let outcome = plugin
            .invoke(HOOK_BEFORE_VALIDATE, backend.clone())
            .await
            .expect("hook registered");

        assert!(!outcome.is_completed());
        let block = outcome.error_block().expect("aborted run has an error block");
        assert!(block.contains("CreateBucket on bucket 'My_Legacy_Bucket' failed"));
    }
}
