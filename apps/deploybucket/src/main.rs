//! deploybucket - ensure the deployment bucket exists and is configured.
//!
//! The host framework runs this binary before it validates the deployment
//! package. It reads the host's resolved service definition, registers the
//! deployment bucket hook and, when registered, reconciles the bucket
//! against S3.
//!
//! # Usage
//!
//! ```text
//! SERVICE_DEFINITION=.serverless/service.json deploybucket deploy
//! ```
//!
//! Positional arguments are the commands the host is processing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SERVICE_DEFINITION` | `.serverless/service.json` | Resolved service definition |
//! | `FRAMEWORK_VERSION` | `3.0.0` | Host framework version |
//! | `DEFAULT_REGION` / `AWS_REGION` | `us-east-1` | Bucket region |
//! | `S3_ENDPOINT_URL` | *(unset)* | Custom S3 endpoint |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style addressing |
//! | `WAIT_TIMEOUT_SECS` | `100` | Bucket-exists waiter bound |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use deploybucket_core::{DeploymentBucketPlugin, Invocation, RunnerConfig};
use deploybucket_model::{FrameworkVersion, ServiceDefinition};
use deploybucket_s3::S3Backend;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the [`Invocation`] from the runner config and positional arguments.
fn build_invocation(config: &RunnerConfig, commands: Vec<String>) -> Result<Invocation> {
    let framework_version: FrameworkVersion = config
        .framework_version
        .parse()
        .context("invalid FRAMEWORK_VERSION")?;

    Ok(Invocation::builder()
        .commands(commands)
        .framework_version(framework_version)
        .build())
}

fn parse_service(raw: &str, path: &Path) -> Result<ServiceDefinition> {
    serde_json::from_str(raw)
        .with_context(|| format!("invalid service definition in {}", path.display()))
}

async fn load_service(path: &Path) -> Result<ServiceDefinition> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read service definition {}", path.display()))?;
    parse_service(&raw, path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RunnerConfig::from_env();

    init_tracing(&config.log_level)?;

    let invocation = build_invocation(&config, std::env::args().skip(1).collect())?;

    info!(
        service_definition = %config.service_definition,
        framework_version = %invocation.framework_version,
        commands = ?invocation.commands,
        region = %config.region,
        version = VERSION,
        "starting deploybucket",
    );

    let service = load_service(Path::new(&config.service_definition)).await?;
    let plugin = DeploymentBucketPlugin::new(&service, &invocation)
        .context("invalid deployment bucket configuration")?;

    let Some(hook) = plugin.hooks().first().copied() else {
        info!("deployment bucket hook not registered, nothing to do");
        return Ok(());
    };

    let backend = Arc::new(S3Backend::from_config(&config).await);
    if let Some(outcome) = plugin.invoke(hook, backend).await {
        // Failures were already reported by the error boundary; the host
        // deployment goes on regardless.
        info!(
            completed = outcome.is_completed(),
            notices = outcome.report().notices().len(),
            "deployment bucket hook finished",
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_invocation_from_config() {
        let config = RunnerConfig::builder()
            .framework_version("2.9.1".to_owned())
            .build();
        let invocation =
            build_invocation(&config, vec!["deploy".to_owned()]).expect("valid invocation");
        assert_eq!(invocation.framework_version, FrameworkVersion::new(2, 9));
        assert_eq!(invocation.commands, vec!["deploy".to_owned()]);
        assert!(!invocation.is_packaging());
    }

    #[test]
    fn test_should_reject_bad_framework_version() {
        let config = RunnerConfig::builder()
            .framework_version("three".to_owned())
            .build();
        let err = build_invocation(&config, Vec::new()).expect_err("invalid version");
        assert!(err.to_string().contains("FRAMEWORK_VERSION"));
    }

    #[test]
    fn test_should_report_path_of_invalid_service_definition() {
        let err = parse_service("{not json", Path::new("svc.json")).expect_err("invalid json");
        assert!(err.to_string().contains("svc.json"));
    }

    #[test]
    fn test_should_parse_service_definition() {
        let raw = r#"{
            "service": "demo",
            "provider": { "deploymentBucket": { "name": "demo-deploys" } },
            "custom": { "deploymentBucket": { "versioning": true } }
        }"#;
        let service = parse_service(raw, Path::new("svc.json")).expect("valid json");
        let plugin =
            DeploymentBucketPlugin::new(&service, &Invocation::default()).expect("valid config");
        assert_eq!(plugin.hooks().len(), 1);
    }

    #[test]
    fn test_should_fail_on_missing_service_file() {
        let err = tokio_test::block_on(load_service(Path::new("does/not/exist.json")))
            .expect_err("missing file");
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
