//! S3 client construction.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use deploybucket_core::RunnerConfig;
use tracing::debug;

/// Build an S3 client from the ambient AWS configuration plus the runner's
/// region and endpoint overrides.
pub async fn build_client(config: &RunnerConfig) -> aws_sdk_s3::Client {
    let shared = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    aws_sdk_s3::Client::from_conf(s3_config(&shared, config))
}

fn s3_config(shared: &SdkConfig, config: &RunnerConfig) -> aws_sdk_s3::Config {
    let mut builder =
        aws_sdk_s3::config::Builder::from(shared).force_path_style(config.force_path_style);

    if let Some(url) = &config.endpoint_url {
        debug!(endpoint_url = %url, "using custom S3 endpoint");
        builder = builder.endpoint_url(url);
    }

    builder.build()
}
