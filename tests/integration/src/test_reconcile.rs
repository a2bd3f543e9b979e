//! End-to-end reconciliation tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::BucketVersioningStatus;
    use deploybucket_core::{
        DeploymentBucketPlugin, HOOK_BEFORE_VALIDATE, Invocation, Notice, RunOutcome,
    };
    use deploybucket_model::{BucketName, FeatureStatus, ServiceDefinition};
    use serde_json::json;

    use crate::{cleanup_bucket, s3_backend, s3_client, test_bucket_name};

    fn plugin(bucket: &str, custom: serde_json::Value) -> DeploymentBucketPlugin {
        let service: ServiceDefinition = serde_json::from_value(json!({
            "provider": { "deploymentBucket": { "name": bucket, "serverSideEncryption": "AES256" } },
            "custom": { "deploymentBucket": custom }
        }))
        .expect("valid service definition");
        let invocation = Invocation::builder()
            .commands(vec!["deploy".to_owned()])
            .build();
        DeploymentBucketPlugin::new(&service, &invocation).expect("valid configuration")
    }

    async fn run(client: &aws_sdk_s3::Client, plugin: &DeploymentBucketPlugin) -> RunOutcome {
        plugin
            .invoke(HOOK_BEFORE_VALIDATE, s3_backend(client))
            .await
            .expect("hook registered")
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_configure_bucket() {
        let client = s3_client();
        let bucket = test_bucket_name("deploy");
        let plugin = plugin(
            &bucket,
            json!({
                "versioning": true,
                "tags": [{ "Key": "team", "Value": "infra" }, { "Key": "bad" }]
            }),
        );

        let outcome = run(&client, &plugin).await;
        assert!(outcome.is_completed(), "{:?}", outcome.error_block());

        let name = BucketName::new(bucket.clone()).expect("valid name");
        let report = outcome.report();
        assert!(report.contains(&Notice::CreatingBucket(name)));
        assert!(report.contains(&Notice::Versioning(FeatureStatus::Enabled)));

        let versioning = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get versioning");
        assert_eq!(versioning.status(), Some(&BucketVersioningStatus::Enabled));

        let tagging = client
            .get_bucket_tagging()
            .bucket(&bucket)
            .send()
            .await
            .expect("get tagging");
        let tags: Vec<_> = tagging
            .tag_set()
            .iter()
            .map(|t| (t.key().to_owned(), t.value().to_owned()))
            .collect();
        assert_eq!(tags, vec![("team".to_owned(), "infra".to_owned())]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_issue_no_changes_on_second_run() {
        let client = s3_client();
        let bucket = test_bucket_name("idem");
        let plugin = plugin(
            &bucket,
            json!({ "versioning": true, "tags": [{ "Key": "env", "Value": "test" }] }),
        );

        let first = run(&client, &plugin).await;
        assert!(first.is_completed(), "{:?}", first.error_block());

        let second = run(&client, &plugin).await;
        assert!(second.is_completed(), "{:?}", second.error_block());
        let changes: Vec<_> = second
            .report()
            .notices()
            .iter()
            .filter(|n| !n.is_warning())
            .map(ToString::to_string)
            .collect();
        assert_eq!(changes, vec![format!("Using deployment bucket '{bucket}'")]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_suspend_versioning_when_disabled() {
        let client = s3_client();
        let bucket = test_bucket_name("suspend");

        let enabled = run(&client, &plugin(&bucket, json!({ "versioning": true }))).await;
        assert!(enabled.is_completed(), "{:?}", enabled.error_block());

        let disabled = run(&client, &plugin(&bucket, json!({ "versioning": false }))).await;
        assert!(
            disabled
                .report()
                .contains(&Notice::Versioning(FeatureStatus::Suspended))
        );

        let versioning = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get versioning");
        assert_eq!(versioning.status(), Some(&BucketVersioningStatus::Suspended));

        cleanup_bucket(&client, &bucket).await;
    }
}
