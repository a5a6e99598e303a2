//! S3 backend built on the AWS SDK
//!
//! Copies use `CopyObject`, so object bytes never pass through this
//! process. Listing follows continuation tokens to exhaustion.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;

use crate::{ObjectStore, StoreError};

/// Object store backed by S3 (or any S3-compatible endpoint).
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a store from the ambient AWS environment (credential chain,
    /// default region), with optional region/endpoint overrides.
    ///
    /// An explicit endpoint switches to path-style addressing so
    /// S3-compatible stores (MinIO, LocalStack) resolve buckets correctly.
    pub async fn from_env(region: Option<&str>, endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| StoreError::list(bucket, prefix, DisplayErrorContext(e)))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }

        tracing::debug!(bucket, prefix, count = keys.len(), "listed source objects");
        Ok(keys)
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), StoreError> {
        self.client
            .copy_object()
            .copy_source(format!("{source_bucket}/{source_key}"))
            .bucket(destination_bucket)
            .key(destination_key)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| {
                StoreError::copy(
                    source_bucket,
                    source_key,
                    destination_bucket,
                    destination_key,
                    DisplayErrorContext(e),
                )
            })
    }
}
