//! S3 bucket scanner.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::types::Bucket;
use chrono::{DateTime, Utc};
use cs_error::ApiError;
use cs_traits::{ResourcePage, ServiceScanner};
use cs_types::{Region, ResourceRecord};

use crate::error::classify_sdk_error;

/// Scans S3 buckets via `ListBuckets`.
///
/// S3 is a global service, so buckets are enumerated only when the task's
/// region matches the scanner's home region; every other region gets an
/// empty final page. This keeps the one-task-per-(region, service)
/// contract without double-counting buckets.
pub struct S3Scanner {
    client: aws_sdk_s3::Client,
    home_region: Region,
}

impl S3Scanner {
    pub fn new(sdk_config: &SdkConfig, home_region: Region) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
            home_region,
        }
    }
}

#[async_trait]
impl ServiceScanner for S3Scanner {
    fn service_name(&self) -> &str {
        "S3"
    }

    async fn fetch_page(
        &self,
        region: &Region,
        token: Option<&str>,
    ) -> Result<ResourcePage, ApiError> {
        if *region != self.home_region {
            return Ok(ResourcePage::last(vec![]));
        }

        let output = self
            .client
            .list_buckets()
            .set_continuation_token(token.map(String::from))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let items: Vec<ResourceRecord> = output
            .buckets()
            .iter()
            .filter_map(|b| map_bucket(b, region))
            .collect();

        Ok(match output.continuation_token() {
            Some(next) => ResourcePage::with_next(items, next),
            None => ResourcePage::last(items),
        })
    }
}

fn map_bucket(bucket: &Bucket, region: &Region) -> Option<ResourceRecord> {
    let name = bucket.name()?;
    let mut record = ResourceRecord::new("S3", region.clone(), name, "Bucket");
    if let Some(created) = bucket.creation_date().and_then(to_chrono) {
        record = record.with_created_at(created);
    }
    Some(record)
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
