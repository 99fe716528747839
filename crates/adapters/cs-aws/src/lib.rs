//! AWS bindings for cloudscan.
//!
//! Thin glue between the AWS SDK and the scanner core:
//! - Client configuration with LocalStack-style endpoint support
//! - Region enumeration via EC2 `DescribeRegions`
//! - [`Ec2Scanner`] (instances, volumes, snapshots, Elastic IPs, NAT
//!   gateways) and [`S3Scanner`] implementations of `ServiceScanner`
//!
//! All SDK failures are funneled through the error classifier so the core
//! only ever sees classified `ApiError` variants.

mod client;
mod ec2;
mod error;
mod regions;
mod s3;

pub use client::{load_sdk_config, AwsConfig};
pub use ec2::Ec2Scanner;
pub use regions::describe_regions;
pub use s3::S3Scanner;
