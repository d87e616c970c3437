//! alicloud-infra-operator: Kubernetes operator reconciling Alibaba Cloud
//! (aliyun) infrastructure for Cluster API.
//!
//! Watches `AlicloudCluster` and `AlicloudMachine` custom resources and
//! drives the underlying VPC/VSwitch/NAT/EIP/SLB/SecurityGroup network and
//! ECS instances toward the declared spec, adopting pre-existing cloud
//! resources by id where the spec supplies one and creating them otherwise.

pub mod aliyun;
pub mod controller;
pub mod crd;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod retry;
pub mod telemetry;

#[cfg(feature = "rest-api")]
pub mod rest_api;

pub use crate::error::{Error, Result};
