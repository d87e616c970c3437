//! Custom Resource Definitions for the Alibaba Cloud infrastructure provider.
//!
//! `cluster`/`machine`/`network` carry the two reconciled CRDs
//! (`AlicloudCluster`, `AlicloudMachine`) and their shared sub-resource
//! spec/status types; `parent` carries the minimal vendored subset of
//! Cluster API's own `Cluster`/`Machine` types this crate reads from and
//! writes to but never owns.

pub mod cluster;
pub mod machine;
pub mod network;
pub mod parent;

pub use cluster::{AlicloudCluster, AlicloudClusterSpec, AlicloudClusterStatus, ApiEndpoint};
pub use machine::{
    AlicloudMachine, AlicloudMachineSpec, AlicloudMachineStatus, AlicloudMachineTemplate,
    AlicloudMachineTemplateResource, AlicloudMachineTemplateSpec, Instance, MachineAddress, MachineAddressType,
};
pub use network::*;

/// Finalizer installed on every `AlicloudCluster`/`AlicloudMachine` while
/// cloud resources may still exist, per spec.md §6. The original source
/// shares this one literal (`ClusterFinalizer`) across both controllers
/// rather than having a separate machine finalizer; kept as-is since the
/// two kinds never share a finalizer list.
pub const CLUSTER_FINALIZER: &str = "alicloud-cluster.infrastructure.cluster.x-k8s.io";

/// Control-plane API server port, fixed per spec.md §6.
pub const CONTROL_PLANE_PORT: i32 = 6443;
