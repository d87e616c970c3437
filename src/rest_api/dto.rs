//! Data Transfer Objects for the REST API
//!
//! Read-only views over the two CRDs this operator owns -- the API never
//! accepts writes, reconciliation state only flows from cluster to client.

use serde::Serialize;

use crate::crd::{AlicloudCluster, AlicloudMachine, ApiEndpoint};

/// Response for listing clusters
#[derive(Debug, Serialize)]
pub struct ClusterListResponse {
    pub items: Vec<ClusterSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub name: String,
    pub namespace: String,
    pub region_id: String,
    pub zone_id: String,
    pub ready: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDetailResponse {
    pub name: String,
    pub namespace: String,
    pub region_id: String,
    pub zone_id: String,
    pub ready: bool,
    pub reason: String,
    pub message: String,
    pub api_endpoints: Vec<ApiEndpoint>,
}

impl From<&AlicloudCluster> for ClusterSummary {
    fn from(c: &AlicloudCluster) -> Self {
        let status = c.status.clone().unwrap_or_default();
        Self {
            name: c.metadata.name.clone().unwrap_or_default(),
            namespace: c.metadata.namespace.clone().unwrap_or_default(),
            region_id: c.spec.region_id.clone(),
            zone_id: c.spec.zone_id.clone(),
            ready: status.ready,
        }
    }
}

impl From<&AlicloudCluster> for ClusterDetailResponse {
    fn from(c: &AlicloudCluster) -> Self {
        let status = c.status.clone().unwrap_or_default();
        Self {
            name: c.metadata.name.clone().unwrap_or_default(),
            namespace: c.metadata.namespace.clone().unwrap_or_default(),
            region_id: c.spec.region_id.clone(),
            zone_id: c.spec.zone_id.clone(),
            ready: status.ready,
            reason: status.reason,
            message: status.message,
            api_endpoints: status.api_endpoints,
        }
    }
}

/// Response for listing machines
#[derive(Debug, Serialize)]
pub struct MachineListResponse {
    pub items: Vec<MachineSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSummary {
    pub name: String,
    pub namespace: String,
    pub instance_type: String,
    pub phase: String,
    pub ready: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDetailResponse {
    pub name: String,
    pub namespace: String,
    pub instance_type: String,
    pub phase: String,
    pub ready: bool,
    pub id: String,
    pub error_reason: String,
    pub error_message: String,
}

impl From<&AlicloudMachine> for MachineSummary {
    fn from(m: &AlicloudMachine) -> Self {
        let status = m.status.clone().unwrap_or_default();
        Self {
            name: m.metadata.name.clone().unwrap_or_default(),
            namespace: m.metadata.namespace.clone().unwrap_or_default(),
            instance_type: m.spec.instance_type.clone(),
            phase: status.phase,
            ready: status.ready,
        }
    }
}

impl From<&AlicloudMachine> for MachineDetailResponse {
    fn from(m: &AlicloudMachine) -> Self {
        let status = m.status.clone().unwrap_or_default();
        Self {
            name: m.metadata.name.clone().unwrap_or_default(),
            namespace: m.metadata.namespace.clone().unwrap_or_default(),
            instance_type: m.spec.instance_type.clone(),
            phase: status.phase,
            ready: status.ready,
            id: status.id,
            error_reason: status.error_reason,
            error_message: status.error_message,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}
