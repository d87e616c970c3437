//! `AlicloudMachine`: one compute instance bound to a parent Cluster API
//! `Machine`. Spec/status field lists carried from
//! `api/v1alpha2/alicloudmachine_types.go`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha2",
    kind = "AlicloudMachine",
    plural = "alicloudmachines",
    namespaced,
    status = "AlicloudMachineStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AlicloudMachineSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub internet_charge_type: String,
    #[serde(default)]
    pub internet_max_bandwidth_in: String,
    #[serde(default)]
    pub internet_max_bandwidth_out: String,
    #[serde(default)]
    pub ssh_key_pair: String,
    #[serde(default)]
    pub image_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub capacity_reservation_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_disk_category: String,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub system_disk_size: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlicloudMachineStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<MachineAddress>,
    #[serde(default)]
    pub phase: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<Instance>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum MachineAddressType {
    InternalIp,
    ExternalIp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineAddress {
    #[serde(rename = "type")]
    pub address_type: MachineAddressType,
    pub address: String,
}

/// Observed ECS instance attributes, mirroring `api/v1alpha2/types.go`'s
/// `Instance` struct (which in turn mirrors the raw ECS SDK response).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Instance {
    #[serde(default, rename = "ImageId", skip_serializing_if = "String::is_empty")]
    pub image_id: String,
    #[serde(default, rename = "InstanceType", skip_serializing_if = "String::is_empty")]
    pub instance_type: String,
    #[serde(default, rename = "OsType", skip_serializing_if = "String::is_empty")]
    pub os_type: String,
    #[serde(default, rename = "DeviceAvailable")]
    pub device_available: bool,
    #[serde(default, rename = "InstanceNetworkType", skip_serializing_if = "String::is_empty")]
    pub instance_network_type: String,
    #[serde(default, rename = "LocalStorageAmount")]
    pub local_storage_amount: i64,
    #[serde(default, rename = "NetworkType", skip_serializing_if = "String::is_empty")]
    pub network_type: String,
    #[serde(default, rename = "IsSpot")]
    pub is_spot: bool,
    #[serde(default, rename = "InstanceChargeType", skip_serializing_if = "String::is_empty")]
    pub instance_charge_type: String,
    #[serde(default, rename = "InstanceName", skip_serializing_if = "String::is_empty")]
    pub instance_name: String,
    #[serde(default, rename = "StartTime", skip_serializing_if = "String::is_empty")]
    pub start_time: String,
    #[serde(default, rename = "ZoneId", skip_serializing_if = "String::is_empty")]
    pub zone_id: String,
    #[serde(default, rename = "InternetChargeType", skip_serializing_if = "String::is_empty")]
    pub internet_charge_type: String,
    #[serde(default, rename = "InternetMaxBandwidthIn")]
    pub internet_max_bandwidth_in: i64,
    #[serde(default, rename = "HostName", skip_serializing_if = "String::is_empty")]
    pub host_name: String,
    #[serde(default, rename = "Status", skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, rename = "CPU")]
    pub cpu: i64,
    #[serde(default, rename = "OSName", skip_serializing_if = "String::is_empty")]
    pub os_name: String,
    #[serde(default, rename = "OSNameEn", skip_serializing_if = "String::is_empty")]
    pub os_name_en: String,
    #[serde(default, rename = "SerialNumber", skip_serializing_if = "String::is_empty")]
    pub serial_number: String,
    #[serde(default, rename = "RegionId", skip_serializing_if = "String::is_empty")]
    pub region_id: String,
    #[serde(default, rename = "InternetMaxBandwidthOut")]
    pub internet_max_bandwidth_out: i64,
    #[serde(default, rename = "InstanceTypeFamily", skip_serializing_if = "String::is_empty")]
    pub instance_type_family: String,
    #[serde(default, rename = "InstanceId", skip_serializing_if = "String::is_empty")]
    pub instance_id: String,
    #[serde(default, rename = "Description", skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "ExpiredTime", skip_serializing_if = "String::is_empty")]
    pub expired_time: String,
    #[serde(default, rename = "OSType", skip_serializing_if = "String::is_empty")]
    pub os_type_caps: String,
    #[serde(default, rename = "Memory")]
    pub memory: i64,
    #[serde(default, rename = "CreationTime", skip_serializing_if = "String::is_empty")]
    pub creation_time: String,
    #[serde(default, rename = "KeyPairName", skip_serializing_if = "String::is_empty")]
    pub key_pair_name: String,
    #[serde(default, rename = "LocalStorageCapacity")]
    pub local_storage_capacity: i64,
    #[serde(default, rename = "VlanId", skip_serializing_if = "String::is_empty")]
    pub vlan_id: String,
    #[serde(default, rename = "StoppedMode", skip_serializing_if = "String::is_empty")]
    pub stopped_mode: String,
}

/// `AlicloudMachineTemplate`: pure data wrapper cloned by
/// MachineDeployment/MachineSet, supplemented from
/// `alicloudmachinetemplate_types.go` (present in the original API group but
/// dropped by the distillation). Carries no status and has no reconciler.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha2",
    kind = "AlicloudMachineTemplate",
    plural = "alicloudmachinetemplates",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AlicloudMachineTemplateSpec {
    pub template: AlicloudMachineTemplateResource,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlicloudMachineTemplateResource {
    pub spec: AlicloudMachineSpec,
}
