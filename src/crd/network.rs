//! Spec/status types for the networking sub-resources of `AlicloudCluster`.
//!
//! Field lists are carried verbatim from the original controller's
//! `api/v1alpha2/types.go` (desired-state `*Spec` structs plus the
//! observed-state mirrors returned by each `Describe*` call) rather than
//! trimmed to only the fields the reconciler touches directly.

use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_AVAILABLE: &str = "Available";

pub const SLB_INACTIVE: &str = "inactive";
pub const SLB_ACTIVE: &str = "active";
pub const SLB_LOCKED: &str = "locked";

pub const EIP_ASSOCIATING: &str = "Associating";
pub const EIP_UNASSOCIATING: &str = "Unassociating";
pub const EIP_IN_USE: &str = "InUse";
pub const EIP_AVAILABLE: &str = "Available";

pub const NGW_INITIATING: &str = "Initiating";
pub const NGW_AVAILABLE: &str = "Available";
pub const NGW_PENDING: &str = "Pending";

fn is_false(b: &bool) -> bool {
    !b
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NetworkSpec {
    #[serde(default, skip_serializing_if = "Default::default")]
    pub vpc: VpcSpec,
    #[serde(default, rename = "vSwitch", skip_serializing_if = "Default::default")]
    pub vswitch: VSwitchSpec,
    #[serde(default, skip_serializing_if = "Default::default")]
    pub nat: NatSpec,
    #[serde(default, skip_serializing_if = "Default::default")]
    pub slb: SlbSpec,
    #[serde(default, rename = "securityGroup", skip_serializing_if = "Default::default")]
    pub security_group: SecurityGroupSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VpcSpec {
    #[serde(default, rename = "vpcId", skip_serializing_if = "String::is_empty")]
    pub vpc_id: String,
    #[serde(default, rename = "vpcName", skip_serializing_if = "String::is_empty")]
    pub vpc_name: String,
    #[serde(default, rename = "cidrBlock", skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VSwitchSpec {
    #[serde(default, rename = "vSwitchId", skip_serializing_if = "String::is_empty")]
    pub vswitch_id: String,
    #[serde(default, rename = "vSwitchName", skip_serializing_if = "String::is_empty")]
    pub vswitch_name: String,
    #[serde(default, rename = "cidrBlock", skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NatSpec {
    #[serde(default, rename = "natGateway", skip_serializing_if = "Default::default")]
    pub nat_gateway: NatGatewaySpec,
    #[serde(default, skip_serializing_if = "Default::default")]
    pub eip: EipSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NatGatewaySpec {
    #[serde(default, rename = "natGatewayId", skip_serializing_if = "String::is_empty")]
    pub nat_gateway_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spec: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub duration: String,
    #[serde(default, rename = "instanceChargeType", skip_serializing_if = "String::is_empty")]
    pub instance_charge_type: String,
    #[serde(default, rename = "autoPay", skip_serializing_if = "String::is_empty")]
    pub auto_pay: String,
    #[serde(default, rename = "pricingCycle", skip_serializing_if = "String::is_empty")]
    pub pricing_cycle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EipSpec {
    #[serde(default, rename = "allocationId", skip_serializing_if = "String::is_empty")]
    pub allocation_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bandwidth: String,
    #[serde(default, rename = "isp", skip_serializing_if = "String::is_empty")]
    pub isp: String,
    #[serde(default, rename = "instanceChargeType", skip_serializing_if = "String::is_empty")]
    pub instance_charge_type: String,
    #[serde(default, rename = "internetChargeType", skip_serializing_if = "String::is_empty")]
    pub internet_charge_type: String,
    #[serde(default, rename = "pricingCycle", skip_serializing_if = "String::is_empty")]
    pub pricing_cycle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub period: String,
    #[serde(default, rename = "autoPay", skip_serializing_if = "String::is_empty")]
    pub auto_pay: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SlbSpec {
    #[serde(default, rename = "loadBalancerId", skip_serializing_if = "String::is_empty")]
    pub load_balancer_id: String,
    #[serde(default, rename = "vServerGroupId", skip_serializing_if = "String::is_empty")]
    pub vserver_group_id: String,
    #[serde(default, rename = "loadBalancerName", skip_serializing_if = "String::is_empty")]
    pub load_balancer_name: String,
    #[serde(default, rename = "addressType", skip_serializing_if = "String::is_empty")]
    pub address_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bandwidth: String,
    #[serde(default, rename = "addressIPVersion", skip_serializing_if = "String::is_empty")]
    pub address_ip_version: String,
    #[serde(default, rename = "vServerGroupName", skip_serializing_if = "String::is_empty")]
    pub vserver_group_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, rename = "loadBalancerSpec", skip_serializing_if = "String::is_empty")]
    pub load_balancer_spec: String,
    #[serde(default, rename = "cloudType", skip_serializing_if = "String::is_empty")]
    pub cloud_type: String,
    #[serde(default, rename = "masterZoneId", skip_serializing_if = "String::is_empty")]
    pub master_zone_id: String,
    #[serde(default, rename = "slaveZoneId", skip_serializing_if = "String::is_empty")]
    pub slave_zone_id: String,
    #[serde(default, rename = "deleteProtection", skip_serializing_if = "String::is_empty")]
    pub delete_protection: String,
    #[serde(default, rename = "internetChargeType", skip_serializing_if = "String::is_empty")]
    pub internet_charge_type: String,
    #[serde(default, rename = "payType", skip_serializing_if = "String::is_empty")]
    pub pay_type: String,
    #[serde(default, rename = "autoPay", skip_serializing_if = "String::is_empty")]
    pub auto_pay: String,
    #[serde(default, rename = "pricingCycle", skip_serializing_if = "String::is_empty")]
    pub pricing_cycle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SecurityGroupSpec {
    #[serde(default, rename = "securityGroupId", skip_serializing_if = "String::is_empty")]
    pub security_group_id: String,
    #[serde(default, rename = "securityGroupName", skip_serializing_if = "String::is_empty")]
    pub security_group_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<SecurityGroupRuleSpec>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "securityGroupType", skip_serializing_if = "String::is_empty")]
    pub security_group_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SecurityGroupRuleSpec {
    #[serde(default, rename = "nicType", skip_serializing_if = "String::is_empty")]
    pub nic_type: String,
    #[serde(default, rename = "ipProtocol", skip_serializing_if = "String::is_empty")]
    pub ip_protocol: String,
    #[serde(default, rename = "sourceCidrIp", skip_serializing_if = "String::is_empty")]
    pub source_cidr_ip: String,
    #[serde(default, rename = "portRange", skip_serializing_if = "String::is_empty")]
    pub port_range: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "sourceGroupId", skip_serializing_if = "String::is_empty")]
    pub source_group_id: String,
    #[serde(default, rename = "sourceGroupOwnerId", skip_serializing_if = "String::is_empty")]
    pub source_group_owner_id: String,
    #[serde(default, rename = "sourceGroupOwnerAccount", skip_serializing_if = "String::is_empty")]
    pub source_group_owner_account: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy: String,
    #[serde(default, rename = "ipv6SourceCidrIp", skip_serializing_if = "String::is_empty")]
    pub ipv6_source_cidr_ip: String,
    #[serde(default, rename = "sourcePortRange", skip_serializing_if = "String::is_empty")]
    pub source_port_range: String,
    #[serde(default, rename = "destCidrIp", skip_serializing_if = "String::is_empty")]
    pub dest_cidr_ip: String,
    #[serde(default, rename = "ipv6DestCidrIp", skip_serializing_if = "String::is_empty")]
    pub ipv6_dest_cidr_ip: String,
}

// ---- Observed state (Status subresource mirrors) ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Network {
    #[serde(default, skip_serializing_if = "Default::default")]
    pub vpc: Vpc,
    #[serde(default, rename = "vSwitch", skip_serializing_if = "Default::default")]
    pub vswitch: VSwitch,
    #[serde(default, skip_serializing_if = "Default::default")]
    pub slb: Slb,
    #[serde(default, skip_serializing_if = "Default::default")]
    pub nat: Nat,
    #[serde(default, rename = "securityGroup", skip_serializing_if = "Default::default")]
    pub security_group: SecurityGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Vpc {
    #[serde(default, rename = "vpcId", skip_serializing_if = "String::is_empty")]
    pub vpc_id: String,
    #[serde(default, rename = "regionId", skip_serializing_if = "String::is_empty")]
    pub region_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, rename = "vpcName", skip_serializing_if = "String::is_empty")]
    pub vpc_name: String,
    #[serde(default, rename = "creationTime", skip_serializing_if = "String::is_empty")]
    pub creation_time: String,
    #[serde(default, rename = "cidrBlock", skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
    #[serde(default, rename = "ipv6CidrBlock", skip_serializing_if = "String::is_empty")]
    pub ipv6_cidr_block: String,
    #[serde(default, rename = "vRouterId", skip_serializing_if = "String::is_empty")]
    pub vrouter_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "isDefault", skip_serializing_if = "is_false")]
    pub is_default: bool,
    #[serde(default, rename = "networkAclNum", skip_serializing_if = "String::is_empty")]
    pub network_acl_num: String,
    #[serde(default, rename = "resourceGroupId", skip_serializing_if = "String::is_empty")]
    pub resource_group_id: String,
    #[serde(default, rename = "cenStatus", skip_serializing_if = "String::is_empty")]
    pub cen_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VSwitch {
    #[serde(default, rename = "vSwitchId", skip_serializing_if = "String::is_empty")]
    pub vswitch_id: String,
    #[serde(default, rename = "vpcId", skip_serializing_if = "String::is_empty")]
    pub vpc_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, rename = "cidrBlock", skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
    #[serde(default, rename = "ipv6CidrBlock", skip_serializing_if = "String::is_empty")]
    pub ipv6_cidr_block: String,
    #[serde(default, rename = "zoneId", skip_serializing_if = "String::is_empty")]
    pub zone_id: String,
    #[serde(default, rename = "availableIpAddressCount", skip_serializing_if = "Default::default")]
    pub available_ip_address_count: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "vSwitchName", skip_serializing_if = "String::is_empty")]
    pub vswitch_name: String,
    #[serde(default, rename = "creationTime", skip_serializing_if = "String::is_empty")]
    pub creation_time: String,
    #[serde(default, rename = "isDefault", skip_serializing_if = "is_false")]
    pub is_default: bool,
    #[serde(default, rename = "resourceGroupId", skip_serializing_if = "String::is_empty")]
    pub resource_group_id: String,
    #[serde(default, rename = "networkAclId", skip_serializing_if = "String::is_empty")]
    pub network_acl_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Nat {
    #[serde(default, rename = "natGateway", skip_serializing_if = "Default::default")]
    pub nat_gateway: NatGateway,
    #[serde(default, skip_serializing_if = "Default::default")]
    pub eip: Eip,
    #[serde(default, rename = "snatEntryId", skip_serializing_if = "String::is_empty")]
    pub snat_entry_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NatGateway {
    #[serde(default, rename = "natGatewayId", skip_serializing_if = "String::is_empty")]
    pub nat_gateway_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "vpcId", skip_serializing_if = "String::is_empty")]
    pub vpc_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spec: String,
    #[serde(default, rename = "instanceChargeType", skip_serializing_if = "String::is_empty")]
    pub instance_charge_type: String,
    #[serde(default, rename = "expiredTime", skip_serializing_if = "String::is_empty")]
    pub expired_time: String,
    #[serde(default, rename = "autoPay", skip_serializing_if = "is_false")]
    pub auto_pay: bool,
    #[serde(default, rename = "businessStatus", skip_serializing_if = "String::is_empty")]
    pub business_status: String,
    #[serde(default, rename = "creationTime", skip_serializing_if = "String::is_empty")]
    pub creation_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, rename = "deletionProtection", skip_serializing_if = "is_false")]
    pub deletion_protection: bool,
    #[serde(default, rename = "snatTableIds", skip_serializing_if = "Vec::is_empty")]
    pub snat_table_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Eip {
    #[serde(default, rename = "ipAddress", skip_serializing_if = "String::is_empty")]
    pub ip_address: String,
    #[serde(default, rename = "privateIpAddress", skip_serializing_if = "String::is_empty")]
    pub private_ip_address: String,
    #[serde(default, rename = "allocationId", skip_serializing_if = "String::is_empty")]
    pub allocation_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, rename = "instanceId", skip_serializing_if = "String::is_empty")]
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bandwidth: String,
    #[serde(default, rename = "eipBandwidth", skip_serializing_if = "String::is_empty")]
    pub eip_bandwidth: String,
    #[serde(default, rename = "internetChargeType", skip_serializing_if = "String::is_empty")]
    pub internet_charge_type: String,
    #[serde(default, rename = "allocationTime", skip_serializing_if = "String::is_empty")]
    pub allocation_time: String,
    #[serde(default, rename = "instanceType", skip_serializing_if = "String::is_empty")]
    pub instance_type: String,
    #[serde(default, rename = "instanceRegionId", skip_serializing_if = "String::is_empty")]
    pub instance_region_id: String,
    #[serde(default, rename = "chargeType", skip_serializing_if = "String::is_empty")]
    pub charge_type: String,
    #[serde(default, rename = "expiredTime", skip_serializing_if = "String::is_empty")]
    pub expired_time: String,
    #[serde(default, rename = "hdMonitorStatus", skip_serializing_if = "String::is_empty")]
    pub hd_monitor_status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, rename = "isp", skip_serializing_if = "String::is_empty")]
    pub isp: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub descritpion: String,
    #[serde(default, rename = "resourceGroupId", skip_serializing_if = "String::is_empty")]
    pub resource_group_id: String,
    #[serde(default, rename = "hasReservationData", skip_serializing_if = "String::is_empty")]
    pub has_reservation_data: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(default, rename = "deletionProtection", skip_serializing_if = "is_false")]
    pub deletion_protection: bool,
    #[serde(default, rename = "secondLimited", skip_serializing_if = "is_false")]
    pub second_limited: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Slb {
    #[serde(default, rename = "loadBalancerId", skip_serializing_if = "String::is_empty")]
    pub load_balancer_id: String,
    #[serde(default, rename = "loadBalancerName", skip_serializing_if = "String::is_empty")]
    pub load_balancer_name: String,
    #[serde(default, rename = "loadBalancerStatus", skip_serializing_if = "String::is_empty")]
    pub load_balancer_status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, rename = "addressType", skip_serializing_if = "String::is_empty")]
    pub address_type: String,
    #[serde(default, rename = "regionId", skip_serializing_if = "String::is_empty")]
    pub region_id: String,
    #[serde(default, rename = "regionIdAlias", skip_serializing_if = "String::is_empty")]
    pub region_id_alias: String,
    #[serde(default, rename = "vSwitchId", skip_serializing_if = "String::is_empty")]
    pub vswitch_id: String,
    #[serde(default, rename = "vpcId", skip_serializing_if = "String::is_empty")]
    pub vpc_id: String,
    #[serde(default, rename = "networkType", skip_serializing_if = "String::is_empty")]
    pub network_type: String,
    #[serde(default, rename = "masterZoneId", skip_serializing_if = "String::is_empty")]
    pub master_zone_id: String,
    #[serde(default, rename = "slaveZoneId", skip_serializing_if = "String::is_empty")]
    pub slave_zone_id: String,
    #[serde(default, rename = "internetChargeType", skip_serializing_if = "String::is_empty")]
    pub internet_charge_type: String,
    #[serde(default, rename = "createTime", skip_serializing_if = "String::is_empty")]
    pub create_time: String,
    #[serde(default, rename = "createTimeStamp", skip_serializing_if = "Default::default")]
    pub create_time_stamp: i64,
    #[serde(default, rename = "payType", skip_serializing_if = "String::is_empty")]
    pub pay_type: String,
    #[serde(default, rename = "resourceGroupId", skip_serializing_if = "String::is_empty")]
    pub resource_group_id: String,
    #[serde(default, rename = "addressIPVersion", skip_serializing_if = "String::is_empty")]
    pub address_ip_version: String,
    #[serde(default, rename = "vServerGroupId", skip_serializing_if = "String::is_empty")]
    pub vserver_group_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SecurityGroup {
    #[serde(default, rename = "securityGroupId", skip_serializing_if = "String::is_empty")]
    pub security_group_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "securityGroupName", skip_serializing_if = "String::is_empty")]
    pub security_group_name: String,
    #[serde(default, rename = "vpcId", skip_serializing_if = "String::is_empty")]
    pub vpc_id: String,
    #[serde(default, rename = "creationTime", skip_serializing_if = "String::is_empty")]
    pub creation_time: String,
    #[serde(default, rename = "securityGroupType", skip_serializing_if = "String::is_empty")]
    pub security_group_type: String,
    #[serde(default, rename = "availableInstanceAmount", skip_serializing_if = "Default::default")]
    pub available_instance_amount: i32,
    #[serde(default, rename = "ecsCount", skip_serializing_if = "Default::default")]
    pub ecs_count: i32,
    #[serde(default, rename = "resourceGroupId", skip_serializing_if = "String::is_empty")]
    pub resource_group_id: String,
}
