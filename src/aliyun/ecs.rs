//! ECS instance + key pair client, ported from the `ecs.Client` usage inside
//! `controllers/alicloudmachine_processer.go` (`tryGetInstance`,
//! `createInstance`, `deleteInstance`, `FillRunInstancesReq`,
//! `reconcileSSHKey`).

use tracing::{debug, info, instrument};

use crate::crd::machine::{AlicloudMachineSpec, Instance, MachineAddress, MachineAddressType};
use crate::error::{Error, Result};
use crate::retry::{try_op, Backoff};

use super::AliyunContext;

const ENDPOINT: &str = "https://ecs.aliyuncs.com/";
const VERSION: &str = "2014-05-26";

/// Matches `DefaultOSImageId` upstream: used when the spec leaves
/// `imageId` empty.
pub const DEFAULT_OS_IMAGE_ID: &str = "aliyun_2_1903_64_20G_alibase_20190829.vhd";

/// Matches `DefaultInstanceType` upstream.
pub const DEFAULT_INSTANCE_TYPE: &str = "ecs.c1.large";

/// Matches `pkg.DefaultSSHKeyName` upstream: the key pair every machine
/// authenticates with when the spec doesn't name one.
pub const DEFAULT_SSH_KEY_NAME: &str = "cluster-api-provider-alicloud-default";

pub const INSTANCE_STATUS_RUNNING: &str = "Running";
pub const INSTANCE_STATUS_STOPPED: &str = "Stopped";

#[derive(Clone)]
pub struct EcsClient {
    ctx: AliyunContext,
}

/// Shape returned from `DescribeInstances`, kept distinct from
/// [`crate::crd::machine::Instance`] (the CRD status projection) since the
/// describe response carries a few fields (`VpcAttributes`,
/// `NetworkInterfaces`, `EipAddress`) that only exist to derive addresses
/// and are never persisted verbatim.
#[derive(Clone, Debug, Default)]
pub struct EcsInstance {
    pub instance: Instance,
    pub private_ips: Vec<String>,
    pub public_ips: Vec<String>,
}

impl EcsClient {
    pub fn new(ctx: AliyunContext) -> Self {
        Self { ctx }
    }

    /// `tryGetInstance`: looks an instance up by id, tolerating "doesn't
    /// exist yet" as `Ok(None)` rather than an error.
    #[instrument(skip(self), fields(sdk_action = "DescribeInstances"))]
    pub async fn describe(&self, instance_id: &str) -> Result<Option<EcsInstance>> {
        let instance_id = instance_id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let instance_id = instance_id.clone();
            async move {
                debug!("requesting DescribeInstances");
                let body = ctx
                    .call(
                        ENDPOINT,
                        "DescribeInstances",
                        VERSION,
                        vec![("InstanceIds".to_string(), format!("[\"{instance_id}\"]"))],
                    )
                    .await?;
                Ok(parse_describe(&body))
            }
        })
        .await
    }

    /// `createInstance` + `FillRunInstancesReq`/`fillInstanceReqByMachineSpec`:
    /// builds the `RunInstances` request from the machine spec, defaulting
    /// image/instance-type/key-pair the same way upstream does.
    #[instrument(skip(self, spec), fields(sdk_action = "RunInstances"))]
    pub async fn run_instance(
        &self,
        spec: &AlicloudMachineSpec,
        vswitch_id: &str,
        security_group_id: &str,
        user_data: &str,
    ) -> Result<String> {
        let params = run_instances_params(spec, vswitch_id, security_group_id, user_data);
        let id = try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let params = params.clone();
            async move {
                debug!("requesting RunInstances");
                let body = ctx.call(ENDPOINT, "RunInstances", VERSION, params).await?;
                let ids = body
                    .get("InstanceIdSets")
                    .and_then(|v| v.get("InstanceIdSet"))
                    .and_then(|v| v.as_array())
                    .and_then(|arr| arr.first())
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                if ids.is_empty() {
                    return Err(Error::MissingField("InstanceIdSets.InstanceIdSet[0]".to_string()));
                }
                Ok(ids)
            }
        })
        .await?;
        info!(instance_id = %id, "created");
        Ok(id)
    }

    /// `deleteInstance`: force-stops then deletes; a missing instance is
    /// treated as success, matching the upstream `IsNotFoundError` check.
    #[instrument(skip(self), fields(sdk_action = "DeleteInstance"))]
    pub async fn delete(&self, instance_id: &str) -> Result<()> {
        let instance_id = instance_id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let instance_id = instance_id.clone();
            async move {
                debug!("requesting DeleteInstance");
                match ctx
                    .call(
                        ENDPOINT,
                        "DeleteInstance",
                        VERSION,
                        vec![
                            ("InstanceId".to_string(), instance_id),
                            ("Force".to_string(), "true".to_string()),
                        ],
                    )
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(Error::Cloud(e)) if e.is_idempotent_success() => Ok(()),
                    Err(Error::Cloud(e)) if e.is_retry_signal() => Err(Error::Retry),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}

fn run_instances_params(
    spec: &AlicloudMachineSpec,
    vswitch_id: &str,
    security_group_id: &str,
    user_data: &str,
) -> Vec<(String, String)> {
    let image_id = if spec.image_id.is_empty() { DEFAULT_OS_IMAGE_ID } else { &spec.image_id };
    let instance_type = if spec.instance_type.is_empty() { DEFAULT_INSTANCE_TYPE } else { &spec.instance_type };
    let key_pair_name = if spec.ssh_key_pair.is_empty() { DEFAULT_SSH_KEY_NAME } else { &spec.ssh_key_pair };

    let mut params = vec![
        ("ImageId".to_string(), image_id.to_string()),
        ("InstanceType".to_string(), instance_type.to_string()),
        ("VSwitchId".to_string(), vswitch_id.to_string()),
        ("SecurityGroupId".to_string(), security_group_id.to_string()),
        ("KeyPairName".to_string(), key_pair_name.to_string()),
        ("Amount".to_string(), "1".to_string()),
        ("ClientToken".to_string(), super::idempotence_token()),
    ];

    if !spec.system_disk_category.is_empty() {
        params.push(("SystemDisk.Category".to_string(), spec.system_disk_category.clone()));
    }
    if !spec.system_disk_size.is_empty() {
        params.push(("SystemDisk.Size".to_string(), spec.system_disk_size.clone()));
    }
    if !spec.internet_charge_type.is_empty() {
        params.push(("InternetChargeType".to_string(), spec.internet_charge_type.clone()));
    }
    // InternetMaxBandwidthIn/Out are set only if both are present, matching
    // upstream's paired-fields check (a lone bandwidth value is rejected by
    // the API, so neither is sent unless both are).
    if !spec.internet_max_bandwidth_in.is_empty() && !spec.internet_max_bandwidth_out.is_empty() {
        params.push(("InternetMaxBandwidthIn".to_string(), spec.internet_max_bandwidth_in.clone()));
        params.push(("InternetMaxBandwidthOut".to_string(), spec.internet_max_bandwidth_out.clone()));
    }
    if !spec.capacity_reservation_id.is_empty() {
        params.push((
            "CapacityReservation.Preference".to_string(),
            "OpenCapacityReservation".to_string(),
        ));
        params.push(("CapacityReservation.CapacityReservationId".to_string(), spec.capacity_reservation_id.clone()));
    }
    if !user_data.is_empty() {
        // Upstream passes `machine.Spec.Bootstrap.Data` straight through as
        // UserData with no further encoding (its optional gzip step is dead
        // code, never reached) -- bootstrap data is already base64 by CAPI
        // convention, so re-encoding here would double-encode it.
        params.push(("UserData".to_string(), user_data.to_string()));
    }

    params
}

fn parse_describe(body: &serde_json::Value) -> Option<EcsInstance> {
    let entries = body.get("Instances")?.get("Instance")?.as_array()?;
    let entry = entries.first()?;

    let private_ips = entry
        .get("NetworkInterfaces")
        .and_then(|v| v.get("NetworkInterface"))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter().filter_map(|nic| nic.get("PrimaryIpAddress").and_then(|v| v.as_str()).map(String::from)).collect()
        })
        .unwrap_or_default();
    let public_ips = entry
        .get("PublicIpAddress")
        .and_then(|v| v.get("IpAddress"))
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    let instance = Instance {
        image_id: super::field(entry, "ImageId").to_string(),
        instance_type: super::field(entry, "InstanceType").to_string(),
        os_type: super::field(entry, "OSType").to_string(),
        device_available: entry.get("DeviceAvailable").and_then(|v| v.as_bool()).unwrap_or(false),
        instance_network_type: super::field(entry, "InstanceNetworkType").to_string(),
        local_storage_amount: entry.get("LocalStorageAmount").and_then(|v| v.as_i64()).unwrap_or(0),
        network_type: super::field(entry, "InstanceNetworkType").to_string(),
        is_spot: super::field(entry, "SpotStrategy") == "SpotAsPriceGo",
        instance_charge_type: super::field(entry, "InstanceChargeType").to_string(),
        instance_name: super::field(entry, "InstanceName").to_string(),
        start_time: super::field(entry, "StartTime").to_string(),
        zone_id: super::field(entry, "ZoneId").to_string(),
        internet_charge_type: super::field(entry, "InternetChargeType").to_string(),
        internet_max_bandwidth_in: entry.get("InternetMaxBandwidthIn").and_then(|v| v.as_i64()).unwrap_or(0),
        host_name: super::field(entry, "HostName").to_string(),
        status: super::field(entry, "Status").to_string(),
        cpu: entry.get("Cpu").and_then(|v| v.as_i64()).unwrap_or(0),
        os_name: super::field(entry, "OSName").to_string(),
        os_name_en: super::field(entry, "OSNameEn").to_string(),
        serial_number: super::field(entry, "SerialNumber").to_string(),
        region_id: super::field(entry, "RegionId").to_string(),
        internet_max_bandwidth_out: entry.get("InternetMaxBandwidthOut").and_then(|v| v.as_i64()).unwrap_or(0),
        instance_type_family: super::field(entry, "InstanceTypeFamily").to_string(),
        instance_id: super::field(entry, "InstanceId").to_string(),
        description: super::field(entry, "Description").to_string(),
        expired_time: super::field(entry, "ExpiredTime").to_string(),
        os_type_caps: super::field(entry, "OSType").to_string(),
        memory: entry.get("Memory").and_then(|v| v.as_i64()).unwrap_or(0),
        creation_time: super::field(entry, "CreationTime").to_string(),
        key_pair_name: super::field(entry, "KeyPairName").to_string(),
        local_storage_capacity: entry.get("LocalStorageCapacity").and_then(|v| v.as_i64()).unwrap_or(0),
        vlan_id: super::field(entry, "VlanId").to_string(),
        stopped_mode: super::field(entry, "StoppedMode").to_string(),
    };

    Some(EcsInstance { instance, private_ips, public_ips })
}

/// `getAddresses`: internal IPs first, then public, matching the order the
/// Go code appends them to `machine.Status.Addresses`.
pub fn addresses(instance: &EcsInstance) -> Vec<MachineAddress> {
    let mut out: Vec<MachineAddress> = instance
        .private_ips
        .iter()
        .map(|ip| MachineAddress { address_type: MachineAddressType::InternalIp, address: ip.clone() })
        .collect();
    out.extend(
        instance
            .public_ips
            .iter()
            .map(|ip| MachineAddress { address_type: MachineAddressType::ExternalIp, address: ip.clone() }),
    );
    out
}

/// Key pair client, ported from the raw `ecs.Client` calls inside
/// `reconcileSSHKey` (no dedicated Go wrapper exists upstream for this one).
#[derive(Clone)]
pub struct KeyPairClient {
    ctx: AliyunContext,
}

impl KeyPairClient {
    pub fn new(ctx: AliyunContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(sdk_action = "DescribeKeyPairs"))]
    pub async fn exists(&self, key_pair_name: &str) -> Result<bool> {
        let key_pair_name = key_pair_name.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let key_pair_name = key_pair_name.clone();
            async move {
                debug!("requesting DescribeKeyPairs");
                let body = ctx
                    .call(ENDPOINT, "DescribeKeyPairs", VERSION, vec![("KeyPairName".to_string(), key_pair_name)])
                    .await?;
                Ok(body.get("TotalCount").and_then(|v| v.as_i64()).unwrap_or(0) > 0)
            }
        })
        .await
    }

    /// Creates the default key pair if it doesn't already exist, idempotent
    /// across concurrent reconciles (`KeyPair.Duplicate` is treated as
    /// success).
    #[instrument(skip(self), fields(sdk_action = "CreateKeyPair"))]
    pub async fn ensure(&self, key_pair_name: &str) -> Result<()> {
        if self.exists(key_pair_name).await? {
            return Ok(());
        }
        let key_pair_name = key_pair_name.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let key_pair_name = key_pair_name.clone();
            async move {
                debug!("requesting CreateKeyPair");
                match ctx
                    .call(ENDPOINT, "CreateKeyPair", VERSION, vec![("KeyPairName".to_string(), key_pair_name)])
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(Error::Cloud(e)) if e.code.contains("Duplicate") => Ok(()),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}
