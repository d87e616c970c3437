//! VSwitch client, ported from `pkg/aliyun/vswitch.go`'s `VSwitchClient`.

use tracing::{debug, info, instrument};

use crate::crd::network::{VSwitch, VSwitchSpec, STATUS_AVAILABLE};
use crate::error::Result;
use crate::retry::{try_op, wait_until, Backoff};

use super::AliyunContext;

const ENDPOINT: &str = "https://vpc.aliyuncs.com/";
const VERSION: &str = "2016-04-28";

#[derive(Clone)]
pub struct VSwitchClient {
    ctx: AliyunContext,
}

impl VSwitchClient {
    pub fn new(ctx: AliyunContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(sdk_action = "Describe"))]
    pub async fn describe(&self, id: &str) -> Result<Option<VSwitch>> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DescribeVSwitches");
                let body = ctx
                    .call(ENDPOINT, "DescribeVSwitches", VERSION, vec![("VSwitchId".to_string(), id)])
                    .await?;
                Ok(parse_describe(&body))
            }
        })
        .await
    }

    #[instrument(skip(self, spec), fields(sdk_action = "Create"))]
    pub async fn create(&self, spec: &VSwitchSpec, zone_id: &str, vpc_id: &str) -> Result<String> {
        let spec = spec.clone();
        let zone_id = zone_id.to_string();
        let vpc_id = vpc_id.to_string();
        let id = try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let spec = spec.clone();
            let zone_id = zone_id.clone();
            let vpc_id = vpc_id.clone();
            async move {
                debug!("requesting CreateVSwitch");
                let body = ctx
                    .call(ENDPOINT, "CreateVSwitch", VERSION, create_params(&spec, &zone_id, &vpc_id))
                    .await?;
                Ok(super::field(&body, "VSwitchId").to_string())
            }
        })
        .await?;
        info!(vswitch_id = %id, "success");
        Ok(id)
    }

    #[instrument(skip(self), fields(sdk_action = "WaitReady"))]
    pub async fn wait_ready(&self, id: &str) -> Result<VSwitch> {
        let id = id.to_string();
        wait_until(
            Backoff::default(),
            || {
                let this = self.clone();
                let id = id.clone();
                async move { this.describe(&id).await }
            },
            |v: &VSwitch| v.status == STATUS_AVAILABLE,
        )
        .await
    }

    #[instrument(skip(self), fields(sdk_action = "Delete"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DeleteVSwitch");
                match ctx
                    .call(ENDPOINT, "DeleteVSwitch", VERSION, vec![("VSwitchId".to_string(), id)])
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(crate::error::Error::Cloud(e)) if e.message.to_lowercase().contains("not found") => Ok(()),
                    Err(crate::error::Error::Cloud(e)) if e.code.contains("Dependency") => Err(crate::error::Error::Retry),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}

fn create_params(spec: &VSwitchSpec, zone_id: &str, vpc_id: &str) -> Vec<(String, String)> {
    let mut params = vec![
        ("ZoneId".to_string(), zone_id.to_string()),
        ("VpcId".to_string(), vpc_id.to_string()),
    ];
    if !spec.cidr_block.is_empty() {
        params.push(("CidrBlock".to_string(), spec.cidr_block.clone()));
    }
    if !spec.vswitch_name.is_empty() {
        params.push(("VSwitchName".to_string(), spec.vswitch_name.clone()));
    }
    if !spec.description.is_empty() {
        params.push(("Description".to_string(), spec.description.clone()));
    }
    params.push(("ClientToken".to_string(), super::idempotence_token()));
    params
}

fn parse_describe(body: &serde_json::Value) -> Option<VSwitch> {
    let total_count = body.get("TotalCount").and_then(|v| v.as_i64()).unwrap_or(0);
    if total_count == 0 {
        return None;
    }
    let entry = body.get("VSwitches")?.get("VSwitch")?.as_array()?.first()?;
    Some(VSwitch {
        vswitch_id: super::field(entry, "VSwitchId").to_string(),
        vpc_id: super::field(entry, "VpcId").to_string(),
        status: super::field(entry, "Status").to_string(),
        cidr_block: super::field(entry, "CidrBlock").to_string(),
        ipv6_cidr_block: super::field(entry, "Ipv6CidrBlock").to_string(),
        zone_id: super::field(entry, "ZoneId").to_string(),
        available_ip_address_count: entry.get("AvailableIpAddressCount").and_then(|v| v.as_i64()).unwrap_or(0),
        description: super::field(entry, "Description").to_string(),
        vswitch_name: super::field(entry, "VSwitchName").to_string(),
        creation_time: super::field(entry, "CreationTime").to_string(),
        is_default: entry.get("IsDefault").and_then(|v| v.as_bool()).unwrap_or(false),
        resource_group_id: super::field(entry, "ResourceGroupId").to_string(),
        network_acl_id: super::field(entry, "NetworkAclId").to_string(),
    })
}
