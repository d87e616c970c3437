//! VPC client: `Describe`/`Create`/`WaitReady`/`Delete` for the VPC resource
//! itself, ported from `pkg/aliyun/vpc.go`'s `VPCClient` (the VPC half only
//! -- NAT/EIP/SNAT live in [`super::nat`]).

use tracing::{debug, info, instrument};

use crate::crd::network::{Vpc, VpcSpec, STATUS_AVAILABLE};
use crate::error::Result;
use crate::retry::{try_op, wait_until, Backoff};

use super::AliyunContext;

const ENDPOINT: &str = "https://vpc.aliyuncs.com/";
const VERSION: &str = "2016-04-28";

#[derive(Clone)]
pub struct VpcClient {
    ctx: AliyunContext,
}

impl VpcClient {
    pub fn new(ctx: AliyunContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(sdk_action = "Describe"))]
    pub async fn describe(&self, id: &str) -> Result<Option<Vpc>> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DescribeVpcs");
                let body = ctx
                    .call(ENDPOINT, "DescribeVpcs", VERSION, vec![("VpcId".to_string(), id)])
                    .await?;
                Ok(parse_describe(&body))
            }
        })
        .await
    }

    #[instrument(skip(self, spec), fields(sdk_action = "Create"))]
    pub async fn create(&self, spec: &VpcSpec) -> Result<String> {
        let spec = spec.clone();
        let id = try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let spec = spec.clone();
            async move {
                debug!("requesting CreateVpc");
                let body = ctx.call(ENDPOINT, "CreateVpc", VERSION, create_params(&spec)).await?;
                Ok(super::field(&body, "VpcId").to_string())
            }
        })
        .await?;
        info!(vpc_id = %id, "success");
        Ok(id)
    }

    #[instrument(skip(self), fields(sdk_action = "WaitReady"))]
    pub async fn wait_ready(&self, id: &str) -> Result<Vpc> {
        let id = id.to_string();
        wait_until(
            Backoff::default(),
            || {
                let this = self.clone();
                let id = id.clone();
                async move { this.describe(&id).await }
            },
            |v: &Vpc| v.status == STATUS_AVAILABLE,
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
                debug!("requesting DeleteVpc");
                match ctx.call(ENDPOINT, "DeleteVpc", VERSION, vec![("VpcId".to_string(), id)]).await {
                    Ok(_) => Ok(()),
                    Err(crate::error::Error::Cloud(e)) if e.code.contains("Dependency") => {
                        Err(crate::error::Error::Retry)
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}

fn create_params(spec: &VpcSpec) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if !spec.vpc_name.is_empty() {
        params.push(("VpcName".to_string(), spec.vpc_name.clone()));
    }
    if !spec.cidr_block.is_empty() {
        params.push(("CidrBlock".to_string(), spec.cidr_block.clone()));
    }
    if !spec.description.is_empty() {
        params.push(("Description".to_string(), spec.description.clone()));
    }
    params.push(("ClientToken".to_string(), super::idempotence_token()));
    params
}

fn parse_describe(body: &serde_json::Value) -> Option<Vpc> {
    let total_count = body.get("TotalCount").and_then(|v| v.as_i64()).unwrap_or(0);
    if total_count == 0 {
        return None;
    }
    let entry = body.get("Vpcs")?.get("Vpc")?.as_array()?.first()?;
    Some(fill_from(entry))
}

fn fill_from(entry: &serde_json::Value) -> Vpc {
    Vpc {
        vpc_id: super::field(entry, "VpcId").to_string(),
        region_id: super::field(entry, "RegionId").to_string(),
        status: super::field(entry, "Status").to_string(),
        vpc_name: super::field(entry, "VpcName").to_string(),
        creation_time: super::field(entry, "CreationTime").to_string(),
        cidr_block: super::field(entry, "CidrBlock").to_string(),
        ipv6_cidr_block: super::field(entry, "Ipv6CidrBlock").to_string(),
        vrouter_id: super::field(entry, "VRouterId").to_string(),
        description: super::field(entry, "Description").to_string(),
        is_default: entry.get("IsDefault").and_then(|v| v.as_bool()).unwrap_or(false),
        network_acl_num: super::field(entry, "NetworkAclNum").to_string(),
        resource_group_id: super::field(entry, "ResourceGroupId").to_string(),
        cen_status: super::field(entry, "CenStatus").to_string(),
    }
}
