//! EIP client, ported from the EIP portion of `pkg/aliyun/vpc.go`.

use tracing::{debug, info, instrument};

use crate::crd::network::{Eip, EipSpec, NatGateway};
use crate::error::{Error, Result};
use crate::retry::{try_op, wait_until, Backoff};

use super::AliyunContext;

const ENDPOINT: &str = "https://vpc.aliyuncs.com/";
const VERSION: &str = "2016-04-28";

#[derive(Clone)]
pub struct EipClient {
    ctx: AliyunContext,
}

impl EipClient {
    pub fn new(ctx: AliyunContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(sdk_action = "DescribeEIP"))]
    pub async fn describe(&self, id: &str) -> Result<Option<Eip>> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DescribeEipAddresses");
                let body = ctx
                    .call(ENDPOINT, "DescribeEipAddresses", VERSION, vec![("AllocationId".to_string(), id)])
                    .await?;
                Ok(parse_describe(&body))
            }
        })
        .await
    }

    #[instrument(skip(self, spec), fields(sdk_action = "CreateEIP"))]
    pub async fn create(&self, spec: &EipSpec) -> Result<String> {
        let spec = spec.clone();
        let id = try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let spec = spec.clone();
            async move {
                debug!("requesting AllocateEipAddress");
                let body = ctx
                    .call(ENDPOINT, "AllocateEipAddress", VERSION, create_params(&spec))
                    .await?;
                Ok(super::field(&body, "AllocationId").to_string())
            }
        })
        .await?;
        info!(allocation_id = %id, "success");
        Ok(id)
    }

    #[instrument(skip(self), fields(sdk_action = "WaitEIPStatus"))]
    pub async fn wait_status(&self, id: &str, accept: &[&str]) -> Result<Eip> {
        let id = id.to_string();
        let accept: Vec<String> = accept.iter().map(|s| s.to_string()).collect();
        wait_until(
            Backoff::default(),
            || {
                let this = self.clone();
                let id = id.clone();
                async move { this.describe(&id).await }
            },
            move |v: &Eip| accept.iter().any(|s| s == &v.status),
        )
        .await
    }

    #[instrument(skip(self), fields(sdk_action = "DeleteEIP"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting ReleaseEipAddress");
                match ctx
                    .call(ENDPOINT, "ReleaseEipAddress", VERSION, vec![("AllocationId".to_string(), id)])
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(Error::Cloud(e)) if e.code.contains("Dependency") => Err(Error::Retry),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }

    #[instrument(skip(self, eip, ngw), fields(sdk_action = "UnassociateEipToNatGateway"))]
    pub async fn unassociate_from_nat(&self, eip: &Eip, ngw: &NatGateway) -> Result<()> {
        let params = vec![
            ("AllocationId".to_string(), eip.allocation_id.clone()),
            ("InstanceId".to_string(), ngw.nat_gateway_id.clone()),
            ("InstanceType".to_string(), "Nat".to_string()),
        ];
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let params = params.clone();
            async move {
                debug!("requesting UnassociateEipAddress");
                match ctx.call(ENDPOINT, "UnassociateEipAddress", VERSION, params).await {
                    Ok(_) => Ok(()),
                    Err(Error::Cloud(e)) if e.code == "InvalidIpStatus.HasBeenUsedBySnatTable" => Err(Error::Retry),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }

    #[instrument(skip(self, eip, ngw), fields(sdk_action = "AssociateEipToNatGateway"))]
    pub async fn associate_to_nat(&self, eip: &Eip, ngw: &NatGateway) -> Result<()> {
        let params = vec![
            ("AllocationId".to_string(), eip.allocation_id.clone()),
            ("InstanceId".to_string(), ngw.nat_gateway_id.clone()),
            ("InstanceType".to_string(), "Nat".to_string()),
            ("Mode".to_string(), "NAT".to_string()),
        ];
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let params = params.clone();
            async move {
                debug!("requesting AssociateEipAddress");
                match ctx.call(ENDPOINT, "AssociateEipAddress", VERSION, params).await {
                    Ok(_) => Ok(()),
                    Err(Error::Cloud(e)) if e.code == "BIND_INSTANCE_HAVE_PORTMAP_OR_BIND_EIP" => Ok(()),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}

fn create_params(spec: &EipSpec) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if !spec.bandwidth.is_empty() {
        params.push(("Bandwidth".to_string(), spec.bandwidth.clone()));
    }
    if !spec.isp.is_empty() {
        params.push(("ISP".to_string(), spec.isp.clone()));
    }
    if !spec.instance_charge_type.is_empty() {
        params.push(("InstanceChargeType".to_string(), spec.instance_charge_type.clone()));
    }
    if !spec.internet_charge_type.is_empty() {
        params.push(("InternetChargeType".to_string(), spec.internet_charge_type.clone()));
    }
    params.push(("ClientToken".to_string(), super::idempotence_token()));
    params
}

fn parse_describe(body: &serde_json::Value) -> Option<Eip> {
    let entries = body.get("EipAddresses")?.get("EipAddress")?.as_array()?;
    let entry = entries.first()?;
    Some(Eip {
        ip_address: super::field(entry, "IpAddress").to_string(),
        private_ip_address: super::field(entry, "PrivateIpAddress").to_string(),
        allocation_id: super::field(entry, "AllocationId").to_string(),
        status: super::field(entry, "Status").to_string(),
        instance_id: super::field(entry, "InstanceId").to_string(),
        bandwidth: super::field(entry, "Bandwidth").to_string(),
        eip_bandwidth: super::field(entry, "EipBandwidth").to_string(),
        internet_charge_type: super::field(entry, "InternetChargeType").to_string(),
        allocation_time: super::field(entry, "AllocationTime").to_string(),
        instance_type: super::field(entry, "InstanceType").to_string(),
        instance_region_id: super::field(entry, "InstanceRegionId").to_string(),
        charge_type: super::field(entry, "ChargeType").to_string(),
        expired_time: super::field(entry, "ExpiredTime").to_string(),
        hd_monitor_status: super::field(entry, "HDMonitorStatus").to_string(),
        name: super::field(entry, "Name").to_string(),
        isp: super::field(entry, "ISP").to_string(),
        descritpion: super::field(entry, "Descritpion").to_string(),
        resource_group_id: super::field(entry, "ResourceGroupId").to_string(),
        has_reservation_data: super::field(entry, "HasReservationData").to_string(),
        mode: super::field(entry, "Mode").to_string(),
        deletion_protection: entry.get("DeletionProtection").and_then(|v| v.as_bool()).unwrap_or(false),
        second_limited: entry.get("SecondLimited").and_then(|v| v.as_bool()).unwrap_or(false),
    })
}
