//! NAT gateway + SNAT entry client, ported from the NAT gateway and SNAT
//! portions of `pkg/aliyun/vpc.go`. EIP allocation/association lives in
//! [`super::eip`]; this module owns only the gateway and its SNAT table.

use tracing::{debug, info, instrument};

use crate::crd::network::{Eip, NatGateway, NatGatewaySpec, NGW_AVAILABLE};
use crate::error::{Error, Result};
use crate::retry::{try_op, wait_until, Backoff};

use super::AliyunContext;

const ENDPOINT: &str = "https://vpc.aliyuncs.com/";
const VERSION: &str = "2016-04-28";

#[derive(Clone)]
pub struct NatClient {
    ctx: AliyunContext,
}

impl NatClient {
    pub fn new(ctx: AliyunContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(sdk_action = "DescribeNatGateway"))]
    pub async fn describe(&self, id: &str) -> Result<Option<NatGateway>> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DescribeNatGateways");
                let body = ctx
                    .call(ENDPOINT, "DescribeNatGateways", VERSION, vec![("NatGatewayId".to_string(), id)])
                    .await?;
                Ok(parse_describe(&body))
            }
        })
        .await
    }

    #[instrument(skip(self, spec), fields(sdk_action = "CreateNatGateway"))]
    pub async fn create(&self, spec: &NatGatewaySpec, vpc_id: &str) -> Result<String> {
        let spec = spec.clone();
        let vpc_id = vpc_id.to_string();
        let id = try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let spec = spec.clone();
            let vpc_id = vpc_id.clone();
            async move {
                debug!("requesting CreateNatGateway");
                let body = ctx
                    .call(ENDPOINT, "CreateNatGateway", VERSION, create_params(&spec, &vpc_id))
                    .await?;
                Ok(super::field(&body, "NatGatewayId").to_string())
            }
        })
        .await?;
        info!(nat_gateway_id = %id, "success");
        Ok(id)
    }

    #[instrument(skip(self), fields(sdk_action = "WaitNatGatewayReady"))]
    pub async fn wait_ready(&self, id: &str) -> Result<NatGateway> {
        let id = id.to_string();
        wait_until(
            Backoff::default(),
            || {
                let this = self.clone();
                let id = id.clone();
                async move { this.describe(&id).await }
            },
            |v: &NatGateway| v.status == NGW_AVAILABLE,
        )
        .await
    }

    #[instrument(skip(self), fields(sdk_action = "DeleteGateway"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DeleteNatGateway");
                match ctx
                    .call(ENDPOINT, "DeleteNatGateway", VERSION, vec![("NatGatewayId".to_string(), id)])
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

    /// `CreateSnatEntry`: the SNAT table id comes from the gateway's first
    /// observed `snat_table_ids` entry, matching
    /// `req.SnatTableId = ngw.SnatTableIds.SnatTableId[0]` upstream.
    #[instrument(skip(self, eip, ngw), fields(sdk_action = "CreateSnatEntry"))]
    pub async fn create_snat_entry(&self, eip: &Eip, ngw: &NatGateway, vsw_id: &str) -> Result<String> {
        let snat_table_id = ngw
            .snat_table_ids
            .first()
            .cloned()
            .ok_or_else(|| Error::Misconfiguration("nat gateway has no snat table ids".to_string()))?;
        let params = vec![
            ("SnatTableId".to_string(), snat_table_id),
            ("SnatIp".to_string(), eip.ip_address.clone()),
            ("SourceVSwitchId".to_string(), vsw_id.to_string()),
            ("SnatEntryName".to_string(), ngw.name.clone()),
        ];
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let params = params.clone();
            async move {
                debug!("requesting CreateSnatEntry");
                match ctx.call(ENDPOINT, "CreateSnatEntry", VERSION, params).await {
                    Ok(body) => Ok(super::field(&body, "SnatEntryId").to_string()),
                    Err(Error::Cloud(e)) if e.code == "Forbidden.SourceVSwitchId.Duplicated" => Ok(String::new()),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }

    #[instrument(skip(self, ngw), fields(sdk_action = "DeleteSnatEntry"))]
    pub async fn delete_snat_entry(&self, ngw: &NatGateway, snat_entry_id: &str) -> Result<()> {
        let snat_table_id = ngw.snat_table_ids.first().cloned().unwrap_or_default();
        let params = vec![
            ("SnatTableId".to_string(), snat_table_id),
            ("SnatEntryId".to_string(), snat_entry_id.to_string()),
        ];
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let params = params.clone();
            async move {
                debug!("requesting DeleteSnatEntry");
                match ctx.call(ENDPOINT, "DeleteSnatEntry", VERSION, params).await {
                    Ok(_) => Ok(()),
                    Err(Error::Cloud(e))
                        if e.code == "Forbidden.SourceVSwitchId.Duplicated" || e.code.contains("NotFound") =>
                    {
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}

fn create_params(spec: &NatGatewaySpec, vpc_id: &str) -> Vec<(String, String)> {
    let mut params = vec![("VpcId".to_string(), vpc_id.to_string())];
    if !spec.name.is_empty() {
        params.push(("Name".to_string(), spec.name.clone()));
    }
    if !spec.description.is_empty() {
        params.push(("Description".to_string(), spec.description.clone()));
    }
    if !spec.spec.is_empty() {
        params.push(("NatType".to_string(), spec.spec.clone()));
    }
    if !spec.instance_charge_type.is_empty() {
        params.push(("InstanceChargeType".to_string(), spec.instance_charge_type.clone()));
    }
    params.push(("ClientToken".to_string(), super::idempotence_token()));
    params
}

fn parse_describe(body: &serde_json::Value) -> Option<NatGateway> {
    let entries = body.get("NatGateways")?.get("NatGateway")?.as_array()?;
    let entry = entries.first()?;
    let snat_table_ids = entry
        .get("SnatTableIds")
        .and_then(|v| v.get("SnatTableId"))
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    Some(NatGateway {
        nat_gateway_id: super::field(entry, "NatGatewayId").to_string(),
        name: super::field(entry, "Name").to_string(),
        description: super::field(entry, "Description").to_string(),
        vpc_id: super::field(entry, "VpcId").to_string(),
        spec: super::field(entry, "Spec").to_string(),
        instance_charge_type: super::field(entry, "InstanceChargeType").to_string(),
        expired_time: super::field(entry, "ExpiredTime").to_string(),
        auto_pay: entry.get("AutoPay").and_then(|v| v.as_bool()).unwrap_or(false),
        business_status: super::field(entry, "BusinessStatus").to_string(),
        creation_time: super::field(entry, "CreationTime").to_string(),
        status: super::field(entry, "Status").to_string(),
        deletion_protection: entry.get("DeletionProtection").and_then(|v| v.as_bool()).unwrap_or(false),
        snat_table_ids,
    })
}
