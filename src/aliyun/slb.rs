//! SLB (server load balancer) client, ported from `pkg/aliyun/slb.go`.

use tracing::{debug, info, instrument};

use crate::crd::network::{Slb, SlbSpec, SLB_ACTIVE};
use crate::error::{Error, Result};
use crate::retry::{try_op, wait_until, Backoff};

use super::AliyunContext;

const ENDPOINT: &str = "https://slb.aliyuncs.com/";
const VERSION: &str = "2014-05-15";
pub const CONTROL_PLANE_PORT: u16 = 6443;

#[derive(Clone)]
pub struct SlbClient {
    ctx: AliyunContext,
}

impl SlbClient {
    pub fn new(ctx: AliyunContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(sdk_action = "Describe"))]
    pub async fn describe(&self, id: &str) -> Result<Option<Slb>> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DescribeLoadBalancers");
                let body = ctx
                    .call(ENDPOINT, "DescribeLoadBalancers", VERSION, vec![("LoadBalancerId".to_string(), id)])
                    .await?;
                Ok(parse_describe(&body))
            }
        })
        .await
    }

    #[instrument(skip(self, spec), fields(sdk_action = "Create"))]
    pub async fn create(&self, spec: &SlbSpec, vpc_id: &str) -> Result<String> {
        let spec = spec.clone();
        let vpc_id = vpc_id.to_string();
        let id = try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let spec = spec.clone();
            let vpc_id = vpc_id.clone();
            async move {
                debug!("requesting CreateLoadBalancer");
                let body = ctx
                    .call(ENDPOINT, "CreateLoadBalancer", VERSION, create_params(&spec, &vpc_id))
                    .await?;
                Ok(super::field(&body, "LoadBalancerId").to_string())
            }
        })
        .await?;
        info!(load_balancer_id = %id, "success");
        Ok(id)
    }

    #[instrument(skip(self), fields(sdk_action = "WaitReady"))]
    pub async fn wait_ready(&self, id: &str) -> Result<Slb> {
        let id = id.to_string();
        wait_until(
            Backoff::default(),
            || {
                let this = self.clone();
                let id = id.clone();
                async move { this.describe(&id).await }
            },
            |v: &Slb| v.load_balancer_status == SLB_ACTIVE,
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
                debug!("requesting DeleteLoadBalancer");
                match ctx
                    .call(ENDPOINT, "DeleteLoadBalancer", VERSION, vec![("LoadBalancerId".to_string(), id)])
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

    #[instrument(skip(self), fields(sdk_action = "DescribeServerGroup"))]
    pub async fn describe_server_groups(&self, slb_id: &str) -> Result<Vec<String>> {
        let slb_id = slb_id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let slb_id = slb_id.clone();
            async move {
                debug!("requesting DescribeVServerGroups");
                let body = ctx
                    .call(ENDPOINT, "DescribeVServerGroups", VERSION, vec![("LoadBalancerId".to_string(), slb_id)])
                    .await?;
                let ids = body
                    .get("VServerGroups")
                    .and_then(|v| v.get("VServerGroup"))
                    .and_then(|v| v.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.get("VServerGroupId").and_then(|v| v.as_str()).map(String::from))
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(ids)
            }
        })
        .await
    }

    #[instrument(skip(self, spec), fields(sdk_action = "CreateServerGroup"))]
    pub async fn create_server_group(&self, spec: &SlbSpec, slb_id: &str) -> Result<String> {
        let mut params = vec![("LoadBalancerId".to_string(), slb_id.to_string())];
        if !spec.vserver_group_name.is_empty() {
            params.push(("VServerGroupName".to_string(), spec.vserver_group_name.clone()));
        }
        let id = try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let params = params.clone();
            async move {
                debug!("requesting CreateVServerGroup");
                let body = ctx.call(ENDPOINT, "CreateVServerGroup", VERSION, params).await?;
                Ok(super::field(&body, "VServerGroupId").to_string())
            }
        })
        .await?;
        info!(vserver_group_id = %id, "success");
        Ok(id)
    }

    #[instrument(skip(self, spec), fields(sdk_action = "CreateTCPListener"))]
    pub async fn create_tcp_listener(&self, spec: &SlbSpec, slb_id: &str, vg_id: &str) -> Result<()> {
        let mut params = vec![
            ("LoadBalancerId".to_string(), slb_id.to_string()),
            ("VServerGroupId".to_string(), vg_id.to_string()),
            ("ListenerPort".to_string(), CONTROL_PLANE_PORT.to_string()),
            ("BackendServerPort".to_string(), CONTROL_PLANE_PORT.to_string()),
            ("Bandwidth".to_string(), "100".to_string()),
        ];
        if !spec.bandwidth.is_empty() {
            params[4] = ("Bandwidth".to_string(), spec.bandwidth.clone());
        }
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let params = params.clone();
            async move {
                debug!("requesting CreateLoadBalancerTCPListener");
                ctx.call(ENDPOINT, "CreateLoadBalancerTCPListener", VERSION, params).await?;
                Ok(())
            }
        })
        .await
    }

    /// Mirrors `StartListener`: only issues `StartLoadBalancerListener` when
    /// the control-plane listener isn't already `starting`/`running`.
    #[instrument(skip(self), fields(sdk_action = "StartListener"))]
    pub async fn start_listener(&self, slb_id: &str) -> Result<()> {
        let attr = self
            .ctx
            .call(
                ENDPOINT,
                "DescribeLoadBalancerTCPListenerAttribute",
                VERSION,
                vec![
                    ("LoadBalancerId".to_string(), slb_id.to_string()),
                    ("ListenerPort".to_string(), CONTROL_PLANE_PORT.to_string()),
                ],
            )
            .await?;
        let status = super::field(&attr, "Status");
        if status == "starting" || status == "running" {
            return Ok(());
        }

        let slb_id = slb_id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let slb_id = slb_id.clone();
            async move {
                debug!("requesting StartLoadBalancerListener");
                ctx.call(
                    ENDPOINT,
                    "StartLoadBalancerListener",
                    VERSION,
                    vec![
                        ("LoadBalancerId".to_string(), slb_id),
                        ("ListenerPort".to_string(), CONTROL_PLANE_PORT.to_string()),
                    ],
                )
                .await?;
                Ok(())
            }
        })
        .await
    }

    #[instrument(skip(self), fields(sdk_action = "VGAddBackendServers"))]
    pub async fn add_backend_server(&self, vg_id: &str, instance_id: &str, port: u16, description: &str) -> Result<()> {
        let backend_servers = format!(
            r#"[{{ "ServerId": "{instance_id}", "Port": "{port}", "Weight": "100", "Type": "ecs", "Description":"{description}" }}]"#,
        );
        let params = vec![
            ("VServerGroupId".to_string(), vg_id.to_string()),
            ("BackendServers".to_string(), backend_servers),
        ];
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let params = params.clone();
            async move {
                debug!("requesting AddVServerGroupBackendServers");
                ctx.call(ENDPOINT, "AddVServerGroupBackendServers", VERSION, params).await?;
                Ok(())
            }
        })
        .await
    }
}

fn create_params(spec: &SlbSpec, vpc_id: &str) -> Vec<(String, String)> {
    let mut params = vec![("VpcId".to_string(), vpc_id.to_string())];
    if !spec.load_balancer_name.is_empty() {
        params.push(("LoadBalancerName".to_string(), spec.load_balancer_name.clone()));
    }
    if !spec.address_type.is_empty() {
        params.push(("AddressType".to_string(), spec.address_type.clone()));
    }
    if !spec.address.is_empty() {
        params.push(("Address".to_string(), spec.address.clone()));
    }
    if !spec.master_zone_id.is_empty() {
        params.push(("MasterZoneId".to_string(), spec.master_zone_id.clone()));
    }
    if !spec.slave_zone_id.is_empty() {
        params.push(("SlaveZoneId".to_string(), spec.slave_zone_id.clone()));
    }
    params.push(("ClientToken".to_string(), super::idempotence_token()));
    params
}

fn parse_describe(body: &serde_json::Value) -> Option<Slb> {
    let total_count = body.get("TotalCount").and_then(|v| v.as_i64()).unwrap_or(0);
    if total_count == 0 {
        return None;
    }
    let entry = body.get("LoadBalancers")?.get("LoadBalancer")?.as_array()?.first()?;
    Some(Slb {
        load_balancer_id: super::field(entry, "LoadBalancerId").to_string(),
        load_balancer_name: super::field(entry, "LoadBalancerName").to_string(),
        load_balancer_status: super::field(entry, "LoadBalancerStatus").to_string(),
        address: super::field(entry, "Address").to_string(),
        address_type: super::field(entry, "AddressType").to_string(),
        region_id: super::field(entry, "RegionId").to_string(),
        region_id_alias: super::field(entry, "RegionIdAlias").to_string(),
        vswitch_id: super::field(entry, "VSwitchId").to_string(),
        vpc_id: super::field(entry, "VpcId").to_string(),
        network_type: super::field(entry, "NetworkType").to_string(),
        master_zone_id: super::field(entry, "MasterZoneId").to_string(),
        slave_zone_id: super::field(entry, "SlaveZoneId").to_string(),
        internet_charge_type: super::field(entry, "InternetChargeType").to_string(),
        create_time: super::field(entry, "CreateTime").to_string(),
        create_time_stamp: entry.get("CreateTimeStamp").and_then(|v| v.as_i64()).unwrap_or(0),
        pay_type: super::field(entry, "PayType").to_string(),
        resource_group_id: super::field(entry, "ResourceGroupId").to_string(),
        address_ip_version: super::field(entry, "AddressIPVersion").to_string(),
        vserver_group_id: super::field(entry, "VServerGroupId").to_string(),
    })
}
