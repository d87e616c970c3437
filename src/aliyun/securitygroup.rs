//! Security group client, ported from `pkg/aliyun/securitygroup.go`. Uses
//! the ECS endpoint, like the upstream client (security groups are part of
//! the ECS API family, not VPC).

use tracing::{debug, info, instrument};

use crate::crd::network::{SecurityGroup, SecurityGroupSpec};
use crate::error::{Error, Result};
use crate::retry::{try_op, wait_until, Backoff};

use super::AliyunContext;

const ENDPOINT: &str = "https://ecs.aliyuncs.com/";
const VERSION: &str = "2014-05-26";

#[derive(Clone)]
pub struct SecurityGroupClient {
    ctx: AliyunContext,
}

impl SecurityGroupClient {
    pub fn new(ctx: AliyunContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(sdk_action = "Describe"))]
    pub async fn describe(&self, id: &str) -> Result<Option<SecurityGroup>> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DescribeSecurityGroups");
                let body = ctx
                    .call(ENDPOINT, "DescribeSecurityGroups", VERSION, vec![("SecurityGroupId".to_string(), id)])
                    .await?;
                Ok(parse_describe(&body))
            }
        })
        .await
    }

    /// Creates the group, then authorizes every ingress rule in turn. Any
    /// single rule failing aborts the whole creation (matching the
    /// upstream loop, which returns on the first `AuthorizeSecurityGroup`
    /// error without rolling back the already-authorized rules).
    #[instrument(skip(self, spec), fields(sdk_action = "Create"))]
    pub async fn create(&self, spec: &SecurityGroupSpec, vpc_id: &str) -> Result<String> {
        let spec_c = spec.clone();
        let vpc_id_c = vpc_id.to_string();
        let id = try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let spec = spec_c.clone();
            let vpc_id = vpc_id_c.clone();
            async move {
                debug!("requesting CreateSecurityGroup");
                let body = ctx
                    .call(ENDPOINT, "CreateSecurityGroup", VERSION, create_params(&spec, &vpc_id))
                    .await?;
                Ok(super::field(&body, "SecurityGroupId").to_string())
            }
        })
        .await?;
        info!(security_group_id = %id, "created, authorizing rules");

        for rule in &spec.rules {
            let id = id.clone();
            let rule = rule.clone();
            try_op(Backoff::default(), || {
                let ctx = self.ctx.clone();
                let id = id.clone();
                let rule = rule.clone();
                async move {
                    debug!("requesting AuthorizeSecurityGroup");
                    ctx.call(ENDPOINT, "AuthorizeSecurityGroup", VERSION, rule_params(&id, &rule))
                        .await?;
                    Ok(())
                }
            })
            .await?;
        }

        Ok(id)
    }

    /// WaitReady has no status field to poll upstream -- a non-`None`
    /// describe result is already "ready".
    #[instrument(skip(self), fields(sdk_action = "WaitReady"))]
    pub async fn wait_ready(&self, id: &str) -> Result<SecurityGroup> {
        let id = id.to_string();
        wait_until(Backoff::default(), || {
            let this = self.clone();
            let id = id.clone();
            async move { this.describe(&id).await }
        }, |_: &SecurityGroup| true)
        .await
    }

    #[instrument(skip(self), fields(sdk_action = "Delete"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        try_op(Backoff::default(), || {
            let ctx = self.ctx.clone();
            let id = id.clone();
            async move {
                debug!("requesting DeleteSecurityGroup");
                match ctx
                    .call(ENDPOINT, "DeleteSecurityGroup", VERSION, vec![("SecurityGroupId".to_string(), id)])
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
}

fn create_params(spec: &SecurityGroupSpec, vpc_id: &str) -> Vec<(String, String)> {
    let mut params = vec![("VpcId".to_string(), vpc_id.to_string())];
    if !spec.security_group_name.is_empty() {
        params.push(("SecurityGroupName".to_string(), spec.security_group_name.clone()));
    }
    if !spec.description.is_empty() {
        params.push(("Description".to_string(), spec.description.clone()));
    }
    if !spec.security_group_type.is_empty() {
        params.push(("SecurityGroupType".to_string(), spec.security_group_type.clone()));
    }
    params.push(("ClientToken".to_string(), super::idempotence_token()));
    params
}

fn rule_params(security_group_id: &str, rule: &crate::crd::network::SecurityGroupRuleSpec) -> Vec<(String, String)> {
    let mut params = vec![("SecurityGroupId".to_string(), security_group_id.to_string())];
    let mut push = |k: &str, v: &str| {
        if !v.is_empty() {
            params.push((k.to_string(), v.to_string()));
        }
    };
    push("NicType", &rule.nic_type);
    push("IpProtocol", &rule.ip_protocol);
    push("SourceCidrIp", &rule.source_cidr_ip);
    push("PortRange", &rule.port_range);
    push("Description", &rule.description);
    push("SourceGroupId", &rule.source_group_id);
    push("SourceGroupOwnerId", &rule.source_group_owner_id);
    push("SourceGroupOwnerAccount", &rule.source_group_owner_account);
    push("Priority", &rule.priority);
    push("Policy", &rule.policy);
    push("Ipv6SourceCidrIp", &rule.ipv6_source_cidr_ip);
    push("SourcePortRange", &rule.source_port_range);
    push("DestCidrIp", &rule.dest_cidr_ip);
    push("Ipv6DestCidrIp", &rule.ipv6_dest_cidr_ip);
    params
}

fn parse_describe(body: &serde_json::Value) -> Option<SecurityGroup> {
    let total_count = body.get("TotalCount").and_then(|v| v.as_i64()).unwrap_or(0);
    if total_count == 0 {
        return None;
    }
    let entry = body.get("SecurityGroups")?.get("SecurityGroup")?.as_array()?.first()?;
    Some(SecurityGroup {
        security_group_id: super::field(entry, "SecurityGroupId").to_string(),
        description: super::field(entry, "Description").to_string(),
        security_group_name: super::field(entry, "SecurityGroupName").to_string(),
        vpc_id: super::field(entry, "VpcId").to_string(),
        creation_time: super::field(entry, "CreationTime").to_string(),
        security_group_type: super::field(entry, "SecurityGroupType").to_string(),
        available_instance_amount: entry.get("AvailableInstanceAmount").and_then(|v| v.as_i64()).unwrap_or(0) as i32,
        ecs_count: entry.get("EcsCount").and_then(|v| v.as_i64()).unwrap_or(0) as i32,
        resource_group_id: super::field(entry, "ResourceGroupId").to_string(),
    })
}
