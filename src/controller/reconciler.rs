//! Main reconciler for `AlicloudCluster` resources.
//!
//! Ported from `alicloudcluster_controller.go` (owner-ref resolution, parent
//! `Cluster.Status.ApiEndpoints` sync, and the `Status.Ready` transition) and
//! `alicloudcluster_processor.go` (the network build-out itself, driven
//! through [`super::resources`]).

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::{
    api::{Api, Patch, PatchParams},
    client::Client,
    runtime::{
        controller::{Action, Controller},
        finalizer::{finalizer, Event},
        watcher::Config,
    },
    Resource, ResourceExt,
};
use tracing::{error, info, instrument, warn};

use crate::crd::parent::Cluster;
use crate::crd::{AlicloudCluster, AlicloudClusterSpec, AlicloudClusterStatus, ApiEndpoint, CLUSTER_FINALIZER};
use crate::error::{reason_string, Error, Result};

use super::resources::{self, CloudClients};
use super::ControllerState;

/// Main entry point to start the `AlicloudCluster` controller.
pub async fn run_controller(state: Arc<ControllerState>) -> Result<()> {
    let client = state.client.clone();
    let clusters: Api<AlicloudCluster> = Api::all(client.clone());

    info!("starting AlicloudCluster controller");

    match clusters.list(&Default::default()).await {
        Ok(_) => info!("AlicloudCluster CRD is available"),
        Err(e) => {
            error!("AlicloudCluster CRD not found. Please install the CRD first: {:?}", e);
            return Err(Error::ConfigError("AlicloudCluster CRD not installed".to_string()));
        }
    }

    Controller::new(clusters, Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, state)
        .for_each(|res| async move {
            match res {
                Ok(obj) => info!("reconciled: {:?}", obj),
                Err(e) => error!("reconcile error: {:?}", e),
            }
        })
        .await;

    Ok(())
}

/// Called whenever an `AlicloudCluster` is created, updated, deleted, or the
/// requeue timer expires.
#[instrument(skip(ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<AlicloudCluster>, ctx: Arc<ControllerState>) -> Result<Action> {
    let client = ctx.client.clone();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<AlicloudCluster> = Api::namespaced(client.clone(), &namespace);
    let credentials = ctx.credentials.clone();

    finalizer(&api, CLUSTER_FINALIZER, obj, |event| async {
        match event {
            Event::Apply(cluster) => reconcile_normal(&client, credentials, &cluster).await,
            Event::Cleanup(cluster) => reconcile_delete(&client, credentials, &cluster).await,
        }
    })
    .await
    .map_err(Error::from)
}

/// `AlicloudClusterReconciler.ReconcileNormal`: resolves the owning core
/// `Cluster`, builds the network, and publishes readiness -- mirroring the
/// `Status.Ready` transition that lives in the top-level Go `Reconcile`, not
/// inside the processor.
async fn reconcile_normal(
    client: &Client,
    credentials: Arc<crate::aliyun::AliyunCredentials>,
    cluster: &AlicloudCluster,
) -> Result<Action> {
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());
    let name = cluster.name_any();
    let api: Api<AlicloudCluster> = Api::namespaced(client.clone(), &namespace);

    if cluster.status.as_ref().is_some_and(|s| s.ready) {
        return Ok(Action::await_change());
    }

    info!("reconcileNormal {}/{}", namespace, name);

    let owner = match find_owner_cluster(client, cluster).await? {
        Some(owner) => owner,
        None => {
            info!("Cluster controller has not yet set an owner reference on {}/{}", namespace, name);
            return Ok(Action::requeue(Duration::from_secs(5)));
        }
    };

    let mut status = cluster.status.clone().unwrap_or_default();

    if let Err(e) = sync_parent_endpoints(client, &owner, &status.api_endpoints).await {
        warn!("failed to sync parent Cluster endpoints for {}/{}: {:?}", namespace, name, e);
    }

    let clients = CloudClients::new(&cluster.spec.region_id, credentials);

    match build_network(&clients, &cluster.spec, &mut status, &api, &name).await {
        Ok(()) => {
            status.message = "success".to_string();
            status.reason = String::new();
            status.ready = true;
            patch_status(&api, &name, &status).await?;
            #[cfg(feature = "metrics")]
            crate::metrics::record_reconcile("cluster", "ok");
            Ok(Action::await_change())
        }
        Err(e) => {
            status.reason = reason_string(&e);
            status.ready = false;
            if let Err(patch_err) = patch_status(&api, &name, &status).await {
                warn!("failed to patch failure status for {}/{}: {:?}", namespace, name, patch_err);
            }
            #[cfg(feature = "metrics")]
            crate::metrics::record_reconcile("cluster", "error");
            Err(e)
        }
    }
}

/// `reconcileNetwork`: builds VPC, VSwitch, NAT, SLB, security group and the
/// default SSH key, patching status after every step (matching the Go
/// processor's per-step `_ = s.patch()` calls) so partial progress survives a
/// crash mid-build.
async fn build_network(
    clients: &CloudClients,
    spec: &AlicloudClusterSpec,
    status: &mut AlicloudClusterStatus,
    api: &Api<AlicloudCluster>,
    name: &str,
) -> Result<()> {
    resources::reconcile_vpc(clients, spec, &mut status.network).await?;
    best_effort_patch(api, name, status).await;

    resources::reconcile_vswitch(clients, spec, &mut status.network).await?;
    best_effort_patch(api, name, status).await;

    resources::reconcile_nat(clients, spec, &mut status.network).await?;
    best_effort_patch(api, name, status).await;

    resources::reconcile_slb(clients, spec, &mut status.network).await?;
    status.api_endpoints = resources::api_endpoints(&status.network);
    best_effort_patch(api, name, status).await;

    resources::reconcile_security_group(clients, spec, &mut status.network).await?;
    best_effort_patch(api, name, status).await;

    resources::reconcile_ssh_key(clients).await?;

    Ok(())
}

async fn best_effort_patch(api: &Api<AlicloudCluster>, name: &str, status: &AlicloudClusterStatus) {
    if let Err(e) = patch_status(api, name, status).await {
        warn!("intermediate status patch failed for {}: {:?}", name, e);
    }
}

/// `AlicloudClusterReconciler.ReconcileDelete`: tears the network down in
/// reverse dependency order via [`resources::delete_network`].
async fn reconcile_delete(
    client: &Client,
    credentials: Arc<crate::aliyun::AliyunCredentials>,
    cluster: &AlicloudCluster,
) -> Result<Action> {
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());
    info!("reconcileDelete {}/{}", namespace, cluster.name_any());

    let status = cluster.status.clone().unwrap_or_default();
    let clients = CloudClients::new(&cluster.spec.region_id, credentials);
    resources::delete_network(&clients, &status.network).await?;

    Ok(Action::await_change())
}

/// Resolves the core `Cluster` that owns this `AlicloudCluster`, mirroring
/// `util.GetOwnerCluster`. Returns `None` until the Cluster API controller
/// sets the owner reference, which the caller treats as "not ready yet".
async fn find_owner_cluster(client: &Client, cluster: &AlicloudCluster) -> Result<Option<Cluster>> {
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());
    let owner_ref = match cluster.owner_references().iter().find(|o| o.kind == "Cluster") {
        Some(o) => o.clone(),
        None => return Ok(None),
    };

    let api: Api<Cluster> = Api::namespaced(client.clone(), &namespace);
    match api.get(&owner_ref.name).await {
        Ok(c) => Ok(Some(c)),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
        Err(e) => Err(Error::KubeError(e)),
    }
}

/// Publishes `ApiEndpoints` onto the parent `Cluster.Status`, but only when
/// the count differs -- mirrors the length-check guard upstream uses to
/// avoid hammering the core Cluster object with a no-op patch every
/// reconcile.
async fn sync_parent_endpoints(client: &Client, owner: &Cluster, endpoints: &[ApiEndpoint]) -> Result<()> {
    let current = owner.status.as_ref().map(|s| s.api_endpoints.len()).unwrap_or(0);
    if current == endpoints.len() {
        return Ok(());
    }

    let namespace = owner.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<Cluster> = Api::namespaced(client.clone(), &namespace);
    let patch = serde_json::json!({ "status": { "apiEndpoints": endpoints } });
    api.patch_status(&owner.name_any(), &PatchParams::apply("alicloud-infra-operator"), &Patch::Merge(&patch))
        .await
        .map_err(Error::KubeError)?;

    Ok(())
}

async fn patch_status(api: &Api<AlicloudCluster>, name: &str, status: &AlicloudClusterStatus) -> Result<()> {
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::apply("alicloud-infra-operator"), &Patch::Merge(&patch))
        .await
        .map_err(Error::KubeError)?;
    Ok(())
}

/// Error policy determines how to handle reconciliation errors.
fn error_policy(cluster: Arc<AlicloudCluster>, error: &Error, _ctx: Arc<ControllerState>) -> Action {
    error!("reconciliation error for {}: {:?}", cluster.name_any(), error);

    #[cfg(feature = "metrics")]
    crate::metrics::record_reconcile("cluster", "error");

    let retry_duration = if error.is_retriable() { Duration::from_secs(15) } else { Duration::from_secs(60) };

    Action::requeue(retry_duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_errors_get_the_short_backoff_class() {
        assert!(Error::MissingField("x".to_string()).is_retriable());
        assert!(Error::Timeout { cause: Box::new(Error::Retry) }.is_retriable());
    }

    #[test]
    fn misconfiguration_errors_get_the_long_backoff_class() {
        assert!(!Error::ConfigError("bad config".to_string()).is_retriable());
        assert!(!Error::ValidationError("bad spec".to_string()).is_retriable());
    }

    #[test]
    fn api_endpoint_count_guards_parent_sync() {
        let endpoints = vec![ApiEndpoint { host: "1.2.3.4".to_string(), port: 6443 }];
        let status = crate::crd::parent::ClusterStatus { api_endpoints: endpoints.clone(), infrastructure_ready: false };
        assert_eq!(status.api_endpoints.len(), endpoints.len());
    }
}
