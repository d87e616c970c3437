//! Main reconciler for `AlicloudMachine` resources.
//!
//! Ported from `alicloudmachine_controller.go` (owner `Machine` / parent
//! `Cluster` / `AlicloudCluster` infra resolution chain) and
//! `alicloudmachine_processer.go`'s `sync`/`handleDelete` (instance
//! lifecycle, control-plane SLB backend registration).

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

use crate::aliyun::{addresses, INSTANCE_STATUS_RUNNING, INSTANCE_STATUS_STOPPED};
use crate::crd::parent::Machine;
use crate::crd::{AlicloudCluster, AlicloudMachine, AlicloudMachineStatus, CLUSTER_FINALIZER, CONTROL_PLANE_PORT};
use crate::error::{Error, Result};

use super::resources::CloudClients;
use super::ControllerState;

/// Main entry point to start the `AlicloudMachine` controller.
pub async fn run_controller(state: Arc<ControllerState>) -> Result<()> {
    let client = state.client.clone();
    let machines: Api<AlicloudMachine> = Api::all(client.clone());

    info!("starting AlicloudMachine controller");

    match machines.list(&Default::default()).await {
        Ok(_) => info!("AlicloudMachine CRD is available"),
        Err(e) => {
            error!("AlicloudMachine CRD not found. Please install the CRD first: {:?}", e);
            return Err(Error::ConfigError("AlicloudMachine CRD not installed".to_string()));
        }
    }

    Controller::new(machines, Config::default())
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

/// `AlicloudMachineReconciler.Reconcile`: walks owner `Machine` -> parent
/// `Cluster` -> that cluster's `AlicloudCluster` infra object before handing
/// off to the instance lifecycle in [`sync`]/[`handle_delete`].
#[instrument(skip(ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<AlicloudMachine>, ctx: Arc<ControllerState>) -> Result<Action> {
    let client = ctx.client.clone();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let name = obj.name_any();

    let owner_machine = match find_owner_machine(&client, &obj).await? {
        Some(m) => m,
        None => {
            info!("Machine controller has not yet set an owner reference on {}/{}", namespace, name);
            return Ok(Action::requeue(Duration::from_secs(10)));
        }
    };

    let cluster = match find_parent_cluster(&client, &namespace, &owner_machine).await? {
        Some(c) => c,
        None => {
            info!("parent Cluster not found for {}/{}", namespace, name);
            return Ok(Action::requeue(Duration::from_secs(10)));
        }
    };

    let cluster_infra = match find_cluster_infra(&client, &namespace, &cluster).await? {
        Some(c) => c,
        None => {
            info!("ClusterInfra is not available for {}/{}", namespace, name);
            return Ok(Action::requeue(Duration::from_secs(10)));
        }
    };

    let api: Api<AlicloudMachine> = Api::namespaced(client.clone(), &namespace);
    let credentials = ctx.credentials.clone();

    finalizer(&api, CLUSTER_FINALIZER, obj, |event| async {
        match event {
            Event::Apply(machine) => sync(&client, credentials, &machine, &owner_machine, &cluster_infra).await,
            Event::Cleanup(machine) => handle_delete(credentials, &machine, &cluster_infra).await,
        }
    })
    .await
    .map_err(Error::from)
}

/// `MachineProcesser.sync`: creates the instance if it doesn't exist yet,
/// waits for it to come up, and (for control-plane machines) registers it as
/// an SLB backend once running.
async fn sync(
    client: &Client,
    credentials: Arc<crate::aliyun::AliyunCredentials>,
    machine: &AlicloudMachine,
    owner_machine: &Machine,
    cluster_infra: &AlicloudCluster,
) -> Result<Action> {
    let namespace = machine.namespace().unwrap_or_else(|| "default".to_string());
    let name = machine.name_any();

    if !cluster_infra.status.as_ref().is_some_and(|s| s.ready) {
        info!("ClusterInfrastructure status not ready for {}/{}", namespace, name);
        return Ok(Action::requeue(Duration::from_secs(15)));
    }

    let mut status = machine.status.clone().unwrap_or_default();

    if !status.error_message.is_empty() || !status.error_reason.is_empty() {
        info!("machineInfra status error, skip process for {}/{}", namespace, name);
        return Ok(Action::await_change());
    }

    let bootstrap_data = match owner_machine.spec.bootstrap.data.as_deref() {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => {
            info!("machine bootstrap not set for {}/{}", namespace, name);
            return Ok(Action::requeue(Duration::from_secs(30)));
        }
    };

    let clients = CloudClients::new(&cluster_infra.spec.region_id, credentials);
    let api: Api<AlicloudMachine> = Api::namespaced(client.clone(), &namespace);
    let net = cluster_infra.status.as_ref().map(|s| &s.network);
    let vswitch_id = net.map(|n| n.vswitch.vswitch_id.clone()).unwrap_or_default();
    let security_group_id = net.map(|n| n.security_group.security_group_id.clone()).unwrap_or_default();

    if status.id.is_empty() {
        info!("id is null, so create instance for {}/{}", namespace, name);
        match clients.ecs.run_instance(&machine.spec, &vswitch_id, &security_group_id, &bootstrap_data).await {
            Ok(id) => status.id = id,
            Err(e) => {
                warn!("create ecs instance failed for {}/{}: {:?}", namespace, name, e);
                return Ok(Action::requeue(Duration::from_secs(30)));
            }
        }
        patch_status(&api, &name, &status).await?;
    }

    let instance = clients.ecs.describe(&status.id).await?;
    let instance = match instance {
        Some(i) => i,
        None => {
            info!("instance not visible yet after create for {}/{}", namespace, name);
            return Ok(Action::requeue(Duration::from_secs(5)));
        }
    };

    status.addresses = addresses(&instance);
    status.instance = Some(instance.instance.clone());

    let mut requeue_override = None;
    if !status.addresses.is_empty() && instance.instance.status == INSTANCE_STATUS_RUNNING {
        status.ready = true;
        if owner_machine.spec.control_plane {
            info!("machine is controlplane, reconcileSLBEndpoint for {}/{}", namespace, name);
            if let Err(e) = reconcile_slb_endpoint(&clients, cluster_infra, &status.id, &instance.instance.host_name).await
            {
                warn!("reconcileSLBEndpoint failed for {}/{}: {:?}", namespace, name, e);
                status.ready = false;
                requeue_override = Some(Duration::from_secs(10));
            }
        }
    }

    patch_status(&api, &name, &status).await?;
    patch_provider_id(client, &namespace, &owner_machine, &instance.instance.instance_id).await?;

    if let Some(dur) = requeue_override {
        return Ok(Action::requeue(dur));
    }
    if !status.ready {
        return Ok(Action::requeue(Duration::from_secs(15)));
    }
    #[cfg(feature = "metrics")]
    crate::metrics::record_reconcile("machine", "ok");
    Ok(Action::await_change())
}

/// `MachineProcesser.handleDelete`: if the instance is already gone, this is
/// the last delete attempt and always succeeds; a `Stopping`/`Stopped`
/// instance is left alone (no delete call); otherwise force-deletes it.
async fn handle_delete(
    credentials: Arc<crate::aliyun::AliyunCredentials>,
    machine: &AlicloudMachine,
    cluster_infra: &AlicloudCluster,
) -> Result<Action> {
    let namespace = machine.namespace().unwrap_or_else(|| "default".to_string());
    let name = machine.name_any();
    info!("handleDelete for {}/{}", namespace, name);

    let status = machine.status.clone().unwrap_or_default();
    if status.id.is_empty() {
        return Ok(Action::await_change());
    }

    let clients = CloudClients::new(&cluster_infra.spec.region_id, credentials);

    let instance = match clients.ecs.describe(&status.id).await {
        Ok(i) => i,
        Err(e) => {
            warn!("get ecs instance error when handle delete for {}/{}: {:?}", namespace, name, e);
            return Ok(Action::requeue(Duration::from_secs(20)));
        }
    };

    let instance = match instance {
        Some(i) => i,
        None => {
            info!("ecs instance maybe removed, last try for {}/{}", namespace, name);
            let _ = clients.ecs.delete(&status.id).await;
            return Ok(Action::await_change());
        }
    };

    match instance.instance.status.as_str() {
        INSTANCE_STATUS_STOPPED | "Stopping" => {
            info!("ecs instance is stopping|stopped for {}/{}", namespace, name);
            Ok(Action::await_change())
        }
        _ => {
            info!("deleting ecs instance for {}/{}", namespace, name);
            clients.ecs.delete(&status.id).await?;
            Ok(Action::await_change())
        }
    }
}

/// `reconcileSLBEndpoint`: registers the instance as a backend behind the
/// shared control-plane SLB's vserver group, then ensures the listener is
/// running.
async fn reconcile_slb_endpoint(
    clients: &CloudClients,
    cluster_infra: &AlicloudCluster,
    instance_id: &str,
    host_name: &str,
) -> Result<()> {
    let net = cluster_infra.status.as_ref().map(|s| &s.network);
    let vg_id = net.map(|n| n.slb.vserver_group_id.clone()).unwrap_or_default();
    let slb_id = net.map(|n| n.slb.load_balancer_id.clone()).unwrap_or_default();

    clients.slb.add_backend_server(&vg_id, instance_id, CONTROL_PLANE_PORT as u16, host_name).await?;
    clients.slb.start_listener(&slb_id).await
}

/// Resolves the core `Machine` that owns this `AlicloudMachine`, mirroring
/// `util.GetOwnerMachine`.
async fn find_owner_machine(client: &Client, machine: &AlicloudMachine) -> Result<Option<Machine>> {
    let namespace = machine.namespace().unwrap_or_else(|| "default".to_string());
    let owner_ref = match machine.owner_references().iter().find(|o| o.kind == "Machine") {
        Some(o) => o.clone(),
        None => return Ok(None),
    };

    let api: Api<Machine> = Api::namespaced(client.clone(), &namespace);
    match api.get(&owner_ref.name).await {
        Ok(m) => Ok(Some(m)),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
        Err(e) => Err(Error::KubeError(e)),
    }
}

/// Resolves the core `Cluster` the owner `Machine` belongs to, mirroring
/// `util.GetClusterFromMetadata`.
async fn find_parent_cluster(
    client: &Client,
    namespace: &str,
    owner_machine: &Machine,
) -> Result<Option<crate::crd::parent::Cluster>> {
    if owner_machine.spec.cluster_name.is_empty() {
        return Ok(None);
    }
    let api: Api<crate::crd::parent::Cluster> = Api::namespaced(client.clone(), namespace);
    match api.get(&owner_machine.spec.cluster_name).await {
        Ok(c) => Ok(Some(c)),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
        Err(e) => Err(Error::KubeError(e)),
    }
}

/// Fetches the `AlicloudCluster` referenced by the parent `Cluster`'s
/// `Spec.InfrastructureRef`.
async fn find_cluster_infra(
    client: &Client,
    default_namespace: &str,
    cluster: &crate::crd::parent::Cluster,
) -> Result<Option<AlicloudCluster>> {
    let infra_ref = match cluster.spec.infrastructure_ref.as_ref() {
        Some(r) if !r.name.is_empty() => r,
        _ => return Ok(None),
    };
    let namespace = if infra_ref.namespace.is_empty() { default_namespace } else { &infra_ref.namespace };
    let api: Api<AlicloudCluster> = Api::namespaced(client.clone(), namespace);
    match api.get(&infra_ref.name).await {
        Ok(c) => Ok(Some(c)),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
        Err(e) => Err(Error::KubeError(e)),
    }
}

async fn patch_status(api: &Api<AlicloudMachine>, name: &str, status: &AlicloudMachineStatus) -> Result<()> {
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::apply("alicloud-infra-operator"), &Patch::Merge(&patch))
        .await
        .map_err(Error::KubeError)?;
    Ok(())
}

/// `setProviderID`: `aliyun://<instance-id>`, written onto the owner
/// `Machine`'s spec rather than the `AlicloudMachine`'s -- Cluster API reads
/// `Machine.Spec.ProviderID` to decide the machine is provisioned.
async fn patch_provider_id(client: &Client, namespace: &str, owner_machine: &Machine, instance_id: &str) -> Result<()> {
    let provider_id = format!("aliyun://{instance_id}");
    let api: Api<Machine> = Api::namespaced(client.clone(), namespace);
    let patch = serde_json::json!({ "spec": { "providerID": provider_id } });
    api.patch(&owner_machine.name_any(), &PatchParams::apply("alicloud-infra-operator"), &Patch::Merge(&patch))
        .await
        .map_err(Error::KubeError)?;
    Ok(())
}

fn error_policy(machine: Arc<AlicloudMachine>, error: &Error, _ctx: Arc<ControllerState>) -> Action {
    error!("reconciliation error for {}: {:?}", machine.name_any(), error);
    #[cfg(feature = "metrics")]
    crate::metrics::record_reconcile("machine", "error");
    let retry_duration = if error.is_retriable() { Duration::from_secs(15) } else { Duration::from_secs(60) };
    Action::requeue(retry_duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_carries_the_aliyun_scheme() {
        let instance_id = "i-abc123";
        let provider_id = format!("aliyun://{instance_id}");
        assert_eq!(provider_id, "aliyun://i-abc123");
    }

    #[test]
    fn empty_bootstrap_data_is_treated_as_not_set() {
        let bootstrap = crate::crd::parent::Bootstrap { data: Some(String::new()) };
        let ready = matches!(bootstrap.data.as_deref(), Some(d) if !d.is_empty());
        assert!(!ready);
    }
}
