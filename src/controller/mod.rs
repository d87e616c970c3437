//! Reconcilers for the two CRDs this operator owns
//! (`AlicloudCluster`/`AlicloudMachine`), plus the cloud-resource helpers
//! ([`resources`]) both reconcilers drive.

pub mod machine_reconciler;
pub mod reconciler;
pub mod resources;

use std::sync::Arc;

use kube::Client;

use crate::aliyun::AliyunCredentials;

/// Shared state handed to every reconcile call: the k8s client plus the
/// cloud credentials used to build a fresh [`resources::CloudClients`] per
/// reconcile (region varies per `AlicloudCluster`, so the client set can't
/// be built once at startup).
pub struct ControllerState {
    pub client: Client,
    pub credentials: Arc<AliyunCredentials>,
}

impl ControllerState {
    pub fn new(client: Client, credentials: Arc<AliyunCredentials>) -> Arc<Self> {
        Arc::new(Self { client, credentials })
    }
}
