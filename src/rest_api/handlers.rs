//! Axum handlers backing the REST API: health plus read-only list/get over
//! `AlicloudCluster` and `AlicloudMachine`. No create/update/delete --
//! mutation only ever happens through the k8s API server directly.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use kube::api::Api;

use crate::controller::ControllerState;
use crate::crd::{AlicloudCluster, AlicloudMachine};

use super::dto::{
    ClusterDetailResponse, ClusterListResponse, ClusterSummary, ErrorResponse, HealthResponse, MachineDetailResponse,
    MachineListResponse, MachineSummary,
};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string(), version: env!("CARGO_PKG_VERSION").to_string() })
}

#[cfg(feature = "metrics")]
pub async fn metrics() -> String {
    crate::metrics::encode_metrics()
}

pub async fn list_clusters(State(state): State<Arc<ControllerState>>) -> Json<ClusterListResponse> {
    let api: Api<AlicloudCluster> = Api::all(state.client.clone());
    let items = api.list(&Default::default()).await.map(|l| l.items).unwrap_or_default();
    let summaries: Vec<ClusterSummary> = items.iter().map(ClusterSummary::from).collect();
    Json(ClusterListResponse { total: summaries.len(), items: summaries })
}

pub async fn get_cluster(
    State(state): State<Arc<ControllerState>>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<ClusterDetailResponse>, (StatusCode, Json<ErrorResponse>)> {
    let api: Api<AlicloudCluster> = Api::namespaced(state.client.clone(), &namespace);
    match api.get(&name).await {
        Ok(c) => Ok(Json(ClusterDetailResponse::from(&c))),
        Err(kube::Error::Api(e)) if e.code == 404 => {
            Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new("not_found", &format!("cluster {name} not found")))))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("internal_error", &e.to_string())),
        )),
    }
}

pub async fn list_machines(State(state): State<Arc<ControllerState>>) -> Json<MachineListResponse> {
    let api: Api<AlicloudMachine> = Api::all(state.client.clone());
    let items = api.list(&Default::default()).await.map(|l| l.items).unwrap_or_default();
    let summaries: Vec<MachineSummary> = items.iter().map(MachineSummary::from).collect();
    Json(MachineListResponse { total: summaries.len(), items: summaries })
}

pub async fn get_machine(
    State(state): State<Arc<ControllerState>>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<MachineDetailResponse>, (StatusCode, Json<ErrorResponse>)> {
    let api: Api<AlicloudMachine> = Api::namespaced(state.client.clone(), &namespace);
    match api.get(&name).await {
        Ok(m) => Ok(Json(MachineDetailResponse::from(&m))),
        Err(kube::Error::Api(e)) if e.code == 404 => {
            Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new("not_found", &format!("machine {name} not found")))))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("internal_error", &e.to_string())),
        )),
    }
}
