//! alicloud-infra-operator entry point
//!
//! Starts both reconcilers (`AlicloudCluster`, `AlicloudMachine`) behind
//! leader election and the optional REST API server.

use std::sync::Arc;
use std::time::Duration;

use alicloud_infra_operator::aliyun::AliyunCredentials;
use alicloud_infra_operator::{controller, Error};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kube_leader_election::{LeaseLock, LeaseLockParams, LeaseLockResult};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let env_filter = EnvFilter::builder().with_default_directive(Level::INFO.into()).from_env_lossy();

    let fmt_layer = fmt::layer().with_target(true);

    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

    let otel_enabled = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok();

    if otel_enabled {
        let otel_layer = alicloud_infra_operator::telemetry::init_telemetry(&registry);
        registry.with(otel_layer).init();
        info!("OpenTelemetry tracing initialized");
    } else {
        registry.init();
        info!("OpenTelemetry tracing disabled (OTEL_EXPORTER_OTLP_ENDPOINT not set)");
    }

    info!("Starting alicloud-infra-operator v{}", env!("CARGO_PKG_VERSION"));

    let client = kube::Client::try_default().await.map_err(Error::KubeError)?;
    info!("Connected to Kubernetes cluster");

    let credentials = Arc::new(AliyunCredentials::from_env()?);
    let state = controller::ControllerState::new(client.clone(), credentials);

    #[cfg(feature = "rest-api")]
    {
        let api_state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = alicloud_infra_operator::rest_api::run_server(api_state).await {
                error!("REST API server error: {:?}", e);
            }
        });
    }

    let namespace = std::env::var("POD_NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let holder_id = std::env::var("POD_NAME").or_else(|_| std::env::var("HOSTNAME")).unwrap_or_else(|_| {
        hostname::get().ok().and_then(|h| h.into_string().ok()).unwrap_or_else(|| "unknown-host".to_string())
    });

    info!("leader election using holder id: {}", holder_id);

    let lock = LeaseLock::new(
        client.clone(),
        &namespace,
        LeaseLockParams {
            lease_name: "alicloud-infra-operator-leader".into(),
            holder_id,
            lease_ttl: Duration::from_secs(15),
        },
    );

    let result = run_while_leader(lock, state).await;

    alicloud_infra_operator::telemetry::shutdown_telemetry();

    result
}

/// Only the current leader runs the two reconcilers; standbys poll the
/// lease every `renew_every` until they acquire it. Losing leadership aborts
/// both controller tasks so a stale standby never keeps reconciling.
async fn run_while_leader(lock: LeaseLock, state: Arc<controller::ControllerState>) -> Result<(), Error> {
    let renew_every = Duration::from_secs(5);
    let mut tick = tokio::time::interval(renew_every);
    let mut controllers: Option<tokio::task::JoinHandle<()>> = None;

    loop {
        tick.tick().await;

        let lease = match lock.try_acquire_or_renew().await {
            Ok(l) => l,
            Err(e) => {
                error!("leader election renew/acquire failed: {:?}", e);
                if let Some(task) = controllers.take() {
                    task.abort();
                    error!("aborted controllers after losing leadership");
                }
                continue;
            }
        };

        if matches!(lease, LeaseLockResult::Acquired(_)) {
            if controllers.is_none() {
                info!("acquired leadership; starting controllers");
                let cluster_state = state.clone();
                let machine_state = state.clone();
                controllers = Some(tokio::spawn(async move {
                    let result = tokio::try_join!(
                        controller::reconciler::run_controller(cluster_state),
                        controller::machine_reconciler::run_controller(machine_state),
                    );
                    if let Err(e) = result {
                        error!("controller exited with error: {:?}", e);
                    }
                }));
            }
        } else if let Some(task) = controllers.take() {
            task.abort();
            info!("lost leadership; controllers stopped");
        }
    }
}
