//! Alibaba Cloud (aliyun) OpenAPI clients.
//!
//! One client struct per resource family, each exposing describe/create/
//! wait-ready/delete plus the handful of special verbs (associate EIP, create
//! SNAT entry, add backend servers, ...) the reconcilers need. Every network
//! call is expected to be driven through [`crate::retry::try_op`] by the
//! caller rather than retrying internally.

mod credentials;
mod ecs;
mod eip;
mod nat;
mod securitygroup;
mod signing;
mod slb;
mod vpc;
mod vswitch;

pub use credentials::AliyunCredentials;
pub use ecs::{
    addresses, EcsClient, EcsInstance, KeyPairClient, DEFAULT_INSTANCE_TYPE, DEFAULT_OS_IMAGE_ID,
    DEFAULT_SSH_KEY_NAME, INSTANCE_STATUS_RUNNING, INSTANCE_STATUS_STOPPED,
};
pub use eip::EipClient;
pub use nat::NatClient;
pub use securitygroup::SecurityGroupClient;
pub use signing::{idempotence_token, sign_request};
pub use slb::SlbClient;
pub use vpc::VpcClient;
pub use vswitch::VSwitchClient;

use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;

/// An error returned by the Alibaba Cloud OpenAPI, or synthesized locally
/// when the HTTP transport itself fails in a way worth classifying (e.g. a
/// connect timeout gets `code = "timeout"`).
#[derive(Debug, Clone, thiserror::Error, Deserialize)]
#[error("aliyun api error [{code}]: {message} (http {http_status}, request {request_id})")]
pub struct CloudError {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(skip)]
    pub http_status: u16,
    #[serde(rename = "RequestId", default)]
    pub request_id: String,
}

impl CloudError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            code: "timeout".to_string(),
            message: message.into(),
            http_status: 0,
            request_id: String::new(),
        }
    }

    /// True for the aliyun-specific idempotent-success codes special-cased
    /// throughout the reconcilers (associate-already-bound, snat vswitch
    /// already in use, and the generic "not found" substring on delete).
    pub fn is_idempotent_success(&self) -> bool {
        self.code == "BIND_INSTANCE_HAVE_PORTMAP_OR_BIND_EIP"
            || self.code == "Forbidden.SourceVSwitchId.Duplicated"
            || self.code == "NotFound"
            || self.message.to_lowercase().contains("not found")
    }

    /// True for the codes that mean "still settling, try again" distinct
    /// from the generic timeout/5xx retry path the kernel already handles.
    pub fn is_retry_signal(&self) -> bool {
        self.code == "InvalidIpStatus.HasBeenUsedBySnatTable" || self.code.contains("Dependency")
    }
}

/// Per-client handle: HTTP client, region, and shared credentials. Cheap to
/// clone (`Arc` inside), mirroring the teacher's `ControllerState { client }`
/// shape but for the cloud side instead of the k8s side.
#[derive(Clone)]
pub struct AliyunContext {
    pub http: reqwest::Client,
    pub region_id: String,
    pub credentials: Arc<AliyunCredentials>,
}

impl AliyunContext {
    pub fn new(region_id: impl Into<String>, credentials: Arc<AliyunCredentials>) -> Self {
        Self {
            http: reqwest::Client::new(),
            region_id: region_id.into(),
            credentials,
        }
    }

    /// Issues one RPC-style call against `endpoint` (e.g.
    /// `https://vpc.aliyuncs.com/`), signing `params` and merging in the
    /// common envelope fields every action needs. Returns the parsed JSON
    /// body on a 2xx response, or `Error::Cloud` with `http_status` set
    /// otherwise -- callers never see `reqwest::Error` for a well-formed
    /// error response, only for genuine transport failures.
    pub(crate) async fn call(
        &self,
        endpoint: &str,
        action: &str,
        version: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<serde_json::Value> {
        params.push(("Action".to_string(), action.to_string()));
        params.push(("Version".to_string(), version.to_string()));
        params.push(("Format".to_string(), "JSON".to_string()));
        params.push(("RegionId".to_string(), self.region_id.clone()));
        params.push(("AccessKeyId".to_string(), self.credentials.access_key_id.clone()));
        params.push(("SignatureMethod".to_string(), "HMAC-SHA256".to_string()));
        params.push(("SignatureVersion".to_string(), "1.0".to_string()));
        params.push(("SignatureNonce".to_string(), idempotence_token()));
        params.push(("Timestamp".to_string(), chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()));

        let query = sign_request("GET", &self.credentials, &mut params);
        let url = format!("{endpoint}?{query}");

        let resp = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                crate::error::Error::Cloud(CloudError::timeout(e.to_string()))
            } else {
                crate::error::Error::Transport(e)
            }
        })?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await?;

        if !status.is_success() {
            let mut cloud_err: CloudError =
                serde_json::from_value(body.clone()).unwrap_or_else(|_| CloudError {
                    code: status.to_string(),
                    message: body.to_string(),
                    http_status: status.as_u16(),
                    request_id: String::new(),
                });
            cloud_err.http_status = status.as_u16();
            return Err(crate::error::Error::Cloud(cloud_err));
        }

        Ok(body)
    }
}

pub(crate) fn field<'a>(body: &'a serde_json::Value, name: &str) -> &'a str {
    body.get(name).and_then(|v| v.as_str()).unwrap_or_default()
}
