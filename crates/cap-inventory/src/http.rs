use std::fmt;
use std::time::Duration;

use cap_schemas::{Cluster, ClusterHost, Instance, PatchRequest, Storage};
use serde::de::DeserializeOwned;

use crate::api::InventoryApi;
use crate::error::{excerpt, InventoryError};

const CLUSTERS: &str = "clusters";
const STORAGE: &str = "storage";
const INSTANCES: &str = "instances";
const CLUSTER_HOSTS: &str = "cluster-hosts";

#[derive(Debug, Clone)]
pub struct InventoryClientOptions {
    /// Accept self-signed / invalid TLS certificates.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl Default for InventoryClientOptions {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Bearer-token HTTP client for the inventory service.
///
/// The API key is passed in by the caller; it never appears in `Debug` output
/// or logs.
#[derive(Clone)]
pub struct HttpInventoryClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for HttpInventoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpInventoryClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HttpInventoryClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        opts: InventoryClientOptions,
    ) -> Result<Self, InventoryError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(opts.accept_invalid_certs)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| InventoryError::Transport {
                endpoint: "client".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, InventoryError> {
        let resp = self
            .http
            .get(self.url(endpoint))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| transport(endpoint, e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| transport(endpoint, e))?;
        if !status.is_success() {
            return Err(InventoryError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: excerpt(&String::from_utf8_lossy(&body)),
            });
        }

        serde_json::from_slice(&body).map_err(|e| InventoryError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

fn transport(endpoint: &str, e: reqwest::Error) -> InventoryError {
    InventoryError::Transport {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    }
}

#[async_trait::async_trait]
impl InventoryApi for HttpInventoryClient {
    async fn clusters(&self) -> Result<Vec<Cluster>, InventoryError> {
        self.get(CLUSTERS).await
    }

    async fn storages(&self) -> Result<Vec<Storage>, InventoryError> {
        self.get(STORAGE).await
    }

    async fn instances(&self) -> Result<Vec<Instance>, InventoryError> {
        self.get(INSTANCES).await
    }

    async fn cluster_hosts(&self) -> Result<Vec<ClusterHost>, InventoryError> {
        self.get(CLUSTER_HOSTS).await
    }

    async fn patch(&self, request: &PatchRequest) -> Result<(), InventoryError> {
        let endpoint = format!("{}/{}", request.collection.as_str(), request.target_id);
        let resp = self
            .http
            .patch(self.url(&endpoint))
            .bearer_auth(&self.api_key)
            .json(&request.operations)
            .send()
            .await
            .map_err(|e| transport(&endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InventoryError::Status {
                endpoint,
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }
        Ok(())
    }
}
