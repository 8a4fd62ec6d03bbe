use std::fmt;
use std::time::Duration;

use cap_schemas::FleetHost;

use crate::api::FleetRegistrySource;
use crate::error::{excerpt, InventoryError};

#[derive(Clone)]
pub struct FleetCredentials {
    pub username: String,
    pub api_key: String,
}

impl fmt::Debug for FleetCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetCredentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Fleet registry spread over one or more hardware-account endpoints. Every
/// URL returns `[{fullyQualifiedDomainName, id}]`; results are concatenated
/// in URL order.
#[derive(Debug, Clone)]
pub struct HttpFleetRegistry {
    http: reqwest::Client,
    urls: Vec<String>,
    credentials: Option<FleetCredentials>,
}

impl HttpFleetRegistry {
    pub fn new(
        urls: Vec<String>,
        credentials: Option<FleetCredentials>,
        accept_invalid_certs: bool,
        timeout: Duration,
    ) -> Result<Self, InventoryError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(timeout)
            .build()
            .map_err(|e| InventoryError::Transport {
                endpoint: "fleet-registry client".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            urls,
            credentials,
        })
    }

    async fn fetch_one(&self, url: &str) -> Result<Vec<FleetHost>, InventoryError> {
        let mut req = self.http.get(url);
        if let Some(c) = &self.credentials {
            req = req.basic_auth(&c.username, Some(&c.api_key));
        }
        let resp = req.send().await.map_err(|e| InventoryError::Transport {
            endpoint: url.to_string(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| InventoryError::Transport {
            endpoint: url.to_string(),
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(InventoryError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
                body: excerpt(&String::from_utf8_lossy(&body)),
            });
        }
        serde_json::from_slice(&body).map_err(|e| InventoryError::Decode {
            endpoint: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl FleetRegistrySource for HttpFleetRegistry {
    async fn fetch_hosts(&self) -> Result<Vec<FleetHost>, InventoryError> {
        let mut hosts = Vec::new();
        for url in &self.urls {
            let mut page = self.fetch_one(url).await?;
            tracing::debug!(url = %url, hosts = page.len(), "fleet registry page fetched");
            hosts.append(&mut page);
        }
        Ok(hosts)
    }
}
