use crate::config::ClusterConnection;
use crate::error::{ClientError, Result};
use crate::traits::ClusterAccessor;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Binding, Node, ObjectReference, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use rfsched_core::{BindingLabels, BindingMetrics, BindingResult, PodIdentity};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP client for the Kubernetes API server
pub struct ApiClient {
    base_url: String,
    client: Client,
    scheduler_name: String,
    metrics: Arc<BindingMetrics>,
}

impl ApiClient {
    /// Build a client for `connection`, recording binding counters labeled
    /// with `scheduler_name` into `metrics`
    pub fn new(
        connection: &ClusterConnection,
        scheduler_name: impl Into<String>,
        metrics: Arc<BindingMetrics>,
    ) -> Result<Self> {
        let mut builder = Client::builder();

        if let Some(token) = &connection.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                ClientError::invalid_config(
                    format!("Bearer token is not a valid header value: {}", e),
                    "Check the token file for stray characters",
                )
            })?;
            value.set_sensitive(true);

            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        if let Some(pem) = &connection.ca_pem {
            let cert = reqwest::Certificate::from_pem(pem).map_err(|e| {
                ClientError::invalid_config(
                    format!("Invalid CA certificate: {}", e),
                    "The certificate authority must be PEM encoded",
                )
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if connection.accept_invalid_certs {
            warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            ClientError::invalid_config(
                format!("Failed to build HTTP client: {}", e),
                "Check the TLS settings of the cluster connection",
            )
        })?;

        Ok(Self {
            base_url: connection.server.trim_end_matches('/').to_string(),
            client,
            scheduler_name: scheduler_name.into(),
            metrics,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a list endpoint and decode its items one by one.
    ///
    /// Items that fail to decode are skipped so a single malformed record
    /// does not hide the rest of the list.
    async fn list<T: DeserializeOwned>(&self, path: &str, kind: &str) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::api_status(&url, status.as_u16(), body));
        }

        let mut body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ClientError::decode(format!("{} list", kind), e.to_string()))?;

        // A null item list is an empty list; a missing one is not a list response
        let items = match body.get_mut("items").map(serde_json::Value::take) {
            Some(serde_json::Value::Array(items)) => items,
            Some(serde_json::Value::Null) => Vec::new(),
            _ => {
                return Err(ClientError::decode(
                    format!("{} list", kind),
                    format!("response from {} has no items array", url),
                ))
            }
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value(item) {
                Ok(obj) => out.push(obj),
                Err(e) => warn!("Failed to parse {} from list: {}", kind, e),
            }
        }

        Ok(out)
    }

    /// POST /api/v1/namespaces/{namespace}/pods/{name}/binding
    async fn post_binding(&self, pod: &PodIdentity, node_name: &str) -> BindingResult {
        let url = format!(
            "{}/api/v1/namespaces/{}/pods/{}/binding",
            self.base_url, pod.namespace, pod.name
        );
        debug!("POST {}", url);

        let body = binding_for(pod, node_name);

        let resp = match self.client.post(&url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Binding request for pod {} failed: {}", pod, e);
                return BindingResult::connection_error();
            }
        };

        let status = resp.status();
        let result = BindingResult::from_status(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
        );

        if !result.success {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                "Binding pod {} to node {} rejected with status {}: {}",
                pod, node_name, status, body
            );
        }

        result
    }
}

/// Build the `v1/Binding` object that assigns `pod` to `node_name`
pub fn binding_for(pod: &PodIdentity, node_name: &str) -> Binding {
    Binding {
        metadata: ObjectMeta {
            name: Some(pod.name.clone()),
            namespace: Some(pod.namespace.clone()),
            ..Default::default()
        },
        target: ObjectReference {
            api_version: Some("v1".to_string()),
            kind: Some("Node".to_string()),
            name: Some(node_name.to_string()),
            ..Default::default()
        },
    }
}

#[async_trait]
impl ClusterAccessor for ApiClient {
    async fn list_pods(&self) -> Result<Vec<Pod>> {
        self.list("/api/v1/pods", "pod").await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.list("/api/v1/nodes", "node").await
    }

    async fn commit_binding(&self, pod: &PodIdentity, node_name: &str) -> BindingResult {
        let labels = BindingLabels::new(pod, node_name, &self.scheduler_name);
        self.metrics.record_attempt(&labels);

        let result = self.post_binding(pod, node_name).await;

        self.metrics.record_outcome(&labels, &result);
        result
    }
}
