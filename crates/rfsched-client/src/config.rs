//! Cluster connection settings
//!
//! Resolution order: an explicit API URL, then a kubeconfig file, then the
//! in-cluster service account directory.

use crate::error::{ClientError, Result};
use k8s_openapi::ByteString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default location of the mounted service account
pub const DEFAULT_TOKEN_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// How to reach and authenticate against the API server
#[derive(Clone)]
pub struct ClusterConnection {
    /// API server base URL (e.g., "https://10.0.0.1:6443")
    pub server: String,
    /// Bearer token
    pub token: Option<String>,
    /// Extra root certificate (PEM)
    pub ca_pem: Option<Vec<u8>>,
    /// Skip TLS verification
    pub accept_invalid_certs: bool,
}

impl std::fmt::Debug for ClusterConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConnection")
            .field("server", &self.server)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("ca_pem", &self.ca_pem.as_ref().map(|p| p.len()))
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl ClusterConnection {
    /// Plain URL, no authentication
    pub fn from_url(url: &str) -> Self {
        Self {
            server: url.trim_end_matches('/').to_string(),
            token: None,
            ca_pem: None,
            accept_invalid_certs: false,
        }
    }

    /// Pick a connection the way the scheduler binary does
    pub fn resolve(
        api_url: Option<&str>,
        kubeconfig: Option<&Path>,
        token_dir: Option<&Path>,
    ) -> Result<Self> {
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            debug!("Using API server URL {}", url);
            return Ok(Self::from_url(url));
        }

        if let Some(path) = kubeconfig.filter(|p| p.exists()) {
            debug!("Using configuration from kubeconfig {}", path.display());
            return Self::from_kubeconfig(path);
        }

        let token_dir = token_dir.unwrap_or_else(|| Path::new(DEFAULT_TOKEN_DIR));
        if token_dir.exists() {
            debug!("Using configuration from token in {}", token_dir.display());
            return Self::in_cluster(token_dir);
        }

        Err(ClientError::no_credentials(token_dir.display().to_string()))
    }

    /// Service account token and CA from `token_dir`, server from the
    /// `KUBERNETES_SERVICE_HOST` / `KUBERNETES_SERVICE_PORT` environment
    pub fn in_cluster(token_dir: &Path) -> Result<Self> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            ClientError::invalid_config(
                "KUBERNETES_SERVICE_HOST is not set",
                "In-cluster configuration only works inside a pod. Use --kubeconfig or --api-url otherwise",
            )
        })?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

        Self::in_cluster_at(token_dir, &host, &port)
    }

    fn in_cluster_at(token_dir: &Path, host: &str, port: &str) -> Result<Self> {
        let token = read_string(&token_dir.join("token"))?;

        let ca_path = token_dir.join("ca.crt");
        let ca_pem = if ca_path.exists() {
            Some(read_bytes(&ca_path)?)
        } else {
            warn!("No ca.crt in {}, using system roots", token_dir.display());
            None
        };

        // IPv6 service hosts need brackets
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]", host)
        } else {
            host.to_string()
        };

        Ok(Self {
            server: format!("https://{}:{}", host, port),
            token: Some(token.trim().to_string()),
            ca_pem,
            accept_invalid_certs: false,
        })
    }

    /// Load the current context of a kubeconfig file
    pub fn from_kubeconfig(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClientError::read_failed(&display, e.to_string()))?;
        let config: Kubeconfig = serde_yaml::from_str(&raw)
            .map_err(|e| ClientError::invalid_kubeconfig(&display, e.to_string()))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let context_name = config
            .current_context
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ClientError::invalid_kubeconfig(&display, "no current-context set"))?;

        let context = config
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .map(|c| &c.context)
            .ok_or_else(|| {
                ClientError::invalid_kubeconfig(
                    &display,
                    format!("context '{}' not found", context_name),
                )
            })?;

        let cluster = config
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| {
                ClientError::invalid_kubeconfig(
                    &display,
                    format!("cluster '{}' not found", context.cluster),
                )
            })?;

        let user = match context.user.as_deref() {
            Some(name) => Some(
                config
                    .users
                    .iter()
                    .find(|u| u.name == name)
                    .map(|u| &u.user)
                    .ok_or_else(|| {
                        ClientError::invalid_kubeconfig(
                            &display,
                            format!("user '{}' not found", name),
                        )
                    })?,
            ),
            None => None,
        };

        let ca_pem = match (&cluster.certificate_authority_data, &cluster.certificate_authority) {
            (Some(data), _) => Some(data.0.clone()),
            (None, Some(file)) => Some(read_bytes(&base_dir.join(file))?),
            (None, None) => None,
        };

        let token = match user {
            Some(u) => match (&u.token, &u.token_file) {
                (Some(token), _) => Some(token.clone()),
                (None, Some(file)) => Some(read_string(&base_dir.join(file))?.trim().to_string()),
                (None, None) => {
                    if u.client_certificate.is_some() || u.client_certificate_data.is_some() {
                        warn!(
                            "Kubeconfig user uses client certificates, which are not supported; requests will be unauthenticated"
                        );
                    }
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            server: cluster.server.trim_end_matches('/').to_string(),
            token,
            ca_pem,
            accept_invalid_certs: cluster.insecure_skip_tls_verify,
        })
    }
}

fn read_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ClientError::read_failed(path.display().to_string(), e.to_string()))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| ClientError::read_failed(path.display().to_string(), e.to_string()))
}

#[derive(Debug, Deserialize)]
struct Kubeconfig {
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClusterEntry {
    server: String,
    #[serde(default)]
    certificate_authority: Option<PathBuf>,
    #[serde(default)]
    certificate_authority_data: Option<ByteString>,
    #[serde(default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    #[serde(default)]
    user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
struct UserEntry {
    #[serde(default)]
    token: Option<String>,
    #[serde(rename = "tokenFile", default)]
    token_file: Option<PathBuf>,
    #[serde(rename = "client-certificate", default)]
    client_certificate: Option<PathBuf>,
    #[serde(rename = "client-certificate-data", default)]
    client_certificate_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
  - name: dev-cluster
    cluster:
      server: https://10.0.0.1:6443/
      certificate-authority-data: LS0tLS1CRUdJTiBDRVJUSUZJQ0FURS0tLS0t
  - name: other
    cluster:
      server: https://10.9.9.9:6443
contexts:
  - name: dev
    context:
      cluster: dev-cluster
      user: admin
  - name: other
    context:
      cluster: other
users:
  - name: admin
    user:
      token: secret-token
"#;

    #[test]
    fn test_from_url_trims_trailing_slash() {
        let conn = ClusterConnection::from_url("http://127.0.0.1:6443/");
        assert_eq!(conn.server, "http://127.0.0.1:6443");
        assert!(conn.token.is_none());
    }

    #[test]
    fn test_kubeconfig_current_context() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let conn = ClusterConnection::from_kubeconfig(&path).unwrap();
        assert_eq!(conn.server, "https://10.0.0.1:6443");
        assert_eq!(conn.token.as_deref(), Some("secret-token"));
        assert_eq!(conn.ca_pem.as_deref(), Some(&b"-----BEGIN CERTIFICATE-----"[..]));
        assert!(!conn.accept_invalid_certs);
    }

    #[test]
    fn test_kubeconfig_relative_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ca.pem"), "PEM").unwrap();
        std::fs::write(dir.path().join("token"), "file-token\n").unwrap();
        let path = dir.path().join("config");
        std::fs::write(
            &path,
            r#"
current-context: c
clusters:
  - name: k
    cluster:
      server: https://k:6443
      certificate-authority: ca.pem
      insecure-skip-tls-verify: true
contexts:
  - name: c
    context:
      cluster: k
      user: u
users:
  - name: u
    user:
      tokenFile: token
"#,
        )
        .unwrap();

        let conn = ClusterConnection::from_kubeconfig(&path).unwrap();
        assert_eq!(conn.ca_pem.as_deref(), Some(&b"PEM"[..]));
        assert_eq!(conn.token.as_deref(), Some("file-token"));
        assert!(conn.accept_invalid_certs);
    }

    #[test]
    fn test_kubeconfig_missing_context() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG.replace("current-context: dev", "current-context: gone"))
            .unwrap();

        let err = ClusterConnection::from_kubeconfig(&path).unwrap_err();
        assert!(matches!(err, ClientError::InvalidKubeconfig { .. }));
        assert!(err.to_string().contains("context 'gone' not found"));
    }

    #[test]
    fn test_kubeconfig_context_without_user() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG.replace("current-context: dev", "current-context: other"))
            .unwrap();

        let conn = ClusterConnection::from_kubeconfig(&path).unwrap();
        assert_eq!(conn.server, "https://10.9.9.9:6443");
        assert!(conn.token.is_none());
        assert!(conn.ca_pem.is_none());
    }

    #[test]
    fn test_in_cluster_reads_token_and_ca() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("token"), "sa-token\n").unwrap();
        std::fs::write(dir.path().join("ca.crt"), "CA").unwrap();

        let conn = ClusterConnection::in_cluster_at(dir.path(), "10.96.0.1", "443").unwrap();
        assert_eq!(conn.server, "https://10.96.0.1:443");
        assert_eq!(conn.token.as_deref(), Some("sa-token"));
        assert_eq!(conn.ca_pem.as_deref(), Some(&b"CA"[..]));

        let conn = ClusterConnection::in_cluster_at(dir.path(), "fd00::1", "443").unwrap();
        assert_eq!(conn.server, "https://[fd00::1]:443");
    }

    #[test]
    fn test_in_cluster_missing_token() {
        let dir = tempdir().unwrap();
        let err = ClusterConnection::in_cluster_at(dir.path(), "10.96.0.1", "443").unwrap_err();
        assert!(matches!(err, ClientError::ReadFailed { .. }));
    }

    #[test]
    fn test_resolve_prefers_api_url() {
        let conn = ClusterConnection::resolve(
            Some("http://127.0.0.1:8080"),
            Some(Path::new("/nonexistent/kubeconfig")),
            None,
        )
        .unwrap();
        assert_eq!(conn.server, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_resolve_uses_existing_kubeconfig() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let conn = ClusterConnection::resolve(None, Some(&path), None).unwrap();
        assert_eq!(conn.server, "https://10.0.0.1:6443");
    }

    #[test]
    fn test_resolve_nothing_found() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = ClusterConnection::resolve(None, Some(&missing), Some(&missing)).unwrap_err();
        assert!(matches!(err, ClientError::NoCredentials { .. }));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut conn = ClusterConnection::from_url("http://x");
        conn.token = Some("hunter2".to_string());
        let dbg = format!("{:?}", conn);
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
