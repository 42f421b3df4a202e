use miette::Diagnostic;
use thiserror::Error;

/// Client error type for cluster API access
#[derive(Error, Debug, Diagnostic)]
pub enum ClientError {
    /// No way to reach the cluster was found
    #[error("No kubeconfig or service account token found")]
    #[diagnostic(
        code(rfsched::client::no_credentials),
        help("Pass --kubeconfig, --api-url, or run inside a pod with a mounted service account (looked in '{token_dir}')")
    )]
    NoCredentials {
        #[allow(unused)]
        token_dir: String,
    },

    /// Kubeconfig could not be used
    #[error("Invalid kubeconfig '{path}': {message}")]
    #[diagnostic(
        code(rfsched::client::invalid_kubeconfig),
        help("Check the file with `kubectl config view --minify`. Only token and CA based authentication is supported")
    )]
    InvalidKubeconfig {
        #[allow(unused)]
        path: String,
        #[allow(unused)]
        message: String,
    },

    /// A credential or certificate file could not be read
    #[error("Failed to read '{path}': {message}")]
    #[diagnostic(
        code(rfsched::client::read_failed),
        help("Verify the file exists and is readable by the scheduler process")
    )]
    ReadFailed {
        #[allow(unused)]
        path: String,
        #[allow(unused)]
        message: String,
    },

    /// Invalid client configuration
    #[error("Invalid client configuration: {message}")]
    #[diagnostic(code(rfsched::client::invalid_config), help("{suggestion}"))]
    InvalidConfig {
        #[allow(unused)]
        message: String,
        #[allow(unused)]
        suggestion: String,
    },

    /// Request never got a response
    #[error("Request to {url} failed: {message}")]
    #[diagnostic(
        code(rfsched::client::transport),
        help("Check connectivity to the API server and that its certificate is trusted")
    )]
    Transport {
        #[allow(unused)]
        url: String,
        #[allow(unused)]
        message: String,
    },

    /// API server answered with a non-success status
    #[error("{url} returned status {status}: {body}")]
    #[diagnostic(
        code(rfsched::client::api_status),
        help("A 401 or 403 usually means the service account lacks RBAC permission to list pods and nodes")
    )]
    ApiStatus {
        #[allow(unused)]
        url: String,
        #[allow(unused)]
        status: u16,
        #[allow(unused)]
        body: String,
    },

    /// Response body could not be decoded
    #[error("Failed to decode {what}: {message}")]
    #[diagnostic(
        code(rfsched::client::decode),
        help("The API server returned an unexpected payload. Verify --api-url points at a Kubernetes API server")
    )]
    Decode {
        #[allow(unused)]
        what: String,
        #[allow(unused)]
        message: String,
    },
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn no_credentials(token_dir: impl Into<String>) -> Self {
        Self::NoCredentials {
            token_dir: token_dir.into(),
        }
    }

    pub fn invalid_kubeconfig(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKubeconfig {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn read_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn api_status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::ApiStatus {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn decode(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.into(),
        }
    }
}
