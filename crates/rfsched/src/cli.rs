use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use rfsched_core::{LabelScheme, DEFAULT_LABEL_PREFIX};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "rfsched",
    about = "Label-affinity Kubernetes pod scheduler",
    long_about = "Binds pending pods that request this scheduler to a node carrying \
                  the pod's affinity label, picked at random among matching nodes."
)]
pub struct Cli {
    /// Scheduler name pods must request through spec.schedulerName
    #[arg(long, env = "SCHED_NAME", default_value = "rfcustom")]
    pub name: String,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Path to a kubeconfig file (default: ~/.kube/config)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Service account directory used when running inside the cluster
    #[arg(long, env = "SCHED_INCLUSTER_BASE_PATH")]
    pub incluster_base_path: Option<PathBuf>,

    /// API server URL, used as is without authentication
    #[arg(long, env = "SCHED_API_URL")]
    pub api_url: Option<String>,

    /// Keep running, with a placement pass every --delay seconds
    #[arg(short, long)]
    pub daemon: bool,

    /// Seconds between placement passes in daemon mode
    #[arg(long, env = "SCHED_DELAY", default_value_t = 10.0)]
    pub delay: f64,

    /// Port of the metrics endpoint
    #[arg(long, env = "SCHED_PROMETHEUS_PORT", default_value_t = 8000)]
    pub prometheus_port: u16,

    /// Serve metrics (SCHED_PROMETHEUS=false turns the endpoint off)
    #[arg(
        long,
        env = "SCHED_PROMETHEUS",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub prometheus: bool,

    /// Do not serve metrics
    #[arg(long, env = "SCHED_PROMETHEUS_DISABLE")]
    pub prometheus_disable: bool,

    /// Only place pods in these namespaces (repeatable or comma-separated)
    #[arg(long = "namespace", env = "SCHED_NAMESPACES", value_delimiter = ',')]
    pub namespaces: Vec<String>,

    /// Affinity label layout: namespaced or pod-only
    #[arg(long, env = "SCHED_LABEL_SCHEME", default_value = "namespaced")]
    pub label_scheme: LabelScheme,

    /// Prefix of the affinity label keys
    #[arg(long, env = "SCHED_LABEL_PREFIX", default_value = DEFAULT_LABEL_PREFIX)]
    pub label_prefix: String,

    /// Pods placed concurrently within one pass
    #[arg(long, env = "SCHED_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Default log directive for the verbosity count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            _ => "debug",
        }
    }

    /// Whether the metrics endpoint should be started
    pub fn metrics_enabled(&self) -> bool {
        self.prometheus && !self.prometheus_disable
    }

    /// Pause between passes in daemon mode
    pub fn delay(&self) -> miette::Result<Duration> {
        Duration::try_from_secs_f64(self.delay)
            .map_err(|e| miette::miette!("Invalid --delay '{}': {}", self.delay, e))
    }

    /// Kubeconfig to try: the flag or KUBECONFIG, else ~/.kube/config
    pub fn kubeconfig_path(&self) -> Option<PathBuf> {
        self.kubeconfig.clone().or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".kube").join("config"))
        })
    }
}
