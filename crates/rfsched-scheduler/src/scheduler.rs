use crate::filter::{check_eligibility, label_key, Eligibility, IneligibleReason};
use crate::select::select_node;
use crate::types::{PassReport, PodOutcome, SchedulerConfig};
use crate::Result;
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rfsched_client::ClusterAccessor;
use rfsched_core::PodIdentity;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

/// Label-affinity pod scheduler
pub struct Scheduler {
    accessor: Arc<dyn ClusterAccessor>,
    config: SchedulerConfig,
    rng: Mutex<StdRng>,
}

impl Scheduler {
    /// Create a new scheduler with an OS-seeded random source
    pub fn new(accessor: Arc<dyn ClusterAccessor>, config: SchedulerConfig) -> Result<Self> {
        Self::with_rng(accessor, config, StdRng::from_os_rng())
    }

    /// Create a new scheduler with an explicit random source
    pub fn with_rng(
        accessor: Arc<dyn ClusterAccessor>,
        config: SchedulerConfig,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        if config.has_ambiguous_labels() {
            warn!(
                "Label scheme '{}' without a namespace allow-list: a node label matches pods of the same name in every namespace",
                config.label_contract.scheme()
            );
        }

        Ok(Self {
            accessor,
            config,
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run a single placement pass
    pub async fn run_once(&self) -> Result<PassReport> {
        info!("Running scheduler '{}'", self.config.scheduler_name());
        let report = self.run_pass().await?;
        info!(
            pods = report.pods_seen,
            eligible = report.eligible,
            bound = report.bound,
            failed = report.failed,
            no_match = report.no_match,
            "Scheduler pass finished"
        );
        Ok(report)
    }

    /// Run placement passes forever, sleeping `delay` between them.
    ///
    /// Only returns when a pass fails to reach the cluster.
    pub async fn run_forever(&self, delay: Duration) -> Result<()> {
        info!(
            "Starting scheduler '{}' (delay between passes: {:?})",
            self.config.scheduler_name(),
            delay
        );

        loop {
            self.run_once().await?;
            debug!("Scheduler finished. Sleeping for {:?}", delay);
            sleep(delay).await;
        }
    }

    /// List pods and place every eligible one.
    ///
    /// Binding failures are counted and do not stop the pass. Failing to list
    /// pods or nodes does: no further placement starts, and the error is
    /// returned once in-flight placements have finished.
    pub async fn run_pass(&self) -> Result<PassReport> {
        let pods = self.accessor.list_pods().await?;

        let mut report = PassReport {
            pods_seen: pods.len(),
            ..Default::default()
        };

        let eligible: Vec<PodIdentity> = pods
            .iter()
            .filter_map(|pod| match check_eligibility(pod, &self.config) {
                Eligibility::Eligible(id) => Some(id),
                Eligibility::Ineligible(reason) => {
                    log_ineligible(pod.metadata.name.as_deref(), &reason);
                    None
                }
            })
            .collect();
        drop(pods);

        report.eligible = eligible.len();

        if self.config.concurrency <= 1 {
            for pod in &eligible {
                let outcome = self.place_pod(pod).await?;
                report.record(&outcome);
            }
            return Ok(report);
        }

        let halted = &AtomicBool::new(false);
        let results: Vec<Option<Result<PodOutcome>>> = stream::iter(eligible.iter())
            .map(move |pod| async move {
                if halted.load(Ordering::SeqCst) {
                    return None;
                }
                let result = self.place_pod(pod).await;
                if result.is_err() {
                    halted.store(true, Ordering::SeqCst);
                }
                Some(result)
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let mut first_error = None;
        for result in results.into_iter().flatten() {
            match result {
                Ok(outcome) => report.record(&outcome),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => warn!("Additional placement error in pass: {}", e),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Place one eligible pod against a fresh node snapshot
    async fn place_pod(&self, pod: &PodIdentity) -> Result<PodOutcome> {
        debug!("Scheduling pod {}", pod);

        let nodes = self.accessor.list_nodes().await?;
        let key = label_key(pod, &self.config.label_contract);

        let selected = {
            let mut rng = self.rng.lock();
            select_node(&nodes, &key, &mut *rng).and_then(|node| node.metadata.name.clone())
        };

        let Some(node_name) = selected else {
            debug!(
                "Pod {} is not schedulable: no node among {} carries label '{}'",
                pod,
                nodes.len(),
                key
            );
            return Ok(PodOutcome::NoMatchingNode);
        };

        let result = self.accessor.commit_binding(pod, &node_name).await;

        if result.success {
            info!("Bound pod {} to node {}", pod, node_name);
            Ok(PodOutcome::Bound { node: node_name })
        } else {
            warn!(
                "Failed to bind pod {} to node {}: {} {}",
                pod, node_name, result.http_status, result.reason
            );
            Ok(PodOutcome::BindFailed {
                node: node_name,
                http_status: result.http_status,
                reason: result.reason,
            })
        }
    }
}

fn log_ineligible(pod_name: Option<&str>, reason: &IneligibleReason) {
    let pod_name = pod_name.unwrap_or("<unknown>");
    match reason {
        IneligibleReason::MissingField(_) => {
            debug!("Skipping malformed pod {}: {}", pod_name, reason)
        }
        _ => trace!("Skipping pod {}: {}", pod_name, reason),
    }
}
