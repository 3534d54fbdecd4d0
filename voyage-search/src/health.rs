//! Periodic provider health sampling.
//!
//! The monitor probes every registered provider concurrently, each probe
//! raced against its own timeout, and writes the outcome into the
//! registry's status table. It runs off the request path on a fixed
//! interval until cancelled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{ProviderRegistry, RegisteredProvider};
use crate::types::{HealthState, ProviderStatus};

/// Samples provider health into a shared [`ProviderRegistry`].
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    registry: Arc<ProviderRegistry>,
    probe_timeout: Duration,
}

impl HealthMonitor {
    /// Create a monitor writing into `registry`.
    pub fn new(registry: Arc<ProviderRegistry>, probe_timeout: Duration) -> Self {
        Self {
            registry,
            probe_timeout,
        }
    }

    /// Probe every provider once and record the results.
    ///
    /// A failed or timed-out probe yields `healthy = false, error_rate = 1`.
    /// Degraded providers stay eligible for selection.
    pub async fn check_all(&self) -> Vec<ProviderStatus> {
        let probes = self
            .registry
            .providers()
            .iter()
            .map(|provider| probe(provider, self.probe_timeout));
        let statuses = futures::future::join_all(probes).await;

        for status in &statuses {
            self.registry.update_status(status.clone());
        }
        let unhealthy = statuses.iter().filter(|s| !s.healthy).count();
        debug!(checked = statuses.len(), unhealthy, "health sweep finished");
        statuses
    }

    /// Run [`check_all`](Self::check_all) every `interval` until `cancel` fires.
    ///
    /// The first sweep runs immediately.
    pub fn spawn(self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs(), "provider health monitor started");

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.check_all().await;
                    }
                }
            }
            info!("provider health monitor stopped");
        })
    }
}

async fn probe(provider: &RegisteredProvider, timeout: Duration) -> ProviderStatus {
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, provider.handle.health()).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let (healthy, latency_ms, error_rate) = match outcome {
        Ok(Ok(report)) => {
            if report.status == HealthState::Degraded {
                debug!(provider = %provider.name, "provider reports degraded health");
            }
            let latency = if report.latency_ms > 0 {
                report.latency_ms
            } else {
                elapsed_ms
            };
            (
                report.status != HealthState::Unhealthy,
                latency,
                report.error_rate.clamp(0.0, 1.0),
            )
        }
        Ok(Err(err)) => {
            warn!(provider = %provider.name, error = %err, "health probe failed");
            (false, elapsed_ms, 1.0)
        }
        Err(_) => {
            warn!(provider = %provider.name, timeout_ms = timeout.as_millis() as u64, "health probe timed out");
            (false, elapsed_ms, 1.0)
        }
    };

    ProviderStatus {
        name: provider.name.clone(),
        healthy,
        latency_ms,
        error_rate,
        last_checked: Utc::now(),
    }
}
