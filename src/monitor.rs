use crate::job::JobId;
use crate::provider::ProviderRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Handle to one job's active monitor. Dropping it signals the watcher task
/// to stop.
pub struct MonitorHandle {
    _stop: watch::Sender<bool>,
}

/// Table of active payment monitors, at most one per job.
///
/// Removal from this table is the at-most-once mechanism for confirmation:
/// whichever party takes the entry (the watcher on confirmation, the
/// controller on cleanup, a caller on cancel) wins, and everyone else sees
/// the job as no longer watched.
pub struct MonitorSet {
    active: Mutex<HashMap<JobId, MonitorHandle>>,
}

impl MonitorSet {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Create the stop channel and record the monitor as active. Must happen
    /// before the watcher task starts polling, so the entry is visible to
    /// the watcher's own take on confirmation.
    pub fn register(&self, job_id: JobId) -> watch::Receiver<bool> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut active = self.active.lock().expect("monitor table poisoned");
        active.insert(job_id, MonitorHandle { _stop: stop_tx });
        stop_rx
    }

    /// Remove and return the entry, if still present.
    pub fn take(&self, job_id: &JobId) -> Option<MonitorHandle> {
        let mut active = self.active.lock().expect("monitor table poisoned");
        active.remove(job_id)
    }

    /// Stop the job's watcher if one is still active. Idempotent: safe when
    /// the monitor was never started or already removed.
    pub fn stop(&self, job_id: &JobId) -> bool {
        // Dropping the handle closes the watch channel, which the watcher
        // observes as its stop signal.
        self.take(job_id).is_some()
    }

    pub fn is_active(&self, job_id: &JobId) -> bool {
        let active = self.active.lock().expect("monitor table poisoned");
        active.contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        let active = self.active.lock().expect("monitor table poisoned");
        active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MonitorSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the per-job watcher: poll the provider until the payment is
/// confirmed, then hand the job id to the confirmation channel exactly once
/// and terminate. Transient provider errors are retried; a closed stop
/// channel ends the loop.
pub(crate) fn spawn_watcher(
    job_id: JobId,
    reference: String,
    provider: ProviderRef,
    monitors: Arc<MonitorSet>,
    confirmed: mpsc::UnboundedSender<JobId>,
    mut stop: watch::Receiver<bool>,
    poll_interval: Duration,
    timeout: Option<Duration>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let started = tokio::time::Instant::now();
        loop {
            tokio::select! {
                _ = stop.changed() => {
                    // Signalled or handle dropped; either way we are done.
                    debug!(%job_id, "payment monitor stopped");
                    return;
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    if monitors.take(&job_id).is_some() {
                        info!(%job_id, "payment window elapsed, monitor cancelled");
                    }
                    return;
                }
            }

            match provider.check_status(&reference).await {
                Ok(status) if status.is_confirmed() => {
                    // Only the party that removes the entry may signal
                    // confirmation; a lost race means someone else already
                    // settled this job's fate.
                    if monitors.take(&job_id).is_some() {
                        info!(%job_id, %status, "payment confirmed");
                        let _ = confirmed.send(job_id);
                    } else {
                        debug!(%job_id, "late confirmation signal discarded");
                    }
                    return;
                }
                Ok(status) => {
                    debug!(%job_id, %status, "payment not confirmed yet");
                }
                Err(err) => {
                    warn!(%job_id, %err, "payment status poll failed, will retry");
                }
            }
        }
    })
}
