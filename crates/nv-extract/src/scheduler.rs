//! One scan of one organization.
//!
//! A fixed pool of workers drains a shared job queue. Each worker fetches,
//! writes the resource itself, and sends only the outcome back to the
//! aggregator. The commit happens after every job is accounted for; a write
//! failure stops the pool and the scan ends without a commit.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use nv_api::{FetchError, Fetcher, Transport};
use nv_core::{Catalog, Hierarchy, ResourceId, ResourceIssue, ScanRecord};
use nv_snapshot::{ArchiveLock, GitIdentity, ScanLog, SnapshotStore, SnapshotWriter, settings_root};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::ExtractError;
use crate::plan::{FetchJob, FetchPlan};

/// Where and how a scan persists its results.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Parent of every organization root.
    pub base_path: PathBuf,
    pub identity: GitIdentity,
    pub lock_timeout: Duration,
    /// Worker count; clamped to `1..=max_in_flight` of the limiter.
    pub workers: usize,
}

/// Hook for progress display. Both methods default to doing nothing.
pub trait ScanProgress: Send + Sync {
    fn planned(&self, _org_id: &str, _jobs: usize) {}
    fn finished(&self, _resource: &ResourceId) {}
}

/// Reports nothing.
pub struct NoProgress;

impl ScanProgress for NoProgress {}

#[derive(Debug)]
enum Outcome {
    Written(ResourceId),
    Skipped(ResourceId, String),
    Failed(ResourceId, String),
    WriteFailed(ResourceId, String),
}

pub struct Scheduler<T> {
    fetcher: Arc<Fetcher<T>>,
    settings: ScanSettings,
}

impl<T: Transport + 'static> Scheduler<T> {
    pub const fn new(fetcher: Arc<Fetcher<T>>, settings: ScanSettings) -> Self {
        Self { fetcher, settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    fn worker_count(&self) -> usize {
        let ceiling = self.fetcher.limiter().max_in_flight().max(1);
        self.settings.workers.clamp(1, ceiling)
    }

    /// Scan `org_id` against `catalog`, returning its finished record.
    ///
    /// Per-organization failures (unknown organization, lock timeout, store
    /// errors) come back as an aborted record so the caller can move on to
    /// the next organization. Discovery and lock failures are not written to
    /// the scan log since the archive was never touched.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Auth`] when the credential is rejected, which
    /// no other organization can recover from.
    pub async fn run(
        &self,
        org_id: &str,
        catalog: &Catalog,
        tag: Option<&str>,
        progress: Arc<dyn ScanProgress>,
    ) -> Result<ScanRecord, ExtractError> {
        let mut record = ScanRecord::begin(org_id, tag);

        let hierarchy = match self.fetcher.discover(org_id, tag).await {
            Ok(h) => h,
            Err(e) => match ExtractError::from(e) {
                ExtractError::Auth => return Err(ExtractError::Auth),
                other => {
                    tracing::error!(org_id, error = %other, "discovery failed");
                    record.abort(other.to_string());
                    return Ok(record);
                }
            },
        };
        record.org_name = Some(hierarchy.organization.name.clone());
        record.networks = hierarchy.networks.len();
        record.devices = hierarchy.devices.len();
        record.warnings.clone_from(&hierarchy.warnings);

        let org_root = self.settings.base_path.join(org_id);
        let _lock = match ArchiveLock::acquire(&org_root, self.settings.lock_timeout).await {
            Ok(lock) => lock,
            Err(e) => {
                tracing::error!(org_id, error = %e, "could not lock archive");
                record.abort(e.to_string());
                return Ok(record);
            }
        };

        if let Err(reason) = self.extract(&hierarchy, catalog, &mut record, &progress).await {
            tracing::error!(org_id, %reason, "scan aborted");
            record.abort(reason);
        } else {
            record.finish();
        }

        match ScanLog::new(&org_root).record(&record) {
            Ok(path) => tracing::debug!(org_id, path = %path.display(), "scan logged"),
            Err(e) => tracing::error!(org_id, error = %e, "could not write scan log"),
        }
        tracing::info!(
            org_id,
            status = %record.status,
            written = record.written,
            skipped = record.skipped.len(),
            failed = record.failed.len(),
            revision = record.revision.as_deref().unwrap_or("-"),
            committed = record.committed,
            "scan finished"
        );
        Ok(record)
    }

    /// Reset, fetch, write, and commit. Errors are abort reasons.
    async fn extract(
        &self,
        hierarchy: &Hierarchy,
        catalog: &Catalog,
        record: &mut ScanRecord,
        progress: &Arc<dyn ScanProgress>,
    ) -> Result<(), String> {
        let org = &hierarchy.organization;
        let root = settings_root(&self.settings.base_path.join(&org.id));
        let description = format!("netvault archive of {} ({})", org.name, org.id);
        let store = SnapshotStore::ensure_repository(&root, &self.settings.identity, &description)
            .map_err(|e| e.to_string())?;
        let writer = Arc::new(SnapshotWriter::new(&root));
        let cleared = writer.reset().map_err(|e| e.to_string())?;
        tracing::debug!(org_id = %org.id, cleared, "reset working tree");

        let plan = FetchPlan::build(catalog, hierarchy);
        record.planned = plan.len();
        progress.planned(&org.id, plan.len());

        let write_error = self.execute(plan, &writer, record, progress).await;
        if let Some(reason) = write_error {
            return Err(reason);
        }

        let message = format!(
            "Scan of {} ({}) finished on {}",
            org.name,
            org.id,
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        let revision = match store.commit(&message).map_err(|e| e.to_string())? {
            Some(created) => {
                record.committed = true;
                created
            }
            None => store.resolve("HEAD").map_err(|e| e.to_string())?,
        };
        record.revision = Some(revision.id);
        Ok(())
    }

    /// Drain `plan` through the worker pool. Returns the first write failure.
    async fn execute(
        &self,
        plan: FetchPlan,
        writer: &Arc<SnapshotWriter>,
        record: &mut ScanRecord,
        progress: &Arc<dyn ScanProgress>,
    ) -> Option<String> {
        let queue = Arc::new(Mutex::new(VecDeque::from(plan.jobs)));
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut set = JoinSet::new();
        for _ in 0..self.worker_count() {
            set.spawn(worker(
                Arc::clone(&self.fetcher),
                Arc::clone(&queue),
                Arc::clone(writer),
                Arc::clone(&stop),
                tx.clone(),
            ));
        }
        drop(tx);

        let mut write_error = None;
        while let Some(outcome) = rx.recv().await {
            match outcome {
                Outcome::Written(id) => {
                    record.written += 1;
                    progress.finished(&id);
                }
                Outcome::Skipped(id, reason) => {
                    tracing::debug!(resource = %id, %reason, "skipped");
                    progress.finished(&id);
                    record.skipped.push(ResourceIssue {
                        resource: id,
                        reason,
                    });
                }
                Outcome::Failed(id, reason) => {
                    tracing::warn!(resource = %id, %reason, "fetch failed");
                    progress.finished(&id);
                    record.failed.push(ResourceIssue {
                        resource: id,
                        reason,
                    });
                }
                Outcome::WriteFailed(id, reason) => {
                    write_error.get_or_insert_with(|| format!("cannot write {id}: {reason}"));
                }
            }
        }

        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                tracing::warn!(%e, "fetch worker failed");
                write_error.get_or_insert_with(|| format!("fetch worker failed: {e}"));
            }
        }
        write_error
    }
}

fn next_job(queue: &Mutex<VecDeque<FetchJob>>) -> Option<FetchJob> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

async fn worker<T: Transport>(
    fetcher: Arc<Fetcher<T>>,
    queue: Arc<Mutex<VecDeque<FetchJob>>>,
    writer: Arc<SnapshotWriter>,
    stop: Arc<AtomicBool>,
    outcomes: mpsc::UnboundedSender<Outcome>,
) {
    while !stop.load(Ordering::Relaxed) {
        let Some(job) = next_job(&queue) else { break };
        let id = job.resource_id();
        let outcome = match fetcher.fetch(&job.descriptor, &job.scope).await {
            Ok(resource) => match writer.write(&resource) {
                Ok(_) => Outcome::Written(id),
                Err(e) => {
                    stop.store(true, Ordering::Relaxed);
                    Outcome::WriteFailed(id, e.to_string())
                }
            },
            Err(e @ (FetchError::NotApplicable { .. } | FetchError::Request(_))) => {
                Outcome::Skipped(id, e.to_string())
            }
            Err(e) => Outcome::Failed(id, e.to_string()),
        };
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}
