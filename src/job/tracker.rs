use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::config::JobConfig;
use super::error::{JobError, JobResult};
use super::types::{JobSnapshot, JobState, StartOutcome};
use crate::api::{IndexingJobService, JobProgress, StatusResponse};
use crate::cache::{CacheKey, KeyScope, SharedCache};
use crate::constants::PROGRESS_STALE_AFTER;

struct Inner<J> {
    service: Arc<J>,
    cache: SharedCache,
    config: JobConfig,
    snapshot: watch::Sender<JobSnapshot>,
    closed: AtomicBool,
    poller: Mutex<Option<JoinHandle<()>>>,
}

/// Starts the indexing job and follows its progress.
///
/// Never starts on its own. Polling begins only after a successful [`start`] and ends
/// on completion, failure, [`shutdown`] or drop.
///
/// [`start`]: JobTracker::start
/// [`shutdown`]: JobTracker::shutdown
pub struct JobTracker<J: IndexingJobService + 'static> {
    inner: Arc<Inner<J>>,
}

impl<J: IndexingJobService + 'static> JobTracker<J> {
    pub fn new(service: Arc<J>, cache: SharedCache, config: JobConfig) -> Self {
        let (snapshot, _) = watch::channel(JobSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                service,
                cache,
                config,
                snapshot,
                closed: AtomicBool::new(false),
                poller: Mutex::new(None),
            }),
        }
    }

    /// Starts an incremental indexing job.
    ///
    /// A no-op while a start or a polling session is running. Otherwise progress is
    /// reset, the start request is sent, and on success the cached progress is
    /// invalidated and polling begins.
    #[instrument(skip(self))]
    pub async fn start(&self) -> JobResult<StartOutcome> {
        let claimed = self.inner.snapshot.send_if_modified(|snap| {
            if snap.state.is_active() {
                return false;
            }
            *snap = JobSnapshot {
                state: JobState::Starting,
                ..JobSnapshot::default()
            };
            true
        });
        if !claimed {
            debug!("indexing job already running, start ignored");
            return Ok(StartOutcome::AlreadyRunning);
        }

        info!("starting indexing job");
        let guard = StartGuard::new(&self.inner.snapshot);
        let result = self.inner.service.start_incremental().await;
        guard.disarm();

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "indexing job start failed");
                let error = JobError::StartFailed(e);
                self.inner.snapshot.send_modify(|snap| {
                    snap.state = JobState::Failed;
                    snap.error = Some(error.clone());
                });
                return Err(error);
            }
        };

        self.inner.cache.invalidate(&CacheKey::Progress);

        let mut poller = self.inner.poller.lock();
        // Acquire: pairs with the Release store in shutdown().
        if self.inner.closed.load(Ordering::Acquire) {
            debug!("tracker shut down during start, not polling");
            self.inner.stop_active();
            return Ok(StartOutcome::Started {
                status: status.status,
            });
        }

        self.inner
            .snapshot
            .send_modify(|snap| snap.state = JobState::Polling);
        info!(status = %status.status, "indexing job started, polling progress");

        let task = tokio::spawn(Inner::poll(Arc::clone(&self.inner)));
        if let Some(previous) = poller.replace(task) {
            previous.abort();
        }
        drop(poller);

        Ok(StartOutcome::Started {
            status: status.status,
        })
    }

    /// Rebuilds the whole index and invalidates every cached search.
    #[instrument(skip(self))]
    pub async fn rebuild_index(&self) -> JobResult<StatusResponse> {
        let status = self
            .inner
            .service
            .rebuild()
            .await
            .map_err(JobError::RebuildFailed)?;
        self.inner.cache.invalidate_scope(KeyScope::Search);
        info!(status = %status.status, "index rebuilt");
        Ok(status)
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> JobSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    #[inline]
    pub fn state(&self) -> JobState {
        self.inner.snapshot.borrow().state
    }

    #[inline]
    pub fn is_vectorizing(&self) -> bool {
        self.inner.snapshot.borrow().is_vectorizing()
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Waits until no start or poll is running and returns the snapshot at that point.
    /// Returns immediately if nothing is running, including after [`shutdown`].
    ///
    /// [`shutdown`]: JobTracker::shutdown
    pub async fn settled(&self) -> JobSnapshot {
        let mut rx = self.subscribe();
        if let Ok(snap) = rx.wait_for(|snap| !snap.state.is_active()).await {
            return snap.clone();
        }
        self.snapshot()
    }

    /// Stops polling and returns a running job to `Idle`. Later `start()` calls still
    /// send the request but do not poll.
    pub fn shutdown(&self) {
        let mut poller = self.inner.poller.lock();
        // Release: a start() that observes the flag with Acquire skips spawning a poller.
        self.inner.closed.store(true, Ordering::Release);
        if let Some(poller) = poller.take() {
            poller.abort();
        }
        drop(poller);
        self.inner.stop_active();
    }
}

impl<J: IndexingJobService + 'static> Drop for JobTracker<J> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<J: IndexingJobService + 'static> std::fmt::Debug for JobTracker<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.inner.snapshot.borrow();
        f.debug_struct("JobTracker")
            .field("state", &snapshot.state)
            .field("progress", &snapshot.progress)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<J: IndexingJobService + 'static> Inner<J> {
    /// One polling session. The next fetch is scheduled only after the previous one
    /// resolved.
    async fn poll(inner: Arc<Self>) {
        let config = inner.config;
        let mut failures = 0u32;
        let mut unmeasured = 0u32;

        loop {
            let ticket = inner.cache.begin_fetch(CacheKey::Progress);
            match inner.service.progress().await {
                Ok(progress) => {
                    inner.cache.store(ticket, progress, PROGRESS_STALE_AFTER);
                    failures = 0;

                    if progress.is_complete() {
                        inner.finish(JobState::Complete, progress);
                        info!(%progress, "indexing job complete");
                        break;
                    }

                    if progress.is_measured() {
                        unmeasured = 0;
                    } else {
                        unmeasured += 1;
                        if unmeasured >= config.max_unmeasured_polls {
                            inner.finish(JobState::Complete, progress);
                            info!(polls = unmeasured, "indexing job reported no work");
                            break;
                        }
                    }

                    debug!(%progress, "indexing progress");
                    inner.snapshot.send_if_modified(|snap| {
                        if snap.state != JobState::Polling {
                            return false;
                        }
                        let changed = snap.progress != progress || snap.consecutive_failures != 0;
                        snap.progress = progress;
                        snap.consecutive_failures = 0;
                        changed
                    });
                }
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, failures, "progress poll failed");

                    if failures >= config.max_poll_failures {
                        let error = JobError::PollFailed {
                            attempts: failures,
                            source: e,
                        };
                        inner.snapshot.send_modify(|snap| {
                            snap.state = JobState::Failed;
                            snap.consecutive_failures = failures;
                            snap.error = Some(error);
                        });
                        warn!(failures, "giving up on indexing job");
                        break;
                    }

                    inner
                        .snapshot
                        .send_modify(|snap| snap.consecutive_failures = failures);
                }
            }

            tokio::time::sleep(config.poll_interval).await;
        }
    }

    /// Moves a `Starting`/`Polling` job back to `Idle` and drops its partial progress.
    fn stop_active(&self) {
        let stopped = self.snapshot.send_if_modified(|snap| {
            if !snap.state.is_active() {
                return false;
            }
            *snap = JobSnapshot::default();
            true
        });
        if stopped {
            debug!("indexing job tracking stopped");
        }
    }

    fn finish(&self, state: JobState, progress: JobProgress) {
        self.snapshot.send_modify(|snap| {
            snap.state = state;
            snap.progress = progress;
            snap.consecutive_failures = 0;
        });
    }
}

/// Reverts a claimed `Starting` state if the start future is dropped mid-request.
struct StartGuard<'a> {
    snapshot: &'a watch::Sender<JobSnapshot>,
    armed: bool,
}

impl<'a> StartGuard<'a> {
    fn new(snapshot: &'a watch::Sender<JobSnapshot>) -> Self {
        Self {
            snapshot,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let reverted = self.snapshot.send_if_modified(|snap| {
            if snap.state != JobState::Starting {
                return false;
            }
            *snap = JobSnapshot::default();
            true
        });
        if reverted {
            debug!("indexing job start cancelled, state reset");
        }
    }
}
