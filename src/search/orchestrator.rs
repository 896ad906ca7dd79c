//! Debounced, cache-first search with per-slot supersession.
//!
//! Every query handed to the slot takes the next sequence number. Responses are always
//! written to the cache, but only the response carrying the latest number is applied
//! to the [`SearchSnapshot`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, instrument};

use super::config::SearchConfig;
use super::error::{SearchError, SearchResultSet};
use super::mode::SearchMode;
use super::types::{Query, SearchSnapshot, SearchStatus};
use crate::api::{SearchResult, SearchService};
use crate::cache::{CacheKey, CacheRead, FetchTicket, SharedCache};
use crate::debounce::Debouncer;

type Outcome = Result<SearchResultSet, SearchError>;
type InFlight = watch::Receiver<Option<Outcome>>;

enum Begin {
    /// Answered without a network call.
    Done(SearchResultSet),
    /// This caller owns the network call.
    Fetch {
        seq: u64,
        ticket: FetchTicket,
        tx: watch::Sender<Option<Outcome>>,
    },
    /// Another call for the same key is in flight.
    Join { seq: u64, rx: InFlight },
}

struct Inner<S> {
    service: Arc<S>,
    cache: SharedCache,
    config: SearchConfig,
    mode: watch::Sender<SearchMode>,
    raw_text: Mutex<String>,
    seq: AtomicU64,
    snapshot: watch::Sender<SearchSnapshot>,
    /// In-flight calls by key, tagged with the owning sequence number.
    inflight: Mutex<HashMap<CacheKey, (u64, InFlight)>>,
    tasks: Mutex<JoinSet<()>>,
}

/// Drives one search slot from raw keystrokes to a displayed result set.
///
/// Must be created inside a Tokio runtime: construction spawns the driver task that
/// follows the debounced text and the selected mode.
pub struct SearchOrchestrator<S: SearchService + 'static> {
    inner: Arc<Inner<S>>,
    debouncer: Debouncer<String>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<S: SearchService + 'static> SearchOrchestrator<S> {
    pub fn new(service: Arc<S>, cache: SharedCache, config: SearchConfig) -> Self {
        let (mode, _) = watch::channel(SearchMode::default());
        let (snapshot, _) = watch::channel(SearchSnapshot::default());
        let inner = Arc::new(Inner {
            service,
            cache,
            config,
            mode,
            raw_text: Mutex::new(String::new()),
            seq: AtomicU64::new(0),
            snapshot,
            inflight: Mutex::new(HashMap::new()),
            tasks: Mutex::new(JoinSet::new()),
        });
        let debouncer = Debouncer::new(String::new(), config.debounce);

        let driver = tokio::spawn(Inner::drive(
            Arc::clone(&inner),
            debouncer.subscribe(),
            inner.mode.subscribe(),
        ));

        Self {
            inner,
            debouncer,
            driver: Mutex::new(Some(driver)),
        }
    }

    /// Records the typed text and the selected mode.
    ///
    /// The fetch follows the debounced text. A mode change re-runs the current
    /// effective text right away.
    pub fn set_query(&self, text: impl Into<String>, mode: SearchMode) {
        self.set_text(text);
        self.set_mode(mode);
    }

    /// Records typed text; it becomes effective after the debounce period.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        *self.inner.raw_text.lock() = text.clone();
        self.debouncer.push(text);
    }

    /// Selects the search mode.
    pub fn set_mode(&self, mode: SearchMode) {
        self.inner.mode.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        });
    }

    /// Returns the text as typed, before debouncing.
    pub fn raw_text(&self) -> String {
        self.inner.raw_text.lock().clone()
    }

    pub fn mode(&self) -> SearchMode {
        *self.inner.mode.borrow()
    }

    /// Returns the effective query: the debounced text in the selected mode.
    pub fn query(&self) -> Query {
        Query::new(self.debouncer.current(), self.mode())
    }

    /// Runs `query` through the slot.
    ///
    /// Empty text yields an empty set with no network call. A fresh cached response is
    /// returned without a call. Concurrent calls for one key share a single request.
    #[instrument(
        skip(self, query),
        fields(mode = %query.mode, query_len = query.text.len(), fingerprint = query.fingerprint())
    )]
    pub async fn execute(&self, query: Query) -> Result<SearchResultSet, SearchError> {
        let begin = self.inner.begin(&query, false);
        Arc::clone(&self.inner).finish(query, begin).await
    }

    /// Makes `text` effective immediately and issues it regardless of freshness.
    ///
    /// Used for an explicit submit; the pending debounce timer is dropped.
    #[instrument(skip(self, text), fields(mode = %mode))]
    pub async fn submit(
        &self,
        text: impl Into<String>,
        mode: SearchMode,
    ) -> Result<SearchResultSet, SearchError> {
        let text = text.into();
        *self.inner.raw_text.lock() = text.clone();
        self.debouncer.flush(text.clone());
        self.set_mode(mode);

        let query = Query::new(text, mode);
        let begin = self.inner.begin(&query, true);
        Arc::clone(&self.inner).finish(query, begin).await
    }

    /// Re-issues the current effective query regardless of freshness.
    #[instrument(skip(self))]
    pub async fn refetch(&self) -> Result<SearchResultSet, SearchError> {
        let query = self.query();
        let begin = self.inner.begin(&query, true);
        Arc::clone(&self.inner).finish(query, begin).await
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Stops the driver, the debounce timer and all background fetches.
    pub fn shutdown(&self) {
        self.debouncer.cancel();
        if let Some(driver) = self.driver.lock().take() {
            driver.abort();
        }
        self.inner.tasks.lock().abort_all();
    }
}

impl<S: SearchService + 'static> Drop for SearchOrchestrator<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: SearchService + 'static> std::fmt::Debug for SearchOrchestrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.inner.snapshot.borrow();
        f.debug_struct("SearchOrchestrator")
            .field("mode", &self.mode())
            .field("status", &snapshot.status)
            .field("results", &snapshot.results.len())
            .field("seq", &snapshot.seq)
            .finish()
    }
}

impl<S: SearchService + 'static> Inner<S> {
    async fn drive(
        inner: Arc<Self>,
        mut text_rx: watch::Receiver<String>,
        mut mode_rx: watch::Receiver<SearchMode>,
    ) {
        loop {
            tokio::select! {
                changed = text_rx.changed() => if changed.is_err() { break },
                changed = mode_rx.changed() => if changed.is_err() { break },
            }
            let query = Query::new(text_rx.borrow_and_update().clone(), *mode_rx.borrow_and_update());
            if inner.snapshot.borrow().query == query {
                // Already displayed, e.g. after submit().
                continue;
            }

            let begin = inner.begin(&query, false);
            if matches!(begin, Begin::Done(_)) {
                continue;
            }
            inner.spawn_finish(query, begin);
        }
    }

    fn spawn_finish(self: &Arc<Self>, query: Query, begin: Begin) {
        let task = Arc::clone(self).finish(query, begin);
        let mut tasks = self.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let _ = task.await;
        });
    }

    /// Claims the next sequence number for `query` and publishes what can be shown now.
    ///
    /// Runs under the snapshot lock so sequence order and publish order agree.
    fn begin(&self, query: &Query, force: bool) -> Begin {
        let mut begin = Begin::Done(Arc::new(Vec::new()));

        self.snapshot.send_modify(|snap| {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            snap.seq = seq;
            snap.query = query.clone();

            if !query.is_enabled() {
                snap.status = SearchStatus::Idle;
                snap.results = Arc::new(Vec::new());
                snap.error = None;
                snap.is_fetching = false;
                begin = Begin::Done(Arc::clone(&snap.results));
                return;
            }

            let key = query.cache_key();
            match self.cache.read::<Arc<Vec<SearchResult>>>(&key) {
                CacheRead::Fresh(results) if !force => {
                    debug!(key = %key, "search cache hit");
                    snap.status = SearchStatus::Success;
                    snap.results = Arc::clone(&results);
                    snap.error = None;
                    snap.is_fetching = false;
                    begin = Begin::Done(results);
                    return;
                }
                CacheRead::Fresh(results) | CacheRead::Stale(results) => {
                    debug!(key = %key, force, "revalidating cached search");
                    snap.status = SearchStatus::Success;
                    snap.results = results;
                    snap.error = None;
                }
                CacheRead::Missing => {
                    debug!(key = %key, "search cache miss");
                    snap.status = SearchStatus::Loading;
                }
            }
            snap.is_fetching = true;

            let mut inflight = self.inflight.lock();
            if !force
                && let Some((_, rx)) = inflight.get(&key)
                && rx.has_changed().is_ok()
            {
                debug!(key = %key, seq, "joining in-flight search");
                begin = Begin::Join {
                    seq,
                    rx: rx.clone(),
                };
                return;
            }

            let (tx, rx) = watch::channel(None);
            inflight.insert(key.clone(), (seq, rx));
            begin = Begin::Fetch {
                seq,
                ticket: self.cache.begin_fetch(key),
                tx,
            };
        });

        begin
    }

    async fn finish(self: Arc<Self>, query: Query, begin: Begin) -> Outcome {
        match begin {
            Begin::Done(results) => Ok(results),
            Begin::Fetch { seq, ticket, tx } => self.fetch(query, seq, ticket, tx).await,
            Begin::Join { seq, mut rx } => {
                let outcome = match rx.wait_for(Option::is_some).await {
                    Ok(shared) => shared.clone(),
                    Err(_) => None,
                };
                let outcome = outcome.unwrap_or(Err(SearchError::Cancelled));
                self.apply(seq, &outcome);
                outcome
            }
        }
    }

    async fn fetch(
        &self,
        query: Query,
        seq: u64,
        ticket: FetchTicket,
        tx: watch::Sender<Option<Outcome>>,
    ) -> Outcome {
        debug!(mode = %query.mode, seq, "dispatching search");
        let outcome: Outcome = self
            .service
            .search(query.mode, &query.text)
            .await
            .map(Arc::new)
            .map_err(SearchError::from);

        let key = ticket.key().clone();
        if let Ok(results) = &outcome {
            self.cache.store(
                ticket,
                Arc::clone(results),
                self.config.stale_after_for(query.mode),
            );
        }
        {
            let mut inflight = self.inflight.lock();
            if inflight.get(&key).is_some_and(|(owner, _)| *owner == seq) {
                inflight.remove(&key);
            }
        }
        tx.send_replace(Some(outcome.clone()));

        self.apply(seq, &outcome);
        outcome
    }

    /// Publishes `outcome` if `seq` is still the latest request for the slot.
    fn apply(&self, seq: u64, outcome: &Outcome) {
        self.snapshot.send_if_modified(|snap| {
            if self.seq.load(Ordering::SeqCst) != seq {
                debug!(seq, latest = snap.seq, "discarding superseded search response");
                return false;
            }
            match outcome {
                Ok(results) => {
                    snap.status = SearchStatus::Success;
                    snap.results = Arc::clone(results);
                    snap.error = None;
                }
                Err(error) => {
                    snap.status = SearchStatus::Error;
                    snap.error = Some(error.clone());
                }
            }
            snap.is_fetching = false;
            true
        });
    }
}
