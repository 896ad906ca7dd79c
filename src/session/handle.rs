use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::error::{SessionError, SessionResult};
use super::types::{Backend, PageView};
use crate::api::{
    ApiResult, CreatedMemo, HttpBackend, MemoDraft, MemoId, MemoRecord, MemoUpdate,
    StatusResponse,
};
use crate::cache::{CacheKey, CacheRead, CacheValue, KeyScope, QueryCache, SharedCache};
use crate::config::Config;
use crate::job::{JobConfig, JobSnapshot, JobTracker, StartOutcome};
use crate::presenter::{Paginator, Selection, arrange};
use crate::search::{
    SearchConfig, SearchMode, SearchOrchestrator, SearchResultSet, SearchSnapshot,
};

#[derive(Debug, Default)]
struct View {
    pager: Paginator,
    selection: Selection<MemoId>,
}

/// One client session: a single cache shared by one search slot, one job tracker and
/// the memo reads, plus the presenter state of the result list.
///
/// Memo mutations go through the session so the affected cache keys are invalidated.
pub struct Session<B: Backend = HttpBackend> {
    backend: Arc<B>,
    cache: SharedCache,
    config: Config,
    search: SearchOrchestrator<B>,
    job: JobTracker<B>,
    view: Mutex<View>,
    refreshing: Arc<Mutex<HashSet<CacheKey>>>,
    refreshes: Mutex<JoinSet<()>>,
}

impl Session<HttpBackend> {
    /// Validates `config` and opens a session against its HTTP backend.
    pub fn connect(config: Config) -> SessionResult<Self> {
        config.validate()?;
        let backend = HttpBackend::new(&config)?;
        info!(api_root = %backend.api_root(), "session connected");
        Ok(Self::with_backend(Arc::new(backend), config))
    }
}

impl<B: Backend> Session<B> {
    /// Builds a session over any backend. Must be called inside a Tokio runtime.
    pub fn with_backend(backend: Arc<B>, config: Config) -> Self {
        let cache: SharedCache = Arc::new(QueryCache::with_capacity(config.cache_capacity));
        let search = SearchOrchestrator::new(
            Arc::clone(&backend),
            Arc::clone(&cache),
            SearchConfig::from(&config),
        );
        let job = JobTracker::new(
            Arc::clone(&backend),
            Arc::clone(&cache),
            JobConfig::from(&config),
        );

        Self {
            backend,
            cache,
            config,
            search,
            job,
            view: Mutex::new(View::default()),
            refreshing: Arc::new(Mutex::new(HashSet::new())),
            refreshes: Mutex::new(JoinSet::new()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn search(&self) -> &SearchOrchestrator<B> {
        &self.search
    }

    pub fn job(&self) -> &JobTracker<B> {
        &self.job
    }

    // Search and paging

    /// Records typed text and mode; the search follows after the debounce period.
    pub fn set_query(&self, text: impl Into<String>, mode: SearchMode) {
        self.search.set_query(text, mode);
    }

    /// Explicit submit: back to page 1, then search now.
    pub async fn submit(
        &self,
        text: impl Into<String>,
        mode: SearchMode,
    ) -> SessionResult<SearchResultSet> {
        self.view.lock().pager.reset();
        Ok(self.search.submit(text, mode).await?)
    }

    /// Re-issues the effective query regardless of freshness.
    pub async fn refetch(&self) -> SessionResult<SearchResultSet> {
        Ok(self.search.refetch().await?)
    }

    pub fn search_snapshot(&self) -> SearchSnapshot {
        self.search.snapshot()
    }

    /// The displayed results ordered for display, without paging.
    pub fn arranged_results(&self) -> SearchResultSet {
        let snapshot = self.search.snapshot();
        arrange(&snapshot.results, &snapshot.query.text)
    }

    /// Returns the current page of the displayed results.
    pub fn current_page(&self) -> PageView {
        let snapshot = self.search.snapshot();
        let results = arrange(&snapshot.results, &snapshot.query.text);

        let mut view = self.view.lock();
        view.pager.clamp(results.len());
        let page = view.pager.window(&results);
        let (number, total_pages, start, len) =
            (page.page, page.total_pages, page.start, page.items.len());

        PageView::new(Arc::clone(&results), number, total_pages, start, len)
            .with_status(snapshot.status, snapshot.error_message())
    }

    pub fn next_page(&self) -> usize {
        let count = self.search.snapshot().results.len();
        self.view.lock().pager.next(count)
    }

    pub fn prev_page(&self) -> usize {
        let count = self.search.snapshot().results.len();
        self.view.lock().pager.prev(count)
    }

    /// Jumps to `page`, clamped to the available pages.
    pub fn go_to_page(&self, page: usize) -> usize {
        let count = self.search.snapshot().results.len();
        self.view.lock().pager.go_to(page, count)
    }

    // Selection

    /// Selects a result, returning the previously selected id.
    pub fn select(&self, id: MemoId) -> Option<MemoId> {
        self.view.lock().selection.select(id)
    }

    pub fn selected(&self) -> Option<MemoId> {
        self.view.lock().selection.selected().cloned()
    }

    /// Clears the selection.
    pub fn dismiss(&self) -> Option<MemoId> {
        self.view.lock().selection.clear()
    }

    /// Reads the selected memo, if any.
    pub async fn selected_memo(&self) -> SessionResult<Option<Arc<MemoRecord>>> {
        match self.selected() {
            Some(id) => self.memo(&id).await.map(Some),
            None => Ok(None),
        }
    }

    // Reads

    /// Reads one memo. A stale cached copy is returned at once and refreshed in the
    /// background.
    #[instrument(skip(self, id), fields(memo = %id))]
    pub async fn memo(&self, id: &MemoId) -> SessionResult<Arc<MemoRecord>> {
        let owned = id.clone();
        self.read_through(CacheKey::memo(id), move |backend| async move {
            backend.get_memo(&owned).await.map(Arc::new)
        })
        .await
    }

    pub async fn categories(&self) -> SessionResult<Arc<Vec<String>>> {
        self.read_through(CacheKey::Categories, |backend| async move {
            backend.list_categories().await.map(Arc::new)
        })
        .await
    }

    pub async fn tags(&self) -> SessionResult<Arc<Vec<String>>> {
        self.read_through(CacheKey::Tags, |backend| async move {
            backend.list_tags().await.map(Arc::new)
        })
        .await
    }

    // Mutations

    /// Creates a memo. Invalidates every search and the category/tag listings.
    #[instrument(skip(self, draft), fields(title_len = draft.title.len()))]
    pub async fn create_memo(&self, draft: &MemoDraft) -> SessionResult<CreatedMemo> {
        if draft.is_blank() {
            return Err(SessionError::BlankDraft);
        }
        let created = self.backend.create_memo(draft).await?;

        self.cache.invalidate_scope(KeyScope::Search);
        self.cache.invalidate_scope(KeyScope::Catalog);
        info!(memo = %created.uuid, "memo created");
        Ok(created)
    }

    /// Updates a memo. Invalidates the memo, every search and the listings.
    #[instrument(skip(self, id, update), fields(memo = %id))]
    pub async fn update_memo(
        &self,
        id: &MemoId,
        update: &MemoUpdate,
    ) -> SessionResult<Arc<MemoRecord>> {
        let updated = Arc::new(self.backend.update_memo(id, update).await?);

        let key = CacheKey::memo(id);
        self.cache.invalidate(&key);
        // The response is the new record.
        self.cache
            .put(key, Arc::clone(&updated), self.config.record_stale_after);
        self.cache.invalidate_scope(KeyScope::Search);
        self.cache.invalidate_scope(KeyScope::Catalog);
        info!("memo updated");
        Ok(updated)
    }

    /// Deletes a memo and clears it from the selection.
    #[instrument(skip(self, id), fields(memo = %id))]
    pub async fn delete_memo(&self, id: &MemoId) -> SessionResult<StatusResponse> {
        let status = self.backend.delete_memo(id).await?;

        self.cache.remove(&CacheKey::memo(id));
        self.cache.invalidate_scope(KeyScope::Search);
        self.cache.invalidate_scope(KeyScope::Catalog);
        if self.view.lock().selection.clear_if(id) {
            debug!("deleted memo was selected, selection cleared");
        }
        info!(status = %status.status, "memo deleted");
        Ok(status)
    }

    // Indexing job

    pub async fn start_vectorize(&self) -> SessionResult<StartOutcome> {
        Ok(self.job.start().await?)
    }

    pub async fn rebuild_index(&self) -> SessionResult<StatusResponse> {
        Ok(self.job.rebuild_index().await?)
    }

    pub fn job_snapshot(&self) -> JobSnapshot {
        self.job.snapshot()
    }

    /// Stops the search slot, the job poller and background refreshes.
    pub fn shutdown(&self) {
        self.search.shutdown();
        self.job.shutdown();
        self.refreshes.lock().abort_all();
        debug!("session shut down");
    }

    async fn read_through<V, F, Fut>(&self, key: CacheKey, fetch: F) -> SessionResult<V>
    where
        V: CacheValue + Send + Sync + 'static,
        F: FnOnce(Arc<B>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ApiResult<V>> + Send + 'static,
    {
        match self.cache.read::<V>(&key) {
            CacheRead::Fresh(value) => {
                debug!(key = %key, "cache hit");
                Ok(value)
            }
            CacheRead::Stale(value) => {
                debug!(key = %key, "serving stale value, revalidating");
                self.revalidate(key, fetch);
                Ok(value)
            }
            CacheRead::Missing => {
                debug!(key = %key, "cache miss");
                let ticket = self.cache.begin_fetch(key);
                let value = fetch(Arc::clone(&self.backend)).await?;
                self.cache
                    .store(ticket, value.clone(), self.config.record_stale_after);
                Ok(value)
            }
        }
    }

    /// Refreshes `key` in the background. At most one refresh per key runs at a time.
    fn revalidate<V, F, Fut>(&self, key: CacheKey, fetch: F)
    where
        V: CacheValue + Send + Sync + 'static,
        F: FnOnce(Arc<B>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ApiResult<V>> + Send + 'static,
    {
        if !self.refreshing.lock().insert(key.clone()) {
            debug!(key = %key, "refresh already running");
            return;
        }

        let ticket = self.cache.begin_fetch(key.clone());
        let backend = Arc::clone(&self.backend);
        let cache = Arc::clone(&self.cache);
        let refreshing = Arc::clone(&self.refreshing);
        let stale_after = self.config.record_stale_after;

        let mut tasks = self.refreshes.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            match fetch(backend).await {
                Ok(value) => cache.store(ticket, value, stale_after),
                Err(e) if e.is_not_found() => {
                    // Gone upstream; stop serving the old value.
                    cache.remove(&key);
                    debug!(key = %key, "refreshed key no longer exists, value dropped");
                }
                Err(e) => warn!(key = %key, error = %e, "background refresh failed"),
            }
            refreshing.lock().remove(&key);
        });
    }
}

impl<B: Backend> std::fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_base_url", &self.config.api_base_url)
            .field("search", &self.search)
            .field("job", &self.job)
            .field("cached", &self.cache.len())
            .finish()
    }
}
