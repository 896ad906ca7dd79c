//! In-memory scripted backend for tests and offline demos.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::error::{ApiError, ApiResult};
use super::model::{
    CreatedMemo, JobProgress, MemoDraft, MemoId, MemoRecord, MemoUpdate, SearchResult,
    StatusResponse, timestamp,
};
use super::service::{IndexingJobService, MemoStore, SearchService};
use crate::search::SearchMode;

#[derive(Debug, Clone)]
/// One scripted search response.
pub struct ScriptedSearch {
    /// Simulated latency before the response is returned.
    pub delay: Duration,
    /// Response to return.
    pub result: ApiResult<Vec<SearchResult>>,
}

/// Builds a memo record for fixtures. `created_at` is any timestamp the backend could send.
///
/// # Panics
///
/// Panics if `created_at` is not a parseable timestamp.
pub fn memo_fixture(id: &str, title: &str, body: &str, created_at: &str) -> MemoRecord {
    MemoRecord {
        id: MemoId::new(id),
        title: title.to_string(),
        snippet: String::new(),
        body: body.to_string(),
        category: String::new(),
        tags: Vec::new(),
        created_at: timestamp::parse(created_at).expect("fixture timestamp must parse"),
        score: 0.0,
    }
}

/// Scripted implementation of all three backend services.
///
/// Searches without a script fall back to a case-insensitive substring match over the
/// stored memos. Progress readings are served from a queue; the last reading repeats.
#[derive(Default)]
pub struct MockBackend {
    search_scripts: Mutex<HashMap<(SearchMode, String), VecDeque<ScriptedSearch>>>,
    search_calls: Mutex<Vec<(SearchMode, String)>>,

    memos: Mutex<Vec<MemoRecord>>,
    memo_reads: AtomicUsize,
    memo_writes: AtomicUsize,
    listing_calls: AtomicUsize,

    progress_script: Mutex<VecDeque<ApiResult<JobProgress>>>,
    last_progress: Mutex<JobProgress>,
    progress_calls: AtomicUsize,

    start_delay: Mutex<Duration>,
    start_failures: Mutex<VecDeque<ApiError>>,
    start_calls: AtomicUsize,
    rebuild_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with memos.
    pub fn with_memos(memos: impl IntoIterator<Item = MemoRecord>) -> Self {
        let backend = Self::new();
        backend.memos.lock().extend(memos);
        backend
    }

    /// Queues an immediate response for `(mode, text)`.
    pub fn script_search(&self, mode: SearchMode, text: &str, result: ApiResult<Vec<SearchResult>>) {
        self.script_search_delayed(mode, text, Duration::ZERO, result);
    }

    /// Queues a delayed response for `(mode, text)`. The last queued response repeats.
    pub fn script_search_delayed(
        &self,
        mode: SearchMode,
        text: &str,
        delay: Duration,
        result: ApiResult<Vec<SearchResult>>,
    ) {
        self.search_scripts
            .lock()
            .entry((mode, text.to_string()))
            .or_default()
            .push_back(ScriptedSearch { delay, result });
    }

    /// Every search call received, in arrival order.
    pub fn search_calls(&self) -> Vec<(SearchMode, String)> {
        self.search_calls.lock().clone()
    }

    pub fn search_call_count(&self) -> usize {
        self.search_calls.lock().len()
    }

    /// Stores a memo directly, bypassing `create_memo`.
    pub fn insert_memo(&self, memo: MemoRecord) {
        let mut memos = self.memos.lock();
        memos.retain(|m| m.id != memo.id);
        memos.push(memo);
    }

    /// Returns the stored memo with `id`.
    pub fn stored_memo(&self, id: &MemoId) -> Option<MemoRecord> {
        self.memos.lock().iter().find(|m| &m.id == id).cloned()
    }

    pub fn memo_count(&self) -> usize {
        self.memos.lock().len()
    }

    /// `get_memo` calls received.
    pub fn memo_reads(&self) -> usize {
        self.memo_reads.load(Ordering::SeqCst)
    }

    /// `create_memo`, `update_memo` and `delete_memo` calls received.
    pub fn memo_writes(&self) -> usize {
        self.memo_writes.load(Ordering::SeqCst)
    }

    /// `list_categories` and `list_tags` calls received.
    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    /// Queues progress readings in order.
    pub fn script_progress(&self, readings: impl IntoIterator<Item = JobProgress>) {
        self.progress_script
            .lock()
            .extend(readings.into_iter().map(Ok));
    }

    /// Queues a failed progress poll.
    pub fn script_progress_error(&self, error: ApiError) {
        self.progress_script.lock().push_back(Err(error));
    }

    pub fn progress_calls(&self) -> usize {
        self.progress_calls.load(Ordering::SeqCst)
    }

    /// Simulated latency of `start_incremental`.
    pub fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock() = delay;
    }

    /// Makes the next `start_incremental` call fail with `error`.
    pub fn fail_next_start(&self, error: ApiError) {
        self.start_failures.lock().push_back(error);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn rebuild_calls(&self) -> usize {
        self.rebuild_calls.load(Ordering::SeqCst)
    }

    fn next_scripted_search(&self, mode: SearchMode, text: &str) -> Option<ScriptedSearch> {
        let mut scripts = self.search_scripts.lock();
        let queue = scripts.get_mut(&(mode, text.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn substring_search(&self, text: &str) -> Vec<SearchResult> {
        let needle = text.to_lowercase();
        self.memos
            .lock()
            .iter()
            .filter_map(|memo| {
                let in_title = memo.title.to_lowercase().contains(&needle);
                let in_body = memo.body.to_lowercase().contains(&needle);
                if !(in_title || in_body) {
                    return None;
                }
                let mut hit = memo.clone();
                hit.score = if in_title { 1.0 } else { 0.5 };
                Some(hit)
            })
            .collect()
    }

    fn not_found(id: &MemoId) -> ApiError {
        ApiError::Http {
            status: 404,
            body: format!("memo {id} not found"),
        }
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("memos", &self.memo_count())
            .field("search_calls", &self.search_call_count())
            .field("start_calls", &self.start_calls())
            .field("progress_calls", &self.progress_calls())
            .finish()
    }
}

#[async_trait]
impl SearchService for MockBackend {
    async fn search(&self, mode: SearchMode, query: &str) -> ApiResult<Vec<SearchResult>> {
        self.search_calls.lock().push((mode, query.to_string()));

        match self.next_scripted_search(mode, query) {
            Some(script) => {
                if !script.delay.is_zero() {
                    tokio::time::sleep(script.delay).await;
                }
                script.result
            }
            None => Ok(self.substring_search(query)),
        }
    }
}

#[async_trait]
impl MemoStore for MockBackend {
    async fn create_memo(&self, draft: &MemoDraft) -> ApiResult<CreatedMemo> {
        self.memo_writes.fetch_add(1, Ordering::SeqCst);

        let id = MemoId::new(uuid::Uuid::new_v4().to_string());
        self.memos.lock().push(MemoRecord {
            id: id.clone(),
            title: draft.title.clone(),
            snippet: String::new(),
            body: draft.body.clone(),
            category: draft.category.clone(),
            tags: draft.tags.clone(),
            created_at: Utc::now(),
            score: 0.0,
        });

        Ok(CreatedMemo {
            uuid: id,
            status: "ok".to_string(),
        })
    }

    async fn get_memo(&self, id: &MemoId) -> ApiResult<MemoRecord> {
        self.memo_reads.fetch_add(1, Ordering::SeqCst);
        self.stored_memo(id).ok_or_else(|| Self::not_found(id))
    }

    async fn update_memo(&self, id: &MemoId, update: &MemoUpdate) -> ApiResult<MemoRecord> {
        self.memo_writes.fetch_add(1, Ordering::SeqCst);

        let mut memos = self.memos.lock();
        let memo = memos
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        memo.title = update.title.clone();
        memo.body = update.body.clone();
        Ok(memo.clone())
    }

    async fn delete_memo(&self, id: &MemoId) -> ApiResult<StatusResponse> {
        self.memo_writes.fetch_add(1, Ordering::SeqCst);

        let mut memos = self.memos.lock();
        let before = memos.len();
        memos.retain(|m| &m.id != id);
        if memos.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(StatusResponse {
            status: "deleted".to_string(),
        })
    }

    async fn list_categories(&self) -> ApiResult<Vec<String>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        let names: BTreeSet<String> = self
            .memos
            .lock()
            .iter()
            .map(|m| m.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn list_tags(&self) -> ApiResult<Vec<String>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        let names: BTreeSet<String> = self
            .memos
            .lock()
            .iter()
            .flat_map(|m| m.tags.iter().cloned())
            .collect();
        Ok(names.into_iter().collect())
    }
}

#[async_trait]
impl IndexingJobService for MockBackend {
    async fn start_incremental(&self) -> ApiResult<StatusResponse> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.start_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.start_failures.lock().pop_front() {
            return Err(error);
        }
        Ok(StatusResponse {
            status: "started".to_string(),
        })
    }

    async fn progress(&self) -> ApiResult<JobProgress> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);

        let next = self.progress_script.lock().pop_front();
        match next {
            Some(Ok(reading)) => {
                *self.last_progress.lock() = reading;
                Ok(reading)
            }
            Some(Err(error)) => Err(error),
            None => Ok(*self.last_progress.lock()),
        }
    }

    async fn rebuild(&self) -> ApiResult<StatusResponse> {
        self.rebuild_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatusResponse {
            status: "rebuilt".to_string(),
        })
    }
}
