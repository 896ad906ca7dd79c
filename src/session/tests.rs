use super::*;
use crate::api::{
    ApiError, JobProgress, MemoDraft, MemoId, MemoRecord, MemoStore, MemoUpdate,
    MockBackend, SearchResult, memo_fixture,
};
use crate::cache::CacheKey;
use crate::config::Config;
use crate::job::{JobState, StartOutcome};
use crate::search::{SearchMode, SearchStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

type SearchHits = Arc<Vec<SearchResult>>;

fn notes(count: usize) -> Vec<MemoRecord> {
    (0..count)
        .map(|i| {
            memo_fixture(
                &format!("m{i:02}"),
                &format!("note {i}"),
                "body",
                "2024-01-01T00:00:00Z",
            )
        })
        .collect()
}

fn session_with(backend: &Arc<MockBackend>) -> Session<MockBackend> {
    Session::with_backend(Arc::clone(backend), Config::default())
}

fn page_ids(session: &Session<MockBackend>) -> Vec<String> {
    session
        .current_page()
        .items()
        .iter()
        .map(|r| r.id.to_string())
        .collect()
}

#[test]
fn test_connect_rejects_invalid_config() {
    let config = Config {
        api_base_url: "ftp://memos.local".to_string(),
        ..Config::default()
    };

    let err = Session::connect(config).unwrap_err();

    assert!(matches!(err, SessionError::Config(_)));
    assert!(err.api_error().is_none());
}

#[tokio::test]
async fn test_connect_builds_http_session() {
    let config = Config {
        api_base_url: "http://127.0.0.1:9/".to_string(),
        ..Config::default()
    };

    let session = Session::connect(config).unwrap();

    assert_eq!(session.backend().api_root(), "http://127.0.0.1:9/api");
    assert_eq!(session.job_snapshot().state, JobState::Idle);
    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_submit_resets_page_and_searches_now() {
    let backend = Arc::new(MockBackend::with_memos(notes(25)));
    let session = session_with(&backend);

    let results = session.submit("note", SearchMode::FullText).await.unwrap();
    assert_eq!(results.len(), 25);

    assert_eq!(session.go_to_page(3), 3);
    let page = session.current_page();
    assert_eq!(page.items().len(), 5);
    assert_eq!(page.total_pages, 3);
    assert!(!page.has_next());
    assert_eq!(session.go_to_page(4), 3);

    session.submit("note", SearchMode::FullText).await.unwrap();
    let page = session.current_page();
    assert_eq!(page.page, 1);
    assert_eq!(page.items().len(), 10);
    assert_eq!(backend.search_call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_page_keeps_backend_order() {
    let backend = Arc::new(MockBackend::new());
    let mut hits = notes(3);
    for (hit, score) in hits.iter_mut().zip([0.9, 0.95, 0.3]) {
        hit.score = score;
    }
    backend.script_search(SearchMode::Semantic, "note", Ok(hits));
    let session = session_with(&backend);

    session.submit("note", SearchMode::Semantic).await.unwrap();

    assert_eq!(page_ids(&session), vec!["m00", "m01", "m02"]);
}

#[tokio::test(start_paused = true)]
async fn test_typed_query_reaches_page_after_debounce() {
    let backend = Arc::new(MockBackend::with_memos(notes(12)));
    let session = session_with(&backend);

    session.set_query("note", SearchMode::Hybrid);
    assert!(session.current_page().is_empty());
    sleep(Duration::from_millis(400)).await;

    let page = session.current_page();
    assert_eq!(page.status, SearchStatus::Success);
    assert_eq!(page.total(), 12);
    assert_eq!(session.next_page(), 2);
    assert_eq!(session.current_page().items().len(), 2);
    assert_eq!(session.next_page(), 2);
    assert_eq!(session.prev_page(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_page_clamps_when_results_shrink() {
    let backend = Arc::new(MockBackend::with_memos(notes(25)));
    let session = session_with(&backend);
    session.submit("note", SearchMode::FullText).await.unwrap();
    session.go_to_page(3);

    session.submit("note 1", SearchMode::FullText).await.unwrap();
    session.go_to_page(2);
    let page = session.current_page();

    // "note 1" and "note 10".."note 19"
    assert_eq!(page.total(), 11);
    assert_eq!(page.page, 2);
    assert_eq!(page.items().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_search_error_keeps_page() {
    let backend = Arc::new(MockBackend::with_memos(notes(3)));
    backend.script_search(
        SearchMode::Semantic,
        "broken",
        Err(ApiError::Http {
            status: 503,
            body: "Service Unavailable".to_string(),
        }),
    );
    let session = session_with(&backend);
    session.submit("note", SearchMode::Semantic).await.unwrap();

    let err = session.submit("broken", SearchMode::Semantic).await.unwrap_err();

    assert_eq!(err.api_error().and_then(ApiError::status), Some(503));
    let page = session.current_page();
    assert_eq!(page.status, SearchStatus::Error);
    assert_eq!(page.total(), 3);
    assert!(page.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_selection_is_single_and_survives_paging() {
    let backend = Arc::new(MockBackend::with_memos(notes(15)));
    let session = session_with(&backend);
    session.submit("note", SearchMode::FullText).await.unwrap();

    assert_eq!(session.select(MemoId::new("m01")), None);
    assert_eq!(session.select(MemoId::new("m02")), Some(MemoId::new("m01")));
    session.next_page();

    assert_eq!(session.selected(), Some(MemoId::new("m02")));
    let memo = session.selected_memo().await.unwrap().unwrap();
    assert_eq!(memo.title, "note 2");

    assert_eq!(session.dismiss(), Some(MemoId::new("m02")));
    assert!(session.selected_memo().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_memo_reads_are_cached() {
    let backend = Arc::new(MockBackend::with_memos(notes(1)));
    let session = session_with(&backend);
    let id = MemoId::new("m00");

    let first = session.memo(&id).await.unwrap();
    let second = session.memo(&id).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(backend.memo_reads(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_memo_is_served_stale_then_refreshed() {
    let backend = Arc::new(MockBackend::with_memos(notes(1)));
    let session = session_with(&backend);
    let id = MemoId::new("m00");
    session.memo(&id).await.unwrap();

    backend.insert_memo(memo_fixture("m00", "edited elsewhere", "body", "2024-01-01"));
    sleep(Duration::from_secs(301)).await;

    let (a, b) = tokio::join!(session.memo(&id), session.memo(&id));
    assert_eq!(a.unwrap().title, "note 0");
    assert_eq!(b.unwrap().title, "note 0");

    sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.memo_reads(), 2);
    assert_eq!(session.memo(&id).await.unwrap().title, "edited elsewhere");
    assert_eq!(backend.memo_reads(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_memo_deleted_elsewhere_stops_being_served() {
    let backend = Arc::new(MockBackend::with_memos(notes(1)));
    let session = session_with(&backend);
    let id = MemoId::new("m00");
    session.memo(&id).await.unwrap();

    backend.delete_memo(&id).await.unwrap();
    sleep(Duration::from_secs(301)).await;

    assert_eq!(session.memo(&id).await.unwrap().title, "note 0");
    sleep(Duration::from_millis(1)).await;
    assert!(session.memo(&id).await.unwrap_err().is_not_found());
    assert_eq!(backend.memo_reads(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_missing_memo_is_not_found() {
    let backend = Arc::new(MockBackend::new());
    let session = session_with(&backend);

    let err = session.memo(&MemoId::new("nope")).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!session.cache().contains(&CacheKey::memo(&MemoId::new("nope"))));
}

#[tokio::test(start_paused = true)]
async fn test_create_invalidates_searches_and_listings() {
    let backend = Arc::new(MockBackend::with_memos(notes(2)));
    let session = session_with(&backend);
    session.submit("note", SearchMode::FullText).await.unwrap();
    assert!(session.categories().await.unwrap().is_empty());
    assert_eq!(backend.listing_calls(), 1);

    let draft = MemoDraft::from_form("work", "note 2", "rust, async", "new body");
    let created = session.create_memo(&draft).await.unwrap();

    let key = CacheKey::search(SearchMode::FullText, "note");
    assert!(session.cache().read::<SearchHits>(&key).is_stale());
    assert!(backend.stored_memo(&created.uuid).is_some());

    // Stale listing first, fresh one after the background refresh.
    assert!(session.categories().await.unwrap().is_empty());
    sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.listing_calls(), 2);
    assert_eq!(*session.categories().await.unwrap(), vec!["work".to_string()]);
    assert_eq!(
        *session.tags().await.unwrap(),
        vec!["async".to_string(), "rust".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_draft_is_rejected() {
    let backend = Arc::new(MockBackend::new());
    let session = session_with(&backend);

    let err = session
        .create_memo(&MemoDraft::from_form(" ", "", " , ", "\n"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::BlankDraft));
    assert_eq!(backend.memo_writes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_update_refreshes_memo_and_invalidates_searches() {
    let backend = Arc::new(MockBackend::with_memos(notes(1)));
    let session = session_with(&backend);
    let id = MemoId::new("m00");
    session.memo(&id).await.unwrap();
    session.submit("note", SearchMode::Semantic).await.unwrap();

    let update = MemoUpdate {
        title: "renamed".to_string(),
        body: "rewritten".to_string(),
    };
    let updated = session.update_memo(&id, &update).await.unwrap();

    assert_eq!(updated.title, "renamed");
    assert_eq!(session.memo(&id).await.unwrap().body, "rewritten");
    assert_eq!(backend.memo_reads(), 1);
    let key = CacheKey::search(SearchMode::Semantic, "note");
    assert!(session.cache().read::<SearchHits>(&key).is_stale());
}

#[tokio::test(start_paused = true)]
async fn test_delete_clears_selection_and_invalidates() {
    let backend = Arc::new(MockBackend::with_memos(notes(2)));
    let session = session_with(&backend);
    let id = MemoId::new("m01");
    session.memo(&id).await.unwrap();
    session.submit("note", SearchMode::FullText).await.unwrap();
    session.select(id.clone());

    let status = session.delete_memo(&id).await.unwrap();

    assert_eq!(status.status, "deleted");
    assert_eq!(session.selected(), None);
    assert!(
        session
            .cache()
            .read::<Arc<MemoRecord>>(&CacheKey::memo(&id))
            .is_missing()
    );
    assert!(session.memo(&id).await.unwrap_err().is_not_found());
    sleep(Duration::from_secs(600)).await;
    assert!(session.memo(&id).await.unwrap_err().is_not_found());
    assert_eq!(backend.memo_reads(), 3);

    let results = session.refetch().await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_keeps_other_selection() {
    let backend = Arc::new(MockBackend::with_memos(notes(2)));
    let session = session_with(&backend);
    session.select(MemoId::new("m00"));

    session.delete_memo(&MemoId::new("m01")).await.unwrap();

    assert_eq!(session.selected(), Some(MemoId::new("m00")));
}

#[tokio::test(start_paused = true)]
async fn test_vectorize_runs_through_session() {
    let backend = Arc::new(MockBackend::new());
    backend.script_progress([JobProgress::new(1, 2), JobProgress::new(2, 2)]);
    let session = session_with(&backend);

    let outcome = session.start_vectorize().await.unwrap();
    assert!(matches!(outcome, StartOutcome::Started { .. }));
    let settled = session.job().settled().await;

    assert_eq!(settled.state, JobState::Complete);
    assert!(settled.completion_notice());
    assert_eq!(session.rebuild_index().await.unwrap().status, "rebuilt");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_background_work() {
    let backend = Arc::new(MockBackend::with_memos(notes(3)));
    backend.script_progress([JobProgress::new(0, 5)]);
    let session = session_with(&backend);
    session.start_vectorize().await.unwrap();
    session.set_query("note", SearchMode::Semantic);

    session.shutdown();
    let polls = backend.progress_calls();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(backend.search_call_count(), 0);
    assert_eq!(backend.progress_calls(), polls);
    assert_eq!(session.job_snapshot().state, JobState::Idle);
    assert!(!session.job_snapshot().is_vectorizing());
}
