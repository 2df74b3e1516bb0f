//! Canonical document list with probe-gated background refresh
//!
//! `DataStore` owns the messages the search engine indexes. A refresh
//! cycle probes the upstream total, skips cheaply when nothing changed,
//! and otherwise re-fetches the full collection page by page with retry
//! and backoff. Successful cycles publish the new list and invoke the
//! registered hook so the index rebuilds; failed cycles after the first
//! successful one leave the previous state untouched.
//!
//! Refreshes are serialized by an internal mutex, so the periodic loop
//! and externally forced refreshes never interleave. Read accessors go
//! through a separate state lock and never wait on network I/O.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::model::Message;
use crate::sync::source::{MessagePage, MessageSource, SourceError};

/// Hook invoked with the freshly published document list after every
/// successful refresh
pub type RefreshHook = Arc<dyn Fn(Arc<Vec<Message>>) + Send + Sync>;

/// Tuning knobs for the refresh cycle
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Items requested per page during a full fetch
    pub page_size: usize,
    /// Attempts per page before the cycle fails
    pub max_retries: u32,
    /// Backoff unit; attempt n waits `retry_base_delay << n`
    pub retry_base_delay: Duration,
    /// Pause between consecutive page fetches
    pub page_delay: Duration,
    /// Hard cap on fetched documents; larger upstreams are truncated
    pub max_records: usize,
    /// Period of the background refresh loop
    pub refresh_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            page_delay: Duration::from_millis(50),
            max_records: 50_000,
            refresh_interval: Duration::from_secs(300),
        }
    }
}

#[derive(Debug)]
struct StoreState {
    messages: Arc<Vec<Message>>,
    last_total: usize,
    last_refresh: Option<DateTime<Utc>>,
    ready: bool,
}

struct BackgroundTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// In-memory document store with incremental upstream sync
pub struct DataStore {
    source: Arc<dyn MessageSource>,
    config: SyncConfig,
    state: RwLock<StoreState>,
    /// Serializes the periodic loop against forced refreshes
    refresh_lock: Mutex<()>,
    on_refresh: Option<RefreshHook>,
    background: parking_lot::Mutex<Option<BackgroundTask>>,
}

impl DataStore {
    pub fn new(source: Arc<dyn MessageSource>, config: SyncConfig) -> Self {
        Self {
            source,
            config,
            state: RwLock::new(StoreState {
                messages: Arc::new(Vec::new()),
                last_total: 0,
                last_refresh: None,
                ready: false,
            }),
            refresh_lock: Mutex::new(()),
            on_refresh: None,
            background: parking_lot::Mutex::new(None),
        }
    }

    /// Register the hook that receives each successfully published list
    ///
    /// Call during wiring, before the store is shared.
    pub fn set_on_refresh(&mut self, hook: RefreshHook) {
        self.on_refresh = Some(hook);
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether at least one refresh has published a document list
    pub async fn is_ready(&self) -> bool {
        self.state.read().await.ready
    }

    pub async fn total_documents(&self) -> usize {
        self.state.read().await.messages.len()
    }

    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_refresh
    }

    /// The currently published document list
    pub async fn messages(&self) -> Arc<Vec<Message>> {
        self.state.read().await.messages.clone()
    }

    /// Run one refresh cycle
    ///
    /// Returns Ok(true) when a new document list was published, Ok(false)
    /// when the cycle was skipped or failed after the store was already
    /// ready. Errors escape only while the store has never been ready,
    /// making the bootstrap call fail hard instead of serving nothing.
    pub async fn refresh(&self, force: bool) -> Result<bool, SourceError> {
        let _guard = self.refresh_lock.lock().await;
        tracing::debug!(force, "checking upstream for changes");

        let (ready, last_total) = {
            let state = self.state.read().await;
            (state.ready, state.last_total)
        };

        let remote_total = match self.source.total().await {
            Ok(total) => total,
            Err(err) => {
                if !ready {
                    return Err(err);
                }
                tracing::warn!(error = %err, "change probe failed, skipping refresh");
                return Ok(false);
            }
        };

        if !force && ready && remote_total == last_total {
            tracing::debug!(total = remote_total, "no upstream changes detected");
            return Ok(false);
        }

        tracing::info!(
            remote_total,
            local_total = last_total,
            "changes detected, fetching upstream collection"
        );

        let messages = match self.fetch_all().await {
            Ok(messages) => messages,
            Err(err) => {
                if !ready {
                    return Err(err);
                }
                tracing::error!(error = %err, "refresh failed, keeping previous documents");
                return Ok(false);
            }
        };

        let count = messages.len();
        let published = Arc::new(messages);
        {
            let mut state = self.state.write().await;
            state.messages = published.clone();
            state.last_total = count;
            state.last_refresh = Some(Utc::now());
            state.ready = true;
        }
        tracing::info!(messages = count, "published refreshed document list");

        if let Some(hook) = &self.on_refresh {
            hook(published);
        }
        Ok(true)
    }

    /// Fetch the whole collection page by page
    ///
    /// Stops when a page comes back empty, when the upstream closes
    /// pagination with a terminal status, or when the record cap is
    /// reached. The reported total is read from the first page, matching
    /// the upstream's own pagination contract.
    async fn fetch_all(&self) -> Result<Vec<Message>, SourceError> {
        let mut messages: Vec<Message> = Vec::new();
        let mut skip = 0;
        let limit = self.config.page_size;
        let mut total: Option<usize> = None;

        loop {
            let Some(page) = self.fetch_page_with_retry(skip, limit).await? else {
                // upstream closed pagination; what we have is the result
                break;
            };
            if page.items.is_empty() {
                break;
            }
            messages.extend(page.items);

            if total.is_none() {
                total = Some(page.total);
                if page.total > self.config.max_records {
                    tracing::warn!(
                        remote_total = page.total,
                        max_records = self.config.max_records,
                        "upstream exceeds record cap, truncating"
                    );
                }
            }

            skip += limit;
            if skip >= total.unwrap_or(0).min(self.config.max_records) {
                break;
            }

            if !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
        }

        Ok(messages)
    }

    /// Fetch one page, retrying transient failures with exponential
    /// backoff
    ///
    /// Ok(None) means the upstream answered with a terminal status and
    /// pagination must stop without retrying. Decode failures and
    /// exhausted retries propagate and fail the whole cycle.
    async fn fetch_page_with_retry(
        &self,
        skip: usize,
        limit: usize,
    ) -> Result<Option<MessagePage>, SourceError> {
        let mut attempt: u32 = 0;
        loop {
            match self.source.fetch_page(skip, limit).await {
                Ok(page) => return Ok(Some(page)),
                Err(SourceError::Terminal(status)) => {
                    tracing::warn!(status, skip, "upstream closed pagination");
                    return Ok(None);
                }
                Err(err) if err.is_transient() && attempt + 1 < self.config.max_retries => {
                    let delay = self.config.retry_base_delay * (1 << attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        skip,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "page fetch failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Start the periodic refresh loop
    ///
    /// The first scheduled cycle runs one full interval after this call;
    /// the bootstrap refresh is expected to have happened already.
    /// Starting twice is a no-op.
    pub fn start_background_refresh(self: &Arc<Self>) {
        let mut guard = self.background.lock();
        if guard.is_some() {
            return;
        }

        let (stop, mut stop_rx) = watch::channel(false);
        let store = Arc::clone(self);
        let interval = self.config.refresh_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // consume the immediate first tick so the loop waits a full
            // interval before its first cycle
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match store.refresh(false).await {
                            Ok(true) => tracing::info!("scheduled refresh applied changes"),
                            Ok(false) => tracing::debug!("scheduled refresh found no changes"),
                            Err(err) => tracing::warn!(error = %err, "scheduled refresh failed"),
                        }
                    }
                    _ = stop_rx.changed() => break,
                }
            }
        });

        *guard = Some(BackgroundTask { stop, handle });
        tracing::info!(
            interval_secs = interval.as_secs(),
            "background refresh started"
        );
    }

    /// Stop the periodic loop, returning its task handle for awaiting
    ///
    /// A pending timer wakes immediately; a cycle already in flight runs
    /// to completion before the task exits.
    pub fn stop_background_refresh(&self) -> Option<JoinHandle<()>> {
        let task = self.background.lock().take()?;
        let _ = task.stop.send(true);
        tracing::info!("background refresh stopping");
        Some(task.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn msg(id: usize) -> Message {
        Message::new(
            id.to_string(),
            format!("u-{id}"),
            "John Doe",
            format!("message number {id}"),
        )
        .timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(id as i64))
    }

    fn dataset(n: usize) -> Vec<Message> {
        (1..=n).map(msg).collect()
    }

    /// Source serving a fixed dataset in slices, with a scriptable queue
    /// of per-page outcomes consumed before each page is answered.
    struct ScriptedSource {
        items: parking_lot::Mutex<Vec<Message>>,
        /// outcome queue for page fetches (probes are unaffected);
        /// Ok(()) serves the page, Err returns that error once
        script: parking_lot::Mutex<VecDeque<Result<(), SourceError>>>,
        probe_failure: parking_lot::Mutex<Option<SourceError>>,
        page_calls: parking_lot::Mutex<Vec<(usize, usize)>>,
        probe_calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(items: Vec<Message>) -> Self {
            Self {
                items: parking_lot::Mutex::new(items),
                script: parking_lot::Mutex::new(VecDeque::new()),
                probe_failure: parking_lot::Mutex::new(None),
                page_calls: parking_lot::Mutex::new(Vec::new()),
                probe_calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn set_items(&self, items: Vec<Message>) {
            *self.items.lock() = items;
        }

        fn push_outcomes(&self, outcomes: Vec<Result<(), SourceError>>) {
            self.script.lock().extend(outcomes);
        }

        fn fail_probe(&self, err: SourceError) {
            *self.probe_failure.lock() = Some(err);
        }

        fn page_call_count(&self) -> usize {
            self.page_calls.lock().len()
        }
    }

    #[async_trait]
    impl MessageSource for ScriptedSource {
        async fn fetch_page(&self, skip: usize, limit: usize) -> Result<MessagePage, SourceError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let result = self.answer(skip, limit);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    impl ScriptedSource {
        fn answer(&self, skip: usize, limit: usize) -> Result<MessagePage, SourceError> {
            let items = self.items.lock();
            // limit 1 is the store's change probe
            if limit == 1 {
                self.probe_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(err) = self.probe_failure.lock().take() {
                    return Err(err);
                }
                return Ok(MessagePage {
                    items: Vec::new(),
                    total: items.len(),
                });
            }

            self.page_calls.lock().push((skip, limit));
            if let Some(outcome) = self.script.lock().pop_front() {
                outcome?;
            }

            let slice: Vec<Message> = items.iter().skip(skip).take(limit).cloned().collect();
            Ok(MessagePage {
                items: slice,
                total: items.len(),
            })
        }
    }

    fn fast_config(page_size: usize) -> SyncConfig {
        SyncConfig {
            page_size,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1),
            page_delay: Duration::ZERO,
            max_records: 50_000,
            refresh_interval: Duration::from_secs(300),
        }
    }

    fn store_over(source: Arc<ScriptedSource>, config: SyncConfig) -> DataStore {
        DataStore::new(source, config)
    }

    #[tokio::test]
    async fn test_bootstrap_refresh_publishes_documents() {
        let source = Arc::new(ScriptedSource::new(dataset(5)));
        let store = store_over(source.clone(), fast_config(100));

        assert!(!store.is_ready().await);
        let changed = store.refresh(true).await.unwrap();

        assert!(changed);
        assert!(store.is_ready().await);
        assert_eq!(store.total_documents().await, 5);
        assert!(store.last_refresh().await.is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_probe_failure_propagates() {
        let source = Arc::new(ScriptedSource::new(dataset(3)));
        source.fail_probe(SourceError::Unavailable);
        let store = store_over(source.clone(), fast_config(100));

        let err = store.refresh(true).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable));
        assert!(!store.is_ready().await);
        assert_eq!(source.page_call_count(), 0);
    }

    #[tokio::test]
    async fn test_steady_state_probe_failure_keeps_previous_documents() {
        let source = Arc::new(ScriptedSource::new(dataset(4)));
        let store = store_over(source.clone(), fast_config(100));
        store.refresh(true).await.unwrap();

        source.fail_probe(SourceError::Timeout);
        let changed = store.refresh(true).await.unwrap();

        assert!(!changed);
        assert!(store.is_ready().await);
        assert_eq!(store.total_documents().await, 4);
    }

    #[tokio::test]
    async fn test_unchanged_total_skips_fetch() {
        let source = Arc::new(ScriptedSource::new(dataset(6)));
        let store = store_over(source.clone(), fast_config(100));
        store.refresh(true).await.unwrap();
        let pages_after_bootstrap = source.page_call_count();

        let changed = store.refresh(false).await.unwrap();

        assert!(!changed);
        // probe ran, but no page was requested
        assert_eq!(source.page_call_count(), pages_after_bootstrap);
        assert!(source.probe_calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_changed_total_triggers_fetch() {
        let source = Arc::new(ScriptedSource::new(dataset(3)));
        let store = store_over(source.clone(), fast_config(100));
        store.refresh(true).await.unwrap();

        source.set_items(dataset(8));
        let changed = store.refresh(false).await.unwrap();

        assert!(changed);
        assert_eq!(store.total_documents().await, 8);
    }

    #[tokio::test]
    async fn test_force_refetches_despite_unchanged_total() {
        let source = Arc::new(ScriptedSource::new(dataset(3)));
        let store = store_over(source.clone(), fast_config(100));
        store.refresh(true).await.unwrap();
        let pages_after_bootstrap = source.page_call_count();

        let changed = store.refresh(true).await.unwrap();

        assert!(changed);
        assert!(source.page_call_count() > pages_after_bootstrap);
    }

    #[tokio::test]
    async fn test_page_retry_succeeds_on_third_attempt() {
        let source = Arc::new(ScriptedSource::new(dataset(2)));
        source.push_outcomes(vec![
            Err(SourceError::Status(500)),
            Err(SourceError::Timeout),
            Ok(()),
        ]);
        let store = store_over(source.clone(), fast_config(100));

        let changed = store.refresh(true).await.unwrap();

        assert!(changed);
        assert_eq!(store.total_documents().await, 2);
        // exactly three attempts for the first page
        assert_eq!(source.page_call_count(), 3);
    }

    #[tokio::test]
    async fn test_page_retries_exhausted_fails_bootstrap() {
        let source = Arc::new(ScriptedSource::new(dataset(2)));
        source.push_outcomes(vec![
            Err(SourceError::Status(500)),
            Err(SourceError::Status(502)),
            Err(SourceError::Status(503)),
        ]);
        let store = store_over(source.clone(), fast_config(100));

        let err = store.refresh(true).await.unwrap_err();
        assert!(matches!(err, SourceError::Status(503)));
        assert_eq!(source.page_call_count(), 3);
        assert!(!store.is_ready().await);
    }

    #[tokio::test]
    async fn test_terminal_status_stops_pagination_without_retry() {
        let source = Arc::new(ScriptedSource::new(dataset(6)));
        // first page succeeds, second hits a rate limit
        source.push_outcomes(vec![Ok(()), Err(SourceError::Terminal(429))]);
        let store = store_over(source.clone(), fast_config(2));

        let changed = store.refresh(true).await.unwrap();

        assert!(changed);
        // the two documents from the first page are accepted as final
        assert_eq!(store.total_documents().await, 2);
        // page 2 was attempted exactly once
        assert_eq!(source.page_call_count(), 2);
    }

    #[tokio::test]
    async fn test_record_cap_truncates_fetch() {
        let source = Arc::new(ScriptedSource::new(dataset(10)));
        let mut config = fast_config(2);
        config.max_records = 4;
        let store = store_over(source.clone(), config);

        store.refresh(true).await.unwrap();

        assert_eq!(store.total_documents().await, 4);
        assert_eq!(source.page_call_count(), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_aborts_bootstrap() {
        let source = Arc::new(ScriptedSource::new(dataset(4)));
        source.push_outcomes(vec![Err(SourceError::Decode("bad payload".into()))]);
        let store = store_over(source.clone(), fast_config(100));

        let err = store.refresh(true).await.unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
        // no retry for validation failures
        assert_eq!(source.page_call_count(), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_after_ready_keeps_previous_documents() {
        let source = Arc::new(ScriptedSource::new(dataset(4)));
        let store = store_over(source.clone(), fast_config(100));
        store.refresh(true).await.unwrap();

        source.set_items(dataset(9));
        source.push_outcomes(vec![Err(SourceError::Decode("bad payload".into()))]);
        let changed = store.refresh(true).await.unwrap();

        assert!(!changed);
        assert_eq!(store.total_documents().await, 4);
    }

    #[tokio::test]
    async fn test_empty_upstream_publishes_empty_list() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let store = store_over(source.clone(), fast_config(100));

        let changed = store.refresh(true).await.unwrap();

        assert!(changed);
        assert!(store.is_ready().await);
        assert_eq!(store.total_documents().await, 0);
    }

    #[tokio::test]
    async fn test_refresh_hook_receives_published_list() {
        let source = Arc::new(ScriptedSource::new(dataset(3)));
        let seen: Arc<parking_lot::Mutex<Option<Arc<Vec<Message>>>>> =
            Arc::new(parking_lot::Mutex::new(None));

        let mut store = store_over(source.clone(), fast_config(100));
        let sink = seen.clone();
        store.set_on_refresh(Arc::new(move |docs| {
            *sink.lock() = Some(docs);
        }));
        let store = Arc::new(store);

        store.refresh(true).await.unwrap();

        let delivered = seen.lock().clone().unwrap();
        assert_eq!(delivered.len(), 3);
        // the hook sees the same list the store now serves
        assert!(Arc::ptr_eq(&delivered, &store.messages().await));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_are_serialized() {
        let source = Arc::new(
            ScriptedSource::new(dataset(6)).with_delay(Duration::from_millis(5)),
        );
        let store = Arc::new(store_over(source.clone(), fast_config(2)));

        let a = store.clone();
        let b = store.clone();
        let (ra, rb) = tokio::join!(a.refresh(true), b.refresh(true));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_background_loop_refreshes_and_stops() {
        let source = Arc::new(ScriptedSource::new(dataset(2)));
        let mut config = fast_config(100);
        config.refresh_interval = Duration::from_millis(20);
        let store = Arc::new(store_over(source.clone(), config));
        store.refresh(true).await.unwrap();

        store.start_background_refresh();
        tokio::time::sleep(Duration::from_millis(70)).await;

        let probes_while_running = source.probe_calls.load(Ordering::SeqCst);
        assert!(
            probes_while_running >= 2,
            "expected scheduled probes, saw {probes_while_running}"
        );

        let handle = store.stop_background_refresh().unwrap();
        handle.await.unwrap();

        let probes_at_stop = source.probe_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(source.probe_calls.load(Ordering::SeqCst), probes_at_stop);
    }

    #[tokio::test]
    async fn test_start_background_refresh_twice_is_noop() {
        let source = Arc::new(ScriptedSource::new(dataset(1)));
        let store = Arc::new(store_over(source, fast_config(100)));

        store.start_background_refresh();
        store.start_background_refresh();

        let handle = store.stop_background_refresh().unwrap();
        handle.await.unwrap();
        assert!(store.stop_background_refresh().is_none());
    }
}
