//! The document cache.

use crate::observer::{CacheObserver, EventSink};
use crate::queue::{SaveJob, SaveQueue};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sheetbase_client::DocumentRemote;
use sheetbase_core::{
    copy_value, to_document_value, CacheError, CacheEvent, CacheState, ConfigError, Document,
    DocumentSchema, JsonValue, PartitionKey,
};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

/// Mutable part of the cache, guarded by one lock so that a write and the
/// save job it produces are ordered together.
#[derive(Debug, Default)]
struct Live {
    document: Option<Document>,
    next_sequence: u64,
}

struct Inner {
    remote: Arc<dyn DocumentRemote>,
    partition: PartitionKey,
    schema: DocumentSchema,
    events: EventSink,
    state: AtomicU8,
    live: Mutex<Live>,
    /// Single-flight initial fetch. The fetch runs in its own task, so it
    /// completes even when every caller waiting on it is dropped.
    init: OnceLock<Shared<BoxFuture<'static, ()>>>,
    queue: OnceLock<SaveQueue>,
}

/// In-memory copy of one partition's document with ordered write-back.
///
/// Cheap to clone; clones share the same document and save queue.
#[derive(Clone)]
pub struct DocumentCache {
    inner: Arc<Inner>,
}

impl DocumentCache {
    pub fn builder(remote: Arc<dyn DocumentRemote>) -> DocumentCacheBuilder {
        DocumentCacheBuilder::new(remote)
    }

    /// Cache for `partition` with the default site schema and no observers.
    pub fn new(remote: Arc<dyn DocumentRemote>, partition: PartitionKey) -> Self {
        Self::from_parts(remote, partition, DocumentSchema::site(), Vec::new())
    }

    fn from_parts(
        remote: Arc<dyn DocumentRemote>,
        partition: PartitionKey,
        schema: DocumentSchema,
        observers: Vec<Arc<dyn CacheObserver>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                partition,
                schema,
                events: EventSink::new(observers),
                state: AtomicU8::new(CacheState::Empty as u8),
                live: Mutex::new(Live::default()),
                init: OnceLock::new(),
                queue: OnceLock::new(),
            }),
        }
    }

    pub fn partition(&self) -> &PartitionKey {
        &self.inner.partition
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.inner.schema
    }

    pub fn state(&self) -> CacheState {
        CacheState::from_repr(self.inner.state.load(Ordering::SeqCst))
    }

    /// Load the document, fetching it at most once.
    ///
    /// Never fails: if the fetch fails the schema's fallback document is
    /// installed and a [`CacheEvent::FetchFailed`] is emitted. The event is
    /// delivered before this returns. Returns a copy of the cached document.
    pub async fn initialize(&self) -> Document {
        self.ensure_loaded().await;
        let live = self.inner.live.lock().await;
        live.document.clone().unwrap_or_default()
    }

    async fn ensure_loaded(&self) {
        let init = self
            .inner
            .init
            .get_or_init(|| {
                self.inner
                    .state
                    .store(CacheState::Loading as u8, Ordering::SeqCst);
                let inner = self.inner.clone();
                tokio::spawn(load_document(inner))
                    .map(|_| ())
                    .boxed()
                    .shared()
            })
            .clone();
        init.await;

        // The fetch task only ends without a document if it panicked
        if self.state() != CacheState::Ready {
            let mut live = self.inner.live.lock().await;
            if live.document.is_none() {
                tracing::error!(
                    partition = %self.inner.partition,
                    "Document fetch aborted, using fallback document"
                );
                live.document = Some(self.inner.schema.fallback_document());
            }
            self.inner
                .state
                .store(CacheState::Ready as u8, Ordering::SeqCst);
        }
    }

    /// Copy of the value stored under `key`, or `default` when the key is
    /// absent.
    pub async fn get(&self, key: &str, default: JsonValue) -> JsonValue {
        self.ensure_loaded().await;
        let live = self.inner.live.lock().await;
        live.document
            .as_ref()
            .and_then(|document| document.get(key))
            .map(copy_value)
            .unwrap_or(default)
    }

    /// Typed read. `Ok(None)` when the key is absent.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        self.ensure_loaded().await;
        let value = {
            let live = self.inner.live.lock().await;
            match live.document.as_ref().and_then(|document| document.get(key)) {
                Some(value) => copy_value(value),
                None => return Ok(None),
            }
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CacheError::Deserialization {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Store `value` under `key` and schedule an upload of the whole
    /// document. Returns without waiting for the upload.
    pub async fn set(&self, key: &str, value: JsonValue) {
        self.ensure_loaded().await;
        let mut live = self.inner.live.lock().await;
        let Some(document) = live.document.as_mut() else {
            return;
        };
        document.insert(key.to_string(), value);
        let snapshot = self.inner.schema.strip_transient(document);

        live.next_sequence += 1;
        let job = SaveJob {
            sequence: live.next_sequence,
            snapshot,
        };
        // Enqueue while still holding the lock so queue order matches write order
        if let Err(e) = self.queue().enqueue(job) {
            tracing::error!(
                partition = %self.inner.partition,
                key,
                error = %e,
                "Failed to schedule document save"
            );
        }
    }

    /// Typed write. Fails before touching the document when `value` has no
    /// JSON representation.
    pub async fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let value = to_document_value(key, value)?;
        self.set(key, value).await;
        Ok(())
    }

    /// Wait for every save scheduled before this call to finish.
    pub async fn flush(&self) -> Result<(), CacheError> {
        match self.inner.queue.get() {
            Some(queue) => queue.flush().await,
            None => Ok(()),
        }
    }

    /// Number of saves scheduled and not yet finished.
    pub fn pending_saves(&self) -> usize {
        self.inner.queue.get().map_or(0, SaveQueue::pending)
    }

    fn queue(&self) -> &SaveQueue {
        self.inner.queue.get_or_init(|| {
            SaveQueue::spawn(
                self.inner.remote.clone(),
                self.inner.partition.clone(),
                self.inner.events.clone(),
            )
        })
    }
}

async fn load_document(inner: Arc<Inner>) {
    tracing::info!(partition = %inner.partition, "Fetching document");
    let document = match inner.remote.fetch_document(&inner.partition).await {
        Ok(document) => {
            tracing::info!(
                partition = %inner.partition,
                keys = document.len(),
                "Document loaded"
            );
            document
        }
        Err(error) => {
            // Observers must see this before the state turns Ready
            inner.events.emit(CacheEvent::FetchFailed {
                partition: inner.partition.clone(),
                error,
            });
            inner.schema.fallback_document()
        }
    };

    let mut live = inner.live.lock().await;
    live.document = Some(document);
    inner
        .state
        .store(CacheState::Ready as u8, Ordering::SeqCst);
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("partition", &self.inner.partition.as_str())
            .field("state", &self.state())
            .field("pending_saves", &self.pending_saves())
            .finish()
    }
}

/// Builder for [`DocumentCache`].
pub struct DocumentCacheBuilder {
    remote: Arc<dyn DocumentRemote>,
    partition: Option<PartitionKey>,
    schema: DocumentSchema,
    observers: Vec<Arc<dyn CacheObserver>>,
}

impl DocumentCacheBuilder {
    pub fn new(remote: Arc<dyn DocumentRemote>) -> Self {
        Self {
            remote,
            partition: None,
            schema: DocumentSchema::site(),
            observers: Vec::new(),
        }
    }

    pub fn with_partition(mut self, partition: PartitionKey) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_schema(mut self, schema: DocumentSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_observer(mut self, observer: impl CacheObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn with_shared_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> Result<DocumentCache, CacheError> {
        let partition = self.partition.ok_or_else(|| ConfigError::MissingRequired {
            field: "partition".to_string(),
        })?;
        Ok(DocumentCache::from_parts(
            self.remote,
            partition,
            self.schema,
            self.observers,
        ))
    }
}
