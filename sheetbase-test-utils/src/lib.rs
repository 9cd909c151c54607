//! Sheetbase Test Utilities
//!
//! Shared test infrastructure for the sheetbase workspace:
//! - A scriptable in-memory endpoint implementing both remote traits
//! - An event recorder usable as a cache observer
//! - Proptest generators for documents and partition keys
//! - Fixtures for common scenarios

pub use sheetbase_client::{DocumentRemote, ProjectRegistry, ProjectRequest, ProjectSummary};
pub use sheetbase_core::{
    CacheEvent, Document, DocumentSchema, EndpointError, JsonValue, PartitionKey,
};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;

// ============================================================================
// MOCK ENDPOINT
// ============================================================================

/// One recorded `persist_document` call.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistRecord {
    pub partition: PartitionKey,
    pub document: Document,
}

/// One recorded project registry call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    List,
    Add(ProjectRequest),
    Delete(ProjectRequest),
}

#[derive(Default)]
struct MockState {
    fetch_result: Option<Result<Document, EndpointError>>,
    fetch_gate: Option<Arc<Semaphore>>,
    persist_outcomes: VecDeque<Result<(), EndpointError>>,
    persist_delay: Option<Duration>,
    persisted: Vec<PersistRecord>,
    projects: Vec<ProjectSummary>,
    registry_outcomes: VecDeque<Result<(), EndpointError>>,
    registry_calls: Vec<RegistryCall>,
}

/// In-memory endpoint with scripted outcomes and recorded requests.
///
/// Cheap to clone; clones share state, so a test can keep one handle for
/// assertions and hand another to the code under test.
#[derive(Clone, Default)]
pub struct MockEndpoint {
    state: Arc<Mutex<MockState>>,
    fetches: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoint whose fetch returns `document`.
    pub fn with_document(document: Document) -> Self {
        let endpoint = Self::new();
        endpoint.state().fetch_result = Some(Ok(document));
        endpoint
    }

    /// Endpoint whose fetch fails with `error`.
    pub fn failing_fetch(error: EndpointError) -> Self {
        let endpoint = Self::new();
        endpoint.state().fetch_result = Some(Err(error));
        endpoint
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Block fetches until [`release_fetches`](Self::release_fetches).
    pub fn hold_fetches(&self) {
        self.state().fetch_gate = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_fetches(&self) {
        if let Some(gate) = self.state().fetch_gate.take() {
            gate.close();
        }
    }

    /// Queue outcomes for the next saves, consumed in order. Saves beyond the
    /// script succeed.
    pub fn script_persist(&self, outcomes: impl IntoIterator<Item = Result<(), EndpointError>>) {
        self.state().persist_outcomes.extend(outcomes);
    }

    /// Make every save take at least `delay`.
    pub fn set_persist_delay(&self, delay: Duration) {
        self.state().persist_delay = Some(delay);
    }

    /// Queue outcomes for the next registry calls, consumed in order. Calls
    /// beyond the script succeed.
    pub fn script_registry(&self, outcomes: impl IntoIterator<Item = Result<(), EndpointError>>) {
        self.state().registry_outcomes.extend(outcomes);
    }

    /// Fail the next registry call with `error`.
    pub fn fail_next_registry_call(&self, error: EndpointError) {
        self.script_registry([Err(error)]);
    }

    pub fn set_projects(&self, projects: Vec<ProjectSummary>) {
        self.state().projects = projects;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Every save attempt in arrival order, failed ones included.
    pub fn persisted(&self) -> Vec<PersistRecord> {
        self.state().persisted.clone()
    }

    /// Highest number of saves ever running at the same time.
    pub fn max_concurrent_persists(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn projects(&self) -> Vec<ProjectSummary> {
        self.state().projects.clone()
    }

    pub fn registry_calls(&self) -> Vec<RegistryCall> {
        self.state().registry_calls.clone()
    }

    /// Poll until at least `count` fetches have started, or `timeout` passes.
    pub async fn wait_for_fetches(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.fetch_count() < count {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        true
    }

    fn registry_call(&self, call: RegistryCall) -> Result<(), EndpointError> {
        let mut state = self.state();
        state.registry_calls.push(call);
        state.registry_outcomes.pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl DocumentRemote for MockEndpoint {
    async fn fetch_document(&self, _partition: &PartitionKey) -> Result<Document, EndpointError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.state().fetch_gate.clone();
        if let Some(gate) = gate {
            // Closing the gate releases every waiter
            let _ = gate.acquire().await;
        }
        self.state()
            .fetch_result
            .clone()
            .unwrap_or_else(|| Ok(Document::new()))
    }

    async fn persist_document(
        &self,
        partition: &PartitionKey,
        document: &Document,
    ) -> Result<(), EndpointError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = self.state().persist_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = {
            let mut state = self.state();
            state.persisted.push(PersistRecord {
                partition: partition.clone(),
                document: document.clone(),
            });
            state.persist_outcomes.pop_front().unwrap_or(Ok(()))
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

#[async_trait]
impl ProjectRegistry for MockEndpoint {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, EndpointError> {
        self.registry_call(RegistryCall::List)?;
        Ok(self.projects())
    }

    async fn add_project(&self, request: &ProjectRequest) -> Result<Option<String>, EndpointError> {
        self.registry_call(RegistryCall::Add(request.clone()))?;
        let mut state = self.state();
        let cell = format!("B{}", state.projects.len() + 2);
        state.projects.push(ProjectSummary {
            project_id: request.project_id.clone(),
            cell_location: Some(cell),
            password_protected: request.password.is_some(),
        });
        Ok(Some(format!("Project '{}' added.", request.project_id)))
    }

    async fn delete_project(
        &self,
        request: &ProjectRequest,
    ) -> Result<Option<String>, EndpointError> {
        self.registry_call(RegistryCall::Delete(request.clone()))?;
        let mut state = self.state();
        let before = state.projects.len();
        state
            .projects
            .retain(|p| p.project_id != request.project_id);
        if state.projects.len() == before {
            return Err(EndpointError::remote(format!(
                "Project '{}' not found.",
                request.project_id
            )));
        }
        Ok(Some(format!("Project '{}' deleted.", request.project_id)))
    }
}

impl std::fmt::Debug for MockEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEndpoint")
            .field("fetches", &self.fetch_count())
            .field("max_concurrent_persists", &self.max_concurrent_persists())
            .finish()
    }
}

// ============================================================================
// EVENT RECORDING
// ============================================================================

/// Records cache events for later assertions.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<CacheEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer closure feeding this log. Works anywhere a cache observer
    /// is accepted.
    pub fn observer(&self) -> impl Fn(&CacheEvent) + Send + Sync + 'static {
        let events = self.events.clone();
        move |event: &CacheEvent| {
            if let Ok(mut events) = events.lock() {
                events.push(event.clone());
            }
        }
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating sheetbase values.

    use super::*;
    use proptest::prelude::*;

    /// Generate a valid partition key.
    pub fn arb_partition_key() -> impl Strategy<Value = PartitionKey> {
        "[a-z][a-z0-9-]{0,23}".prop_filter_map("blank key", |s| PartitionKey::new(s).ok())
    }

    /// Generate an arbitrary JSON value of bounded depth and size.
    pub fn arb_json_value() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<bool>().prop_map(JsonValue::from),
            any::<i64>().prop_map(JsonValue::from),
            (-1.0e9f64..1.0e9).prop_map(JsonValue::from),
            "[ -~]{0,16}".prop_map(JsonValue::from),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(JsonValue::Array),
                prop::collection::btree_map("[a-zA-Z]{1,8}", inner, 0..6)
                    .prop_map(|m| JsonValue::Object(m.into_iter().collect())),
            ]
        })
    }

    /// Generate a document with a handful of top-level keys.
    pub fn arb_document() -> impl Strategy<Value = Document> {
        prop::collection::btree_map("[a-zA-Z]{1,12}", arb_json_value(), 0..8)
            .prop_map(|m| m.into_iter().collect())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common test scenarios.

    use super::*;
    use serde_json::json;

    /// Partition key from a literal known to be valid.
    pub fn partition(name: &str) -> PartitionKey {
        match PartitionKey::new(name) {
            Ok(key) => key,
            Err(e) => panic!("invalid fixture partition {name:?}: {e}"),
        }
    }

    /// A populated site document.
    pub fn site_document() -> Document {
        let value = json!({
            "announcements": [{ "id": 1, "title": "Welcome back", "date": "2025-09-01" }],
            "gallery": [],
            "inquiries": [],
            "volunteers": [{ "name": "Ada", "role": "Greeter" }],
            "messages": [],
            "events": [{ "id": 7, "title": "Bake sale", "tags": ["food", "fundraiser"] }],
            "projects": [],
            "adminCredentials": { "username": "admin", "password": "admin123" }
        });
        match value {
            JsonValue::Object(document) => document,
            _ => Document::new(),
        }
    }

    pub fn project(id: &str, protected: bool) -> ProjectSummary {
        ProjectSummary {
            project_id: id.to_string(),
            cell_location: Some("B2".to_string()),
            password_protected: protected,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
