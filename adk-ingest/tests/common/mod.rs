//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use adk_ingest::{
    CreateIndexRequest, EmbeddingProvider, IndexHandle, IndexService, IngestError, QueryRequest,
    QueryResponse, Record, Result,
};
use async_trait::async_trait;

/// Deterministic hash-based embeddings, L2-normalized.
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let seed = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            // splitmix64 step per dimension, reduced before the float cast.
            let mut h = seed ^ (i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            h ^= h >> 31;
            *v = (h % 2_001) as f32 / 1_000.0 - 1.0;
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// An embedding provider that always fails.
pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(IngestError::EmbeddingError { provider: "failing".into(), message: "offline".into() })
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// What a [`ScriptedHandle`] answers to a query.
#[derive(Clone)]
pub enum QueryScript {
    Respond(Option<QueryResponse>),
    Fail,
}

/// A handle that records upsert batches and replays a scripted query answer.
pub struct ScriptedHandle {
    host: String,
    pub upserts: Mutex<Vec<(String, Vec<String>)>>,
    pub queries: Mutex<Vec<QueryRequest>>,
    query_script: QueryScript,
    fail_upsert_at: Option<usize>,
}

impl ScriptedHandle {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            upserts: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            query_script: QueryScript::Respond(Some(QueryResponse::default())),
            fail_upsert_at: None,
        }
    }

    pub fn with_query_script(mut self, script: QueryScript) -> Self {
        self.query_script = script;
        self
    }

    /// Fail the upsert call with this zero-based batch index.
    pub fn failing_upsert_at(mut self, batch_index: usize) -> Self {
        self.fail_upsert_at = Some(batch_index);
        self
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().iter().map(|(_, ids)| ids.len()).collect()
    }

    pub fn upserted_ids(&self) -> Vec<String> {
        self.upserts.lock().unwrap().iter().flat_map(|(_, ids)| ids.clone()).collect()
    }
}

#[async_trait]
impl IndexHandle for ScriptedHandle {
    fn host(&self) -> &str {
        &self.host
    }

    async fn upsert(&self, records: &[Record], namespace: &str) -> Result<usize> {
        let mut upserts = self.upserts.lock().unwrap();
        if self.fail_upsert_at == Some(upserts.len()) {
            return Err(IngestError::IndexError {
                backend: "scripted".into(),
                message: "service unavailable".into(),
            });
        }
        upserts.push((namespace.to_string(), records.iter().map(|r| r.id.clone()).collect()));
        Ok(records.len())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Option<QueryResponse>> {
        self.queries.lock().unwrap().push(request.clone());
        match &self.query_script {
            QueryScript::Respond(response) => Ok(response.clone()),
            QueryScript::Fail => Err(IngestError::IndexError {
                backend: "scripted".into(),
                message: "timeout".into(),
            }),
        }
    }
}

/// What [`ScriptedService::create_index`] does on each call.
#[derive(Debug, Clone, Copy)]
pub enum CreateOutcome {
    Created,
    Conflict,
}

/// An index service whose existence answers and creation outcomes are scripted.
pub struct ScriptedService {
    exists: Mutex<VecDeque<bool>>,
    create_outcomes: Mutex<VecDeque<CreateOutcome>>,
    pub create_requests: Mutex<Vec<CreateIndexRequest>>,
    pub opened_hosts: Mutex<Vec<String>>,
    pub has_index_calls: Mutex<usize>,
    pub handle: Arc<ScriptedHandle>,
}

impl ScriptedService {
    /// `exists` answers successive `has_index` calls; the last answer repeats.
    pub fn new(exists: &[bool], handle: Arc<ScriptedHandle>) -> Self {
        Self {
            exists: Mutex::new(exists.iter().copied().collect()),
            create_outcomes: Mutex::new(VecDeque::new()),
            create_requests: Mutex::new(Vec::new()),
            opened_hosts: Mutex::new(Vec::new()),
            has_index_calls: Mutex::new(0),
            handle,
        }
    }

    pub fn with_create_outcomes(self, outcomes: &[CreateOutcome]) -> Self {
        *self.create_outcomes.lock().unwrap() = outcomes.iter().copied().collect();
        self
    }
}

#[async_trait]
impl IndexService for ScriptedService {
    async fn has_index(&self, _name: &str) -> Result<bool> {
        *self.has_index_calls.lock().unwrap() += 1;
        let mut exists = self.exists.lock().unwrap();
        let answer = if exists.len() > 1 { exists.pop_front() } else { exists.front().copied() };
        Ok(answer.unwrap_or(false))
    }

    async fn create_index(&self, request: &CreateIndexRequest) -> Result<Arc<dyn IndexHandle>> {
        self.create_requests.lock().unwrap().push(request.clone());
        let outcome =
            self.create_outcomes.lock().unwrap().pop_front().unwrap_or(CreateOutcome::Created);
        match outcome {
            CreateOutcome::Created => {
                let handle: Arc<dyn IndexHandle> = self.handle.clone();
                Ok(handle)
            }
            CreateOutcome::Conflict => {
                Err(IngestError::IndexAlreadyExistsError { index: request.name.clone() })
            }
        }
    }

    fn open_index(&self, host: &str) -> Result<Arc<dyn IndexHandle>> {
        self.opened_hosts.lock().unwrap().push(host.to_string());
        let handle: Arc<dyn IndexHandle> = self.handle.clone();
        Ok(handle)
    }
}
