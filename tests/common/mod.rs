#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adneura::config::settings::{AppConfig, RetryPolicy};
use adneura::infrastructure::openai::client::{ImageApiError, ImageGenerator};
use adneura::infrastructure::storage::local::ContentStore;
use adneura::modules::images::dispatcher::{CandidateSource, DispatchTarget, ImageCandidate};
use adneura::modules::images::job::{EntityKind, ImageJob, JobRecord};
use adneura::modules::images::persistence::ImageReferenceStore;
use adneura::modules::images::queue::{JobQueue, QueueError, ResultBackend};
use adneura::modules::images::worker::ImageWorker;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;
use uuid::Uuid;

pub const IMAGE_BYTES: &[u8] = b"\x89PNG fake image";

pub fn test_config(image_dir: &Path) -> AppConfig {
    AppConfig {
        server_port: 0,
        database_url: "postgres://localhost/test".into(),
        redis_url: "redis://localhost/1".into(),
        amqp_url: "amqp://localhost:5672/%2f".into(),
        openai_api_key: "sk-test".into(),
        openai_base_url: "http://localhost:9/v1".into(),
        image_model: "dall-e-3".into(),
        image_size: "1792x1024".into(),
        image_quality: "hd".into(),
        image_dir: image_dir.to_path_buf(),
        image_url_prefix: "/images".into(),
        image_queue: "image_generation".into(),
        image_max_attempts: 5,
        image_default_reset_secs: 60,
        image_rate_limit_per_minute: None,
        result_ttl_secs: 86_400,
        embedded_worker: false,
    }
}

pub fn audience(id: Uuid, image_ref: Option<&str>) -> ImageCandidate {
    ImageCandidate {
        kind: EntityKind::Audience,
        id,
        audience_id: id,
        prompt: format!("audience {id}"),
        image_ref: image_ref.map(str::to_string),
    }
}

pub fn trigger(id: Uuid, audience_id: Uuid, image_ref: Option<&str>) -> ImageCandidate {
    ImageCandidate {
        kind: EntityKind::Trigger,
        id,
        audience_id,
        prompt: format!("trigger {id}"),
        image_ref: image_ref.map(str::to_string),
    }
}

/// Brand-scoped entities held in memory.
#[derive(Default)]
pub struct MemorySource {
    entities: Mutex<Vec<(Uuid, ImageCandidate)>>,
}

impl MemorySource {
    pub fn with(brand_id: Uuid, candidates: Vec<ImageCandidate>) -> Self {
        Self {
            entities: Mutex::new(candidates.into_iter().map(|c| (brand_id, c)).collect()),
        }
    }

    pub fn set_image(&self, entity_id: Uuid, file_name: &str) {
        let mut entities = self.entities.lock().unwrap();
        for (_, candidate) in entities.iter_mut().filter(|(_, c)| c.id == entity_id) {
            candidate.image_ref = Some(file_name.to_string());
        }
    }
}

#[async_trait]
impl CandidateSource for MemorySource {
    async fn candidates(
        &self,
        brand_id: Uuid,
        target: DispatchTarget,
    ) -> anyhow::Result<Vec<ImageCandidate>> {
        let (kind, only) = match target {
            DispatchTarget::Audiences { audience_id } => (EntityKind::Audience, audience_id),
            DispatchTarget::Triggers { trigger_id } => (EntityKind::Trigger, trigger_id),
        };

        Ok(self
            .entities
            .lock()
            .unwrap()
            .iter()
            .filter(|(brand, c)| *brand == brand_id && c.kind == kind)
            .filter(|(_, c)| only.is_none_or(|id| id == c.id))
            .map(|(_, c)| c.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<(Uuid, ImageJob)>>,
    pub fail: bool,
}

impl RecordingQueue {
    pub fn broken() -> Self {
        Self {
            jobs: Mutex::default(),
            fail: true,
        }
    }

    pub fn jobs(&self) -> Vec<(Uuid, ImageJob)> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: ImageJob) -> Result<Uuid, QueueError> {
        if self.fail {
            return Err(QueueError::Broker("connection refused".into()));
        }
        let id = Uuid::new_v4();
        self.jobs.lock().unwrap().push((id, job));
        Ok(id)
    }
}

/// Keeps every record written per job, newest last.
#[derive(Default)]
pub struct MemoryResults {
    pub history: Mutex<HashMap<Uuid, Vec<JobRecord>>>,
}

impl MemoryResults {
    pub fn history(&self, job_id: Uuid) -> Vec<JobRecord> {
        self.history
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResultBackend for MemoryResults {
    async fn store(&self, job_id: Uuid, record: &JobRecord) -> Result<(), QueueError> {
        self.history
            .lock()
            .unwrap()
            .entry(job_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn load(&self, job_id: Uuid) -> Result<Option<JobRecord>, QueueError> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(&job_id)
            .and_then(|records| records.last().cloned()))
    }
}

pub enum Reply {
    Url(&'static str),
    RateLimited(Option<Duration>),
    Rejected(&'static str),
}

/// Answers `generate` from a script; once the script runs out every call succeeds.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Reply>>,
    pub calls: Mutex<Vec<(Instant, String)>>,
    pub downloads: Mutex<Vec<String>>,
    pub fail_download: bool,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn with_failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ImageApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), prompt.to_string()));

        let reply = self.script.lock().unwrap().pop_front();
        match reply.unwrap_or(Reply::Url("https://cdn.example.com/generated.png")) {
            Reply::Url(url) => Ok(url.to_string()),
            Reply::RateLimited(retry_after) => Err(ImageApiError::RateLimited {
                retry_after,
                message: "Rate limit reached for images per minute".into(),
            }),
            Reply::Rejected(message) => Err(ImageApiError::Upstream {
                status: 400,
                message: message.into(),
            }),
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes, ImageApiError> {
        self.downloads.lock().unwrap().push(url.to_string());
        if self.fail_download {
            return Err(ImageApiError::Upstream {
                status: 403,
                message: "asset download failed".into(),
            });
        }
        Ok(Bytes::from_static(IMAGE_BYTES))
    }
}

/// Records writes; only ids in `existing` count as present.
#[derive(Default)]
pub struct RecordingReferences {
    pub existing: HashSet<Uuid>,
    pub writes: Mutex<Vec<(EntityKind, Uuid, String)>>,
}

impl RecordingReferences {
    pub fn with(ids: &[Uuid]) -> Self {
        Self {
            existing: ids.iter().copied().collect(),
            writes: Mutex::default(),
        }
    }

    pub fn writes(&self) -> Vec<(EntityKind, Uuid, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageReferenceStore for RecordingReferences {
    async fn set_image_reference(
        &self,
        kind: EntityKind,
        entity_id: Uuid,
        file_name: &str,
    ) -> anyhow::Result<bool> {
        self.writes
            .lock()
            .unwrap()
            .push((kind, entity_id, file_name.to_string()));
        Ok(self.existing.contains(&entity_id))
    }
}

pub struct WorkerHarness {
    pub worker: ImageWorker,
    pub generator: Arc<ScriptedGenerator>,
    pub references: Arc<RecordingReferences>,
    pub results: Arc<MemoryResults>,
    pub store: ContentStore,
}

pub fn worker_harness(
    generator: ScriptedGenerator,
    references: RecordingReferences,
    image_dir: &Path,
) -> WorkerHarness {
    let generator = Arc::new(generator);
    let references = Arc::new(references);
    let results = Arc::new(MemoryResults::default());
    let store = ContentStore::new(image_dir);

    let worker = ImageWorker::new(
        generator.clone(),
        store.clone(),
        references.clone(),
        results.clone(),
        RetryPolicy::default(),
    );

    WorkerHarness {
        worker,
        generator,
        references,
        results,
        store,
    }
}
