//! Classifier adapter: provider abstraction + file cache + daily limit.
//!
//! An optional external model (Hugging Face inference API by default) can
//! produce per-label probabilities for sentiment and emotions. Nothing here
//! is required for analysis to work: `MoodAnalyzer` treats every failure as
//! "use the lexical result".

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::ClassifierConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// One label/probability pair as reported by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierTask {
    Sentiment,
    Emotion,
}

impl ClassifierTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierTask::Sentiment => "sentiment",
            ClassifierTask::Emotion => "emotion",
        }
    }
}

#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// Per-label probabilities for `input`. An empty vector is a valid answer
    /// that callers treat as "no opinion".
    async fn classify(&self, task: ClassifierTask, input: &str) -> Result<Vec<ClassScore>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

pub const ENV_TEST_MODE: &str = "CLASSIFIER_TEST_MODE";

/// Build the configured classifier, or `None` when it is disabled.
/// `cfg` is sanitized and its `"ENV"` key resolved first, so hand-built or
/// merely parsed configs behave like loaded ones.
///
/// * `CLASSIFIER_TEST_MODE=mock` → deterministic mock, regardless of config.
/// * `enabled = false` → `None`.
/// * `provider = "huggingface"` → HTTP provider wrapped with cache + daily limit.
/// * `provider = "mock"` → mock.
pub fn build_classifier(cfg: &ClassifierConfig) -> Result<Option<DynClassifier>> {
    if std::env::var(ENV_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Some(Arc::new(MockClassifier::neutral())));
    }

    if !cfg.enabled {
        return Ok(None);
    }
    let cfg = cfg.resolved()?;

    match cfg.provider.as_str() {
        "huggingface" => {
            let provider = HuggingFaceProvider::new(&cfg)?;
            let client: DynClassifier = match &cfg.cache_dir {
                Some(dir) => Arc::new(CachingClassifier::new(provider, dir.clone(), cfg.daily_limit)),
                None => Arc::new(provider),
            };
            info!(provider = client.provider_name(), "classifier enabled");
            Ok(Some(client))
        }
        "mock" => Ok(Some(Arc::new(MockClassifier::neutral()))),
        other => bail!("Unsupported classifier provider in config: {other}"),
    }
}

// ------------------------------------------------------------
// Concrete providers
// ------------------------------------------------------------

/// Hugging Face inference API. Needs an API token (see `config`).
pub struct HuggingFaceProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    sentiment_model: String,
    emotion_model: String,
}

impl HuggingFaceProvider {
    pub fn new(cfg: &ClassifierConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mood-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("building classifier HTTP client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            sentiment_model: cfg.sentiment_model.clone(),
            emotion_model: cfg.emotion_model.clone(),
        })
    }

    fn model_for(&self, task: ClassifierTask) -> &str {
        match task {
            ClassifierTask::Sentiment => &self.sentiment_model,
            ClassifierTask::Emotion => &self.emotion_model,
        }
    }
}

#[async_trait::async_trait]
impl Classifier for HuggingFaceProvider {
    async fn classify(&self, task: ClassifierTask, input: &str) -> Result<Vec<ClassScore>> {
        if self.api_key.is_empty() {
            bail!("no Hugging Face API token configured");
        }

        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
        }

        let url = format!("{}/{}", self.endpoint, self.model_for(task));
        let body = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&Req { inputs: input })
            .send()
            .await
            .with_context(|| format!("{} classifier request", task.as_str()))?
            .error_for_status()
            .context("classifier non-2xx")?
            .text()
            .await
            .context("read classifier body")?;

        parse_scores(&body)
    }

    fn provider_name(&self) -> &'static str {
        "huggingface"
    }
}

/// Accepts both `[[{label,score},..]]` (single input, nested) and
/// `[{label,score},..]`.
pub fn parse_scores(body: &str) -> Result<Vec<ClassScore>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Nested(Vec<Vec<ClassScore>>),
        Flat(Vec<ClassScore>),
    }

    let trimmed = body.trim();
    let shape: Shape = serde_json::from_str(trimmed)
        .with_context(|| format!("parse classifier JSON failed, body: {}", truncate(trimmed, 200)))?;

    Ok(match shape {
        Shape::Nested(mut rows) => {
            if rows.is_empty() {
                Vec::new()
            } else {
                rows.swap_remove(0)
            }
        }
        Shape::Flat(scores) => scores,
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Fixed answers; for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct MockClassifier {
    pub sentiment: Vec<ClassScore>,
    pub emotions: Vec<ClassScore>,
}

impl MockClassifier {
    pub fn neutral() -> Self {
        let cs = |label: &str, score: f32| ClassScore {
            label: label.to_string(),
            score,
        };
        Self {
            sentiment: vec![cs("negative", 0.1), cs("neutral", 0.8), cs("positive", 0.1)],
            emotions: vec![cs("neutral", 0.9)],
        }
    }
}

#[async_trait::async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, task: ClassifierTask, _input: &str) -> Result<Vec<ClassScore>> {
        Ok(match task {
            ClassifierTask::Sentiment => self.sentiment.clone(),
            ClassifierTask::Emotion => self.emotions.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Caching wrapper (file cache + daily limit)
// ------------------------------------------------------------

/// Wraps a provider with an on-disk result cache and a per-day call budget.
/// Cache files are keyed by a SHA-256 of task + input and hold scores only.
pub struct CachingClassifier<C: Classifier> {
    inner: C,
    cache_dir: PathBuf,
    daily_limit_max: u32,
    counter: Mutex<DailyCounter>,
}

impl<C: Classifier> CachingClassifier<C> {
    pub fn new(inner: C, cache_dir: PathBuf, daily_limit_max: u32) -> Self {
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            debug!(error = %e, dir = %cache_dir.display(), "classifier cache dir not created");
        }
        let counter = Mutex::new(load_daily_counter(&cache_dir).unwrap_or_default());
        Self {
            inner,
            cache_dir,
            daily_limit_max,
            counter,
        }
    }

    /// Real (non-cached) calls made today.
    pub fn calls_today(&self) -> u32 {
        self.counter
            .lock()
            .map(|g| if g.is_expired() { 0 } else { g.count })
            .unwrap_or(0)
    }

    /// Take one unit of today's budget before calling out, so concurrent
    /// calls cannot both pass the limit.
    fn reserve_slot(&self) -> Result<()> {
        let mut g = self
            .counter
            .lock()
            .map_err(|_| anyhow!("classifier counter poisoned"))?;
        if g.is_expired() {
            g.reset_to_today();
        }
        if g.count >= self.daily_limit_max {
            bail!("daily classifier limit reached ({})", self.daily_limit_max);
        }
        g.count += 1;
        let _ = save_daily_counter(&self.cache_dir, &g);
        Ok(())
    }

    /// Give back a reserved unit when the call produced nothing.
    fn release_slot(&self) {
        if let Ok(mut g) = self.counter.lock() {
            g.count = g.count.saturating_sub(1);
            let _ = save_daily_counter(&self.cache_dir, &g);
        }
    }
}

#[async_trait::async_trait]
impl<C: Classifier> Classifier for CachingClassifier<C> {
    async fn classify(&self, task: ClassifierTask, input: &str) -> Result<Vec<ClassScore>> {
        let key = cache_key(task, input);
        if let Some(hit) = read_cache_file(&self.cache_dir, &key) {
            debug!(task = task.as_str(), "classifier cache hit");
            return Ok(hit);
        }

        // Only real calls count against the budget.
        self.reserve_slot()?;

        let fresh = match self.inner.classify(task, input).await {
            Ok(fresh) => fresh,
            Err(e) => {
                self.release_slot();
                return Err(e);
            }
        };
        if fresh.is_empty() {
            self.release_slot();
        } else if let Err(e) = write_cache_file(&self.cache_dir, &key, &fresh) {
            debug!(error = %e, "classifier cache write failed");
        }
        Ok(fresh)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

fn cache_key(task: ClassifierTask, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(task.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(16).map(|b| format!("{b:02x}")).collect()
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<Vec<ClassScore>> {
    let raw = fs::read_to_string(cache_path(dir, key)).ok()?;
    serde_json::from_str(&raw).ok()
}

fn write_cache_file(dir: &Path, key: &str, value: &[ClassScore]) -> io::Result<()> {
    let path = cache_path(dir, key);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(&json)?;
    fs::rename(tmp, path)
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let p = counter_path(dir);
    let tmp = p.with_extension("json.tmp");
    let s = serde_json::to_vec(dc).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(&s)?;
    fs::rename(tmp, p)
}
