// src/analyze/mod.rs
//! Analysis pipeline entry: one call turns a piece of text into sentiment,
//! emotions and a crisis flag.
//!
//! `analyze` is the lexical path (pure, synchronous). `analyze_enhanced` asks
//! the configured classifier first and falls back to the lexical result per
//! sub-analysis; the crisis scan is always lexical.

pub mod classifier;
pub mod emergency;
pub mod emotion;
pub mod preprocess;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::lexicon::Lexicon;
use crate::metrics::{self, FallbackReason};
use crate::sentiment::{self, LexicalScorer, SentimentResult, SentimentScorer};
use crate::telemetry::anon_hash;
use crate::trend::{self, MoodTrend, DEFAULT_WINDOW_DAYS};

// Re-export convenient types.
pub use crate::analyze::classifier::{ClassScore, Classifier, ClassifierTask, DynClassifier};
pub use crate::analyze::emergency::{EmergencyFlag, EmergencyKeywordScanner};
pub use crate::analyze::emotion::{EmotionDetector, EmotionHit};
pub use crate::analyze::preprocess::TextPreprocessor;

pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_millis(3_000);

/// Everything known about one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAnalysis {
    pub sentiment: SentimentResult,
    pub emotions: Vec<EmotionHit>,
    pub emergency: EmergencyFlag,
}

impl MoodAnalysis {
    /// Emotion names, strongest first.
    pub fn emotion_names(&self) -> Vec<&str> {
        self.emotions.iter().map(|e| e.emotion.as_str()).collect()
    }

    pub fn mood_score(&self) -> f32 {
        self.sentiment.mood_score
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency.matched
    }
}

/// Immutable, cheap to clone, safe to share across tasks.
#[derive(Clone)]
pub struct MoodAnalyzer {
    inner: Arc<Inner>,
}

#[derive(Clone)]
struct Inner {
    preprocessor: TextPreprocessor,
    scorer: LexicalScorer,
    emotions: EmotionDetector,
    scanner: EmergencyKeywordScanner,
    classifier: Option<DynClassifier>,
    timeout: Duration,
    trend_window: usize,
}

impl fmt::Debug for MoodAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoodAnalyzer")
            .field("classifier", &self.classifier_name())
            .field("timeout", &self.inner.timeout)
            .field("trend_window", &self.inner.trend_window)
            .finish()
    }
}

impl Default for MoodAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MoodAnalyzer {
    /// Built-in lexicon, lexical scoring only.
    pub fn new() -> Self {
        Self::with_lexicon(Lexicon::builtin(), false)
    }

    pub fn with_lexicon(lexicon: Arc<Lexicon>, lemmatize: bool) -> Self {
        let preprocessor = TextPreprocessor::new(lexicon.clone()).with_lemmatizer(lemmatize);
        Self {
            inner: Arc::new(Inner {
                scorer: LexicalScorer::new(lexicon.clone(), preprocessor.clone()),
                emotions: EmotionDetector::new(lexicon.clone(), preprocessor.clone()),
                scanner: EmergencyKeywordScanner::new(lexicon),
                preprocessor,
                classifier: None,
                timeout: DEFAULT_CLASSIFIER_TIMEOUT,
                trend_window: DEFAULT_WINDOW_DAYS,
            }),
        }
    }

    /// Lexicon, preprocessing, classifier and trend window from config.
    pub fn from_config(cfg: &AnalyzerConfig) -> anyhow::Result<Self> {
        let lexicon = match &cfg.lexicon.path {
            Some(path) => Arc::new(Lexicon::load_from_file(path)?),
            None => Lexicon::builtin(),
        };

        let mut analyzer = Self::with_lexicon(lexicon, cfg.preprocess.lemmatize)
            .with_trend_window(cfg.trend.window_days);

        if let Some(c) = classifier::build_classifier(&cfg.classifier)? {
            analyzer = analyzer.with_classifier(c, cfg.classifier.timeout());
        }
        Ok(analyzer)
    }

    /// Use `classifier` in `analyze_enhanced`, each call bounded by `timeout`.
    pub fn with_classifier(self, classifier: DynClassifier, timeout: Duration) -> Self {
        let mut inner = self.unshare();
        inner.classifier = Some(classifier);
        inner.timeout = timeout;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Window (number of most recent scores) used by [`MoodAnalyzer::trend`].
    pub fn with_trend_window(self, window: usize) -> Self {
        let mut inner = self.unshare();
        inner.trend_window = if window == 0 { DEFAULT_WINDOW_DAYS } else { window };
        Self {
            inner: Arc::new(inner),
        }
    }

    fn unshare(self) -> Inner {
        Arc::try_unwrap(self.inner).unwrap_or_else(|shared| (*shared).clone())
    }

    pub fn classifier_name(&self) -> Option<&'static str> {
        self.inner.classifier.as_ref().map(|c| c.provider_name())
    }

    /// Normalized text as seen by the lexical stages.
    pub fn preprocess(&self, text: &str) -> String {
        self.inner.preprocessor.preprocess(text)
    }

    pub fn score(&self, text: &str) -> SentimentResult {
        self.inner.scorer.score(text)
    }

    pub fn detect_emotions(&self, text: &str) -> Vec<EmotionHit> {
        self.inner.emotions.detect(text)
    }

    pub fn scan(&self, text: &str) -> EmergencyFlag {
        self.inner.scanner.scan(text)
    }

    /// Lexical analysis. Never fails; empty input gives a neutral, empty,
    /// unflagged result.
    pub fn analyze(&self, text: &str) -> MoodAnalysis {
        let sentiment = self.score(text);
        let emotions = self.detect_emotions(text);
        let emergency = self.scan(text);
        self.finish(text, sentiment, emotions, emergency)
    }

    /// Classifier-backed analysis with per-part fallback to [`Self::analyze`].
    pub async fn analyze_enhanced(&self, text: &str) -> MoodAnalysis {
        let Some(classifier) = self.inner.classifier.as_ref() else {
            return self.analyze(text);
        };

        let sentiment_fut = async {
            if sentiment::too_short(text) {
                return self.score(text);
            }
            match self.classify(classifier, ClassifierTask::Sentiment, text).await {
                Some(scores) => sentiment::from_class_scores(&scores).unwrap_or_else(|| {
                    self.note_fallback(ClassifierTask::Sentiment, FallbackReason::Empty, text);
                    self.score(text)
                }),
                None => self.score(text),
            }
        };

        let emotions_fut = async {
            if text.trim().is_empty() {
                return Vec::new();
            }
            match self.classify(classifier, ClassifierTask::Emotion, text).await {
                Some(scores) if !scores.is_empty() => emotion::from_class_scores(&scores),
                Some(_) => {
                    self.note_fallback(ClassifierTask::Emotion, FallbackReason::Empty, text);
                    self.detect_emotions(text)
                }
                None => self.detect_emotions(text),
            }
        };

        let (sentiment, emotions) = tokio::join!(sentiment_fut, emotions_fut);
        let emergency = self.scan(text);
        self.finish(text, sentiment, emotions, emergency)
    }

    /// Trend over scores (oldest first) using the configured window.
    pub fn trend(&self, scores: &[f64]) -> MoodTrend {
        trend::mood_trend(scores, self.inner.trend_window)
    }

    /// Raw classifier output, or `None` after logging why it is unusable.
    async fn classify(
        &self,
        classifier: &DynClassifier,
        task: ClassifierTask,
        text: &str,
    ) -> Option<Vec<ClassScore>> {
        match tokio::time::timeout(self.inner.timeout, classifier.classify(task, text)).await {
            Ok(Ok(scores)) => Some(scores),
            Ok(Err(e)) => {
                warn!(
                    task = task.as_str(),
                    provider = classifier.provider_name(),
                    id = %anon_hash(text),
                    error = %e,
                    "classifier failed, using lexical result"
                );
                metrics::record_fallback(FallbackReason::Error);
                None
            }
            Err(_) => {
                self.note_fallback(task, FallbackReason::Timeout, text);
                None
            }
        }
    }

    fn note_fallback(&self, task: ClassifierTask, reason: FallbackReason, text: &str) {
        warn!(
            task = task.as_str(),
            reason = reason.as_str(),
            id = %anon_hash(text),
            "classifier unusable, using lexical result"
        );
        metrics::record_fallback(reason);
    }

    fn finish(
        &self,
        text: &str,
        sentiment: SentimentResult,
        emotions: Vec<EmotionHit>,
        emergency: EmergencyFlag,
    ) -> MoodAnalysis {
        metrics::record_analysis(sentiment.policy, emergency.matched);
        debug!(
            id = %anon_hash(text),
            policy = ?sentiment.policy,
            label = ?sentiment.label,
            mood = sentiment.mood_score,
            emotions = emotions.len(),
            emergency = emergency.matched,
            "analysis done"
        );
        MoodAnalysis {
            sentiment,
            emotions,
            emergency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::{ScoringPolicy, SentimentLabel};

    #[test]
    fn analyzer_is_send_sync_and_clone() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<MoodAnalyzer>();
    }

    #[test]
    fn builder_keeps_existing_settings() {
        let a = MoodAnalyzer::new().with_trend_window(3);
        let b = a.clone().with_classifier(
            Arc::new(classifier::MockClassifier::neutral()),
            Duration::from_millis(50),
        );
        assert_eq!(a.classifier_name(), None);
        assert_eq!(b.classifier_name(), Some("mock"));
        assert_eq!(b.trend(&[0.0, 0.0, 0.0, 0.5, 1.0]), MoodTrend::Improving);
    }

    #[test]
    fn zero_window_falls_back_to_default() {
        let a = MoodAnalyzer::new().with_trend_window(0);
        assert_eq!(a.inner.trend_window, DEFAULT_WINDOW_DAYS);
    }

    #[test]
    fn lexical_analysis_fills_every_part() {
        let r = MoodAnalyzer::new().analyze("I feel hopeless and sad today");
        assert_eq!(r.sentiment.label, SentimentLabel::Negative);
        assert_eq!(r.sentiment.policy, ScoringPolicy::Lexical);
        assert_eq!(r.emotion_names(), vec!["sadness"]);
        assert!(r.is_emergency());
        assert_eq!(r.emergency.keywords, vec!["hopeless"]);
    }

    #[tokio::test]
    async fn enhanced_without_classifier_matches_lexical() {
        let a = MoodAnalyzer::new();
        let text = "So grateful and happy with my family";
        assert_eq!(a.analyze_enhanced(text).await, a.analyze(text));
    }

    #[tokio::test]
    async fn enhanced_uses_mock_scores() {
        let a = MoodAnalyzer::new().with_classifier(
            Arc::new(classifier::MockClassifier::neutral()),
            Duration::from_millis(200),
        );
        let r = a.analyze_enhanced("Another ordinary Tuesday at the office").await;
        assert_eq!(r.sentiment.policy, ScoringPolicy::Classifier);
        assert_eq!(r.sentiment.label, SentimentLabel::Neutral);
        assert_eq!(r.emotion_names(), vec!["neutral"]);
    }
}
