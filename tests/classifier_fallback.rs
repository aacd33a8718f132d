// tests/classifier_fallback.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use mood_analyzer::analyze::classifier::{ClassScore, Classifier, ClassifierTask, MockClassifier};
use mood_analyzer::{MoodAnalyzer, ScoringPolicy, SentimentLabel};

fn cs(label: &str, score: f32) -> ClassScore {
    ClassScore {
        label: label.into(),
        score,
    }
}

struct Failing {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Classifier for Failing {
    async fn classify(&self, _task: ClassifierTask, _input: &str) -> Result<Vec<ClassScore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        bail!("503 model loading")
    }
    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

struct Slow;

#[async_trait::async_trait]
impl Classifier for Slow {
    async fn classify(&self, _task: ClassifierTask, _input: &str) -> Result<Vec<ClassScore>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(vec![cs("positive", 1.0)])
    }
    fn provider_name(&self) -> &'static str {
        "slow"
    }
}

const TEXT: &str = "So tired and lonely, everything feels awful";

#[tokio::test]
async fn classifier_scores_drive_sentiment_and_emotions() {
    let mock = MockClassifier {
        sentiment: vec![cs("negative", 0.7), cs("neutral", 0.2), cs("positive", 0.1)],
        emotions: vec![cs("sadness", 0.62), cs("fear", 0.31), cs("joy", 0.02)],
    };
    let a = MoodAnalyzer::new().with_classifier(Arc::new(mock), Duration::from_millis(500));
    let r = a.analyze_enhanced(TEXT).await;

    assert_eq!(r.sentiment.policy, ScoringPolicy::Classifier);
    assert_eq!(r.sentiment.label, SentimentLabel::Negative);
    assert!((r.sentiment.confidence - 0.7).abs() < 1e-6);
    assert!((r.sentiment.mood_score + 0.6).abs() < 1e-6);
    assert_eq!(r.emotion_names(), vec!["sadness", "fear"]);
    assert!(!r.emergency.matched);
}

#[tokio::test]
async fn provider_error_falls_back_to_lexical() {
    let failing = Arc::new(Failing {
        calls: AtomicUsize::new(0),
    });
    let a = MoodAnalyzer::new().with_classifier(failing.clone(), Duration::from_millis(500));
    let r = a.analyze_enhanced(TEXT).await;

    assert_eq!(r, a.analyze(TEXT));
    assert_eq!(r.sentiment.policy, ScoringPolicy::Lexical);
    // one call per sub-analysis
    assert_eq!(failing.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn timeout_falls_back_to_lexical() {
    let a = MoodAnalyzer::new().with_classifier(Arc::new(Slow), Duration::from_millis(30));
    let started = std::time::Instant::now();
    let r = a.analyze_enhanced(TEXT).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(r, a.analyze(TEXT));
}

#[tokio::test]
async fn empty_output_falls_back_per_part() {
    // sentiment empty → lexical; emotions present → classifier
    let mock = MockClassifier {
        sentiment: vec![],
        emotions: vec![cs("anger", 0.8)],
    };
    let a = MoodAnalyzer::new().with_classifier(Arc::new(mock), Duration::from_millis(500));
    let r = a.analyze_enhanced(TEXT).await;

    assert_eq!(r.sentiment, a.score(TEXT));
    assert_eq!(r.emotion_names(), vec!["anger"]);
}

#[tokio::test]
async fn crisis_scan_stays_lexical() {
    let mock = MockClassifier {
        sentiment: vec![cs("positive", 0.99)],
        emotions: vec![cs("joy", 0.9)],
    };
    let a = MoodAnalyzer::new().with_classifier(Arc::new(mock), Duration::from_millis(500));
    let r = a.analyze_enhanced("honestly I feel worthless").await;

    assert_eq!(r.sentiment.label, SentimentLabel::Positive);
    assert!(r.emergency.matched);
    assert_eq!(r.emergency.keywords, vec!["worthless"]);
}

#[tokio::test]
async fn short_input_skips_the_classifier() {
    let failing = Arc::new(Failing {
        calls: AtomicUsize::new(0),
    });
    let a = MoodAnalyzer::new().with_classifier(failing.clone(), Duration::from_millis(500));

    let r = a.analyze_enhanced("  ").await;
    assert_eq!(r.sentiment.label, SentimentLabel::Neutral);
    assert_eq!(r.sentiment.confidence, 0.0);
    assert!(r.emotions.is_empty());
    assert_eq!(failing.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn shared_analyzer_across_tasks() {
    let a = MoodAnalyzer::new().with_classifier(
        Arc::new(MockClassifier::neutral()),
        Duration::from_millis(500),
    );
    let mut handles = Vec::new();
    for i in 0..8 {
        let a = a.clone();
        handles.push(tokio::spawn(async move {
            a.analyze_enhanced(&format!("entry number {i} about my day")).await
        }));
    }
    for h in handles {
        let r = h.await.unwrap();
        assert_eq!(r.sentiment.policy, ScoringPolicy::Classifier);
        assert_eq!(r.sentiment.label, SentimentLabel::Neutral);
    }
}
