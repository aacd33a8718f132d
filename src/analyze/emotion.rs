// src/analyze/emotion.rs
//! Emotion detection over preprocessed tokens.
//!
//! Each emotion in the lexicon table has a list of trigger words. Confidence is
//! `min(0.9, hits / tokens * 5)`; at most three emotions are returned, highest
//! confidence first, ties in table order.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analyze::classifier::ClassScore;
use crate::analyze::preprocess::TextPreprocessor;
use crate::lexicon::Lexicon;

pub const MAX_EMOTIONS: usize = 3;

/// Classifier emotions at or below this probability are dropped.
pub const CLASSIFIER_MIN_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionHit {
    pub emotion: String,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct EmotionDetector {
    lexicon: Arc<Lexicon>,
    preprocessor: TextPreprocessor,
}

impl EmotionDetector {
    pub fn new(lexicon: Arc<Lexicon>, preprocessor: TextPreprocessor) -> Self {
        Self {
            lexicon,
            preprocessor,
        }
    }

    pub fn detect(&self, text: &str) -> Vec<EmotionHit> {
        let tokens = self.preprocessor.tokens(text);
        if tokens.is_empty() {
            return Vec::new();
        }
        let total = tokens.len() as f32;

        let hits = self
            .lexicon
            .emotions()
            .filter_map(|(name, keywords)| {
                let count = tokens.iter().filter(|t| keywords.contains(t.as_str())).count();
                (count > 0).then(|| EmotionHit {
                    emotion: name.to_string(),
                    confidence: (count as f32 / total * 5.0).min(0.9),
                })
            })
            .collect();

        rank(hits)
    }
}

/// Emotions from a classifier's per-label output.
pub fn from_class_scores(scores: &[ClassScore]) -> Vec<EmotionHit> {
    let hits = scores
        .iter()
        .filter(|s| s.score.is_finite() && s.score > CLASSIFIER_MIN_CONFIDENCE)
        .map(|s| EmotionHit {
            emotion: s.label.trim().to_lowercase(),
            confidence: s.score.min(1.0),
        })
        .collect();
    rank(hits)
}

/// Stable sort by confidence (desc) and keep the top three.
fn rank(mut hits: Vec<EmotionHit>) -> Vec<EmotionHit> {
    hits.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    hits.truncate(MAX_EMOTIONS);
    hits
}
