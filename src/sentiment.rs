//! # Sentiment
//! Sentiment result types plus the two scoring strategies:
//!
//! - **Lexical** (`LexicalScorer`): keyword ratios over preprocessed tokens.
//!   Always available, pure, synchronous.
//! - **Classifier**: per-label probabilities from an external model, turned
//!   into a result by [`from_class_scores`]. Used only through
//!   `MoodAnalyzer::analyze_enhanced`, which falls back to the lexical scorer.
//!
//! The two strategies scale `mood_score` differently; `policy` on the result
//! says which one produced it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analyze::classifier::ClassScore;
use crate::analyze::preprocess::TextPreprocessor;
use crate::lexicon::Lexicon;

/// Inputs shorter than this (after trimming, in chars) are never scored.
pub const MIN_SCORABLE_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    Lexical,
    Classifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// In [0, 1].
    pub confidence: f32,
    /// In [-1, 1].
    pub mood_score: f32,
    /// Empty on the degenerate (too short / no tokens) path.
    #[serde(default)]
    pub detailed_scores: BTreeMap<SentimentLabel, f32>,
    pub policy: ScoringPolicy,
}

impl SentimentResult {
    /// Neutral with zero confidence; used for empty or unscorable input.
    pub fn neutral_zero(policy: ScoringPolicy) -> Self {
        Self {
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            mood_score: 0.0,
            detailed_scores: BTreeMap::new(),
            policy,
        }
    }

    pub fn score_for(&self, label: SentimentLabel) -> Option<f32> {
        self.detailed_scores.get(&label).copied()
    }
}

/// Anything that can turn text into a `SentimentResult` without failing.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentResult;
}

/// Keyword-ratio scorer.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    lexicon: Arc<Lexicon>,
    preprocessor: TextPreprocessor,
}

impl LexicalScorer {
    pub fn new(lexicon: Arc<Lexicon>, preprocessor: TextPreprocessor) -> Self {
        Self {
            lexicon,
            preprocessor,
        }
    }
}

impl SentimentScorer for LexicalScorer {
    fn score(&self, text: &str) -> SentimentResult {
        if too_short(text) {
            return SentimentResult::neutral_zero(ScoringPolicy::Lexical);
        }

        let tokens = self.preprocessor.tokens(text);
        let total = tokens.len();
        if total == 0 {
            return SentimentResult::neutral_zero(ScoringPolicy::Lexical);
        }

        let pos = tokens.iter().filter(|t| self.lexicon.is_positive(t)).count();
        let neg = tokens.iter().filter(|t| self.lexicon.is_negative(t)).count();

        let pos_ratio = pos as f32 / total as f32;
        let neg_ratio = neg as f32 / total as f32;

        let (label, confidence, mood_score) = if pos > neg {
            (
                SentimentLabel::Positive,
                (pos_ratio * 3.0).min(0.9),
                (pos_ratio * 2.0).min(1.0),
            )
        } else if neg > pos {
            (
                SentimentLabel::Negative,
                (neg_ratio * 3.0).min(0.9),
                (-neg_ratio * 2.0).max(-1.0),
            )
        } else {
            (SentimentLabel::Neutral, 0.5, 0.0)
        };

        // Neutral share is left unclamped: it goes negative when both ratios are high.
        let detailed_scores = BTreeMap::from([
            (SentimentLabel::Positive, pos_ratio),
            (SentimentLabel::Negative, neg_ratio),
            (SentimentLabel::Neutral, 1.0 - pos_ratio - neg_ratio),
        ]);

        SentimentResult {
            label,
            confidence,
            mood_score,
            detailed_scores,
            policy: ScoringPolicy::Lexical,
        }
    }
}

/// Map a raw model label onto the three sentiment classes.
pub fn normalize_label(raw: &str) -> SentimentLabel {
    let l = raw.trim().to_lowercase();
    if l.contains("positive") || l == "pos" {
        SentimentLabel::Positive
    } else if l.contains("negative") || l == "neg" {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Build a classifier-policy result from per-label probabilities.
/// Returns `None` when no usable score is present so the caller can fall back.
pub fn from_class_scores(scores: &[ClassScore]) -> Option<SentimentResult> {
    let mut detailed: BTreeMap<SentimentLabel, f32> = BTreeMap::new();
    for s in scores.iter().filter(|s| s.score.is_finite()) {
        // later labels mapping to the same class win
        detailed.insert(normalize_label(&s.label), s.score.clamp(0.0, 1.0));
    }

    // Argmax; neutral wins ties.
    let (label, confidence) = detailed
        .iter()
        .map(|(&l, &v)| (l, v))
        .reduce(|best, cur| {
            if cur.1 > best.1 || (cur.1 == best.1 && cur.0 == SentimentLabel::Neutral) {
                cur
            } else {
                best
            }
        })?;

    let pos = detailed.get(&SentimentLabel::Positive).copied();
    let neg = detailed.get(&SentimentLabel::Negative).copied();
    let mood_score = match (pos, neg) {
        (Some(p), Some(n)) => p - n,
        (Some(p), None) => p - 0.5,
        (None, Some(n)) => 0.5 - n,
        (None, None) => 0.0,
    }
    .clamp(-1.0, 1.0);

    Some(SentimentResult {
        label,
        confidence,
        mood_score,
        detailed_scores: detailed,
        policy: ScoringPolicy::Classifier,
    })
}

pub(crate) fn too_short(text: &str) -> bool {
    text.trim().chars().count() < MIN_SCORABLE_CHARS
}
