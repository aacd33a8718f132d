// src/lib.rs
// Public library surface for the `mood_probe` binary and integration tests.

pub mod analyze;
pub mod config;
pub mod lexicon;
pub mod metrics;
pub mod sentiment;
pub mod telemetry;
pub mod trend;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    EmergencyFlag, EmotionHit, MoodAnalysis, MoodAnalyzer, TextPreprocessor,
};
pub use crate::config::AnalyzerConfig;
pub use crate::lexicon::Lexicon;
pub use crate::sentiment::{ScoringPolicy, SentimentLabel, SentimentResult};
pub use crate::trend::{mood_trend, summarize, trend_since, MoodSample, MoodSummary, MoodTrend};
