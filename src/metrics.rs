//! Counters for the analysis pipeline.
//!
//! Uses the `metrics` facade only; whichever recorder/exporter the host
//! process installs receives them. Without a recorder they are no-ops.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::sentiment::ScoringPolicy;

pub const ANALYSES_TOTAL: &str = "mood_analyses_total";
pub const EMERGENCY_FLAGS_TOTAL: &str = "mood_emergency_flags_total";
pub const CLASSIFIER_FALLBACKS_TOTAL: &str = "mood_classifier_fallbacks_total";

/// Why a classifier call was replaced by the lexical result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Timeout,
    Error,
    Empty,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::Timeout => "timeout",
            FallbackReason::Error => "error",
            FallbackReason::Empty => "empty",
        }
    }
}

/// One-time registration so series carry descriptions.
fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(ANALYSES_TOTAL, "Mood analyses run, by sentiment policy.");
        describe_counter!(
            EMERGENCY_FLAGS_TOTAL,
            "Analyses whose text matched at least one crisis keyword."
        );
        describe_counter!(
            CLASSIFIER_FALLBACKS_TOTAL,
            "Classifier calls replaced by the lexical result, by reason."
        );
    });
}

pub fn record_analysis(policy: ScoringPolicy, emergency: bool) {
    ensure_described();
    let label = match policy {
        ScoringPolicy::Lexical => "lexical",
        ScoringPolicy::Classifier => "classifier",
    };
    counter!(ANALYSES_TOTAL, "policy" => label).increment(1);
    if emergency {
        counter!(EMERGENCY_FLAGS_TOTAL).increment(1);
    }
}

pub fn record_fallback(reason: FallbackReason) {
    ensure_described();
    counter!(CLASSIFIER_FALLBACKS_TOTAL, "reason" => reason.as_str()).increment(1);
}
