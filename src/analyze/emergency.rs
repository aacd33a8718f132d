// src/analyze/emergency.rs
//! Crisis-phrase scanner.
//!
//! Plain case-insensitive substring search against the lower-cased raw text:
//! no tokenization and no word boundaries, so "suicidal" inside a longer
//! sentence (or word) still counts. The scanner only reports what matched;
//! deciding what to do about it (alert records, contacting someone) is the
//! caller's job.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::lexicon::Lexicon;
use crate::telemetry::anon_hash;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyFlag {
    pub matched: bool,
    /// Unique, in crisis-list order.
    pub keywords: Vec<String>,
}

impl EmergencyFlag {
    pub fn from_keywords(keywords: Vec<String>) -> Self {
        Self {
            matched: !keywords.is_empty(),
            keywords,
        }
    }

    /// One-line alert description for the caller's alert record.
    pub fn alert_summary(&self) -> Option<String> {
        self.matched
            .then(|| format!("Emergency keywords detected: {}", self.keywords.join(", ")))
    }
}

#[derive(Debug, Clone)]
pub struct EmergencyKeywordScanner {
    lexicon: Arc<Lexicon>,
}

impl EmergencyKeywordScanner {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn scan(&self, text: &str) -> EmergencyFlag {
        if text.is_empty() {
            return EmergencyFlag::default();
        }

        let lowered = text.to_lowercase();
        let found: Vec<String> = self
            .lexicon
            .emergency_phrases()
            .iter()
            .filter(|p| lowered.contains(p.as_str()))
            .cloned()
            .collect();

        if !found.is_empty() {
            // Never log raw text; only hashed id + the matched phrases.
            warn!(
                target: "mood::emergency",
                id = %anon_hash(text),
                keywords = ?found,
                "crisis keywords detected"
            );
        }

        EmergencyFlag::from_keywords(found)
    }
}
