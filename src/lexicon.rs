//! # Lexicon
//!
//! Read-only keyword tables used by the lexical pipeline:
//! - positive / negative sentiment words (token match)
//! - stop-words dropped during preprocessing
//! - crisis phrases (substring match on the lower-cased raw text)
//! - ordered emotion → trigger-word table
//!
//! The built-in tables live in `mood_lexicon.json` and are compiled in. A JSON
//! file of the same shape can replace them at construction time (see
//! `[lexicon] path` in `config/analyzer.toml`). Tables are never mutated after
//! load; share them through `Arc`.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

static BUILTIN: Lazy<Arc<Lexicon>> = Lazy::new(|| {
    let raw = include_str!("../mood_lexicon.json");
    let file: LexiconFile = serde_json::from_str(raw).expect("valid mood lexicon");
    Arc::new(Lexicon::from(file))
});

/// On-disk shape of a lexicon file.
#[derive(Debug, Clone, Deserialize)]
pub struct LexiconFile {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub emergency: Vec<String>,
    #[serde(default)]
    pub emotions: Vec<EmotionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmotionEntry {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Lookup-ready tables.
#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
    stop_words: HashSet<String>,
    /// Kept as a list: scan order defines the order of reported keywords.
    emergency: Vec<String>,
    /// Kept in file order: ties between emotions keep this order.
    emotions: Vec<(String, HashSet<String>)>,
}

impl Lexicon {
    /// Shared handle to the compiled-in tables.
    pub fn builtin() -> Arc<Lexicon> {
        Arc::clone(&BUILTIN)
    }

    /// Load a replacement lexicon from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading lexicon from {}", path.display()))?;
        let file: LexiconFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing lexicon {}", path.display()))?;
        Ok(Self::from(file))
    }

    pub fn is_positive(&self, token: &str) -> bool {
        self.positive.contains(token)
    }

    pub fn is_negative(&self, token: &str) -> bool {
        self.negative.contains(token)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    pub fn emergency_phrases(&self) -> &[String] {
        &self.emergency
    }

    pub fn emotions(&self) -> impl Iterator<Item = (&str, &HashSet<String>)> {
        self.emotions.iter().map(|(name, kws)| (name.as_str(), kws))
    }
}

impl From<LexiconFile> for Lexicon {
    fn from(file: LexiconFile) -> Self {
        fn words(list: Vec<String>) -> HashSet<String> {
            list.into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        }

        // Phrases: lower-case, drop blanks and duplicates, keep first-seen order.
        let mut seen = HashSet::new();
        let emergency = file
            .emergency
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect();

        let emotions = file
            .emotions
            .into_iter()
            .map(|e| (e.name.trim().to_lowercase(), words(e.keywords)))
            .filter(|(name, kws)| !name.is_empty() && !kws.is_empty())
            .collect();

        Self {
            positive: words(file.positive),
            negative: words(file.negative),
            stop_words: words(file.stop_words),
            emergency,
            emotions,
        }
    }
}
