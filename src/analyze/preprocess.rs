// src/analyze/preprocess.rs
//! Text normalization shared by the lexical scorer and the emotion detector.
//!
//! Pipeline: lower-case → drop everything that is not an ASCII letter or
//! whitespace (digits and apostrophes included, so `can't` becomes `cant`) →
//! split on whitespace → drop stop-words and tokens of length <= 2 →
//! optional noun lemmatization → join with single spaces.
//!
//! Never fails; unknown or odd input degrades to fewer tokens.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::lexicon::Lexicon;

static NON_LETTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z\s]").expect("static regex compiles"));

#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    lexicon: Arc<Lexicon>,
    lemmatize: bool,
}

impl TextPreprocessor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            lemmatize: false,
        }
    }

    /// Enable best-effort lemmatization of surviving tokens.
    pub fn with_lemmatizer(mut self, on: bool) -> Self {
        self.lemmatize = on;
        self
    }

    /// Normalized text (tokens joined by single spaces).
    pub fn preprocess(&self, text: &str) -> String {
        self.tokens(text).join(" ")
    }

    /// Normalized tokens, in input order.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let lowered = text.to_lowercase();
        let cleaned = NON_LETTERS.replace_all(&lowered, "");

        cleaned
            .split_whitespace()
            .filter(|t| t.len() > 2 && !self.lexicon.is_stop_word(t))
            .map(|t| {
                if self.lemmatize {
                    lemmatize(t)
                } else {
                    t.to_string()
                }
            })
            .collect()
    }
}

/// Noun-suffix reduction in the spirit of WordNet's default (noun) rules.
/// Words it does not recognize come back unchanged.
pub fn lemmatize(word: &str) -> String {
    const KEEP_ENDINGS: [&str; 4] = ["ss", "us", "is", "ous"];

    if word.len() <= 3 || KEEP_ENDINGS.iter().any(|e| word.ends_with(e)) {
        return word.to_string();
    }

    // (suffix, replacement), longest first
    const RULES: [(&str, &str); 7] = [
        ("ches", "ch"),
        ("shes", "sh"),
        ("sses", "ss"),
        ("ies", "y"),
        ("xes", "x"),
        ("zes", "z"),
        ("s", ""),
    ];

    for (suffix, repl) in RULES {
        if let Some(stem) = word.strip_suffix(suffix) {
            if stem.len() >= 2 {
                return format!("{stem}{repl}");
            }
        }
    }
    word.to_string()
}
