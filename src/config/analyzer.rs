// src/config/analyzer.rs
//! Analyzer configuration (`config/analyzer.toml`).
//!
//! Every section and key is optional; a missing file is the same as an empty
//! one. Values that make no sense (zero timeout, zero window) are repaired to
//! their defaults instead of failing.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};
use tracing::{debug, info};

use crate::trend::DEFAULT_WINDOW_DAYS;

pub const DEFAULT_CONFIG_PATH: &str = "config/analyzer.toml";

pub const ENV_CONFIG_PATH: &str = "MOOD_ANALYZER_CONFIG";
pub const ENV_CLASSIFIER_ENABLED: &str = "CLASSIFIER_ENABLED";
pub const ENV_CLASSIFIER_TIMEOUT_MS: &str = "CLASSIFIER_TIMEOUT_MS";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";

pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub preprocess: PreprocessConfig,
    pub lexicon: LexiconConfig,
    pub trend: TrendConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub lemmatize: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// JSON lexicon replacing the built-in tables.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub window_days: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub enabled: bool,
    /// "huggingface" | "mock" (case-insensitive)
    pub provider: String,
    /// "ENV" means: read from HF_API_TOKEN
    pub api_key: String,
    pub endpoint: String,
    pub sentiment_model: String,
    pub emotion_model: String,
    pub timeout_ms: u64,
    /// Real provider calls allowed per UTC day.
    pub daily_limit: u32,
    /// `None` disables the on-disk cache (and the daily limit with it).
    pub cache_dir: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "huggingface".into(),
            api_key: "ENV".into(),
            endpoint: "https://api-inference.huggingface.co/models".into(),
            sentiment_model: "cardiffnlp/twitter-roberta-base-sentiment-latest".into(),
            emotion_model: "j-hartmann/emotion-english-distilroberta-base".into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            daily_limit: 500,
            cache_dir: Some(PathBuf::from("cache/classifier")),
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> std::time::Duration {
        let ms = if self.timeout_ms == 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            self.timeout_ms
        };
        std::time::Duration::from_millis(ms)
    }

    /// Sanitized copy with the API key resolved. Idempotent, so configs that
    /// already went through `load_from_file` / `from_env` pass unchanged.
    pub fn resolved(&self) -> Result<Self> {
        let mut c = self.clone();
        c.sanitize();
        c.resolve_api_key()?;
        Ok(c)
    }

    fn sanitize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if self.provider.is_empty() {
            self.provider = ClassifierConfig::default().provider;
        }
        if self.timeout_ms == 0 {
            self.timeout_ms = DEFAULT_TIMEOUT_MS;
        }
    }

    fn resolve_api_key(&mut self) -> Result<()> {
        if !self.api_key.trim().eq_ignore_ascii_case("env") {
            return Ok(());
        }
        match env::var(ENV_HF_API_TOKEN) {
            Ok(token) if !token.trim().is_empty() => self.api_key = token.trim().to_string(),
            _ if self.enabled && self.provider == "huggingface" => {
                bail!("Missing {ENV_HF_API_TOKEN} env var")
            }
            // Not needed: the classifier is off or does not use a token.
            _ => self.api_key.clear(),
        }
        Ok(())
    }
}

impl AnalyzerConfig {
    /// Parse TOML without sanitizing or resolving secrets.
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parsing analyzer config TOML")
    }

    /// Read, sanitize and resolve a config file. No env overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading analyzer config {}", path.display()))?;
        let cfg = Self::parse(&raw).with_context(|| format!("in {}", path.display()))?;
        cfg.finalize()
    }

    /// Config as the process sees it: file at `MOOD_ANALYZER_CONFIG` (or
    /// `config/analyzer.toml`) if present, then env overrides.
    pub fn from_env() -> Result<Self> {
        let path = env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut cfg = if Path::new(&path).exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading analyzer config {path}"))?;
            info!(path = %path, "analyzer config loaded");
            Self::parse(&raw).with_context(|| format!("in {path}"))?
        } else {
            debug!(path = %path, "no analyzer config file, using defaults");
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.finalize()
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = env::var(ENV_CLASSIFIER_ENABLED) {
            self.classifier.enabled = parse_bool(&v)
                .ok_or_else(|| anyhow!("{ENV_CLASSIFIER_ENABLED} must be true/false, got {v:?}"))?;
        }
        if let Ok(v) = env::var(ENV_CLASSIFIER_TIMEOUT_MS) {
            self.classifier.timeout_ms = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_CLASSIFIER_TIMEOUT_MS} must be milliseconds"))?;
        }
        Ok(())
    }

    fn finalize(mut self) -> Result<Self> {
        self.sanitize();
        self.classifier.resolve_api_key()?;
        Ok(self)
    }

    /// Repair out-of-range values in place.
    pub fn sanitize(&mut self) {
        self.classifier.sanitize();
        if self.trend.window_days == 0 {
            self.trend.window_days = DEFAULT_WINDOW_DAYS;
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = AnalyzerConfig::parse("").unwrap();
        assert!(!cfg.preprocess.lemmatize);
        assert!(cfg.lexicon.path.is_none());
        assert_eq!(cfg.trend.window_days, 7);
        assert!(!cfg.classifier.enabled);
        assert_eq!(cfg.classifier.timeout_ms, 3_000);
        assert_eq!(cfg.classifier.daily_limit, 500);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let mut cfg = AnalyzerConfig::parse(
            r#"
            [classifier]
            provider = "Mock"
            timeout_ms = 0

            [trend]
            window_days = 0
            "#,
        )
        .unwrap();
        cfg.sanitize();
        assert_eq!(cfg.classifier.provider, "mock");
        assert_eq!(cfg.classifier.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(cfg.trend.window_days, DEFAULT_WINDOW_DAYS);
        assert_eq!(
            cfg.classifier.sentiment_model,
            "cardiffnlp/twitter-roberta-base-sentiment-latest"
        );
    }

    #[test]
    fn bad_toml_is_an_error() {
        let err = AnalyzerConfig::parse("[trend]\nwindow_days = \"seven\"").unwrap_err();
        assert!(format!("{err:#}").contains("parsing analyzer config"));
    }

    #[test]
    fn zero_timeout_reads_as_default() {
        let c = ClassifierConfig {
            timeout_ms: 0,
            ..ClassifierConfig::default()
        };
        assert_eq!(c.timeout().as_millis(), u128::from(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn resolved_normalizes_provider_and_skips_unused_key() {
        let c = ClassifierConfig {
            enabled: true,
            provider: " Mock ".into(),
            api_key: "ENV".into(),
            timeout_ms: 0,
            ..ClassifierConfig::default()
        };
        let r = c.resolved().unwrap();
        assert_eq!(r.provider, "mock");
        assert_eq!(r.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_ne!(r.api_key, "ENV");
        // already resolved: unchanged
        let again = r.resolved().unwrap();
        assert_eq!(again.provider, r.provider);
        assert_eq!(again.api_key, r.api_key);
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
