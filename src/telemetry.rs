//! # Telemetry
//! Tracing setup and log-safe identifiers.
//!
//! Entries analyzed here are private by nature (journals, check-ins), so raw
//! text never goes to the log. Use [`anon_hash`] to correlate log lines with
//! an input instead.

use sha2::{Digest, Sha256};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "MOOD_LOG_JSON";
const DEFAULT_FILTER: &str = "mood_analyzer=info,mood=info,warn";

/// Install the global subscriber. Honors `RUST_LOG`; `MOOD_LOG_JSON=1`
/// switches to JSON lines. Safe to call more than once (later calls no-op).
pub fn init_tracing() {
    let json = std::env::var(ENV_LOG_JSON)
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };

    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Short, stable, non-reversible id for a text (first 6 bytes of SHA-256, hex).
pub fn anon_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_stable_and_distinct() {
        let a = anon_hash("I had a rough day");
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, anon_hash("I had a rough day"));
        assert_ne!(a, anon_hash("I had a good day"));
    }

    #[test]
    fn anon_hash_of_empty_input() {
        // SHA-256("") = e3b0c44298fc...
        assert_eq!(anon_hash(""), "e3b0c44298fc");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing();
        init_tracing();
    }
}
