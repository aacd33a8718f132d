//! Smoke-test probe: runs text through the analyzer and prints JSON lines.
//!
//! `mood_probe "some text" "more text"` analyzes the arguments; with no
//! arguments a few built-in samples are used, followed by their trend.

use anyhow::Result;
use chrono::{Duration, Utc};
use mood_analyzer::telemetry::init_tracing;
use mood_analyzer::{summarize, AnalyzerConfig, MoodAnalyzer, MoodSample};

const SAMPLES: [&str; 5] = [
    "Everything feels heavy and I am so tired and lonely",
    "Work was stressful but the evening walk was peaceful",
    "Had a good chat with an old friend, feeling better",
    "Really happy and grateful for this weekend",
    "Excited about the trip, great start to the week",
];

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AnalyzerConfig::from_env()?;
    let analyzer = MoodAnalyzer::from_config(&cfg)?;
    tracing::info!(classifier = ?analyzer.classifier_name(), "mood probe starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let texts: Vec<&str> = if args.is_empty() {
        SAMPLES.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    let now = Utc::now();
    let mut history = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        let analysis = analyzer.analyze_enhanced(text).await;
        if let Some(alert) = analysis.emergency.alert_summary() {
            eprintln!("ALERT: {alert}");
        }
        println!("{}", serde_json::to_string(&analysis)?);

        // one entry per day, oldest first
        let days_ago = (texts.len() - 1 - i) as i64;
        history.push(MoodSample::new(
            now - Duration::days(days_ago),
            f64::from(analysis.mood_score()),
        ));
    }

    let summary = summarize(&history, now, cfg.trend.window_days as u32);
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
