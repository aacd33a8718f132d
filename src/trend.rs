//! # Mood Trend
//! Direction of recent mood scores (improving / declining / stable).
//!
//! Stateless: callers own the history and pass it in, either as bare scores
//! in chronological order or as timestamped [`MoodSample`]s.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// Mean step must exceed this (strictly) to count as a direction.
pub const TREND_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrend {
    Improving,
    Declining,
    Stable,
}

/// Trend over the last `window` scores (oldest first).
///
/// Fewer than three scores in the window is always `Stable`. `window == 0`
/// takes every score.
pub fn mood_trend(scores: &[f64], window: usize) -> MoodTrend {
    if scores.len() < 2 {
        return MoodTrend::Stable;
    }

    let start = if window == 0 {
        0
    } else {
        scores.len().saturating_sub(window)
    };
    let recent = &scores[start..];
    if recent.len() < 3 {
        return MoodTrend::Stable;
    }

    let steps: f64 = recent.windows(2).map(|w| w[1] - w[0]).sum();
    let avg_step = steps / (recent.len() - 1) as f64;

    if avg_step > TREND_THRESHOLD {
        MoodTrend::Improving
    } else if avg_step < -TREND_THRESHOLD {
        MoodTrend::Declining
    } else {
        MoodTrend::Stable
    }
}

/// One stored analysis result: when it happened and its mood score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodSample {
    pub at: DateTime<Utc>,
    pub score: f64,
}

impl MoodSample {
    pub fn new(at: DateTime<Utc>, score: f64) -> Self {
        Self { at, score }
    }
}

/// Trend over samples from the last `days` days, in time order.
pub fn trend_since(samples: &[MoodSample], now: DateTime<Utc>, days: u32) -> MoodTrend {
    // Ranges reaching past the earliest representable date keep everything.
    let cutoff = now.checked_sub_signed(Duration::days(i64::from(days)));
    let mut recent: Vec<&MoodSample> = samples
        .iter()
        .filter(|s| cutoff.map_or(true, |c| s.at >= c))
        .collect();
    recent.sort_by_key(|s| s.at);

    let scores: Vec<f64> = recent.iter().map(|s| s.score).collect();
    mood_trend(&scores, days as usize)
}

/// Dashboard numbers for a history of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodSummary {
    pub count: usize,
    pub average: f64,
    pub trend: MoodTrend,
}

/// Count and mean over all samples; trend over the last `days`.
pub fn summarize(samples: &[MoodSample], now: DateTime<Utc>, days: u32) -> MoodSummary {
    let count = samples.len();
    let average = if count == 0 {
        0.0
    } else {
        samples.iter().map(|s| s.score).sum::<f64>() / count as f64
    };
    MoodSummary {
        count,
        average,
        trend: trend_since(samples, now, days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn short_histories_are_stable() {
        assert_eq!(mood_trend(&[], 7), MoodTrend::Stable);
        assert_eq!(mood_trend(&[0.9], 7), MoodTrend::Stable);
        assert_eq!(mood_trend(&[-1.0, 1.0], 7), MoodTrend::Stable);
    }

    #[test]
    fn window_shorter_than_three_is_stable() {
        assert_eq!(mood_trend(&[0.0, 0.5, 1.0], 2), MoodTrend::Stable);
    }

    #[test]
    fn only_the_tail_counts() {
        // early climb is outside the window; the last three are flat
        let scores = [-1.0, 0.0, 1.0, 0.4, 0.4, 0.4];
        assert_eq!(mood_trend(&scores, 3), MoodTrend::Stable);
        assert_eq!(mood_trend(&scores, 0), MoodTrend::Improving);
    }

    #[test]
    fn samples_outside_range_are_ignored_and_sorted() {
        let now = at(20);
        let samples = [
            MoodSample::new(at(19), 0.6),
            MoodSample::new(at(1), -1.0),
            MoodSample::new(at(15), 0.0),
            MoodSample::new(at(17), 0.3),
        ];
        assert_eq!(trend_since(&samples, now, 7), MoodTrend::Improving);
    }

    #[test]
    fn huge_day_ranges_keep_every_sample() {
        let now = at(20);
        let samples = [
            MoodSample::new(at(1), 0.9),
            MoodSample::new(at(10), 0.5),
            MoodSample::new(at(19), 0.1),
        ];
        assert_eq!(trend_since(&samples, now, u32::MAX), MoodTrend::Declining);
        let s = summarize(&samples, now, u32::MAX);
        assert_eq!(s.count, 3);
        assert_eq!(s.trend, MoodTrend::Declining);
    }

    #[test]
    fn summary_of_nothing() {
        let s = summarize(&[], at(10), 7);
        assert_eq!(s.count, 0);
        assert_eq!(s.average, 0.0);
        assert_eq!(s.trend, MoodTrend::Stable);
    }

    #[test]
    fn summary_averages_everything() {
        let samples = [
            MoodSample::new(at(1), 1.0),
            MoodSample::new(at(9), 0.0),
            MoodSample::new(at(10), -0.5),
        ];
        let s = summarize(&samples, at(10), 7);
        assert_eq!(s.count, 3);
        assert!((s.average - 0.5 / 3.0).abs() < 1e-6);
        // two samples in range
        assert_eq!(s.trend, MoodTrend::Stable);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MoodTrend::Declining).unwrap(), "\"declining\"");
    }
}
