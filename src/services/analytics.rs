//! Mood analytics derived from a window of mood entries.
//!
//! Everything here is a pure function of its input. Range selection happens
//! in the caller; entries must already be filtered and sorted oldest first.

use chrono::{FixedOffset, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::mood::MoodEntry;
use crate::services::calendar::CalendarDay;

/// Number of entries in each of the "recent" and "older" trend windows.
const TREND_WINDOW: usize = 3;
/// Mean difference that has to be exceeded before a trend is reported.
const TREND_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrend {
    Improving,
    Declining,
    Stable,
    /// Not enough entries to compare.
    Neutral,
}

#[derive(Debug, Serialize)]
pub struct MoodAnalytics {
    pub entries: Vec<MoodEntry>,
    /// 0.0 when there are no entries; check `total_entries` to tell the two apart.
    pub average_mood: f64,
    pub total_entries: usize,
    pub mood_trend: MoodTrend,
    /// `None` when there is no data.
    pub best_day: Option<String>,
}

pub fn compute_analytics(entries: Vec<MoodEntry>, offset: FixedOffset) -> MoodAnalytics {
    let scores: Vec<i32> = entries.iter().map(|e| e.mood_score).collect();
    let best_day = best_day(&entries, offset).map(str::to_string);

    MoodAnalytics {
        average_mood: average_mood(&scores),
        total_entries: entries.len(),
        mood_trend: mood_trend(&scores),
        best_day,
        entries,
    }
}

pub fn average_mood(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    mean(scores)
}

/// Compares the mean of the last three scores with the mean of the three
/// before them. Positional, not calendar aligned.
pub fn mood_trend(scores: &[i32]) -> MoodTrend {
    if scores.len() < 2 {
        return MoodTrend::Neutral;
    }

    let split = scores.len().saturating_sub(TREND_WINDOW);
    let recent = &scores[split..];
    let older = &scores[split.saturating_sub(TREND_WINDOW)..split];

    if recent.is_empty() || older.is_empty() {
        return MoodTrend::Neutral;
    }

    let recent_avg = mean(recent);
    let older_avg = mean(older);

    if recent_avg > older_avg + TREND_THRESHOLD {
        MoodTrend::Improving
    } else if recent_avg < older_avg - TREND_THRESHOLD {
        MoodTrend::Declining
    } else {
        MoodTrend::Stable
    }
}

/// Weekday with the highest average score. Buckets are compared in the order
/// their weekday first appears, so the earliest bucket wins a tie.
pub fn best_day(entries: &[MoodEntry], offset: FixedOffset) -> Option<&'static str> {
    let mut buckets: Vec<(Weekday, &'static str, i64, u32)> = Vec::with_capacity(7);

    for entry in entries {
        let day = CalendarDay::of(entry.created_at, offset);
        let weekday = day.weekday();
        match buckets.iter_mut().find(|(w, ..)| *w == weekday) {
            Some((_, _, total, count)) => {
                *total += i64::from(entry.mood_score);
                *count += 1;
            }
            None => buckets.push((weekday, day.weekday_name(), i64::from(entry.mood_score), 1)),
        }
    }

    let mut best = None;
    let mut best_average = 0.0;
    for (_, name, total, count) in buckets {
        let average = total as f64 / f64::from(count);
        if average > best_average {
            best_average = average;
            best = Some(name);
        }
    }
    best
}

fn mean(scores: &[i32]) -> f64 {
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    sum as f64 / scores.len() as f64
}
