//! Consecutive-day habit streaks.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::services::calendar::CalendarDay;

/// Default number of days scanned backward from today.
pub const DEFAULT_SCAN_DAYS: u32 = 30;

/// Walks backward from `today`, counting days for which `has_completion`
/// holds, and stops at the first day without one. Today is part of the
/// scan, so a habit not yet completed today has a streak of 0. The walk
/// never looks further back than `max_days` days.
pub fn compute_streak<F>(habit_id: Uuid, has_completion: F, today: CalendarDay, max_days: u32) -> u32
where
    F: Fn(Uuid, CalendarDay) -> bool,
{
    let mut streak = 0;
    let mut day = Some(today);

    while let Some(current) = day {
        if streak >= max_days || !has_completion(habit_id, current) {
            break;
        }
        streak += 1;
        day = current.pred();
    }

    streak
}

/// Set of local days on which a habit was completed. Several completions
/// on one day collapse into a single entry.
#[derive(Debug, Default)]
pub struct CompletionDays {
    days: HashSet<CalendarDay>,
}

impl CompletionDays {
    pub fn from_timestamps<I>(timestamps: I, offset: FixedOffset) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        Self {
            days: timestamps
                .into_iter()
                .map(|ts| CalendarDay::of(ts, offset))
                .collect(),
        }
    }

    pub fn contains(&self, day: CalendarDay) -> bool {
        self.days.contains(&day)
    }

    /// Streak for a single habit whose completions built this set.
    pub fn streak(&self, habit_id: Uuid, today: CalendarDay, max_days: u32) -> u32 {
        compute_streak(habit_id, |_, day| self.contains(day), today, max_days)
    }
}
