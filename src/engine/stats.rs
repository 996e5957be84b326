//! Derived Statistics
//!
//! Pure helpers recomputing the figures the remote insights endpoint does
//! not supply pre-aggregated: the day streak and the weekly energy average.

use crate::models::{MoodEntry, RemoteInsights, WeeklyAverage, WellnessStats};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Count consecutive calendar days, walking backward from `today`, with at
/// least one mood entry each day. Stops at the first gap.
pub fn day_streak(entries: &[MoodEntry], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = entries.iter().map(|e| e.created_at.date_naive()).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let mut streak = 0;
    let mut current = today;
    for date in dates {
        if date > current {
            // Future-dated entries do not break the walk
            continue;
        }
        if date < current {
            break;
        }
        streak += 1;
        match current.pred_opt() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    streak
}

/// Averages over entries observed within the last seven days. Energy and
/// stress only average the entries that carry those values.
pub fn weekly_average(entries: &[MoodEntry], now: DateTime<Utc>) -> WeeklyAverage {
    let cutoff = now - Duration::days(7);
    let recent: Vec<&MoodEntry> = entries.iter().filter(|e| e.created_at >= cutoff).collect();

    WeeklyAverage {
        mood: mean(recent.iter().map(|e| f64::from(e.mood_score))),
        energy: mean(recent.iter().filter_map(|e| e.energy).map(f64::from)),
        stress: mean(recent.iter().filter_map(|e| e.stress).map(f64::from)),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u32;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Combine remote insights with locally recomputed figures.
///
/// The insights payload carries overall mood/stress averages and the entry
/// count; the day streak and weekly energy average are derived from the
/// freshly fetched mood history.
pub fn build_stats(
    entries: &[MoodEntry],
    insights: &RemoteInsights,
    now: DateTime<Utc>,
) -> WellnessStats {
    let weekly = weekly_average(entries, now);
    WellnessStats {
        overall_score: insights.average_mood,
        day_streak: day_streak(entries, now.date_naive()),
        total_activities: insights.mood_entries_count,
        weekly_average: WeeklyAverage {
            mood: insights.average_mood,
            energy: weekly.energy,
            stress: insights.average_stress,
        },
        last_calculated: now,
        synced: true,
    }
}
