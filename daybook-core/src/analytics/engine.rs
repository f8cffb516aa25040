//! Temporal statistics over journal entries
//!
//! [`StatsEngine`] turns a materialized slice of one owner's entries into
//! streaks, day/week buckets, completion rates and distributions. It holds
//! no state between calls and never reads the wall clock: every
//! time-sensitive operation takes `now` (or `as_of`) explicitly.
//!
//! Dates are compared by calendar day in the engine's time zone, so two
//! entries logged at 08:00 and 23:30 on the same local day always land in
//! the same bucket.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

use super::insights::InsightThresholds;
use crate::error::{Error, Result};
use crate::types::{DecisionCategory, DecisionEntry, FocusEntry, FocusStatus};

/// Round to the nearest integer, halves going up (2.5 -> 3, -2.5 -> -2).
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn raw_rate(achieved: i64, total: i64) -> f64 {
    if total > 0 {
        achieved as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Completion percentage, 0 when there is nothing to complete.
pub fn completion_rate(achieved: i64, total: i64) -> i64 {
    if total > 0 {
        round_half_up(raw_rate(achieved, total))
    } else {
        0
    }
}

/// Signed percentage-point change between this week's and last week's rate.
pub fn weekly_trend(
    this_week_achieved: i64,
    this_week_total: i64,
    last_week_achieved: i64,
    last_week_total: i64,
) -> i64 {
    round_half_up(
        raw_rate(this_week_achieved, this_week_total) - raw_rate(last_week_achieved, last_week_total),
    )
}

/// Aggregated counts for one time slice (a day or a week).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    /// Chart label ("Mon", "Week 1")
    pub label: String,
    /// First calendar day covered by this bucket
    pub start: NaiveDate,
    /// Entries with status `ACHIEVED`
    pub achieved_count: i64,
    /// All entries in the slice
    pub total_count: i64,
}

impl DayBucket {
    fn new(label: String, start: NaiveDate) -> Self {
        Self {
            label,
            start,
            achieved_count: 0,
            total_count: 0,
        }
    }

    fn record(&mut self, entry: &FocusEntry) {
        self.total_count += 1;
        if entry.is_achieved() {
            self.achieved_count += 1;
        }
    }

    /// Completion rate of this bucket.
    pub fn rate(&self) -> i64 {
        completion_rate(self.achieved_count, self.total_count)
    }
}

/// Occurrence counts keyed by first appearance.
///
/// Keys with a zero count never appear. Iteration order is the order in
/// which each key was first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution<K> {
    counts: Vec<(K, i64)>,
}

impl<K: PartialEq> Distribution<K> {
    /// Count keys, preserving first-seen order.
    pub fn from_keys(keys: impl IntoIterator<Item = K>) -> Self {
        let mut counts: Vec<(K, i64)> = Vec::new();
        for key in keys {
            match counts.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => counts.push((key, 1)),
            }
        }
        Self { counts }
    }

    /// Count for a key (0 if absent).
    pub fn get(&self, key: &K) -> i64 {
        self.counts
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> i64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, i64)> {
        self.counts.iter().map(|(k, count)| (k, *count))
    }

    /// Key with the highest count. Ties go to the key seen first.
    pub fn dominant(&self) -> Option<(&K, i64)> {
        let mut best: Option<(&K, i64)> = None;
        for (key, count) in self.iter() {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((key, count));
            }
        }
        best
    }
}

/// Streak statistics over a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakStats {
    /// Consecutive achieved days ending today
    pub current_streak: i64,
    /// Longest run of consecutive achieved days in the window
    pub longest_streak: i64,
    /// Days in the window with at least one achieved entry
    pub active_days: i64,
    /// Days in the window
    pub total_days: i64,
}

impl StreakStats {
    /// Share of days in the window that were active.
    pub fn activity_percentage(&self) -> i64 {
        completion_rate(self.active_days, self.total_days)
    }
}

/// Pure statistics engine, parameterized by the time zone that defines
/// calendar days.
#[derive(Debug, Clone)]
pub struct StatsEngine<Tz: TimeZone> {
    tz: Tz,
    thresholds: InsightThresholds,
}

impl StatsEngine<Local> {
    /// Engine using the system's local time zone.
    pub fn local() -> Self {
        Self::new(Local)
    }
}

impl<Tz: TimeZone> StatsEngine<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            thresholds: InsightThresholds::default(),
        }
    }

    /// Replace the insight thresholds.
    pub fn with_thresholds(mut self, thresholds: InsightThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &InsightThresholds {
        &self.thresholds
    }

    pub(crate) fn time_zone(&self) -> &Tz {
        &self.tz
    }

    /// Calendar day of a timestamp in the engine's time zone.
    pub fn day_of(&self, ts: &DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.tz).date_naive()
    }

    fn achieved_days(&self, entries: &[FocusEntry]) -> HashSet<NaiveDate> {
        entries
            .iter()
            .filter(|e| e.is_achieved())
            .map(|e| self.day_of(&e.date))
            .collect()
    }

    /// Consecutive days, walking back from the day of `as_of`, that have at
    /// least one `ACHIEVED` entry.
    ///
    /// A day without an achieved entry ends the walk, including `as_of`'s
    /// own day, so nothing achieved today means a streak of 0.
    pub fn compute_streak(&self, entries: &[FocusEntry], as_of: DateTime<Utc>) -> i64 {
        if entries.is_empty() {
            return 0;
        }

        let achieved = self.achieved_days(entries);
        let mut streak = 0;
        let mut cursor = Some(self.day_of(&as_of));

        while let Some(day) = cursor {
            if !achieved.contains(&day) {
                break;
            }
            streak += 1;
            cursor = day.pred_opt();
        }

        streak
    }

    /// One bucket per calendar day from `window_start` to `window_end`
    /// inclusive, oldest first, labeled by weekday ("Mon").
    ///
    /// The window must span exactly seven calendar days.
    pub fn bucket_by_week(
        &self,
        entries: &[FocusEntry],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<[DayBucket; 7]> {
        let first = self.day_of(&window_start);
        let last = self.day_of(&window_end);
        let span = (last - first).num_days() + 1;
        if span != 7 {
            return Err(Error::Computation(format!(
                "weekly window must cover 7 days, got {} ({} to {})",
                span, first, last
            )));
        }

        Ok(self.week_ending(entries, last))
    }

    /// The seven calendar days ending on `last_day`, oldest first.
    ///
    /// Callers holding a calendar day should use this rather than converting
    /// back to timestamps: days are not always 24 hours long.
    pub fn week_ending(&self, entries: &[FocusEntry], last_day: NaiveDate) -> [DayBucket; 7] {
        let first = last_day - Duration::days(6);

        let mut buckets: [DayBucket; 7] = std::array::from_fn(|i| {
            let day = first + Duration::days(i as i64);
            DayBucket::new(day.format("%a").to_string(), day)
        });

        for entry in entries {
            let offset = (self.day_of(&entry.date) - first).num_days();
            if (0..7).contains(&offset) {
                buckets[offset as usize].record(entry);
            }
        }

        buckets
    }

    /// Four contiguous seven-day buckets ("Week 1".."Week 4") covering the
    /// 28 days starting at `window_start`.
    pub fn bucket_by_month(
        &self,
        entries: &[FocusEntry],
        window_start: DateTime<Utc>,
    ) -> [DayBucket; 4] {
        self.month_from(entries, self.day_of(&window_start))
    }

    /// Four seven-day buckets covering the 28 calendar days from `first_day`.
    pub fn month_from(&self, entries: &[FocusEntry], first_day: NaiveDate) -> [DayBucket; 4] {
        let mut buckets: [DayBucket; 4] = std::array::from_fn(|i| {
            DayBucket::new(
                format!("Week {}", i + 1),
                first_day + Duration::days(7 * i as i64),
            )
        });

        for entry in entries {
            let offset = (self.day_of(&entry.date) - first_day).num_days();
            if (0..28).contains(&offset) {
                buckets[(offset / 7) as usize].record(entry);
            }
        }

        buckets
    }

    /// Current streak plus longest run and activity over
    /// `[window_start, as_of]`.
    pub fn streak_stats(
        &self,
        entries: &[FocusEntry],
        window_start: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> StreakStats {
        let first = self.day_of(&window_start);
        let last = self.day_of(&as_of);
        if last < first {
            return StreakStats::default();
        }

        let achieved: HashSet<NaiveDate> = self
            .achieved_days(entries)
            .into_iter()
            .filter(|day| (first..=last).contains(day))
            .collect();

        let mut longest = 0;
        let mut run = 0;
        for day in first.iter_days().take_while(|day| *day <= last) {
            if achieved.contains(&day) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }

        StreakStats {
            current_streak: self.compute_streak(entries, as_of),
            longest_streak: longest,
            active_days: achieved.len() as i64,
            total_days: (last - first).num_days() + 1,
        }
    }

    /// Entries dated in the half-open range `(from, to]`.
    pub fn count_in_range(
        &self,
        entries: &[FocusEntry],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> i64 {
        entries
            .iter()
            .filter(|e| e.date > from && e.date <= to)
            .count() as i64
    }

    /// Decisions per category.
    pub fn category_distribution(&self, entries: &[DecisionEntry]) -> Distribution<DecisionCategory> {
        Distribution::from_keys(entries.iter().map(|e| e.category))
    }

    /// Focus entries per mood string, exactly as typed.
    ///
    /// "Happy" and "happy " are different keys: moods are free text and are
    /// not normalized.
    pub fn mood_distribution(&self, entries: &[FocusEntry]) -> Distribution<String> {
        Distribution::from_keys(entries.iter().map(|e| e.mood.clone()))
    }

    /// Focus entries per status.
    pub fn status_breakdown(&self, entries: &[FocusEntry]) -> Distribution<FocusStatus> {
        Distribution::from_keys(entries.iter().map(|e| e.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn engine() -> StatsEngine<Utc> {
        StatsEngine::new(Utc)
    }

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn focus(day: u32, hour: u32, status: FocusStatus) -> FocusEntry {
        FocusEntry::new("u1", "focus", status, "calm", ts(day, hour))
    }

    fn decision(category: DecisionCategory) -> DecisionEntry {
        DecisionEntry::new("u1", "decide", category, ts(1, 12))
    }

    #[test]
    fn test_streak_counts_consecutive_achieved_days() {
        let entries = vec![
            focus(10, 9, FocusStatus::Achieved),
            focus(9, 9, FocusStatus::Achieved),
            focus(8, 9, FocusStatus::NotAchieved),
        ];
        assert_eq!(engine().compute_streak(&entries, ts(10, 20)), 2);
    }

    #[test]
    fn test_streak_zero_when_today_not_achieved() {
        let entries = vec![
            focus(10, 9, FocusStatus::Pending),
            focus(9, 9, FocusStatus::Achieved),
            focus(8, 9, FocusStatus::Achieved),
        ];
        assert_eq!(engine().compute_streak(&entries, ts(10, 20)), 0);
        // Moving as_of back onto the achieved run picks it up again
        assert_eq!(engine().compute_streak(&entries, ts(9, 20)), 2);
    }

    #[test]
    fn test_streak_empty_and_unsorted() {
        assert_eq!(engine().compute_streak(&[], ts(10, 0)), 0);

        let entries = vec![
            focus(8, 9, FocusStatus::Achieved),
            focus(10, 23, FocusStatus::Achieved),
            focus(9, 1, FocusStatus::Achieved),
            focus(9, 2, FocusStatus::NotAchieved),
        ];
        assert_eq!(engine().compute_streak(&entries, ts(10, 0)), 3);
    }

    #[test]
    fn test_streak_uses_engine_time_zone() {
        // 2024-06-10 02:00 UTC is still June 9th in UTC-5
        let entries = vec![
            focus(10, 2, FocusStatus::Achieved),
            focus(8, 12, FocusStatus::Achieved),
        ];
        let eastern = StatsEngine::new(FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(eastern.compute_streak(&entries, ts(9, 20)), 2);
        assert_eq!(engine().compute_streak(&entries, ts(9, 20)), 0);
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(4, 5), 80);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(1, 8), 13); // 12.5 rounds up
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(7, 7), 100);
    }

    #[test]
    fn test_completion_rate_bounds() {
        for total in 0..=25 {
            for achieved in 0..=total {
                let rate = completion_rate(achieved, total);
                assert!((0..=100).contains(&rate), "{}/{} -> {}", achieved, total, rate);
            }
        }
    }

    #[test]
    fn test_weekly_trend() {
        assert_eq!(weekly_trend(3, 5, 1, 5), 40);
        assert_eq!(weekly_trend(1, 5, 3, 5), -40);
        assert_eq!(weekly_trend(0, 0, 1, 2), -50);
        assert_eq!(weekly_trend(1, 3, 0, 0), 33);
        // -12.5 rounds toward positive infinity
        assert_eq!(weekly_trend(0, 8, 1, 8), -12);
    }

    #[test]
    fn test_bucket_by_week_same_day_different_times() {
        let entries = vec![
            focus(4, 0, FocusStatus::Achieved),
            focus(4, 23, FocusStatus::NotAchieved),
            focus(7, 12, FocusStatus::Achieved),
            focus(1, 12, FocusStatus::Achieved),
            focus(8, 0, FocusStatus::Achieved),  // after window
        ];
        let buckets = engine()
            .bucket_by_week(&entries, ts(2, 0), ts(8, 0) - Duration::seconds(1))
            .unwrap_err();
        assert!(matches!(buckets, Error::Computation(_)));

        let buckets = engine()
            .bucket_by_week(&entries, ts(2, 0), ts(8, 0) - Duration::days(1))
            .unwrap_err();
        assert!(matches!(buckets, Error::Computation(_)));

        let buckets = engine().bucket_by_week(&entries, ts(1, 12), ts(7, 18));
        let buckets = buckets.unwrap();
        assert_eq!(buckets.len(), 7);
        // 2024-06-01 was a Saturday
        assert_eq!(buckets[0].label, "Sat");
        assert_eq!(buckets[6].label, "Fri");
        assert_eq!(buckets[3].total_count, 2);
        assert_eq!(buckets[3].achieved_count, 1);
        assert_eq!(buckets[6].achieved_count, 1);
        assert_eq!(buckets[0].total_count, 1);
    }

    #[test]
    fn test_bucket_by_week_excludes_entries_outside_window() {
        let entries: Vec<FocusEntry> = (1..=20)
            .map(|day| focus(day, 10, FocusStatus::Achieved))
            .collect();
        let buckets = engine().bucket_by_week(&entries, ts(5, 0), ts(11, 23)).unwrap();
        let total: i64 = buckets.iter().map(|b| b.total_count).sum();
        assert_eq!(total, 7);
        assert!(buckets.iter().all(|b| b.rate() == 100));
        assert_eq!(buckets[0].start, NaiveDate::from_ymd_opt(2024, 6, 5).unwrap());
    }

    #[test]
    fn test_week_ending_spans_dst_change() {
        let ny = StatsEngine::new(chrono_tz::America::New_York);
        let entries = vec![
            // 23:59 EST on 2024-03-04, the day before the window
            FocusEntry::new("u1", "f", FocusStatus::Achieved, "", Utc.with_ymd_and_hms(2024, 3, 5, 4, 59, 0).unwrap()),
            // 00:00 EST on 2024-03-05
            FocusEntry::new("u1", "f", FocusStatus::Achieved, "", Utc.with_ymd_and_hms(2024, 3, 5, 5, 0, 0).unwrap()),
            // 23:30 EDT on 2024-03-11
            FocusEntry::new("u1", "f", FocusStatus::Achieved, "", Utc.with_ymd_and_hms(2024, 3, 12, 3, 30, 0).unwrap()),
        ];

        let now = Utc.with_ymd_and_hms(2024, 3, 11, 4, 30, 0).unwrap();
        let buckets = ny.week_ending(&entries, ny.day_of(&now));
        assert_eq!(buckets[0].start, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(buckets[0].label, "Tue");
        assert_eq!(buckets[6].label, "Mon");
        assert_eq!(buckets[0].total_count, 1);
        assert_eq!(buckets[6].total_count, 1);

        // Six 24-hour days back from 00:30 EDT lands on 23:30 EST the day before
        let err = ny.bucket_by_week(&entries, now - Duration::days(6), now).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[test]
    fn test_month_from_matches_bucket_by_month() {
        let entries: Vec<FocusEntry> = (1..=28)
            .map(|day| focus(day, 9, FocusStatus::Achieved))
            .collect();
        let first = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            engine().month_from(&entries, first),
            engine().bucket_by_month(&entries, ts(1, 0))
        );
        assert!(engine().month_from(&entries, first).iter().all(|b| b.total_count == 7));
    }

    #[test]
    fn test_bucket_by_month() {
        let mut entries = vec![
            focus(1, 9, FocusStatus::Achieved),
            focus(3, 9, FocusStatus::Achieved),
            focus(7, 23, FocusStatus::Achieved),
            focus(8, 9, FocusStatus::Achieved),
            focus(14, 9, FocusStatus::Achieved),
        ];
        entries.push(focus(15, 9, FocusStatus::NotAchieved));
        entries.push(focus(29, 9, FocusStatus::Achieved)); // day 29, outside

        let buckets = engine().bucket_by_month(&entries, ts(1, 0));
        let summary: Vec<(&str, i64)> = buckets
            .iter()
            .map(|b| (b.label.as_str(), b.achieved_count))
            .collect();
        assert_eq!(
            summary,
            vec![("Week 1", 3), ("Week 2", 2), ("Week 3", 0), ("Week 4", 0)]
        );
        assert_eq!(buckets[2].total_count, 1);
        assert_eq!(buckets[3].start, NaiveDate::from_ymd_opt(2024, 6, 22).unwrap());
    }

    #[test]
    fn test_category_distribution_first_seen_order() {
        let entries = vec![
            decision(DecisionCategory::Health),
            decision(DecisionCategory::Health),
            decision(DecisionCategory::Career),
        ];
        let dist = engine().category_distribution(&entries);
        let pairs: Vec<_> = dist.iter().collect();
        assert_eq!(
            pairs,
            vec![(&DecisionCategory::Health, 2), (&DecisionCategory::Career, 1)]
        );
        assert_eq!(dist.get(&DecisionCategory::Finance), 0);
        assert_eq!(dist.total(), 3);
    }

    #[test]
    fn test_mood_distribution_is_not_normalized() {
        let mut entries = vec![
            focus(1, 9, FocusStatus::Achieved),
            focus(2, 9, FocusStatus::Achieved),
            focus(3, 9, FocusStatus::Achieved),
        ];
        entries[1].mood = "Calm".to_string();
        entries[2].mood = "calm ".to_string();

        let dist = engine().mood_distribution(&entries);
        assert_eq!(dist.len(), 3);
        assert_eq!(dist.get(&"calm".to_string()), 1);
    }

    #[test]
    fn test_dominant_prefers_first_seen_on_tie() {
        let dist = Distribution::from_keys(vec!["b", "a", "a", "b", "c"]);
        assert_eq!(dist.dominant(), Some((&"b", 2)));
        assert_eq!(Distribution::<&str>::from_keys(vec![]).dominant(), None);
    }

    #[test]
    fn test_streak_stats() {
        let entries = vec![
            focus(1, 9, FocusStatus::Achieved),
            focus(2, 9, FocusStatus::Achieved),
            focus(3, 9, FocusStatus::Achieved),
            focus(4, 9, FocusStatus::NotAchieved),
            focus(9, 9, FocusStatus::Achieved),
            focus(10, 9, FocusStatus::Achieved),
        ];
        let stats = engine().streak_stats(&entries, ts(1, 0), ts(10, 18));
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.active_days, 5);
        assert_eq!(stats.total_days, 10);
        assert_eq!(stats.activity_percentage(), 50);
    }

    #[test]
    fn test_count_in_range_is_half_open() {
        let entries = vec![
            focus(1, 0, FocusStatus::Pending),
            focus(2, 0, FocusStatus::Pending),
            focus(3, 0, FocusStatus::Pending),
        ];
        assert_eq!(engine().count_in_range(&entries, ts(1, 0), ts(3, 0)), 2);
    }

    #[test]
    fn test_engine_is_idempotent() {
        let entries = vec![
            focus(9, 9, FocusStatus::Achieved),
            focus(10, 9, FocusStatus::Achieved),
        ];
        let e = engine();
        assert_eq!(
            e.bucket_by_month(&entries, ts(1, 0)),
            e.bucket_by_month(&entries, ts(1, 0))
        );
        assert_eq!(
            e.compute_streak(&entries, ts(10, 12)),
            e.compute_streak(&entries, ts(10, 12))
        );
    }
}
