//! Rule-based insights
//!
//! A fixed cascade of threshold rules over a person's recent entries. Each
//! rule adds at most one [`Insight`]; a rule whose precondition is unmet adds
//! nothing. The cascade cannot fail: if no rule fires, a single generic
//! recommendation is returned.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::engine::{completion_rate, round_half_up, StatsEngine};
use crate::error::{Error, Result};
use crate::types::{DecisionEntry, FocusEntry, FocusStatus};

/// Completion rate (percent) that earns an achievement.
const EXCELLENT_RATE: i64 = 80;
/// Completion rate (percent) that counts as decent progress.
const GOOD_RATE: i64 = 50;
/// Entries needed before a low rate triggers the "break it down" advice.
const LOW_RATE_MIN_ENTRIES: usize = 5;
/// Entries needed before mood patterns are reported.
const MOOD_PATTERN_MIN_ENTRIES: usize = 7;
/// Window for the completion-rate rule.
const RATE_WINDOW_DAYS: i64 = 30;
/// Before this hour a cold start suggests planning the day.
const MORNING_ENDS_HOUR: u32 = 12;
/// From this hour a cold start suggests reflecting on the day.
const EVENING_STARTS_HOUR: u32 = 18;

/// Category of an insight, used by the caller for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Trend,
    Pattern,
    Recommendation,
    Achievement,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Trend => "trend",
            InsightKind::Pattern => "pattern",
            InsightKind::Recommendation => "recommendation",
            InsightKind::Achievement => "achievement",
        }
    }
}

/// A short observation about recent activity. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Insight {
    fn new(kind: InsightKind, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

/// Tunable thresholds for the streak and category rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InsightThresholds {
    /// Streak length that earns an achievement
    #[serde(default = "default_streak_achievement_days")]
    pub streak_achievement_days: i64,

    /// Streak length reported as building momentum
    #[serde(default = "default_streak_momentum_days")]
    pub streak_momentum_days: i64,

    /// Decisions in one category before it is called out as a pattern
    #[serde(default = "default_dominant_category_min")]
    pub dominant_category_min: i64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            streak_achievement_days: default_streak_achievement_days(),
            streak_momentum_days: default_streak_momentum_days(),
            dominant_category_min: default_dominant_category_min(),
        }
    }
}

fn default_streak_achievement_days() -> i64 {
    7
}

fn default_streak_momentum_days() -> i64 {
    3
}

fn default_dominant_category_min() -> i64 {
    3
}

impl InsightThresholds {
    /// Validate thresholds, returning a config error if they are unusable
    pub fn validate(&self) -> Result<()> {
        if self.streak_momentum_days < 1 || self.dominant_category_min < 1 {
            return Err(Error::Config(
                "insights thresholds must be at least 1".to_string(),
            ));
        }
        if self.streak_momentum_days > self.streak_achievement_days {
            return Err(Error::Config(
                "insights.streak_momentum_days must not exceed insights.streak_achievement_days"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl<Tz: TimeZone> StatsEngine<Tz> {
    /// Run the insight rules, in order, over one owner's entries.
    ///
    /// Always returns at least one insight.
    pub fn generate_insights(
        &self,
        focus_entries: &[FocusEntry],
        decision_entries: &[DecisionEntry],
        now: DateTime<Utc>,
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        insights.extend(self.streak_insight(focus_entries, now));
        insights.extend(self.category_insight(decision_entries));
        insights.extend(self.completion_insight(focus_entries, now));
        insights.extend(self.mood_insight(focus_entries));
        insights.extend(self.activity_trend_insight(focus_entries, now));

        if insights.len() < 3 && focus_entries.is_empty() {
            insights.extend(self.cold_start_insight(now));
        }

        if insights.is_empty() {
            insights.push(Insight::new(
                InsightKind::Recommendation,
                "Start building your data!",
                "Add focus entries and decisions to unlock personalized insights.",
            ));
        }

        tracing::trace!(count = insights.len(), "Generated insights");
        insights
    }

    fn streak_insight(&self, focus_entries: &[FocusEntry], now: DateTime<Utc>) -> Option<Insight> {
        let streak = self.compute_streak(focus_entries, now);
        let thresholds = self.thresholds();

        if streak >= thresholds.streak_achievement_days {
            Some(Insight::new(
                InsightKind::Achievement,
                format!("Amazing! You're on a {}-day streak!", streak),
                "Consistency is key to reaching your goals. Keep it up!",
            ))
        } else if streak >= thresholds.streak_momentum_days {
            let remaining = thresholds.streak_achievement_days - streak;
            Some(Insight::new(
                InsightKind::Trend,
                format!("You're building momentum with a {}-day streak", streak),
                format!(
                    "Just {} more day{} to reach a {}-day streak!",
                    remaining,
                    if remaining == 1 { "" } else { "s" },
                    thresholds.streak_achievement_days
                ),
            ))
        } else {
            None
        }
    }

    fn category_insight(&self, decision_entries: &[DecisionEntry]) -> Option<Insight> {
        let distribution = self.category_distribution(decision_entries);
        let (category, count) = distribution.dominant()?;
        if count < self.thresholds().dominant_category_min {
            return None;
        }

        let name = category.display_name();
        Some(Insight::new(
            InsightKind::Pattern,
            format!("Most of your decisions are about {}", name),
            format!(
                "You've logged {} {} decisions. Consider whether other areas need attention too.",
                count,
                name.to_lowercase()
            ),
        ))
    }

    /// Partially achieved entries count as achieved here, unlike the
    /// dashboard's completion rate.
    fn completion_insight(
        &self,
        focus_entries: &[FocusEntry],
        now: DateTime<Utc>,
    ) -> Option<Insight> {
        let since = now - Duration::days(RATE_WINDOW_DAYS);
        let recent: Vec<&FocusEntry> = focus_entries
            .iter()
            .filter(|e| e.date >= since && e.date <= now)
            .collect();
        let achieved = recent
            .iter()
            .filter(|e| {
                matches!(
                    e.status,
                    FocusStatus::Achieved | FocusStatus::PartiallyAchieved
                )
            })
            .count();
        let rate = completion_rate(achieved as i64, recent.len() as i64);

        if rate >= EXCELLENT_RATE {
            Some(Insight::new(
                InsightKind::Achievement,
                format!("Excellent focus completion rate: {}%", rate),
                "You consistently follow through on your daily priorities.",
            ))
        } else if rate >= GOOD_RATE {
            Some(Insight::new(
                InsightKind::Recommendation,
                format!("Good progress with a {}% completion rate", rate),
                "There's room for improvement. Try setting more specific, achievable goals.",
            ))
        } else if focus_entries.len() > LOW_RATE_MIN_ENTRIES {
            Some(Insight::new(
                InsightKind::Recommendation,
                "Consider breaking down your focus goals",
                "Smaller, achievable goals can help build momentum and confidence.",
            ))
        } else {
            None
        }
    }

    fn mood_insight(&self, focus_entries: &[FocusEntry]) -> Option<Insight> {
        if focus_entries.len() < MOOD_PATTERN_MIN_ENTRIES {
            return None;
        }

        let distribution = self.mood_distribution(focus_entries);
        let (mood, count) = distribution.dominant()?;
        let total = focus_entries.len() as i64;
        if count * 2 < total {
            return None;
        }

        Some(Insight::new(
            InsightKind::Pattern,
            format!("You're often feeling {}", mood),
            format!(
                "{}% of your focus entries were logged feeling {}.",
                completion_rate(count, total),
                mood
            ),
        ))
    }

    fn activity_trend_insight(
        &self,
        focus_entries: &[FocusEntry],
        now: DateTime<Utc>,
    ) -> Option<Insight> {
        let week_ago = now - Duration::days(7);
        let two_weeks_ago = now - Duration::days(14);
        let this_week = self.count_in_range(focus_entries, week_ago, now);
        let last_week = self.count_in_range(focus_entries, two_weeks_ago, week_ago);

        if this_week > last_week && last_week > 0 {
            let increase =
                round_half_up((this_week - last_week) as f64 / last_week as f64 * 100.0);
            Some(Insight::new(
                InsightKind::Trend,
                format!("Your activity is up {}% this week", increase),
                format!(
                    "{} entries this week compared to {} last week.",
                    this_week, last_week
                ),
            ))
        } else if last_week > this_week && this_week > 0 {
            Some(Insight::new(
                InsightKind::Recommendation,
                "Your momentum is decreasing this week",
                format!(
                    "{} entries this week compared to {} last week. A small win today can turn it around.",
                    this_week, last_week
                ),
            ))
        } else {
            None
        }
    }

    fn cold_start_insight(&self, now: DateTime<Utc>) -> Option<Insight> {
        let hour = now.with_timezone(self.time_zone()).hour();

        if hour < MORNING_ENDS_HOUR {
            Some(Insight::new(
                InsightKind::Recommendation,
                "Start your day with a focus goal",
                "Setting one clear priority each morning builds a habit of follow-through.",
            ))
        } else if hour >= EVENING_STARTS_HOUR {
            Some(Insight::new(
                InsightKind::Recommendation,
                "Take a moment for evening reflection",
                "Log how today went and note any decisions you made.",
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DecisionCategory;

    fn engine() -> StatsEngine<Utc> {
        StatsEngine::new(Utc)
    }

    fn now_at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, hour, 0, 0).unwrap()
    }

    fn days_ago(now: DateTime<Utc>, days: i64, status: FocusStatus, mood: &str) -> FocusEntry {
        FocusEntry::new("u1", "focus", status, mood, now - Duration::days(days))
    }

    fn decision(category: DecisionCategory) -> DecisionEntry {
        DecisionEntry::new("u1", "decision", category, now_at(9))
    }

    fn kinds(insights: &[Insight]) -> Vec<InsightKind> {
        insights.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_fallback_when_nothing_fires() {
        // Mid-afternoon, so the cold-start rule stays quiet as well
        let insights = engine().generate_insights(&[], &[], now_at(14));
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Recommendation);
        assert_eq!(insights[0].message, "Start building your data!");
    }

    #[test]
    fn test_never_empty_at_any_hour() {
        for hour in 0..24 {
            let insights = engine().generate_insights(&[], &[], now_at(hour));
            assert!(!insights.is_empty(), "hour {}", hour);
        }
    }

    #[test]
    fn test_cold_start_morning_and_evening() {
        let morning = engine().generate_insights(&[], &[], now_at(8));
        assert_eq!(morning.len(), 1);
        assert_eq!(morning[0].message, "Start your day with a focus goal");

        let evening = engine().generate_insights(&[], &[], now_at(18));
        assert_eq!(evening[0].message, "Take a moment for evening reflection");
    }

    #[test]
    fn test_cold_start_skipped_when_focus_exists() {
        let now = now_at(8);
        let entries = vec![days_ago(now, 40, FocusStatus::NotAchieved, "meh")];
        let insights = engine().generate_insights(&entries, &[], now);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].message, "Start building your data!");
    }

    #[test]
    fn test_week_long_streak_is_achievement() {
        let now = now_at(20);
        let entries: Vec<FocusEntry> = (0..7)
            .map(|d| days_ago(now, d, FocusStatus::Achieved, &format!("mood{}", d)))
            .collect();
        let insights = engine().generate_insights(&entries, &[], now);
        assert_eq!(insights[0].kind, InsightKind::Achievement);
        assert_eq!(insights[0].message, "Amazing! You're on a 7-day streak!");
        // 30-day rate is 100%
        assert_eq!(insights[1].message, "Excellent focus completion rate: 100%");
    }

    #[test]
    fn test_short_streak_is_momentum() {
        let now = now_at(20);
        let entries: Vec<FocusEntry> = (0..3)
            .map(|d| days_ago(now, d, FocusStatus::Achieved, "ok"))
            .collect();
        let insights = engine().generate_insights(&entries, &[], now);
        assert_eq!(insights[0].kind, InsightKind::Trend);
        assert!(insights[0].message.contains("3-day streak"));
        assert_eq!(
            insights[0].details.as_deref(),
            Some("Just 4 more days to reach a 7-day streak!")
        );
    }

    #[test]
    fn test_dominant_category_needs_three() {
        let now = now_at(14);
        let two = vec![
            decision(DecisionCategory::Health),
            decision(DecisionCategory::Health),
            decision(DecisionCategory::Career),
        ];
        let insights = engine().generate_insights(&[], &two, now);
        assert_eq!(insights[0].message, "Start building your data!");

        let three = vec![
            decision(DecisionCategory::Career),
            decision(DecisionCategory::Health),
            decision(DecisionCategory::Health),
            decision(DecisionCategory::Health),
        ];
        let insights = engine().generate_insights(&[], &three, now);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Pattern);
        assert_eq!(insights[0].message, "Most of your decisions are about Health");
    }

    #[test]
    fn test_partial_counts_as_achieved_for_rate_rule() {
        let now = now_at(14);
        // Pending today breaks any streak
        let mut entries = vec![days_ago(now, 0, FocusStatus::Pending, "a")];
        for d in 1..=4 {
            entries.push(days_ago(now, d * 2, FocusStatus::PartiallyAchieved, "b"));
        }
        // 4 of 5 in the last 30 days -> 80%
        let insights = engine().generate_insights(&entries, &[], now);
        assert_eq!(insights[0].kind, InsightKind::Achievement);
        assert_eq!(insights[0].message, "Excellent focus completion rate: 80%");
    }

    #[test]
    fn test_middling_rate_is_room_for_improvement() {
        let now = now_at(14);
        let entries = vec![
            days_ago(now, 1, FocusStatus::Achieved, "a"),
            days_ago(now, 3, FocusStatus::NotAchieved, "b"),
        ];
        let insights = engine().generate_insights(&entries, &[], now);
        assert_eq!(insights[0].kind, InsightKind::Recommendation);
        assert!(insights[0].message.contains("50% completion rate"));
    }

    #[test]
    fn test_low_rate_with_many_entries_suggests_breaking_down() {
        let now = now_at(14);
        let moods = ["a", "b", "c", "d", "e", "f"];
        let entries: Vec<FocusEntry> = moods
            .iter()
            .enumerate()
            .map(|(i, mood)| days_ago(now, 20 + i as i64, FocusStatus::NotAchieved, mood))
            .collect();
        let insights = engine().generate_insights(&entries, &[], now);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].message, "Consider breaking down your focus goals");
    }

    #[test]
    fn test_dominant_mood_at_half() {
        let now = now_at(14);
        let moods = ["tired", "calm", "tired", "happy", "tired", "calm", "tired", "calm"];
        let entries: Vec<FocusEntry> = moods
            .iter()
            .enumerate()
            .map(|(i, mood)| days_ago(now, 40 + i as i64, FocusStatus::NotAchieved, mood))
            .collect();
        let insights = engine().generate_insights(&entries, &[], now);
        let mood = insights
            .iter()
            .find(|i| i.kind == InsightKind::Pattern)
            .expect("mood insight");
        assert_eq!(mood.message, "You're often feeling tired");
        assert_eq!(
            mood.details.as_deref(),
            Some("50% of your focus entries were logged feeling tired.")
        );
    }

    #[test]
    fn test_activity_up_and_down() {
        let now = now_at(14);
        let mut up = vec![days_ago(now, 10, FocusStatus::NotAchieved, "a")];
        up.push(days_ago(now, 1, FocusStatus::NotAchieved, "b"));
        up.push(days_ago(now, 2, FocusStatus::NotAchieved, "c"));
        let insights = engine().generate_insights(&up, &[], now);
        let trend = insights
            .iter()
            .find(|i| i.kind == InsightKind::Trend)
            .expect("trend insight");
        assert_eq!(trend.message, "Your activity is up 100% this week");

        let down = vec![
            days_ago(now, 1, FocusStatus::NotAchieved, "a"),
            days_ago(now, 8, FocusStatus::NotAchieved, "b"),
            days_ago(now, 9, FocusStatus::NotAchieved, "c"),
        ];
        let insights = engine().generate_insights(&down, &[], now);
        assert!(insights
            .iter()
            .any(|i| i.message == "Your momentum is decreasing this week"));
    }

    #[test]
    fn test_no_trend_without_baseline() {
        let now = now_at(14);
        let entries = vec![days_ago(now, 1, FocusStatus::NotAchieved, "a")];
        let insights = engine().generate_insights(&entries, &[], now);
        assert!(!kinds(&insights).contains(&InsightKind::Trend));
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let now = now_at(20);
        let mut entries: Vec<FocusEntry> = (0..7)
            .map(|d| days_ago(now, d, FocusStatus::Achieved, "focused"))
            .collect();
        entries.push(days_ago(now, 8, FocusStatus::Achieved, "focused"));
        let decisions = vec![
            decision(DecisionCategory::Finance),
            decision(DecisionCategory::Finance),
            decision(DecisionCategory::Finance),
        ];

        let insights = engine().generate_insights(&entries, &decisions, now);
        assert_eq!(
            kinds(&insights),
            vec![
                InsightKind::Achievement,
                InsightKind::Pattern,
                InsightKind::Achievement,
                InsightKind::Pattern,
                InsightKind::Trend,
            ]
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let now = now_at(20);
        let entries: Vec<FocusEntry> = (0..2)
            .map(|d| days_ago(now, d, FocusStatus::Achieved, "ok"))
            .collect();
        let thresholds = InsightThresholds {
            streak_achievement_days: 2,
            streak_momentum_days: 1,
            dominant_category_min: 1,
        };
        assert!(thresholds.validate().is_ok());
        let insights = engine()
            .with_thresholds(thresholds)
            .generate_insights(&entries, &[], now);
        assert_eq!(insights[0].message, "Amazing! You're on a 2-day streak!");
    }

    #[test]
    fn test_threshold_validation() {
        let inverted = InsightThresholds {
            streak_achievement_days: 2,
            streak_momentum_days: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let zero = InsightThresholds {
            dominant_category_min: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_insight_serializes_lowercase_kind() {
        let insight = Insight::new(InsightKind::Trend, "up", "details");
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["kind"], "trend");
        assert_eq!(json["message"], "up");
    }
}
