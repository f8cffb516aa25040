//! Dashboard assembly.
//!
//! Fetches one owner's entries through an [`EntryStore`] and runs the
//! [`StatsEngine`] over them. Nothing is cached; every call recomputes.

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::engine::{
    completion_rate, weekly_trend, DayBucket, Distribution, StatsEngine, StreakStats,
};
use super::insights::Insight;
use crate::error::Result;
use crate::store::{EntryFilter, EntryStore};
use crate::types::{DecisionCategory, FocusEntry, FocusStatus};

/// Number of newest focus entries shown on the dashboard.
const RECENT_FOCUS_LIMIT: usize = 5;

/// Everything the dashboard view renders for one owner.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    /// Owner these stats belong to
    pub owner_id: String,
    /// The `now` the stats were computed for
    pub generated_at: DateTime<Utc>,

    // Totals
    /// All focus entries
    pub focus_count: i64,
    /// All decision entries
    pub decision_count: i64,
    /// Share of the last 30 days' focus entries that were achieved
    pub completion_rate_30d: i64,

    // Streaks
    pub streaks: StreakStats,

    // Charts (index 0 = oldest)
    /// Per-day buckets for the 7 days ending today
    pub weekly: [DayBucket; 7],
    /// Per-week buckets for the 28 days ending today
    pub monthly: [DayBucket; 4],

    // Week over week
    pub this_week_rate: i64,
    pub last_week_rate: i64,
    /// Percentage-point change from last week's rate
    pub weekly_trend: i64,

    // Distributions
    pub categories: Distribution<DecisionCategory>,
    pub moods: Distribution<String>,
    pub statuses: Distribution<FocusStatus>,

    /// Newest focus entries
    pub recent_focus: Vec<FocusEntry>,
    pub insights: Vec<Insight>,
}

impl DashboardStats {
    /// Format the week-over-week change (e.g., "+40 pts").
    pub fn format_trend(&self) -> String {
        if self.weekly_trend >= 0 {
            format!("+{} pts", self.weekly_trend)
        } else {
            format!("{} pts", self.weekly_trend)
        }
    }

    pub fn has_data(&self) -> bool {
        self.focus_count > 0 || self.decision_count > 0
    }
}

fn totals(buckets: &[DayBucket]) -> (i64, i64) {
    buckets.iter().fold((0, 0), |(achieved, total), b| {
        (achieved + b.achieved_count, total + b.total_count)
    })
}

/// Build dashboard statistics for one owner as of `now`.
pub fn load_dashboard<S, Tz>(
    store: &S,
    engine: &StatsEngine<Tz>,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<DashboardStats>
where
    S: EntryStore + ?Sized,
    Tz: TimeZone,
{
    let everything = EntryFilter::for_owner(owner_id);
    let focus = store.list_focus_entries(&everything)?;
    let decisions = store.list_decision_entries(&everything)?;
    let recent_focus =
        store.list_focus_entries(&EntryFilter::for_owner(owner_id).page(1, RECENT_FOCUS_LIMIT))?;

    tracing::debug!(
        owner = owner_id,
        focus = focus.len(),
        decisions = decisions.len(),
        "Loaded entries for dashboard"
    );

    let month_ago = now - Duration::days(30);
    let last_30: Vec<&FocusEntry> = focus
        .iter()
        .filter(|e| e.date >= month_ago && e.date <= now)
        .collect();
    let achieved_30 = last_30.iter().filter(|e| e.is_achieved()).count() as i64;
    let completion_rate_30d = completion_rate(achieved_30, last_30.len() as i64);

    // Windows are counted in calendar days; a local day can be 23 or 25 hours
    let today = engine.day_of(&now);
    let weekly = engine.week_ending(&focus, today);
    let previous_week = engine.week_ending(&focus, today - Duration::days(7));
    let monthly = engine.month_from(&focus, today - Duration::days(27));

    let (this_achieved, this_total) = totals(&weekly);
    let (last_achieved, last_total) = totals(&previous_week);

    let streak_start = focus.iter().map(|e| e.date).min().unwrap_or(now);
    let streaks = engine.streak_stats(&focus, streak_start, now);

    let insights = engine.generate_insights(&focus, &decisions, now);

    let stats = DashboardStats {
        owner_id: owner_id.to_string(),
        generated_at: now,
        focus_count: focus.len() as i64,
        decision_count: decisions.len() as i64,
        completion_rate_30d,
        streaks,
        weekly,
        monthly,
        this_week_rate: completion_rate(this_achieved, this_total),
        last_week_rate: completion_rate(last_achieved, last_total),
        weekly_trend: weekly_trend(this_achieved, this_total, last_achieved, last_total),
        categories: engine.category_distribution(&decisions),
        moods: engine.mood_distribution(&focus),
        statuses: engine.status_breakdown(&focus),
        recent_focus,
        insights,
    };

    tracing::debug!(
        owner = owner_id,
        streak = stats.streaks.current_streak,
        completion_rate_30d = stats.completion_rate_30d,
        insights = stats.insights.len(),
        "Computed dashboard stats"
    );

    Ok(stats)
}

/// Insights only, for views that do not need the full dashboard.
pub fn load_insights<S, Tz>(
    store: &S,
    engine: &StatsEngine<Tz>,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Insight>>
where
    S: EntryStore + ?Sized,
    Tz: TimeZone,
{
    let everything = EntryFilter::for_owner(owner_id);
    let focus = store.list_focus_entries(&everything)?;
    let decisions = store.list_decision_entries(&everything)?;
    Ok(engine.generate_insights(&focus, &decisions, now))
}
