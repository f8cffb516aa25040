//! Analytics module for daybook
//!
//! Provides the statistics shown on the dashboard and history views:
//! - Consecutive-day completion streaks
//! - Weekly (per day) and monthly (per week) completion buckets
//! - Completion rates and week-over-week trends
//! - Category, mood and status distributions
//! - Rule-based insights
//!
//! See [`engine`] for the pure computations, [`insights`] for the rule
//! cascade and [`dashboard`] for assembling them from an entry store.

pub mod dashboard;
pub mod engine;
pub mod insights;

pub use dashboard::{load_dashboard, load_insights, DashboardStats};
pub use engine::{
    completion_rate, round_half_up, weekly_trend, DayBucket, Distribution, StatsEngine,
    StreakStats,
};
pub use insights::{Insight, InsightKind, InsightThresholds};
