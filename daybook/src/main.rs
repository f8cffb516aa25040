//! daybook - Daily focus and decision journal
//!
//! Record one focus goal per day and the decisions you make, then look back
//! at streaks, completion rates and patterns.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use daybook_core::analytics::{load_dashboard, load_insights, DashboardStats, DayBucket, StatsEngine};
use daybook_core::{
    Config, Database, DecisionCategory, DecisionEntry, EntryFilter, EntryStore, FocusEntry,
    FocusStatus, SortOrder,
};

/// Page size used when `--page` is given without `--limit`.
const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "daybook")]
#[command(about = "Daily focus and decision journal")]
#[command(version)]
struct Cli {
    /// Journal owner (default: user.owner_id from the config file)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Database file (default: $XDG_DATA_HOME/daybook/daybook.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Daily focus goals
    Focus {
        #[command(subcommand)]
        action: FocusCommand,
    },
    /// Logged decisions
    Decision {
        #[command(subcommand)]
        action: DecisionCommand,
    },
    /// Dashboard: streaks, completion rates, charts and insights
    Stats {
        /// Export format (md = markdown, json = JSON)
        #[arg(long)]
        export: Option<String>,
    },
    /// Insights only
    Insights {
        /// Export format (json = JSON)
        #[arg(long)]
        export: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum FocusCommand {
    /// Record a focus goal
    Add {
        #[arg(long)]
        title: String,
        /// PENDING, ACHIEVED, NOT_ACHIEVED or PARTIALLY_ACHIEVED
        #[arg(long, default_value = "PENDING")]
        status: FocusStatus,
        #[arg(long)]
        mood: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// RFC 3339 timestamp or YYYY-MM-DD (default: now)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// List focus goals, newest first
    List(ListArgs),
    /// Change fields of a focus goal; omitted fields are kept
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        status: Option<FocusStatus>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Change the status of a focus goal
    Status { id: String, status: FocusStatus },
    /// Attach an image URL to a focus goal
    Image { id: String, url: String },
    /// Delete a focus goal
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum DecisionCommand {
    /// Record a decision
    Add {
        #[arg(long)]
        title: String,
        /// CAREER, HEALTH, FINANCE, RELATIONSHIPS, LIFESTYLE, GENERAL or OTHER
        #[arg(long)]
        category: DecisionCategory,
        #[arg(long, default_value = "")]
        reason: String,
        /// RFC 3339 timestamp or YYYY-MM-DD (default: now)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// List decisions, newest first
    List(ListArgs),
    /// Change fields of a decision; omitted fields are kept
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<DecisionCategory>,
        #[arg(long)]
        reason: Option<String>,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Attach an image URL to a decision
    Image { id: String, url: String },
    /// Delete a decision
    Delete { id: String },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only entries on or after this date
    #[arg(long)]
    since: Option<String>,
    /// Only entries on or before this date
    #[arg(long)]
    until: Option<String>,
    /// Case-insensitive title search
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    limit: Option<usize>,
    /// Page number, starting at 1
    #[arg(long)]
    page: Option<usize>,
    #[arg(long)]
    oldest_first: bool,
}

/// Which instant a bare `YYYY-MM-DD` stands for.
#[derive(Debug, Clone, Copy)]
enum DayAnchor {
    Start,
    Noon,
    End,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = daybook_core::logging::init(&config.logging).ok();

    let db_path = cli.db.clone().unwrap_or_else(Config::database_path);
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run migrations")?;

    let owner = cli
        .owner
        .clone()
        .unwrap_or_else(|| config.user.owner_id.clone());
    tracing::debug!(owner = %owner, db = %db_path.display(), "Starting daybook");

    match cli.command {
        Command::Focus { action } => run_focus(&db, &owner, action),
        Command::Decision { action } => run_decision(&db, &owner, action),
        Command::Stats { export } => {
            let engine = StatsEngine::local().with_thresholds(config.insights.clone());
            let stats = load_dashboard(&db, &engine, &owner, Utc::now())
                .context("failed to compute stats")?;
            match export.as_deref() {
                Some("json") => print_json(&stats),
                Some("md") => {
                    print_markdown(&stats);
                    Ok(())
                }
                Some(other) => anyhow::bail!("Unknown export format: {}. Use 'md' or 'json'", other),
                None => {
                    print_terminal(&stats);
                    Ok(())
                }
            }
        }
        Command::Insights { export } => {
            let engine = StatsEngine::local().with_thresholds(config.insights.clone());
            let insights = load_insights(&db, &engine, &owner, Utc::now())
                .context("failed to compute insights")?;
            match export.as_deref() {
                Some("json") => println!("{}", serde_json::to_string_pretty(&insights)?),
                Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
                None => {
                    for insight in &insights {
                        println!("[{}] {}", insight.kind.as_str(), insight.message);
                        if let Some(details) = &insight.details {
                            println!("    {}", details);
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

fn run_focus(db: &Database, owner: &str, action: FocusCommand) -> Result<()> {
    match action {
        FocusCommand::Add {
            title,
            status,
            mood,
            notes,
            date,
            image,
        } => {
            let date = match date {
                Some(raw) => parse_date(&raw, DayAnchor::Noon)?,
                None => Utc::now(),
            };
            let mut entry = FocusEntry::new(owner, title, status, mood, date);
            entry.notes = notes;
            entry.image_url = image;
            db.insert_focus_entry(&entry)
                .context("failed to save focus entry")?;
            println!("Added focus entry {}", entry.id);
        }
        FocusCommand::List(args) => {
            let filter = build_filter(owner, &args)?;
            let entries = db.list_focus_entries(&filter)?;
            let total = db.count_focus_entries(&filter)?;
            if entries.is_empty() {
                println!("No focus entries found.");
                return Ok(());
            }
            for entry in &entries {
                println!(
                    "{}  {:<18}  {:<10}  {}  ({})",
                    entry.date.with_timezone(&Local).format("%Y-%m-%d"),
                    entry.status.display_name(),
                    entry.mood,
                    entry.title,
                    entry.id
                );
            }
            println!();
            println!("Showing {} of {} entries", entries.len(), total);
        }
        FocusCommand::Edit {
            id,
            title,
            status,
            mood,
            notes,
            date,
        } => {
            let mut entry = db
                .get_focus_entry(owner, &id)?
                .with_context(|| format!("No focus entry with id {}", id))?;
            if let Some(title) = title {
                entry.title = title;
            }
            if let Some(status) = status {
                entry.status = status;
            }
            if let Some(mood) = mood {
                entry.mood = mood;
            }
            if let Some(notes) = notes {
                entry.notes = notes;
            }
            if let Some(raw) = date {
                entry.date = parse_date(&raw, DayAnchor::Noon)?;
            }
            if !db.update_focus_entry(&entry)? {
                anyhow::bail!("No focus entry with id {}", id);
            }
            println!("Updated focus entry {}", id);
        }
        FocusCommand::Status { id, status } => {
            db.set_focus_status(owner, &id, status)
                .with_context(|| format!("failed to update focus entry {}", id))?;
            println!("Focus entry {} is now {}", id, status.display_name());
        }
        FocusCommand::Image { id, url } => {
            db.set_focus_image(owner, &id, &url)
                .with_context(|| format!("failed to attach image to focus entry {}", id))?;
            println!("Attached image to focus entry {}", id);
        }
        FocusCommand::Delete { id } => {
            if !db.delete_focus_entry(owner, &id)? {
                anyhow::bail!("No focus entry with id {}", id);
            }
            println!("Deleted focus entry {}", id);
        }
    }
    Ok(())
}

fn run_decision(db: &Database, owner: &str, action: DecisionCommand) -> Result<()> {
    match action {
        DecisionCommand::Add {
            title,
            category,
            reason,
            date,
            image,
        } => {
            let date = match date {
                Some(raw) => parse_date(&raw, DayAnchor::Noon)?,
                None => Utc::now(),
            };
            let mut entry = DecisionEntry::new(owner, title, category, date);
            entry.reason = reason;
            entry.image_url = image;
            db.insert_decision_entry(&entry)
                .context("failed to save decision entry")?;
            println!("Added decision entry {}", entry.id);
        }
        DecisionCommand::List(args) => {
            let filter = build_filter(owner, &args)?;
            let entries = db.list_decision_entries(&filter)?;
            let total = db.count_decision_entries(&filter)?;
            if entries.is_empty() {
                println!("No decision entries found.");
                return Ok(());
            }
            for entry in &entries {
                println!(
                    "{}  {:<13}  {}  ({})",
                    entry.date.with_timezone(&Local).format("%Y-%m-%d"),
                    entry.category.display_name(),
                    entry.title,
                    entry.id
                );
            }
            println!();
            println!("Showing {} of {} entries", entries.len(), total);
        }
        DecisionCommand::Edit {
            id,
            title,
            category,
            reason,
            date,
        } => {
            let mut entry = db
                .get_decision_entry(owner, &id)?
                .with_context(|| format!("No decision entry with id {}", id))?;
            if let Some(title) = title {
                entry.title = title;
            }
            if let Some(category) = category {
                entry.category = category;
            }
            if let Some(reason) = reason {
                entry.reason = reason;
            }
            if let Some(raw) = date {
                entry.date = parse_date(&raw, DayAnchor::Noon)?;
            }
            if !db.update_decision_entry(&entry)? {
                anyhow::bail!("No decision entry with id {}", id);
            }
            println!("Updated decision entry {}", id);
        }
        DecisionCommand::Image { id, url } => {
            db.set_decision_image(owner, &id, &url)
                .with_context(|| format!("failed to attach image to decision entry {}", id))?;
            println!("Attached image to decision entry {}", id);
        }
        DecisionCommand::Delete { id } => {
            if !db.delete_decision_entry(owner, &id)? {
                anyhow::bail!("No decision entry with id {}", id);
            }
            println!("Deleted decision entry {}", id);
        }
    }
    Ok(())
}

fn build_filter(owner: &str, args: &ListArgs) -> Result<EntryFilter> {
    let mut filter = EntryFilter::for_owner(owner);
    if let Some(raw) = &args.since {
        filter.since = Some(parse_date(raw, DayAnchor::Start)?);
    }
    if let Some(raw) = &args.until {
        filter.until = Some(parse_date(raw, DayAnchor::End)?);
    }
    filter.search = args.search.clone();
    if args.oldest_first {
        filter.order = SortOrder::OldestFirst;
    }
    match (args.page, args.limit) {
        (Some(page), limit) => filter = filter.page(page, limit.unwrap_or(DEFAULT_PAGE_SIZE)),
        (None, limit) => filter.limit = limit,
    }
    Ok(filter)
}

/// Parse an RFC 3339 timestamp, or a local calendar date pinned to `anchor`.
fn parse_date(input: &str, anchor: DayAnchor) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date {:?}. Use YYYY-MM-DD or RFC 3339", input))?;
    let time = match anchor {
        DayAnchor::Start => NaiveTime::from_hms_opt(0, 0, 0).context("invalid time of day")?,
        DayAnchor::Noon => NaiveTime::from_hms_opt(12, 0, 0).context("invalid time of day")?,
        DayAnchor::End => {
            NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).context("invalid time of day")?
        }
    };

    let local = Local
        .from_local_datetime(&day.and_time(time))
        .earliest()
        .with_context(|| format!("{} does not exist in the local time zone", input))?;
    Ok(local.with_timezone(&Utc))
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn bar(bucket: &DayBucket, width: usize) -> String {
    if bucket.total_count == 0 {
        return "·".repeat(width);
    }
    let filled = (bucket.rate() as usize * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn print_terminal(stats: &DashboardStats) {
    let title = format!("DAYBOOK: {}", stats.owner_id);

    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();

    if !stats.has_data() {
        println!("  No entries yet.");
        println!();
    } else {
        println!("SUMMARY");
        println!(
            "   Focus goals: {:<8} Decisions: {}",
            stats.focus_count, stats.decision_count
        );
        println!("   Completed (30 days): {}%", stats.completion_rate_30d);
        println!();

        println!("STREAKS");
        println!(
            "   Current:  {} day{}",
            stats.streaks.current_streak,
            plural(stats.streaks.current_streak)
        );
        println!(
            "   Longest:  {} day{}",
            stats.streaks.longest_streak,
            plural(stats.streaks.longest_streak)
        );
        println!(
            "   Active:   {} of {} days ({}%)",
            stats.streaks.active_days,
            stats.streaks.total_days,
            stats.streaks.activity_percentage()
        );
        println!();

        println!("THIS WEEK");
        for bucket in &stats.weekly {
            println!(
                "   {:<4} {}  {}/{}",
                bucket.label,
                bar(bucket, 20),
                bucket.achieved_count,
                bucket.total_count
            );
        }
        println!(
            "   {}% vs {}% last week ({})",
            stats.this_week_rate,
            stats.last_week_rate,
            stats.format_trend()
        );
        println!();

        println!("LAST 4 WEEKS");
        for bucket in &stats.monthly {
            println!(
                "   {:<7} {}  {}%",
                bucket.label,
                bar(bucket, 20),
                bucket.rate()
            );
        }
        println!();

        if !stats.moods.is_empty() {
            println!("MOODS");
            for (mood, count) in stats.moods.iter() {
                println!("   {:<14} {}", mood, count);
            }
            println!();
        }

        if !stats.categories.is_empty() {
            println!("DECISIONS");
            for (category, count) in stats.categories.iter() {
                println!("   {:<14} {}", category.display_name(), count);
            }
            println!();
        }
    }

    println!("INSIGHTS");
    for insight in &stats.insights {
        println!("   • {}", insight.message);
    }
    println!();
}

fn print_markdown(stats: &DashboardStats) {
    println!("# Daybook: {}", stats.owner_id);
    println!();

    if !stats.has_data() {
        println!("*No entries yet.*");
        println!();
    } else {
        println!("## Summary");
        println!();
        println!("| Metric | Value |");
        println!("|--------|-------|");
        println!("| Focus goals | {} |", stats.focus_count);
        println!("| Decisions | {} |", stats.decision_count);
        println!("| Completion (30 days) | {}% |", stats.completion_rate_30d);
        println!("| Current streak | {} days |", stats.streaks.current_streak);
        println!("| Longest streak | {} days |", stats.streaks.longest_streak);
        println!(
            "| Active days | {} of {} ({}%) |",
            stats.streaks.active_days,
            stats.streaks.total_days,
            stats.streaks.activity_percentage()
        );
        println!();

        println!("## This Week");
        println!();
        println!("| Day | Achieved | Total | Rate |");
        println!("|-----|----------|-------|------|");
        for bucket in &stats.weekly {
            println!(
                "| {} {} | {} | {} | {}% |",
                bucket.label,
                bucket.start.format("%m/%d"),
                bucket.achieved_count,
                bucket.total_count,
                bucket.rate()
            );
        }
        println!();
        println!(
            "Week over week: {}% vs {}% ({})",
            stats.this_week_rate,
            stats.last_week_rate,
            stats.format_trend()
        );
        println!();

        println!("## Last 4 Weeks");
        println!();
        for bucket in &stats.monthly {
            println!(
                "- **{}** (from {}): {} of {} achieved",
                bucket.label,
                bucket.start.format("%b %d"),
                bucket.achieved_count,
                bucket.total_count
            );
        }
        println!();

        if !stats.categories.is_empty() {
            println!("## Decisions by Category");
            println!();
            for (category, count) in stats.categories.iter() {
                println!("- {}: {}", category.display_name(), count);
            }
            println!();
        }
    }

    println!("## Insights");
    println!();
    for insight in &stats.insights {
        match &insight.details {
            Some(details) => println!("- **{}** {}", insight.message, details),
            None => println!("- **{}**", insight.message),
        }
    }
    println!();

    println!("---");
    println!("*Generated by daybook*");
}

fn bucket_json(bucket: &DayBucket) -> serde_json::Value {
    serde_json::json!({
        "label": bucket.label,
        "start": bucket.start.to_string(),
        "achieved": bucket.achieved_count,
        "total": bucket.total_count,
        "rate": bucket.rate(),
    })
}

fn print_json(stats: &DashboardStats) -> Result<()> {
    let json = serde_json::json!({
        "owner": stats.owner_id,
        "generated_at": stats.generated_at.to_rfc3339(),
        "totals": {
            "focus_entries": stats.focus_count,
            "decision_entries": stats.decision_count,
            "completion_rate_30d": stats.completion_rate_30d,
        },
        "streaks": {
            "current": stats.streaks.current_streak,
            "longest": stats.streaks.longest_streak,
            "active_days": stats.streaks.active_days,
            "total_days": stats.streaks.total_days,
        },
        "weekly": stats.weekly.iter().map(bucket_json).collect::<Vec<_>>(),
        "monthly": stats.monthly.iter().map(bucket_json).collect::<Vec<_>>(),
        "week_over_week": {
            "this_week_rate": stats.this_week_rate,
            "last_week_rate": stats.last_week_rate,
            "trend": stats.weekly_trend,
        },
        "categories": stats.categories.iter().map(|(category, count)| {
            serde_json::json!({"category": category.as_str(), "count": count})
        }).collect::<Vec<_>>(),
        "moods": stats.moods.iter().map(|(mood, count)| {
            serde_json::json!({"mood": mood, "count": count})
        }).collect::<Vec<_>>(),
        "statuses": stats.statuses.iter().map(|(status, count)| {
            serde_json::json!({"status": status.as_str(), "count": count})
        }).collect::<Vec<_>>(),
        "recent_focus": stats.recent_focus.iter().map(|e| serde_json::json!({
            "id": e.id,
            "title": e.title,
            "status": e.status.as_str(),
            "mood": e.mood,
            "date": e.date.to_rfc3339(),
        })).collect::<Vec<_>>(),
        "insights": stats.insights,
    });

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
