//! # daybook-core
//!
//! Library behind the `daybook` journal: focus goals with an outcome, logged
//! decisions, and the statistics computed over them.
//!
//! - [`types`]: focus and decision entries
//! - [`store`] and [`db`]: the [`EntryStore`] seam and its SQLite backing
//! - [`analytics`]: streaks, completion buckets, distributions, insights and
//!   the dashboard that ties them together
//! - [`config`] and [`logging`]: XDG config file and tracing setup
//!
//! ## Computing a dashboard
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use daybook_core::analytics::{load_dashboard, StatsEngine};
//! use daybook_core::{Config, Database};
//!
//! # fn main() -> daybook_core::Result<()> {
//! let config = Config::load()?;
//! let db = Database::open(&Config::database_path())?;
//! db.migrate()?;
//!
//! let engine = StatsEngine::local().with_thresholds(config.insights.clone());
//! let stats = load_dashboard(&db, &engine, &config.user.owner_id, Utc::now())?;
//! println!("{} day streak", stats.streaks.current_streak);
//! # Ok(())
//! # }
//! ```

pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use store::{EntryFilter, EntryStore, MemoryStore, SortOrder};
pub use types::*;

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod store;
pub mod types;
