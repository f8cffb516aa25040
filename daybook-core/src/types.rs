//! Core domain types for daybook
//!
//! Two kinds of journal entries exist, both owned by exactly one person:
//!
//! | Term | Definition |
//! |------|------------|
//! | **Focus entry** | A single daily priority statement plus its outcome status |
//! | **Decision entry** | A logged choice with a category and free-text rationale |
//! | **Owner** | The identity every entry belongs to; statistics never mix owners |
//!
//! Entries are created, updated and deleted by their owner through the
//! [`Database`](crate::Database). The analytics layer only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Focus entries
// ============================================

/// Outcome of a focus entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FocusStatus {
    /// Not yet resolved
    Pending,
    /// The priority was met
    Achieved,
    /// The priority was missed
    NotAchieved,
    /// Some progress, not complete
    PartiallyAchieved,
}

impl FocusStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusStatus::Pending => "PENDING",
            FocusStatus::Achieved => "ACHIEVED",
            FocusStatus::NotAchieved => "NOT_ACHIEVED",
            FocusStatus::PartiallyAchieved => "PARTIALLY_ACHIEVED",
        }
    }

    /// Human-friendly label (e.g., "Partially achieved").
    pub fn display_name(&self) -> &'static str {
        match self {
            FocusStatus::Pending => "Pending",
            FocusStatus::Achieved => "Achieved",
            FocusStatus::NotAchieved => "Not achieved",
            FocusStatus::PartiallyAchieved => "Partially achieved",
        }
    }
}

impl std::str::FromStr for FocusStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "PENDING" => Ok(FocusStatus::Pending),
            "ACHIEVED" => Ok(FocusStatus::Achieved),
            "NOT_ACHIEVED" => Ok(FocusStatus::NotAchieved),
            "PARTIALLY_ACHIEVED" => Ok(FocusStatus::PartiallyAchieved),
            _ => Err(format!("unknown focus status: {}", s)),
        }
    }
}

/// One day's stated priority and its outcome.
///
/// Several entries may share a calendar day; nothing enforces uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusEntry {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owner of this entry
    pub owner_id: String,
    /// The stated priority
    pub title: String,
    /// Outcome
    pub status: FocusStatus,
    /// Free-text mood, exactly as typed
    pub mood: String,
    /// Free-text notes
    pub notes: String,
    /// When the entry applies to
    pub date: DateTime<Utc>,
    /// Pointer to an uploaded image in object storage
    pub image_url: Option<String>,
}

impl FocusEntry {
    /// Create a new entry with a freshly generated id.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        status: FocusStatus,
        mood: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: title.into(),
            status,
            mood: mood.into(),
            notes: String::new(),
            date,
            image_url: None,
        }
    }

    pub fn is_achieved(&self) -> bool {
        self.status == FocusStatus::Achieved
    }
}

// ============================================
// Decision entries
// ============================================

/// Life area a decision belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionCategory {
    Career,
    Health,
    Finance,
    Relationships,
    Lifestyle,
    General,
    Other,
}

impl DecisionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionCategory::Career => "CAREER",
            DecisionCategory::Health => "HEALTH",
            DecisionCategory::Finance => "FINANCE",
            DecisionCategory::Relationships => "RELATIONSHIPS",
            DecisionCategory::Lifestyle => "LIFESTYLE",
            DecisionCategory::General => "GENERAL",
            DecisionCategory::Other => "OTHER",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DecisionCategory::Career => "Career",
            DecisionCategory::Health => "Health",
            DecisionCategory::Finance => "Finance",
            DecisionCategory::Relationships => "Relationships",
            DecisionCategory::Lifestyle => "Lifestyle",
            DecisionCategory::General => "General",
            DecisionCategory::Other => "Other",
        }
    }
}

impl std::str::FromStr for DecisionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CAREER" => Ok(DecisionCategory::Career),
            "HEALTH" => Ok(DecisionCategory::Health),
            "FINANCE" => Ok(DecisionCategory::Finance),
            "RELATIONSHIPS" => Ok(DecisionCategory::Relationships),
            "LIFESTYLE" => Ok(DecisionCategory::Lifestyle),
            "GENERAL" => Ok(DecisionCategory::General),
            "OTHER" => Ok(DecisionCategory::Other),
            _ => Err(format!("unknown decision category: {}", s)),
        }
    }
}

/// A logged decision and its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEntry {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owner of this entry
    pub owner_id: String,
    /// What was decided
    pub title: String,
    /// Why
    pub reason: String,
    /// Life area
    pub category: DecisionCategory,
    /// When the decision was made
    pub date: DateTime<Utc>,
    /// Pointer to an uploaded image in object storage
    pub image_url: Option<String>,
}

impl DecisionEntry {
    /// Create a new entry with a freshly generated id.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        category: DecisionCategory,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: title.into(),
            reason: String::new(),
            category,
            date,
            image_url: None,
        }
    }
}
