//! Shared record types for the unit database.
//!
//! These types are storage-agnostic and used by every pipeline phase.

use serde::{Deserialize, Serialize};

/// Kind of cataloged unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Mech,
    Vehicle,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mech => write!(f, "mech"),
            Self::Vehicle => write!(f, "vehicle"),
        }
    }
}

impl std::str::FromStr for UnitKind {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mech" => Ok(Self::Mech),
            "vehicle" => Ok(Self::Vehicle),
            _ => Err(ParseError::InvalidUnitKind(s.to_string())),
        }
    }
}

/// Classification of a single equipment line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Empty,
    Ammo,
    Weapon,
    Component,
    Unknown,
}

impl Category {
    /// All categories, in classification precedence order
    pub const ALL: &'static [Category] = &[
        Category::Empty,
        Category::Ammo,
        Category::Weapon,
        Category::Component,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Ammo => "ammo",
            Self::Weapon => "weapon",
            Self::Component => "component",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(Self::Empty),
            "ammo" => Ok(Self::Ammo),
            "weapon" => Ok(Self::Weapon),
            "component" => Ok(Self::Component),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseError::InvalidCategory(s.to_string())),
        }
    }
}

/// How a staging row was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionHint {
    /// Token equals a canonical weapon name
    Exact,
    /// Token equals a weapon alias
    Alias,
    /// Component row with a component type attached at staging time
    Component,
    /// Empty-slot sentinel
    Empty,
}

impl std::fmt::Display for ResolutionHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Alias => write!(f, "alias"),
            Self::Component => write!(f, "component"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

impl std::str::FromStr for ResolutionHint {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "alias" => Ok(Self::Alias),
            "component" => Ok(Self::Component),
            "empty" => Ok(Self::Empty),
            _ => Err(ParseError::InvalidResolutionHint(s.to_string())),
        }
    }
}

/// Status of an enrichment lookup job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseError::InvalidJobStatus(s.to_string())),
        }
    }
}

/// Error decoding an enum from its stored text form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid unit kind: {0}")]
    InvalidUnitKind(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Invalid resolution hint: {0}")]
    InvalidResolutionHint(String),
    #[error("Invalid job status: {0}")]
    InvalidJobStatus(String),
}

/// A unit row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    pub kind: UnitKind,
    pub name: String,
    pub model: Option<String>,
    pub external_id: Option<String>,
    pub unit_type: Option<String>,
    pub techbase: Option<String>,
    pub era: Option<String>,
    pub source: Option<String>,
    pub rules_level: Option<i64>,
    pub role: Option<String>,
    pub year: Option<i64>,
    pub tonnage: Option<f64>,
    pub bv: Option<i64>,
    pub pv: Option<i64>,
    pub created_at: String,
}

/// A staging row awaiting resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingRow {
    pub id: i64,
    pub file_name: Option<String>,
    pub unit_ref: Option<String>,
    pub location_name: String,
    pub slot_index: i64,
    pub raw_text: String,
    pub normalized_token: Option<String>,
    pub category: Category,
    pub weapon_id: Option<i64>,
    pub component_type_id: Option<i64>,
    pub resolved: bool,
    pub resolution_hint: Option<ResolutionHint>,
    pub created_at: String,
}

/// A finalized slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: i64,
    pub location_id: i64,
    pub slot_index: i64,
    pub raw_text: Option<String>,
    pub component_type_id: Option<i64>,
    pub note: Option<String>,
}

/// Aggregate of an equipment token that matched nothing in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedToken {
    pub token: String,
    pub sample_raw: Option<String>,
    pub example_staging_id: Option<i64>,
    pub seen_count: i64,
    pub last_seen: String,
}

/// Per-document ingestion outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderLogEntry {
    pub id: i64,
    pub file_name: String,
    pub status: String,
    pub message: Option<String>,
    pub created_at: String,
}

/// Database statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbStats {
    pub unit_count: i64,
    pub location_count: i64,
    pub staging_count: i64,
    pub staging_resolved: i64,
    pub slot_count: i64,
    pub weapon_instance_count: i64,
    pub weapon_count: i64,
    pub alias_count: i64,
    pub component_type_count: i64,
    pub unresolved_token_count: i64,
    pub pending_job_count: i64,
}
