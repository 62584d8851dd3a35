//! Unit document parsers.
//!
//! Two grammars feed one [`ParsedUnit`] shape:
//!
//! - [`mtf`] - line-oriented `Key:value` mech documents
//! - [`blk`] - `<Tag>` / `</Tag>` block vehicle documents
//!
//! Parsing never fails. Unrecognized keys land in [`ParsedUnit::specs`] and
//! numeric fields that do not parse are left unset.

pub mod blk;
pub mod mtf;

use crate::types::UnitKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name used when a document carries no unit name at all
pub const UNKNOWN_UNIT_NAME: &str = "UNKNOWN";

/// Positional order of the values in a vehicle armor block
pub const ARMOR_LOCATIONS: [&str; 5] = ["front", "left", "right", "rear", "turret"];

/// Narrative section names recognized by both grammars
pub const NARRATIVE_SECTIONS: &[&str] = &["overview", "capabilities", "deployment", "history"];

/// Source document grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grammar {
    /// `Key:value` headers and location blocks
    Mtf,
    /// Open/close tag blocks
    Blk,
}

impl Grammar {
    /// Pick a grammar from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mtf" => Some(Self::Mtf),
            "blk" => Some(Self::Blk),
            _ => None,
        }
    }

    /// Guess the grammar from content: a leading `<tag>` line means BLK
    pub fn sniff(text: &str) -> Self {
        let first = text.lines().map(str::trim).find(|l| !l.is_empty());
        match first {
            Some(line) if line.starts_with('<') && line.contains('>') => Self::Blk,
            _ => Self::Mtf,
        }
    }

    /// Extension first, content second
    pub fn detect(path: &Path, text: &str) -> Self {
        Self::from_path(path).unwrap_or_else(|| Self::sniff(text))
    }

    /// Unit kind produced by documents of this grammar
    pub fn unit_kind(&self) -> UnitKind {
        match self {
            Self::Mtf => UnitKind::Mech,
            Self::Blk => UnitKind::Vehicle,
        }
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mtf => write!(f, "mtf"),
            Self::Blk => write!(f, "blk"),
        }
    }
}

/// Scalar descriptive fields shared by mechs and vehicles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitFields {
    /// Chassis (mechs) or name (vehicles)
    pub name: Option<String>,
    pub model: Option<String>,
    pub mul_id: Option<i64>,
    pub unit_type: Option<String>,
    pub config: Option<String>,
    pub techbase: Option<String>,
    pub era: Option<String>,
    pub source: Option<String>,
    pub rules_level: Option<i64>,
    pub role: Option<String>,
    pub year: Option<i64>,
    pub original_build_year: Option<i64>,
    pub type_classification: Option<String>,
    pub motion_type: Option<String>,
    pub cruise_mp: Option<i64>,
    pub engine_type: Option<i64>,
    pub tonnage: Option<f64>,
    pub fuel_type: Option<String>,
}

/// Equipment lines of one location, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentBlock {
    pub location: String,
    pub lines: Vec<String>,
}

/// Output of either parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedUnit {
    pub kind: UnitKind,
    pub fields: UnitFields,
    /// Locations in order of first appearance
    pub locations: Vec<EquipmentBlock>,
    pub narratives: BTreeMap<String, String>,
    pub manufacturers: Vec<String>,
    pub factories: Vec<String>,
    pub quirks: Vec<String>,
    /// System type (CHASSIS, ENGINE, ...) to manufacturer name
    pub system_manufacturers: BTreeMap<String, String>,
    pub armor: Option<Vec<i64>>,
    /// Everything the parser did not map to a field
    pub specs: BTreeMap<String, String>,
    pub raw_text: String,
}

impl ParsedUnit {
    pub fn new(kind: UnitKind, raw_text: &str) -> Self {
        Self {
            kind,
            fields: UnitFields::default(),
            locations: Vec::new(),
            narratives: BTreeMap::new(),
            manufacturers: Vec::new(),
            factories: Vec::new(),
            quirks: Vec::new(),
            system_manufacturers: BTreeMap::new(),
            armor: None,
            specs: BTreeMap::new(),
            raw_text: raw_text.to_string(),
        }
    }

    /// Set the lines of a location, replacing an earlier block of the same name
    pub fn set_location(&mut self, location: &str, lines: Vec<String>) {
        match self.locations.iter_mut().find(|b| b.location == location) {
            Some(block) => block.lines = lines,
            None => self.locations.push(EquipmentBlock {
                location: location.to_string(),
                lines,
            }),
        }
    }

    pub fn location(&self, location: &str) -> Option<&[String]> {
        self.locations
            .iter()
            .find(|b| b.location == location)
            .map(|b| b.lines.as_slice())
    }

    /// Name the document actually carries: the name field or a `chassis` spec
    /// entry. Blank values count as absent.
    pub fn declared_name(&self) -> Option<&str> {
        self.fields
            .name
            .as_deref()
            .or_else(|| self.specs.get("chassis").map(String::as_str))
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Declared name, or a placeholder when the document has none
    pub fn display_name(&self) -> &str {
        self.declared_name().unwrap_or(UNKNOWN_UNIT_NAME)
    }

    /// Stable external identifier (the MUL id)
    pub fn external_id(&self) -> Option<String> {
        self.fields.mul_id.map(|id| id.to_string())
    }

    /// Reference stamped on staging rows to find the owning unit later.
    ///
    /// Vehicles without a MUL id fall back to their name; mechs without one
    /// have no reference and are never finalized. A name reference resolves
    /// to the oldest unit of that name, so re-ingesting an id-less vehicle
    /// adds a unit that never receives slots.
    pub fn unit_reference(&self) -> Option<String> {
        match (self.external_id(), self.kind) {
            (Some(id), _) => Some(id),
            (None, UnitKind::Vehicle) => Some(self.display_name().to_string()),
            (None, UnitKind::Mech) => None,
        }
    }

    /// Armor values paired with their positional location; extras are dropped
    pub fn armor_by_location(&self) -> Vec<(&'static str, i64)> {
        self.armor
            .as_deref()
            .unwrap_or_default()
            .iter()
            .zip(ARMOR_LOCATIONS)
            .map(|(points, location)| (location, *points))
            .collect()
    }

    /// Total equipment lines across all locations
    pub fn equipment_count(&self) -> usize {
        self.locations.iter().map(|b| b.lines.len()).sum()
    }
}

/// Parse a document with the given grammar
pub fn parse(text: &str, grammar: Grammar) -> ParsedUnit {
    match grammar {
        Grammar::Mtf => mtf::parse(text),
        Grammar::Blk => blk::parse(text),
    }
}

/// Lenient integer coercion; anything unparsable is `None`
pub(crate) fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}
