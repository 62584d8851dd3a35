//! Parser for tag-block vehicle documents.
//!
//! ```text
//! <Name>
//! Demolisher Heavy Tank
//! </Name>
//!
//! <Turret Equipment>
//! Autocannon/20
//! </Turret Equipment>
//! ```
//!
//! Tag names are case-insensitive and may contain spaces and colons
//! (`<mul id:>`). A tag runs until its matching close tag or end of input.

use super::{parse_int, ParsedUnit, NARRATIVE_SECTIONS};
use crate::normalize::{normalize_header_key, split_csv_like};
use crate::types::UnitKind;

/// Location used for an `<Equipment>` tag with no prefix
pub const DEFAULT_EQUIPMENT_LOCATION: &str = "Body";

const EQUIPMENT_MARKER: &str = "equipment";

/// Parse `<Tag>` at the start of a line. Returns the tag name and whatever
/// follows the `>` on the same line.
fn open_tag(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix('<')?;
    if rest.starts_with('/') {
        return None;
    }
    let (name, tail) = rest.split_once('>')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, tail))
}

/// Name inside `</Tag>` at the start of a line
fn close_tag(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("</")?;
    let (name, _) = rest.split_once('>')?;
    Some(name.trim())
}

fn is_close_of(line: &str, tag_norm: &str) -> bool {
    close_tag(line).is_some_and(|name| normalize_header_key(name) == tag_norm)
}

/// `Turret Equipment` -> `Turret`, `Equipment` -> `Body`
fn equipment_location(tag: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with the original.
    let lowered = tag.to_ascii_lowercase();
    let stripped = match lowered.find(EQUIPMENT_MARKER) {
        Some(start) => format!("{}{}", &tag[..start], &tag[start + EQUIPMENT_MARKER.len()..]),
        None => tag.to_string(),
    };
    let location = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if location.is_empty() {
        DEFAULT_EQUIPMENT_LOCATION.to_string()
    } else {
        location
    }
}

fn non_blank_trimmed(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn apply_tag(unit: &mut ParsedUnit, tag: &str, lines: &[&str]) {
    let tag_norm = normalize_header_key(tag);
    let content = lines.join("\n").trim().to_string();
    let fields = &mut unit.fields;

    match tag_norm.as_str() {
        "name" => fields.name = Some(content),
        "model" => fields.model = Some(content),
        "mul id:" | "mul id" => fields.mul_id = parse_int(&content),
        "unittype" => fields.unit_type = Some(content),
        "year" => fields.year = parse_int(&content),
        "originalbuildyear" => fields.original_build_year = parse_int(&content),
        "type" => fields.type_classification = Some(content),
        "role" => fields.role = Some(content),
        "motion_type" => fields.motion_type = Some(content),
        "cruisemp" => fields.cruise_mp = parse_int(&content),
        "engine_type" => fields.engine_type = parse_int(&content),
        "tonnage" => fields.tonnage = content.parse().ok(),
        "fueltype" => fields.fuel_type = Some(content),
        "source" => fields.source = Some(content),
        "armor" => {
            unit.armor = Some(lines.iter().filter_map(|l| parse_int(l)).collect());
        }
        "systemmanufacturers" => {
            for line in lines {
                if let Some((system, name)) = line.split_once(':') {
                    if !system.trim().is_empty() {
                        unit.system_manufacturers
                            .insert(system.trim().to_string(), name.trim().to_string());
                    }
                }
            }
        }
        "manufacturer" => unit.manufacturers = split_csv_like(&content),
        "primaryfactory" => unit.factories = split_csv_like(&content),
        "blockversion" => {}
        t if t.contains(EQUIPMENT_MARKER) => {
            unit.set_location(&equipment_location(tag), non_blank_trimmed(lines));
        }
        t if NARRATIVE_SECTIONS.contains(&t) => {
            unit.narratives.insert(tag_norm.clone(), content);
        }
        _ => {
            unit.specs.insert(tag_norm.clone(), content);
        }
    }
}

/// Parse a vehicle document. Never fails.
pub fn parse(text: &str) -> ParsedUnit {
    let mut unit = ParsedUnit::new(UnitKind::Vehicle, text);
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let Some((tag, tail)) = open_tag(lines[i]) else {
            i += 1;
            continue;
        };
        i += 1;

        let tag_norm = normalize_header_key(tag);
        let mut content: Vec<&str> = Vec::new();

        // `<Tag>value</Tag>` on one line
        let tail = tail.trim();
        if let Some(pos) = tail.find("</") {
            if is_close_of(&tail[pos..], &tag_norm) {
                content.push(&tail[..pos]);
                apply_tag(&mut unit, tag, &content);
                continue;
            }
        }
        if !tail.is_empty() {
            content.push(tail);
        }

        while i < lines.len() {
            let line = lines[i];
            i += 1;
            if is_close_of(line, &tag_norm) {
                break;
            }
            content.push(line.trim_end());
        }

        apply_tag(&mut unit, tag, &content);
    }

    unit
}
