//! Parser for line-oriented mech documents.
//!
//! Every line of the form `Key:value` is a header. A header with an inline
//! value sets a field; a header with nothing after the colon opens a block
//! that collects the following lines until the next header. Blocks whose key
//! names a body part (`Left Arm:`, `Center Torso:`) are equipment lists.

use super::{parse_int, ParsedUnit, NARRATIVE_SECTIONS};
use crate::normalize::{normalize_header_key, split_csv_like};
use crate::types::UnitKind;

/// Words that mark a block key as an equipment location
const LOCATION_WORDS: &[&str] = &["arm", "torso", "head", "leg"];

/// A header that opened a block and the lines collected so far
#[derive(Debug)]
struct Section {
    key: String,
    lines: Vec<String>,
}

struct MtfParser {
    unit: ParsedUnit,
    /// Block currently collecting lines, if any
    section: Option<Section>,
    notes: Vec<String>,
}

/// Split `Key:value` on the first colon. The key must not be blank.
fn split_header(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

fn is_location_key(key: &str) -> bool {
    key.split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|word| LOCATION_WORDS.contains(&word.to_lowercase().as_str()))
}

fn is_narrative_key(key_norm: &str) -> bool {
    NARRATIVE_SECTIONS.contains(&key_norm)
}

impl MtfParser {
    fn new(text: &str) -> Self {
        Self {
            unit: ParsedUnit::new(UnitKind::Mech, text),
            section: None,
            notes: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        if let Some((key, value)) = split_header(line) {
            self.flush();
            if value.is_empty() {
                self.section = Some(Section {
                    key: key.to_string(),
                    lines: Vec::new(),
                });
            } else {
                self.apply_field(&normalize_header_key(key), value);
            }
            return;
        }

        match self.section.as_mut() {
            Some(section) => section.lines.push(line.to_string()),
            None if !line.trim().is_empty() => self.stray(line.trim_end()),
            None => {}
        }
    }

    /// Text outside any block continues the overview when there is one,
    /// otherwise it is kept as free-form notes.
    fn stray(&mut self, line: &str) {
        match self.unit.narratives.get_mut("overview") {
            Some(overview) if !overview.is_empty() => {
                overview.push('\n');
                overview.push_str(line);
            }
            _ => self.notes.push(line.to_string()),
        }
    }

    fn flush(&mut self) {
        let Some(section) = self.section.take() else {
            return;
        };
        let key_norm = normalize_header_key(&section.key);
        let content: Vec<&str> = section
            .lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.trim().is_empty())
            .collect();

        if is_location_key(&section.key) {
            let location = section.key.trim_end_matches(':').trim();
            let lines = content.iter().map(|l| l.trim().to_string()).collect();
            self.unit.set_location(location, lines);
        } else if is_narrative_key(&key_norm) {
            self.unit
                .narratives
                .insert(key_norm, content.join("\n").trim().to_string());
        } else if let [single] = content.as_slice() {
            self.apply_field(&key_norm, single.trim());
        } else {
            self.unit
                .specs
                .insert(key_norm, content.join("\n").trim().to_string());
        }
    }

    fn set_text(&mut self, key_norm: &str, value: &str) -> bool {
        let fields = &mut self.unit.fields;
        let slot = match key_norm {
            "chassis" => &mut fields.name,
            "model" => &mut fields.model,
            "config" => &mut fields.config,
            "techbase" => &mut fields.techbase,
            "era" => &mut fields.era,
            "source" => &mut fields.source,
            "role" => &mut fields.role,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }

    fn apply_field(&mut self, key_norm: &str, value: &str) {
        if self.set_text(key_norm, value) {
            return;
        }
        match key_norm {
            "mul id" => match parse_int(value) {
                Some(id) => self.unit.fields.mul_id = Some(id),
                None => {
                    self.unit.specs.insert(key_norm.to_string(), value.to_string());
                }
            },
            "rules level" => {
                self.unit.fields.rules_level = parse_int(value);
                self.unit.specs.insert(key_norm.to_string(), value.to_string());
            }
            "manufacturer" | "manufacturers" => {
                self.unit.manufacturers.extend(split_csv_like(value));
            }
            "primaryfactory" | "primary factory" | "primary_factory" => {
                self.unit.factories.extend(split_csv_like(value));
            }
            k if k.starts_with("quirk") => self.unit.quirks.push(value.to_string()),
            k if k.starts_with("systemmanufacturer") || k.starts_with("system manufacturer") => {
                match value.split_once(':') {
                    Some((system, name)) if !system.trim().is_empty() => {
                        self.unit
                            .system_manufacturers
                            .insert(system.trim().to_string(), name.trim().to_string());
                    }
                    _ => {
                        self.unit.specs.insert(key_norm.to_string(), value.to_string());
                    }
                }
            }
            k if is_narrative_key(k) => {
                self.unit.narratives.insert(k.to_string(), value.to_string());
            }
            _ => {
                self.unit.specs.insert(key_norm.to_string(), value.to_string());
            }
        }
    }

    fn finish(mut self) -> ParsedUnit {
        self.flush();
        if !self.notes.is_empty() {
            self.unit
                .specs
                .insert("notes".to_string(), self.notes.join("\n"));
        }
        self.unit.quirks.retain(|q| !q.trim().is_empty());
        self.unit
    }
}

/// Parse a mech document. Never fails.
pub fn parse(text: &str) -> ParsedUnit {
    let mut parser = MtfParser::new(text);
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATLAS: &str = "\
Version:1.0
chassis:Atlas
model:AS7-D
mul id:140
Config:Biped
techbase:Inner Sphere
era:2755
source:TRO 3025
rules level:1
role:Juggernaut
quirk:command_mech
quirk:imp_com

Manufacturer:Defiance Industries, Kali Yama
PrimaryFactory:Hesperus II
systemmanufacturer:CHASSIS:Foundation Type 10X
systemmanufacturer:ENGINE:Vlar 300

Mass:100
Engine:300 Fusion Engine(IS)

Left Arm:
Shoulder
Upper Arm Actuator
Medium Laser
-Empty-

Head:
Life Support
Sensors
Cockpit

overview:The Atlas is a walking fortress.
It inspires fear.

capabilities:
Massive armor.
Heavy guns.
";

    #[test]
    fn test_scalar_fields() {
        let unit = parse(ATLAS);
        assert_eq!(unit.kind, UnitKind::Mech);
        assert_eq!(unit.fields.name.as_deref(), Some("Atlas"));
        assert_eq!(unit.fields.model.as_deref(), Some("AS7-D"));
        assert_eq!(unit.fields.mul_id, Some(140));
        assert_eq!(unit.fields.config.as_deref(), Some("Biped"));
        assert_eq!(unit.fields.rules_level, Some(1));
        assert_eq!(unit.fields.role.as_deref(), Some("Juggernaut"));
        assert_eq!(unit.specs.get("mass").map(String::as_str), Some("100"));
        assert_eq!(unit.specs.get("version").map(String::as_str), Some("1.0"));
        assert_eq!(unit.raw_text, ATLAS);
    }

    #[test]
    fn test_lists_and_system_manufacturers() {
        let unit = parse(ATLAS);
        assert_eq!(unit.manufacturers, vec!["Defiance Industries", "Kali Yama"]);
        assert_eq!(unit.factories, vec!["Hesperus II"]);
        assert_eq!(unit.quirks, vec!["command_mech", "imp_com"]);
        assert_eq!(
            unit.system_manufacturers.get("CHASSIS").map(String::as_str),
            Some("Foundation Type 10X")
        );
        assert_eq!(
            unit.system_manufacturers.get("ENGINE").map(String::as_str),
            Some("Vlar 300")
        );
    }

    #[test]
    fn test_location_blocks_keep_raw_case_and_order() {
        let unit = parse(ATLAS);
        let names: Vec<&str> = unit.locations.iter().map(|b| b.location.as_str()).collect();
        assert_eq!(names, vec!["Left Arm", "Head"]);
        assert_eq!(
            unit.location("Left Arm").unwrap(),
            &["Shoulder", "Upper Arm Actuator", "Medium Laser", "-Empty-"]
        );
    }

    #[test]
    fn test_narratives_and_stray_lines() {
        let unit = parse(ATLAS);
        assert_eq!(
            unit.narratives.get("overview").map(String::as_str),
            Some("The Atlas is a walking fortress.\nIt inspires fear.")
        );
        assert_eq!(
            unit.narratives.get("capabilities").map(String::as_str),
            Some("Massive armor.\nHeavy guns.")
        );
    }

    #[test]
    fn test_stray_lines_without_overview_become_notes() {
        let unit = parse("chassis:Locust\nWeapons:1\n1 Medium Laser, Center Torso\n");
        assert_eq!(unit.specs.get("weapons").map(String::as_str), Some("1"));
        assert_eq!(
            unit.specs.get("notes").map(String::as_str),
            Some("1 Medium Laser, Center Torso")
        );
    }

    #[test]
    fn test_bad_mul_id_is_kept_as_spec() {
        let unit = parse("mul id:N/A\n");
        assert_eq!(unit.fields.mul_id, None);
        assert_eq!(unit.specs.get("mul id").map(String::as_str), Some("N/A"));
    }

    #[test]
    fn test_single_line_block_acts_like_inline_value() {
        let unit = parse("model:\nLCT-1V\nunknownblock:\na\nb\n");
        assert_eq!(unit.fields.model.as_deref(), Some("LCT-1V"));
        assert_eq!(unit.specs.get("unknownblock").map(String::as_str), Some("a\nb"));
    }

    #[test]
    fn test_garbage_never_fails() {
        for text in ["", ":::", "\n\n\n", ":value only", "Left Arm:\n\n\n", "\u{0}\u{1}"] {
            let unit = parse(text);
            assert_eq!(unit.kind, UnitKind::Mech);
        }
        let unit = parse("Left Arm:\n\n\n");
        assert_eq!(unit.location("Left Arm"), Some(&[] as &[String]));
    }

    #[test]
    fn test_location_word_detection() {
        assert!(is_location_key("Left Arm"));
        assert!(is_location_key("Center Torso (rear)"));
        assert!(is_location_key("HEAD"));
        assert!(!is_location_key("Armor"));
        assert!(!is_location_key("Legacy"));
    }
}
