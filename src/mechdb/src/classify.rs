//! Equipment line classification.
//!
//! A line is sorted into exactly one [`Category`] by an ordered rule table.
//! Rules come from configuration (see [`ClassifierRules`]) and are always
//! evaluated in category precedence: empty, ammo, weapon, component. A line
//! no rule claims is `unknown`.

use crate::normalize::{EmptySentinels, DEFAULT_EMPTY_SENTINELS};
use crate::repository::{CatalogRepository, RepoError, RepoResult};
use crate::types::Category;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category assigned to component types created by the classifier
pub const COMPONENT_TYPE_CATEGORY: &str = "component";

/// How a rule's patterns are compared against a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Whole trimmed line equals a pattern
    Exact,
    /// Pattern appears as whole word(s)
    Word,
    /// Pattern appears anywhere
    Substring,
}

/// One rule as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub category: Category,
    #[serde(rename = "match")]
    pub kind: MatchKind,
    pub patterns: Vec<String>,
    /// Component type created for lines this rule claims (component rules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
}

impl RuleSpec {
    fn new(category: Category, kind: MatchKind, patterns: &[&str]) -> Self {
        Self {
            category,
            kind,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            component_type: None,
        }
    }

    fn component(component_type: &str, patterns: &[&str]) -> Self {
        Self {
            component_type: Some(component_type.to_string()),
            ..Self::new(Category::Component, MatchKind::Substring, patterns)
        }
    }
}

/// Data-driven classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRules {
    #[serde(default = "default_empty_sentinels")]
    pub empty_sentinels: Vec<String>,
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleSpec>,
}

fn default_empty_sentinels() -> Vec<String> {
    DEFAULT_EMPTY_SENTINELS.iter().map(|s| s.to_string()).collect()
}

fn default_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new(Category::Ammo, MatchKind::Substring, &["ammo"]),
        RuleSpec::new(Category::Ammo, MatchKind::Word, &["amo", "ammunition"]),
        RuleSpec::new(
            Category::Weapon,
            MatchKind::Word,
            &[
                "lrm",
                "srm",
                "ml",
                "gauss",
                "laser",
                "large",
                "medium",
                "small",
                "ac",
                "plasma",
                "ppc",
                "mg",
                "machine gun",
                "autocannon",
                "missile",
                "flamer",
                "cannon",
            ],
        ),
        RuleSpec::component(
            "actuator",
            &[
                "actuator",
                "shoulder",
                "upper arm",
                "lower arm",
                "hand",
                "hip",
                "upper leg",
                "lower leg",
                "foot",
            ],
        ),
        RuleSpec::component("engine", &["fusion engine", "engine"]),
        RuleSpec::component("gyro", &["gyro"]),
        RuleSpec::component("cockpit", &["cockpit"]),
        RuleSpec::component("life_support", &["life support"]),
        RuleSpec::component("sensors", &["sensor"]),
        RuleSpec::component("heat_sink", &["heat sink"]),
        RuleSpec::component("jump_jet", &["jump jet"]),
        RuleSpec::component("case", &["case"]),
        RuleSpec::component("armor", &["armor"]),
    ]
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            empty_sentinels: default_empty_sentinels(),
            rules: default_rules(),
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(Vec<String>),
    Word(Regex),
    Substring(Vec<String>),
}

/// A compiled classification rule
#[derive(Debug, Clone)]
pub struct Rule {
    category: Category,
    matcher: Matcher,
    component_type: Option<String>,
}

impl Rule {
    /// Compile a rule. Patterns are lower-cased; word patterns become one
    /// alternation bounded by `\b`.
    pub fn compile(spec: &RuleSpec) -> RepoResult<Self> {
        let patterns: Vec<String> = spec
            .patterns
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let matcher = match spec.kind {
            MatchKind::Exact => Matcher::Exact(patterns),
            MatchKind::Substring => Matcher::Substring(patterns),
            // An empty alternation would match every line.
            MatchKind::Word if patterns.is_empty() => Matcher::Substring(patterns),
            MatchKind::Word => {
                let alternation = patterns
                    .iter()
                    .map(|p| regex::escape(p))
                    .collect::<Vec<_>>()
                    .join("|");
                let source = format!(r"\b(?:{})\b", alternation);
                let re = Regex::new(&source).map_err(|e| RepoError::InvalidRule {
                    pattern: source.clone(),
                    source: e,
                })?;
                Matcher::Word(re)
            }
        };

        let component_type = match spec.category {
            Category::Component => spec
                .component_type
                .clone()
                .or_else(|| spec.patterns.first().map(|p| p.trim().to_lowercase())),
            _ => None,
        };

        Ok(Self {
            category: spec.category,
            matcher,
            component_type,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Test a line that has already been lower-cased
    pub fn matches(&self, lowered: &str) -> bool {
        match &self.matcher {
            Matcher::Exact(patterns) => {
                let t = lowered.trim();
                patterns.iter().any(|p| p == t)
            }
            Matcher::Word(re) => re.is_match(lowered),
            Matcher::Substring(patterns) => patterns.iter().any(|p| lowered.contains(p.as_str())),
        }
    }
}

/// Result of classifying one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub category: Category,
    /// Component type name when the category is component
    pub component_type: Option<&'a str>,
}

/// Ordered, compiled rule table
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    sentinels: EmptySentinels,
}

impl Classifier {
    /// Compile a rule table. The configured empty sentinels become the first
    /// rule; the rest are stably ordered by category precedence.
    pub fn from_rules(config: &ClassifierRules) -> RepoResult<Self> {
        let sentinels = EmptySentinels::new(&config.empty_sentinels);
        let empty_rule = RuleSpec {
            category: Category::Empty,
            kind: MatchKind::Exact,
            patterns: sentinels.iter().map(str::to_string).collect(),
            component_type: None,
        };

        let mut rules = vec![Rule::compile(&empty_rule)?];
        for spec in &config.rules {
            if spec.category == Category::Unknown {
                continue;
            }
            rules.push(Rule::compile(spec)?);
        }
        rules.sort_by_key(Rule::category);

        Ok(Self { rules, sentinels })
    }

    pub fn sentinels(&self) -> &EmptySentinels {
        &self.sentinels
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify a raw line. Pure and deterministic.
    pub fn classify(&self, raw: &str) -> Classification<'_> {
        let lowered = raw.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| Classification {
                category: rule.category,
                component_type: rule.component_type.as_deref(),
            })
            .unwrap_or(Classification {
                category: Category::Unknown,
                component_type: None,
            })
    }

    /// Classify a line and, for components, look up or create its type row.
    pub fn classify_and_resolve<C>(&self, raw: &str, catalog: &C) -> RepoResult<(Category, Option<i64>)>
    where
        C: CatalogRepository + ?Sized,
    {
        let classification = self.classify(raw);
        let component_type_id = match classification.component_type {
            Some(name) => Some(catalog.get_or_create_component_type(name, COMPONENT_TYPE_CATEGORY)?),
            None => None,
        };
        Ok((classification.category, component_type_id))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_rules(&ClassifierRules::default()).expect("built-in classifier rules are valid")
    }
}
