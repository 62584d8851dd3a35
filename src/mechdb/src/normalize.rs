//! Text normalization shared by the parsers, classifier and resolver.
//!
//! Raw equipment text keeps its case for audit; everything that matches
//! against the catalog goes through [`normalize_token`].

/// Sentinels that mark an empty critical slot, compared case-insensitively.
pub const DEFAULT_EMPTY_SENTINELS: &[&str] = &["-empty-", "-empty", "empty", "- empty -"];

/// Case-insensitive set of empty-slot sentinels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptySentinels {
    lowered: Vec<String>,
}

impl EmptySentinels {
    pub fn new<I, S>(sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lowered: Vec<String> = sentinels
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        lowered.sort();
        lowered.dedup();
        Self { lowered }
    }

    /// True when the trimmed line equals a sentinel, ignoring case
    pub fn matches(&self, raw: &str) -> bool {
        let t = raw.trim().to_lowercase();
        self.lowered.iter().any(|s| *s == t)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lowered.iter().map(String::as_str)
    }
}

impl Default for EmptySentinels {
    fn default() -> Self {
        Self::new(DEFAULT_EMPTY_SENTINELS)
    }
}

fn collapse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Normalize an equipment line into a matching token.
///
/// Lower-cases, replaces punctuation other than hyphens with spaces and
/// collapses whitespace. Blank lines and empty-slot sentinels have no token.
pub fn normalize_token(raw: &str, sentinels: &EmptySentinels) -> Option<String> {
    let token = normalize_catalog_key(raw)?;
    if sentinels.matches(&token) {
        return None;
    }
    Some(token)
}

/// Same normalization as [`normalize_token`] without the sentinel check.
pub fn normalize_catalog_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let token = collapse(&strip_punctuation(trimmed).to_lowercase());
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Canonical form for a document header or tag name
pub fn normalize_header_key(key: &str) -> String {
    collapse(&key.trim().to_lowercase())
}

/// Split a comma-separated field into trimmed, non-empty parts
pub fn split_csv_like(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
