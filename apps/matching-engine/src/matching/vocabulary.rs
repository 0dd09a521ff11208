/// Controlled motivation vocabulary → keywords that signal it in a job or
/// company description. Keywords are lowercase; matching is substring-based.
pub const MOTIVATION_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Technical challenges",
        &["complex", "challenging", "scale", "distributed", "architecture"],
    ),
    (
        "Career growth",
        &["growth", "mentorship", "learning", "development", "advance"],
    ),
    (
        "Making an impact",
        &["impact", "users", "mission", "change", "difference"],
    ),
    (
        "Work-life balance",
        &["balance", "flexible", "remote", "hours", "pto"],
    ),
    (
        "Team collaboration",
        &["team", "collaborative", "agile", "pair programming"],
    ),
    ("Company mission", &["mission", "vision", "purpose", "values"]),
    (
        "Autonomy and ownership",
        &["ownership", "autonomy", "independent", "self-directed"],
    ),
    (
        "Financial compensation",
        &["competitive", "equity", "stock", "options", "benefits"],
    ),
];

/// A label → keyword-list table. The default is `MOTIVATION_KEYWORDS`; tests
/// and alternative deployments can supply their own.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(String, Vec<String>)>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::from_static(MOTIVATION_KEYWORDS)
    }
}

impl KeywordTable {
    pub fn from_static(table: &[(&str, &[&str])]) -> Self {
        Self {
            entries: table
                .iter()
                .map(|(label, keywords)| {
                    (
                        label.to_string(),
                        keywords.iter().map(|k| k.to_lowercase()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Keywords for a label, compared case-insensitively. Unknown labels map
    /// to no keywords.
    pub fn keywords(&self, label: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(label.trim()))
            .map(|(_, k)| k.as_slice())
            .unwrap_or(&[])
    }
}
