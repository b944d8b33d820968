//! Requirement identifiers and draft records
//!
//! Explicit codes (`REQ-1`, `FR-12`, `[NFR-3]`, `US-4.2`) found at the
//! start of a requirement's first line are kept. Everything else gets
//! `REQ-<n>` where `n` is the 1-based parse position.
//!
//! A code followed only by whitespace must use a known requirement prefix,
//! so prose such as "COVID-19 screening" is not mistaken for an id.

use once_cell::sync::Lazy;
use regex::Regex;
use specflow_artifact::Requirement;
use std::collections::HashSet;

static EXPLICIT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<open>\[)?(?P<id>(?P<prefix>[A-Z][A-Z0-9_]*)-\d+(?:\.\d+)*)(?P<close>\])?\**(?P<sep>\s*[:.)\-]\s*|\s+|$)",
    )
    .expect("static regex")
});

/// Prefixes accepted without a bracket or punctuation after the code
const KNOWN_PREFIXES: &[&str] = &[
    "REQ", "R", "FR", "NFR", "US", "UC", "BR", "AC", "SR", "TR", "QR", "DR", "SEC", "PERF",
];

static LINE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:#{1,6}\s+|[-*+]\s+|\d+[.)]\s+)").expect("static regex")
});

/// Longest name kept before truncation, in characters
pub(crate) const MAX_NAME_CHARS: usize = 120;

/// Requirement before identifiers are assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Draft {
    pub(crate) explicit_id: Option<String>,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) section: Option<String>,
}

impl Draft {
    /// Build a draft from a block of requirement text.
    ///
    /// Returns `None` when the text is blank.
    pub(crate) fn from_text(text: &str, section: Option<&str>) -> Option<Self> {
        let mut lines = text.lines().map(str::trim_end).skip_while(|l| l.trim().is_empty());
        let head = lines.next()?.trim();
        let head = LINE_MARKER.replace(head, "");
        let head = head.trim_matches('*').trim();

        let (explicit_id, head_rest) = match EXPLICIT_ID.captures(head).filter(is_delimited_code) {
            Some(caps) => {
                let whole = caps.get(0).map_or(0, |m| m.end());
                (Some(caps["id"].to_string()), head[whole..].trim())
            }
            None => (None, head),
        };

        let body: Vec<&str> = lines.collect();
        let body = body.join("\n");
        let body = body.trim();

        let name_source = if head_rest.is_empty() {
            body.lines().find(|l| !l.trim().is_empty()).unwrap_or("")
        } else {
            head_rest
        };
        let name = truncate_name(name_source.trim());

        let description = match (head_rest.is_empty(), body.is_empty()) {
            (true, _) => body.to_string(),
            (false, true) => head_rest.to_string(),
            (false, false) => format!("{head_rest}\n{body}"),
        };

        if name.is_empty() && description.is_empty() && explicit_id.is_none() {
            return None;
        }

        Some(Self {
            explicit_id,
            name,
            description,
            section: section.map(str::to_string),
        })
    }
}

fn is_delimited_code(caps: &regex::Captures<'_>) -> bool {
    let bracketed = caps.name("open").is_some() || caps.name("close").is_some();
    let punctuated = caps.name("sep").is_some_and(|m| !m.as_str().trim().is_empty());
    bracketed || punctuated || KNOWN_PREFIXES.contains(&&caps["prefix"])
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_CHARS {
        return name.to_string();
    }
    let cut: String = name.chars().take(MAX_NAME_CHARS).collect();
    match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > MAX_NAME_CHARS / 2 => format!("{}…", cut[..idx].trim_end()),
        _ => format!("{cut}…"),
    }
}

/// Assign unique identifiers in parse order
pub(crate) fn assign_ids(drafts: Vec<Draft>) -> Vec<Requirement> {
    let explicit: HashSet<String> = drafts.iter().filter_map(|d| d.explicit_id.clone()).collect();
    let mut used: HashSet<String> = HashSet::new();

    drafts
        .into_iter()
        .enumerate()
        .map(|(idx, draft)| {
            let base = draft
                .explicit_id
                .clone()
                .unwrap_or_else(|| format!("REQ-{}", idx + 1));
            let mut id = base.clone();
            let mut k = 1;
            while used.contains(&id) || (draft.explicit_id.is_none() && explicit.contains(&id)) {
                id = format!("{base}.{k}");
                k += 1;
            }
            used.insert(id.clone());

            let name = if draft.name.is_empty() {
                id.clone()
            } else {
                draft.name
            };
            let mut req = Requirement::new(id, name, draft.description);
            req.section = draft.section;
            req
        })
        .collect()
}
