//! Turn free-form model output into a [`SynthesizedGuide`].
//!
//! Parsers are tried in order; the first one that applies wins. The last
//! parser in the default chain always applies, so [`normalize`] is total.

use std::sync::LazyLock;

use interviewprep_shared::SynthesizedGuide;
use regex::Regex;
use tracing::debug;

/// Blank-line section boundary.
static SECTION_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\r?\n").expect("valid regex"));

/// Leading code fence with optional language tag, and the closing fence.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?```\s*$").expect("valid regex")
});

const GUIDE_KEYS: [&str; 6] = [
    "overview",
    "technical_areas",
    "questions",
    "strategy",
    "timeline",
    "tips",
];

// ---------------------------------------------------------------------------
// Parser chain
// ---------------------------------------------------------------------------

/// One strategy for reading a guide out of raw model text.
pub trait GuideParser: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when this strategy does not apply to `raw`.
    fn parse(&self, raw: &str) -> Option<SynthesizedGuide>;
}

/// Ordered list of parsers.
pub struct Normalizer {
    parsers: Vec<Box<dyn GuideParser>>,
}

impl Normalizer {
    /// Strict JSON first, heuristic sections last.
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(JsonGuideParser), Box::new(SectionGuideParser)],
        }
    }

    pub fn normalize(&self, raw: &str) -> SynthesizedGuide {
        for parser in &self.parsers {
            if let Some(guide) = parser.parse(raw) {
                debug!(parser = parser.name(), "model output normalized");
                return guide;
            }
        }
        SynthesizedGuide::default()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with the default parser chain.
pub fn normalize(raw: &str) -> SynthesizedGuide {
    Normalizer::new().normalize(raw)
}

/// Strip a surrounding Markdown code fence, if any.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

// ---------------------------------------------------------------------------
// Strict JSON
// ---------------------------------------------------------------------------

/// A JSON object carrying at least one guide key. Absent keys default.
pub struct JsonGuideParser;

impl GuideParser for JsonGuideParser {
    fn name(&self) -> &str {
        "json"
    }

    fn parse(&self, raw: &str) -> Option<SynthesizedGuide> {
        let body = strip_code_fence(raw);
        if !body.starts_with('{') {
            return None;
        }

        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;
        if !GUIDE_KEYS.iter().any(|k| object.contains_key(*k)) {
            return None;
        }

        serde_json::from_value(value).ok()
    }
}

// ---------------------------------------------------------------------------
// Heuristic sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Overview,
    TechnicalAreas,
    Questions,
    Strategy,
    Timeline,
    Tips,
}

/// Anchors in priority order.
const ANCHORS: [(&str, Field); 5] = [
    ("technical areas", Field::TechnicalAreas),
    ("questions", Field::Questions),
    ("strategy", Field::Strategy),
    ("timeline", Field::Timeline),
    ("tips", Field::Tips),
];

/// Blank-line sections routed by keyword anchors. Always applies.
pub struct SectionGuideParser;

impl GuideParser for SectionGuideParser {
    fn name(&self) -> &str {
        "sections"
    }

    fn parse(&self, raw: &str) -> Option<SynthesizedGuide> {
        let mut guide = SynthesizedGuide::default();
        let mut active = Field::Overview;

        for section in SECTION_BREAK.split(raw) {
            let text = section.trim();
            if text.is_empty() {
                continue;
            }

            let lower = text.to_lowercase();
            if let Some((_, field)) = ANCHORS.iter().find(|(kw, _)| lower.contains(kw)) {
                active = *field;
            }

            match active {
                Field::Overview => guide.overview = text.to_string(),
                Field::Strategy => guide.strategy = text.to_string(),
                Field::Timeline => guide.timeline = text.to_string(),
                Field::TechnicalAreas => guide.technical_areas.extend(list_items(text)),
                Field::Questions => guide.questions.extend(list_items(text)),
                Field::Tips => guide.tips.extend(list_items(text)),
            }
        }

        Some(guide)
    }
}

/// List-looking lines of a section in order, markers stripped.
fn list_items(section: &str) -> Vec<String> {
    section
        .lines()
        .map(str::trim)
        .filter(|line| is_list_item(line))
        .map(strip_marker)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_list_item(line: &str) -> bool {
    line.starts_with('-')
        || line.starts_with('•')
        || line.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn strip_marker(line: &str) -> &str {
    line.trim_start_matches(|c: char| {
        c == '-' || c == '•' || c == '.' || c == ')' || c.is_ascii_digit() || c.is_whitespace()
    })
    .trim_end()
}
