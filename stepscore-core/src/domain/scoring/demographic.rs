// stepscore-core/src/domain/scoring/demographic.rs

use regex::Regex;
use serde::Deserialize;

use crate::domain::error::DomainError;
use crate::domain::scoring::digits::fold_digits;
use crate::domain::scoring::likert::parse_number;
use crate::domain::table::{NormalizedCell, RawCell};

/// Offset added to the floor of an open-ended upper bin ("more than N").
pub const OPEN_UPPER_BIN_OFFSET: f64 = 5.0;

pub const DEFAULT_GREATER_MARKERS: [&str; 2] = ["大于", ">"];
pub const DEFAULT_LESS_MARKERS: [&str; 2] = ["小于", "<"];

/// A demographic column to carry into the output table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemographicFieldSpec {
    pub name: String,
    pub position: usize,
}

impl DemographicFieldSpec {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    /// Age, cohabitation duration and age at start of cohabitation.
    pub fn stepfamily_defaults() -> Vec<Self> {
        vec![
            Self::new("demo_age", 10),
            Self::new("demo_cohab_duration", 13),
            Self::new("demo_start_age_cohab", 15),
        ]
    }
}

/// Turns loosely formatted numeric answers ("1-3年", "大于10年", "18") into
/// one representative number.
///
/// Rules are tried in order and the first match wins:
/// 1. already numeric
/// 2. `A-B` range, midpoint
/// 3. greater-than marker + N, `N + 5`
/// 4. less-than marker + N, `N / 2`
/// 5. first embedded integer
/// 6. otherwise missing
///
/// The range rule must precede the single-integer rule, or "1-3" would read as 1.
///
/// Rule 1 parses the whole text as a float, so `"-5"` gives -5 and `"2.5"`
/// gives 2.5 rather than the bare integers 5 and 2.
///
/// Digits in any script count: `"１８岁"` reads as 18.
#[derive(Debug, Clone)]
pub struct DemographicParser {
    range: Regex,
    greater: Option<Regex>,
    less: Option<Regex>,
    integer: Regex,
}

impl DemographicParser {
    pub fn standard() -> Result<Self, DomainError> {
        Self::with_markers(&DEFAULT_GREATER_MARKERS, &DEFAULT_LESS_MARKERS)
    }

    /// Builds a parser with custom comparative markers. An empty marker list
    /// disables the corresponding rule.
    pub fn with_markers<S: AsRef<str>>(greater: &[S], less: &[S]) -> Result<Self, DomainError> {
        Ok(Self {
            range: compile(r"(\d+)\s*-\s*(\d+)")?,
            greater: marker_regex(greater)?,
            less: marker_regex(less)?,
            integer: compile(r"\d+")?,
        })
    }

    pub fn parse(&self, cell: &RawCell) -> NormalizedCell {
        match cell {
            RawCell::Number(n) => NormalizedCell::from_f64(*n),
            RawCell::Text(text) => self.parse_text(text),
            RawCell::Empty => NormalizedCell::Missing,
        }
    }

    fn parse_text(&self, text: &str) -> NormalizedCell {
        if let NormalizedCell::Value(v) = parse_number(text) {
            return NormalizedCell::Value(v);
        }

        if let Some(caps) = self.range.captures(text)
            && let (Some(a), Some(b)) = (capture_f64(&caps, 1), capture_f64(&caps, 2))
        {
            return NormalizedCell::from_f64((a + b) / 2.0);
        }

        if let Some(n) = self.greater.as_ref().and_then(|re| first_capture(re, text)) {
            return NormalizedCell::from_f64(n + OPEN_UPPER_BIN_OFFSET);
        }

        if let Some(n) = self.less.as_ref().and_then(|re| first_capture(re, text)) {
            return NormalizedCell::from_f64(n / 2.0);
        }

        self.integer
            .find_iter(text)
            .find_map(|m| parse_digits(m.as_str()))
            .map_or(NormalizedCell::Missing, NormalizedCell::from_f64)
    }
}

fn compile(pattern: &str) -> Result<Regex, DomainError> {
    Regex::new(pattern).map_err(|e| DomainError::InvalidPattern(format!("{}: {}", pattern, e)))
}

fn marker_regex<S: AsRef<str>>(markers: &[S]) -> Result<Option<Regex>, DomainError> {
    let alternatives: Vec<String> = markers
        .iter()
        .map(|m| m.as_ref())
        .filter(|m| !m.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }
    compile(&format!(r"(?:{})\s*(\d+)", alternatives.join("|"))).map(Some)
}

// `\d` is Unicode-aware, so matches may hold full-width or other-script digits.
fn parse_digits(digits: &str) -> Option<f64> {
    fold_digits(digits).parse::<f64>().ok()
}

fn capture_f64(caps: &regex::Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group).and_then(|m| parse_digits(m.as_str()))
}

fn first_capture(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text).and_then(|caps| capture_f64(&caps, 1))
}
