// stepscore-core/src/domain/scoring/likert.rs

use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::error::DomainError;
use crate::domain::scoring::digits::fold_digits;
use crate::domain::table::{NormalizedCell, RawCell};

/// Ordered label → code table for one ordinal response format.
///
/// Codes are exactly `1..=n`, one per label, increasing with intensity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<LikertLevel>")]
pub struct LikertMapping {
    levels: Vec<LikertLevel>,
    index: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LikertLevel {
    pub label: String,
    pub code: u32,
}

impl LikertMapping {
    pub fn new(levels: Vec<LikertLevel>) -> Result<Self, DomainError> {
        if levels.is_empty() {
            return Err(DomainError::InvalidMapping(
                "mapping has no labels".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(levels.len());
        for (i, level) in levels.iter().enumerate() {
            let expected = (i + 1) as u32;
            if level.code != expected {
                return Err(DomainError::InvalidMapping(format!(
                    "label '{}' has code {} but position {} requires code {}",
                    level.label, level.code, i, expected
                )));
            }
            if index.insert(level.label.clone(), level.code).is_some() {
                return Err(DomainError::InvalidMapping(format!(
                    "label '{}' appears more than once",
                    level.label
                )));
            }
        }

        Ok(Self { levels, index })
    }

    /// Builds a mapping from labels listed lowest to highest.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| LikertLevel {
                label: label.into(),
                code: (i + 1) as u32,
            })
            .collect();
        Self::new(levels)
    }

    /// Five-point frequency scale used throughout the stepfamily questionnaire.
    pub fn five_point() -> Self {
        let levels = [
            "几乎从不或从不",
            "很少如此",
            "有时如此",
            "通常如此",
            "几乎总是或总是如此",
        ]
        .iter()
        .enumerate()
        .map(|(i, label)| LikertLevel {
            label: (*label).to_string(),
            code: (i + 1) as u32,
        })
        .collect::<Vec<_>>();

        let index = levels
            .iter()
            .map(|l| (l.label.clone(), l.code))
            .collect();
        Self { levels, index }
    }

    pub fn levels(&self) -> &[LikertLevel] {
        &self.levels
    }

    /// Highest code, i.e. the number of labels.
    pub fn max_code(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn code(&self, label: &str) -> Option<u32> {
        self.index.get(label).copied()
    }

    /// Converts one raw item response into a number.
    ///
    /// Pre-coded numbers pass through, known labels map to their code, other
    /// numeric text is parsed, and anything else becomes `Missing`.
    pub fn normalize(&self, cell: &RawCell) -> NormalizedCell {
        match cell {
            RawCell::Number(n) => NormalizedCell::from_f64(*n),
            RawCell::Text(text) => {
                if let Some(code) = self.code(text) {
                    return NormalizedCell::Value(f64::from(code));
                }
                parse_number(text)
            }
            RawCell::Empty => NormalizedCell::Missing,
        }
    }
}

impl Default for LikertMapping {
    fn default() -> Self {
        Self::five_point()
    }
}

impl TryFrom<Vec<LikertLevel>> for LikertMapping {
    type Error = DomainError;

    fn try_from(levels: Vec<LikertLevel>) -> Result<Self, Self::Error> {
        LikertMapping::new(levels)
    }
}

/// Whole-string numeric parse; only finite results count. Digits from any
/// script are accepted (`"４"` reads as 4).
pub(crate) fn parse_number(text: &str) -> NormalizedCell {
    fold_digits(text.trim())
        .parse::<f64>()
        .map_or(NormalizedCell::Missing, NormalizedCell::from_f64)
}
