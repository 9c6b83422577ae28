// stepscore-core/src/domain/scale/definition.rs

use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};

use crate::domain::error::DomainError;

pub const DEFAULT_SCALE_MAX: u32 = 5;

/// A named group of item columns scored together.
///
/// Invariants (checked by [`ScaleDefinition::new`], also on YAML load):
/// items are non-empty and distinct, every reverse offset indexes into the
/// items, `scale_max >= 1`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ScaleSpec")]
pub struct ScaleDefinition {
    name: String,
    item_positions: Vec<usize>,
    reverse_item_offsets: BTreeSet<usize>,
    scale_max: u32,
    note: Option<String>,
}

impl ScaleDefinition {
    pub fn new(
        name: impl Into<String>,
        item_positions: Vec<usize>,
        reverse_item_offsets: impl IntoIterator<Item = usize>,
        scale_max: u32,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidRegistry(
                "scale name cannot be empty".to_string(),
            ));
        }
        if item_positions.is_empty() {
            return Err(DomainError::InvalidRegistry(format!(
                "scale '{}' has no item positions",
                name
            )));
        }
        if scale_max == 0 {
            return Err(DomainError::InvalidRegistry(format!(
                "scale '{}' must have scale_max >= 1",
                name
            )));
        }

        let mut seen = HashSet::with_capacity(item_positions.len());
        if let Some(dup) = item_positions.iter().find(|p| !seen.insert(**p)) {
            return Err(DomainError::InvalidRegistry(format!(
                "scale '{}' lists column {} more than once",
                name, dup
            )));
        }

        let reverse_item_offsets: BTreeSet<usize> = reverse_item_offsets.into_iter().collect();
        if let Some(bad) = reverse_item_offsets
            .iter()
            .find(|o| **o >= item_positions.len())
        {
            return Err(DomainError::InvalidRegistry(format!(
                "scale '{}' has reverse offset {} but only {} items",
                name,
                bad,
                item_positions.len()
            )));
        }

        Ok(Self {
            name,
            item_positions,
            reverse_item_offsets,
            scale_max,
            note: None,
        })
    }

    /// Attaches a provenance remark, logged at the start of every run.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn item_positions(&self) -> &[usize] {
        &self.item_positions
    }

    pub fn reverse_item_offsets(&self) -> &BTreeSet<usize> {
        &self.reverse_item_offsets
    }

    pub fn is_reversed(&self, offset: usize) -> bool {
        self.reverse_item_offsets.contains(&offset)
    }

    pub fn scale_max(&self) -> u32 {
        self.scale_max
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn len(&self) -> usize {
        self.item_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_positions.is_empty()
    }

    /// Highest column position this scale reads.
    pub fn max_position(&self) -> usize {
        self.item_positions.iter().copied().max().unwrap_or(0)
    }
}

// --- YAML FORM ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ScaleSpec {
    name: String,
    items: ItemPositions,
    #[serde(default)]
    reverse_offsets: Vec<usize>,
    #[serde(default = "default_scale_max")]
    scale_max: u32,
    #[serde(default)]
    note: Option<String>,
}

/// Items as an explicit list, or as a half-open `{start, end}` range.
// List must come first: serde would happily read `[3, 7]` as a Range.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemPositions {
    List(Vec<usize>),
    Range { start: usize, end: usize },
}

impl ItemPositions {
    fn into_vec(self) -> Vec<usize> {
        match self {
            ItemPositions::Range { start, end } => (start..end).collect(),
            ItemPositions::List(list) => list,
        }
    }
}

fn default_scale_max() -> u32 {
    DEFAULT_SCALE_MAX
}

impl TryFrom<ScaleSpec> for ScaleDefinition {
    type Error = DomainError;

    fn try_from(spec: ScaleSpec) -> Result<Self, Self::Error> {
        let def = ScaleDefinition::new(
            spec.name,
            spec.items.into_vec(),
            spec.reverse_offsets,
            spec.scale_max,
        )?;
        Ok(match spec.note {
            Some(note) => def.with_note(note),
            None => def,
        })
    }
}
