// stepscore-core/src/domain/scale/registry.rs

use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};

use crate::domain::error::DomainError;
use crate::domain::scale::definition::{DEFAULT_SCALE_MAX, ScaleDefinition};

/// Remark attached to scales whose reverse offsets were copied from another
/// scale and never checked against the questionnaire.
pub const MIRRORED_OFFSETS_NOTE: &str =
    "reverse offsets mirror the 'past' scale; not yet verified against the questionnaire";

/// Read-only, versioned set of scale definitions.
///
/// Declaration order is the output column order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RegistrySpec")]
pub struct ScaleRegistry {
    version: String,
    scales: Vec<ScaleDefinition>,
}

impl ScaleRegistry {
    pub fn new(
        version: impl Into<String>,
        scales: Vec<ScaleDefinition>,
    ) -> Result<Self, DomainError> {
        let mut names = HashSet::with_capacity(scales.len());
        for scale in &scales {
            if !names.insert(scale.name()) {
                return Err(DomainError::InvalidRegistry(format!(
                    "scale '{}' is declared more than once",
                    scale.name()
                )));
            }
        }
        Ok(Self {
            version: version.into(),
            scales,
        })
    }

    /// Stepfamily questionnaire layout (0-based positions of the raw export).
    pub fn stepfamily() -> Result<Self, DomainError> {
        let relationship_step = [2, 4, 6, 8, 9, 10, 11, 14, 17, 18, 21, 24, 26];
        let relationship_bio = [0, 3, 5, 6, 8, 9, 14, 15];

        let scales = vec![
            ScaleDefinition::new(
                "rel_stepparent_past",
                (24..52).collect(),
                relationship_step,
                DEFAULT_SCALE_MAX,
            )?,
            // Current-period offsets are a copy of the past-period ones.
            ScaleDefinition::new(
                "rel_stepparent_current",
                (52..80).collect(),
                relationship_step,
                DEFAULT_SCALE_MAX,
            )?
            .with_note(MIRRORED_OFFSETS_NOTE),
            ScaleDefinition::new(
                "rel_bioparent_past",
                (136..152).collect(),
                relationship_bio,
                DEFAULT_SCALE_MAX,
            )?,
            ScaleDefinition::new(
                "rel_bioparent_current",
                (152..168).collect(),
                relationship_bio,
                DEFAULT_SCALE_MAX,
            )?
            .with_note(MIRRORED_OFFSETS_NOTE),
            ScaleDefinition::new(
                "mental_self_esteem",
                (215..225).collect(),
                [1, 4, 5, 7, 8],
                DEFAULT_SCALE_MAX,
            )?,
            ScaleDefinition::new("mental_anxiety", (261..268).collect(), [], DEFAULT_SCALE_MAX)?,
            ScaleDefinition::new(
                "mental_depression",
                (268..277).collect(),
                [],
                DEFAULT_SCALE_MAX,
            )?,
        ];

        Self::new("1", scales)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, name: &str) -> Result<&ScaleDefinition, DomainError> {
        self.scales
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| DomainError::UnknownScale(name.to_string()))
    }

    pub fn all_scales(&self) -> &[ScaleDefinition] {
        &self.scales
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scales.iter().map(ScaleDefinition::name)
    }

    /// Every item column referenced by at least one scale, sorted, once each.
    pub fn referenced_positions(&self) -> BTreeSet<usize> {
        self.scales
            .iter()
            .flat_map(|s| s.item_positions().iter().copied())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RegistrySpec {
    #[serde(default = "default_version")]
    version: String,
    scales: Vec<ScaleDefinition>,
}

fn default_version() -> String {
    "1".to_string()
}

impl TryFrom<RegistrySpec> for ScaleRegistry {
    type Error = DomainError;

    fn try_from(spec: RegistrySpec) -> Result<Self, Self::Error> {
        ScaleRegistry::new(spec.version, spec.scales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_stepfamily_registry_order() -> Result<()> {
        let registry = ScaleRegistry::stepfamily()?;
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "rel_stepparent_past",
                "rel_stepparent_current",
                "rel_bioparent_past",
                "rel_bioparent_current",
                "mental_self_esteem",
                "mental_anxiety",
                "mental_depression",
            ]
        );
        assert_eq!(registry.version(), "1");
        Ok(())
    }

    #[test]
    fn test_current_scales_mirror_past_offsets() -> Result<()> {
        let registry = ScaleRegistry::stepfamily()?;
        let past = registry.get("rel_stepparent_past")?;
        let current = registry.get("rel_stepparent_current")?;
        assert_eq!(past.reverse_item_offsets(), current.reverse_item_offsets());
        assert_eq!(current.note(), Some(MIRRORED_OFFSETS_NOTE));
        assert_eq!(past.note(), None);

        let bio_past = registry.get("rel_bioparent_past")?;
        let bio_current = registry.get("rel_bioparent_current")?;
        assert_eq!(
            bio_past.reverse_item_offsets(),
            bio_current.reverse_item_offsets()
        );
        Ok(())
    }

    #[test]
    fn test_builtin_positions() -> Result<()> {
        let registry = ScaleRegistry::stepfamily()?;
        assert_eq!(registry.get("rel_stepparent_past")?.len(), 28);
        assert_eq!(registry.get("rel_bioparent_current")?.len(), 16);
        assert_eq!(registry.get("mental_depression")?.max_position(), 276);
        assert!(registry.get("mental_anxiety")?.reverse_item_offsets().is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_scale() -> Result<()> {
        let registry = ScaleRegistry::stepfamily()?;
        let res = registry.get("mental_self_blame");
        assert_eq!(
            res.err(),
            Some(DomainError::UnknownScale("mental_self_blame".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_names_rejected() -> Result<()> {
        let a = ScaleDefinition::new("same", vec![0], [], 5)?;
        let b = ScaleDefinition::new("same", vec![1], [], 5)?;
        let res = ScaleRegistry::new("1", vec![a, b]);
        assert!(matches!(res, Err(DomainError::InvalidRegistry(_))));
        Ok(())
    }

    #[test]
    fn test_referenced_positions_deduplicated() -> Result<()> {
        let a = ScaleDefinition::new("a", vec![3, 1], [], 5)?;
        let b = ScaleDefinition::new("b", vec![1, 2], [], 5)?;
        let registry = ScaleRegistry::new("test", vec![a, b])?;
        let positions: Vec<usize> = registry.referenced_positions().into_iter().collect();
        assert_eq!(positions, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_registry_from_yaml() -> Result<()> {
        let yaml = r#"
version: "2024-09"
scales:
  - name: short_form
    items: { start: 2, end: 5 }
    reverse-offsets: [0]
  - name: single
    items: [9]
"#;
        let registry: ScaleRegistry = serde_yaml::from_str(yaml)?;
        assert_eq!(registry.version(), "2024-09");
        assert_eq!(registry.get("short_form")?.item_positions(), &[2, 3, 4]);
        assert_eq!(registry.all_scales().len(), 2);
        Ok(())
    }
}
