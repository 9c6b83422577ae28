// stepscore-core/src/application/orchestrator.rs

use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use crate::application::report::{FieldSummary, RunReport, ScaleSummary};
use crate::domain::error::DomainError;
use crate::domain::scale::ScaleRegistry;
use crate::domain::scoring::{
    DemographicFieldSpec, DemographicParser, LikertMapping, aggregate, correct_cell,
};
use crate::domain::table::{NormalizedCell, OutputTable, RawCell, RawTable};

/// Scored table plus the counters collected while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub table: OutputTable,
    pub report: RunReport,
}

/// Raw survey export → composite score table.
///
/// Per respondent: normalize every referenced item column once, reverse-code
/// each scale's flagged items on a per-scale copy, average, parse the
/// demographic columns, then emit demographics followed by scales in
/// registry order.
#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    registry: ScaleRegistry,
    mapping: LikertMapping,
    parser: DemographicParser,
    demographics: Vec<DemographicFieldSpec>,
}

impl ScoringPipeline {
    pub fn new(
        registry: ScaleRegistry,
        mapping: LikertMapping,
        parser: DemographicParser,
        demographics: Vec<DemographicFieldSpec>,
    ) -> Result<Self, DomainError> {
        let mut names = HashSet::new();
        for field in &demographics {
            if field.name.trim().is_empty() {
                return Err(DomainError::InvalidRegistry(format!(
                    "demographic field at column {} has no name",
                    field.position
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(DomainError::InvalidRegistry(format!(
                    "demographic field '{}' is declared more than once",
                    field.name
                )));
            }
        }
        for scale in registry.names() {
            if !names.insert(scale) {
                return Err(DomainError::InvalidRegistry(format!(
                    "output column '{}' is both a demographic field and a scale",
                    scale
                )));
            }
        }
        for scale in registry.all_scales() {
            if scale.scale_max() != mapping.max_code() {
                return Err(DomainError::InvalidMapping(format!(
                    "scale '{}' expects responses 1..={} but the Likert mapping has {} levels",
                    scale.name(),
                    scale.scale_max(),
                    mapping.max_code()
                )));
            }
        }

        Ok(Self {
            registry,
            mapping,
            parser,
            demographics,
        })
    }

    /// Built-in stepfamily registry, five-point mapping, default demographics.
    pub fn stepfamily() -> Result<Self, DomainError> {
        Self::new(
            ScaleRegistry::stepfamily()?,
            LikertMapping::five_point(),
            DemographicParser::standard()?,
            DemographicFieldSpec::stepfamily_defaults(),
        )
    }

    pub fn registry(&self) -> &ScaleRegistry {
        &self.registry
    }

    pub fn demographics(&self) -> &[DemographicFieldSpec] {
        &self.demographics
    }

    /// Output header: demographic names, then scale names.
    pub fn output_columns(&self) -> Vec<String> {
        self.demographics
            .iter()
            .map(|f| f.name.clone())
            .chain(self.registry.names().map(str::to_string))
            .collect()
    }

    #[instrument(skip_all, fields(rows = raw.len(), registry = self.registry.version()))]
    pub fn run(&self, raw: &RawTable) -> Result<PipelineOutput, DomainError> {
        self.announce(raw);
        self.check_widths(raw)?;

        let positions = self.registry.referenced_positions();
        let cache_len = positions.iter().next_back().map_or(0, |p| p + 1);

        let mut table = OutputTable::new(self.output_columns());
        let mut report = self.empty_report();

        for (row_idx, row) in raw.rows().iter().enumerate() {
            // (a) normalize each referenced column once
            let mut normalized = vec![NormalizedCell::Missing; cache_len];
            for &pos in &positions {
                let cell = self.mapping.normalize(&row[pos]);
                if cell.is_missing() && !matches!(row[pos], RawCell::Empty) {
                    report.unparsable_item_cells += 1;
                    debug!(row = row_idx, column = pos, raw = ?row[pos], "Unparsable item response");
                }
                normalized[pos] = cell;
            }

            let mut out_row = Vec::with_capacity(table.columns().len());

            // (d) demographics
            for (field, summary) in self.demographics.iter().zip(report.demographics.iter_mut()) {
                let cell = self.parser.parse(&row[field.position]);
                if cell.is_missing() {
                    summary.missing += 1;
                }
                out_row.push(cell);
            }

            // (b) reverse-code, (c) aggregate
            for (scale, summary) in self
                .registry
                .all_scales()
                .iter()
                .zip(report.scales.iter_mut())
            {
                let mut items: Vec<NormalizedCell> = scale
                    .item_positions()
                    .iter()
                    .map(|&p| normalized[p])
                    .collect();

                for &offset in scale.reverse_item_offsets() {
                    let (cell, err) = correct_cell(items[offset], scale.scale_max());
                    if let Some(e) = err {
                        let position = scale.item_positions()[offset];
                        warn!(
                            row = row_idx,
                            scale = scale.name(),
                            column = position,
                            header = raw.header(position).unwrap_or("-"),
                            "{}; treated as missing",
                            e
                        );
                        summary.invalid_scores += 1;
                        report.invalid_scores += 1;
                    }
                    items[offset] = cell;
                }

                let composite = aggregate(&items);
                if composite.is_missing() {
                    summary.missing_composites += 1;
                }
                out_row.push(composite);
            }

            table.push_row(out_row);
        }

        report.rows_processed = table.len();
        info!(
            rows = report.rows_processed,
            unparsable = report.unparsable_item_cells,
            invalid_scores = report.invalid_scores,
            "Scoring complete"
        );

        Ok(PipelineOutput { table, report })
    }

    fn announce(&self, raw: &RawTable) {
        info!(
            version = self.registry.version(),
            scales = self.registry.all_scales().len(),
            "Using scale registry"
        );
        for scale in self.registry.all_scales() {
            if let Some(note) = scale.note() {
                warn!(scale = scale.name(), "Unverified registry entry: {}", note);
            }
            for &offset in scale.reverse_item_offsets() {
                let position = scale.item_positions()[offset];
                debug!(
                    scale = scale.name(),
                    column = position,
                    header = raw.header(position).unwrap_or("-"),
                    "Reverse-coded item"
                );
            }
        }
    }

    /// Aborts on the first row too narrow for a declared position.
    fn check_widths(&self, raw: &RawTable) -> Result<(), DomainError> {
        let mut required: Vec<(usize, &str)> = self
            .registry
            .all_scales()
            .iter()
            .flat_map(|s| s.item_positions().iter().map(move |&p| (p, s.name())))
            .chain(self.demographics.iter().map(|f| (f.position, f.name.as_str())))
            .collect();
        required.sort_unstable();

        let Some(&(widest, _)) = required.last() else {
            return Ok(());
        };

        for (row_idx, row) in raw.rows().iter().enumerate() {
            let width = row.len();
            if width > widest {
                continue;
            }
            if let Some(&(position, owner)) = required.iter().find(|(p, _)| *p >= width) {
                return Err(DomainError::MissingColumn {
                    row: row_idx,
                    position,
                    width,
                    owner: owner.to_string(),
                });
            }
        }
        Ok(())
    }

    fn empty_report(&self) -> RunReport {
        RunReport {
            registry_version: self.registry.version().to_string(),
            scales: self
                .registry
                .all_scales()
                .iter()
                .map(|s| ScaleSummary {
                    name: s.name().to_string(),
                    items: s.len(),
                    reverse_items: s.reverse_item_offsets().len(),
                    ..Default::default()
                })
                .collect(),
            demographics: self
                .demographics
                .iter()
                .map(|f| FieldSummary {
                    name: f.name.clone(),
                    position: f.position,
                    missing: 0,
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::scale::ScaleDefinition;
    use anyhow::Result;
    use NormalizedCell::{Missing, Value};

    fn text_row(cells: &[&str]) -> Vec<RawCell> {
        cells.iter().map(|c| RawCell::from_text(c)).collect()
    }

    /// Columns: 0 = age, 1..=4 = scale "mood" (offset 1 reversed), 5 = cohab duration.
    fn small_pipeline() -> Result<ScoringPipeline> {
        let mood = ScaleDefinition::new("mood", vec![1, 2, 3, 4], [1], 5)?;
        let registry = ScaleRegistry::new("test", vec![mood])?;
        Ok(ScoringPipeline::new(
            registry,
            LikertMapping::five_point(),
            DemographicParser::standard()?,
            vec![
                DemographicFieldSpec::new("demo_age", 0),
                DemographicFieldSpec::new("demo_cohab_duration", 5),
            ],
        )?)
    }

    #[test]
    fn test_small_table_end_to_end() -> Result<()> {
        let pipeline = small_pipeline()?;
        let raw = RawTable::new(
            None,
            vec![
                text_row(&["18", "通常如此", "很少如此", "5", "", "1-3年"]),
                text_row(&["大于20岁", "", "", "", "", "abc"]),
            ],
        );

        let out = pipeline.run(&raw)?;
        assert_eq!(
            out.table.columns(),
            &["demo_age", "demo_cohab_duration", "mood"]
        );

        // items: 4, reverse(2)=4, 5, missing -> mean 13/3
        assert_eq!(out.table.get(0, "demo_age"), Some(Value(18.0)));
        assert_eq!(out.table.get(0, "demo_cohab_duration"), Some(Value(2.0)));
        assert_eq!(out.table.get(0, "mood"), Some(Value(13.0 / 3.0)));

        assert_eq!(out.table.get(1, "demo_age"), Some(Value(25.0)));
        assert_eq!(out.table.get(1, "demo_cohab_duration"), Some(Missing));
        assert_eq!(out.table.get(1, "mood"), Some(Missing));

        assert_eq!(out.report.rows_processed, 2);
        assert_eq!(out.report.scale("mood").unwrap().missing_composites, 1);
        assert_eq!(out.report.field("demo_cohab_duration").unwrap().missing, 1);
        Ok(())
    }

    #[test]
    fn test_self_esteem_single_reverse_item() -> Result<()> {
        let n = 4;
        let scale = ScaleDefinition::new("mental_self_esteem", (0..n).collect(), [2], 5)?;
        let pipeline = ScoringPipeline::new(
            ScaleRegistry::new("test", vec![scale])?,
            LikertMapping::five_point(),
            DemographicParser::standard()?,
            vec![],
        )?;
        let raw = RawTable::new(None, vec![vec![RawCell::from_text("有时如此"); n]]);

        let out = pipeline.run(&raw)?;
        let expected = (3.0 * (n as f64 - 1.0) + (6.0 - 3.0)) / n as f64;
        assert_eq!(out.table.get(0, "mental_self_esteem"), Some(Value(expected)));
        Ok(())
    }

    #[test]
    fn test_reverse_item_with_asymmetric_answers() -> Result<()> {
        let scale = ScaleDefinition::new("s", vec![0, 1], [0], 5)?;
        let pipeline = ScoringPipeline::new(
            ScaleRegistry::new("test", vec![scale])?,
            LikertMapping::five_point(),
            DemographicParser::standard()?,
            vec![],
        )?;
        let raw = RawTable::new(None, vec![text_row(&["几乎从不或从不", "几乎从不或从不"])]);
        // 1 reversed -> 5, plus 1 -> mean 3
        assert_eq!(pipeline.run(&raw)?.table.get(0, "s"), Some(Value(3.0)));
        Ok(())
    }

    #[test]
    fn test_shared_column_corrected_per_scale() -> Result<()> {
        // Column 0 is reversed in "a" but not in "b".
        let a = ScaleDefinition::new("a", vec![0], [0], 5)?;
        let b = ScaleDefinition::new("b", vec![0, 1], [], 5)?;
        let pipeline = ScoringPipeline::new(
            ScaleRegistry::new("test", vec![a, b])?,
            LikertMapping::five_point(),
            DemographicParser::standard()?,
            vec![],
        )?;
        let raw = RawTable::new(None, vec![vec![RawCell::Number(2.0), RawCell::Number(4.0)]]);

        let out = pipeline.run(&raw)?;
        assert_eq!(out.table.get(0, "a"), Some(Value(4.0)));
        assert_eq!(out.table.get(0, "b"), Some(Value(3.0)));
        Ok(())
    }

    #[test]
    fn test_out_of_range_reverse_item_becomes_missing() -> Result<()> {
        let scale = ScaleDefinition::new("s", vec![0, 1], [0], 5)?;
        let pipeline = ScoringPipeline::new(
            ScaleRegistry::new("test", vec![scale])?,
            LikertMapping::five_point(),
            DemographicParser::standard()?,
            vec![],
        )?;
        let raw = RawTable::new(None, vec![text_row(&["7", "2"])]);

        let out = pipeline.run(&raw)?;
        assert_eq!(out.table.get(0, "s"), Some(Value(2.0)));
        assert_eq!(out.report.invalid_scores, 1);
        assert_eq!(out.report.scale("s").unwrap().invalid_scores, 1);
        Ok(())
    }

    #[test]
    fn test_unparsable_cells_are_counted_not_fatal() -> Result<()> {
        let pipeline = small_pipeline()?;
        let raw = RawTable::new(
            None,
            vec![text_row(&["18", "不清楚", "3", "3", "3", "2"])],
        );
        let out = pipeline.run(&raw)?;
        assert_eq!(out.report.unparsable_item_cells, 1);
        // 3 reversed -> 3; items 3,3,3 -> 3
        assert_eq!(out.table.get(0, "mood"), Some(Value(3.0)));
        Ok(())
    }

    #[test]
    fn test_missing_column_aborts() -> Result<()> {
        let pipeline = small_pipeline()?;
        let raw = RawTable::new(
            None,
            vec![
                text_row(&["18", "3", "3", "3", "3", "2"]),
                text_row(&["18", "3", "3", "3", "3"]),
            ],
        );

        let err = pipeline.run(&raw).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingColumn {
                row: 1,
                position: 5,
                width: 5,
                owner: "demo_cohab_duration".to_string(),
            }
        );
        Ok(())
    }

    #[test]
    fn test_missing_column_reports_first_drifted_scale() -> Result<()> {
        let pipeline = small_pipeline()?;
        let raw = RawTable::new(None, vec![text_row(&["18", "3", "3"])]);
        let err = pipeline.run(&raw).unwrap_err();
        assert!(matches!(
            err,
            DomainError::MissingColumn { position: 3, ref owner, .. } if owner == "mood"
        ));
        Ok(())
    }

    #[test]
    fn test_duplicate_output_columns_rejected() -> Result<()> {
        let scale = ScaleDefinition::new("demo_age", vec![1], [], 5)?;
        let res = ScoringPipeline::new(
            ScaleRegistry::new("test", vec![scale])?,
            LikertMapping::five_point(),
            DemographicParser::standard()?,
            vec![DemographicFieldSpec::new("demo_age", 0)],
        );
        assert!(matches!(res, Err(DomainError::InvalidRegistry(_))));
        Ok(())
    }

    #[test]
    fn test_mapping_range_must_match_scale_max() -> Result<()> {
        let seven_point = LikertMapping::from_labels([
            "从不", "极少", "很少如此", "有时如此", "通常如此", "经常", "总是",
        ])?;
        let res = ScoringPipeline::new(
            ScaleRegistry::stepfamily()?,
            seven_point.clone(),
            DemographicParser::standard()?,
            DemographicFieldSpec::stepfamily_defaults(),
        );
        assert!(matches!(res, Err(DomainError::InvalidMapping(_))));

        let scale = ScaleDefinition::new("s", vec![0, 1], [0], 7)?;
        let pipeline = ScoringPipeline::new(
            ScaleRegistry::new("test", vec![scale])?,
            seven_point,
            DemographicParser::standard()?,
            vec![],
        )?;
        let raw = RawTable::new(None, vec![vec!["经常".into(), "总是".into()]]);
        // 6 reversed on a 7-point scale is 2; mean with 7.
        assert_eq!(pipeline.run(&raw)?.table.get(0, "s"), Some(Value(4.5)));
        Ok(())
    }

    #[test]
    fn test_stepfamily_layout_on_wide_row() -> Result<()> {
        let pipeline = ScoringPipeline::stepfamily()?;
        let mut row = vec![RawCell::from_text("有时如此"); 277];
        row[10] = RawCell::from_text("18");
        row[13] = RawCell::from_text("1-3年");
        row[15] = RawCell::from_text("小于1年");
        let raw = RawTable::new(None, vec![row]);

        let out = pipeline.run(&raw)?;
        assert_eq!(out.table.columns().len(), 10);
        assert_eq!(out.table.get(0, "demo_age"), Some(Value(18.0)));
        assert_eq!(out.table.get(0, "demo_cohab_duration"), Some(Value(2.0)));
        assert_eq!(out.table.get(0, "demo_start_age_cohab"), Some(Value(0.5)));
        for scale in pipeline.registry().names() {
            assert_eq!(out.table.get(0, scale), Some(Value(3.0)), "scale {}", scale);
        }

        let narrow = RawTable::new(None, vec![vec![RawCell::Empty; 276]]);
        let err = pipeline.run(&narrow).unwrap_err();
        assert!(matches!(
            err,
            DomainError::MissingColumn { position: 276, ref owner, .. } if owner == "mental_depression"
        ));
        Ok(())
    }

    #[test]
    fn test_empty_table() -> Result<()> {
        let out = small_pipeline()?.run(&RawTable::default())?;
        assert!(out.table.is_empty());
        assert_eq!(out.report.rows_processed, 0);
        Ok(())
    }
}
