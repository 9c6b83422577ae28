// stepscore-core/src/infrastructure/config/project.rs

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::application::orchestrator::ScoringPipeline;
use crate::domain::error::DomainError;
use crate::domain::scale::ScaleRegistry;
use crate::domain::scoring::demographic::{DEFAULT_GREATER_MARKERS, DEFAULT_LESS_MARKERS};
use crate::domain::scoring::{DemographicFieldSpec, DemographicParser, LikertMapping};
use crate::infrastructure::error::InfrastructureError;

pub const INPUT_PATH_ENV: &str = "STEPSCORE_INPUT_PATH";
pub const OUTPUT_DIR_ENV: &str = "STEPSCORE_OUTPUT_DIR";

/// Contents of `stepscore.yaml`, hydrated with the satellite fragments.
#[derive(Debug, Deserialize, Clone, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct StepscoreConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,

    #[validate(nested)]
    pub input: InputConfig,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_output_file")]
    #[validate(length(min = 1, message = "Output file name cannot be empty"))]
    pub output_file: String,
    #[serde(default = "default_report_file")]
    #[validate(length(min = 1, message = "Report file name cannot be empty"))]
    pub report_file: String,

    #[serde(default = "default_true")]
    pub utf8_bom: bool,
    #[validate(range(max = 17, message = "float-precision above 17 digits is meaningless"))]
    pub float_precision: Option<usize>,

    #[serde(default)]
    pub config_paths: Vec<String>,

    #[serde(default = "DemographicFieldSpec::stepfamily_defaults")]
    pub demographics: Vec<DemographicFieldSpec>,

    #[serde(default)]
    pub markers: MarkerConfig,

    /// From `scales.yml`; the built-in stepfamily registry when absent.
    #[serde(skip)]
    pub scales: Option<ScaleRegistry>,
    /// From `likert.yml`; the built-in five-point mapping when absent.
    #[serde(skip)]
    pub likert: Option<LikertMapping>,
}

#[derive(Debug, Deserialize, Clone, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct InputConfig {
    #[validate(length(min = 1, message = "Input path cannot be empty"))]
    pub path: String,
    #[serde(default = "default_true")]
    pub has_header: bool,
    /// Single ASCII character. Defaults to tab for `.tsv`, comma otherwise.
    #[validate(length(equal = 1, message = "Delimiter must be a single character"))]
    pub delimiter: Option<String>,
    /// Worksheet name for spreadsheet inputs; first sheet when absent.
    pub sheet: Option<String>,
    /// Strip surrounding whitespace from delimited-text fields.
    #[serde(default = "default_true")]
    pub trim: bool,
}

impl InputConfig {
    pub fn delimiter_for(&self, extension: &str) -> Result<u8, InfrastructureError> {
        match &self.delimiter {
            Some(d) => match d.as_bytes() {
                [b] if b.is_ascii() => Ok(*b),
                _ => Err(InfrastructureError::ConfigError(format!(
                    "Delimiter {:?} is not a single ASCII character",
                    d
                ))),
            },
            None if extension.eq_ignore_ascii_case("tsv") => Ok(b'\t'),
            None => Ok(b','),
        }
    }
}

/// Comparative markers recognised by the demographic parser.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MarkerConfig {
    #[serde(default = "default_greater")]
    pub greater: Vec<String>,
    #[serde(default = "default_less")]
    pub less: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            greater: default_greater(),
            less: default_less(),
        }
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}
fn default_output_dir() -> String {
    "output".to_string()
}
fn default_output_file() -> String {
    "processed_data.csv".to_string()
}
fn default_report_file() -> String {
    "run_results.json".to_string()
}
fn default_true() -> bool {
    true
}
fn default_greater() -> Vec<String> {
    DEFAULT_GREATER_MARKERS.iter().map(|m| m.to_string()).collect()
}
fn default_less() -> Vec<String> {
    DEFAULT_LESS_MARKERS.iter().map(|m| m.to_string()).collect()
}

impl StepscoreConfig {
    pub fn input_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.input.path)
    }

    pub fn output_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.output_dir).join(&self.output_file)
    }

    pub fn report_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.output_dir).join(&self.report_file)
    }

    /// Assembles the scoring pipeline, falling back to the built-in registry
    /// and mapping where no satellite file overrides them.
    pub fn build_pipeline(&self) -> Result<ScoringPipeline, DomainError> {
        let registry = match &self.scales {
            Some(registry) => registry.clone(),
            None => ScaleRegistry::stepfamily()?,
        };
        let mapping = self.likert.clone().unwrap_or_default();
        let parser = DemographicParser::with_markers(&self.markers.greater, &self.markers.less)?;
        ScoringPipeline::new(registry, mapping, parser, self.demographics.clone())
    }
}

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<StepscoreConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project manifest");

    let mut config: StepscoreConfig = load_fragment(&config_path)?;
    config.validate()?;

    if let Some(config_folder) = config.config_paths.first() {
        let config_dir = project_dir.join(config_folder);
        if config_dir.exists() {
            load_satellite_configs(&mut config, &config_dir)?;
        }
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["stepscore.yaml", "stepscore.yml"];
    for filename in candidates {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, candidates
    )))
}

/// Loads one typed YAML document.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML at {:?}", path))
        .map_err(Into::into)
}

fn load_satellite_configs(
    config: &mut StepscoreConfig,
    config_dir: &Path,
) -> Result<(), InfrastructureError> {
    // A. Scale registry
    let scales_path = config_dir.join("scales.yml");
    if scales_path.exists() {
        let registry: ScaleRegistry = load_fragment(&scales_path)?;
        info!(
            version = registry.version(),
            scales = registry.all_scales().len(),
            "  📐 Scale registry loaded"
        );
        config.scales = Some(registry);
    }

    // B. Likert labels
    let likert_path = config_dir.join("likert.yml");
    if likert_path.exists() {
        #[derive(Deserialize)]
        struct LikertWrapper {
            levels: LikertMapping,
        }

        let wrapper: LikertWrapper = load_fragment(&likert_path)?;
        info!(levels = wrapper.levels.levels().len(), "  🏷️  Likert mapping loaded");
        config.likert = Some(wrapper.levels);
    }

    Ok(())
}

fn apply_env_overrides(config: &mut StepscoreConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides<F>(config: &mut StepscoreConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(INPUT_PATH_ENV) {
        info!(old = ?config.input.path, new = ?val, "Overriding input path via ENV");
        config.input.path = val;
    }
    if let Some(val) = lookup(OUTPUT_DIR_ENV) {
        info!(old = ?config.output_dir, new = ?val, "Overriding output dir via ENV");
        config.output_dir = val;
    }
}
