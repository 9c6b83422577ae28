pub mod project;

pub use project::{InputConfig, MarkerConfig, StepscoreConfig, load_project_config};
