use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// A throwaway copy of a fixture project.
struct StepscoreTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl StepscoreTestEnv {
    fn new(fixture: &str) -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let project_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(fixture);

        let dest = tmp.path().join(fixture);
        Self::copy_dir(&project_root, &dest)?;

        Ok(Self {
            _tmp: tmp,
            root: dest,
        })
    }

    fn copy_dir(src: &PathBuf, dst: &PathBuf) -> std::io::Result<()> {
        let mut options = fs_extra::dir::CopyOptions::new();
        options.content_only = true;

        std::fs::create_dir_all(dst)?;
        fs_extra::dir::copy(src, dst, &options)
            .map(|_| ())
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    fn stepscore(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stepscore"));
        cmd.env("STEPSCORE_PROJECT_DIR", &self.root)
            .env_remove("STEPSCORE_INPUT_PATH")
            .env_remove("STEPSCORE_OUTPUT_DIR")
            .env_remove("RUST_LOG");
        cmd
    }

    fn read(&self, rel: &str) -> Result<String> {
        std::fs::read_to_string(self.root.join(rel)).with_context(|| format!("{} not written", rel))
    }
}

#[test]
fn test_scores_fixture_project() -> Result<()> {
    let env = StepscoreTestEnv::new("mini_survey")?;

    env.stepscore()
        .assert()
        .success()
        .stdout(predicate::str::contains("mini_survey"))
        .stdout(predicate::str::contains("SUCCESS"));

    let output = env.read("output/processed_data.csv")?;
    insta::assert_snapshot!(output.trim_end(), @r"
    demo_age,demo_cohab_duration,mental_self_esteem,mental_anxiety
    18.00,2.00,4.00,4.00
    45.00,15.00,2.50,1.33
    ,0.50,,2.00
    ");

    let report = env.read("output/run_results.json")?;
    assert!(report.contains("\"registry_version\": \"mini-1\""));
    assert!(report.contains("\"rows_processed\": 3"));
    assert!(report.contains("\"unparsable_item_cells\": 1"));
    assert!(report.contains("\"invalid_scores\": 1"));
    assert!(report.contains("\"generated_at\""));
    Ok(())
}

#[test]
fn test_run_is_traced() -> Result<()> {
    let env = StepscoreTestEnv::new("mini_survey")?;

    env.stepscore()
        .env("RUST_LOG", "info")
        .assert()
        .success()
        .stderr(predicate::str::contains("Starting scoring run"))
        .stderr(predicate::str::contains("Scoring run finished"));
    Ok(())
}

#[test]
fn test_output_dir_override() -> Result<()> {
    let env = StepscoreTestEnv::new("mini_survey")?;

    env.stepscore()
        .env("STEPSCORE_OUTPUT_DIR", "build")
        .assert()
        .success();

    assert!(env.root.join("build/processed_data.csv").exists());
    assert!(env.root.join("build/run_results.json").exists());
    assert!(!env.root.join("output").exists());
    Ok(())
}

#[test]
fn test_column_drift_aborts() -> Result<()> {
    let env = StepscoreTestEnv::new("mini_survey")?;
    std::fs::write(
        env.root.join("data/responses.csv"),
        "序号,年龄,同住时长,SE1,SE2,SE3\n1,18,1-3年,3,4,5\n",
    )?;

    env.stepscore()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("stepscore::domain::missing_column"))
        .stderr(predicate::str::contains("mental_self_esteem"));

    assert!(!env.root.join("output/processed_data.csv").exists());
    Ok(())
}

#[test]
fn test_missing_project_file() -> Result<()> {
    let env = StepscoreTestEnv::new("mini_survey")?;
    std::fs::remove_file(env.root.join("stepscore.yaml"))?;

    env.stepscore()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("stepscore::infra::config_missing"));
    Ok(())
}

#[test]
fn test_unsupported_input_format() -> Result<()> {
    let env = StepscoreTestEnv::new("mini_survey")?;

    env.stepscore()
        .env("STEPSCORE_INPUT_PATH", "data/responses.sav")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stepscore::infra::format"));
    Ok(())
}
