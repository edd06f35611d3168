//! JSON configuration for the command-line tool.
use crate::error::ConfigLoadError;
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Both,
}

impl OutputFormat {
    pub fn includes_text(self) -> bool {
        matches!(self, OutputFormat::Text | OutputFormat::Both)
    }

    pub fn includes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where to write the JSON report; stdout when absent.
    pub json_out: Option<PathBuf>,
    /// Directory receiving channel PNGs and the detailed report.
    pub debug_dir: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RuntimeConfig {
    pub input_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, ConfigLoadError> {
    read_json(path)
}

/// Load a bare [`PipelineConfig`] such as `configs/he_default.json`.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig, ConfigLoadError> {
    read_json(path)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `<program> <config.json>` from the process arguments.
pub fn parse_cli<I>(program: &str, mut args: I) -> Result<RuntimeConfig, String>
where
    I: Iterator<Item = String>,
{
    let usage = format!("Usage: {program} <config.json>");
    let path = args.next().ok_or_else(|| usage.clone())?;
    if path == "-h" || path == "--help" {
        return Err(usage);
    }
    if args.next().is_some() {
        return Err(usage);
    }
    load_config(Path::new(&path)).map_err(|e| e.to_string())
}
