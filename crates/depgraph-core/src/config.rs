use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "depgraph.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub timing: bool,
}

/// Configuration after applying environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub data_dir: PathBuf,
    /// One of `pretty`, `text`, `json`, or `None` to let the caller decide.
    pub format: Option<String>,
    pub timing: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Load `depgraph.toml` from `project_root`, or defaults if it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective configuration for `project_root`.
///
/// Environment variables override the file: `DEPGRAPH_DATA_DIR`,
/// `FORMAT` and `DEPGRAPH_TIMING`. CLI flags are applied by the caller on
/// top of the result.
///
/// # Errors
///
/// Returns an error if the config file is invalid or a format value is not
/// one of `pretty`, `text`, `json`.
pub fn resolve_config(project_root: &Path) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    resolve_with_env(
        project,
        env::var_os("DEPGRAPH_DATA_DIR").map(PathBuf::from),
        env::var("FORMAT").ok(),
        env::var("DEPGRAPH_TIMING").ok(),
    )
}

fn resolve_with_env(
    project: ProjectConfig,
    env_data_dir: Option<PathBuf>,
    env_format: Option<String>,
    env_timing: Option<String>,
) -> Result<EffectiveConfig> {
    let format = match env_format.or(project.output.format) {
        Some(raw) => Some(
            normalize_output_mode(&raw)
                .map(str::to_string)
                .with_context(|| format!("unknown output format '{raw}' (expected pretty, text or json)"))?,
        ),
        None => None,
    };

    let timing = env_timing.map_or(project.output.timing, |value| is_truthy(&value));

    Ok(EffectiveConfig {
        data_dir: env_data_dir.unwrap_or(project.analysis.data_dir),
        format,
        timing,
    })
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("1")
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}
