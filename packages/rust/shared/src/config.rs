//! Application configuration for linkprompt.
//!
//! Every file the pipeline touches lives next to the link file. An optional
//! `linkprompt.toml` in the same directory overrides the built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LinkPromptError, Result};

/// Optional configuration file name, looked up next to the link file.
pub const CONFIG_FILE_NAME: &str = "linkprompt.toml";

/// Link file used when no path is given on the command line.
const DEFAULT_LINK_FILE: &str = "links.txt";
const PROMPT_FILE_NAME: &str = "prompts.txt";
const PROGRESS_FILE_NAME: &str = "progress.txt";
const RESULT_FILE_NAME: &str = "result.txt";

// ---------------------------------------------------------------------------
// Config structs (matching linkprompt.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline loop settings.
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Page fetch settings.
    #[serde(default)]
    pub fetch: FetchSettings,

    /// Inference backend settings.
    #[serde(default)]
    pub inference: InferenceSettings,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Model identifier handed to the inference backend.
    #[serde(default = "default_model")]
    pub model: String,

    /// Seconds to sleep when there is nothing to do.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_model() -> String {
    "deepseek-r1:7b".into()
}
fn default_interval_secs() -> u64 {
    900
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Whole-request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Keep each fetched body as `page_<n>.html` next to its snapshot.
    #[serde(default)]
    pub save_raw: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            save_raw: false,
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    10
}
fn default_user_agent() -> String {
    concat!("linkprompt/", env!("CARGO_PKG_VERSION")).into()
}

/// Which inference adapter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceBackend {
    /// Pipe the prompt into `ollama run <model>`.
    #[default]
    Cli,
    /// Call a running Ollama server over HTTP.
    Http,
}

/// `[inference]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSettings {
    /// Adapter selection.
    #[serde(default)]
    pub backend: InferenceBackend,

    /// Executable used by the CLI backend.
    #[serde(default = "default_command")]
    pub command: String,

    /// Base URL used by the HTTP backend.
    #[serde(default = "default_host")]
    pub host: String,

    /// Request timeout for the HTTP backend, in seconds.
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::default(),
            command: default_command(),
            host: default_host(),
            timeout_secs: default_inference_timeout(),
        }
    }
}

fn default_command() -> String {
    "ollama".into()
}
fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_inference_timeout() -> u64 {
    600
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
}

// ---------------------------------------------------------------------------
// Run paths (derived from the link file)
// ---------------------------------------------------------------------------

/// Every file location used by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// Line-oriented list of URLs.
    pub link_file: PathBuf,
    /// Line-oriented list of prompts.
    pub prompt_file: PathBuf,
    /// Durable cursor.
    pub progress_file: PathBuf,
    /// Append-only result log.
    pub result_file: PathBuf,
    /// Optional TOML overrides.
    pub config_file: PathBuf,
    /// Directory holding the per-link snapshots.
    pub snapshot_dir: PathBuf,
}

impl RunPaths {
    /// Derive all paths from the link file location.
    ///
    /// `None` selects `links.txt` in the current directory.
    pub fn from_link_file(link_file: Option<&Path>) -> Self {
        let link_file = link_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LINK_FILE));

        let dir = match link_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };

        Self {
            prompt_file: dir.join(PROMPT_FILE_NAME),
            progress_file: dir.join(PROGRESS_FILE_NAME),
            result_file: dir.join(RESULT_FILE_NAME),
            config_file: dir.join(CONFIG_FILE_NAME),
            snapshot_dir: dir,
            link_file,
        }
    }

    /// Snapshot file for a zero-based link index (`link_<index+1>.json`).
    pub fn snapshot_path(&self, link_index: usize) -> PathBuf {
        self.snapshot_dir
            .join(format!("link_{}.json", link_index + 1))
    }

    /// Raw page body for a zero-based link index (`page_<index+1>.html`).
    pub fn raw_page_path(&self, link_index: usize) -> PathBuf {
        self.snapshot_dir
            .join(format!("page_{}.html", link_index + 1))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the config that belongs to a run. Returns defaults if there is none.
pub fn load_config_for(paths: &RunPaths) -> Result<AppConfig> {
    if !paths.config_file.exists() {
        tracing::debug!(path = ?paths.config_file, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&paths.config_file)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LinkPromptError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        LinkPromptError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    if config.pipeline.model.trim().is_empty() {
        return Err(LinkPromptError::config("pipeline.model must not be empty"));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.model, "deepseek-r1:7b");
        assert_eq!(config.pipeline.interval_secs, 900);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(!config.fetch.save_raw);
        assert_eq!(config.inference.backend, InferenceBackend::Cli);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
[pipeline]
model = "llama3:8b"

[fetch]
save_raw = true

[inference]
backend = "http"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.pipeline.model, "llama3:8b");
        assert_eq!(config.pipeline.interval_secs, 900);
        assert!(config.fetch.save_raw);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.inference.backend, InferenceBackend::Http);
        assert_eq!(config.inference.host, "http://localhost:11434");
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.max_redirects, 10);
        assert_eq!(parsed.inference.command, "ollama");
    }

    #[test]
    fn paths_are_siblings_of_the_link_file() {
        let paths = RunPaths::from_link_file(Some(Path::new("/srv/jobs/urls.txt")));
        assert_eq!(paths.link_file, PathBuf::from("/srv/jobs/urls.txt"));
        assert_eq!(paths.prompt_file, PathBuf::from("/srv/jobs/prompts.txt"));
        assert_eq!(paths.progress_file, PathBuf::from("/srv/jobs/progress.txt"));
        assert_eq!(paths.result_file, PathBuf::from("/srv/jobs/result.txt"));
        assert_eq!(paths.config_file, PathBuf::from("/srv/jobs/linkprompt.toml"));
        assert_eq!(paths.snapshot_path(0), PathBuf::from("/srv/jobs/link_1.json"));
        assert_eq!(paths.snapshot_path(41), PathBuf::from("/srv/jobs/link_42.json"));
        assert_eq!(paths.raw_page_path(0), PathBuf::from("/srv/jobs/page_1.html"));
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        let paths = RunPaths::from_link_file(None);
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(paths.link_file, PathBuf::from("links.txt"));
        assert_eq!(paths.prompt_file, cwd.join("prompts.txt"));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = std::env::temp_dir().join(format!("lp-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let paths = RunPaths::from_link_file(Some(&dir.join("links.txt")));

        let config = load_config_for(&paths).unwrap();
        assert_eq!(config.pipeline.interval_secs, 900);

        std::fs::write(&paths.config_file, "[pipeline]\ninterval_secs = 5\n").unwrap();
        let config = load_config_for(&paths).unwrap();
        assert_eq!(config.pipeline.interval_secs, 5);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_model_is_rejected() {
        let dir = std::env::temp_dir().join(format!("lp-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[pipeline]\nmodel = \"  \"\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("pipeline.model"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
