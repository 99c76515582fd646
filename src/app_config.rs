use std::path::PathBuf;

use config::{Config, File as ConfigFile};
use serde::Deserialize;
use tracing::warn;

use crate::error::Error;

/// Everything the engine can be told from the outside, built once at
/// startup and handed into the orchestrator; there is no ambient global. A
/// malformed or missing `Sweeper.toml` falls back to the built-in defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Roots scanned when the command line names none.
    pub root_paths: Vec<PathBuf>,
    /// Glob patterns excluded from duplicate traversal.
    pub ignore_patterns: Vec<String>,
    /// Where removed duplicates go instead of being deleted; empty disables
    /// quarantine.
    pub quarantine: Option<PathBuf>,
    /// "strong" or "legacy".
    pub hash_algorithm: String,
    pub min_file_size_kb: u64,
    /// Extension allow-list for the extract and consolidate jobs.
    pub code_extensions: Vec<String>,
    /// Category names the organize job acts on; empty means all.
    pub enabled_categories: Vec<String>,
    pub create_subfolders: bool,
    pub delete_unauthorized_folders: bool,
    /// Run an organize pass when invoked without a subcommand.
    pub auto_organize: bool,
    pub deep_scan: bool,
    pub organized_root: PathBuf,
    pub repository_root: PathBuf,
    /// Consolidated documents land here.
    pub library_root: PathBuf,
    pub log_dir: PathBuf,
    pub log_max_size_kb: u64,
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            root_paths: vec![PathBuf::from(".")],
            ignore_patterns: Vec::new(),
            quarantine: None,
            hash_algorithm: "strong".to_string(),
            min_file_size_kb: 10,
            code_extensions: vec![
                ".py", ".html", ".js", ".json", ".txt", ".css", ".md", ".java", ".cpp", ".c",
                ".h", ".rs", ".sh", ".bat",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            enabled_categories: Vec::new(),
            create_subfolders: true,
            delete_unauthorized_folders: false,
            auto_organize: false,
            deep_scan: true,
            organized_root: PathBuf::from("ORGANIZED"),
            repository_root: PathBuf::from("Code_Repository"),
            library_root: PathBuf::from("LIBRARY"),
            log_dir: PathBuf::from("logs"),
            log_max_size_kb: 10 * 1024,
        }
    }
}

impl AppConfig {
    /// Loads `Sweeper.toml` from the working directory if present. Any load
    /// or parse failure is reported and answered with the defaults; bad
    /// configuration never stops a run.
    pub fn load() -> AppConfig {
        match AppConfig::try_load() {
            Ok(config) => config,
            Err(err) => {
                warn!("configuration error ({}), using defaults", err);
                AppConfig::default()
            }
        }
    }

    fn try_load() -> Result<AppConfig, Error> {
        let builder = Config::builder()
            .add_source(ConfigFile::with_name("Sweeper").required(false))
            .build()
            .map_err(|err| Error::Config(err.to_string()))?;

        builder
            .try_deserialize::<AppConfig>()
            .map_err(|err| Error::Config(err.to_string()))
    }
}
