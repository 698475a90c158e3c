//! Loader configuration stored under `.sql-loader/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::capacity::DEFAULT_MAX_NUM_TASKS;
use crate::core::types::QueryContext;
use crate::io::snapshot::SNAPSHOT_KEY;
use crate::io::store::validate_key;

/// Canonical paths within `.sql-loader/` for a project root.
#[derive(Debug, Clone)]
pub struct LoaderPaths {
    pub root: PathBuf,
    pub loader_dir: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
}

impl LoaderPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let loader_dir = root.join(".sql-loader");
        Self {
            root,
            state_dir: loader_dir.join("state"),
            config_path: loader_dir.join("config.toml"),
            loader_dir,
        }
    }
}

/// Loader configuration (TOML).
///
/// Missing fields fall back to defaults, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Store key for the wizard snapshot.
    pub storage_key: String,

    /// Cluster-wide task slot count, used to fill in `maxNumTasks` when the
    /// query does not set it. Unset means "unknown".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_task_slots: Option<u32>,

    /// Server-side default query context. Its `maxNumTasks`, if any, replaces
    /// the built-in fallback of 2 when neither the query nor the cluster hint
    /// sets one.
    pub server_query_context: QueryContext,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            storage_key: SNAPSHOT_KEY.to_string(),
            max_task_slots: None,
            server_query_context: QueryContext::new(),
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.storage_key).context("storage_key")?;
        if self.max_task_slots == Some(0) {
            return Err(anyhow!("max_task_slots must be > 0 when set"));
        }
        if self
            .server_query_context
            .contains_key(QueryContext::MAX_NUM_TASKS)
            && !matches!(self.server_query_context.max_num_tasks(), Some(n) if n > 0)
        {
            return Err(anyhow!(
                "server_query_context.maxNumTasks must be a positive integer"
            ));
        }
        Ok(())
    }

    /// Concurrency assumed when the query context leaves `maxNumTasks` unset.
    pub fn default_max_num_tasks(&self) -> u32 {
        self.server_query_context
            .max_num_tasks()
            .unwrap_or(DEFAULT_MAX_NUM_TASKS)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LoaderConfig::default()`.
pub fn load_config(path: &Path) -> Result<LoaderConfig> {
    if !path.exists() {
        let cfg = LoaderConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LoaderConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &LoaderConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
