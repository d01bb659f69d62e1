//! Config file read/write with atomic replace and rolling backups.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::env::resolve_env_vars;
use crate::schema::OmraConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 5;

/// Resolve the OMRA config directory.
/// Priority: `OMRA_CONFIG_DIR` env > `~/.omra/`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OMRA_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".omra"))
        .unwrap_or_else(|| PathBuf::from(".omra"))
}

/// Full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config, substituting `${ENV_VAR}` references.
///
/// Returns defaults if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<OmraConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(OmraConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let value: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config YAML at: {}", path.display()))?;
    let value = resolve_env_vars(&value)?;
    let config: OmraConfig = serde_json::from_value(value)
        .with_context(|| format!("invalid config at: {}", path.display()))?;

    info!(path = %path.display(), agents = config.agents.len(), "Loaded config");
    Ok(config)
}

/// Write config to disk atomically (temp file, then rename), keeping a
/// rolling backup of the previous file.
pub async fn write_config(config: &OmraConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create config directory: {}", parent.display()))?;
    }

    if path.exists() {
        rotate_backups(path).await?;
    }

    let yaml =
        serde_yaml::to_string(config).context("failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("failed to write temp config: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

/// Rotate backup files: config.yaml.bak.1 → .bak.2 → ... → .bak.N
async fn rotate_backups(path: &Path) -> Result<()> {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("yaml.bak.{i}"));
        let new = path.with_extension(format!("yaml.bak.{}", i + 1));
        if old.exists() {
            let _ = fs::rename(&old, &new).await;
        }
    }
    let first = path.with_extension("yaml.bak.1");
    fs::copy(path, &first)
        .await
        .with_context(|| format!("failed to back up config to: {}", first.display()))?;
    Ok(())
}
