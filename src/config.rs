use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MindgraphConfig {
    /// Path to the SQLite database file
    pub database: Option<String>,
    /// Path to a model catalog JSON file (built-in set when absent)
    pub models: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("mindgraph.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".mindgraph").join("mindgraph.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<MindgraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: MindgraphConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &MindgraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
