use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tessel_layout::{GridConfig, GridState, try_deserialize_grid};

use crate::error::{DoctorError, Result};

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(DoctorError::MissingPath {
            path: path.to_path_buf(),
        })
    }
}

pub fn write_string(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Parse a JSON file into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    ensure_exists(path)?;
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Load and validate a persisted grid.
pub fn load_grid(path: &Path, known_group_ids: Option<&BTreeSet<String>>) -> Result<GridState> {
    tracing::debug!(path = %path.display(), "loading grid");
    let value: Value = read_json(path)?;
    Ok(try_deserialize_grid(&value, known_group_ids)?)
}

/// Engine config from `--config`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<GridConfig> {
    let Some(path) = path else {
        return Ok(GridConfig::default());
    };
    let config: GridConfig = read_json(path)?;
    if !(config.default_insert_size.is_finite() && config.default_insert_size >= 0.0) {
        return Err(DoctorError::invalid(format!(
            "default_insert_size must be finite and >= 0, got {}",
            config.default_insert_size
        )));
    }
    if !(config.size_tolerance.is_finite() && config.size_tolerance >= 0.0) {
        return Err(DoctorError::invalid(format!(
            "size_tolerance must be finite and >= 0, got {}",
            config.size_tolerance
        )));
    }
    Ok(config)
}

/// Pretty JSON to `output`, or to stdout when no path is given.
pub fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            write_string(path, &format!("{rendered}\n"))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
