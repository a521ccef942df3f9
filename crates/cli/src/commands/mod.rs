//! CLI subcommands

pub mod fix;
pub mod scan;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Write `value` as pretty JSON to `dir/name`, creating `dir` if needed
pub fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(name);
    let content = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Read a file into memory with the path in any error
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
