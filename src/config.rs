use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::catalog::{CatalogStore, LocalFsKeyValueStore};

pub const DATA_DIR_ENV: &str = "SHELFSCAN_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "library-data";

/// `--data-dir`, then `$SHELFSCAN_DATA_DIR`, then `library-data`.
pub fn data_dir(arg: Option<&Path>) -> PathBuf {
    resolve_data_dir(arg, std::env::var(DATA_DIR_ENV).ok())
}

pub fn resolve_data_dir(arg: Option<&Path>, env_value: Option<String>) -> PathBuf {
    if let Some(path) = arg {
        return path.to_path_buf();
    }
    env_value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn open_store(data_dir: &Path) -> anyhow::Result<CatalogStore> {
    tracing::debug!(data_dir = %data_dir.display(), "opening catalog");
    CatalogStore::load(Arc::new(LocalFsKeyValueStore::new(data_dir)))
        .with_context(|| format!("load catalog: {}", data_dir.display()))
}
