use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;

/// String key-value storage backing the catalog (one JSON document per key).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct LocalFsKeyValueStore {
    base_dir: PathBuf,
}

impl LocalFsKeyValueStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn key_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            anyhow::bail!("invalid storage key: {key:?}");
        }
        Ok(self.base_dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for LocalFsKeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.key_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read: {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.key_path(key)?;
        write_atomic(&path, value.as_bytes())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    std::fs::write(&tmp_path, data)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_fs_store_returns_none_for_missing_key() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = LocalFsKeyValueStore::new(temp.path());
        assert_eq!(store.get("library_books").unwrap(), None);
    }

    #[test]
    fn local_fs_store_overwrites_value() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = LocalFsKeyValueStore::new(temp.path().join("nested"));
        store.set("library_books", "[1]").unwrap();
        store.set("library_books", "[2]").unwrap();
        assert_eq!(store.get("library_books").unwrap().as_deref(), Some("[2]"));
        assert!(temp.path().join("nested").join("library_books.json").exists());
    }

    #[test]
    fn local_fs_store_rejects_path_like_keys() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = LocalFsKeyValueStore::new(temp.path());
        let err = store.set("../escape", "x").unwrap_err().to_string();
        assert!(err.contains("invalid storage key"));
    }
}
