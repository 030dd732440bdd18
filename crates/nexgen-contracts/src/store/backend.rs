use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key/value text store with browser local-storage semantics: each key holds
/// one serialized document and writes replace it wholesale.
pub trait StorageBackend {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for &B {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove(key)
    }
}

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            anyhow::bail!("invalid storage key '{key}'");
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(anyhow::Error::new(err).context(format!("reading {}", path.display()))),
        }
    }

    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> anyhow::Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileBackend, MemoryBackend, StorageBackend};

    #[test]
    fn file_backend_round_trips_and_creates_directories() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let backend = FileBackend::new(temp.path().join("nested").join("data"));
        assert_eq!(backend.read("nexgen_db_leads")?, None);

        backend.write("nexgen_db_leads", "[]")?;
        assert_eq!(backend.read("nexgen_db_leads")?.as_deref(), Some("[]"));
        assert!(backend.root().join("nexgen_db_leads.json").exists());

        backend.remove("nexgen_db_leads")?;
        backend.remove("nexgen_db_leads")?;
        assert_eq!(backend.read("nexgen_db_leads")?, None);
        Ok(())
    }

    #[test]
    fn file_backend_rejects_path_like_keys() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let backend = FileBackend::new(temp.path());
        assert!(backend.write("../escape", "{}").is_err());
        assert!(backend.read("").is_err());
        Ok(())
    }

    #[test]
    fn memory_backend_overwrites_whole_values() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        backend.write("k", "one")?;
        backend.write("k", "two")?;
        assert_eq!(backend.read("k")?.as_deref(), Some("two"));
        Ok(())
    }
}
