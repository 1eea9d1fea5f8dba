use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;

/// Durable "a deposit transaction for this pubkey has been submitted" facts.
/// Keys are the hex-encoded pubkey as it appears in the record collection.
/// Markers are never removed once created; check-then-create is only safe
/// for a single process instance per store.
pub trait CompletionStore {
    fn has(&self, pubkey_hex: &str) -> Result<bool>;
    fn mark(&self, pubkey_hex: &str) -> Result<()>;
}

/// One zero-byte `<pubkey-hex>.lock` file per completed pubkey, in a
/// directory named after the source collection file. File existence alone is
/// the signal, content is irrelevant.
pub struct FsCompletionStore {
    dir: PathBuf,
}

impl FsCompletionStore {
    /// Store directory for a record collection file: `<source>-locks/`,
    /// created on demand.
    pub fn for_source(source: &Path) -> Result<Self> {
        let mut os = source.as_os_str().to_os_string();
        os.push("-locks");
        Self::open(PathBuf::from(os))
    }

    pub fn open(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock_path(&self, pubkey_hex: &str) -> PathBuf {
        self.dir.join(format!("{pubkey_hex}.lock"))
    }
}

impl CompletionStore for FsCompletionStore {
    fn has(&self, pubkey_hex: &str) -> Result<bool> {
        Ok(self.lock_path(pubkey_hex).exists())
    }

    fn mark(&self, pubkey_hex: &str) -> Result<()> {
        std::fs::write(self.lock_path(pubkey_hex), "")?;
        Ok(())
    }
}

/// Process-local store, markers vanish with the process.
#[derive(Default)]
pub struct MemoryCompletionStore {
    seen: Mutex<HashSet<String>>,
}

impl MemoryCompletionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompletionStore for MemoryCompletionStore {
    fn has(&self, pubkey_hex: &str) -> Result<bool> {
        Ok(self.seen.lock().unwrap().contains(pubkey_hex))
    }

    fn mark(&self, pubkey_hex: &str) -> Result<()> {
        self.seen.lock().unwrap().insert(pubkey_hex.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_marks_and_checks() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("deposit_data-test.json");
        let store = FsCompletionStore::for_source(&source).unwrap();

        assert!(!store.has("aabb").unwrap());
        store.mark("aabb").unwrap();
        assert!(store.has("aabb").unwrap());
        assert!(!store.has("ccdd").unwrap());

        // zero-byte lock file next to the source
        let lock = tmp.path().join("deposit_data-test.json-locks/aabb.lock");
        assert!(lock.exists());
        assert_eq!(std::fs::metadata(&lock).unwrap().len(), 0);
    }

    #[test]
    fn fs_store_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("deposit_data-test.json");

        FsCompletionStore::for_source(&source)
            .unwrap()
            .mark("aabb")
            .unwrap();
        let reopened = FsCompletionStore::for_source(&source).unwrap();
        assert!(reopened.has("aabb").unwrap());
    }

    #[test]
    fn memory_store_marks_and_checks() {
        let store = MemoryCompletionStore::new();
        assert!(!store.has("aabb").unwrap());
        store.mark("aabb").unwrap();
        assert!(store.has("aabb").unwrap());
    }
}
