//! File-backed idempotent cache for API responses.
//!
//! Every blob lives at `root/<resource key>`. A present, non-empty file is
//! trusted as-is: there is no expiry and no checksum. Writes land in a
//! sibling `.partial` file that is renamed into place, so an interrupted
//! write never leaves a truncated blob under the real key.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ResourceKey;

const PARTIAL_SUFFIX: &str = ".partial";

/// Errors raised by [`CacheStore`] operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache entry '{key}' not found")]
    NotFound { key: ResourceKey },

    #[error("cache I/O failure for '{key}': {source}")]
    Io {
        key: ResourceKey,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    fn io(key: &ResourceKey, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { key: key.clone() }
        } else {
            Self::Io {
                key: key.clone(),
                source,
            }
        }
    }
}

/// Resource-key addressed blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of the blob for `key`.
    pub fn path(&self, key: &ResourceKey) -> PathBuf {
        key.segments()
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// `true` when a non-empty blob is stored under `key`.
    pub fn exists(&self, key: &ResourceKey) -> bool {
        fs::metadata(self.path(key))
            .map(|metadata| metadata.is_file() && metadata.len() > 0)
            .unwrap_or(false)
    }

    pub fn read(&self, key: &ResourceKey) -> Result<Vec<u8>, CacheError> {
        fs::read(self.path(key)).map_err(|error| CacheError::io(key, error))
    }

    /// Store `bytes` under `key`, creating parent directories as needed.
    pub fn write(&self, key: &ResourceKey, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| CacheError::io(key, error))?;
        }

        let mut partial = path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);

        fs::write(&partial, bytes).map_err(|error| CacheError::io(key, error))?;
        fs::rename(&partial, &path).map_err(|error| {
            let _ = fs::remove_file(&partial);
            CacheError::io(key, error)
        })
    }

    /// Names of the entries directly below `prefix`, sorted ascending.
    ///
    /// A missing directory yields an empty list; in-flight `.partial` files
    /// are skipped.
    pub fn list_dir(&self, prefix: &str) -> io::Result<Vec<String>> {
        let dir = prefix
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment));

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error),
        };

        let mut names = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if !name.ends_with(PARTIAL_SUFFIX) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(value: &str) -> ResourceKey {
        ResourceKey::parse(value).expect("valid key")
    }

    #[test]
    fn write_creates_parent_directories_and_reads_back() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());
        let key = key("fundamentals/AAPL/profile.json");

        assert!(!cache.exists(&key));
        cache.write(&key, b"[{}]").expect("write");

        assert!(cache.exists(&key));
        assert_eq!(cache.read(&key).expect("read"), b"[{}]");
        assert!(dir.path().join("fundamentals/AAPL/profile.json").is_file());
    }

    #[test]
    fn read_of_missing_key_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());

        let err = cache.read(&key("info/GDP.json")).expect_err("must fail");
        assert!(matches!(err, CacheError::NotFound { .. }));
    }

    #[test]
    fn empty_file_is_not_trusted_as_cached() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());
        let key = key("info/GDP.json");

        fs::create_dir_all(dir.path().join("info")).expect("mkdir");
        fs::write(dir.path().join("info/GDP.json"), b"").expect("truncated file");

        assert!(!cache.exists(&key));
    }

    #[test]
    fn write_leaves_no_partial_file_behind() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());
        cache.write(&key("info/CPI.json"), b"[]").expect("write");

        assert_eq!(cache.list_dir("info").expect("list"), vec!["CPI.json"]);
    }

    #[test]
    fn list_dir_is_sorted_and_tolerates_missing_directory() {
        let dir = tempdir().expect("tempdir");
        let cache = CacheStore::new(dir.path());

        assert!(cache.list_dir("fundamentals").expect("list").is_empty());

        for symbol in ["MSFT", "AAPL", "%5EGSPC"] {
            cache
                .write(&key(&format!("fundamentals/{symbol}/profile.json")), b"[]")
                .expect("write");
        }

        assert_eq!(
            cache.list_dir("fundamentals").expect("list"),
            vec!["%5EGSPC", "AAPL", "MSFT"]
        );
    }
}
