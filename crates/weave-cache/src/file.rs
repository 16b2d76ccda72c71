//! File-backed cache.
//!
//! Each bucket is a directory under the cache root and each entry a single
//! file named after its escaped key:
//!
//! ```text
//! {root}/
//! +-- VERSION
//! +-- resolved/
//!     +-- 3f2a...e1        # [etag_len: u32 LE][etag][value]
//! ```
//!
//! Entries are written to a temporary file and renamed into place, so a
//! reader never sees a half-written value. A `VERSION` mismatch on open wipes
//! the whole directory.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{Cache, CacheBucket};

const VERSION_FILE: &str = "VERSION";

/// Bytes escaped in entry file names: everything except `[A-Za-z0-9_-]`.
const KEY_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// [`Cache`] rooted at a directory on disk.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open the cache at `root`, wiping it if it was written by another
    /// `version`. I/O failures are logged and leave the cache usable as a
    /// miss-only store.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        ensure_version(&root, version);
        Self { root }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(escape_key(name)),
        })
    }
}

struct FileCacheBucket {
    dir: PathBuf,
}

impl FileCacheBucket {
    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(escape_key(key))
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let mut file = File::open(self.entry_path(key)).ok()?;

        let mut len = [0u8; 4];
        file.read_exact(&mut len).ok()?;
        let mut stored_etag = vec![0u8; u32::from_le_bytes(len) as usize];
        file.read_exact(&mut stored_etag).ok()?;

        if !etag.is_empty() && stored_etag != etag.as_bytes() {
            return None;
        }

        let mut value = Vec::new();
        file.read_to_end(&mut value).ok()?;
        Some(value)
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let Ok(etag_len) = u32::try_from(etag.len()) else {
            return;
        };
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), "Failed to create cache bucket: {e}");
            return;
        }

        let mut buf = Vec::with_capacity(4 + etag.len() + value.len());
        buf.extend_from_slice(&etag_len.to_le_bytes());
        buf.extend_from_slice(etag.as_bytes());
        buf.extend_from_slice(value);

        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");
        let result = fs::write(&tmp, &buf).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), "Failed to write cache entry: {e}");
            let _ = fs::remove_file(&tmp);
        }
    }

    fn remove(&self, key: &str) {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Failed to remove cache entry: {e}");
            }
            _ => {}
        }
    }
}

/// Map a key to a single safe file name.
///
/// Anything outside `[A-Za-z0-9_-]` is percent-escaped, which keeps keys
/// containing `/` or `..` inside the bucket directory.
fn escape_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_SET).to_string()
}

fn ensure_version(root: &Path, version: &str) {
    let version_file = root.join(VERSION_FILE);

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!(version, "Cache version matches");
            return;
        }
        Ok(stored) => {
            tracing::info!(stored = %stored, current = version, "Cache version changed, wiping cache");
        }
        Err(_) => tracing::info!(root = %root.display(), "Initializing cache"),
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("Failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("Failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("Failed to write cache VERSION file: {e}");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn open(tmp: &TempDir, version: &str) -> FileCache {
        FileCache::new(tmp.path().join("cache"), version)
    }

    #[test]
    fn test_set_get_and_etag_validation() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp, "v1").bucket("resolved");

        bucket.set("index.xml", "opts-1", b"<page/>");

        assert_eq!(bucket.get("index.xml", "opts-1"), Some(b"<page/>".to_vec()));
        assert_eq!(bucket.get("index.xml", "opts-2"), None);
        assert_eq!(bucket.get("index.xml", ""), Some(b"<page/>".to_vec()));
    }

    #[test]
    fn test_overwrite_and_remove() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp, "v1").bucket("resolved");

        bucket.set("k", "e1", b"first");
        bucket.set("k", "e2", b"second");
        assert_eq!(bucket.get("k", "e2"), Some(b"second".to_vec()));

        bucket.remove("k");
        assert_eq!(bucket.get("k", ""), None);
    }

    #[test]
    fn test_remove_missing_entry_is_noop() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp, "v1").bucket("resolved");

        bucket.remove("never-written");
        bucket.set("k", "e", b"kept");
        bucket.remove("never-written");

        assert_eq!(bucket.get("k", "e"), Some(b"kept".to_vec()));
    }

    #[test]
    fn test_escape_key_keeps_safe_bytes() {
        assert_eq!(escape_key("index_v2-final"), "index_v2-final");
        assert_eq!(escape_key("a b/ü"), "a%20b%2F%C3%BC");
    }

    #[test]
    fn test_keys_with_separators_stay_in_bucket() {
        let tmp = TempDir::new().unwrap();
        let cache = open(&tmp, "v1");
        let bucket = cache.bucket("resolved");

        bucket.set("../pages/index.xml", "e", b"data");

        assert_eq!(bucket.get("../pages/index.xml", "e"), Some(b"data".to_vec()));
        let entries: Vec<_> = fs::read_dir(cache.root().join("resolved"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["%2E%2E%2Fpages%2Findex%2Exml"]);
    }

    #[test]
    fn test_buckets_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let cache = open(&tmp, "v1");

        cache.bucket("a").set("k", "e", b"alpha");
        cache.bucket("b").set("k", "e", b"beta");

        assert_eq!(cache.bucket("a").get("k", "e"), Some(b"alpha".to_vec()));
        assert_eq!(cache.bucket("b").get("k", "e"), Some(b"beta".to_vec()));
    }

    #[test]
    fn test_version_match_keeps_entries() {
        let tmp = TempDir::new().unwrap();
        open(&tmp, "v1").bucket("resolved").set("k", "e", b"kept");

        assert_eq!(
            open(&tmp, "v1").bucket("resolved").get("k", "e"),
            Some(b"kept".to_vec())
        );
    }

    #[test]
    fn test_version_mismatch_wipes_entries() {
        let tmp = TempDir::new().unwrap();
        open(&tmp, "v1").bucket("resolved").set("k", "e", b"stale");

        let cache = open(&tmp, "v2");

        assert_eq!(cache.bucket("resolved").get("k", "e"), None);
        assert_eq!(
            fs::read_to_string(cache.root().join(VERSION_FILE)).unwrap(),
            "v2"
        );
    }

    #[test]
    fn test_missing_root_is_created() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("deeply/nested/cache");

        let _cache = FileCache::new(root.clone(), "v1");

        assert_eq!(fs::read_to_string(root.join(VERSION_FILE)).unwrap(), "v1");
    }
}
