// src/pipeline/cache.rs

//! Content-hash cache for expensive per-file transforms.
//!
//! The image pipeline uses this to skip re-encoding inputs whose content
//! has not changed since the last run. The cache file is a simple
//! line-based mapping:
//!
//! ```text
//! <hex_hash> <whitespace> <relative_path>
//! ```
//!
//! It lives outside the output roots on purpose, so `clean` does not
//! throw the optimization history away.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute the content hash of one file.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Persistent hash-per-key store.
#[derive(Debug)]
pub struct ContentCache {
    path: PathBuf,
    entries: HashMap<String, String>,
    dirty: bool,
}

impl ContentCache {
    /// Load the cache from `path`; a missing or unreadable file starts
    /// empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path).unwrap_or_default();
        debug!(?path, entries = entries.len(), "content cache loaded");
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    /// True if `key` was last seen with exactly this hash.
    pub fn unchanged(&self, key: &str, hash: &str) -> bool {
        self.entries.get(key).is_some_and(|h| h == hash)
    }

    pub fn insert(&mut self, key: &str, hash: String) {
        if self.entries.get(key) == Some(&hash) {
            return;
        }
        self.entries.insert(key.to_string(), hash);
        self.dirty = true;
    }

    /// Persist the cache if anything changed.
    pub fn save(&self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {:?}", parent))?;
        }

        let file = File::create(&self.path)
            .with_context(|| format!("creating cache file {:?}", self.path))?;
        let mut writer = BufWriter::new(file);
        for (key, hash) in &self.entries {
            writeln!(writer, "{hash} {key}")?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Option<HashMap<String, String>> {
    if !path.exists() {
        return None;
    }
    let file = File::open(path).ok()?;
    let reader = BufReader::new(file);

    let mut map = HashMap::new();
    for line in reader.lines() {
        let line = line.ok()?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some((hash, key)) = trimmed.split_once(char::is_whitespace) {
            map.insert(key.trim().to_string(), hash.to_string());
        }
    }
    Some(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join(".sitebuild/images.cache");

        let mut cache = ContentCache::load(&cache_path);
        assert!(!cache.unchanged("images/logo.png", "abc"));
        cache.insert("images/logo.png", "abc".to_string());
        cache.save().unwrap();

        let cache = ContentCache::load(&cache_path);
        assert!(cache.unchanged("images/logo.png", "abc"));
        assert!(!cache.unchanged("images/logo.png", "def"));
    }

    #[test]
    fn hashes_differ_per_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "one").unwrap();
        fs::write(&b, "two").unwrap();

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }
}
