//! Persistent bucket → endpoint cache
//!
//! The store is a small INI file with one section per bucket:
//!
//! ```text
//! [my-bucket]
//! endpoint = gz.bcebos.com|1767225600
//! ```
//!
//! The value is `<endpoint>|<absolute unix expiry>`. Entries are evicted
//! lazily: a read that finds an expired or malformed value removes it.
//! Mutations only mark the cache dirty; [`EndpointCache::save_if_dirty`]
//! writes the store once at shutdown.

use crate::defaults::{CACHE_FILE_NAME, DEFAULT_ENDPOINT_TTL_SECS, FALLBACK_CACHE_PATH};
use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

const ENDPOINT_KEY: &str = "endpoint";

#[derive(Debug, Default)]
struct CacheState {
    /// Raw stored values, validated on access
    entries: BTreeMap<String, String>,
    dirty: bool,
}

/// Endpoint cache backed by a file store
#[derive(Debug)]
pub struct EndpointCache {
    path: PathBuf,
    state: RwLock<CacheState>,
    corrupt: bool,
}

impl EndpointCache {
    /// Load the store at `path`. A missing store starts empty; a corrupt one
    /// is discarded and reported through [`EndpointCache::was_corrupt`].
    pub fn load(path: PathBuf) -> Self {
        let (entries, corrupt) = match std::fs::read_to_string(&path) {
            Ok(text) => match parse_store(&text) {
                Some(entries) => (entries, false),
                None => (BTreeMap::new(), true),
            },
            Err(_) => (BTreeMap::new(), false),
        };

        Self {
            path,
            state: RwLock::new(CacheState {
                entries,
                // A discarded store is rewritten on save
                dirty: corrupt,
            }),
            corrupt,
        }
    }

    /// Default store location following the XDG cache directory convention
    pub fn default_path() -> PathBuf {
        let cache_dir = if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
            PathBuf::from(xdg_cache)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".cache")
        } else {
            return PathBuf::from(FALLBACK_CACHE_PATH);
        };

        cache_dir.join(crate::PKG_NAME).join(CACHE_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store existed but could not be parsed
    pub fn was_corrupt(&self) -> bool {
        self.corrupt
    }

    /// Cached endpoint for `bucket`, if present and not expired
    pub async fn get(&self, bucket: &str) -> Option<String> {
        self.get_at(bucket, now_secs()).await
    }

    /// [`EndpointCache::get`] against an explicit clock
    pub async fn get_at(&self, bucket: &str, now: i64) -> Option<String> {
        {
            let state = self.state.read().await;
            match state.entries.get(bucket) {
                None => return None,
                Some(raw) => {
                    if let Some(endpoint) = visible(raw, now) {
                        return Some(endpoint);
                    }
                }
            }
        }

        // Expired or malformed: take the write lock and check again, a
        // writer may have refreshed the entry in between
        let mut state = self.state.write().await;
        let endpoint = state.entries.get(bucket).and_then(|raw| visible(raw, now));
        if endpoint.is_none() && state.entries.remove(bucket).is_some() {
            state.dirty = true;
        }
        endpoint
    }

    /// Store `endpoint` for `bucket`; `ttl_secs <= 0` applies the default TTL
    pub async fn put(&self, bucket: &str, endpoint: &str, ttl_secs: i64) {
        self.put_at(bucket, endpoint, ttl_secs, now_secs()).await
    }

    /// [`EndpointCache::put`] against an explicit clock
    pub async fn put_at(&self, bucket: &str, endpoint: &str, ttl_secs: i64, now: i64) {
        let ttl = if ttl_secs <= 0 { DEFAULT_ENDPOINT_TTL_SECS } else { ttl_secs };
        let value = format!("{}|{}", endpoint, now.saturating_add(ttl));

        let mut state = self.state.write().await;
        state.entries.insert(bucket.to_string(), value);
        state.dirty = true;
    }

    /// Remove the entry for `bucket`, returning whether one existed
    pub async fn delete(&self, bucket: &str) -> bool {
        let mut state = self.state.write().await;
        let removed = state.entries.remove(bucket).is_some();
        if removed {
            state.dirty = true;
        }
        removed
    }

    /// Stored expiry for `bucket`, without validation or eviction
    pub async fn expiry(&self, bucket: &str) -> Option<i64> {
        let state = self.state.read().await;
        state.entries.get(bucket).and_then(|raw| parse_value(raw)).map(|(_, expiry)| expiry)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_dirty(&self) -> bool {
        self.state.read().await.dirty
    }

    /// Write the store if anything changed. Returns whether a write happened.
    pub async fn save_if_dirty(&self) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.dirty {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::cache(format!(
                        "Failed to create cache directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        tokio::fs::write(&self.path, render_store(&state.entries))
            .await
            .map_err(|e| {
                AppError::cache(format!(
                    "Failed to write cache file '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        state.dirty = false;
        Ok(true)
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Split a stored value into endpoint and expiry
fn parse_value(raw: &str) -> Option<(&str, i64)> {
    let (endpoint, expiry) = raw.split_once('|')?;
    let endpoint = endpoint.trim();
    let expiry: i64 = expiry.trim().parse().ok()?;
    if endpoint.is_empty() || expiry < 0 {
        return None;
    }
    Some((endpoint, expiry))
}

/// The endpoint if the value is well formed and `expiry >= now`
fn visible(raw: &str, now: i64) -> Option<String> {
    parse_value(raw)
        .filter(|&(_, expiry)| expiry >= now)
        .map(|(endpoint, _)| endpoint.to_string())
}

/// Parse the INI store. `None` means the text is not a store at all.
fn parse_store(text: &str) -> Option<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    let mut section: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            // A section without an endpoint stays as a malformed entry
            entries.insert(name.to_string(), String::new());
            section = Some(name.to_string());
            continue;
        }

        match (line.split_once('='), &section) {
            (Some((key, value)), Some(bucket)) => {
                if key.trim() == ENDPOINT_KEY {
                    entries.insert(bucket.clone(), value.trim().to_string());
                }
            }
            _ => return None,
        }
    }

    Some(entries)
}

fn render_store(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (bucket, value) in entries {
        out.push_str(&format!("[{}]\n{} = {}\n\n", bucket, ENDPOINT_KEY, value));
    }
    out
}
