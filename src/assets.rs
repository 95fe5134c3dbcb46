/*!
 * Asset resolution.
 *
 * Scenario documents refer to media by logical path. A resolver turns that
 * path into something a backend can open: a remote URL, bytes already held
 * in the local cache, or a plain filesystem path. Resolution says nothing
 * about playability; a source that resolves but cannot be decoded is the
 * backend's `MediaError::Load`.
 */

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use bytes::Bytes;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use url::Url;

use crate::app_config::AssetConfig;
use crate::errors::MediaError;

// @const: Absolute http(s) URL
static REMOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://").unwrap()
});

/// A playable byte source
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// Served over http(s)
    Remote(Url),
    /// Cached bytes keyed by the logical path
    Inline { path: String, data: Bytes },
    /// Local file, passed through unchanged
    Path(PathBuf),
}

impl MediaSource {
    /// Short human readable description used in logs and errors
    pub fn describe(&self) -> String {
        match self {
            Self::Remote(url) => url.to_string(),
            Self::Inline { path, data } => format!("cache:{} ({} bytes)", path, data.len()),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Resolves a logical asset path to a byte source
pub trait AssetResolver {
    /// Resolve `path`. Fails only when no source at all can be produced.
    fn resolve(&self, path: &str) -> Result<MediaSource, MediaError>;
}

/// Resolver with remote pass-through, an in-memory cache and a path fallback
pub struct DefaultAssetResolver {
    /// Cached asset bytes keyed by logical path
    cache: Arc<RwLock<HashMap<String, Bytes>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Root for relative pass-through paths
    asset_root: Option<PathBuf>,

    /// Base for upload-prefixed paths
    remote_base: Option<Url>,

    /// Upload path prefix
    upload_prefix: String,
}

impl DefaultAssetResolver {
    /// Create a resolver from asset configuration. An unparsable base URL is ignored.
    pub fn new(config: &AssetConfig) -> Self {
        let remote_base = config.remote_base_url.as_deref().and_then(|base| {
            Url::parse(base)
                .map_err(|e| debug!("Ignoring remote base URL '{}': {}", base, e))
                .ok()
        });

        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            asset_root: config.asset_root.clone(),
            remote_base,
            upload_prefix: config.upload_prefix.clone(),
        }
    }

    fn is_upload_path(&self, path: &str) -> bool {
        path.starts_with(&self.upload_prefix)
    }

    /// Store asset bytes for a logical path
    pub fn store(&self, path: &str, data: Bytes) {
        debug!("Cached asset '{}' ({} bytes)", path, data.len());
        self.cache.write().insert(path.to_string(), data);
    }

    /// Whether a path is cached
    pub fn contains(&self, path: &str) -> bool {
        self.cache.read().contains_key(path)
    }

    /// Remove one cached asset
    pub fn remove(&self, path: &str) -> Option<Bytes> {
        self.cache.write().remove(path)
    }

    /// Remove every cached asset and reset counters
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Asset cache cleared");
    }

    /// Logical paths currently cached, sorted
    pub fn cached_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.cache.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Cache statistics: (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }
}

impl Default for DefaultAssetResolver {
    fn default() -> Self {
        Self::new(&AssetConfig::default())
    }
}

impl Clone for DefaultAssetResolver {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            asset_root: self.asset_root.clone(),
            remote_base: self.remote_base.clone(),
            upload_prefix: self.upload_prefix.clone(),
        }
    }
}

impl AssetResolver for DefaultAssetResolver {
    fn resolve(&self, path: &str) -> Result<MediaSource, MediaError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(MediaError::Unresolvable(path.to_string()));
        }

        if REMOTE_REGEX.is_match(path) {
            return Url::parse(path)
                .map(MediaSource::Remote)
                .map_err(|_| MediaError::Unresolvable(path.to_string()));
        }

        if self.is_upload_path(path) {
            if let Some(base) = &self.remote_base {
                if let Ok(url) = base.join(path) {
                    return Ok(MediaSource::Remote(url));
                }
            }
            return Ok(MediaSource::Path(PathBuf::from(path)));
        }

        if let Some(data) = self.cache.read().get(path) {
            *self.hits.write() += 1;
            return Ok(MediaSource::Inline {
                path: path.to_string(),
                data: data.clone(),
            });
        }
        *self.misses.write() += 1;

        let resolved = match &self.asset_root {
            Some(root) if !path.starts_with('/') => root.join(path),
            _ => PathBuf::from(path),
        };
        Ok(MediaSource::Path(resolved))
    }
}
