//! # Package Index Client
//!
//! Thin read-only client for the package index's JSON "project info"
//! endpoint, used to look up the latest published version of an addon
//! package.
//!
//! Lookups are memoised in an explicit [`VersionCache`] owned by the
//! caller, a process-wide memo with no TTL and no persistence. The cache
//! is passed in rather than hidden in module state so tests can seed and
//! reset it deterministically.
//!
//! Network failures propagate as [`Error::Network`]; there is no retry or
//! backoff.

use std::collections::HashMap;
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};

/// Default package index base (the PyPI JSON API).
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

/// In-process memo of package name → latest version.
#[derive(Debug, Default)]
pub struct VersionCache {
    versions: HashMap<String, String>,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, package: &str) -> Option<&str> {
        self.versions.get(package).map(String::as_str)
    }

    /// Record a version. Also used by tests to stub the index.
    pub fn insert(&mut self, package: impl Into<String>, version: impl Into<String>) {
        self.versions.insert(package.into(), version.into());
    }
}

/// Blocking HTTP client for the package index.
pub struct IndexClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl IndexClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_INDEX_URL)
    }

    /// Client against an alternate index base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        IndexClient {
            base_url: base_url.into(),
            http,
        }
    }

    /// Latest published version of `package`, memoised in `cache`.
    pub fn latest_version(&self, cache: &mut VersionCache, package: &str) -> Result<String> {
        if let Some(version) = cache.get(package) {
            debug!("version cache hit for {}: {}", package, version);
            return Ok(version.to_string());
        }

        let url = format!("{}/{}/json", self.base_url, package);
        debug!("querying package index: {}", url);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| Error::Network {
                url: url.clone(),
                message: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| Error::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let payload: serde_json::Value = response.json().map_err(|e| Error::Network {
            url: url.clone(),
            message: format!("invalid JSON payload: {}", e),
        })?;

        let version = payload
            .get("info")
            .and_then(|info| info.get("version"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Network {
                url: url.clone(),
                message: "payload has no info.version field".to_string(),
            })?
            .to_string();

        cache.insert(package, version.clone());
        Ok(version)
    }
}

impl Default for IndexClient {
    fn default() -> Self {
        Self::new()
    }
}
