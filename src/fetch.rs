//! Blocking HTTP fetches with an optional on-disk response cache

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source of pages and image bytes
pub trait Fetch {
    fn fetch_binary(&self, url: &str) -> Result<Vec<u8>>;

    /// Fetch a page; the body must be valid UTF-8
    fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_binary(url)?;
        String::from_utf8(bytes).with_context(|| format!("Response is not UTF-8: {}", url))
    }
}

pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// `timeout` of `None` waits on the remote host indefinitely
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpClient {
    fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch: {}", url))?;

        log::debug!("GET {} -> {}", url, response.status());

        let bytes = response
            .error_for_status()
            .with_context(|| format!("Bad status: {}", url))?
            .bytes()
            .with_context(|| format!("Failed to read response: {}", url))?;

        Ok(bytes.to_vec())
    }
}

// Cache system
pub struct CachedClient<F> {
    inner: F,
    cache_dir: PathBuf,
}

impl<F: Fetch> CachedClient<F> {
    pub fn new(inner: F, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    /// Host and path of `url` under the cache directory
    ///
    /// `None` for URLs that cannot be cached, which are fetched directly.
    fn url_to_cache_path(&self, url: &str) -> Option<PathBuf> {
        let parsed = reqwest::Url::parse(url).ok()?;
        let host = parsed.host_str().filter(|host| is_plain_component(host))?;

        let mut path = self.cache_dir.join(host);
        let mut pushed = false;
        for segment in parsed.path_segments()?.filter(|s| is_plain_component(s)) {
            path.push(segment);
            pushed = true;
        }
        // Directory-style URLs still need a file to live in
        if !pushed || parsed.path().ends_with('/') {
            path.push("index.html");
        }
        Some(path)
    }
}

/// A path component that stays where it is joined
fn is_plain_component(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..") && !segment.contains(['/', '\\'])
}

fn write_cache(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

impl<F: Fetch> Fetch for CachedClient<F> {
    fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
        let Some(cache_path) = self.url_to_cache_path(url) else {
            log::debug!("not caching {}", url);
            return self.inner.fetch_binary(url);
        };

        if cache_path.is_file() {
            log::debug!("cache hit {}", cache_path.display());
            return fs::read(&cache_path)
                .with_context(|| format!("Failed to read cache: {:?}", cache_path));
        }

        let bytes = self.inner.fetch_binary(url)?;

        // A cache that cannot be written only costs a refetch next time
        if let Err(e) = write_cache(&cache_path, &bytes) {
            log::warn!("Failed to cache {}: {:#}", url, e);
        }

        Ok(bytes)
    }
}
