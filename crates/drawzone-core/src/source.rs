// Data sources: where period listings and period resources come from.
//
// Two implementations: a local directory of period files, and a static HTTP
// site laid out as `{base}/files.json` plus `{base}/data/{name}`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::draw::DataFormat;
use crate::loader::LoadError;
use crate::period::PeriodDescriptor;

/// File name of the period index inside a data directory or site root.
pub const INDEX_FILE: &str = "files.json";

/// A provider of period listings and raw period resources.
#[async_trait]
pub trait DrawSource: Send + Sync {
    /// Enumerate available periods (unordered).
    async fn list(&self) -> Result<Vec<PeriodDescriptor>, LoadError>;

    /// Fetch the raw text of one period resource.
    async fn fetch(&self, name: &str) -> Result<String, LoadError>;

    /// Human-readable location, for logs and status lines.
    fn describe(&self) -> String;
}

/// Reject names that could escape the data location.
pub fn validate_name(name: &str) -> Result<(), LoadError> {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(LoadError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// DirectorySource
// ---------------------------------------------------------------------------

/// Period files (`*.json`, `*.csv`) in a single local directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySource { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DrawSource for DirectorySource {
    async fn list(&self) -> Result<Vec<PeriodDescriptor>, LoadError> {
        let resource = self.describe();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("data directory {} does not exist; no periods", resource);
                return Ok(Vec::new());
            }
            Err(e) => return Err(LoadError::unreachable(resource, e)),
        };

        let mut periods = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LoadError::unreachable(resource.clone(), e))?
        {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name == INDEX_FILE || DataFormat::from_name(name).is_none() {
                continue;
            }
            periods.push(PeriodDescriptor::from_name(name));
        }
        Ok(periods)
    }

    async fn fetch(&self, name: &str) -> Result<String, LoadError> {
        validate_name(name)?;
        let path = self.dir.join(name);
        debug!("reading {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::unreachable(path.display().to_string(), e))
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// HttpSource
// ---------------------------------------------------------------------------

/// A static site serving `files.json` and `data/<name>`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        HttpSource {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn listing_url(&self) -> String {
        format!("{}/{INDEX_FILE}", self.base_url)
    }

    pub fn period_url(&self, name: &str) -> String {
        format!("{}/data/{name}", self.base_url)
    }

    async fn get_text(&self, url: &str) -> Result<String, LoadError> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| LoadError::unreachable(url, e))?;
        response
            .text()
            .await
            .map_err(|e| LoadError::unreachable(url, e))
    }
}

#[async_trait]
impl DrawSource for HttpSource {
    async fn list(&self) -> Result<Vec<PeriodDescriptor>, LoadError> {
        let url = self.listing_url();
        let text = self.get_text(&url).await?;
        serde_json::from_str(&text).map_err(|e| LoadError::InvalidDocument {
            resource: url,
            message: e.to_string(),
        })
    }

    async fn fetch(&self, name: &str) -> Result<String, LoadError> {
        validate_name(name)?;
        self.get_text(&self.period_url(name)).await
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
