//! Where the card photo comes from, and turning that into bytes.
//!
//! Remote sources are fetched over HTTP(S) through a [`Fetcher`]; local
//! sources are read from disk. Either way the result is raw bytes that are
//! decoded later.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use url::Url;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(Url),
    /// `temporary` marks an upload that belongs to this render and must be
    /// deleted once it finishes.
    Local { path: PathBuf, temporary: bool },
}

impl ImageSource {
    /// Classify a caller-supplied string: a lowercase `http://` or `https://`
    /// prefix is remote, anything else is a filesystem path.
    pub fn parse(input: &str, temporary: bool) -> Result<Self> {
        if input.starts_with("http://") || input.starts_with("https://") {
            let url = Url::parse(input)
                .map_err(|e| Error::SourceResolutionError(format!("invalid URL {}: {}", input, e)))?;
            return Ok(ImageSource::Remote(url));
        }
        Ok(ImageSource::Local {
            path: PathBuf::from(input),
            temporary,
        })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ImageSource::Remote(_))
    }

    /// The local file this render owns and must delete, if any.
    pub fn temporary_path(&self) -> Option<&PathBuf> {
        match self {
            ImageSource::Local { path, temporary: true } => Some(path),
            _ => None,
        }
    }
}

/// HTTP fetch collaborator.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_ms: Option<u64>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent.to_string());
        if let Some(ms) = timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::SourceResolutionError(format!("Failed to fetch {}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| Error::SourceResolutionError(format!("Failed to fetch {}: {}", url, e)))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::SourceResolutionError(format!("Failed to read body of {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

/// Resolve a source to raw bytes: one fetch for remote sources, a file read
/// for local ones.
pub async fn resolve<F: Fetcher>(source: &ImageSource, fetcher: &F) -> Result<Vec<u8>> {
    match source {
        ImageSource::Remote(url) => {
            debug!("fetching source image {}", url);
            fetcher.fetch(url).await
        }
        ImageSource::Local { path, .. } => {
            debug!("reading source image {}", path.display());
            tokio::fs::read(path).await.map_err(|e| {
                Error::SourceResolutionError(format!("Failed to read {}: {}", path.display(), e))
            })
        }
    }
}
