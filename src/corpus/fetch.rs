use reqwest::{Client, ClientBuilder};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP error fetching {url}: {status}")]
    HttpError { url: String, status: u16 },
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("IO error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { bytes: u64 },
    /// The destination already existed and was kept.
    Cached,
}

/// Retrieves a remote resource into a local file.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        url: &Url,
        destination: &Path,
        overwrite: bool,
    ) -> impl Future<Output = Result<FetchOutcome, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30 * 60),
            connection_timeout: Duration::from_secs(10),
            user_agent: format!("langprint/{}", crate::VERSION),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FetchError::InvalidConfiguration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &Url,
        destination: &Path,
        overwrite: bool,
    ) -> Result<FetchOutcome, FetchError> {
        if !overwrite && tokio::fs::try_exists(destination).await.unwrap_or(false) {
            tracing::info!(path = %destination.display(), "Archive already downloaded, skipping");
            return Ok(FetchOutcome::Cached);
        }

        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| FetchError::Io { path, source }
        };
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_error(parent))?;
        }

        tracing::info!(url = %url, path = %destination.display(), "Downloading");
        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Stream into a sibling file so an interrupted download never looks complete.
        let mut partial = destination.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(io_error(&partial))?;

        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(io_error(&partial))?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error(&partial))?;
        drop(file);

        tokio::fs::rename(&partial, destination)
            .await
            .map_err(io_error(destination))?;

        tracing::info!(url = %url, bytes, "Download complete");
        Ok(FetchOutcome::Downloaded { bytes })
    }
}
