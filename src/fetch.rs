//! Streaming HTTP(S) downloads.
//!
//! This module provides [`Downloader`] for fetching a remote resource
//! and persisting it to disk incrementally: the response body is
//! streamed through a fixed [`FETCH_BUFFER_SIZE`] buffer, so the payload
//! is never held in memory, and the total byte count is returned on
//! success. The same read-buffer-write loop as the sample copier, with a
//! byte stream instead of a sample-structured stream and network
//! timeouts instead of end-of-track as the termination signal.
//!
//! # Example
//!
//! ```no_run
//! use rebundle::Downloader;
//!
//! let bytes = Downloader::new("https://example.com/clip.mp4", "media/clip.mp4")?.run()?;
//! println!("wrote {bytes} bytes");
//! # Ok::<(), rebundle::RebundleError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_ENCODING};

use crate::error::RebundleError;
use crate::progress::{NoOpProgress, OperationType, ProgressCallback, ProgressReporter};

/// Size of the network-to-disk transfer buffer: 8 KiB.
pub const FETCH_BUFFER_SIZE: usize = 8 * 1024;

/// Default connect timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default read timeout, sized for large payloads rather than
/// low-latency calls.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

fn default_user_agent() -> String {
    concat!("rebundle/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Options for a download.
///
/// All fields have fixed defaults matching the download contract: GET
/// with a `rebundle/<version>` user-agent, any content type accepted, no
/// response compression requested, redirects followed, 30 s connect
/// timeout, 300 s read timeout.
#[derive(Clone)]
pub struct FetchOptions {
    user_agent: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    progress: Arc<dyn ProgressCallback>,
    batch_size: u64,
}

impl std::fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOptions")
            .field("user_agent", &self.user_agent)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchOptions {
    /// Create options with the default settings.
    pub fn new() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            progress: Arc::new(NoOpProgress),
            batch_size: 32,
        }
    }

    /// Override the user-agent string sent with the request.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Attach a progress callback, invoked every
    /// [`batch_size`](FetchOptions::with_batch_size) buffer reads with
    /// the byte count written so far. The total is taken from the
    /// response's `Content-Length` when the server supplies one.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires (every N buffer
    /// reads). Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

/// Streams a remote resource to a file on disk.
///
/// The destination file is only created after the response status is
/// validated, so a failed request never truncates an existing file.
/// Parent directories of the destination are created as needed. A
/// download interrupted mid-copy leaves the destination in an
/// unspecified state — callers requiring atomicity should download to a
/// temporary path and rename on success.
pub struct Downloader {
    url: String,
    destination: PathBuf,
    options: FetchOptions,
}

impl Downloader {
    /// Create a downloader for the given URL and destination path.
    ///
    /// # Errors
    ///
    /// Returns [`RebundleError::InvalidArgument`] if the URL or the
    /// destination path is empty. The connection is not opened until
    /// [`run`](Downloader::run).
    pub fn new<P: AsRef<Path>>(url: impl Into<String>, destination: P) -> Result<Self, RebundleError> {
        let url = url.into();
        let destination = destination.as_ref().to_path_buf();

        if url.is_empty() {
            return Err(RebundleError::InvalidArgument("url is empty".to_string()));
        }
        if destination.as_os_str().is_empty() {
            return Err(RebundleError::InvalidArgument(
                "destination path is empty".to_string(),
            ));
        }

        Ok(Self {
            url,
            destination,
            options: FetchOptions::new(),
        })
    }

    /// Replace the default options.
    #[must_use]
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Execute the download and return the total bytes written.
    ///
    /// Opens the connection, validates the response status, then streams
    /// the body to the destination through the fixed transfer buffer.
    /// Redirects are followed transparently; only the final response
    /// body is counted.
    ///
    /// # Errors
    ///
    /// Returns [`RebundleError::HttpStatus`] for a non-2xx response
    /// (without touching the destination), [`RebundleError::Transport`]
    /// for DNS/connect/read failures and timeouts, and
    /// [`RebundleError::IoError`] for disk write failures.
    pub fn run(&self) -> Result<u64, RebundleError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&self.options.user_agent)
            .connect_timeout(self.options.connect_timeout)
            .read_timeout(self.options.read_timeout)
            // No total-request deadline: large payloads are bounded by
            // the read timeout between chunks instead.
            .timeout(None)
            .build()?;

        let mut response = client
            .get(self.url.as_str())
            .header(ACCEPT, "*/*")
            .header(ACCEPT_ENCODING, "identity")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RebundleError::HttpStatus {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        let total = response.content_length();
        log::debug!(
            "downloading {} -> {} ({} bytes expected)",
            self.url,
            self.destination.display(),
            total.map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        if let Some(parent) = self.destination.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&self.destination)?;

        let mut reporter = ProgressReporter::new(
            self.options.progress.as_ref(),
            OperationType::Download,
            total,
            self.options.batch_size,
        );
        let mut buffer = [0u8; FETCH_BUFFER_SIZE];
        let mut written: u64 = 0;

        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|error| RebundleError::Transport(error.to_string()))?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])?;
            written += read as u64;
            reporter.tick(written);
        }

        file.flush()?;
        reporter.finish(written);
        Ok(written)
    }
}
