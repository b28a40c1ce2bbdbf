//! Async task wrappers for remux and download invocations.
//!
//! Every operation in this crate is internally synchronous: the
//! demux-read/mux-write loop and the network-read/file-write loop are
//! ordinary sequential blocking calls. This module places one invocation
//! on a dedicated blocking thread via `tokio::task::spawn_blocking` and
//! hands the caller a future resolving to the single result, so an async
//! caller is never blocked for the duration of a multi-second I/O-bound
//! operation.
//!
//! Invocations are not cancellable mid-flight: dropping a future detaches
//! it, but the worker runs its invocation to completion.
//!
//! # Example
//!
//! ```no_run
//! use rebundle::{RemuxOptions, combine_async, RebundleError};
//!
//! # async fn example() -> Result<(), RebundleError> {
//! let report = combine_async(
//!     "video.mp4",
//!     "audio.m4a",
//!     "output.mp4",
//!     RemuxOptions::new(),
//! )
//! .await?;
//! println!("copied {} video samples", report.video.unwrap().samples);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::RebundleError;
use crate::fetch::{Downloader, FetchOptions};
use crate::remux::{AudioExtractor, Combiner, RemuxOptions, RemuxReport};

fn join_to_result<T>(
    joined: Result<Result<T, RebundleError>, tokio::task::JoinError>,
) -> Result<T, RebundleError> {
    match joined {
        Ok(result) => result,
        Err(error) => Err(RebundleError::WorkerFailed(error.to_string())),
    }
}

/// A future resolving to the [`RemuxReport`] of one remux invocation.
///
/// Created by [`combine_async`] or [`extract_audio_async`]. The actual
/// copying runs on a blocking thread; polling this future drives it to
/// completion. The result is delivered exactly once.
pub struct MuxFuture {
    handle: JoinHandle<Result<RemuxReport, RebundleError>>,
}

impl Future for MuxFuture {
    type Output = Result<RemuxReport, RebundleError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(join_to_result)
    }
}

/// A future resolving to the byte count of one download invocation.
///
/// Created by [`download_async`].
pub struct FetchFuture {
    handle: JoinHandle<Result<u64, RebundleError>>,
}

impl Future for FetchFuture {
    type Output = Result<u64, RebundleError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(join_to_result)
    }
}

/// Combine the first video track of `video` with the first audio track
/// of `audio` into `output` on a blocking worker thread.
///
/// Argument validation and all resource acquisition happen on the
/// worker, so errors surface through the returned future.
pub fn combine_async(
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: RemuxOptions,
) -> MuxFuture {
    let video: PathBuf = video.as_ref().to_path_buf();
    let audio: PathBuf = audio.as_ref().to_path_buf();
    let output: PathBuf = output.as_ref().to_path_buf();

    let handle = tokio::task::spawn_blocking(move || {
        Combiner::new(video, audio, output)?
            .with_options(options)
            .run()
    });

    MuxFuture { handle }
}

/// Extract the first audio track of `input` into `output` on a blocking
/// worker thread.
pub fn extract_audio_async(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: RemuxOptions,
) -> MuxFuture {
    let input: PathBuf = input.as_ref().to_path_buf();
    let output: PathBuf = output.as_ref().to_path_buf();

    let handle = tokio::task::spawn_blocking(move || {
        AudioExtractor::new(input, output)?
            .with_options(options)
            .run()
    });

    MuxFuture { handle }
}

/// Download `url` to `destination` on a blocking worker thread,
/// resolving to the total bytes written.
pub fn download_async(
    url: impl Into<String>,
    destination: impl AsRef<Path>,
    options: FetchOptions,
) -> FetchFuture {
    let url = url.into();
    let destination: PathBuf = destination.as_ref().to_path_buf();

    let handle = tokio::task::spawn_blocking(move || {
        Downloader::new(url, destination)?
            .with_options(options)
            .run()
    });

    FetchFuture { handle }
}
