//! Error types for the `rebundle` crate.
//!
//! This module defines [`RebundleError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose the problem without additional logging at the call site: file
//! paths, HTTP status codes, sample sizes, and upstream error messages.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

use crate::container::SinkPhase;

/// The unified error type for all `rebundle` operations.
///
/// Every public method that can fail returns `Result<T, RebundleError>`.
/// Variants are grouped by where in an invocation the failure occurs:
/// argument validation, opening and inspecting sources, copying samples,
/// finalizing the sink, or the network transport of a download.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RebundleError {
    /// A required argument was missing or empty.
    ///
    /// Detected before any resource is opened; no side effects occur.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The media file could not be opened or parsed as a container.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the open call.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source does not contain a video track.
    #[error("No video track found in source container")]
    NoVideoTrack,

    /// The source does not contain an audio track.
    #[error("No audio track found in source container")]
    NoAudioTrack,

    /// A track index does not exist in the source, or a sink track handle
    /// was not issued by this sink.
    #[error("Track {index} is out of range (container has {count} tracks)")]
    UnknownTrack {
        /// The requested track index.
        index: usize,
        /// Number of tracks the container actually has.
        count: usize,
    },

    /// A sample was requested before any track was selected for reading.
    #[error("No track selected for reading")]
    TrackNotSelected,

    /// A sample exceeds the fixed transfer buffer capacity.
    ///
    /// The transfer buffer is a hard per-sample size ceiling; an oversized
    /// sample fails the invocation rather than being truncated.
    #[error("Sample of {len} bytes exceeds the {capacity}-byte transfer buffer")]
    SampleTooLarge {
        /// The size of the offending sample.
        len: usize,
        /// The transfer buffer capacity.
        capacity: usize,
    },

    /// A mux sink operation was attempted in the wrong lifecycle phase,
    /// e.g. adding a track after writing started.
    #[error("Mux sink is in the {actual:?} phase, expected {expected:?}")]
    SinkState {
        /// The phase the operation requires.
        expected: SinkPhase,
        /// The phase the sink is actually in.
        actual: SinkPhase,
    },

    /// An error originating from the container library (demux, mux, or
    /// finalize failure).
    #[error("Container error: {0}")]
    ContainerError(String),

    /// The server answered a download request with a non-success status.
    #[error("HTTP {status}: {reason}")]
    HttpStatus {
        /// The numeric HTTP status code.
        status: u16,
        /// The reason phrase for the status.
        reason: String,
    },

    /// A transport-level download failure: DNS resolution, connect or
    /// read timeout, TLS, or a protocol error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// A worker task running an invocation panicked or was aborted.
    #[cfg(feature = "async")]
    #[error("Worker task failed: {0}")]
    WorkerFailed(String),
}

impl From<FfmpegError> for RebundleError {
    fn from(error: FfmpegError) -> Self {
        RebundleError::ContainerError(error.to_string())
    }
}

impl From<reqwest::Error> for RebundleError {
    fn from(error: reqwest::Error) -> Self {
        RebundleError::Transport(error.to_string())
    }
}
