//! # rebundle
//!
//! Rebundle media streams — combine and extract audio/video tracks
//! across containers without re-encoding, and stream remote media to
//! disk.
//!
//! `rebundle` is a track-selective remuxer: it locates elementary
//! streams inside compressed container files and copies their samples —
//! byte-for-byte, with their original timestamps and key-frame flags —
//! into a new output container. No codec work happens anywhere; the
//! engine only understands container structure. Container I/O is
//! performed by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate, behind a
//! small capability interface that any container library can implement.
//!
//! ## Quick Start
//!
//! ### Combine video and audio from separate files
//!
//! ```no_run
//! use rebundle::Combiner;
//!
//! // First video track of one file + first audio track of another.
//! Combiner::new("video.mp4", "audio.m4a", "output.mp4")?.run()?;
//! # Ok::<(), rebundle::RebundleError>(())
//! ```
//!
//! ### Extract the audio track of a movie
//!
//! ```no_run
//! use rebundle::AudioExtractor;
//!
//! AudioExtractor::new("movie.mp4", "soundtrack.m4a")?.run()?;
//! # Ok::<(), rebundle::RebundleError>(())
//! ```
//!
//! ### Download a remote resource to disk
//!
//! ```no_run
//! use rebundle::Downloader;
//!
//! let bytes = Downloader::new("https://example.com/clip.mp4", "media/clip.mp4")?.run()?;
//! println!("wrote {bytes} bytes");
//! # Ok::<(), rebundle::RebundleError>(())
//! ```
//!
//! ## Features
//!
//! - **Combine** — first video track of file A + first audio track of
//!   file B, interleave-written into one container
//! - **Extract** — first audio track of a file into an audio-only
//!   container
//! - **Verbatim copying** — samples keep their exact bytes, order,
//!   timestamps, and key-frame flags; a fixed 1 MiB transfer buffer
//!   bounds per-sample size
//! - **Streaming download** — HTTP(S) to disk through a fixed 8 KiB
//!   buffer, redirects followed, without buffering the payload
//! - **Pluggable container backend** — the [`DemuxSource`] / [`MuxSink`]
//!   traits decouple orchestration from FFmpeg; an in-memory backend
//!   ships for tests and benchmarks
//! - **Progress reporting** — cooperative [`ProgressCallback`] for copy
//!   and download loops
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `combine_async`, `extract_audio_async`, and `download_async` futures via Tokio blocking tasks |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system for the
//! default container backend.

pub mod container;
pub mod copy;
pub mod error;
pub mod fetch;
pub mod ffmpeg;
pub mod memory;
pub mod progress;
pub mod remux;
#[cfg(feature = "async")]
pub mod task;

pub use container::{
    DemuxSource, MediaKind, MuxSink, Sample, SinkPhase, TrackHandle, TrackInfo, find_first_track,
};
pub use copy::{CopyStats, TRANSFER_BUFFER_CAPACITY, copy_track_samples};
pub use error::RebundleError;
pub use fetch::{Downloader, FETCH_BUFFER_SIZE, FetchOptions};
pub use ffmpeg::{
    FfmpegDemuxer, FfmpegLogLevel, FfmpegMuxer, get_ffmpeg_log_level, set_ffmpeg_log_level,
};
pub use memory::{MemoryDemuxer, MemoryMuxer, MemorySample, RecordedWrite};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use remux::{
    AudioExtractor, Combiner, RemuxOptions, RemuxReport, combine_tracks, extract_audio_track,
};
#[cfg(feature = "async")]
pub use task::{FetchFuture, MuxFuture, combine_async, download_async, extract_audio_async};
