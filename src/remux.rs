//! Track-selective remuxing (combine and extract).
//!
//! This module provides the two remux orchestrations of the crate:
//!
//! - [`Combiner`] takes the first video track of one file and the first
//!   audio track of another and writes both into a single output
//!   container.
//! - [`AudioExtractor`] takes the first audio track of one file and
//!   writes it alone into an audio-only output container.
//!
//! Neither operation touches codec data: compressed samples are copied
//! verbatim with their timestamps and flags, equivalent to
//! `ffmpeg -i v.mp4 -i a.mp4 -map 0:v:0 -map 1:a:0 -c copy out.mp4`.
//!
//! Both are thin path-level drivers over the generic engine functions
//! [`combine_tracks`] and [`extract_audio_track`], which accept any
//! [`DemuxSource`] / [`MuxSink`] implementation pair.
//!
//! # Example
//!
//! ```no_run
//! use rebundle::Combiner;
//!
//! let report = Combiner::new("video.mp4", "audio.m4a", "output.mp4")?.run()?;
//! println!("copied {} video samples", report.video.unwrap().samples);
//! # Ok::<(), rebundle::RebundleError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::container::{DemuxSource, MediaKind, MuxSink, find_first_track};
use crate::copy::{CopyStats, TRANSFER_BUFFER_CAPACITY, copy_track_samples};
use crate::error::RebundleError;
use crate::ffmpeg::{FfmpegDemuxer, FfmpegMuxer};
use crate::progress::{NoOpProgress, OperationType, ProgressCallback};

/// Options threaded through remux operations.
///
/// Carries the progress callback and its cadence. A default-constructed
/// value reports nothing.
#[derive(Clone)]
pub struct RemuxOptions {
    progress: Arc<dyn ProgressCallback>,
    batch_size: u64,
}

impl std::fmt::Debug for RemuxOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemuxOptions")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for RemuxOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RemuxOptions {
    /// Create options with default settings: no progress callback,
    /// batch size 64.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            batch_size: 64,
        }
    }

    /// Attach a progress callback, invoked every
    /// [`batch_size`](RemuxOptions::with_batch_size) samples per track.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires (every N samples).
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub(crate) fn progress(&self) -> &dyn ProgressCallback {
        self.progress.as_ref()
    }

    pub(crate) fn batch_size(&self) -> u64 {
        self.batch_size
    }
}

/// Per-track totals of a completed remux operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemuxReport {
    /// Stats for the copied video track, if the operation carried one.
    pub video: Option<CopyStats>,
    /// Stats for the copied audio track, if the operation carried one.
    pub audio: Option<CopyStats>,
}

/// Combine the first video track of `video_source` with the first audio
/// track of `audio_source` into `sink`.
///
/// The sink must be freshly created (in its `Building` phase). The
/// sequence is: locate both tracks, select them for reading, add both
/// format descriptors to the sink, start the sink, drain the video track
/// completely, then the audio track, through one shared transfer buffer,
/// and finalize.
///
/// The copier performs no timestamp-based merging across the two tracks;
/// the sink places samples by their timestamp-tagged write calls.
///
/// # Errors
///
/// Returns [`RebundleError::NoVideoTrack`] / [`RebundleError::NoAudioTrack`]
/// when a source lacks a matching track, and propagates read, write, and
/// finalize failures. On any failure the sink is left unfinalized; the
/// output's content is unspecified. Sources and sink are released when
/// the caller drops them.
pub fn combine_tracks<V, A, M>(
    video_source: &mut V,
    audio_source: &mut A,
    sink: &mut M,
    options: &RemuxOptions,
) -> Result<RemuxReport, RebundleError>
where
    V: DemuxSource,
    A: DemuxSource<Format = V::Format>,
    M: MuxSink<Format = V::Format>,
{
    let video_track = find_first_track(video_source.tracks(), MediaKind::Video)
        .ok_or(RebundleError::NoVideoTrack)?
        .index;
    let audio_track = find_first_track(audio_source.tracks(), MediaKind::Audio)
        .ok_or(RebundleError::NoAudioTrack)?
        .index;

    let video_format = video_source.track_format(video_track)?;
    let audio_format = audio_source.track_format(audio_track)?;

    video_source.select_track(video_track)?;
    audio_source.select_track(audio_track)?;

    let video_handle = sink.add_track(&video_format)?;
    let audio_handle = sink.add_track(&audio_format)?;
    sink.start()?;

    let mut buffer = vec![0u8; TRANSFER_BUFFER_CAPACITY];
    let video_stats = copy_track_samples(
        video_source,
        sink,
        video_handle,
        &mut buffer,
        OperationType::Combine,
        options,
    )?;
    let audio_stats = copy_track_samples(
        audio_source,
        sink,
        audio_handle,
        &mut buffer,
        OperationType::Combine,
        options,
    )?;

    sink.finalize()?;

    Ok(RemuxReport {
        video: Some(video_stats),
        audio: Some(audio_stats),
    })
}

/// Extract the first audio track of `source` into `sink` as the only
/// track.
///
/// Same shape as [`combine_tracks`] restricted to a single source and a
/// single audio track.
///
/// # Errors
///
/// Returns [`RebundleError::NoAudioTrack`] when the source has no audio
/// track; propagates read, write, and finalize failures.
pub fn extract_audio_track<S, M>(
    source: &mut S,
    sink: &mut M,
    options: &RemuxOptions,
) -> Result<RemuxReport, RebundleError>
where
    S: DemuxSource,
    M: MuxSink<Format = S::Format>,
{
    let audio_track = find_first_track(source.tracks(), MediaKind::Audio)
        .ok_or(RebundleError::NoAudioTrack)?
        .index;

    let format = source.track_format(audio_track)?;
    source.select_track(audio_track)?;

    let handle = sink.add_track(&format)?;
    sink.start()?;

    let mut buffer = vec![0u8; TRANSFER_BUFFER_CAPACITY];
    let stats = copy_track_samples(
        source,
        sink,
        handle,
        &mut buffer,
        OperationType::AudioExtract,
        options,
    )?;

    sink.finalize()?;

    Ok(RemuxReport {
        video: None,
        audio: Some(stats),
    })
}

fn validate_path(path: &Path, what: &str) -> Result<(), RebundleError> {
    if path.as_os_str().is_empty() {
        return Err(RebundleError::InvalidArgument(format!(
            "{what} path is empty"
        )));
    }
    Ok(())
}

/// Combines a video track and an audio track into one output container.
///
/// Selects the first video-type track from the video source and the
/// first audio-type track from the audio source — the two inputs need
/// not share a container format — and writes both into a new container
/// at the output path, copying compressed samples verbatim.
///
/// # Example
///
/// ```no_run
/// use rebundle::Combiner;
///
/// Combiner::new("video.mp4", "audio.m4a", "output.mp4")?.run()?;
/// # Ok::<(), rebundle::RebundleError>(())
/// ```
pub struct Combiner {
    video_path: PathBuf,
    audio_path: PathBuf,
    output_path: PathBuf,
    options: RemuxOptions,
}

impl Combiner {
    /// Create a combiner for the given source and output paths.
    ///
    /// # Errors
    ///
    /// Returns [`RebundleError::InvalidArgument`] if any path is empty.
    /// Sources are not opened until [`run`](Combiner::run).
    pub fn new<P1, P2, P3>(video: P1, audio: P2, output: P3) -> Result<Self, RebundleError>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let video_path = video.as_ref().to_path_buf();
        let audio_path = audio.as_ref().to_path_buf();
        let output_path = output.as_ref().to_path_buf();

        validate_path(&video_path, "video source")?;
        validate_path(&audio_path, "audio source")?;
        validate_path(&output_path, "output")?;

        Ok(Self {
            video_path,
            audio_path,
            output_path,
            options: RemuxOptions::new(),
        })
    }

    /// Replace the default options.
    #[must_use]
    pub fn with_options(mut self, options: RemuxOptions) -> Self {
        self.options = options;
        self
    }

    /// Execute the combine operation.
    ///
    /// Opens both sources and the sink, runs [`combine_tracks`], and
    /// returns the per-track totals. All handles are released on every
    /// exit path; on failure the output file's content is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`RebundleError::FileOpen`] if a source or the output
    /// cannot be opened, [`RebundleError::NoVideoTrack`] /
    /// [`RebundleError::NoAudioTrack`] if a source lacks a matching
    /// track, and [`RebundleError::ContainerError`] for demux, mux, or
    /// finalize failures.
    pub fn run(&self) -> Result<RemuxReport, RebundleError> {
        log::debug!(
            "combining {} + {} -> {}",
            self.video_path.display(),
            self.audio_path.display(),
            self.output_path.display()
        );

        let mut video_source = FfmpegDemuxer::open(&self.video_path)?;
        let mut audio_source = FfmpegDemuxer::open(&self.audio_path)?;
        let mut sink = FfmpegMuxer::create(&self.output_path)?;

        combine_tracks(&mut video_source, &mut audio_source, &mut sink, &self.options)
    }
}

/// Extracts the first audio track of a media file into an audio-only
/// container.
///
/// # Example
///
/// ```no_run
/// use rebundle::AudioExtractor;
///
/// AudioExtractor::new("movie.mp4", "soundtrack.m4a")?.run()?;
/// # Ok::<(), rebundle::RebundleError>(())
/// ```
pub struct AudioExtractor {
    input_path: PathBuf,
    output_path: PathBuf,
    options: RemuxOptions,
}

impl AudioExtractor {
    /// Create an extractor for the given input and output paths.
    ///
    /// # Errors
    ///
    /// Returns [`RebundleError::InvalidArgument`] if a path is empty.
    pub fn new<P1, P2>(input: P1, output: P2) -> Result<Self, RebundleError>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        let input_path = input.as_ref().to_path_buf();
        let output_path = output.as_ref().to_path_buf();

        validate_path(&input_path, "input")?;
        validate_path(&output_path, "output")?;

        Ok(Self {
            input_path,
            output_path,
            options: RemuxOptions::new(),
        })
    }

    /// Replace the default options.
    #[must_use]
    pub fn with_options(mut self, options: RemuxOptions) -> Self {
        self.options = options;
        self
    }

    /// Execute the extraction.
    ///
    /// # Errors
    ///
    /// Returns [`RebundleError::NoAudioTrack`] if the input has no audio
    /// track; otherwise as [`Combiner::run`].
    pub fn run(&self) -> Result<RemuxReport, RebundleError> {
        log::debug!(
            "extracting audio from {} -> {}",
            self.input_path.display(),
            self.output_path.display()
        );

        let mut source = FfmpegDemuxer::open(&self.input_path)?;

        // The sink is only created once a matching track is known to
        // exist, so a trackless input never produces an output file.
        if find_first_track(source.tracks(), MediaKind::Audio).is_none() {
            return Err(RebundleError::NoAudioTrack);
        }

        let mut sink = FfmpegMuxer::create(&self.output_path)?;
        extract_audio_track(&mut source, &mut sink, &self.options)
    }
}
