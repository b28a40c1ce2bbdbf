//! Container data model and demux/mux capability traits.
//!
//! This module defines the small vocabulary the remux engine speaks:
//! [`TrackInfo`] rows describing the tracks of an open container,
//! transient [`Sample`] descriptors for one unit of compressed data, and
//! the [`DemuxSource`] / [`MuxSink`] traits that any concrete container
//! library can implement to plug into the engine. The engine itself never
//! inspects codec bitstreams — samples are copied verbatim, and codec
//! parameters travel through the opaque `Format` associated type.
//!
//! Two implementations ship with the crate: [`FfmpegDemuxer` /
//! `FfmpegMuxer`](crate::ffmpeg) over real container files, and
//! [`MemoryDemuxer` / `MemoryMuxer`](crate::memory) over synthetic
//! in-memory track tables.

use crate::error::RebundleError;

/// Broad classification of a track's media type.
///
/// Derived from the track's media-type string by prefix: `video/…` is
/// [`Video`](MediaKind::Video), `audio/…` is [`Audio`](MediaKind::Audio),
/// anything else (subtitles, data, attachments) is
/// [`Other`](MediaKind::Other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// A video elementary stream.
    Video,
    /// An audio elementary stream.
    Audio,
    /// Any other stream kind (subtitles, data, attachments).
    Other,
}

impl MediaKind {
    /// Classify a media-type string by its type prefix.
    pub fn classify(media_type: &str) -> Self {
        if media_type.starts_with("video/") {
            MediaKind::Video
        } else if media_type.starts_with("audio/") {
            MediaKind::Audio
        } else {
            MediaKind::Other
        }
    }
}

/// Descriptor for a single track within a demux source.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    /// Index of the track within its container, in declaration order.
    pub index: usize,
    /// The track's media-type string, e.g. `video/h264` or `audio/aac`.
    pub media_type: String,
    /// Classification of `media_type` by prefix.
    pub kind: MediaKind,
}

impl TrackInfo {
    /// Create a track descriptor, classifying the media type by prefix.
    pub fn new(index: usize, media_type: impl Into<String>) -> Self {
        let media_type = media_type.into();
        let kind = MediaKind::classify(&media_type);
        Self {
            index,
            media_type,
            kind,
        }
    }
}

/// Metadata for one sample sitting in the transfer buffer.
///
/// A `Sample` describes bytes placed at offset 0 of the caller's buffer by
/// [`DemuxSource::read_sample`]. It is transient: the described bytes are
/// valid only until the next read into the same buffer, so a sample must
/// be written to its sink before the copy loop advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Number of valid bytes at the start of the transfer buffer.
    pub len: usize,
    /// Presentation timestamp in microseconds, monotonic non-decreasing
    /// within a track.
    pub pts_us: i64,
    /// Whether this sample is a key frame / sync point.
    pub is_keyframe: bool,
}

/// Handle to a track added to a [`MuxSink`].
///
/// Returned by [`MuxSink::add_track`] and stable for the lifetime of the
/// sink; every subsequent [`MuxSink::write_sample`] for that track passes
/// the same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackHandle(usize);

impl TrackHandle {
    /// Create a handle wrapping a sink-side track index.
    ///
    /// Only sink implementations should mint handles; callers treat them
    /// as opaque.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The sink-side track index this handle refers to.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lifecycle phase of a [`MuxSink`].
///
/// A sink starts in `Building`, moves to `Writing` exactly once via
/// [`MuxSink::start`], and ends in `Closed` via [`MuxSink::finalize`].
/// Operations attempted in the wrong phase fail with
/// [`RebundleError::SinkState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkPhase {
    /// Tracks may be added; no samples may be written.
    Building,
    /// Samples may be written; no more tracks may be added.
    Writing,
    /// Finalized; the sink accepts nothing further.
    Closed,
}

/// An open demultiplexer over one container file.
///
/// Implementations own whatever underlying resources the container
/// library needs and release them on drop, so a source opened by an
/// invocation is freed on every exit path, including early failure.
///
/// Tracks are read at most once per source, strictly in the order samples
/// are emitted by the underlying demultiplexer; there is no seeking.
pub trait DemuxSource {
    /// Opaque codec parameter descriptor, passed through verbatim to a
    /// [`MuxSink`] with a matching `Format` type.
    type Format;

    /// The container's tracks, ordered by ascending index.
    fn tracks(&self) -> &[TrackInfo];

    /// The codec format descriptor of the track at `index`.
    fn track_format(&self, index: usize) -> Result<Self::Format, RebundleError>;

    /// Select the track whose samples subsequent
    /// [`read_sample`](DemuxSource::read_sample) calls will return.
    ///
    /// Selection is separate from location: callers locate a track via
    /// [`find_first_track`] first, then select it for reading.
    fn select_track(&mut self, index: usize) -> Result<(), RebundleError>;

    /// Read the next sample of the selected track into `buffer` at offset
    /// 0 and advance the read cursor.
    ///
    /// Returns `Ok(None)` when the track is exhausted — the normal
    /// termination condition, not an error. Fails with
    /// [`RebundleError::SampleTooLarge`] if the sample does not fit in
    /// `buffer`, and with [`RebundleError::TrackNotSelected`] if no track
    /// has been selected.
    fn read_sample(&mut self, buffer: &mut [u8]) -> Result<Option<Sample>, RebundleError>;
}

/// An open multiplexer writing one destination container.
///
/// The sink moves through the [`SinkPhase`] lifecycle: add all tracks
/// while `Building`, call [`start`](MuxSink::start) exactly once, write
/// samples while `Writing`, then [`finalize`](MuxSink::finalize) to close
/// the container durably. Dropping an unfinalized sink abandons the
/// output; the file's content is then unspecified.
///
/// Implementations must tolerate track-sequential writes (one track
/// drained completely, then the next) and perform any container-level
/// interleaving themselves from the timestamps on each write.
pub trait MuxSink {
    /// Opaque codec parameter descriptor accepted from a matching
    /// [`DemuxSource`].
    type Format;

    /// Add a track with the given format descriptor.
    ///
    /// Only valid in the `Building` phase. The returned handle is stable
    /// for the sink's lifetime.
    fn add_track(&mut self, format: &Self::Format) -> Result<TrackHandle, RebundleError>;

    /// Transition `Building` → `Writing`. Valid exactly once, after all
    /// tracks are added.
    fn start(&mut self) -> Result<(), RebundleError>;

    /// Write one sample's bytes under the given track handle, tagged with
    /// the sample's timestamp and flags. Only valid in the `Writing`
    /// phase, only for handles this sink issued.
    fn write_sample(
        &mut self,
        track: TrackHandle,
        data: &[u8],
        sample: &Sample,
    ) -> Result<(), RebundleError>;

    /// Transition `Writing` → `Closed`, durably flushing the container.
    fn finalize(&mut self) -> Result<(), RebundleError>;
}

/// Find the first track of the wanted kind.
///
/// Scans `tracks` in ascending index order and returns the first track
/// whose media type matches `wanted`; `None` if no track matches.
/// Deterministic and side-effect-free — locating a track does not select
/// it for reading.
///
/// # Example
///
/// ```
/// use rebundle::{MediaKind, TrackInfo, find_first_track};
///
/// let tracks = vec![
///     TrackInfo::new(0, "video/h264"),
///     TrackInfo::new(1, "audio/aac"),
///     TrackInfo::new(2, "audio/opus"),
/// ];
///
/// let audio = find_first_track(&tracks, MediaKind::Audio).unwrap();
/// assert_eq!(audio.index, 1);
/// ```
pub fn find_first_track(tracks: &[TrackInfo], wanted: MediaKind) -> Option<&TrackInfo> {
    tracks.iter().find(|track| track.kind == wanted)
}
