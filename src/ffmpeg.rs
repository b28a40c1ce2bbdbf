//! FFmpeg-backed container demuxing and muxing.
//!
//! [`FfmpegDemuxer`] and [`FfmpegMuxer`] implement the
//! [`DemuxSource`](crate::DemuxSource) / [`MuxSink`](crate::MuxSink)
//! capability traits over the FFmpeg libraries via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate. They are
//! the default backend used by [`Combiner`](crate::Combiner) and
//! [`AudioExtractor`](crate::AudioExtractor); codec parameters travel
//! through as [`ffmpeg_next::codec::Parameters`] without inspection.
//!
//! The module also provides a thin wrapper around FFmpeg's own log-level
//! API ([`FfmpegLogLevel`], [`set_ffmpeg_log_level`]) so users can
//! silence or tune FFmpeg's stderr output without importing
//! `ffmpeg-next` directly. This controls FFmpeg's console output, not
//! the Rust-side diagnostics emitted via the `log` crate.

use std::path::{Path, PathBuf};

use ffmpeg_next::util::log::Level;
use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational, codec::Id, codec::Parameters, encoder,
    format::context::Input, format::context::Output, media::Type, packet::Flags,
};

use crate::container::{DemuxSource, MuxSink, Sample, SinkPhase, TrackHandle, TrackInfo};
use crate::error::RebundleError;

/// Timestamps cross the capability boundary in microseconds.
const MICROSECOND_TIME_BASE: Rational = Rational(1, 1_000_000);

fn classify_stream(medium: Type, codec_id: Id) -> String {
    let codec = match codec_id.name() {
        "" => "unknown",
        name => name,
    };
    match medium {
        Type::Video => format!("video/{codec}"),
        Type::Audio => format!("audio/{codec}"),
        Type::Subtitle => format!("text/{codec}"),
        _ => format!("application/{codec}"),
    }
}

/// Rescale a stream timestamp to microseconds without f64 rounding.
fn to_micros(ts: i64, time_base: Rational) -> i64 {
    let num = i128::from(ts) * i128::from(time_base.numerator()) * 1_000_000;
    let den = i128::from(time_base.denominator().max(1));
    (num / den) as i64
}

/// A demultiplexer over one container file, backed by FFmpeg.
///
/// Opening a file probes its streams and caches one [`TrackInfo`] row
/// per stream. Samples are read strictly in demuxer emission order;
/// packets belonging to unselected streams are skipped. All FFmpeg
/// resources are released when the demuxer is dropped.
pub struct FfmpegDemuxer {
    input: Input,
    tracks: Vec<TrackInfo>,
    time_bases: Vec<Rational>,
    selected: Option<usize>,
    done: bool,
    #[allow(dead_code)]
    path: PathBuf,
}

impl FfmpegDemuxer {
    /// Open a container file for demuxing.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, and probes its
    /// track list.
    ///
    /// # Errors
    ///
    /// Returns [`RebundleError::FileOpen`] if the file cannot be opened
    /// or parsed as a container.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RebundleError> {
        let path = path.as_ref().to_path_buf();

        ffmpeg_next::init().map_err(|error| RebundleError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| RebundleError::FileOpen {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        let mut tracks = Vec::new();
        let mut time_bases = Vec::new();
        for stream in input.streams() {
            let parameters = stream.parameters();
            let media_type = classify_stream(parameters.medium(), parameters.id());
            tracks.push(TrackInfo::new(stream.index(), media_type));
            time_bases.push(stream.time_base());
        }

        log::debug!("opened {} with {} tracks", path.display(), tracks.len());

        Ok(Self {
            input,
            tracks,
            time_bases,
            selected: None,
            done: false,
            path,
        })
    }
}

impl DemuxSource for FfmpegDemuxer {
    type Format = Parameters;

    fn tracks(&self) -> &[TrackInfo] {
        &self.tracks
    }

    fn track_format(&self, index: usize) -> Result<Parameters, RebundleError> {
        let stream = self.input.stream(index).ok_or(RebundleError::UnknownTrack {
            index,
            count: self.tracks.len(),
        })?;
        Ok(stream.parameters())
    }

    fn select_track(&mut self, index: usize) -> Result<(), RebundleError> {
        if index >= self.tracks.len() {
            return Err(RebundleError::UnknownTrack {
                index,
                count: self.tracks.len(),
            });
        }
        self.selected = Some(index);
        Ok(())
    }

    fn read_sample(&mut self, buffer: &mut [u8]) -> Result<Option<Sample>, RebundleError> {
        let selected = self.selected.ok_or(RebundleError::TrackNotSelected)?;
        if self.done {
            return Ok(None);
        }

        loop {
            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() != selected {
                        continue;
                    }

                    let data = packet
                        .data()
                        .ok_or_else(|| RebundleError::ContainerError("empty packet".into()))?;
                    if data.len() > buffer.len() {
                        return Err(RebundleError::SampleTooLarge {
                            len: data.len(),
                            capacity: buffer.len(),
                        });
                    }
                    buffer[..data.len()].copy_from_slice(data);

                    let time_base = self
                        .time_bases
                        .get(selected)
                        .copied()
                        .unwrap_or(Rational(1, 90_000));
                    let pts = packet.pts().or_else(|| packet.dts()).unwrap_or(0);

                    return Ok(Some(Sample {
                        len: data.len(),
                        pts_us: to_micros(pts, time_base),
                        is_keyframe: packet.is_key(),
                    }));
                }
                Err(FfmpegError::Eof) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(error) => {
                    self.done = true;
                    return Err(RebundleError::from(error));
                }
            }
        }
    }
}

/// A multiplexer writing one destination container, backed by FFmpeg.
///
/// The output format is inferred from the destination file extension.
/// Samples are written through FFmpeg's interleaving writer, which
/// orders packets across streams by timestamp, so callers may drain one
/// track completely before the next. Dropping an unfinalized muxer
/// abandons the output file; its content is then unspecified.
pub struct FfmpegMuxer {
    output: Output,
    phase: SinkPhase,
    track_count: usize,
    #[allow(dead_code)]
    path: PathBuf,
}

impl FfmpegMuxer {
    /// Create a destination container file for muxing.
    ///
    /// # Errors
    ///
    /// Returns [`RebundleError::FileOpen`] if the output cannot be
    /// created or the extension maps to no known container format.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, RebundleError> {
        let path = path.as_ref().to_path_buf();

        ffmpeg_next::init().map_err(|error| RebundleError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let output = ffmpeg_next::format::output(&path).map_err(|error| RebundleError::FileOpen {
            path: path.clone(),
            reason: format!("Failed to create output: {error}"),
        })?;

        Ok(Self {
            output,
            phase: SinkPhase::Building,
            track_count: 0,
            path,
        })
    }

    fn expect_phase(&self, expected: SinkPhase) -> Result<(), RebundleError> {
        if self.phase != expected {
            return Err(RebundleError::SinkState {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }
}

impl MuxSink for FfmpegMuxer {
    type Format = Parameters;

    fn add_track(&mut self, format: &Parameters) -> Result<TrackHandle, RebundleError> {
        self.expect_phase(SinkPhase::Building)?;

        let mut stream = self.output.add_stream(encoder::find(Id::None))?;
        stream.set_parameters(format.clone());
        // Reset the codec tag so the output muxer picks its own.
        unsafe {
            (*stream.parameters().as_mut_ptr()).codec_tag = 0;
        }

        let handle = TrackHandle::new(self.track_count);
        self.track_count += 1;
        Ok(handle)
    }

    fn start(&mut self) -> Result<(), RebundleError> {
        self.expect_phase(SinkPhase::Building)?;
        self.output.write_header()?;
        self.phase = SinkPhase::Writing;
        Ok(())
    }

    fn write_sample(
        &mut self,
        track: TrackHandle,
        data: &[u8],
        sample: &Sample,
    ) -> Result<(), RebundleError> {
        self.expect_phase(SinkPhase::Writing)?;

        let index = track.index();
        let time_base = self
            .output
            .stream(index)
            .ok_or(RebundleError::UnknownTrack {
                index,
                count: self.track_count,
            })?
            .time_base();

        let mut packet = Packet::copy(data);
        packet.set_stream(index);
        packet.set_pts(Some(sample.pts_us));
        // The capability contract carries presentation time only; the
        // decode timestamp is derived from it, as the original sample
        // metadata does not distinguish the two.
        packet.set_dts(Some(sample.pts_us));
        if sample.is_keyframe {
            packet.set_flags(Flags::KEY);
        }
        packet.rescale_ts(MICROSECOND_TIME_BASE, time_base);
        packet.set_position(-1);
        packet.write_interleaved(&mut self.output)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), RebundleError> {
        self.expect_phase(SinkPhase::Writing)?;
        self.output.write_trailer()?;
        self.phase = SinkPhase::Closed;
        log::debug!("finalized {}", self.path.display());
        Ok(())
    }
}

/// FFmpeg internal log verbosity level.
///
/// Maps directly to FFmpeg's `AV_LOG_*` constants. Setting a level causes
/// FFmpeg to suppress all messages below that severity.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log when a condition that cannot be recovered from is
    /// encountered and the process will abort.
    Panic,
    /// Only log when an unrecoverable error is encountered.
    Fatal,
    /// Log recoverable errors.
    Error,
    /// Log warnings (default FFmpeg level).
    Warning,
    /// Log informational messages.
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }

    fn from_ffmpeg_level(level: Level) -> Self {
        match level {
            Level::Quiet => FfmpegLogLevel::Quiet,
            Level::Panic => FfmpegLogLevel::Panic,
            Level::Fatal => FfmpegLogLevel::Fatal,
            Level::Error => FfmpegLogLevel::Error,
            Level::Warning => FfmpegLogLevel::Warning,
            Level::Info => FfmpegLogLevel::Info,
            Level::Verbose => FfmpegLogLevel::Verbose,
            Level::Debug => FfmpegLogLevel::Debug,
            Level::Trace => FfmpegLogLevel::Trace,
        }
    }
}

/// Set the FFmpeg internal log verbosity level.
///
/// This controls what FFmpeg prints to stderr. It does **not** affect
/// Rust-side `log` crate output.
///
/// # Example
///
/// ```no_run
/// use rebundle::FfmpegLogLevel;
///
/// // Only show errors and above.
/// rebundle::set_ffmpeg_log_level(FfmpegLogLevel::Error);
/// ```
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Get the current FFmpeg internal log verbosity level.
///
/// Returns `None` if the current level does not map to a known variant.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .map(FfmpegLogLevel::from_ffmpeg_level)
}
