//! In-memory container backend.
//!
//! [`MemoryDemuxer`] and [`MemoryMuxer`] implement the
//! [`DemuxSource`](crate::DemuxSource) / [`MuxSink`](crate::MuxSink)
//! capability traits over synthetic track and sample tables, with no
//! file or codec library involved. They exist for tests and benchmarks —
//! the muxer records every write so a test can assert that copying is a
//! faithful forwarding map — and double as a reference for plugging a
//! different container library into the engine.
//!
//! # Example
//!
//! ```
//! use rebundle::{
//!     MemoryDemuxer, MemoryMuxer, MemorySample, RemuxOptions, extract_audio_track,
//! };
//!
//! let mut source = MemoryDemuxer::new()
//!     .with_track("video/h264", vec![MemorySample::keyframe(vec![9; 16], 0)])
//!     .with_track("audio/aac", vec![
//!         MemorySample::new(vec![1, 2], 0),
//!         MemorySample::new(vec![3, 4], 21_333),
//!     ]);
//! let mut sink = MemoryMuxer::new();
//!
//! let report = extract_audio_track(&mut source, &mut sink, &RemuxOptions::new())?;
//! assert_eq!(report.audio.unwrap().samples, 2);
//! assert!(sink.is_finalized());
//! # Ok::<(), rebundle::RebundleError>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::container::{DemuxSource, MuxSink, Sample, SinkPhase, TrackHandle, TrackInfo};
use crate::error::RebundleError;

/// One synthetic sample held by a [`MemoryDemuxer`] track.
#[derive(Debug, Clone)]
pub struct MemorySample {
    /// Sample payload bytes.
    pub data: Vec<u8>,
    /// Presentation timestamp in microseconds.
    pub pts_us: i64,
    /// Whether the sample is a key frame.
    pub is_keyframe: bool,
}

impl MemorySample {
    /// Create a non-keyframe sample.
    pub fn new(data: Vec<u8>, pts_us: i64) -> Self {
        Self {
            data,
            pts_us,
            is_keyframe: false,
        }
    }

    /// Create a keyframe sample.
    pub fn keyframe(data: Vec<u8>, pts_us: i64) -> Self {
        Self {
            data,
            pts_us,
            is_keyframe: true,
        }
    }
}

/// A demultiplexer over synthetic in-memory tracks.
///
/// Build one with [`new`](MemoryDemuxer::new) and
/// [`with_track`](MemoryDemuxer::with_track); track indices are assigned
/// in insertion order. The opaque format descriptor of each track is its
/// media-type string.
pub struct MemoryDemuxer {
    tracks: Vec<TrackInfo>,
    samples: Vec<Vec<MemorySample>>,
    selected: Option<usize>,
    cursor: usize,
    open_gauge: Option<Arc<AtomicUsize>>,
}

impl Default for MemoryDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDemuxer {
    /// Create an empty demuxer with no tracks.
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            samples: Vec::new(),
            selected: None,
            cursor: 0,
            open_gauge: None,
        }
    }

    /// Append a track with the given media type and samples.
    #[must_use]
    pub fn with_track(mut self, media_type: &str, samples: Vec<MemorySample>) -> Self {
        let index = self.tracks.len();
        self.tracks.push(TrackInfo::new(index, media_type));
        self.samples.push(samples);
        self
    }

    /// Attach an open-handle gauge.
    ///
    /// The gauge is incremented now and decremented when the demuxer is
    /// dropped, letting tests assert that every source opened by an
    /// invocation is released on every exit path.
    #[must_use]
    pub fn with_open_gauge(mut self, gauge: Arc<AtomicUsize>) -> Self {
        gauge.fetch_add(1, Ordering::SeqCst);
        self.open_gauge = Some(gauge);
        self
    }
}

impl Drop for MemoryDemuxer {
    fn drop(&mut self) {
        if let Some(gauge) = &self.open_gauge {
            gauge.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl DemuxSource for MemoryDemuxer {
    type Format = String;

    fn tracks(&self) -> &[TrackInfo] {
        &self.tracks
    }

    fn track_format(&self, index: usize) -> Result<String, RebundleError> {
        let track = self.tracks.get(index).ok_or(RebundleError::UnknownTrack {
            index,
            count: self.tracks.len(),
        })?;
        Ok(track.media_type.clone())
    }

    fn select_track(&mut self, index: usize) -> Result<(), RebundleError> {
        if index >= self.tracks.len() {
            return Err(RebundleError::UnknownTrack {
                index,
                count: self.tracks.len(),
            });
        }
        self.selected = Some(index);
        self.cursor = 0;
        Ok(())
    }

    fn read_sample(&mut self, buffer: &mut [u8]) -> Result<Option<Sample>, RebundleError> {
        let selected = self.selected.ok_or(RebundleError::TrackNotSelected)?;

        let Some(sample) = self.samples[selected].get(self.cursor) else {
            return Ok(None);
        };
        if sample.data.len() > buffer.len() {
            return Err(RebundleError::SampleTooLarge {
                len: sample.data.len(),
                capacity: buffer.len(),
            });
        }

        buffer[..sample.data.len()].copy_from_slice(&sample.data);
        let descriptor = Sample {
            len: sample.data.len(),
            pts_us: sample.pts_us,
            is_keyframe: sample.is_keyframe,
        };
        self.cursor += 1;
        Ok(Some(descriptor))
    }
}

/// One sample as received by a [`MemoryMuxer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    /// Sink-side track index the sample was written under.
    pub track: usize,
    /// The payload bytes, copied out of the transfer buffer.
    pub data: Vec<u8>,
    /// Presentation timestamp in microseconds, as tagged on the write.
    pub pts_us: i64,
    /// Key-frame flag, as tagged on the write.
    pub is_keyframe: bool,
}

/// A multiplexer recording writes into memory.
///
/// Enforces the same `Building` → `Writing` → `Closed` lifecycle as a
/// real sink and keeps every write in arrival order for inspection.
pub struct MemoryMuxer {
    formats: Vec<String>,
    writes: Vec<RecordedWrite>,
    phase: SinkPhase,
}

impl Default for MemoryMuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMuxer {
    /// Create a sink in the `Building` phase with no tracks.
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
            writes: Vec::new(),
            phase: SinkPhase::Building,
        }
    }

    /// The format descriptors of the tracks added so far, in handle
    /// order.
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// Every write received so far, in arrival order.
    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    /// Whether [`finalize`](MuxSink::finalize) completed.
    pub fn is_finalized(&self) -> bool {
        self.phase == SinkPhase::Closed
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

impl MuxSink for MemoryMuxer {
    type Format = String;

    fn add_track(&mut self, format: &String) -> Result<TrackHandle, RebundleError> {
        self.expect_phase(SinkPhase::Building)?;
        let handle = TrackHandle::new(self.formats.len());
        self.formats.push(format.clone());
        Ok(handle)
    }

    fn start(&mut self) -> Result<(), RebundleError> {
        self.expect_phase(SinkPhase::Building)?;
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
        if index >= self.formats.len() {
            return Err(RebundleError::UnknownTrack {
                index,
                count: self.formats.len(),
            });
        }
        self.writes.push(RecordedWrite {
            track: index,
            data: data.to_vec(),
            pts_us: sample.pts_us,
            is_keyframe: sample.is_keyframe,
        });
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), RebundleError> {
        self.expect_phase(SinkPhase::Writing)?;
        self.phase = SinkPhase::Closed;
        Ok(())
    }
}
