//! Sample copying between demux sources and mux sinks.
//!
//! This module provides [`copy_track_samples`], the loop at the heart of
//! every remux operation: read one compressed sample into the transfer
//! buffer, write the identical bytes to the sink under the destination
//! track handle with the identical timestamp and flags, repeat until the
//! source track is exhausted. No decoding, no reordering, no timestamp
//! rewriting.
//!
//! The transfer buffer is allocated once per invocation at
//! [`TRANSFER_BUFFER_CAPACITY`] and reused across all samples — and
//! across both tracks when combining. Its capacity is a hard per-sample
//! ceiling: a sample that does not fit fails the invocation with
//! [`RebundleError::SampleTooLarge`](crate::RebundleError::SampleTooLarge)
//! rather than being truncated.

use crate::container::{DemuxSource, MuxSink, TrackHandle};
use crate::error::RebundleError;
use crate::progress::{OperationType, ProgressReporter};
use crate::remux::RemuxOptions;

/// Capacity of the per-invocation sample transfer buffer: 1 MiB.
///
/// Compressed video and audio samples from consumer codecs at ordinary
/// bitrates fit comfortably within this bound; the buffer is never
/// resized, so the constant is also the observable per-sample size limit.
pub const TRANSFER_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Totals for one copied track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Number of samples copied.
    pub samples: u64,
    /// Total payload bytes copied.
    pub bytes: u64,
}

/// Copy every remaining sample of the source's selected track into the
/// sink under `to_track`.
///
/// Samples are written in the exact order and with the exact timestamps
/// and flags they were read with. End of track is the normal termination
/// condition. The caller supplies `buffer` (conventionally
/// [`TRANSFER_BUFFER_CAPACITY`] bytes) and may reuse it across calls —
/// buffer content is only valid between a read and the immediately
/// following write.
///
/// # Errors
///
/// Propagates read and write failures from the source and sink, including
/// [`RebundleError::SampleTooLarge`](crate::RebundleError::SampleTooLarge)
/// when a sample exceeds the buffer.
///
/// # Example
///
/// ```
/// use rebundle::{
///     copy_track_samples, DemuxSource, MemoryDemuxer, MemoryMuxer, MemorySample,
///     MuxSink, OperationType, RemuxOptions, TRANSFER_BUFFER_CAPACITY,
/// };
///
/// let mut source = MemoryDemuxer::new()
///     .with_track("audio/aac", vec![MemorySample::new(vec![1, 2, 3], 0)]);
/// let mut sink = MemoryMuxer::new();
///
/// let format = source.track_format(0)?;
/// source.select_track(0)?;
/// let handle = sink.add_track(&format)?;
/// sink.start()?;
///
/// let mut buffer = vec![0u8; TRANSFER_BUFFER_CAPACITY];
/// let stats = copy_track_samples(
///     &mut source,
///     &mut sink,
///     handle,
///     &mut buffer,
///     OperationType::AudioExtract,
///     &RemuxOptions::new(),
/// )?;
/// assert_eq!(stats.samples, 1);
/// assert_eq!(stats.bytes, 3);
/// # Ok::<(), rebundle::RebundleError>(())
/// ```
pub fn copy_track_samples<D, M>(
    source: &mut D,
    sink: &mut M,
    to_track: TrackHandle,
    buffer: &mut [u8],
    operation: OperationType,
    options: &RemuxOptions,
) -> Result<CopyStats, RebundleError>
where
    D: DemuxSource,
    M: MuxSink<Format = D::Format>,
{
    let mut stats = CopyStats::default();
    let mut reporter =
        ProgressReporter::new(options.progress(), operation, None, options.batch_size());

    while let Some(sample) = source.read_sample(buffer)? {
        sink.write_sample(to_track, &buffer[..sample.len], &sample)?;
        stats.samples += 1;
        stats.bytes += sample.len as u64;
        reporter.tick(stats.samples);
    }

    reporter.finish(stats.samples);
    log::debug!(
        "copied {} samples ({} bytes) to sink track {}",
        stats.samples,
        stats.bytes,
        to_track.index()
    );
    Ok(stats)
}
