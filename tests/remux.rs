//! Remux engine integration tests over the in-memory backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rebundle::{
    DemuxSource, MediaKind, MemoryDemuxer, MemoryMuxer, MemorySample, MuxSink, RebundleError,
    RemuxOptions, TRANSFER_BUFFER_CAPACITY, TrackInfo, combine_tracks, copy_track_samples,
    extract_audio_track, find_first_track,
};

fn track_list(types: &[&str]) -> Vec<TrackInfo> {
    types
        .iter()
        .enumerate()
        .map(|(index, media_type)| TrackInfo::new(index, *media_type))
        .collect()
}

// ── Track selection ──────────────────────────────────────────────

#[test]
fn find_first_track_picks_lowest_index() {
    let tracks = track_list(&["text/subrip", "audio/aac", "video/h264", "audio/opus"]);

    let audio = find_first_track(&tracks, MediaKind::Audio).expect("audio track");
    assert_eq!(audio.index, 1);
    assert_eq!(audio.media_type, "audio/aac");

    let video = find_first_track(&tracks, MediaKind::Video).expect("video track");
    assert_eq!(video.index, 2);
}

#[test]
fn find_first_track_returns_none_without_match() {
    let tracks = track_list(&["video/h264", "text/subrip"]);
    assert!(find_first_track(&tracks, MediaKind::Audio).is_none());

    let tracks = track_list(&["audio/aac"]);
    assert!(find_first_track(&tracks, MediaKind::Video).is_none());

    assert!(find_first_track(&[], MediaKind::Audio).is_none());
}

#[test]
fn find_first_track_is_deterministic_across_orderings() {
    // Every permutation of one video, one audio, one other track must
    // select by position, never by type priority.
    let permutations: [[&str; 3]; 6] = [
        ["video/h264", "audio/aac", "text/subrip"],
        ["video/h264", "text/subrip", "audio/aac"],
        ["audio/aac", "video/h264", "text/subrip"],
        ["audio/aac", "text/subrip", "video/h264"],
        ["text/subrip", "video/h264", "audio/aac"],
        ["text/subrip", "audio/aac", "video/h264"],
    ];

    for types in permutations {
        let tracks = track_list(&types);
        let expected_audio = types.iter().position(|t| t.starts_with("audio/")).unwrap();
        let expected_video = types.iter().position(|t| t.starts_with("video/")).unwrap();

        assert_eq!(
            find_first_track(&tracks, MediaKind::Audio).unwrap().index,
            expected_audio,
        );
        assert_eq!(
            find_first_track(&tracks, MediaKind::Video).unwrap().index,
            expected_video,
        );
    }
}

// ── Sample copying ───────────────────────────────────────────────

#[test]
fn copy_preserves_order_payload_and_attributes() {
    let samples = vec![
        MemorySample::keyframe(vec![0xAA; 64], 0),
        MemorySample::new(vec![0xBB; 32], 33_333),
        MemorySample::new(vec![0xCC; 48], 66_666),
        MemorySample::keyframe(vec![0xDD; 16], 100_000),
    ];
    let mut source = MemoryDemuxer::new().with_track("video/h264", samples.clone());
    let mut sink = MemoryMuxer::new();

    let format = source.track_format(0).unwrap();
    source.select_track(0).unwrap();
    let handle = sink.add_track(&format).unwrap();
    sink.start().unwrap();

    let mut buffer = vec![0u8; TRANSFER_BUFFER_CAPACITY];
    let stats = copy_track_samples(
        &mut source,
        &mut sink,
        handle,
        &mut buffer,
        rebundle::OperationType::Combine,
        &RemuxOptions::new(),
    )
    .unwrap();

    assert_eq!(stats.samples, 4);
    assert_eq!(stats.bytes, 64 + 32 + 48 + 16);

    let writes = sink.writes();
    assert_eq!(writes.len(), samples.len());
    for (write, sample) in writes.iter().zip(&samples) {
        assert_eq!(write.data, sample.data, "payload must be byte-identical");
        assert_eq!(write.pts_us, sample.pts_us, "timestamp must be preserved");
        assert_eq!(write.is_keyframe, sample.is_keyframe, "flags must be preserved");
        assert_eq!(write.track, 0);
    }
}

#[test]
fn copy_of_empty_track_terminates_normally() {
    let mut source = MemoryDemuxer::new().with_track("audio/aac", Vec::new());
    let mut sink = MemoryMuxer::new();

    let format = source.track_format(0).unwrap();
    source.select_track(0).unwrap();
    let handle = sink.add_track(&format).unwrap();
    sink.start().unwrap();

    let mut buffer = vec![0u8; TRANSFER_BUFFER_CAPACITY];
    let stats = copy_track_samples(
        &mut source,
        &mut sink,
        handle,
        &mut buffer,
        rebundle::OperationType::AudioExtract,
        &RemuxOptions::new(),
    )
    .unwrap();

    assert_eq!(stats.samples, 0);
    assert!(sink.writes().is_empty());
}

#[test]
fn oversized_sample_fails_without_truncation() {
    let oversized = MemorySample::new(vec![0u8; TRANSFER_BUFFER_CAPACITY + 1], 0);
    let mut source = MemoryDemuxer::new()
        .with_track("audio/aac", vec![MemorySample::new(vec![1; 8], 0), oversized]);
    let mut sink = MemoryMuxer::new();

    let error = extract_audio_track(&mut source, &mut sink, &RemuxOptions::new()).unwrap_err();
    match error {
        RebundleError::SampleTooLarge { len, capacity } => {
            assert_eq!(len, TRANSFER_BUFFER_CAPACITY + 1);
            assert_eq!(capacity, TRANSFER_BUFFER_CAPACITY);
        }
        other => panic!("expected SampleTooLarge, got {other:?}"),
    }

    // The first sample made it through; the oversized one was never
    // partially written and the sink was never finalized.
    assert_eq!(sink.writes().len(), 1);
    assert!(!sink.is_finalized());
}

// ── Combine ──────────────────────────────────────────────────────

#[test]
fn combine_drains_video_then_audio() {
    let video_samples = vec![
        MemorySample::keyframe(vec![1; 10], 0),
        MemorySample::new(vec![2; 10], 33_333),
    ];
    let audio_samples = vec![
        MemorySample::new(vec![3; 4], 0),
        MemorySample::new(vec![4; 4], 21_333),
        MemorySample::new(vec![5; 4], 42_666),
    ];

    let mut video_source = MemoryDemuxer::new()
        .with_track("text/subrip", Vec::new())
        .with_track("video/h264", video_samples);
    let mut audio_source = MemoryDemuxer::new().with_track("audio/aac", audio_samples);
    let mut sink = MemoryMuxer::new();

    let report = combine_tracks(
        &mut video_source,
        &mut audio_source,
        &mut sink,
        &RemuxOptions::new(),
    )
    .unwrap();

    assert_eq!(report.video.unwrap().samples, 2);
    assert_eq!(report.audio.unwrap().samples, 3);
    assert!(sink.is_finalized());
    assert_eq!(sink.formats(), &["video/h264".to_string(), "audio/aac".to_string()]);

    // Sequential drain: all video writes precede all audio writes.
    let writes = sink.writes();
    assert_eq!(writes.len(), 5);
    assert!(writes[..2].iter().all(|w| w.track == 0));
    assert!(writes[2..].iter().all(|w| w.track == 1));
}

#[test]
fn combine_without_audio_track_fails_and_releases_sources() {
    let gauge = Arc::new(AtomicUsize::new(0));

    {
        let mut video_source = MemoryDemuxer::new()
            .with_track("video/h264", vec![MemorySample::keyframe(vec![1; 8], 0)])
            .with_open_gauge(gauge.clone());
        // Video-only second source: no audio track anywhere.
        let mut audio_source = MemoryDemuxer::new()
            .with_track("video/h264", vec![MemorySample::keyframe(vec![2; 8], 0)])
            .with_open_gauge(gauge.clone());
        let mut sink = MemoryMuxer::new();

        assert_eq!(gauge.load(Ordering::SeqCst), 2);

        let error = combine_tracks(
            &mut video_source,
            &mut audio_source,
            &mut sink,
            &RemuxOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(error, RebundleError::NoAudioTrack));

        // Nothing was added or written before the failure.
        assert!(sink.formats().is_empty());
        assert!(!sink.is_finalized());
    }

    // Both sources dropped: open-handle count returns to baseline.
    assert_eq!(gauge.load(Ordering::SeqCst), 0);
}

#[test]
fn combine_without_video_track_fails() {
    let mut video_source = MemoryDemuxer::new().with_track("audio/aac", Vec::new());
    let mut audio_source = MemoryDemuxer::new().with_track("audio/aac", Vec::new());
    let mut sink = MemoryMuxer::new();

    let error = combine_tracks(
        &mut video_source,
        &mut audio_source,
        &mut sink,
        &RemuxOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(error, RebundleError::NoVideoTrack));
}

// ── Extract ──────────────────────────────────────────────────────

#[test]
fn extract_audio_selects_first_audio_track() {
    let mut source = MemoryDemuxer::new()
        .with_track("video/h264", vec![MemorySample::keyframe(vec![9; 32], 0)])
        .with_track("audio/aac", vec![MemorySample::new(vec![7; 8], 0)])
        .with_track("audio/opus", vec![MemorySample::new(vec![8; 8], 0)]);
    let mut sink = MemoryMuxer::new();

    let report = extract_audio_track(&mut source, &mut sink, &RemuxOptions::new()).unwrap();

    assert!(report.video.is_none());
    assert_eq!(report.audio.unwrap().samples, 1);
    assert_eq!(sink.formats(), &["audio/aac".to_string()]);
    assert_eq!(sink.writes()[0].data, vec![7; 8]);
}

#[test]
fn extract_from_video_only_source_fails() {
    let mut source =
        MemoryDemuxer::new().with_track("video/h264", vec![MemorySample::keyframe(vec![1; 8], 0)]);
    let mut sink = MemoryMuxer::new();

    let error = extract_audio_track(&mut source, &mut sink, &RemuxOptions::new()).unwrap_err();
    assert!(matches!(error, RebundleError::NoAudioTrack));
    assert!(sink.formats().is_empty());
}

// ── Sink lifecycle ───────────────────────────────────────────────

#[test]
fn sink_rejects_out_of_phase_operations() {
    let mut sink = MemoryMuxer::new();
    let sample = rebundle::Sample {
        len: 1,
        pts_us: 0,
        is_keyframe: false,
    };

    // Write before start.
    let handle = sink.add_track(&"audio/aac".to_string()).unwrap();
    let error = sink.write_sample(handle, &[0u8], &sample).unwrap_err();
    assert!(matches!(error, RebundleError::SinkState { .. }));

    // Add after start.
    sink.start().unwrap();
    let error = sink.add_track(&"video/h264".to_string()).unwrap_err();
    assert!(matches!(error, RebundleError::SinkState { .. }));

    // Start twice.
    let error = sink.start().unwrap_err();
    assert!(matches!(error, RebundleError::SinkState { .. }));

    // Write after finalize.
    sink.finalize().unwrap();
    let error = sink.write_sample(handle, &[0u8], &sample).unwrap_err();
    assert!(matches!(error, RebundleError::SinkState { .. }));
}

#[test]
fn sink_rejects_unknown_track_handles() {
    let mut sink = MemoryMuxer::new();
    sink.add_track(&"audio/aac".to_string()).unwrap();
    sink.start().unwrap();

    let bogus = rebundle::TrackHandle::new(7);
    let sample = rebundle::Sample {
        len: 1,
        pts_us: 0,
        is_keyframe: false,
    };
    let error = sink.write_sample(bogus, &[0u8], &sample).unwrap_err();
    assert!(matches!(error, RebundleError::UnknownTrack { index: 7, .. }));
}

#[test]
fn source_requires_selection_before_reading() {
    let mut source = MemoryDemuxer::new().with_track("audio/aac", Vec::new());
    let mut buffer = [0u8; 16];

    let error = source.read_sample(&mut buffer).unwrap_err();
    assert!(matches!(error, RebundleError::TrackNotSelected));

    let error = source.select_track(5).unwrap_err();
    assert!(matches!(error, RebundleError::UnknownTrack { index: 5, count: 1 }));
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn concurrent_invocations_are_independent() {
    // Two full combine invocations on disjoint sources, sinks, and
    // buffers, run in parallel; each result must be byte-perfect.
    let handles: Vec<_> = (0u8..2)
        .map(|seed| {
            thread::spawn(move || {
                let video_samples: Vec<_> = (0..50)
                    .map(|i| {
                        MemorySample::keyframe(vec![seed.wrapping_add(i as u8); 128], i * 33_333)
                    })
                    .collect();
                let audio_samples: Vec<_> = (0..80)
                    .map(|i| MemorySample::new(vec![seed.wrapping_mul(3).wrapping_add(i as u8); 64], i * 21_333))
                    .collect();

                let mut video_source =
                    MemoryDemuxer::new().with_track("video/h264", video_samples.clone());
                let mut audio_source =
                    MemoryDemuxer::new().with_track("audio/aac", audio_samples.clone());
                let mut sink = MemoryMuxer::new();

                combine_tracks(
                    &mut video_source,
                    &mut audio_source,
                    &mut sink,
                    &RemuxOptions::new(),
                )
                .unwrap();

                // Verify every write against the originating sample set.
                let writes = sink.writes();
                assert_eq!(writes.len(), 130);
                for (write, sample) in writes[..50].iter().zip(&video_samples) {
                    assert_eq!(write.data, sample.data);
                    assert_eq!(write.pts_us, sample.pts_us);
                }
                for (write, sample) in writes[50..].iter().zip(&audio_samples) {
                    assert_eq!(write.data, sample.data);
                    assert_eq!(write.pts_us, sample.pts_us);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }
}

// ── Progress ─────────────────────────────────────────────────────

#[test]
fn progress_callback_observes_final_count() {
    struct LastSeen(std::sync::Mutex<u64>);
    impl rebundle::ProgressCallback for LastSeen {
        fn on_progress(&self, info: &rebundle::ProgressInfo) {
            *self.0.lock().unwrap() = info.current;
        }
    }

    let last_seen = Arc::new(LastSeen(std::sync::Mutex::new(0)));
    let samples: Vec<_> = (0..10)
        .map(|i| MemorySample::new(vec![i as u8; 4], i * 1_000))
        .collect();
    let mut source = MemoryDemuxer::new().with_track("audio/aac", samples);
    let mut sink = MemoryMuxer::new();

    let options = RemuxOptions::new()
        .with_progress(last_seen.clone())
        .with_batch_size(3);
    extract_audio_track(&mut source, &mut sink, &options).unwrap();

    assert_eq!(*last_seen.0.lock().unwrap(), 10);
}
