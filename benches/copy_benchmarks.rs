//! Benchmarks for the sample copy loop and track selection.
//!
//! Run with: cargo bench
//!
//! All benchmarks use the in-memory backend so they measure the engine's
//! own copy loop, not container parsing.

use criterion::Criterion;
use rebundle::{
    MediaKind, MemoryDemuxer, MemoryMuxer, MemorySample, RemuxOptions, TrackInfo, combine_tracks,
    extract_audio_track, find_first_track,
};

fn audio_samples(count: usize, size: usize) -> Vec<MemorySample> {
    (0..count)
        .map(|i| MemorySample::new(vec![i as u8; size], i as i64 * 21_333))
        .collect()
}

fn video_samples(count: usize, size: usize) -> Vec<MemorySample> {
    (0..count)
        .map(|i| {
            if i % 30 == 0 {
                MemorySample::keyframe(vec![i as u8; size], i as i64 * 33_333)
            } else {
                MemorySample::new(vec![i as u8; size], i as i64 * 33_333)
            }
        })
        .collect()
}

fn benchmark_extract(criterion: &mut Criterion) {
    criterion.bench_function("extract 1000 small audio samples", |bencher| {
        bencher.iter(|| {
            let mut source =
                MemoryDemuxer::new().with_track("audio/aac", audio_samples(1000, 512));
            let mut sink = MemoryMuxer::new();
            extract_audio_track(&mut source, &mut sink, &RemuxOptions::new()).unwrap();
        });
    });

    criterion.bench_function("extract 100 large audio samples (64 KiB)", |bencher| {
        bencher.iter(|| {
            let mut source =
                MemoryDemuxer::new().with_track("audio/aac", audio_samples(100, 64 * 1024));
            let mut sink = MemoryMuxer::new();
            extract_audio_track(&mut source, &mut sink, &RemuxOptions::new()).unwrap();
        });
    });
}

fn benchmark_combine(criterion: &mut Criterion) {
    criterion.bench_function("combine 300 video + 500 audio samples", |bencher| {
        bencher.iter(|| {
            let mut video_source =
                MemoryDemuxer::new().with_track("video/h264", video_samples(300, 8 * 1024));
            let mut audio_source =
                MemoryDemuxer::new().with_track("audio/aac", audio_samples(500, 512));
            let mut sink = MemoryMuxer::new();
            combine_tracks(
                &mut video_source,
                &mut audio_source,
                &mut sink,
                &RemuxOptions::new(),
            )
            .unwrap();
        });
    });
}

fn benchmark_track_selection(criterion: &mut Criterion) {
    let tracks: Vec<TrackInfo> = (0..64)
        .map(|i| {
            let media_type = match i % 4 {
                0 => "text/subrip",
                1 => "application/data",
                2 => "video/h264",
                _ => "audio/aac",
            };
            TrackInfo::new(i, media_type)
        })
        .collect();

    criterion.bench_function("find first track among 64", |bencher| {
        bencher.iter(|| {
            let audio = find_first_track(&tracks, MediaKind::Audio).unwrap();
            criterion::black_box(audio.index)
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_extract,
    benchmark_combine,
    benchmark_track_selection,
);
criterion::criterion_main!(benches);
