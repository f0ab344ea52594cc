//! Tracker benchmarks using Criterion.
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use bytetrack_xywh::tracker::{Rect, iou_distance};
use bytetrack_xywh::{BYTETracker, Detection, TrackerConfig};

/// Objects laid out on a grid, drifting one pixel per frame.
fn create_test_detections(n: usize, frame: usize) -> Vec<Detection> {
    (0..n)
        .map(|i| {
            let x = (i % 10) as f32 * 60.0 + 30.0 + frame as f32;
            let y = (i / 10) as f32 * 60.0 + 30.0;
            let score = if i % 4 == 0 { 0.2 } else { 0.9 };
            Detection::new([x, y, 40.0, 40.0], score, (i % 3) as u32)
        })
        .collect()
}

fn benchmark_tracker_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_update");
    for n in [10, 50, 100] {
        let frames: Vec<Vec<Detection>> = (0..30).map(|f| create_test_detections(n, f)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &frames, |b, frames| {
            b.iter(|| {
                let mut tracker = BYTETracker::new(TrackerConfig::default()).expect("valid config");
                for dets in frames {
                    black_box(tracker.update(black_box(dets)).expect("finite detections"));
                }
            })
        });
    }
    group.finish();
}

fn benchmark_iou_distance(c: &mut Criterion) {
    let rects: Vec<Rect> = create_test_detections(100, 0).iter().map(Detection::rect).collect();
    c.bench_function("iou_distance_100x100", |b| {
        b.iter(|| iou_distance(black_box(&rects), black_box(&rects)))
    });
}

criterion_group!(benches, benchmark_tracker_update, benchmark_iou_distance);
criterion_main!(benches);
