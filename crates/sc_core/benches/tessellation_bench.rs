use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Point2;
use sc_core::analysis::tessellation::{tessellate, AreaCache, MIN_TESSELLATION_SITES};
use sc_core::{PitchDimensions, TrackingSample};

/// 22 players spread over the pitch in a deterministic pattern.
fn players(frame: u32) -> Vec<(u32, Point2<f64>)> {
    (0..22u32)
        .map(|i| {
            let t = i as f64 * 0.7 + frame as f64 * 0.01;
            let x = 45.0 * (t * 1.3).sin();
            let y = 30.0 * (t * 0.9).cos();
            (i + 1, Point2::new(x, y))
        })
        .collect()
}

fn bench_tessellate_22(c: &mut Criterion) {
    let sites = players(0);
    let pitch = PitchDimensions::default();

    c.bench_function("tessellate_22_players", |b| {
        b.iter(|| tessellate(black_box(&sites), black_box(&pitch), MIN_TESSELLATION_SITES))
    });
}

fn bench_area_cache_period(c: &mut Criterion) {
    let samples: Vec<TrackingSample> = (0..300u32)
        .flat_map(|frame| {
            players(frame)
                .into_iter()
                .map(move |(id, p)| TrackingSample::new(frame, frame as f64 / 10.0, 1, id, p.x, p.y))
        })
        .collect();

    c.bench_function("area_cache_300_frames", |b| {
        b.iter(|| {
            let mut cache = AreaCache::new(black_box(&samples), PitchDimensions::default(), MIN_TESSELLATION_SITES);
            for frame in 0..270u32 {
                let (before, after) = cache.pair(frame, frame + 30);
                black_box((before.len(), after.len()));
            }
        })
    });
}

criterion_group!(benches, bench_tessellate_22, bench_area_cache_period);
criterion_main!(benches);
