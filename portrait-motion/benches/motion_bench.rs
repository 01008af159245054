use criterion::{black_box, criterion_group, criterion_main, Criterion};
use portrait_motion::{apply, resolve, Emotion, KeypointSet, PresetName};

fn bench_resolve(c: &mut Criterion) {
    c.bench_function("resolve_all_emotions", |b| {
        b.iter(|| {
            for emotion in Emotion::ALL {
                black_box(resolve(black_box(emotion), black_box(0.7)).unwrap());
            }
        })
    });
}

fn bench_apply(c: &mut Criterion) {
    let mut keypoints = KeypointSet::zeros();
    for i in 0..keypoints.len() {
        keypoints[i] = [0.01 * i as f64, 0.5 - 0.02 * i as f64, 0.0];
    }

    let mut group = c.benchmark_group("apply_preset");
    for preset in PresetName::ALL {
        group.bench_function(preset.as_str(), |b| {
            b.iter(|| black_box(apply(black_box(&keypoints), preset, black_box(1.0)).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_apply);
criterion_main!(benches);
