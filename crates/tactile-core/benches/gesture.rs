//! Benchmarks for the touch classification pass.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tactile_core::{TouchId, TouchProcessor};

fn bench_parse_two_finger_drag(c: &mut Criterion) {
    let processor = TouchProcessor::default();
    processor.point_down_at(100.0, 100.0, TouchId(1), 0);
    processor.point_down_at(160.0, 100.0, TouchId(2), 0);
    let mut step = 0.0f32;

    c.bench_function("parse_two_finger_drag", |b| {
        b.iter(|| {
            step += 1.0;
            processor.point_moved(100.0 + step, 100.0, TouchId(1));
            processor.point_moved(160.0 + step, 100.0, TouchId(2));
            let n = processor.parse_at(black_box(16));
            processor.drain();
            n
        })
    });
}

fn bench_parse_three_finger_turn(c: &mut Criterion) {
    let processor = TouchProcessor::default();
    let ids = [TouchId(1), TouchId(2), TouchId(3)];
    for (i, id) in ids.iter().enumerate() {
        let angle = i as f32 * std::f32::consts::TAU / 3.0;
        processor.point_down_at(50.0 * angle.cos(), 50.0 * angle.sin(), *id, 0);
    }
    let mut phase = 0.0f32;

    c.bench_function("parse_three_finger_turn", |b| {
        b.iter(|| {
            phase += 0.05;
            for (i, id) in ids.iter().enumerate() {
                let angle = i as f32 * std::f32::consts::TAU / 3.0 + phase;
                processor.point_moved(50.0 * angle.cos(), 50.0 * angle.sin(), *id);
            }
            let n = processor.parse_at(black_box(16));
            processor.drain();
            n
        })
    });
}

criterion_group!(
    benches,
    bench_parse_two_finger_drag,
    bench_parse_three_finger_turn,
);
criterion_main!(benches);
