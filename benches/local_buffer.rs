use std::{hint::black_box, time::Duration};

use criterion::{Criterion, criterion_group, criterion_main};
use fermata::{Buffer, BufferOptions};

// Zero-delay calls measure pure engine overhead: key resolution, the per-key
// critical section, and the policy decision, with no actual sleeping.

fn bench_unkeyed_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_buffer/unkeyed");
    group.sample_size(200);

    let f = Buffer::new(BufferOptions::fixed(Duration::ZERO)).wrap(|x: u64| x);

    group.bench_function("call", |b| {
        b.iter(|| f.call(black_box(1u64)).unwrap());
    });

    group.finish();
}

fn bench_keyed_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_buffer/keyed");
    group.sample_size(200);

    let options = BufferOptions {
        key_on_arguments: true,
        ..BufferOptions::fixed(Duration::ZERO)
    };

    let hot = Buffer::new(options).wrap(|x: u64| x);
    group.bench_function("call/hot_key", |b| {
        b.iter(|| hot.call(black_box(1u64)).unwrap());
    });

    let strings = Buffer::new(options).wrap(|s: &str| s.len());
    group.bench_function("call/string_key", |b| {
        b.iter(|| strings.call(black_box("user_123")).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_unkeyed_call, bench_keyed_call);
criterion_main!(benches);
