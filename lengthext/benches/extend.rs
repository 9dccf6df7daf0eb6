use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use lengthext::{encode::hex::digest_from_hex, enumerate, extend, par_enumerate};

const SEED: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
const ATTACKER: &[u8] = b";admin=true;comment=length extension benchmark";

fn bench_extend(c: &mut Criterion) {
    let seed = digest_from_hex(SEED).unwrap();
    c.bench_function("extend_single", |b| {
        b.iter(|| extend(black_box(seed), black_box(45), black_box(ATTACKER)))
    });
}

fn bench_enumerate(c: &mut Criterion) {
    let seed = digest_from_hex(SEED).unwrap();
    let mut group = c.benchmark_group("enumerate_0_4096");

    group.bench_function("sequential", |b| {
        b.iter(|| {
            enumerate(seed, 0, 4096, black_box(ATTACKER))
                .unwrap()
                .count()
        })
    });
    group.bench_function("parallel", |b| {
        b.iter(|| par_enumerate(seed, 0, 4096, black_box(ATTACKER)).unwrap().len())
    });
    group.finish();
}

criterion_group!(benches, bench_extend, bench_enumerate);
criterion_main!(benches);
