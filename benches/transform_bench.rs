// Particle tile transformation benchmarks
//
// Compares serial and thread pool execution of the bulk copy, the mask
// and predicate filters, and gather.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use particle_tiles::{
    copy_particles, filter_particles, filter_particles_where, gather_particles, ConstParticleTileData,
    ExecConfig, Executor, ParticleTile, Predicate, SimpleParticle,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const PARTICLE_COUNTS: &[usize] = &[1_000, 100_000, 1_000_000];

type Tile = ParticleTile<SimpleParticle<2, 0>, 2, 1>;
type View<'a> = ConstParticleTileData<'a, SimpleParticle<2, 0>, 2, 1>;

fn executors() -> Vec<(&'static str, Arc<Executor>)> {
    let pool = Executor::new(ExecConfig::default()).unwrap_or_else(|_| Executor::serial());
    vec![("serial", Arc::new(Executor::serial())), ("pool", Arc::new(pool))]
}

fn populated(executor: &Arc<Executor>, n: usize) -> Tile {
    let mut rng = StdRng::seed_from_u64(42);
    let mut tile = Tile::with_executor(executor.clone(), 2, 1);
    tile.reserve(n);
    for i in 0..n {
        let pos = [rng.gen(), rng.gen(), rng.gen()];
        tile.push(SimpleParticle::new(pos, i as i64, 0), [rng.gen(), rng.gen()], [i as i32]);
    }
    tile
}

fn bench_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_particles");

    for (name, executor) in executors() {
        for &n in PARTICLE_COUNTS {
            let src = populated(&executor, n);
            let mut dst = Tile::like(&src);
            dst.resize(n);

            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, _| {
                b.iter(|| copy_particles(black_box(&mut dst), black_box(&src)))
            });
        }
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_particles");

    for (name, executor) in executors() {
        for &n in PARTICLE_COUNTS {
            let src = populated(&executor, n);
            let mut dst = Tile::like(&src);
            dst.resize(n);

            let mut rng = StdRng::seed_from_u64(7);
            let mask: Vec<u8> = (0..n).map(|_| u8::from(rng.gen_bool(0.5))).collect();
            group.bench_with_input(BenchmarkId::new(format!("{}_mask", name), n), &n, |b, _| {
                b.iter(|| filter_particles(black_box(&mut dst), black_box(&src), black_box(&mask)))
            });

            let rule = Predicate(|src: &View<'_>, i: usize| src.particle(i).pos[0] < 0.5);
            group.bench_with_input(BenchmarkId::new(format!("{}_predicate", name), n), &n, |b, _| {
                b.iter(|| filter_particles_where(black_box(&mut dst), black_box(&src), &rule))
            });
        }
    }

    group.finish();
}

fn bench_gather(c: &mut Criterion) {
    let mut group = c.benchmark_group("gather_particles");

    for (name, executor) in executors() {
        for &n in PARTICLE_COUNTS {
            let src = populated(&executor, n);
            let mut dst = Tile::like(&src);
            dst.resize(n);

            let mut order: Vec<u32> = (0..n as u32).collect();
            order.shuffle(&mut StdRng::seed_from_u64(3));

            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, &n| {
                b.iter(|| gather_particles(black_box(&mut dst), black_box(&src), n, black_box(&order)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_copy, bench_filter, bench_gather);
criterion_main!(benches);
