// Stream compaction property tests
//
// Random masks over several tile sizes, run on both a serial and a pooled
// executor, checked against a sequential reference.

use std::sync::Arc;

use particle_tiles::{
    filter_and_transform_particles, filter_and_transform_particles_dual_where, filter_particles,
    filter_particles_range, filter_particles_where, filter_particles_where_range, ConstParticleTileData,
    ExecConfig, ExecEvent, Executor, ParticleTile, Predicate, RandomContext, SimpleParticle, StochasticPredicate,
    TransferRange,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Tile = ParticleTile<SimpleParticle<0, 0>, 1, 1>;
type View<'a> = ConstParticleTileData<'a, SimpleParticle<0, 0>, 1, 1>;

const SIZES: &[usize] = &[0, 1, 7, 64, 1000, 5003];

fn executors() -> Vec<Arc<Executor>> {
    vec![
        Arc::new(Executor::serial()),
        Arc::new(Executor::new(ExecConfig::thread_pool(4).with_min_parallel_len(32).with_trace(true)).unwrap()),
    ]
}

fn tile(executor: &Arc<Executor>, n: usize) -> Tile {
    let mut tile = Tile::with_executor(executor.clone(), 1, 0);
    for i in 0..n {
        tile.push(SimpleParticle::new([i as f64, 0.0, 0.0], i as i64, 0), [i as f64 * 0.5], [i as i32]);
        tile.runtime_real_column_mut(0)[i] = -(i as f64);
    }
    tile
}

fn random_mask(n: usize, density: f64, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    // nonzero entries other than 1 must still count once
    (0..n)
        .map(|_| if rng.gen_bool(density) { rng.gen_range(1..4) } else { 0 })
        .collect()
}

fn reference(mask: &[u32]) -> Vec<i32> {
    mask.iter()
        .enumerate()
        .filter(|&(_, &m)| m != 0)
        .map(|(i, _)| i as i32)
        .collect()
}

#[test]
fn test_compaction_is_dense_ordered_and_counted() {
    for executor in executors() {
        for &n in SIZES {
            for (seed, density) in [(1, 0.0), (2, 0.1), (3, 0.5), (4, 1.0)] {
                let src = tile(&executor, n);
                let mut dst = Tile::like(&src);
                dst.resize(n);
                // sentinel so untouched slots are visible
                dst.int_column_mut(0).fill(-1);

                let mask = random_mask(n, density, seed);
                let expected = reference(&mask);
                let count = filter_particles(&mut dst, &src, &mask).unwrap();

                assert_eq!(count, expected.len(), "n = {}, density = {}", n, density);
                assert_eq!(dst.int_column(0)[..count], expected[..]);
                assert!(dst.int_column(0)[count..].iter().all(|&v| v == -1));
                for (k, &i) in expected.iter().enumerate() {
                    assert_eq!(dst.record(k), src.record(i as usize));
                }
            }
        }
    }
}

#[test]
fn test_predicate_and_mask_agree() {
    for executor in executors() {
        let src = tile(&executor, 2000);
        let keep = |src: &View<'_>, i: usize| src.int(0, i) % 7 < 3;

        let mask: Vec<bool> = (0..2000).map(|i| keep(&src.const_particle_tile_data(), i)).collect();
        let mut by_mask = Tile::like(&src);
        by_mask.resize(2000);
        let mut by_rule = Tile::like(&src);
        by_rule.resize(2000);

        let a = filter_particles(&mut by_mask, &src, &mask).unwrap();
        let b = filter_particles_where(&mut by_rule, &src, &Predicate(keep)).unwrap();
        assert_eq!(a, b);
        assert_eq!(by_mask.records(), by_rule.records());
    }
}

#[test]
fn test_range_predicate_matches_range_mask() {
    for executor in executors() {
        let src = tile(&executor, 300);
        let keep = |src: &View<'_>, i: usize| src.real(0, i) > 100.0;
        let range = TransferRange::new(150, 10, 120);

        let mask: Vec<u8> = (150..270).map(|i| u8::from(i as f64 * 0.5 > 100.0)).collect();
        let mut by_mask = Tile::like(&src);
        by_mask.resize(200);
        let mut by_rule = Tile::like(&src);
        by_rule.resize(200);

        let a = filter_particles_range(&mut by_mask, &src, &mask, range).unwrap();
        let b = filter_particles_where_range(&mut by_rule, &src, &Predicate(keep), range).unwrap();
        assert_eq!(a, 69);
        assert_eq!(a, b);
        assert_eq!(by_rule.int_column(0)[10], 201);
        assert_eq!(by_mask.records(), by_rule.records());
    }
}

#[test]
fn test_read_back_once_per_filter_call() {
    let executor =
        Arc::new(Executor::new(ExecConfig::thread_pool(2).with_min_parallel_len(4).with_trace(true)).unwrap());
    let src = tile(&executor, 100);
    let mut dst = Tile::like(&src);
    dst.resize(100);
    executor.clear_events();

    let mask = random_mask(100, 0.3, 9);
    let count = filter_and_transform_particles(&mut dst, &src, &mask, |slot, src, i| {
        slot.copy_from(src, i);
    })
    .unwrap();

    let events = executor.events();
    let scan = events.iter().position(|e| matches!(e, ExecEvent::Scan { .. })).unwrap();
    let read_backs: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, ExecEvent::ReadBack { .. }))
        .map(|(i, _)| i)
        .collect();
    let compaction = events.iter().rposition(|e| matches!(e, ExecEvent::Dispatch { .. })).unwrap();

    assert_eq!(read_backs.len(), 1);
    assert!(scan < read_backs[0] && read_backs[0] < compaction);
    assert_eq!(events[read_backs[0]], ExecEvent::ReadBack { count });
    assert_eq!(events.last(), Some(&ExecEvent::Barrier));
}

#[test]
fn test_stochastic_filter_is_reproducible() {
    let rule = StochasticPredicate::new(77, |_: &View<'_>, _: usize, rng: &mut RandomContext| rng.bernoulli(0.4));

    let mut outputs = Vec::new();
    for executor in executors() {
        let src = tile(&executor, 4000);
        let mut dst = Tile::like(&src);
        dst.resize(4000);
        let count = filter_particles_where(&mut dst, &src, &rule).unwrap();
        dst.truncate(count);
        outputs.push(dst.int_column(0).to_vec());
    }

    assert_eq!(outputs[0], outputs[1]);
    assert!(outputs[0].windows(2).all(|w| w[0] < w[1]));
    assert!((1400..1800).contains(&outputs[0].len()));
}

#[test]
fn test_dual_destinations_share_offsets() {
    for executor in executors() {
        let src = tile(&executor, 500);
        let mut even = Tile::like(&src);
        even.resize(500);
        let mut halves = Tile::like(&src);
        halves.resize(250);

        let rule = Predicate(|src: &View<'_>, i: usize| src.int(0, i) % 2 == 0);
        let count = filter_and_transform_particles_dual_where(&mut even, &mut halves, &src, &rule, |a, b, src, i| {
            a.copy_from(src, i);
            b.set_int(0, src.int(0, i) / 2);
            b.set_runtime_real(0, a.index() as f64);
        })
        .unwrap();

        assert_eq!(count, 250);
        for k in 0..count {
            assert_eq!(even.int_column(0)[k], 2 * k as i32);
            assert_eq!(halves.int_column(0)[k], k as i32);
            assert_eq!(halves.runtime_real_column(0)[k], k as f64);
        }
    }
}
