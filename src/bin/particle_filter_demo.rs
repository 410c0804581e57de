//! Thin a tile of particles stochastically, then reorder the survivors.
//!
//! Usage: particle_filter_demo [config.toml] [num_particles]

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use particle_tiles::{
    filter_and_transform_particles_where, gather_particles, ConstParticleTileData, ExecConfig, Executor,
    ParticleTile, RandomContext, SimpleParticle, StochasticPredicate,
};

/// Payload with one extra real (mass); fixed columns are charge and species
type Particle = SimpleParticle<1, 0>;
type Tile = ParticleTile<Particle, 1, 1>;
type View<'a> = ConstParticleTileData<'a, Particle, 1, 1>;

const DEFAULT_PARTICLES: usize = 1_000_000;
const KEEP_PROBABILITY: f64 = 0.25;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ExecConfig::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => ExecConfig::default(),
    };
    let num_particles = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid particle count {:?}", n))?,
        None => DEFAULT_PARTICLES,
    };

    let executor = Arc::new(Executor::new(config).context("building executor")?);
    info!(
        "Running on {} thread(s) with {} particles",
        executor.num_threads(),
        num_particles
    );

    let mut src = Tile::with_executor(executor.clone(), 1, 0);
    src.reserve(num_particles);
    for i in 0..num_particles {
        let x = i as f64 / num_particles as f64;
        let particle = Particle::new([x, 1.0 - x, 0.5], i as i64, 0).with_rdata([1.0]);
        src.push(particle, [(i % 3) as f64 - 1.0], [(i % 4) as i32]);
    }

    let rule = StochasticPredicate::new(0x5EED, |_: &View<'_>, _: usize, rng: &mut RandomContext| {
        rng.bernoulli(KEEP_PROBABILITY)
    });

    // survivors carry the mass of the particles they replace
    let mut thinned = Tile::like(&src);
    thinned.resize(num_particles);
    let start = Instant::now();
    let kept = filter_and_transform_particles_where(&mut thinned, &src, &rule, |slot, src, i| {
        slot.copy_from(src, i);
        slot.particle_mut().rdata[0] = src.particle(i).rdata[0] / KEEP_PROBABILITY;
        slot.set_runtime_real(0, i as f64);
    })?;
    thinned.truncate(kept);
    info!(
        "Kept {} of {} particles in {:.2?}",
        kept,
        num_particles,
        start.elapsed()
    );

    // reverse the survivors
    let order: Vec<usize> = (0..kept).rev().collect();
    let mut reversed = Tile::like(&thinned);
    reversed.resize(kept);
    let start = Instant::now();
    gather_particles(&mut reversed, &thinned, kept, &order)?;
    info!("Gathered {} particles in {:.2?}", kept, start.elapsed());

    let total_mass: f64 = reversed.particles().iter().map(|p| p.rdata[0]).sum();
    info!(
        "Total mass {:.1} (initial {:.1})",
        total_mass,
        num_particles as f64
    );
    info!("Executor stats: {:?}", executor.stats());
    Ok(())
}
