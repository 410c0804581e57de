use std::sync::Arc;

use super::particle::{Particle, ParticleInt, ParticleReal};
use super::tile_data::{ConstParticleTileData, ParticleTileData};
use crate::error::{TransformError, TransformResult};
use crate::exec::Executor;

/// Owning particle storage in hybrid AoS / SoA layout.
///
/// - payload `P` stored array-of-structures
/// - `NAR` real and `NAI` int attributes stored one column each
/// - a run-time number of extra real and int columns
///
/// All columns always hold `num_particles()` entries.
pub struct ParticleTile<P, const NAR: usize, const NAI: usize> {
    particles: Vec<P>,
    real_data: [Vec<ParticleReal>; NAR],
    int_data: [Vec<ParticleInt>; NAI],
    runtime_real_data: Vec<Vec<ParticleReal>>,
    runtime_int_data: Vec<Vec<ParticleInt>>,
    executor: Arc<Executor>,
}

/// Owned snapshot of one record's full content
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRecord<P, const NAR: usize, const NAI: usize> {
    pub particle: P,
    pub reals: [ParticleReal; NAR],
    pub ints: [ParticleInt; NAI],
    pub runtime_reals: Vec<ParticleReal>,
    pub runtime_ints: Vec<ParticleInt>,
}

impl<P: Particle, const NAR: usize, const NAI: usize> ParticleRecord<P, NAR, NAI> {
    /// Record without runtime attributes
    pub fn new(particle: P, reals: [ParticleReal; NAR], ints: [ParticleInt; NAI]) -> Self {
        Self {
            particle,
            reals,
            ints,
            runtime_reals: Vec::new(),
            runtime_ints: Vec::new(),
        }
    }

    pub fn with_runtime(mut self, runtime_reals: Vec<ParticleReal>, runtime_ints: Vec<ParticleInt>) -> Self {
        self.runtime_reals = runtime_reals;
        self.runtime_ints = runtime_ints;
        self
    }
}

impl<P: Particle, const NAR: usize, const NAI: usize> ParticleTile<P, NAR, NAI> {
    /// Empty tile on the global executor
    pub fn new(num_runtime_real: usize, num_runtime_int: usize) -> Self {
        Self::with_executor(Executor::global(), num_runtime_real, num_runtime_int)
    }

    /// Empty tile bound to an explicit executor
    pub fn with_executor(executor: Arc<Executor>, num_runtime_real: usize, num_runtime_int: usize) -> Self {
        Self {
            particles: Vec::new(),
            real_data: std::array::from_fn(|_| Vec::new()),
            int_data: std::array::from_fn(|_| Vec::new()),
            runtime_real_data: vec![Vec::new(); num_runtime_real],
            runtime_int_data: vec![Vec::new(); num_runtime_int],
            executor,
        }
    }

    /// Empty tile sharing `other`'s executor and runtime attribute layout
    pub fn like(other: &Self) -> Self {
        Self::with_executor(
            other.executor.clone(),
            other.num_runtime_real(),
            other.num_runtime_int(),
        )
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of particles the payload array holds without reallocating
    pub fn capacity(&self) -> usize {
        self.particles.capacity()
    }

    pub fn num_runtime_real(&self) -> usize {
        self.runtime_real_data.len()
    }

    pub fn num_runtime_int(&self) -> usize {
        self.runtime_int_data.len()
    }

    /// Reserve room for `additional` more particles in every column
    pub fn reserve(&mut self, additional: usize) {
        self.particles.reserve(additional);
        self.for_each_column(|c| c.reserve(additional), |c| c.reserve(additional));
    }

    /// Grow or shrink every column to `new_len`. New slots are defaulted / zeroed.
    pub fn resize(&mut self, new_len: usize) {
        self.particles.resize(new_len, P::default());
        self.for_each_column(|c| c.resize(new_len, 0.0), |c| c.resize(new_len, 0));
    }

    pub fn truncate(&mut self, len: usize) {
        self.particles.truncate(len);
        self.for_each_column(|c| c.truncate(len), |c| c.truncate(len));
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Append a particle; runtime attributes of the new slot are zeroed
    pub fn push(&mut self, particle: P, reals: [ParticleReal; NAR], ints: [ParticleInt; NAI]) {
        self.particles.push(particle);
        for (column, value) in self.real_data.iter_mut().zip(reals) {
            column.push(value);
        }
        for (column, value) in self.int_data.iter_mut().zip(ints) {
            column.push(value);
        }
        for column in &mut self.runtime_real_data {
            column.push(0.0);
        }
        for column in &mut self.runtime_int_data {
            column.push(0);
        }
    }

    /// Append a full record. Its runtime attribute counts must match this tile.
    pub fn push_record(&mut self, record: &ParticleRecord<P, NAR, NAI>) -> TransformResult<()> {
        if record.runtime_reals.len() != self.num_runtime_real()
            || record.runtime_ints.len() != self.num_runtime_int()
        {
            return Err(TransformError::RuntimeAttributeMismatch {
                dst_real: self.num_runtime_real(),
                dst_int: self.num_runtime_int(),
                src_real: record.runtime_reals.len(),
                src_int: record.runtime_ints.len(),
            });
        }

        self.push(record.particle, record.reals, record.ints);
        let last = self.num_particles() - 1;
        for (column, &value) in self.runtime_real_data.iter_mut().zip(&record.runtime_reals) {
            column[last] = value;
        }
        for (column, &value) in self.runtime_int_data.iter_mut().zip(&record.runtime_ints) {
            column[last] = value;
        }
        Ok(())
    }

    /// Snapshot the full record at index `i`
    pub fn record(&self, i: usize) -> ParticleRecord<P, NAR, NAI> {
        ParticleRecord {
            particle: self.particles[i],
            reals: std::array::from_fn(|comp| self.real_data[comp][i]),
            ints: std::array::from_fn(|comp| self.int_data[comp][i]),
            runtime_reals: self.runtime_real_data.iter().map(|c| c[i]).collect(),
            runtime_ints: self.runtime_int_data.iter().map(|c| c[i]).collect(),
        }
    }

    /// Snapshot every record in index order
    pub fn records(&self) -> Vec<ParticleRecord<P, NAR, NAI>> {
        (0..self.num_particles()).map(|i| self.record(i)).collect()
    }

    /// Add a zero-filled runtime real column, returns its component index
    pub fn add_runtime_real_component(&mut self) -> usize {
        self.runtime_real_data.push(vec![0.0; self.num_particles()]);
        self.runtime_real_data.len() - 1
    }

    /// Add a zero-filled runtime int column, returns its component index
    pub fn add_runtime_int_component(&mut self) -> usize {
        self.runtime_int_data.push(vec![0; self.num_particles()]);
        self.runtime_int_data.len() - 1
    }

    pub fn particles(&self) -> &[P] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [P] {
        &mut self.particles
    }

    pub fn real_column(&self, comp: usize) -> &[ParticleReal] {
        &self.real_data[comp]
    }

    pub fn real_column_mut(&mut self, comp: usize) -> &mut [ParticleReal] {
        &mut self.real_data[comp]
    }

    pub fn int_column(&self, comp: usize) -> &[ParticleInt] {
        &self.int_data[comp]
    }

    pub fn int_column_mut(&mut self, comp: usize) -> &mut [ParticleInt] {
        &mut self.int_data[comp]
    }

    pub fn runtime_real_column(&self, comp: usize) -> &[ParticleReal] {
        &self.runtime_real_data[comp]
    }

    pub fn runtime_real_column_mut(&mut self, comp: usize) -> &mut [ParticleReal] {
        &mut self.runtime_real_data[comp]
    }

    pub fn runtime_int_column(&self, comp: usize) -> &[ParticleInt] {
        &self.runtime_int_data[comp]
    }

    pub fn runtime_int_column_mut(&mut self, comp: usize) -> &mut [ParticleInt] {
        &mut self.runtime_int_data[comp]
    }

    /// Mutable view for the duration of one operation
    pub fn particle_tile_data(&mut self) -> ParticleTileData<'_, P, NAR, NAI> {
        ParticleTileData::new(
            &mut self.particles,
            self.real_data.each_mut().map(|c| c.as_mut_slice()),
            self.int_data.each_mut().map(|c| c.as_mut_slice()),
            self.runtime_real_data.iter_mut().map(|c| c.as_mut_slice()).collect(),
            self.runtime_int_data.iter_mut().map(|c| c.as_mut_slice()).collect(),
        )
    }

    /// Read-only view for the duration of one operation
    pub fn const_particle_tile_data(&self) -> ConstParticleTileData<'_, P, NAR, NAI> {
        ConstParticleTileData::new(
            &self.particles,
            self.real_data.each_ref().map(|c| c.as_slice()),
            self.int_data.each_ref().map(|c| c.as_slice()),
            self.runtime_real_data.iter().map(|c| c.as_slice()).collect(),
            self.runtime_int_data.iter().map(|c| c.as_slice()).collect(),
        )
    }

    fn for_each_column(
        &mut self,
        mut real: impl FnMut(&mut Vec<ParticleReal>),
        mut int: impl FnMut(&mut Vec<ParticleInt>),
    ) {
        self.real_data.iter_mut().chain(self.runtime_real_data.iter_mut()).for_each(&mut real);
        self.int_data.iter_mut().chain(self.runtime_int_data.iter_mut()).for_each(&mut int);
    }
}

impl<P: Particle, const NAR: usize, const NAI: usize> std::fmt::Debug
    for ParticleTile<P, NAR, NAI>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleTile")
            .field("num_particles", &self.num_particles())
            .field("num_runtime_real", &self.num_runtime_real())
            .field("num_runtime_int", &self.num_runtime_int())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::SimpleParticle;

    type Tile = ParticleTile<SimpleParticle<1, 0>, 2, 1>;

    fn tile_with(n: usize) -> Tile {
        let mut tile = Tile::with_executor(Arc::new(Executor::serial()), 1, 1);
        for i in 0..n {
            let p = SimpleParticle::new([i as f64, 0.0, 0.0], i as i64, 0);
            tile.push(p, [i as f64, -(i as f64)], [i as i32]);
        }
        tile
    }

    #[test]
    fn test_push_keeps_columns_aligned() {
        let tile = tile_with(4);
        assert_eq!(tile.num_particles(), 4);
        assert_eq!(tile.real_column(1), &[0.0, -1.0, -2.0, -3.0]);
        assert_eq!(tile.int_column(0), &[0, 1, 2, 3]);
        assert_eq!(tile.runtime_real_column(0), &[0.0; 4]);
        assert_eq!(tile.runtime_int_column(0), &[0; 4]);
    }

    #[test]
    fn test_resize_and_truncate() {
        let mut tile = tile_with(2);
        tile.resize(5);
        assert_eq!(tile.num_particles(), 5);
        assert_eq!(tile.record(4).particle, SimpleParticle::default());
        assert_eq!(tile.runtime_real_column(0).len(), 5);

        tile.truncate(1);
        assert_eq!(tile.int_column(0), &[0]);
        tile.clear();
        assert!(tile.is_empty());
    }

    #[test]
    fn test_record_round_trip() {
        let mut tile = tile_with(0);
        let record = ParticleRecord::new(SimpleParticle::new([1.0, 2.0, 3.0], 9, 1), [4.0, 5.0], [6])
            .with_runtime(vec![7.0], vec![8]);
        tile.push_record(&record).unwrap();
        assert_eq!(tile.record(0), record);

        let bad = ParticleRecord::new(SimpleParticle::default(), [0.0; 2], [0]);
        assert!(matches!(
            tile.push_record(&bad),
            Err(TransformError::RuntimeAttributeMismatch { dst_real: 1, src_real: 0, .. })
        ));
        assert_eq!(tile.num_particles(), 1);
    }

    #[test]
    fn test_add_runtime_components() {
        let mut tile = tile_with(3);
        assert_eq!(tile.add_runtime_real_component(), 1);
        assert_eq!(tile.add_runtime_int_component(), 1);
        assert_eq!(tile.runtime_real_column(1), &[0.0; 3]);
        assert_eq!(tile.record(2).runtime_ints, vec![0, 0]);
    }

    #[test]
    fn test_views_see_tile_columns() {
        let mut tile = tile_with(3);
        {
            let mut view = tile.particle_tile_data();
            assert_eq!(view.num_particles(), 3);
            assert_eq!(view.num_runtime_real(), 1);
            let mut slot = view.slot(1);
            slot.set_real(0, 10.0);
            slot.set_runtime_int(0, 11);
            slot.particle_mut().id = 99;
        }

        let view = tile.const_particle_tile_data();
        assert_eq!(view.real(0, 1), 10.0);
        assert_eq!(view.runtime_int(0, 1), 11);
        assert_eq!(view.particle(1).id, 99);
        assert_eq!(view.real_column(1), &[0.0, -1.0, -2.0]);
    }

    #[test]
    fn test_like_copies_layout() {
        let tile = tile_with(3);
        let other = Tile::like(&tile);
        assert!(other.is_empty());
        assert_eq!(other.num_runtime_real(), 1);
        assert!(Arc::ptr_eq(other.executor(), tile.executor()));
    }
}
