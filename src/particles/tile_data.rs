//! Tile views
//!
//! A view is a non-owning snapshot of one tile's columns, captured for the
//! duration of a single operation. [`ConstParticleTileData`] is built from
//! shared slices and can be read from any number of threads.
//! [`ParticleTileData`] holds raw column pointers so that parallel loops can
//! write disjoint slots through [`ParticleSlot`] handles; it borrows its tile
//! mutably for its whole lifetime.

use std::marker::PhantomData;

use super::particle::{Particle, ParticleInt, ParticleReal};

/// Read-only view over a tile
#[derive(Clone)]
pub struct ConstParticleTileData<'a, P, const NAR: usize, const NAI: usize> {
    particles: &'a [P],
    real_data: [&'a [ParticleReal]; NAR],
    int_data: [&'a [ParticleInt]; NAI],
    runtime_real_data: Vec<&'a [ParticleReal]>,
    runtime_int_data: Vec<&'a [ParticleInt]>,
}

impl<'a, P: Particle, const NAR: usize, const NAI: usize> ConstParticleTileData<'a, P, NAR, NAI> {
    pub(crate) fn new(
        particles: &'a [P],
        real_data: [&'a [ParticleReal]; NAR],
        int_data: [&'a [ParticleInt]; NAI],
        runtime_real_data: Vec<&'a [ParticleReal]>,
        runtime_int_data: Vec<&'a [ParticleInt]>,
    ) -> Self {
        let len = particles.len();
        assert!(
            real_data.iter().chain(runtime_real_data.iter()).all(|c| c.len() == len)
                && int_data.iter().chain(runtime_int_data.iter()).all(|c| c.len() == len),
            "every column of a tile view must hold {} entries",
            len
        );

        Self {
            particles,
            real_data,
            int_data,
            runtime_real_data,
            runtime_int_data,
        }
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn num_runtime_real(&self) -> usize {
        self.runtime_real_data.len()
    }

    pub fn num_runtime_int(&self) -> usize {
        self.runtime_int_data.len()
    }

    pub fn particles(&self) -> &'a [P] {
        self.particles
    }

    pub fn particle(&self, i: usize) -> &'a P {
        &self.particles[i]
    }

    pub fn real(&self, comp: usize, i: usize) -> ParticleReal {
        self.real_data[comp][i]
    }

    pub fn int(&self, comp: usize, i: usize) -> ParticleInt {
        self.int_data[comp][i]
    }

    pub fn runtime_real(&self, comp: usize, i: usize) -> ParticleReal {
        self.runtime_real_data[comp][i]
    }

    pub fn runtime_int(&self, comp: usize, i: usize) -> ParticleInt {
        self.runtime_int_data[comp][i]
    }

    pub fn real_column(&self, comp: usize) -> &'a [ParticleReal] {
        self.real_data[comp]
    }

    pub fn int_column(&self, comp: usize) -> &'a [ParticleInt] {
        self.int_data[comp]
    }

    pub fn runtime_real_column(&self, comp: usize) -> &'a [ParticleReal] {
        self.runtime_real_data[comp]
    }

    pub fn runtime_int_column(&self, comp: usize) -> &'a [ParticleInt] {
        self.runtime_int_data[comp]
    }
}

/// Mutable view over a tile
pub struct ParticleTileData<'a, P, const NAR: usize, const NAI: usize> {
    len: usize,
    particles: *mut P,
    real_data: [*mut ParticleReal; NAR],
    int_data: [*mut ParticleInt; NAI],
    runtime_real_data: Vec<*mut ParticleReal>,
    runtime_int_data: Vec<*mut ParticleInt>,
    _tile: PhantomData<&'a mut [P]>,
}

// SAFETY: the pointers come from `&'a mut` slices that stay borrowed for 'a.
// Writes require `&mut self` or go through slots the engine hands out for
// pairwise distinct indices; shared access only reads.
unsafe impl<P: Send, const NAR: usize, const NAI: usize> Send for ParticleTileData<'_, P, NAR, NAI> {}
unsafe impl<P: Sync, const NAR: usize, const NAI: usize> Sync for ParticleTileData<'_, P, NAR, NAI> {}

impl<'a, P: Particle, const NAR: usize, const NAI: usize> ParticleTileData<'a, P, NAR, NAI> {
    pub(crate) fn new(
        particles: &'a mut [P],
        real_data: [&'a mut [ParticleReal]; NAR],
        int_data: [&'a mut [ParticleInt]; NAI],
        runtime_real_data: Vec<&'a mut [ParticleReal]>,
        runtime_int_data: Vec<&'a mut [ParticleInt]>,
    ) -> Self {
        let len = particles.len();
        assert!(
            real_data.iter().chain(runtime_real_data.iter()).all(|c| c.len() == len)
                && int_data.iter().chain(runtime_int_data.iter()).all(|c| c.len() == len),
            "every column of a tile view must hold {} entries",
            len
        );

        Self {
            len,
            particles: particles.as_mut_ptr(),
            real_data: real_data.map(|c| c.as_mut_ptr()),
            int_data: int_data.map(|c| c.as_mut_ptr()),
            runtime_real_data: runtime_real_data.into_iter().map(|c| c.as_mut_ptr()).collect(),
            runtime_int_data: runtime_int_data.into_iter().map(|c| c.as_mut_ptr()).collect(),
            _tile: PhantomData,
        }
    }

    pub fn num_particles(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_runtime_real(&self) -> usize {
        self.runtime_real_data.len()
    }

    pub fn num_runtime_int(&self) -> usize {
        self.runtime_int_data.len()
    }

    /// Read-only view of the same columns
    pub fn as_const(&self) -> ConstParticleTileData<'_, P, NAR, NAI> {
        let len = self.len;
        // SAFETY: every pointer covers `len` initialized entries borrowed for 'a,
        // and `&self` rules out concurrent writes through this view.
        unsafe {
            ConstParticleTileData {
                particles: std::slice::from_raw_parts(self.particles, len),
                real_data: self.real_data.map(|c| std::slice::from_raw_parts(c as *const _, len)),
                int_data: self.int_data.map(|c| std::slice::from_raw_parts(c as *const _, len)),
                runtime_real_data: self
                    .runtime_real_data
                    .iter()
                    .map(|&c| std::slice::from_raw_parts(c as *const _, len))
                    .collect(),
                runtime_int_data: self
                    .runtime_int_data
                    .iter()
                    .map(|&c| std::slice::from_raw_parts(c as *const _, len))
                    .collect(),
            }
        }
    }

    /// Write handle for slot `i`
    pub fn slot(&mut self, i: usize) -> ParticleSlot<'_, 'a, P, NAR, NAI> {
        assert!(i < self.len, "slot {} out of range for {} particles", i, self.len);
        ParticleSlot { view: self, index: i }
    }

    /// Exchange the full records at slots `i` and `j` of this view
    pub fn swap(&mut self, i: usize, j: usize) {
        assert!(
            i < self.len && j < self.len,
            "swap of slots {} and {} out of range for {} particles",
            i,
            j,
            self.len
        );
        if i == j {
            return;
        }
        // SAFETY: both indices are in bounds and distinct; `&mut self` keeps
        // every other writer out.
        unsafe {
            let mut a = self.slot_unchecked(i);
            let mut b = self.slot_unchecked(j);
            a.swap_with(&mut b);
        }
    }

    /// Write handle for slot `i` without exclusive access to the view.
    ///
    /// # Safety
    /// `i` must be below `num_particles()`, and no other live slot or
    /// reference may access index `i` while the returned slot is alive.
    pub(crate) unsafe fn slot_unchecked(&self, i: usize) -> ParticleSlot<'_, 'a, P, NAR, NAI> {
        debug_assert!(i < self.len);
        ParticleSlot { view: self, index: i }
    }
}

/// Exclusive write handle for one slot of a [`ParticleTileData`]
pub struct ParticleSlot<'v, 'a, P, const NAR: usize, const NAI: usize> {
    view: &'v ParticleTileData<'a, P, NAR, NAI>,
    index: usize,
}

impl<P: Particle, const NAR: usize, const NAI: usize> ParticleSlot<'_, '_, P, NAR, NAI> {
    /// Index of this slot in its tile
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn num_runtime_real(&self) -> usize {
        self.view.num_runtime_real()
    }

    pub fn num_runtime_int(&self) -> usize {
        self.view.num_runtime_int()
    }

    // SAFETY (all accessors below): `index < len` is checked when the slot is
    // created and the slot is the only accessor of this index while it lives.

    pub fn particle(&self) -> &P {
        unsafe { &*self.view.particles.add(self.index) }
    }

    pub fn particle_mut(&mut self) -> &mut P {
        unsafe { &mut *self.view.particles.add(self.index) }
    }

    pub fn set_particle(&mut self, particle: P) {
        *self.particle_mut() = particle;
    }

    pub fn real(&self, comp: usize) -> ParticleReal {
        unsafe { *self.view.real_data[comp].add(self.index) }
    }

    pub fn set_real(&mut self, comp: usize, value: ParticleReal) {
        unsafe { *self.view.real_data[comp].add(self.index) = value }
    }

    pub fn int(&self, comp: usize) -> ParticleInt {
        unsafe { *self.view.int_data[comp].add(self.index) }
    }

    pub fn set_int(&mut self, comp: usize, value: ParticleInt) {
        unsafe { *self.view.int_data[comp].add(self.index) = value }
    }

    pub fn runtime_real(&self, comp: usize) -> ParticleReal {
        unsafe { *self.view.runtime_real_data[comp].add(self.index) }
    }

    pub fn set_runtime_real(&mut self, comp: usize, value: ParticleReal) {
        unsafe { *self.view.runtime_real_data[comp].add(self.index) = value }
    }

    pub fn runtime_int(&self, comp: usize) -> ParticleInt {
        unsafe { *self.view.runtime_int_data[comp].add(self.index) }
    }

    pub fn set_runtime_int(&mut self, comp: usize, value: ParticleInt) {
        unsafe { *self.view.runtime_int_data[comp].add(self.index) = value }
    }

    /// Copy the full record at `src_i` of `src` into this slot.
    ///
    /// Panics if the runtime attribute counts of the two tiles differ.
    pub fn copy_from(&mut self, src: &ConstParticleTileData<'_, P, NAR, NAI>, src_i: usize) {
        assert_eq!(
            self.num_runtime_real(),
            src.num_runtime_real(),
            "runtime real attribute count mismatch"
        );
        assert_eq!(
            self.num_runtime_int(),
            src.num_runtime_int(),
            "runtime int attribute count mismatch"
        );

        self.set_particle(*src.particle(src_i));
        for comp in 0..NAR {
            self.set_real(comp, src.real(comp, src_i));
        }
        for comp in 0..self.num_runtime_real() {
            self.set_runtime_real(comp, src.runtime_real(comp, src_i));
        }
        for comp in 0..NAI {
            self.set_int(comp, src.int(comp, src_i));
        }
        for comp in 0..self.num_runtime_int() {
            self.set_runtime_int(comp, src.runtime_int(comp, src_i));
        }
    }

    /// Exchange the full records of two slots.
    ///
    /// Panics if the runtime attribute counts of the two tiles differ.
    pub fn swap_with(&mut self, other: &mut ParticleSlot<'_, '_, P, NAR, NAI>) {
        assert_eq!(
            self.num_runtime_real(),
            other.num_runtime_real(),
            "runtime real attribute count mismatch"
        );
        assert_eq!(
            self.num_runtime_int(),
            other.num_runtime_int(),
            "runtime int attribute count mismatch"
        );

        let (a, b) = (self.index, other.index);
        // SAFETY: both slots are in bounds and exclusively held; `ptr::swap`
        // tolerates the two slots naming the same location.
        unsafe {
            std::ptr::swap(self.view.particles.add(a), other.view.particles.add(b));
            for comp in 0..NAR {
                std::ptr::swap(self.view.real_data[comp].add(a), other.view.real_data[comp].add(b));
            }
            for comp in 0..self.num_runtime_real() {
                std::ptr::swap(
                    self.view.runtime_real_data[comp].add(a),
                    other.view.runtime_real_data[comp].add(b),
                );
            }
            for comp in 0..NAI {
                std::ptr::swap(self.view.int_data[comp].add(a), other.view.int_data[comp].add(b));
            }
            for comp in 0..self.num_runtime_int() {
                std::ptr::swap(
                    self.view.runtime_int_data[comp].add(a),
                    other.view.runtime_int_data[comp].add(b),
                );
            }
        }
    }
}
