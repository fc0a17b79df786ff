//! Flat particle storage.
//!
//! Particle state lives in parallel arrays (structure-of-arrays), one slot
//! per particle across all fields. The split by field is what makes the
//! tick passes safely parallel: a pass mutably chunks only the arrays it
//! writes (densities and pressures, say) while reading the others through
//! shared slices, with no aliasing and no copies.
//!
//! Particles never reference each other; neighbor relationships are
//! transient and recomputed each tick by the spatial index.

use glam::Vec3;

use crate::params::ParamsHandle;

/// Structure-of-arrays particle state.
///
/// All vectors always have identical length (one slot per particle).
/// Mutation during a tick is the stepper's job; everyone else reads
/// through `&ParticleStore`.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    /// World-space positions.
    pub positions: Vec<Vec3>,
    /// Velocities.
    pub velocities: Vec<Vec3>,
    /// Force accumulators, overwritten every tick.
    pub forces: Vec<Vec3>,
    /// Summed densities from the most recent density pass.
    pub densities: Vec<f32>,
    /// Pressures from the most recent density pass (clamped non-negative).
    pub pressures: Vec<f32>,
    /// Parameter-set handle per particle.
    pub params: Vec<ParamsHandle>,
}

impl ParticleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the store holds no particles.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append one particle at `position` bound to `handle`, at rest with
    /// cleared transient fields.
    pub fn push(&mut self, position: Vec3, handle: ParamsHandle) {
        self.positions.push(position);
        self.velocities.push(Vec3::ZERO);
        self.forces.push(Vec3::ZERO);
        self.densities.push(0.0);
        self.pressures.push(0.0);
        self.params.push(handle);
    }

    /// Reserve room for `additional` more particles across all fields.
    pub fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.velocities.reserve(additional);
        self.forces.reserve(additional);
        self.densities.reserve(additional);
        self.pressures.reserve(additional);
        self.params.reserve(additional);
    }

    /// Remove all particles, keeping allocations for re-spawn.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.velocities.clear();
        self.forces.clear();
        self.densities.clear();
        self.pressures.clear();
        self.params.clear();
    }
}
