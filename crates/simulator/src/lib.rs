//! Scene Assembly Layer
//!
//! This crate sits on top of `kernel` and provides:
//! - `Simulator`, the single owning facade over registry, particles,
//!   boundary planes, and the physics stepper
//! - Deterministic bulk spawning around a scene spawn origin, with the
//!   recorded spawn sequence replayed exactly on reset
//! - JSON scene configuration with defaults and validation
//! - On-demand scene diagnostics (kinetic energy, peak speed, densities)

#![warn(missing_docs)]

pub mod config;
pub mod spawn;

pub use config::SceneConfig;

use glam::{Vec2, Vec3};
use kernel::{
    BoundarySet, ParameterSet, ParamsHandle, ParamsRegistry, ParticleStore, Plane, SimError,
    Stepper,
};

/// Upper bound on a single integration step, in seconds. Frame times from
/// a stalled caller (breakpoints, tab switches) are clamped here instead
/// of being integrated as one giant step.
pub const MAX_STEP_SECONDS: f32 = 0.05;

/// Ticks between periodic progress logs.
const LOG_EVERY_TICKS: u64 = 120;

/// One recorded bulk-spawn request, replayed verbatim on reset.
#[derive(Debug, Clone, Copy)]
struct SpawnOp {
    count: usize,
    handle: ParamsHandle,
}

/// Point-in-time scene measurements, computed on demand.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics {
    /// Number of live particles.
    pub particle_count: usize,
    /// Total kinetic energy, summed in f64 to survive large scenes.
    pub total_kinetic_energy: f64,
    /// Fastest particle speed.
    pub max_speed: f32,
    /// Mean density over all particles (zero before the first tick).
    pub mean_density: f32,
}

/// Owning facade over one fluid simulation.
///
/// All configuration goes through fallible methods that validate up
/// front; [`Simulator::update`] itself cannot fail. The worker pool is
/// sized once at construction and never changes.
///
/// # Example
/// ```
/// use glam::{Vec2, Vec3};
/// use kernel::ParameterSet;
/// use simulator::Simulator;
///
/// let mut sim = Simulator::new(2, Vec3::new(-6.0, 0.0, 0.0))?;
/// let water =
///     sim.add_parameter_set(ParameterSet::new(0.7, 1.0, 15.0, 2000.0, 0.1, 1.0, 0.025))?;
/// sim.add_plane(Vec3::ZERO, Vec3::X, Vec3::Z, Vec2::splat(20.0))?;
/// sim.add_particles(100, water)?;
/// sim.update(16.67);
/// assert_eq!(sim.particles().len(), 100);
/// # Ok::<(), kernel::SimError>(())
/// ```
#[derive(Debug)]
pub struct Simulator {
    registry: ParamsRegistry,
    store: ParticleStore,
    bounds: BoundarySet,
    stepper: Stepper,
    spawn_origin: Vec3,
    spawn_ops: Vec<SpawnOp>,
    tick: u64,
}

impl Simulator {
    /// Create a simulator with a fixed worker pool and spawn origin.
    pub fn new(worker_count: usize, spawn_origin: Vec3) -> Result<Self, SimError> {
        if !spawn_origin.is_finite() {
            return Err(SimError::InvalidConfiguration(format!(
                "spawn_origin must be finite, got {spawn_origin}"
            )));
        }
        let stepper = Stepper::new(worker_count)?;
        tracing::info!(
            "Simulator created: {} workers, spawn origin {}",
            worker_count,
            spawn_origin
        );
        Ok(Self {
            registry: ParamsRegistry::new(),
            store: ParticleStore::new(),
            bounds: BoundarySet::new(),
            stepper,
            spawn_origin,
            spawn_ops: Vec::new(),
            tick: 0,
        })
    }

    /// Register a parameter set, returning its opaque handle.
    pub fn add_parameter_set(&mut self, params: ParameterSet) -> Result<ParamsHandle, SimError> {
        let handle = self.registry.register(params)?;
        tracing::info!(
            "Registered parameter set {}: radius {}, smoothing {}, rest density {}",
            handle.index(),
            params.particle_radius,
            params.smoothing_radius,
            params.rest_density
        );
        Ok(handle)
    }

    /// Look up a registered parameter set.
    pub fn parameter_set(&self, handle: ParamsHandle) -> Result<&ParameterSet, SimError> {
        self.registry.get(handle)
    }

    /// Spawn `count` particles bound to `handle` near the spawn origin.
    ///
    /// The request is recorded; [`Simulator::reset`] replays all recorded
    /// spawns in order with the same seeds, restoring the exact initial
    /// configuration.
    pub fn add_particles(&mut self, count: usize, handle: ParamsHandle) -> Result<(), SimError> {
        // Fail before touching the store so a bad handle leaves no trace.
        let radius = self.registry.get(handle)?.particle_radius;

        let seed = self.spawn_ops.len() as u64;
        let positions = spawn::block_positions(count, self.spawn_origin, radius, seed);
        self.store.reserve(count);
        for position in positions {
            self.store.push(position, handle);
        }
        self.spawn_ops.push(SpawnOp { count, handle });

        tracing::info!(
            "Spawned {} particles for set {} ({} total)",
            count,
            handle.index(),
            self.store.len()
        );
        Ok(())
    }

    /// Add a rectangular boundary patch.
    pub fn add_plane(
        &mut self,
        point: Vec3,
        dir_u: Vec3,
        dir_v: Vec3,
        half_extents: Vec2,
    ) -> Result<(), SimError> {
        let plane = Plane::new(point, dir_u, dir_v, half_extents)?;
        tracing::info!(
            "Added boundary patch at {} with normal {}",
            plane.point(),
            plane.normal()
        );
        self.bounds.add(plane);
        Ok(())
    }

    /// Advance the simulation by `dt_ms` milliseconds.
    ///
    /// Non-positive or non-finite frame times are ignored; oversized ones
    /// are clamped to [`MAX_STEP_SECONDS`].
    pub fn update(&mut self, dt_ms: f32) {
        if dt_ms <= 0.0 || !dt_ms.is_finite() {
            return;
        }
        let dt = (dt_ms * 1.0e-3).min(MAX_STEP_SECONDS);
        self.stepper
            .step(&mut self.store, &self.registry, &self.bounds, dt);
        self.tick += 1;

        if self.tick % LOG_EVERY_TICKS == 0 {
            let d = self.diagnostics();
            tracing::debug!(
                "Tick {}: {} particles, ke={:.3}, max_speed={:.3}, mean_density={:.3}",
                self.tick,
                d.particle_count,
                d.total_kinetic_energy,
                d.max_speed,
                d.mean_density
            );
        }
    }

    /// Discard all particles and replay the recorded spawn sequence.
    ///
    /// Parameter sets and planes are kept; the tick counter restarts.
    pub fn reset(&mut self) {
        self.store.clear();
        for (seed, op) in self.spawn_ops.iter().enumerate() {
            let radius = self.registry.sets()[op.handle.index() as usize].particle_radius;
            let positions =
                spawn::block_positions(op.count, self.spawn_origin, radius, seed as u64);
            self.store.reserve(op.count);
            for position in positions {
                self.store.push(position, op.handle);
            }
        }
        self.tick = 0;
        tracing::info!(
            "Reset complete: {} spawn ops replayed, {} particles",
            self.spawn_ops.len(),
            self.store.len()
        );
    }

    /// Read-only view of the particle state.
    pub fn particles(&self) -> &ParticleStore {
        &self.store
    }

    /// Boundary patches in insertion order.
    pub fn planes(&self) -> &[Plane] {
        self.bounds.all()
    }

    /// Worker threads fixed at construction.
    pub fn worker_count(&self) -> usize {
        self.stepper.worker_count()
    }

    /// The spawn origin configured at construction.
    pub fn spawn_origin(&self) -> Vec3 {
        self.spawn_origin
    }

    /// Ticks advanced since construction or the last reset.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Compute current scene measurements.
    pub fn diagnostics(&self) -> Diagnostics {
        let sets = self.registry.sets();
        let mut total_kinetic_energy = 0.0f64;
        let mut max_speed = 0.0f32;
        for (v, handle) in self.store.velocities.iter().zip(&self.store.params) {
            let mass = sets[handle.index() as usize].particle_mass;
            let speed_sq = v.length_squared();
            total_kinetic_energy += 0.5 * mass as f64 * speed_sq as f64;
            max_speed = max_speed.max(speed_sq);
        }

        let particle_count = self.store.len();
        let mean_density = if particle_count == 0 {
            0.0
        } else {
            self.store.densities.iter().sum::<f32>() / particle_count as f32
        };

        Diagnostics {
            particle_count,
            total_kinetic_energy,
            max_speed: max_speed.sqrt(),
            mean_density,
        }
    }
}
