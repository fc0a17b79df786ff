//! Fixed-order physics stepper.
//!
//! One tick runs five passes over the particle store, always in the same
//! order: rebuild the neighbor grid, sum densities and pressures,
//! accumulate forces, integrate with semi-implicit Euler, then resolve
//! plane contacts. Passes 2 through 5 fan out over a dedicated thread
//! pool; each pass completes on all particles before the next starts, so
//! a pass only ever reads values the previous pass finished writing.
//!
//! Work is split into contiguous index ranges, one per worker, and every
//! per-particle sum runs sequentially inside its range. Given the same
//! inputs and worker count, a tick is bit-for-bit reproducible no matter
//! how the pool schedules the ranges.

use glam::Vec3;
use rayon::prelude::*;

use crate::eos;
use crate::neighbor::NeighborGrid;
use crate::params::ParamsRegistry;
use crate::particle::ParticleStore;
use crate::plane::{BoundarySet, Plane};
use crate::sph;
use crate::SimError;

/// Coefficient of restitution for plane contacts. Below one so repeated
/// bounces shed energy and resting stacks settle.
pub const RESTITUTION: f32 = 0.5;

/// Global down direction; each set's `gravity_mult` scales it.
pub const GRAVITY_DIR: Vec3 = Vec3::NEG_Y;

/// Runs the five-pass tick on a dedicated worker pool.
///
/// The pool is sized once at construction and never grows or shrinks,
/// keeping scheduling and results stable across the simulation's life.
#[derive(Debug)]
pub struct Stepper {
    pool: rayon::ThreadPool,
    grid: NeighborGrid,
    worker_count: usize,
}

impl Stepper {
    /// Build a stepper with a fixed pool of `worker_count` threads.
    pub fn new(worker_count: usize) -> Result<Self, SimError> {
        if worker_count == 0 {
            return Err(SimError::InvalidConfiguration(
                "worker_count must be at least 1".into(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .build()
            .map_err(|e| {
                SimError::InvalidConfiguration(format!("failed to build worker pool: {e}"))
            })?;
        tracing::info!("Physics stepper ready with {} worker threads", worker_count);
        Ok(Self {
            pool,
            grid: NeighborGrid::new(),
            worker_count,
        })
    }

    /// Number of worker threads fixed at construction.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Handles stored in `store` must come from `registry`; the facade
    /// guarantees this, so the hot path indexes without checks.
    pub fn step(
        &mut self,
        store: &mut ParticleStore,
        registry: &ParamsRegistry,
        bounds: &BoundarySet,
        dt: f32,
    ) {
        debug_assert!(dt > 0.0 && dt.is_finite(), "dt must be positive and finite");
        if store.is_empty() {
            return;
        }

        let n = store.len();
        let chunk = n.div_ceil(self.worker_count).max(1);
        let support = registry.max_smoothing_radius();

        // --- 1. Rebuild the spatial index ---
        self.grid.build(&store.positions, support);

        let grid = &self.grid;
        let sets = registry.sets();
        let ParticleStore {
            positions,
            velocities,
            forces,
            densities,
            pressures,
            params,
        } = store;

        // --- 2. Density and pressure ---
        {
            let positions = &positions[..];
            let params = &params[..];
            self.pool.install(|| {
                densities
                    .par_chunks_mut(chunk)
                    .zip(pressures.par_chunks_mut(chunk))
                    .enumerate()
                    .for_each(|(c, (dens, pres))| {
                        let base = c * chunk;
                        for (k, (density, pressure)) in
                            dens.iter_mut().zip(pres.iter_mut()).enumerate()
                        {
                            let i = base + k;
                            let set = &sets[params[i].index() as usize];
                            let h = set.smoothing_radius;
                            // Self-contribution keeps isolated particles at a
                            // finite density, so later divisions are safe.
                            let mut rho = set.particle_mass * sph::poly6(0.0, h);
                            grid.for_each_neighbor(i, positions, support, |j| {
                                let r_sq = positions[i].distance_squared(positions[j]);
                                if r_sq < set.smoothing_radius_sq {
                                    rho += sets[params[j].index() as usize].particle_mass
                                        * sph::poly6(r_sq, h);
                                }
                            });
                            *density = rho;
                            *pressure = eos::stiffness_eos(rho, set.rest_density, eos::GAS_STIFFNESS)
                                .max(0.0);
                        }
                    });
            });
        }

        // --- 3. Force accumulation ---
        {
            let positions = &positions[..];
            let velocities = &velocities[..];
            let densities = &densities[..];
            let pressures = &pressures[..];
            let params = &params[..];
            self.pool.install(|| {
                forces
                    .par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(c, out)| {
                        let base = c * chunk;
                        for (k, force) in out.iter_mut().enumerate() {
                            let i = base + k;
                            let set = &sets[params[i].index() as usize];
                            let h = set.smoothing_radius;
                            let p_i = positions[i];
                            let v_i = velocities[i];
                            let pi_over_rho_sq = pressures[i] / (densities[i] * densities[i]);

                            let mut pressure_grad = Vec3::ZERO;
                            let mut viscosity_lap = Vec3::ZERO;
                            grid.for_each_neighbor(i, positions, support, |j| {
                                let r_vec = p_i - positions[j];
                                let r_sq = r_vec.length_squared();
                                if r_sq >= set.smoothing_radius_sq || r_sq < sph::MIN_DISTANCE {
                                    return;
                                }
                                let r = r_sq.sqrt();
                                let set_j = &sets[params[j].index() as usize];
                                let pj_over_rho_sq =
                                    pressures[j] / (densities[j] * densities[j]);
                                pressure_grad += set_j.particle_mass
                                    * (pi_over_rho_sq + pj_over_rho_sq)
                                    * sph::spiky_gradient(r_vec, r, h);
                                viscosity_lap += set_j.particle_mass
                                    * ((velocities[j] - v_i) / densities[j])
                                    * sph::viscosity_laplacian(r, h);
                            });

                            let gravity = GRAVITY_DIR * (set.gravity_mult * set.particle_mass);
                            let drag = -v_i * set.particle_drag;
                            *force = -set.particle_mass * pressure_grad
                                + set.particle_viscosity * viscosity_lap
                                + gravity
                                + drag;
                        }
                    });
            });
        }

        // --- 4. Semi-implicit Euler integration ---
        {
            let forces = &forces[..];
            let params = &params[..];
            self.pool.install(|| {
                velocities
                    .par_chunks_mut(chunk)
                    .zip(positions.par_chunks_mut(chunk))
                    .enumerate()
                    .for_each(|(c, (vel, pos))| {
                        let base = c * chunk;
                        for (k, (v, p)) in vel.iter_mut().zip(pos.iter_mut()).enumerate() {
                            let i = base + k;
                            let set = &sets[params[i].index() as usize];
                            *v += forces[i] * (dt / set.particle_mass);
                            *p += *v * dt;
                        }
                    });
            });
        }

        // --- 5. Plane contact resolution ---
        if !bounds.is_empty() {
            let planes = bounds.all();
            let params = &params[..];
            self.pool.install(|| {
                positions
                    .par_chunks_mut(chunk)
                    .zip(velocities.par_chunks_mut(chunk))
                    .enumerate()
                    .for_each(|(c, (pos, vel))| {
                        let base = c * chunk;
                        for (k, (p, v)) in pos.iter_mut().zip(vel.iter_mut()).enumerate() {
                            let i = base + k;
                            let radius = sets[params[i].index() as usize].particle_radius;
                            for plane in planes {
                                resolve_plane_contact(p, v, plane, radius);
                            }
                        }
                    });
            });
        }
    }
}

/// Push a particle out of one plane patch and reflect its inward velocity.
///
/// Contact applies while the particle center is within `radius` of the
/// surface on the normal side (or behind it, after tunneling) and its
/// projection lies inside the rectangular extents. Planes are resolved in
/// insertion order; later planes see the state earlier ones corrected.
#[inline]
fn resolve_plane_contact(position: &mut Vec3, velocity: &mut Vec3, plane: &Plane, radius: f32) {
    let dist = plane.signed_distance(*position);
    if dist >= radius || !plane.contains_projection(*position) {
        return;
    }
    let normal = plane.normal();
    *position += normal * (radius - dist);
    let v_n = velocity.dot(normal);
    if v_n < 0.0 {
        *velocity -= (1.0 + RESTITUTION) * v_n * normal;
    }
}
