//! SPH Fluid Solver Kernel
//!
//! This crate provides the core solver for Smoothed Particle Hydrodynamics
//! (SPH) fluid simulation. It is scene-agnostic and compute-focused; scene
//! assembly and spawning live in the `simulator` crate on top.
//!
//! # Modules
//! - [`params`] -- Registered parameter sets behind opaque handles.
//! - [`particle`] -- Struct-of-arrays particle storage.
//! - [`plane`] -- Finite rectangular boundary patches.
//! - [`neighbor`] -- Uniform-grid spatial hash for neighbor search.
//! - [`sph`] -- Poly6 / spiky / viscosity smoothing kernels.
//! - [`eos`] -- Stiffness equation of state.
//! - [`stepper`] -- Fixed-order five-pass tick on a dedicated worker pool.
//!
//! Everything that can fail does so at configuration time with a
//! [`SimError`]; the per-tick path is infallible.

#![warn(missing_docs)]

pub mod eos;
pub mod neighbor;
pub mod params;
pub mod particle;
pub mod plane;
pub mod sph;
pub mod stepper;

pub use neighbor::NeighborGrid;
pub use params::{ParameterSet, ParamsHandle, ParamsRegistry};
pub use particle::ParticleStore;
pub use plane::{BoundarySet, Plane};
pub use stepper::Stepper;

use std::fmt;

/// Errors surfaced while configuring a simulation.
///
/// The per-tick path never returns errors; anything that could fail is
/// validated when sets, planes, and workers are set up.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A parameter-set handle this registry never issued.
    InvalidHandle(u32),
    /// A configuration value the solver cannot run with.
    InvalidConfiguration(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHandle(id) => write!(f, "unknown parameter-set handle {id}"),
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_format_for_operators() {
        let err = SimError::InvalidHandle(7);
        assert_eq!(err.to_string(), "unknown parameter-set handle 7");

        let err = SimError::InvalidConfiguration("rest_density must be positive".into());
        assert!(err.to_string().contains("rest_density"));
    }
}
