//! Per-group physical constants and the registry that owns them.
//!
//! Particle populations share physics constants through registered
//! [`ParameterSet`]s, referenced by opaque [`ParamsHandle`]s. A handle is a
//! plain index into the registry's arena, so particles stay fixed-size
//! value records with no embedded references. Sets are validated when
//! registered and immutable afterwards; the hot path indexes the arena
//! directly and never revalidates.

use crate::SimError;

/// Physical constants for one particle group.
///
/// Immutable once registered. `smoothing_radius_sq` is kept precomputed
/// next to `smoothing_radius` so hot loops never re-square it; construct
/// through [`ParameterSet::new`] to keep the pair consistent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    /// Collision radius against boundary patches.
    pub particle_radius: f32,
    /// Kernel support radius h; neighbors beyond it contribute nothing.
    pub smoothing_radius: f32,
    /// Precomputed h^2 for squared-distance comparisons.
    pub smoothing_radius_sq: f32,
    /// Density at which the group is unpressurized.
    pub rest_density: f32,
    /// Gravitational acceleration magnitude (scene units / s^2) applied
    /// along the global down direction.
    pub gravity_mult: f32,
    /// Mass of each particle in the group.
    pub particle_mass: f32,
    /// Viscosity coefficient weighting velocity smoothing toward neighbors.
    pub particle_viscosity: f32,
    /// Linear drag coefficient opposing current velocity.
    pub particle_drag: f32,
}

impl ParameterSet {
    /// Build a parameter set, deriving the precomputed squared smoothing
    /// radius.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        particle_radius: f32,
        smoothing_radius: f32,
        rest_density: f32,
        gravity_mult: f32,
        particle_mass: f32,
        particle_viscosity: f32,
        particle_drag: f32,
    ) -> Self {
        Self {
            particle_radius,
            smoothing_radius,
            smoothing_radius_sq: smoothing_radius * smoothing_radius,
            rest_density,
            gravity_mult,
            particle_mass,
            particle_viscosity,
            particle_drag,
        }
    }

    /// Check the set for values the solver cannot run with.
    ///
    /// Fails fast at configuration time so the per-tick hot path can index
    /// and divide without guards.
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.particle_radius.is_finite() || self.particle_radius <= 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "particle_radius must be positive and finite, got {}",
                self.particle_radius
            )));
        }
        if !self.smoothing_radius.is_finite() || self.smoothing_radius <= 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "smoothing_radius must be positive and finite, got {}",
                self.smoothing_radius
            )));
        }
        let expected_sq = self.smoothing_radius * self.smoothing_radius;
        if (self.smoothing_radius_sq - expected_sq).abs() > 1.0e-4 * expected_sq {
            return Err(SimError::InvalidConfiguration(format!(
                "smoothing_radius_sq {} is not the square of smoothing_radius {}",
                self.smoothing_radius_sq, self.smoothing_radius
            )));
        }
        if !self.rest_density.is_finite() || self.rest_density <= 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "rest_density must be positive and finite, got {}",
                self.rest_density
            )));
        }
        if !self.gravity_mult.is_finite() {
            return Err(SimError::InvalidConfiguration(format!(
                "gravity_mult must be finite, got {}",
                self.gravity_mult
            )));
        }
        if !self.particle_mass.is_finite() || self.particle_mass <= 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "particle_mass must be positive and finite, got {}",
                self.particle_mass
            )));
        }
        if !self.particle_viscosity.is_finite() || self.particle_viscosity < 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "particle_viscosity must be non-negative and finite, got {}",
                self.particle_viscosity
            )));
        }
        if !self.particle_drag.is_finite() || self.particle_drag < 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "particle_drag must be non-negative and finite, got {}",
                self.particle_drag
            )));
        }
        Ok(())
    }
}

/// Opaque handle to a registered [`ParameterSet`].
///
/// Handles are monotonically increasing and never reused within a
/// registry's lifetime. Only the registry issues them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamsHandle(u32);

impl ParamsHandle {
    /// Raw index value, usable to index [`ParamsRegistry::sets`] directly
    /// once the handle has been validated.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Arena of immutable parameter sets, indexed by [`ParamsHandle`].
#[derive(Debug, Default)]
pub struct ParamsRegistry {
    sets: Vec<ParameterSet>,
}

impl ParamsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Validate and store a parameter set, returning its handle.
    ///
    /// Handles are handed out in registration order; there is no removal,
    /// so every issued handle stays valid for the registry's lifetime.
    pub fn register(&mut self, params: ParameterSet) -> Result<ParamsHandle, SimError> {
        params.validate()?;
        let handle = ParamsHandle(self.sets.len() as u32);
        self.sets.push(params);
        Ok(handle)
    }

    /// Constant-time lookup of a registered set.
    pub fn get(&self, handle: ParamsHandle) -> Result<&ParameterSet, SimError> {
        self.sets
            .get(handle.0 as usize)
            .ok_or(SimError::InvalidHandle(handle.0))
    }

    /// All registered sets in registration order. [`ParamsHandle::index`]
    /// values are indices into this slice.
    pub fn sets(&self) -> &[ParameterSet] {
        &self.sets
    }

    /// Largest smoothing radius across all registered sets, or zero when
    /// the registry is empty.
    ///
    /// The spatial index uses this as its cell size: any pair of particles
    /// within smoothing range then falls in the same or an adjacent cell
    /// regardless of which sets the two particles belong to.
    pub fn max_smoothing_radius(&self) -> f32 {
        self.sets
            .iter()
            .map(|s| s.smoothing_radius)
            .fold(0.0, f32::max)
    }

    /// Number of registered sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether no sets are registered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_set() -> ParameterSet {
        ParameterSet::new(0.7, 1.0, 15.0, 2000.0, 0.1, 1.0, 0.025)
    }

    #[test]
    fn register_then_get_roundtrip() {
        let mut reg = ParamsRegistry::new();
        let handle = reg.register(valid_set()).unwrap();
        let got = reg.get(handle).unwrap();
        assert_eq!(*got, valid_set());
    }

    #[test]
    fn handles_are_monotonic() {
        let mut reg = ParamsRegistry::new();
        let a = reg.register(valid_set()).unwrap();
        let b = reg.register(valid_set()).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn unregistered_handle_fails() {
        let reg = ParamsRegistry::new();
        let err = reg.get(ParamsHandle(3)).unwrap_err();
        assert_eq!(err, SimError::InvalidHandle(3));
    }

    #[test]
    fn new_keeps_squared_radius_in_sync() {
        let set = ParameterSet::new(0.5, 2.5, 10.0, 0.0, 1.0, 0.0, 0.0);
        assert!((set.smoothing_radius_sq - 6.25).abs() < 1.0e-6);
        assert!(set.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut zero_h = valid_set();
        zero_h.smoothing_radius = 0.0;
        assert!(matches!(
            zero_h.validate(),
            Err(SimError::InvalidConfiguration(_))
        ));

        let mut negative_mass = valid_set();
        negative_mass.particle_mass = -0.1;
        assert!(negative_mass.validate().is_err());

        let mut nan_radius = valid_set();
        nan_radius.particle_radius = f32::NAN;
        assert!(nan_radius.validate().is_err());

        let mut negative_drag = valid_set();
        negative_drag.particle_drag = -1.0;
        assert!(negative_drag.validate().is_err());
    }

    #[test]
    fn validate_rejects_stale_squared_radius() {
        let mut set = valid_set();
        set.smoothing_radius = 2.0; // sq still 1.0
        assert!(matches!(
            set.validate(),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_gravity_and_drag_are_valid() {
        // Force-free groups are legitimate (used by stability checks).
        let set = ParameterSet::new(0.7, 1.0, 15.0, 0.0, 0.1, 0.0, 0.0);
        assert!(set.validate().is_ok());
    }

    #[test]
    fn max_smoothing_radius_spans_sets() {
        let mut reg = ParamsRegistry::new();
        assert_eq!(reg.max_smoothing_radius(), 0.0);
        reg.register(ParameterSet::new(0.3, 0.8, 10.0, 0.0, 0.1, 0.0, 0.0))
            .unwrap();
        reg.register(ParameterSet::new(0.7, 1.4, 15.0, 0.0, 0.1, 0.0, 0.0))
            .unwrap();
        assert!((reg.max_smoothing_radius() - 1.4).abs() < 1.0e-6);
    }
}
