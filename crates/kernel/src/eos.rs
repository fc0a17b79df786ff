//! Equation of state relating density excess to pressure.
//!
//! Uses the linear stiffness form from Muller et al. (2003),
//! `P = k * (rho - rho0)`: pressure grows in proportion to how far the
//! local density exceeds the rest density. The solver clamps stored
//! pressure at zero so under-dense regions never pull particles together
//! (cohesion is modeled by viscosity, not by negative pressure).
//!
//! Units are scene units, not SI: the interactive scenes this solver
//! serves are tuned in abstract lengths and masses.

/// Default pressure stiffness `k` (scene units).
///
/// The classic interactive-demo value. Larger values resist compression
/// harder but demand smaller timesteps; at 60 Hz steps this keeps the
/// recovered splash-box scene stable.
pub const GAS_STIFFNESS: f32 = 2000.0;

/// Linear stiffness equation of state.
///
/// ```text
/// P = k * (rho - rho0)
/// ```
///
/// # Arguments
/// * `density` - Current summed density rho.
/// * `rest_density` - Rest density rho0 at which the fluid is unpressurized.
/// * `stiffness` - Stiffness constant k (see [`GAS_STIFFNESS`]).
///
/// # Returns
/// Pressure in scene units. Negative when `density < rest_density`;
/// callers that must not model tension clamp the result at zero.
#[inline]
pub fn stiffness_eos(density: f32, rest_density: f32, stiffness: f32) -> f32 {
    stiffness * (density - rest_density)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_at_rest_density() {
        let p = stiffness_eos(15.0, 15.0, GAS_STIFFNESS);
        assert!(p.abs() < 1.0e-6, "pressure at rest density should be 0, got {p}");
    }

    #[test]
    fn positive_when_compressed() {
        let p = stiffness_eos(16.0, 15.0, GAS_STIFFNESS);
        assert!(p > 0.0, "compressed fluid should have positive pressure, got {p}");
    }

    #[test]
    fn negative_when_expanded() {
        // The raw EOS models tension; the solver clamps this at zero.
        let p = stiffness_eos(14.0, 15.0, GAS_STIFFNESS);
        assert!(p < 0.0, "expanded fluid should report negative raw pressure, got {p}");
    }

    #[test]
    fn monotonic_in_density() {
        let rest = 15.0;
        let mut prev = f32::NEG_INFINITY;
        for rho in [10.0_f32, 14.0, 15.0, 18.0, 30.0, 100.0] {
            let p = stiffness_eos(rho, rest, GAS_STIFFNESS);
            assert!(p > prev, "pressure must increase with density");
            prev = p;
        }
    }

    #[test]
    fn proportional_to_stiffness() {
        let p1 = stiffness_eos(20.0, 15.0, 1000.0);
        let p2 = stiffness_eos(20.0, 15.0, 2000.0);
        assert!((p2 - 2.0 * p1).abs() < 1.0e-3);
    }
}
