//! SPH smoothing kernel functions.
//!
//! Implements the classic Muller et al. (2003) kernel family for 3D SPH:
//! poly6 for density summation, the spiky gradient for pressure forces, and
//! the viscosity Laplacian for internal friction. Each kernel is radially
//! symmetric and vanishes at the smoothing radius; poly6 is additionally
//! non-negative everywhere, which keeps density summation positive.
//!
//! The pairing is deliberate: poly6 has a vanishing gradient at r = 0, so
//! pressure forces use the spiky kernel instead (its gradient stays finite
//! and repulsive as particles approach), and the viscosity kernel has a
//! Laplacian that is positive across the whole support, so viscous forces
//! always damp relative motion rather than amplify it.

use std::f32::consts::PI;

use glam::Vec3;

/// Normalization constant for the 3D poly6 kernel: 315 / (64 * pi).
///
/// Divided by h^9 at evaluation time, this makes the kernel integrate to
/// one over its support for any smoothing radius h.
pub const POLY6_NORM_3D: f32 = 315.0 / (64.0 * PI);

/// Normalization constant for the 3D spiky kernel gradient: 45 / pi.
///
/// Divided by h^6 at evaluation time (the radial derivative of the spiky
/// kernel 15/(pi h^6) (h - r)^3).
pub const SPIKY_NORM_3D: f32 = 45.0 / PI;

/// Normalization constant for the 3D viscosity kernel Laplacian: 45 / pi.
///
/// Divided by h^6 at evaluation time.
pub const VISCOSITY_NORM_3D: f32 = 45.0 / PI;

/// Distances below this are treated as coincident particles: gradient
/// contributions are dropped instead of dividing by a vanishing length.
pub const MIN_DISTANCE: f32 = 1.0e-12;

/// Poly6 smoothing kernel in 3D, evaluated on the squared distance.
///
/// ```text
/// W(r, h) = (315 / (64 pi h^9)) * (h^2 - r^2)^3   for r <= h
/// W(r, h) = 0                                     for r > h
/// ```
///
/// Taking `r_sq` rather than `r` lets density summation skip the square
/// root entirely; the neighbor query already produces squared distances.
///
/// # Arguments
/// * `r_sq` - Squared distance between two particles (must be >= 0).
/// * `h` - Smoothing radius.
#[inline]
pub fn poly6(r_sq: f32, h: f32) -> f32 {
    let h_sq = h * h;
    if r_sq >= h_sq {
        return 0.0;
    }
    let t = h_sq - r_sq;
    POLY6_NORM_3D / h.powi(9) * t * t * t
}

/// Gradient of the spiky kernel in 3D.
///
/// ```text
/// nabla W = -(45 / (pi h^6)) * (h - r)^2 * (r_vec / |r_vec|)   for r <= h
/// ```
///
/// `r_vec` is the displacement from particle j to particle i; the returned
/// gradient therefore points from i toward j, so the usual pressure force
/// `-sum m_j (...) nabla W` pushes i away from an overdense neighbor.
/// Returns zero for `r >= h` and for (near-)coincident particles.
///
/// # Arguments
/// * `r_vec` - Displacement vector from particle j to particle i.
/// * `r` - Euclidean distance, precomputed (`r_vec.length()`).
/// * `h` - Smoothing radius.
#[inline]
pub fn spiky_gradient(r_vec: Vec3, r: f32, h: f32) -> Vec3 {
    if r >= h || r < MIN_DISTANCE {
        return Vec3::ZERO;
    }
    let t = h - r;
    -(SPIKY_NORM_3D / h.powi(6)) * t * t * (r_vec / r)
}

/// Laplacian of the viscosity kernel in 3D.
///
/// ```text
/// nabla^2 W = (45 / (pi h^6)) * (h - r)   for r <= h
/// ```
///
/// Positive across the whole support and zero at the smoothing radius, so
/// velocity-difference-weighted sums always act as damping.
///
/// # Arguments
/// * `r` - Euclidean distance (>= 0).
/// * `h` - Smoothing radius.
#[inline]
pub fn viscosity_laplacian(r: f32, h: f32) -> f32 {
    if r >= h {
        return 0.0;
    }
    VISCOSITY_NORM_3D / h.powi(6) * (h - r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poly6_zero_outside_support() {
        let h = 1.0;
        assert_eq!(poly6(h * h, h), 0.0);
        assert_eq!(poly6(4.0, h), 0.0);
    }

    #[test]
    fn poly6_positive_inside_support() {
        let h = 1.0;
        for r in [0.0_f32, 0.1, 0.5, 0.9, 0.999] {
            let w = poly6(r * r, h);
            assert!(w > 0.0, "W({r}) should be positive, got {w}");
        }
    }

    #[test]
    fn poly6_peaks_at_zero_distance() {
        let h = 1.0;
        let w0 = poly6(0.0, h);
        for r in [0.1_f32, 0.3, 0.6, 0.9] {
            assert!(poly6(r * r, h) < w0, "W should decrease away from r=0");
        }
        // Analytic peak: 315 / (64 pi h^3)
        let expected = 315.0 / (64.0 * PI);
        assert!((w0 - expected).abs() / expected < 1.0e-5);
    }

    #[test]
    fn poly6_integrates_to_one() {
        // Riemann sum of W over its support should be ~1 (the kernel is a
        // partition of unity in the continuum limit).
        let h = 1.0_f32;
        let step = 0.02_f32;
        let cells = (2.0 * h / step) as i32;
        let mut integral = 0.0_f64;
        for ix in 0..cells {
            for iy in 0..cells {
                for iz in 0..cells {
                    let x = -h + (ix as f32 + 0.5) * step;
                    let y = -h + (iy as f32 + 0.5) * step;
                    let z = -h + (iz as f32 + 0.5) * step;
                    let r_sq = x * x + y * y + z * z;
                    integral += (poly6(r_sq, h) * step * step * step) as f64;
                }
            }
        }
        assert!(
            (integral - 1.0).abs() < 0.02,
            "poly6 should integrate to ~1, got {integral:.4}"
        );
    }

    #[test]
    fn poly6_scales_with_smoothing_radius() {
        // Peak value scales as 1/h^3 so total volume stays normalized.
        let w_h1 = poly6(0.0, 1.0);
        let w_h2 = poly6(0.0, 2.0);
        assert!((w_h1 / w_h2 - 8.0).abs() < 1.0e-3);
    }

    #[test]
    fn spiky_gradient_points_toward_neighbor() {
        // Displacement from j to i along +x: the gradient must point toward
        // j (-x) so that the negated pressure sum pushes i away from j.
        let h = 1.0;
        let r_vec = Vec3::new(0.5, 0.0, 0.0);
        let g = spiky_gradient(r_vec, 0.5, h);
        assert!(g.x < 0.0, "gradient should oppose the displacement, got {g:?}");
        assert_eq!(g.y, 0.0);
        assert_eq!(g.z, 0.0);
    }

    #[test]
    fn spiky_gradient_antisymmetric() {
        let h = 1.0;
        let d = Vec3::new(0.3, -0.2, 0.1);
        let r = d.length();
        let g1 = spiky_gradient(d, r, h);
        let g2 = spiky_gradient(-d, r, h);
        assert!((g1 + g2).length() < 1.0e-6);
    }

    #[test]
    fn spiky_gradient_zero_at_support_and_overlap() {
        let h = 1.0;
        assert_eq!(spiky_gradient(Vec3::X, 1.0, h), Vec3::ZERO);
        assert_eq!(spiky_gradient(Vec3::ZERO, 0.0, h), Vec3::ZERO);
    }

    #[test]
    fn spiky_gradient_magnitude_grows_on_approach() {
        let h = 1.0;
        let far = spiky_gradient(Vec3::new(0.8, 0.0, 0.0), 0.8, h).length();
        let near = spiky_gradient(Vec3::new(0.2, 0.0, 0.0), 0.2, h).length();
        assert!(
            near > far,
            "closer pairs should repel harder: near={near}, far={far}"
        );
    }

    #[test]
    fn viscosity_laplacian_positive_inside_support() {
        let h = 1.0;
        for r in [0.0_f32, 0.2, 0.5, 0.9] {
            assert!(viscosity_laplacian(r, h) > 0.0);
        }
        assert_eq!(viscosity_laplacian(1.0, h), 0.0);
        assert_eq!(viscosity_laplacian(1.5, h), 0.0);
    }
}
