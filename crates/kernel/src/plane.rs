//! Finite planar boundary patches.
//!
//! Collision geometry is a set of rectangular plane patches, not infinite
//! half-spaces: a patch only stops particles whose projection falls inside
//! its extents, which is what lets an open-top box spill over its walls.
//! Patches are validated at construction and immutable afterwards.

use glam::{Vec2, Vec3};

use crate::SimError;

/// Tolerance for the orthonormality checks on patch directions.
const DIRECTION_TOLERANCE: f32 = 1.0e-4;

/// A finite rectangular boundary patch.
///
/// Described by a point on the plane, two orthonormal in-plane directions
/// `u`/`v`, and half-extents along each. The collision normal is
/// `v x u`, precomputed at construction; scene builders order their
/// directions so the normal faces the fluid they contain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    point: Vec3,
    dir_u: Vec3,
    dir_v: Vec3,
    half_extents: Vec2,
    normal: Vec3,
}

impl Plane {
    /// Validate and build a patch.
    ///
    /// Fails with `InvalidConfiguration` if the directions are not unit
    /// length, not mutually orthogonal, or the half-extents are not
    /// strictly positive and finite.
    pub fn new(
        point: Vec3,
        dir_u: Vec3,
        dir_v: Vec3,
        half_extents: Vec2,
    ) -> Result<Self, SimError> {
        if !point.is_finite() || !dir_u.is_finite() || !dir_v.is_finite() {
            return Err(SimError::InvalidConfiguration(
                "plane point and directions must be finite".to_string(),
            ));
        }
        if (dir_u.length() - 1.0).abs() > DIRECTION_TOLERANCE {
            return Err(SimError::InvalidConfiguration(format!(
                "dir_u must be unit length, got |u| = {}",
                dir_u.length()
            )));
        }
        if (dir_v.length() - 1.0).abs() > DIRECTION_TOLERANCE {
            return Err(SimError::InvalidConfiguration(format!(
                "dir_v must be unit length, got |v| = {}",
                dir_v.length()
            )));
        }
        if dir_u.dot(dir_v).abs() > DIRECTION_TOLERANCE {
            return Err(SimError::InvalidConfiguration(format!(
                "plane directions must be orthogonal, got u.v = {}",
                dir_u.dot(dir_v)
            )));
        }
        if !half_extents.is_finite()
            || half_extents.x <= 0.0
            || half_extents.y <= 0.0
        {
            return Err(SimError::InvalidConfiguration(format!(
                "half_extents must be positive and finite, got {half_extents}"
            )));
        }
        Ok(Self {
            point,
            dir_u,
            dir_v,
            half_extents,
            normal: dir_v.cross(dir_u),
        })
    }

    /// A point on the plane (the patch center).
    #[inline]
    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// First in-plane unit direction.
    #[inline]
    pub fn dir_u(&self) -> Vec3 {
        self.dir_u
    }

    /// Second in-plane unit direction.
    #[inline]
    pub fn dir_v(&self) -> Vec3 {
        self.dir_v
    }

    /// Half-extents along `dir_u` and `dir_v`.
    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    /// Unit collision normal (`v x u`).
    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed distance from `p` to the plane along the normal.
    ///
    /// Positive on the side the normal faces.
    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }

    /// Whether `p` projects onto the patch within its rectangular extents.
    #[inline]
    pub fn contains_projection(&self, p: Vec3) -> bool {
        let rel = p - self.point;
        rel.dot(self.dir_u).abs() <= self.half_extents.x
            && rel.dot(self.dir_v).abs() <= self.half_extents.y
    }

    /// The four patch corners, in winding order around the center.
    ///
    /// For renderers drawing the boundary as a quad.
    pub fn corners(&self) -> [Vec3; 4] {
        let u = self.dir_u * self.half_extents.x;
        let v = self.dir_v * self.half_extents.y;
        [
            self.point - u - v,
            self.point + u - v,
            self.point + u + v,
            self.point - u + v,
        ]
    }
}

/// Ordered, append-only collection of boundary patches.
///
/// Configured once at scene setup; read by the stepper for collision and
/// by the renderer for drawing.
#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    planes: Vec<Plane>,
}

impl BoundarySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { planes: Vec::new() }
    }

    /// Append a patch. Patches cannot be removed or mutated afterwards.
    pub fn add(&mut self, plane: Plane) {
        self.planes.push(plane);
    }

    /// All patches in insertion order.
    pub fn all(&self) -> &[Plane] {
        &self.planes
    }

    /// Number of patches.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Whether the set holds no patches.
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}
