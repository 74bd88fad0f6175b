/// Frustum - six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed distance
/// - A point P is inside if dot(plane, P_homogeneous) >= 0 for all planes
///
/// Projections follow the Vulkan convention (clip depth in [0, w]), so the
/// near plane comes from row 2 alone instead of row3 + row2.

use glam::{Mat4, Vec3, Vec4};
use crate::scene::AABB;

/// Result of a 3-way frustum/AABB classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_view_projection(&Mat4::IDENTITY)
    }
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix (Gribb & Hartmann).
    ///
    /// With a Y-flipped projection the bottom and top planes trade places
    /// in world space; culling is unaffected.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [
            row3 + row0,
            row3 - row0,
            row3 + row1,
            row3 - row1,
            row2,
            row3 - row2,
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance of a point to one plane (positive = inside)
    pub fn distance(&self, plane: usize, point: Vec3) -> f32 {
        self.planes[plane].truncate().dot(point) + self.planes[plane].w
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|i| self.distance(i, point) >= 0.0)
    }

    /// Conservative AABB test ("positive vertex"): may keep boxes that are
    /// just outside near a corner, never rejects a visible one.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.classify_aabb(aabb) != FrustumTest::Outside
    }

    /// Classify an AABB against the frustum (3-way test).
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.truncate();

            let p_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            let n_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.min, aabb.max);
            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
