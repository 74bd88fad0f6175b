use glam::{Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self { min: Vec3::ZERO, max: Vec3::ZERO }
    }
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box around `points`; a zero box at the origin when empty
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        iter.fold(Self::new(first, first), |acc, p| Self::new(acc.min.min(p), acc.max.max(p)))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Transform this local-space AABB by a matrix (Arvo's method: exact
    /// bounds of the transformed box without visiting its 8 corners).
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let translation = matrix.w_axis.truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
