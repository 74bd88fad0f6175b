/// TransformComponent - world position, rotation and scale of an entity.
///
/// Every setter raises the `changed` flag. Cameras consult it to know when
/// their view matrix is stale; the owner clears it once the frame is done.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    changed: bool,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl TransformComponent {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            changed: true,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation.normalize();
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Model matrix: translate * rotate * scale
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Inverse-transpose of the upper 3x3, widened back to a Mat4
    pub fn normal_matrix(&self) -> Mat4 {
        let upper = Mat3::from_mat4(self.world_matrix());
        if upper.determinant().abs() <= f32::EPSILON {
            return Mat4::IDENTITY;
        }
        Mat4::from_mat3(upper.inverse().transpose())
    }

    /// Unit vector the entity looks along (-Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    // ===== SETTERS =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.changed = true;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.changed = true;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.changed = true;
    }

    /// Rotation from XYZ Euler angles in degrees
    pub fn set_rotation_degrees(&mut self, degrees: Vec3) {
        let radians = Vec3::new(degrees.x.to_radians(), degrees.y.to_radians(), degrees.z.to_radians());
        self.set_rotation(Quat::from_euler(EulerRot::XYZ, radians.x, radians.y, radians.z));
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.changed = true;
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
