/// CameraComponent - perspective camera parameters and derived matrices.
///
/// Projection parameters are edited through setters that mark the
/// projection stale; `update` rebuilds whatever is stale from the owning
/// entity's transform and refreshes the frustum. `take_changed` reports
/// (once) that something moved, which the renderer uses to refresh the
/// camera uniforms and shadow cascades.

use glam::{Mat4, Vec3};
use super::frustum::Frustum;
use super::transform::TransformComponent;

#[derive(Debug, Clone)]
pub struct CameraComponent {
    fov_y_degrees: f32,
    near: f32,
    far: f32,
    aspect: f32,
    enabled: bool,

    projection: Mat4,
    inv_projection: Mat4,
    view: Mat4,
    inv_view: Mat4,
    frustum: Frustum,

    projection_dirty: bool,
    view_dirty: bool,
    any_changed: bool,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::new(60.0, 1.0, 0.1, 1000.0)
    }
}

impl CameraComponent {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_y_degrees,
            near,
            far,
            aspect,
            enabled: true,
            projection: Mat4::IDENTITY,
            inv_projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inv_view: Mat4::IDENTITY,
            frustum: Frustum::default(),
            projection_dirty: true,
            view_dirty: true,
            any_changed: true,
        };
        camera.rebuild_projection();
        camera.refresh_frustum();
        camera
    }

    // ===== GETTERS =====

    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y_degrees
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Vulkan-convention perspective (Y flipped, depth in [0, 1])
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn inverse_projection(&self) -> Mat4 {
        self.inv_projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn inverse_view(&self) -> Mat4 {
        self.inv_view
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World-space eye position
    pub fn position(&self) -> Vec3 {
        self.inv_view.w_axis.truncate()
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn needs_update(&self) -> bool {
        self.projection_dirty || self.view_dirty
    }

    // ===== SETTERS =====

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_fov_y_degrees(&mut self, degrees: f32) {
        self.fov_y_degrees = degrees;
        self.projection_dirty = true;
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.projection_dirty = true;
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection_dirty = true;
    }

    /// Aspect from a viewport size; ignored while minimized (0 height)
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.set_aspect_ratio(width as f32 / height as f32);
        }
    }

    pub fn mark_view_dirty(&mut self) {
        self.view_dirty = true;
    }

    // ===== UPDATE =====

    /// Rebuild stale matrices from `transform`. Returns true when anything
    /// was rebuilt.
    pub fn update(&mut self, transform: &TransformComponent) -> bool {
        let mut rebuilt = false;
        if self.projection_dirty {
            self.rebuild_projection();
            rebuilt = true;
        }
        if self.view_dirty || transform.is_changed() {
            self.rebuild_view(transform);
            rebuilt = true;
        }
        if rebuilt {
            self.refresh_frustum();
        }
        rebuilt
    }

    /// Report and clear the "something changed" flag
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.any_changed, false)
    }

    fn rebuild_projection(&mut self) {
        let mut projection =
            Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far);
        projection.y_axis.y *= -1.0;
        self.projection = projection;
        self.inv_projection = projection.inverse();
        self.projection_dirty = false;
        self.any_changed = true;
    }

    fn rebuild_view(&mut self, transform: &TransformComponent) {
        // Scale never reaches the view matrix
        self.inv_view = Mat4::from_rotation_translation(transform.rotation(), transform.position());
        self.view = self.inv_view.inverse();
        self.view_dirty = false;
        self.any_changed = true;
    }

    fn refresh_frustum(&mut self) {
        self.frustum = Frustum::from_view_projection(&self.view_projection());
    }
}

#[cfg(test)]
#[path = "camera_component_tests.rs"]
mod tests;
