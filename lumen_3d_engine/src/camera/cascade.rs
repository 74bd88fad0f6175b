/// Cascaded shadow map splits
///
/// The camera frustum is cut along its depth into `count` slices. Split
/// distances blend a logarithmic and a uniform distribution. Each slice is
/// wrapped in a bounding sphere whose orthographic light projection is
/// snapped to the shadow-map texel grid so shadows do not shimmer when the
/// camera moves.

use glam::{Mat4, Vec3, Vec4};
use super::camera_component::CameraComponent;

/// Weight of the logarithmic distribution in the split blend
pub const CASCADE_SPLIT_LAMBDA: f32 = 0.95;

/// Depth margin added in front of and behind each cascade's sphere
const CASCADE_DEPTH_MARGIN: f32 = 10.0;

/// One shadow cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cascade {
    /// Light view-projection for this slice (Y flipped, depth [0, 1])
    pub view_projection: Mat4,
    /// Negated view-space depth where the slice ends
    pub split_depth: f32,
}

/// Normalized split positions in (0, 1], one per cascade
pub fn cascade_splits(near: f32, far: f32, count: u32, lambda: f32) -> Vec<f32> {
    let range = far - near;
    let ratio = far / near;
    (0..count)
        .map(|i| {
            let p = (i + 1) as f32 / count as f32;
            let log = near * ratio.powf(p);
            let uniform = near + range * p;
            let d = lambda * (log - uniform) + uniform;
            (d - near) / range
        })
        .collect()
}

/// Cascades covering `camera`'s frustum for a directional light;
/// `light_dir` points from the scene toward the light
pub fn compute_cascades(camera: &CameraComponent, light_dir: Vec3, count: u32, shadow_map_dim: u32) -> Vec<Cascade> {
    let near = camera.near();
    let clip_range = camera.far() - near;
    let light_dir = light_dir.try_normalize().unwrap_or(Vec3::NEG_Y);
    let inv_camera = camera.view_projection().inverse();

    let corners_ndc = [
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ];
    let frustum_corners = corners_ndc.map(|ndc| {
        let world = inv_camera * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        world.truncate() / world.w
    });

    // Light "up" must not be parallel to the light direction
    let up = if light_dir.dot(Vec3::Y).abs() > 0.999 { Vec3::Z } else { Vec3::Y };

    let mut cascades = Vec::with_capacity(count as usize);
    let mut last_split = 0.0;
    for split in cascade_splits(near, camera.far(), count, CASCADE_SPLIT_LAMBDA) {
        let mut corners = frustum_corners;
        for j in 0..4 {
            let edge = frustum_corners[j + 4] - frustum_corners[j];
            corners[j + 4] = frustum_corners[j] + edge * split;
            corners[j] = frustum_corners[j] + edge * last_split;
        }

        let center = corners.iter().copied().sum::<Vec3>() / 8.0;
        let radius = corners.iter().map(|c| (*c - center).length()).fold(0.0f32, f32::max);
        let radius = (radius * 16.0).ceil() / 16.0;

        let texel = (radius * 2.0) / shadow_map_dim.max(1) as f32;
        let eye = ((center + light_dir * radius) / texel).floor() * texel;

        let light_view = Mat4::look_at_rh(eye, center, up);
        let mut light_ortho = Mat4::orthographic_rh(
            -radius,
            radius,
            -radius,
            radius,
            -radius - CASCADE_DEPTH_MARGIN,
            radius + CASCADE_DEPTH_MARGIN,
        );
        light_ortho.y_axis.y *= -1.0;

        cascades.push(Cascade {
            view_projection: light_ortho * light_view,
            split_depth: -(near + split * clip_range),
        });
        last_split = split;
    }
    cascades
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
