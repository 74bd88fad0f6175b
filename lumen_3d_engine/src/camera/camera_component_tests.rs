use glam::{Quat, Vec4};
use super::*;

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_default_parameters() {
    let camera = CameraComponent::default();
    assert_eq!(camera.fov_y_degrees(), 60.0);
    assert_eq!(camera.near(), 0.1);
    assert_eq!(camera.far(), 1000.0);
    assert_eq!(camera.aspect(), 1.0);
    assert!(camera.is_enabled());
}

#[test]
fn test_projection_is_y_flipped_vulkan_depth() {
    let camera = CameraComponent::new(90.0, 1.0, 1.0, 100.0);
    let proj = camera.projection();

    // A point above the axis lands at negative NDC y (Vulkan y points down)
    let clip = proj * Vec4::new(0.0, 1.0, -2.0, 1.0);
    assert!(clip.y / clip.w < 0.0);

    // Near plane maps to depth 0, far plane to depth 1
    let near = proj * Vec4::new(0.0, 0.0, -1.0, 1.0);
    let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
    assert!((near.z / near.w).abs() < 1e-5);
    assert!((far.z / far.w - 1.0).abs() < 1e-4);

    let roundtrip = camera.inverse_projection() * proj;
    assert!(roundtrip.abs_diff_eq(Mat4::IDENTITY, 1e-4));
}

#[test]
fn test_setters_mark_projection_stale_until_update() {
    let mut camera = CameraComponent::default();
    let transform = TransformComponent::default();
    camera.update(&transform);
    let before = camera.projection();

    camera.set_viewport_size(1920, 1080);
    assert!(camera.needs_update());
    assert_eq!(camera.projection(), before, "projection only changes on update");

    assert!(camera.update(&transform));
    assert!((camera.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
    assert_ne!(camera.projection(), before);
}

#[test]
fn test_zero_viewport_keeps_aspect() {
    let mut camera = CameraComponent::new(60.0, 1.5, 0.1, 10.0);
    camera.set_viewport_size(0, 0);
    assert_eq!(camera.aspect(), 1.5);
    camera.set_viewport_size(800, 0);
    assert_eq!(camera.aspect(), 1.5);
}

// ============================================================================
// View
// ============================================================================

#[test]
fn test_view_inverts_transform_without_scale() {
    let mut camera = CameraComponent::default();
    let transform = TransformComponent::new(Vec3::new(0.0, 2.0, 5.0))
        .with_rotation(Quat::from_rotation_y(0.3))
        .with_scale(Vec3::splat(7.0));

    camera.update(&transform);
    assert!((camera.position() - Vec3::new(0.0, 2.0, 5.0)).length() < 1e-5);

    let eye_space = camera.view().transform_point3(Vec3::new(0.0, 2.0, 5.0));
    assert!(eye_space.length() < 1e-5, "eye sits at the view-space origin");
    assert!((camera.view() * camera.inverse_view()).abs_diff_eq(Mat4::IDENTITY, 1e-5));
}

#[test]
fn test_update_skips_when_nothing_changed() {
    let mut camera = CameraComponent::default();
    let mut transform = TransformComponent::default();
    assert!(camera.update(&transform));
    transform.clear_changed();

    assert!(!camera.update(&transform));

    transform.translate(Vec3::X);
    assert!(camera.update(&transform));
}

#[test]
fn test_take_changed_reports_once() {
    let mut camera = CameraComponent::default();
    assert!(camera.take_changed());
    assert!(!camera.take_changed());

    let mut transform = TransformComponent::default();
    transform.translate(Vec3::Z);
    camera.update(&transform);
    assert!(camera.take_changed());
    assert!(!camera.take_changed());
}

// ============================================================================
// Frustum
// ============================================================================

#[test]
fn test_frustum_follows_camera() {
    let mut camera = CameraComponent::new(60.0, 1.0, 0.1, 100.0);
    let transform = TransformComponent::new(Vec3::new(0.0, 0.0, 10.0));
    camera.update(&transform);

    assert!(camera.frustum().contains_point(Vec3::ZERO));
    assert!(!camera.frustum().contains_point(Vec3::new(0.0, 0.0, 20.0)), "behind the eye");
}
