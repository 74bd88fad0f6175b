use glam::Quat;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockTexture};
use crate::graphics_device::TextureFormat;
use super::*;

fn context() -> RenderContext {
    RenderContext::new(Arc::new(MockGraphicsDevice::new())).unwrap()
}

fn texture(name: &str) -> Arc<dyn Texture> {
    Arc::new(MockTexture::new(name, 16, 16, TextureFormat::R8G8B8A8_SRGB))
}

// ============================================================================
// Quad
// ============================================================================

#[test]
fn test_quad_is_unit_square() {
    assert_eq!(std::mem::size_of::<SpriteVertex>(), 20);
    assert_eq!(SpriteVertex::layout().stride, 20);
    for vertex in SPRITE_QUAD {
        assert_eq!(vertex.position.x.abs(), 0.5);
        assert_eq!(vertex.position.y.abs(), 0.5);
        assert_eq!(vertex.position.z, 0.0);
    }
}

#[test]
fn test_quad_triangles_are_counter_clockwise() {
    for triangle in SPRITE_QUAD.chunks_exact(3) {
        let a = triangle[1].position - triangle[0].position;
        let b = triangle[2].position - triangle[0].position;
        assert!(a.cross(b).z > 0.0);
    }
}

// ============================================================================
// Uniforms
// ============================================================================

#[test]
fn test_uniform_scales_quad_by_size() {
    let sprite = SpriteComponent::new(texture("leaf")).with_size(Vec2::new(2.0, 3.0));
    let transform = TransformComponent::new(Vec3::new(1.0, 0.0, 0.0));
    let data = sprite.uniform_data(&transform);
    assert_eq!(data.model.transform_point3(Vec3::new(0.5, 0.5, 0.0)), Vec3::new(2.0, 1.5, 0.0));
    assert_eq!(data.color, Vec4::ONE);
}

#[test]
fn test_uniform_follows_rotation() {
    let sprite = SpriteComponent::new(texture("leaf"));
    let transform = TransformComponent::default().with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
    let corner = sprite.uniform_data(&transform).model.transform_point3(Vec3::new(0.5, 0.0, 0.0));
    assert!((corner - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);
}

// ============================================================================
// GPU side
// ============================================================================

#[test]
fn test_allocate_binds_texture() {
    let ctx = context();
    let leaf = texture("leaf");
    let mut sprite = SpriteComponent::new(leaf.clone()).with_color(Vec4::new(1.0, 0.0, 0.0, 0.5));
    sprite.allocate(&ctx).unwrap();

    let set = sprite.descriptor_set().unwrap();
    assert!(Arc::ptr_eq(set.bound_texture(1).unwrap(), &leaf));
    assert!(sprite.update(&TransformComponent::default()).is_ok());
}

#[test]
fn test_set_texture_rebinds() {
    let ctx = context();
    let mut sprite = SpriteComponent::new(texture("leaf"));
    sprite.allocate(&ctx).unwrap();

    let bark = texture("bark");
    sprite.set_texture(&ctx, bark.clone()).unwrap();
    assert!(Arc::ptr_eq(sprite.descriptor_set().unwrap().bound_texture(1).unwrap(), &bark));
}

#[test]
fn test_update_requires_allocation() {
    let sprite = SpriteComponent::new(texture("leaf"));
    assert!(matches!(sprite.update(&TransformComponent::default()), Err(Error::InvalidResource(_))));
}
