use super::*;

// ============================================================================
// BufferDesc validation
// ============================================================================

#[test]
fn test_vertex_buffer_requires_initial_data() {
    let desc = BufferDesc::new("quad_vertices", 64, BufferUsage::Vertex);
    assert!(desc.validate_initial_data(None).is_err());
    assert!(desc.validate_initial_data(Some(&[0u8; 64])).is_ok());
}

#[test]
fn test_uniform_buffer_may_start_empty() {
    let desc = BufferDesc::new("camera_ubo", 256, BufferUsage::Uniform);
    assert!(desc.validate_initial_data(None).is_ok());
}

#[test]
fn test_initial_data_larger_than_buffer_is_rejected() {
    let desc = BufferDesc::new("indices", 8, BufferUsage::Index);
    assert!(matches!(
        desc.validate_initial_data(Some(&[0u8; 12])),
        Err(Error::InvalidResource(_))
    ));
}

#[test]
fn test_zero_sized_buffer_is_rejected() {
    let desc = BufferDesc::new("empty", 0, BufferUsage::Uniform);
    assert!(desc.validate_initial_data(None).is_err());
}

// ============================================================================
// Update range checks
// ============================================================================

#[test]
fn test_check_update_within_range() {
    let desc = BufferDesc::new("lights", 128, BufferUsage::Uniform);
    assert!(check_update(&desc, 0, 128).is_ok());
    assert!(check_update(&desc, 64, 64).is_ok());
}

#[test]
fn test_check_update_past_end() {
    let desc = BufferDesc::new("lights", 128, BufferUsage::Uniform);
    assert!(check_update(&desc, 64, 65).is_err());
    assert!(check_update(&desc, u64::MAX, 1).is_err());
}

#[test]
fn test_check_update_device_local_rejected() {
    let desc = BufferDesc::new("mesh_vertices", 128, BufferUsage::Vertex);
    assert!(check_update(&desc, 0, 4).is_err());
}

#[test]
fn test_buffer_format_sizes() {
    assert_eq!(BufferFormat::R32G32_SFLOAT.size_bytes(), 8);
    assert_eq!(BufferFormat::R32G32B32_SFLOAT.size_bytes(), 12);
    assert_eq!(BufferFormat::R8G8B8A8_UNORM.size_bytes(), 4);
}
