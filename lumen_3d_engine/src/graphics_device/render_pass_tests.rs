use super::*;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;

fn slot(kind: AttachmentKind, format: TextureFormat, samples: SampleCount) -> AttachmentSlot {
    AttachmentSlot::new(kind, format, samples)
}

fn msaa_lighting_signature() -> AttachmentSignature {
    AttachmentSignature::new(vec![
        slot(AttachmentKind::Color, TextureFormat::R16G16B16A16_SFLOAT, SampleCount::S4),
        slot(AttachmentKind::DepthStencil, TextureFormat::D32_SFLOAT, SampleCount::S4),
        slot(AttachmentKind::Resolve, TextureFormat::R16G16B16A16_SFLOAT, SampleCount::S1),
    ])
}

// ============================================================================
// AttachmentSignature
// ============================================================================

#[test]
fn test_signature_counts() {
    let sig = msaa_lighting_signature();
    assert_eq!(sig.len(), 3);
    assert_eq!(sig.color_count(), 1);
    assert_eq!(sig.resolve_count(), 1);
    assert!(sig.has_depth());
    assert_eq!(sig.samples(), SampleCount::S4);
}

#[test]
fn test_signature_samples_ignores_resolves() {
    let sig = AttachmentSignature::new(vec![slot(AttachmentKind::Resolve, TextureFormat::R8_UNORM, SampleCount::S1)]);
    assert_eq!(sig.samples(), SampleCount::S1);
    assert_eq!(AttachmentSignature::default().samples(), SampleCount::S1);
}

#[test]
fn test_signature_diff() {
    let a = msaa_lighting_signature();
    assert!(a.diff(&a.clone()).is_empty());

    let mut slots = a.slots().to_vec();
    slots[1].samples = SampleCount::S1;
    let b = AttachmentSignature::new(slots);
    let diff = a.diff(&b);
    assert_eq!(diff.len(), 1);
    assert!(diff[0].starts_with("slot 1"));

    let shorter = AttachmentSignature::new(a.slots()[..2].to_vec());
    assert!(a.diff(&shorter)[0].contains("slot count 3 != 2"));
}

// ============================================================================
// Load/store policy
// ============================================================================

#[test]
fn test_policy_color_offscreen_clear_store() {
    let sig = AttachmentSignature::new(vec![
        slot(AttachmentKind::Color, TextureFormat::R8G8B8A8_UNORM, SampleCount::S1),
        slot(AttachmentKind::Offscreen, TextureFormat::R8_UNORM, SampleCount::S1),
    ]);
    let desc = RenderPassDesc::from_signature("pp", PassType::PostProcess, sig).unwrap();
    for attachment in &desc.attachments {
        assert_eq!(attachment.load_op, LoadOp::Clear);
        assert_eq!(attachment.store_op, StoreOp::Store);
        assert_eq!(attachment.initial_layout, ImageLayout::ColorAttachment);
        assert_eq!(attachment.final_layout, ImageLayout::ColorAttachment);
    }
}

#[test]
fn test_policy_resolve_and_swapchain_dont_care() {
    let desc = RenderPassDesc::from_signature("lighting", PassType::Lighting, msaa_lighting_signature()).unwrap();
    assert_eq!(desc.attachments[2].load_op, LoadOp::DontCare);
    assert_eq!(desc.attachments[2].store_op, StoreOp::Store);

    let present = AttachmentSignature::new(vec![slot(AttachmentKind::SwapChain, TextureFormat::B8G8R8A8_SRGB, SampleCount::S1)]);
    let desc = RenderPassDesc::from_signature("present", PassType::Present, present).unwrap();
    let swap = desc.attachments[0];
    assert_eq!(swap.load_op, LoadOp::DontCare);
    assert_eq!(swap.store_op, StoreOp::Store);
    assert_eq!(swap.initial_layout, ImageLayout::Undefined);
    assert_eq!(swap.final_layout, ImageLayout::PresentSrc);
}

#[test]
fn test_policy_depth_clears_except_lighting() {
    let sig = msaa_lighting_signature();
    for pass_type in [PassType::Geometry, PassType::PostProcess, PassType::Shadow] {
        let desc = RenderPassDesc::from_signature("p", pass_type, sig.clone()).unwrap();
        assert_eq!(desc.attachments[1].load_op, LoadOp::Clear, "{:?}", pass_type);
        assert_eq!(desc.attachments[1].stencil_load_op, LoadOp::DontCare);
    }
    let lighting = RenderPassDesc::from_signature("lighting", PassType::Lighting, sig).unwrap();
    let depth = lighting.attachments[1];
    assert_eq!(depth.load_op, LoadOp::Load);
    assert_eq!(depth.store_op, StoreOp::Store);
    assert_eq!(depth.stencil_load_op, LoadOp::Load);
    assert_eq!(depth.initial_layout, ImageLayout::DepthStencilAttachment);
    assert_eq!(depth.final_layout, ImageLayout::DepthStencilAttachment);
}

#[test]
fn test_reference_indices() {
    let desc = RenderPassDesc::from_signature("lighting", PassType::Lighting, msaa_lighting_signature()).unwrap();
    assert_eq!(desc.color_indices(), vec![0]);
    assert_eq!(desc.depth_index(), Some(1));
    assert_eq!(desc.resolve_indices(), vec![2]);
}

#[test]
fn test_resolve_count_must_match_colors() {
    let sig = AttachmentSignature::new(vec![
        slot(AttachmentKind::Color, TextureFormat::R8G8B8A8_UNORM, SampleCount::S4),
        slot(AttachmentKind::Color, TextureFormat::R8G8B8A8_UNORM, SampleCount::S4),
        slot(AttachmentKind::Resolve, TextureFormat::R8G8B8A8_UNORM, SampleCount::S1),
    ]);
    assert!(matches!(
        RenderPassDesc::from_signature("bad", PassType::Geometry, sig),
        Err(Error::InvalidResource(_))
    ));
}

// ============================================================================
// Dependencies
// ============================================================================

#[test]
fn test_shadow_dependencies() {
    let sig = AttachmentSignature::new(vec![slot(AttachmentKind::DepthStencil, TextureFormat::D32_SFLOAT, SampleCount::S1)]);
    let desc = RenderPassDesc::from_signature("shadow", PassType::Shadow, sig).unwrap();
    assert_eq!(desc.dependencies.len(), 2);

    let into = desc.dependencies[0];
    assert_eq!(into.src, SubpassRef::External);
    assert_eq!(into.dst, SubpassRef::Index(0));
    assert_eq!(into.src_stages, PipelineStages::FRAGMENT_SHADER);
    assert_eq!(into.dst_access, AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE);

    let out = desc.dependencies[1];
    assert_eq!(out.dst, SubpassRef::External);
    assert_eq!(out.src_stages, PipelineStages::LATE_FRAGMENT_TESTS);
    assert_eq!(out.dst_access, AccessFlags::SHADER_READ);
}

#[test]
fn test_other_passes_single_external_dependency() {
    let desc = RenderPassDesc::from_signature("geometry", PassType::Geometry, msaa_lighting_signature()).unwrap();
    assert_eq!(desc.dependencies.len(), 1);
    assert_eq!(desc.dependencies[0].src, SubpassRef::External);
    assert!(desc.dependencies[0].dst_access.contains(AccessFlags::COLOR_ATTACHMENT_WRITE));
}

// ============================================================================
// Bake / rebake
// ============================================================================

#[test]
fn test_bake_and_rebake() {
    let device = MockGraphicsDevice::new();
    let builder = RenderPassBuilder::new("lighting", PassType::Lighting, msaa_lighting_signature()).unwrap();
    let mut pass = builder.bake(&device).unwrap();
    assert_eq!(pass.name(), "lighting");
    assert_eq!(pass.gpu().name(), "lighting");
    assert_eq!(pass.signature().samples(), SampleCount::S4);

    let single = AttachmentSignature::new(vec![
        slot(AttachmentKind::Color, TextureFormat::R16G16B16A16_SFLOAT, SampleCount::S1),
        slot(AttachmentKind::DepthStencil, TextureFormat::D32_SFLOAT, SampleCount::S1),
    ]);
    pass.rebake(&device, single.clone()).unwrap();
    assert_eq!(pass.signature(), &single);
    assert_eq!(pass.pass_type(), PassType::Lighting);
    assert_eq!(device.state().lock().unwrap().render_passes_created.len(), 2);
}
