use super::*;
use crate::graphics_device::attachment::AttachmentKind;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockPipeline, MockShader};
use crate::graphics_device::render_pass::{AttachmentSlot, PassType, RenderPassBuilder};
use crate::graphics_device::shader::ShaderStage;
use crate::graphics_device::texture::TextureFormat;

fn gbuffer_signature(samples: SampleCount) -> AttachmentSignature {
    let mut slots: Vec<AttachmentSlot> = (0..6)
        .map(|_| AttachmentSlot::new(AttachmentKind::Color, TextureFormat::R16G16B16A16_SFLOAT, samples))
        .collect();
    slots.push(AttachmentSlot::new(AttachmentKind::DepthStencil, TextureFormat::D32_SFLOAT, samples));
    if samples.is_multisampled() {
        for _ in 0..6 {
            slots.push(AttachmentSlot::new(AttachmentKind::Resolve, TextureFormat::R16G16B16A16_SFLOAT, SampleCount::S1));
        }
    }
    AttachmentSignature::new(slots)
}

fn desc(signature: AttachmentSignature) -> PipelineDesc {
    PipelineDesc {
        name: "geometry".to_string(),
        vertex_shader: Arc::new(MockShader::new("geometry.vert", ShaderStage::Vertex)),
        fragment_shader: Arc::new(MockShader::new("geometry.frag", ShaderStage::Fragment)),
        vertex_layout: VertexLayout::default(),
        set_layouts: Vec::new(),
        push_constants: Vec::new(),
        properties: PipelineProperties::default(),
        signature,
    }
}

fn mock(pipeline: &Pipeline) -> &MockPipeline {
    pipeline.gpu().as_any().downcast_ref::<MockPipeline>().unwrap()
}

// ============================================================================
// Blend attachments
// ============================================================================

#[test]
fn test_blend_count_matches_color_outputs() {
    for samples in [SampleCount::S1, SampleCount::S4] {
        let sig = gbuffer_signature(samples);
        assert_eq!(blend_attachments(&sig, false).len(), 6);
    }
}

#[test]
fn test_blend_state_follows_alpha_flag() {
    let sig = gbuffer_signature(SampleCount::S1);
    assert!(blend_attachments(&sig, false).iter().all(|b| *b == ColorBlendAttachment::OPAQUE));
    assert!(blend_attachments(&sig, true).iter().all(|b| b.blend_enable));
}

#[test]
fn test_fullscreen_properties() {
    let props = PipelineProperties::fullscreen();
    assert_eq!(props.cull_mode, CullMode::None);
    assert!(!props.depth_test);
    assert_eq!(PipelineProperties { wireframe: true, ..props }.polygon_mode(), PolygonMode::Line);
}

// ============================================================================
// Bake / rebake
// ============================================================================

#[test]
fn test_bake_matches_render_pass() {
    let device = MockGraphicsDevice::new();
    let sig = gbuffer_signature(SampleCount::S4);
    let pass = RenderPassBuilder::new("geometry", PassType::Geometry, sig.clone()).unwrap().bake(&device).unwrap();
    let pipeline = PipelineBuilder::new(desc(sig)).bake(&device, &pass).unwrap();

    assert_eq!(pipeline.blend_attachment_count(), pass.signature().color_count());
    assert_eq!(mock(&pipeline).blend_attachments, 6);
    assert_eq!(mock(&pipeline).samples, SampleCount::S4);
}

#[test]
fn test_bake_rejects_mismatched_signature() {
    let device = MockGraphicsDevice::new();
    let pass = RenderPassBuilder::new("geometry", PassType::Geometry, gbuffer_signature(SampleCount::S4))
        .unwrap()
        .bake(&device)
        .unwrap();
    let result = PipelineBuilder::new(desc(gbuffer_signature(SampleCount::S1))).bake(&device, &pass);
    match result {
        Err(Error::InvalidResource(msg)) => assert!(msg.contains("slot count")),
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("mismatched signature baked"),
    }
}

#[test]
fn test_wireframe_takes_effect_on_rebake() {
    let device = MockGraphicsDevice::new();
    let sig = gbuffer_signature(SampleCount::S1);
    let pass = RenderPassBuilder::new("geometry", PassType::Geometry, sig.clone()).unwrap().bake(&device).unwrap();
    let mut pipeline = PipelineBuilder::new(desc(sig)).bake(&device, &pass).unwrap();

    pipeline.set_wireframe(true);
    assert!(!mock(&pipeline).wireframe);
    pipeline.rebake(&device, &pass).unwrap();
    assert!(mock(&pipeline).wireframe);
    assert_eq!(device.state().lock().unwrap().pipelines_created.len(), 2);
}

#[test]
fn test_retarget_after_msaa_change() {
    let device = MockGraphicsDevice::new();
    let mut pass = RenderPassBuilder::new("geometry", PassType::Geometry, gbuffer_signature(SampleCount::S1))
        .unwrap()
        .bake(&device)
        .unwrap();
    let mut pipeline = PipelineBuilder::new(desc(gbuffer_signature(SampleCount::S1))).bake(&device, &pass).unwrap();

    let msaa = gbuffer_signature(SampleCount::S8);
    pass.rebake(&device, msaa.clone()).unwrap();
    assert!(pipeline.rebake(&device, &pass).is_err(), "stale signature must not bake");

    pipeline.retarget(msaa);
    pipeline.rebake(&device, &pass).unwrap();
    assert_eq!(mock(&pipeline).samples, SampleCount::S8);
    assert_eq!(pipeline.blend_attachment_count(), 6);
}

#[test]
fn test_replace_shaders() {
    let device = MockGraphicsDevice::new();
    let sig = gbuffer_signature(SampleCount::S1);
    let pass = RenderPassBuilder::new("geometry", PassType::Geometry, sig.clone()).unwrap().bake(&device).unwrap();
    let mut pipeline = PipelineBuilder::new(desc(sig)).bake(&device, &pass).unwrap();
    pipeline.replace_shaders(
        Arc::new(MockShader::new("reloaded.vert", ShaderStage::Vertex)),
        Arc::new(MockShader::new("reloaded.frag", ShaderStage::Fragment)),
    );
    assert_eq!(pipeline.desc().vertex_shader.name(), "reloaded.vert");
    assert_eq!(pipeline.desc().fragment_shader.name(), "reloaded.frag");
}
