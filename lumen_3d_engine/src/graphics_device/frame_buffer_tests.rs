use super::*;
use crate::graphics_device::attachment::AttachmentKind;
use crate::graphics_device::graphics_device::GraphicsDevice;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockTexture};
use crate::graphics_device::render_pass::{AttachmentSlot, PassType, RenderPassBuilder};
use crate::graphics_device::texture::{SampleCount, TextureFormat};

fn attachment(name: &str, width: u32, format: TextureFormat) -> FramebufferAttachment {
    FramebufferAttachment {
        texture: Arc::new(MockTexture::new(name, width, 64, format)),
        view: ViewSelector::All,
    }
}

fn signature() -> AttachmentSignature {
    AttachmentSignature::new(vec![
        AttachmentSlot::new(AttachmentKind::Color, TextureFormat::R8G8B8A8_UNORM, SampleCount::S1),
        AttachmentSlot::new(AttachmentKind::DepthStencil, TextureFormat::D32_SFLOAT, SampleCount::S1),
    ])
}

// ============================================================================
// Validation against the signature
// ============================================================================

#[test]
fn test_matching_framebuffer_is_created() {
    let device = MockGraphicsDevice::new();
    let sig = signature();
    let pass = RenderPassBuilder::new("sprite", PassType::PostProcess, sig.clone()).unwrap().bake(&device).unwrap();
    let fb = device
        .create_framebuffer(&FramebufferDesc {
            name: "sprite_fb".to_string(),
            render_pass: pass.gpu(),
            signature: &sig,
            attachments: vec![
                attachment("sprite_color", 64, TextureFormat::R8G8B8A8_UNORM),
                attachment("sprite_depth", 64, TextureFormat::D32_SFLOAT),
            ],
            width: 64,
            height: 64,
        })
        .unwrap();
    assert_eq!((fb.width(), fb.height()), (64, 64));
    assert_eq!(fb.name(), "sprite_fb");
}

#[test]
fn test_wrong_order_is_rejected() {
    let device = MockGraphicsDevice::new();
    let sig = signature();
    let pass = RenderPassBuilder::new("sprite", PassType::PostProcess, sig.clone()).unwrap().bake(&device).unwrap();
    let desc = FramebufferDesc {
        name: "sprite_fb".to_string(),
        render_pass: pass.gpu(),
        signature: &sig,
        attachments: vec![
            attachment("sprite_depth", 64, TextureFormat::D32_SFLOAT),
            attachment("sprite_color", 64, TextureFormat::R8G8B8A8_UNORM),
        ],
        width: 64,
        height: 64,
    };
    assert!(matches!(desc.validate(), Err(Error::InvalidResource(_))));
}

#[test]
fn test_size_and_count_mismatch_rejected() {
    let device = MockGraphicsDevice::new();
    let sig = signature();
    let pass = RenderPassBuilder::new("sprite", PassType::PostProcess, sig.clone()).unwrap().bake(&device).unwrap();

    let wrong_size = FramebufferDesc {
        name: "fb".to_string(),
        render_pass: pass.gpu(),
        signature: &sig,
        attachments: vec![
            attachment("c", 32, TextureFormat::R8G8B8A8_UNORM),
            attachment("d", 64, TextureFormat::D32_SFLOAT),
        ],
        width: 64,
        height: 64,
    };
    assert!(wrong_size.validate().is_err());

    let missing = FramebufferDesc {
        name: "fb".to_string(),
        render_pass: pass.gpu(),
        signature: &sig,
        attachments: vec![attachment("c", 64, TextureFormat::R8G8B8A8_UNORM)],
        width: 64,
        height: 64,
    };
    assert!(missing.validate().is_err());
}
