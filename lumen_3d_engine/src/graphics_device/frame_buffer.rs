/// Framebuffer trait - binds concrete image views to a render pass's slots
///
/// The attachment list order must match the render pass's attachment
/// signature slot for slot. Framebuffers are created once per bundle (or per
/// swapchain image) and rebuilt whenever their images are.

use std::any::Any;
use std::sync::Arc;
use crate::error::{Error, Result};
use super::render_pass::{AttachmentSignature, GpuRenderPass};
use super::texture::{Texture, ViewSelector};

/// Framebuffer resource trait
pub trait Framebuffer: Send + Sync {
    fn name(&self) -> &str;

    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    fn as_any(&self) -> &dyn Any;
}

/// One view bound to one render pass slot
#[derive(Clone)]
pub struct FramebufferAttachment {
    pub texture: Arc<dyn Texture>,
    pub view: ViewSelector,
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    pub name: String,
    /// The render pass this framebuffer is compatible with
    pub render_pass: &'a dyn GpuRenderPass,
    /// Signature of that render pass, used to validate `attachments`
    pub signature: &'a AttachmentSignature,
    pub attachments: Vec<FramebufferAttachment>,
    pub width: u32,
    pub height: u32,
}

impl FramebufferDesc<'_> {
    /// Check slot count, formats, sample counts and sizes against the signature
    pub fn validate(&self) -> Result<()> {
        let slots = self.signature.slots();
        if slots.len() != self.attachments.len() {
            return Err(Error::InvalidResource(format!(
                "framebuffer '{}': {} attachments for a {}-slot render pass",
                self.name,
                self.attachments.len(),
                slots.len()
            )));
        }
        for (index, (slot, attachment)) in slots.iter().zip(&self.attachments).enumerate() {
            let desc = attachment.texture.desc();
            if desc.format != slot.format || desc.samples != slot.samples {
                return Err(Error::InvalidResource(format!(
                    "framebuffer '{}' slot {}: '{}' is {:?}x{} but the pass expects {:?}x{}",
                    self.name,
                    index,
                    desc.name,
                    desc.format,
                    desc.samples.as_u32(),
                    slot.format,
                    slot.samples.as_u32()
                )));
            }
            if desc.width != self.width || desc.height != self.height {
                return Err(Error::InvalidResource(format!(
                    "framebuffer '{}' slot {}: '{}' is {}x{}, framebuffer is {}x{}",
                    self.name, index, desc.name, desc.width, desc.height, self.width, self.height
                )));
            }
            if let ViewSelector::Layer(layer) = attachment.view {
                if layer >= desc.array_layers {
                    return Err(Error::InvalidResource(format!(
                        "framebuffer '{}' slot {}: layer {} out of {}",
                        self.name, index, layer, desc.array_layers
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_buffer_tests.rs"]
mod tests;
