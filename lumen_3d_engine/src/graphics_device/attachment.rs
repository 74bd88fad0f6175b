/// Attachment textures with an explicit, checked image layout
///
/// Every image a render pass writes is wrapped in an `AttachmentTexture`.
/// The wrapper records which layout the image is currently in, and
/// `transition` refuses to record a barrier whose starting layout does not
/// match that record.

use std::sync::{Arc, Mutex};
use crate::error::{Error, Result};
use super::command_list::{CommandList, ImageBarrier};
use super::layout::{transition_rule, ImageLayout};
use super::texture::{SampleCount, Texture, TextureFormat};

/// Role of an attachment within render passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Color,
    DepthStencil,
    /// Color target consumed only by later passes (SSAO working images)
    Offscreen,
    /// Single-sample target an MSAA attachment resolves into
    Resolve,
    SwapChain,
}

impl AttachmentKind {
    /// Layout the image rests in while it is not being sampled
    pub fn attachment_layout(&self) -> ImageLayout {
        match self {
            AttachmentKind::Color | AttachmentKind::Offscreen | AttachmentKind::Resolve => {
                ImageLayout::ColorAttachment
            }
            AttachmentKind::DepthStencil => ImageLayout::DepthStencilAttachment,
            AttachmentKind::SwapChain => ImageLayout::PresentSrc,
        }
    }

    /// Written through a subpass color reference, one blend state each.
    /// The swap-chain image is the present pass's only color output.
    pub fn is_color_output(&self) -> bool {
        matches!(self, AttachmentKind::Color | AttachmentKind::Offscreen | AttachmentKind::SwapChain)
    }
}

/// Descriptor for creating an attachment texture
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentTextureDesc {
    pub name: String,
    pub kind: AttachmentKind,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub samples: SampleCount,
    pub layers: u32,
}

impl AttachmentTextureDesc {
    pub fn new(
        name: impl Into<String>,
        kind: AttachmentKind,
        width: u32,
        height: u32,
        format: TextureFormat,
        samples: SampleCount,
    ) -> Self {
        Self { name: name.into(), kind, width, height, format, samples, layers: 1 }
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.layers == 0 {
            return Err(Error::InvalidResource(format!(
                "attachment '{}' has a zero dimension ({}x{}x{})",
                self.name, self.width, self.height, self.layers
            )));
        }
        if self.format.is_depth() != (self.kind == AttachmentKind::DepthStencil) {
            return Err(Error::InvalidResource(format!(
                "attachment '{}': format {:?} does not fit kind {:?}",
                self.name, self.format, self.kind
            )));
        }
        if self.kind == AttachmentKind::Resolve && self.samples.is_multisampled() {
            return Err(Error::InvalidResource(format!(
                "resolve attachment '{}' must be single-sampled",
                self.name
            )));
        }
        Ok(())
    }
}

/// GPU image used as a render pass attachment
pub struct AttachmentTexture {
    name: String,
    kind: AttachmentKind,
    texture: Arc<dyn Texture>,
    layout: Mutex<ImageLayout>,
}

impl AttachmentTexture {
    /// Wrap a texture that is already in `layout`
    pub fn new(name: impl Into<String>, kind: AttachmentKind, texture: Arc<dyn Texture>, layout: ImageLayout) -> Self {
        Self { name: name.into(), kind, texture, layout: Mutex::new(layout) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    pub fn width(&self) -> u32 {
        self.texture.desc().width
    }

    pub fn height(&self) -> u32 {
        self.texture.desc().height
    }

    pub fn samples(&self) -> SampleCount {
        self.texture.desc().samples
    }

    pub fn format(&self) -> TextureFormat {
        self.texture.desc().format
    }

    pub fn layers(&self) -> u32 {
        self.texture.desc().array_layers
    }

    pub fn layout(&self) -> ImageLayout {
        match self.layout.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Record a barrier `expected -> new` covering every layer
    ///
    /// Fails with `LayoutTransition` when the image is not in `expected` or
    /// the pair is not a supported transition. Nothing is recorded on failure.
    pub fn transition(&self, cmd: &mut dyn CommandList, expected: ImageLayout, new: ImageLayout) -> Result<()> {
        let mut current = self
            .layout
            .lock()
            .map_err(|_| Error::InvalidState(format!("layout lock of '{}' poisoned", self.name)))?;
        if *current != expected {
            return Err(Error::LayoutTransition(format!(
                "'{}' is in {:?}, expected {:?} before moving to {:?}",
                self.name, *current, expected, new
            )));
        }
        let rule = transition_rule(expected, new)?;
        cmd.pipeline_barrier(&[ImageBarrier {
            texture: self.texture.as_ref(),
            old_layout: expected,
            new_layout: new,
            rule,
            base_layer: 0,
            layer_count: self.layers(),
        }])?;
        *current = new;
        Ok(())
    }

    /// Record the layout a render pass left the image in
    pub fn note_render_pass_final(&self, layout: ImageLayout) {
        match self.layout.lock() {
            Ok(mut guard) => *guard = layout,
            Err(poisoned) => *poisoned.into_inner() = layout,
        }
    }
}

impl std::fmt::Debug for AttachmentTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentTexture")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("layout", &self.layout())
            .finish()
    }
}

#[cfg(test)]
#[path = "attachment_tests.rs"]
mod tests;
