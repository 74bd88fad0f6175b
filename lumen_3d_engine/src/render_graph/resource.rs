/// Logical resources of the render graph
///
/// A resource is a named image whose size and sample count are policies
/// relative to the camera viewport and the MSAA setting. Resolve resources
/// name the multisampled primary they resolve; at one sample they alias it.

use crate::graphics_device::{AttachmentKind, SampleCount, TextureFormat};

/// Resource names of the deferred graph
pub mod names {
    pub const SHADOW_DEPTH: &str = "shadow_depth";

    pub const GBUFFER_VIEW_POS: &str = "gbuffer_view_pos";
    pub const GBUFFER_WORLD_POS: &str = "gbuffer_world_pos";
    pub const GBUFFER_DEPTH: &str = "gbuffer_depth";
    pub const GBUFFER_NORMAL: &str = "gbuffer_normal";
    pub const GBUFFER_ALBEDO: &str = "gbuffer_albedo";
    pub const GBUFFER_MATERIAL: &str = "gbuffer_material";
    pub const GBUFFER_DEPTH_STENCIL: &str = "gbuffer_depth_stencil";

    pub const GBUFFER_VIEW_POS_RESOLVE: &str = "gbuffer_view_pos_resolve";
    pub const GBUFFER_WORLD_POS_RESOLVE: &str = "gbuffer_world_pos_resolve";
    pub const GBUFFER_DEPTH_RESOLVE: &str = "gbuffer_depth_resolve";
    pub const GBUFFER_NORMAL_RESOLVE: &str = "gbuffer_normal_resolve";
    pub const GBUFFER_ALBEDO_RESOLVE: &str = "gbuffer_albedo_resolve";
    pub const GBUFFER_MATERIAL_RESOLVE: &str = "gbuffer_material_resolve";

    pub const SSAO_COLOR: &str = "ssao_color";
    pub const SSAO_BLUR_H: &str = "ssao_blur_h";
    pub const SSAO_BLUR_V: &str = "ssao_blur_v";

    pub const LIGHTING_COLOR: &str = "lighting_color";
    pub const LIGHTING_RESOLVE: &str = "lighting_resolve";

    pub const SPRITE_COLOR: &str = "sprite_color";
    pub const SPRITE_DEPTH: &str = "sprite_depth";
    pub const SPRITE_RESOLVE: &str = "sprite_resolve";

    pub const COMPOSITE_COLOR: &str = "composite_color";
    pub const COMPOSITE_RESOLVE: &str = "composite_resolve";

    pub const SWAPCHAIN: &str = "swapchain";
}

/// Size of a resource relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePolicy {
    Viewport,
    HalfViewport,
    /// Square, camera-independent
    Fixed(u32),
}

impl SizePolicy {
    pub fn extent(&self, viewport: (u32, u32)) -> (u32, u32) {
        match *self {
            SizePolicy::Viewport => viewport,
            SizePolicy::HalfViewport => ((viewport.0 / 2).max(1), (viewport.1 / 2).max(1)),
            SizePolicy::Fixed(dim) => (dim, dim),
        }
    }
}

/// Sample count of a resource relative to the MSAA setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplePolicy {
    Msaa,
    Single,
}

impl SamplePolicy {
    pub fn samples(&self, msaa: SampleCount) -> SampleCount {
        match self {
            SamplePolicy::Msaa => msaa,
            SamplePolicy::Single => SampleCount::S1,
        }
    }
}

/// Declaration of one logical resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDecl {
    pub name: String,
    pub kind: AttachmentKind,
    pub format: TextureFormat,
    pub size: SizePolicy,
    pub samples: SamplePolicy,
    pub layers: u32,
    /// Primary this resource resolves (Resolve kind only)
    pub resolves: Option<String>,
}

impl ResourceDecl {
    pub fn new(name: &str, kind: AttachmentKind, format: TextureFormat, size: SizePolicy, samples: SamplePolicy) -> Self {
        Self { name: name.to_string(), kind, format, size, samples, layers: 1, resolves: None }
    }

    /// Full-viewport multisampled color target
    pub fn color(name: &str, format: TextureFormat) -> Self {
        Self::new(name, AttachmentKind::Color, format, SizePolicy::Viewport, SamplePolicy::Msaa)
    }

    pub fn depth(name: &str, format: TextureFormat) -> Self {
        Self::new(name, AttachmentKind::DepthStencil, format, SizePolicy::Viewport, SamplePolicy::Msaa)
    }

    /// Single-sample resolve target of `primary`
    pub fn resolve_of(name: &str, primary: &ResourceDecl) -> Self {
        Self {
            name: name.to_string(),
            kind: AttachmentKind::Resolve,
            format: primary.format,
            size: primary.size,
            samples: SamplePolicy::Single,
            layers: primary.layers,
            resolves: Some(primary.name.clone()),
        }
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn is_resolve(&self) -> bool {
        self.kind == AttachmentKind::Resolve
    }

    /// Whether this resource is backed by its own image at `msaa`
    ///
    /// Resolve resources alias their primary at one sample.
    pub fn is_allocated(&self, msaa: SampleCount) -> bool {
        !self.is_resolve() || msaa.is_multisampled()
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
