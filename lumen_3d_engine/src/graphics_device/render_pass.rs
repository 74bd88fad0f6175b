/// Render passes: attachment signatures, the load/store policy and baking
///
/// A render pass is derived purely from its `PassType` and an
/// `AttachmentSignature`. Pipelines reference the same signature value, so a
/// pipeline built for a different attachment shape is a comparable mismatch
/// instead of a silent ordering assumption.

use std::any::Any;
use std::sync::Arc;
use crate::error::{Error, Result};
use super::attachment::AttachmentKind;
use super::graphics_device::GraphicsDevice;
use super::layout::{AccessFlags, ImageLayout, PipelineStages};
use super::texture::{SampleCount, TextureFormat};

/// Pass type, selects the default attachment policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassType {
    Geometry,
    Lighting,
    PostProcess,
    Shadow,
    Present,
}

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// One attachment slot of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentSlot {
    pub kind: AttachmentKind,
    pub format: TextureFormat,
    pub samples: SampleCount,
}

impl AttachmentSlot {
    pub fn new(kind: AttachmentKind, format: TextureFormat, samples: SampleCount) -> Self {
        Self { kind, format, samples }
    }
}

/// Ordered attachment list shared by a render pass, its framebuffers and
/// every pipeline baked against it
///
/// Slot order is the framebuffer view order. Resolve slots pair with the
/// color slots in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttachmentSignature {
    slots: Vec<AttachmentSlot>,
}

impl AttachmentSignature {
    pub fn new(slots: Vec<AttachmentSlot>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[AttachmentSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of blend-capable color outputs
    pub fn color_count(&self) -> usize {
        self.slots.iter().filter(|s| s.kind.is_color_output()).count()
    }

    pub fn resolve_count(&self) -> usize {
        self.count_of(AttachmentKind::Resolve)
    }

    /// Rasterization sample count (single-sampled when only resolves exist)
    pub fn samples(&self) -> SampleCount {
        self.slots
            .iter()
            .filter(|s| s.kind != AttachmentKind::Resolve)
            .map(|s| s.samples)
            .max()
            .unwrap_or(SampleCount::S1)
    }

    pub fn has_depth(&self) -> bool {
        self.count_of(AttachmentKind::DepthStencil) > 0
    }

    fn count_of(&self, kind: AttachmentKind) -> usize {
        self.slots.iter().filter(|s| s.kind == kind).count()
    }

    /// Human-readable differences, empty when both signatures are equal
    pub fn diff(&self, other: &AttachmentSignature) -> Vec<String> {
        let mut out = Vec::new();
        if self.slots.len() != other.slots.len() {
            out.push(format!("slot count {} != {}", self.slots.len(), other.slots.len()));
        }
        for (index, (a, b)) in self.slots.iter().zip(&other.slots).enumerate() {
            if a != b {
                out.push(format!(
                    "slot {}: {:?}/{:?}/x{} != {:?}/{:?}/x{}",
                    index,
                    a.kind,
                    a.format,
                    a.samples.as_u32(),
                    b.kind,
                    b.format,
                    b.samples.as_u32()
                ));
            }
        }
        out
    }
}

/// Fully resolved description of one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDescription {
    pub kind: AttachmentKind,
    pub format: TextureFormat,
    pub samples: SampleCount,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

/// Subpass reference in a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassRef {
    External,
    Index(u32),
}

/// Execution/memory dependency between subpasses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src: SubpassRef,
    pub dst: SubpassRef,
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

/// Descriptor for creating a render pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDesc {
    pub name: String,
    pub pass_type: PassType,
    pub signature: AttachmentSignature,
    pub attachments: Vec<AttachmentDescription>,
    pub dependencies: Vec<SubpassDependency>,
}

impl RenderPassDesc {
    /// Apply the pass-type policy to every slot of `signature`
    ///
    /// | kind                | load     | store |
    /// |---------------------|----------|-------|
    /// | Color / Offscreen   | Clear    | Store |
    /// | Resolve / SwapChain | DontCare | Store |
    /// | DepthStencil        | Clear (Load in Lighting) | Store |
    pub fn from_signature(name: impl Into<String>, pass_type: PassType, signature: AttachmentSignature) -> Result<Self> {
        let name = name.into();
        let resolves = signature.resolve_count();
        if resolves != 0 && resolves != signature.color_count() {
            return Err(Error::InvalidResource(format!(
                "render pass '{}': {} resolve slots for {} color slots",
                name,
                resolves,
                signature.color_count()
            )));
        }
        if signature.slots().iter().filter(|s| s.kind == AttachmentKind::DepthStencil).count() > 1 {
            return Err(Error::InvalidResource(format!("render pass '{}' has more than one depth slot", name)));
        }

        let attachments = signature
            .slots()
            .iter()
            .map(|slot| describe_slot(pass_type, slot))
            .collect();

        let dependencies = match pass_type {
            PassType::Shadow => vec![
                SubpassDependency {
                    src: SubpassRef::External,
                    dst: SubpassRef::Index(0),
                    src_stages: PipelineStages::FRAGMENT_SHADER,
                    dst_stages: PipelineStages::EARLY_FRAGMENT_TESTS,
                    src_access: AccessFlags::SHADER_READ,
                    dst_access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                },
                SubpassDependency {
                    src: SubpassRef::Index(0),
                    dst: SubpassRef::External,
                    src_stages: PipelineStages::LATE_FRAGMENT_TESTS,
                    dst_stages: PipelineStages::FRAGMENT_SHADER,
                    src_access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                    dst_access: AccessFlags::SHADER_READ,
                },
            ],
            _ => vec![SubpassDependency {
                src: SubpassRef::External,
                dst: SubpassRef::Index(0),
                src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT | PipelineStages::EARLY_FRAGMENT_TESTS,
                dst_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT | PipelineStages::EARLY_FRAGMENT_TESTS,
                src_access: AccessFlags::empty(),
                dst_access: AccessFlags::COLOR_ATTACHMENT_WRITE | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            }],
        };

        Ok(Self { name, pass_type, signature, attachments, dependencies })
    }

    pub fn color_indices(&self) -> Vec<u32> {
        self.indices_where(|k| k.is_color_output())
    }

    pub fn resolve_indices(&self) -> Vec<u32> {
        self.indices_where(|k| k == AttachmentKind::Resolve)
    }

    pub fn depth_index(&self) -> Option<u32> {
        self.indices_where(|k| k == AttachmentKind::DepthStencil).first().copied()
    }

    fn indices_where(&self, predicate: impl Fn(AttachmentKind) -> bool) -> Vec<u32> {
        self.attachments
            .iter()
            .enumerate()
            .filter(|(_, a)| predicate(a.kind))
            .map(|(i, _)| i as u32)
            .collect()
    }
}

fn describe_slot(pass_type: PassType, slot: &AttachmentSlot) -> AttachmentDescription {
    let (load_op, stencil_load_op, stencil_store_op) = match slot.kind {
        AttachmentKind::Color | AttachmentKind::Offscreen => (LoadOp::Clear, LoadOp::DontCare, StoreOp::DontCare),
        AttachmentKind::Resolve | AttachmentKind::SwapChain => (LoadOp::DontCare, LoadOp::DontCare, StoreOp::DontCare),
        AttachmentKind::DepthStencil if pass_type == PassType::Lighting => (LoadOp::Load, LoadOp::Load, StoreOp::Store),
        AttachmentKind::DepthStencil => (LoadOp::Clear, LoadOp::DontCare, StoreOp::DontCare),
    };
    let initial_layout = match slot.kind {
        AttachmentKind::SwapChain => ImageLayout::Undefined,
        kind => kind.attachment_layout(),
    };
    AttachmentDescription {
        kind: slot.kind,
        format: slot.format,
        samples: slot.samples,
        load_op,
        store_op: StoreOp::Store,
        stencil_load_op,
        stencil_store_op,
        initial_layout,
        final_layout: slot.kind.attachment_layout(),
    }
}

/// Backend render pass object
pub trait GpuRenderPass: Send + Sync {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Unbaked render pass
#[derive(Debug, Clone)]
pub struct RenderPassBuilder {
    desc: RenderPassDesc,
}

impl RenderPassBuilder {
    pub fn new(name: impl Into<String>, pass_type: PassType, signature: AttachmentSignature) -> Result<Self> {
        Ok(Self { desc: RenderPassDesc::from_signature(name, pass_type, signature)? })
    }

    pub fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    /// First-time creation of the GPU object
    pub fn bake(self, device: &dyn GraphicsDevice) -> Result<RenderPass> {
        let gpu = device.create_render_pass(&self.desc)?;
        crate::engine_debug!("lumen3d::render_pass", "Baked render pass '{}' ({} attachments)",
            self.desc.name, self.desc.attachments.len());
        Ok(RenderPass { desc: self.desc, gpu })
    }
}

/// Baked render pass
pub struct RenderPass {
    desc: RenderPassDesc,
    gpu: Arc<dyn GpuRenderPass>,
}

impl RenderPass {
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    pub fn pass_type(&self) -> PassType {
        self.desc.pass_type
    }

    pub fn signature(&self) -> &AttachmentSignature {
        &self.desc.signature
    }

    pub fn gpu(&self) -> &dyn GpuRenderPass {
        self.gpu.as_ref()
    }

    /// Replace the GPU object for a new attachment shape (swap chain format
    /// or MSAA change). Pipelines baked against the old shape must be
    /// retargeted and rebaked by the caller.
    pub fn rebake(&mut self, device: &dyn GraphicsDevice, signature: AttachmentSignature) -> Result<()> {
        let desc = RenderPassDesc::from_signature(self.desc.name.clone(), self.desc.pass_type, signature)?;
        let gpu = device.create_render_pass(&desc)?;
        self.desc = desc;
        self.gpu = gpu;
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
