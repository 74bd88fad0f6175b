/// Graphics pipelines: fixed-function state, vertex layout and baking
///
/// A pipeline is baked against one render pass and carries a copy of that
/// pass's `AttachmentSignature`. Blend state is derived from the signature,
/// one entry per color output, so it always matches the pass's shape.

use std::any::Any;
use std::sync::Arc;
use crate::error::{Error, Result};
use super::buffer::BufferFormat;
use super::descriptor::DescriptorSetLayout;
use super::graphics_device::GraphicsDevice;
use super::render_pass::{AttachmentSignature, GpuRenderPass, RenderPass};
use super::shader::{Shader, ShaderStageFlags};
use super::texture::SampleCount;

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    pub format: BufferFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex input layout (single interleaved binding)
///
/// An empty layout means the vertex shader generates its own positions
/// (fullscreen triangle).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Push constant range descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stages: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
    Both,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

/// Comparison operator for depth tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    Always,
}

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Blend state of one color output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBlendAttachment {
    pub blend_enable: bool,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
}

impl ColorBlendAttachment {
    pub const OPAQUE: Self = Self {
        blend_enable: false,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
    };

    /// Premultiplied alpha: src + dst * (1 - src.a)
    pub const PREMULTIPLIED: Self = Self {
        blend_enable: true,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
    };
}

/// Depth bias parameters (shadow pass)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    pub constant_factor: f32,
    pub slope_factor: f32,
}

/// Fixed-function state toggled at runtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineProperties {
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub wireframe: bool,
    pub alpha_blending: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareOp,
    pub depth_bias: Option<DepthBias>,
}

impl Default for PipelineProperties {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            wireframe: false,
            alpha_blending: false,
            depth_test: true,
            depth_write: true,
            depth_compare: CompareOp::Less,
            depth_bias: None,
        }
    }
}

impl PipelineProperties {
    /// Fullscreen triangle: no culling, no depth
    pub fn fullscreen() -> Self {
        Self { cull_mode: CullMode::None, depth_test: false, depth_write: false, ..Self::default() }
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        if self.wireframe { PolygonMode::Line } else { PolygonMode::Fill }
    }
}

/// One blend state per color output of `signature`
pub fn blend_attachments(signature: &AttachmentSignature, alpha_blending: bool) -> Vec<ColorBlendAttachment> {
    let state = if alpha_blending { ColorBlendAttachment::PREMULTIPLIED } else { ColorBlendAttachment::OPAQUE };
    vec![state; signature.color_count()]
}

/// Everything needed to (re)create a pipeline
#[derive(Clone)]
pub struct PipelineDesc {
    pub name: String,
    pub vertex_shader: Arc<dyn Shader>,
    pub fragment_shader: Arc<dyn Shader>,
    pub vertex_layout: VertexLayout,
    pub set_layouts: Vec<Arc<dyn DescriptorSetLayout>>,
    pub push_constants: Vec<PushConstantRange>,
    pub properties: PipelineProperties,
    /// Attachment shape of the render pass this pipeline targets
    pub signature: AttachmentSignature,
}

/// Fully resolved creation request handed to the backend
pub struct PipelineCreateInfo<'a> {
    pub desc: &'a PipelineDesc,
    pub blend_attachments: Vec<ColorBlendAttachment>,
    pub samples: SampleCount,
    pub render_pass: &'a dyn GpuRenderPass,
}

/// Backend pipeline object (pipeline + layout)
pub trait GpuPipeline: Send + Sync {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Unbaked pipeline
#[derive(Clone)]
pub struct PipelineBuilder {
    desc: PipelineDesc,
}

impl PipelineBuilder {
    pub fn new(desc: PipelineDesc) -> Self {
        Self { desc }
    }

    pub fn desc(&self) -> &PipelineDesc {
        &self.desc
    }

    pub fn bake(self, device: &dyn GraphicsDevice, render_pass: &RenderPass) -> Result<Pipeline> {
        let (gpu, blend_count) = create_gpu_pipeline(device, &self.desc, render_pass)?;
        Ok(Pipeline { desc: self.desc, gpu, blend_count })
    }
}

/// Baked pipeline
pub struct Pipeline {
    desc: PipelineDesc,
    gpu: Box<dyn GpuPipeline>,
    blend_count: usize,
}

impl Pipeline {
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &PipelineDesc {
        &self.desc
    }

    pub fn gpu(&self) -> &dyn GpuPipeline {
        self.gpu.as_ref()
    }

    pub fn signature(&self) -> &AttachmentSignature {
        &self.desc.signature
    }

    /// Number of blend states the GPU pipeline was created with
    pub fn blend_attachment_count(&self) -> usize {
        self.blend_count
    }

    pub fn properties(&self) -> &PipelineProperties {
        &self.desc.properties
    }

    /// Destroy and recreate the GPU pipeline from the current description
    ///
    /// The new object is created before the old one is dropped; the caller
    /// guarantees the GPU is idle with respect to the old one.
    pub fn rebake(&mut self, device: &dyn GraphicsDevice, render_pass: &RenderPass) -> Result<()> {
        let (gpu, blend_count) = create_gpu_pipeline(device, &self.desc, render_pass)?;
        self.gpu = gpu;
        self.blend_count = blend_count;
        Ok(())
    }

    /// Follow a render pass that changed shape; takes effect on rebake
    pub fn retarget(&mut self, signature: AttachmentSignature) {
        self.desc.signature = signature;
    }

    /// Takes effect on rebake
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.desc.properties.wireframe = wireframe;
    }

    /// Takes effect on rebake
    pub fn set_properties(&mut self, properties: PipelineProperties) {
        self.desc.properties = properties;
    }

    /// Swap shader modules (shader reload); takes effect on rebake
    pub fn replace_shaders(&mut self, vertex: Arc<dyn Shader>, fragment: Arc<dyn Shader>) {
        self.desc.vertex_shader = vertex;
        self.desc.fragment_shader = fragment;
    }
}

fn create_gpu_pipeline(
    device: &dyn GraphicsDevice,
    desc: &PipelineDesc,
    render_pass: &RenderPass,
) -> Result<(Box<dyn GpuPipeline>, usize)> {
    if &desc.signature != render_pass.signature() {
        return Err(Error::InvalidResource(format!(
            "pipeline '{}' does not match render pass '{}': {}",
            desc.name,
            render_pass.name(),
            desc.signature.diff(render_pass.signature()).join("; ")
        )));
    }
    let blends = blend_attachments(&desc.signature, desc.properties.alpha_blending);
    let blend_count = blends.len();
    let info = PipelineCreateInfo {
        desc,
        blend_attachments: blends,
        samples: desc.signature.samples(),
        render_pass: render_pass.gpu(),
    };
    let gpu = device.create_pipeline(&info)?;
    crate::engine_debug!("lumen3d::pipeline", "Baked pipeline '{}' against '{}' ({} blend attachments)",
        desc.name, render_pass.name(), blend_count);
    Ok((gpu, blend_count))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
