/// Render passes, input layouts, shaders and pipelines of the deferred graph
///
/// Render passes are baked one per graph pass from the pass's attachment
/// signature. Pipelines are described by a fixed table (`pipeline_specs`)
/// and baked against the render pass of the pass they draw in, so their
/// blend state always follows that pass's color outputs.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_device::{
    CompareOp, CullMode, DepthBias, DescriptorSetLayout, DescriptorSetLayoutDesc, GraphicsDevice, Pipeline, PipelineBuilder, PipelineDesc, PipelineProperties, PushConstantRange, RenderPass, RenderPassBuilder,
    SampleCount, Shader, ShaderCompiler, ShaderDesc, ShaderProperties, ShaderStage, ShaderStageFlags, VertexLayout,
};
use crate::render_graph::{passes, InputBinding, PassDecl, RenderGraph};
use crate::scene::{Skybox, SpriteVertex, Vertex};
use super::context::SetLayouts;
use super::uniforms::{BlurDirection, CascadeIndex, LightingFlags};

/// Pipeline names, as listed in the graph's pass declarations
pub mod pipeline_names {
    pub const SHADOW: &str = "shadow";
    pub const GEOMETRY: &str = "geometry";
    pub const SSAO_GEN: &str = "ssao_gen";
    pub const SSAO_BLUR: &str = "ssao_blur";
    pub const SKYBOX: &str = "skybox";
    pub const LIGHTING: &str = "lighting";
    pub const SPRITE: &str = "sprite";
    pub const COMPOSITE: &str = "composite";
    pub const PRESENT: &str = "present";
}

/// Vertex shader shared by every fullscreen-triangle pipeline
pub const FULLSCREEN_SHADER: &str = "fullscreen";

/// Where a pipeline's descriptor set N comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetSource {
    Camera,
    Shadow,
    Mesh,
    Sprite,
    Skybox,
    SsaoKernel,
    /// Sampled inputs of the named pass
    Inputs(&'static str),
}

#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: &'static str,
    /// Pass whose render pass the pipeline is baked against
    pub pass: &'static str,
    pub vertex_shader: &'static str,
    pub fragment_shader: &'static str,
    pub vertex_layout: VertexLayout,
    pub sets: Vec<SetSource>,
    pub push_constant: Option<PushConstantRange>,
    pub properties: PipelineProperties,
}

fn push_range<T>(stages: ShaderStageFlags) -> Option<PushConstantRange> {
    Some(PushConstantRange { stages, offset: 0, size: std::mem::size_of::<T>() as u32 })
}

/// Every pipeline of the deferred graph, in recording order
pub fn pipeline_specs() -> Vec<PipelineSpec> {
    use pipeline_names as p;
    let fullscreen = PipelineProperties::fullscreen();
    vec![
        PipelineSpec {
            name: p::SHADOW,
            pass: passes::SHADOW,
            vertex_shader: "shadow",
            fragment_shader: "shadow",
            vertex_layout: Vertex::layout(),
            sets: vec![SetSource::Shadow, SetSource::Mesh],
            push_constant: push_range::<CascadeIndex>(ShaderStageFlags::VERTEX),
            properties: PipelineProperties {
                cull_mode: CullMode::Front,
                depth_bias: Some(DepthBias { constant_factor: 1.25, slope_factor: 1.75 }),
                ..PipelineProperties::default()
            },
        },
        PipelineSpec {
            name: p::GEOMETRY,
            pass: passes::GEOMETRY,
            vertex_shader: "geometry",
            fragment_shader: "geometry",
            vertex_layout: Vertex::layout(),
            sets: vec![SetSource::Camera, SetSource::Mesh],
            push_constant: None,
            properties: PipelineProperties::default(),
        },
        PipelineSpec {
            name: p::SSAO_GEN,
            pass: passes::SSAO_GEN,
            vertex_shader: FULLSCREEN_SHADER,
            fragment_shader: "ssao",
            vertex_layout: VertexLayout::default(),
            sets: vec![SetSource::Camera, SetSource::SsaoKernel, SetSource::Inputs(passes::SSAO_GEN)],
            push_constant: None,
            properties: fullscreen,
        },
        PipelineSpec {
            name: p::SSAO_BLUR,
            pass: passes::SSAO_BLUR_H,
            vertex_shader: FULLSCREEN_SHADER,
            fragment_shader: "ssao_blur",
            vertex_layout: VertexLayout::default(),
            sets: vec![SetSource::Inputs(passes::SSAO_BLUR_H)],
            push_constant: push_range::<BlurDirection>(ShaderStageFlags::FRAGMENT),
            properties: fullscreen,
        },
        PipelineSpec {
            name: p::SKYBOX,
            pass: passes::LIGHTING,
            vertex_shader: "skybox",
            fragment_shader: "skybox",
            vertex_layout: Skybox::layout(),
            sets: vec![SetSource::Camera, SetSource::Skybox],
            push_constant: None,
            properties: PipelineProperties {
                cull_mode: CullMode::None,
                depth_write: false,
                depth_compare: CompareOp::LessOrEqual,
                ..PipelineProperties::default()
            },
        },
        PipelineSpec {
            name: p::LIGHTING,
            pass: passes::LIGHTING,
            vertex_shader: FULLSCREEN_SHADER,
            fragment_shader: "lighting",
            vertex_layout: VertexLayout::default(),
            sets: vec![SetSource::Camera, SetSource::Shadow, SetSource::Inputs(passes::LIGHTING)],
            push_constant: push_range::<LightingFlags>(ShaderStageFlags::FRAGMENT),
            properties: fullscreen,
        },
        PipelineSpec {
            name: p::SPRITE,
            pass: passes::SPRITE,
            vertex_shader: "sprite",
            fragment_shader: "sprite",
            vertex_layout: SpriteVertex::layout(),
            sets: vec![SetSource::Camera, SetSource::Sprite],
            push_constant: None,
            properties: PipelineProperties {
                cull_mode: CullMode::None,
                alpha_blending: true,
                depth_compare: CompareOp::LessOrEqual,
                ..PipelineProperties::default()
            },
        },
        PipelineSpec {
            name: p::COMPOSITE,
            pass: passes::COMPOSITE,
            vertex_shader: FULLSCREEN_SHADER,
            fragment_shader: "composite",
            vertex_layout: VertexLayout::default(),
            sets: vec![SetSource::Inputs(passes::COMPOSITE)],
            push_constant: None,
            properties: PipelineProperties { alpha_blending: true, ..fullscreen },
        },
        PipelineSpec {
            name: p::PRESENT,
            pass: passes::PRESENT,
            vertex_shader: FULLSCREEN_SHADER,
            fragment_shader: "present",
            vertex_layout: VertexLayout::default(),
            sets: vec![SetSource::Inputs(passes::PRESENT)],
            push_constant: None,
            properties: fullscreen,
        },
    ]
}

/// One render pass per graph pass, keyed by pass name
pub fn bake_render_passes(
    device: &dyn GraphicsDevice,
    graph: &RenderGraph,
    msaa: SampleCount,
) -> Result<FxHashMap<String, RenderPass>> {
    let mut render_passes = FxHashMap::default();
    for pass in graph.passes() {
        let signature = graph.signature(pass, msaa)?;
        let render_pass = RenderPassBuilder::new(pass.name.clone(), pass.pass_type, signature)?.bake(device)?;
        render_passes.insert(pass.name.clone(), render_pass);
    }
    Ok(render_passes)
}

/// Re-derive every render pass for a new sample count or swap chain format
pub fn rebake_render_passes(
    device: &dyn GraphicsDevice,
    graph: &RenderGraph,
    msaa: SampleCount,
    render_passes: &mut FxHashMap<String, RenderPass>,
) -> Result<()> {
    for pass in graph.passes() {
        let signature = graph.signature(pass, msaa)?;
        let render_pass = render_passes
            .get_mut(&pass.name)
            .ok_or_else(|| Error::InvalidResource(format!("no render pass baked for '{}'", pass.name)))?;
        if render_pass.signature() != &signature {
            render_pass.rebake(device, signature)?;
        }
    }
    Ok(())
}

/// Sampler bindings in one input set of `pass`
pub fn input_binding_count(pass: &PassDecl) -> u32 {
    match pass.inputs {
        InputBinding::OneSet => pass.reads.len() as u32,
        InputBinding::PerRead => 1,
    }
}

/// Sampler-only descriptor set layouts for each pass's inputs, keyed by pass name
pub fn create_input_layouts(
    device: &dyn GraphicsDevice,
    graph: &RenderGraph,
) -> Result<FxHashMap<String, Arc<dyn DescriptorSetLayout>>> {
    let mut layouts = FxHashMap::default();
    for pass in graph.passes().iter().filter(|pass| !pass.reads.is_empty()) {
        let desc = DescriptorSetLayoutDesc::samplers(format!("{}_inputs", pass.name), input_binding_count(pass));
        layouts.insert(pass.name.clone(), device.create_descriptor_set_layout(&desc)?);
    }
    Ok(layouts)
}

// ============================================================================
// Shaders
// ============================================================================

/// Shader modules by name and stage, compiled on first use
pub struct ShaderLibrary {
    compiler: Box<dyn ShaderCompiler>,
    dir: String,
    modules: FxHashMap<(String, ShaderStage), Arc<dyn Shader>>,
}

impl ShaderLibrary {
    pub fn new(compiler: Box<dyn ShaderCompiler>, dir: impl Into<String>) -> Self {
        Self { compiler, dir: dir.into(), modules: FxHashMap::default() }
    }

    pub fn get(&mut self, device: &dyn GraphicsDevice, name: &str, stage: ShaderStage) -> Result<Arc<dyn Shader>> {
        if let Some(module) = self.modules.get(&(name.to_string(), stage)) {
            return Ok(module.clone());
        }
        let module = self.compile(device, name, stage)?;
        self.modules.insert((name.to_string(), stage), module.clone());
        Ok(module)
    }

    /// Recompile every cached module. Nothing is replaced unless all succeed.
    pub fn reload(&mut self, device: &dyn GraphicsDevice) -> Result<()> {
        let mut reloaded = FxHashMap::default();
        for (name, stage) in self.modules.keys() {
            reloaded.insert((name.clone(), *stage), self.compile(device, name, *stage)?);
        }
        crate::engine_info!("lumen3d::shader", "Reloaded {} shader modules", reloaded.len());
        self.modules = reloaded;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn compile(&self, device: &dyn GraphicsDevice, name: &str, stage: ShaderStage) -> Result<Arc<dyn Shader>> {
        let properties = ShaderProperties::precompiled(&self.dir, name, stage);
        let code = self.compiler.compile(&properties)?;
        let module_name = format!("{}.{}", name, stage.file_extension());
        device.create_shader(&ShaderDesc { name: &module_name, stage, entry_point: &properties.main, code: &code })
    }
}

// ============================================================================
// Pipelines
// ============================================================================

/// Everything `bake_pipelines` resolves set sources and render passes from
pub struct PipelineInputs<'a> {
    pub render_passes: &'a FxHashMap<String, RenderPass>,
    pub set_layouts: &'a SetLayouts,
    pub input_layouts: &'a FxHashMap<String, Arc<dyn DescriptorSetLayout>>,
}

impl PipelineInputs<'_> {
    fn render_pass(&self, pass: &str) -> Result<&RenderPass> {
        self.render_passes
            .get(pass)
            .ok_or_else(|| Error::InvalidResource(format!("no render pass baked for '{}'", pass)))
    }

    fn set_layout(&self, source: SetSource) -> Result<Arc<dyn DescriptorSetLayout>> {
        let layouts = self.set_layouts;
        Ok(match source {
            SetSource::Camera => layouts.camera.clone(),
            SetSource::Shadow => layouts.shadow.clone(),
            SetSource::Mesh => layouts.mesh.clone(),
            SetSource::Sprite => layouts.sprite.clone(),
            SetSource::Skybox => layouts.skybox.clone(),
            SetSource::SsaoKernel => layouts.ssao_kernel.clone(),
            SetSource::Inputs(pass) => self
                .input_layouts
                .get(pass)
                .cloned()
                .ok_or_else(|| Error::InvalidResource(format!("no input layout for pass '{}'", pass)))?,
        })
    }
}

pub fn bake_pipelines(
    device: &dyn GraphicsDevice,
    shaders: &mut ShaderLibrary,
    inputs: &PipelineInputs<'_>,
    wireframe: bool,
) -> Result<FxHashMap<String, Pipeline>> {
    let mut pipelines = FxHashMap::default();
    for spec in pipeline_specs() {
        let render_pass = inputs.render_pass(spec.pass)?;
        let mut properties = spec.properties;
        if spec.name == pipeline_names::GEOMETRY {
            properties.wireframe = wireframe;
        }
        let desc = PipelineDesc {
            name: spec.name.to_string(),
            vertex_shader: shaders.get(device, spec.vertex_shader, ShaderStage::Vertex)?,
            fragment_shader: shaders.get(device, spec.fragment_shader, ShaderStage::Fragment)?,
            vertex_layout: spec.vertex_layout.clone(),
            set_layouts: spec.sets.iter().map(|s| inputs.set_layout(*s)).collect::<Result<Vec<_>>>()?,
            push_constants: spec.push_constant.into_iter().collect(),
            properties,
            signature: render_pass.signature().clone(),
        };
        pipelines.insert(spec.name.to_string(), PipelineBuilder::new(desc).bake(device, render_pass)?);
    }
    Ok(pipelines)
}

/// Follow render pass, shader and wireframe changes, then rebake every pipeline
pub fn rebake_pipelines(
    device: &dyn GraphicsDevice,
    shaders: &mut ShaderLibrary,
    inputs: &PipelineInputs<'_>,
    pipelines: &mut FxHashMap<String, Pipeline>,
    wireframe: bool,
) -> Result<()> {
    for spec in pipeline_specs() {
        let render_pass = inputs.render_pass(spec.pass)?;
        let pipeline = pipelines
            .get_mut(spec.name)
            .ok_or_else(|| Error::InvalidResource(format!("pipeline '{}' was never baked", spec.name)))?;
        pipeline.retarget(render_pass.signature().clone());
        pipeline.replace_shaders(
            shaders.get(device, spec.vertex_shader, ShaderStage::Vertex)?,
            shaders.get(device, spec.fragment_shader, ShaderStage::Fragment)?,
        );
        if spec.name == pipeline_names::GEOMETRY {
            pipeline.set_wireframe(wireframe);
        }
        pipeline.rebake(device, render_pass)?;
    }
    crate::engine_debug!("lumen3d::pipeline", "Rebaked {} pipelines", pipelines.len());
    Ok(())
}

#[cfg(test)]
#[path = "pipelines_tests.rs"]
mod tests;
