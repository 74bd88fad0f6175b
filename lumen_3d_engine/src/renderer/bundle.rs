/// CameraRenderBundle - every GPU object one camera renders into
///
/// The bundle is derived from the render graph: one attachment per
/// allocated resource, one framebuffer per pass (one per layer for the
/// shadow cascades), and one input descriptor set per pass that samples
/// earlier outputs. At one sample each resolve resource is the same
/// `Arc<AttachmentTexture>` as its primary, so layout tracking and
/// descriptor bindings see a single image.

use std::sync::Arc;
use glam::{Vec2, Vec4};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::camera::{Cascade, CameraComponent};
use crate::graphics_device::{
    write_uniform, AttachmentKind, AttachmentTexture, AttachmentTextureDesc, Buffer, DescriptorSet,
    DescriptorSetBuilder, DescriptorSetLayout, Framebuffer, FramebufferAttachment, FramebufferDesc, PassType,
    RenderPass, SampleCount, SamplerKind, Texture, TextureFormat, ViewSelector,
};
use crate::render_graph::{names, passes, InputBinding, PassDecl, RenderGraph};
use super::context::RenderContext;
use super::ssao::SSAO_NOISE_DIM;
use super::uniforms::{CameraUniformData, ShadowUniformData, SsaoUniformData};

/// SSAO parameters shared by every camera
pub struct SsaoSettings {
    pub kernel: Vec<Vec4>,
    pub noise: Arc<dyn Texture>,
    pub radius: f32,
    pub bias: f32,
}

/// Renderer-owned objects a bundle is built against
pub struct BundleInputs<'a> {
    pub ctx: &'a RenderContext,
    pub graph: &'a RenderGraph,
    pub render_passes: &'a FxHashMap<String, RenderPass>,
    pub input_layouts: &'a FxHashMap<String, Arc<dyn DescriptorSetLayout>>,
    pub lights: &'a Arc<dyn Buffer>,
    pub ssao: &'a SsaoSettings,
}

/// Sampler used when a pass samples an image of `format`
pub fn input_sampler_kind(format: TextureFormat) -> SamplerKind {
    match format {
        f if f.is_depth() => SamplerKind::Shadow,
        TextureFormat::R16G16B16A16_SFLOAT | TextureFormat::R32_SFLOAT => SamplerKind::NearestClamp,
        _ => SamplerKind::LinearClamp,
    }
}

pub struct CameraRenderBundle {
    extent: (u32, u32),
    samples: SampleCount,
    attachments: FxHashMap<String, Arc<AttachmentTexture>>,
    framebuffers: FxHashMap<String, Vec<Arc<dyn Framebuffer>>>,
    input_sets: FxHashMap<String, Vec<DescriptorSet>>,
    output: Arc<AttachmentTexture>,
    camera_uniform: Arc<dyn Buffer>,
    camera_set: DescriptorSet,
    shadow_uniform: Arc<dyn Buffer>,
    shadow_set: DescriptorSet,
    ssao_uniform: Arc<dyn Buffer>,
    ssao_set: DescriptorSet,
}

impl CameraRenderBundle {
    pub fn build(inputs: &BundleInputs<'_>, extent: (u32, u32), samples: SampleCount) -> Result<Self> {
        if extent.0 == 0 || extent.1 == 0 {
            return Err(Error::InvalidResource(format!(
                "camera bundle needs a non-zero extent, got {}x{}",
                extent.0, extent.1
            )));
        }
        let ctx = inputs.ctx;
        let graph = inputs.graph;

        let attachments = Self::allocate_attachments(ctx, graph, extent, samples)?;
        let output = attachments
            .get(names::COMPOSITE_RESOLVE)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("render graph has no '{}'", names::COMPOSITE_RESOLVE)))?;

        let mut framebuffers = FxHashMap::default();
        let mut input_sets = FxHashMap::default();
        for pass in graph.passes() {
            if pass.pass_type != PassType::Present {
                let render_pass = inputs.render_passes.get(&pass.name).ok_or_else(|| {
                    Error::InvalidResource(format!("no render pass baked for '{}'", pass.name))
                })?;
                let built = Self::build_framebuffers(ctx, graph, pass, render_pass, &attachments, samples)?;
                framebuffers.insert(pass.name.clone(), built);
            }
            if !pass.reads.is_empty() {
                let layout = inputs.input_layouts.get(&pass.name).ok_or_else(|| {
                    Error::InvalidResource(format!("no input layout for pass '{}'", pass.name))
                })?;
                input_sets.insert(pass.name.clone(), Self::build_input_sets(ctx, pass, layout, &attachments)?);
            }
        }

        let camera_uniform = ctx.create_uniform_buffer("camera_uniform", &CameraUniformData::from_camera(
            &CameraComponent::default(),
            extent,
        ))?;
        let camera_set = DescriptorSetBuilder::new("camera", ctx.layouts().camera.clone())
            .uniform(0, camera_uniform.clone())
            .uniform(1, inputs.lights.clone())
            .bake(ctx.device())?;

        let shadow_uniform = ctx.create_uniform_buffer("shadow_uniform", &ShadowUniformData::default())?;
        let shadow_set = DescriptorSetBuilder::new("shadow", ctx.layouts().shadow.clone())
            .uniform(0, shadow_uniform.clone())
            .bake(ctx.device())?;

        let ssao_extent = graph
            .resource(names::SSAO_COLOR)
            .map_or(extent, |decl| decl.size.extent(extent));
        let noise_scale = Vec2::new(ssao_extent.0 as f32, ssao_extent.1 as f32) / SSAO_NOISE_DIM as f32;
        let ssao_uniform = ctx.create_uniform_buffer(
            "ssao_uniform",
            &SsaoUniformData::new(&inputs.ssao.kernel, inputs.ssao.radius, inputs.ssao.bias, noise_scale),
        )?;
        let ssao_set = DescriptorSetBuilder::new("ssao_kernel", ctx.layouts().ssao_kernel.clone())
            .uniform(0, ssao_uniform.clone())
            .image(1, inputs.ssao.noise.clone(), ctx.sampler(SamplerKind::Nearest))
            .bake(ctx.device())?;

        crate::engine_debug!("lumen3d::bundle", "Built camera bundle {}x{} x{} ({} images, {} passes)",
            extent.0, extent.1, samples.as_u32(), attachments.len(), framebuffers.len());

        Ok(Self {
            extent,
            samples,
            attachments,
            framebuffers,
            input_sets,
            output,
            camera_uniform,
            camera_set,
            shadow_uniform,
            shadow_set,
            ssao_uniform,
            ssao_set,
        })
    }

    /// Replace every image, framebuffer and descriptor set for a new
    /// extent or sample count. The old objects are released on success.
    pub fn rebuild(&mut self, inputs: &BundleInputs<'_>, extent: (u32, u32), samples: SampleCount) -> Result<()> {
        *self = Self::build(inputs, extent, samples)?;
        Ok(())
    }

    fn allocate_attachments(
        ctx: &RenderContext,
        graph: &RenderGraph,
        extent: (u32, u32),
        samples: SampleCount,
    ) -> Result<FxHashMap<String, Arc<AttachmentTexture>>> {
        let mut attachments: FxHashMap<String, Arc<AttachmentTexture>> = FxHashMap::default();
        for decl in graph.resources() {
            if decl.kind == AttachmentKind::SwapChain {
                continue;
            }
            if !decl.is_allocated(samples) {
                let primary = decl.resolves.as_deref().unwrap_or(&decl.name);
                let image = attachments.get(primary).cloned().ok_or_else(|| {
                    Error::InvalidResource(format!("resolve '{}' declared before its primary '{}'", decl.name, primary))
                })?;
                attachments.insert(decl.name.clone(), image);
                continue;
            }
            let (width, height) = decl.size.extent(extent);
            let desc = AttachmentTextureDesc::new(
                decl.name.clone(),
                decl.kind,
                width,
                height,
                decl.format,
                decl.samples.samples(samples),
            )
            .with_layers(decl.layers);
            attachments.insert(decl.name.clone(), ctx.device().create_attachment_texture(&desc)?);
        }
        Ok(attachments)
    }

    fn build_framebuffers(
        ctx: &RenderContext,
        graph: &RenderGraph,
        pass: &PassDecl,
        render_pass: &RenderPass,
        attachments: &FxHashMap<String, Arc<AttachmentTexture>>,
        samples: SampleCount,
    ) -> Result<Vec<Arc<dyn Framebuffer>>> {
        let images = graph
            .bound_attachments(pass, samples)
            .into_iter()
            .map(|name| {
                attachments
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::InvalidResource(format!("pass '{}' writes unallocated '{}'", pass.name, name)))
            })
            .collect::<Result<Vec<_>>>()?;
        let first = images
            .first()
            .ok_or_else(|| Error::InvalidResource(format!("pass '{}' has no attachments", pass.name)))?;
        let (width, height) = (first.width(), first.height());

        let views: Vec<ViewSelector> = if pass.per_layer {
            (0..first.layers()).map(ViewSelector::Layer).collect()
        } else {
            vec![ViewSelector::All]
        };
        views
            .into_iter()
            .map(|view| {
                let name = match view {
                    ViewSelector::Layer(layer) => format!("{}_{}", pass.name, layer),
                    ViewSelector::All => pass.name.clone(),
                };
                ctx.device().create_framebuffer(&FramebufferDesc {
                    name,
                    render_pass: render_pass.gpu(),
                    signature: render_pass.signature(),
                    attachments: images
                        .iter()
                        .map(|image| FramebufferAttachment { texture: image.texture().clone(), view })
                        .collect(),
                    width,
                    height,
                })
            })
            .collect()
    }

    fn build_input_sets(
        ctx: &RenderContext,
        pass: &PassDecl,
        layout: &Arc<dyn DescriptorSetLayout>,
        attachments: &FxHashMap<String, Arc<AttachmentTexture>>,
    ) -> Result<Vec<DescriptorSet>> {
        let sampled = |name: &str| -> Result<(Arc<dyn Texture>, SamplerKind)> {
            let image = attachments
                .get(name)
                .ok_or_else(|| Error::InvalidResource(format!("pass '{}' samples unallocated '{}'", pass.name, name)))?;
            Ok((image.texture().clone(), input_sampler_kind(image.format())))
        };
        match pass.inputs {
            InputBinding::OneSet => {
                let mut builder = DescriptorSetBuilder::new(format!("{}_inputs", pass.name), layout.clone());
                for (binding, read) in pass.reads.iter().enumerate() {
                    let (texture, kind) = sampled(read)?;
                    builder = builder.image(binding as u32, texture, ctx.sampler(kind));
                }
                Ok(vec![builder.bake(ctx.device())?])
            }
            InputBinding::PerRead => pass
                .reads
                .iter()
                .map(|read| {
                    let (texture, kind) = sampled(read)?;
                    DescriptorSetBuilder::new(format!("{}_{}", pass.name, read), layout.clone())
                        .image(0, texture, ctx.sampler(kind))
                        .bake(ctx.device())
                })
                .collect(),
        }
    }

    // ===== PER-FRAME UNIFORMS =====

    pub fn update_camera(&self, camera: &CameraComponent) -> Result<()> {
        write_uniform(self.camera_uniform.as_ref(), &CameraUniformData::from_camera(camera, self.extent))
    }

    pub fn update_shadows(&self, cascades: &[Cascade]) -> Result<()> {
        write_uniform(self.shadow_uniform.as_ref(), &ShadowUniformData::from_cascades(cascades))
    }

    // ===== ACCESSORS =====

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn samples(&self) -> SampleCount {
        self.samples
    }

    pub fn attachment(&self, name: &str) -> Option<&Arc<AttachmentTexture>> {
        self.attachments.get(name)
    }

    pub fn require_attachment(&self, name: &str) -> Result<&Arc<AttachmentTexture>> {
        self.attachment(name)
            .ok_or_else(|| Error::InvalidResource(format!("camera bundle has no attachment '{}'", name)))
    }

    /// Final single-sample color of this camera (editor viewport, present input)
    pub fn output(&self) -> &Arc<AttachmentTexture> {
        &self.output
    }

    /// Descriptor set the present pass samples `output` through
    pub fn output_set(&self) -> Option<&DescriptorSet> {
        self.input_sets(passes::PRESENT).first()
    }

    pub fn framebuffers(&self, pass: &str) -> &[Arc<dyn Framebuffer>] {
        self.framebuffers.get(pass).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn input_sets(&self, pass: &str) -> &[DescriptorSet] {
        self.input_sets.get(pass).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn camera_set(&self) -> &DescriptorSet {
        &self.camera_set
    }

    pub fn shadow_set(&self) -> &DescriptorSet {
        &self.shadow_set
    }

    pub fn ssao_set(&self) -> &DescriptorSet {
        &self.ssao_set
    }

    pub fn ssao_uniform(&self) -> &Arc<dyn Buffer> {
        &self.ssao_uniform
    }

    pub fn attachment_names(&self) -> impl Iterator<Item = &str> {
        self.attachments.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
