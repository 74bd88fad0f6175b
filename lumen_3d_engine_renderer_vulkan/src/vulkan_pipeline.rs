/// VulkanPipeline - graphics pipeline plus its pipeline layout
///
/// Both shaders are checked against the declared set layouts and push
/// constant ranges before anything is created: a shader reading a binding the
/// layout does not provide fails here instead of at draw time.

use lumen_3d_engine::lumen3d::render::{
    DescriptorSetLayoutDesc, GpuPipeline, GpuRenderPass, PipelineCreateInfo, PushConstantRange, Shader, ShaderStage,
    ShaderStageFlags,
};
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::{engine_debug, engine_err, engine_error};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan::{
    blend_factor_to_vk, buffer_format_to_vk, compare_op_to_vk, cull_mode_to_vk, downcast, front_face_to_vk,
    polygon_mode_to_vk, sample_count_to_vk, shader_stage_to_vk, stage_flags_to_vk, topology_to_vk,
};
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_set::VulkanDescriptorSetLayout;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_shader::{ShaderReflection, VulkanShader};

pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    name: String,
    set_count: usize,
    push_constants: Vec<PushConstantRange>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
}

/// Check that everything a shader stage reads is declared by the pipeline
pub(crate) fn check_interface(
    pipeline: &str,
    stage: ShaderStage,
    reflection: &ShaderReflection,
    set_layouts: &[&DescriptorSetLayoutDesc],
    push_constants: &[PushConstantRange],
) -> Result<()> {
    for used in &reflection.bindings {
        let layout = set_layouts.get(used.set as usize).ok_or_else(|| {
            Error::InvalidResource(format!(
                "pipeline '{}': {:?} shader reads set {} but only {} set layouts are declared",
                pipeline, stage, used.set, set_layouts.len()
            ))
        })?;
        let declared = layout.binding(used.binding).ok_or_else(|| {
            Error::InvalidResource(format!(
                "pipeline '{}': {:?} shader reads set {} binding {}, missing from layout '{}'",
                pipeline, stage, used.set, used.binding, layout.name
            ))
        })?;
        if declared.kind != used.kind {
            return Err(Error::InvalidResource(format!(
                "pipeline '{}': set {} binding {} is {:?} in '{}' but {:?} in the {:?} shader",
                pipeline, used.set, used.binding, declared.kind, layout.name, used.kind, stage
            )));
        }
        if !declared.stages.contains(stage.flags()) {
            return Err(Error::InvalidResource(format!(
                "pipeline '{}': set {} binding {} of '{}' is not visible to the {:?} stage",
                pipeline, used.set, used.binding, layout.name, stage
            )));
        }
    }

    if let Some(size) = reflection.push_constant_size {
        let covered = push_constants
            .iter()
            .filter(|range| range.stages.contains(stage.flags()))
            .map(|range| range.offset + range.size)
            .max()
            .unwrap_or(0);
        if covered < size {
            return Err(Error::InvalidResource(format!(
                "pipeline '{}': {:?} shader uses {} bytes of push constants, {} declared",
                pipeline, stage, size, covered
            )));
        }
    }
    Ok(())
}

/// Check that `[offset, offset + len)` lies in a range visible to `stages`
pub(crate) fn check_push_range(
    pipeline: &str,
    ranges: &[PushConstantRange],
    stages: ShaderStageFlags,
    offset: u32,
    len: u32,
) -> Result<()> {
    let fits = ranges.iter().any(|range| {
        range.stages.contains(stages) && offset >= range.offset && offset + len <= range.offset + range.size
    });
    if !fits {
        return Err(Error::InvalidResource(format!(
            "pipeline '{}': push of {} bytes at {} for {:?} is outside every declared range",
            pipeline, len, offset, stages
        )));
    }
    Ok(())
}

impl VulkanPipeline {
    pub(crate) fn create(ctx: &Arc<GpuContext>, info: &PipelineCreateInfo<'_>) -> Result<Self> {
        let desc = info.desc;
        let vertex = downcast::<VulkanShader>(desc.vertex_shader.as_any(), "vertex shader")?;
        let fragment = downcast::<VulkanShader>(desc.fragment_shader.as_any(), "fragment shader")?;
        let render_pass = downcast::<VulkanRenderPass>(info.render_pass.as_any(), "render pass")?;

        let set_layouts = desc
            .set_layouts
            .iter()
            .map(|layout| downcast::<VulkanDescriptorSetLayout>(layout.as_any(), "set layout"))
            .collect::<Result<Vec<_>>>()?;
        let layout_descs: Vec<&DescriptorSetLayoutDesc> = desc.set_layouts.iter().map(|l| l.desc()).collect();

        for shader in [vertex, fragment] {
            check_interface(&desc.name, shader.stage(), &shader.reflection, &layout_descs, &desc.push_constants)
                .inspect_err(|e| engine_error!("lumen3d::vulkan", "{}", e))?;
        }
        if info.blend_attachments.len() != desc.signature.color_count() {
            engine_error!("lumen3d::vulkan", "Pipeline '{}': {} blend states for {} color outputs",
                desc.name, info.blend_attachments.len(), desc.signature.color_count());
            return Err(Error::InvalidResource(format!("pipeline '{}' blend state count mismatch", desc.name)));
        }

        let vk_set_layouts: Vec<vk::DescriptorSetLayout> = set_layouts.iter().map(|l| l.layout).collect();
        let push_ranges: Vec<vk::PushConstantRange> = desc
            .push_constants
            .iter()
            .map(|range| vk::PushConstantRange {
                stage_flags: stage_flags_to_vk(range.stages),
                offset: range.offset,
                size: range.size,
            })
            .collect();
        let layout_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&vk_set_layouts)
            .push_constant_ranges(&push_ranges);
        let layout = unsafe {
            ctx.device
                .create_pipeline_layout(&layout_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create layout of pipeline '{}': {:?}", desc.name, e))?
        };

        let mut this = Self {
            ctx: Arc::clone(ctx),
            name: desc.name.clone(),
            set_count: vk_set_layouts.len(),
            push_constants: desc.push_constants.clone(),
            pipeline: vk::Pipeline::null(),
            layout,
        };

        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(ShaderStage::Vertex))
                .module(vertex.module)
                .name(&vertex.entry_point_c),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(ShaderStage::Fragment))
                .module(fragment.module)
                .name(&fragment.entry_point_c),
        ];

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = if desc.vertex_layout.is_empty() {
            Vec::new()
        } else {
            vec![vk::VertexInputBindingDescription {
                binding: 0,
                stride: desc.vertex_layout.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            }]
        };
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: 0,
                format: buffer_format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let properties = &desc.properties;
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(properties.topology))
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic; only the counts matter here
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let mut rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(polygon_mode_to_vk(properties.polygon_mode()))
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(properties.cull_mode))
            .front_face(front_face_to_vk(properties.front_face))
            .depth_bias_enable(properties.depth_bias.is_some());
        if let Some(bias) = properties.depth_bias {
            rasterization_state = rasterization_state
                .depth_bias_constant_factor(bias.constant_factor)
                .depth_bias_slope_factor(bias.slope_factor);
        }

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(properties.depth_test)
            .depth_write_enable(properties.depth_write)
            .depth_compare_op(compare_op_to_vk(properties.depth_compare))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(sample_count_to_vk(info.samples));

        let blend_states: Vec<vk::PipelineColorBlendAttachmentState> = info
            .blend_attachments
            .iter()
            .map(|blend| {
                vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .blend_enable(blend.blend_enable)
                    .src_color_blend_factor(blend_factor_to_vk(blend.src_factor))
                    .dst_color_blend_factor(blend_factor_to_vk(blend.dst_factor))
                    .color_blend_op(vk::BlendOp::ADD)
                    .src_alpha_blend_factor(blend_factor_to_vk(blend.src_factor))
                    .dst_alpha_blend_factor(blend_factor_to_vk(blend.dst_factor))
                    .alpha_blend_op(vk::BlendOp::ADD)
            })
            .collect();
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_states);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            ctx.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| engine_err!("lumen3d::vulkan", "Failed to create pipeline '{}': {:?}", desc.name, e))?
        };
        this.pipeline = pipelines[0];

        engine_debug!("lumen3d::vulkan", "Pipeline '{}' on '{}': {} sets, {} push ranges, {}x MSAA",
            desc.name, render_pass.name(), vk_set_layouts.len(), push_ranges.len(), info.samples.as_u32());
        Ok(this)
    }

    pub(crate) fn set_count(&self) -> usize {
        self.set_count
    }

    pub(crate) fn check_push_range(&self, stages: ShaderStageFlags, offset: u32, len: u32) -> Result<()> {
        check_push_range(&self.name, &self.push_constants, stages, offset, len)
    }
}

impl GpuPipeline for VulkanPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                self.ctx.device.destroy_pipeline(self.pipeline, None);
            }
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
