/// Descriptor set layouts and descriptor sets
///
/// Each descriptor set allocates from a pool sized for exactly its own
/// layout. Rebinding a set creates a new one, and dropping it returns
/// everything at once.

use lumen_3d_engine::lumen3d::render::{
    validate_writes, DescriptorKind, DescriptorSetLayout, DescriptorSetLayoutDesc, DescriptorWrite, GpuDescriptorSet,
};
use lumen_3d_engine::lumen3d::Result;
use lumen_3d_engine::{engine_bail, engine_err};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan::{descriptor_kind_to_vk, downcast, stage_flags_to_vk};
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_sampler::VulkanSampler;
use crate::vulkan_texture::VulkanTexture;

pub struct VulkanDescriptorSetLayout {
    ctx: Arc<GpuContext>,
    desc: DescriptorSetLayoutDesc,
    pub(crate) layout: vk::DescriptorSetLayout,
}

impl VulkanDescriptorSetLayout {
    pub(crate) fn create(ctx: &Arc<GpuContext>, desc: &DescriptorSetLayoutDesc) -> Result<Self> {
        let mut seen = Vec::with_capacity(desc.bindings.len());
        for binding in &desc.bindings {
            if seen.contains(&binding.binding) {
                engine_bail!("lumen3d::vulkan", "Set layout '{}' declares binding {} twice", desc.name, binding.binding);
            }
            seen.push(binding.binding);
        }

        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_kind_to_vk(b.kind))
                    .descriptor_count(1)
                    .stage_flags(stage_flags_to_vk(b.stages))
            })
            .collect();
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let layout = unsafe {
            ctx.device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create set layout '{}': {:?}", desc.name, e))?
        };
        Ok(Self { ctx: Arc::clone(ctx), desc: desc.clone(), layout })
    }
}

impl DescriptorSetLayout for VulkanDescriptorSetLayout {
    fn desc(&self) -> &DescriptorSetLayoutDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanDescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Pool sizes covering one set of `desc`; kinds the layout does not use are omitted
pub(crate) fn pool_sizes(desc: &DescriptorSetLayoutDesc) -> Vec<vk::DescriptorPoolSize> {
    [DescriptorKind::UniformBuffer, DescriptorKind::CombinedImageSampler]
        .into_iter()
        .map(|kind| (kind, desc.count_of(kind)))
        .filter(|(_, count)| *count > 0)
        .map(|(kind, count)| {
            vk::DescriptorPoolSize::default()
                .ty(descriptor_kind_to_vk(kind))
                .descriptor_count(count)
        })
        .collect()
}

pub struct VulkanDescriptorSet {
    ctx: Arc<GpuContext>,
    pool: vk::DescriptorPool,
    pub(crate) set: vk::DescriptorSet,
}

impl VulkanDescriptorSet {
    pub(crate) fn create(
        ctx: &Arc<GpuContext>,
        layout: &VulkanDescriptorSetLayout,
        writes: &[DescriptorWrite],
    ) -> Result<Self> {
        validate_writes(&layout.desc, writes)?;

        let sizes = pool_sizes(&layout.desc);
        let pool_info = vk::DescriptorPoolCreateInfo::default().max_sets(1).pool_sizes(&sizes);
        let pool = unsafe {
            ctx.device.create_descriptor_pool(&pool_info, None).map_err(|e| {
                engine_err!("lumen3d::vulkan", "Failed to create descriptor pool for '{}': {:?}", layout.desc.name, e)
            })?
        };
        // From here on Drop releases the pool
        let mut this = Self { ctx: Arc::clone(ctx), pool, set: vk::DescriptorSet::null() };

        let layouts = [layout.layout];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);
        this.set = unsafe {
            ctx.device.allocate_descriptor_sets(&allocate_info).map_err(|e| {
                engine_err!("lumen3d::vulkan", "Failed to allocate descriptor set '{}': {:?}", layout.desc.name, e)
            })?[0]
        };

        this.write(writes)?;
        Ok(this)
    }

    fn write(&self, writes: &[DescriptorWrite]) -> Result<()> {
        // Infos must stay put while the write structs point into them
        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        for write in writes {
            match write {
                DescriptorWrite::Uniform { buffer, .. } => {
                    let vk_buffer = downcast::<VulkanBuffer>(buffer.as_any(), "uniform buffer")?;
                    buffer_infos.push(
                        vk::DescriptorBufferInfo::default()
                            .buffer(vk_buffer.buffer)
                            .offset(0)
                            .range(vk::WHOLE_SIZE),
                    );
                }
                DescriptorWrite::Image { texture, view, sampler, .. } => {
                    let vk_texture = downcast::<VulkanTexture>(texture.as_any(), "texture")?;
                    let vk_sampler = downcast::<VulkanSampler>(sampler.as_any(), "sampler")?;
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_view(vk_texture.sample_view(*view)?)
                            .sampler(vk_sampler.sampler)
                            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                    );
                }
            }
        }

        let (mut next_buffer, mut next_image) = (0, 0);
        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .map(|write| {
                let base = vk::WriteDescriptorSet::default()
                    .dst_set(self.set)
                    .dst_binding(write.binding())
                    .dst_array_element(0)
                    .descriptor_type(descriptor_kind_to_vk(write.kind()));
                match write {
                    DescriptorWrite::Uniform { .. } => {
                        next_buffer += 1;
                        base.buffer_info(std::slice::from_ref(&buffer_infos[next_buffer - 1]))
                    }
                    DescriptorWrite::Image { .. } => {
                        next_image += 1;
                        base.image_info(std::slice::from_ref(&image_infos[next_image - 1]))
                    }
                }
            })
            .collect();

        unsafe {
            self.ctx.device.update_descriptor_sets(&vk_writes, &[]);
        }
        Ok(())
    }
}

impl GpuDescriptorSet for VulkanDescriptorSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanDescriptorSet {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}
