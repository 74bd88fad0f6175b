/// VulkanTexture - Vulkan implementation of the Texture trait
///
/// Owns the image, its memory and every view of it: the full view (2D, 2D
/// array or cube) plus one 2D view per layer for layered images. Swapchain
/// images are wrapped without owning the image itself.

use lumen_3d_engine::lumen3d::render::{
    mip_levels_for, transition_rule, AttachmentTextureDesc, ImageLayout, SampleCount, Texture, TextureData,
    TextureDesc, TextureFormat, TextureUsage, TransitionRule, ViewSelector,
};
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::{engine_bail, engine_err};
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan::{access_flags_to_vk, format_to_vk, image_layout_to_vk, pipeline_stages_to_vk, sample_count_to_vk, texture_usage_to_vk};
use crate::vulkan_context::{GpuContext, StagingBuffer};
use crate::vulkan_swapchain::SwapchainHandle;

pub struct VulkanTexture {
    ctx: Arc<GpuContext>,
    desc: TextureDesc,
    pub(crate) image: vk::Image,
    allocation: Option<Allocation>,
    /// False for swapchain images
    owns_image: bool,
    /// Full view, sampling aspect
    full_view: vk::ImageView,
    /// Full view with depth + stencil aspects (stencil formats only)
    attachment_view: Option<vk::ImageView>,
    /// One 2D view per layer (layered images only)
    layer_views: Vec<vk::ImageView>,
    /// Keeps a retired swapchain alive until its image views are gone
    _swapchain: Option<Arc<SwapchainHandle>>,
}

/// Aspect used when sampling `format`
pub(crate) fn sample_aspect(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Aspect used when `format` is bound as an attachment or transitioned
pub(crate) fn full_aspect(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.has_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else {
        sample_aspect(format)
    }
}

impl VulkanTexture {
    /// Create the image, bind GPU-only memory and build every view
    pub(crate) fn create(ctx: &Arc<GpuContext>, desc: &TextureDesc) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 || desc.array_layers == 0 || desc.mip_levels == 0 {
            engine_bail!("lumen3d::vulkan", "Texture '{}' has a zero dimension ({}x{}, {} layers, {} mips)",
                desc.name, desc.width, desc.height, desc.array_layers, desc.mip_levels);
        }
        if desc.cube && desc.array_layers != 6 {
            engine_bail!("lumen3d::vulkan", "Cube texture '{}' needs 6 layers, got {}", desc.name, desc.array_layers);
        }
        if desc.mip_levels > mip_levels_for(desc.width, desc.height) {
            engine_bail!("lumen3d::vulkan", "Texture '{}' asks for {} mips, at most {} fit",
                desc.name, desc.mip_levels, mip_levels_for(desc.width, desc.height));
        }

        unsafe {
            let flags = if desc.cube { vk::ImageCreateFlags::CUBE_COMPATIBLE } else { vk::ImageCreateFlags::empty() };
            let image_info = vk::ImageCreateInfo::default()
                .flags(flags)
                .image_type(vk::ImageType::TYPE_2D)
                .format(format_to_vk(desc.format))
                .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                .mip_levels(desc.mip_levels)
                .array_layers(desc.array_layers)
                .samples(sample_count_to_vk(desc.samples))
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(texture_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx
                .device
                .create_image(&image_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create image '{}': {:?}", desc.name, e))?;

            let mut texture = Self {
                ctx: Arc::clone(ctx),
                desc: desc.clone(),
                image,
                allocation: None,
                owns_image: true,
                full_view: vk::ImageView::null(),
                attachment_view: None,
                layer_views: Vec::new(),
                _swapchain: None,
            };

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = texture
                .allocation
                .insert(ctx.allocate(&desc.name, requirements, MemoryLocation::GpuOnly, false)?);
            ctx.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to bind memory of image '{}': {:?}", desc.name, e))?;

            texture.create_views()?;
            Ok(texture)
        }
    }

    /// Wrap an image owned by a swapchain
    pub(crate) fn from_swapchain_image(
        ctx: &Arc<GpuContext>,
        image: vk::Image,
        desc: TextureDesc,
        owner: Arc<SwapchainHandle>,
    ) -> Result<Self> {
        let mut texture = Self {
            ctx: Arc::clone(ctx),
            desc,
            image,
            allocation: None,
            owns_image: false,
            full_view: vk::ImageView::null(),
            attachment_view: None,
            layer_views: Vec::new(),
            _swapchain: Some(owner),
        };
        texture.create_views()?;
        Ok(texture)
    }

    fn create_view(&self, view_type: vk::ImageViewType, aspect: vk::ImageAspectFlags, base_layer: u32, layer_count: u32) -> Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(self.image)
            .view_type(view_type)
            .format(format_to_vk(self.desc.format))
            .components(vk::ComponentMapping::default())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: self.desc.mip_levels,
                base_array_layer: base_layer,
                layer_count,
            });
        unsafe {
            self.ctx
                .device
                .create_image_view(&create_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create view of '{}': {:?}", self.desc.name, e))
        }
    }

    fn create_views(&mut self) -> Result<()> {
        let layers = self.desc.array_layers;
        let full_type = if self.desc.cube {
            vk::ImageViewType::CUBE
        } else if layers > 1 {
            vk::ImageViewType::TYPE_2D_ARRAY
        } else {
            vk::ImageViewType::TYPE_2D
        };

        self.full_view = self.create_view(full_type, sample_aspect(self.desc.format), 0, layers)?;
        if self.desc.format.has_stencil() {
            self.attachment_view = Some(self.create_view(full_type, full_aspect(self.desc.format), 0, layers)?);
        }
        if layers > 1 {
            for layer in 0..layers {
                let view = self.create_view(vk::ImageViewType::TYPE_2D, full_aspect(self.desc.format), layer, 1)?;
                self.layer_views.push(view);
            }
        }
        Ok(())
    }

    fn layer_view(&self, layer: u32) -> Result<vk::ImageView> {
        if self.desc.array_layers == 1 && layer == 0 {
            return Ok(self.attachment_view.unwrap_or(self.full_view));
        }
        self.layer_views.get(layer as usize).copied().ok_or_else(|| {
            Error::InvalidResource(format!("texture '{}' has no layer {}", self.desc.name, layer))
        })
    }

    /// View bound to a descriptor
    pub(crate) fn sample_view(&self, selector: ViewSelector) -> Result<vk::ImageView> {
        match selector {
            ViewSelector::All => Ok(self.full_view),
            ViewSelector::Layer(layer) => self.layer_view(layer),
        }
    }

    /// View bound to a framebuffer slot
    pub(crate) fn attachment_view(&self, selector: ViewSelector) -> Result<vk::ImageView> {
        match selector {
            ViewSelector::All => Ok(self.attachment_view.unwrap_or(self.full_view)),
            ViewSelector::Layer(layer) => self.layer_view(layer),
        }
    }

    /// Record a barrier moving every mip of `layer_count` layers from `old` to `new`
    pub(crate) fn record_barrier(
        &self,
        device: &ash::Device,
        cb: vk::CommandBuffer,
        old: ImageLayout,
        new: ImageLayout,
        rule: TransitionRule,
        base_layer: u32,
        layer_count: u32,
    ) {
        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(image_layout_to_vk(old))
            .new_layout(image_layout_to_vk(new))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: full_aspect(self.desc.format),
                base_mip_level: 0,
                level_count: self.desc.mip_levels,
                base_array_layer: base_layer,
                layer_count,
            })
            .src_access_mask(access_flags_to_vk(rule.src_access))
            .dst_access_mask(access_flags_to_vk(rule.dst_access));
        unsafe {
            device.cmd_pipeline_barrier(
                cb,
                pipeline_stages_to_vk(rule.src_stages),
                pipeline_stages_to_vk(rule.dst_stages),
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }

    /// Upload one buffer per layer into mip 0, blit the rest of the chain
    /// and leave every level in ShaderReadOnly
    pub(crate) fn upload(&self, data: &TextureData) -> Result<()> {
        let desc = &self.desc;
        if data.layers.len() != desc.array_layers as usize {
            engine_bail!("lumen3d::vulkan", "Texture '{}': {} data layers for {} array layers",
                desc.name, data.layers.len(), desc.array_layers);
        }
        let layer_size = desc.layer_size_bytes();
        if let Some((index, layer)) = data.layers.iter().enumerate().find(|(_, l)| l.len() != layer_size) {
            engine_bail!("lumen3d::vulkan", "Texture '{}' layer {}: {} bytes, expected {}",
                desc.name, index, layer.len(), layer_size);
        }

        let packed: Vec<u8> = data.layers.concat();
        let staging = StagingBuffer::new(&self.ctx, &format!("{}_staging", desc.name), &packed)?;

        let regions: Vec<vk::BufferImageCopy> = (0..desc.array_layers)
            .map(|layer| {
                vk::BufferImageCopy::default()
                    .buffer_offset(layer as u64 * layer_size as u64)
                    .image_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: sample_aspect(desc.format),
                        mip_level: 0,
                        base_array_layer: layer,
                        layer_count: 1,
                    })
                    .image_extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
            })
            .collect();

        // Barriers are validated up front so the recording closure cannot fail
        let to_dst = transition_rule(ImageLayout::Undefined, ImageLayout::TransferDst)?;
        let dst_to_src = transition_rule(ImageLayout::TransferDst, ImageLayout::TransferSrc)?;
        let src_to_read = transition_rule(ImageLayout::TransferSrc, ImageLayout::ShaderReadOnly)?;
        let dst_to_read = transition_rule(ImageLayout::TransferDst, ImageLayout::ShaderReadOnly)?;

        let image = self.image;
        let aspect = sample_aspect(desc.format);
        let layers = desc.array_layers;
        let mip_levels = desc.mip_levels;
        let (width, height) = (desc.width as i32, desc.height as i32);

        let mip_barrier = |level: u32, old: ImageLayout, new: ImageLayout, rule: TransitionRule| {
            let barrier = vk::ImageMemoryBarrier::default()
                .old_layout(image_layout_to_vk(old))
                .new_layout(image_layout_to_vk(new))
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: aspect,
                    base_mip_level: level,
                    level_count: if old == ImageLayout::Undefined { mip_levels } else { 1 },
                    base_array_layer: 0,
                    layer_count: layers,
                })
                .src_access_mask(access_flags_to_vk(rule.src_access))
                .dst_access_mask(access_flags_to_vk(rule.dst_access));
            (pipeline_stages_to_vk(rule.src_stages), pipeline_stages_to_vk(rule.dst_stages), barrier)
        };

        self.ctx.one_shot(&format!("upload texture '{}'", desc.name), |device, cb| unsafe {
            let (src, dst, barrier) = mip_barrier(0, ImageLayout::Undefined, ImageLayout::TransferDst, to_dst);
            device.cmd_pipeline_barrier(cb, src, dst, vk::DependencyFlags::empty(), &[], &[], &[barrier]);
            device.cmd_copy_buffer_to_image(cb, staging.buffer, image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, &regions);

            let (mut mip_width, mut mip_height) = (width, height);
            for level in 1..mip_levels {
                let (src, dst, barrier) = mip_barrier(level - 1, ImageLayout::TransferDst, ImageLayout::TransferSrc, dst_to_src);
                device.cmd_pipeline_barrier(cb, src, dst, vk::DependencyFlags::empty(), &[], &[], &[barrier]);

                let next_width = (mip_width / 2).max(1);
                let next_height = (mip_height / 2).max(1);
                let blit = vk::ImageBlit {
                    src_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: aspect,
                        mip_level: level - 1,
                        base_array_layer: 0,
                        layer_count: layers,
                    },
                    src_offsets: [vk::Offset3D { x: 0, y: 0, z: 0 }, vk::Offset3D { x: mip_width, y: mip_height, z: 1 }],
                    dst_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: aspect,
                        mip_level: level,
                        base_array_layer: 0,
                        layer_count: layers,
                    },
                    dst_offsets: [vk::Offset3D { x: 0, y: 0, z: 0 }, vk::Offset3D { x: next_width, y: next_height, z: 1 }],
                };
                device.cmd_blit_image(
                    cb,
                    image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[blit],
                    vk::Filter::LINEAR,
                );

                let (src, dst, barrier) = mip_barrier(level - 1, ImageLayout::TransferSrc, ImageLayout::ShaderReadOnly, src_to_read);
                device.cmd_pipeline_barrier(cb, src, dst, vk::DependencyFlags::empty(), &[], &[], &[barrier]);

                mip_width = next_width;
                mip_height = next_height;
            }

            let (src, dst, barrier) = mip_barrier(mip_levels - 1, ImageLayout::TransferDst, ImageLayout::ShaderReadOnly, dst_to_read);
            device.cmd_pipeline_barrier(cb, src, dst, vk::DependencyFlags::empty(), &[], &[], &[barrier]);
        })
    }
}

/// Texture description of a render-target image
pub(crate) fn attachment_texture_desc(desc: &AttachmentTextureDesc) -> TextureDesc {
    let usage = if desc.format.is_depth() {
        TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::SAMPLED
    } else {
        TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED | TextureUsage::TRANSFER_SRC
    };
    TextureDesc {
        name: desc.name.clone(),
        width: desc.width,
        height: desc.height,
        format: desc.format,
        mip_levels: 1,
        array_layers: desc.layers,
        cube: false,
        samples: desc.samples,
        usage,
    }
}

/// Texture description of a swapchain image
pub(crate) fn swapchain_texture_desc(index: usize, width: u32, height: u32, format: TextureFormat) -> TextureDesc {
    TextureDesc {
        name: format!("swapchain_{}", index),
        width,
        height,
        format,
        mip_levels: 1,
        array_layers: 1,
        cube: false,
        samples: SampleCount::S1,
        usage: TextureUsage::COLOR_ATTACHMENT | TextureUsage::TRANSFER_DST,
    }
}

impl Texture for VulkanTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.layer_views {
                self.ctx.device.destroy_image_view(view, None);
            }
            if let Some(view) = self.attachment_view {
                self.ctx.device.destroy_image_view(view, None);
            }
            if self.full_view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.full_view, None);
            }
            if self.owns_image {
                self.ctx.device.destroy_image(self.image, None);
            }
        }
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
    }
}
