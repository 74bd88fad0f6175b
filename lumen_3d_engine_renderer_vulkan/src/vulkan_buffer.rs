/// VulkanBuffer - Vulkan implementation of the Buffer trait
///
/// Vertex and index buffers live in GPU-only memory and are filled once
/// through a staging copy. Uniform buffers are allocated CpuToGpu
/// (host-visible, coherent) and written through their persistent mapping.

use lumen_3d_engine::lumen3d::render::{check_update, Buffer, BufferDesc, BufferUsage};
use lumen_3d_engine::lumen3d::Result;
use lumen_3d_engine::engine_err;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, StagingBuffer};

pub struct VulkanBuffer {
    ctx: Arc<GpuContext>,
    desc: BufferDesc,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

impl VulkanBuffer {
    pub(crate) fn create(ctx: &Arc<GpuContext>, desc: &BufferDesc, data: Option<&[u8]>) -> Result<Self> {
        desc.validate_initial_data(data)?;

        let (usage, location) = match desc.usage {
            BufferUsage::Vertex => (
                vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
                MemoryLocation::GpuOnly,
            ),
            BufferUsage::Index => (
                vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
                MemoryLocation::GpuOnly,
            ),
            BufferUsage::Uniform => (vk::BufferUsageFlags::UNIFORM_BUFFER, MemoryLocation::CpuToGpu),
        };

        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = ctx.device.create_buffer(&create_info, None).map_err(|e| {
                engine_err!("lumen3d::vulkan", "Failed to create buffer '{}' ({} bytes): {:?}", desc.name, desc.size, e)
            })?;

            // From here on Drop cleans up whatever was created
            let mut this = Self { ctx: Arc::clone(ctx), desc: desc.clone(), buffer, allocation: None };

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = this
                .allocation
                .insert(ctx.allocate(&desc.name, requirements, location, true)?);
            ctx.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to bind memory of buffer '{}': {:?}", desc.name, e))?;

            if let Some(bytes) = data {
                if desc.usage.is_device_local() {
                    let staging = StagingBuffer::new(ctx, &format!("{}_staging", desc.name), bytes)?;
                    let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size: bytes.len() as u64 };
                    ctx.one_shot(&format!("upload '{}'", desc.name), |device, cb| {
                        device.cmd_copy_buffer(cb, staging.buffer, buffer, &[region]);
                    })?;
                } else {
                    this.write(0, bytes)?;
                }
            }

            Ok(this)
        }
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| engine_err!("lumen3d::vulkan", "Buffer '{}' has no allocation", self.desc.name))?;
        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| engine_err!("lumen3d::vulkan", "Buffer '{}' is not CPU-accessible", self.desc.name))?
            .as_ptr() as *mut u8;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.add(offset as usize), data.len());
        }
        Ok(())
    }
}

impl Buffer for VulkanBuffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_update(&self.desc, offset, data.len())?;
        self.write(offset, data)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
    }
}
