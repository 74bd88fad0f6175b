/// GpuContext - the Vulkan objects every resource shares
///
/// Each buffer, texture, view, pipeline and swapchain holds an
/// `Arc<GpuContext>`. The context destroys the device and instance when the
/// last of them is dropped, so no resource can outlive the device it was
/// created on.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::{engine_err, engine_error, engine_warn};
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

/// Shared GPU context
pub struct GpuContext {
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Dropped by hand before the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,

    pub(crate) graphics_queue: vk::Queue,
    pub(crate) graphics_queue_family: u32,
    pub(crate) present_queue: vk::Queue,

    /// TRANSIENT + RESET_COMMAND_BUFFER pool for one-shot uploads
    upload_command_pool: Mutex<vk::CommandPool>,

    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

/// Handles produced by instance and device setup
pub(crate) struct GpuContextParts {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub allocator: Allocator,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue: vk::Queue,
    pub upload_command_pool: vk::CommandPool,
    #[cfg(feature = "vulkan-validation")]
    pub debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl GpuContext {
    pub(crate) fn new(parts: GpuContextParts) -> Self {
        Self {
            entry: parts.entry,
            instance: parts.instance,
            physical_device: parts.physical_device,
            device: parts.device,
            allocator: ManuallyDrop::new(Mutex::new(parts.allocator)),
            graphics_queue: parts.graphics_queue,
            graphics_queue_family: parts.graphics_queue_family,
            present_queue: parts.present_queue,
            upload_command_pool: Mutex::new(parts.upload_command_pool),
            #[cfg(feature = "vulkan-validation")]
            debug_messenger: parts.debug_messenger,
        }
    }

    fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!("lumen3d::vulkan", "GPU allocator lock poisoned"))
    }

    /// Allocate memory for `requirements`; failures map to `OutOfMemory`
    pub(crate) fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        self.allocator()?
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!("lumen3d::vulkan", "Out of GPU memory for '{}' ({:.2} MB): {}", name, size_mb, e);
                Error::OutOfMemory
            })
    }

    /// Return an allocation to the allocator; failures are only logged
    pub(crate) fn free(&self, allocation: Allocation) {
        match self.allocator.lock() {
            Ok(mut allocator) => {
                if let Err(e) = allocator.free(allocation) {
                    engine_warn!("lumen3d::vulkan", "Failed to free GPU allocation: {}", e);
                }
            }
            Err(_) => engine_warn!("lumen3d::vulkan", "GPU allocator lock poisoned, leaking allocation"),
        }
    }

    /// Record commands into a one-shot command buffer, submit them and wait
    /// for the graphics queue to drain
    pub(crate) fn one_shot<F>(&self, label: &str, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let pool = self
            .upload_command_pool
            .lock()
            .map_err(|_| engine_err!("lumen3d::vulkan", "Upload command pool lock poisoned"))?;

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!("lumen3d::vulkan", "{}: failed to allocate command buffer: {:?}", label, e))?[0];

            let result = (|| {
                let begin_info = vk::CommandBufferBeginInfo::default()
                    .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
                self.device
                    .begin_command_buffer(command_buffer, &begin_info)
                    .map_err(|e| engine_err!("lumen3d::vulkan", "{}: failed to begin command buffer: {:?}", label, e))?;

                record(&self.device, command_buffer);

                self.device
                    .end_command_buffer(command_buffer)
                    .map_err(|e| engine_err!("lumen3d::vulkan", "{}: failed to end command buffer: {:?}", label, e))?;

                let command_buffers = [command_buffer];
                let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
                self.device
                    .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
                    .map_err(|e| engine_err!("lumen3d::vulkan", "{}: failed to submit: {:?}", label, e))?;
                self.device
                    .queue_wait_idle(self.graphics_queue)
                    .map_err(|e| engine_err!("lumen3d::vulkan", "{}: failed to wait for completion: {:?}", label, e))
            })();

            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            if let Ok(pool) = self.upload_command_pool.get_mut() {
                self.device.destroy_command_pool(*pool, None);
            }

            // Allocator pages must go before the device
            ManuallyDrop::drop(&mut self.allocator);

            #[cfg(feature = "vulkan-validation")]
            {
                crate::debug::cleanup_debug_config();
                if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                    debug_utils.destroy_debug_utils_messenger(messenger, None);
                }
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

/// Host-visible TRANSFER_SRC buffer filled at creation, freed on drop
pub(crate) struct StagingBuffer<'a> {
    ctx: &'a GpuContext,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

impl<'a> StagingBuffer<'a> {
    pub(crate) fn new(ctx: &'a GpuContext, name: &str, data: &[u8]) -> Result<Self> {
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(data.len() as u64)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = ctx
                .device
                .create_buffer(&create_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create staging buffer '{}': {:?}", name, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let mut staging = Self { ctx, buffer, allocation: None };
            let allocation = staging
                .allocation
                .insert(ctx.allocate(name, requirements, MemoryLocation::CpuToGpu, true)?);

            ctx.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to bind staging memory '{}': {:?}", name, e))?;

            let mapped = allocation
                .mapped_ptr()
                .ok_or_else(|| engine_err!("lumen3d::vulkan", "Staging buffer '{}' is not mapped", name))?
                .as_ptr() as *mut u8;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped, data.len());

            Ok(staging)
        }
    }
}

impl Drop for StagingBuffer<'_> {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
    }
}
