/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Owns instance/device setup and the single frame fence. Every resource it
/// creates holds the shared `GpuContext`, so resources may outlive the
/// device object itself.

use lumen_3d_engine::lumen3d::render::{
    transition_rule, AccessFlags, AttachmentTexture, AttachmentTextureDesc, BlendFactor, Buffer, BufferDesc,
    BufferFormat, CommandList, CompareOp, Config, CullMode, DescriptorKind, DescriptorSetLayout,
    DescriptorSetLayoutDesc, DescriptorWrite, Framebuffer, FramebufferDesc, FrontFace, GpuDescriptorSet,
    GpuPipeline, GpuRenderPass, GraphicsDevice, ImageLayout, IndexType, LoadOp, PipelineCreateInfo, PipelineStages,
    PolygonMode, PrimitiveTopology, RenderPassDesc, SampleCount, Sampler, SamplerKind, Shader, ShaderDesc,
    ShaderStage, ShaderStageFlags, StoreOp, Swapchain, Texture, TextureData, TextureDesc, TextureFormat,
    TextureUsage,
};
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::{engine_debug, engine_err, engine_error, engine_info};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::{GpuContext, GpuContextParts};
use crate::vulkan_descriptor_set::{VulkanDescriptorSet, VulkanDescriptorSetLayout};
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_sampler::SamplerCache;
use crate::vulkan_shader::VulkanShader;
use crate::vulkan_swapchain::{SurfaceOwner, VulkanSwapchain};
use crate::vulkan_texture::{attachment_texture_desc, VulkanTexture};

#[cfg(feature = "vulkan-validation")]
const VALIDATION_LAYER: &std::ffi::CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan device implementation
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    /// Signaled once the last submitted frame has finished on the GPU
    frame_fence: vk::Fence,
    samplers: SamplerCache,
    device_name: String,
    max_samples: SampleCount,
}

/// Queue families chosen on one physical device
struct QueueFamilies {
    graphics: u32,
    present: u32,
}

/// Lower is better: discrete, integrated, virtual, then anything else
pub(crate) fn device_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 0,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        _ => 3,
    }
}

fn init_error(what: &str, e: impl std::fmt::Debug) -> Error {
    engine_error!("lumen3d::vulkan", "{}: {:?}", what, e);
    Error::InitializationFailed(format!("{}: {:?}", what, e))
}

impl VulkanGraphicsDevice {
    /// Create the instance, pick a GPU able to present to `window` and
    /// create the logical device
    ///
    /// # Arguments
    ///
    /// * `window` - Window the swapchain will later present to
    /// * `config` - Application name and validation settings are read here
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| init_error("Failed to load the Vulkan library", e))?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| init_error("Application name contains a NUL byte", e))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Lumen3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window.display_handle().map_err(|e| init_error("Failed to get display handle", e))?;
            #[allow(unused_mut)]
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_error("Failed to get required instance extensions", e))?
                .to_vec();
            #[allow(unused_mut)]
            let mut layer_names: Vec<*const std::ffi::c_char> = Vec::new();

            #[cfg(feature = "vulkan-validation")]
            let validation = config.enable_validation;
            #[cfg(feature = "vulkan-validation")]
            if validation {
                let layers = entry
                    .enumerate_instance_layer_properties()
                    .map_err(|e| init_error("Failed to enumerate instance layers", e))?;
                let available = layers
                    .iter()
                    .any(|layer| layer.layer_name_as_c_str().map(|name| name == VALIDATION_LAYER).unwrap_or(false));
                if !available {
                    engine_error!("lumen3d::vulkan", "Validation requested but {:?} is not installed", VALIDATION_LAYER);
                    return Err(Error::InitializationFailed("validation layer not available".to_string()));
                }
                layer_names.push(VALIDATION_LAYER.as_ptr());
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }
            #[cfg(not(feature = "vulkan-validation"))]
            if config.enable_validation {
                lumen_3d_engine::engine_warn!("lumen3d::vulkan",
                    "Validation requested but the vulkan-validation feature is disabled, continuing without it");
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);
            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_error("Failed to create Vulkan instance", e))?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                Some(create_debug_messenger(&entry, &instance, config)?)
            } else {
                None
            };

            // Temporary surface, only used to find a present-capable queue
            let window_handle = window.window_handle().map_err(|e| init_error("Failed to get window handle", e))?;
            let surface = ash_window::create_surface(&entry, &instance, display_handle.as_raw(), window_handle.as_raw(), None)
                .map_err(|e| init_error("Failed to create surface", e))?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let picked = pick_physical_device(&instance, &surface_loader, surface);
            surface_loader.destroy_surface(surface, None);
            let (physical_device, families) = picked?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown device".to_string());
            let features = instance.get_physical_device_features(physical_device);
            let anisotropy = (features.sampler_anisotropy == vk::TRUE)
                .then(|| properties.limits.max_sampler_anisotropy.min(16.0));
            let limits = properties.limits;
            let sample_flags = limits.framebuffer_color_sample_counts & limits.framebuffer_depth_sample_counts;
            let max_samples = SampleCount::from_flags_max(sample_flags.as_raw());

            let priorities = [1.0];
            let mut queue_infos = vec![vk::DeviceQueueCreateInfo::default()
                .queue_family_index(families.graphics)
                .queue_priorities(&priorities)];
            if families.present != families.graphics {
                queue_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(families.present)
                        .queue_priorities(&priorities),
                );
            }
            let device_extensions = [ash::khr::swapchain::NAME.as_ptr()];
            let enabled_features = vk::PhysicalDeviceFeatures::default()
                .sampler_anisotropy(anisotropy.is_some())
                .fill_mode_non_solid(features.fill_mode_non_solid == vk::TRUE);
            let device_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_infos)
                .enabled_extension_names(&device_extensions)
                .enabled_features(&enabled_features);
            let device = instance
                .create_device(physical_device, &device_info, None)
                .map_err(|e| init_error("Failed to create logical device", e))?;

            let graphics_queue = device.get_device_queue(families.graphics, 0);
            let present_queue = device.get_device_queue(families.present, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| init_error("Failed to create GPU allocator", e))?;

            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(families.graphics)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let upload_command_pool = device
                .create_command_pool(&pool_info, None)
                .map_err(|e| init_error("Failed to create upload command pool", e))?;

            let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
            let frame_fence = device
                .create_fence(&fence_info, None)
                .map_err(|e| init_error("Failed to create frame fence", e))?;

            let ctx = Arc::new(GpuContext::new(GpuContextParts {
                entry,
                instance,
                physical_device,
                device,
                allocator,
                graphics_queue,
                graphics_queue_family: families.graphics,
                present_queue,
                upload_command_pool,
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
            }));

            engine_info!("lumen3d::vulkan", "Using '{}' ({:?}), max MSAA {}x, anisotropy {:?}",
                device_name, properties.device_type, max_samples.as_u32(), anisotropy);

            Ok(Self {
                ctx,
                frame_fence,
                samplers: SamplerCache::new(anisotropy),
                device_name,
                max_samples,
            })
        }
    }

    /// Create a swapchain presenting to `window`
    pub fn create_swapchain<W: HasDisplayHandle + HasWindowHandle>(
        &self,
        window: &W,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<VulkanSwapchain> {
        let display_handle = window.display_handle().map_err(|e| init_error("Failed to get display handle", e))?;
        let window_handle = window.window_handle().map_err(|e| init_error("Failed to get window handle", e))?;
        let surface = unsafe {
            ash_window::create_surface(
                &self.ctx.entry,
                &self.ctx.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_error("Failed to create surface", e))?
        };
        let surface = SurfaceOwner::new(&self.ctx, surface);

        let supported = unsafe {
            ash::khr::surface::Instance::new(&self.ctx.entry, &self.ctx.instance)
                .get_physical_device_surface_support(self.ctx.physical_device, self.ctx.graphics_queue_family, surface.surface)
                .unwrap_or(false)
        };
        if !supported {
            engine_debug!("lumen3d::vulkan", "Graphics family cannot present, relying on the dedicated present queue");
        }

        VulkanSwapchain::new(&self.ctx, surface, width, height, vsync)
    }
}

fn find_queue_families(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Option<QueueFamilies> {
    let families = unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
    let can_present = |index: u32| unsafe {
        surface_loader
            .get_physical_device_surface_support(physical_device, index, surface)
            .unwrap_or(false)
    };
    let graphics: Vec<u32> = families
        .iter()
        .enumerate()
        .filter(|(_, family)| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|(index, _)| index as u32)
        .collect();

    // One family doing both is preferred
    if let Some(&both) = graphics.iter().find(|&&index| can_present(index)) {
        return Some(QueueFamilies { graphics: both, present: both });
    }
    let present = (0..families.len() as u32).find(|&index| can_present(index))?;
    graphics.first().map(|&graphics| QueueFamilies { graphics, present })
}

fn supports_swapchain(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> bool {
    let extensions = unsafe { instance.enumerate_device_extension_properties(physical_device) };
    extensions
        .map(|extensions| {
            extensions.iter().any(|ext| {
                ext.extension_name_as_c_str()
                    .map(|name| name == ash::khr::swapchain::NAME)
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, QueueFamilies)> {
    let devices = unsafe {
        instance
            .enumerate_physical_devices()
            .map_err(|e| init_error("Failed to enumerate physical devices", e))?
    };

    devices
        .into_iter()
        .filter(|&device| supports_swapchain(instance, device))
        .filter_map(|device| {
            find_queue_families(instance, surface_loader, surface, device).map(|families| {
                let properties = unsafe { instance.get_physical_device_properties(device) };
                (device_rank(properties.device_type), device, families)
            })
        })
        .min_by_key(|(rank, _, _)| *rank)
        .map(|(_, device, families)| (device, families))
        .ok_or_else(|| {
            engine_error!("lumen3d::vulkan", "No GPU with graphics, present and swapchain support found");
            Error::InitializationFailed("no suitable GPU found".to_string())
        })
}

#[cfg(feature = "vulkan-validation")]
fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    config: &Config,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    crate::debug::init_debug_config(crate::debug::DebugConfig {
        severity: config.debug_severity,
        output: config.debug_output.clone(),
        message_filter: config.debug_message_filter,
        break_on_error: config.debug_break_on_error,
        panic_on_error: config.debug_panic_on_error,
        enable_stats: config.enable_validation_stats,
    });

    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(crate::debug::severity_flags(config.debug_severity))
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));
    let messenger = unsafe {
        debug_utils
            .create_debug_utils_messenger(&debug_info, None)
            .map_err(|e| init_error("Failed to create debug messenger", e))?
    };
    engine_debug!("lumen3d::vulkan", "Validation messenger installed ({:?})", config.debug_severity);
    Ok((debug_utils, messenger))
}

/// Downcast a trait object to the Vulkan type behind it
pub(crate) fn downcast<'a, T: 'static>(any: &'a dyn Any, what: &str) -> Result<&'a T> {
    any.downcast_ref::<T>().ok_or_else(|| {
        engine_error!("lumen3d::vulkan", "{} was not created by the Vulkan device", what);
        Error::InvalidResource(format!("{} is not a Vulkan resource", what))
    })
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(VulkanBuffer::create(&self.ctx, desc, data)?))
    }

    fn create_texture(&self, desc: &TextureDesc, data: &TextureData) -> Result<Arc<dyn Texture>> {
        if desc.mip_levels > 1 && !self.supports_linear_blit(desc.format) {
            engine_error!("lumen3d::vulkan", "Texture '{}': {:?} cannot be linearly blitted, mips unavailable",
                desc.name, desc.format);
            return Err(Error::Unsupported(format!("mip generation for {:?}", desc.format)));
        }
        let mut gpu_desc = desc.clone();
        gpu_desc.usage |= TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST;
        if desc.mip_levels > 1 {
            gpu_desc.usage |= TextureUsage::TRANSFER_SRC;
        }
        let texture = VulkanTexture::create(&self.ctx, &gpu_desc)?;
        texture.upload(data)?;
        engine_debug!("lumen3d::vulkan", "Texture '{}' {}x{} {:?}, {} mips, {} layers",
            desc.name, desc.width, desc.height, desc.format, desc.mip_levels, desc.array_layers);
        Ok(Arc::new(texture))
    }

    fn create_attachment_texture(&self, desc: &AttachmentTextureDesc) -> Result<Arc<AttachmentTexture>> {
        desc.validate()?;
        let texture = VulkanTexture::create(&self.ctx, &attachment_texture_desc(desc))?;
        let layout = desc.kind.attachment_layout();
        let rule = transition_rule(ImageLayout::Undefined, layout)?;
        self.ctx.one_shot(&format!("initial layout of '{}'", desc.name), |device, cb| {
            texture.record_barrier(device, cb, ImageLayout::Undefined, layout, rule, 0, desc.layers);
        })?;
        Ok(Arc::new(AttachmentTexture::new(desc.name.clone(), desc.kind, Arc::new(texture), layout)))
    }

    fn create_sampler(&self, kind: SamplerKind) -> Result<Arc<dyn Sampler>> {
        let sampler: Arc<dyn Sampler> = self.samplers.get(&self.ctx, kind)?;
        Ok(sampler)
    }

    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<Arc<dyn Shader>> {
        Ok(Arc::new(VulkanShader::create(&self.ctx, desc)?))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn GpuRenderPass>> {
        Ok(Arc::new(VulkanRenderPass::create(&self.ctx, desc)?))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc<'_>) -> Result<Arc<dyn Framebuffer>> {
        Ok(Arc::new(VulkanFramebuffer::create(&self.ctx, desc)?))
    }

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<Arc<dyn DescriptorSetLayout>> {
        Ok(Arc::new(VulkanDescriptorSetLayout::create(&self.ctx, desc)?))
    }

    fn create_descriptor_set(
        &self,
        layout: &dyn DescriptorSetLayout,
        writes: &[DescriptorWrite],
    ) -> Result<Box<dyn GpuDescriptorSet>> {
        let layout = downcast::<VulkanDescriptorSetLayout>(layout.as_any(), "descriptor set layout")?;
        Ok(Box::new(VulkanDescriptorSet::create(&self.ctx, layout, writes)?))
    }

    fn create_pipeline(&self, info: &PipelineCreateInfo<'_>) -> Result<Box<dyn GpuPipeline>> {
        Ok(Box::new(VulkanPipeline::create(&self.ctx, info)?))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(VulkanCommandList::new(&self.ctx)?))
    }

    fn wait_for_frame_fence(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .wait_for_fences(&[self.frame_fence], true, u64::MAX)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to wait for frame fence: {:?}", e))
        }
    }

    fn submit_frame(&self, commands: &dyn CommandList, swapchain: &dyn Swapchain) -> Result<()> {
        #[cfg(feature = "vulkan-validation")]
        if let Some(message) = crate::debug::take_fatal_error() {
            return Err(Error::BackendError(format!("validation error: {}", message)));
        }

        let commands = downcast::<VulkanCommandList>(commands.as_any(), "command list")?;
        let swapchain = downcast::<VulkanSwapchain>(swapchain.as_any(), "swapchain")?;
        let (wait, signal) = swapchain.sync_info()?;

        let command_buffers = [commands.command_buffer()];
        let wait_semaphores = [wait];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [signal];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx
                .device
                .reset_fences(&[self.frame_fence])
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to reset frame fence: {:?}", e))?;
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], self.frame_fence)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to submit frame: {:?}", e))
        }
    }

    fn max_usable_sample_count(&self) -> SampleCount {
        self.max_samples
    }

    fn supports_linear_blit(&self, format: TextureFormat) -> bool {
        let properties = unsafe {
            self.ctx
                .instance
                .get_physical_device_format_properties(self.ctx.physical_device, format_to_vk(format))
        };
        properties.optimal_tiling_features.contains(
            vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR
                | vk::FormatFeatureFlags::BLIT_SRC
                | vk::FormatFeatureFlags::BLIT_DST,
        )
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to wait for device idle: {:?}", e))
        }
    }

    fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            self.ctx.device.destroy_fence(self.frame_fence, None);
        }
        self.samplers.clear();
    }
}

// ===== Conversions to Vulkan =====

pub(crate) fn format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::R8_UNORM => vk::Format::R8_UNORM,
        TextureFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        TextureFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        TextureFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

/// Engine format for a surface format, if the engine has one
pub(crate) fn format_from_vk(format: vk::Format) -> Option<TextureFormat> {
    match format {
        vk::Format::R8G8B8A8_UNORM => Some(TextureFormat::R8G8B8A8_UNORM),
        vk::Format::R8G8B8A8_SRGB => Some(TextureFormat::R8G8B8A8_SRGB),
        vk::Format::B8G8R8A8_UNORM => Some(TextureFormat::B8G8R8A8_UNORM),
        vk::Format::B8G8R8A8_SRGB => Some(TextureFormat::B8G8R8A8_SRGB),
        vk::Format::R16G16B16A16_SFLOAT => Some(TextureFormat::R16G16B16A16_SFLOAT),
        _ => None,
    }
}

pub(crate) fn buffer_format_to_vk(format: BufferFormat) -> vk::Format {
    match format {
        BufferFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        BufferFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        BufferFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
        BufferFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        BufferFormat::R32_UINT => vk::Format::R32_UINT,
        BufferFormat::R32_SINT => vk::Format::R32_SINT,
        BufferFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
    }
}

pub(crate) fn sample_count_to_vk(samples: SampleCount) -> vk::SampleCountFlags {
    vk::SampleCountFlags::from_raw(samples.as_u32())
}

pub(crate) fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(TextureUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::COLOR_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(TextureUsage::TRANSFER_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(TextureUsage::TRANSFER_DST) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn pipeline_stages_to_vk(stages: PipelineStages) -> vk::PipelineStageFlags {
    const TABLE: [(PipelineStages, vk::PipelineStageFlags); 8] = [
        (PipelineStages::TOP_OF_PIPE, vk::PipelineStageFlags::TOP_OF_PIPE),
        (PipelineStages::VERTEX_SHADER, vk::PipelineStageFlags::VERTEX_SHADER),
        (PipelineStages::FRAGMENT_SHADER, vk::PipelineStageFlags::FRAGMENT_SHADER),
        (PipelineStages::EARLY_FRAGMENT_TESTS, vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS),
        (PipelineStages::LATE_FRAGMENT_TESTS, vk::PipelineStageFlags::LATE_FRAGMENT_TESTS),
        (PipelineStages::COLOR_ATTACHMENT_OUTPUT, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT),
        (PipelineStages::TRANSFER, vk::PipelineStageFlags::TRANSFER),
        (PipelineStages::BOTTOM_OF_PIPE, vk::PipelineStageFlags::BOTTOM_OF_PIPE),
    ];
    TABLE
        .iter()
        .filter(|(engine, _)| stages.contains(*engine))
        .fold(vk::PipelineStageFlags::empty(), |acc, (_, vk_stage)| acc | *vk_stage)
}

pub(crate) fn access_flags_to_vk(access: AccessFlags) -> vk::AccessFlags {
    const TABLE: [(AccessFlags, vk::AccessFlags); 7] = [
        (AccessFlags::SHADER_READ, vk::AccessFlags::SHADER_READ),
        (AccessFlags::COLOR_ATTACHMENT_READ, vk::AccessFlags::COLOR_ATTACHMENT_READ),
        (AccessFlags::COLOR_ATTACHMENT_WRITE, vk::AccessFlags::COLOR_ATTACHMENT_WRITE),
        (AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ, vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ),
        (AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE, vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE),
        (AccessFlags::TRANSFER_READ, vk::AccessFlags::TRANSFER_READ),
        (AccessFlags::TRANSFER_WRITE, vk::AccessFlags::TRANSFER_WRITE),
    ];
    TABLE
        .iter()
        .filter(|(engine, _)| access.contains(*engine))
        .fold(vk::AccessFlags::empty(), |acc, (_, vk_access)| acc | *vk_access)
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn shader_stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
    }
}

pub(crate) fn stage_flags_to_vk(flags: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut vk_flags = vk::ShaderStageFlags::empty();
    if flags.contains(ShaderStageFlags::VERTEX) {
        vk_flags |= vk::ShaderStageFlags::VERTEX;
    }
    if flags.contains(ShaderStageFlags::FRAGMENT) {
        vk_flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    vk_flags
}

pub(crate) fn descriptor_kind_to_vk(kind: DescriptorKind) -> vk::DescriptorType {
    match kind {
        DescriptorKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
    }
}

pub(crate) fn cull_mode_to_vk(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
        CullMode::Both => vk::CullModeFlags::FRONT_AND_BACK,
    }
}

pub(crate) fn front_face_to_vk(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
        FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
    }
}

pub(crate) fn polygon_mode_to_vk(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Fill => vk::PolygonMode::FILL,
        PolygonMode::Line => vk::PolygonMode::LINE,
    }
}

pub(crate) fn compare_op_to_vk(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::Never => vk::CompareOp::NEVER,
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::Equal => vk::CompareOp::EQUAL,
        CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Greater => vk::CompareOp::GREATER,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

pub(crate) fn blend_factor_to_vk(factor: BlendFactor) -> vk::BlendFactor {
    match factor {
        BlendFactor::Zero => vk::BlendFactor::ZERO,
        BlendFactor::One => vk::BlendFactor::ONE,
        BlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
