/// VulkanSwapchain - Vulkan implementation of the Swapchain trait
///
/// Images are exposed as `VulkanTexture`s so the renderer can build present
/// framebuffers from them like any other attachment. Each image wrapper holds
/// the swapchain it came from: after a recreate the retired swapchain stays
/// alive until the last framebuffer using its images is dropped.

use lumen_3d_engine::lumen3d::render::{AcquireResult, PresentResult, Swapchain, Texture, TextureFormat};
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::{engine_err, engine_error, engine_info, engine_warn};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan::format_from_vk;
use crate::vulkan_context::GpuContext;
use crate::vulkan_texture::{swapchain_texture_desc, VulkanTexture};

/// Window surface; destroyed after every swapchain built on it
pub(crate) struct SurfaceOwner {
    ctx: Arc<GpuContext>,
    loader: ash::khr::surface::Instance,
    pub(crate) surface: vk::SurfaceKHR,
}

impl SurfaceOwner {
    pub(crate) fn new(ctx: &Arc<GpuContext>, surface: vk::SurfaceKHR) -> Self {
        let loader = ash::khr::surface::Instance::new(&ctx.entry, &ctx.instance);
        Self { ctx: Arc::clone(ctx), loader, surface }
    }

    fn capabilities(&self) -> Result<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to get surface capabilities: {:?}", e))
        }
    }
}

impl Drop for SurfaceOwner {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

/// One VkSwapchainKHR, current or retired
pub(crate) struct SwapchainHandle {
    loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    _surface: Arc<SurfaceOwner>,
}

impl Drop for SwapchainHandle {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Prefer an sRGB BGRA surface, then sRGB RGBA, then anything the engine can name
pub(crate) fn choose_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    let preferred = [vk::Format::B8G8R8A8_SRGB, vk::Format::R8G8B8A8_SRGB];
    preferred
        .iter()
        .find_map(|&format| {
            available
                .iter()
                .find(|f| f.format == format && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        })
        .or_else(|| available.iter().find(|f| format_from_vk(f.format).is_some()))
        .copied()
}

/// FIFO with vsync; otherwise MAILBOX, then IMMEDIATE, then FIFO
pub(crate) fn choose_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// The surface decides the extent unless it reports the "any size" sentinel
pub(crate) fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }
    vk::Extent2D {
        width: width.clamp(caps.min_image_extent.width, caps.max_image_extent.width),
        height: height.clamp(caps.min_image_extent.height, caps.max_image_extent.height),
    }
}

/// One more than the minimum, within the surface maximum (0 means unbounded)
pub(crate) fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

pub struct VulkanSwapchain {
    ctx: Arc<GpuContext>,
    loader: ash::khr::swapchain::Device,
    surface: Arc<SurfaceOwner>,
    handle: Arc<SwapchainHandle>,
    format: TextureFormat,
    extent: vk::Extent2D,
    images: Vec<Arc<VulkanTexture>>,

    /// Signaled by acquire; the device waits on it at submit
    image_available: vk::Semaphore,
    /// One per image, signaled by submit and waited on by present
    render_finished: Vec<vk::Semaphore>,

    /// Image acquired and not yet presented
    current_image: Option<u32>,
}

impl VulkanSwapchain {
    pub(crate) fn new(ctx: &Arc<GpuContext>, surface: SurfaceOwner, width: u32, height: u32, vsync: bool) -> Result<Self> {
        let loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);
        let surface = Arc::new(surface);

        let built = build_swapchain(ctx, &loader, &surface, width, height, vsync, vk::SwapchainKHR::null())?;

        let mut swapchain = Self {
            ctx: Arc::clone(ctx),
            loader,
            surface,
            handle: built.handle,
            format: built.format,
            extent: built.extent,
            images: built.images,
            image_available: vk::Semaphore::null(),
            render_finished: Vec::new(),
            current_image: None,
        };
        swapchain.create_semaphores()?;
        Ok(swapchain)
    }

    fn create_semaphores(&mut self) -> Result<()> {
        let create_info = vk::SemaphoreCreateInfo::default();
        unsafe {
            self.image_available = self
                .ctx
                .device
                .create_semaphore(&create_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create image-available semaphore: {:?}", e))?;
            for _ in 0..self.images.len() {
                let semaphore = self
                    .ctx
                    .device
                    .create_semaphore(&create_info, None)
                    .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create render-finished semaphore: {:?}", e))?;
                self.render_finished.push(semaphore);
            }
        }
        Ok(())
    }

    fn destroy_semaphores(&mut self) {
        unsafe {
            if self.image_available != vk::Semaphore::null() {
                self.ctx.device.destroy_semaphore(self.image_available, None);
                self.image_available = vk::Semaphore::null();
            }
            for semaphore in self.render_finished.drain(..) {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
        }
    }

    /// (wait, signal) semaphores for submitting work that renders into the
    /// acquired image
    pub(crate) fn sync_info(&self) -> Result<(vk::Semaphore, vk::Semaphore)> {
        let index = self.current_image.ok_or_else(|| {
            Error::InvalidState("submit_frame without an acquired swapchain image".to_string())
        })?;
        let signal = self.render_finished.get(index as usize).copied().ok_or_else(|| {
            engine_err!("lumen3d::vulkan", "No render-finished semaphore for swapchain image {}", index)
        })?;
        Ok((self.image_available, signal))
    }
}

struct BuiltSwapchain {
    handle: Arc<SwapchainHandle>,
    format: TextureFormat,
    extent: vk::Extent2D,
    images: Vec<Arc<VulkanTexture>>,
}

fn build_swapchain(
    ctx: &Arc<GpuContext>,
    loader: &ash::khr::swapchain::Device,
    surface: &Arc<SurfaceOwner>,
    width: u32,
    height: u32,
    vsync: bool,
    old_swapchain: vk::SwapchainKHR,
) -> Result<BuiltSwapchain> {
    let caps = surface.capabilities()?;
    let (formats, present_modes) = unsafe {
        let formats = surface
            .loader
            .get_physical_device_surface_formats(ctx.physical_device, surface.surface)
            .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to query surface formats: {:?}", e))?;
        let modes = surface
            .loader
            .get_physical_device_surface_present_modes(ctx.physical_device, surface.surface)
            .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to query present modes: {:?}", e))?;
        (formats, modes)
    };

    let surface_format = choose_surface_format(&formats).ok_or_else(|| {
        engine_error!("lumen3d::vulkan", "No supported surface format among {:?}", formats);
        Error::InitializationFailed("no supported surface format".to_string())
    })?;
    let format = format_from_vk(surface_format.format).ok_or_else(|| {
        Error::InitializationFailed(format!("surface format {:?} has no engine equivalent", surface_format.format))
    })?;
    let present_mode = choose_present_mode(&present_modes, vsync);
    let extent = choose_extent(&caps, width, height);
    let image_count = choose_image_count(&caps);

    let create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface.surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(caps.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(old_swapchain);

    let swapchain = unsafe {
        loader.create_swapchain(&create_info, None).map_err(|e| {
            engine_error!("lumen3d::vulkan", "Failed to create swapchain: {:?}", e);
            Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
        })?
    };
    let handle = Arc::new(SwapchainHandle {
        loader: loader.clone(),
        swapchain,
        _surface: Arc::clone(surface),
    });

    let raw_images = unsafe {
        loader.get_swapchain_images(swapchain).map_err(|e| {
            engine_error!("lumen3d::vulkan", "Failed to get swapchain images: {:?}", e);
            Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
        })?
    };
    let images = raw_images
        .iter()
        .enumerate()
        .map(|(index, &image)| {
            let desc = swapchain_texture_desc(index, extent.width, extent.height, format);
            VulkanTexture::from_swapchain_image(ctx, image, desc, Arc::clone(&handle)).map(Arc::new)
        })
        .collect::<Result<Vec<_>>>()?;

    engine_info!("lumen3d::vulkan", "Swapchain {}x{}, {:?}, {:?}, {} images",
        extent.width, extent.height, format, present_mode, images.len());

    Ok(BuiltSwapchain { handle, format, extent, images })
}

impl Swapchain for VulkanSwapchain {
    fn acquire_next_image(&mut self) -> Result<AcquireResult> {
        let acquired = unsafe {
            self.loader
                .acquire_next_image(self.handle.swapchain, u64::MAX, self.image_available, vk::Fence::null())
        };
        match acquired {
            Ok((index, suboptimal)) => {
                self.current_image = Some(index);
                if suboptimal {
                    return Ok(AcquireResult::Suboptimal(index));
                }
                Ok(AcquireResult::Acquired(index))
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.current_image = None;
                Ok(AcquireResult::OutOfDate)
            }
            Err(e) => Err(engine_err!("lumen3d::vulkan", "Failed to acquire next swapchain image: {:?}", e)),
        }
    }

    fn present(&mut self, image_index: u32) -> Result<PresentResult> {
        let wait = *self.render_finished.get(image_index as usize).ok_or_else(|| {
            Error::InvalidResource(format!("swapchain image {} out of range ({} images)", image_index, self.images.len()))
        })?;
        let swapchains = [self.handle.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        self.current_image = None;
        match unsafe { self.loader.queue_present(self.ctx.present_queue, &present_info) } {
            Ok(false) => Ok(PresentResult::Presented),
            Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(PresentResult::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
            Err(e) => Err(engine_err!("lumen3d::vulkan", "Failed to present swapchain image: {:?}", e)),
        }
    }

    fn recreate(&mut self, width: u32, height: u32, vsync: bool) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to wait idle before swapchain recreate: {:?}", e))?;
        }

        let built = build_swapchain(&self.ctx, &self.loader, &self.surface, width, height, vsync, self.handle.swapchain)?;

        // Retired images may still back live framebuffers; they keep the old
        // swapchain alive through their own handle
        self.handle = built.handle;
        self.format = built.format;
        self.extent = built.extent;
        self.images = built.images;
        self.current_image = None;

        self.destroy_semaphores();
        self.create_semaphores()
    }

    fn extent(&self) -> (u32, u32) {
        (self.extent.width, self.extent.height)
    }

    fn surface_extent(&self) -> (u32, u32) {
        match self.surface.capabilities() {
            Ok(caps) if caps.current_extent.width != u32::MAX => (caps.current_extent.width, caps.current_extent.height),
            Ok(_) => (self.extent.width, self.extent.height),
            Err(_) => {
                engine_warn!("lumen3d::vulkan", "Surface capabilities unavailable, keeping {}x{}",
                    self.extent.width, self.extent.height);
                (self.extent.width, self.extent.height)
            }
        }
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    fn image(&self, index: u32) -> Option<Arc<dyn Texture>> {
        self.images.get(index as usize).map(|image| Arc::clone(image) as Arc<dyn Texture>)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }
        self.destroy_semaphores();
    }
}
