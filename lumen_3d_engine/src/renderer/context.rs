/// RenderContext - the narrow GPU context handed to resource owners
///
/// Meshes, sprites, the skybox and camera bundles allocate through this
/// context instead of reaching a global renderer. It owns the shared
/// descriptor set layouts, the fixed samplers and the blank texture.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferDesc, BufferUsage, DescriptorBinding, DescriptorSetLayout, DescriptorSetLayoutDesc,
    GraphicsDevice, Sampler, SamplerKind, ShaderStageFlags, Texture, TextureData, TextureDesc, TextureFormat,
};
use crate::scene::MATERIAL_SLOT_COUNT;

/// Descriptor set layouts shared by every camera and mesh
#[derive(Clone)]
pub struct SetLayouts {
    /// Binding 0: camera uniforms, binding 1: lights
    pub camera: Arc<dyn DescriptorSetLayout>,
    /// Binding 0: cascade matrices and split depths
    pub shadow: Arc<dyn DescriptorSetLayout>,
    /// Binding 0: model/normal matrices, bindings 1..=7: material maps
    pub mesh: Arc<dyn DescriptorSetLayout>,
    /// Binding 0: sprite uniforms, binding 1: sprite texture
    pub sprite: Arc<dyn DescriptorSetLayout>,
    /// Binding 0: cube map
    pub skybox: Arc<dyn DescriptorSetLayout>,
    /// Binding 0: kernel and parameters, binding 1: rotation noise
    pub ssao_kernel: Arc<dyn DescriptorSetLayout>,
}

impl SetLayouts {
    fn new(device: &dyn GraphicsDevice) -> Result<Self> {
        let vertex = ShaderStageFlags::VERTEX;
        let fragment = ShaderStageFlags::FRAGMENT;
        let both = ShaderStageFlags::ALL_GRAPHICS;

        let mut mesh_bindings = vec![DescriptorBinding::uniform(0, vertex)];
        mesh_bindings.extend((1..=MATERIAL_SLOT_COUNT as u32).map(|b| DescriptorBinding::sampler(b, fragment)));

        Ok(Self {
            camera: device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::new(
                "camera",
                vec![DescriptorBinding::uniform(0, both), DescriptorBinding::uniform(1, fragment)],
            ))?,
            shadow: device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::new(
                "shadow",
                vec![DescriptorBinding::uniform(0, both)],
            ))?,
            mesh: device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::new("mesh", mesh_bindings))?,
            sprite: device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::new(
                "sprite",
                vec![DescriptorBinding::uniform(0, both), DescriptorBinding::sampler(1, fragment)],
            ))?,
            skybox: device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::new(
                "skybox",
                vec![DescriptorBinding::sampler(0, fragment)],
            ))?,
            ssao_kernel: device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::new(
                "ssao_kernel",
                vec![DescriptorBinding::uniform(0, fragment), DescriptorBinding::sampler(1, fragment)],
            ))?,
        })
    }
}

/// The five fixed samplers
#[derive(Clone)]
struct Samplers {
    linear: Arc<dyn Sampler>,
    nearest: Arc<dyn Sampler>,
    linear_clamp: Arc<dyn Sampler>,
    nearest_clamp: Arc<dyn Sampler>,
    shadow: Arc<dyn Sampler>,
}

impl Samplers {
    fn get(&self, kind: SamplerKind) -> &Arc<dyn Sampler> {
        match kind {
            SamplerKind::Linear => &self.linear,
            SamplerKind::Nearest => &self.nearest,
            SamplerKind::LinearClamp => &self.linear_clamp,
            SamplerKind::NearestClamp => &self.nearest_clamp,
            SamplerKind::Shadow => &self.shadow,
        }
    }
}

pub struct RenderContext {
    device: Arc<dyn GraphicsDevice>,
    layouts: SetLayouts,
    samplers: Samplers,
    blank: Arc<dyn Texture>,
}

impl RenderContext {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Result<Self> {
        let layouts = SetLayouts::new(device.as_ref())?;
        let samplers = Samplers {
            linear: device.create_sampler(SamplerKind::Linear)?,
            nearest: device.create_sampler(SamplerKind::Nearest)?,
            linear_clamp: device.create_sampler(SamplerKind::LinearClamp)?,
            nearest_clamp: device.create_sampler(SamplerKind::NearestClamp)?,
            shadow: device.create_sampler(SamplerKind::Shadow)?,
        };
        let blank = device.create_texture(
            &TextureDesc::sampled("blank", 1, 1, TextureFormat::R8G8B8A8_UNORM).without_mips(),
            &TextureData::single(vec![255; 4]),
        )?;
        Ok(Self { device, layouts, samplers, blank })
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn device_arc(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn layouts(&self) -> &SetLayouts {
        &self.layouts
    }

    pub fn sampler(&self, kind: SamplerKind) -> Arc<dyn Sampler> {
        self.samplers.get(kind).clone()
    }

    /// 1x1 opaque white, bound wherever a material map is missing
    pub fn blank_texture(&self) -> &Arc<dyn Texture> {
        &self.blank
    }

    /// Sampled RGBA8 texture with a full mip chain generated on the GPU
    ///
    /// Fails with `Unsupported` when the format cannot be linearly blitted.
    pub fn create_texture_rgba8(
        &self,
        name: &str,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        srgb: bool,
    ) -> Result<Arc<dyn Texture>> {
        let format = if srgb { TextureFormat::R8G8B8A8_SRGB } else { TextureFormat::R8G8B8A8_UNORM };
        let desc = TextureDesc::sampled(name, width, height, format);
        if pixels.len() != desc.layer_size_bytes() {
            return Err(Error::InvalidResource(format!(
                "texture '{}': {} bytes of pixels for {}x{} RGBA8",
                name,
                pixels.len(),
                width,
                height
            )));
        }
        if desc.mip_levels > 1 && !self.device.supports_linear_blit(format) {
            return Err(Error::Unsupported(format!(
                "texture '{}': {:?} does not support linear blitting for mipmaps",
                name, format
            )));
        }
        self.device.create_texture(&desc, &TextureData::single(pixels))
    }

    /// Host-visible uniform buffer initialized with `value`
    pub fn create_uniform_buffer<T: bytemuck::Pod>(&self, name: &str, value: &T) -> Result<Arc<dyn Buffer>> {
        let bytes = bytemuck::bytes_of(value);
        self.device.create_buffer(&BufferDesc::new(name, bytes.len() as u64, BufferUsage::Uniform), Some(bytes))
    }

    /// Device-local buffer filled once from `data`
    pub fn create_static_buffer(&self, name: &str, usage: BufferUsage, data: &[u8]) -> Result<Arc<dyn Buffer>> {
        self.device.create_buffer(&BufferDesc::new(name, data.len() as u64, usage), Some(data))
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
