/// Texture trait, formats, sample counts and texture descriptors

use std::any::Any;
use bitflags::bitflags;

/// Texture and attachment pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R8_UNORM,
    R16G16B16A16_SFLOAT,
    R32_SFLOAT,
    D32_SFLOAT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D32_SFLOAT | TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_SFLOAT_S8_UINT
        )
    }

    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_SFLOAT_S8_UINT)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8_UNORM => 1,
            TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM
            | TextureFormat::B8G8R8A8_SRGB
            | TextureFormat::R32_SFLOAT
            | TextureFormat::D32_SFLOAT
            | TextureFormat::D24_UNORM_S8_UINT => 4,
            TextureFormat::D32_SFLOAT_S8_UINT => 5,
            TextureFormat::R16G16B16A16_SFLOAT => 8,
        }
    }
}

/// MSAA sample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleCount {
    S1 = 1,
    S2 = 2,
    S4 = 4,
    S8 = 8,
    S16 = 16,
    S32 = 32,
    S64 = 64,
}

impl SampleCount {
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    pub fn from_u32(count: u32) -> Option<Self> {
        match count {
            1 => Some(SampleCount::S1),
            2 => Some(SampleCount::S2),
            4 => Some(SampleCount::S4),
            8 => Some(SampleCount::S8),
            16 => Some(SampleCount::S16),
            32 => Some(SampleCount::S32),
            64 => Some(SampleCount::S64),
            _ => None,
        }
    }

    /// Highest sample count set in a mask of supported counts
    /// (bit N set means 2^N samples supported).
    pub fn from_flags_max(flags: u32) -> Self {
        let supported = flags & 0x7F;
        if supported == 0 {
            return SampleCount::S1;
        }
        let highest = 1u32 << (31 - supported.leading_zeros());
        SampleCount::from_u32(highest).unwrap_or(SampleCount::S1)
    }

    pub fn clamp_to(self, max: SampleCount) -> Self {
        self.min(max)
    }

    pub fn is_multisampled(&self) -> bool {
        *self != SampleCount::S1
    }
}

bitflags! {
    /// How a texture is used by the GPU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLED = 1 << 0;
        const COLOR_ATTACHMENT = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 2;
        const TRANSFER_SRC = 1 << 3;
        const TRANSFER_DST = 1 << 4;
    }
}

/// Which image view of a texture to bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewSelector {
    /// The full view: 2D, 2D array (layers > 1) or cube
    All,
    /// A single-layer 2D view
    Layer(u32),
}

/// Descriptor for creating a texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mip_levels: u32,
    pub array_layers: u32,
    /// Six layers viewed as a cube map
    pub cube: bool,
    pub samples: SampleCount,
    pub usage: TextureUsage,
}

impl TextureDesc {
    /// Sampled 2D texture with a full mip chain
    pub fn sampled(name: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            mip_levels: mip_levels_for(width, height),
            array_layers: 1,
            cube: false,
            samples: SampleCount::S1,
            usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_SRC | TextureUsage::TRANSFER_DST,
        }
    }

    /// Sampled cube map (one mip level)
    pub fn cube(name: impl Into<String>, size: u32, format: TextureFormat) -> Self {
        Self {
            name: name.into(),
            width: size,
            height: size,
            format,
            mip_levels: 1,
            array_layers: 6,
            cube: true,
            samples: SampleCount::S1,
            usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
        }
    }

    pub fn without_mips(mut self) -> Self {
        self.mip_levels = 1;
        self
    }

    pub fn layer_size_bytes(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize
    }
}

/// Number of mip levels for a full chain down to 1x1
pub fn mip_levels_for(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    32 - largest.leading_zeros()
}

/// Pixel data uploaded at creation time, one entry per array layer
#[derive(Debug, Clone)]
pub struct TextureData {
    pub layers: Vec<Vec<u8>>,
}

impl TextureData {
    pub fn single(bytes: Vec<u8>) -> Self {
        Self { layers: vec![bytes] }
    }

    pub fn layers(layers: Vec<Vec<u8>>) -> Self {
        Self { layers }
    }
}

/// Texture resource trait
///
/// Implemented by backend texture types. The GPU image, its memory and
/// every view are destroyed when the last `Arc` is dropped.
pub trait Texture: Send + Sync {
    fn desc(&self) -> &TextureDesc;

    fn as_any(&self) -> &dyn Any;
}
