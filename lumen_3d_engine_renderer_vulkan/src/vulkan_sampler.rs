/// VulkanSampler and the per-device sampler cache
///
/// The engine only ever needs the five `SamplerKind`s, so each is created on
/// first request and shared afterwards.

use lumen_3d_engine::lumen3d::render::{Sampler, SamplerKind};
use lumen_3d_engine::lumen3d::Result;
use lumen_3d_engine::{engine_debug, engine_err};
use ash::vk;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;

pub struct VulkanSampler {
    ctx: Arc<GpuContext>,
    kind: SamplerKind,
    pub(crate) sampler: vk::Sampler,
}

/// Fixed-function parameters of one sampler kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SamplerParams {
    pub filter: vk::Filter,
    pub mipmap_mode: vk::SamplerMipmapMode,
    pub address_mode: vk::SamplerAddressMode,
    pub anisotropic: bool,
    pub border: vk::BorderColor,
    pub compare: Option<vk::CompareOp>,
}

pub(crate) fn sampler_params(kind: SamplerKind) -> SamplerParams {
    let (filter, mipmap_mode, address_mode, anisotropic) = match kind {
        SamplerKind::Linear => (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR, vk::SamplerAddressMode::REPEAT, true),
        SamplerKind::Nearest => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST, vk::SamplerAddressMode::REPEAT, false),
        SamplerKind::LinearClamp => (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR, vk::SamplerAddressMode::CLAMP_TO_EDGE, false),
        SamplerKind::NearestClamp => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST, vk::SamplerAddressMode::CLAMP_TO_EDGE, false),
        SamplerKind::Shadow => (vk::Filter::LINEAR, vk::SamplerMipmapMode::NEAREST, vk::SamplerAddressMode::CLAMP_TO_BORDER, false),
    };
    let (border, compare) = match kind {
        SamplerKind::Shadow => (vk::BorderColor::FLOAT_OPAQUE_WHITE, Some(vk::CompareOp::LESS_OR_EQUAL)),
        _ => (vk::BorderColor::FLOAT_OPAQUE_BLACK, None),
    };
    SamplerParams { filter, mipmap_mode, address_mode, anisotropic, border, compare }
}

impl VulkanSampler {
    fn create(ctx: &Arc<GpuContext>, kind: SamplerKind, max_anisotropy: Option<f32>) -> Result<Self> {
        let params = sampler_params(kind);
        let anisotropy = max_anisotropy.filter(|_| params.anisotropic);

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(params.filter)
            .min_filter(params.filter)
            .mipmap_mode(params.mipmap_mode)
            .address_mode_u(params.address_mode)
            .address_mode_v(params.address_mode)
            .address_mode_w(params.address_mode)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(params.border)
            .compare_enable(params.compare.is_some())
            .compare_op(params.compare.unwrap_or(vk::CompareOp::ALWAYS))
            .anisotropy_enable(anisotropy.is_some())
            .max_anisotropy(anisotropy.unwrap_or(1.0))
            .unnormalized_coordinates(false);

        let sampler = unsafe {
            ctx.device
                .create_sampler(&create_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create {:?} sampler: {:?}", kind, e))?
        };
        Ok(Self { ctx: Arc::clone(ctx), kind, sampler })
    }
}

impl Sampler for VulkanSampler {
    fn kind(&self) -> SamplerKind {
        self.kind
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanSampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}

/// Creates each sampler kind once per device
pub(crate) struct SamplerCache {
    max_anisotropy: Option<f32>,
    cache: Mutex<FxHashMap<SamplerKind, Arc<VulkanSampler>>>,
}

impl SamplerCache {
    pub(crate) fn new(max_anisotropy: Option<f32>) -> Self {
        Self { max_anisotropy, cache: Mutex::new(FxHashMap::default()) }
    }

    pub(crate) fn get(&self, ctx: &Arc<GpuContext>, kind: SamplerKind) -> Result<Arc<VulkanSampler>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| engine_err!("lumen3d::vulkan", "Sampler cache lock poisoned"))?;
        if let Some(sampler) = cache.get(&kind) {
            return Ok(Arc::clone(sampler));
        }
        let sampler = Arc::new(VulkanSampler::create(ctx, kind, self.max_anisotropy)?);
        engine_debug!("lumen3d::vulkan", "Created {:?} sampler", kind);
        cache.insert(kind, Arc::clone(&sampler));
        Ok(sampler)
    }

    /// Release the cached samplers (before the context goes away)
    pub(crate) fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}
