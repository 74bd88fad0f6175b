/// VulkanShader - shader module plus the resources it declares
///
/// SPIR-V is reflected with spirq when the module is created. A module that
/// does not export the requested entry point is rejected, and the reflected
/// descriptor bindings are checked against set layouts at pipeline creation.

use lumen_3d_engine::lumen3d::render::{DescriptorKind, Shader, ShaderDesc, ShaderStage, SPIRV_MAGIC};
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::{engine_bail, engine_debug, engine_err, engine_error};
use ash::vk;
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// One descriptor a shader reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReflectedBinding {
    pub set: u32,
    pub binding: u32,
    pub kind: DescriptorKind,
}

/// Resources declared by one entry point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ShaderReflection {
    pub bindings: Vec<ReflectedBinding>,
    pub push_constant_size: Option<u32>,
}

pub struct VulkanShader {
    ctx: Arc<GpuContext>,
    name: String,
    stage: ShaderStage,
    entry_point: String,
    pub(crate) entry_point_c: CString,
    pub(crate) module: vk::ShaderModule,
    pub(crate) reflection: ShaderReflection,
}

fn descriptor_kind(desc_ty: &spirq::ty::DescriptorType) -> Option<DescriptorKind> {
    use spirq::ty::DescriptorType;
    match desc_ty {
        DescriptorType::UniformBuffer() => Some(DescriptorKind::UniformBuffer),
        DescriptorType::CombinedImageSampler() => Some(DescriptorKind::CombinedImageSampler),
        _ => None,
    }
}

/// Reflect `entry_point` of a SPIR-V module
pub(crate) fn reflect(name: &str, code: &[u32], entry_point: &str) -> Result<ShaderReflection> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| {
            engine_error!("lumen3d::vulkan", "SPIR-V reflection of '{}' failed: {:?}", name, e);
            Error::InvalidResource(format!("shader '{}' is not valid SPIR-V: {:?}", name, e))
        })?;

    let entry = entry_points.iter().find(|ep| ep.name == entry_point).ok_or_else(|| {
        let found: Vec<&str> = entry_points.iter().map(|ep| ep.name.as_str()).collect();
        engine_error!("lumen3d::vulkan", "Shader '{}' has no entry point '{}' (found {:?})", name, entry_point, found);
        Error::InvalidResource(format!("shader '{}' has no entry point '{}'", name, entry_point))
    })?;

    let mut reflection = ShaderReflection::default();
    for var in &entry.vars {
        match var {
            spirq::var::Variable::Descriptor { desc_bind, desc_ty, .. } => {
                let Some(kind) = descriptor_kind(desc_ty) else {
                    engine_bail!("lumen3d::vulkan", "Shader '{}' set {} binding {}: unsupported descriptor type {:?}",
                        name, desc_bind.set(), desc_bind.bind(), desc_ty);
                };
                reflection.bindings.push(ReflectedBinding { set: desc_bind.set(), binding: desc_bind.bind(), kind });
            }
            spirq::var::Variable::PushConstant { ty, .. } => {
                reflection.push_constant_size = ty.nbyte().map(|size| size as u32);
            }
            _ => {}
        }
    }
    Ok(reflection)
}

impl VulkanShader {
    pub(crate) fn create(ctx: &Arc<GpuContext>, desc: &ShaderDesc<'_>) -> Result<Self> {
        if desc.code.first() != Some(&SPIRV_MAGIC) {
            engine_bail!("lumen3d::vulkan", "Shader '{}' does not start with the SPIR-V magic number", desc.name);
        }
        let reflection = reflect(desc.name, desc.code, desc.entry_point)?;
        let entry_point_c = CString::new(desc.entry_point)
            .map_err(|_| Error::InvalidResource(format!("entry point of '{}' contains a NUL byte", desc.name)))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(desc.code);
        let module = unsafe {
            ctx.device
                .create_shader_module(&create_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create shader module '{}': {:?}", desc.name, e))?
        };

        engine_debug!("lumen3d::vulkan", "Shader '{}' ({:?}): {} bindings, push constants {:?}",
            desc.name, desc.stage, reflection.bindings.len(), reflection.push_constant_size);

        Ok(Self {
            ctx: Arc::clone(ctx),
            name: desc.name.to_string(),
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
            entry_point_c,
            module,
            reflection,
        })
    }
}

impl Shader for VulkanShader {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanShader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
