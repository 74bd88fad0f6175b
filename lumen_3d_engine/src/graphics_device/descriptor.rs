/// Descriptor set layouts, writes and baked descriptor sets
///
/// Every descriptor set owns its own pool, sized for exactly its bindings,
/// so dropping the set releases everything it allocated.

use std::any::Any;
use std::sync::Arc;
use crate::error::{Error, Result};
use super::buffer::{Buffer, BufferUsage};
use super::graphics_device::GraphicsDevice;
use super::sampler::Sampler;
use super::shader::ShaderStageFlags;
use super::texture::{Texture, ViewSelector};

/// Descriptor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    UniformBuffer,
    CombinedImageSampler,
}

/// One binding slot of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub kind: DescriptorKind,
    pub stages: ShaderStageFlags,
}

impl DescriptorBinding {
    pub fn uniform(binding: u32, stages: ShaderStageFlags) -> Self {
        Self { binding, kind: DescriptorKind::UniformBuffer, stages }
    }

    pub fn sampler(binding: u32, stages: ShaderStageFlags) -> Self {
        Self { binding, kind: DescriptorKind::CombinedImageSampler, stages }
    }
}

/// Descriptor for creating a descriptor set layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSetLayoutDesc {
    pub name: String,
    pub bindings: Vec<DescriptorBinding>,
}

impl DescriptorSetLayoutDesc {
    pub fn new(name: impl Into<String>, bindings: Vec<DescriptorBinding>) -> Self {
        Self { name: name.into(), bindings }
    }

    /// `count` fragment-visible samplers at bindings 0..count
    pub fn samplers(name: impl Into<String>, count: u32) -> Self {
        Self::new(
            name,
            (0..count).map(|b| DescriptorBinding::sampler(b, ShaderStageFlags::FRAGMENT)).collect(),
        )
    }

    pub fn binding(&self, binding: u32) -> Option<&DescriptorBinding> {
        self.bindings.iter().find(|b| b.binding == binding)
    }

    /// Number of bindings of `kind` (pool sizing)
    pub fn count_of(&self, kind: DescriptorKind) -> u32 {
        self.bindings.iter().filter(|b| b.kind == kind).count() as u32
    }
}

/// Backend descriptor set layout
pub trait DescriptorSetLayout: Send + Sync {
    fn desc(&self) -> &DescriptorSetLayoutDesc;

    fn as_any(&self) -> &dyn Any;
}

/// One resource bound to one binding
#[derive(Clone)]
pub enum DescriptorWrite {
    Uniform {
        binding: u32,
        buffer: Arc<dyn Buffer>,
    },
    Image {
        binding: u32,
        texture: Arc<dyn Texture>,
        view: ViewSelector,
        sampler: Arc<dyn Sampler>,
    },
}

impl DescriptorWrite {
    pub fn binding(&self) -> u32 {
        match self {
            DescriptorWrite::Uniform { binding, .. } | DescriptorWrite::Image { binding, .. } => *binding,
        }
    }

    pub fn kind(&self) -> DescriptorKind {
        match self {
            DescriptorWrite::Uniform { .. } => DescriptorKind::UniformBuffer,
            DescriptorWrite::Image { .. } => DescriptorKind::CombinedImageSampler,
        }
    }
}

/// Check that `writes` covers every binding of `layout` exactly once with
/// the declared kind
pub fn validate_writes(layout: &DescriptorSetLayoutDesc, writes: &[DescriptorWrite]) -> Result<()> {
    for write in writes {
        let declared = layout.binding(write.binding()).ok_or_else(|| {
            Error::InvalidResource(format!("set layout '{}' has no binding {}", layout.name, write.binding()))
        })?;
        if declared.kind != write.kind() {
            return Err(Error::InvalidResource(format!(
                "set layout '{}' binding {} is {:?}, got {:?}",
                layout.name,
                write.binding(),
                declared.kind,
                write.kind()
            )));
        }
        if let DescriptorWrite::Uniform { buffer, .. } = write {
            if buffer.desc().usage != BufferUsage::Uniform {
                return Err(Error::InvalidResource(format!(
                    "buffer '{}' bound to '{}' is not a uniform buffer",
                    buffer.desc().name, layout.name
                )));
            }
        }
    }
    for binding in &layout.bindings {
        let count = writes.iter().filter(|w| w.binding() == binding.binding).count();
        if count != 1 {
            return Err(Error::InvalidResource(format!(
                "set layout '{}' binding {} written {} times",
                layout.name, binding.binding, count
            )));
        }
    }
    Ok(())
}

/// Backend descriptor set (with its own pool)
pub trait GpuDescriptorSet: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Unbaked descriptor set
#[derive(Clone)]
pub struct DescriptorSetBuilder {
    name: String,
    layout: Arc<dyn DescriptorSetLayout>,
    writes: Vec<DescriptorWrite>,
}

impl DescriptorSetBuilder {
    pub fn new(name: impl Into<String>, layout: Arc<dyn DescriptorSetLayout>) -> Self {
        Self { name: name.into(), layout, writes: Vec::new() }
    }

    pub fn uniform(mut self, binding: u32, buffer: Arc<dyn Buffer>) -> Self {
        self.writes.push(DescriptorWrite::Uniform { binding, buffer });
        self
    }

    pub fn image(mut self, binding: u32, texture: Arc<dyn Texture>, sampler: Arc<dyn Sampler>) -> Self {
        self.image_view(binding, texture, ViewSelector::All, sampler)
    }

    pub fn image_view(
        mut self,
        binding: u32,
        texture: Arc<dyn Texture>,
        view: ViewSelector,
        sampler: Arc<dyn Sampler>,
    ) -> Self {
        self.writes.push(DescriptorWrite::Image { binding, texture, view, sampler });
        self
    }

    pub fn bake(self, device: &dyn GraphicsDevice) -> Result<DescriptorSet> {
        validate_writes(self.layout.desc(), &self.writes)?;
        let gpu = device.create_descriptor_set(self.layout.as_ref(), &self.writes)?;
        Ok(DescriptorSet { name: self.name, layout: self.layout, writes: self.writes, gpu })
    }
}

/// Baked descriptor set
pub struct DescriptorSet {
    name: String,
    layout: Arc<dyn DescriptorSetLayout>,
    writes: Vec<DescriptorWrite>,
    gpu: Box<dyn GpuDescriptorSet>,
}

impl DescriptorSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &Arc<dyn DescriptorSetLayout> {
        &self.layout
    }

    pub fn gpu(&self) -> &dyn GpuDescriptorSet {
        self.gpu.as_ref()
    }

    pub fn writes(&self) -> &[DescriptorWrite] {
        &self.writes
    }

    /// Texture bound at `binding`, if it is an image binding
    pub fn bound_texture(&self, binding: u32) -> Option<&Arc<dyn Texture>> {
        self.writes.iter().find_map(|w| match w {
            DescriptorWrite::Image { binding: b, texture, .. } if *b == binding => Some(texture),
            _ => None,
        })
    }

    pub fn bound_buffer(&self, binding: u32) -> Option<&Arc<dyn Buffer>> {
        self.writes.iter().find_map(|w| match w {
            DescriptorWrite::Uniform { binding: b, buffer } if *b == binding => Some(buffer),
            _ => None,
        })
    }

    /// Destroy the pool and allocate a fresh set with the same writes
    pub fn rebake(&mut self, device: &dyn GraphicsDevice) -> Result<()> {
        self.gpu = device.create_descriptor_set(self.layout.as_ref(), &self.writes)?;
        Ok(())
    }

    /// Replace the writes and rebake
    pub fn rebind(&mut self, device: &dyn GraphicsDevice, writes: Vec<DescriptorWrite>) -> Result<()> {
        validate_writes(self.layout.desc(), &writes)?;
        self.gpu = device.create_descriptor_set(self.layout.as_ref(), &writes)?;
        self.writes = writes;
        Ok(())
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
