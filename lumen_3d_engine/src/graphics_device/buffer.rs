/// Buffer trait and buffer descriptor
///
/// Vertex and index buffers are device-local and filled once through a
/// staging copy. Uniform buffers are host-visible, host-coherent and stay
/// mapped for their whole life; `update` writes straight into the mapping.

use std::any::Any;
use crate::error::{Error, Result};

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
}

impl BufferUsage {
    /// Device-local buffers are immutable after their initial upload
    pub fn is_device_local(&self) -> bool {
        matches!(self, BufferUsage::Vertex | BufferUsage::Index)
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    pub usage: BufferUsage,
}

impl BufferDesc {
    pub fn new(name: impl Into<String>, size: u64, usage: BufferUsage) -> Self {
        Self { name: name.into(), size, usage }
    }

    /// Check creation-time data against the descriptor
    pub fn validate_initial_data(&self, data: Option<&[u8]>) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidResource(format!("buffer '{}' has zero size", self.name)));
        }
        match (self.usage.is_device_local(), data) {
            (true, None) => Err(Error::InvalidResource(format!(
                "device-local buffer '{}' needs initial data",
                self.name
            ))),
            (_, Some(bytes)) if bytes.len() as u64 > self.size => Err(Error::InvalidResource(format!(
                "buffer '{}': {} bytes of data exceed size {}",
                self.name,
                bytes.len(),
                self.size
            ))),
            _ => Ok(()),
        }
    }
}

/// Vertex attribute data format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum BufferFormat {
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    R32_UINT,
    R32_SINT,
    R8G8B8A8_UNORM,
}

impl BufferFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            BufferFormat::R32_SFLOAT | BufferFormat::R32_UINT | BufferFormat::R32_SINT => 4,
            BufferFormat::R8G8B8A8_UNORM => 4,
            BufferFormat::R32G32_SFLOAT => 8,
            BufferFormat::R32G32B32_SFLOAT => 12,
            BufferFormat::R32G32B32A32_SFLOAT => 16,
        }
    }
}

/// Buffer resource trait
///
/// Implemented by backend buffer types. The buffer is destroyed when dropped.
pub trait Buffer: Send + Sync {
    fn desc(&self) -> &BufferDesc;

    /// Write into mapped memory. Fails for device-local buffers and for
    /// writes past the end of the buffer.
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Range check shared by backend `update` implementations
pub fn check_update(desc: &BufferDesc, offset: u64, len: usize) -> Result<()> {
    if desc.usage.is_device_local() {
        return Err(Error::InvalidResource(format!(
            "buffer '{}' is device-local and cannot be updated from the CPU",
            desc.name
        )));
    }
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= desc.size => Ok(()),
        _ => Err(Error::InvalidResource(format!(
            "buffer '{}': write of {} bytes at offset {} exceeds size {}",
            desc.name, len, offset, desc.size
        ))),
    }
}

/// Write a plain-old-data value at the start of a uniform buffer
pub fn write_uniform<T: bytemuck::Pod>(buffer: &dyn Buffer, value: &T) -> Result<()> {
    buffer.update(0, bytemuck::bytes_of(value))
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
