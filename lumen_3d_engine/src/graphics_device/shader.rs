/// Shader modules and the shader compilation boundary
///
/// Compiling shader source is outside the engine: a `ShaderCompiler` turns
/// `ShaderProperties` into SPIR-V words. `PrecompiledShaderLoader` is the
/// built-in implementation that reads `.spv` files produced offline.

use std::any::Any;
use bitflags::bitflags;
use crate::error::{Error, Result};

/// SPIR-V magic number (first word of every module)
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Programmable stage a shader module is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn flags(&self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => ShaderStageFlags::FRAGMENT,
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::Fragment => "frag",
        }
    }
}

bitflags! {
    /// Shader stage visibility for descriptors and push constants
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const ALL_GRAPHICS = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

/// Source language of a shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderLang {
    Glsl,
    Hlsl,
    Spirv,
}

/// Everything a compiler needs to produce one shader module
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProperties {
    pub stage: ShaderStage,
    pub lang: ShaderLang,
    /// Entry point name
    pub main: String,
    /// Inline source; empty when `path` is used
    pub source: String,
    pub path: String,
    /// Preprocessor defines as (name, value)
    pub defines: Vec<(String, String)>,
}

impl ShaderProperties {
    /// Precompiled SPIR-V at `<dir>/<name>.<vert|frag>.spv`
    pub fn precompiled(dir: &str, name: &str, stage: ShaderStage) -> Self {
        Self {
            stage,
            lang: ShaderLang::Spirv,
            main: "main".to_string(),
            source: String::new(),
            path: format!("{}/{}.{}.spv", dir.trim_end_matches('/'), name, stage.file_extension()),
            defines: Vec::new(),
        }
    }

    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), value.into()));
        self
    }
}

/// Opaque "source + defines -> SPIR-V" service
pub trait ShaderCompiler: Send + Sync {
    fn compile(&self, properties: &ShaderProperties) -> Result<Vec<u32>>;
}

/// Loads precompiled SPIR-V from disk; rejects non-SPIR-V properties
#[derive(Debug, Default, Clone, Copy)]
pub struct PrecompiledShaderLoader;

impl ShaderCompiler for PrecompiledShaderLoader {
    fn compile(&self, properties: &ShaderProperties) -> Result<Vec<u32>> {
        if properties.lang != ShaderLang::Spirv {
            return Err(Error::Unsupported(format!(
                "{:?} source needs an external compiler ({})",
                properties.lang, properties.path
            )));
        }
        let bytes = std::fs::read(&properties.path).map_err(|e| {
            crate::engine_error!("lumen3d::shader", "Failed to read '{}': {}", properties.path, e);
            Error::InvalidResource(format!("cannot read shader '{}': {}", properties.path, e))
        })?;
        spirv_words_from_bytes(&bytes)
            .map_err(|e| Error::InvalidResource(format!("'{}': {}", properties.path, e)))
    }
}

/// Reinterpret a little-endian byte stream as SPIR-V words
pub fn spirv_words_from_bytes(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 || bytes.len() < 20 {
        return Err(Error::InvalidResource(format!(
            "SPIR-V byte length {} is not a whole module",
            bytes.len()
        )));
    }
    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    if words[0] != SPIRV_MAGIC {
        return Err(Error::InvalidResource(format!("bad SPIR-V magic 0x{:08x}", words[0])));
    }
    Ok(words)
}

/// Descriptor for creating a shader module
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    pub name: &'a str,
    pub stage: ShaderStage,
    pub entry_point: &'a str,
    pub code: &'a [u32],
}

/// Shader module trait
pub trait Shader: Send + Sync {
    fn name(&self) -> &str;
    fn stage(&self) -> ShaderStage;
    fn entry_point(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
