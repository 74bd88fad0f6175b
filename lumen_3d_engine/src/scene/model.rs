/// Model - the meshes an asset loader produced plus its texture cache

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::Texture;
use crate::renderer::RenderContext;
use super::mesh::Mesh;

#[derive(Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    textures: FxHashMap<String, Arc<dyn Texture>>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("meshes", &self.meshes)
            .field("textures", &self.textures.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Create (or fetch the cached) texture for `path` from decoded RGBA8
    /// pixels. Color maps are sampled as sRGB.
    pub fn load_texture(
        &mut self,
        ctx: &RenderContext,
        path: &str,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        srgb: bool,
    ) -> Result<Arc<dyn Texture>> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }
        let texture = ctx.create_texture_rgba8(path, width, height, pixels, srgb)?;
        self.textures.insert(path.to_string(), texture.clone());
        Ok(texture)
    }

    pub fn texture(&self, path: &str) -> Option<&Arc<dyn Texture>> {
        self.textures.get(path)
    }

    /// Cached texture for `path`, or `blank` with a warning when the
    /// loader never produced it
    pub fn texture_or_blank(&self, path: &str, blank: &Arc<dyn Texture>) -> Arc<dyn Texture> {
        match self.textures.get(path) {
            Some(texture) => texture.clone(),
            None => {
                crate::engine_warn!("lumen3d::scene", "Model '{}': texture '{}' not loaded, using blank", self.name, path);
                blank.clone()
            }
        }
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn allocate(&mut self, ctx: &RenderContext) -> Result<()> {
        for mesh in &mut self.meshes {
            mesh.allocate(ctx)?;
        }
        crate::engine_debug!("lumen3d::scene", "Allocated model '{}' ({} meshes)", self.name, self.meshes.len());
        Ok(())
    }

    /// Release every mesh's GPU side; the texture cache is kept
    pub fn deallocate(&mut self) {
        for mesh in &mut self.meshes {
            mesh.deallocate();
        }
    }

    pub fn is_allocated(&self) -> bool {
        !self.meshes.is_empty() && self.meshes.iter().all(Mesh::is_allocated)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
