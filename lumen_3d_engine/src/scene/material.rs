/// Per-mesh material: up to seven texture maps
///
/// Slots the loader could not fill stay empty and are bound to the blank
/// 1x1 white texture when the mesh is allocated.

use std::sync::Arc;
use crate::graphics_device::Texture;

pub const MATERIAL_SLOT_COUNT: usize = 7;

/// Texture map slot; binding N+1 of the mesh descriptor set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Base,
    Normal,
    Specular,
    Height,
    Albedo,
    Roughness,
    Metallic,
}

impl MaterialSlot {
    pub const ALL: [MaterialSlot; MATERIAL_SLOT_COUNT] = [
        MaterialSlot::Base,
        MaterialSlot::Normal,
        MaterialSlot::Specular,
        MaterialSlot::Height,
        MaterialSlot::Albedo,
        MaterialSlot::Roughness,
        MaterialSlot::Metallic,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Binding 0 is the mesh uniform buffer
    pub fn binding(&self) -> u32 {
        self.index() as u32 + 1
    }
}

#[derive(Clone, Default)]
pub struct Material {
    textures: [Option<Arc<dyn Texture>>; MATERIAL_SLOT_COUNT],
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<Option<&str>> =
            self.textures.iter().map(|t| t.as_ref().map(|t| t.desc().name.as_str())).collect();
        f.debug_struct("Material").field("textures", &names).finish()
    }
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: MaterialSlot, texture: Arc<dyn Texture>) -> Self {
        self.set(slot, texture);
        self
    }

    pub fn set(&mut self, slot: MaterialSlot, texture: Arc<dyn Texture>) {
        self.textures[slot.index()] = Some(texture);
    }

    pub fn clear(&mut self, slot: MaterialSlot) {
        self.textures[slot.index()] = None;
    }

    pub fn texture(&self, slot: MaterialSlot) -> Option<&Arc<dyn Texture>> {
        self.textures[slot.index()].as_ref()
    }

    /// Texture bound for `slot`: the material's own or `blank`
    pub fn texture_or<'a>(&'a self, slot: MaterialSlot, blank: &'a Arc<dyn Texture>) -> &'a Arc<dyn Texture> {
        self.texture(slot).unwrap_or(blank)
    }
}
