/// FrameScene - what the renderer draws this frame
///
/// Built by the scene each tick from its entities and dropped after
/// `Renderer::render_frame` returns. Everything is borrowed; the renderer
/// never keeps references into the scene between frames.

use crate::camera::TransformComponent;
use crate::error::{Error, Result};
use crate::renderer::CameraKey;
use super::light::LightsUniformData;
use super::model::Model;
use super::skybox::Skybox;
use super::sprite::SpriteComponent;

/// A camera registered with `Renderer::setup_camera` and where it is
#[derive(Debug, Clone, Copy)]
pub struct FrameCamera<'a> {
    pub key: CameraKey,
    pub transform: &'a TransformComponent,
}

#[derive(Debug, Clone, Copy)]
pub struct ModelInstance<'a> {
    pub model: &'a Model,
    pub transform: &'a TransformComponent,
    pub casts_shadows: bool,
}

#[derive(Clone, Copy)]
pub struct SpriteInstance<'a> {
    pub sprite: &'a SpriteComponent,
    pub transform: &'a TransformComponent,
}

#[derive(Default)]
pub struct FrameScene<'a> {
    /// Rendered in order; the last one is presented
    pub cameras: Vec<FrameCamera<'a>>,
    pub models: Vec<ModelInstance<'a>>,
    pub sprites: Vec<SpriteInstance<'a>>,
    pub lights: LightsUniformData,
    pub skybox: Option<&'a Skybox>,
}

impl<'a> FrameScene<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, key: CameraKey, transform: &'a TransformComponent) -> Self {
        self.cameras.push(FrameCamera { key, transform });
        self
    }

    /// A model owns its mesh uniforms, so it may appear at most once per frame
    pub fn with_model(mut self, model: &'a Model, transform: &'a TransformComponent) -> Self {
        self.models.push(ModelInstance { model, transform, casts_shadows: true });
        self
    }

    pub fn with_sprite(mut self, sprite: &'a SpriteComponent, transform: &'a TransformComponent) -> Self {
        self.sprites.push(SpriteInstance { sprite, transform });
        self
    }

    pub fn with_lights(mut self, lights: LightsUniformData) -> Self {
        self.lights = lights;
        self
    }

    pub fn with_skybox(mut self, skybox: &'a Skybox) -> Self {
        self.skybox = Some(skybox);
        self
    }

    /// Models that write into the shadow cascades
    pub fn shadow_casters(&self) -> impl Iterator<Item = &ModelInstance<'a>> {
        self.models.iter().filter(|m| m.casts_shadows)
    }

    /// Reject models and sprites listed more than once; each owns a single
    /// set of per-draw uniforms and a second transform would overwrite the first
    pub fn check_unique_instances(&self) -> Result<()> {
        for (i, instance) in self.models.iter().enumerate() {
            if self.models[..i].iter().any(|other| std::ptr::eq(other.model, instance.model)) {
                return Err(Error::InvalidResource(format!(
                    "model '{}' added to the frame more than once",
                    instance.model.name
                )));
            }
        }
        for (i, instance) in self.sprites.iter().enumerate() {
            if self.sprites[..i].iter().any(|other| std::ptr::eq(other.sprite, instance.sprite)) {
                return Err(Error::InvalidResource(format!("sprite #{} added to the frame more than once", i)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_scene_tests.rs"]
mod tests;
