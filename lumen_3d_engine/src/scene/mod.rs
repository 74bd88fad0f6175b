//! Scene boundary
//!
//! Data the scene and the asset loader hand to the renderer: lights,
//! meshes with their materials, models, sprites and the skybox. The renderer
//! never walks the scene itself; each frame it receives a `FrameScene`.

mod bounds;
mod light;
mod mesh;
mod material;
mod model;
mod sprite;
mod skybox;
mod frame_scene;

pub use bounds::AABB;
pub use light::{LightBase, LightDirect, LightPoint, LightsUniformData, MAX_LIGHTS_PER_KIND};
pub use mesh::{Mesh, MeshGpu, Vertex};
pub use material::{Material, MaterialSlot, MATERIAL_SLOT_COUNT};
pub use model::Model;
pub use sprite::{SpriteComponent, SpriteUniformData, SpriteVertex, SPRITE_QUAD};
pub use skybox::{Skybox, SKYBOX_CUBE};
pub use frame_scene::{FrameCamera, FrameScene, ModelInstance, SpriteInstance};
