//! Camera module - transforms, perspective cameras, frustum culling and
//! cascaded shadow splits.
//!
//! Components are owned by the caller (the scene) and handed to the
//! renderer each frame. The renderer only reads them.

mod transform;
mod camera_component;
mod frustum;
mod cascade;

pub use transform::TransformComponent;
pub use camera_component::CameraComponent;
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use cascade::{cascade_splits, compute_cascades, Cascade, CASCADE_SPLIT_LAMBDA};
