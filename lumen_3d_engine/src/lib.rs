/*!
# Lumen 3D Engine

Core types of the Lumen3D deferred renderer.

This crate owns everything above the GPU API: the declarative render graph,
camera math, the scene boundary types and the frame orchestrator. GPU work
goes through the `GraphicsDevice` family of traits (similar to C++ virtual
interfaces); the Vulkan backend lives in `lumen_3d_engine_renderer_vulkan`.

## Architecture

- **GraphicsDevice**: narrow GPU context every resource is created through
- **RenderGraph**: named resources and passes; derives signatures, transitions and allocations
- **CameraRenderBundle**: one camera's attachments, framebuffers and descriptor sets
- **Renderer**: single-frame-in-flight orchestrator (`begin_render` .. `end_present`)
- **FrameScene**: what the scene hands to the renderer each frame
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod task_queue;
pub mod graphics_device;
pub mod render_graph;
pub mod camera;
pub mod scene;
pub mod renderer;

// Main lumen3d namespace module
pub mod lumen3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine (process-wide logger)
    pub use crate::engine::Engine;

    // Frame orchestrator
    pub use crate::renderer::{CameraKey, FrameStatus, Renderer};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are exported at the crate root
    }

    // GPU abstraction sub-module
    pub mod render {
        pub use crate::graphics_device::*;
    }

    // Orchestrator, camera bundles, pipelines and uniforms
    pub mod renderer {
        pub use crate::renderer::*;
    }

    // Render graph sub-module
    pub mod graph {
        pub use crate::render_graph::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    pub use crate::task_queue::MainThreadQueue;
}

// Re-export math library at crate root
pub use glam;
