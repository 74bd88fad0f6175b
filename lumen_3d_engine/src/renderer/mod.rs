/// Renderer module - frame orchestration on top of the graphics device

// Module declarations
pub mod context;
pub mod uniforms;
pub mod ssao;
pub mod bundle;
pub mod pipelines;
mod passes;
pub mod renderer;

// Re-export everything from renderer.rs
pub use renderer::*;

// Re-export from other modules
pub use context::*;
pub use uniforms::*;
pub use ssao::*;
pub use bundle::*;
pub use pipelines::{pipeline_names, PipelineSpec, ShaderLibrary, pipeline_specs};
pub use passes::FULLSCREEN_VERTICES;
