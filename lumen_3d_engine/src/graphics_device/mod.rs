/// Graphics device module - GPU resource traits and baking

// Module declarations
pub mod graphics_device;
pub mod config;
pub mod layout;
pub mod texture;
pub mod attachment;
pub mod buffer;
pub mod sampler;
pub mod shader;
pub mod render_pass;
pub mod frame_buffer;
pub mod descriptor;
pub mod pipeline;
pub mod command_list;
pub mod swapchain;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use config::*;
pub use layout::*;
pub use texture::*;
pub use attachment::*;
pub use buffer::*;
pub use sampler::*;
pub use shader::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use descriptor::*;
pub use pipeline::*;
pub use command_list::*;
pub use swapchain::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
