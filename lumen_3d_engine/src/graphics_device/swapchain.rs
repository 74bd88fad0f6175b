/// Swapchain trait - for window presentation
///
/// Out-of-date and suboptimal surfaces are reported as values, never as
/// errors: the renderer turns them into a recreate flag consumed at the
/// start of the next frame.

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use super::texture::{Texture, TextureFormat};

/// Outcome of acquiring the next image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    Acquired(u32),
    /// Usable this frame, but the swapchain should be recreated before the next
    Suboptimal(u32),
    /// The surface changed; the swapchain must be recreated
    OutOfDate,
}

/// Outcome of presenting an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Presented,
    /// Presented, but the swapchain no longer matches the surface exactly
    Suboptimal,
    OutOfDate,
}

impl PresentResult {
    pub fn needs_recreate(&self) -> bool {
        !matches!(self, PresentResult::Presented)
    }
}

/// Swapchain for presenting rendered images to a window
pub trait Swapchain: Send + Sync {
    /// Acquire the next image, signaling the image-available semaphore
    fn acquire_next_image(&mut self) -> Result<AcquireResult>;

    /// Present `image_index`, waiting on the render-finished semaphore
    fn present(&mut self, image_index: u32) -> Result<PresentResult>;

    /// Recreate the swapchain and its images
    ///
    /// # Arguments
    ///
    /// * `width` - New width in pixels
    /// * `height` - New height in pixels
    /// * `vsync` - FIFO when true, otherwise the lowest-latency mode available
    fn recreate(&mut self, width: u32, height: u32, vsync: bool) -> Result<()>;

    /// Current image extent
    fn extent(&self) -> (u32, u32);

    /// Current surface extent; (0, 0) while the window is minimized
    fn surface_extent(&self) -> (u32, u32);

    fn format(&self) -> TextureFormat;

    fn image_count(&self) -> u32;

    fn image(&self, index: u32) -> Option<Arc<dyn Texture>>;

    fn as_any(&self) -> &dyn Any;
}
