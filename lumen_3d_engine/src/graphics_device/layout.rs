/// Image layouts and the supported layout transition table
///
/// Every layout change the engine issues goes through `transition_rule`,
/// which yields the barrier stages and access masks for a pair or rejects
/// the pair with `Error::LayoutTransition`.

use bitflags::bitflags;
use crate::error::{Error, Result};

/// GPU-internal memory layout of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    ColorAttachment,
    DepthStencilAttachment,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

bitflags! {
    /// Pipeline stages a barrier waits on / blocks
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const VERTEX_SHADER = 1 << 1;
        const FRAGMENT_SHADER = 1 << 2;
        const EARLY_FRAGMENT_TESTS = 1 << 3;
        const LATE_FRAGMENT_TESTS = 1 << 4;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 5;
        const TRANSFER = 1 << 6;
        const BOTTOM_OF_PIPE = 1 << 7;
    }
}

bitflags! {
    /// Memory accesses made visible / available by a barrier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const SHADER_READ = 1 << 0;
        const COLOR_ATTACHMENT_READ = 1 << 1;
        const COLOR_ATTACHMENT_WRITE = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 4;
        const TRANSFER_READ = 1 << 5;
        const TRANSFER_WRITE = 1 << 6;
    }
}

/// Barrier parameters for one supported layout pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

impl TransitionRule {
    const fn new(
        src_stages: PipelineStages,
        dst_stages: PipelineStages,
        src_access: AccessFlags,
        dst_access: AccessFlags,
    ) -> Self {
        Self { src_stages, dst_stages, src_access, dst_access }
    }
}

/// Look up the barrier for `old -> new`
pub fn transition_rule(old: ImageLayout, new: ImageLayout) -> Result<TransitionRule> {
    use ImageLayout as L;
    type S = PipelineStages;
    type A = AccessFlags;

    let rule = match (old, new) {
        // Uploads and mip generation
        (L::Undefined, L::TransferDst) => {
            TransitionRule::new(S::TOP_OF_PIPE, S::TRANSFER, A::empty(), A::TRANSFER_WRITE)
        }
        (L::TransferDst, L::ShaderReadOnly) => {
            TransitionRule::new(S::TRANSFER, S::FRAGMENT_SHADER, A::TRANSFER_WRITE, A::SHADER_READ)
        }
        (L::TransferDst, L::TransferSrc) => {
            TransitionRule::new(S::TRANSFER, S::TRANSFER, A::TRANSFER_WRITE, A::TRANSFER_READ)
        }
        (L::TransferSrc, L::ShaderReadOnly) => {
            TransitionRule::new(S::TRANSFER, S::FRAGMENT_SHADER, A::TRANSFER_READ, A::SHADER_READ)
        }

        // Attachment creation
        (L::Undefined, L::DepthStencilAttachment) => TransitionRule::new(
            S::TOP_OF_PIPE,
            S::EARLY_FRAGMENT_TESTS,
            A::empty(),
            A::DEPTH_STENCIL_ATTACHMENT_READ | A::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),
        (L::Undefined, L::ColorAttachment) => TransitionRule::new(
            S::TOP_OF_PIPE,
            S::COLOR_ATTACHMENT_OUTPUT,
            A::empty(),
            A::COLOR_ATTACHMENT_WRITE,
        ),
        (L::Undefined, L::PresentSrc) => {
            TransitionRule::new(S::TOP_OF_PIPE, S::BOTTOM_OF_PIPE, A::empty(), A::empty())
        }

        // Per-frame ping-pong between producing and consuming passes
        (L::ColorAttachment, L::ShaderReadOnly) => TransitionRule::new(
            S::COLOR_ATTACHMENT_OUTPUT,
            S::FRAGMENT_SHADER,
            A::COLOR_ATTACHMENT_WRITE,
            A::SHADER_READ,
        ),
        (L::ShaderReadOnly, L::ColorAttachment) => TransitionRule::new(
            S::FRAGMENT_SHADER,
            S::COLOR_ATTACHMENT_OUTPUT,
            A::SHADER_READ,
            A::COLOR_ATTACHMENT_READ | A::COLOR_ATTACHMENT_WRITE,
        ),
        (L::DepthStencilAttachment, L::ShaderReadOnly) => TransitionRule::new(
            S::LATE_FRAGMENT_TESTS,
            S::FRAGMENT_SHADER,
            A::DEPTH_STENCIL_ATTACHMENT_WRITE,
            A::SHADER_READ,
        ),
        (L::ShaderReadOnly, L::DepthStencilAttachment) => TransitionRule::new(
            S::FRAGMENT_SHADER,
            S::EARLY_FRAGMENT_TESTS,
            A::SHADER_READ,
            A::DEPTH_STENCIL_ATTACHMENT_READ | A::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),

        // Swapchain images
        (L::ColorAttachment, L::PresentSrc) => TransitionRule::new(
            S::COLOR_ATTACHMENT_OUTPUT,
            S::BOTTOM_OF_PIPE,
            A::COLOR_ATTACHMENT_WRITE,
            A::empty(),
        ),
        (L::PresentSrc, L::ColorAttachment) => TransitionRule::new(
            S::TOP_OF_PIPE,
            S::COLOR_ATTACHMENT_OUTPUT,
            A::empty(),
            A::COLOR_ATTACHMENT_WRITE,
        ),

        _ => {
            return Err(Error::LayoutTransition(format!(
                "unsupported layout transition {:?} -> {:?}",
                old, new
            )))
        }
    };

    Ok(rule)
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
