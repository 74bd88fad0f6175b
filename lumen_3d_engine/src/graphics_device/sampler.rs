/// Sampler kinds shared by every pass

use std::any::Any;

/// Fixed set of samplers created once per device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    /// Linear filtering, repeat addressing, anisotropic when supported
    Linear,
    /// Nearest filtering, repeat addressing
    Nearest,
    /// Linear filtering, clamp-to-edge (G-buffer and post-process inputs)
    LinearClamp,
    /// Nearest filtering, clamp-to-edge (position and depth G-buffer reads)
    NearestClamp,
    /// Depth comparison (LessOrEqual) with a white clamp-to-border, for cascaded shadow maps
    Shadow,
}

impl SamplerKind {
    pub const ALL: [SamplerKind; 5] = [
        SamplerKind::Linear,
        SamplerKind::Nearest,
        SamplerKind::LinearClamp,
        SamplerKind::NearestClamp,
        SamplerKind::Shadow,
    ];
}

/// Sampler resource trait
pub trait Sampler: Send + Sync {
    fn kind(&self) -> SamplerKind;
    fn as_any(&self) -> &dyn Any;
}
