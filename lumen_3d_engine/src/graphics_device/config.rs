/// Renderer startup configuration and validation-layer debug settings

use super::texture::SampleCount;

/// Which validation messages are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Where validation messages go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    Console,
    File(String),
    Both(String),
}

/// Validation message categories to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Validation message counters collected by the backend callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Renderer configuration
///
/// `Config::default()` is a working setup; the `with_*` methods adjust it.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub app_version: (u32, u32, u32),

    /// Request VK_LAYER_KHRONOS_validation (needs the `vulkan-validation` feature)
    pub enable_validation: bool,
    pub debug_severity: DebugSeverity,
    pub debug_output: DebugOutput,
    pub debug_message_filter: DebugMessageFilter,
    pub debug_break_on_error: bool,
    pub debug_panic_on_error: bool,
    pub enable_validation_stats: bool,

    pub vsync: bool,
    /// Requested MSAA; clamped to the device maximum at renderer creation
    pub msaa_samples: SampleCount,
    pub clear_color: [f32; 4],

    /// Fixed, camera-independent shadow map resolution
    pub shadow_map_dim: u32,
    pub cascade_count: u32,

    pub ssao_enabled: bool,
    pub ssao_kernel_size: u32,
    pub ssao_radius: f32,
    pub ssao_bias: f32,

    /// Directory holding precompiled `<name>.vert.spv` / `<name>.frag.spv`
    pub shader_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Lumen3D Application".to_string(),
            app_version: (0, 1, 0),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            debug_message_filter: DebugMessageFilter::default(),
            debug_break_on_error: false,
            debug_panic_on_error: false,
            enable_validation_stats: false,
            vsync: true,
            msaa_samples: SampleCount::S4,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            shadow_map_dim: 4096,
            cascade_count: 4,
            ssao_enabled: true,
            ssao_kernel_size: 64,
            ssao_radius: 0.5,
            ssao_bias: 0.025,
            shader_dir: "assets/shaders".to_string(),
        }
    }
}

impl Config {
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_msaa(mut self, samples: SampleCount) -> Self {
        self.msaa_samples = samples;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_shadow_map_dim(mut self, dim: u32) -> Self {
        self.shadow_map_dim = dim;
        self
    }

    pub fn with_ssao(mut self, enabled: bool) -> Self {
        self.ssao_enabled = enabled;
        self
    }

    pub fn with_shader_dir(mut self, dir: impl Into<String>) -> Self {
        self.shader_dir = dir.into();
        self
    }
}
