/// Pass declarations of the render graph

use crate::graphics_device::PassType;

/// Pass names of the deferred graph
pub mod passes {
    pub const SHADOW: &str = "shadow";
    pub const GEOMETRY: &str = "geometry";
    pub const SSAO_GEN: &str = "ssao_gen";
    pub const SSAO_BLUR_H: &str = "ssao_blur_h";
    pub const SSAO_BLUR_V: &str = "ssao_blur_v";
    pub const LIGHTING: &str = "lighting";
    pub const SPRITE: &str = "sprite";
    pub const COMPOSITE: &str = "composite";
    pub const PRESENT: &str = "present";
}

/// How sampled inputs are grouped into descriptor sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputBinding {
    /// All reads in one set, binding N = read N
    OneSet,
    /// One single-binding set per read (drawn one after another)
    PerRead,
}

/// When a pass is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassCondition {
    Always,
    SsaoEnabled,
}

impl PassCondition {
    pub fn holds(&self, ssao_enabled: bool) -> bool {
        match self {
            PassCondition::Always => true,
            PassCondition::SsaoEnabled => ssao_enabled,
        }
    }
}

/// Color clear value used by a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearPolicy {
    /// The configured background color
    Background,
    /// Transparent black
    Transparent,
}

/// Declaration of one pass
#[derive(Debug, Clone, PartialEq)]
pub struct PassDecl {
    pub name: String,
    pub pass_type: PassType,
    /// Written resources in attachment-slot order
    pub attachments: Vec<String>,
    /// Sampled resources
    pub reads: Vec<String>,
    pub inputs: InputBinding,
    /// One framebuffer per layer of the (layered) attachments
    pub per_layer: bool,
    pub condition: PassCondition,
    pub clear: ClearPolicy,
    /// Pipelines drawn in this pass, in draw order
    pub pipelines: Vec<String>,
}

impl PassDecl {
    pub fn new(name: &str, pass_type: PassType) -> Self {
        Self {
            name: name.to_string(),
            pass_type,
            attachments: Vec::new(),
            reads: Vec::new(),
            inputs: InputBinding::OneSet,
            per_layer: false,
            condition: PassCondition::Always,
            clear: ClearPolicy::Transparent,
            pipelines: Vec::new(),
        }
    }

    pub fn writes(mut self, attachments: &[&str]) -> Self {
        self.attachments = attachments.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn reads(mut self, reads: &[&str]) -> Self {
        self.reads = reads.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn pipelines(mut self, pipelines: &[&str]) -> Self {
        self.pipelines = pipelines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn inputs(mut self, inputs: InputBinding) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn per_layer(mut self) -> Self {
        self.per_layer = true;
        self
    }

    pub fn only_when(mut self, condition: PassCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn clear(mut self, clear: ClearPolicy) -> Self {
        self.clear = clear;
        self
    }

    pub fn writes_resource(&self, name: &str) -> bool {
        self.attachments.iter().any(|a| a == name)
    }
}
