/// Render graph - the declarative description of a frame
///
/// Nodes are named logical resources with a size/format/sample policy;
/// edges are pass writes (attachments) and reads (sampled inputs). From the
/// declaration the graph derives every pass's attachment signature, the
/// layout transitions around each pass, and the per-camera allocation list.

use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::graphics_device::{
    transition_rule, AttachmentKind, AttachmentSignature, AttachmentSlot, ClearValue, ImageLayout, PassType,
    SampleCount, TextureFormat,
};
use super::pass::{passes, ClearPolicy, InputBinding, PassCondition, PassDecl};
use super::resource::{names, ResourceDecl, SamplePolicy, SizePolicy};

/// One layout change of one logical resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub resource: String,
    pub from: ImageLayout,
    pub to: ImageLayout,
}

/// A pass together with the transitions recorded around it
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledPass<'a> {
    pub pass: &'a PassDecl,
    /// Reads moved to ShaderReadOnly before the pass begins
    pub pre: Vec<Transition>,
    /// Reads restored to their attachment layout after the pass ends
    pub post: Vec<Transition>,
}

/// Declarative pass graph
#[derive(Debug, Clone)]
pub struct RenderGraph {
    resources: Vec<ResourceDecl>,
    passes: Vec<PassDecl>,
    swapchain_format: TextureFormat,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    pub fn new() -> Self {
        Self { resources: Vec::new(), passes: Vec::new(), swapchain_format: TextureFormat::B8G8R8A8_SRGB }
    }

    pub fn with_resource(mut self, decl: ResourceDecl) -> Self {
        self.resources.push(decl);
        self
    }

    pub fn with_pass(mut self, decl: PassDecl) -> Self {
        self.passes.push(decl);
        self
    }

    /// The deferred chain: shadow, geometry, SSAO generate and blur,
    /// lighting, sprite, composite, present
    pub fn deferred(cascade_count: u32, shadow_map_dim: u32) -> Result<Self> {
        use names::*;
        use TextureFormat as F;

        let gbuffer = [
            ResourceDecl::color(GBUFFER_VIEW_POS, F::R16G16B16A16_SFLOAT),
            ResourceDecl::color(GBUFFER_WORLD_POS, F::R16G16B16A16_SFLOAT),
            ResourceDecl::color(GBUFFER_DEPTH, F::R32_SFLOAT),
            ResourceDecl::color(GBUFFER_NORMAL, F::R16G16B16A16_SFLOAT),
            ResourceDecl::color(GBUFFER_ALBEDO, F::R8G8B8A8_UNORM),
            ResourceDecl::color(GBUFFER_MATERIAL, F::R8G8B8A8_UNORM),
        ];
        let gbuffer_resolves = [
            GBUFFER_VIEW_POS_RESOLVE,
            GBUFFER_WORLD_POS_RESOLVE,
            GBUFFER_DEPTH_RESOLVE,
            GBUFFER_NORMAL_RESOLVE,
            GBUFFER_ALBEDO_RESOLVE,
            GBUFFER_MATERIAL_RESOLVE,
        ];
        let lighting = ResourceDecl::color(LIGHTING_COLOR, F::R16G16B16A16_SFLOAT);
        let sprite = ResourceDecl::color(SPRITE_COLOR, F::R8G8B8A8_UNORM);
        let composite = ResourceDecl::color(COMPOSITE_COLOR, F::R8G8B8A8_UNORM);
        let half_r8 = |name: &str| {
            ResourceDecl::new(name, AttachmentKind::Offscreen, F::R8_UNORM, SizePolicy::HalfViewport, SamplePolicy::Single)
        };

        let mut graph = RenderGraph::new().with_resource(
            ResourceDecl::new(
                SHADOW_DEPTH,
                AttachmentKind::DepthStencil,
                F::D32_SFLOAT,
                SizePolicy::Fixed(shadow_map_dim),
                SamplePolicy::Single,
            )
            .with_layers(cascade_count),
        );
        for decl in &gbuffer {
            graph = graph.with_resource(decl.clone());
        }
        graph = graph.with_resource(ResourceDecl::depth(GBUFFER_DEPTH_STENCIL, F::D32_SFLOAT));
        for (decl, resolve) in gbuffer.iter().zip(gbuffer_resolves) {
            graph = graph.with_resource(ResourceDecl::resolve_of(resolve, decl));
        }
        graph = graph
            .with_resource(half_r8(SSAO_COLOR))
            .with_resource(half_r8(SSAO_BLUR_H))
            .with_resource(half_r8(SSAO_BLUR_V))
            .with_resource(lighting.clone())
            .with_resource(ResourceDecl::resolve_of(LIGHTING_RESOLVE, &lighting))
            .with_resource(sprite.clone())
            .with_resource(ResourceDecl::depth(SPRITE_DEPTH, F::D32_SFLOAT))
            .with_resource(ResourceDecl::resolve_of(SPRITE_RESOLVE, &sprite))
            .with_resource(composite.clone())
            .with_resource(ResourceDecl::resolve_of(COMPOSITE_RESOLVE, &composite))
            .with_resource(ResourceDecl::new(
                SWAPCHAIN,
                AttachmentKind::SwapChain,
                F::B8G8R8A8_SRGB,
                SizePolicy::Viewport,
                SamplePolicy::Single,
            ));

        let mut geometry_writes: Vec<&str> = gbuffer.iter().map(|d| d.name.as_str()).collect();
        geometry_writes.push(GBUFFER_DEPTH_STENCIL);
        geometry_writes.extend(gbuffer_resolves);

        let graph = graph
            .with_pass(
                PassDecl::new(passes::SHADOW, PassType::Shadow)
                    .writes(&[SHADOW_DEPTH])
                    .per_layer()
                    .pipelines(&["shadow"]),
            )
            .with_pass(
                PassDecl::new(passes::GEOMETRY, PassType::Geometry)
                    .writes(&geometry_writes)
                    .pipelines(&["geometry"]),
            )
            .with_pass(
                PassDecl::new(passes::SSAO_GEN, PassType::PostProcess)
                    .writes(&[SSAO_COLOR])
                    .reads(&[GBUFFER_VIEW_POS_RESOLVE, GBUFFER_NORMAL_RESOLVE])
                    .only_when(PassCondition::SsaoEnabled)
                    .pipelines(&["ssao_gen"]),
            )
            .with_pass(
                PassDecl::new(passes::SSAO_BLUR_H, PassType::PostProcess)
                    .writes(&[SSAO_BLUR_H])
                    .reads(&[SSAO_COLOR])
                    .only_when(PassCondition::SsaoEnabled)
                    .pipelines(&["ssao_blur"]),
            )
            .with_pass(
                PassDecl::new(passes::SSAO_BLUR_V, PassType::PostProcess)
                    .writes(&[SSAO_BLUR_V])
                    .reads(&[SSAO_BLUR_H])
                    .only_when(PassCondition::SsaoEnabled)
                    .pipelines(&["ssao_blur"]),
            )
            .with_pass(
                PassDecl::new(passes::LIGHTING, PassType::Lighting)
                    .writes(&[LIGHTING_COLOR, GBUFFER_DEPTH_STENCIL, LIGHTING_RESOLVE])
                    .reads(&[
                        GBUFFER_VIEW_POS_RESOLVE,
                        GBUFFER_WORLD_POS_RESOLVE,
                        GBUFFER_DEPTH_RESOLVE,
                        GBUFFER_NORMAL_RESOLVE,
                        GBUFFER_ALBEDO_RESOLVE,
                        GBUFFER_MATERIAL_RESOLVE,
                        SSAO_BLUR_V,
                        SHADOW_DEPTH,
                    ])
                    .clear(ClearPolicy::Background)
                    .pipelines(&["skybox", "lighting"]),
            )
            .with_pass(
                PassDecl::new(passes::SPRITE, PassType::PostProcess)
                    .writes(&[SPRITE_COLOR, SPRITE_DEPTH, SPRITE_RESOLVE])
                    .pipelines(&["sprite"]),
            )
            .with_pass(
                PassDecl::new(passes::COMPOSITE, PassType::PostProcess)
                    .writes(&[COMPOSITE_COLOR, COMPOSITE_RESOLVE])
                    .reads(&[LIGHTING_RESOLVE, SPRITE_RESOLVE])
                    .inputs(InputBinding::PerRead)
                    .pipelines(&["composite"]),
            )
            .with_pass(
                PassDecl::new(passes::PRESENT, PassType::Present)
                    .writes(&[SWAPCHAIN])
                    .reads(&[COMPOSITE_RESOLVE])
                    .clear(ClearPolicy::Background)
                    .pipelines(&["present"]),
            );

        graph.validate()?;
        Ok(graph)
    }

    pub fn resources(&self) -> &[ResourceDecl] {
        &self.resources
    }

    pub fn passes(&self) -> &[PassDecl] {
        &self.passes
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDecl> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn pass(&self, name: &str) -> Option<&PassDecl> {
        self.passes.iter().find(|p| p.name == name)
    }

    fn require_resource(&self, name: &str) -> Result<&ResourceDecl> {
        self.resource(name)
            .ok_or_else(|| Error::InvalidResource(format!("render graph has no resource '{}'", name)))
    }

    pub fn require_pass(&self, name: &str) -> Result<&PassDecl> {
        self.pass(name)
            .ok_or_else(|| Error::InvalidResource(format!("render graph has no pass '{}'", name)))
    }

    pub fn swapchain_format(&self) -> TextureFormat {
        self.swapchain_format
    }

    pub fn set_swapchain_format(&mut self, format: TextureFormat) {
        self.swapchain_format = format;
    }

    /// Name of the image actually backing `name` at `msaa`
    pub fn physical_name<'a>(&'a self, name: &'a str, msaa: SampleCount) -> &'a str {
        match self.resource(name) {
            Some(decl) if !decl.is_allocated(msaa) => decl.resolves.as_deref().unwrap_or(name),
            _ => name,
        }
    }

    /// Structural checks: unique names, declared references, produce-before-read
    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for decl in &self.resources {
            if !seen.insert(decl.name.as_str()) {
                return Err(Error::InvalidResource(format!("duplicate resource '{}'", decl.name)));
            }
            if decl.layers == 0 {
                return Err(Error::InvalidResource(format!("resource '{}' has zero layers", decl.name)));
            }
        }
        for decl in self.resources.iter().filter(|d| d.is_resolve()) {
            let primary = decl
                .resolves
                .as_deref()
                .ok_or_else(|| Error::InvalidResource(format!("resolve '{}' names no primary", decl.name)))?;
            let primary = self.require_resource(primary)?;
            if primary.is_resolve() || primary.format != decl.format || primary.size != decl.size {
                return Err(Error::InvalidResource(format!(
                    "resolve '{}' does not match its primary '{}'",
                    decl.name, primary.name
                )));
            }
        }

        let mut pass_names = FxHashSet::default();
        let mut produced: FxHashSet<&str> = FxHashSet::default();
        for pass in &self.passes {
            if !pass_names.insert(pass.name.as_str()) {
                return Err(Error::InvalidResource(format!("duplicate pass '{}'", pass.name)));
            }
            self.validate_pass_writes(pass)?;
            for read in &pass.reads {
                let decl = self.require_resource(read)?;
                if decl.samples == SamplePolicy::Msaa {
                    return Err(Error::InvalidResource(format!(
                        "pass '{}' samples multisampled '{}'; read its resolve instead",
                        pass.name, read
                    )));
                }
                if decl.kind == AttachmentKind::SwapChain || pass.writes_resource(read) {
                    return Err(Error::InvalidResource(format!("pass '{}' cannot sample '{}'", pass.name, read)));
                }
                if !produced.contains(read.as_str()) {
                    return Err(Error::InvalidResource(format!(
                        "pass '{}' reads '{}' before any pass writes it",
                        pass.name, read
                    )));
                }
            }
            produced.extend(pass.attachments.iter().map(|a| a.as_str()));
        }
        Ok(())
    }

    fn validate_pass_writes(&self, pass: &PassDecl) -> Result<()> {
        if pass.attachments.is_empty() {
            return Err(Error::InvalidResource(format!("pass '{}' writes nothing", pass.name)));
        }
        let mut depth_slots = 0;
        for name in &pass.attachments {
            let decl = self.require_resource(name)?;
            let is_swapchain = decl.kind == AttachmentKind::SwapChain;
            if is_swapchain != (pass.pass_type == PassType::Present) {
                return Err(Error::InvalidResource(format!(
                    "pass '{}' ({:?}) cannot write '{}' ({:?})",
                    pass.name, pass.pass_type, name, decl.kind
                )));
            }
            if decl.kind == AttachmentKind::DepthStencil {
                depth_slots += 1;
            }
            if decl.layers > 1 && !pass.per_layer {
                return Err(Error::InvalidResource(format!(
                    "layered '{}' written by '{}' without per-layer framebuffers",
                    name, pass.name
                )));
            }
            if let Some(primary) = &decl.resolves {
                if !pass.writes_resource(primary) {
                    return Err(Error::InvalidResource(format!(
                        "pass '{}' writes resolve '{}' without its primary '{}'",
                        pass.name, name, primary
                    )));
                }
            }
        }
        if depth_slots > 1 {
            return Err(Error::InvalidResource(format!("pass '{}' writes more than one depth target", pass.name)));
        }
        Ok(())
    }

    /// Attachment signature of `pass` at `msaa` (resolve slots only when multisampled)
    pub fn signature(&self, pass: &PassDecl, msaa: SampleCount) -> Result<AttachmentSignature> {
        let mut slots = Vec::with_capacity(pass.attachments.len());
        for name in &pass.attachments {
            let decl = self.require_resource(name)?;
            if !decl.is_allocated(msaa) {
                continue;
            }
            let format = if decl.kind == AttachmentKind::SwapChain { self.swapchain_format } else { decl.format };
            slots.push(AttachmentSlot::new(decl.kind, format, decl.samples.samples(msaa)));
        }
        Ok(AttachmentSignature::new(slots))
    }

    /// Attachments of `pass` present in its signature at `msaa`, in slot order
    pub fn bound_attachments<'a>(&'a self, pass: &'a PassDecl, msaa: SampleCount) -> Vec<&'a str> {
        pass.attachments
            .iter()
            .filter(|name| self.resource(name).map_or(true, |d| d.is_allocated(msaa)))
            .map(|name| name.as_str())
            .collect()
    }

    /// Clear value per signature slot
    pub fn clear_values(&self, pass: &PassDecl, msaa: SampleCount, background: [f32; 4]) -> Result<Vec<ClearValue>> {
        let color = match pass.clear {
            ClearPolicy::Background => background,
            ClearPolicy::Transparent => [0.0, 0.0, 0.0, 0.0],
        };
        Ok(self
            .signature(pass, msaa)?
            .slots()
            .iter()
            .map(|slot| match slot.kind {
                AttachmentKind::DepthStencil => ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
                _ => ClearValue::Color(color),
            })
            .collect())
    }

    /// Passes recorded this frame, each with its read transitions
    pub fn schedule(&self, ssao_enabled: bool) -> Result<Vec<ScheduledPass<'_>>> {
        let mut scheduled = Vec::new();
        for pass in self.passes.iter().filter(|p| p.condition.holds(ssao_enabled)) {
            let mut pre = Vec::with_capacity(pass.reads.len());
            for read in &pass.reads {
                let decl = self.require_resource(read)?;
                pre.push(Transition {
                    resource: read.clone(),
                    from: decl.kind.attachment_layout(),
                    to: ImageLayout::ShaderReadOnly,
                });
            }
            let post = pre
                .iter()
                .rev()
                .map(|t| Transition { resource: t.resource.clone(), from: t.to, to: t.from })
                .collect();
            scheduled.push(ScheduledPass { pass, pre, post });
        }
        Ok(scheduled)
    }

    /// Layout of every allocated image at the start of a frame
    pub fn initial_layouts(&self, msaa: SampleCount) -> FxHashMap<String, ImageLayout> {
        self.resources
            .iter()
            .filter(|d| d.kind != AttachmentKind::SwapChain && d.is_allocated(msaa))
            .map(|d| (d.name.clone(), d.kind.attachment_layout()))
            .collect()
    }

    /// Replay one frame's schedule against `layouts`
    ///
    /// Fails on the first transition whose starting layout does not match,
    /// on unsupported transition pairs, and on a pass writing an image that
    /// is not in its attachment layout.
    pub fn simulate_frame(
        &self,
        layouts: &mut FxHashMap<String, ImageLayout>,
        msaa: SampleCount,
        ssao_enabled: bool,
    ) -> Result<()> {
        for scheduled in self.schedule(ssao_enabled)? {
            for transition in &scheduled.pre {
                self.apply(layouts, transition, msaa)?;
            }
            for name in self.bound_attachments(scheduled.pass, msaa) {
                let decl = self.require_resource(name)?;
                if decl.kind == AttachmentKind::SwapChain {
                    continue;
                }
                let physical = self.physical_name(name, msaa);
                let current = layouts.get(physical).copied().unwrap_or(ImageLayout::Undefined);
                if current != decl.kind.attachment_layout() {
                    return Err(Error::LayoutTransition(format!(
                        "pass '{}' writes '{}' while it is in {:?}",
                        scheduled.pass.name, physical, current
                    )));
                }
            }
            for transition in &scheduled.post {
                self.apply(layouts, transition, msaa)?;
            }
        }
        Ok(())
    }

    fn apply(&self, layouts: &mut FxHashMap<String, ImageLayout>, transition: &Transition, msaa: SampleCount) -> Result<()> {
        let physical = self.physical_name(&transition.resource, msaa).to_string();
        let current = layouts.get(&physical).copied().unwrap_or(ImageLayout::Undefined);
        if current != transition.from {
            return Err(Error::LayoutTransition(format!(
                "'{}' is in {:?}, expected {:?}",
                physical, current, transition.from
            )));
        }
        transition_rule(transition.from, transition.to)?;
        layouts.insert(physical, transition.to);
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
