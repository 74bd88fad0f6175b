/// Renderer - the frame orchestrator
///
/// Owns the swapchain, the render graph and everything baked from it
/// (render passes, pipelines, present framebuffers), plus one
/// `CameraRenderBundle` per registered camera. A frame is a strict state
/// machine with a single frame in flight:
///
/// ```text
/// begin_render -> render_camera* -> begin_present -> present_pass -> end_present
/// ```
///
/// Recreation requested by window events or toggles is deferred to the
/// next `begin_render`, where it runs synchronously after the fence wait.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use winit::event::WindowEvent;
use crate::camera::{compute_cascades, CameraComponent};
use crate::error::{Error, Result};
use crate::graphics_device::{
    write_uniform, AcquireResult, AttachmentTexture, Buffer, BufferUsage, CommandList, Config, DescriptorSetLayout,
    Framebuffer, FramebufferAttachment, FramebufferDesc, GraphicsDevice, Pipeline, RenderPass, SampleCount,
    ShaderCompiler, Swapchain, TextureData, TextureDesc, TextureFormat, ViewSelector,
};
use crate::render_graph::{passes, RenderGraph, Transition};
use crate::scene::{FrameCamera, FrameScene, LightsUniformData, SPRITE_QUAD};
use crate::task_queue::MainThreadQueue;
use super::bundle::{BundleInputs, CameraRenderBundle, SsaoSettings};
use super::context::RenderContext;
use super::passes::{begin_pass, bind_sets, lookup, PassRecorder, FULLSCREEN_VERTICES};
use super::pipelines::{
    bake_pipelines, bake_render_passes, create_input_layouts, pipeline_names, rebake_pipelines, rebake_render_passes,
    PipelineInputs, ShaderLibrary,
};
use super::ssao::{ssao_kernel, ssao_noise_pixels, SSAO_NOISE_DIM};
use super::uniforms::{MAX_CASCADES, MAX_SSAO_KERNEL};

slotmap::new_key_type! {
    /// Handle of a camera registered with `Renderer::setup_camera`
    pub struct CameraKey;
}

/// Outcome of a frame step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Keep going with the next step
    Ready,
    /// Nothing was submitted this frame (minimized window, out-of-date swapchain)
    Skipped,
    Presented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePhase {
    Idle,
    Recording,
    Presenting { image_index: u32, recorded: bool },
}

struct CameraSlot {
    component: CameraComponent,
    bundle: CameraRenderBundle,
}

/// Runtime switches, mostly driven by the editor UI
#[derive(Debug, Clone, Copy)]
struct Toggles {
    wireframe: bool,
    vsync: bool,
    ssao_enabled: bool,
    ssao_only: bool,
    clear_color: [f32; 4],
}

/// Recreation consumed at the top of the next frame
#[derive(Debug, Clone, Copy, Default)]
struct PendingWork {
    swapchain: bool,
    pipelines: bool,
    shaders: bool,
    msaa: Option<SampleCount>,
}

impl PendingWork {
    fn any(&self) -> bool {
        self.swapchain || self.pipelines || self.shaders || self.msaa.is_some()
    }
}

pub struct Renderer {
    ctx: RenderContext,
    swapchain: Box<dyn Swapchain>,
    config: Config,
    graph: RenderGraph,
    msaa: SampleCount,
    render_passes: FxHashMap<String, RenderPass>,
    input_layouts: FxHashMap<String, Arc<dyn DescriptorSetLayout>>,
    shaders: ShaderLibrary,
    pipelines: FxHashMap<String, Pipeline>,
    present_framebuffers: Vec<Arc<dyn Framebuffer>>,
    lights: Arc<dyn Buffer>,
    ssao: SsaoSettings,
    sprite_quad: Arc<dyn Buffer>,
    cmd: Box<dyn CommandList>,
    cameras: SlotMap<CameraKey, CameraSlot>,
    task_queue: Arc<MainThreadQueue>,
    toggles: Toggles,
    pending: PendingWork,
    phase: FramePhase,
    /// Camera whose output the present pass samples
    last_camera: Option<CameraKey>,
}

impl Renderer {
    /// Create the renderer and bake every graph pass against `swapchain`
    ///
    /// # Arguments
    ///
    /// * `device` - Backend device
    /// * `swapchain` - Swapchain of the window being rendered to
    /// * `compiler` - Loads the SPIR-V for every pipeline shader
    /// * `config` - Startup configuration; MSAA is clamped to the device maximum
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        swapchain: Box<dyn Swapchain>,
        compiler: Box<dyn ShaderCompiler>,
        config: Config,
    ) -> Result<Self> {
        validate_config(&config)?;

        let max = device.max_usable_sample_count();
        let msaa = config.msaa_samples.clamp_to(max);
        if msaa != config.msaa_samples {
            crate::engine_warn!(
                "lumen3d::renderer",
                "MSAA x{} not supported by '{}', using x{}",
                config.msaa_samples.as_u32(),
                device.device_name(),
                msaa.as_u32()
            );
        }

        let ctx = RenderContext::new(device)?;
        let mut graph = RenderGraph::deferred(config.cascade_count, config.shadow_map_dim)?;
        graph.set_swapchain_format(swapchain.format());

        let render_passes = bake_render_passes(ctx.device(), &graph, msaa)?;
        let input_layouts = create_input_layouts(ctx.device(), &graph)?;
        let mut shaders = ShaderLibrary::new(compiler, config.shader_dir.clone());
        let inputs = PipelineInputs {
            render_passes: &render_passes,
            set_layouts: ctx.layouts(),
            input_layouts: &input_layouts,
        };
        let pipelines = bake_pipelines(ctx.device(), &mut shaders, &inputs, false)?;
        let present_framebuffers =
            create_present_framebuffers(ctx.device(), swapchain.as_ref(), lookup(&render_passes, passes::PRESENT, "render pass")?)?;

        let lights = ctx.create_uniform_buffer("lights", &LightsUniformData::default())?;
        let noise = ctx.device().create_texture(
            &TextureDesc::sampled("ssao_noise", SSAO_NOISE_DIM, SSAO_NOISE_DIM, TextureFormat::R8G8B8A8_UNORM)
                .without_mips(),
            &TextureData::single(ssao_noise_pixels()),
        )?;
        let ssao = SsaoSettings {
            kernel: ssao_kernel(config.ssao_kernel_size),
            noise,
            radius: config.ssao_radius,
            bias: config.ssao_bias,
        };
        let sprite_quad =
            ctx.create_static_buffer("sprite_quad", BufferUsage::Vertex, bytemuck::cast_slice(&SPRITE_QUAD))?;
        let cmd = ctx.device().create_command_list()?;

        let (width, height) = swapchain.extent();
        crate::engine_info!(
            "lumen3d::renderer",
            "Renderer ready on '{}': {}x{}, MSAA x{}, {} cascades of {}, {} pipelines",
            ctx.device().device_name(),
            width,
            height,
            msaa.as_u32(),
            config.cascade_count,
            config.shadow_map_dim,
            pipelines.len()
        );

        let toggles = Toggles {
            wireframe: false,
            vsync: config.vsync,
            ssao_enabled: config.ssao_enabled,
            ssao_only: false,
            clear_color: config.clear_color,
        };

        Ok(Self {
            ctx,
            swapchain,
            config,
            graph,
            msaa,
            render_passes,
            input_layouts,
            shaders,
            pipelines,
            present_framebuffers,
            lights,
            ssao,
            sprite_quad,
            cmd,
            cameras: SlotMap::with_key(),
            task_queue: Arc::new(MainThreadQueue::new()),
            toggles,
            pending: PendingWork::default(),
            phase: FramePhase::Idle,
            last_camera: None,
        })
    }

    // ===== FRAME PROTOCOL =====

    /// Wait for the previous frame, apply pending recreation and start recording
    ///
    /// Returns `Skipped` while the window is minimized; nothing is recorded
    /// and the swapchain is recreated once the surface is non-zero again.
    pub fn begin_render(&mut self) -> Result<FrameStatus> {
        if self.phase != FramePhase::Idle {
            return Err(Error::InvalidState(format!("begin_render during {:?}", self.phase)));
        }
        self.ctx.device().wait_for_frame_fence()?;

        let ran = self.task_queue.run_pending();
        if ran > 0 {
            crate::engine_trace!("lumen3d::renderer", "Ran {} main-thread tasks", ran);
        }

        let (width, height) = self.swapchain.surface_extent();
        if width == 0 || height == 0 {
            // Restored windows come back with a new surface
            self.pending.swapchain = true;
            return Ok(FrameStatus::Skipped);
        }

        self.apply_pending()?;
        self.cmd.begin()?;
        self.phase = FramePhase::Recording;
        self.last_camera = None;
        Ok(FrameStatus::Ready)
    }

    /// Upload this frame's lights, mesh matrices and sprite uniforms
    pub fn prepare_scene(&self, scene: &FrameScene<'_>) -> Result<()> {
        if self.phase != FramePhase::Recording {
            return Err(Error::InvalidState(format!("prepare_scene during {:?}", self.phase)));
        }
        scene.check_unique_instances()?;
        write_uniform(self.lights.as_ref(), &scene.lights)?;
        for instance in &scene.models {
            for mesh in instance.model.meshes.iter().filter(|mesh| mesh.is_allocated()) {
                mesh.update_uniforms(instance.transform)?;
            }
        }
        for instance in scene.sprites.iter().filter(|instance| instance.sprite.is_allocated()) {
            instance.sprite.update(instance.transform)?;
        }
        Ok(())
    }

    /// Record every offscreen pass of one camera; disabled cameras record nothing
    pub fn render_camera(&mut self, camera: &FrameCamera<'_>, scene: &FrameScene<'_>) -> Result<()> {
        if self.phase != FramePhase::Recording {
            return Err(Error::InvalidState(format!("render_camera during {:?}", self.phase)));
        }
        let slot = self
            .cameras
            .get_mut(camera.key)
            .ok_or_else(|| Error::InvalidResource(format!("unknown camera {:?}", camera.key)))?;
        if !slot.component.is_enabled() {
            return Ok(());
        }

        slot.component.update(camera.transform);
        slot.bundle.update_camera(&slot.component)?;
        let cascades = compute_cascades(
            &slot.component,
            scene.lights.shadow_direction(),
            self.config.cascade_count,
            self.config.shadow_map_dim,
        );
        slot.bundle.update_shadows(&cascades)?;

        let recorder = PassRecorder {
            graph: &self.graph,
            render_passes: &self.render_passes,
            pipelines: &self.pipelines,
            sprite_quad: self.sprite_quad.as_ref(),
            msaa: self.msaa,
            background: self.toggles.clear_color,
            ssao_enabled: self.toggles.ssao_enabled,
            ssao_only: self.toggles.ssao_only,
        };
        recorder.record_camera(self.cmd.as_mut(), &slot.bundle, &slot.component, scene)?;
        self.last_camera = Some(camera.key);
        Ok(())
    }

    /// Acquire the next swapchain image and make the last camera's output sampleable
    ///
    /// An out-of-date swapchain ends recording without submitting and
    /// returns `Skipped`; the swapchain is recreated by the next `begin_render`.
    pub fn begin_present(&mut self) -> Result<FrameStatus> {
        if self.phase != FramePhase::Recording {
            return Err(Error::InvalidState(format!("begin_present during {:?}", self.phase)));
        }
        match self.swapchain.acquire_next_image()? {
            AcquireResult::OutOfDate => {
                crate::engine_debug!("lumen3d::renderer", "Swapchain out of date on acquire, skipping frame");
                self.pending.swapchain = true;
                self.cmd.end()?;
                self.phase = FramePhase::Idle;
                Ok(FrameStatus::Skipped)
            }
            AcquireResult::Suboptimal(image_index) => {
                crate::engine_debug!("lumen3d::renderer", "Acquired image {} from a suboptimal swapchain", image_index);
                self.pending.swapchain = true;
                self.transition_output(false)?;
                self.phase = FramePhase::Presenting { image_index, recorded: false };
                Ok(FrameStatus::Ready)
            }
            AcquireResult::Acquired(image_index) => {
                self.transition_output(false)?;
                self.phase = FramePhase::Presenting { image_index, recorded: false };
                Ok(FrameStatus::Ready)
            }
        }
    }

    /// Draw the last camera's output onto the acquired swapchain image
    ///
    /// With no camera rendered this frame the image is only cleared.
    pub fn present_pass(&mut self) -> Result<()> {
        let FramePhase::Presenting { image_index, recorded: false } = self.phase else {
            return Err(Error::InvalidState(format!("present_pass during {:?}", self.phase)));
        };
        let pass = self.graph.require_pass(passes::PRESENT)?;
        let render_pass = lookup(&self.render_passes, passes::PRESENT, "render pass")?;
        let framebuffer = self.present_framebuffers.get(image_index as usize).ok_or_else(|| {
            Error::InvalidResource(format!("no present framebuffer for swapchain image {}", image_index))
        })?;
        let clears = self.graph.clear_values(pass, self.msaa, self.toggles.clear_color)?;
        begin_pass(self.cmd.as_mut(), render_pass, framebuffer.as_ref(), &clears)?;

        let output = self
            .last_camera
            .and_then(|key| self.cameras.get(key))
            .and_then(|slot| slot.bundle.output_set());
        if let Some(set) = output {
            let pipeline = lookup(&self.pipelines, pipeline_names::PRESENT, "pipeline")?;
            self.cmd.bind_pipeline(pipeline.gpu())?;
            bind_sets(self.cmd.as_mut(), pipeline, 0, &[set])?;
            self.cmd.draw(FULLSCREEN_VERTICES, 0)?;
        }
        self.cmd.end_render_pass()?;
        self.phase = FramePhase::Presenting { image_index, recorded: true };
        Ok(())
    }

    /// Restore the output layout, submit, present and wait for the frame
    pub fn end_present(&mut self) -> Result<FrameStatus> {
        let FramePhase::Presenting { image_index, recorded: true } = self.phase else {
            return Err(Error::InvalidState(format!("end_present during {:?}", self.phase)));
        };
        self.transition_output(true)?;
        self.cmd.end()?;
        self.ctx.device().submit_frame(self.cmd.as_ref(), self.swapchain.as_ref())?;

        let result = self.swapchain.present(image_index)?;
        if result.needs_recreate() {
            crate::engine_debug!("lumen3d::renderer", "Present reported {:?}, recreating next frame", result);
            self.pending.swapchain = true;
        }

        self.ctx.device().wait_for_frame_fence()?;
        self.phase = FramePhase::Idle;
        Ok(FrameStatus::Presented)
    }

    /// Run the whole frame protocol for `scene`
    pub fn render_frame(&mut self, scene: &FrameScene<'_>) -> Result<FrameStatus> {
        scene.check_unique_instances()?;
        if self.begin_render()? == FrameStatus::Skipped {
            return Ok(FrameStatus::Skipped);
        }
        self.prepare_scene(scene)?;
        for camera in &scene.cameras {
            self.render_camera(camera, scene)?;
        }
        if self.begin_present()? == FrameStatus::Skipped {
            return Ok(FrameStatus::Skipped);
        }
        self.present_pass()?;
        self.end_present()
    }

    /// Move the presented camera's output in or out of ShaderReadOnly,
    /// following the present pass's scheduled reads
    fn transition_output(&mut self, restore: bool) -> Result<()> {
        let Some(slot) = self.last_camera.and_then(|key| self.cameras.get(key)) else {
            return Ok(());
        };
        let schedule = self.graph.schedule(self.toggles.ssao_enabled)?;
        let present = schedule
            .iter()
            .find(|scheduled| scheduled.pass.name == passes::PRESENT)
            .ok_or_else(|| Error::InvalidResource("render graph has no present pass".to_string()))?;
        let transitions: &[Transition] = if restore { &present.post } else { &present.pre };
        for t in transitions {
            slot.bundle.require_attachment(&t.resource)?.transition(self.cmd.as_mut(), t.from, t.to)?;
        }
        Ok(())
    }

    // ===== RECREATION =====

    fn apply_pending(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        if !pending.any() {
            return Ok(());
        }
        self.ctx.device().wait_idle()?;

        if pending.shaders {
            self.shaders.reload(self.ctx.device())?;
        }

        let mut msaa_changed = false;
        if let Some(requested) = pending.msaa {
            let clamped = requested.clamp_to(self.ctx.device().max_usable_sample_count());
            if clamped != requested {
                crate::engine_warn!(
                    "lumen3d::renderer",
                    "MSAA x{} not supported, using x{}",
                    requested.as_u32(),
                    clamped.as_u32()
                );
            }
            msaa_changed = clamped != self.msaa;
            self.msaa = clamped;
        }

        let mut format_changed = false;
        if pending.swapchain {
            let (width, height) = self.swapchain.surface_extent();
            self.swapchain.recreate(width, height, self.toggles.vsync)?;
            if self.swapchain.format() != self.graph.swapchain_format() {
                self.graph.set_swapchain_format(self.swapchain.format());
                format_changed = true;
            }
            crate::engine_info!("lumen3d::renderer", "Swapchain recreated at {}x{}", width, height);
        }

        let passes_changed = msaa_changed || format_changed;
        if passes_changed {
            rebake_render_passes(self.ctx.device(), &self.graph, self.msaa, &mut self.render_passes)?;
        }
        if passes_changed || pending.pipelines || pending.shaders {
            let inputs = PipelineInputs {
                render_passes: &self.render_passes,
                set_layouts: self.ctx.layouts(),
                input_layouts: &self.input_layouts,
            };
            rebake_pipelines(self.ctx.device(), &mut self.shaders, &inputs, &mut self.pipelines, self.toggles.wireframe)?;
        }
        if pending.swapchain || passes_changed {
            let present = lookup(&self.render_passes, passes::PRESENT, "render pass")?;
            self.present_framebuffers = create_present_framebuffers(self.ctx.device(), self.swapchain.as_ref(), present)?;
        }
        if pending.swapchain || msaa_changed {
            self.rebuild_bundles()?;
        }
        Ok(())
    }

    fn rebuild_bundles(&mut self) -> Result<()> {
        let extent = self.swapchain.extent();
        let inputs = BundleInputs {
            ctx: &self.ctx,
            graph: &self.graph,
            render_passes: &self.render_passes,
            input_layouts: &self.input_layouts,
            lights: &self.lights,
            ssao: &self.ssao,
        };
        for slot in self.cameras.values_mut() {
            slot.component.set_viewport_size(extent.0, extent.1);
            slot.bundle.rebuild(&inputs, extent, self.msaa)?;
        }
        crate::engine_debug!(
            "lumen3d::renderer",
            "Rebuilt {} camera bundles at {}x{} x{}",
            self.cameras.len(),
            extent.0,
            extent.1,
            self.msaa.as_u32()
        );
        Ok(())
    }

    fn build_bundle(&self, component: &mut CameraComponent) -> Result<CameraRenderBundle> {
        let extent = self.swapchain.extent();
        component.set_viewport_size(extent.0, extent.1);
        let inputs = BundleInputs {
            ctx: &self.ctx,
            graph: &self.graph,
            render_passes: &self.render_passes,
            input_layouts: &self.input_layouts,
            lights: &self.lights,
            ssao: &self.ssao,
        };
        CameraRenderBundle::build(&inputs, extent, self.msaa)
    }

    fn require_idle(&self, what: &str) -> Result<()> {
        if self.phase != FramePhase::Idle {
            return Err(Error::InvalidState(format!("{} during {:?}", what, self.phase)));
        }
        Ok(())
    }

    // ===== CAMERAS =====

    /// Register a camera and build its render bundle at the swapchain extent
    pub fn setup_camera(&mut self, mut component: CameraComponent) -> Result<CameraKey> {
        self.require_idle("setup_camera")?;
        let bundle = self.build_bundle(&mut component)?;
        Ok(self.cameras.insert(CameraSlot { component, bundle }))
    }

    /// Replace a camera's component; its previous bundle is dropped
    pub fn replace_camera(&mut self, key: CameraKey, mut component: CameraComponent) -> Result<()> {
        self.require_idle("replace_camera")?;
        if !self.cameras.contains_key(key) {
            return Err(Error::InvalidResource(format!("unknown camera {:?}", key)));
        }
        self.ctx.device().wait_idle()?;
        let bundle = self.build_bundle(&mut component)?;
        if let Some(slot) = self.cameras.get_mut(key) {
            *slot = CameraSlot { component, bundle };
        }
        Ok(())
    }

    pub fn remove_camera(&mut self, key: CameraKey) -> Result<CameraComponent> {
        self.require_idle("remove_camera")?;
        let slot = self
            .cameras
            .remove(key)
            .ok_or_else(|| Error::InvalidResource(format!("unknown camera {:?}", key)))?;
        if self.last_camera == Some(key) {
            self.last_camera = None;
        }
        Ok(slot.component)
    }

    pub fn camera(&self, key: CameraKey) -> Option<&CameraComponent> {
        self.cameras.get(key).map(|slot| &slot.component)
    }

    pub fn camera_mut(&mut self, key: CameraKey) -> Option<&mut CameraComponent> {
        self.cameras.get_mut(key).map(|slot| &mut slot.component)
    }

    pub fn camera_bundle(&self, key: CameraKey) -> Option<&CameraRenderBundle> {
        self.cameras.get(key).map(|slot| &slot.bundle)
    }

    /// The camera's composite result, sampled by the present pass or an editor viewport
    pub fn camera_output(&self, key: CameraKey) -> Option<&Arc<AttachmentTexture>> {
        self.cameras.get(key).map(|slot| slot.bundle.output())
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    // ===== TOGGLES =====

    pub fn set_wireframe(&mut self, wireframe: bool) {
        if self.toggles.wireframe != wireframe {
            self.toggles.wireframe = wireframe;
            self.pending.pipelines = true;
        }
    }

    pub fn wireframe(&self) -> bool {
        self.toggles.wireframe
    }

    pub fn set_vsync(&mut self, vsync: bool) {
        if self.toggles.vsync != vsync {
            self.toggles.vsync = vsync;
            self.pending.swapchain = true;
        }
    }

    pub fn vsync(&self) -> bool {
        self.toggles.vsync
    }

    /// Takes effect on the next recorded camera
    pub fn set_ssao_enabled(&mut self, enabled: bool) {
        self.toggles.ssao_enabled = enabled;
    }

    pub fn ssao_enabled(&self) -> bool {
        self.toggles.ssao_enabled
    }

    /// Lighting outputs the ambient occlusion term alone
    pub fn set_ssao_only(&mut self, only: bool) {
        self.toggles.ssao_only = only;
    }

    pub fn ssao_only(&self) -> bool {
        self.toggles.ssao_only
    }

    /// Request a sample count; clamped and applied at the next `begin_render`
    pub fn set_msaa_samples(&mut self, samples: SampleCount) {
        self.pending.msaa = Some(samples);
    }

    pub fn msaa_samples(&self) -> SampleCount {
        self.msaa
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.toggles.clear_color = color;
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.toggles.clear_color
    }

    pub fn request_pipeline_recreate(&mut self) {
        self.pending.pipelines = true;
    }

    /// Reload every shader module from disk and rebake the pipelines
    pub fn request_shader_recreate(&mut self) {
        self.pending.shaders = true;
    }

    pub fn request_swapchain_recreate(&mut self) {
        self.pending.swapchain = true;
    }

    /// Returns true when the event affects rendering
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::Resized(size) => {
                crate::engine_trace!("lumen3d::renderer", "Window resized to {}x{}", size.width, size.height);
                self.pending.swapchain = true;
                true
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                self.pending.swapchain = true;
                true
            }
            _ => false,
        }
    }

    // ===== ACCESSORS =====

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Queue shared with helper threads; drained at each `begin_render`
    pub fn task_queue(&self) -> &Arc<MainThreadQueue> {
        &self.task_queue
    }

    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn swapchain_extent(&self) -> (u32, u32) {
        self.swapchain.extent()
    }

    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.get(name)
    }

    pub fn render_pass(&self, name: &str) -> Option<&RenderPass> {
        self.render_passes.get(name)
    }

    pub fn present_framebuffer_count(&self) -> usize {
        self.present_framebuffers.len()
    }

    /// True between `begin_render` and the end of the frame
    pub fn is_recording(&self) -> bool {
        self.phase != FramePhase::Idle
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.ctx.device().wait_idle() {
            crate::engine_warn!("lumen3d::renderer", "wait_idle failed during shutdown: {}", e);
        }
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if config.cascade_count == 0 || config.cascade_count as usize > MAX_CASCADES {
        return Err(Error::InitializationFailed(format!(
            "cascade_count must be in 1..={}, got {}",
            MAX_CASCADES, config.cascade_count
        )));
    }
    if config.ssao_kernel_size == 0 || config.ssao_kernel_size as usize > MAX_SSAO_KERNEL {
        return Err(Error::InitializationFailed(format!(
            "ssao_kernel_size must be in 1..={}, got {}",
            MAX_SSAO_KERNEL, config.ssao_kernel_size
        )));
    }
    if config.shadow_map_dim == 0 {
        return Err(Error::InitializationFailed("shadow_map_dim must be non-zero".to_string()));
    }
    Ok(())
}

/// One framebuffer per swapchain image, each binding that image as the single slot
fn create_present_framebuffers(
    device: &dyn GraphicsDevice,
    swapchain: &dyn Swapchain,
    render_pass: &RenderPass,
) -> Result<Vec<Arc<dyn Framebuffer>>> {
    let (width, height) = swapchain.extent();
    (0..swapchain.image_count())
        .map(|index| {
            let image = swapchain
                .image(index)
                .ok_or_else(|| Error::InvalidResource(format!("swapchain has no image {}", index)))?;
            device.create_framebuffer(&FramebufferDesc {
                name: format!("present_{}", index),
                render_pass: render_pass.gpu(),
                signature: render_pass.signature(),
                attachments: vec![FramebufferAttachment { texture: image, view: ViewSelector::All }],
                width,
                height,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
