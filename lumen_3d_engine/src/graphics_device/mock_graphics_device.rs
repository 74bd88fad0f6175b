/// Mock graphics device for unit tests (no GPU required)
///
/// Every mock object shares one `MockState`: command lists append their
/// recorded commands to `commands`, the device tracks the frame fence, and
/// the swapchain takes its faults from a `MockSurface` the test keeps a
/// handle to.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use crate::error::{Error, Result};
use super::*;

// ============================================================================
// Shared state
// ============================================================================

#[derive(Debug)]
pub struct MockState {
    /// Recorded commands and frame events, in order
    pub commands: Vec<String>,
    pub fence_signaled: bool,
    pub fence_waits: u32,
    pub submits: u32,
    pub attachments_created: Vec<String>,
    pub textures_created: Vec<String>,
    pub render_passes_created: Vec<String>,
    pub pipelines_created: Vec<String>,
    pub descriptor_sets_created: u32,
    pub shaders_created: Vec<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            // Created signaled, like the real frame fence
            fence_signaled: true,
            fence_waits: 0,
            submits: 0,
            attachments_created: Vec::new(),
            textures_created: Vec::new(),
            render_passes_created: Vec::new(),
            pipelines_created: Vec::new(),
            descriptor_sets_created: 0,
            shaders_created: Vec::new(),
        }
    }
}

pub type SharedState = Arc<Mutex<MockState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn record(state: &SharedState, command: String) {
    lock(state).commands.push(command);
}

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub desc: BufferDesc,
    pub data: Mutex<Vec<u8>>,
}

impl Buffer for MockBuffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_update(&self.desc, offset, data.len())?;
        let mut bytes = self.data.lock().map_err(|_| Error::InvalidState("poisoned".to_string()))?;
        let start = offset as usize;
        bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockTexture {
    pub desc: TextureDesc,
}

impl MockTexture {
    pub fn new(name: &str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self { desc: TextureDesc::sampled(name, width, height, format).without_mips() }
    }
}

impl Texture for MockTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockSampler {
    pub kind: SamplerKind,
}

impl Sampler for MockSampler {
    fn kind(&self) -> SamplerKind {
        self.kind
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockShader {
    pub name: String,
    pub stage: ShaderStage,
    pub entry_point: String,
}

impl MockShader {
    pub fn new(name: &str, stage: ShaderStage) -> Self {
        Self { name: name.to_string(), stage, entry_point: "main".to_string() }
    }
}

impl Shader for MockShader {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockRenderPass {
    pub desc: RenderPassDesc,
}

impl GpuRenderPass for MockRenderPass {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockFramebuffer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub attachment_names: Vec<String>,
}

impl Framebuffer for MockFramebuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockDescriptorSetLayout {
    pub desc: DescriptorSetLayoutDesc,
}

impl DescriptorSetLayout for MockDescriptorSetLayout {
    fn desc(&self) -> &DescriptorSetLayoutDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockDescriptorSet {
    pub layout_name: String,
    pub bound: Vec<String>,
}

impl GpuDescriptorSet for MockDescriptorSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockPipeline {
    pub name: String,
    pub blend_attachments: usize,
    pub samples: SampleCount,
    pub wireframe: bool,
}

impl GpuPipeline for MockPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

pub struct MockCommandList {
    state: SharedState,
    recording: bool,
    in_render_pass: bool,
}

impl MockCommandList {
    fn require_recording(&self, what: &str) -> Result<()> {
        if !self.recording {
            return Err(Error::InvalidState(format!("{} outside of recording", what)));
        }
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        if !lock(&self.state).fence_signaled {
            return Err(Error::InvalidState("command list reset while the frame fence is unsignaled".to_string()));
        }
        self.recording = true;
        record(&self.state, "begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("end inside a render pass".to_string()));
        }
        self.recording = false;
        record(&self.state, "end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn Framebuffer,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording("begin_render_pass")?;
        let pass = render_pass
            .as_any()
            .downcast_ref::<MockRenderPass>()
            .ok_or_else(|| Error::InvalidResource("not a mock render pass".to_string()))?;
        if clear_values.len() != pass.desc.attachments.len() {
            return Err(Error::InvalidResource(format!(
                "{} clear values for render pass '{}' with {} attachments",
                clear_values.len(),
                pass.desc.name,
                pass.desc.attachments.len()
            )));
        }
        self.in_render_pass = true;
        record(
            &self.state,
            format!(
                "begin_render_pass:{} {}x{} clears={:?}",
                pass.desc.name,
                framebuffer.width(),
                framebuffer.height(),
                clear_values
            ),
        );
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::InvalidState("end_render_pass without begin".to_string()));
        }
        self.in_render_pass = false;
        record(&self.state, "end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        record(&self.state, format!("set_viewport:{}x{}", viewport.width, viewport.height));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        record(&self.state, format!("set_scissor:{}x{}", scissor.width, scissor.height));
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn GpuPipeline) -> Result<()> {
        record(&self.state, format!("bind_pipeline:{}", pipeline.name()));
        Ok(())
    }

    fn bind_descriptor_sets(
        &mut self,
        _pipeline: &dyn GpuPipeline,
        first_set: u32,
        sets: &[&dyn GpuDescriptorSet],
    ) -> Result<()> {
        record(&self.state, format!("bind_descriptor_sets:{}+{}", first_set, sets.len()));
        Ok(())
    }

    fn push_constants(
        &mut self,
        _pipeline: &dyn GpuPipeline,
        _stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        record(&self.state, format!("push_constants:{}+{} {:?}", offset, data.len(), data));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, _offset: u64) -> Result<()> {
        record(&self.state, format!("bind_vertex_buffer:{}", buffer.desc().name));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, _offset: u64, _index_type: IndexType) -> Result<()> {
        record(&self.state, format!("bind_index_buffer:{}", buffer.desc().name));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::InvalidState("draw outside a render pass".to_string()));
        }
        record(&self.state, format!("draw:{}", vertex_count));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::InvalidState("draw_indexed outside a render pass".to_string()));
        }
        record(&self.state, format!("draw_indexed:{}", index_count));
        Ok(())
    }

    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier<'_>]) -> Result<()> {
        self.require_recording("pipeline_barrier")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("pipeline_barrier inside a render pass".to_string()));
        }
        for barrier in barriers {
            record(
                &self.state,
                format!(
                    "barrier:{} {:?}->{:?}",
                    barrier.texture.desc().name,
                    barrier.old_layout,
                    barrier.new_layout
                ),
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock ShaderCompiler
// ============================================================================

/// Compiles every request to a minimal valid SPIR-V module, except paths
/// containing one of `failing`. Clones share their lists with the original.
#[derive(Debug, Default, Clone)]
pub struct MockShaderCompiler {
    pub failing: Arc<Mutex<Vec<String>>>,
    pub compiled: Arc<Mutex<Vec<String>>>,
}

impl MockShaderCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, name: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.push(name.to_string());
        }
    }

    pub fn compiled_count(&self) -> usize {
        self.compiled.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl ShaderCompiler for MockShaderCompiler {
    fn compile(&self, properties: &ShaderProperties) -> Result<Vec<u32>> {
        let fails = self
            .failing
            .lock()
            .map(|failing| failing.iter().any(|name| properties.path.contains(name.as_str())))
            .unwrap_or(false);
        if fails {
            return Err(Error::InvalidResource(format!("mock compile error in '{}'", properties.path)));
        }
        if let Ok(mut compiled) = self.compiled.lock() {
            compiled.push(properties.path.clone());
        }
        Ok(vec![SPIRV_MAGIC, 0x0001_0000, 0, 1, 0])
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

/// Surface state and injected faults, shared with the test
#[derive(Debug)]
pub struct MockSurface {
    /// Reported by `surface_extent`; (0, 0) simulates a minimized window
    pub extent: (u32, u32),
    /// Number of upcoming acquires that report out-of-date
    pub out_of_date_acquires: u32,
    /// Number of upcoming acquires that succeed but report suboptimal
    pub suboptimal_acquires: u32,
    /// Results returned by upcoming presents (Presented when empty)
    pub present_results: VecDeque<PresentResult>,
    pub recreations: Vec<(u32, u32, bool)>,
}

pub struct MockSwapchain {
    state: SharedState,
    surface: Arc<Mutex<MockSurface>>,
    extent: (u32, u32),
    format: TextureFormat,
    images: Vec<Arc<dyn Texture>>,
    next_image: u32,
}

impl MockSwapchain {
    pub fn new(state: SharedState, width: u32, height: u32, image_count: u32) -> Self {
        let surface = Arc::new(Mutex::new(MockSurface {
            extent: (width, height),
            out_of_date_acquires: 0,
            suboptimal_acquires: 0,
            present_results: VecDeque::new(),
            recreations: Vec::new(),
        }));
        let format = TextureFormat::B8G8R8A8_SRGB;
        Self {
            state,
            surface,
            extent: (width, height),
            format,
            images: Self::make_images(width, height, image_count, format),
            next_image: 0,
        }
    }

    /// Handle the test keeps to drive the surface after boxing the swapchain
    pub fn surface(&self) -> Arc<Mutex<MockSurface>> {
        self.surface.clone()
    }

    fn make_images(width: u32, height: u32, count: u32, format: TextureFormat) -> Vec<Arc<dyn Texture>> {
        (0..count)
            .map(|i| Arc::new(MockTexture::new(&format!("swapchain_image_{}", i), width, height, format)) as Arc<dyn Texture>)
            .collect()
    }

    fn surface_lock(&self) -> MutexGuard<'_, MockSurface> {
        match self.surface.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self) -> Result<AcquireResult> {
        let suboptimal = {
            let mut surface = self.surface_lock();
            if surface.out_of_date_acquires > 0 || surface.extent != self.extent {
                surface.out_of_date_acquires = surface.out_of_date_acquires.saturating_sub(1);
                drop(surface);
                record(&self.state, "acquire:out_of_date".to_string());
                return Ok(AcquireResult::OutOfDate);
            }
            let suboptimal = surface.suboptimal_acquires > 0;
            surface.suboptimal_acquires = surface.suboptimal_acquires.saturating_sub(1);
            suboptimal
        };
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.images.len().max(1) as u32;
        if suboptimal {
            record(&self.state, format!("acquire:{} suboptimal", index));
            return Ok(AcquireResult::Suboptimal(index));
        }
        record(&self.state, format!("acquire:{}", index));
        Ok(AcquireResult::Acquired(index))
    }

    fn present(&mut self, image_index: u32) -> Result<PresentResult> {
        let result = self.surface_lock().present_results.pop_front().unwrap_or(PresentResult::Presented);
        record(&self.state, format!("present:{} {:?}", image_index, result));
        Ok(result)
    }

    fn recreate(&mut self, width: u32, height: u32, vsync: bool) -> Result<()> {
        self.extent = (width, height);
        self.images = Self::make_images(width, height, self.images.len() as u32, self.format);
        self.next_image = 0;
        self.surface_lock().recreations.push((width, height, vsync));
        record(&self.state, format!("recreate_swapchain:{}x{}", width, height));
        Ok(())
    }

    fn extent(&self) -> (u32, u32) {
        self.extent
    }

    fn surface_extent(&self) -> (u32, u32) {
        self.surface_lock().extent
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    fn image(&self, index: u32) -> Option<Arc<dyn Texture>> {
        self.images.get(index as usize).cloned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Mock device that tracks created resources and the frame fence without GPU
pub struct MockGraphicsDevice {
    state: SharedState,
    pub max_samples: SampleCount,
    pub linear_blit: bool,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(MockState::default())), max_samples: SampleCount::S8, linear_blit: true }
    }

    pub fn with_max_samples(mut self, samples: SampleCount) -> Self {
        self.max_samples = samples;
        self
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// A swapchain sharing this device's command log
    pub fn create_swapchain(&self, width: u32, height: u32, image_count: u32) -> MockSwapchain {
        MockSwapchain::new(self.state.clone(), width, height, image_count)
    }

    /// Recorded commands, drained
    pub fn take_commands(&self) -> Vec<String> {
        std::mem::take(&mut lock(&self.state).commands)
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>> {
        desc.validate_initial_data(data)?;
        let mut bytes = vec![0u8; desc.size as usize];
        if let Some(data) = data {
            bytes[..data.len()].copy_from_slice(data);
        }
        Ok(Arc::new(MockBuffer { desc: desc.clone(), data: Mutex::new(bytes) }))
    }

    fn create_texture(&self, desc: &TextureDesc, data: &TextureData) -> Result<Arc<dyn Texture>> {
        if desc.mip_levels > 1 && !self.linear_blit {
            return Err(Error::Unsupported(format!("linear blit for {:?}", desc.format)));
        }
        if data.layers.len() as u32 != desc.array_layers {
            return Err(Error::InvalidResource(format!(
                "texture '{}': {} layers of data for {} array layers",
                desc.name,
                data.layers.len(),
                desc.array_layers
            )));
        }
        lock(&self.state).textures_created.push(desc.name.clone());
        Ok(Arc::new(MockTexture { desc: desc.clone() }))
    }

    fn create_attachment_texture(&self, desc: &AttachmentTextureDesc) -> Result<Arc<AttachmentTexture>> {
        desc.validate()?;
        let usage = if desc.kind == AttachmentKind::DepthStencil {
            TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::SAMPLED
        } else {
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED
        };
        let texture = MockTexture {
            desc: TextureDesc {
                name: desc.name.clone(),
                width: desc.width,
                height: desc.height,
                format: desc.format,
                mip_levels: 1,
                array_layers: desc.layers,
                cube: false,
                samples: desc.samples,
                usage,
            },
        };
        lock(&self.state).attachments_created.push(format!(
            "{} {}x{} x{} layers={}",
            desc.name,
            desc.width,
            desc.height,
            desc.samples.as_u32(),
            desc.layers
        ));
        Ok(Arc::new(AttachmentTexture::new(
            desc.name.clone(),
            desc.kind,
            Arc::new(texture),
            desc.kind.attachment_layout(),
        )))
    }

    fn create_sampler(&self, kind: SamplerKind) -> Result<Arc<dyn Sampler>> {
        Ok(Arc::new(MockSampler { kind }))
    }

    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<Arc<dyn Shader>> {
        spirv_words_from_bytes(&desc.code.iter().flat_map(|w| w.to_le_bytes()).collect::<Vec<u8>>())?;
        lock(&self.state).shaders_created.push(desc.name.to_string());
        Ok(Arc::new(MockShader {
            name: desc.name.to_string(),
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
        }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn GpuRenderPass>> {
        lock(&self.state).render_passes_created.push(desc.name.clone());
        Ok(Arc::new(MockRenderPass { desc: desc.clone() }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc<'_>) -> Result<Arc<dyn Framebuffer>> {
        desc.validate()?;
        Ok(Arc::new(MockFramebuffer {
            name: desc.name.clone(),
            width: desc.width,
            height: desc.height,
            attachment_names: desc.attachments.iter().map(|a| a.texture.desc().name.clone()).collect(),
        }))
    }

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<Arc<dyn DescriptorSetLayout>> {
        Ok(Arc::new(MockDescriptorSetLayout { desc: desc.clone() }))
    }

    fn create_descriptor_set(
        &self,
        layout: &dyn DescriptorSetLayout,
        writes: &[DescriptorWrite],
    ) -> Result<Box<dyn GpuDescriptorSet>> {
        validate_writes(layout.desc(), writes)?;
        lock(&self.state).descriptor_sets_created += 1;
        let bound = writes
            .iter()
            .map(|w| match w {
                DescriptorWrite::Uniform { buffer, .. } => buffer.desc().name.clone(),
                DescriptorWrite::Image { texture, .. } => texture.desc().name.clone(),
            })
            .collect();
        Ok(Box::new(MockDescriptorSet { layout_name: layout.desc().name.clone(), bound }))
    }

    fn create_pipeline(&self, info: &PipelineCreateInfo<'_>) -> Result<Box<dyn GpuPipeline>> {
        lock(&self.state).pipelines_created.push(info.desc.name.clone());
        Ok(Box::new(MockPipeline {
            name: info.desc.name.clone(),
            blend_attachments: info.blend_attachments.len(),
            samples: info.samples,
            wireframe: info.desc.properties.wireframe,
        }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList { state: self.state.clone(), recording: false, in_render_pass: false }))
    }

    fn wait_for_frame_fence(&self) -> Result<()> {
        let mut state = lock(&self.state);
        // The mock GPU finishes submitted work as soon as someone waits for it
        state.fence_signaled = true;
        state.fence_waits += 1;
        state.commands.push("wait_fence".to_string());
        Ok(())
    }

    fn submit_frame(&self, _cmd: &dyn CommandList, _swapchain: &dyn Swapchain) -> Result<()> {
        let mut state = lock(&self.state);
        state.fence_signaled = false;
        state.submits += 1;
        state.commands.push("submit".to_string());
        Ok(())
    }

    fn max_usable_sample_count(&self) -> SampleCount {
        self.max_samples
    }

    fn supports_linear_blit(&self, _format: TextureFormat) -> bool {
        self.linear_blit
    }

    fn wait_idle(&self) -> Result<()> {
        lock(&self.state).fence_signaled = true;
        Ok(())
    }

    fn device_name(&self) -> &str {
        "Mock GPU"
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
