/// Per-camera pass recording
///
/// `PassRecorder` borrows the renderer's shared state (graph, render
/// passes, pipelines) while the renderer lends out the command list and
/// one camera's bundle. Every graph pass except present is recorded here,
/// in schedule order, wrapped in the read transitions the schedule lists.

use rustc_hash::FxHashMap;
use crate::camera::CameraComponent;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, CommandList, DescriptorSet, Framebuffer, GpuDescriptorSet, IndexType, PassType, Pipeline, Rect2D,
    RenderPass, SampleCount, ShaderStageFlags, Viewport,
};
use crate::render_graph::{passes, PassDecl, RenderGraph, Transition};
use crate::scene::{FrameScene, Mesh, SPRITE_QUAD};
use super::bundle::CameraRenderBundle;
use super::pipelines::pipeline_names;
use super::uniforms::{BlurDirection, CascadeIndex, LightingFlags};

/// Vertices of the fullscreen triangle generated in the vertex shader
pub const FULLSCREEN_VERTICES: u32 = 3;

pub(crate) fn lookup<'a, T>(map: &'a FxHashMap<String, T>, name: &str, what: &str) -> Result<&'a T> {
    map.get(name).ok_or_else(|| Error::InvalidResource(format!("no {} named '{}'", what, name)))
}

pub(crate) fn begin_pass(
    cmd: &mut dyn CommandList,
    render_pass: &RenderPass,
    framebuffer: &dyn Framebuffer,
    clears: &[crate::graphics_device::ClearValue],
) -> Result<()> {
    cmd.begin_render_pass(render_pass.gpu(), framebuffer, clears)?;
    cmd.set_viewport(Viewport::full(framebuffer.width(), framebuffer.height()))?;
    cmd.set_scissor(Rect2D::full(framebuffer.width(), framebuffer.height()))
}

pub(crate) fn bind_sets(cmd: &mut dyn CommandList, pipeline: &Pipeline, first: u32, sets: &[&DescriptorSet]) -> Result<()> {
    let gpu: Vec<&dyn GpuDescriptorSet> = sets.iter().map(|set| set.gpu()).collect();
    cmd.bind_descriptor_sets(pipeline.gpu(), first, &gpu)
}

pub(crate) struct PassRecorder<'a> {
    pub graph: &'a RenderGraph,
    pub render_passes: &'a FxHashMap<String, RenderPass>,
    pub pipelines: &'a FxHashMap<String, Pipeline>,
    pub sprite_quad: &'a dyn Buffer,
    pub msaa: SampleCount,
    pub background: [f32; 4],
    pub ssao_enabled: bool,
    pub ssao_only: bool,
}

impl PassRecorder<'_> {
    /// Record every offscreen pass of one camera
    pub fn record_camera(
        &self,
        cmd: &mut dyn CommandList,
        bundle: &CameraRenderBundle,
        camera: &CameraComponent,
        scene: &FrameScene<'_>,
    ) -> Result<()> {
        for scheduled in self.graph.schedule(self.ssao_enabled)? {
            let pass = scheduled.pass;
            if pass.pass_type == PassType::Present {
                continue;
            }
            Self::apply(cmd, bundle, &scheduled.pre)?;
            self.record_pass(cmd, pass, bundle, camera, scene)?;
            Self::apply(cmd, bundle, &scheduled.post)?;
        }
        Ok(())
    }

    fn apply(cmd: &mut dyn CommandList, bundle: &CameraRenderBundle, transitions: &[Transition]) -> Result<()> {
        for t in transitions {
            bundle.require_attachment(&t.resource)?.transition(cmd, t.from, t.to)?;
        }
        Ok(())
    }

    fn record_pass(
        &self,
        cmd: &mut dyn CommandList,
        pass: &PassDecl,
        bundle: &CameraRenderBundle,
        camera: &CameraComponent,
        scene: &FrameScene<'_>,
    ) -> Result<()> {
        match pass.name.as_str() {
            passes::SHADOW => self.record_shadow(cmd, pass, bundle, scene),
            passes::GEOMETRY => self.record_geometry(cmd, pass, bundle, camera, scene),
            passes::SSAO_GEN => {
                let sets = [bundle.camera_set(), bundle.ssao_set(), self.input_set(bundle, pass)?];
                self.record_fullscreen(cmd, pass, bundle, pipeline_names::SSAO_GEN, &sets, None)
            }
            passes::SSAO_BLUR_H => self.record_blur(cmd, pass, bundle, BlurDirection::HORIZONTAL),
            passes::SSAO_BLUR_V => self.record_blur(cmd, pass, bundle, BlurDirection::VERTICAL),
            passes::LIGHTING => self.record_lighting(cmd, pass, bundle, scene),
            passes::SPRITE => self.record_sprites(cmd, pass, bundle, scene),
            passes::COMPOSITE => self.record_composite(cmd, pass, bundle),
            other => Err(Error::InvalidResource(format!("no recorder for pass '{}'", other))),
        }
    }

    // ===== HELPERS =====

    fn pipeline(&self, name: &str) -> Result<&Pipeline> {
        lookup(self.pipelines, name, "pipeline")
    }

    fn framebuffer<'b>(&self, bundle: &'b CameraRenderBundle, pass: &PassDecl) -> Result<&'b dyn Framebuffer> {
        bundle
            .framebuffers(&pass.name)
            .first()
            .map(|framebuffer| framebuffer.as_ref())
            .ok_or_else(|| Error::InvalidResource(format!("camera bundle has no framebuffer for '{}'", pass.name)))
    }

    fn input_set<'b>(&self, bundle: &'b CameraRenderBundle, pass: &PassDecl) -> Result<&'b DescriptorSet> {
        bundle
            .input_sets(&pass.name)
            .first()
            .ok_or_else(|| Error::InvalidResource(format!("camera bundle has no input set for '{}'", pass.name)))
    }

    fn begin(&self, cmd: &mut dyn CommandList, pass: &PassDecl, framebuffer: &dyn Framebuffer) -> Result<()> {
        let render_pass = lookup(self.render_passes, &pass.name, "render pass")?;
        let clears = self.graph.clear_values(pass, self.msaa, self.background)?;
        begin_pass(cmd, render_pass, framebuffer, &clears)
    }

    /// Bind the mesh's set 1 and buffers and draw it; unallocated meshes are skipped
    fn draw_mesh(cmd: &mut dyn CommandList, pipeline: &Pipeline, mesh: &Mesh) -> Result<()> {
        let Some(gpu) = mesh.gpu() else {
            return Ok(());
        };
        bind_sets(cmd, pipeline, 1, &[&gpu.descriptor_set])?;
        cmd.bind_vertex_buffer(gpu.vertex_buffer.as_ref(), 0)?;
        cmd.bind_index_buffer(gpu.index_buffer.as_ref(), 0, IndexType::U32)?;
        cmd.draw_indexed(mesh.index_count(), 0, 0)
    }

    fn record_fullscreen(
        &self,
        cmd: &mut dyn CommandList,
        pass: &PassDecl,
        bundle: &CameraRenderBundle,
        pipeline: &str,
        sets: &[&DescriptorSet],
        push: Option<(ShaderStageFlags, &[u8])>,
    ) -> Result<()> {
        let pipeline = self.pipeline(pipeline)?;
        self.begin(cmd, pass, self.framebuffer(bundle, pass)?)?;
        cmd.bind_pipeline(pipeline.gpu())?;
        bind_sets(cmd, pipeline, 0, sets)?;
        if let Some((stages, data)) = push {
            cmd.push_constants(pipeline.gpu(), stages, 0, data)?;
        }
        cmd.draw(FULLSCREEN_VERTICES, 0)?;
        cmd.end_render_pass()
    }

    // ===== PASSES =====

    /// One render pass per cascade layer, shadow casters only, no culling
    fn record_shadow(
        &self,
        cmd: &mut dyn CommandList,
        pass: &PassDecl,
        bundle: &CameraRenderBundle,
        scene: &FrameScene<'_>,
    ) -> Result<()> {
        let pipeline = self.pipeline(pipeline_names::SHADOW)?;
        for (layer, framebuffer) in bundle.framebuffers(&pass.name).iter().enumerate() {
            self.begin(cmd, pass, framebuffer.as_ref())?;
            cmd.bind_pipeline(pipeline.gpu())?;
            bind_sets(cmd, pipeline, 0, &[bundle.shadow_set()])?;
            let cascade = CascadeIndex { index: layer as u32 };
            cmd.push_constants(pipeline.gpu(), ShaderStageFlags::VERTEX, 0, bytemuck::bytes_of(&cascade))?;
            for instance in scene.shadow_casters() {
                for mesh in instance.model.meshes.iter().filter(|mesh| mesh.casts_shadows) {
                    Self::draw_mesh(cmd, pipeline, mesh)?;
                }
            }
            cmd.end_render_pass()?;
        }
        Ok(())
    }

    fn record_geometry(
        &self,
        cmd: &mut dyn CommandList,
        pass: &PassDecl,
        bundle: &CameraRenderBundle,
        camera: &CameraComponent,
        scene: &FrameScene<'_>,
    ) -> Result<()> {
        let pipeline = self.pipeline(pipeline_names::GEOMETRY)?;
        self.begin(cmd, pass, self.framebuffer(bundle, pass)?)?;
        cmd.bind_pipeline(pipeline.gpu())?;
        bind_sets(cmd, pipeline, 0, &[bundle.camera_set()])?;

        let mut culled = 0usize;
        for instance in &scene.models {
            let world = instance.transform.world_matrix();
            for mesh in &instance.model.meshes {
                if !camera.frustum().intersects_aabb(&mesh.bounds.transformed(&world)) {
                    culled += 1;
                    continue;
                }
                Self::draw_mesh(cmd, pipeline, mesh)?;
            }
        }
        if culled > 0 {
            crate::engine_trace!("lumen3d::renderer", "Geometry pass culled {} meshes", culled);
        }
        cmd.end_render_pass()
    }

    fn record_blur(
        &self,
        cmd: &mut dyn CommandList,
        pass: &PassDecl,
        bundle: &CameraRenderBundle,
        direction: BlurDirection,
    ) -> Result<()> {
        let sets = [self.input_set(bundle, pass)?];
        let push = (ShaderStageFlags::FRAGMENT, bytemuck::bytes_of(&direction));
        self.record_fullscreen(cmd, pass, bundle, pipeline_names::SSAO_BLUR, &sets, Some(push))
    }

    /// Skybox first (depth-tested against the loaded geometry depth), then the
    /// fullscreen lighting resolve
    fn record_lighting(
        &self,
        cmd: &mut dyn CommandList,
        pass: &PassDecl,
        bundle: &CameraRenderBundle,
        scene: &FrameScene<'_>,
    ) -> Result<()> {
        let lighting = self.pipeline(pipeline_names::LIGHTING)?;
        let inputs = self.input_set(bundle, pass)?;
        self.begin(cmd, pass, self.framebuffer(bundle, pass)?)?;

        if let Some(skybox) = scene.skybox {
            let pipeline = self.pipeline(pipeline_names::SKYBOX)?;
            cmd.bind_pipeline(pipeline.gpu())?;
            bind_sets(cmd, pipeline, 0, &[bundle.camera_set(), skybox.descriptor_set()])?;
            cmd.bind_vertex_buffer(skybox.vertex_buffer(), 0)?;
            cmd.draw(skybox.vertex_count(), 0)?;
        }

        cmd.bind_pipeline(lighting.gpu())?;
        bind_sets(cmd, lighting, 0, &[bundle.camera_set(), bundle.shadow_set(), inputs])?;
        let flags = LightingFlags::new(self.ssao_enabled, self.ssao_only);
        cmd.push_constants(lighting.gpu(), ShaderStageFlags::FRAGMENT, 0, bytemuck::bytes_of(&flags))?;
        cmd.draw(FULLSCREEN_VERTICES, 0)?;
        cmd.end_render_pass()
    }

    fn record_sprites(
        &self,
        cmd: &mut dyn CommandList,
        pass: &PassDecl,
        bundle: &CameraRenderBundle,
        scene: &FrameScene<'_>,
    ) -> Result<()> {
        self.begin(cmd, pass, self.framebuffer(bundle, pass)?)?;
        let mut visible = scene
            .sprites
            .iter()
            .filter(|instance| instance.sprite.enabled)
            .filter_map(|instance| instance.sprite.descriptor_set())
            .peekable();
        if visible.peek().is_some() {
            let pipeline = self.pipeline(pipeline_names::SPRITE)?;
            cmd.bind_pipeline(pipeline.gpu())?;
            bind_sets(cmd, pipeline, 0, &[bundle.camera_set()])?;
            cmd.bind_vertex_buffer(self.sprite_quad, 0)?;
            for set in visible {
                bind_sets(cmd, pipeline, 1, &[set])?;
                cmd.draw(SPRITE_QUAD.len() as u32, 0)?;
            }
        }
        cmd.end_render_pass()
    }

    /// One blended fullscreen draw per composited input (lighting, then sprites)
    fn record_composite(&self, cmd: &mut dyn CommandList, pass: &PassDecl, bundle: &CameraRenderBundle) -> Result<()> {
        let pipeline = self.pipeline(pipeline_names::COMPOSITE)?;
        self.begin(cmd, pass, self.framebuffer(bundle, pass)?)?;
        cmd.bind_pipeline(pipeline.gpu())?;
        for set in bundle.input_sets(&pass.name) {
            bind_sets(cmd, pipeline, 0, &[set])?;
            cmd.draw(FULLSCREEN_VERTICES, 0)?;
        }
        cmd.end_render_pass()
    }
}
