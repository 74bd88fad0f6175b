use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use glam::{Vec2, Vec3};
use crate::camera::TransformComponent;
use crate::graphics_device::mock_graphics_device::{
    MockGraphicsDevice, MockPipeline, MockShaderCompiler, MockSurface, SharedState,
};
use crate::graphics_device::PresentResult;
use crate::render_graph::names;
use crate::scene::{Material, Mesh, Model, SpriteComponent, Vertex};
use super::*;

struct Fixture {
    state: SharedState,
    surface: Arc<Mutex<MockSurface>>,
    compiler: MockShaderCompiler,
    renderer: Renderer,
}

impl Fixture {
    fn new() -> Self {
        Self::with(MockGraphicsDevice::new(), config())
    }

    fn with(device: MockGraphicsDevice, config: Config) -> Self {
        let state = device.state();
        let swapchain = device.create_swapchain(800, 600, 3);
        let surface = swapchain.surface();
        let compiler = MockShaderCompiler::new();
        let renderer =
            Renderer::new(Arc::new(device), Box::new(swapchain), Box::new(compiler.clone()), config).unwrap();
        state.lock().unwrap().commands.clear();
        Self { state, surface, compiler, renderer }
    }

    fn camera(&mut self) -> CameraKey {
        self.renderer.setup_camera(CameraComponent::new(60.0, 1.0, 0.1, 100.0)).unwrap()
    }

    fn take_commands(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().unwrap().commands)
    }

    fn submits(&self) -> u32 {
        self.state.lock().unwrap().submits
    }
}

fn config() -> Config {
    Config::default().with_msaa(SampleCount::S1).with_shadow_map_dim(512)
}

fn pass_order(commands: &[String]) -> Vec<&str> {
    commands
        .iter()
        .filter_map(|c| c.strip_prefix("begin_render_pass:"))
        .filter_map(|c| c.split(' ').next())
        .collect()
}

fn position(commands: &[String], prefix: &str) -> usize {
    commands
        .iter()
        .position(|c| c.starts_with(prefix))
        .unwrap_or_else(|| panic!("no command starting with '{}' in {:?}", prefix, commands))
}

fn count(commands: &[String], command: &str) -> usize {
    commands.iter().filter(|c| c.as_str() == command).count()
}

fn triangle_model(ctx: &RenderContext) -> Model {
    let mesh = Mesh::new(
        "triangle",
        vec![
            Vertex::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::Z, Vec2::ZERO),
            Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Z, Vec2::X),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, Vec2::Y),
        ],
        vec![0, 1, 2],
        Material::new(),
    );
    let mut model = Model::new("triangle").with_mesh(mesh);
    model.allocate(ctx).unwrap();
    model
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_bakes_every_pass() {
    let fixture = Fixture::new();
    let renderer = &fixture.renderer;

    for pass in renderer.graph().passes() {
        assert!(renderer.render_pass(&pass.name).is_some(), "{}", pass.name);
        for pipeline in &pass.pipelines {
            assert!(renderer.pipeline(pipeline).is_some(), "{}", pipeline);
        }
    }
    assert_eq!(renderer.present_framebuffer_count(), 3);
    assert_eq!(renderer.swapchain_extent(), (800, 600));
    assert_eq!(fixture.compiler.compiled_count(), 14);
}

#[test]
fn test_msaa_is_clamped_to_device() {
    let fixture = Fixture::with(
        MockGraphicsDevice::new().with_max_samples(SampleCount::S2),
        config().with_msaa(SampleCount::S8),
    );
    assert_eq!(fixture.renderer.msaa_samples(), SampleCount::S2);
}

#[test]
fn test_invalid_cascade_count_rejected() {
    let mut config = config();
    config.cascade_count = 5;
    let device = MockGraphicsDevice::new();
    let swapchain = device.create_swapchain(800, 600, 2);
    let result = Renderer::new(Arc::new(device), Box::new(swapchain), Box::new(MockShaderCompiler::new()), config);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_invalid_kernel_size_rejected() {
    let mut config = config();
    config.ssao_kernel_size = 0;
    let device = MockGraphicsDevice::new();
    let swapchain = device.create_swapchain(800, 600, 2);
    let result = Renderer::new(Arc::new(device), Box::new(swapchain), Box::new(MockShaderCompiler::new()), config);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

// ============================================================================
// Frame protocol
// ============================================================================

#[test]
fn test_empty_frame_clears_and_presents() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Presented);

    let commands = fixture.take_commands();
    assert_eq!(pass_order(&commands), ["present"]);
    assert!(!commands.iter().any(|c| c.starts_with("draw")));

    let begin = position(&commands, "begin");
    let acquire = position(&commands, "acquire:0");
    let present_pass = position(&commands, "begin_render_pass:present");
    let submit = position(&commands, "submit");
    let present = position(&commands, "present:0");
    assert!(begin < acquire && acquire < present_pass && present_pass < submit && submit < present);
    assert_eq!(commands.last().map(String::as_str), Some("wait_fence"));
}

#[test]
fn test_camera_passes_follow_schedule() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    let transform = TransformComponent::default();
    let scene = FrameScene::new().with_camera(key, &transform);

    fixture.renderer.render_frame(&scene).unwrap();
    let commands = fixture.take_commands();
    assert_eq!(
        pass_order(&commands),
        [
            "shadow", "shadow", "shadow", "shadow", "geometry", "ssao_gen", "ssao_blur_h", "ssao_blur_v", "lighting",
            "sprite", "composite", "present"
        ]
    );
    // Fullscreen draws: ssao gen + 2 blurs + lighting + 2 composite inputs + present
    assert_eq!(count(&commands, "draw:3"), 7);
}

#[test]
fn test_ssao_disabled_skips_ssao_passes() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    fixture.renderer.set_ssao_enabled(false);
    let transform = TransformComponent::default();
    let scene = FrameScene::new().with_camera(key, &transform);

    fixture.renderer.render_frame(&scene).unwrap();
    let commands = fixture.take_commands();
    let order = pass_order(&commands);
    assert!(!order.iter().any(|pass| pass.starts_with("ssao")));
    assert!(order.contains(&"lighting"));
    // LightingFlags { ssao_enabled: 0, ssao_only: 0 }
    assert!(commands.iter().any(|c| c == "push_constants:0+8 [0, 0, 0, 0, 0, 0, 0, 0]"));
}

#[test]
fn test_present_samples_last_camera_output() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    let transform = TransformComponent::default();
    let scene = FrameScene::new().with_camera(key, &transform);

    fixture.renderer.render_frame(&scene).unwrap();
    let commands = fixture.take_commands();
    let present_pass = position(&commands, "begin_render_pass:present");
    let to_read = format!("barrier:{} ColorAttachment->ShaderReadOnly", names::COMPOSITE_COLOR);
    let to_write = format!("barrier:{} ShaderReadOnly->ColorAttachment", names::COMPOSITE_COLOR);

    assert!(commands[..present_pass].iter().rev().any(|c| *c == to_read));
    let restore = commands.iter().rposition(|c| *c == to_write).unwrap();
    assert!(restore > present_pass && restore < position(&commands, "submit"));
    assert_eq!(commands[present_pass + 1..].iter().filter(|c| *c == "draw:3").count(), 1);
}

#[test]
fn test_layouts_round_trip_across_frames() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    let transform = TransformComponent::default();
    let scene = FrameScene::new().with_camera(key, &transform);

    for _ in 0..3 {
        assert_eq!(fixture.renderer.render_frame(&scene).unwrap(), FrameStatus::Presented);
    }
    let bundle = fixture.renderer.camera_bundle(key).unwrap();
    for name in bundle.attachment_names() {
        let image = bundle.require_attachment(name).unwrap();
        assert_eq!(image.layout(), image.kind().attachment_layout(), "{}", name);
    }
}

#[test]
fn test_static_scene_records_identical_frames() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    let model = triangle_model(fixture.renderer.context());
    let camera = TransformComponent::default();
    let placed = TransformComponent::new(Vec3::new(0.0, 0.0, -5.0));
    let scene = FrameScene::new().with_camera(key, &camera).with_model(&model, &placed);

    // Only the swapchain image index may differ between frames
    let mut frame = || -> Vec<String> {
        assert_eq!(fixture.renderer.render_frame(&scene).unwrap(), FrameStatus::Presented);
        fixture
            .take_commands()
            .into_iter()
            .map(|c| {
                let verb = c.split(':').next().unwrap_or_default().to_string();
                if verb == "acquire" || verb == "present" { verb } else { c }
            })
            .collect()
    };
    frame();
    let first = frame();
    assert!(first.iter().any(|c| c.starts_with("begin_render_pass:geometry") && c.contains("clears=")));
    for _ in 0..3 {
        assert_eq!(frame(), first);
    }
}

#[test]
fn test_fence_is_signaled_before_every_begin() {
    let mut fixture = Fixture::new();
    for _ in 0..3 {
        fixture.renderer.render_frame(&FrameScene::new()).unwrap();
        assert!(fixture.state.lock().unwrap().fence_signaled);
    }
    assert_eq!(fixture.submits(), 3);
}

#[test]
fn test_out_of_phase_calls_rejected() {
    let mut fixture = Fixture::new();
    let renderer = &mut fixture.renderer;

    assert!(matches!(renderer.begin_present(), Err(Error::InvalidState(_))));
    assert!(matches!(renderer.present_pass(), Err(Error::InvalidState(_))));
    assert!(matches!(renderer.end_present(), Err(Error::InvalidState(_))));

    assert_eq!(renderer.begin_render().unwrap(), FrameStatus::Ready);
    assert!(matches!(renderer.begin_render(), Err(Error::InvalidState(_))));
    assert!(matches!(renderer.end_present(), Err(Error::InvalidState(_))));

    assert_eq!(renderer.begin_present().unwrap(), FrameStatus::Ready);
    assert!(matches!(renderer.end_present(), Err(Error::InvalidState(_))));
    renderer.present_pass().unwrap();
    assert!(matches!(renderer.present_pass(), Err(Error::InvalidState(_))));
    assert_eq!(renderer.end_present().unwrap(), FrameStatus::Presented);
    assert!(!renderer.is_recording());
}

#[test]
fn test_unknown_camera_rejected() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    fixture.renderer.remove_camera(key).unwrap();
    let transform = TransformComponent::default();
    let scene = FrameScene::new().with_camera(key, &transform);

    assert!(matches!(fixture.renderer.render_frame(&scene), Err(Error::InvalidResource(_))));
}

// ============================================================================
// Recoverable swapchain states
// ============================================================================

#[test]
fn test_out_of_date_acquire_skips_without_submit() {
    let mut fixture = Fixture::new();
    fixture.surface.lock().unwrap().out_of_date_acquires = 1;

    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Skipped);
    assert_eq!(fixture.submits(), 0);
    assert!(!fixture.renderer.is_recording());

    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Presented);
    assert_eq!(fixture.surface.lock().unwrap().recreations, [(800, 600, true)]);
    assert_eq!(fixture.submits(), 1);
}

#[test]
fn test_out_of_date_resize_reaches_camera_bundles_next_frame() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    let transform = TransformComponent::default();
    let scene = FrameScene::new().with_camera(key, &transform);
    assert_eq!(fixture.renderer.render_frame(&scene).unwrap(), FrameStatus::Presented);

    // No resize event: the surface just stops matching the swapchain
    fixture.surface.lock().unwrap().extent = (1280, 720);
    assert_eq!(fixture.renderer.render_frame(&scene).unwrap(), FrameStatus::Skipped);
    assert_eq!(fixture.submits(), 1);
    assert_eq!(fixture.renderer.camera_bundle(key).unwrap().extent(), (800, 600));

    assert_eq!(fixture.renderer.render_frame(&scene).unwrap(), FrameStatus::Presented);
    assert_eq!(fixture.surface.lock().unwrap().recreations, [(1280, 720, true)]);
    assert_eq!(fixture.submits(), 2);
    let bundle = fixture.renderer.camera_bundle(key).unwrap();
    assert_eq!(bundle.extent(), (1280, 720));
    assert_eq!((bundle.output().width(), bundle.output().height()), (1280, 720));
    let aspect = fixture.renderer.camera(key).unwrap().aspect();
    assert!((aspect - 1280.0 / 720.0).abs() < 1e-5);
}

#[test]
fn test_suboptimal_acquire_presents_then_recreates() {
    let mut fixture = Fixture::new();
    fixture.surface.lock().unwrap().suboptimal_acquires = 1;

    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Presented);
    assert_eq!(fixture.submits(), 1);
    assert!(fixture.surface.lock().unwrap().recreations.is_empty());

    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Presented);
    assert_eq!(fixture.surface.lock().unwrap().recreations, [(800, 600, true)]);
}

#[test]
fn test_suboptimal_present_recreates_next_frame() {
    let mut fixture = Fixture::new();
    fixture.surface.lock().unwrap().present_results.push_back(PresentResult::Suboptimal);

    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Presented);
    assert!(fixture.surface.lock().unwrap().recreations.is_empty());

    fixture.renderer.render_frame(&FrameScene::new()).unwrap();
    assert_eq!(fixture.surface.lock().unwrap().recreations.len(), 1);
}

#[test]
fn test_minimized_window_skips_frames() {
    let mut fixture = Fixture::new();
    fixture.surface.lock().unwrap().extent = (0, 0);

    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Skipped);
    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Skipped);
    let commands = fixture.take_commands();
    assert!(!commands.iter().any(|c| c == "begin"));

    fixture.surface.lock().unwrap().extent = (1024, 768);
    assert_eq!(fixture.renderer.render_frame(&FrameScene::new()).unwrap(), FrameStatus::Presented);
    assert_eq!(fixture.renderer.swapchain_extent(), (1024, 768));
}

#[test]
fn test_resize_rebuilds_camera_bundles() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();

    fixture.surface.lock().unwrap().extent = (1024, 768);
    let resized = WindowEvent::Resized(winit::dpi::PhysicalSize::new(1024, 768));
    assert!(fixture.renderer.handle_window_event(&resized));

    let transform = TransformComponent::default();
    let scene = FrameScene::new().with_camera(key, &transform);
    assert_eq!(fixture.renderer.render_frame(&scene).unwrap(), FrameStatus::Presented);

    let bundle = fixture.renderer.camera_bundle(key).unwrap();
    assert_eq!(bundle.extent(), (1024, 768));
    assert_eq!(bundle.output().width(), 1024);
    let ssao = bundle.require_attachment(names::SSAO_COLOR).unwrap();
    assert_eq!((ssao.width(), ssao.height()), (512, 384));
    assert_eq!(bundle.require_attachment(names::SHADOW_DEPTH).unwrap().width(), 512);
    let aspect = fixture.renderer.camera(key).unwrap().aspect();
    assert!((aspect - 1024.0 / 768.0).abs() < 1e-5);
}

// ============================================================================
// Toggles
// ============================================================================

#[test]
fn test_msaa_change_rebuilds_everything() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    fixture.renderer.set_msaa_samples(SampleCount::S4);
    assert_eq!(fixture.renderer.msaa_samples(), SampleCount::S1);

    fixture.renderer.render_frame(&FrameScene::new()).unwrap();
    assert_eq!(fixture.renderer.msaa_samples(), SampleCount::S4);

    let bundle = fixture.renderer.camera_bundle(key).unwrap();
    assert_eq!(bundle.samples(), SampleCount::S4);
    let normal = bundle.require_attachment(names::GBUFFER_NORMAL).unwrap();
    let resolve = bundle.require_attachment(names::GBUFFER_NORMAL_RESOLVE).unwrap();
    assert!(!Arc::ptr_eq(normal, resolve));

    let geometry = fixture.renderer.pipeline(pipeline_names::GEOMETRY).unwrap();
    assert_eq!(geometry.signature(), fixture.renderer.render_pass(passes::GEOMETRY).unwrap().signature());
    let mock = geometry.gpu().as_any().downcast_ref::<MockPipeline>().unwrap();
    assert_eq!(mock.samples, SampleCount::S4);
}

#[test]
fn test_wireframe_rebakes_geometry_pipeline() {
    let mut fixture = Fixture::new();
    fixture.renderer.set_wireframe(true);
    fixture.renderer.render_frame(&FrameScene::new()).unwrap();

    let wireframe = |name: &str| {
        let pipeline = fixture.renderer.pipeline(name).unwrap();
        pipeline.gpu().as_any().downcast_ref::<MockPipeline>().unwrap().wireframe
    };
    assert!(wireframe(pipeline_names::GEOMETRY));
    assert!(!wireframe(pipeline_names::LIGHTING));
}

#[test]
fn test_shader_recreate_reloads_modules() {
    let mut fixture = Fixture::new();
    fixture.renderer.request_shader_recreate();
    fixture.renderer.render_frame(&FrameScene::new()).unwrap();
    assert_eq!(fixture.compiler.compiled_count(), 28);
}

#[test]
fn test_vsync_toggle_recreates_swapchain() {
    let mut fixture = Fixture::new();
    fixture.renderer.set_vsync(false);
    fixture.renderer.render_frame(&FrameScene::new()).unwrap();
    assert_eq!(fixture.surface.lock().unwrap().recreations, [(800, 600, false)]);
}

#[test]
fn test_clear_color_reaches_present_pass() {
    let mut fixture = Fixture::new();
    fixture.renderer.set_clear_color([0.25, 0.5, 0.75, 1.0]);
    fixture.renderer.render_frame(&FrameScene::new()).unwrap();

    let commands = fixture.take_commands();
    let present = &commands[position(&commands, "begin_render_pass:present")];
    assert!(present.ends_with("clears=[Color([0.25, 0.5, 0.75, 1.0])]"), "{}", present);
}

// ============================================================================
// Scene content
// ============================================================================

#[test]
fn test_meshes_are_culled_but_still_cast_shadows() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    let model = triangle_model(fixture.renderer.context());
    let camera = TransformComponent::default();
    let in_front = TransformComponent::new(Vec3::new(0.0, 0.0, -5.0));
    let behind = TransformComponent::new(Vec3::new(0.0, 0.0, 5.0));

    let scene = FrameScene::new().with_camera(key, &camera).with_model(&model, &in_front);
    fixture.renderer.render_frame(&scene).unwrap();
    // One draw per cascade plus the geometry pass
    assert_eq!(count(&fixture.take_commands(), "draw_indexed:3"), 5);

    let scene = FrameScene::new().with_camera(key, &camera).with_model(&model, &behind);
    fixture.renderer.render_frame(&scene).unwrap();
    assert_eq!(count(&fixture.take_commands(), "draw_indexed:3"), 4);
}

#[test]
fn test_model_listed_twice_is_rejected() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    let model = triangle_model(fixture.renderer.context());
    let camera = TransformComponent::default();
    let left = TransformComponent::new(Vec3::new(-1.0, 0.0, -5.0));
    let right = TransformComponent::new(Vec3::new(1.0, 0.0, -5.0));

    let doubled = FrameScene::new().with_camera(key, &camera).with_model(&model, &left).with_model(&model, &right);
    assert!(matches!(fixture.renderer.render_frame(&doubled), Err(Error::InvalidResource(_))));
    assert!(!fixture.renderer.is_recording());
    assert_eq!(fixture.submits(), 0);

    assert_eq!(fixture.renderer.begin_render().unwrap(), FrameStatus::Ready);
    assert!(matches!(fixture.renderer.prepare_scene(&doubled), Err(Error::InvalidResource(_))));
}

#[test]
fn test_sprites_draw_the_shared_quad() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    let texture = fixture.renderer.context().create_texture_rgba8("dot", 1, 1, vec![255; 4], true).unwrap();
    let mut sprite = SpriteComponent::new(texture);
    sprite.allocate(fixture.renderer.context()).unwrap();
    let mut hidden = SpriteComponent::new(fixture.renderer.context().blank_texture().clone());
    hidden.allocate(fixture.renderer.context()).unwrap();
    hidden.enabled = false;

    let transform = TransformComponent::default();
    let scene = FrameScene::new()
        .with_camera(key, &transform)
        .with_sprite(&sprite, &transform)
        .with_sprite(&hidden, &transform);
    fixture.renderer.render_frame(&scene).unwrap();

    let commands = fixture.take_commands();
    assert_eq!(count(&commands, "draw:6"), 1);
    assert!(commands.iter().any(|c| c == "bind_vertex_buffer:sprite_quad"));
}

#[test]
fn test_disabled_camera_records_nothing() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    fixture.renderer.camera_mut(key).unwrap().set_enabled(false);
    let transform = TransformComponent::default();
    let scene = FrameScene::new().with_camera(key, &transform);

    fixture.renderer.render_frame(&scene).unwrap();
    assert_eq!(pass_order(&fixture.take_commands()), ["present"]);
}

// ============================================================================
// Cameras and task queue
// ============================================================================

#[test]
fn test_camera_setup_uses_swapchain_extent() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();

    assert_eq!(fixture.renderer.camera_bundle(key).unwrap().extent(), (800, 600));
    assert!((fixture.renderer.camera(key).unwrap().aspect() - 800.0 / 600.0).abs() < 1e-5);
    assert_eq!(fixture.renderer.camera_output(key).unwrap().name(), names::COMPOSITE_COLOR);
}

#[test]
fn test_replace_and_remove_camera() {
    let mut fixture = Fixture::new();
    let key = fixture.camera();
    fixture.renderer.replace_camera(key, CameraComponent::new(90.0, 1.0, 0.5, 50.0)).unwrap();
    assert_eq!(fixture.renderer.camera(key).unwrap().fov_y_degrees(), 90.0);
    assert_eq!(fixture.renderer.camera_count(), 1);

    fixture.renderer.begin_render().unwrap();
    assert!(matches!(fixture.renderer.remove_camera(key), Err(Error::InvalidState(_))));
    fixture.renderer.begin_present().unwrap();
    fixture.renderer.present_pass().unwrap();
    fixture.renderer.end_present().unwrap();

    let removed = fixture.renderer.remove_camera(key).unwrap();
    assert_eq!(removed.far(), 50.0);
    assert_eq!(fixture.renderer.camera_count(), 0);
    assert!(fixture.renderer.camera_output(key).is_none());
}

#[test]
fn test_task_queue_drained_at_begin_render() {
    let mut fixture = Fixture::new();
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    fixture.renderer.task_queue().submit(move || flag.store(true, Ordering::SeqCst));

    assert!(!ran.load(Ordering::SeqCst));
    fixture.renderer.render_frame(&FrameScene::new()).unwrap();
    assert!(ran.load(Ordering::SeqCst));
    assert_eq!(fixture.renderer.task_queue().pending(), 0);
}
