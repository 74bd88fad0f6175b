use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockPipeline, MockShaderCompiler};
use crate::graphics_device::SampleCount;
use super::super::context::RenderContext;
use super::*;

struct Fixture {
    ctx: RenderContext,
    compiler: MockShaderCompiler,
    shaders: ShaderLibrary,
    graph: RenderGraph,
    render_passes: FxHashMap<String, RenderPass>,
    input_layouts: FxHashMap<String, Arc<dyn DescriptorSetLayout>>,
}

impl Fixture {
    fn new(msaa: SampleCount) -> Self {
        let ctx = RenderContext::new(Arc::new(MockGraphicsDevice::new())).unwrap();
        let compiler = MockShaderCompiler::new();
        let shaders = ShaderLibrary::new(Box::new(compiler.clone()), "shaders");
        let graph = RenderGraph::deferred(4, 1024).unwrap();
        let render_passes = bake_render_passes(ctx.device(), &graph, msaa).unwrap();
        let input_layouts = create_input_layouts(ctx.device(), &graph).unwrap();
        Self { ctx, compiler, shaders, graph, render_passes, input_layouts }
    }

    fn bake(&mut self, wireframe: bool) -> Result<FxHashMap<String, Pipeline>> {
        let inputs = PipelineInputs {
            render_passes: &self.render_passes,
            set_layouts: self.ctx.layouts(),
            input_layouts: &self.input_layouts,
        };
        bake_pipelines(self.ctx.device(), &mut self.shaders, &inputs, wireframe)
    }

    fn rebake(&mut self, pipelines: &mut FxHashMap<String, Pipeline>, wireframe: bool) -> Result<()> {
        let inputs = PipelineInputs {
            render_passes: &self.render_passes,
            set_layouts: self.ctx.layouts(),
            input_layouts: &self.input_layouts,
        };
        rebake_pipelines(self.ctx.device(), &mut self.shaders, &inputs, pipelines, wireframe)
    }
}

fn mock(pipeline: &Pipeline) -> &MockPipeline {
    pipeline.gpu().as_any().downcast_ref::<MockPipeline>().unwrap()
}

// ============================================================================
// Table
// ============================================================================

#[test]
fn test_every_graph_pipeline_has_a_spec() {
    let graph = RenderGraph::deferred(4, 1024).unwrap();
    let specs = pipeline_specs();
    for pass in graph.passes() {
        for name in &pass.pipelines {
            let spec = specs.iter().find(|s| s.name == name.as_str());
            assert!(spec.is_some(), "no pipeline spec for '{}'", name);
        }
    }
    for spec in &specs {
        assert!(graph.pass(spec.pass).is_some(), "'{}' targets unknown pass '{}'", spec.name, spec.pass);
    }
}

#[test]
fn test_fullscreen_pipelines_have_no_vertex_input() {
    for spec in pipeline_specs().iter().filter(|s| s.vertex_shader == FULLSCREEN_SHADER) {
        assert!(spec.vertex_layout.is_empty(), "{}", spec.name);
        assert!(!spec.properties.depth_test, "{}", spec.name);
    }
}

#[test]
fn test_input_binding_counts() {
    let graph = RenderGraph::deferred(4, 1024).unwrap();
    let count = |pass: &str| input_binding_count(graph.pass(pass).unwrap());
    assert_eq!(count(passes::LIGHTING), 8);
    assert_eq!(count(passes::SSAO_GEN), 2);
    assert_eq!(count(passes::COMPOSITE), 1);
    assert_eq!(count(passes::PRESENT), 1);
}

// ============================================================================
// Baking
// ============================================================================

#[test]
fn test_blend_states_follow_pass_outputs() {
    let mut fixture = Fixture::new(SampleCount::S4);
    let pipelines = fixture.bake(false).unwrap();

    let blends = |name: &str| pipelines[name].blend_attachment_count();
    assert_eq!(blends(pipeline_names::SHADOW), 0);
    assert_eq!(blends(pipeline_names::GEOMETRY), 6);
    assert_eq!(blends(pipeline_names::SSAO_GEN), 1);
    assert_eq!(blends(pipeline_names::SKYBOX), 1);
    assert_eq!(blends(pipeline_names::LIGHTING), 1);
    assert_eq!(blends(pipeline_names::COMPOSITE), 1);
    assert_eq!(blends(pipeline_names::PRESENT), 1);
}

#[test]
fn test_sample_counts_follow_pass() {
    let mut fixture = Fixture::new(SampleCount::S4);
    let pipelines = fixture.bake(false).unwrap();

    assert_eq!(mock(&pipelines[pipeline_names::GEOMETRY]).samples, SampleCount::S4);
    assert_eq!(mock(&pipelines[pipeline_names::LIGHTING]).samples, SampleCount::S4);
    assert_eq!(mock(&pipelines[pipeline_names::SSAO_BLUR]).samples, SampleCount::S1);
    assert_eq!(mock(&pipelines[pipeline_names::SHADOW]).samples, SampleCount::S1);
    assert_eq!(mock(&pipelines[pipeline_names::PRESENT]).samples, SampleCount::S1);
}

#[test]
fn test_shader_modules_are_shared() {
    let mut fixture = Fixture::new(SampleCount::S1);
    fixture.bake(false).unwrap();

    // 5 vertex and 9 fragment modules; fullscreen is compiled once
    assert_eq!(fixture.shaders.len(), 14);
    assert_eq!(fixture.compiler.compiled_count(), 14);
}

#[test]
fn test_compile_failure_is_fatal() {
    let mut fixture = Fixture::new(SampleCount::S1);
    fixture.compiler.fail_on("lighting");
    assert!(matches!(fixture.bake(false), Err(Error::InvalidResource(_))));
}

#[test]
fn test_wireframe_only_affects_geometry() {
    let mut fixture = Fixture::new(SampleCount::S1);
    let pipelines = fixture.bake(true).unwrap();

    assert!(mock(&pipelines[pipeline_names::GEOMETRY]).wireframe);
    assert!(!mock(&pipelines[pipeline_names::SPRITE]).wireframe);
    assert!(!mock(&pipelines[pipeline_names::LIGHTING]).wireframe);
}

// ============================================================================
// Rebaking
// ============================================================================

#[test]
fn test_msaa_change_rebakes_against_new_signatures() {
    let mut fixture = Fixture::new(SampleCount::S1);
    let mut pipelines = fixture.bake(false).unwrap();

    rebake_render_passes(fixture.ctx.device(), &fixture.graph, SampleCount::S8, &mut fixture.render_passes).unwrap();
    fixture.rebake(&mut pipelines, false).unwrap();

    let geometry = &pipelines[pipeline_names::GEOMETRY];
    assert_eq!(mock(geometry).samples, SampleCount::S8);
    assert_eq!(geometry.signature(), fixture.render_passes[passes::GEOMETRY].signature());
    assert_eq!(mock(&pipelines[pipeline_names::SSAO_GEN]).samples, SampleCount::S1);
}

#[test]
fn test_unchanged_render_passes_are_kept() {
    let mut fixture = Fixture::new(SampleCount::S4);
    let before = fixture.render_passes.len();
    rebake_render_passes(fixture.ctx.device(), &fixture.graph, SampleCount::S4, &mut fixture.render_passes).unwrap();
    assert_eq!(fixture.render_passes.len(), before);
}

#[test]
fn test_shader_reload_recompiles_cached_modules() {
    let mut fixture = Fixture::new(SampleCount::S1);
    let mut pipelines = fixture.bake(false).unwrap();

    fixture.shaders.reload(fixture.ctx.device()).unwrap();
    fixture.rebake(&mut pipelines, true).unwrap();
    assert_eq!(fixture.compiler.compiled_count(), 28);
    assert!(mock(&pipelines[pipeline_names::GEOMETRY]).wireframe);
}

#[test]
fn test_failed_reload_keeps_old_modules() {
    let mut fixture = Fixture::new(SampleCount::S1);
    fixture.bake(false).unwrap();

    fixture.compiler.fail_on("composite");
    assert!(fixture.shaders.reload(fixture.ctx.device()).is_err());
    assert_eq!(fixture.shaders.len(), 14);
}
