//! Integration tests for the deferred render graph through the public API
//!
//! The graph is pure data, so these run without a GPU: they replay whole
//! frames against the layout tracker for every sample count and SSAO
//! setting the renderer can switch between at runtime.
//!
//! Run with: cargo test --test render_graph_integration_tests

use lumen_3d_engine::lumen3d::graph::{names, passes, RenderGraph};
use lumen_3d_engine::lumen3d::render::{AttachmentKind, ImageLayout, SampleCount, TextureFormat};

const SAMPLE_COUNTS: [SampleCount; 4] = [SampleCount::S1, SampleCount::S2, SampleCount::S4, SampleCount::S8];

fn deferred() -> RenderGraph {
    let mut graph = RenderGraph::deferred(4, 2048).unwrap();
    graph.set_swapchain_format(TextureFormat::B8G8R8A8_SRGB);
    graph
}

// ============================================================================
// LAYOUT ROUND TRIP
// ============================================================================

#[test]
fn test_integration_steady_state_for_every_configuration() {
    let graph = deferred();
    for msaa in SAMPLE_COUNTS {
        for ssao in [true, false] {
            let start = graph.initial_layouts(msaa);
            let mut layouts = start.clone();
            for frame in 0..3 {
                graph
                    .simulate_frame(&mut layouts, msaa, ssao)
                    .unwrap_or_else(|e| panic!("x{} ssao={} frame {}: {}", msaa.as_u32(), ssao, frame, e));
                assert_eq!(layouts, start, "x{} ssao={} frame {}", msaa.as_u32(), ssao, frame);
            }
        }
    }
}

#[test]
fn test_integration_toggling_ssao_between_frames() {
    let graph = deferred();
    let start = graph.initial_layouts(SampleCount::S4);
    let mut layouts = start.clone();
    for ssao in [true, false, false, true, false] {
        graph.simulate_frame(&mut layouts, SampleCount::S4, ssao).unwrap();
    }
    assert_eq!(layouts, start);
}

#[test]
fn test_integration_resolves_only_exist_when_multisampled() {
    let graph = deferred();
    let single = graph.initial_layouts(SampleCount::S1);
    let multi = graph.initial_layouts(SampleCount::S4);

    assert!(!single.contains_key(names::LIGHTING_RESOLVE));
    assert!(multi.contains_key(names::LIGHTING_RESOLVE));
    assert_eq!(multi[names::SHADOW_DEPTH], ImageLayout::DepthStencilAttachment);
    assert!(!multi.contains_key(names::SWAPCHAIN));
}

// ============================================================================
// SIGNATURES
// ============================================================================

#[test]
fn test_integration_geometry_signature_tracks_msaa() {
    let graph = deferred();
    let geometry = graph.pass(passes::GEOMETRY).unwrap();

    let single = graph.signature(geometry, SampleCount::S1).unwrap();
    assert_eq!(single.len(), 7);
    assert_eq!(single.resolve_count(), 0);

    let multi = graph.signature(geometry, SampleCount::S8).unwrap();
    assert_eq!(multi.len(), 13);
    assert_eq!(multi.resolve_count(), 6);
    assert_eq!(multi.samples(), SampleCount::S8);
    assert!(!single.diff(&multi).is_empty());
}

#[test]
fn test_integration_present_uses_swapchain_format() {
    let mut graph = deferred();
    let signature = graph.signature(graph.pass(passes::PRESENT).unwrap(), SampleCount::S4).unwrap();
    assert_eq!(signature.slots()[0].kind, AttachmentKind::SwapChain);
    assert_eq!(signature.slots()[0].format, TextureFormat::B8G8R8A8_SRGB);
    assert_eq!(signature.slots()[0].samples, SampleCount::S1);

    graph.set_swapchain_format(TextureFormat::B8G8R8A8_UNORM);
    let signature = graph.signature(graph.pass(passes::PRESENT).unwrap(), SampleCount::S4).unwrap();
    assert_eq!(signature.slots()[0].format, TextureFormat::B8G8R8A8_UNORM);
}
