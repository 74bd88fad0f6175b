use super::*;

#[test]
fn test_size_policies() {
    assert_eq!(SizePolicy::Viewport.extent((1920, 1080)), (1920, 1080));
    assert_eq!(SizePolicy::HalfViewport.extent((1920, 1080)), (960, 540));
    assert_eq!(SizePolicy::HalfViewport.extent((1, 1)), (1, 1));
    assert_eq!(SizePolicy::Fixed(4096).extent((800, 600)), (4096, 4096));
}

#[test]
fn test_sample_policies() {
    assert_eq!(SamplePolicy::Msaa.samples(SampleCount::S8), SampleCount::S8);
    assert_eq!(SamplePolicy::Single.samples(SampleCount::S8), SampleCount::S1);
}

#[test]
fn test_resolve_of_copies_primary_shape() {
    let primary = ResourceDecl::color(names::LIGHTING_COLOR, TextureFormat::R16G16B16A16_SFLOAT);
    let resolve = ResourceDecl::resolve_of(names::LIGHTING_RESOLVE, &primary);
    assert_eq!(resolve.kind, AttachmentKind::Resolve);
    assert_eq!(resolve.format, primary.format);
    assert_eq!(resolve.samples, SamplePolicy::Single);
    assert_eq!(resolve.resolves.as_deref(), Some(names::LIGHTING_COLOR));
}

#[test]
fn test_resolves_alias_at_one_sample() {
    let primary = ResourceDecl::color(names::SPRITE_COLOR, TextureFormat::R8G8B8A8_UNORM);
    let resolve = ResourceDecl::resolve_of(names::SPRITE_RESOLVE, &primary);
    assert!(!resolve.is_allocated(SampleCount::S1));
    assert!(resolve.is_allocated(SampleCount::S2));
    assert!(primary.is_allocated(SampleCount::S1));
}
