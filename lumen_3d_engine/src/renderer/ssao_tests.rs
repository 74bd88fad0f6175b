use super::*;

#[test]
fn test_halton_base_2_and_3() {
    assert_eq!(halton(1, 2), 0.5);
    assert_eq!(halton(2, 2), 0.25);
    assert_eq!(halton(3, 2), 0.75);
    assert!((halton(1, 3) - 1.0 / 3.0).abs() < 1e-6);
    assert!((halton(4, 3) - 1.0 / 9.0 - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(halton(0, 5), 0.0);
}

#[test]
fn test_kernel_lies_in_upper_unit_hemisphere() {
    let kernel = ssao_kernel(64);
    assert_eq!(kernel.len(), 64);
    for sample in &kernel {
        assert!(sample.z >= 0.0, "sample {:?} below the surface", sample);
        assert!(sample.truncate().length() <= 1.0 + 1e-5);
        assert_eq!(sample.w, 0.0);
    }
}

#[test]
fn test_kernel_is_denser_near_origin() {
    let kernel = ssao_kernel(64);
    let first: f32 = kernel[..16].iter().map(|s| s.truncate().length()).sum();
    let last: f32 = kernel[48..].iter().map(|s| s.truncate().length()).sum();
    assert!(first < last);
}

#[test]
fn test_kernel_is_deterministic() {
    assert_eq!(ssao_kernel(16), ssao_kernel(16));
}

#[test]
fn test_noise_texture_size_and_encoding() {
    let pixels = ssao_noise_pixels();
    assert_eq!(pixels.len(), (SSAO_NOISE_DIM * SSAO_NOISE_DIM * 4) as usize);
    // z = 0 encodes to mid-gray, alpha opaque
    for texel in pixels.chunks_exact(4) {
        assert_eq!(texel[2], 128);
        assert_eq!(texel[3], 255);
    }
    // halton(1, 2) = 0.5 -> x = 0 -> 128
    assert_eq!(pixels[0], 128);
}
