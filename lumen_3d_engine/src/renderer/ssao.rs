/// SSAO sample kernel and rotation noise
///
/// Both are deterministic: samples and noise come from Halton sequences
/// instead of a random generator, so every run (and every test) sees the
/// same kernel.

use glam::{Vec3, Vec4};

/// Side of the square noise texture, tiled over the viewport
pub const SSAO_NOISE_DIM: u32 = 4;

/// Element `index` (1-based) of the Halton sequence in `base`
pub fn halton(mut index: u32, base: u32) -> f32 {
    let mut result = 0.0;
    let mut fraction = 1.0;
    while index > 0 {
        fraction /= base as f32;
        result += fraction * (index % base) as f32;
        index /= base;
    }
    result
}

/// `size` sample offsets in the +Z tangent-space hemisphere, denser near
/// the origin
pub fn ssao_kernel(size: u32) -> Vec<Vec4> {
    (0..size)
        .map(|i| {
            let n = i + 1;
            let direction = Vec3::new(halton(n, 2) * 2.0 - 1.0, halton(n, 3) * 2.0 - 1.0, halton(n, 5))
                .try_normalize()
                .unwrap_or(Vec3::Z);
            let length = 0.1 + 0.9 * halton(n, 7);
            let t = i as f32 / size as f32;
            let scale = 0.1 + 0.9 * t * t;
            (direction * length * scale).extend(0.0)
        })
        .collect()
}

/// RGBA8 pixels of the noise texture: random rotation vectors around Z,
/// encoded as `v * 0.5 + 0.5`
pub fn ssao_noise_pixels() -> Vec<u8> {
    let count = SSAO_NOISE_DIM * SSAO_NOISE_DIM;
    let encode = |v: f32| ((v * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8;
    (0..count)
        .flat_map(|i| {
            let n = i + 1;
            let x = halton(n, 2) * 2.0 - 1.0;
            let y = halton(n, 3) * 2.0 - 1.0;
            [encode(x), encode(y), encode(0.0), 255]
        })
        .collect()
}

#[cfg(test)]
#[path = "ssao_tests.rs"]
mod tests;
