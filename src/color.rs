/// Rec. 709 luminance weights, shared with the WGSL shaders.
pub const LUMINANCE_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

pub fn luminance([r, g, b]: [f32; 3]) -> f32 {
    LUMINANCE_WEIGHTS[0] * r + LUMINANCE_WEIGHTS[1] * g + LUMINANCE_WEIGHTS[2] * b
}

pub fn linear_to_srgb_channel(x: f32) -> f32 {
    // https://en.wikipedia.org/wiki/SRGB
    if x <= 0.003_130_8 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

pub fn srgb_to_linear_channel(x: f32) -> f32 {
    if x <= 0.040_45 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Quantize a linear display value the way the analysis kernel does:
/// sRGB-encode, then scale to 0..=255.
pub fn quantize_display(x: f32) -> i32 {
    (clamp01(linear_to_srgb_channel(clamp01(x))) * 255.0).round() as i32
}
