#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use exposure_playground::gpu::GpuContext;
use image::{DynamicImage, Rgb, Rgb32FImage, Rgba, RgbaImage};

/// Device for GPU tests, or `None` (with a message) when the machine has no adapter.
pub fn gpu_or_skip(test: &str) -> Option<GpuContext> {
    match GpuContext::headless() {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("No adapter available; skipping {test}: {err}");
            None
        }
    }
}

pub fn unique_temp_path(stem: &str, ext: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic enough for tests")
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("exposure-playground-{stem}-{nonce}-{n}.{ext}"))
}

pub fn write_constant_exr(path: &Path, width: u32, height: u32, rgb: [f32; 3]) {
    DynamicImage::ImageRgb32F(Rgb32FImage::from_pixel(width, height, Rgb(rgb)))
        .save(path)
        .expect("write EXR fixture");
}

pub fn write_constant_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
        .save(path)
        .expect("write PNG fixture");
}

/// Removes the fixture when the test ends, pass or fail.
pub struct TempFile(pub PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
