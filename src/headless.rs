//! Window-less driver: load → resize → one frame, then read the results back.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::app::{HeadlessSwapChain, Playground, SwapChain};
use crate::config::Config;
use crate::error::{PlaygroundError, Result};
use crate::gpu::GpuContext;
use crate::renderer::StatisticsSnapshot;
use crate::renderer::tone_mapping::LuminanceResult;

/// Everything a headless frame produced.
pub struct HeadlessFrame {
    pub size: [u32; 2],
    /// Tightly packed RGBA8 rows of the target framebuffer.
    pub pixels: Vec<u8>,
    pub statistics: Option<StatisticsSnapshot>,
    pub scale_ceiling: f32,
    /// What auto exposure saw in the HDR framebuffer.
    pub scene_luminance: LuminanceResult,
}

#[derive(Serialize)]
struct StatisticsReport<'a> {
    width: u32,
    height: u32,
    scale_ceiling: f32,
    log_average_luminance: f32,
    average_luminance: f32,
    luminance: &'a [i32],
    r: &'a [i32],
    g: &'a [i32],
    b: &'a [i32],
}

impl HeadlessFrame {
    pub fn statistics_json(&self) -> Option<String> {
        use crate::renderer::Channel;

        let stats = self.statistics.as_ref()?;
        let report = StatisticsReport {
            width: self.size[0],
            height: self.size[1],
            scale_ceiling: self.scale_ceiling,
            log_average_luminance: self.scene_luminance.log_average,
            average_luminance: self.scene_luminance.average,
            luminance: stats.channel(Channel::Luminance),
            r: stats.channel(Channel::R),
            g: stats.channel(Channel::G),
            b: stats.channel(Channel::B),
        };
        serde_json::to_string_pretty(&report).ok()
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            &self.pixels,
            self.size[0],
            self.size[1],
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|source| PlaygroundError::ImageSave {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Drive the hooks once on an existing device.
pub fn render_once(gpu: &GpuContext, config: &Config) -> Result<HeadlessFrame> {
    let mut swap = HeadlessSwapChain::new([config.window.width, config.window.height]);

    // A bad image path fails the run with its typed error.
    let mut startup = config.clone();
    let image_path = startup.ui.image_path.take();
    let mut playground = Playground::on_load(gpu, &startup, &mut swap)?;
    playground.ui.image_path = image_path;
    playground.load_image(gpu, &mut swap)?;

    let [width, height] = swap.size();
    playground.on_resize_swap_chain(gpu, width, height);
    playground.on_frame_render(gpu);

    let target = playground.target().ok_or(PlaygroundError::Readback {
        label: "target",
        reason: "no target framebuffer after resize".to_owned(),
    })?;
    let size = target.size();
    let pixels = target.read_rgba8(&gpu.device, &gpu.queue)?;
    let scene_luminance = playground.scene_luminance(gpu)?;

    if playground.variant().has_analysis() && playground.statistics().is_none() {
        return Err(PlaygroundError::Readback {
            label: "statistics",
            reason: "analysis pass produced no snapshot".to_owned(),
        });
    }

    info!(
        width = size[0],
        height = size[1],
        average_luminance = scene_luminance.average,
        "headless frame rendered"
    );
    Ok(HeadlessFrame {
        size,
        pixels,
        statistics: playground.statistics().cloned(),
        scale_ceiling: playground.scale_ceiling(),
        scene_luminance,
    })
}

/// Create a device and render one frame.
pub fn render_headless(config: &Config) -> Result<HeadlessFrame> {
    let gpu = GpuContext::headless()?;
    render_once(&gpu, config)
}
