//! The playground application: owns every GPU resource and implements the
//! four lifecycle hooks (load, frame render, GUI render, swap-chain resize).
//!
//! The hooks are driven either by the eframe shell (`shell`) or directly by
//! the headless driver and the integration tests.

mod frame_timer;
pub mod shell;

pub use frame_timer::FrameTimer;

use std::time::Instant;

use eframe::egui;
use tracing::{info, trace, warn};

use crate::config::Config;
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::renderer::tone_mapping::LuminanceResult;
use crate::renderer::{
    HdrFramebuffer, HdrImage, ImageAnalysisPass, PassthroughPass, ShaderLibrary,
    StatisticsSnapshot, TargetFramebuffer, ToneMapper,
};
use crate::state::{UiState, Variant};
use crate::ui::{design_tokens, histogram, panels};

/// Presentation surface the application may ask to resize.
///
/// The request is asynchronous for a window; the driver reports the actual
/// size back through [`Playground::on_resize_swap_chain`].
pub trait SwapChain {
    fn size(&self) -> [u32; 2];
    fn resize_swap_chain(&mut self, width: u32, height: u32);
}

/// Swap chain without a window, used by headless runs and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadlessSwapChain {
    size: [u32; 2],
    resize_requests: usize,
}

impl HeadlessSwapChain {
    pub fn new(size: [u32; 2]) -> Self {
        Self {
            size,
            resize_requests: 0,
        }
    }

    pub fn resize_requests(&self) -> usize {
        self.resize_requests
    }
}

impl SwapChain for HeadlessSwapChain {
    fn size(&self) -> [u32; 2] {
        self.size
    }

    fn resize_swap_chain(&mut self, width: u32, height: u32) {
        self.size = [width, height];
        self.resize_requests += 1;
    }
}

fn hdr_clear_color() -> wgpu::Color {
    let [r, g, b, a] = design_tokens::HDR_CLEAR_COLOR;
    wgpu::Color { r, g, b, a }
}

pub struct Playground {
    variant: Variant,
    pub ui: UiState,
    passthrough: PassthroughPass,
    tone_mapper: ToneMapper,
    analysis: Option<ImageAnalysisPass>,
    hdr_image: Option<HdrImage>,
    hdr_fbo: Option<HdrFramebuffer>,
    target: Option<TargetFramebuffer>,
    target_generation: u64,
    statistics: Option<StatisticsSnapshot>,
    scale_ceiling: f32,
    frame_timer: FrameTimer,
    start: Instant,
    last_error: Option<String>,
}

impl Playground {
    /// Build pipelines and load the configured image, if any.
    ///
    /// Shader or pipeline failures abort startup. A failing initial image is
    /// logged and shown in the GUI instead.
    pub fn on_load(gpu: &GpuContext, config: &Config, swap: &mut dyn SwapChain) -> Result<Self> {
        let shaders = ShaderLibrary::with_override_dir(config.shader_dir.as_deref());
        let passthrough = PassthroughPass::new(&gpu.device, &shaders)?;
        let tone_mapper = ToneMapper::new(&gpu.device, &shaders)?;
        let analysis = if config.variant.has_analysis() {
            Some(ImageAnalysisPass::new(&gpu.device, &shaders)?)
        } else {
            None
        };
        info!(variant = ?config.variant, "pipelines ready");

        let mut playground = Self {
            variant: config.variant,
            ui: config.ui.clone(),
            passthrough,
            tone_mapper,
            analysis,
            hdr_image: None,
            hdr_fbo: None,
            target: None,
            target_generation: 0,
            statistics: None,
            scale_ceiling: histogram::CEILING_FALLBACK,
            frame_timer: FrameTimer::default(),
            start: Instant::now(),
            last_error: None,
        };

        if let Err(err) = playground.load_image(gpu, swap) {
            playground.record_load_error(&err);
        }
        Ok(playground)
    }

    /// Load `ui.image_path` with `ui.srgb`.
    ///
    /// Returns `Ok(false)` when no path is set. On failure the previous image
    /// stays loaded.
    pub fn load_image(&mut self, gpu: &GpuContext, swap: &mut dyn SwapChain) -> Result<bool> {
        let Some(path) = self
            .ui
            .image_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
        else {
            return Ok(false);
        };

        let image = HdrImage::load(&gpu.device, &gpu.queue, path, self.ui.srgb)?;
        let [width, height] = image.size();

        self.hdr_fbo = Some(HdrFramebuffer::new(&gpu.device, [width, height]));
        self.hdr_image = Some(image);
        self.last_error = None;

        if self.variant.resize_swap_chain_on_load() {
            swap.resize_swap_chain(width, height);
        }
        Ok(true)
    }

    /// Reload the current path with a new sRGB flag.
    ///
    /// On failure `ui.srgb` goes back to the flag the image on screen was
    /// loaded with, or to its previous value when nothing is loaded.
    pub fn reload_with_srgb(
        &mut self,
        gpu: &GpuContext,
        swap: &mut dyn SwapChain,
        srgb: bool,
    ) -> Result<bool> {
        let previous = self.hdr_image.as_ref().map_or(!srgb, |image| image.srgb);
        self.ui.srgb = srgb;
        let result = self.load_image(gpu, swap);
        if result.is_err() {
            self.ui.srgb = previous;
        }
        result
    }

    pub fn on_resize_swap_chain(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        let hdr_exists = self.hdr_fbo.is_some();
        if self.variant.recreate_hdr_on_resize(hdr_exists) {
            self.hdr_fbo = Some(HdrFramebuffer::new(&gpu.device, [width, height]));
        }
        self.target = Some(TargetFramebuffer::new(&gpu.device, [width, height]));
        self.target_generation += 1;
        info!(width, height, "swap chain resized");
    }

    /// Record and submit one frame, then pull the statistics back.
    pub fn on_frame_render(&mut self, gpu: &GpuContext) {
        let (Some(hdr), Some(target)) = (self.hdr_fbo.as_ref(), self.target.as_ref()) else {
            trace!("no framebuffers yet; skipping frame");
            return;
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("playground.frame"),
            });

        hdr.clear(&mut encoder, hdr_clear_color());

        if let Some(image) = self.hdr_image.as_ref() {
            let unit = self.variant.has_analysis().then_some(self.ui.image_unit);
            self.passthrough
                .execute(&gpu.device, &gpu.queue, &mut encoder, image, unit, hdr);
        }

        self.tone_mapper.execute(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &self.ui.tone_mapping,
            hdr,
            target,
        );

        if let Some(analysis) = self.analysis.as_ref() {
            analysis.execute(&gpu.device, &mut encoder, target);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.frame_timer
            .tick(self.start.elapsed().as_secs_f64());

        if let Some(analysis) = self.analysis.as_ref() {
            match analysis.read_statistics(&gpu.device) {
                Ok(stats) => {
                    self.scale_ceiling = histogram::scale_ceiling(&stats);
                    self.statistics = Some(stats);
                }
                Err(err) => {
                    warn!(error = %err, "statistics readback failed");
                    self.statistics = None;
                }
            }
        }
    }

    /// Build the control window and, when enabled, the histogram window.
    pub fn on_gui_render(
        &mut self,
        ctx: &egui::Context,
        gpu: &GpuContext,
        swap: &mut dyn SwapChain,
    ) {
        let mut events = panels::PanelEvents::default();
        egui::Window::new("Exposure Playground")
            .default_width(design_tokens::CONTROL_PANEL_WIDTH)
            .default_pos(egui::pos2(10.0, 40.0))
            .show(ctx, |ui| {
                events = panels::image_group(ui, self.variant, &mut self.ui, self.last_error.as_deref());
                panels::tone_mapping_group(ui, &mut self.ui.tone_mapping);
                if self.variant.has_analysis() {
                    panels::statistics_group(ui, &mut self.ui);
                }
            });

        if let Some(path) = events.load_path {
            let previous = self.ui.image_path.replace(path);
            if let Err(err) = self.load_image(gpu, swap) {
                self.record_load_error(&err);
                self.ui.image_path = previous;
            }
        } else if events.reload {
            let srgb = self.ui.srgb;
            if let Err(err) = self.reload_with_srgb(gpu, swap, srgb) {
                self.record_load_error(&err);
            }
        }

        self.histogram_window(ctx);
        self.paint_overlay(ctx);
    }

    fn histogram_window(&self, ctx: &egui::Context) {
        let mode = self.ui.histogram_mode;
        if !self.variant.has_analysis() || mode.is_empty() {
            return;
        }
        let Some(target) = self.target.as_ref() else {
            return;
        };

        let fbo_width = target.size()[0] as f32 / ctx.pixels_per_point();
        egui::Window::new("Histogram")
            .fixed_pos(histogram::window_position(fbo_width))
            .fixed_size(histogram::WINDOW_SIZE)
            .show(ctx, |ui| match self.statistics.as_ref() {
                Some(stats) => {
                    histogram::show(ui, stats, mode, self.scale_ceiling, self.ui.graph_scale)
                }
                None => {
                    ui.label("No statistics for this frame");
                }
            });
    }

    fn paint_overlay(&self, ctx: &egui::Context) {
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("playground.overlay"),
        ));
        let style = design_tokens::text_style(design_tokens::TextRole::Overlay);
        painter.text(
            design_tokens::OVERLAY_ORIGIN,
            egui::Align2::LEFT_TOP,
            self.frame_timer.fps_message(),
            design_tokens::font_id(design_tokens::TextRole::Overlay),
            style.color,
        );
    }

    fn record_load_error(&mut self, err: &crate::error::PlaygroundError) {
        warn!(error = %err, "image load failed");
        self.last_error = Some(err.to_string());
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn hdr_image(&self) -> Option<&HdrImage> {
        self.hdr_image.as_ref()
    }

    pub fn hdr_framebuffer(&self) -> Option<&HdrFramebuffer> {
        self.hdr_fbo.as_ref()
    }

    pub fn target(&self) -> Option<&TargetFramebuffer> {
        self.target.as_ref()
    }

    /// Bumped whenever the target framebuffer is replaced.
    pub fn target_generation(&self) -> u64 {
        self.target_generation
    }

    pub fn statistics(&self) -> Option<&StatisticsSnapshot> {
        self.statistics.as_ref()
    }

    /// Log-average luminance of the HDR framebuffer from the last frame.
    pub fn scene_luminance(&self, gpu: &GpuContext) -> Result<LuminanceResult> {
        self.tone_mapper.read_luminance(&gpu.device, &gpu.queue)
    }

    pub fn scale_ceiling(&self) -> f32 {
        self.scale_ceiling
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn fps_message(&self) -> String {
        self.frame_timer.fps_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_swap_chain_records_requests() {
        let mut swap = HeadlessSwapChain::new([64, 32]);
        assert_eq!(swap.size(), [64, 32]);
        swap.resize_swap_chain(4, 4);
        assert_eq!(swap.size(), [4, 4]);
        assert_eq!(swap.resize_requests(), 1);
    }

    #[test]
    fn clear_color_matches_playground_green() {
        let c = hdr_clear_color();
        assert_eq!((c.r, c.g, c.b, c.a), (0.38, 0.52, 0.10, 1.0));
    }
}
