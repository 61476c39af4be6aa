//! eframe shell: forwards window events to the [`Playground`] hooks and shows
//! the target framebuffer as an egui native texture.

use eframe::{egui, egui_wgpu};
use tracing::debug;

use super::{Playground, SwapChain};
use crate::config::Config;
use crate::error::{PlaygroundError, Result};
use crate::gpu::GpuContext;

/// Swap chain backed by the native window; resizes go through a viewport
/// command and come back as a new canvas size next frame.
struct EguiSwapChain<'a> {
    ctx: &'a egui::Context,
    size: [u32; 2],
}

impl SwapChain for EguiSwapChain<'_> {
    fn size(&self) -> [u32; 2] {
        self.size
    }

    fn resize_swap_chain(&mut self, width: u32, height: u32) {
        let ppp = self.ctx.pixels_per_point();
        debug!(width, height, "requesting window resize");
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
                width as f32 / ppp,
                height as f32 / ppp,
            )));
        self.size = [width, height];
    }
}

pub fn target_sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("playground.target.sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    }
}

/// Physical pixel size of a canvas of `size` points.
pub fn canvas_pixel_size(size: egui::Vec2, pixels_per_point: f32) -> [u32; 2] {
    [
        (size.x * pixels_per_point).round().max(1.0) as u32,
        (size.y * pixels_per_point).round().max(1.0) as u32,
    ]
}

pub struct PlaygroundApp {
    gpu: GpuContext,
    playground: Playground,
    texture_id: Option<egui::TextureId>,
    registered_generation: Option<u64>,
    canvas_size: [u32; 2],
}

impl PlaygroundApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &Config) -> Result<Self> {
        let render_state = cc.wgpu_render_state.as_ref().ok_or_else(|| {
            PlaygroundError::NoAdapter("eframe started without a wgpu render state".to_owned())
        })?;
        let gpu = GpuContext::new(render_state.device.clone(), render_state.queue.clone());

        let mut swap = EguiSwapChain {
            ctx: &cc.egui_ctx,
            size: [config.window.width, config.window.height],
        };
        let playground = Playground::on_load(&gpu, config, &mut swap)?;

        Ok(Self {
            gpu,
            playground,
            texture_id: None,
            registered_generation: None,
            canvas_size: [0, 0],
        })
    }

    fn sync_target_texture(&mut self, render_state: &egui_wgpu::RenderState) {
        let Some(target) = self.playground.target() else {
            return;
        };
        let generation = self.playground.target_generation();
        if self.registered_generation == Some(generation) {
            return;
        }

        let mut renderer = render_state.renderer.write();
        if let Some(id) = self.texture_id {
            renderer.update_egui_texture_from_wgpu_texture_with_sampler_options(
                &render_state.device,
                &target.view,
                target_sampler_descriptor(),
                id,
            );
        } else {
            self.texture_id = Some(renderer.register_native_texture_with_sampler_options(
                &render_state.device,
                &target.view,
                target_sampler_descriptor(),
            ));
        }
        self.registered_generation = Some(generation);
    }
}

impl eframe::App for PlaygroundApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let Some(render_state) = frame.wgpu_render_state() else {
            return;
        };
        ctx.set_visuals(egui::Visuals::dark());

        let ppp = ctx.pixels_per_point();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let size = canvas_pixel_size(rect.size(), ppp);
                if size != self.canvas_size {
                    self.canvas_size = size;
                    self.playground
                        .on_resize_swap_chain(&self.gpu, size[0], size[1]);
                }

                self.playground.on_frame_render(&self.gpu);
                self.sync_target_texture(render_state);

                if let Some(id) = self.texture_id {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    ui.painter().image(id, rect, uv, egui::Color32::WHITE);
                }
            });

        let mut swap = EguiSwapChain {
            ctx,
            size: self.canvas_size,
        };
        self.playground.on_gui_render(ctx, &self.gpu, &mut swap);

        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_size_scales_by_pixels_per_point() {
        assert_eq!(canvas_pixel_size(egui::vec2(640.0, 360.0), 2.0), [1280, 720]);
        assert_eq!(canvas_pixel_size(egui::vec2(100.4, 99.6), 1.0), [100, 100]);
    }

    #[test]
    fn canvas_size_never_collapses_to_zero() {
        assert_eq!(canvas_pixel_size(egui::vec2(0.0, 0.0), 1.5), [1, 1]);
    }
}
