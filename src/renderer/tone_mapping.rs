//! Tone mapping: log-average luminance reduction, then an operator pass from
//! the HDR framebuffer into the display-referred target.
//!
//! The CPU functions in this module mirror `tone_mapping.wgsl` and
//! `luminance.wgsl`; tests use them as the reference the GPU output is
//! compared against.

use serde::{Deserialize, Serialize};

use crate::color::luminance;
use crate::error::Result;
use crate::renderer::framebuffer::{HdrFramebuffer, TARGET_FORMAT, TargetFramebuffer};
use crate::renderer::shaders::{self, ShaderLibrary};

/// Exposure key the playground starts with.
pub const DEFAULT_EXPOSURE_KEY: f32 = 0.104;
pub const MIN_LUMINANCE: f32 = 0.0001;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToneMapOperator {
    Clamp,
    Linear,
    Reinhard,
    ReinhardModified,
    HejiHableAlu,
    #[default]
    HableUc2,
}

impl ToneMapOperator {
    pub const ALL: [ToneMapOperator; 6] = [
        ToneMapOperator::Clamp,
        ToneMapOperator::Linear,
        ToneMapOperator::Reinhard,
        ToneMapOperator::ReinhardModified,
        ToneMapOperator::HejiHableAlu,
        ToneMapOperator::HableUc2,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToneMapOperator::Clamp => "Clamp to LDR",
            ToneMapOperator::Linear => "Linear",
            ToneMapOperator::Reinhard => "Reinhard",
            ToneMapOperator::ReinhardModified => "Modified Reinhard",
            ToneMapOperator::HejiHableAlu => "Heji's approximation",
            ToneMapOperator::HableUc2 => "Uncharted 2",
        }
    }

    fn shader_id(self) -> u32 {
        match self {
            ToneMapOperator::Clamp => 0,
            ToneMapOperator::Linear => 1,
            ToneMapOperator::Reinhard => 2,
            ToneMapOperator::ReinhardModified => 3,
            ToneMapOperator::HejiHableAlu => 4,
            ToneMapOperator::HableUc2 => 5,
        }
    }

    pub fn uses_white_max_luminance(self) -> bool {
        matches!(self, ToneMapOperator::Linear | ToneMapOperator::ReinhardModified)
    }

    pub fn uses_white_scale(self) -> bool {
        matches!(self, ToneMapOperator::HableUc2)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMappingSettings {
    pub operator: ToneMapOperator,
    pub exposure_key: f32,
    pub auto_exposure: bool,
    /// Extra exposure in stops, applied on top of auto exposure.
    pub exposure_compensation: f32,
    pub white_max_luminance: f32,
    pub white_scale: f32,
}

impl Default for ToneMappingSettings {
    fn default() -> Self {
        Self {
            operator: ToneMapOperator::HableUc2,
            exposure_key: DEFAULT_EXPOSURE_KEY,
            auto_exposure: true,
            exposure_compensation: 0.0,
            white_max_luminance: 1.0,
            white_scale: 11.2,
        }
    }
}

impl ToneMappingSettings {
    /// Scale applied to HDR values before the operator.
    pub fn exposure(&self, average_luminance: f32) -> f32 {
        let mut scale = self.exposure_compensation.exp2();
        if self.auto_exposure {
            scale *= self.exposure_key / average_luminance.max(MIN_LUMINANCE);
        }
        scale
    }

    /// CPU mirror of the fragment shader: exposure, operator, clamp to 0..=1.
    pub fn apply(&self, color: [f32; 3], average_luminance: f32) -> [f32; 3] {
        let e = self.exposure(average_luminance);
        let exposed = color.map(|c| c * e);
        let mapped = match self.operator {
            ToneMapOperator::Clamp => exposed,
            ToneMapOperator::Linear => {
                let w = self.white_max_luminance.max(MIN_LUMINANCE);
                exposed.map(|c| c / w)
            }
            ToneMapOperator::Reinhard => scale_by_luminance(exposed, |l| l / (1.0 + l)),
            ToneMapOperator::ReinhardModified => {
                let white_sq = self.white_max_luminance * self.white_max_luminance;
                scale_by_luminance(exposed, |l| l * (1.0 + l / white_sq) / (1.0 + l))
            }
            ToneMapOperator::HejiHableAlu => exposed.map(|c| {
                let c = (c - 0.004).max(0.0);
                let gamma_space = (c * (6.2 * c + 0.5)) / (c * (6.2 * c + 1.7) + 0.06);
                gamma_space.powf(2.2)
            }),
            ToneMapOperator::HableUc2 => {
                let white = uc2(self.white_scale);
                exposed.map(|c| uc2(2.0 * c) / white)
            }
        };
        mapped.map(|c| c.clamp(0.0, 1.0))
    }

    fn params(&self) -> ToneParams {
        ToneParams {
            operator_id: self.operator.shader_id(),
            auto_exposure: u32::from(self.auto_exposure),
            exposure_key: self.exposure_key,
            exposure_scale: self.exposure_compensation.exp2(),
            white_max_luminance: self.white_max_luminance.max(MIN_LUMINANCE),
            white_scale: self.white_scale,
            _pad: [0.0; 2],
        }
    }
}

fn scale_by_luminance(color: [f32; 3], curve: impl Fn(f32) -> f32) -> [f32; 3] {
    let l = luminance(color);
    if l <= 0.0 {
        return [0.0; 3];
    }
    let k = curve(l) / l;
    color.map(|c| c * k)
}

fn uc2(x: f32) -> f32 {
    let (a, b, c, d, e, f) = (0.22, 0.3, 0.1, 0.2, 0.01, 0.3);
    ((x * (a * x + c * b) + d * e) / (x * (a * x + b) + d * f)) - e / f
}

/// CPU mirror of `luminance.wgsl`: exp2 of the mean log2 luminance.
pub fn log_average_luminance(pixels: impl IntoIterator<Item = [f32; 3]>) -> f32 {
    let (sum, count) = pixels.into_iter().fold((0.0f64, 0u64), |(sum, n), px| {
        (sum + luminance(px).max(MIN_LUMINANCE).log2() as f64, n + 1)
    });
    (sum / count.max(1) as f64).exp2() as f32
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ToneParams {
    operator_id: u32,
    auto_exposure: u32,
    exposure_key: f32,
    exposure_scale: f32,
    white_max_luminance: f32,
    white_scale: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LuminanceResult {
    pub log_average: f32,
    pub average: f32,
    pub pixel_count: u32,
    _pad: u32,
}

const LUMINANCE_RESULT_SIZE: u64 = std::mem::size_of::<LuminanceResult>() as u64;

pub struct ToneMapper {
    luminance_pipeline: wgpu::ComputePipeline,
    luminance_bind_group_layout: wgpu::BindGroupLayout,
    tone_pipeline: wgpu::RenderPipeline,
    tone_bind_group_layout: wgpu::BindGroupLayout,
    luminance_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
}

impl ToneMapper {
    pub fn new(device: &wgpu::Device, shaders: &ShaderLibrary) -> Result<Self> {
        let luminance_shader = shaders.load_module(device, shaders::LUMINANCE)?;
        let tone_shader = shaders.load_module(device, shaders::TONE_MAPPING)?;

        let hdr_texture_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let luminance_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("playground.tone.luminance.bgl"),
                entries: &[
                    hdr_texture_entry(wgpu::ShaderStages::COMPUTE),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let luminance_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("playground.tone.luminance.layout"),
                bind_group_layouts: &[&luminance_bind_group_layout],
                push_constant_ranges: &[],
            });

        let luminance_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("playground.tone.luminance.pipeline"),
            layout: Some(&luminance_pipeline_layout),
            module: &luminance_shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let tone_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("playground.tone.bgl"),
                entries: &[
                    hdr_texture_entry(wgpu::ShaderStages::FRAGMENT),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let tone_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("playground.tone.layout"),
            bind_group_layouts: &[&tone_bind_group_layout],
            push_constant_ranges: &[],
        });

        let tone_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("playground.tone.pipeline"),
            layout: Some(&tone_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &tone_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &tone_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let luminance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("playground.tone.luminance"),
            size: LUMINANCE_RESULT_SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("playground.tone.params"),
            size: std::mem::size_of::<ToneParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            luminance_pipeline,
            luminance_bind_group_layout,
            tone_pipeline,
            tone_bind_group_layout,
            luminance_buffer,
            params_buffer,
        })
    }

    /// Record the luminance reduction and the operator pass into `encoder`.
    pub fn execute(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        settings: &ToneMappingSettings,
        hdr: &HdrFramebuffer,
        target: &TargetFramebuffer,
    ) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&settings.params()));

        let luminance_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("playground.tone.luminance.bg"),
            layout: &self.luminance_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&hdr.color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.luminance_buffer.as_entire_binding(),
                },
            ],
        });

        let tone_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("playground.tone.bg"),
            layout: &self.tone_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&hdr.color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.luminance_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params_buffer.as_entire_binding(),
                },
            ],
        });

        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("playground.tone.luminance.pass"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.luminance_pipeline);
            cpass.set_bind_group(0, &luminance_bind_group, &[]);
            cpass.dispatch_workgroups(1, 1, 1);
        }

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("playground.tone.pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_pipeline(&self.tone_pipeline);
            rpass.set_bind_group(0, &tone_bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }
    }

    /// Read back the luminance computed by the last submitted frame.
    pub fn read_luminance(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<LuminanceResult> {
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("playground.tone.luminance.readback"),
            size: LUMINANCE_RESULT_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("playground.tone.luminance.readback.encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.luminance_buffer, 0, &readback, 0, LUMINANCE_RESULT_SIZE);
        queue.submit(std::iter::once(encoder.finish()));

        let bytes = crate::gpu::read_buffer(device, &readback, LUMINANCE_RESULT_SIZE, "luminance")?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }
}
