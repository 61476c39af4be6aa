//! Image analysis: per-channel samples of the tone-mapped target.
//!
//! The kernel runs as a single 16×16 workgroup (dispatch 1×1×1). Each
//! invocation owns one of 256 grid tiles and writes the mean display-encoded
//! value (0..=255) of its tile for luminance, R, G and B.

use serde::Serialize;

use crate::error::{PlaygroundError, Result};
use crate::renderer::framebuffer::TargetFramebuffer;
use crate::renderer::shaders::{self, ShaderLibrary};
use crate::state::HistogramMode;

pub const SAMPLES_PER_CHANNEL: usize = 256;
pub const CHANNEL_COUNT: usize = 4;
pub const STATS_LEN: usize = SAMPLES_PER_CHANNEL * CHANNEL_COUNT;
const STATS_BYTES: u64 = (STATS_LEN * std::mem::size_of::<i32>()) as u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Luminance,
    R,
    G,
    B,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Luminance, Channel::R, Channel::G, Channel::B];

    /// Offset of the channel's first sample in the statistics buffer.
    pub fn offset(self) -> usize {
        let index = match self {
            Channel::Luminance => 0,
            Channel::R => 1,
            Channel::G => 2,
            Channel::B => 3,
        };
        index * SAMPLES_PER_CHANNEL
    }

    pub fn flag(self) -> HistogramMode {
        match self {
            Channel::Luminance => HistogramMode::LUMINANCE,
            Channel::R => HistogramMode::R,
            Channel::G => HistogramMode::G,
            Channel::B => HistogramMode::B,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Luminance => "Luminance",
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
        }
    }
}

/// Host copy of one frame's statistics buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    samples: Vec<i32>,
}

impl StatisticsSnapshot {
    /// Build from a flat `[luminance | r | g | b]` array; must be `STATS_LEN` long.
    pub fn from_samples(samples: Vec<i32>) -> Option<Self> {
        (samples.len() == STATS_LEN).then_some(Self { samples })
    }

    pub fn from_channels(channels: [&[i32]; CHANNEL_COUNT]) -> Option<Self> {
        let samples: Vec<i32> = channels.concat();
        Self::from_samples(samples)
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let samples = bytes
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::from_samples(samples)
    }

    pub fn channel(&self, channel: Channel) -> &[i32] {
        let start = channel.offset();
        &self.samples[start..start + SAMPLES_PER_CHANNEL]
    }
}

pub struct ImageAnalysisPass {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    stats_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
}

impl ImageAnalysisPass {
    pub fn new(device: &wgpu::Device, shaders: &ShaderLibrary) -> Result<Self> {
        let shader = shaders.load_module(device, shaders::IMAGE_ANALYSIS)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("playground.analysis.bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("playground.analysis.layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("playground.analysis.pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let stats_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("playground.analysis.stats"),
            size: STATS_BYTES,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("playground.analysis.stats.readback"),
            size: STATS_BYTES,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
            stats_buffer,
            readback_buffer,
        })
    }

    /// Record: clear the statistics, dispatch 1×1×1 over `target`, copy the
    /// result into the readback buffer.
    pub fn execute(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        target: &TargetFramebuffer,
    ) {
        encoder.clear_buffer(&self.stats_buffer, 0, None);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("playground.analysis.bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.stats_buffer.as_entire_binding(),
                },
            ],
        });

        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("playground.analysis.pass"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.pipeline);
            cpass.set_bind_group(0, &bind_group, &[]);
            cpass.dispatch_workgroups(1, 1, 1);
        }

        encoder.copy_buffer_to_buffer(&self.stats_buffer, 0, &self.readback_buffer, 0, STATS_BYTES);
    }

    /// Map the readback buffer, copy the samples out and unmap.
    pub fn read_statistics(&self, device: &wgpu::Device) -> Result<StatisticsSnapshot> {
        let bytes = crate::gpu::read_buffer(device, &self.readback_buffer, STATS_BYTES, "statistics")?;
        StatisticsSnapshot::from_bytes(&bytes).ok_or(PlaygroundError::Readback {
            label: "statistics",
            reason: format!("expected {STATS_BYTES} bytes, got {}", bytes.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_offsets_are_contiguous_blocks() {
        let offsets: Vec<usize> = Channel::ALL.iter().map(|c| c.offset()).collect();
        assert_eq!(offsets, vec![0, 256, 512, 768]);
    }

    #[test]
    fn snapshot_slices_channels() {
        let lum = vec![1; SAMPLES_PER_CHANNEL];
        let r = vec![2; SAMPLES_PER_CHANNEL];
        let g = vec![3; SAMPLES_PER_CHANNEL];
        let b = vec![4; SAMPLES_PER_CHANNEL];
        let snapshot = StatisticsSnapshot::from_channels([&lum, &r, &g, &b]).unwrap();
        assert!(snapshot.channel(Channel::G).iter().all(|&v| v == 3));
        assert_eq!(snapshot.channel(Channel::B).len(), SAMPLES_PER_CHANNEL);
    }

    #[test]
    fn snapshot_rejects_wrong_length() {
        assert!(StatisticsSnapshot::from_samples(vec![0; 10]).is_none());
    }

    #[test]
    fn snapshot_decodes_little_endian_words() {
        let mut bytes = vec![0u8; STATS_BYTES as usize];
        bytes[256 * 4..256 * 4 + 4].copy_from_slice(&(-7i32).to_le_bytes());
        let snapshot = StatisticsSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(snapshot.channel(Channel::R)[0], -7);
        assert_eq!(snapshot.channel(Channel::Luminance)[0], 0);
    }
}
