//! Device handles and blocking readback helpers.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{PlaygroundError, Result};

const READBACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Device and queue the playground records into.
///
/// In the windowed app these are clones of eframe's handles; headless runs
/// create their own through [`GpuContext::headless`].
#[derive(Clone, Debug)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    pub fn headless() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| PlaygroundError::NoAdapter(e.to_string()))?;

        info!(adapter = ?adapter.get_info().name, "headless adapter selected");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("exposure-playground.headless"),
            ..Default::default()
        }))
        .map_err(|e| PlaygroundError::RequestDevice(e.to_string()))?;

        Ok(Self { device, queue })
    }
}

/// Map `buffer[..size]` for reading, copy it out and unmap.
///
/// Blocks by polling the device until the map callback fires. Callers must
/// have submitted the commands that fill the buffer beforehand.
pub fn read_buffer(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    size: u64,
    label: &'static str,
) -> Result<Vec<u8>> {
    let slice = buffer.slice(0..size);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    let started = Instant::now();
    let mapped = loop {
        let _ = device.poll(wgpu::PollType::Poll);
        if let Ok(result) = rx.try_recv() {
            break result;
        }
        if started.elapsed() > READBACK_TIMEOUT {
            buffer.unmap();
            return Err(PlaygroundError::Readback {
                label,
                reason: format!("timed out after {READBACK_TIMEOUT:?}"),
            });
        }
        std::thread::sleep(Duration::from_millis(1));
    };

    if let Err(e) = mapped {
        buffer.unmap();
        return Err(PlaygroundError::Readback {
            label,
            reason: e.to_string(),
        });
    }

    let view = slice.get_mapped_range();
    let bytes = view.to_vec();
    drop(view);
    buffer.unmap();
    debug!(label, bytes = bytes.len(), "readback complete");
    Ok(bytes)
}

/// Row pitch satisfying `COPY_BYTES_PER_ROW_ALIGNMENT` for texture→buffer copies.
pub fn padded_bytes_per_row(unpadded: u32) -> u32 {
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_pitch_rounds_up_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(4 * 4), 256);
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(257), 512);
    }
}
