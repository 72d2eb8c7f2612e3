//! GPU texture backend using wgpu

use std::sync::{Arc, Mutex};

use wgpu::{Device, Instance, Queue, RequestDeviceError, TextureFormat, TextureUsages};

use super::backend::{TextureBackend, TextureHandle};
use super::damage::{check_frame, DamageRect, BYTES_PER_PIXEL};
use crate::utils::{GpuError, SurfaceError};

/// Format of the pixel buffers the engine paints
pub const ENGINE_TEXTURE_FORMAT: TextureFormat = TextureFormat::Bgra8Unorm;

/// GPU rendering context
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Option<wgpu::Adapter>,
    pub device: Option<Device>,
    pub queue: Option<Queue>,
}

impl GpuContext {
    /// Create a new GPU context
    pub fn new() -> Self {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        Self {
            instance,
            adapter: None,
            device: None,
            queue: None,
        }
    }

    /// Initialize the GPU context (async)
    pub async fn initialize(&mut self) -> Result<(), GpuError> {
        let adapter = self
            .instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("osr-bridge device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await
            .map_err(|e: RequestDeviceError| GpuError::DeviceCreation(e.to_string()))?;

        log::info!("GPU adapter: {:?}", adapter.get_info().name);
        self.adapter = Some(adapter);
        self.device = Some(device);
        self.queue = Some(queue);

        Ok(())
    }

    /// Check if GPU is initialized
    pub fn is_initialized(&self) -> bool {
        self.device.is_some() && self.queue.is_some()
    }
}

impl Default for GpuContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Texture slot the host samples for presentation
pub type PresentSlot = Arc<Mutex<Option<wgpu::Texture>>>;

struct Allocated {
    handle: TextureHandle,
    texture: Option<wgpu::Texture>,
    width: u32,
    height: u32,
}

/// wgpu-backed surface texture
pub struct WgpuTexture {
    device: Device,
    queue: Queue,
    allocated: Option<Allocated>,
    present: PresentSlot,
}

impl WgpuTexture {
    /// Create a backend on an initialized context
    pub fn new(context: &GpuContext) -> Result<Self, GpuError> {
        let (Some(device), Some(queue)) = (context.device.clone(), context.queue.clone()) else {
            return Err(GpuError::NoAdapter);
        };
        Ok(Self {
            device,
            queue,
            allocated: None,
            present: Arc::new(Mutex::new(None)),
        })
    }

    /// Shared slot holding the texture currently presented
    pub fn present_slot(&self) -> PresentSlot {
        Arc::clone(&self.present)
    }

    fn allocated(&mut self, handle: TextureHandle) -> Result<&mut Allocated, SurfaceError> {
        match self.allocated.as_mut() {
            Some(allocated) if allocated.handle == handle => Ok(allocated),
            _ => Err(SurfaceError::UnknownHandle(handle.id())),
        }
    }

    fn publish(&self, texture: Option<wgpu::Texture>) {
        if let Ok(mut slot) = self.present.lock() {
            *slot = texture;
        }
    }
}

fn texture_extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

impl TextureBackend for WgpuTexture {
    fn create(&mut self) -> Result<TextureHandle, SurfaceError> {
        let handle = TextureHandle::next();
        if let Some(old) = self.allocated.take().and_then(|a| a.texture) {
            old.destroy();
        }
        self.allocated = Some(Allocated {
            handle,
            texture: None,
            width: 0,
            height: 0,
        });
        Ok(handle)
    }

    fn upload_full(
        &mut self,
        handle: TextureHandle,
        buffer: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), SurfaceError> {
        check_frame(buffer, width, height)?;
        let device = self.device.clone();
        let queue = self.queue.clone();
        let allocated = self.allocated(handle)?;

        if allocated.texture.is_none() || allocated.width != width || allocated.height != height {
            if let Some(old) = allocated.texture.take() {
                old.destroy();
            }
            log::debug!("Allocating {}x{} surface texture", width, height);
            allocated.texture = Some(device.create_texture(&wgpu::TextureDescriptor {
                label: Some("osr-bridge surface"),
                size: texture_extent(width, height),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: ENGINE_TEXTURE_FORMAT,
                usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::COPY_SRC,
                view_formats: &[],
            }));
            allocated.width = width;
            allocated.height = height;
        }

        let texture = allocated.texture.clone();
        if let Some(texture) = texture.as_ref() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                buffer,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * BYTES_PER_PIXEL as u32),
                    rows_per_image: Some(height),
                },
                texture_extent(width, height),
            );
        }
        self.publish(texture);
        Ok(())
    }

    fn upload_region(
        &mut self,
        handle: TextureHandle,
        buffer: &[u8],
        stride: u32,
        src_rect: DamageRect,
        dst_x: u32,
        dst_y: u32,
    ) -> Result<(), SurfaceError> {
        if src_rect.is_empty() {
            return Ok(());
        }
        let queue = self.queue.clone();
        let allocated = self.allocated(handle)?;
        let texture = allocated.texture.as_ref().ok_or(SurfaceError::NotInitialized)?;

        // wgpu reports out-of-bounds copies through its error handler, so
        // everything is validated here first
        let dst = DamageRect::new(dst_x, dst_y, src_rect.width, src_rect.height);
        if dst.right() > allocated.width || dst.bottom() > allocated.height {
            return Err(SurfaceError::Backend(format!(
                "region {:?} exceeds {}x{} texture",
                dst, allocated.width, allocated.height
            )));
        }
        if src_rect.right() > stride || src_rect.end_offset(stride) > buffer.len() {
            return Err(SurfaceError::BufferTooSmall {
                width: stride,
                height: src_rect.bottom(),
                expected: src_rect.end_offset(stride),
                actual: buffer.len(),
            });
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: dst_x,
                    y: dst_y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            buffer,
            wgpu::TexelCopyBufferLayout {
                offset: src_rect.start_offset(stride) as u64,
                bytes_per_row: Some(stride * BYTES_PER_PIXEL as u32),
                rows_per_image: None,
            },
            texture_extent(src_rect.width, src_rect.height),
        );
        Ok(())
    }

    fn destroy(&mut self, handle: TextureHandle) {
        if self.allocated.as_ref().is_some_and(|a| a.handle == handle) {
            if let Some(texture) = self.allocated.take().and_then(|a| a.texture) {
                texture.destroy();
            }
            self.publish(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_context_creation() {
        let context = GpuContext::new();
        assert!(!context.is_initialized());
    }

    #[test]
    fn test_texture_requires_initialized_context() {
        let context = GpuContext::new();
        assert!(matches!(WgpuTexture::new(&context), Err(GpuError::NoAdapter)));
    }
}
