//! CPU texture backend
//!
//! Keeps the uploaded pixels in memory so they can be inspected, written to
//! an image, or used by hosts without a GPU.

use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::{TextureBackend, TextureHandle};
use super::damage::{check_frame, copy_rect, frame_len, DamageRect, BYTES_PER_PIXEL};
use crate::utils::SurfaceError;

/// A rendered frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Create a new zeroed frame
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; frame_len(width, height)],
        }
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Set pixel at (x, y)
    pub fn set_pixel(&mut self, x: u32, y: u32, bgra: [u8; 4]) {
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.pixels[idx..idx + BYTES_PER_PIXEL].copy_from_slice(&bgra);
    }

    /// Convert the BGRA frame into an RGBA image
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        let mut rgba = self.pixels.clone();
        for px in rgba.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.swap(0, 2);
        }
        image::RgbaImage::from_raw(self.width, self.height, rgba)
    }
}

/// Upload counters, used to tell the full-frame path from the partial path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub allocations: u32,
    pub full_uploads: u32,
    pub region_uploads: u32,
    pub destroyed: u32,
}

#[derive(Debug, Default)]
struct SoftwareState {
    handle: Option<TextureHandle>,
    frame: Option<Frame>,
    stats: UploadStats,
}

/// In-memory texture. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct SoftwareTexture {
    state: Arc<Mutex<SoftwareState>>,
}

impl SoftwareTexture {
    /// Create an empty texture
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SoftwareState> {
        // a poisoned lock still holds valid pixels
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the current texture contents
    pub fn frame(&self) -> Option<Frame> {
        self.lock().frame.clone()
    }

    /// Live handle, if any
    pub fn handle(&self) -> Option<TextureHandle> {
        self.lock().handle
    }

    /// Upload counters so far
    pub fn stats(&self) -> UploadStats {
        self.lock().stats
    }
}

impl SoftwareState {
    fn check_handle(&self, handle: TextureHandle) -> Result<(), SurfaceError> {
        match self.handle {
            Some(live) if live == handle => Ok(()),
            _ => Err(SurfaceError::UnknownHandle(handle.id())),
        }
    }
}

impl TextureBackend for SoftwareTexture {
    fn create(&mut self) -> Result<TextureHandle, SurfaceError> {
        let mut state = self.lock();
        let handle = TextureHandle::next();
        state.handle = Some(handle);
        state.frame = None;
        Ok(handle)
    }

    fn upload_full(
        &mut self,
        handle: TextureHandle,
        buffer: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        state.check_handle(handle)?;
        check_frame(buffer, width, height)?;

        let reallocate = state
            .frame
            .as_ref()
            .is_none_or(|f| f.width != width || f.height != height);
        if reallocate {
            state.frame = Some(Frame::new(width, height));
            state.stats.allocations += 1;
        }
        if let Some(frame) = state.frame.as_mut() {
            let len = frame.pixels.len();
            frame.pixels.copy_from_slice(&buffer[..len]);
        }
        state.stats.full_uploads += 1;
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
        let mut state = self.lock();
        state.check_handle(handle)?;
        let frame = state.frame.as_mut().ok_or(SurfaceError::NotInitialized)?;
        let dst_stride = frame.width;
        if dst_y.saturating_add(src_rect.height) > frame.height {
            return Err(SurfaceError::Backend(format!(
                "region {:?} at ({}, {}) exceeds {}x{} texture",
                src_rect, dst_x, dst_y, frame.width, frame.height
            )));
        }
        copy_rect(
            buffer,
            stride,
            src_rect,
            &mut frame.pixels,
            dst_stride,
            dst_x,
            dst_y,
        )?;
        state.stats.region_uploads += 1;
        Ok(())
    }

    fn destroy(&mut self, handle: TextureHandle) {
        let mut state = self.lock();
        if state.handle == Some(handle) {
            state.handle = None;
            state.frame = None;
            state.stats.destroyed += 1;
        }
    }
}
