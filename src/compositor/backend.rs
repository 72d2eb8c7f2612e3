//! Texture backend seam between the compositor and the host's GPU

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use super::DamageRect;
use crate::utils::SurfaceError;

/// Opaque name of a texture owned by a [`TextureBackend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(NonZeroU64);

impl TextureHandle {
    /// Allocate a process-unique handle
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }

    /// Numeric id, never zero
    pub fn id(&self) -> u64 {
        self.0.get()
    }
}

/// A texture-like resource the compositor uploads pixels into.
///
/// Every method must be called on the host's render thread. Buffers are
/// row-major with 4 bytes per pixel.
#[cfg_attr(test, mockall::automock)]
pub trait TextureBackend: Send {
    /// Reserve a texture name without allocating storage
    fn create(&mut self) -> Result<TextureHandle, SurfaceError>;

    /// (Re)allocate storage at `width` x `height` and upload the whole `buffer`
    fn upload_full(
        &mut self,
        handle: TextureHandle,
        buffer: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), SurfaceError>;

    /// Upload `src_rect` of `buffer` (rows `stride` pixels wide) with its top-left at `(dst_x, dst_y)`
    fn upload_region(
        &mut self,
        handle: TextureHandle,
        buffer: &[u8],
        stride: u32,
        src_rect: DamageRect,
        dst_x: u32,
        dst_y: u32,
    ) -> Result<(), SurfaceError>;

    /// Release the texture; unknown handles are ignored
    fn destroy(&mut self, handle: TextureHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique_and_nonzero() {
        let a = TextureHandle::next();
        let b = TextureHandle::next();
        assert_ne!(a, b);
        assert!(a.id() > 0 && b.id() > 0);
    }
}
