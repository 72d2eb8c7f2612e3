//! Damage rectangles and row-major pixel copies
//!
//! All buffers handled here are tightly packed, row-major, 4 bytes per pixel.

use crate::utils::SurfaceError;

/// Bytes per pixel of every buffer the engine delivers
pub const BYTES_PER_PIXEL: usize = 4;

/// A rectangle of changed pixels in surface-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DamageRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DamageRect {
    /// Create a new rectangle
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` surface
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Check if rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Number of pixels covered
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check if a pixel lies inside the rectangle
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlapping part of two rectangles, if any
    pub fn intersection(&self, other: &DamageRect) -> Option<DamageRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(DamageRect::new(x, y, right - x, bottom - y))
    }

    /// Smallest rectangle holding both
    pub fn union(&self, other: &DamageRect) -> DamageRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        DamageRect::new(x, y, right - x, bottom - y)
    }

    /// Shift by a positive offset
    pub fn offset(&self, dx: u32, dy: u32) -> DamageRect {
        DamageRect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Byte offset of the rectangle's first pixel in a buffer `stride` pixels wide
    pub fn start_offset(&self, stride: u32) -> usize {
        (self.y as usize * stride as usize + self.x as usize) * BYTES_PER_PIXEL
    }

    /// Byte offset one past the rectangle's last pixel in a buffer `stride` pixels wide
    pub fn end_offset(&self, stride: u32) -> usize {
        if self.is_empty() {
            return self.start_offset(stride);
        }
        let last_row = (self.bottom() - 1) as usize;
        (last_row * stride as usize + self.right() as usize) * BYTES_PER_PIXEL
    }
}

/// Bytes needed for a `width` x `height` buffer
pub fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

/// Fail unless `buffer` holds at least a full `width` x `height` frame
pub fn check_frame(buffer: &[u8], width: u32, height: u32) -> Result<(), SurfaceError> {
    let expected = frame_len(width, height);
    if buffer.len() < expected {
        return Err(SurfaceError::BufferTooSmall {
            width,
            height,
            expected,
            actual: buffer.len(),
        });
    }
    Ok(())
}

/// Copy the pixels of `src_rect` from `src` into `dst` with its top-left at `(dst_x, dst_y)`.
///
/// `src_stride` and `dst_stride` are row widths in pixels.
pub fn copy_rect(
    src: &[u8],
    src_stride: u32,
    src_rect: DamageRect,
    dst: &mut [u8],
    dst_stride: u32,
    dst_x: u32,
    dst_y: u32,
) -> Result<(), SurfaceError> {
    if src_rect.is_empty() {
        return Ok(());
    }
    let dst_rect = DamageRect::new(dst_x, dst_y, src_rect.width, src_rect.height);
    if src_rect.right() > src_stride || dst_rect.right() > dst_stride {
        return Err(SurfaceError::Backend(format!(
            "rectangle {:?} exceeds row width",
            src_rect
        )));
    }
    for (buffer, rect, stride) in [(src.len(), src_rect, src_stride), (dst.len(), dst_rect, dst_stride)]
    {
        if rect.end_offset(stride) > buffer {
            return Err(SurfaceError::BufferTooSmall {
                width: stride,
                height: rect.bottom(),
                expected: rect.end_offset(stride),
                actual: buffer,
            });
        }
    }

    let row_bytes = src_rect.width as usize * BYTES_PER_PIXEL;
    for row in 0..src_rect.height {
        let from = DamageRect::new(src_rect.x, src_rect.y + row, 0, 0).start_offset(src_stride);
        let to = DamageRect::new(dst_x, dst_y + row, 0, 0).start_offset(dst_stride);
        dst[to..to + row_bytes].copy_from_slice(&src[from..from + row_bytes]);
    }
    Ok(())
}

/// Byte range `[start, end)` touched by `regions` in a buffer `stride` pixels wide.
///
/// Returns `None` when no region covers a pixel.
pub fn touched_range(regions: &[DamageRect], stride: u32) -> Option<(usize, usize)> {
    regions
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| (r.start_offset(stride), r.end_offset(stride)))
        .reduce(|(start, end), (s, e)| (start.min(s), end.max(e)))
}

/// Copy `src[start..end]` into `dst[start..end]`, clamped to both buffers.
///
/// Returns the number of bytes copied.
pub fn copy_range(src: &[u8], dst: &mut [u8], start: usize, end: usize) -> usize {
    let end = end.min(src.len()).min(dst.len());
    if end <= start {
        return 0;
    }
    dst[start..end].copy_from_slice(&src[start..end]);
    end - start
}
