//! Popup overlay layer (dropdowns, select boxes)
//!
//! The engine only guarantees the popup's pixel buffer during its paint
//! callback, so the overlay keeps its own copy for later recomposition.

use super::damage::{copy_range, frame_len, touched_range, DamageRect};

/// Retained state of the popup layer
#[derive(Debug, Clone, Default)]
pub struct PopupOverlay {
    bounds: Option<DamageRect>,
    pixels: Vec<u8>,
    visible: bool,
    drawn: bool,
    stale: bool,
}

impl PopupOverlay {
    /// Create an overlay with no geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Popup rectangle in surface coordinates
    pub fn bounds(&self) -> Option<DamageRect> {
        self.bounds
    }

    /// Retained popup pixels, `width * height * 4` bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the retained buffer has been populated since the last geometry change
    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    /// Whether overlay pixels from before the last hide are still on the texture
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Show or hide the popup. Hiding a drawn popup leaves its pixels on
    /// the texture until the next primary paint erases them.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            self.stale = false;
        } else {
            self.stale |= self.drawn;
            self.drawn = false;
        }
    }

    /// Replace the geometry and allocate a fresh buffer for it
    pub fn set_geometry(&mut self, bounds: DamageRect) {
        self.bounds = Some(bounds);
        self.pixels = vec![0; frame_len(bounds.width, bounds.height)];
        self.drawn = false;
        self.stale = false;
    }

    /// Copy the bytes touched by `regions` from the transient engine `buffer`.
    ///
    /// Only the range between the first and last touched byte is copied,
    /// with the popup's own width as the row stride. Returns the bytes copied.
    pub fn retain(&mut self, buffer: &[u8], regions: &[DamageRect]) -> usize {
        let Some(bounds) = self.bounds else {
            return 0;
        };
        let copied = touched_range(regions, bounds.width)
            .map(|(start, end)| copy_range(buffer, &mut self.pixels, start, end))
            .unwrap_or(0);
        self.drawn = true;
        copied
    }

    /// Drop the retained buffer and geometry
    pub fn discard(&mut self) {
        self.bounds = None;
        self.pixels = Vec::new();
        self.drawn = false;
        self.stale = false;
    }

    /// Whether a primary repaint has to touch the popup area
    pub fn needs_recomposite(&self) -> bool {
        self.bounds.is_some() && (self.visible || self.drawn || self.stale)
    }

    /// Hidden with overlay pixels left to erase
    pub fn needs_erase(&self) -> bool {
        !self.visible && (self.drawn || self.stale)
    }
}
