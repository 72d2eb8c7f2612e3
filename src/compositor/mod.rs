//! Surface compositor
//!
//! Reconciles the engine's two damage layers, the primary page and the popup
//! overlay, into a single presentable texture. Pixel buffers are BGRA,
//! row-major, 4 bytes per pixel.

mod backend;
mod damage;
mod gpu;
mod popup;
mod software;

pub use backend::{TextureBackend, TextureHandle};
#[cfg(test)]
pub use backend::MockTextureBackend;
pub use damage::{
    check_frame, copy_range, copy_rect, frame_len, touched_range, DamageRect, BYTES_PER_PIXEL,
};
pub use gpu::{GpuContext, PresentSlot, WgpuTexture, ENGINE_TEXTURE_FORMAT};
pub use popup::PopupOverlay;
pub use software::{Frame, SoftwareTexture, UploadStats};

use crate::utils::SurfaceError;

/// Texture plus the dimensions it was last allocated with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Surface {
    pub handle: Option<TextureHandle>,
    pub width: u32,
    pub height: u32,
    pub initialized: bool,
}

/// Compositor for the primary page and popup layers
pub struct SurfaceCompositor {
    backend: Box<dyn TextureBackend>,
    surface: Surface,
    popup: PopupOverlay,
}

impl SurfaceCompositor {
    /// Create a compositor; call [`initialize`](Self::initialize) on the render thread before painting
    pub fn new(backend: Box<dyn TextureBackend>) -> Self {
        Self {
            backend,
            surface: Surface::default(),
            popup: PopupOverlay::new(),
        }
    }

    /// Reserve the texture. Must run on the render thread.
    pub fn initialize(&mut self) -> Result<(), SurfaceError> {
        if self.surface.initialized {
            return Ok(());
        }
        let handle = self.backend.create()?;
        self.surface = Surface {
            handle: Some(handle),
            width: 0,
            height: 0,
            initialized: true,
        };
        log::debug!("Surface texture {} created", handle.id());
        Ok(())
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn popup(&self) -> &PopupOverlay {
        &self.popup
    }

    /// Handle the host samples for presentation
    pub fn handle(&self) -> Option<TextureHandle> {
        self.surface.handle
    }

    fn live_handle(&self) -> Result<TextureHandle, SurfaceError> {
        match self.surface.handle {
            Some(handle) if self.surface.initialized => Ok(handle),
            _ => Err(SurfaceError::NotInitialized),
        }
    }

    /// Apply a paint of the primary page layer.
    ///
    /// A size change reallocates the texture and uploads the whole buffer;
    /// otherwise only `regions` are uploaded.
    pub fn apply_primary_damage(
        &mut self,
        buffer: &[u8],
        width: u32,
        height: u32,
        regions: &[DamageRect],
    ) -> Result<(), SurfaceError> {
        if regions.is_empty() {
            return Ok(());
        }
        let handle = self.live_handle()?;
        check_frame(buffer, width, height)?;

        if width != self.surface.width || height != self.surface.height {
            if width == 0 || height == 0 {
                log::trace!("Skipping upload of empty {}x{} frame", width, height);
                self.surface.width = width;
                self.surface.height = height;
                return Ok(());
            }
            log::debug!("Surface resized to {}x{}, uploading full frame", width, height);
            self.backend.upload_full(handle, buffer, width, height)?;
            self.surface.width = width;
            self.surface.height = height;
        } else {
            let bounds = DamageRect::full(width, height);
            for region in regions {
                if let Some(rect) = region.intersection(&bounds) {
                    self.backend
                        .upload_region(handle, buffer, width, rect, rect.x, rect.y)?;
                }
            }
        }

        self.recomposite_popup(handle, buffer, width)
    }

    /// Restore or redraw the popup area after a primary update
    fn recomposite_popup(
        &mut self,
        handle: TextureHandle,
        primary: &[u8],
        stride: u32,
    ) -> Result<(), SurfaceError> {
        if !self.popup.needs_recomposite() {
            return Ok(());
        }
        let Some(bounds) = self.popup.bounds() else {
            return Ok(());
        };
        let visible_area = bounds.intersection(&DamageRect::full(self.surface.width, self.surface.height));

        if self.popup.needs_erase() {
            // erase the closed overlay with page content
            if let Some(area) = visible_area {
                self.backend
                    .upload_region(handle, primary, stride, area, area.x, area.y)?;
            }
            self.popup.discard();
        } else if self.popup.is_drawn() {
            if let Some(area) = visible_area {
                let src = DamageRect::new(area.x - bounds.x, area.y - bounds.y, area.width, area.height);
                self.backend
                    .upload_region(handle, self.popup.pixels(), bounds.width, src, area.x, area.y)?;
            }
        }
        Ok(())
    }

    /// The engine showed or hid the popup
    pub fn on_popup_show(&mut self, visible: bool) {
        self.popup.set_visible(visible);
    }

    /// The engine moved or resized the popup
    pub fn on_popup_geometry(&mut self, bounds: DamageRect) {
        self.popup.set_geometry(bounds);
    }

    /// Apply a paint of the popup layer.
    ///
    /// `buffer` is `width` x `height`, the popup's own size; `regions` are popup-local.
    pub fn apply_popup_damage(
        &mut self,
        buffer: &[u8],
        width: u32,
        height: u32,
        regions: &[DamageRect],
    ) -> Result<(), SurfaceError> {
        if regions.is_empty() {
            return Ok(());
        }
        let handle = self.live_handle()?;
        let bounds = self.popup.bounds().ok_or(SurfaceError::NoPopupGeometry)?;
        if bounds.width != width || bounds.height != height {
            return Err(SurfaceError::Backend(format!(
                "popup paint is {}x{} but geometry is {}x{}",
                width, height, bounds.width, bounds.height
            )));
        }
        check_frame(buffer, width, height)?;

        // the engine buffer is gone after this call, so retain before any upload can fail
        let retained = self.popup.retain(buffer, regions);
        log::trace!("Retained {} popup bytes", retained);

        let surface_rect = DamageRect::full(self.surface.width, self.surface.height);
        let popup_rect = DamageRect::full(width, height);
        for region in regions {
            let Some(dst) = region
                .intersection(&popup_rect)
                .and_then(|local| local.offset(bounds.x, bounds.y).intersection(&surface_rect))
            else {
                continue;
            };
            let src = DamageRect::new(dst.x - bounds.x, dst.y - bounds.y, dst.width, dst.height);
            self.backend
                .upload_region(handle, buffer, width, src, dst.x, dst.y)?;
        }
        Ok(())
    }

    /// Release the texture and popup buffer. Returns `false` if already released.
    pub fn release(&mut self) -> bool {
        self.popup.discard();
        let released = match self.surface.handle.take() {
            Some(handle) => {
                self.backend.destroy(handle);
                log::debug!("Surface texture {} released", handle.id());
                true
            }
            None => false,
        };
        self.surface = Surface::default();
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> Vec<u8> {
        vec![value; frame_len(width, height)]
    }

    fn compositor() -> (SurfaceCompositor, SoftwareTexture) {
        let texture = SoftwareTexture::new();
        let mut compositor = SurfaceCompositor::new(Box::new(texture.clone()));
        compositor.initialize().unwrap();
        (compositor, texture)
    }

    #[test]
    fn test_empty_damage_is_noop() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(4, 4, 1), 4, 4, &[])
            .unwrap();
        assert_eq!(texture.stats(), UploadStats::default());
        assert_eq!(compositor.surface().width, 0);
    }

    #[test]
    fn test_uninitialized_surface_is_rejected() {
        let texture = SoftwareTexture::new();
        let mut compositor = SurfaceCompositor::new(Box::new(texture.clone()));
        let result = compositor.apply_primary_damage(&solid(4, 4, 1), 4, 4, &[DamageRect::full(4, 4)]);
        assert_eq!(result, Err(SurfaceError::NotInitialized));
        assert_eq!(compositor.surface().width, 0);
    }

    #[test]
    fn test_resize_takes_full_path_and_ignores_regions() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(8, 6, 3), 8, 6, &[DamageRect::new(0, 0, 1, 1)])
            .unwrap();

        let stats = texture.stats();
        assert_eq!(stats.full_uploads, 1);
        assert_eq!(stats.region_uploads, 0);
        assert_eq!(texture.frame().unwrap().pixels, solid(8, 6, 3));
        assert_eq!((compositor.surface().width, compositor.surface().height), (8, 6));
    }

    #[test]
    fn test_partial_damage_only_touches_regions() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(4, 4, 0), 4, 4, &[DamageRect::full(4, 4)])
            .unwrap();
        compositor
            .apply_primary_damage(&solid(4, 4, 9), 4, 4, &[DamageRect::new(1, 1, 2, 1)])
            .unwrap();

        let frame = texture.frame().unwrap();
        assert_eq!(frame.get_pixel(1, 1), [9; 4]);
        assert_eq!(frame.get_pixel(2, 1), [9; 4]);
        assert_eq!(frame.get_pixel(0, 1), [0; 4]);
        assert_eq!(frame.get_pixel(1, 2), [0; 4]);
        assert_eq!(texture.stats().allocations, 1);
    }

    #[test]
    fn test_popup_damage_is_composited_and_retained() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(6, 6, 0), 6, 6, &[DamageRect::full(6, 6)])
            .unwrap();
        compositor.on_popup_geometry(DamageRect::new(2, 2, 2, 2));
        compositor.on_popup_show(true);
        compositor
            .apply_popup_damage(&solid(2, 2, 5), 2, 2, &[DamageRect::full(2, 2)])
            .unwrap();

        assert!(compositor.popup().is_drawn());
        assert_eq!(compositor.popup().pixels(), solid(2, 2, 5).as_slice());
        let frame = texture.frame().unwrap();
        assert_eq!(frame.get_pixel(2, 2), [5; 4]);
        assert_eq!(frame.get_pixel(3, 3), [5; 4]);
        assert_eq!(frame.get_pixel(1, 1), [0; 4]);
    }

    #[test]
    fn test_visible_popup_survives_primary_repaint() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(6, 6, 0), 6, 6, &[DamageRect::full(6, 6)])
            .unwrap();
        compositor.on_popup_geometry(DamageRect::new(2, 2, 2, 2));
        compositor.on_popup_show(true);
        compositor
            .apply_popup_damage(&solid(2, 2, 5), 2, 2, &[DamageRect::full(2, 2)])
            .unwrap();

        // page repaints everything underneath the popup
        compositor
            .apply_primary_damage(&solid(6, 6, 1), 6, 6, &[DamageRect::full(6, 6)])
            .unwrap();

        let frame = texture.frame().unwrap();
        assert_eq!(frame.get_pixel(2, 2), [5; 4]);
        assert_eq!(frame.get_pixel(0, 0), [1; 4]);
    }

    #[test]
    fn test_hidden_drawn_popup_is_erased_with_primary() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(6, 6, 0), 6, 6, &[DamageRect::full(6, 6)])
            .unwrap();
        compositor.on_popup_geometry(DamageRect::new(2, 2, 2, 2));
        compositor.on_popup_show(false);
        compositor
            .apply_popup_damage(&solid(2, 2, 5), 2, 2, &[DamageRect::full(2, 2)])
            .unwrap();
        assert!(compositor.popup().is_drawn());

        compositor
            .apply_primary_damage(&solid(6, 6, 1), 6, 6, &[DamageRect::new(0, 0, 1, 1)])
            .unwrap();

        let frame = texture.frame().unwrap();
        assert_eq!(frame.get_pixel(2, 2), [1; 4]);
        assert_eq!(frame.get_pixel(5, 5), [0; 4]);
        assert!(compositor.popup().bounds().is_none());
        assert!(compositor.popup().pixels().is_empty());
    }

    #[test]
    fn test_closing_drawn_popup_erases_it_on_next_primary_paint() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(10, 10, 0), 10, 10, &[DamageRect::full(10, 10)])
            .unwrap();
        compositor.on_popup_geometry(DamageRect::new(4, 4, 4, 4));
        compositor.on_popup_show(true);
        compositor
            .apply_popup_damage(&solid(4, 4, 7), 4, 4, &[DamageRect::full(4, 4)])
            .unwrap();
        assert_eq!(texture.frame().unwrap().get_pixel(5, 5), [7; 4]);

        compositor.on_popup_show(false);
        // damage far away from the popup still clears it
        compositor
            .apply_primary_damage(&solid(10, 10, 0), 10, 10, &[DamageRect::new(0, 0, 1, 1)])
            .unwrap();

        let frame = texture.frame().unwrap();
        assert_eq!(frame.get_pixel(4, 4), [0; 4]);
        assert_eq!(frame.get_pixel(7, 7), [0; 4]);
        assert!(compositor.popup().bounds().is_none());
        assert!(compositor.popup().pixels().is_empty());
        assert!(!compositor.popup().needs_recomposite());
    }

    #[test]
    fn test_popup_hidden_before_paint_is_left_alone() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(6, 6, 0), 6, 6, &[DamageRect::full(6, 6)])
            .unwrap();
        compositor.on_popup_geometry(DamageRect::new(2, 2, 2, 2));
        compositor.on_popup_show(true);
        compositor.on_popup_show(false);

        let before = texture.stats().region_uploads;
        compositor
            .apply_primary_damage(&solid(6, 6, 1), 6, 6, &[DamageRect::new(0, 0, 1, 1)])
            .unwrap();

        assert_eq!(texture.stats().region_uploads, before + 1);
        assert_eq!(texture.frame().unwrap().get_pixel(2, 2), [0; 4]);
        assert!(compositor.popup().bounds().is_some());
    }

    fn mock_backend() -> MockTextureBackend {
        let mut backend = MockTextureBackend::new();
        let handle = TextureHandle::next();
        backend.expect_create().times(1).returning(move || Ok(handle));
        backend
    }

    #[test]
    fn test_failed_full_upload_keeps_previous_size() {
        let mut backend = mock_backend();
        let mut seq = mockall::Sequence::new();
        backend
            .expect_upload_full()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Err(SurfaceError::Backend("out of memory".into())));
        backend
            .expect_upload_full()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));
        backend.expect_upload_region().times(0);

        let mut compositor = SurfaceCompositor::new(Box::new(backend));
        compositor.initialize().unwrap();

        let buffer = solid(4, 4, 1);
        let result = compositor.apply_primary_damage(&buffer, 4, 4, &[DamageRect::full(4, 4)]);
        assert!(matches!(result, Err(SurfaceError::Backend(_))));
        assert_eq!((compositor.surface().width, compositor.surface().height), (0, 0));

        // same size again still reallocates instead of patching missing storage
        compositor
            .apply_primary_damage(&buffer, 4, 4, &[DamageRect::new(0, 0, 1, 1)])
            .unwrap();
        assert_eq!((compositor.surface().width, compositor.surface().height), (4, 4));
    }

    #[test]
    fn test_popup_is_retained_when_upload_fails() {
        let mut backend = mock_backend();
        backend.expect_upload_full().returning(|_, _, _, _| Ok(()));
        backend
            .expect_upload_region()
            .returning(|_, _, _, _, _, _| Err(SurfaceError::Backend("device lost".into())));

        let mut compositor = SurfaceCompositor::new(Box::new(backend));
        compositor.initialize().unwrap();
        compositor
            .apply_primary_damage(&solid(6, 6, 0), 6, 6, &[DamageRect::full(6, 6)])
            .unwrap();
        compositor.on_popup_geometry(DamageRect::new(1, 1, 2, 2));
        compositor.on_popup_show(true);

        let result = compositor.apply_popup_damage(&solid(2, 2, 9), 2, 2, &[DamageRect::full(2, 2)]);
        assert!(result.is_err());
        assert!(compositor.popup().is_drawn());
        assert_eq!(compositor.popup().pixels(), solid(2, 2, 9).as_slice());
    }

    #[test]
    fn test_popup_damage_without_geometry_fails() {
        let (mut compositor, _texture) = compositor();
        let result = compositor.apply_popup_damage(&solid(2, 2, 1), 2, 2, &[DamageRect::full(2, 2)]);
        assert_eq!(result, Err(SurfaceError::NoPopupGeometry));
    }

    #[test]
    fn test_popup_clipped_to_surface() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(4, 4, 0), 4, 4, &[DamageRect::full(4, 4)])
            .unwrap();
        compositor.on_popup_geometry(DamageRect::new(3, 3, 2, 2));
        compositor.on_popup_show(true);
        compositor
            .apply_popup_damage(&solid(2, 2, 7), 2, 2, &[DamageRect::full(2, 2)])
            .unwrap();

        let frame = texture.frame().unwrap();
        assert_eq!(frame.get_pixel(3, 3), [7; 4]);
        assert_eq!(frame.get_pixel(2, 2), [0; 4]);
    }

    #[test]
    fn test_release_is_idempotent() {
        let (mut compositor, texture) = compositor();
        compositor
            .apply_primary_damage(&solid(2, 2, 0), 2, 2, &[DamageRect::full(2, 2)])
            .unwrap();

        assert!(compositor.release());
        assert!(!compositor.release());
        assert_eq!(texture.stats().destroyed, 1);
        assert!(compositor.handle().is_none());
    }
}
