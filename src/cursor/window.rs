//! Default host cursor handling for winit windows

use std::sync::Arc;

use winit::window::{CursorIcon, Window};

use super::{CursorListener, CursorType};

/// winit icon for an engine cursor; `None` when the host should not change the cursor
pub fn cursor_icon(cursor: CursorType) -> Option<CursorIcon> {
    use CursorType as C;
    let icon = match cursor {
        C::Pointer | C::DndNone => CursorIcon::Default,
        C::Cross => CursorIcon::Crosshair,
        C::Hand => CursorIcon::Pointer,
        C::IBeam => CursorIcon::Text,
        C::Wait => CursorIcon::Wait,
        C::Help => CursorIcon::Help,
        C::EastResize | C::EastPanning => CursorIcon::EResize,
        C::NorthResize | C::NorthPanning => CursorIcon::NResize,
        C::NorthEastResize | C::NorthEastPanning => CursorIcon::NeResize,
        C::NorthWestResize | C::NorthWestPanning => CursorIcon::NwResize,
        C::SouthResize | C::SouthPanning => CursorIcon::SResize,
        C::SouthEastResize | C::SouthEastPanning => CursorIcon::SeResize,
        C::SouthWestResize | C::SouthWestPanning => CursorIcon::SwResize,
        C::WestResize | C::WestPanning => CursorIcon::WResize,
        C::NorthSouthResize | C::MiddlePanningVertical => CursorIcon::NsResize,
        C::EastWestResize | C::MiddlePanningHorizontal => CursorIcon::EwResize,
        C::NorthEastSouthWestResize => CursorIcon::NeswResize,
        C::NorthWestSouthEastResize => CursorIcon::NwseResize,
        C::ColumnResize => CursorIcon::ColResize,
        C::RowResize => CursorIcon::RowResize,
        C::MiddlePanning => CursorIcon::AllScroll,
        C::Move | C::DndMove => CursorIcon::Move,
        C::VerticalText => CursorIcon::VerticalText,
        C::Cell => CursorIcon::Cell,
        C::ContextMenu => CursorIcon::ContextMenu,
        C::Alias | C::DndLink => CursorIcon::Alias,
        C::Progress => CursorIcon::Progress,
        C::NoDrop => CursorIcon::NoDrop,
        C::Copy | C::DndCopy => CursorIcon::Copy,
        C::NotAllowed => CursorIcon::NotAllowed,
        C::ZoomIn => CursorIcon::ZoomIn,
        C::ZoomOut => CursorIcon::ZoomOut,
        C::Grab => CursorIcon::Grab,
        C::Grabbing => CursorIcon::Grabbing,
        C::None | C::Custom => return None,
    };
    Some(icon)
}

/// Applies engine cursors to a winit window
#[derive(Clone)]
pub struct WinitCursor {
    window: Arc<Window>,
}

impl WinitCursor {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    /// Listener to install on a session. The `None` cursor is ignored since
    /// the host decides when the pointer is hidden.
    pub fn listener(self) -> CursorListener {
        Arc::new(move |cursor| {
            if let Some(icon) = cursor_icon(cursor) {
                self.window.set_cursor(icon);
            }
        })
    }
}
