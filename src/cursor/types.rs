//! Engine cursor catalogue

/// Cursor shapes in the engine's numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorType {
    #[default]
    Pointer = 0,
    Cross,
    Hand,
    IBeam,
    Wait,
    Help,
    EastResize,
    NorthResize,
    NorthEastResize,
    NorthWestResize,
    SouthResize,
    SouthEastResize,
    SouthWestResize,
    WestResize,
    NorthSouthResize,
    EastWestResize,
    NorthEastSouthWestResize,
    NorthWestSouthEastResize,
    ColumnResize,
    RowResize,
    MiddlePanning,
    EastPanning,
    NorthPanning,
    NorthEastPanning,
    NorthWestPanning,
    SouthPanning,
    SouthEastPanning,
    SouthWestPanning,
    WestPanning,
    Move,
    VerticalText,
    Cell,
    ContextMenu,
    Alias,
    Progress,
    NoDrop,
    Copy,
    /// Sentinel for "no cursor"; hiding is left to the host
    None,
    NotAllowed,
    ZoomIn,
    ZoomOut,
    Grab,
    Grabbing,
    MiddlePanningVertical,
    MiddlePanningHorizontal,
    Custom,
    DndNone,
    DndMove,
    DndCopy,
    DndLink,
}

impl CursorType {
    const ALL: [CursorType; 50] = [
        Self::Pointer,
        Self::Cross,
        Self::Hand,
        Self::IBeam,
        Self::Wait,
        Self::Help,
        Self::EastResize,
        Self::NorthResize,
        Self::NorthEastResize,
        Self::NorthWestResize,
        Self::SouthResize,
        Self::SouthEastResize,
        Self::SouthWestResize,
        Self::WestResize,
        Self::NorthSouthResize,
        Self::EastWestResize,
        Self::NorthEastSouthWestResize,
        Self::NorthWestSouthEastResize,
        Self::ColumnResize,
        Self::RowResize,
        Self::MiddlePanning,
        Self::EastPanning,
        Self::NorthPanning,
        Self::NorthEastPanning,
        Self::NorthWestPanning,
        Self::SouthPanning,
        Self::SouthEastPanning,
        Self::SouthWestPanning,
        Self::WestPanning,
        Self::Move,
        Self::VerticalText,
        Self::Cell,
        Self::ContextMenu,
        Self::Alias,
        Self::Progress,
        Self::NoDrop,
        Self::Copy,
        Self::None,
        Self::NotAllowed,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::Grab,
        Self::Grabbing,
        Self::MiddlePanningVertical,
        Self::MiddlePanningHorizontal,
        Self::Custom,
        Self::DndNone,
        Self::DndMove,
        Self::DndCopy,
        Self::DndLink,
    ];

    /// Look up an engine cursor id
    pub fn from_id(id: i32) -> Option<Self> {
        usize::try_from(id).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Engine cursor id
    pub fn id(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_catalogue_order() {
        for (i, cursor) in CursorType::ALL.iter().enumerate() {
            assert_eq!(cursor.id(), i as i32);
            assert_eq!(CursorType::from_id(i as i32), Some(*cursor));
        }
    }

    #[test]
    fn test_known_ids() {
        assert_eq!(CursorType::Move.id(), 29);
        assert_eq!(CursorType::NoDrop.id(), 35);
        assert_eq!(CursorType::Copy.id(), 36);
        assert_eq!(CursorType::None.id(), 37);
        assert_eq!(CursorType::from_id(-1), None);
        assert_eq!(CursorType::from_id(50), None);
    }
}
