//! Commands from and events to the UI layer

use arvista_placement::PlacementState;
use arvista_tour::PoiId;

/// Inbound user intents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCommand {
    /// Place the scene at the reticle
    ConfirmPlacement,
    Next,
    Previous,
    ShowCurrent,
    /// Pick a marker at a screen position
    PickAt { x: f32, y: f32 },
}

/// Outbound state changes
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    PlacementChanged(PlacementState),
    /// Hit-testing cannot be used this session
    ArUnavailable(String),
    CurrentPoi { index: usize, id: PoiId },
    VisitedCount { visited: usize, total: usize },
    ShowDetail {
        id: PoiId,
        title: String,
        description: String,
        icon: String,
    },
    CloseDetail,
    TourComplete,
}
