use crate::settings::ToolSettings;
use crate::zoom::model::StrokeStore;
use crate::zoom::tools::{ActiveTool, ToolParams};
use crate::zoom::view::ZoomPan;
use kurbo::{Point, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Inactive,
    Activating,
    Captured,
    Closed,
}

impl SessionPhase {
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::Captured)
    }

    /// A capture is pending or the overlay is up.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Activating | Self::Captured)
    }
}

pub fn can_transition(from: SessionPhase, to: SessionPhase) -> bool {
    matches!(
        (from, to),
        (SessionPhase::Inactive, SessionPhase::Activating)
            | (SessionPhase::Closed, SessionPhase::Activating)
            | (SessionPhase::Activating, SessionPhase::Captured)
            | (SessionPhase::Activating, SessionPhase::Closed)
            | (SessionPhase::Captured, SessionPhase::Closed)
            | (SessionPhase::Inactive, SessionPhase::Closed)
    ) || from == to
}

/// Everything a session mutates in response to input.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub view: ZoomPan,
    pub strokes: StrokeStore,
    pub tools: ToolParams,
    pub active_tool: ActiveTool,
    /// Last known pointer position in screen space.
    pub pointer: Point,
}

impl SessionState {
    pub fn new(settings: &ToolSettings, viewport: Size) -> Self {
        Self {
            view: ZoomPan::new(viewport),
            strokes: StrokeStore::new(),
            tools: ToolParams::from_settings(settings),
            active_tool: ActiveTool::default(),
            pointer: viewport.to_rect().center(),
        }
    }

    /// Eraser footprint side in image space; constant on screen at any zoom.
    pub fn eraser_size_in_image(&self) -> f64 {
        f64::from(self.tools.eraser_size) / self.view.scale()
    }
}
