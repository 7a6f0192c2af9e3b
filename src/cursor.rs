use crate::settings::CURSOR_ALPHA;
use crate::zoom::model::Color;
use kurbo::Point;
use std::ops::RangeInclusive;

pub const CURSOR_SIZE_RANGE: RangeInclusive<u32> = 0..=160;
pub const CURSOR_SIZE_STEP: u32 = 5;
pub const DEFAULT_CURSOR_SIZE: u32 = 50;

/// The pointer highlight a zoom session hides while capturing and restores on
/// close.
pub trait CursorOverlay {
    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
    fn size(&self) -> u32;
    fn set_size(&mut self, size: u32);
    fn color(&self) -> Color;
    fn set_color(&mut self, color: Color);
}

/// Translucent circle that follows the pointer outside zoom sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleCursor {
    size: u32,
    color: Color,
    visible: bool,
    position: Point,
}

impl CircleCursor {
    pub fn new(color: Color) -> Self {
        Self {
            size: DEFAULT_CURSOR_SIZE,
            color: color.with_alpha(CURSOR_ALPHA),
            visible: false,
            position: Point::ZERO,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn increase(&mut self) -> u32 {
        self.set_size(self.size.saturating_add(CURSOR_SIZE_STEP));
        self.size
    }

    pub fn decrease(&mut self) -> u32 {
        self.set_size(self.size.saturating_sub(CURSOR_SIZE_STEP));
        self.size
    }

    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        tracing::debug!(visible = self.visible, "circle cursor toggled");
        self.visible
    }
}

impl CursorOverlay for CircleCursor {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn set_size(&mut self, size: u32) {
        self.size = size.clamp(*CURSOR_SIZE_RANGE.start(), *CURSOR_SIZE_RANGE.end());
    }

    fn color(&self) -> Color {
        self.color
    }

    fn set_color(&mut self, color: Color) {
        self.color = color.with_alpha(CURSOR_ALPHA);
    }
}
