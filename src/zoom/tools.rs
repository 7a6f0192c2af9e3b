use crate::settings::ToolSettings;
use crate::zoom::model::{Color, StrokeStyle};
use std::ops::RangeInclusive;

pub const PEN_WIDTH_RANGE: RangeInclusive<u32> = 1..=20;
pub const PEN_WIDTH_STEP: u32 = 1;
pub const HIGHLIGHTER_WIDTH_RANGE: RangeInclusive<u32> = 1..=50;
pub const HIGHLIGHTER_WIDTH_STEP: u32 = 2;
pub const ERASER_SIZE_RANGE: RangeInclusive<u32> = 5..=100;
pub const ERASER_SIZE_STEP: u32 = 5;
pub const DEFAULT_ERASER_SIZE: u32 = 20;
pub const CIRCLE_CURSOR_RANGE: RangeInclusive<u32> = 0..=100;
pub const CIRCLE_CURSOR_STEP: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeTool {
    Pen,
    Highlighter,
}

/// The tool that width keys apply to. The eraser only exists while both buttons
/// are held and remembers which stroke tool it interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTool {
    #[default]
    Pen,
    Highlighter,
    Eraser { resume: StrokeTool },
}

impl ActiveTool {
    pub fn stroke_tool(self) -> StrokeTool {
        match self {
            Self::Pen => StrokeTool::Pen,
            Self::Highlighter => StrokeTool::Highlighter,
            Self::Eraser { resume } => resume,
        }
    }

    pub fn start_erasing(self) -> Self {
        Self::Eraser {
            resume: self.stroke_tool(),
        }
    }

    pub fn stop_erasing(self) -> Self {
        match self.stroke_tool() {
            StrokeTool::Pen => Self::Pen,
            StrokeTool::Highlighter => Self::Highlighter,
        }
    }

    pub fn is_eraser(self) -> bool {
        matches!(self, Self::Eraser { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjust {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParams {
    pub pen_color: Color,
    pub pen_width: u32,
    pub pen_presets: [Color; 3],
    pub highlighter_color: Color,
    pub highlighter_width: u32,
    pub highlighter_presets: [Color; 3],
    pub eraser_size: u32,
    pub circle_cursor_size: u32,
    pub circle_cursor_color: Color,
}

impl ToolParams {
    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self {
            pen_color: settings.pen_colors[0],
            pen_width: settings.pen_width,
            pen_presets: settings.pen_colors,
            highlighter_color: settings.highlight_colors[0],
            highlighter_width: settings.highlight_width,
            highlighter_presets: settings.highlight_colors,
            eraser_size: DEFAULT_ERASER_SIZE,
            circle_cursor_size: 0,
            circle_cursor_color: settings.cursor_color,
        }
    }

    /// Re-reads configured values; the eraser and cursor sizes belong to the
    /// running session and are kept.
    pub fn apply_settings(&mut self, settings: &ToolSettings) {
        let eraser_size = self.eraser_size;
        let circle_cursor_size = self.circle_cursor_size;
        *self = Self::from_settings(settings);
        self.eraser_size = eraser_size;
        self.circle_cursor_size = circle_cursor_size;
    }

    pub fn pen_style(&self) -> StrokeStyle {
        StrokeStyle::new(self.pen_color, self.pen_width)
    }

    pub fn highlighter_style(&self) -> StrokeStyle {
        StrokeStyle::new(self.highlighter_color, self.highlighter_width)
    }

    pub fn select_pen_preset(&mut self, index: usize) -> Option<Color> {
        let color = *self.pen_presets.get(index)?;
        self.pen_color = color;
        Some(color)
    }

    /// Presets change the hue only; the current highlighter alpha is kept.
    pub fn select_highlighter_preset(&mut self, index: usize) -> Option<Color> {
        let preset = *self.highlighter_presets.get(index)?;
        let color = preset.with_alpha(self.highlighter_color.a);
        self.highlighter_color = color;
        Some(color)
    }

    /// Widens or narrows whichever tool is active and returns its new size.
    pub fn adjust_width(&mut self, tool: ActiveTool, adjust: Adjust) -> u32 {
        match tool {
            ActiveTool::Pen => {
                self.pen_width = step(self.pen_width, PEN_WIDTH_STEP, &PEN_WIDTH_RANGE, adjust);
                self.pen_width
            }
            ActiveTool::Highlighter => {
                self.highlighter_width = step(
                    self.highlighter_width,
                    HIGHLIGHTER_WIDTH_STEP,
                    &HIGHLIGHTER_WIDTH_RANGE,
                    adjust,
                );
                self.highlighter_width
            }
            ActiveTool::Eraser { .. } => {
                self.eraser_size =
                    step(self.eraser_size, ERASER_SIZE_STEP, &ERASER_SIZE_RANGE, adjust);
                self.eraser_size
            }
        }
    }

    pub fn adjust_circle_cursor(&mut self, adjust: Adjust) -> u32 {
        self.circle_cursor_size = step(
            self.circle_cursor_size,
            CIRCLE_CURSOR_STEP,
            &CIRCLE_CURSOR_RANGE,
            adjust,
        );
        self.circle_cursor_size
    }
}

impl Default for ToolParams {
    fn default() -> Self {
        Self::from_settings(&ToolSettings::default())
    }
}

fn step(value: u32, amount: u32, range: &RangeInclusive<u32>, adjust: Adjust) -> u32 {
    let next = match adjust {
        Adjust::Increase => value.saturating_add(amount),
        Adjust::Decrease => value.saturating_sub(amount),
    };
    next.clamp(*range.start(), *range.end())
}
