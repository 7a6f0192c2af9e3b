use crate::zoom::model::{HighlighterPath, Segment, StrokeStyle};
use crate::zoom::state::SessionState;
use crate::zoom::tools::{ActiveTool, Adjust};
use crate::zoom::view::ZoomDirection;
use kurbo::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Digit(u8),
    Plus,
    Equals,
    Minus,
    R,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn plain(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
        }
    }

    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers {
                ctrl: true,
                ..KeyModifiers::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonMask {
    pub primary: bool,
    pub secondary: bool,
}

impl ButtonMask {
    pub fn is_down(self, button: PointerButton) -> bool {
        match button {
            PointerButton::Primary => self.primary,
            PointerButton::Secondary => self.secondary,
            PointerButton::Other => false,
        }
    }

    pub fn both(self) -> bool {
        self.primary && self.secondary
    }

    fn set(&mut self, button: PointerButton, down: bool) {
        match button {
            PointerButton::Primary => self.primary = down,
            PointerButton::Secondary => self.secondary = down,
            PointerButton::Other => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    RequestExit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolState {
    Idle,
    Panning { anchor: Point },
    PenDrawing { last: Point, style: StrokeStyle },
    Highlighting { path: HighlighterPath },
    Erasing,
}

impl ToolState {
    pub fn is_erasing(&self) -> bool {
        matches!(self, Self::Erasing)
    }
}

/// Turns pointer and key events into stroke, pan and parameter changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolMachine {
    state: ToolState,
    buttons: ButtonMask,
}

impl Default for ToolMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolMachine {
    pub fn new() -> Self {
        Self {
            state: ToolState::Idle,
            buttons: ButtonMask::default(),
        }
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub fn buttons(&self) -> ButtonMask {
        self.buttons
    }

    pub fn in_progress_path(&self) -> Option<&HighlighterPath> {
        match &self.state {
            ToolState::Highlighting { path } => Some(path),
            _ => None,
        }
    }

    /// Drops any in-progress stroke without committing it.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
        self.buttons = ButtonMask::default();
    }

    pub fn pointer_down(
        &mut self,
        session: &mut SessionState,
        point: Point,
        button: PointerButton,
        modifiers: PointerModifiers,
    ) {
        session.pointer = point;
        let newly_pressed = !self.buttons.is_down(button);
        self.buttons.set(button, true);
        if !newly_pressed {
            return;
        }

        if button == PointerButton::Primary && modifiers.shift {
            self.finish_stroke(session);
            self.state = ToolState::Panning { anchor: point };
        } else if self.buttons.both() {
            self.finish_stroke(session);
            self.state = ToolState::Erasing;
            session.active_tool = session.active_tool.start_erasing();
            erase(session, point);
        } else if button == PointerButton::Secondary {
            self.finish_stroke(session);
            let at = session.view.transform().to_image(point);
            let style = session.tools.highlighter_style();
            self.state = ToolState::Highlighting {
                path: HighlighterPath::start(at, style),
            };
            session.active_tool = ActiveTool::Highlighter;
        } else if button == PointerButton::Primary {
            self.finish_stroke(session);
            let last = session.view.transform().to_image(point);
            let style = session.tools.pen_style();
            self.state = ToolState::PenDrawing { last, style };
            session.active_tool = ActiveTool::Pen;
        }
    }

    pub fn pointer_move(&mut self, session: &mut SessionState, point: Point) {
        session.pointer = point;
        let buttons = self.buttons;
        match &mut self.state {
            ToolState::Idle => {}
            ToolState::Panning { anchor } => {
                session.view.pan_by(point - *anchor);
                *anchor = point;
            }
            ToolState::Erasing => {
                if buttons.both() {
                    erase(session, point);
                }
            }
            ToolState::PenDrawing { last, style } => {
                if !buttons.primary {
                    return;
                }
                let next = session.view.transform().to_image(point);
                if next != *last {
                    session
                        .strokes
                        .append_segment(Segment::new(*last, next, *style));
                    *last = next;
                }
            }
            ToolState::Highlighting { path } => {
                if buttons.secondary {
                    path.line_to(session.view.transform().to_image(point));
                }
            }
        }
    }

    pub fn pointer_up(&mut self, session: &mut SessionState, point: Point, button: PointerButton) {
        session.pointer = point;
        self.buttons.set(button, false);

        let ends_state = match &self.state {
            ToolState::Idle => false,
            ToolState::Erasing => button != PointerButton::Other,
            ToolState::Panning { .. } | ToolState::PenDrawing { .. } => {
                button == PointerButton::Primary
            }
            ToolState::Highlighting { .. } => button == PointerButton::Secondary,
        };
        if !ends_state {
            return;
        }

        if self.state.is_erasing() {
            session.active_tool = session.active_tool.stop_erasing();
            self.state = ToolState::Idle;
            return;
        }
        self.finish_stroke(session);
    }

    pub fn wheel(&mut self, session: &mut SessionState, point: Point, delta: f64) {
        session.pointer = point;
        if delta > 0.0 {
            session.view.zoom_in(point);
        } else if delta < 0.0 {
            session.view.zoom_out();
        }
    }

    pub fn key_down(&mut self, session: &mut SessionState, event: KeyEvent) -> Option<InputCommand> {
        let KeyModifiers { ctrl, shift, .. } = event.modifiers;
        match event.key {
            KeyCode::Escape => return Some(InputCommand::RequestExit),
            KeyCode::Digit(digit @ 1..=3) if !ctrl => {
                session.tools.select_pen_preset(usize::from(digit - 1));
            }
            KeyCode::Digit(digit @ 4..=6) if !ctrl => {
                session.tools.select_highlighter_preset(usize::from(digit - 4));
            }
            // `+` often needs Shift, so Ctrl with `+` always zooms.
            KeyCode::Plus => adjust(session, ctrl, false, Adjust::Increase),
            KeyCode::Equals => adjust(session, ctrl, shift, Adjust::Increase),
            KeyCode::Minus => adjust(session, ctrl, shift, Adjust::Decrease),
            KeyCode::R if !ctrl => {
                session.view.reset();
                tracing::debug!("view reset");
            }
            _ => {}
        }
        None
    }

    /// Leaves the current state, committing a highlighter path if one is open.
    fn finish_stroke(&mut self, session: &mut SessionState) {
        let previous = std::mem::replace(&mut self.state, ToolState::Idle);
        if let ToolState::Highlighting { path } = previous {
            session.strokes.append_highlighter_path(path);
        }
    }
}

fn erase(session: &mut SessionState, point: Point) {
    let at = session.view.transform().to_image(point);
    let size = session.eraser_size_in_image();
    let outcome = session.strokes.erase_at(at, size);
    if outcome.removed_any() {
        tracing::debug!(?outcome, "erased strokes");
    }
}

fn adjust(session: &mut SessionState, ctrl: bool, shift: bool, direction: Adjust) {
    match (ctrl, shift) {
        (true, true) => {
            session.tools.adjust_circle_cursor(direction);
        }
        (true, false) => {
            let zoom = match direction {
                Adjust::Increase => ZoomDirection::In,
                Adjust::Decrease => ZoomDirection::Out,
            };
            session.view.step_zoom(zoom);
        }
        _ => {
            session.tools.adjust_width(session.active_tool, direction);
        }
    }
}
