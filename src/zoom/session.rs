use crate::cursor::CursorOverlay;
use crate::settings::ToolSettings;
use crate::zoom::capture::{validate_capture, CaptureSchedule, ScreenGrabber};
use crate::zoom::input::{
    InputCommand, KeyCode, KeyEvent, PointerButton, PointerModifiers, ToolMachine, ToolState,
};
use crate::zoom::messages::SessionEvent;
use crate::zoom::render::{render_frame, Frame, FrameInputs};
use crate::zoom::state::{can_transition, SessionPhase, SessionState};
use crate::zoom::tools::CIRCLE_CURSOR_RANGE;
use anyhow::{anyhow, Result};
use image::RgbaImage;
use kurbo::{Point, Size};
use std::sync::mpsc::Sender;
use std::time::Instant;

/// One capture-and-annotate session: owns the backdrop, the strokes and the
/// tool state machine for its lifetime.
pub struct ZoomSession {
    phase: SessionPhase,
    settings: ToolSettings,
    state: SessionState,
    machine: ToolMachine,
    backdrop: Option<RgbaImage>,
    schedule: CaptureSchedule,
    live_token: Option<u64>,
    grabber: Box<dyn ScreenGrabber>,
    events: Sender<SessionEvent>,
    restore_cursor: bool,
    focus_reclaimed: bool,
}

impl ZoomSession {
    pub fn new(
        settings: ToolSettings,
        viewport: Size,
        grabber: Box<dyn ScreenGrabber>,
        events: Sender<SessionEvent>,
    ) -> Self {
        Self {
            phase: SessionPhase::Inactive,
            state: SessionState::new(&settings, viewport),
            settings,
            machine: ToolMachine::new(),
            backdrop: None,
            schedule: CaptureSchedule::new(),
            live_token: None,
            grabber,
            events,
            restore_cursor: false,
            focus_reclaimed: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_drawing_active(&self) -> bool {
        self.phase.accepts_input() && self.backdrop.is_some()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn tool_state(&self) -> &ToolState {
        self.machine.state()
    }

    pub fn backdrop(&self) -> Option<&RgbaImage> {
        self.backdrop.as_ref()
    }

    /// When the pending capture wants to run.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedule.due_at()
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.state.view.set_viewport(viewport);
    }

    pub fn is_live(&self) -> bool {
        self.phase.is_live()
    }

    /// Hides the cursor overlay and schedules the capture. A live session is
    /// left alone; leftovers from an earlier one are released first.
    pub fn activate(
        &mut self,
        now: Instant,
        cursor: &mut dyn CursorOverlay,
        pointer: Point,
    ) -> Result<()> {
        if self.is_live() {
            tracing::debug!(phase = ?self.phase, "zoom session already live, activation ignored");
            return Ok(());
        }
        if let Err(err) = self.begin_activation(now, cursor, pointer) {
            tracing::warn!(?err, "zoom activation failed");
            self.close(cursor);
            return Err(err);
        }
        Ok(())
    }

    fn begin_activation(
        &mut self,
        now: Instant,
        cursor: &mut dyn CursorOverlay,
        pointer: Point,
    ) -> Result<()> {
        if self.backdrop.is_some() || self.schedule.is_pending() {
            tracing::debug!(phase = ?self.phase, "cleaning up previous zoom session");
            self.release_resources();
        }
        self.restore_cursor = cursor.is_visible();

        self.transition(SessionPhase::Activating)?;
        let viewport = self.state.view.viewport();
        self.state = SessionState::new(&self.settings, viewport);
        self.state.pointer = pointer;
        self.state.tools.circle_cursor_size = if self.restore_cursor {
            cursor
                .size()
                .clamp(*CIRCLE_CURSOR_RANGE.start(), *CIRCLE_CURSOR_RANGE.end())
        } else {
            0
        };
        self.state.tools.circle_cursor_color = cursor.color();
        self.focus_reclaimed = false;

        cursor.set_visible(false);
        self.live_token = Some(self.schedule.schedule(now));
        tracing::debug!("zoom capture scheduled");
        Ok(())
    }

    /// Runs the deferred capture once it is due. A tick after `close` finds no
    /// live token and does nothing.
    pub fn tick(&mut self, now: Instant, cursor: &mut dyn CursorOverlay) {
        let Some(token) = self.schedule.take_due(now) else {
            return;
        };
        if self.live_token != Some(token) || self.phase != SessionPhase::Activating {
            return;
        }
        self.live_token = None;

        match self.grabber.grab().and_then(validate_capture) {
            Ok(image) => {
                let image_size = Size::new(f64::from(image.width()), f64::from(image.height()));
                self.state.view.set_image_size(image_size);
                self.state.view.set_zoom_center(self.state.pointer);
                self.backdrop = Some(image);
                if let Err(err) = self.transition(SessionPhase::Captured) {
                    tracing::warn!(?err, "zoom session left activation unexpectedly");
                    self.close(cursor);
                    return;
                }
                tracing::info!(
                    width = image_size.width,
                    height = image_size.height,
                    "zoom session captured screen"
                );
                let _ = self.events.send(SessionEvent::Activated);
            }
            Err(err) => {
                tracing::warn!(?err, "screen capture failed, closing zoom session");
                let _ = self.events.send(SessionEvent::ActivationFailed {
                    reason: format!("{err:#}"),
                });
                self.close(cursor);
            }
        }
    }

    /// Ends the session. Safe to call repeatedly; only the first call reports
    /// `SessionEvent::Closed`.
    pub fn close(&mut self, cursor: &mut dyn CursorOverlay) {
        if matches!(self.phase, SessionPhase::Inactive | SessionPhase::Closed) {
            return;
        }
        if self.restore_cursor {
            let size = self.state.tools.circle_cursor_size;
            if size > 0 {
                cursor.set_size(size);
            }
            cursor.set_color(self.state.tools.circle_cursor_color);
            cursor.set_visible(true);
        }
        self.restore_cursor = false;
        self.release_resources();
        self.phase = SessionPhase::Closed;
        tracing::debug!("zoom session closed");
        let _ = self.events.send(SessionEvent::Closed);
    }

    pub fn apply_settings(&mut self, settings: ToolSettings) {
        self.state.tools.apply_settings(&settings);
        self.settings = settings;
    }

    /// Asks the owner to bring the overlay back once per focus loss.
    pub fn focus_lost(&mut self) -> bool {
        if !self.is_drawing_active() || self.focus_reclaimed {
            return false;
        }
        self.focus_reclaimed = true;
        let _ = self.events.send(SessionEvent::ReclaimFocus);
        true
    }

    pub fn focus_gained(&mut self) {
        self.focus_reclaimed = false;
    }

    pub fn pointer_down(&mut self, point: Point, button: PointerButton, modifiers: PointerModifiers) {
        if self.is_drawing_active() {
            self.machine
                .pointer_down(&mut self.state, point, button, modifiers);
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        if self.is_drawing_active() {
            self.machine.pointer_move(&mut self.state, point);
        }
    }

    pub fn pointer_up(&mut self, point: Point, button: PointerButton) {
        if self.is_drawing_active() {
            self.machine.pointer_up(&mut self.state, point, button);
        }
    }

    pub fn wheel(&mut self, point: Point, delta: f64) {
        if self.is_drawing_active() {
            self.machine.wheel(&mut self.state, point, delta);
        }
    }

    /// Escape closes at any point after activation; other keys wait for the
    /// capture.
    pub fn key_down(&mut self, event: KeyEvent, cursor: &mut dyn CursorOverlay) {
        if event.key == KeyCode::Escape && self.phase == SessionPhase::Activating {
            self.close(cursor);
            return;
        }
        if !self.is_drawing_active() {
            return;
        }
        if let Some(InputCommand::RequestExit) = self.machine.key_down(&mut self.state, event) {
            self.close(cursor);
        }
    }

    pub fn render(&self) -> Option<Frame> {
        let backdrop = self.backdrop.as_ref()?;
        render_frame(FrameInputs {
            backdrop,
            state: &self.state,
            in_progress: self.machine.in_progress_path(),
            erasing: self.machine.state().is_erasing(),
        })
    }

    fn release_resources(&mut self) {
        self.schedule.cancel();
        self.live_token = None;
        self.backdrop = None;
        self.machine.cancel();
        self.state.strokes.clear();
    }

    fn transition(&mut self, next: SessionPhase) -> Result<()> {
        if !can_transition(self.phase, next) {
            return Err(anyhow!(
                "invalid zoom session transition {:?} -> {:?}",
                self.phase,
                next
            ));
        }
        self.phase = next;
        Ok(())
    }
}
