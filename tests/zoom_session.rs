use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;

use anyhow::anyhow;
use image::RgbaImage;
use kurbo::{Point, Size, Vec2};
use lecture_show::cursor::{CircleCursor, CursorOverlay};
use lecture_show::settings::{SettingsStore, ToolSettings};
use lecture_show::zoom::input::{
    KeyCode, KeyEvent, KeyModifiers, PointerButton, PointerModifiers, ToolState,
};
use lecture_show::zoom::model::{Color, Segment, StrokeStyle};
use lecture_show::zoom::state::SessionPhase;
use lecture_show::zoom::{ScreenGrabber, SessionEvent, ZoomSession, CAPTURE_DELAY};

struct FakeGrabber {
    size: u32,
    fail: bool,
    calls: Rc<Cell<u32>>,
}

impl ScreenGrabber for FakeGrabber {
    fn grab(&mut self) -> anyhow::Result<RgbaImage> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(anyhow!("no display"));
        }
        Ok(RgbaImage::new(self.size, self.size))
    }
}

struct Harness {
    session: ZoomSession,
    events: Receiver<SessionEvent>,
    cursor: CircleCursor,
    calls: Rc<Cell<u32>>,
    start: Instant,
}

fn harness_with(settings: ToolSettings, size: u32, fail: bool) -> Harness {
    let (tx, events) = channel();
    let calls = Rc::new(Cell::new(0));
    let grabber = FakeGrabber {
        size,
        fail,
        calls: calls.clone(),
    };
    let viewport = Size::new(f64::from(size), f64::from(size));
    Harness {
        session: ZoomSession::new(settings, viewport, Box::new(grabber), tx),
        events,
        cursor: CircleCursor::new(Color::BLUE),
        calls,
        start: Instant::now(),
    }
}

fn harness(size: u32) -> Harness {
    harness_with(ToolSettings::default(), size, false)
}

impl Harness {
    fn open(&mut self) {
        self.session
            .activate(self.start, &mut self.cursor, Point::new(10.0, 10.0))
            .expect("activate");
        self.session.tick(self.start + CAPTURE_DELAY, &mut self.cursor);
    }

    fn events(&self) -> Vec<SessionEvent> {
        self.events.try_iter().collect()
    }
}

fn no_mods() -> PointerModifiers {
    PointerModifiers::default()
}

#[test]
fn pen_drag_commits_one_segment() {
    let store = SettingsStore::from_json_str(r##"{"pen/color1": "#ff0000", "pen/width": 3}"##)
        .expect("settings");
    let mut h = harness_with(ToolSettings::from_store(&store), 400, false);
    h.open();
    assert!(h.session.is_drawing_active());

    h.session
        .pointer_down(Point::new(100.0, 100.0), PointerButton::Primary, no_mods());
    h.session.pointer_move(Point::new(150.0, 140.0));
    h.session.pointer_up(Point::new(150.0, 140.0), PointerButton::Primary);

    let strokes = &h.session.state().strokes;
    assert_eq!(
        strokes.segments(),
        &[Segment::new(
            Point::new(100.0, 100.0),
            Point::new(150.0, 140.0),
            StrokeStyle::new(Color::rgb(255, 0, 0), 3),
        )]
    );
    assert!(strokes.highlighter_paths().is_empty());
}

#[test]
fn capture_error_tears_session_down() {
    let mut h = harness_with(ToolSettings::default(), 64, true);
    h.cursor.set_visible(true);
    h.open();

    assert_eq!(h.session.phase(), SessionPhase::Closed);
    assert!(h.session.render().is_none());
    assert!(h.cursor.is_visible());
    let events = h.events();
    assert!(matches!(events[0], SessionEvent::ActivationFailed { .. }));
    assert_eq!(events[1], SessionEvent::Closed);
    assert_eq!(events.len(), 2);
}

#[test]
fn empty_capture_tears_session_down() {
    let mut h = harness(0);
    h.open();
    assert_eq!(h.session.phase(), SessionPhase::Closed);
    assert!(!h.session.is_drawing_active());
}

#[test]
fn close_before_capture_cancels_pending_grab() {
    let mut h = harness(32);
    h.session
        .activate(h.start, &mut h.cursor, Point::ZERO)
        .expect("activate");
    h.session.close(&mut h.cursor);
    h.session.tick(h.start + CAPTURE_DELAY * 3, &mut h.cursor);

    assert_eq!(h.calls.get(), 0);
    assert_eq!(h.session.phase(), SessionPhase::Closed);
    assert_eq!(h.events(), vec![SessionEvent::Closed]);

    h.session.close(&mut h.cursor);
    assert!(h.events().is_empty());
}

#[test]
fn capture_waits_for_delay() {
    let mut h = harness(32);
    h.session
        .activate(h.start, &mut h.cursor, Point::ZERO)
        .expect("activate");
    h.session.tick(h.start, &mut h.cursor);
    assert_eq!(h.calls.get(), 0);
    assert_eq!(h.session.phase(), SessionPhase::Activating);
    h.session.tick(h.start + CAPTURE_DELAY, &mut h.cursor);
    assert_eq!(h.calls.get(), 1);
    assert_eq!(h.events(), vec![SessionEvent::Activated]);
}

#[test]
fn visible_cursor_is_hidden_then_restored_with_session_size() {
    let mut h = harness(64);
    h.cursor.set_visible(true);
    h.cursor.set_size(40);
    h.session
        .activate(h.start, &mut h.cursor, Point::ZERO)
        .expect("activate");
    assert!(!h.cursor.is_visible());
    assert_eq!(h.session.state().tools.circle_cursor_size, 40);

    h.session.tick(h.start + CAPTURE_DELAY, &mut h.cursor);
    let grow = KeyEvent {
        key: KeyCode::Equals,
        modifiers: KeyModifiers {
            ctrl: true,
            shift: true,
            alt: false,
        },
    };
    h.session.key_down(grow, &mut h.cursor);
    h.session.key_down(KeyEvent::plain(KeyCode::Escape), &mut h.cursor);

    assert_eq!(h.session.phase(), SessionPhase::Closed);
    assert!(h.cursor.is_visible());
    assert_eq!(h.cursor.size(), 45);
    assert!(h.session.backdrop().is_none());
    assert!(h.session.state().strokes.is_empty());
}

#[test]
fn hidden_cursor_stays_hidden() {
    let mut h = harness(64);
    h.open();
    assert_eq!(h.session.state().tools.circle_cursor_size, 0);
    h.session.key_down(KeyEvent::plain(KeyCode::Escape), &mut h.cursor);
    assert!(!h.cursor.is_visible());
}

#[test]
fn r_resets_view_mid_stroke() {
    let mut h = harness(200);
    h.open();
    h.session.wheel(Point::new(50.0, 50.0), 1.0);
    h.session.wheel(Point::new(50.0, 50.0), 1.0);
    h.session
        .pointer_down(Point::new(20.0, 20.0), PointerButton::Primary, no_mods());
    h.session.pointer_move(Point::new(30.0, 30.0));

    h.session.key_down(KeyEvent::plain(KeyCode::R), &mut h.cursor);

    let view = &h.session.state().view;
    assert_eq!(view.scale(), 1.0);
    assert_eq!(view.pan_offset(), Vec2::ZERO);
    assert!(matches!(h.session.tool_state(), ToolState::PenDrawing { .. }));
}

#[test]
fn highlighter_click_without_move_adds_nothing() {
    let mut h = harness(64);
    h.open();
    h.session
        .pointer_down(Point::new(5.0, 5.0), PointerButton::Secondary, no_mods());
    h.session.pointer_up(Point::new(5.0, 5.0), PointerButton::Secondary);
    assert!(h.session.state().strokes.is_empty());
    assert_eq!(h.session.tool_state(), &ToolState::Idle);
}

#[test]
fn captured_session_renders_frame_with_backdrop_size() {
    let mut h = harness(48);
    h.open();
    let frame = h.session.render().expect("frame");
    assert_eq!(frame.image.dimensions(), (48, 48));
}

#[test]
fn repeated_activation_keeps_annotations_and_backdrop() {
    let mut h = harness(200);
    h.open();
    h.session
        .pointer_down(Point::new(20.0, 20.0), PointerButton::Primary, no_mods());
    h.session.pointer_move(Point::new(60.0, 60.0));
    h.session.pointer_up(Point::new(60.0, 60.0), PointerButton::Primary);
    assert_eq!(h.session.state().strokes.len(), 1);
    assert_eq!(h.events(), vec![SessionEvent::Activated]);

    let later = h.start + CAPTURE_DELAY * 10;
    h.session
        .activate(later, &mut h.cursor, Point::new(5.0, 5.0))
        .expect("second activate");
    h.session.tick(later + CAPTURE_DELAY, &mut h.cursor);

    assert_eq!(h.session.phase(), SessionPhase::Captured);
    assert!(h.session.is_drawing_active());
    assert_eq!(h.session.state().strokes.len(), 1);
    assert_eq!(h.calls.get(), 1);
    assert!(h.events().is_empty());
}
