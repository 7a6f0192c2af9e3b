use std::time::{Duration, Instant};

use kurbo::Point;
use lecture_show::cursor::{CircleCursor, CursorOverlay};
use lecture_show::input::{
    InputDispatcher, Modifier, Notification, RawInput, RawKey, Shortcut,
};
use lecture_show::zoom::model::Color;

fn key_down(key: RawKey) -> RawInput {
    RawInput::KeyDown(key)
}

fn key_up(key: RawKey) -> RawInput {
    RawInput::KeyUp(key)
}

fn shortcuts(out: &[Notification]) -> Vec<Shortcut> {
    out.iter()
        .filter_map(|n| match n {
            Notification::Shortcut(s) => Some(*s),
            _ => None,
        })
        .collect()
}

#[test]
fn cursor_shortcuts_drive_circle_cursor() {
    let now = Instant::now();
    let mut dispatcher = InputDispatcher::new();
    let mut cursor = CircleCursor::new(Color::BLUE);

    let mut seen = Vec::new();
    for input in [
        key_down(RawKey::Modifier(Modifier::Alt)),
        key_down(RawKey::Char('c')),
        key_up(RawKey::Modifier(Modifier::Alt)),
        key_down(RawKey::Modifier(Modifier::Ctrl)),
        key_down(RawKey::Modifier(Modifier::Shift)),
        key_down(RawKey::Char('=')),
        key_down(RawKey::Char('=')),
        key_down(RawKey::Char('-')),
    ] {
        seen.extend(shortcuts(&dispatcher.handle(input, now)));
    }

    for shortcut in &seen {
        match shortcut {
            Shortcut::ToggleCursor => {
                cursor.toggle();
            }
            Shortcut::IncreaseCursor => {
                cursor.increase();
            }
            Shortcut::DecreaseCursor => {
                cursor.decrease();
            }
            Shortcut::ActivateZoom => {}
        }
    }

    assert_eq!(
        seen,
        vec![
            Shortcut::ToggleCursor,
            Shortcut::IncreaseCursor,
            Shortcut::IncreaseCursor,
            Shortcut::DecreaseCursor,
        ]
    );
    assert!(cursor.is_visible());
    assert_eq!(cursor.size(), 55);
}

#[test]
fn modifier_combos_are_shown_in_order() {
    let now = Instant::now();
    let mut dispatcher = InputDispatcher::new();
    dispatcher.handle(key_down(RawKey::Modifier(Modifier::Win)), now);
    dispatcher.handle(key_down(RawKey::Modifier(Modifier::Shift)), now);
    let out = dispatcher.handle(key_down(RawKey::Named("Enter")), now);
    assert_eq!(out, vec![Notification::ShowText("Shift+Win+Enter".to_owned())]);
}

#[test]
fn direction_change_reports_previous_burst_immediately() {
    use lecture_show::input::ScrollDirection;
    let t0 = Instant::now();
    let mut dispatcher = InputDispatcher::new();
    let wheel = |direction| RawInput::Wheel {
        direction,
        position: Point::new(1.0, 2.0),
    };
    dispatcher.handle(wheel(ScrollDirection::Up), t0);
    dispatcher.handle(wheel(ScrollDirection::Up), t0 + Duration::from_millis(30));
    let out = dispatcher.handle(wheel(ScrollDirection::Down), t0 + Duration::from_millis(60));

    assert!(out.contains(&Notification::ShowText("up x2".to_owned())));
    let later = dispatcher.poll(t0 + Duration::from_millis(400));
    assert_eq!(later, vec![Notification::ShowText("down".to_owned())]);
}
