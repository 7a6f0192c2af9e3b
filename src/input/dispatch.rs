use crate::input::combo::key_label;
use crate::input::{
    format_combo, match_shortcut, ModifierSet, MouseButton, RawInput, RawKey, ScrollAggregator,
    ScrollDirection, Shortcut,
};
use kurbo::Point;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RipplePhase {
    Press,
    Release,
    Click,
}

/// Requests for the visual-feedback collaborators and the zoom owner.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ShowText(String),
    ClickRipple {
        position: Point,
        button: MouseButton,
        phase: RipplePhase,
    },
    ScrollEffect {
        position: Point,
        direction: ScrollDirection,
    },
    PointerMoved(Point),
    Shortcut(Shortcut),
}

/// Classifies raw hook input on the main thread.
#[derive(Debug, Default)]
pub struct InputDispatcher {
    modifiers: ModifierSet,
    scroll: ScrollAggregator,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(&self) -> ModifierSet {
        self.modifiers
    }

    pub fn handle(&mut self, input: RawInput, now: Instant) -> Vec<Notification> {
        let mut out = Vec::new();
        match input {
            RawInput::KeyDown(RawKey::Modifier(modifier)) => {
                if !self.modifiers.contains(modifier) {
                    self.modifiers.set(modifier, true);
                    out.push(Notification::ShowText(format_combo(self.modifiers, "")));
                }
            }
            RawInput::KeyUp(RawKey::Modifier(modifier)) => {
                self.modifiers.set(modifier, false);
            }
            RawInput::KeyDown(key) => {
                if let Some(shortcut) = match_shortcut(self.modifiers, key) {
                    tracing::debug!(?shortcut, "shortcut matched");
                    out.push(Notification::Shortcut(shortcut));
                    out.push(Notification::ShowText(shortcut.display().to_owned()));
                } else if let Some(label) = key_label(key) {
                    out.push(Notification::ShowText(format_combo(self.modifiers, &label)));
                }
            }
            RawInput::KeyUp(_) => {}
            RawInput::ButtonDown { button, position } => {
                let (label, phase) = match button {
                    MouseButton::Left => ("Mouse Left", RipplePhase::Press),
                    MouseButton::Right => ("Mouse Right", RipplePhase::Press),
                    MouseButton::Middle => ("Mouse Middle", RipplePhase::Click),
                    MouseButton::Other => ("Mouse Button", RipplePhase::Click),
                };
                out.push(Notification::ShowText(format_combo(self.modifiers, label)));
                out.push(Notification::ClickRipple {
                    position,
                    button,
                    phase,
                });
            }
            RawInput::ButtonUp { button, position } => {
                if matches!(button, MouseButton::Left | MouseButton::Right) {
                    out.push(Notification::ClickRipple {
                        position,
                        button,
                        phase: RipplePhase::Release,
                    });
                }
            }
            RawInput::PointerMove { position } => out.push(Notification::PointerMoved(position)),
            RawInput::Wheel {
                direction,
                position,
            } => {
                out.push(Notification::ScrollEffect {
                    position,
                    direction,
                });
                if let Some(burst) = self.scroll.push(direction, now) {
                    out.push(self.scroll_text(&burst.label()));
                }
            }
        }
        out
    }

    /// Reports a scroll burst whose window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Vec<Notification> {
        self.scroll
            .poll(now)
            .map(|burst| vec![self.scroll_text(&burst.label())])
            .unwrap_or_default()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scroll.deadline()
    }

    fn scroll_text(&self, label: &str) -> Notification {
        Notification::ShowText(format_combo(self.modifiers, label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifier;
    use std::time::Duration;

    fn texts(notifications: &[Notification]) -> Vec<&str> {
        notifications
            .iter()
            .filter_map(|n| match n {
                Notification::ShowText(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ctrl_one_activates_zoom() {
        let now = Instant::now();
        let mut dispatcher = InputDispatcher::new();
        let shown = dispatcher.handle(RawInput::KeyDown(RawKey::Modifier(Modifier::Ctrl)), now);
        assert_eq!(texts(&shown), vec!["Ctrl"]);
        let out = dispatcher.handle(RawInput::KeyDown(RawKey::Char('1')), now);
        assert_eq!(out[0], Notification::Shortcut(Shortcut::ActivateZoom));
        assert_eq!(texts(&out), vec!["Ctrl+1"]);

        dispatcher.handle(RawInput::KeyUp(RawKey::Modifier(Modifier::Ctrl)), now);
        let plain = dispatcher.handle(RawInput::KeyDown(RawKey::Char('1')), now);
        assert_eq!(plain, vec![Notification::ShowText("1".to_owned())]);
    }

    #[test]
    fn held_modifier_repeat_is_shown_once() {
        let now = Instant::now();
        let mut dispatcher = InputDispatcher::new();
        let shift = RawInput::KeyDown(RawKey::Modifier(Modifier::Shift));
        assert_eq!(dispatcher.handle(shift, now).len(), 1);
        assert!(dispatcher.handle(shift, now).is_empty());
        assert!(dispatcher.modifiers().shift);
    }

    #[test]
    fn mouse_buttons_produce_ripples() {
        let now = Instant::now();
        let mut dispatcher = InputDispatcher::new();
        let at = Point::new(3.0, 4.0);
        let down = dispatcher.handle(
            RawInput::ButtonDown {
                button: MouseButton::Left,
                position: at,
            },
            now,
        );
        assert_eq!(texts(&down), vec!["Mouse Left"]);
        let up = dispatcher.handle(
            RawInput::ButtonUp {
                button: MouseButton::Left,
                position: at,
            },
            now,
        );
        assert_eq!(
            up,
            vec![Notification::ClickRipple {
                position: at,
                button: MouseButton::Left,
                phase: RipplePhase::Release,
            }]
        );
        let middle = dispatcher.handle(
            RawInput::ButtonDown {
                button: MouseButton::Middle,
                position: at,
            },
            now,
        );
        assert!(middle.contains(&Notification::ClickRipple {
            position: at,
            button: MouseButton::Middle,
            phase: RipplePhase::Click,
        }));
    }

    #[test]
    fn scroll_bursts_are_reported_once() {
        let t0 = Instant::now();
        let mut dispatcher = InputDispatcher::new();
        let tick = RawInput::Wheel {
            direction: ScrollDirection::Down,
            position: Point::ZERO,
        };
        for i in 0..3 {
            let out = dispatcher.handle(tick, t0 + Duration::from_millis(i * 50));
            assert!(texts(&out).is_empty());
            assert!(matches!(out[0], Notification::ScrollEffect { .. }));
        }
        let out = dispatcher.poll(t0 + Duration::from_secs(1));
        assert_eq!(texts(&out), vec!["down x3"]);
        assert!(dispatcher.poll(t0 + Duration::from_secs(2)).is_empty());
    }
}
