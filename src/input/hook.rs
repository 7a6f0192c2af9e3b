use crate::input::RawInput;
use anyhow::Result;
use std::sync::mpsc::Receiver;

/// Called from the hook thread after each forwarded event so the UI loop
/// wakes up and drains the channel.
pub type Waker = Box<dyn Fn() + Send + 'static>;

/// System-wide keyboard and mouse listener. The listener thread only forwards
/// `RawInput` values; everything else happens where `drain_events` is called.
#[derive(Debug, Default)]
pub struct GlobalInputHook {
    receiver: Option<Receiver<RawInput>>,
}

impl GlobalInputHook {
    pub fn from_receiver(receiver: Receiver<RawInput>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    pub fn start(&mut self, waker: Waker) -> Result<()> {
        if self.receiver.is_some() {
            return Ok(());
        }

        #[cfg(windows)]
        {
            let (tx, rx) = std::sync::mpsc::channel();
            platform::spawn_listener(tx, waker)?;
            self.receiver = Some(rx);
            Ok(())
        }
        #[cfg(not(windows))]
        {
            drop(waker);
            Err(anyhow::anyhow!(
                "global input hook is only implemented for Windows"
            ))
        }
    }

    pub fn is_running(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn drain_events(&self) -> Vec<RawInput> {
        self.receiver
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default()
    }
}

#[cfg(windows)]
mod platform {
    use super::Waker;
    use crate::input::{Modifier, MouseButton, RawInput, RawKey, ScrollDirection};
    use anyhow::{anyhow, Context, Result};
    use kurbo::Point;
    use rdev::{listen, Button, Event, EventType, Key};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::Sender;

    static LISTENING: AtomicBool = AtomicBool::new(false);

    pub fn spawn_listener(tx: Sender<RawInput>, waker: Waker) -> Result<()> {
        if LISTENING.swap(true, Ordering::SeqCst) {
            return Err(anyhow!("global input hook is already listening"));
        }
        let spawned = std::thread::Builder::new()
            .name("input-hook".to_owned())
            .spawn(move || {
                let mut position = Point::ZERO;
                let result = listen(move |event| {
                    if let Some(input) = translate(&event, &mut position) {
                        if tx.send(input).is_ok() {
                            waker();
                        }
                    }
                });
                if let Err(err) = result {
                    tracing::warn!(?err, "global input hook stopped");
                }
                LISTENING.store(false, Ordering::SeqCst);
            })
            .context("spawn input hook thread");
        if spawned.is_err() {
            LISTENING.store(false, Ordering::SeqCst);
        }
        spawned.map(|_| ())
    }

    fn translate(event: &Event, position: &mut Point) -> Option<RawInput> {
        let input = match event.event_type {
            EventType::KeyPress(key) => RawInput::KeyDown(map_key(key)),
            EventType::KeyRelease(key) => RawInput::KeyUp(map_key(key)),
            EventType::ButtonPress(button) => RawInput::ButtonDown {
                button: map_button(button),
                position: *position,
            },
            EventType::ButtonRelease(button) => RawInput::ButtonUp {
                button: map_button(button),
                position: *position,
            },
            EventType::MouseMove { x, y } => {
                *position = Point::new(x, y);
                RawInput::PointerMove {
                    position: *position,
                }
            }
            EventType::Wheel { delta_y, .. } => {
                let direction = match delta_y {
                    d if d > 0 => ScrollDirection::Up,
                    d if d < 0 => ScrollDirection::Down,
                    _ => return None,
                };
                RawInput::Wheel {
                    direction,
                    position: *position,
                }
            }
        };
        Some(input)
    }

    fn map_button(button: Button) -> MouseButton {
        match button {
            Button::Left => MouseButton::Left,
            Button::Right => MouseButton::Right,
            Button::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }

    fn map_key(key: Key) -> RawKey {
        match key {
            Key::ControlLeft | Key::ControlRight => RawKey::Modifier(Modifier::Ctrl),
            Key::ShiftLeft | Key::ShiftRight => RawKey::Modifier(Modifier::Shift),
            Key::Alt | Key::AltGr => RawKey::Modifier(Modifier::Alt),
            Key::MetaLeft | Key::MetaRight => RawKey::Modifier(Modifier::Win),
            Key::Num0 => RawKey::Char('0'),
            Key::Num1 => RawKey::Char('1'),
            Key::Num2 => RawKey::Char('2'),
            Key::Num3 => RawKey::Char('3'),
            Key::Num4 => RawKey::Char('4'),
            Key::Num5 => RawKey::Char('5'),
            Key::Num6 => RawKey::Char('6'),
            Key::Num7 => RawKey::Char('7'),
            Key::Num8 => RawKey::Char('8'),
            Key::Num9 => RawKey::Char('9'),
            Key::Equal => RawKey::Char('='),
            Key::Minus | Key::KpMinus => RawKey::Char('-'),
            Key::KpPlus => RawKey::Char('+'),
            Key::Space => RawKey::Char(' '),
            Key::Return | Key::KpReturn => RawKey::Named("Enter"),
            Key::Escape => RawKey::Named("Esc"),
            Key::Tab => RawKey::Named("Tab"),
            Key::Backspace => RawKey::Named("Backspace"),
            Key::Delete => RawKey::Named("Delete"),
            Key::UpArrow => RawKey::Named("Up"),
            Key::DownArrow => RawKey::Named("Down"),
            Key::LeftArrow => RawKey::Named("Left"),
            Key::RightArrow => RawKey::Named("Right"),
            other => letter(other).map_or(RawKey::Unknown, RawKey::Char),
        }
    }

    fn letter(key: Key) -> Option<char> {
        const LETTERS: [Key; 26] = [
            Key::KeyA,
            Key::KeyB,
            Key::KeyC,
            Key::KeyD,
            Key::KeyE,
            Key::KeyF,
            Key::KeyG,
            Key::KeyH,
            Key::KeyI,
            Key::KeyJ,
            Key::KeyK,
            Key::KeyL,
            Key::KeyM,
            Key::KeyN,
            Key::KeyO,
            Key::KeyP,
            Key::KeyQ,
            Key::KeyR,
            Key::KeyS,
            Key::KeyT,
            Key::KeyU,
            Key::KeyV,
            Key::KeyW,
            Key::KeyX,
            Key::KeyY,
            Key::KeyZ,
        ];
        let index = LETTERS.iter().position(|k| *k == key)?;
        char::from_u32(u32::from(b'a') + index as u32)
    }
}
