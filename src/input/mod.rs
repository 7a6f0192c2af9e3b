pub mod combo;
pub mod dispatch;
pub mod hook;
pub mod scroll;

use kurbo::Point;

pub use combo::{format_combo, match_shortcut, Modifier, ModifierSet, Shortcut};
pub use dispatch::{InputDispatcher, Notification, RipplePhase};
pub use hook::GlobalInputHook;
pub use scroll::{ScrollAggregator, ScrollBurst};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKey {
    Modifier(Modifier),
    Char(char),
    Named(&'static str),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// System-wide input as reported by the hook thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    KeyDown(RawKey),
    KeyUp(RawKey),
    ButtonDown { button: MouseButton, position: Point },
    ButtonUp { button: MouseButton, position: Point },
    PointerMove { position: Point },
    Wheel { direction: ScrollDirection, position: Point },
}
