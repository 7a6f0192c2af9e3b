use crate::input::RawKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Win,
}

impl Modifier {
    pub const ORDER: [Modifier; 4] = [Self::Ctrl, Self::Shift, Self::Alt, Self::Win];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Shift => "Shift",
            Self::Alt => "Alt",
            Self::Win => "Win",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierSet {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub win: bool,
}

impl ModifierSet {
    pub fn contains(self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Ctrl => self.ctrl,
            Modifier::Shift => self.shift,
            Modifier::Alt => self.alt,
            Modifier::Win => self.win,
        }
    }

    pub fn set(&mut self, modifier: Modifier, down: bool) {
        match modifier {
            Modifier::Ctrl => self.ctrl = down,
            Modifier::Shift => self.shift = down,
            Modifier::Alt => self.alt = down,
            Modifier::Win => self.win = down,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::default()
    }
}

/// `Ctrl+Shift+Alt+Win+key`, modifiers in that fixed order. An empty `key`
/// yields just the held modifiers.
pub fn format_combo(modifiers: ModifierSet, key: &str) -> String {
    let mut parts: Vec<&str> = Modifier::ORDER
        .iter()
        .filter(|m| modifiers.contains(**m))
        .map(|m| m.label())
        .collect();
    if !key.is_empty() {
        parts.push(key);
    }
    parts.join("+")
}

pub fn key_label(key: RawKey) -> Option<String> {
    match key {
        RawKey::Char(' ') => Some("Space".to_owned()),
        RawKey::Char(c) => Some(c.to_string()),
        RawKey::Named(name) => Some(name.to_owned()),
        RawKey::Modifier(_) | RawKey::Unknown => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    ActivateZoom,
    IncreaseCursor,
    DecreaseCursor,
    ToggleCursor,
}

impl Shortcut {
    pub fn display(self) -> &'static str {
        match self {
            Self::ActivateZoom => "Ctrl+1",
            Self::IncreaseCursor => "Ctrl+Shift++",
            Self::DecreaseCursor => "Ctrl+Shift+-",
            Self::ToggleCursor => "Alt+C",
        }
    }
}

pub fn match_shortcut(modifiers: ModifierSet, key: RawKey) -> Option<Shortcut> {
    let RawKey::Char(c) = key else {
        return None;
    };
    let ModifierSet {
        ctrl, shift, alt, ..
    } = modifiers;
    match (ctrl, shift, alt) {
        (true, true, false) if c == '+' || c == '=' => Some(Shortcut::IncreaseCursor),
        (true, true, false) if c == '-' => Some(Shortcut::DecreaseCursor),
        (true, false, false) if c == '1' => Some(Shortcut::ActivateZoom),
        (false, false, true) if c.eq_ignore_ascii_case(&'c') => Some(Shortcut::ToggleCursor),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(ctrl: bool, shift: bool, alt: bool) -> ModifierSet {
        ModifierSet {
            ctrl,
            shift,
            alt,
            win: false,
        }
    }

    #[test]
    fn combo_uses_fixed_modifier_order() {
        let all = ModifierSet {
            ctrl: true,
            shift: true,
            alt: true,
            win: true,
        };
        assert_eq!(format_combo(all, "x"), "Ctrl+Shift+Alt+Win+x");
        assert_eq!(format_combo(mods(false, true, true), ""), "Shift+Alt");
        assert_eq!(format_combo(ModifierSet::default(), "Enter"), "Enter");
    }

    #[test]
    fn shortcuts_need_exact_modifiers() {
        assert_eq!(
            match_shortcut(mods(true, false, false), RawKey::Char('1')),
            Some(Shortcut::ActivateZoom)
        );
        assert_eq!(match_shortcut(mods(true, true, false), RawKey::Char('1')), None);
        assert_eq!(
            match_shortcut(mods(true, true, false), RawKey::Char('=')),
            Some(Shortcut::IncreaseCursor)
        );
        assert_eq!(
            match_shortcut(mods(true, true, false), RawKey::Char('-')),
            Some(Shortcut::DecreaseCursor)
        );
        assert_eq!(
            match_shortcut(mods(false, false, true), RawKey::Char('C')),
            Some(Shortcut::ToggleCursor)
        );
        assert_eq!(match_shortcut(mods(false, false, false), RawKey::Char('c')), None);
    }

    #[test]
    fn modifiers_have_no_label() {
        assert_eq!(key_label(RawKey::Modifier(Modifier::Alt)), None);
        assert_eq!(key_label(RawKey::Char(' ')).as_deref(), Some("Space"));
    }
}
