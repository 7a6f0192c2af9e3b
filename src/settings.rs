use crate::zoom::model::Color;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const SETTINGS_FILE_NAME: &str = "lecture_show.json";

pub mod keys {
    pub const PEN_COLORS: [&str; 3] = ["pen/color1", "pen/color2", "pen/color3"];
    pub const PEN_WIDTH: &str = "pen/width";
    pub const HIGHLIGHT_COLORS: [&str; 3] =
        ["highlight/color1", "highlight/color2", "highlight/color3"];
    pub const HIGHLIGHT_OPACITY: &str = "highlight/opacity";
    pub const HIGHLIGHT_WIDTH: &str = "highlight/width";
    pub const CURSOR_COLOR: &str = "cursor/color";
    pub const LOG_DEBUG: &str = "log/debug";
    pub const LOG_FILE: &str = "log/file";
}

const DEFAULT_PEN_COLORS: [Color; 3] = [Color::RED, Color::GREEN, Color::BLUE];
const DEFAULT_PEN_WIDTH: u32 = 3;
const DEFAULT_HIGHLIGHT_COLORS: [Color; 3] = [
    Color::rgb(255, 255, 0),
    Color::rgb(144, 238, 144),
    Color::rgb(255, 105, 180),
];
const DEFAULT_HIGHLIGHT_OPACITY: u32 = 64;
const DEFAULT_HIGHLIGHT_WIDTH: u32 = 20;
const DEFAULT_CURSOR_COLOR: Color = Color::rgb(0, 120, 215);
/// The circle cursor is always drawn at 20% opacity.
pub const CURSOR_ALPHA: u8 = 51;

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}

/// Flat key/value configuration, stored as a single JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsStore {
    values: Map<String, Value>,
}

impl SettingsStore {
    pub fn from_json_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(content).context("parse settings json")?;
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(anyhow!("settings root must be an object, found {other}")),
        }
    }

    /// A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("deserialize settings file {}", path.display()))
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "settings unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings parent folder {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.values).context("serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("write settings file {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_owned(), value.into());
    }

    pub fn set_color(&mut self, key: &str, color: Color) {
        self.set(key, color_to_hex(color));
    }

    pub fn color(&self, key: &str, default: Color) -> Color {
        let Some(value) = self.get(key) else {
            return default;
        };
        parse_color(value).unwrap_or_else(|| {
            tracing::warn!(key, %value, "malformed color setting, using default");
            default
        })
    }

    /// Out-of-range integers are clamped; anything that is not an integer falls
    /// back to `default`.
    pub fn int_clamped(&self, key: &str, default: u32, range: RangeInclusive<u32>) -> u32 {
        let Some(value) = self.get(key) else {
            return default;
        };
        let Some(raw) = value.as_i64() else {
            tracing::warn!(key, %value, "malformed integer setting, using default");
            return default;
        };
        let clamped = raw.clamp(i64::from(*range.start()), i64::from(*range.end()));
        if clamped != raw {
            tracing::warn!(key, raw, clamped, "integer setting out of range");
        }
        clamped as u32
    }

    pub fn bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorValue {
    Hex(String),
    Channels(Vec<u8>),
    Fields {
        r: u8,
        g: u8,
        b: u8,
        #[serde(default = "opaque")]
        a: u8,
    },
}

fn opaque() -> u8 {
    255
}

/// Accepts `"#RRGGBB"`, `"#RRGGBBAA"`, `[r, g, b]`, `[r, g, b, a]` and
/// `{"r", "g", "b", "a"?}`.
pub fn parse_color(value: &Value) -> Option<Color> {
    match ColorValue::deserialize(value).ok()? {
        ColorValue::Hex(hex) => parse_hex_color(&hex),
        ColorValue::Channels(channels) => match channels.as_slice() {
            [r, g, b] => Some(Color::rgb(*r, *g, *b)),
            [r, g, b, a] => Some(Color::rgba(*r, *g, *b, *a)),
            _ => None,
        },
        ColorValue::Fields { r, g, b, a } => Some(Color::rgba(r, g, b, a)),
    }
}

fn parse_hex_color(text: &str) -> Option<Color> {
    let digits = text.trim().strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    match digits.len() {
        6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

pub fn color_to_hex(color: Color) -> String {
    if color.a == 255 {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            color.r, color.g, color.b, color.a
        )
    }
}

/// Tool configuration as read at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub pen_colors: [Color; 3],
    pub pen_width: u32,
    /// Already carries `highlight_opacity` as alpha.
    pub highlight_colors: [Color; 3],
    pub highlight_opacity: u8,
    pub highlight_width: u32,
    /// Already carries `CURSOR_ALPHA`.
    pub cursor_color: Color,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_store(&SettingsStore::default())
    }
}

impl ToolSettings {
    pub fn from_store(store: &SettingsStore) -> Self {
        let opacity = store.int_clamped(keys::HIGHLIGHT_OPACITY, DEFAULT_HIGHLIGHT_OPACITY, 1..=255) as u8;
        let pen_colors = std::array::from_fn(|i| {
            store.color(keys::PEN_COLORS[i], DEFAULT_PEN_COLORS[i])
        });
        let highlight_colors = std::array::from_fn(|i| {
            store
                .color(keys::HIGHLIGHT_COLORS[i], DEFAULT_HIGHLIGHT_COLORS[i])
                .with_alpha(opacity)
        });
        Self {
            pen_colors,
            pen_width: store.int_clamped(keys::PEN_WIDTH, DEFAULT_PEN_WIDTH, 1..=20),
            highlight_colors,
            highlight_opacity: opacity,
            highlight_width: store.int_clamped(keys::HIGHLIGHT_WIDTH, DEFAULT_HIGHLIGHT_WIDTH, 1..=50),
            cursor_color: store
                .color(keys::CURSOR_COLOR, DEFAULT_CURSOR_COLOR)
                .with_alpha(CURSOR_ALPHA),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogSettings {
    pub debug: bool,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_store(store: &SettingsStore) -> Self {
        Self {
            debug: store.bool(keys::LOG_DEBUG, false),
            file: store
                .string(keys::LOG_FILE)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Reports a fresh store whenever the settings file's modification time moves.
#[derive(Debug)]
pub struct SettingsWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl SettingsWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_modified = modified_time(&path);
        Self {
            path,
            last_modified,
        }
    }

    pub fn poll(&mut self) -> Option<SettingsStore> {
        let modified = modified_time(&self.path);
        if modified == self.last_modified {
            return None;
        }
        self.last_modified = modified;
        tracing::debug!(path = %self.path.display(), "settings file changed");
        Some(SettingsStore::load_or_default(&self.path))
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
