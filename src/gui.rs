use crate::cursor::{CircleCursor, CursorOverlay};
use crate::input::{GlobalInputHook, InputDispatcher, Notification, Shortcut};
use crate::settings::{SettingsStore, SettingsWatcher, ToolSettings};
use crate::zoom::input::{KeyCode, KeyEvent, KeyModifiers, PointerButton, PointerModifiers};
use crate::zoom::render::HudText;
use crate::zoom::{DesktopGrabber, SessionEvent, ZoomSession};
use eframe::egui;
use kurbo::{Point, Size};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

const FALLBACK_VIEWPORT: Size = Size::new(1920.0, 1080.0);
const IDLE_REPAINT: Duration = Duration::from_millis(250);

pub struct OverlayApp {
    watcher: SettingsWatcher,
    dispatcher: InputDispatcher,
    hook: GlobalInputHook,
    cursor: CircleCursor,
    session: ZoomSession,
    session_events: Receiver<SessionEvent>,
    texture: Option<egui::TextureHandle>,
    hud: Vec<HudText>,
    last_pointer: Option<Point>,
    was_focused: bool,
    activate_on_start: bool,
    exit_after_close: bool,
}

impl OverlayApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings_path: PathBuf) -> Self {
        let store = SettingsStore::load_or_default(&settings_path);
        let tool_settings = ToolSettings::from_store(&store);
        let (events_tx, session_events) = channel();
        let session = ZoomSession::new(
            tool_settings.clone(),
            FALLBACK_VIEWPORT,
            Box::new(DesktopGrabber),
            events_tx,
        );

        let mut hook = GlobalInputHook::default();
        let ctx = cc.egui_ctx.clone();
        let hook_started = match hook.start(Box::new(move || ctx.request_repaint())) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(?err, "global input unavailable, starting a single zoom session");
                false
            }
        };

        Self {
            watcher: SettingsWatcher::new(settings_path),
            dispatcher: InputDispatcher::new(),
            hook,
            cursor: CircleCursor::new(tool_settings.cursor_color),
            session,
            session_events,
            texture: None,
            hud: Vec::new(),
            last_pointer: None,
            was_focused: true,
            activate_on_start: !hook_started,
            exit_after_close: !hook_started,
        }
    }

    fn handle_notification(&mut self, ctx: &egui::Context, notification: Notification, now: Instant) {
        match notification {
            Notification::Shortcut(Shortcut::ActivateZoom) => self.activate(ctx, now),
            Notification::Shortcut(Shortcut::ToggleCursor) => {
                self.cursor.toggle();
            }
            Notification::Shortcut(Shortcut::IncreaseCursor) => {
                self.cursor.increase();
            }
            Notification::Shortcut(Shortcut::DecreaseCursor) => {
                self.cursor.decrease();
            }
            Notification::PointerMoved(position) => {
                self.last_pointer = Some(position);
                self.cursor.set_position(position);
            }
            Notification::ShowText(text) => tracing::debug!(%text, "input shown"),
            other => tracing::trace!(?other, "visual feedback"),
        }
    }

    fn activate(&mut self, ctx: &egui::Context, now: Instant) {
        if self.session.is_live() {
            tracing::debug!("activation shortcut ignored while zoom is live");
            return;
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));
        let pointer = self
            .last_pointer
            .unwrap_or_else(|| self.session.state().view.viewport_center());
        if let Err(err) = self.session.activate(now, &mut self.cursor, pointer) {
            tracing::warn!(?err, "zoom session did not start");
        }
    }

    fn drain_session_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.session_events.try_recv() {
            match event {
                SessionEvent::Activated => {
                    if let Some(backdrop) = self.session.backdrop() {
                        let size = Size::new(f64::from(backdrop.width()), f64::from(backdrop.height()));
                        self.session.set_viewport(size);
                    }
                    ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
                    ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(true));
                    ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
                }
                SessionEvent::ReclaimFocus => {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
                }
                SessionEvent::ActivationFailed { reason } => {
                    tracing::warn!(%reason, "zoom activation failed");
                }
                SessionEvent::Closed => {
                    self.texture = None;
                    self.hud.clear();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
                    ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));
                    if self.exit_after_close {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                }
            }
        }
    }

    fn forward_window_input(&mut self, ctx: &egui::Context) {
        let ppp = f64::from(ctx.pixels_per_point());
        let to_px = |pos: egui::Pos2| Point::new(f64::from(pos.x) * ppp, f64::from(pos.y) * ppp);
        let (events, scroll, focused) =
            ctx.input(|i| (i.events.clone(), i.raw_scroll_delta, i.viewport().focused));

        for event in events {
            match event {
                egui::Event::PointerMoved(pos) => self.session.pointer_move(to_px(pos)),
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    modifiers,
                } => {
                    let point = to_px(pos);
                    let button = map_button(button);
                    if pressed {
                        let modifiers = PointerModifiers {
                            ctrl: modifiers.ctrl || modifiers.command,
                            shift: modifiers.shift,
                        };
                        self.session.pointer_down(point, button, modifiers);
                    } else {
                        self.session.pointer_up(point, button);
                    }
                }
                egui::Event::Key {
                    key,
                    physical_key,
                    pressed: true,
                    modifiers,
                    ..
                } => self.session.key_down(
                    map_key_event(key, physical_key, modifiers),
                    &mut self.cursor,
                ),
                _ => {}
            }
        }

        if scroll.y != 0.0 {
            let pointer = self.session.state().pointer;
            self.session.wheel(pointer, f64::from(scroll.y));
        }

        match focused {
            Some(false) if self.was_focused => {
                self.was_focused = false;
                self.session.focus_lost();
            }
            Some(true) if !self.was_focused => {
                self.was_focused = true;
                self.session.focus_gained();
            }
            _ => {}
        }
    }

    fn paint(&mut self, ctx: &egui::Context) {
        if let Some(frame) = self.session.render() {
            let size = [frame.image.width() as usize, frame.image.height() as usize];
            let image = egui::ColorImage::from_rgba_unmultiplied(size, frame.image.as_raw());
            match self.texture.as_mut() {
                Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
                None => {
                    self.texture =
                        Some(ctx.load_texture("zoom-frame", image, egui::TextureOptions::NEAREST));
                }
            }
            self.hud = frame.hud;
        }

        let ppp = ctx.pixels_per_point();
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let Some(texture) = &self.texture else {
                    return;
                };
                let painter = ui.painter();
                painter.image(
                    texture.id(),
                    ui.max_rect(),
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
                for line in &self.hud {
                    painter.text(
                        egui::pos2(line.position.x as f32 / ppp, line.position.y as f32 / ppp),
                        egui::Align2::LEFT_BOTTOM,
                        &line.text,
                        egui::FontId::proportional(14.0),
                        egui::Color32::WHITE,
                    );
                }
            });
    }

    fn next_wakeup(&self, now: Instant) -> Duration {
        [self.session.next_deadline(), self.dispatcher.next_deadline()]
            .into_iter()
            .flatten()
            .map(|deadline| deadline.saturating_duration_since(now))
            .min()
            .unwrap_or(IDLE_REPAINT)
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        for raw in self.hook.drain_events() {
            for notification in self.dispatcher.handle(raw, now) {
                self.handle_notification(ctx, notification, now);
            }
        }
        for notification in self.dispatcher.poll(now) {
            self.handle_notification(ctx, notification, now);
        }

        if let Some(store) = self.watcher.poll() {
            let tool_settings = ToolSettings::from_store(&store);
            self.cursor.set_color(tool_settings.cursor_color);
            self.session.apply_settings(tool_settings);
        }

        if self.activate_on_start {
            self.activate_on_start = false;
            self.activate(ctx, now);
        }

        self.session.tick(now, &mut self.cursor);
        self.drain_session_events(ctx);

        if self.session.is_drawing_active() {
            self.forward_window_input(ctx);
            self.drain_session_events(ctx);
            self.paint(ctx);
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(self.next_wakeup(now));
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }
}

pub fn map_button(button: egui::PointerButton) -> PointerButton {
    match button {
        egui::PointerButton::Primary => PointerButton::Primary,
        egui::PointerButton::Secondary => PointerButton::Secondary,
        _ => PointerButton::Other,
    }
}

pub fn map_key(key: egui::Key) -> KeyCode {
    use egui::Key;
    match key {
        Key::Num0 => KeyCode::Digit(0),
        Key::Num1 => KeyCode::Digit(1),
        Key::Num2 => KeyCode::Digit(2),
        Key::Num3 => KeyCode::Digit(3),
        Key::Num4 => KeyCode::Digit(4),
        Key::Num5 => KeyCode::Digit(5),
        Key::Num6 => KeyCode::Digit(6),
        Key::Num7 => KeyCode::Digit(7),
        Key::Num8 => KeyCode::Digit(8),
        Key::Num9 => KeyCode::Digit(9),
        Key::Plus => KeyCode::Plus,
        Key::Equals => KeyCode::Equals,
        Key::Minus => KeyCode::Minus,
        Key::R => KeyCode::R,
        Key::Escape => KeyCode::Escape,
        _ => KeyCode::Other,
    }
}

/// A shifted `=` reports the logical key `+`; the physical key keeps it `=`
/// so Ctrl+Shift+= stays a cursor shortcut instead of a zoom.
pub fn map_key_event(
    key: egui::Key,
    physical_key: Option<egui::Key>,
    modifiers: egui::Modifiers,
) -> KeyEvent {
    let key = match (key, physical_key) {
        (egui::Key::Plus, Some(egui::Key::Equals)) if modifiers.shift => KeyCode::Equals,
        _ => map_key(key),
    };
    KeyEvent {
        key,
        modifiers: KeyModifiers {
            ctrl: modifiers.ctrl || modifiers.command,
            shift: modifiers.shift,
            alt: modifiers.alt,
        },
    }
}
