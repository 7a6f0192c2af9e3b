use crate::zoom::transform::ViewTransform;
use kurbo::{Point, Size, Vec2};

pub const SCALE_MIN: f64 = 1.0;
pub const SCALE_MAX: f64 = 5.0;
pub const SCALE_STEP: f64 = 0.2;
const MAX_STEPS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Zoom and pan state of a session.
///
/// The scale is kept as a whole number of steps above `SCALE_MIN` so that any
/// sequence of zoom changes returning to the same step count lands on exactly the
/// same scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomPan {
    steps: u32,
    zoom_center: Point,
    pan: Vec2,
    viewport: Size,
    image: Size,
}

impl ZoomPan {
    pub fn new(viewport: Size) -> Self {
        Self {
            steps: 0,
            zoom_center: viewport.to_rect().center(),
            pan: Vec2::ZERO,
            viewport,
            image: viewport,
        }
    }

    pub fn scale(&self) -> f64 {
        scale_for_steps(self.steps)
    }

    pub fn zoom_center(&self) -> Point {
        self.zoom_center
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn image_size(&self) -> Size {
        self.image
    }

    pub fn viewport_center(&self) -> Point {
        self.viewport.to_rect().center()
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn set_image_size(&mut self, image: Size) {
        self.image = image;
    }

    pub fn set_zoom_center(&mut self, center: Point) {
        self.zoom_center = center;
    }

    /// Unit scale with no pan: frames are drawn without any transform.
    pub fn is_reset(&self) -> bool {
        self.steps == 0 && self.pan == Vec2::ZERO
    }

    pub fn transform(&self) -> ViewTransform {
        if self.is_reset() {
            return ViewTransform::identity();
        }
        ViewTransform::new(self.scale(), self.zoom_center, self.pan)
    }

    /// Wheel zoom in; the image point under `anchor` stays under it.
    pub fn zoom_in(&mut self, anchor: Point) -> bool {
        if self.steps >= MAX_STEPS {
            return false;
        }
        let image_point = self.transform().to_image(anchor);
        self.steps += 1;
        self.zoom_center = anchor;
        self.pan = Vec2::ZERO;
        let landed = self.transform().to_screen(image_point);
        self.pan = anchor - landed;
        self.adjust_pan_offset();
        true
    }

    /// Wheel zoom out. The zoom center drifts toward the viewport center the
    /// closer the old scale was to `SCALE_MIN`.
    pub fn zoom_out(&mut self) -> bool {
        if self.steps == 0 {
            return false;
        }
        let old_scale = self.scale();
        let screen_center = self.viewport_center();
        let image_at_center = self.transform().to_image(screen_center);

        let position = (old_scale - SCALE_MIN) / (SCALE_MAX - SCALE_MIN);
        let blend = 1.0 - position;
        self.zoom_center = self.zoom_center.lerp(screen_center, blend);
        self.steps -= 1;

        let landed = self.transform().to_screen(image_at_center);
        self.pan += self.zoom_center - landed;
        self.adjust_pan_offset();
        true
    }

    /// Keyboard zoom re-centered on the viewport.
    pub fn step_zoom(&mut self, direction: ZoomDirection) -> bool {
        let changed = match direction {
            ZoomDirection::In if self.steps < MAX_STEPS => {
                self.steps += 1;
                true
            }
            ZoomDirection::Out if self.steps > 0 => {
                self.steps -= 1;
                true
            }
            _ => false,
        };
        if changed {
            self.zoom_center = self.viewport_center();
            self.adjust_pan_offset();
        }
        changed
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub fn reset(&mut self) {
        self.steps = 0;
        self.pan = Vec2::ZERO;
    }

    /// At unit scale the image is centered exactly; above it the scaled image may
    /// only move as far as keeps the viewport covered.
    fn adjust_pan_offset(&mut self) {
        let scale = self.scale();
        let scaled = Size::new(self.image.width * scale, self.image.height * scale);
        if scale <= SCALE_MIN {
            self.pan = Vec2::new(
                (self.viewport.width - scaled.width) / 2.0,
                (self.viewport.height - scaled.height) / 2.0,
            );
            return;
        }
        let max_x = ((scaled.width - self.viewport.width) / 2.0).max(0.0);
        let max_y = ((scaled.height - self.viewport.height) / 2.0).max(0.0);
        self.pan = Vec2::new(
            self.pan.x.clamp(-max_x, max_x),
            self.pan.y.clamp(-max_y, max_y),
        );
    }
}

fn scale_for_steps(steps: u32) -> f64 {
    SCALE_MIN + f64::from(steps) * SCALE_STEP
}
