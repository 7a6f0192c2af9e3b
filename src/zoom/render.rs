use crate::zoom::model::{Color, HighlighterPath, Segment, StrokeStyle};
use crate::zoom::state::SessionState;
use crate::zoom::view::SCALE_MIN;
use image::{Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use std::ops::Range;

const FRAME_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const ERASER_FILL: Color = Color::rgba(255, 0, 0, 60);
const ERASER_BORDER: Color = Color::rgba(0, 0, 0, 180);
const HUD_LEFT: f64 = 10.0;
const MIN_STROKE_RADIUS: f64 = 0.5;
/// Longest miter from the joint, in stroke widths.
const MITER_LIMIT: f64 = 2.0;

/// Screen-space text the shell draws on top of the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HudText {
    pub text: String,
    pub position: Point,
}

impl HudText {
    fn at_line(text: String, baseline: f64) -> Self {
        Self {
            text,
            position: Point::new(HUD_LEFT, baseline),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    pub hud: Vec<HudText>,
}

pub struct FrameInputs<'a> {
    pub backdrop: &'a RgbaImage,
    pub state: &'a SessionState,
    pub in_progress: Option<&'a HighlighterPath>,
    pub erasing: bool,
}

/// Composites one frame. Returns `None` when the viewport has no pixels.
pub fn render_frame(inputs: FrameInputs<'_>) -> Option<Frame> {
    let state = inputs.state;
    let viewport = state.view.viewport();
    let width = viewport.width.round().max(0.0) as u32;
    let height = viewport.height.round().max(0.0) as u32;
    if width == 0 || height == 0 {
        return None;
    }

    let mut image = RgbaImage::from_pixel(width, height, FRAME_BACKGROUND);
    {
        let mut painter = Painter::new(&mut image);
        if state.view.is_reset() {
            painter.copy_backdrop(inputs.backdrop);
            for (style, run) in style_runs(state.strokes.segments()) {
                painter.stroke_run(&state.strokes.segments()[run], style);
            }
            draw_highlights(&mut painter, state, inputs.in_progress);
        } else {
            painter.push_transform(state.view.transform().matrix());
            painter.draw_backdrop(inputs.backdrop);
            for segment in state.strokes.segments() {
                painter.stroke_segment(segment.start, segment.end, segment.style);
            }
            draw_highlights(&mut painter, state, inputs.in_progress);
            painter.pop_transform();
        }

        let cursor_size = state.tools.circle_cursor_size;
        if cursor_size > 0 {
            painter.fill_circle(
                state.pointer,
                f64::from(cursor_size) / 2.0,
                state.tools.circle_cursor_color,
            );
        }
        if inputs.erasing {
            let side = f64::from(state.tools.eraser_size);
            painter.outlined_rect(
                Rect::from_center_size(state.pointer, Size::new(side, side)),
                ERASER_FILL,
                ERASER_BORDER,
            );
        }
    }

    Some(Frame {
        image,
        hud: hud_lines(state, inputs.erasing),
    })
}

fn draw_highlights(
    painter: &mut Painter<'_>,
    state: &SessionState,
    in_progress: Option<&HighlighterPath>,
) {
    for path in state.strokes.highlighter_paths().iter().chain(in_progress) {
        painter.stroke_highlighter(path);
    }
}

pub fn hud_lines(state: &SessionState, erasing: bool) -> Vec<HudText> {
    let mut hud = Vec::new();
    let scale = state.view.scale();
    if scale != SCALE_MIN {
        hud.push(HudText::at_line(format!("Zoom ratio: {scale:.1}x"), 30.0));
    }
    let cursor_size = state.tools.circle_cursor_size;
    if cursor_size > 0 {
        hud.push(HudText::at_line(format!("Cursor size: {cursor_size}px"), 50.0));
    }
    if erasing {
        hud.push(HudText::at_line(
            format!("Eraser size: {}px", state.tools.eraser_size),
            70.0,
        ));
    }
    hud
}

/// Splits segments into maximal runs of consecutive equal style.
pub fn style_runs(segments: &[Segment]) -> Vec<(StrokeStyle, Range<usize>)> {
    let mut runs = Vec::new();
    let mut start = 0;
    for end in 1..=segments.len() {
        if end == segments.len() || segments[end].style != segments[start].style {
            runs.push((segments[start].style, start..end));
            start = end;
        }
    }
    runs
}

struct Painter<'a> {
    target: &'a mut RgbaImage,
    transforms: Vec<Affine>,
}

impl<'a> Painter<'a> {
    fn new(target: &'a mut RgbaImage) -> Self {
        Self {
            target,
            transforms: Vec::new(),
        }
    }

    fn push_transform(&mut self, transform: Affine) {
        self.transforms.push(transform);
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn current(&self) -> Affine {
        self.transforms.last().copied().unwrap_or(Affine::IDENTITY)
    }

    fn line_radius(&self, width: u32) -> f64 {
        let scale = self.current().determinant().abs().sqrt();
        (f64::from(width) * scale / 2.0).max(MIN_STROKE_RADIUS)
    }

    fn copy_backdrop(&mut self, backdrop: &RgbaImage) {
        let width = self.target.width().min(backdrop.width());
        let height = self.target.height().min(backdrop.height());
        for y in 0..height {
            for x in 0..width {
                self.target.put_pixel(x, y, *backdrop.get_pixel(x, y));
            }
        }
    }

    /// Nearest-neighbour sampling through the inverse of the current transform.
    fn draw_backdrop(&mut self, backdrop: &RgbaImage) {
        let inverse = self.current().inverse();
        let (src_w, src_h) = (f64::from(backdrop.width()), f64::from(backdrop.height()));
        for (x, y, pixel) in self.target.enumerate_pixels_mut() {
            let src = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if src.x < 0.0 || src.y < 0.0 || src.x >= src_w || src.y >= src_h {
                continue;
            }
            *pixel = *backdrop.get_pixel(src.x as u32, src.y as u32);
        }
    }

    fn stroke_segment(&mut self, start: Point, end: Point, style: StrokeStyle) {
        self.stroke_run(&[Segment::new(start, end, style)], style);
    }

    /// Pen segments sharing one style. The transform and radius are resolved
    /// once for the run; each segment still blends on its own.
    fn stroke_run(&mut self, segments: &[Segment], style: StrokeStyle) {
        let transform = self.current();
        let radius = self.line_radius(style.width);
        for segment in segments {
            let (a, b) = (transform * segment.start, transform * segment.end);
            let bounds = Rect::from_points(a, b).inflate(radius, radius);
            let Some(mut coverage) = Coverage::new(bounds, self.target) else {
                continue;
            };
            coverage.mark_within(bounds, |p| distance_sq_to_segment(p, a, b) <= radius * radius);
            coverage.blend_into(self.target, style.color);
        }
    }

    /// Flat ends and miter joins; the whole path blends once so overlaps do not
    /// darken.
    fn stroke_highlighter(&mut self, path: &HighlighterPath) {
        if path.is_empty() {
            return;
        }
        let transform = self.current();
        let radius = self.line_radius(path.style.width);
        let points: Vec<Point> = path.points.iter().map(|p| transform * *p).collect();
        let Some(bounds) = points
            .iter()
            .map(|p| Rect::from_points(*p, *p))
            .reduce(|acc, r| acc.union(r))
        else {
            return;
        };
        let reach = radius * MITER_LIMIT * 2.0;
        let Some(mut coverage) = Coverage::new(bounds.inflate(reach, reach), self.target) else {
            return;
        };
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let own = Rect::from_points(a, b).inflate(radius, radius);
            coverage.mark_within(own, |p| within_band(p, a, b, radius));
        }
        for corner in points.windows(3) {
            let Some(join) = MiterJoin::new(corner[0], corner[1], corner[2], radius) else {
                continue;
            };
            let own = Rect::from_center_size(corner[1], Size::new(reach * 2.0, reach * 2.0));
            coverage.mark_within(own, |p| join.contains(p));
        }
        coverage.blend_into(self.target, path.style.color);
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        let bounds = Rect::from_center_size(center, Size::new(radius * 2.0, radius * 2.0));
        let Some(mut coverage) = Coverage::new(bounds, self.target) else {
            return;
        };
        coverage.mark_within(bounds, |p| (p - center).hypot2() <= radius * radius);
        coverage.blend_into(self.target, color);
    }

    fn outlined_rect(&mut self, rect: Rect, fill: Color, border: Color) {
        let inner = rect.inflate(-1.0, -1.0);
        if let Some(mut body) = Coverage::new(rect, self.target) {
            body.mark_within(rect, |p| inner.contains(p));
            body.blend_into(self.target, fill);
        }
        if let Some(mut edge) = Coverage::new(rect, self.target) {
            edge.mark_within(rect, |p| rect.contains(p) && !inner.contains(p));
            edge.blend_into(self.target, border);
        }
    }
}

/// Pixels covered by one shape, clipped to the target.
struct Coverage {
    x0: i32,
    y0: i32,
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Coverage {
    fn new(bounds: Rect, target: &RgbaImage) -> Option<Self> {
        let x0 = (bounds.x0.floor() as i32).max(0);
        let y0 = (bounds.y0.floor() as i32).max(0);
        let x1 = (bounds.x1.ceil() as i32).min(target.width() as i32);
        let y1 = (bounds.y1.ceil() as i32).min(target.height() as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let (width, height) = (x1 - x0, y1 - y0);
        Some(Self {
            x0,
            y0,
            width,
            height,
            cells: vec![false; (width * height) as usize],
        })
    }

    fn mark_within(&mut self, bounds: Rect, hit: impl Fn(Point) -> bool) {
        let col_start = ((bounds.x0.floor() as i32) - self.x0).max(0);
        let row_start = ((bounds.y0.floor() as i32) - self.y0).max(0);
        let col_end = ((bounds.x1.ceil() as i32) - self.x0).min(self.width);
        let row_end = ((bounds.y1.ceil() as i32) - self.y0).min(self.height);
        for row in row_start..row_end {
            for col in col_start..col_end {
                let idx = (row * self.width + col) as usize;
                if self.cells[idx] {
                    continue;
                }
                let center = Point::new(
                    f64::from(self.x0 + col) + 0.5,
                    f64::from(self.y0 + row) + 0.5,
                );
                if hit(center) {
                    self.cells[idx] = true;
                }
            }
        }
    }

    fn blend_into(&self, target: &mut RgbaImage, color: Color) {
        for row in 0..self.height {
            for col in 0..self.width {
                if !self.cells[(row * self.width + col) as usize] {
                    continue;
                }
                let pixel = target.get_pixel_mut((self.x0 + col) as u32, (self.y0 + row) as u32);
                *pixel = blend_pixel(*pixel, color);
            }
        }
    }
}

fn distance_sq_to_segment(point: Point, start: Point, end: Point) -> f64 {
    let v = end - start;
    let w = point - start;
    let len_sq = v.hypot2();
    if len_sq <= f64::EPSILON {
        return w.hypot2();
    }
    let t = (w.dot(v) / len_sq).clamp(0.0, 1.0);
    (point - (start + v * t)).hypot2()
}

/// Inside the rectangle swept by the segment, without end caps.
fn within_band(point: Point, start: Point, end: Point, radius: f64) -> bool {
    let v = end - start;
    let len_sq = v.hypot2();
    if len_sq <= f64::EPSILON {
        return false;
    }
    let w = point - start;
    let t = w.dot(v) / len_sq;
    if !(0.0..=1.0).contains(&t) {
        return false;
    }
    (w - v * t).hypot2() <= radius * radius
}

/// Outer wedge between two consecutive bands, clipped at the miter limit.
struct MiterJoin {
    joint: Point,
    incoming: Vec2,
    outgoing: Vec2,
    outward: Vec2,
    radius: f64,
    reach: f64,
}

impl MiterJoin {
    fn new(prev: Point, joint: Point, next: Point, radius: f64) -> Option<Self> {
        let incoming = (joint - prev).normalize();
        let outgoing = (next - joint).normalize();
        let outward = (incoming - outgoing).normalize();
        if !incoming.is_finite() || !outgoing.is_finite() || !outward.is_finite() {
            return None;
        }
        Some(Self {
            joint,
            incoming,
            outgoing,
            outward,
            radius,
            reach: radius * MITER_LIMIT * 2.0,
        })
    }

    fn contains(&self, point: Point) -> bool {
        let offset = point - self.joint;
        offset.dot(self.incoming) >= 0.0
            && offset.dot(self.outgoing) <= 0.0
            && offset.cross(self.incoming).abs() <= self.radius
            && offset.cross(self.outgoing).abs() <= self.radius
            && offset.dot(self.outward) <= self.reach
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ToolSettings;

    fn state(size: f64) -> SessionState {
        SessionState::new(&ToolSettings::default(), Size::new(size, size))
    }

    fn gradient(size: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, _| Rgba([(x * 10) as u8, 0, 0, 255]))
    }

    fn frame(state: &SessionState, backdrop: &RgbaImage, erasing: bool) -> Frame {
        render_frame(FrameInputs {
            backdrop,
            state,
            in_progress: None,
            erasing,
        })
        .expect("frame")
    }

    #[test]
    fn empty_viewport_renders_nothing() {
        let state = state(0.0);
        let backdrop = gradient(4);
        let inputs = FrameInputs {
            backdrop: &backdrop,
            state: &state,
            in_progress: None,
            erasing: false,
        };
        assert!(render_frame(inputs).is_none());
    }

    #[test]
    fn reset_view_copies_backdrop_one_to_one() {
        let state = state(16.0);
        let backdrop = gradient(16);
        let frame = frame(&state, &backdrop, false);
        assert_eq!(frame.image.get_pixel(7, 3), &Rgba([70, 0, 0, 255]));
        assert!(frame.hud.is_empty());
    }

    #[test]
    fn panned_view_samples_backdrop_through_inverse() {
        let mut state = state(16.0);
        state.view.pan_by(Vec2::new(4.0, 0.0));
        let backdrop = gradient(16);
        let frame = frame(&state, &backdrop, false);
        assert_eq!(frame.image.get_pixel(10, 5), &Rgba([60, 0, 0, 255]));
        assert_eq!(frame.image.get_pixel(2, 5), &FRAME_BACKGROUND);
    }

    #[test]
    fn pen_segments_follow_the_view() {
        let mut state = state(16.0);
        let style = StrokeStyle::new(Color::GREEN, 3);
        state
            .strokes
            .append_segment(Segment::new(Point::new(2.0, 8.0), Point::new(6.0, 8.0), style));
        let backdrop = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));

        let still = frame(&state, &backdrop, false);
        assert_eq!(still.image.get_pixel(4, 8), &Rgba([0, 255, 0, 255]));
        assert_eq!(still.image.get_pixel(4, 2), &Rgba([0, 0, 0, 255]));

        state.view.pan_by(Vec2::new(6.0, 0.0));
        let panned = frame(&state, &backdrop, false);
        assert_eq!(panned.image.get_pixel(10, 8), &Rgba([0, 255, 0, 255]));
        assert_eq!(panned.image.get_pixel(3, 8), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn overlapping_highlighter_blends_once() {
        let mut state = state(16.0);
        let color = Color::rgba(255, 255, 0, 64);
        let mut path = HighlighterPath::start(Point::new(2.0, 8.0), StrokeStyle::new(color, 4));
        path.line_to(Point::new(13.0, 8.0));
        path.line_to(Point::new(2.0, 8.0));
        assert!(state.strokes.append_highlighter_path(path));
        let backdrop = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));

        let frame = frame(&state, &backdrop, false);
        let expected = blend_pixel(Rgba([0, 0, 0, 255]), color);
        assert_eq!(frame.image.get_pixel(8, 8), &expected);
    }

    #[test]
    fn translucent_pen_joint_matches_with_and_without_pan() {
        let mut state = state(16.0);
        let style = StrokeStyle::new(Color::rgba(255, 0, 0, 128), 6);
        state
            .strokes
            .append_segment(Segment::new(Point::new(2.0, 8.0), Point::new(8.0, 8.0), style));
        state
            .strokes
            .append_segment(Segment::new(Point::new(8.0, 8.0), Point::new(13.0, 8.0), style));
        let black = Rgba([0, 0, 0, 255]);
        let backdrop = RgbaImage::from_pixel(16, 16, black);

        let reset = frame(&state, &backdrop, false);
        state.view.pan_by(Vec2::new(1.0, 0.0));
        let panned = frame(&state, &backdrop, false);

        let twice = blend_pixel(blend_pixel(black, style.color), style.color);
        assert_eq!(reset.image.get_pixel(8, 8), &twice);
        assert_eq!(panned.image.get_pixel(9, 8), &twice);
        assert_eq!(reset.image.get_pixel(4, 8), panned.image.get_pixel(5, 8));
    }

    #[test]
    fn highlighter_corner_is_mitered() {
        let mut state = state(16.0);
        let color = Color::rgba(255, 255, 0, 64);
        let mut path = HighlighterPath::start(Point::new(2.0, 4.0), StrokeStyle::new(color, 4));
        path.line_to(Point::new(10.0, 4.0));
        path.line_to(Point::new(10.0, 12.0));
        assert!(state.strokes.append_highlighter_path(path));
        let black = Rgba([0, 0, 0, 255]);
        let backdrop = RgbaImage::from_pixel(16, 16, black);

        let frame = frame(&state, &backdrop, false);
        let once = blend_pixel(black, color);
        assert_eq!(frame.image.get_pixel(11, 2), &once);
        assert_eq!(frame.image.get_pixel(9, 5), &once);
        assert_eq!(frame.image.get_pixel(13, 2), &black);
        assert_eq!(frame.image.get_pixel(13, 13), &black);
    }

    #[test]
    fn style_runs_group_consecutive_styles() {
        let red = StrokeStyle::new(Color::RED, 3);
        let blue = StrokeStyle::new(Color::BLUE, 3);
        let seg = |style| Segment::new(Point::ZERO, Point::new(1.0, 1.0), style);
        let segments = vec![seg(red), seg(red), seg(blue), seg(red)];
        let runs = style_runs(&segments);
        assert_eq!(runs, vec![(red, 0..2), (blue, 2..3), (red, 3..4)]);
        assert!(style_runs(&[]).is_empty());
    }

    #[test]
    fn hud_reports_zoom_cursor_and_eraser() {
        let mut state = state(100.0);
        state.tools.circle_cursor_size = 30;
        state.view.zoom_in(Point::new(50.0, 50.0));
        let texts: Vec<String> = hud_lines(&state, true).into_iter().map(|h| h.text).collect();
        assert_eq!(
            texts,
            vec![
                "Zoom ratio: 1.2x".to_owned(),
                "Cursor size: 30px".to_owned(),
                "Eraser size: 20px".to_owned(),
            ]
        );
    }

    #[test]
    fn eraser_footprint_is_drawn_while_erasing() {
        let mut state = state(16.0);
        state.pointer = Point::new(8.0, 8.0);
        let backdrop = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        let idle = frame(&state, &backdrop, false);
        let erasing = frame(&state, &backdrop, true);
        assert_eq!(idle.image.get_pixel(8, 8), &Rgba([0, 0, 0, 255]));
        assert_eq!(
            erasing.image.get_pixel(8, 8),
            &blend_pixel(Rgba([0, 0, 0, 255]), ERASER_FILL)
        );
    }
}
