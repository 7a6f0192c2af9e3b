use kurbo::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Color and width shared by one stroke; captured when the stroke starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: u32,
}

impl StrokeStyle {
    pub const fn new(color: Color, width: u32) -> Self {
        Self { color, width }
    }
}

/// A committed pen segment in image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub style: StrokeStyle,
}

impl Segment {
    pub fn new(start: Point, end: Point, style: StrokeStyle) -> Self {
        Self { start, end, style }
    }

    pub fn bounds(&self) -> Rect {
        let pad = f64::from(self.style.width) / 2.0;
        Rect::from_points(self.start, self.end).inflate(pad, pad)
    }
}

/// A highlighter polyline in image space.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlighterPath {
    pub points: Vec<Point>,
    pub style: StrokeStyle,
}

impl HighlighterPath {
    pub fn start(at: Point, style: StrokeStyle) -> Self {
        Self {
            points: vec![at],
            style,
        }
    }

    pub fn line_to(&mut self, point: Point) {
        self.points.push(point);
    }

    /// A path with fewer than two points draws nothing and is never committed.
    pub fn is_empty(&self) -> bool {
        self.points.len() < 2
    }

    pub fn bounds(&self) -> Option<Rect> {
        let (first, rest) = self.points.split_first()?;
        let rect = rest
            .iter()
            .fold(Rect::from_points(*first, *first), |acc, p| {
                acc.union_pt(*p)
            });
        let pad = f64::from(self.style.width) / 2.0;
        Some(rect.inflate(pad, pad))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EraseOutcome {
    pub segments: usize,
    pub highlights: usize,
}

impl EraseOutcome {
    pub fn removed_any(self) -> bool {
        self.segments > 0 || self.highlights > 0
    }
}

/// Committed geometry of one session, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeStore {
    segments: Vec<Segment>,
    highlights: Vec<HighlighterPath>,
}

impl StrokeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Returns `false` when the path was empty and therefore dropped.
    pub fn append_highlighter_path(&mut self, path: HighlighterPath) -> bool {
        if path.is_empty() {
            return false;
        }
        self.highlights.push(path);
        true
    }

    /// Removes every stroke whose padded bounding box overlaps the square eraser
    /// footprint of side `size` centered on `center`. Both values are image space.
    pub fn erase_at(&mut self, center: Point, size: f64) -> EraseOutcome {
        let region = eraser_region(center, size);
        let segments_before = self.segments.len();
        let highlights_before = self.highlights.len();

        self.segments
            .retain(|segment| !rects_overlap(segment.bounds(), region));
        self.highlights.retain(|path| {
            path.bounds()
                .map_or(true, |bounds| !rects_overlap(bounds, region))
        });

        EraseOutcome {
            segments: segments_before - self.segments.len(),
            highlights: highlights_before - self.highlights.len(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn highlighter_paths(&self) -> &[HighlighterPath] {
        &self.highlights
    }

    pub fn len(&self) -> usize {
        self.segments.len() + self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.highlights.clear();
    }
}

pub fn eraser_region(center: Point, size: f64) -> Rect {
    Rect::from_center_size(center, Size::new(size, size))
}

/// Open-interval overlap: rectangles that only share an edge do not intersect.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    let a = a.abs();
    let b = b.abs();
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}
