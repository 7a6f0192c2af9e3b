use kurbo::{Affine, Point, Vec2};

/// Screen/image mapping for the current pan and zoom.
///
/// Forward: `screen = pan + center + scale * (image - center)`. The inverse is the
/// inverted composite matrix, computed once per transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    forward: Affine,
    inverse: Affine,
}

impl ViewTransform {
    pub fn new(scale: f64, zoom_center: Point, pan: Vec2) -> Self {
        debug_assert!(scale > 0.0, "view scale must stay positive");
        let center = zoom_center.to_vec2();
        let forward = Affine::translate(pan)
            * Affine::translate(center)
            * Affine::scale(scale)
            * Affine::translate(-center);
        Self {
            forward,
            inverse: forward.inverse(),
        }
    }

    pub fn identity() -> Self {
        Self {
            forward: Affine::IDENTITY,
            inverse: Affine::IDENTITY,
        }
    }

    pub fn to_image(&self, screen: Point) -> Point {
        self.inverse * screen
    }

    pub fn to_screen(&self, image: Point) -> Point {
        self.forward * image
    }

    pub fn matrix(&self) -> Affine {
        self.forward
    }

    pub fn scale(&self) -> f64 {
        self.forward.as_coeffs()[0]
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}
