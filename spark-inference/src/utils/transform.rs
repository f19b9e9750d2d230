use crate::utils::graph::{Point, Quad};
use std::fmt::{Display, Formatter};

/// Flip applied to a tile before it is handed to the detector.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlipMode {
    #[default]
    None,
    /// Mirror of the X axis.
    Horizontal,
    /// Mirror of the Y axis.
    Vertical,
}

impl Display for FlipMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FlipMode::None => write!(f, "none"),
            FlipMode::Horizontal => write!(f, "horizontal"),
            FlipMode::Vertical => write!(f, "vertical"),
        }
    }
}

/// Scales X and Y independently, then translates.
pub fn compose_forward(quad: &Quad, scale_x: f32, scale_y: f32, offset_x: f32, offset_y: f32) -> Quad {
    quad.map(|p| Point::new(p.x * scale_x + offset_x, p.y * scale_y + offset_y))
}

/// Mirrors corners inside an `extent_w`×`extent_h` frame. Applied in tile
/// local coordinates, before the window origin is added.
pub fn compose_flip(quad: &Quad, mode: FlipMode, extent_w: f32, extent_h: f32) -> Quad {
    match mode {
        FlipMode::None => *quad,
        FlipMode::Horizontal => quad.map(|p| Point::new(extent_w - p.x, p.y)),
        FlipMode::Vertical => quad.map(|p| Point::new(p.x, extent_h - p.y)),
    }
}

/// Clamps every corner into `[0, width] × [0, height]`.
pub fn clip_to_canvas(quad: &Quad, width: f32, height: f32) -> Quad {
    quad.map(|p| Point::new(p.x.clamp(0.0, width), p.y.clamp(0.0, height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::RotatedBox;

    #[test]
    fn flip_is_an_involution() {
        let quad = RotatedBox::new(100.5, 40.25, 30.0, 10.0, 0.0).to_corners();
        for mode in [FlipMode::None, FlipMode::Horizontal, FlipMode::Vertical] {
            let twice = compose_flip(&compose_flip(&quad, mode, 1024.0, 512.0), mode, 1024.0, 512.0);
            assert_eq!(twice, quad, "{mode}");
        }
    }

    #[test]
    fn horizontal_flip_reflects_x_only() {
        let quad = Quad::from_flat([10.0, 1.0, 20.0, 1.0, 20.0, 5.0, 10.0, 5.0]);
        let flipped = compose_flip(&quad, FlipMode::Horizontal, 100.0, 50.0);
        assert_eq!(
            flipped.to_flat(),
            [90.0, 1.0, 80.0, 1.0, 80.0, 5.0, 90.0, 5.0]
        );

        let flipped = compose_flip(&quad, FlipMode::Vertical, 100.0, 50.0);
        assert_eq!(
            flipped.to_flat(),
            [10.0, 49.0, 20.0, 49.0, 20.0, 45.0, 10.0, 45.0]
        );
    }

    #[test]
    fn forward_scales_then_translates() {
        let quad = Quad::from_flat([1.0, 2.0, 3.0, 2.0, 3.0, 4.0, 1.0, 4.0]);
        let moved = compose_forward(&quad, 2.0, 0.5, 100.0, 10.0);
        assert_eq!(
            moved.to_flat(),
            [102.0, 11.0, 106.0, 11.0, 106.0, 12.0, 102.0, 12.0]
        );
    }

    #[test]
    fn clip_keeps_inside_points() {
        let quad = Quad::from_flat([-5.0, 2.0, 30.0, 2.0, 30.0, 70.0, -5.0, 70.0]);
        let clipped = clip_to_canvas(&quad, 20.0, 60.0);
        assert_eq!(
            clipped.to_flat(),
            [0.0, 2.0, 20.0, 2.0, 20.0, 60.0, 0.0, 60.0]
        );
    }
}
