//! Oriented box representations.
//!
//! A box is either four ordered corners ([`Quad`]) or center form
//! ([`RotatedBox`]). The center form angle is in degrees, normalized to
//! `[-90, 90)`, measured from the +x axis towards +y in image coordinates
//! (y pointing down). `width` is the side running along the angle.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("degenerate polygon with area {0}")]
    Degenerate(f64),
    #[error("polygon has a non-finite coordinate")]
    NonFinite,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

/// Four corner points; order is producer defined and not necessarily convex.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Quad(pub [Point; 4]);

/// Center form of an oriented rectangle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RotatedBox {
    pub cx: f32,
    pub cy: f32,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

pub fn normalize_angle(degrees: f32) -> f32 {
    let mut angle = degrees % 180.0;
    if angle >= 90.0 {
        angle -= 180.0;
    } else if angle < -90.0 {
        angle += 180.0;
    }
    angle
}

impl Quad {
    pub fn from_flat(coords: [f32; 8]) -> Self {
        Quad([
            Point::new(coords[0], coords[1]),
            Point::new(coords[2], coords[3]),
            Point::new(coords[4], coords[5]),
            Point::new(coords[6], coords[7]),
        ])
    }

    /// `[x1, y1, x2, y2, x3, y3, x4, y4]`
    pub fn to_flat(&self) -> [f32; 8] {
        let [a, b, c, d] = self.0;
        [a.x, a.y, b.x, b.y, c.x, c.y, d.x, d.y]
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    pub fn map(&self, f: impl Fn(Point) -> Point) -> Self {
        Quad(self.0.map(f))
    }

    /// Minimum-area enclosing rectangle in center form. Exact for rectangles;
    /// the side most parallel to the first edge (corner 0 → corner 1) becomes
    /// `width`, so `to_corners` round-trips.
    pub fn to_center_form(&self) -> RotatedBox {
        let points: Vec<(f64, f64)> = self.0.iter().map(|p| (p.x as f64, p.y as f64)).collect();
        let reference = unit(sub(points[1], points[0])).unwrap_or((1.0, 0.0));

        let hull = convex_hull(&points);
        let mut best: Option<(f64, (f64, f64))> = None;
        for i in 0..hull.len() {
            let Some(axis) = unit(sub(hull[(i + 1) % hull.len()], hull[i])) else {
                continue;
            };
            let extent = Extent::project(&points, axis);
            let area = extent.along() * extent.across();
            if best.map_or(true, |(best_area, _)| area < best_area) {
                best = Some((area, axis));
            }
        }

        let axis = best.map(|(_, axis)| axis).unwrap_or(reference);
        let extent = Extent::project(&points, axis);
        let normal = perpendicular(axis);
        let (center_along, center_across) = extent.center();
        let cx = axis.0 * center_along + normal.0 * center_across;
        let cy = axis.1 * center_along + normal.1 * center_across;

        let (mut width_axis, width, height) = if dot(axis, reference).abs() >= dot(normal, reference).abs() {
            (axis, extent.along(), extent.across())
        } else {
            (normal, extent.across(), extent.along())
        };
        if dot(width_axis, reference) < 0.0 {
            width_axis = (-width_axis.0, -width_axis.1);
        }

        RotatedBox {
            cx: cx as f32,
            cy: cy as f32,
            width: width as f32,
            height: height as f32,
            angle: normalize_angle(width_axis.1.atan2(width_axis.0).to_degrees() as f32),
        }
    }
}

impl RotatedBox {
    pub fn new(cx: f32, cy: f32, width: f32, height: f32, angle: f32) -> Self {
        RotatedBox {
            cx,
            cy,
            width,
            height,
            angle: normalize_angle(angle),
        }
    }

    /// Corners in the order `c - u - v`, `c + u - v`, `c + u + v`, `c - u + v`
    /// where `u` is the half width vector and `v` the half height vector.
    pub fn to_corners(&self) -> Quad {
        let (sin, cos) = (self.angle as f64).to_radians().sin_cos();
        let (cx, cy) = (self.cx as f64, self.cy as f64);
        let (hw, hh) = (self.width as f64 / 2.0, self.height as f64 / 2.0);
        let (ux, uy) = (cos * hw, sin * hw);
        let (vx, vy) = (-sin * hh, cos * hh);

        let corner = |su: f64, sv: f64| {
            Point::new(
                (cx + su * ux + sv * vx) as f32,
                (cy + su * uy + sv * vy) as f32,
            )
        };
        Quad([
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ])
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

struct Extent {
    min_along: f64,
    max_along: f64,
    min_across: f64,
    max_across: f64,
}

impl Extent {
    fn project(points: &[(f64, f64)], axis: (f64, f64)) -> Self {
        let normal = perpendicular(axis);
        let mut extent = Extent {
            min_along: f64::INFINITY,
            max_along: f64::NEG_INFINITY,
            min_across: f64::INFINITY,
            max_across: f64::NEG_INFINITY,
        };
        for &p in points {
            let along = dot(p, axis);
            let across = dot(p, normal);
            extent.min_along = extent.min_along.min(along);
            extent.max_along = extent.max_along.max(along);
            extent.min_across = extent.min_across.min(across);
            extent.max_across = extent.max_across.max(across);
        }
        extent
    }

    fn along(&self) -> f64 {
        self.max_along - self.min_along
    }

    fn across(&self) -> f64 {
        self.max_across - self.min_across
    }

    fn center(&self) -> (f64, f64) {
        (
            (self.min_along + self.max_along) / 2.0,
            (self.min_across + self.max_across) / 2.0,
        )
    }
}

pub(crate) fn sub(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (a.0 - b.0, a.1 - b.1)
}

pub(crate) fn dot(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1
}

pub(crate) fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn perpendicular(v: (f64, f64)) -> (f64, f64) {
    (-v.1, v.0)
}

fn unit(v: (f64, f64)) -> Option<(f64, f64)> {
    let length = v.0.hypot(v.1);
    (length > 1e-12 && length.is_finite()).then(|| (v.0 / length, v.1 / length))
}

/// Andrew's monotone chain. Collinear points are dropped; the result is
/// counter-clockwise in a y-up frame and may hold fewer than three points.
pub(crate) fn convex_hull(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut sorted: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|p| p.0.is_finite() && p.1.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_same_box(a: &RotatedBox, b: &RotatedBox) {
        let tolerance = 1e-3;
        assert!((a.cx - b.cx).abs() < tolerance, "{a:?} vs {b:?}");
        assert!((a.cy - b.cy).abs() < tolerance, "{a:?} vs {b:?}");
        assert!((a.width - b.width).abs() < tolerance, "{a:?} vs {b:?}");
        assert!((a.height - b.height).abs() < tolerance, "{a:?} vs {b:?}");
        let angle_delta = (a.angle - b.angle).abs();
        assert!(
            angle_delta < 1e-2 || (angle_delta - 180.0).abs() < 1e-2,
            "{a:?} vs {b:?}"
        );
    }

    #[test]
    fn center_form_round_trips() {
        let angles = [-90.0, -67.5, -45.0, -30.0, -1.0, 0.0, 12.5, 45.0, 60.0, 89.0];
        let sizes = [(10.0, 4.0), (4.0, 10.0), (7.0, 7.0), (250.0, 0.5), (0.01, 3.0)];
        for &angle in &angles {
            for &(width, height) in &sizes {
                let original = RotatedBox::new(512.25, 300.5, width, height, angle);
                let restored = original.to_corners().to_center_form();
                assert_same_box(&original, &restored);
            }
        }
    }

    #[test]
    fn axis_aligned_corners() {
        let quad = RotatedBox::new(10.0, 20.0, 8.0, 4.0, 0.0).to_corners();
        assert_eq!(
            quad.to_flat(),
            [6.0, 18.0, 14.0, 18.0, 14.0, 22.0, 6.0, 22.0]
        );
    }

    #[test]
    fn angles_are_normalized() {
        assert_eq!(normalize_angle(90.0), -90.0);
        assert_eq!(normalize_angle(135.0), -45.0);
        assert_eq!(normalize_angle(-100.0), 80.0);
        assert_eq!(normalize_angle(270.0), -90.0);
        assert_eq!(normalize_angle(10.0), 10.0);
    }

    #[test]
    fn reversed_corner_order_is_the_same_rectangle() {
        let original = RotatedBox::new(50.0, 40.0, 30.0, 12.0, 30.0);
        let [a, b, c, d] = original.to_corners().0;
        let restored = Quad([d, c, b, a]).to_center_form();

        assert!((restored.cx - 50.0).abs() < 1e-3);
        assert!((restored.cy - 40.0).abs() < 1e-3);
        assert!((restored.area() - original.area()).abs() < 1e-2);
    }

    #[test]
    fn irregular_quad_gets_its_enclosing_rectangle() {
        // a parallelogram: enclosing rectangle is wider than the base edge
        let quad = Quad::from_flat([0.0, 0.0, 10.0, 0.0, 12.0, 5.0, 2.0, 5.0]);
        let rect = quad.to_center_form();
        assert!(rect.width > 0.0 && rect.height > 0.0);
        assert!(rect.area() >= 50.0 - 1e-3);
    }

    #[test]
    fn degenerate_quads_do_not_panic() {
        let collapsed = Quad::from_flat([3.0; 8]).to_center_form();
        assert_eq!((collapsed.width, collapsed.height), (0.0, 0.0));

        let line = Quad::from_flat([0.0, 0.0, 10.0, 0.0, 10.0, 0.0, 0.0, 0.0]).to_center_form();
        assert!((line.width - 10.0).abs() < 1e-5);
        assert_eq!(line.height, 0.0);
    }
}
