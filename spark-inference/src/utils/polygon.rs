//! Convex polygon clipping used for rotated IoU.

use crate::utils::graph::{convex_hull, cross, GeometryError, Quad};

/// Polygons smaller than this (px²) are treated as degenerate.
pub const MIN_POLYGON_AREA: f64 = 1e-6;

const SIDE_EPSILON: f64 = 1e-9;

/// Convex hull of a quad's corners, counter-clockwise, with a cached area.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexPolygon {
    vertices: Vec<(f64, f64)>,
    area: f64,
}

impl ConvexPolygon {
    /// Fails on non-finite corners or an area under [`MIN_POLYGON_AREA`]; the
    /// hull makes the result independent of the corner order.
    pub fn from_quad(quad: &Quad) -> Result<Self, GeometryError> {
        if !quad.is_finite() {
            return Err(GeometryError::NonFinite);
        }

        let points: Vec<(f64, f64)> = quad.0.iter().map(|p| (p.x as f64, p.y as f64)).collect();
        let vertices = convex_hull(&points);
        let area = polygon_area(&vertices);
        if vertices.len() < 3 || area < MIN_POLYGON_AREA {
            return Err(GeometryError::Degenerate(area));
        }

        Ok(ConvexPolygon { vertices, area })
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn intersection_area(&self, other: &ConvexPolygon) -> f64 {
        polygon_area(&clip(&self.vertices, &other.vertices))
    }

    /// Intersection over union; `1.0` for coincident polygons.
    pub fn iou(&self, other: &ConvexPolygon) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area + other.area - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        (intersection / union).clamp(0.0, 1.0) as f32
    }
}

fn polygon_area(vertices: &[(f64, f64)]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: f64 = (0..vertices.len())
        .map(|i| {
            let (a, b) = (vertices[i], vertices[(i + 1) % vertices.len()]);
            a.0 * b.1 - b.0 * a.1
        })
        .sum();
    twice.abs() / 2.0
}

/// Sutherland–Hodgman: clips `subject` against every edge of the convex,
/// counter-clockwise `clipper`.
fn clip(subject: &[(f64, f64)], clipper: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut output = subject.to_vec();

    for i in 0..clipper.len() {
        if output.is_empty() {
            break;
        }
        let (edge_start, edge_end) = (clipper[i], clipper[(i + 1) % clipper.len()]);
        let input = std::mem::take(&mut output);

        for j in 0..input.len() {
            let current = input[j];
            let previous = input[(j + input.len() - 1) % input.len()];
            let current_side = cross(edge_start, edge_end, current);
            let previous_side = cross(edge_start, edge_end, previous);
            let current_inside = current_side >= -SIDE_EPSILON;
            let previous_inside = previous_side >= -SIDE_EPSILON;

            if current_inside != previous_inside {
                let t = previous_side / (previous_side - current_side);
                output.push((
                    previous.0 + t * (current.0 - previous.0),
                    previous.1 + t * (current.1 - previous.1),
                ));
            }
            if current_inside {
                output.push(current);
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::RotatedBox;

    fn rect(cx: f32, cy: f32, w: f32, h: f32, angle: f32) -> Quad {
        RotatedBox::new(cx, cy, w, h, angle).to_corners()
    }

    fn rotated_iou(a: &Quad, b: &Quad) -> Result<f32, GeometryError> {
        Ok(ConvexPolygon::from_quad(a)?.iou(&ConvexPolygon::from_quad(b)?))
    }

    #[test]
    fn coincident_boxes_have_unit_iou() -> Result<(), GeometryError> {
        for angle in [0.0, 17.0, 45.0, -60.0, -90.0] {
            let quad = rect(100.0, 80.0, 40.0, 12.0, angle);
            let iou = rotated_iou(&quad, &quad)?;
            assert!((iou - 1.0).abs() < 1e-5, "angle {angle}: {iou}");
        }
        Ok(())
    }

    #[test]
    fn shifted_axis_aligned_boxes() -> Result<(), GeometryError> {
        // 5x10 overlap, union 150
        let iou = rotated_iou(&rect(5.0, 5.0, 10.0, 10.0, 0.0), &rect(10.0, 5.0, 10.0, 10.0, 0.0))?;
        assert!((iou - 50.0 / 150.0).abs() < 1e-5, "{iou}");
        Ok(())
    }

    #[test]
    fn cross_shaped_overlap() -> Result<(), GeometryError> {
        // two 20x4 bars crossing at right angles share a 4x4 square
        let iou = rotated_iou(&rect(0.0, 0.0, 20.0, 4.0, 0.0), &rect(0.0, 0.0, 20.0, 4.0, 90.0))?;
        assert!((iou - 16.0 / 144.0).abs() < 1e-4, "{iou}");
        Ok(())
    }

    #[test]
    fn disjoint_boxes() -> Result<(), GeometryError> {
        let iou = rotated_iou(&rect(0.0, 0.0, 10.0, 10.0, 30.0), &rect(50.0, 50.0, 10.0, 10.0, 30.0))?;
        assert_eq!(iou, 0.0);
        Ok(())
    }

    #[test]
    fn iou_ignores_corner_order() -> Result<(), GeometryError> {
        let a = rect(10.0, 10.0, 12.0, 6.0, 25.0);
        let [p0, p1, p2, p3] = a.0;
        let scrambled = Quad([p2, p0, p3, p1]);
        let iou = rotated_iou(&a, &scrambled)?;
        assert!((iou - 1.0).abs() < 1e-5, "{iou}");
        Ok(())
    }

    #[test]
    fn zero_area_quads_are_degenerate() {
        let flat = Quad::from_flat([0.0, 0.0, 10.0, 0.0, 10.0, 0.0, 0.0, 0.0]);
        assert!(matches!(
            ConvexPolygon::from_quad(&flat),
            Err(GeometryError::Degenerate(_))
        ));

        let nan = Quad::from_flat([f32::NAN, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        assert_eq!(ConvexPolygon::from_quad(&nan), Err(GeometryError::NonFinite));
    }
}
