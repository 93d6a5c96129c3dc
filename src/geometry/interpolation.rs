use crate::core::error::{Result, SceneError};
use nalgebra::{Point2, Vector3};
use std::ops::{Add, Mul};

/// Tolerance applied to each barycentric weight in the inside test.
///
/// Weights are ratios of sub-areas to the full triangle area, so this is a
/// tolerance relative to the triangle's area, not an absolute pixel distance.
/// Points whose weights fall in `[-BARYCENTRIC_EPSILON, 1 + BARYCENTRIC_EPSILON]`
/// count as inside or on the boundary.
pub const BARYCENTRIC_EPSILON: f32 = 1e-6;

/// A triangle whose corner angle has `sin` below this is treated as degenerate.
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// Linear RGB color, components normally in `[0, 1]`.
pub type Color = Vector3<f32>;

/// Barycentric weights of a point with respect to a triangle `(p1, p2, p3)`.
/// `w1` belongs to `p1`, `w2` to `p2`, `w3` to `p3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    pub w1: f32,
    pub w2: f32,
    pub w3: f32,
}

impl Barycentric {
    /// Inside or on the boundary of the triangle.
    #[inline(always)]
    pub fn is_inside(&self) -> bool {
        let in_range = |w: f32| (-BARYCENTRIC_EPSILON..=1.0 + BARYCENTRIC_EPSILON).contains(&w);
        in_range(self.w1) && in_range(self.w2) && in_range(self.w3)
    }

    pub fn sum(&self) -> f32 {
        self.w1 + self.w2 + self.w3
    }

    /// Affine combination `w1 * a + w2 * b + w3 * c`. No inside check.
    pub fn blend<T>(&self, a: T, b: T, c: T) -> T
    where
        T: Mul<f32, Output = T> + Add<Output = T>,
    {
        a * self.w1 + b * self.w2 + c * self.w3
    }
}

/// Signed area of the 2D triangle `(p1, p2, p3)`; positive for counter-clockwise.
pub fn signed_area(p1: Point2<f32>, p2: Point2<f32>, p3: Point2<f32>) -> f32 {
    let e1 = p2 - p1;
    let e2 = p3 - p1;
    0.5 * (e1.x * e2.y - e1.y * e2.x)
}

/// Calculates barycentric weights of `q` with respect to `(p1, p2, p3)` as
/// ratios of signed sub-triangle areas `(q,p2,p3)`, `(p1,q,p3)`, `(p1,p2,q)`
/// over the signed area of `(p1,p2,p3)`.
///
/// Works for either winding. Fails with `DegenerateGeometry` for zero-area
/// (collinear or coincident) triangles instead of producing NaN/inf weights.
pub fn classify(
    p1: Point2<f32>,
    p2: Point2<f32>,
    p3: Point2<f32>,
    q: Point2<f32>,
) -> Result<Barycentric> {
    let e1 = p2 - p1;
    let e2 = p3 - p1;
    let area = signed_area(p1, p2, p3);

    // |e1 x e2| = |e1||e2| sin(angle); compare the sine so the test is scale free
    let edge_product = e1.norm() * e2.norm();
    if edge_product == 0.0 || (2.0 * area).abs() < DEGENERATE_EPSILON * edge_product {
        return Err(SceneError::DegenerateGeometry(format!(
            "zero-area triangle ({:?}, {:?}, {:?})",
            p1, p2, p3
        )));
    }

    let inv_area = 1.0 / area;
    let w1 = signed_area(q, p2, p3) * inv_area;
    let w2 = signed_area(p1, q, p3) * inv_area;
    let w3 = signed_area(p1, p2, q) * inv_area;

    Ok(Barycentric { w1, w2, w3 })
}

/// Point-in-triangle test (boundary counts as inside).
pub fn is_in_triangle(
    p1: Point2<f32>,
    p2: Point2<f32>,
    p3: Point2<f32>,
    q: Point2<f32>,
) -> Result<bool> {
    classify(p1, p2, p3, q).map(|bary| bary.is_inside())
}

/// Linearly interpolates a per-vertex attribute at `q`.
///
/// The weights only form a convex combination inside the triangle, so a query
/// outside fails with `OutOfRange`.
pub fn interpolate<T>(
    p1: Point2<f32>,
    p2: Point2<f32>,
    p3: Point2<f32>,
    values: &[T; 3],
    q: Point2<f32>,
) -> Result<T>
where
    T: Mul<f32, Output = T> + Add<Output = T> + Copy,
{
    let bary = classify(p1, p2, p3, q)?;
    if !bary.is_inside() {
        return Err(SceneError::OutOfRange(format!(
            "point ({}, {}) lies outside the triangle (weights {:.4}, {:.4}, {:.4})",
            q.x, q.y, bary.w1, bary.w2, bary.w3
        )));
    }
    Ok(bary.blend(values[0], values[1], values[2]))
}

/// Color interpolation, the picking use of [`interpolate`].
pub fn interpolate_color(
    p1: Point2<f32>,
    p2: Point2<f32>,
    p3: Point2<f32>,
    colors: &[Color; 3],
    q: Point2<f32>,
) -> Result<Color> {
    interpolate(p1, p2, p3, colors, q)
}

/// A 2D triangle with one color per corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTriangle {
    pub vertices: [Point2<f32>; 3],
    pub colors: [Color; 3],
}

impl ColorTriangle {
    pub fn new(vertices: [Point2<f32>; 3], colors: [Color; 3]) -> Self {
        Self { vertices, colors }
    }

    pub fn classify(&self, q: Point2<f32>) -> Result<Barycentric> {
        let [p1, p2, p3] = self.vertices;
        classify(p1, p2, p3, q)
    }

    pub fn contains(&self, q: Point2<f32>) -> Result<bool> {
        let [p1, p2, p3] = self.vertices;
        is_in_triangle(p1, p2, p3, q)
    }

    pub fn color_at(&self, q: Point2<f32>) -> Result<Color> {
        let [p1, p2, p3] = self.vertices;
        interpolate_color(p1, p2, p3, &self.colors, q)
    }

    pub fn centroid(&self) -> Point2<f32> {
        let [p1, p2, p3] = self.vertices;
        Point2::from((p1.coords + p2.coords + p3.coords) / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picker_triangle() -> ColorTriangle {
        ColorTriangle::new(
            [
                Point2::new(0.0, 50.0),
                Point2::new(200.0, 50.0),
                Point2::new(100.0, 350.0),
            ],
            [
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(0.0, 0.0, 1.0),
            ],
        )
    }

    #[test]
    fn picker_inside_and_outside() {
        let tri = picker_triangle();
        assert!(tri.contains(Point2::new(100.0, 100.0)).unwrap());
        assert!(!tri.contains(Point2::new(0.0, 0.0)).unwrap());
    }

    #[test]
    fn weights_sum_to_one_everywhere() {
        let tri = picker_triangle();
        for &(x, y) in &[(100.0, 100.0), (0.0, 0.0), (-500.0, 900.0), (1e4, -3.0)] {
            let bary = tri.classify(Point2::new(x, y)).unwrap();
            assert!((bary.sum() - 1.0).abs() < 1e-4, "sum {} at ({x}, {y})", bary.sum());
        }
    }

    #[test]
    fn vertices_and_edges_are_inside() {
        let tri = picker_triangle();
        for v in tri.vertices {
            assert!(tri.contains(v).unwrap());
        }
        assert!(tri.contains(Point2::new(100.0, 50.0)).unwrap());
    }

    #[test]
    fn centroid_blends_equally() {
        let tri = picker_triangle();
        let color = tri.color_at(tri.centroid()).unwrap();
        for i in 0..3 {
            assert!((color[i] - 1.0 / 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn vertex_returns_its_own_color() {
        let tri = picker_triangle();
        let color = tri.color_at(tri.vertices[1]).unwrap();
        assert!((color - tri.colors[1]).norm() < 1e-6);
    }

    #[test]
    fn outside_interpolation_fails() {
        let tri = picker_triangle();
        assert!(matches!(
            tri.color_at(Point2::new(0.0, 0.0)),
            Err(SceneError::OutOfRange(_))
        ));
    }

    #[test]
    fn collinear_triangle_is_degenerate() {
        let result = classify(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.5, 0.5),
        );
        assert!(matches!(result, Err(SceneError::DegenerateGeometry(_))));
    }

    #[test]
    fn winding_does_not_matter() {
        let q = Point2::new(100.0, 100.0);
        let [p1, p2, p3] = picker_triangle().vertices;
        let ccw = classify(p1, p2, p3, q).unwrap();
        let cw = classify(p1, p3, p2, q).unwrap();
        assert!((ccw.w1 - cw.w1).abs() < 1e-6);
        assert!((ccw.w2 - cw.w3).abs() < 1e-6);
        assert!(cw.is_inside());
    }

    #[test]
    fn reflected_point_is_rejected() {
        // mirror of the apex across the base; the signed weight for p3 goes negative
        let tri = picker_triangle();
        let bary = tri.classify(Point2::new(100.0, -250.0)).unwrap();
        assert!(bary.w3 < 0.0);
        assert!(!bary.is_inside());
    }
}
