//! Screen-space geometry primitives shared by the layout and the frontend.

use serde::{Deserialize, Serialize};

/// A 2D point in screen coordinates (pixels, y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// True when both coordinates differ by no more than `eps`.
    pub fn approx_eq(self, other: Point, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn min(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Midpoint of the left edge when `right` is false, of the right edge otherwise.
    pub fn side_anchor(&self, right: bool) -> Point {
        let x = if right { self.right() } else { self.left() };
        Point::new(x, self.y + self.height / 2.0)
    }
}

/// Control points of the cubic drawn between two link endpoints.
///
/// Both tangents are horizontal and meet at the x-midpoint, so a link leaves
/// an output port to the right and enters an input port from the left.
pub fn link_curve(a: Point, b: Point) -> [Point; 4] {
    let mid_x = (a.x + b.x) / 2.0;
    [a, Point::new(mid_x, a.y), Point::new(mid_x, b.y), b]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_anchor() {
        let r = Rect::new(10.0, 20.0, 100.0, 30.0);
        assert_eq!(r.side_anchor(false), Point::new(10.0, 35.0));
        assert_eq!(r.side_anchor(true), Point::new(110.0, 35.0));
    }

    #[test]
    fn test_contains_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(!r.contains(Point::new(10.1, 5.0)));
    }

    #[test]
    fn test_link_curve_tangents() {
        let c = link_curve(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        assert_eq!(c[1], Point::new(50.0, 0.0));
        assert_eq!(c[2], Point::new(50.0, 50.0));
    }

    #[test]
    fn test_approx_eq() {
        let a = Point::new(1.0, 1.0);
        assert!(a.approx_eq(Point::new(1.0005, 0.9995), 1e-3));
        assert!(!a.approx_eq(Point::new(1.01, 1.0), 1e-3));
    }
}
