//! Rectangles.

use cgmath::{Point2, Vector2, Zero};

/// A rectangle in the coordinate system of the surface's parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Rectangle origin.
    pub origin: Point2<f64>,

    /// Rectangle size.
    pub size: Vector2<f64>,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(origin: Point2<f64>, size: Vector2<f64>) -> Rect {
        Rect { origin, size }
    }

    /// Creates a rectangle from its components.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Rect {
        Rect {
            origin: Point2::new(x, y),
            size: Vector2::new(width, height),
        }
    }

    /// Returns a zero-sized rectangle at the origin.
    pub fn zero() -> Rect {
        Rect {
            origin: Point2::new(0., 0.),
            size: Vector2::zero(),
        }
    }

    /// The vertical offset from the parent's top edge.
    pub fn top(&self) -> f64 {
        self.origin.y
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }
}

impl Default for Rect {
    fn default() -> Rect {
        Rect::zero()
    }
}

#[test]
fn test_rect_edges() {
    let rect = Rect::from_xywh(0., 40., 100., 60.);
    assert_eq!(rect.top(), 40.);
    assert_eq!(rect.height(), 60.);
    assert_eq!(Rect::default(), Rect::new(Point2::new(0., 0.), Vector2::new(0., 0.)));
}
