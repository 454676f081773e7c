//! Integer pixel geometry for windows and layers.

use std::ops::Add;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// A rectangle: `origin` is the top-left corner.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub const fn from_size(size: Size) -> Self {
        Self {
            origin: Point::ZERO,
            size,
        }
    }

    /// Same size, origin moved to zero. Layers hand this to their update procs.
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.size)
    }

    /// Center point, rounding toward the origin (integer halving).
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2,
            self.origin.y + self.size.height / 2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_of_display_rect() {
        assert_eq!(Rect::new(0, 0, 144, 168).center(), Point::new(72, 84));
        assert_eq!(Rect::new(10, 10, 5, 5).center(), Point::new(12, 12));
    }

    #[test]
    fn bounds_drop_the_origin() {
        let r = Rect::new(4, 7, 30, 20);
        assert_eq!(r.bounds(), Rect::new(0, 0, 30, 20));
    }
}
