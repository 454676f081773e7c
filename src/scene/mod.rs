//! Renderer-agnostic geometry shared by the font and render layers.
//!
//! Everything here lives in **display pixel space**: x grows right, y grows down,
//! origin at the top-left of the logical display. Font outlines (y-up, font units)
//! are converted into this space by `font::text` before they reach this module.
//!
//! This module intentionally does not depend on wgpu; `render::mesh_renderer`
//! consumes the `DrawItem2D`s produced by `render::raster`.

/// 2D affine transform stored as a 3x3 matrix in column-major order.
///
/// Convention:
/// - Column vectors (x, y, 1)
/// - Composition is `outer_from_inner = outer * inner`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    /// Column-major 3x3 matrix.
    pub m: [[f32; 3]; 3],
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    #[inline]
    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [tx, ty, 1.0]],
        }
    }

    /// Compose transforms: `self * rhs` (rhs applies first).
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        let a = self.m;
        let b = rhs.m;

        let mut out = [[0.0f32; 3]; 3];
        for col in 0..3 {
            for row in 0..3 {
                out[col][row] =
                    a[0][row] * b[col][0] + a[1][row] * b[col][1] + a[2][row] * b[col][2];
            }
        }
        Self { m: out }
    }

    #[inline]
    pub fn transform_point(self, x: f32, y: f32) -> (f32, f32) {
        let nx = self.m[0][0] * x + self.m[1][0] * y + self.m[2][0];
        let ny = self.m[0][1] * x + self.m[1][1] * y + self.m[2][1];
        (nx, ny)
    }
}

/// Axis-aligned bounding box in pixel space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Aabb2 {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Aabb2 {
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY, f32::INFINITY],
            max: [f32::NEG_INFINITY, f32::NEG_INFINITY],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    #[inline]
    pub fn include_point(&mut self, p: [f32; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    #[inline]
    pub fn center(&self) -> [f32; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }
}

/// Simple RGBA color, components in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const CLEAR: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Fully transparent colors draw nothing; callers use this to skip work.
    #[inline]
    pub fn is_clear(self) -> bool {
        self.a <= 0.0
    }
}

/// An owned CPU triangle mesh (2D positions, u16 indices).
#[derive(Debug, Clone, Default)]
pub struct Mesh2D {
    pub positions: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl Mesh2D {
    /// An axis-aligned rectangle as two triangles.
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            positions: vec![[x, y], [x + w, y], [x + w, y + h], [x, y + h]],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    pub fn bounds(&self) -> Aabb2 {
        let mut b = Aabb2::empty();
        for &p in &self.positions {
            b.include_point(p);
        }
        b
    }
}

/// A single solid-fill draw, ready for the mesh renderer.
///
/// - `world_from_local` maps mesh positions into display pixels.
/// - `z` is painter's order; higher draws later.
#[derive(Debug, Clone)]
pub struct DrawItem2D {
    pub mesh: Mesh2D,
    pub fill: Rgba,
    pub world_from_local: Affine2,
    pub z: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translations_compose() {
        let xf = Affine2::translate(10.0, 20.0).mul(Affine2::translate(-3.0, 5.0));
        assert_eq!(xf.transform_point(3.0, 4.0), (10.0, 29.0));
        assert_eq!(Affine2::IDENTITY.mul(xf), xf);
    }

    #[test]
    fn rect_mesh_bounds() {
        let b = Mesh2D::rect(0.0, 0.0, 144.0, 20.0).bounds();
        assert_eq!(b.min, [0.0, 0.0]);
        assert_eq!(b.max, [144.0, 20.0]);
        assert_eq!(b.center(), [72.0, 10.0]);
    }

    #[test]
    fn empty_bounds_union_nothing() {
        assert!(Aabb2::empty().is_empty());
        assert!(Mesh2D::default().bounds().is_empty());
    }
}
