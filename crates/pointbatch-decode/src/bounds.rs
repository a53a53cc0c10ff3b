//! Position and color extents.

use glam::{Vec3, Vec4};

/// Axis-aligned position extents and per-channel color extents.
///
/// A freshly created `Bounds` holds the sentinel `+∞` minimum and `−∞`
/// maximum, so it stays "undefined" until the first point is observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub position_min: Vec3,
    pub position_max: Vec3,
    pub color_min: Vec4,
    pub color_max: Vec4,
}

impl Bounds {
    /// Empty bounds.
    pub const EMPTY: Self = Self {
        position_min: Vec3::INFINITY,
        position_max: Vec3::NEG_INFINITY,
        color_min: Vec4::INFINITY,
        color_max: Vec4::NEG_INFINITY,
    };

    #[must_use]
    pub fn new() -> Self {
        Self::EMPTY
    }

    /// Extend the bounds to include one point.
    pub fn update(&mut self, position: Vec3, color: Vec4) {
        self.position_min = self.position_min.min(position);
        self.position_max = self.position_max.max(position);
        self.color_min = self.color_min.min(color);
        self.color_max = self.color_max.max(color);
    }

    /// Extend the bounds to include another set of bounds.
    pub fn merge(&mut self, other: &Bounds) {
        self.position_min = self.position_min.min(other.position_min);
        self.position_max = self.position_max.max(other.position_max);
        self.color_min = self.color_min.min(other.color_min);
        self.color_max = self.color_max.max(other.color_max);
    }

    /// Only extend the color extents.
    pub fn merge_color(&mut self, other: &Bounds) {
        self.color_min = self.color_min.min(other.color_min);
        self.color_max = self.color_max.max(other.color_max);
    }

    /// Whether no point has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position_min.x > self.position_max.x
    }

    /// Midpoint of the position extents.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.position_min + self.position_max) * 0.5
    }

    /// Size of the position extents along each axis.
    #[must_use]
    pub fn dimensions(&self) -> Vec3 {
        self.position_max - self.position_min
    }

    /// The fourteen values in cache order:
    /// `xmin,xmax,ymin,ymax,zmin,zmax,rmin,rmax,gmin,gmax,bmin,bmax,amin,amax`.
    #[must_use]
    pub fn to_array(&self) -> [f32; 14] {
        let (pn, px, cn, cx) = (
            self.position_min,
            self.position_max,
            self.color_min,
            self.color_max,
        );
        [
            pn.x, px.x, pn.y, px.y, pn.z, px.z, cn.x, cx.x, cn.y, cx.y, cn.z, cx.z, cn.w, cx.w,
        ]
    }

    /// Inverse of [`to_array`](Self::to_array).
    #[must_use]
    pub fn from_array(v: [f32; 14]) -> Self {
        Self {
            position_min: Vec3::new(v[0], v[2], v[4]),
            position_max: Vec3::new(v[1], v[3], v[5]),
            color_min: Vec4::new(v[6], v[8], v[10], v[12]),
            color_max: Vec4::new(v[7], v[9], v[11], v[13]),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}
