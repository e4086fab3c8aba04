//! Axis-aligned bounding volumes
//!
//! Used by auto-framing to center the camera on a decoded mesh.

use crate::math::Vec3;

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingVolume {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingVolume {
    /// Create a new volume from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box centered at `center` with the given full size
    pub fn from_center_extent(center: Vec3, extent: Vec3) -> Self {
        let half = extent * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box enclosing all points; None for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |mut volume, point| {
            volume.expand(point);
            volume
        }))
    }

    /// Grow the box to include a point
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Midpoint of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Size along each axis (max - min)
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest of the three axis sizes
    pub fn max_extent(&self) -> f32 {
        self.extent().max_element()
    }

    /// Check if a point is inside the box
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}
