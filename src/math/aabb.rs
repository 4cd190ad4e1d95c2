use crate::math::{Vector3, Ray, EPSILON};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner of the AABB
    pub min: Vector3,

    /// Maximum corner of the AABB
    pub max: Vector3,
}

/// Entry point of a ray into an AABB, found by the slab test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabHit {
    /// Ray parameter at entry (0 when the origin starts inside)
    pub t_enter: f32,

    /// Ray parameter at exit
    pub t_exit: f32,

    /// Outward normal of the face the ray entered through
    pub normal: Vector3,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self { min, max }
    }

    /// Creates an AABB centered at a position with the given half extents
    #[inline]
    pub fn from_center_half_extents(center: Vector3, half_extents: Vector3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns the center of the AABB
    #[inline]
    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    /// Returns half the extents of the AABB in each dimension
    #[inline]
    pub fn half_extents(&self) -> Vector3 {
        (self.max - self.min) * 0.5
    }

    /// Checks if this AABB contains a point
    #[inline]
    pub fn contains_point(&self, point: Vector3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Checks if this AABB intersects with another AABB
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Returns the union of this AABB with another
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Expands this AABB by a margin in all directions
    #[inline]
    pub fn expand(&self, margin: f32) -> Self {
        let margin_vec = Vector3::splat(margin);
        Self {
            min: self.min - margin_vec,
            max: self.max + margin_vec,
        }
    }

    /// Returns the AABB moved by `offset`
    #[inline]
    pub fn translated(&self, offset: Vector3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Returns the closest point on (or in) the AABB to a given point
    #[inline]
    pub fn closest_point(&self, point: Vector3) -> Vector3 {
        point.clamp(&self.min, &self.max)
    }

    /// Slab test of a ray against this AABB, limited to `[0, max_t]`.
    ///
    /// Axes where the ray direction is (near) zero are treated as parallel
    /// slabs: the ray misses unless its origin lies between the planes.
    pub fn ray_slab(&self, ray: &Ray, max_t: f32) -> Option<SlabHit> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vector3::ZERO;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if dir.abs() < EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            // Entering through the min face means the outward normal points negative.
            let mut sign = -1.0;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
                sign = 1.0;
            }

            if t0 > t_enter {
                t_enter = t0;
                normal = Vector3::unit(axis) * sign;
            }
            t_exit = t_exit.min(t1);

            if t_enter > t_exit {
                return None;
            }
        }

        if t_exit < 0.0 || t_enter > max_t {
            return None;
        }

        if t_enter < 0.0 {
            // Origin inside the box: report the origin itself, facing back along the ray.
            return Some(SlabHit {
                t_enter: 0.0,
                t_exit,
                normal: -ray.direction.normalize(),
            });
        }

        Some(SlabHit { t_enter, t_exit, normal })
    }
}
