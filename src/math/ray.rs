use crate::math::{Quaternion, Vector3};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Half-line used for scene queries and swept tests
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Origin of the ray
    pub origin: Vector3,

    /// Direction of the ray (not necessarily normalized)
    pub direction: Vector3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    #[inline]
    pub fn new(origin: Vector3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// Creates a ray with a unit-length direction, or `None` for a zero direction
    #[inline]
    pub fn new_normalized(origin: Vector3, direction: Vector3) -> Option<Self> {
        direction
            .try_normalize()
            .map(|direction| Self { origin, direction })
    }

    /// Returns the point at parameter `t` along the ray
    #[inline]
    pub fn point_at(&self, t: f32) -> Vector3 {
        self.origin + self.direction * t
    }

    /// Re-expresses the ray in a frame with the given origin and orientation
    #[inline]
    pub fn to_local(&self, frame_origin: Vector3, frame_rotation: &Quaternion) -> Self {
        Self {
            origin: frame_rotation.inverse_rotate(self.origin - frame_origin),
            direction: frame_rotation.inverse_rotate(self.direction),
        }
    }
}
