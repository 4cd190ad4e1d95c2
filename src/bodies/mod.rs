mod rigid_body;
mod material;
mod body_type;

pub use self::rigid_body::{
    RigidBody, ANGULAR_DAMPING, LINEAR_DAMPING, MAX_ANGULAR_SPEED, MAX_LINEAR_SPEED,
};
pub use self::material::{Material, MAX_FRICTION};
pub use self::body_type::RigidBodyType;

use crate::math::Vector3;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Collision shape of a body
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum BodyShape {
    /// Oriented box described by its half extents along the local axes
    Box { half_extents: Vector3 },

    /// Sphere centred on the body position
    Sphere { radius: f32 },
}

impl BodyShape {
    /// Returns true for boxes with a zero/negative extent and spheres with a non-positive radius
    pub fn is_degenerate(&self) -> bool {
        match *self {
            BodyShape::Box { half_extents } => {
                !(half_extents.x > 0.0 && half_extents.y > 0.0 && half_extents.z > 0.0)
            }
            BodyShape::Sphere { radius } => !(radius > 0.0),
        }
    }

    /// Diagonal of the local inertia tensor for the given mass
    pub fn inertia_diagonal(&self, mass: f32) -> Vector3 {
        match *self {
            BodyShape::Box { half_extents: h } => {
                let (x2, y2, z2) = (h.x * h.x, h.y * h.y, h.z * h.z);
                Vector3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 3.0)
            }
            BodyShape::Sphere { radius } => Vector3::splat(0.4 * mass * radius * radius),
        }
    }
}

/// Flags for controlling body behavior
pub mod body_flags {
    use bitflags::bitflags;

    #[cfg(feature = "serialize")]
    use serde::{Serialize, Deserialize};

    bitflags! {
        /// Flags for controlling the behavior of rigid bodies
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
        pub struct BodyFlags: u8 {
            /// Body can go to sleep when inactive
            const CAN_SLEEP = 0x01;

            /// Body is currently sleeping
            const SLEEPING = 0x02;

            /// Body is a trigger volume (reports overlaps, receives no contact response)
            const TRIGGER = 0x04;

            /// Body is affected by world gravity
            const AFFECTED_BY_GRAVITY = 0x08;
        }
    }
}
