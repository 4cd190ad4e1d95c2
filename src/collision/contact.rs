use crate::core::{BodyHandle, ContactPoint};
use crate::math::Vector3;

/// Maximum number of contact points kept per body pair
pub const MAX_CONTACTS: usize = 4;

/// One manifold point plus the solver data attached to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// World-space contact position
    pub position: Vector3,

    /// Penetration depth along the pair normal
    pub penetration: f32,

    /// Accumulated normal impulse, carried between substeps when the point matches
    pub normal_impulse: f32,

    /// Inverse of the effective mass along the normal
    pub normal_mass: f32,

    /// Baumgarte plus restitution velocity bias
    pub bias: f32,

    /// Lever arm from body A's centre of mass
    pub r_a: Vector3,

    /// Lever arm from body B's centre of mass
    pub r_b: Vector3,
}

impl Contact {
    pub fn new(position: Vector3, penetration: f32) -> Self {
        Self {
            position,
            penetration,
            normal_impulse: 0.0,
            normal_mass: 0.0,
            bias: 0.0,
            r_a: Vector3::ZERO,
            r_b: Vector3::ZERO,
        }
    }
}

/// Collision evidence for one body pair in one substep
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionInfo {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,

    /// Shared contact normal, pointing from A to B
    pub normal: Vector3,

    /// Up to [`MAX_CONTACTS`] points
    pub contacts: Vec<Contact>,

    /// Set when either body is a trigger; such pairs are reported but never solved
    pub is_trigger: bool,
}

impl CollisionInfo {
    /// An empty result for a pair that does not collide
    pub fn none(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            body_a,
            body_b,
            normal: Vector3::ZERO,
            contacts: Vec::new(),
            is_trigger: false,
        }
    }

    pub fn has_collision(&self) -> bool {
        !self.contacts.is_empty()
    }

    /// Largest penetration over all contacts, zero when there are none
    pub fn max_penetration(&self) -> f32 {
        self.contacts
            .iter()
            .map(|c| c.penetration)
            .fold(0.0, f32::max)
    }

    /// Contact points without solver data, for events and debug drawing
    pub fn contact_points(&self) -> impl Iterator<Item = ContactPoint> + '_ {
        self.contacts.iter().map(move |c| ContactPoint {
            position: c.position,
            normal: self.normal,
            penetration: c.penetration,
        })
    }
}
