pub mod world;
pub mod config;
pub mod storage;
pub mod events;
pub mod simulation;
mod scheduler;
mod sleeping;

pub use self::world::{PhysicsWorld, RaycastHit};
pub use self::config::SimulationConfig;
pub use self::storage::{Arena, ArenaHandle, BodyStorage, ConstraintStorage, Storage};
pub use self::events::{BodyEvent, BodyEventType, CollisionEvent, CollisionEventType, EventQueue};
pub use self::simulation::Simulation;
pub use self::scheduler::{Job, JobScheduler, ThreadScheduler};

use crate::bodies::{BodyShape, RigidBody};
use crate::math::{Quaternion, Vector3};

/// A generational identifier for a body in the physics world.
///
/// The generation changes every time a slot is reused, so a handle kept past
/// `remove_body` no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// A generational identifier for a constraint in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// A contact point between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// The position of the contact point in world space
    pub position: Vector3,

    /// The normal of the contact surface, pointing from the first body to the second
    pub normal: Vector3,

    /// The penetration depth of the contact
    pub penetration: f32,
}

/// Read-only copy of the state a renderer or debug overlay needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    pub handle: BodyHandle,
    pub position: Vector3,
    pub orientation: Quaternion,
    pub shape: BodyShape,
    pub is_static: bool,
    pub is_sleeping: bool,
    pub is_trigger: bool,
}

impl BodyView {
    pub(crate) fn new(handle: BodyHandle, body: &RigidBody) -> Self {
        Self {
            handle,
            position: body.get_position(),
            orientation: body.get_orientation(),
            shape: body.get_shape(),
            is_static: body.is_static(),
            is_sleeping: body.is_sleeping(),
            is_trigger: body.is_trigger(),
        }
    }
}
