pub mod math;
pub mod core;
pub mod bodies;
pub mod collision;
pub mod constraints;

/// Re-export common types for easier usage
pub use crate::core::{
    BodyHandle, ConstraintHandle, JobScheduler, PhysicsWorld, RaycastHit, Simulation,
    SimulationConfig, ThreadScheduler,
};
pub use crate::bodies::{BodyShape, Material, RigidBody, RigidBodyType};
pub use crate::constraints::{Constraint, ConstraintKind};
pub use crate::math::{Quaternion, Ray, Vector3};

/// Error types for the physics engine
pub mod error {
    use crate::core::{BodyHandle, ConstraintHandle};
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Body not found: {0:?}")]
        BodyNotFound(BodyHandle),

        #[error("Constraint not found: {0:?}")]
        ConstraintNotFound(ConstraintHandle),

        #[error("A simulation step is in progress")]
        StepInProgress,
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
