#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// How a body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum RigidBodyType {
    /// Fully simulated: integrates forces and responds to contacts
    #[default]
    Dynamic,

    /// Moved by its velocity only; pushes dynamic bodies but is never pushed back
    Kinematic,

    /// Never moves; infinite mass
    Static,
}
