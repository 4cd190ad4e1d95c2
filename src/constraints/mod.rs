mod constraint;
mod distance;

pub use self::constraint::{Constraint, ConstraintKind};
pub use self::distance::JointFrame;
