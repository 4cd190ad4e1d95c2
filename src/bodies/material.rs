#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Upper bound accepted for the friction coefficient
pub const MAX_FRICTION: f32 = 2.0;

/// Surface properties used when two bodies touch
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of friction, `[0, MAX_FRICTION]`
    friction: f32,

    /// Coefficient of restitution (bounciness), `[0, 1]`
    restitution: f32,
}

impl Material {
    /// Creates a new material, clamping both coefficients into range
    pub fn new(friction: f32, restitution: f32) -> Self {
        let mut material = Self::default();
        material.set_friction(friction);
        material.set_restitution(restitution);
        material
    }

    /// Low friction, mild bounce
    pub fn ice() -> Self {
        Self::new(0.05, 0.1)
    }

    /// High friction, bouncy
    pub fn rubber() -> Self {
        Self::new(0.9, 0.8)
    }

    /// Medium friction, little bounce
    pub fn wood() -> Self {
        Self::new(0.6, 0.2)
    }

    pub fn metal() -> Self {
        Self::new(0.4, 0.3)
    }

    pub fn concrete() -> Self {
        Self::new(0.9, 0.05)
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Sets friction; NaN is treated as zero
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = if friction.is_nan() { 0.0 } else { friction.clamp(0.0, MAX_FRICTION) };
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Sets restitution; NaN is treated as zero
    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = if restitution.is_nan() { 0.0 } else { restitution.clamp(0.0, 1.0) };
    }

    /// Friction used for a touching pair: the smaller of the two
    #[inline]
    pub fn combined_friction(&self, other: &Self) -> f32 {
        self.friction.min(other.friction)
    }

    /// Restitution used for a touching pair: the smaller of the two
    #[inline]
    pub fn combined_restitution(&self, other: &Self) -> f32 {
        self.restitution.min(other.restitution)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.2,
        }
    }
}
