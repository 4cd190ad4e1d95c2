use crate::bodies::RigidBody;
use crate::math::{Vector3, EPSILON};

/// Per-step solver data for a distance row, rebuilt by every `pre_step`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointFrame {
    /// Lever arm from body A's centre of mass to its world anchor
    pub r_a: Vector3,

    /// Lever arm from body B's centre of mass to its world anchor
    pub r_b: Vector3,

    /// Unit direction from anchor A to anchor B
    pub axis: Vector3,

    /// Inverse of the effective mass along `axis`
    pub effective_mass: f32,

    /// Baumgarte velocity bias from the length error
    pub bias: f32,
}

impl JointFrame {
    /// Builds the frame from the bodies' current poses.
    ///
    /// Coincident anchors fall back to the world up axis.
    pub fn compute(
        a: &RigidBody,
        b: &RigidBody,
        local_anchor_a: Vector3,
        local_anchor_b: Vector3,
        rest_length: f32,
        baumgarte: f32,
        dt: f32,
    ) -> Self {
        let r_a = a.get_orientation().rotate(local_anchor_a);
        let r_b = b.get_orientation().rotate(local_anchor_b);
        let delta = (b.get_position() + r_b) - (a.get_position() + r_a);

        let length = delta.length();
        let axis = delta.try_normalize().unwrap_or(Vector3::UP);

        let k = a.solver_inverse_mass()
            + b.solver_inverse_mass()
            + a.angular_effective_mass(r_a, axis)
            + b.angular_effective_mass(r_b, axis);
        let effective_mass = if k > EPSILON { 1.0 / k } else { 0.0 };

        let bias = if dt > EPSILON {
            baumgarte * (length - rest_length) / dt
        } else {
            0.0
        };

        Self { r_a, r_b, axis, effective_mass, bias }
    }

    /// Applies one unclamped impulse along the axis; returns its magnitude
    pub fn solve(&self, a: &mut RigidBody, b: &mut RigidBody) -> f32 {
        let relative = b.point_velocity(self.r_b) - a.point_velocity(self.r_a);
        let lambda = -(relative.dot(&self.axis) + self.bias) * self.effective_mass;

        let impulse = self.axis * lambda;
        a.apply_impulse_at(-impulse, self.r_a);
        b.apply_impulse_at(impulse, self.r_b);
        lambda
    }
}
