use crate::math::Vector3;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for the physics simulation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// The fixed time step for the simulation
    pub time_step: f32,

    /// Maximum substeps per `update_fixed` call; also caps the accumulator
    pub max_substeps: u32,

    /// Acceleration applied to dynamic bodies that are affected by gravity
    pub gravity: Vector3,

    /// Sequential-impulse iterations per substep
    pub solver_iterations: u32,

    /// Baumgarte bias factor for contacts and joints
    pub baumgarte: f32,

    /// Penetration allowed before bias or correction kicks in
    pub penetration_slop: f32,

    /// Fraction of residual penetration removed by positional correction
    pub correction_percent: f32,

    /// Closing speed above which restitution is applied
    pub restitution_threshold: f32,

    /// Radius for matching a new contact to last substep's contact
    pub warm_start_radius: f32,

    /// Whether to allow sleeping bodies
    pub allow_sleeping: bool,

    /// Squared linear speed below which a body counts as idle
    pub linear_sleep_threshold: f32,

    /// Squared angular speed below which a body counts as idle
    pub angular_sleep_threshold: f32,

    /// The time a body must be idle before sleeping
    pub sleep_time: f32,

    /// Squared relative speed that wakes a sleeping body in contact
    pub wake_velocity_threshold: f32,

    /// Let spheres sleep too. Off by default: only boxes are put to sleep.
    pub sleep_spheres: bool,

    /// Largest floor penetration snapped away when a box settles
    pub settle_height_tolerance: f32,

    /// Largest tilt (radians) snapped to an axis-aligned pose when a box settles
    pub settle_angle_tolerance: f32,

    /// Whether to use the swept sphere fallbacks
    pub use_ccd: bool,

    /// Undrained events kept per kind before the oldest are dropped
    pub max_queued_events: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            max_substeps: 3,
            gravity: Vector3::new(0.0, -9.81, 0.0),
            solver_iterations: 8,
            baumgarte: 0.2,
            penetration_slop: 0.001,
            correction_percent: 0.4,
            restitution_threshold: 1.0,
            warm_start_radius: 0.01,
            allow_sleeping: true,
            linear_sleep_threshold: 0.01,
            angular_sleep_threshold: 0.01,
            sleep_time: 0.5,
            wake_velocity_threshold: 0.25,
            sleep_spheres: false,
            settle_height_tolerance: 0.02,
            settle_angle_tolerance: 0.0087,
            use_ccd: true,
            max_queued_events: 1024,
        }
    }
}
