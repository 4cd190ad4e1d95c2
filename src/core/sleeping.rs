use std::collections::HashMap;
use crate::bodies::RigidBody;
use crate::collision::CollisionInfo;
use crate::core::{BodyEventType, BodyHandle, BodyStorage, EventQueue, SimulationConfig, Storage};
use crate::math::{Matrix3, Quaternion, Vector3};

/// Normals closer to vertical than this count as floor contacts when settling
const FLOOR_NORMAL_DOT: f32 = 0.99;

/// Whether a body takes part in sleep bookkeeping at all
fn sleep_candidate(body: &RigidBody, config: &SimulationConfig) -> bool {
    body.is_dynamic() && (body.is_box() || config.sleep_spheres)
}

/// Upward push that removes a box's remaining floor penetration.
///
/// Only contacts against static bodies with a near-vertical normal count, and
/// only when the penetration left after positional correction is within the
/// settle tolerance.
fn settle_offsets(
    bodies: &BodyStorage,
    infos: &[CollisionInfo],
    config: &SimulationConfig,
) -> HashMap<BodyHandle, Vector3> {
    let mut offsets: HashMap<BodyHandle, Vector3> = HashMap::new();

    for info in infos.iter().filter(|info| info.has_collision() && !info.is_trigger) {
        if info.normal.dot(&Vector3::UP).abs() < FLOOR_NORMAL_DOT {
            continue;
        }
        let (Some(a), Some(b)) = (bodies.get(info.body_a), bodies.get(info.body_b)) else {
            continue;
        };

        // Direction that moves the resting body out of its static support.
        let (handle, direction) = match (a.is_static(), b.is_static()) {
            (true, false) if b.is_box() => (info.body_b, info.normal),
            (false, true) if a.is_box() => (info.body_a, -info.normal),
            _ => continue,
        };

        let penetration = info.max_penetration();
        let residual = penetration
            - config.correction_percent * (penetration - config.penetration_slop).max(0.0);
        if residual <= 0.0 || residual > config.settle_height_tolerance {
            continue;
        }

        let offset = direction * residual;
        offsets
            .entry(handle)
            .and_modify(|o| {
                if offset.length_squared() > o.length_squared() {
                    *o = offset;
                }
            })
            .or_insert(offset);
    }

    offsets
}

/// Rounds an orientation to the nearest axis-aligned one if every local axis
/// is within `tolerance` radians of a world axis
fn snap_orientation(orientation: Quaternion, tolerance: f32) -> Option<Quaternion> {
    let min_dot = tolerance.cos();
    let columns = orientation.to_rotation_matrix().columns();
    let mut snapped = [Vector3::ZERO; 3];
    let mut used = [false; 3];

    for (i, column) in columns.iter().enumerate() {
        let axis = (0..3)
            .max_by(|&x, &y| column[x].abs().total_cmp(&column[y].abs()))
            .unwrap_or(0);
        if used[axis] {
            return None;
        }
        used[axis] = true;

        let target = Vector3::unit(axis) * column[axis].signum();
        if column.dot(&target) < min_dot {
            return None;
        }
        snapped[i] = target;
    }

    let matrix = Matrix3::from_columns(snapped[0], snapped[1], snapped[2]);
    Some(Quaternion::from_rotation_matrix(&matrix).normalize())
}

/// Snaps a resting box to an exact pose before it falls asleep
fn settle(body: &mut RigidBody, offset: Option<Vector3>, config: &SimulationConfig) {
    if !body.is_box() {
        return;
    }
    let tolerance = config.settle_angle_tolerance;
    if let Some(orientation) = snap_orientation(body.get_orientation(), tolerance) {
        body.set_orientation(orientation);
    }
    if let Some(offset) = offset {
        body.translate(offset);
    }
}

/// Advances sleep timers after the solve and puts idle bodies to sleep.
///
/// Only boxes are considered unless `sleep_spheres` is set. A body whose
/// speeds stay under both thresholds for `sleep_time` is settled, then slept.
pub(crate) fn update_sleep(
    bodies: &mut BodyStorage,
    infos: &[CollisionInfo],
    config: &SimulationConfig,
    dt: f32,
    events: &mut EventQueue,
) {
    if !config.allow_sleeping {
        return;
    }

    let offsets = settle_offsets(bodies, infos, config);

    for (handle, body) in bodies.iter_mut() {
        if body.is_sleeping() || !sleep_candidate(body, config) {
            continue;
        }
        if !body.can_sleep() {
            body.set_sleep_timer(0.0);
            continue;
        }

        let idle = body.get_linear_velocity().length_squared() < config.linear_sleep_threshold
            && body.get_angular_velocity().length_squared() < config.angular_sleep_threshold;
        if !idle {
            body.set_sleep_timer(0.0);
            continue;
        }

        let timer = body.get_sleep_timer() + dt;
        if timer < config.sleep_time {
            body.set_sleep_timer(timer);
            continue;
        }

        settle(body, offsets.get(&handle).copied(), config);
        body.put_to_sleep();
        events.add_body_event(BodyEventType::Sleep, handle);
        tracing::debug!(?handle, "body put to sleep");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn slight_tilt_snaps_to_axis_aligned() {
        let tilted = Quaternion::from_axis_angle(Vector3::new(1.0, 0.0, 0.0), 0.004);
        let snapped = snap_orientation(tilted, 0.0087).unwrap();
        assert_relative_eq!(snapped.w.abs(), 1.0, epsilon = 1e-5);

        let quarter = Quaternion::from_axis_angle(Vector3::UP, std::f32::consts::FRAC_PI_2 + 0.003);
        let snapped = snap_orientation(quarter, 0.0087).unwrap();
        let x_axis = snapped.rotate(Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(x_axis.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn large_tilt_is_left_alone() {
        let tilted = Quaternion::from_axis_angle(Vector3::new(1.0, 0.0, 0.0), 0.1);
        assert!(snap_orientation(tilted, 0.0087).is_none());
    }
}
