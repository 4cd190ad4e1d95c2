use crate::bodies::{BodyShape, RigidBody};
use crate::collision::box_box::{box_box, Obb};
use crate::collision::contact::{CollisionInfo, Contact};
use crate::collision::continuous::{sphere_aabb_toi, sphere_sphere_toi};
use crate::core::BodyHandle;
use crate::math::{Quaternion, Vector3, EPSILON};

/// Closest feature of an oriented box to a point
struct BoxFeature {
    /// Closest point on the box surface
    point: Vector3,

    /// Outward surface normal at `point`
    normal: Vector3,

    /// Distance from the surface, negative when the query point is inside
    distance: f32,
}

/// Closest surface point of a box to `query`.
///
/// A query inside the box is pushed out through the nearest face.
fn closest_box_feature(
    query: Vector3,
    center: Vector3,
    orientation: &Quaternion,
    half_extents: Vector3,
) -> BoxFeature {
    let local = orientation.inverse_rotate(query - center);
    let clamped = local.clamp(&-half_extents, &half_extents);
    let outside = local - clamped;

    if let Some(direction) = outside.try_normalize() {
        return BoxFeature {
            point: center + orientation.rotate(clamped),
            normal: orientation.rotate(direction),
            distance: outside.length(),
        };
    }

    // Inside (or on the surface): leave through the closest face.
    let mut axis = 0;
    let mut depth = f32::INFINITY;
    for i in 0..3 {
        let d = half_extents[i] - local[i].abs();
        if d < depth {
            depth = d;
            axis = i;
        }
    }
    let sign = if local[axis] < 0.0 { -1.0 } else { 1.0 };
    let mut surface = local;
    match axis {
        0 => surface.x = sign * half_extents.x,
        1 => surface.y = sign * half_extents.y,
        _ => surface.z = sign * half_extents.z,
    }

    BoxFeature {
        point: center + orientation.rotate(surface),
        normal: orientation.rotate(Vector3::unit(axis) * sign),
        distance: -depth,
    }
}

/// Sphere against box: normal from the sphere to the box, contact point and depth
fn sphere_box(
    sphere: &RigidBody,
    radius: f32,
    boxed: &RigidBody,
    half_extents: Vector3,
    ccd: bool,
) -> Option<(Vector3, Vector3, f32)> {
    let centre = sphere.get_position();
    let orientation = boxed.get_orientation();
    let feature = closest_box_feature(centre, boxed.get_position(), &orientation, half_extents);

    if feature.distance <= radius {
        return Some((-feature.normal, feature.point, radius - feature.distance));
    }

    if !ccd {
        return None;
    }

    let box_displacement = boxed.get_position() - boxed.get_previous_position();
    let (_, impact_centre) = sphere_aabb_toi(
        sphere.get_previous_position(),
        centre,
        box_displacement,
        &boxed.get_bounds(),
        radius,
    )?;

    let feature =
        closest_box_feature(impact_centre, boxed.get_position(), &orientation, half_extents);
    let normal = -feature.normal;
    let penetration = radius + (centre - feature.point).dot(&normal);
    (penetration > 0.0).then_some((normal, feature.point, penetration))
}

fn sphere_sphere(
    a: &RigidBody,
    radius_a: f32,
    b: &RigidBody,
    radius_b: f32,
    ccd: bool,
) -> Option<(Vector3, Vector3, f32)> {
    let (pos_a, pos_b) = (a.get_position(), b.get_position());
    let radius_sum = radius_a + radius_b;
    let offset = pos_b - pos_a;
    let distance_sq = offset.length_squared();

    if distance_sq <= radius_sum * radius_sum {
        let distance = distance_sq.sqrt();
        let normal = offset.try_normalize().unwrap_or(Vector3::UP);
        let penetration = radius_sum - distance;
        // Middle of the overlap region.
        let position = pos_a + normal * (radius_a - penetration * 0.5);
        return Some((normal, position, penetration));
    }

    if !ccd {
        return None;
    }

    let (prev_a, prev_b) = (a.get_previous_position(), b.get_previous_position());
    let t = sphere_sphere_toi(prev_a, pos_a, prev_b, pos_b, radius_sum)?;

    let centre_a = prev_a.lerp(&pos_a, t);
    let centre_b = prev_b.lerp(&pos_b, t);
    let normal = (centre_b - centre_a).try_normalize().unwrap_or(Vector3::UP);
    let penetration = radius_sum - offset.dot(&normal);
    let position = pos_a + normal * (radius_a - penetration * 0.5);
    (penetration > 0.0).then_some((normal, position, penetration))
}

/// Cheap rejection shared by all shape pairs
fn skip_pair(a: &RigidBody, b: &RigidBody, ccd: bool) -> bool {
    if a.is_static() && b.is_static() {
        return true;
    }
    if a.is_kinematic() && b.is_kinematic() && !a.is_trigger() && !b.is_trigger() {
        return true;
    }
    if a.get_shape().is_degenerate() || b.get_shape().is_degenerate() {
        return true;
    }

    if ccd {
        !a.swept_bounds().intersects(&b.swept_bounds())
    } else {
        !a.get_bounds().intersects(&b.get_bounds())
    }
}

/// Narrow-phase test for one body pair.
///
/// The returned normal always points from `a` to `b`. With `ccd` set, pairs
/// that do not overlap at their current positions are retried with a swept
/// test for sphere-sphere and sphere-box; box-box has no swept fallback.
pub fn detect_collision(
    handle_a: BodyHandle,
    a: &RigidBody,
    handle_b: BodyHandle,
    b: &RigidBody,
    ccd: bool,
) -> CollisionInfo {
    let mut info = CollisionInfo::none(handle_a, handle_b);
    if skip_pair(a, b, ccd) {
        return info;
    }
    info.is_trigger = a.is_trigger() || b.is_trigger();

    let single = match (a.get_shape(), b.get_shape()) {
        (BodyShape::Sphere { radius: ra }, BodyShape::Sphere { radius: rb }) => {
            sphere_sphere(a, ra, b, rb, ccd)
        }
        (BodyShape::Sphere { radius }, BodyShape::Box { half_extents }) => {
            sphere_box(a, radius, b, half_extents, ccd)
        }
        (BodyShape::Box { half_extents }, BodyShape::Sphere { radius }) => {
            sphere_box(b, radius, a, half_extents, ccd)
                .map(|(normal, point, depth)| (-normal, point, depth))
        }
        (BodyShape::Box { half_extents: ha }, BodyShape::Box { half_extents: hb }) => {
            let obb_a = Obb::new(a.get_position(), &a.get_orientation(), ha);
            let obb_b = Obb::new(b.get_position(), &b.get_orientation(), hb);
            if let Some(manifold) = box_box(&obb_a, &obb_b) {
                info.normal = manifold.normal;
                info.contacts = manifold
                    .points
                    .into_iter()
                    .map(|(position, depth)| Contact::new(position, depth))
                    .collect();
            }
            None
        }
    };

    if let Some((normal, position, penetration)) = single {
        if normal.length_squared() > EPSILON {
            info.normal = normal;
            info.contacts.push(Contact::new(position, penetration));
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ArenaHandle;
    use approx::assert_relative_eq;

    fn handles() -> (BodyHandle, BodyHandle) {
        (BodyHandle::from_parts(0, 0), BodyHandle::from_parts(1, 0))
    }

    #[test]
    fn overlapping_spheres_meet_in_the_middle() {
        let (ha, hb) = handles();
        let a = RigidBody::dynamic_sphere(0.5, Vector3::ZERO, 1.0);
        let b = RigidBody::dynamic_sphere(0.5, Vector3::new(0.8, 0.0, 0.0), 1.0);

        let info = detect_collision(ha, &a, hb, &b, false);
        assert!(info.has_collision());
        assert_relative_eq!(info.normal.x, 1.0);
        assert_relative_eq!(info.contacts[0].penetration, 0.2, epsilon = 1e-6);
        assert_relative_eq!(info.contacts[0].position.x, 0.4, epsilon = 1e-6);
    }

    #[test]
    fn sphere_box_normal_points_from_a_to_b() {
        let (ha, hb) = handles();
        let floor = RigidBody::new_static(
            BodyShape::Box { half_extents: Vector3::new(5.0, 0.5, 5.0) },
            Vector3::new(0.0, -0.5, 0.0),
        );
        let ball = RigidBody::dynamic_sphere(0.5, Vector3::new(1.0, 0.45, 0.0), 1.0);

        let info = detect_collision(ha, &floor, hb, &ball, false);
        assert_relative_eq!(info.normal.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(info.contacts[0].penetration, 0.05, epsilon = 1e-5);
        assert_relative_eq!(info.contacts[0].position.y, 0.0, epsilon = 1e-6);

        let info = detect_collision(hb, &ball, ha, &floor, false);
        assert_relative_eq!(info.normal.y, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn sphere_centre_inside_box_leaves_through_nearest_face() {
        let (ha, hb) = handles();
        let block = RigidBody::dynamic_box(Vector3::splat(1.0), Vector3::ZERO, 1.0);
        let ball = RigidBody::dynamic_sphere(0.25, Vector3::new(0.0, 0.0, 0.8), 1.0);

        let info = detect_collision(ha, &block, hb, &ball, false);
        assert_relative_eq!(info.normal.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(info.contacts[0].penetration, 0.45, epsilon = 1e-5);
    }

    #[test]
    fn static_pairs_and_degenerate_shapes_are_skipped() {
        let (ha, hb) = handles();
        let shape = BodyShape::Sphere { radius: 1.0 };
        let a = RigidBody::new_static(shape, Vector3::ZERO);
        let b = RigidBody::new_static(shape, Vector3::ZERO);
        assert!(!detect_collision(ha, &a, hb, &b, true).has_collision());

        let c = RigidBody::new_kinematic(shape, Vector3::ZERO);
        let d = RigidBody::new_kinematic(shape, Vector3::ZERO);
        assert!(!detect_collision(ha, &c, hb, &d, true).has_collision());

        let flat = RigidBody::dynamic_box(Vector3::new(1.0, 0.0, 1.0), Vector3::ZERO, 1.0);
        let e = RigidBody::dynamic_sphere(1.0, Vector3::ZERO, 1.0);
        assert!(!detect_collision(ha, &flat, hb, &e, true).has_collision());
    }

    #[test]
    fn fast_sphere_is_caught_by_swept_test() {
        let (ha, hb) = handles();
        let wall = RigidBody::new_static(
            BodyShape::Box { half_extents: Vector3::new(0.05, 2.0, 2.0) },
            Vector3::ZERO,
        );
        let mut bullet = RigidBody::dynamic_sphere(0.1, Vector3::new(-1.0, 0.0, 0.0), 1.0);
        bullet.begin_substep();
        bullet.set_position(Vector3::new(1.0, 0.0, 0.0));

        assert!(!detect_collision(ha, &wall, hb, &bullet, false).has_collision());

        let info = detect_collision(ha, &wall, hb, &bullet, true);
        assert!(info.has_collision());
        // Pushing the bullet along the normal sends it back the way it came.
        assert_relative_eq!(info.normal.x, -1.0, epsilon = 1e-5);
        assert!(info.contacts[0].penetration > 1.0);
    }

    #[test]
    fn fast_spheres_are_caught_by_swept_test() {
        let (ha, hb) = handles();
        let mut a = RigidBody::dynamic_sphere(0.2, Vector3::new(-2.0, 0.0, 0.0), 1.0);
        let mut b = RigidBody::dynamic_sphere(0.2, Vector3::new(2.0, 0.0, 0.0), 1.0);
        a.begin_substep();
        b.begin_substep();
        a.set_position(Vector3::new(1.0, 0.0, 0.0));
        b.set_position(Vector3::new(-1.0, 0.0, 0.0));

        let info = detect_collision(ha, &a, hb, &b, true);
        assert!(info.has_collision());
        assert_relative_eq!(info.normal.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(info.contacts[0].penetration, 2.4, epsilon = 1e-4);
    }
}
