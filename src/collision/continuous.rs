//! Swept tests used when two bodies pass through each other within one substep.
//!
//! Both tests parametrize motion over the substep as `t ∈ [0, 1]`, with
//! `t = 0` at the previous position and `t = 1` at the current one.

use crate::math::{Aabb, Ray, Vector3, EPSILON};

/// Time of impact of two moving spheres.
///
/// The relative trajectory is treated as a ray against a sphere of radius
/// `radius_a + radius_b`. Returns `None` if the spheres already overlapped at
/// the start of the motion or never touch within the substep.
pub fn sphere_sphere_toi(
    prev_a: Vector3,
    curr_a: Vector3,
    prev_b: Vector3,
    curr_b: Vector3,
    radius_sum: f32,
) -> Option<f32> {
    let origin = prev_b - prev_a;
    let motion = (curr_b - curr_a) - origin;

    let a = motion.length_squared();
    if a < EPSILON {
        return None;
    }

    let c = origin.length_squared() - radius_sum * radius_sum;
    if c <= 0.0 {
        return None;
    }

    let b = origin.dot(&motion);
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / a;
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Time of impact of a moving sphere against a box's bounds inflated by the radius.
///
/// The box's own motion is removed so the sweep runs against its current
/// bounds. A sphere that starts inside the inflated bounds reports no impact.
pub fn sphere_aabb_toi(
    prev_sphere: Vector3,
    curr_sphere: Vector3,
    box_displacement: Vector3,
    box_bounds: &Aabb,
    radius: f32,
) -> Option<(f32, Vector3)> {
    let start = prev_sphere + box_displacement;
    let motion = curr_sphere - start;
    if motion.length_squared() < EPSILON {
        return None;
    }

    let ray = Ray::new(start, motion);
    let hit = box_bounds.expand(radius).ray_slab(&ray, 1.0)?;
    if hit.t_enter <= 0.0 {
        return None;
    }

    Some((hit.t_enter, ray.point_at(hit.t_enter)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spheres_passing_through_each_other_are_caught() {
        // Two unit spheres swap sides in one step.
        let toi = sphere_sphere_toi(
            Vector3::new(-3.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(-3.0, 0.0, 0.0),
            2.0,
        );
        // Gap closes from 6 to 2 at a relative speed of 12 per step.
        assert_relative_eq!(toi.unwrap(), 4.0 / 12.0, epsilon = 1e-5);
    }

    #[test]
    fn overlapping_start_is_not_an_impact() {
        let toi = sphere_sphere_toi(
            Vector3::ZERO,
            Vector3::new(5.0, 0.0, 0.0),
            Vector3::new(0.5, 0.0, 0.0),
            Vector3::new(0.5, 0.0, 0.0),
            1.0,
        );
        assert!(toi.is_none());
    }

    #[test]
    fn sphere_tunnelling_through_thin_box() {
        let bounds = Aabb::new(Vector3::new(-1.0, -0.05, -1.0), Vector3::new(1.0, 0.05, 1.0));
        let (t, centre) = sphere_aabb_toi(
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, -2.0, 0.0),
            Vector3::ZERO,
            &bounds,
            0.25,
        )
        .unwrap();

        assert_relative_eq!(centre.y, 0.3, epsilon = 1e-5);
        assert_relative_eq!(t, 1.7 / 4.0, epsilon = 1e-5);
    }
}
