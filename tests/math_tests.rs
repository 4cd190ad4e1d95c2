use approx::assert_relative_eq;
use rigid_physics::math::{Aabb, Matrix3, Quaternion, Ray, Vector3};
use std::f32::consts::{FRAC_PI_2, PI};

#[test]
fn test_vector_operations() {
    let a = Vector3::new(1.0, 2.0, 3.0);
    let b = Vector3::new(4.0, 5.0, 6.0);

    assert_eq!(a + b, Vector3::new(5.0, 7.0, 9.0));
    assert_eq!(b - a, Vector3::new(3.0, 3.0, 3.0));
    assert_relative_eq!(a.dot(&b), 32.0);
    assert_eq!(a.cross(&b), Vector3::new(-3.0, 6.0, -3.0));
    assert_relative_eq!(Vector3::new(3.0, 4.0, 0.0).length(), 5.0);
}

#[test]
fn test_zero_vector_does_not_normalize() {
    assert!(Vector3::ZERO.try_normalize().is_none());
    assert!(Vector3::ZERO.is_zero());

    let n = Vector3::new(0.0, 0.0, 2.0).try_normalize().unwrap();
    assert_relative_eq!(n.z, 1.0);
}

#[test]
fn test_clamp_length_and_reject() {
    let v = Vector3::new(30.0, 40.0, 0.0);
    assert_relative_eq!(v.clamp_length(10.0).length(), 10.0, epsilon = 1e-4);
    assert_eq!(Vector3::new(1.0, 0.0, 0.0).clamp_length(10.0), Vector3::new(1.0, 0.0, 0.0));

    let tangent = Vector3::new(2.0, -3.0, 1.0).reject(&Vector3::UP);
    assert_relative_eq!(tangent.y, 0.0);
    assert_relative_eq!(tangent.x, 2.0);
}

#[test]
fn test_quaternion_rotation() {
    let q = Quaternion::from_axis_angle(Vector3::UP, FRAC_PI_2);
    let rotated = q.rotate(Vector3::new(1.0, 0.0, 0.0));
    assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(rotated.z, -1.0, epsilon = 1e-6);

    let back = q.inverse_rotate(rotated);
    assert_relative_eq!(back.x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(back.z, 0.0, epsilon = 1e-6);
}

#[test]
fn test_quaternion_integration_matches_axis_angle() {
    // Half a turn per second about Z, integrated in small steps.
    let omega = Vector3::new(0.0, 0.0, PI);
    let mut q = Quaternion::identity();
    for _ in 0..1000 {
        q = q.integrate(omega, 0.001);
    }

    let expected = Quaternion::from_axis_angle(Vector3::new(0.0, 0.0, 1.0), PI);
    assert_relative_eq!(q.length(), 1.0, epsilon = 1e-4);
    assert!(q.dot(&expected).abs() > 0.999);
}

#[test]
fn test_rotation_matrix_columns_are_rotated_axes() {
    let q = Quaternion::from_axis_angle(Vector3::new(1.0, 1.0, 0.0).normalize(), 0.7);
    let [c0, c1, c2] = q.to_rotation_matrix().columns();

    for (column, axis) in [(c0, 0), (c1, 1), (c2, 2)] {
        let expected = q.rotate(Vector3::unit(axis));
        assert_relative_eq!(column.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(column.y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(column.z, expected.z, epsilon = 1e-5);
    }

    let m = Matrix3::from_columns(c0, c1, c2);
    let restored = Quaternion::from_rotation_matrix(&m);
    assert!(restored.dot(&q).abs() > 0.9999);
}

#[test]
fn test_aabb_overlap_and_union() {
    let a = Aabb::from_center_half_extents(Vector3::ZERO, Vector3::splat(1.0));
    let b = Aabb::from_center_half_extents(Vector3::new(1.5, 0.0, 0.0), Vector3::splat(1.0));
    let c = Aabb::from_center_half_extents(Vector3::new(5.0, 0.0, 0.0), Vector3::splat(1.0));

    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));

    let u = a.union(&c);
    assert_eq!(u.min, Vector3::new(-1.0, -1.0, -1.0));
    assert_eq!(u.max, Vector3::new(6.0, 1.0, 1.0));
}

#[test]
fn test_aabb_ray_slab() {
    let aabb = Aabb::from_center_half_extents(Vector3::ZERO, Vector3::splat(1.0));

    let ray = Ray::new(Vector3::new(-5.0, 0.2, 0.0), Vector3::new(1.0, 0.0, 0.0));
    let hit = aabb.ray_slab(&ray, 100.0).unwrap();
    assert_relative_eq!(hit.t_enter, 4.0);
    assert_relative_eq!(hit.t_exit, 6.0);
    assert_eq!(hit.normal, Vector3::new(-1.0, 0.0, 0.0));

    // Too short to reach the box.
    assert!(aabb.ray_slab(&ray, 3.0).is_none());

    // Parallel to a slab and outside it.
    let parallel = Ray::new(Vector3::new(-5.0, 2.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    assert!(aabb.ray_slab(&parallel, 100.0).is_none());
}
