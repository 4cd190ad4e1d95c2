use crate::bodies::{BodyShape, RigidBody};
use crate::math::{Aabb, Ray, Vector3};

/// Where a ray first meets a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayIntersection {
    /// Distance along the ray (the ray direction is unit length)
    pub distance: f32,

    /// Outward surface normal at the hit point
    pub normal: Vector3,
}

/// Analytic ray-sphere test; a ray starting inside reports distance zero
fn ray_sphere(
    ray: &Ray,
    centre: Vector3,
    radius: f32,
    max_distance: f32,
) -> Option<RayIntersection> {
    let offset = ray.origin - centre;
    let b = offset.dot(&ray.direction);
    let c = offset.length_squared() - radius * radius;

    if c <= 0.0 {
        return Some(RayIntersection { distance: 0.0, normal: -ray.direction });
    }
    if b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let distance = -b - discriminant.sqrt();
    if distance > max_distance {
        return None;
    }
    let normal = (ray.point_at(distance) - centre).normalize();
    Some(RayIntersection { distance, normal })
}

/// Ray against an oriented box: slab test in the box's local frame
fn ray_box(
    ray: &Ray,
    body: &RigidBody,
    half_extents: Vector3,
    max_distance: f32,
) -> Option<RayIntersection> {
    let orientation = body.get_orientation();
    let local = ray.to_local(body.get_position(), &orientation);
    let hit = Aabb::from_center_half_extents(Vector3::ZERO, half_extents)
        .ray_slab(&local, max_distance)?;

    Some(RayIntersection {
        distance: hit.t_enter,
        normal: orientation.rotate(hit.normal),
    })
}

/// Casts a ray with a unit-length direction against one body.
///
/// The world-space bounds are tested first; degenerate shapes never report a hit.
pub fn ray_body(ray: &Ray, body: &RigidBody, max_distance: f32) -> Option<RayIntersection> {
    let shape = body.get_shape();
    if shape.is_degenerate() {
        return None;
    }
    body.get_bounds().ray_slab(ray, max_distance)?;

    match shape {
        BodyShape::Sphere { radius } => ray_sphere(ray, body.get_position(), radius, max_distance),
        BodyShape::Box { half_extents } => ray_box(ray, body, half_extents, max_distance),
    }
}
