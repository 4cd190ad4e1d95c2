//! Oriented box against oriented box: separating-axis test followed by
//! reference/incident face clipping.

use crate::collision::contact::MAX_CONTACTS;
use crate::math::{Quaternion, Vector3, EPSILON};

/// Axis projections are biased by this much so near-parallel edges don't report false separation
const SAT_EPSILON: f32 = 1.0e-4;

/// Incident points this far above the reference plane are still kept
const CLIP_EPSILON: f32 = 1.0e-3;

/// An oriented box in world space
#[derive(Debug, Clone, Copy)]
pub struct Obb {
    pub center: Vector3,
    pub axes: [Vector3; 3],
    pub half_extents: Vector3,
}

impl Obb {
    pub fn new(center: Vector3, orientation: &Quaternion, half_extents: Vector3) -> Self {
        Self {
            center,
            axes: orientation.to_rotation_matrix().columns(),
            half_extents,
        }
    }

    /// Half-length of the box's projection onto `axis`
    #[inline]
    pub fn projected_radius(&self, axis: &Vector3) -> f32 {
        (0..3)
            .map(|i| self.half_extents[i] * self.axes[i].dot(axis).abs())
            .sum()
    }

    /// The face whose outward normal is most aligned with `direction`: (axis index, sign)
    fn face_toward(&self, direction: &Vector3) -> (usize, f32) {
        let mut best = 0;
        let mut best_dot = 0.0f32;
        for i in 0..3 {
            let d = self.axes[i].dot(direction);
            if d.abs() > best_dot.abs() {
                best = i;
                best_dot = d;
            }
        }
        (best, if best_dot < 0.0 { -1.0 } else { 1.0 })
    }

    /// Corners of a face, wound around the face normal
    fn face_vertices(&self, axis: usize, sign: f32) -> [Vector3; 4] {
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        let centre = self.center + self.axes[axis] * (sign * self.half_extents[axis]);
        let eu = self.axes[u] * self.half_extents[u];
        let ev = self.axes[v] * self.half_extents[v];
        [
            centre + eu + ev,
            centre - eu + ev,
            centre - eu - ev,
            centre + eu - ev,
        ]
    }
}

/// Result of a box-box test: normal from A to B and the contact points with their depths
#[derive(Debug, Clone)]
pub struct BoxManifold {
    pub normal: Vector3,
    pub points: Vec<(Vector3, f32)>,
}

/// Which axis family produced the minimum overlap
#[derive(Debug, Clone, Copy, PartialEq)]
enum AxisSource {
    FaceA,
    FaceB,
    Edge,
}

/// Separating-axis test over the 15 candidate axes.
///
/// Returns the axis of least overlap, oriented from A to B, its overlap and
/// where it came from, or `None` if any axis separates the boxes.
fn least_overlap_axis(a: &Obb, b: &Obb) -> Option<(Vector3, f32, AxisSource)> {
    let offset = b.center - a.center;
    let mut best: Option<(Vector3, f32, AxisSource)> = None;

    let mut test = |axis: Vector3, source: AxisSource| -> bool {
        let length_sq = axis.length_squared();
        if length_sq < EPSILON {
            // Parallel edges produce no usable axis.
            return true;
        }
        let axis = axis / length_sq.sqrt();

        let distance = offset.dot(&axis);
        let radius = a.projected_radius(&axis) + b.projected_radius(&axis);
        if distance.abs() > radius + SAT_EPSILON {
            return false;
        }

        let overlap = radius - distance.abs();
        if best.map_or(true, |(_, o, _)| overlap < o) {
            let oriented = if distance < 0.0 { -axis } else { axis };
            best = Some((oriented, overlap, source));
        }
        true
    };

    for i in 0..3 {
        if !test(a.axes[i], AxisSource::FaceA) {
            return None;
        }
    }
    for i in 0..3 {
        if !test(b.axes[i], AxisSource::FaceB) {
            return None;
        }
    }
    for i in 0..3 {
        for j in 0..3 {
            if !test(a.axes[i].cross(&b.axes[j]), AxisSource::Edge) {
                return None;
            }
        }
    }

    best
}

/// Clips a convex polygon against the half-space `dot(plane_normal, p) <= plane_offset`
fn clip_polygon(polygon: &[Vector3], plane_normal: &Vector3, plane_offset: f32) -> Vec<Vector3> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    let Some(&last) = polygon.last() else {
        return out;
    };

    let mut prev = last;
    let mut prev_dist = plane_normal.dot(&prev) - plane_offset;
    for &curr in polygon {
        let curr_dist = plane_normal.dot(&curr) - plane_offset;
        if curr_dist <= 0.0 {
            if prev_dist > 0.0 {
                out.push(prev.lerp(&curr, prev_dist / (prev_dist - curr_dist)));
            }
            out.push(curr);
        } else if prev_dist <= 0.0 {
            out.push(prev.lerp(&curr, prev_dist / (prev_dist - curr_dist)));
        }
        prev = curr;
        prev_dist = curr_dist;
    }
    out
}

/// Keeps the deepest point plus the three that span the widest area
fn reduce_contacts(points: Vec<(Vector3, f32)>, face_normal: &Vector3) -> Vec<(Vector3, f32)> {
    if points.len() <= MAX_CONTACTS {
        return points;
    }

    let deepest = points
        .iter()
        .enumerate()
        .fold(0, |best, (i, p)| if p.1 > points[best].1 { i } else { best });
    let p0 = points[deepest].0;

    let farthest = points
        .iter()
        .enumerate()
        .fold(deepest, |best, (i, p)| {
            if p.0.distance_squared(&p0) > points[best].0.distance_squared(&p0) { i } else { best }
        });
    let p1 = points[farthest].0;

    let signed_area = |p: &Vector3| (p1 - p0).cross(&(*p - p0)).dot(face_normal);
    let (mut max_i, mut min_i) = (deepest, deepest);
    for (i, p) in points.iter().enumerate() {
        if signed_area(&p.0) > signed_area(&points[max_i].0) {
            max_i = i;
        }
        if signed_area(&p.0) < signed_area(&points[min_i].0) {
            min_i = i;
        }
    }

    let mut picked = vec![deepest];
    for i in [farthest, max_i, min_i] {
        if !picked.contains(&i) {
            picked.push(i);
        }
    }
    picked.into_iter().map(|i| points[i]).collect()
}

/// Full box-box narrow phase.
///
/// The reference face belongs to A unless the least-overlap axis is one of
/// B's face normals. The incident face is the other box's face most
/// anti-aligned with the reference normal; its corners are clipped to the
/// reference face's side planes and kept when they lie below (or within
/// [`CLIP_EPSILON`] of) the reference plane. Each kept point is placed
/// halfway between the incident surface and the reference plane.
pub fn box_box(a: &Obb, b: &Obb) -> Option<BoxManifold> {
    let (normal, overlap, source) = least_overlap_axis(a, b)?;

    // Reference face normal points from the reference box toward the incident box.
    let (reference, incident, ref_direction) = match source {
        AxisSource::FaceB => (b, a, -normal),
        AxisSource::FaceA | AxisSource::Edge => (a, b, normal),
    };

    let (ref_axis, ref_sign) = reference.face_toward(&ref_direction);
    let ref_normal = reference.axes[ref_axis] * ref_sign;
    let ref_offset = ref_normal.dot(&reference.center) + reference.half_extents[ref_axis];

    let (inc_axis, inc_sign) = incident.face_toward(&-ref_normal);
    let mut polygon = incident.face_vertices(inc_axis, inc_sign).to_vec();

    for side in [(ref_axis + 1) % 3, (ref_axis + 2) % 3] {
        let axis = reference.axes[side];
        let extent = reference.half_extents[side];
        let centre = axis.dot(&reference.center);
        polygon = clip_polygon(&polygon, &axis, centre + extent);
        polygon = clip_polygon(&polygon, &-axis, -centre + extent);
    }

    let points: Vec<(Vector3, f32)> = polygon
        .into_iter()
        .filter_map(|vertex| {
            let depth = ref_offset - ref_normal.dot(&vertex);
            (depth >= -CLIP_EPSILON).then(|| {
                let depth = depth.max(0.0);
                (vertex + ref_normal * (depth * 0.5), depth)
            })
        })
        .collect();

    let points = if points.is_empty() {
        vec![((a.center + b.center) * 0.5, overlap.max(0.0))]
    } else {
        reduce_contacts(points, &ref_normal)
    };

    Some(BoxManifold { normal, points })
}
