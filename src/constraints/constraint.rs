use crate::constraints::distance::JointFrame;
use crate::core::{BodyHandle, BodyStorage, Storage};
use crate::math::Vector3;

/// Joint variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintKind {
    /// Keeps the anchors `rest_length` apart, pushing or pulling as needed
    Distance { rest_length: f32 },

    /// Pins the anchors together (ball-and-socket)
    Point,
}

impl ConstraintKind {
    pub fn rest_length(&self) -> f32 {
        match *self {
            ConstraintKind::Distance { rest_length } => rest_length,
            ConstraintKind::Point => 0.0,
        }
    }
}

/// A joint between two bodies, anchored at body-local offsets.
///
/// `pre_step` caches a [`JointFrame`] that `solve` consumes; every mutator
/// drops the cache so a stale frame is never solved.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    body_a: BodyHandle,
    body_b: BodyHandle,
    local_anchor_a: Vector3,
    local_anchor_b: Vector3,
    kind: ConstraintKind,
    enabled: bool,
    frame: Option<JointFrame>,
}

impl Constraint {
    pub fn new(
        body_a: BodyHandle,
        body_b: BodyHandle,
        local_anchor_a: Vector3,
        local_anchor_b: Vector3,
        kind: ConstraintKind,
    ) -> Self {
        let kind = match kind {
            ConstraintKind::Distance { rest_length } => ConstraintKind::Distance {
                rest_length: rest_length.max(0.0),
            },
            ConstraintKind::Point => ConstraintKind::Point,
        };

        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            kind,
            enabled: true,
            frame: None,
        }
    }

    /// Creates a distance joint
    pub fn distance(
        body_a: BodyHandle,
        body_b: BodyHandle,
        local_anchor_a: Vector3,
        local_anchor_b: Vector3,
        rest_length: f32,
    ) -> Self {
        let kind = ConstraintKind::Distance { rest_length };
        Self::new(body_a, body_b, local_anchor_a, local_anchor_b, kind)
    }

    /// Creates a point (ball-and-socket) joint
    pub fn point(
        body_a: BodyHandle,
        body_b: BodyHandle,
        local_anchor_a: Vector3,
        local_anchor_b: Vector3,
    ) -> Self {
        Self::new(body_a, body_b, local_anchor_a, local_anchor_b, ConstraintKind::Point)
    }

    pub fn get_bodies(&self) -> (BodyHandle, BodyHandle) {
        (self.body_a, self.body_b)
    }

    /// Checks if the constraint involves a specific body
    pub fn involves_body(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }

    pub fn get_kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn get_anchors(&self) -> (Vector3, Vector3) {
        (self.local_anchor_a, self.local_anchor_b)
    }

    pub fn set_anchors(&mut self, local_anchor_a: Vector3, local_anchor_b: Vector3) {
        self.local_anchor_a = local_anchor_a;
        self.local_anchor_b = local_anchor_b;
        self.frame = None;
    }

    pub fn get_rest_length(&self) -> f32 {
        self.kind.rest_length()
    }

    /// Changes the rest length; has no effect on point joints
    pub fn set_rest_length(&mut self, rest_length: f32) {
        if let ConstraintKind::Distance { .. } = self.kind {
            self.kind = ConstraintKind::Distance { rest_length: rest_length.max(0.0) };
            self.frame = None;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.frame = None;
    }

    /// The frame cached by the last `pre_step`, if still valid
    pub fn get_frame(&self) -> Option<&JointFrame> {
        self.frame.as_ref()
    }

    /// Caches lever arms, axis, effective mass and bias for this substep
    pub fn pre_step(&mut self, bodies: &BodyStorage, baumgarte: f32, dt: f32) {
        self.frame = None;
        if !self.enabled {
            return;
        }
        let (Some(a), Some(b)) = (bodies.get(self.body_a), bodies.get(self.body_b)) else {
            return;
        };

        self.frame = Some(JointFrame::compute(
            a,
            b,
            self.local_anchor_a,
            self.local_anchor_b,
            self.kind.rest_length(),
            baumgarte,
            dt,
        ));
    }

    /// One velocity iteration; a no-op without a cached frame
    pub fn solve(&self, bodies: &mut BodyStorage) {
        let Some(frame) = self.frame.as_ref() else {
            return;
        };
        if let Some((a, b)) = bodies.get_pair_mut(self.body_a, self.body_b) {
            frame.solve(a, b);
        }
    }

    /// World-space anchor separation minus the rest length
    pub fn length_error(&self, bodies: &BodyStorage) -> Option<f32> {
        let a = bodies.get(self.body_a)?;
        let b = bodies.get(self.body_b)?;
        let anchor_a = a.get_position() + a.get_orientation().rotate(self.local_anchor_a);
        let anchor_b = b.get_position() + b.get_orientation().rotate(self.local_anchor_b);
        Some(anchor_a.distance(&anchor_b) - self.kind.rest_length())
    }
}
