use crate::core::BodyHandle;

/// An unordered pair of bodies, used as a key for per-pair state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// The first body in the collision pair
    pub body_a: BodyHandle,

    /// The second body in the collision pair
    pub body_b: BodyHandle,
}

impl CollisionPair {
    /// Creates a new collision pair
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        // Always sort the handles to ensure consistent ordering
        if body_a <= body_b {
            Self { body_a, body_b }
        } else {
            Self { body_a: body_b, body_b: body_a }
        }
    }

    /// Checks if this collision pair contains the specified body
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// Returns the other body in the pair
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ArenaHandle;

    #[test]
    fn pair_is_order_independent() {
        let a = BodyHandle::from_parts(3, 0);
        let b = BodyHandle::from_parts(1, 2);

        let pair = CollisionPair::new(a, b);
        assert_eq!(pair, CollisionPair::new(b, a));
        assert_eq!(pair.body_a, b);
        assert_eq!(pair.other(a), Some(b));
        assert_eq!(pair.other(BodyHandle::from_parts(7, 0)), None);
    }
}
