use std::collections::HashMap;
use crate::bodies::RigidBody;
use crate::collision::{CollisionInfo, CollisionPair};
use crate::core::{BodyStorage, SimulationConfig, Storage};
use crate::math::{Vector3, EPSILON};

/// Tuning for the contact pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSettings {
    /// Baumgarte velocity bias factor
    pub baumgarte: f32,

    /// Penetration tolerated before bias or correction is applied
    pub slop: f32,

    /// Closing speed above which restitution contributes to the bias
    pub restitution_threshold: f32,

    /// Max distance between a new and an old contact for impulse carry-over
    pub warm_start_radius: f32,

    /// Fraction of residual penetration removed per substep
    pub correction_percent: f32,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for ContactSettings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            baumgarte: config.baumgarte,
            slop: config.penetration_slop,
            restitution_threshold: config.restitution_threshold,
            warm_start_radius: config.warm_start_radius,
            correction_percent: config.correction_percent,
        }
    }
}

/// Sequential-impulse contact solver.
///
/// Runs once per substep as prepare, warm start, a fixed number of resolve
/// iterations, then positional correction. The solver keeps the previous
/// substep's collision infos so accumulated impulses can be carried over to
/// contacts of the same pair that land within `warm_start_radius` of an old one.
#[derive(Debug, Default)]
pub struct ContactSolver {
    settings: ContactSettings,
    previous: Vec<CollisionInfo>,
    previous_index: HashMap<CollisionPair, usize>,
}

/// Pairs the solver acts on: colliding, non-trigger
fn solvable(info: &CollisionInfo) -> bool {
    info.has_collision() && !info.is_trigger
}

/// `1 / (invMassA + invMassB + angular terms)` along `direction`, or zero if nothing can move
fn effective_mass(
    a: &RigidBody,
    b: &RigidBody,
    r_a: Vector3,
    r_b: Vector3,
    direction: Vector3,
) -> f32 {
    let k = a.solver_inverse_mass()
        + b.solver_inverse_mass()
        + a.angular_effective_mass(r_a, direction)
        + b.angular_effective_mass(r_b, direction);
    if k > EPSILON { 1.0 / k } else { 0.0 }
}

#[inline]
fn relative_velocity(a: &RigidBody, b: &RigidBody, r_a: Vector3, r_b: Vector3) -> Vector3 {
    b.point_velocity(r_b) - a.point_velocity(r_a)
}

#[inline]
fn apply_pair_impulse(
    a: &mut RigidBody,
    b: &mut RigidBody,
    impulse: Vector3,
    r_a: Vector3,
    r_b: Vector3,
) {
    a.apply_impulse_at(-impulse, r_a);
    b.apply_impulse_at(impulse, r_b);
}

impl ContactSolver {
    pub fn new(settings: ContactSettings) -> Self {
        Self {
            settings,
            previous: Vec::new(),
            previous_index: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &ContactSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ContactSettings) {
        self.settings = settings;
    }

    /// Collision infos from the last completed substep
    pub fn previous(&self) -> &[CollisionInfo] {
        &self.previous
    }

    /// Keeps this substep's infos for the next warm start
    pub(crate) fn store(&mut self, infos: Vec<CollisionInfo>) {
        self.previous_index = infos
            .iter()
            .enumerate()
            .filter(|(_, info)| solvable(info))
            .map(|(i, info)| (CollisionPair::new(info.body_a, info.body_b), i))
            .collect();
        self.previous = infos;
    }

    pub fn clear(&mut self) {
        self.previous.clear();
        self.previous_index.clear();
    }

    /// Impulse of the closest old contact of the same pair, if one is close enough
    fn carried_impulse(&self, pair: &CollisionPair, position: Vector3) -> f32 {
        let Some(old) = self.previous_index.get(pair).map(|&i| &self.previous[i]) else {
            return 0.0;
        };

        let radius_sq = self.settings.warm_start_radius * self.settings.warm_start_radius;
        old.contacts
            .iter()
            .map(|c| (c.position.distance_squared(&position), c.normal_impulse))
            .filter(|(d, _)| *d <= radius_sq)
            .min_by(|x, y| x.0.total_cmp(&y.0))
            .map_or(0.0, |(_, impulse)| impulse)
    }

    /// Lever arms, effective masses, bias terms and warm-start impulses
    pub(crate) fn prepare(&self, infos: &mut [CollisionInfo], bodies: &BodyStorage, dt: f32) {
        let inv_dt = if dt > EPSILON { 1.0 / dt } else { 0.0 };

        for info in infos.iter_mut().filter(|info| solvable(info)) {
            let (Some(a), Some(b)) = (bodies.get(info.body_a), bodies.get(info.body_b)) else {
                continue;
            };
            let pair = CollisionPair::new(info.body_a, info.body_b);
            let normal = info.normal;
            let restitution = a.get_material().combined_restitution(b.get_material());

            for contact in info.contacts.iter_mut() {
                contact.r_a = contact.position - a.get_position();
                contact.r_b = contact.position - b.get_position();
                contact.normal_mass = effective_mass(a, b, contact.r_a, contact.r_b, normal);

                let mut bias = -self.settings.baumgarte
                    * (contact.penetration - self.settings.slop).max(0.0)
                    * inv_dt;

                let vn = relative_velocity(a, b, contact.r_a, contact.r_b).dot(&normal);
                if vn < -self.settings.restitution_threshold {
                    bias += restitution * vn;
                }
                contact.bias = bias;

                contact.normal_impulse = self.carried_impulse(&pair, contact.position);
            }
        }
    }

    /// Applies the carried-over impulses before the first iteration
    pub(crate) fn warm_start(&self, infos: &[CollisionInfo], bodies: &mut BodyStorage) {
        for info in infos.iter().filter(|info| solvable(info)) {
            let Some((a, b)) = bodies.get_pair_mut(info.body_a, info.body_b) else {
                continue;
            };
            for contact in info.contacts.iter().filter(|c| c.normal_impulse != 0.0) {
                let impulse = info.normal * contact.normal_impulse;
                apply_pair_impulse(a, b, impulse, contact.r_a, contact.r_b);
            }
        }
    }

    /// One sequential-impulse iteration over every contact
    pub(crate) fn resolve(&self, infos: &mut [CollisionInfo], bodies: &mut BodyStorage) {
        for info in infos.iter_mut().filter(|info| solvable(info)) {
            let Some((a, b)) = bodies.get_pair_mut(info.body_a, info.body_b) else {
                continue;
            };
            let normal = info.normal;
            let friction = a.get_material().combined_friction(b.get_material());

            for contact in info.contacts.iter_mut() {
                let (r_a, r_b) = (contact.r_a, contact.r_b);

                // Normal: clamp the running total so contacts only push.
                let vn = relative_velocity(a, b, r_a, r_b).dot(&normal);
                let lambda = -(vn + contact.bias) * contact.normal_mass;
                let previous = contact.normal_impulse;
                contact.normal_impulse = (previous + lambda).max(0.0);
                let applied = contact.normal_impulse - previous;
                apply_pair_impulse(a, b, normal * applied, r_a, r_b);

                // Friction along the tangential slip, bounded by the Coulomb cone.
                let velocity = relative_velocity(a, b, r_a, r_b);
                let Some(tangent) = velocity.reject(&normal).try_normalize() else {
                    continue;
                };
                let tangent_mass = effective_mass(a, b, r_a, r_b, tangent);
                let limit = friction * contact.normal_impulse;
                let jt = (-velocity.dot(&tangent) * tangent_mass).clamp(-limit, limit);
                apply_pair_impulse(a, b, tangent * jt, r_a, r_b);
            }
        }
    }

    /// Pushes each pair apart along its normal by a fraction of the residual penetration.
    ///
    /// Bodies move in proportion to their share of the pair's inverse mass;
    /// static, kinematic and sleeping bodies stay put.
    pub(crate) fn positional_correction(&self, infos: &[CollisionInfo], bodies: &mut BodyStorage) {
        for info in infos.iter().filter(|info| solvable(info)) {
            let correction = (info.max_penetration() - self.settings.slop).max(0.0)
                * self.settings.correction_percent;
            if correction <= 0.0 {
                continue;
            }

            let Some((a, b)) = bodies.get_pair_mut(info.body_a, info.body_b) else {
                continue;
            };
            let (inv_a, inv_b) = (a.solver_inverse_mass(), b.solver_inverse_mass());
            let total = inv_a + inv_b;
            if total <= EPSILON {
                continue;
            }

            if inv_a > 0.0 {
                a.translate(info.normal * (-correction * inv_a / total));
            }
            if inv_b > 0.0 {
                b.translate(info.normal * (correction * inv_b / total));
            }
        }
    }
}
