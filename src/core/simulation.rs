use std::collections::HashSet;
use crate::bodies::RigidBody;
use crate::collision::{
    detect_collision, ray_body, CollisionInfo, CollisionPair, ContactSettings, ContactSolver,
};
use crate::constraints::Constraint;
use crate::core::events::{CollisionEvent, CollisionEventType};
use crate::core::sleeping::update_sleep;
use crate::core::{
    BodyEventType, BodyHandle, BodyStorage, BodyView, ConstraintHandle, ConstraintStorage,
    ContactPoint, EventQueue, RaycastHit, SimulationConfig, Storage,
};
use crate::error::PhysicsError;
use crate::math::{Ray, Vector3};
use crate::Result;

/// Bodies that can move this substep: not static and not asleep
fn is_active(body: &RigidBody) -> bool {
    !body.is_static() && !body.is_sleeping()
}

/// Body and constraint registries plus the per-substep pipeline.
///
/// A substep runs integrate, detect, prepare, warm start, iterate, correct
/// and sleep, in that order. [`PhysicsWorld`](crate::core::PhysicsWorld)
/// drives it on a fixed timestep; it can also be stepped directly.
#[derive(Debug)]
pub struct Simulation {
    bodies: BodyStorage,
    constraints: ConstraintStorage,
    config: SimulationConfig,
    solver: ContactSolver,
    events: EventQueue,

    /// Pairs that were touching at the end of the last substep
    colliding: HashSet<CollisionPair>,

    substeps: u64,
    time: f32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            bodies: BodyStorage::new(),
            constraints: ConstraintStorage::new(),
            solver: ContactSolver::new(ContactSettings::from(&config)),
            events: EventQueue::with_capacity(config.max_queued_events),
            config,
            colliding: HashSet::new(),
            substeps: 0,
            time: 0.0,
        }
    }

    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn get_config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    pub fn set_gravity(&mut self, gravity: Vector3) {
        self.config.gravity = gravity;
    }

    /// Total number of substeps executed
    pub fn substep_count(&self) -> u64 {
        self.substeps
    }

    /// Simulated time in seconds
    pub fn get_time(&self) -> f32 {
        self.time
    }

    // === Registration ===

    /// Registers a body; rejects non-finite state, degenerate shapes and massless dynamic bodies
    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyHandle> {
        if !body.get_position().is_finite() || !body.get_linear_velocity().is_finite() {
            tracing::warn!("rejected body with non-finite position or velocity");
            return Err(PhysicsError::InvalidParameter(
                "body position and velocity must be finite".into(),
            ));
        }
        if body.get_shape().is_degenerate() {
            tracing::warn!(shape = ?body.get_shape(), "rejected body with degenerate shape");
            return Err(PhysicsError::InvalidParameter(format!(
                "degenerate shape {:?}",
                body.get_shape()
            )));
        }
        if body.is_dynamic() && !(body.get_mass() > 0.0 && body.get_mass().is_finite()) {
            tracing::warn!(mass = body.get_mass(), "rejected dynamic body without positive mass");
            return Err(PhysicsError::InvalidParameter(format!(
                "dynamic body mass must be positive, got {}",
                body.get_mass()
            )));
        }

        let handle = self.bodies.add(body);
        self.events.add_body_event(BodyEventType::Added, handle);
        Ok(handle)
    }

    /// Removes a body, the constraints attached to it, and wakes whatever it was touching
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let body = self.bodies.remove(handle).ok_or(PhysicsError::BodyNotFound(handle))?;

        let attached: Vec<ConstraintHandle> = self
            .constraints
            .iter()
            .filter(|(_, constraint)| constraint.involves_body(handle))
            .map(|(c_handle, _)| c_handle)
            .collect();
        for c_handle in attached {
            self.constraints.remove(c_handle);
        }

        let touching: Vec<BodyHandle> = self
            .colliding
            .iter()
            .filter_map(|pair| pair.other(handle))
            .collect();
        for other in touching {
            self.wake_body(other);
        }
        self.colliding.retain(|pair| !pair.contains(handle));

        self.events.add_body_event(BodyEventType::Removed, handle);
        Ok(body)
    }

    pub fn get_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.get(handle).ok_or(PhysicsError::BodyNotFound(handle))
    }

    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.get_mut(handle).ok_or(PhysicsError::BodyNotFound(handle))
    }

    pub fn bodies(&self) -> &BodyStorage {
        &self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Registers a joint between two distinct, registered bodies and wakes them
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintHandle> {
        let (a, b) = constraint.get_bodies();
        if a == b {
            tracing::warn!(body = ?a, "rejected constraint connecting a body to itself");
            return Err(PhysicsError::InvalidParameter(
                "constraint must connect two different bodies".into(),
            ));
        }
        for handle in [a, b] {
            if !self.bodies.contains(handle) {
                tracing::warn!(body = ?handle, "rejected constraint referencing unknown body");
                return Err(PhysicsError::BodyNotFound(handle));
            }
        }

        self.wake_body(a);
        self.wake_body(b);
        Ok(self.constraints.add(constraint))
    }

    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<Constraint> {
        let constraint = self
            .constraints
            .remove(handle)
            .ok_or(PhysicsError::ConstraintNotFound(handle))?;
        let (a, b) = constraint.get_bodies();
        self.wake_body(a);
        self.wake_body(b);
        Ok(constraint)
    }

    pub fn get_constraint(&self, handle: ConstraintHandle) -> Result<&Constraint> {
        self.constraints
            .get(handle)
            .ok_or(PhysicsError::ConstraintNotFound(handle))
    }

    pub fn get_constraint_mut(&mut self, handle: ConstraintHandle) -> Result<&mut Constraint> {
        self.constraints
            .get_mut(handle)
            .ok_or(PhysicsError::ConstraintNotFound(handle))
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Wakes a body and records the event; returns true if it was asleep
    pub fn wake_body(&mut self, handle: BodyHandle) -> bool {
        let woke = self
            .bodies
            .get_mut(handle)
            .map_or(false, |body| body.wake_up());
        if woke {
            self.events.add_body_event(BodyEventType::Awake, handle);
            tracing::debug!(?handle, "body woken");
        }
        woke
    }

    // === Queries ===

    /// Collision infos from the last substep
    pub fn collision_infos(&self) -> &[CollisionInfo] {
        self.solver.previous()
    }

    /// Contact points of the last substep, for debug drawing
    pub fn contact_points(&self) -> Vec<ContactPoint> {
        self.solver
            .previous()
            .iter()
            .flat_map(|info| info.contact_points())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<BodyView> {
        self.bodies
            .iter()
            .map(|(handle, body)| BodyView::new(handle, body))
            .collect()
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Hands over every queued event
    pub fn drain_events(&mut self) -> EventQueue {
        self.events.take()
    }

    /// Nearest hit of a unit-direction ray over all bodies
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RaycastHit> {
        self.bodies
            .iter()
            .filter_map(|(handle, body)| {
                ray_body(ray, body, max_distance).map(|hit| RaycastHit::new(handle, ray, hit))
            })
            .min_by(|x, y| x.distance.total_cmp(&y.distance))
    }

    /// Ray against a single body; a stale handle is a miss
    pub fn raycast_body(
        &self,
        handle: BodyHandle,
        ray: &Ray,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        let body = self.bodies.get(handle)?;
        ray_body(ray, body, max_distance).map(|hit| RaycastHit::new(handle, ray, hit))
    }

    // === Stepping ===

    /// Advances the simulation by one substep of `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if !(dt > 0.0) || !dt.is_finite() {
            tracing::warn!(dt, "ignoring step with non-positive time step");
            return;
        }

        if self.events.capacity() != self.config.max_queued_events {
            self.events.set_capacity(self.config.max_queued_events);
        }
        self.integrate(dt);

        let mut infos = self.detect_collisions(dt);
        self.wake_jointed_bodies();

        self.solver.set_settings(ContactSettings::from(&self.config));
        self.solver.prepare(&mut infos, &self.bodies, dt);
        for (_, constraint) in self.constraints.iter_mut() {
            constraint.pre_step(&self.bodies, self.config.baumgarte, dt);
        }

        self.solver.warm_start(&infos, &mut self.bodies);
        for _ in 0..self.config.solver_iterations {
            self.solver.resolve(&mut infos, &mut self.bodies);
            for (_, constraint) in self.constraints.iter() {
                constraint.solve(&mut self.bodies);
            }
        }
        self.solver.positional_correction(&infos, &mut self.bodies);

        update_sleep(&mut self.bodies, &infos, &self.config, dt, &mut self.events);

        self.solver.store(infos);
        self.substeps += 1;
        self.time += dt;
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.config.gravity;
        for (_, body) in self.bodies.iter_mut() {
            body.begin_substep();
            body.apply_gravity(gravity);
            body.update(dt);
        }
    }

    /// Pairwise narrow phase over every pair with at least one active body
    fn detect_collisions(&mut self, dt: f32) -> Vec<CollisionInfo> {
        let ccd = self.config.use_ccd && dt > 0.0;
        let handles = self.bodies.handles();
        let mut infos = Vec::new();
        let mut to_wake = Vec::new();

        for (i, &handle_a) in handles.iter().enumerate() {
            for &handle_b in &handles[i + 1..] {
                let (Some(a), Some(b)) = (self.bodies.get(handle_a), self.bodies.get(handle_b))
                else {
                    continue;
                };
                if !is_active(a) && !is_active(b) {
                    continue;
                }

                let info = detect_collision(handle_a, a, handle_b, b, ccd);
                if !info.has_collision() {
                    continue;
                }

                if !info.is_trigger {
                    let relative = b.get_linear_velocity() - a.get_linear_velocity();
                    if relative.length_squared() > self.config.wake_velocity_threshold {
                        if a.is_sleeping() {
                            to_wake.push(handle_a);
                        }
                        if b.is_sleeping() {
                            to_wake.push(handle_b);
                        }
                    }
                }
                infos.push(info);
            }
        }

        for handle in to_wake {
            self.wake_body(handle);
        }
        self.update_collision_events(&infos);

        tracing::trace!(
            pairs = infos.len(),
            contacts = infos.iter().map(|info| info.contacts.len()).sum::<usize>(),
            "narrow phase"
        );
        infos
    }

    /// A sleeping body jointed to a body moving faster than the wake threshold wakes up
    fn wake_jointed_bodies(&mut self) {
        let threshold = self.config.wake_velocity_threshold;
        let mut to_wake = Vec::new();

        for (_, constraint) in self.constraints.iter().filter(|(_, c)| c.is_enabled()) {
            let (ha, hb) = constraint.get_bodies();
            let (Some(a), Some(b)) = (self.bodies.get(ha), self.bodies.get(hb)) else {
                continue;
            };
            let relative = b.get_linear_velocity() - a.get_linear_velocity();
            if relative.length_squared() <= threshold {
                continue;
            }
            if a.is_sleeping() {
                to_wake.push(ha);
            }
            if b.is_sleeping() {
                to_wake.push(hb);
            }
        }

        for handle in to_wake {
            self.wake_body(handle);
        }
    }

    /// Emits Begin/Trigger for new pairs and End for pairs that separated.
    ///
    /// Pairs skipped because both bodies are inactive keep their previous state.
    fn update_collision_events(&mut self, infos: &[CollisionInfo]) {
        let previous = std::mem::take(&mut self.colliding);
        let mut current = HashSet::with_capacity(infos.len());

        for info in infos {
            let pair = CollisionPair::new(info.body_a, info.body_b);
            current.insert(pair);
            if previous.contains(&pair) {
                continue;
            }

            let event_type = if info.is_trigger {
                CollisionEventType::Trigger
            } else {
                CollisionEventType::Begin
            };
            self.events.add_collision_event(CollisionEvent {
                event_type,
                body_a: info.body_a,
                body_b: info.body_b,
                contacts: info.contact_points().collect(),
            });
        }

        for pair in previous {
            if current.contains(&pair) {
                continue;
            }
            let (Some(a), Some(b)) = (self.bodies.get(pair.body_a), self.bodies.get(pair.body_b))
            else {
                continue;
            };
            if !is_active(a) && !is_active(b) {
                current.insert(pair);
                continue;
            }
            self.events.add_collision_event(CollisionEvent {
                event_type: CollisionEventType::End,
                body_a: pair.body_a,
                body_b: pair.body_b,
                contacts: Vec::new(),
            });
        }

        self.colliding = current;
    }
}
