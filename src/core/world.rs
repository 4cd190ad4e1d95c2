use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, TryLockError};
use crate::bodies::RigidBody;
use crate::collision::RayIntersection;
use crate::constraints::Constraint;
use crate::core::{
    BodyHandle, BodyView, ConstraintHandle, ContactPoint, EventQueue, JobScheduler, Simulation,
    SimulationConfig,
};
use crate::error::PhysicsError;
use crate::math::{Ray, Vector3};
use crate::Result;

/// Fraction of a step forgiven when counting whole steps in the accumulator
const STEP_COUNT_TOLERANCE: f32 = 1e-4;

/// Nearest body hit by a world raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub body: BodyHandle,
    pub point: Vector3,

    /// Outward surface normal at `point`
    pub normal: Vector3,

    /// Distance from the ray origin along its unit direction
    pub distance: f32,
}

impl RaycastHit {
    pub(crate) fn new(body: BodyHandle, ray: &Ray, hit: RayIntersection) -> Self {
        Self {
            body,
            point: ray.point_at(hit.distance),
            normal: hit.normal,
            distance: hit.distance,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-flight flag for an asynchronous batch, with a completion signal
#[derive(Default)]
struct StepSignal {
    in_progress: Mutex<bool>,
    completion_signal: Condvar,
}

impl StepSignal {
    fn is_set(&self) -> bool {
        *lock(&self.in_progress)
    }

    fn begin(&self) {
        *lock(&self.in_progress) = true;
    }

    fn finish(&self) {
        *lock(&self.in_progress) = false;
        self.completion_signal.notify_all();
    }

    fn wait(&self) {
        let mut in_progress = lock(&self.in_progress);
        while *in_progress {
            in_progress = self
                .completion_signal
                .wait(in_progress)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Signals completion when the step job finishes or is dropped unrun
struct StepGuard(Arc<StepSignal>);

impl Drop for StepGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// The main physics world: a fixed-timestep driver around a [`Simulation`].
///
/// Real frame time is fed to [`update_fixed`](Self::update_fixed), which runs
/// whole substeps of `time_step` seconds, at most `max_substeps` per call. Time
/// beyond that cap is dropped, so under sustained overload the simulation falls
/// behind real time instead of spiralling.
///
/// With async mode enabled and a [`JobScheduler`] installed, a tick's batch of
/// substeps is handed to the scheduler as one job. While that job runs, mutating
/// calls return [`PhysicsError::StepInProgress`] and reads wait for the step.
pub struct PhysicsWorld {
    simulation: Arc<Mutex<Simulation>>,
    step_signal: Arc<StepSignal>,
    scheduler: Option<Arc<dyn JobScheduler>>,
    async_enabled: bool,

    /// Unsimulated real time in seconds
    accumulator: f32,

    time_step: f32,
    max_substeps: u32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new physics world with the given configuration
    pub fn with_config(mut config: SimulationConfig) -> Self {
        if !(config.time_step > 0.0) {
            tracing::warn!(time_step = config.time_step, "invalid time step, using 1/60");
            config.time_step = SimulationConfig::default().time_step;
        }
        let time_step = config.time_step;
        let max_substeps = config.max_substeps.max(1);

        Self {
            simulation: Arc::new(Mutex::new(Simulation::new(config))),
            step_signal: Arc::new(StepSignal::default()),
            scheduler: None,
            async_enabled: false,
            accumulator: 0.0,
            time_step,
            max_substeps,
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_step_in_progress() {
            return Err(PhysicsError::StepInProgress);
        }
        Ok(())
    }

    fn lock_idle(&self) -> Result<MutexGuard<'_, Simulation>> {
        self.ensure_idle()?;
        Ok(lock(&self.simulation))
    }

    /// Whether an asynchronous step has been submitted and not yet finished
    pub fn is_step_in_progress(&self) -> bool {
        self.step_signal.is_set()
    }

    /// Blocks until any in-flight asynchronous step has finished
    pub fn wait_for_step(&self) {
        self.step_signal.wait();
    }

    // === Configuration ===

    pub fn set_gravity(&mut self, gravity: Vector3) -> Result<()> {
        self.lock_idle()?.set_gravity(gravity);
        Ok(())
    }

    pub fn get_gravity(&self) -> Vector3 {
        lock(&self.simulation).get_config().gravity
    }

    /// Sets the fixed substep length; non-positive values are rejected
    pub fn set_fixed_time_step(&mut self, time_step: f32) -> Result<()> {
        if !(time_step > 0.0) || !time_step.is_finite() {
            tracing::warn!(time_step, "ignoring non-positive fixed time step");
            return Err(PhysicsError::InvalidParameter(format!(
                "fixed time step must be positive, got {time_step}"
            )));
        }
        self.lock_idle()?.get_config_mut().time_step = time_step;
        self.time_step = time_step;
        self.accumulator = self.accumulator.min(time_step * self.max_substeps as f32);
        Ok(())
    }

    pub fn get_fixed_time_step(&self) -> f32 {
        self.time_step
    }

    /// Unsimulated real time carried to the next [`update_fixed`](Self::update_fixed) call
    pub fn get_accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Enables offloading substeps to the installed scheduler
    pub fn set_async_enabled(&mut self, enabled: bool) {
        self.async_enabled = enabled;
    }

    pub fn is_async_enabled(&self) -> bool {
        self.async_enabled
    }

    pub fn set_scheduler(&mut self, scheduler: Arc<dyn JobScheduler>) {
        self.scheduler = Some(scheduler);
    }

    pub fn clear_scheduler(&mut self) {
        self.scheduler = None;
    }

    fn active_scheduler(&self) -> Option<Arc<dyn JobScheduler>> {
        if !self.async_enabled {
            return None;
        }
        self.scheduler
            .as_ref()
            .filter(|scheduler| scheduler.is_enabled())
            .cloned()
    }

    // === Stepping ===

    /// Feeds `frame_delta` seconds of real time and runs the whole substeps it covers.
    ///
    /// Returns the number of substeps executed inline or submitted to the
    /// scheduler. An async tick that finds a step still in flight runs nothing
    /// and keeps the accumulated time for later.
    pub fn update_fixed(&mut self, frame_delta: f32) -> u32 {
        if !(frame_delta > 0.0) || !frame_delta.is_finite() {
            return 0;
        }

        let dt = self.time_step;
        self.accumulator = (self.accumulator + frame_delta).min(dt * self.max_substeps as f32);
        let steps = ((self.accumulator / dt + STEP_COUNT_TOLERANCE).floor() as u32)
            .min(self.max_substeps);
        if steps == 0 {
            return 0;
        }

        if let Some(scheduler) = self.active_scheduler() {
            if self.is_step_in_progress() {
                return 0;
            }
            self.consume(steps);
            return self.submit_steps(scheduler.as_ref(), steps, dt);
        }

        self.consume(steps);
        let mut simulation = lock(&self.simulation);
        for _ in 0..steps {
            simulation.step(dt);
        }
        steps
    }

    fn consume(&mut self, steps: u32) {
        self.accumulator = (self.accumulator - steps as f32 * self.time_step).max(0.0);
    }

    fn submit_steps(&self, scheduler: &dyn JobScheduler, steps: u32, dt: f32) -> u32 {
        self.step_signal.begin();
        let guard = StepGuard(Arc::clone(&self.step_signal));
        let simulation = Arc::clone(&self.simulation);

        let submitted = scheduler.submit(Box::new(move || {
            let _guard = guard;
            let mut simulation = lock(&simulation);
            for _ in 0..steps {
                simulation.step(dt);
            }
        }));

        if submitted {
            tracing::debug!(steps, "submitted physics batch");
            steps
        } else {
            tracing::warn!(steps, "physics job submission failed, skipping tick");
            0
        }
    }

    /// Runs one substep of the fixed time step immediately, bypassing the accumulator
    pub fn step(&mut self) -> Result<()> {
        let dt = self.time_step;
        self.lock_idle()?.step(dt);
        Ok(())
    }

    // === Registration ===

    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyHandle> {
        self.lock_idle()?.add_body(body)
    }

    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        self.lock_idle()?.remove_body(handle)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintHandle> {
        self.lock_idle()?.add_constraint(constraint)
    }

    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<Constraint> {
        self.lock_idle()?.remove_constraint(handle)
    }

    /// Runs `f` with mutable access to a body, e.g. to apply an impulse
    pub fn with_body_mut<R>(
        &mut self,
        handle: BodyHandle,
        f: impl FnOnce(&mut RigidBody) -> R,
    ) -> Result<R> {
        let mut simulation = self.lock_idle()?;
        simulation.wake_body(handle);
        simulation.get_body_mut(handle).map(f)
    }

    // === Queries ===

    /// Copy of a body's current state
    pub fn get_body(&self, handle: BodyHandle) -> Result<RigidBody> {
        lock(&self.simulation).get_body(handle).cloned()
    }

    pub fn body_count(&self) -> usize {
        lock(&self.simulation).body_count()
    }

    /// Locks the simulation for direct access, waiting for any in-flight step
    pub fn lock_simulation(&self) -> MutexGuard<'_, Simulation> {
        lock(&self.simulation)
    }

    /// Casts a ray and returns the nearest hit within `max_distance`.
    ///
    /// `direction` need not be unit length; a zero direction or a non-positive
    /// range is a miss.
    pub fn raycast(
        &self,
        origin: Vector3,
        direction: Vector3,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        if !(max_distance > 0.0) {
            return None;
        }
        let ray = Ray::new_normalized(origin, direction)?;
        lock(&self.simulation).raycast(&ray, max_distance)
    }

    /// Casts a ray against one body; a stale handle is a miss
    pub fn raycast_body(
        &self,
        handle: BodyHandle,
        origin: Vector3,
        direction: Vector3,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        if !(max_distance > 0.0) {
            return None;
        }
        let ray = Ray::new_normalized(origin, direction)?;
        lock(&self.simulation).raycast_body(handle, &ray, max_distance)
    }

    /// Render state of every body, waiting for any in-flight step
    pub fn snapshot(&self) -> Vec<BodyView> {
        lock(&self.simulation).snapshot()
    }

    /// Render state of every body, or `None` while a step is running
    pub fn try_snapshot(&self) -> Option<Vec<BodyView>> {
        if self.is_step_in_progress() {
            return None;
        }
        match self.simulation.try_lock() {
            Ok(simulation) => Some(simulation.snapshot()),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner().snapshot()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Contact points of the last executed substep
    pub fn contact_points(&self) -> Vec<ContactPoint> {
        lock(&self.simulation).contact_points()
    }

    /// Takes every event queued since the last drain
    pub fn drain_events(&mut self) -> EventQueue {
        lock(&self.simulation).drain_events()
    }

    /// Simulated time in seconds
    pub fn get_time(&self) -> f32 {
        lock(&self.simulation).get_time()
    }

    pub fn substep_count(&self) -> u64 {
        lock(&self.simulation).substep_count()
    }
}

impl Drop for PhysicsWorld {
    fn drop(&mut self) {
        self.wait_for_step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::BodyShape;

    #[test]
    fn accumulator_runs_whole_steps_and_keeps_remainder() {
        let mut world = PhysicsWorld::new();
        let dt = world.get_fixed_time_step();

        assert_eq!(world.update_fixed(dt * 0.5), 0);
        assert_eq!(world.update_fixed(dt * 0.75), 1);
        assert!((world.get_accumulator() - dt * 0.25).abs() < 1e-5);
        assert_eq!(world.substep_count(), 1);
    }

    #[test]
    fn long_frames_are_capped() {
        let mut world = PhysicsWorld::new();
        let dt = world.get_fixed_time_step();

        assert_eq!(world.update_fixed(dt * 10.0), 3);
        assert_eq!(world.get_accumulator(), 0.0);
        assert_eq!(world.update_fixed(-1.0), 0);
        assert_eq!(world.update_fixed(f32::NAN), 0);
    }

    #[test]
    fn invalid_time_step_is_rejected() {
        let mut world = PhysicsWorld::new();
        assert!(world.set_fixed_time_step(0.0).is_err());
        assert!(world.set_fixed_time_step(-0.1).is_err());
        assert!(world.set_fixed_time_step(0.01).is_ok());
        assert_eq!(world.get_fixed_time_step(), 0.01);
    }

    #[test]
    fn raycast_with_zero_direction_misses() {
        let mut world = PhysicsWorld::new();
        world
            .add_body(RigidBody::new_static(BodyShape::Sphere { radius: 1.0 }, Vector3::ZERO))
            .unwrap();

        assert!(world.raycast(Vector3::new(0.0, 5.0, 0.0), Vector3::ZERO, 10.0).is_none());
        assert!(world.raycast(Vector3::new(0.0, 5.0, 0.0), -Vector3::UP, 0.0).is_none());

        let hit = world
            .raycast(Vector3::new(0.0, 5.0, 0.0), Vector3::new(0.0, -3.0, 0.0), 10.0)
            .unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-5);
        assert!((hit.point.y - 1.0).abs() < 1e-5);
    }
}
