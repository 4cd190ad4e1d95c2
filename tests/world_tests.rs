use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use rigid_physics::core::{BodyEventType, CollisionEventType, Job};
use rigid_physics::error::PhysicsError;
use rigid_physics::{
    BodyShape, Constraint, JobScheduler, PhysicsWorld, RigidBody, SimulationConfig,
    ThreadScheduler, Vector3,
};

/// Runs every job immediately on the submitting thread
#[derive(Default)]
struct InlineScheduler {
    submitted: AtomicUsize,
}

impl JobScheduler for InlineScheduler {
    fn submit(&self, job: Job) -> bool {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        job();
        true
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Accepts nothing
struct RejectingScheduler;

impl JobScheduler for RejectingScheduler {
    fn submit(&self, _job: Job) -> bool {
        false
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Holds submitted jobs until released, so a step stays in flight
#[derive(Default)]
struct DeferredScheduler {
    jobs: std::sync::Mutex<Vec<Job>>,
}

impl DeferredScheduler {
    fn run_all(&self) {
        let jobs: Vec<Job> = std::mem::take(&mut *self.jobs.lock().unwrap());
        for job in jobs {
            job();
        }
    }
}

impl JobScheduler for DeferredScheduler {
    fn submit(&self, job: Job) -> bool {
        self.jobs.lock().unwrap().push(job);
        true
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

fn floor() -> RigidBody {
    RigidBody::new_static(
        BodyShape::Box { half_extents: Vector3::new(10.0, 0.5, 10.0) },
        Vector3::new(0.0, -0.5, 0.0),
    )
}

#[test]
fn test_frame_spike_is_capped_at_three_substeps() {
    let mut world = PhysicsWorld::new();
    world.add_body(RigidBody::dynamic_sphere(0.5, Vector3::new(0.0, 5.0, 0.0), 1.0)).unwrap();
    let dt = world.get_fixed_time_step();

    assert_eq!(world.update_fixed(dt * 10.0), 3);
    assert_eq!(world.substep_count(), 3);

    // The excess was dropped, not queued for later.
    assert_eq!(world.update_fixed(dt * 0.5), 0);
    assert_eq!(world.substep_count(), 3);
}

#[test]
fn test_inline_scheduler_runs_batch_as_one_job() {
    let scheduler = Arc::new(InlineScheduler::default());
    let mut world = PhysicsWorld::new();
    world.set_scheduler(scheduler.clone());
    world.set_async_enabled(true);
    let dt = world.get_fixed_time_step();

    assert_eq!(world.update_fixed(dt * 2.0), 2);
    assert_eq!(scheduler.submitted.load(Ordering::SeqCst), 1);
    assert_eq!(world.substep_count(), 2);
    assert!(!world.is_step_in_progress());
}

#[test]
fn test_rejected_submission_skips_tick() {
    let mut world = PhysicsWorld::new();
    world.set_scheduler(Arc::new(RejectingScheduler));
    world.set_async_enabled(true);
    let dt = world.get_fixed_time_step();

    assert_eq!(world.update_fixed(dt), 0);
    assert_eq!(world.substep_count(), 0);
    assert!(!world.is_step_in_progress());
    assert_eq!(world.get_accumulator(), 0.0);
}

#[test]
fn test_in_flight_step_blocks_mutation_and_new_submissions() {
    let scheduler = Arc::new(DeferredScheduler::default());
    let mut world = PhysicsWorld::new();
    world.set_scheduler(scheduler.clone());
    world.set_async_enabled(true);
    let dt = world.get_fixed_time_step();

    assert_eq!(world.update_fixed(dt), 1);
    assert!(world.is_step_in_progress());
    assert!(world.try_snapshot().is_none());

    assert_eq!(world.update_fixed(dt), 0);
    assert_eq!(
        world.add_body(RigidBody::dynamic_sphere(0.5, Vector3::ZERO, 1.0)),
        Err(PhysicsError::StepInProgress)
    );
    assert_eq!(world.set_gravity(Vector3::ZERO), Err(PhysicsError::StepInProgress));

    scheduler.run_all();
    assert!(!world.is_step_in_progress());
    assert_eq!(world.substep_count(), 1);
    assert!(world.try_snapshot().is_some());

    // Time accumulated while busy is picked up by the next tick.
    assert_eq!(world.update_fixed(dt * 0.01), 1);
    scheduler.run_all();
    assert_eq!(world.substep_count(), 2);
}

#[test]
fn test_dropped_job_clears_step_flag() {
    let scheduler = Arc::new(DeferredScheduler::default());
    let mut world = PhysicsWorld::new();
    world.set_scheduler(scheduler.clone());
    world.set_async_enabled(true);

    assert_eq!(world.update_fixed(world.get_fixed_time_step()), 1);
    assert!(world.is_step_in_progress());

    scheduler.jobs.lock().unwrap().clear();
    assert!(!world.is_step_in_progress());
    assert_eq!(world.substep_count(), 0);
}

#[test]
fn test_wait_for_step_returns_when_job_finishes_elsewhere() {
    let scheduler = Arc::new(DeferredScheduler::default());
    let mut world = PhysicsWorld::new();
    world.set_scheduler(scheduler.clone());
    world.set_async_enabled(true);

    assert_eq!(world.update_fixed(world.get_fixed_time_step() * 2.0), 2);
    assert!(world.is_step_in_progress());

    let runner = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        scheduler.run_all();
    });
    world.wait_for_step();

    assert!(!world.is_step_in_progress());
    assert_eq!(world.substep_count(), 2);
    runner.join().unwrap();
}

#[test]
fn test_thread_scheduler_steps_in_background() {
    let scheduler = Arc::new(ThreadScheduler::new());
    let mut world = PhysicsWorld::new();
    world.set_scheduler(scheduler);
    world.set_async_enabled(true);
    let ball = world
        .add_body(RigidBody::dynamic_sphere(0.5, Vector3::new(0.0, 10.0, 0.0), 1.0))
        .unwrap();
    let dt = world.get_fixed_time_step();

    let mut submitted = 0;
    for _ in 0..20 {
        submitted += world.update_fixed(dt);
        world.wait_for_step();
    }

    assert_eq!(submitted, 20);
    assert_eq!(world.substep_count(), 20);
    assert!(world.get_body(ball).unwrap().get_position().y < 10.0);
}

#[test]
fn test_stale_handles_are_detected() {
    let mut world = PhysicsWorld::new();
    let ball = world.add_body(RigidBody::dynamic_sphere(0.5, Vector3::ZERO, 1.0)).unwrap();
    world.remove_body(ball).unwrap();

    // The freed slot is reused under a new generation.
    let other = world.add_body(RigidBody::dynamic_sphere(0.5, Vector3::ZERO, 1.0)).unwrap();
    assert_ne!(ball, other);

    assert_eq!(world.get_body(ball).unwrap_err(), PhysicsError::BodyNotFound(ball));
    assert!(matches!(world.remove_body(ball), Err(PhysicsError::BodyNotFound(_))));
    assert!(world.raycast_body(ball, Vector3::new(0.0, 5.0, 0.0), -Vector3::UP, 10.0).is_none());
    assert!(world.raycast_body(other, Vector3::new(0.0, 5.0, 0.0), -Vector3::UP, 10.0).is_some());
}

#[test]
fn test_invalid_registrations_are_rejected() {
    let mut world = PhysicsWorld::new();

    let flat = RigidBody::dynamic_box(Vector3::new(1.0, 0.0, 1.0), Vector3::ZERO, 1.0);
    assert!(matches!(world.add_body(flat), Err(PhysicsError::InvalidParameter(_))));

    let lost = RigidBody::dynamic_sphere(0.5, Vector3::new(f32::NAN, 0.0, 0.0), 1.0);
    assert!(matches!(world.add_body(lost), Err(PhysicsError::InvalidParameter(_))));

    let weightless = RigidBody::dynamic_box(Vector3::splat(0.5), Vector3::new(0.0, 1.0, 0.0), 0.0);
    assert!(matches!(world.add_body(weightless), Err(PhysicsError::InvalidParameter(_))));

    let a = world.add_body(RigidBody::dynamic_sphere(0.5, Vector3::ZERO, 1.0)).unwrap();
    let b = world
        .add_body(RigidBody::dynamic_sphere(0.5, Vector3::new(2.0, 0.0, 0.0), 1.0))
        .unwrap();

    let self_joint = Constraint::distance(a, a, Vector3::ZERO, Vector3::ZERO, 1.0);
    assert!(matches!(world.add_constraint(self_joint), Err(PhysicsError::InvalidParameter(_))));

    world.remove_body(b).unwrap();
    let dangling = Constraint::distance(a, b, Vector3::ZERO, Vector3::ZERO, 1.0);
    assert_eq!(world.add_constraint(dangling), Err(PhysicsError::BodyNotFound(b)));

    assert!(world.set_fixed_time_step(0.0).is_err());
    assert_eq!(world.body_count(), 1);
}

#[test]
fn test_events_follow_body_lifecycle() {
    let mut world = PhysicsWorld::new();
    let ground = world.add_body(floor()).unwrap();
    let block = world
        .add_body(RigidBody::dynamic_box(Vector3::splat(0.5), Vector3::new(0.0, 0.6, 0.0), 1.0))
        .unwrap();

    let dt = world.get_fixed_time_step();
    for _ in 0..300 {
        world.update_fixed(dt);
    }

    let events = world.drain_events();
    assert_eq!(events.get_body_events_of_type(BodyEventType::Added).len(), 2);

    let begins = events.get_collision_events_of_type(CollisionEventType::Begin);
    assert!(!begins.is_empty());
    assert_eq!((begins[0].body_a, begins[0].body_b), (ground, block));
    assert!(!begins[0].contacts.is_empty());

    let sleeps = events.get_body_events_for_body(block);
    assert!(sleeps.iter().any(|event| event.event_type == BodyEventType::Sleep));

    // Draining leaves the queue empty.
    assert!(world.drain_events().is_empty());

    world.remove_body(block).unwrap();
    let events = world.drain_events();
    assert_eq!(events.get_body_events_of_type(BodyEventType::Removed).len(), 1);
}

#[test]
fn test_trigger_reports_overlap_without_pushing() {
    let config = SimulationConfig {
        gravity: Vector3::ZERO,
        ..SimulationConfig::default()
    };
    let mut world = PhysicsWorld::with_config(config);
    let zone = world
        .add_body(RigidBody::new_trigger(
            BodyShape::Box { half_extents: Vector3::splat(1.0) },
            Vector3::ZERO,
        ))
        .unwrap();
    let mut ball = RigidBody::dynamic_sphere(0.25, Vector3::new(-2.0, 0.0, 0.0), 1.0);
    ball.set_linear_velocity(Vector3::new(3.0, 0.0, 0.0));
    let ball = world.add_body(ball).unwrap();

    let dt = world.get_fixed_time_step();
    for _ in 0..30 {
        world.update_fixed(dt);
    }

    let events = world.drain_events();
    let triggers = events.get_collision_events_of_type(CollisionEventType::Trigger);
    assert_eq!(triggers.len(), 1);
    assert_eq!((triggers[0].body_a, triggers[0].body_b), (zone, ball));
    assert!(events.get_collision_events_of_type(CollisionEventType::Begin).is_empty());

    let velocity = world.get_body(ball).unwrap().get_linear_velocity();
    assert!(velocity.x > 2.9);
}

#[test]
fn test_raycast_returns_nearest_body() {
    let mut world = PhysicsWorld::new();
    let near = world
        .add_body(RigidBody::new_static(
            BodyShape::Sphere { radius: 0.5 },
            Vector3::new(0.0, 0.0, 3.0),
        ))
        .unwrap();
    world
        .add_body(RigidBody::new_static(
            BodyShape::Box { half_extents: Vector3::splat(1.0) },
            Vector3::new(0.0, 0.0, 8.0),
        ))
        .unwrap();

    let hit = world
        .raycast(Vector3::ZERO, Vector3::new(0.0, 0.0, 2.0), 100.0)
        .unwrap();
    assert_eq!(hit.body, near);
    assert!((hit.distance - 2.5).abs() < 1e-5);
    assert!((hit.normal.z + 1.0).abs() < 1e-5);

    assert!(world.raycast(Vector3::ZERO, Vector3::new(0.0, 0.0, 1.0), 2.0).is_none());
    assert!(world.raycast(Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), 100.0).is_none());
}

#[test]
fn test_snapshot_exposes_render_state() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor()).unwrap();
    let block = world
        .add_body(RigidBody::dynamic_box(Vector3::splat(0.5), Vector3::new(0.0, 0.49, 0.0), 1.0))
        .unwrap();

    world.update_fixed(world.get_fixed_time_step());

    let views = world.snapshot();
    assert_eq!(views.len(), 2);
    let view = views.iter().find(|view| view.handle == block).unwrap();
    assert!(!view.is_static);
    assert_eq!(view.shape, BodyShape::Box { half_extents: Vector3::splat(0.5) });

    let contacts = world.contact_points();
    assert!(!contacts.is_empty());
    assert!(contacts.iter().all(|contact| contact.normal.y > 0.99));
}
