use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use rigid_physics::core::{BodyEventType, CollisionEventType};
use rigid_physics::{
    BodyHandle, BodyShape, Material, PhysicsWorld, RigidBody, ThreadScheduler, Vector3,
};

fn main() {
    // Create a physics world that steps on a background thread
    let mut world = PhysicsWorld::new();
    world.set_scheduler(Arc::new(ThreadScheduler::new()));
    world.set_async_enabled(true);

    // Create a floor
    let mut floor = RigidBody::new_static(
        BodyShape::Box { half_extents: Vector3::new(10.0, 0.5, 10.0) },
        Vector3::new(0.0, -0.5, 0.0),
    );
    floor.set_material(Material::concrete());
    if let Err(err) = world.add_body(floor) {
        eprintln!("failed to add floor: {err}");
        return;
    }

    let boxes = create_box_stack(&mut world, 6);

    // Knock the stack with a heavy ball after a second
    let mut ball = RigidBody::dynamic_sphere(0.4, Vector3::new(-6.0, 2.0, 0.0), 5.0);
    ball.set_material(Material::metal());
    ball.set_affected_by_gravity(false);

    let mut ball_handle = None;
    let mut last_time = Instant::now();
    let start_time = Instant::now();

    while start_time.elapsed().as_secs_f32() < 10.0 {
        let now = Instant::now();
        let dt = now.duration_since(last_time).as_secs_f32();
        last_time = now;

        world.update_fixed(dt);

        if ball_handle.is_none() && world.get_time() > 1.0 && !world.is_step_in_progress() {
            let mut projectile = ball.clone();
            projectile.set_linear_velocity(Vector3::new(12.0, 0.0, 0.0));
            ball_handle = world.add_body(projectile).ok();
        }

        // A step may still be running; skip drawing this frame rather than wait
        if let Some(views) = world.try_snapshot() {
            print!("\x1B[2J\x1B[1;1H");
            println!("Box Stack Simulation");
            println!("-------------------");
            println!("Time: {:.2}s  Substeps: {}", world.get_time(), world.substep_count());
            for view in views.iter().filter(|view| boxes.contains(&view.handle)) {
                println!(
                    "box {:?}: y = {:6.3}{}",
                    view.handle,
                    view.position.y,
                    if view.is_sleeping { "  (asleep)" } else { "" }
                );
            }
        }

        if !world.is_step_in_progress() {
            let events = world.drain_events();
            let begins = events.get_collision_events_of_type(CollisionEventType::Begin).len();
            let sleeps = events.get_body_events_of_type(BodyEventType::Sleep).len();
            if begins > 0 || sleeps > 0 {
                println!("contacts begun: {begins}, bodies slept: {sleeps}");
            }
        }

        sleep(Duration::from_millis(16));
    }

    world.wait_for_step();
    let down = Vector3::new(0.0, -1.0, 0.0);
    if let Some(hit) = world.raycast(Vector3::new(0.0, 20.0, 0.0), down, 50.0) {
        println!("Top of the pile at y = {:.3} ({:?})", hit.point.y, hit.body);
    }
}

fn create_box_stack(world: &mut PhysicsWorld, height: usize) -> Vec<BodyHandle> {
    let materials = [Material::wood(), Material::metal()];

    (0..height)
        .filter_map(|i| {
            let position = Vector3::new(0.0, 0.5 + i as f32 * 1.01, 0.0);
            let mut body = RigidBody::dynamic_box(Vector3::splat(0.5), position, 1.0);
            body.set_material(materials[i % materials.len()]);
            world.add_body(body).ok()
        })
        .collect()
}
