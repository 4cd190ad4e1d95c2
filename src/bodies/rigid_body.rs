use crate::bodies::{body_flags::BodyFlags, BodyShape, Material, RigidBodyType};
use crate::math::{Aabb, Quaternion, Vector3, EPSILON};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Linear speed cap applied during integration (units/s)
pub const MAX_LINEAR_SPEED: f32 = 40.0;

/// Angular speed cap applied during integration (rad/s)
pub const MAX_ANGULAR_SPEED: f32 = 10.0;

/// Default per-step linear velocity retention
pub const LINEAR_DAMPING: f32 = 0.999;

/// Default per-step angular velocity retention
pub const ANGULAR_DAMPING: f32 = 0.98;

/// A rigid body: kinematic state plus the derived data the solver reads.
///
/// Every mutator recomputes what it affects before returning, so bounds and
/// inverse mass/inertia are never stale.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Centre of mass in world space
    position: Vector3,

    /// Position at the start of the current substep
    previous_position: Vector3,

    /// Unit orientation
    orientation: Quaternion,

    velocity: Vector3,

    angular_velocity: Vector3,

    /// Linear acceleration accumulated since the last integration
    acceleration: Vector3,

    /// Angular acceleration accumulated since the last integration
    angular_acceleration: Vector3,

    shape: BodyShape,

    body_type: RigidBodyType,

    mass: f32,

    inv_mass: f32,

    /// Diagonal of the inverse inertia tensor in local axes
    inv_inertia: Vector3,

    material: Material,

    /// Per-step velocity retention factors
    linear_damping: f32,
    angular_damping: f32,

    flags: BodyFlags,

    /// Seconds spent below the sleep thresholds
    sleep_timer: f32,

    /// World-space bounds
    bounds: Aabb,
}

impl RigidBody {
    /// Creates a body of the given type
    pub fn new(shape: BodyShape, position: Vector3, body_type: RigidBodyType, mass: f32) -> Self {
        let mut flags = BodyFlags::AFFECTED_BY_GRAVITY;
        if body_type != RigidBodyType::Kinematic {
            flags.insert(BodyFlags::CAN_SLEEP);
        }

        let mut body = Self {
            position,
            previous_position: position,
            orientation: Quaternion::identity(),
            velocity: Vector3::ZERO,
            angular_velocity: Vector3::ZERO,
            acceleration: Vector3::ZERO,
            angular_acceleration: Vector3::ZERO,
            shape,
            body_type,
            mass,
            inv_mass: 0.0,
            inv_inertia: Vector3::ZERO,
            material: Material::default(),
            linear_damping: LINEAR_DAMPING,
            angular_damping: ANGULAR_DAMPING,
            flags,
            sleep_timer: 0.0,
            bounds: Aabb::default(),
        };

        body.update_mass_properties();
        body.update_bounds();
        body
    }

    /// Creates a dynamic body with the given mass
    pub fn new_dynamic(shape: BodyShape, position: Vector3, mass: f32) -> Self {
        Self::new(shape, position, RigidBodyType::Dynamic, mass)
    }

    /// Creates a static body
    pub fn new_static(shape: BodyShape, position: Vector3) -> Self {
        Self::new(shape, position, RigidBodyType::Static, 0.0)
    }

    /// Creates a kinematic body
    pub fn new_kinematic(shape: BodyShape, position: Vector3) -> Self {
        Self::new(shape, position, RigidBodyType::Kinematic, 0.0)
    }

    /// Creates a kinematic trigger volume
    pub fn new_trigger(shape: BodyShape, position: Vector3) -> Self {
        let mut body = Self::new_kinematic(shape, position);
        body.flags.insert(BodyFlags::TRIGGER);
        body
    }

    /// Convenience constructor for a dynamic box
    pub fn dynamic_box(half_extents: Vector3, position: Vector3, mass: f32) -> Self {
        Self::new_dynamic(BodyShape::Box { half_extents }, position, mass)
    }

    /// Convenience constructor for a dynamic sphere
    pub fn dynamic_sphere(radius: f32, position: Vector3, mass: f32) -> Self {
        Self::new_dynamic(BodyShape::Sphere { radius }, position, mass)
    }

    // === Shape, mass and type ===

    pub fn get_shape(&self) -> BodyShape {
        self.shape
    }

    /// Turns the body into a box with the given half extents
    pub fn set_box(&mut self, half_extents: Vector3) {
        self.shape = BodyShape::Box { half_extents };
        self.update_mass_properties();
        self.update_bounds();
    }

    /// Turns the body into a sphere with the given radius
    pub fn set_sphere(&mut self, radius: f32) {
        self.shape = BodyShape::Sphere { radius };
        self.update_mass_properties();
        self.update_bounds();
    }

    /// Half extents for boxes, `None` for spheres
    pub fn half_extents(&self) -> Option<Vector3> {
        match self.shape {
            BodyShape::Box { half_extents } => Some(half_extents),
            BodyShape::Sphere { .. } => None,
        }
    }

    /// Radius for spheres, `None` for boxes
    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            BodyShape::Sphere { radius } => Some(radius),
            BodyShape::Box { .. } => None,
        }
    }

    pub fn is_box(&self) -> bool {
        matches!(self.shape, BodyShape::Box { .. })
    }

    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.update_mass_properties();
    }

    pub fn get_inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Diagonal of the local-space inverse inertia tensor
    pub fn get_inverse_inertia(&self) -> Vector3 {
        self.inv_inertia
    }

    pub fn get_body_type(&self) -> RigidBodyType {
        self.body_type
    }

    pub fn is_static(&self) -> bool {
        self.body_type == RigidBodyType::Static
    }

    pub fn is_kinematic(&self) -> bool {
        self.body_type == RigidBodyType::Kinematic
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == RigidBodyType::Dynamic
    }

    /// Makes the body static (or dynamic again). Static bodies are never triggers.
    pub fn set_static(&mut self, is_static: bool) {
        if is_static {
            self.body_type = RigidBodyType::Static;
            self.flags.remove(BodyFlags::TRIGGER);
            self.flags.insert(BodyFlags::CAN_SLEEP);
            self.velocity = Vector3::ZERO;
            self.angular_velocity = Vector3::ZERO;
            self.clear_accumulators();
            self.wake_up();
        } else if self.is_static() {
            self.body_type = RigidBodyType::Dynamic;
        }
        self.update_mass_properties();
    }

    /// Makes the body kinematic (or dynamic again). Kinematic bodies never sleep.
    pub fn set_kinematic(&mut self, is_kinematic: bool) {
        if is_kinematic {
            self.body_type = RigidBodyType::Kinematic;
            self.flags.remove(BodyFlags::CAN_SLEEP);
            self.clear_accumulators();
            self.wake_up();
        } else if self.is_kinematic() {
            self.body_type = RigidBodyType::Dynamic;
            self.flags.insert(BodyFlags::CAN_SLEEP);
        }
        self.update_mass_properties();
    }

    /// Marks the body as a trigger. Ignored for static bodies.
    pub fn set_trigger(&mut self, is_trigger: bool) {
        if is_trigger && self.is_static() {
            tracing::warn!("static bodies cannot be triggers; flag ignored");
            return;
        }
        self.flags.set(BodyFlags::TRIGGER, is_trigger);
    }

    pub fn is_trigger(&self) -> bool {
        self.flags.contains(BodyFlags::TRIGGER)
    }

    pub fn is_affected_by_gravity(&self) -> bool {
        self.flags.contains(BodyFlags::AFFECTED_BY_GRAVITY)
    }

    pub fn set_affected_by_gravity(&mut self, affected: bool) {
        self.flags.set(BodyFlags::AFFECTED_BY_GRAVITY, affected);
    }

    // === Material ===

    pub fn get_material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn get_friction(&self) -> f32 {
        self.material.friction()
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.material.set_friction(friction);
    }

    pub fn get_restitution(&self) -> f32 {
        self.material.restitution()
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.material.set_restitution(restitution);
    }

    /// Sets the per-step velocity retention factors, clamped to `[0, 1]`
    pub fn set_damping(&mut self, linear: f32, angular: f32) {
        self.linear_damping = linear.clamp(0.0, 1.0);
        self.angular_damping = angular.clamp(0.0, 1.0);
    }

    pub fn get_damping(&self) -> (f32, f32) {
        (self.linear_damping, self.angular_damping)
    }

    // === Pose ===

    pub fn get_position(&self) -> Vector3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.update_bounds();
    }

    /// Moves the body without touching its velocity
    pub fn translate(&mut self, offset: Vector3) {
        self.position += offset;
        self.update_bounds();
    }

    pub fn get_previous_position(&self) -> Vector3 {
        self.previous_position
    }

    /// Records the current position as the start of a new substep
    pub fn begin_substep(&mut self) {
        self.previous_position = self.position;
    }

    pub fn get_orientation(&self) -> Quaternion {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quaternion) {
        self.orientation = orientation.normalize();
        self.update_bounds();
    }

    /// World-space directions of the local x, y and z axes
    pub fn world_axes(&self) -> [Vector3; 3] {
        self.orientation.to_rotation_matrix().columns()
    }

    pub fn get_bounds(&self) -> Aabb {
        self.bounds
    }

    /// Bounds covering both the previous and the current position
    pub fn swept_bounds(&self) -> Aabb {
        self.bounds
            .union(&self.bounds.translated(self.previous_position - self.position))
    }

    // === Velocities ===

    pub fn get_linear_velocity(&self) -> Vector3 {
        self.velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector3) {
        if self.is_static() {
            return;
        }
        self.velocity = velocity;
        self.wake_up();
    }

    pub fn get_angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: Vector3) {
        if self.is_static() {
            return;
        }
        self.angular_velocity = angular_velocity;
        self.wake_up();
    }

    /// Velocity of a point at offset `r` from the centre of mass
    #[inline]
    pub fn point_velocity(&self, r: Vector3) -> Vector3 {
        self.velocity + self.angular_velocity.cross(&r)
    }

    pub fn get_acceleration(&self) -> Vector3 {
        self.acceleration
    }

    // === Forces ===

    /// Accumulates a force through the centre of mass
    pub fn apply_force(&mut self, force: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.acceleration += force * self.inv_mass;
        self.wake_up();
    }

    /// Accumulates a torque
    pub fn apply_torque(&mut self, torque: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.angular_acceleration += self.inverse_inertia_world(torque);
        self.wake_up();
    }

    /// Accumulates gravitational acceleration; does not wake a sleeping body.
    /// A dynamic body without positive mass stays where it is.
    pub fn apply_gravity(&mut self, gravity: Vector3) {
        if self.inv_mass > 0.0 && self.is_affected_by_gravity() && !self.is_sleeping() {
            self.acceleration += gravity;
        }
    }

    /// Instantaneous change of momentum through the centre of mass
    pub fn apply_impulse(&mut self, impulse: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_up();
        self.velocity += impulse * self.inv_mass;
    }

    /// Instantaneous change of momentum at a world-space point
    pub fn apply_impulse_at_point(&mut self, impulse: Vector3, point: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_up();
        let r = point - self.position;
        self.apply_impulse_at(impulse, r);
    }

    /// Solver impulse at lever arm `r`. Sleeping bodies act as immovable.
    #[inline]
    pub(crate) fn apply_impulse_at(&mut self, impulse: Vector3, r: Vector3) {
        if self.is_sleeping() {
            return;
        }
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inverse_inertia_world(r.cross(&impulse));
    }

    /// Inverse mass seen by the solver: zero while asleep
    #[inline]
    pub(crate) fn solver_inverse_mass(&self) -> f32 {
        if self.is_sleeping() {
            0.0
        } else {
            self.inv_mass
        }
    }

    /// Angular term `(I⁻¹(r × n)) × r · n` of the effective mass along `n`
    #[inline]
    pub(crate) fn angular_effective_mass(&self, r: Vector3, n: Vector3) -> f32 {
        if self.is_sleeping() {
            return 0.0;
        }
        let rn = r.cross(&n);
        self.inverse_inertia_world(rn).cross(&r).dot(&n)
    }

    /// Applies the world-space inverse inertia `R · diag(invI) · Rᵀ` to a vector
    #[inline]
    pub fn inverse_inertia_world(&self, v: Vector3) -> Vector3 {
        let local = self.orientation.inverse_rotate(v);
        self.orientation.rotate(local.component_mul(&self.inv_inertia))
    }

    // === Sleeping ===

    pub fn is_sleeping(&self) -> bool {
        self.flags.contains(BodyFlags::SLEEPING)
    }

    pub fn can_sleep(&self) -> bool {
        self.flags.contains(BodyFlags::CAN_SLEEP)
    }

    /// Enables or disables sleeping. Kinematic bodies always refuse.
    pub fn set_can_sleep(&mut self, can_sleep: bool) {
        if can_sleep && !self.is_kinematic() {
            self.flags.insert(BodyFlags::CAN_SLEEP);
        } else {
            self.flags.remove(BodyFlags::CAN_SLEEP);
            self.wake_up();
        }
    }

    /// Puts the body to sleep and zeroes its velocities
    pub fn put_to_sleep(&mut self) {
        if self.is_static() || self.is_sleeping() {
            return;
        }
        self.flags.insert(BodyFlags::SLEEPING);
        self.velocity = Vector3::ZERO;
        self.angular_velocity = Vector3::ZERO;
        self.clear_accumulators();
    }

    /// Wakes the body; returns true if it was asleep
    pub fn wake_up(&mut self) -> bool {
        self.sleep_timer = 0.0;
        if self.is_sleeping() {
            self.flags.remove(BodyFlags::SLEEPING);
            true
        } else {
            false
        }
    }

    pub fn get_sleep_timer(&self) -> f32 {
        self.sleep_timer
    }

    pub(crate) fn set_sleep_timer(&mut self, time: f32) {
        self.sleep_timer = time;
    }

    // === Integration ===

    /// Advances the body by `dt` with semi-implicit Euler.
    ///
    /// Static and sleeping bodies are skipped entirely. Kinematic bodies
    /// move with their current velocities and ignore forces and damping.
    pub fn update(&mut self, dt: f32) {
        if self.is_static() || self.is_sleeping() {
            return;
        }

        if self.is_dynamic() {
            self.velocity += self.acceleration * dt;
            self.angular_velocity += self.angular_acceleration * dt;

            self.velocity *= self.linear_damping;
            self.angular_velocity *= self.angular_damping;

            self.velocity = self.velocity.clamp_length(MAX_LINEAR_SPEED);
            self.angular_velocity = self.angular_velocity.clamp_length(MAX_ANGULAR_SPEED);
        }

        self.position += self.velocity * dt;
        self.orientation = self.orientation.integrate(self.angular_velocity, dt);

        self.update_bounds();
        self.clear_accumulators();
    }

    fn clear_accumulators(&mut self) {
        self.acceleration = Vector3::ZERO;
        self.angular_acceleration = Vector3::ZERO;
    }

    /// Recomputes inverse mass and inertia from type, mass and shape
    fn update_mass_properties(&mut self) {
        if !self.is_dynamic() || !(self.mass > 0.0) {
            self.inv_mass = 0.0;
            self.inv_inertia = Vector3::ZERO;
            return;
        }

        self.inv_mass = 1.0 / self.mass;
        let inertia = self.shape.inertia_diagonal(self.mass);
        let invert = |i: f32| if i > EPSILON { 1.0 / i } else { 0.0 };
        self.inv_inertia = Vector3::new(invert(inertia.x), invert(inertia.y), invert(inertia.z));
    }

    /// Recomputes the world-space AABB from the current pose
    fn update_bounds(&mut self) {
        let half = match self.shape {
            BodyShape::Sphere { radius } => Vector3::splat(radius.max(0.0)),
            BodyShape::Box { half_extents } => {
                let rotation = self.orientation.to_rotation_matrix().abs();
                rotation.multiply_vector(half_extents.max(&Vector3::ZERO))
            }
        };
        self.bounds = Aabb::from_center_half_extents(self.position, half);
    }
}
