mod collision_pair;
mod contact;
mod narrow_phase;
mod box_box;
mod continuous;
mod contact_solver;
mod raycast;

pub use self::collision_pair::CollisionPair;
pub use self::contact::{CollisionInfo, Contact, MAX_CONTACTS};
pub use self::narrow_phase::detect_collision;
pub use self::box_box::{box_box, BoxManifold, Obb};
pub use self::continuous::{sphere_aabb_toi, sphere_sphere_toi};
pub use self::contact_solver::{ContactSettings, ContactSolver};
pub use self::raycast::{ray_body, RayIntersection};
