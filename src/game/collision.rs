//! Planar distance collision tests and obstacle push-out

use crate::game::constants::map;
use crate::game::scenery::Obstacle;
use crate::game::state::{Character, Effect, Enemy};
use crate::util::vec2::Vec2;

/// Anything that may occupy a point on the ground plane
pub trait Grounded {
    fn ground_position(&self) -> Option<Vec2>;
}

impl Grounded for Vec2 {
    fn ground_position(&self) -> Option<Vec2> {
        Some(*self)
    }
}

impl<T: Grounded> Grounded for Option<T> {
    fn ground_position(&self) -> Option<Vec2> {
        self.as_ref().and_then(Grounded::ground_position)
    }
}

impl Grounded for Character {
    fn ground_position(&self) -> Option<Vec2> {
        Some(self.position)
    }
}

impl Grounded for Enemy {
    fn ground_position(&self) -> Option<Vec2> {
        Some(self.position)
    }
}

impl Grounded for Effect {
    fn ground_position(&self) -> Option<Vec2> {
        Some(self.position)
    }
}

impl Grounded for Obstacle {
    fn ground_position(&self) -> Option<Vec2> {
        Some(self.position)
    }
}

/// True iff both entities have a position and are strictly closer than `threshold`.
/// Height is ignored.
pub fn is_colliding<A, B>(a: &A, b: &B, threshold: f32) -> bool
where
    A: Grounded + ?Sized,
    B: Grounded + ?Sized,
{
    match (a.ground_position(), b.ground_position()) {
        (Some(pa), Some(pb)) => (pa - pb).length_sq() < threshold * threshold,
        _ => false,
    }
}

/// Push `position` out of the first overlapping obstacle by a fixed step.
///
/// Only the first obstacle found is resolved. Returns its index.
pub fn resolve_obstacle_pushback(position: &mut Vec2, obstacles: &[Obstacle]) -> Option<usize> {
    let index = obstacles
        .iter()
        .position(|o| is_colliding(&*position, o, o.radius))?;
    let away = obstacles[index].position.direction_to(*position);
    // Standing exactly on the centre gives no direction; pick one
    let away = if away == Vec2::ZERO { Vec2::RIGHT } else { away };
    *position += away * map::PUSHBACK;
    Some(index)
}
