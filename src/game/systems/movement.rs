//! Character movement: directional input, pointer-driven facing, locomotion state

use crate::game::constants::character::{TURN_RATE, TURN_SNAP};
use crate::game::state::{Character, Direction, MovementState};
use crate::surface::AnimationCue;
use crate::util::vec2::{wrap_angle, Vec2};

/// Apply a key press/release. Returns the cue to play if locomotion state changed.
pub fn apply_directional_key(
    character: &mut Character,
    direction: Direction,
    pressed: bool,
) -> Option<AnimationCue> {
    character.input.set(direction, pressed);
    let next = if character.input.any() {
        MovementState::Moving
    } else {
        MovementState::Idle
    };
    if next == character.movement {
        return None;
    }
    character.movement = next;
    Some(match next {
        MovementState::Moving => AnimationCue::Move,
        MovementState::Idle => AnimationCue::Idle,
    })
}

/// Point the character's target heading at a ground point
pub fn aim_at(character: &mut Character, ground_point: Vec2) {
    let offset = ground_point - character.position;
    if offset.length_sq() > 0.0 {
        character.target_facing = offset.heading();
    }
}

/// Close a fraction of the shortest-path angular error, snapping when close
pub fn interpolate_facing(current: f32, target: f32) -> f32 {
    let diff = wrap_angle(target - current);
    if diff.abs() > TURN_SNAP {
        wrap_angle(current + diff * TURN_RATE)
    } else {
        target
    }
}

/// One tick of movement at `speed` units per tick
pub fn step(character: &mut Character, speed: f32) {
    let dir = character.input.direction();
    if dir != Vec2::ZERO {
        character.position += dir * speed;
    }
    character.facing = interpolate_facing(character.facing, character.target_facing);
}
