//! Enemy steering toward the character, crowd separation and contact damage

use crate::game::collision::is_colliding;
use crate::game::constants::enemy::{
    CONTACT_DAMAGE, CONTACT_THRESHOLD, HIT_PUSHBACK, SEPARATION_STEP, SEPARATION_THRESHOLD,
    SHIELD_PUSHBACK,
};
use crate::game::events::GameEvent;
use crate::game::state::{Enemy, SessionState};
use crate::game::systems::combat::{damage_player, HitOutcome};
use crate::util::vec2::Vec2;

/// Move every enemy one step toward the character and turn it to face its heading
pub fn steer_enemies(state: &mut SessionState) {
    let target = state.character.position;
    for enemy in &mut state.enemies {
        let dir = enemy.position.direction_to(target);
        if dir == Vec2::ZERO {
            continue;
        }
        enemy.position += dir * enemy.speed;
        enemy.facing = dir.heading();
    }
    separate(&mut state.enemies);
}

/// Push overlapping pairs apart by a fixed step each. Single pass.
pub fn separate(enemies: &mut [Enemy]) {
    let n = enemies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let delta = enemies[i].position - enemies[j].position;
            if delta.length_sq() >= SEPARATION_THRESHOLD * SEPARATION_THRESHOLD {
                continue;
            }
            let away = delta.normalize();
            // stacked exactly: split along X
            let away = if away == Vec2::ZERO { Vec2::RIGHT } else { away };
            enemies[i].position += away * SEPARATION_STEP;
            enemies[j].position -= away * SEPARATION_STEP;
        }
    }
}

/// Damage the character for every touching enemy and knock that enemy back.
/// Returns true if the character died.
pub fn resolve_contacts(state: &mut SessionState, now: u64, events: &mut Vec<GameEvent>) -> bool {
    for i in 0..state.enemies.len() {
        let enemy_pos = state.enemies[i].position;
        if !is_colliding(&enemy_pos, &state.character.position, CONTACT_THRESHOLD) {
            continue;
        }

        let outcome = damage_player(state, CONTACT_DAMAGE, now, events);
        let push = match outcome {
            HitOutcome::Absorbed => SHIELD_PUSHBACK,
            _ => HIT_PUSHBACK,
        };
        let away = state.character.position.direction_to(enemy_pos);
        let away = if away == Vec2::ZERO { Vec2::RIGHT } else { away };
        state.enemies[i].position += away * push;

        if outcome == HitOutcome::Killed {
            return true;
        }
    }
    false
}
