//! Spell casting, effect simulation, kill resolution and player damage
//!
//! Damage only ever lowers health. Removal happens in [`reap_dead`], which
//! is the single place a kill is credited, so a target struck twice in one
//! tick still counts once.

use rand::Rng;
use smallvec::SmallVec;
use tracing::debug;

use crate::game::collision::is_colliding;
use crate::game::constants::{character, effects, fireball, kill_bonus, laser, lightning};
use crate::game::events::{GameEvent, KillBonus};
use crate::game::state::{
    BuffKind, Effect, EffectKind, EntityId, SessionState, SpellKind, TimedBuff,
};
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    Cast(SpellKind),
    /// A second laser cast turned the active beam off
    BeamStopped,
    Rejected { remaining_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// A shield charge took the hit
    Absorbed,
    /// Invulnerability window still open
    Ignored,
    Damaged,
    Killed,
}

/// Cast the equipped spell if its cooldown has elapsed.
///
/// `aim` is the ground point under the pointer, if the pointer hits the ground.
pub fn try_cast(
    state: &mut SessionState,
    now: u64,
    aim: Option<Vec2>,
    events: &mut Vec<GameEvent>,
) -> CastOutcome {
    let spell = state.character.spell;
    let cooldown = state.cooldown_for(spell, now);
    let remaining_ms = state.character.timers.remaining(spell, cooldown, now);
    if remaining_ms > 0 {
        events.push(GameEvent::CastRejected { spell, remaining_ms });
        return CastOutcome::Rejected { remaining_ms };
    }
    state.character.timers.record(spell, now);

    match spell {
        SpellKind::Fireball => cast_fireball(state),
        SpellKind::Lightning => cast_lightning(state, aim),
        SpellKind::Laser => {
            if toggle_beam(state, now, aim) {
                events.push(GameEvent::BeamStopped);
                return CastOutcome::BeamStopped;
            }
        }
    }
    events.push(GameEvent::SpellCast(spell));
    CastOutcome::Cast(spell)
}

fn cast_fireball(state: &mut SessionState) {
    let forward = Vec2::from_heading(state.character.facing);
    let origin = state.character.position + forward * fireball::SPAWN_OFFSET;
    let damage = state.fireball_damage();
    let offsets: &[f32] = if state.wave.modifiers.multishot {
        &[0.0, fireball::MULTISHOT_OFFSET, -fireball::MULTISHOT_OFFSET]
    } else {
        &[0.0]
    };
    for &offset in offsets {
        let direction = forward.rotate_heading(offset);
        state.add_effect(|id| Effect::projectile(id, origin, direction, damage));
    }
}

/// Instant strike at the aim point, clamped to range
fn cast_lightning(state: &mut SessionState, aim: Option<Vec2>) {
    let origin = state.character.position;
    let target = aim.unwrap_or_else(|| {
        origin + Vec2::from_heading(state.character.facing) * lightning::MAX_RANGE
    });
    let strike = origin + (target - origin).clamp_length(lightning::MAX_RANGE);

    let mut struck: SmallVec<[Vec2; 8]> = SmallVec::new();
    for enemy in state.enemies.iter_mut().filter(|e| e.is_alive()) {
        if is_colliding(&enemy.position, &strike, lightning::RADIUS) {
            enemy.health -= lightning::DAMAGE;
            struck.push(enemy.position);
        }
    }
    debug!("Lightning at ({:.1}, {:.1}) hit {}", strike.x, strike.z, struck.len());

    state.add_effect(|id| {
        Effect::cosmetic(id, origin, EffectKind::Bolt { end: strike }, lightning::FLASH_TICKS)
    });
    for position in struck {
        state.add_effect(|id| {
            Effect::cosmetic(id, position, EffectKind::Impact, effects::IMPACT_TICKS)
        });
    }
}

/// Start a beam, or stop the active one. Returns true if a beam was stopped.
fn toggle_beam(state: &mut SessionState, now: u64, aim: Option<Vec2>) -> bool {
    let before = state.effects.len();
    state.effects.retain(|e| !e.is_beam());
    if state.effects.len() != before {
        return true;
    }

    let origin = state.character.position;
    let direction = beam_direction(origin, state.character.facing, aim);
    let expires_at = now + laser::MAX_DURATION_MS;
    state.add_effect(|id| Effect::beam(id, origin, direction, expires_at));
    false
}

fn beam_direction(origin: Vec2, facing: f32, aim: Option<Vec2>) -> Vec2 {
    aim.map(|p| origin.direction_to(p))
        .filter(|d| *d != Vec2::ZERO)
        .unwrap_or_else(|| Vec2::from_heading(facing))
}

/// True if `point` lies within the beam's length and half-width
fn beam_covers(origin: Vec2, direction: Vec2, point: Vec2) -> bool {
    let rel = point - origin;
    let along = rel.dot(direction);
    if along <= 0.0 || along >= laser::LENGTH {
        return false;
    }
    (rel - direction * along).length() < laser::WIDTH_THRESHOLD
}

/// Advance every effect one tick: projectiles travel and hit, the beam tracks
/// the caster and pulses, cosmetics count down.
pub fn update_effects(state: &mut SessionState, now: u64, aim: Option<Vec2>) {
    let caster = state.character.position;
    let facing = state.character.facing;
    let enemies = &mut state.enemies;
    let mut impacts: SmallVec<[Vec2; 8]> = SmallVec::new();

    state.effects.retain_mut(|effect| match &mut effect.kind {
        EffectKind::Projectile { direction, traveled } => {
            effect.position += *direction * fireball::SPEED;
            *traveled += fireball::SPEED;
            let damage = effect.damage.unwrap_or(fireball::BASE_DAMAGE);
            let position = effect.position;
            if let Some(enemy) = enemies
                .iter_mut()
                .find(|e| e.is_alive() && is_colliding(&position, &e.position, fireball::HIT_THRESHOLD))
            {
                enemy.health -= damage;
                impacts.push(enemy.position);
                return false;
            }
            *traveled <= fireball::MAX_RANGE
        }
        EffectKind::Beam {
            direction,
            expires_at,
            last_pulse_at,
        } => {
            if now >= *expires_at {
                return false;
            }
            effect.position = caster;
            *direction = beam_direction(caster, facing, aim);

            let due = last_pulse_at.map_or(true, |at| now.saturating_sub(at) >= laser::DAMAGE_INTERVAL_MS);
            if due {
                *last_pulse_at = Some(now);
                let damage = effect.damage.unwrap_or(laser::DAMAGE_PER_PULSE);
                for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
                    if beam_covers(caster, *direction, enemy.position) {
                        enemy.health -= damage;
                        impacts.push(enemy.position);
                    }
                }
            }
            true
        }
        _ => match effect.ticks_left.as_mut() {
            Some(ticks) => {
                *ticks = ticks.saturating_sub(1);
                *ticks > 0
            }
            None => false,
        },
    });

    for position in impacts {
        state.add_effect(|id| Effect::cosmetic(id, position, EffectKind::Impact, effects::IMPACT_TICKS));
    }
}

/// Remove every enemy at or below zero health, crediting each exactly once.
/// Returns the number of kills.
pub fn reap_dead<R: Rng>(
    state: &mut SessionState,
    rng: &mut R,
    now: u64,
    events: &mut Vec<GameEvent>,
) -> u32 {
    let mut dead: SmallVec<[(EntityId, Vec2, u64); 8]> = SmallVec::new();
    state.enemies.retain(|e| {
        if e.is_alive() {
            true
        } else {
            dead.push((e.id, e.position, e.score_value));
            false
        }
    });

    for &(id, position, value) in &dead {
        let score = state.wave.add_score(value);
        state.wave.killed += 1;
        debug_assert!(state.wave.killed <= state.wave.required);
        events.push(GameEvent::EnemyKilled { id, score });
        state.add_effect(|eid| {
            Effect::cosmetic(eid, position, EffectKind::Explosion, effects::EXPLOSION_TICKS)
        });
        if let Some(bonus) = roll_kill_bonus(state, rng, now) {
            events.push(GameEvent::KillBonus(bonus));
        }
    }
    dead.len() as u32
}

fn roll_kill_bonus<R: Rng>(state: &mut SessionState, rng: &mut R, now: u64) -> Option<KillBonus> {
    if !rng.gen_bool(kill_bonus::CHANCE) {
        return None;
    }
    let expires_at = now + kill_bonus::DURATION_MS;
    let bonus = match rng.gen_range(0..3) {
        0 => {
            let base = kill_bonus::SCORE_PER_WAVE * state.wave.wave as u64;
            KillBonus::Score(state.wave.add_score(base))
        }
        1 => {
            state.wave.modifiers.buffs.push(TimedBuff {
                kind: BuffKind::Haste,
                expires_at,
            });
            KillBonus::Haste
        }
        _ => {
            state.wave.modifiers.buffs.push(TimedBuff {
                kind: BuffKind::RapidFire,
                expires_at,
            });
            KillBonus::RapidFire
        }
    };
    Some(bonus)
}

/// Apply incoming damage to the character.
///
/// A shield charge absorbs the hit whatever the invulnerability window says;
/// otherwise damage lands only outside the window and re-opens it.
pub fn damage_player(
    state: &mut SessionState,
    amount: f32,
    now: u64,
    events: &mut Vec<GameEvent>,
) -> HitOutcome {
    let mods = &mut state.wave.modifiers;
    if mods.shield_charges > 0 {
        mods.shield_charges -= 1;
        let remaining = mods.shield_charges;
        let position = state.character.position;
        state.add_effect(|id| {
            Effect::cosmetic(id, position, EffectKind::ShieldFlash, effects::SHIELD_FLASH_TICKS)
        });
        events.push(GameEvent::ShieldAbsorbed { remaining });
        return HitOutcome::Absorbed;
    }

    let c = &mut state.character;
    if c.is_invulnerable(now) {
        return HitOutcome::Ignored;
    }
    c.health = (c.health - amount).max(0.0);
    c.invulnerable_until = Some(now + character::INVULNERABILITY_MS);
    events.push(GameEvent::PlayerHit {
        damage: amount,
        health: c.health,
    });
    if c.is_dead() {
        HitOutcome::Killed
    } else {
        HitOutcome::Damaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::scenery::{MapKind, Scenery};
    use crate::game::state::Enemy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_state(spell: SpellKind) -> SessionState {
        let mut state = SessionState::new(Scenery::empty(MapKind::Forest));
        state.character.spell = spell;
        state.wave.wave = 1;
        state.wave.required = 5;
        state
    }

    fn add_enemy(state: &mut SessionState, x: f32, z: f32) -> EntityId {
        let id = state.next_entity_id();
        state.enemies.push(Enemy::new(id, Vec2::new(x, z), 1));
        id
    }

    fn projectiles(state: &SessionState) -> usize {
        state
            .effects
            .iter()
            .filter(|e| matches!(e.kind, EffectKind::Projectile { .. }))
            .count()
    }

    #[test]
    fn test_cast_gate() {
        let mut state = create_test_state(SpellKind::Fireball);
        let mut events = Vec::new();
        assert_eq!(
            try_cast(&mut state, 1000, None, &mut events),
            CastOutcome::Cast(SpellKind::Fireball)
        );
        assert_eq!(
            try_cast(&mut state, 1200, None, &mut events),
            CastOutcome::Rejected { remaining_ms: 300 }
        );
        assert_eq!(projectiles(&state), 1);
        assert!(events.contains(&GameEvent::CastRejected {
            spell: SpellKind::Fireball,
            remaining_ms: 300
        }));
        assert_eq!(
            try_cast(&mut state, 1500, None, &mut events),
            CastOutcome::Cast(SpellKind::Fireball)
        );
    }

    #[test]
    fn test_multishot_fires_three() {
        let mut state = create_test_state(SpellKind::Fireball);
        state.wave.modifiers.multishot = true;
        state.character.facing = 1.0;
        try_cast(&mut state, 0, None, &mut Vec::new());
        assert_eq!(projectiles(&state), 3);

        let mut headings: Vec<f32> = state
            .effects
            .iter()
            .filter_map(|e| match e.kind {
                EffectKind::Projectile { direction, .. } => Some(direction.heading()),
                _ => None,
            })
            .collect();
        headings.sort_by(f32::total_cmp);
        let spread = fireball::MULTISHOT_OFFSET;
        assert!((headings[0] - (1.0 - spread)).abs() < 1e-5);
        assert!((headings[1] - 1.0).abs() < 1e-5);
        assert!((headings[2] - (1.0 + spread)).abs() < 1e-5);
    }

    #[test]
    fn test_fireball_hits_and_kill_credited_once() {
        let mut state = create_test_state(SpellKind::Fireball);
        state.wave.modifiers.damage_multiplier = 2.0;
        // directly ahead (+Z)
        let id = add_enemy(&mut state, 0.0, 2.0);
        let mut events = Vec::new();
        let mut rng = StdRng::seed_from_u64(1);
        try_cast(&mut state, 0, None, &mut events);
        for _ in 0..20 {
            update_effects(&mut state, 0, None);
        }
        assert_eq!(projectiles(&state), 0);
        assert_eq!(state.get_enemy(id).unwrap().health, 0.0);

        assert_eq!(reap_dead(&mut state, &mut rng, 0, &mut events), 1);
        assert_eq!(reap_dead(&mut state, &mut rng, 0, &mut events), 0);
        assert_eq!(state.wave.killed, 1);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_fireball_expires_after_range() {
        let mut state = create_test_state(SpellKind::Fireball);
        try_cast(&mut state, 0, None, &mut Vec::new());
        let ticks = (fireball::MAX_RANGE / fireball::SPEED) as usize;
        for _ in 0..ticks - 1 {
            update_effects(&mut state, 0, None);
        }
        assert_eq!(projectiles(&state), 1);
        for _ in 0..3 {
            update_effects(&mut state, 0, None);
        }
        assert_eq!(projectiles(&state), 0);
    }

    #[test]
    fn test_lightning_clamped_and_radius() {
        let mut state = create_test_state(SpellKind::Lightning);
        let near = add_enemy(&mut state, 12.0, 0.0);
        let side = add_enemy(&mut state, 12.0, 2.0);
        let far = add_enemy(&mut state, 16.0, 0.0);
        try_cast(&mut state, 0, Some(Vec2::new(30.0, 0.0)), &mut Vec::new());
        assert_eq!(state.get_enemy(near).unwrap().health, 25.0);
        assert_eq!(state.get_enemy(side).unwrap().health, 25.0);
        assert_eq!(state.get_enemy(far).unwrap().health, 100.0);
        assert!(state
            .effects
            .iter()
            .any(|e| matches!(e.kind, EffectKind::Bolt { end } if end.approx_eq(Vec2::new(12.0, 0.0), 1e-4))));
    }

    #[test]
    fn test_lightning_skips_dead_targets() {
        let mut state = create_test_state(SpellKind::Lightning);
        let id = add_enemy(&mut state, 1.0, 0.0);
        state.get_enemy_mut(id).unwrap().health = 0.0;
        try_cast(&mut state, 0, Some(Vec2::new(1.0, 0.0)), &mut Vec::new());
        assert_eq!(state.get_enemy(id).unwrap().health, 0.0);
    }

    #[test]
    fn test_laser_toggle_and_pulses() {
        let mut state = create_test_state(SpellKind::Laser);
        let inside = add_enemy(&mut state, 5.0, 0.5);
        let behind = add_enemy(&mut state, -5.0, 0.0);
        let wide = add_enemy(&mut state, 5.0, 1.0);
        let aim = Some(Vec2::new(10.0, 0.0));
        let mut events = Vec::new();

        assert_eq!(try_cast(&mut state, 0, aim, &mut events), CastOutcome::Cast(SpellKind::Laser));
        update_effects(&mut state, 0, aim);
        update_effects(&mut state, 50, aim);
        assert_eq!(state.get_enemy(inside).unwrap().health, 95.0);
        update_effects(&mut state, 100, aim);
        assert_eq!(state.get_enemy(inside).unwrap().health, 90.0);
        assert_eq!(state.get_enemy(behind).unwrap().health, 100.0);
        assert_eq!(state.get_enemy(wide).unwrap().health, 100.0);

        assert_eq!(try_cast(&mut state, 150, aim, &mut events), CastOutcome::BeamStopped);
        assert!(state.active_beam().is_none());
    }

    #[test]
    fn test_laser_expires() {
        let mut state = create_test_state(SpellKind::Laser);
        try_cast(&mut state, 0, None, &mut Vec::new());
        update_effects(&mut state, laser::MAX_DURATION_MS - 1, None);
        assert!(state.active_beam().is_some());
        update_effects(&mut state, laser::MAX_DURATION_MS, None);
        assert!(state.active_beam().is_none());
    }

    #[test]
    fn test_beam_follows_caster() {
        let mut state = create_test_state(SpellKind::Laser);
        try_cast(&mut state, 0, None, &mut Vec::new());
        state.character.position = Vec2::new(3.0, 3.0);
        update_effects(&mut state, 10, None);
        assert_eq!(state.active_beam().unwrap().position, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_two_hits_same_tick_single_kill() {
        let mut state = create_test_state(SpellKind::Fireball);
        state.wave.modifiers.multishot = true;
        state.wave.modifiers.damage_multiplier = 3.0;
        let id = add_enemy(&mut state, 0.0, 1.0);
        let mut events = Vec::new();
        try_cast(&mut state, 0, None, &mut events);
        update_effects(&mut state, 0, None);
        assert!(state.get_enemy(id).unwrap().health <= 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(reap_dead(&mut state, &mut rng, 0, &mut events), 1);
        let kills = events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_kill_score_uses_multiplier() {
        let mut state = create_test_state(SpellKind::Fireball);
        state.wave.modifiers.score_multiplier = 2;
        let id = add_enemy(&mut state, 0.0, 0.0);
        state.get_enemy_mut(id).unwrap().health = -5.0;
        let mut events = Vec::new();
        let mut rng = StdRng::seed_from_u64(11);
        reap_dead(&mut state, &mut rng, 0, &mut events);
        assert!(events.contains(&GameEvent::EnemyKilled { id, score: 20 }));
    }

    #[test]
    fn test_kill_bonus_rate_roughly_one_in_five() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut state = create_test_state(SpellKind::Fireball);
        let rolls = 2000;
        let hits = (0..rolls)
            .filter(|_| roll_kill_bonus(&mut state, &mut rng, 0).is_some())
            .count();
        assert!(hits > 300 && hits < 500, "hits = {}", hits);
    }

    #[test]
    fn test_shield_absorbs_three_hits() {
        let mut state = create_test_state(SpellKind::Fireball);
        state.wave.modifiers.shield_charges = 3;
        let mut events = Vec::new();
        for _ in 0..3 {
            assert_eq!(damage_player(&mut state, 10.0, 0, &mut events), HitOutcome::Absorbed);
        }
        assert_eq!(state.character.health, character::MAX_HEALTH);
        assert_eq!(damage_player(&mut state, 10.0, 0, &mut events), HitOutcome::Damaged);
        assert_eq!(state.character.health, 90.0);
    }

    #[test]
    fn test_invulnerability_window() {
        let mut state = create_test_state(SpellKind::Fireball);
        let mut events = Vec::new();
        assert_eq!(damage_player(&mut state, 10.0, 100, &mut events), HitOutcome::Damaged);
        assert_eq!(damage_player(&mut state, 10.0, 500, &mut events), HitOutcome::Ignored);
        assert_eq!(state.character.health, 90.0);
        assert_eq!(damage_player(&mut state, 10.0, 1100, &mut events), HitOutcome::Damaged);
        assert_eq!(state.character.health, 80.0);
    }

    #[test]
    fn test_lethal_damage_clamps_to_zero() {
        let mut state = create_test_state(SpellKind::Fireball);
        state.character.health = 5.0;
        let outcome = damage_player(&mut state, 10.0, 0, &mut Vec::new());
        assert_eq!(outcome, HitOutcome::Killed);
        assert_eq!(state.character.health, 0.0);
    }
}
