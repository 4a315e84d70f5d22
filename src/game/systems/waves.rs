//! Wave orchestration: staggered spawning, completion, bonus-choice gate

use std::f32::consts::TAU;

use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::game::constants::{upgrade, wave};
use crate::game::events::GameEvent;
use crate::game::state::{Enemy, EntityId, Modifiers, SessionState, Upgrade, WavePhase, WaveState};
use crate::util::vec2::Vec2;

/// Begin the next wave and schedule its spawns from `now`
pub fn start_next_wave(state: &mut SessionState, now: u64, events: &mut Vec<GameEvent>) {
    let w = &mut state.wave;
    w.wave += 1;
    w.required = wave::enemies_required(w.wave);
    w.killed = 0;
    w.phase = WavePhase::Active;
    w.spawn_queue = (0..w.required as u64)
        .map(|i| now + i * wave::SPAWN_STAGGER_MS)
        .collect();
    info!("Wave {} started ({} enemies)", w.wave, w.required);
    events.push(GameEvent::WaveStarted {
        wave: w.wave,
        required: w.required,
    });
}

/// Spawn every enemy whose scheduled time has come. Returns the new ids.
pub fn process_spawns<R: Rng>(
    state: &mut SessionState,
    now: u64,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> SmallVec<[EntityId; 4]> {
    let mut spawned = SmallVec::new();
    while state.wave.spawn_queue.front().is_some_and(|&at| at <= now) {
        state.wave.spawn_queue.pop_front();
        let id = spawn_enemy(state, rng);
        if let Some(enemy) = state.get_enemy(id) {
            events.push(GameEvent::EnemySpawned {
                id,
                position: enemy.position,
            });
        }
        spawned.push(id);
    }
    spawned
}

/// Place one enemy for the current wave on a ring around the character
pub fn spawn_enemy<R: Rng>(state: &mut SessionState, rng: &mut R) -> EntityId {
    let angle = rng.gen_range(0.0..TAU);
    let center = state.character.position;
    let position = center + Vec2::from_heading(angle) * wave::SPAWN_RING_RADIUS;
    let id = state.next_entity_id();
    let mut enemy = Enemy::new(id, position, state.wave.wave.max(1));
    enemy.facing = position.direction_to(center).heading();
    state.enemies.push(enemy);
    debug!("Spawned enemy {} at ({:.1}, {:.1})", id, position.x, position.z);
    id
}

/// Every required enemy has spawned and died
pub fn is_wave_complete(w: &WaveState, alive: usize) -> bool {
    w.phase == WavePhase::Active
        && w.required > 0
        && w.killed >= w.required
        && alive == 0
        && w.spawn_queue.is_empty()
}

/// Credit the clear bonus and arm the gate. Returns the bonus if the wave just ended.
pub fn check_wave_complete(
    state: &mut SessionState,
    now: u64,
    events: &mut Vec<GameEvent>,
) -> Option<u64> {
    if !is_wave_complete(&state.wave, state.enemies.len()) {
        return None;
    }
    let w = &mut state.wave;
    let bonus = w.add_score(wave::CLEAR_BONUS_PER_WAVE * w.wave as u64);
    w.phase = WavePhase::Cleared {
        gate_at: now + wave::GATE_DELAY_MS,
    };
    info!("Wave {} cleared, bonus {}", w.wave, bonus);
    events.push(GameEvent::WaveCleared { wave: w.wave, bonus });
    Some(bonus)
}

/// Open the bonus-choice gate once its delay has passed
pub fn open_gate_if_due<R: Rng>(
    state: &mut SessionState,
    now: u64,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> Option<[Upgrade; 3]> {
    match state.wave.phase {
        WavePhase::Cleared { gate_at } if now >= gate_at => {}
        _ => return None,
    }
    let options = draw_offers(rng);
    state.wave.phase = WavePhase::AwaitingChoice { options };
    events.push(GameEvent::BonusOffered(options));
    Some(options)
}

/// Three distinct upgrades, uniformly drawn
pub fn draw_offers<R: Rng>(rng: &mut R) -> [Upgrade; 3] {
    let mut pool = Upgrade::POOL;
    pool.shuffle(rng);
    [pool[0], pool[1], pool[2]]
}

/// Apply the offered upgrade at `index` and start the next wave.
/// `None` if the gate is not open or the index is out of range.
pub fn choose_bonus(
    state: &mut SessionState,
    index: usize,
    now: u64,
    events: &mut Vec<GameEvent>,
) -> Option<Upgrade> {
    let chosen = match &state.wave.phase {
        WavePhase::AwaitingChoice { options } => *options.get(index)?,
        _ => return None,
    };
    apply_upgrade(&mut state.wave.modifiers, chosen);
    info!("Upgrade chosen: {}", chosen.label());
    events.push(GameEvent::UpgradeApplied(chosen));
    start_next_wave(state, now, events);
    Some(chosen)
}

pub fn apply_upgrade(mods: &mut Modifiers, chosen: Upgrade) {
    match chosen {
        Upgrade::Damage => mods.damage_multiplier *= upgrade::DAMAGE_FACTOR,
        Upgrade::Speed => mods.speed_multiplier *= upgrade::SPEED_FACTOR,
        Upgrade::Cooldown => mods.cooldown_multiplier *= upgrade::COOLDOWN_FACTOR,
        Upgrade::Shield => mods.shield_charges += upgrade::SHIELD_CHARGES,
        Upgrade::Multishot => mods.multishot = true,
        Upgrade::ScoreMultiplier => mods.score_multiplier *= upgrade::SCORE_FACTOR,
    }
}
