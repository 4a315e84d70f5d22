//! Session state definitions
//!
//! Contains the character, enemies, effects and wave bookkeeping owned by the
//! game loop for the duration of one run.

use std::collections::VecDeque;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::constants::{character, enemy, fireball, kill_bonus, laser, lightning, upgrade};
use crate::game::scenery::{MapKind, Obstacle, Scenery};
use crate::surface::VisualHandle;
use crate::util::vec2::Vec2;

/// Identifier shared by every entity the renderer can see
pub type EntityId = u64;

/// The character always uses this id; everything else is allocated from 1
pub const PLAYER_ID: EntityId = 0;

/// Spell the character casts, chosen once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellKind {
    Fireball,
    Lightning,
    Laser,
}

impl SpellKind {
    pub const ALL: [SpellKind; 3] = [SpellKind::Fireball, SpellKind::Lightning, SpellKind::Laser];

    pub fn name(&self) -> &'static str {
        match self {
            SpellKind::Fireball => "fireball",
            SpellKind::Lightning => "lightning",
            SpellKind::Laser => "laser",
        }
    }

    /// Cooldown before any upgrade or buff is applied
    pub fn base_cooldown_ms(&self) -> u64 {
        match self {
            SpellKind::Fireball => fireball::COOLDOWN_MS,
            SpellKind::Lightning => lightning::COOLDOWN_MS,
            SpellKind::Laser => laser::COOLDOWN_MS,
        }
    }

    fn index(&self) -> usize {
        match self {
            SpellKind::Fireball => 0,
            SpellKind::Lightning => 1,
            SpellKind::Laser => 2,
        }
    }
}

impl FromStr for SpellKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fireball" => Ok(SpellKind::Fireball),
            "lightning" => Ok(SpellKind::Lightning),
            "laser" => Ok(SpellKind::Laser),
            other => Err(format!("unknown spell '{}'", other)),
        }
    }
}

/// Last accepted cast time per spell (game-clock ms)
#[derive(Debug, Clone, Copy, Default)]
pub struct SpellTimers {
    last_cast: [Option<u64>; 3],
}

impl SpellTimers {
    pub fn last_cast(&self, spell: SpellKind) -> Option<u64> {
        self.last_cast[spell.index()]
    }

    pub fn record(&mut self, spell: SpellKind, now: u64) {
        self.last_cast[spell.index()] = Some(now);
    }

    /// Milliseconds left before `spell` may be cast again
    pub fn remaining(&self, spell: SpellKind, cooldown_ms: u64, now: u64) -> u64 {
        match self.last_cast(spell) {
            Some(at) => cooldown_ms.saturating_sub(now.saturating_sub(at)),
            None => 0,
        }
    }
}

/// Directional keys currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionalInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Which directional key an input event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl DirectionalInput {
    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Forward => self.forward = pressed,
            Direction::Backward => self.backward = pressed,
            Direction::Left => self.left = pressed,
            Direction::Right => self.right = pressed,
        }
    }

    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Normalized ground-plane direction; forward is -Z (away from the camera)
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.forward {
            dir.z -= 1.0;
        }
        if self.backward {
            dir.z += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir.normalize()
    }
}

/// Locomotion animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementState {
    #[default]
    Idle,
    Moving,
}

/// The player-controlled character
#[derive(Debug, Clone)]
pub struct Character {
    pub position: Vec2,
    /// Current heading (radians, 0 faces +Z)
    pub facing: f32,
    /// Heading the character is turning toward, driven by the pointer
    pub target_facing: f32,
    pub health: f32,
    pub max_health: f32,
    /// Speed before temporary buffs
    pub base_speed: f32,
    /// Game-clock ms until which incoming damage is ignored
    pub invulnerable_until: Option<u64>,
    pub spell: SpellKind,
    pub timers: SpellTimers,
    pub input: DirectionalInput,
    pub movement: MovementState,
    pub visual: Option<VisualHandle>,
}

impl Character {
    pub fn new(spell: SpellKind) -> Self {
        Self {
            position: Vec2::ZERO,
            facing: 0.0,
            target_facing: 0.0,
            health: character::MAX_HEALTH,
            max_health: character::MAX_HEALTH,
            base_speed: character::BASE_SPEED,
            invulnerable_until: None,
            spell,
            timers: SpellTimers::default(),
            input: DirectionalInput::default(),
            movement: MovementState::Idle,
            visual: None,
        }
    }

    pub fn is_invulnerable(&self, now: u64) -> bool {
        self.invulnerable_until.is_some_and(|until| now < until)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Reset for a new run, keeping the loaded visual
    pub fn reset(&mut self, spell: SpellKind) {
        let visual = self.visual;
        *self = Self::new(spell);
        self.visual = visual;
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::new(SpellKind::Fireball)
    }
}

/// One spawned hostile
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub position: Vec2,
    pub facing: f32,
    pub health: f32,
    pub speed: f32,
    pub score_value: u64,
    /// Accumulated animation time (fixed delta per tick)
    pub anim_time: f32,
    pub visual: Option<VisualHandle>,
}

impl Enemy {
    pub fn new(id: EntityId, position: Vec2, wave: u32) -> Self {
        Self {
            id,
            position,
            facing: 0.0,
            health: enemy::HEALTH,
            speed: enemy::speed_for_wave(wave),
            score_value: enemy::score_for_wave(wave),
            anim_time: 0.0,
            visual: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// What an effect is and the data its kind needs
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    /// Travelling fireball
    Projectile { direction: Vec2, traveled: f32 },
    /// Continuous laser anchored on the caster
    Beam {
        direction: Vec2,
        expires_at: u64,
        last_pulse_at: Option<u64>,
    },
    /// Cosmetic lightning bolt from caster to strike point
    Bolt { end: Vec2 },
    /// Cosmetic hit flash
    Impact,
    /// Cosmetic burst where an enemy died
    Explosion,
    /// Cosmetic flash when a shield charge absorbs a hit
    ShieldFlash,
}

/// Transient damage-carrying or cosmetic entity
#[derive(Debug, Clone)]
pub struct Effect {
    pub id: EntityId,
    pub position: Vec2,
    pub kind: EffectKind,
    /// Damage per hit or pulse; `None` for cosmetic effects
    pub damage: Option<f32>,
    /// Ticks left for cosmetic effects; damage carriers expire by range or time
    pub ticks_left: Option<u32>,
}

impl Effect {
    pub fn projectile(id: EntityId, position: Vec2, direction: Vec2, damage: f32) -> Self {
        Self {
            id,
            position,
            kind: EffectKind::Projectile {
                direction,
                traveled: 0.0,
            },
            damage: Some(damage),
            ticks_left: None,
        }
    }

    pub fn beam(id: EntityId, origin: Vec2, direction: Vec2, expires_at: u64) -> Self {
        Self {
            id,
            position: origin,
            kind: EffectKind::Beam {
                direction,
                expires_at,
                last_pulse_at: None,
            },
            damage: Some(laser::DAMAGE_PER_PULSE),
            ticks_left: None,
        }
    }

    pub fn cosmetic(id: EntityId, position: Vec2, kind: EffectKind, ticks: u32) -> Self {
        Self {
            id,
            position,
            kind,
            damage: None,
            ticks_left: Some(ticks),
        }
    }

    pub fn is_beam(&self) -> bool {
        matches!(self.kind, EffectKind::Beam { .. })
    }
}

/// Upgrades offered at the bonus-choice gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Upgrade {
    Damage,
    Speed,
    Cooldown,
    Shield,
    Multishot,
    ScoreMultiplier,
}

impl Upgrade {
    pub const POOL: [Upgrade; 6] = [
        Upgrade::Damage,
        Upgrade::Speed,
        Upgrade::Cooldown,
        Upgrade::Shield,
        Upgrade::Multishot,
        Upgrade::ScoreMultiplier,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Upgrade::Damage => "Damage +50%",
            Upgrade::Speed => "Speed +25%",
            Upgrade::Cooldown => "Cast rate +40%",
            Upgrade::Shield => "Shield +3",
            Upgrade::Multishot => "Triple shot",
            Upgrade::ScoreMultiplier => "Score x2",
        }
    }
}

/// Temporary kill-bonus buffs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffKind {
    /// Movement speed x1.5
    Haste,
    /// Fireball cooldown drops to the rapid-fire value
    RapidFire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedBuff {
    pub kind: BuffKind,
    pub expires_at: u64,
}

/// Run-scoped modifiers granted by upgrades and kill bonuses
#[derive(Debug, Clone)]
pub struct Modifiers {
    pub damage_multiplier: f32,
    pub score_multiplier: u64,
    pub shield_charges: u32,
    pub speed_multiplier: f32,
    pub cooldown_multiplier: f32,
    pub multishot: bool,
    /// Active temporary buffs; reverted by dropping them once expired
    pub buffs: SmallVec<[TimedBuff; 4]>,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            score_multiplier: 1,
            shield_charges: 0,
            speed_multiplier: 1.0,
            cooldown_multiplier: 1.0,
            multishot: false,
            buffs: SmallVec::new(),
        }
    }
}

impl Modifiers {
    pub fn has_buff(&self, kind: BuffKind, now: u64) -> bool {
        self.buffs.iter().any(|b| b.kind == kind && now < b.expires_at)
    }

    fn active_buffs(&self, kind: BuffKind, now: u64) -> usize {
        self.buffs
            .iter()
            .filter(|b| b.kind == kind && now < b.expires_at)
            .count()
    }

    /// Drop expired buffs; returns how many were removed
    pub fn expire_buffs(&mut self, now: u64) -> usize {
        let before = self.buffs.len();
        self.buffs.retain(|b| now < b.expires_at);
        before - self.buffs.len()
    }
}

/// Progress of the current wave
#[derive(Debug, Clone, PartialEq)]
pub enum WavePhase {
    /// No wave started yet in this run
    NotStarted,
    /// Enemies are spawning or alive
    Active,
    /// All enemies dead; the gate opens at `gate_at`
    Cleared { gate_at: u64 },
    /// Waiting on the player to pick one of the offered upgrades
    AwaitingChoice { options: [Upgrade; 3] },
}

/// Wave bookkeeping, score and modifiers for one run
#[derive(Debug, Clone)]
pub struct WaveState {
    pub wave: u32,
    pub required: u32,
    pub killed: u32,
    pub score: u64,
    pub modifiers: Modifiers,
    pub phase: WavePhase,
    /// Game-clock times of spawns still to happen this wave, ascending
    pub spawn_queue: VecDeque<u64>,
}

impl Default for WaveState {
    fn default() -> Self {
        Self {
            wave: 0,
            required: 0,
            killed: 0,
            score: 0,
            modifiers: Modifiers::default(),
            phase: WavePhase::NotStarted,
            spawn_queue: VecDeque::new(),
        }
    }
}

impl WaveState {
    pub fn gate_open(&self) -> bool {
        matches!(self.phase, WavePhase::AwaitingChoice { .. })
    }

    pub fn add_score(&mut self, base: u64) -> u64 {
        let gained = base * self.modifiers.score_multiplier;
        self.score += gained;
        gained
    }
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct SessionState {
    pub tick: u64,
    pub character: Character,
    pub enemies: Vec<Enemy>,
    pub effects: Vec<Effect>,
    pub scenery: Scenery,
    pub wave: WaveState,
    next_entity_id: EntityId,
}

impl SessionState {
    pub fn new(scenery: Scenery) -> Self {
        let next_entity_id = scenery.next_free_id().max(PLAYER_ID + 1);
        Self {
            tick: 0,
            character: Character::default(),
            enemies: Vec::new(),
            effects: Vec::new(),
            scenery,
            wave: WaveState::default(),
            next_entity_id,
        }
    }

    /// Replace the scenery with a freshly generated layout for `map`
    pub fn rebuild_scenery<R: Rng>(&mut self, map: MapKind, rng: &mut R) {
        self.scenery = Scenery::generate(map, rng, self.next_entity_id);
        self.next_entity_id = self.scenery.next_free_id().max(self.next_entity_id);
    }

    pub fn map(&self) -> MapKind {
        self.scenery.map()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.scenery.obstacles()
    }

    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Clear everything run-scoped; scenery and the character's visual survive
    pub fn reset_run(&mut self, spell: SpellKind) {
        self.tick = 0;
        self.character.reset(spell);
        self.enemies.clear();
        self.effects.clear();
        self.wave = WaveState::default();
    }

    pub fn get_enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn get_enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn add_effect(&mut self, build: impl FnOnce(EntityId) -> Effect) -> EntityId {
        let id = self.next_entity_id();
        self.effects.push(build(id));
        id
    }

    pub fn active_beam(&self) -> Option<&Effect> {
        self.effects.iter().find(|e| e.is_beam())
    }

    /// Movement speed including permanent upgrades and active haste buffs
    pub fn character_speed(&self, now: u64) -> f32 {
        use crate::game::constants::kill_bonus::SPEED_FACTOR;
        let mods = &self.wave.modifiers;
        let haste = SPEED_FACTOR.powi(mods.active_buffs(BuffKind::Haste, now) as i32);
        self.character.base_speed * mods.speed_multiplier * haste
    }

    /// Effective cooldown for `spell` right now
    pub fn cooldown_for(&self, spell: SpellKind, now: u64) -> u64 {
        let mods = &self.wave.modifiers;
        let base = spell.base_cooldown_ms();
        let floor = upgrade::COOLDOWN_FLOOR_MS.min(base);
        let scaled = ((base as f32 * mods.cooldown_multiplier).round() as u64).max(floor);
        if spell == SpellKind::Fireball && mods.has_buff(BuffKind::RapidFire, now) {
            scaled.min(kill_bonus::RAPID_FIRE_COOLDOWN_MS)
        } else {
            scaled
        }
    }

    pub fn fireball_damage(&self) -> f32 {
        fireball::BASE_DAMAGE * self.wave.modifiers.damage_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::scenery::Scenery;

    fn create_test_state() -> SessionState {
        SessionState::new(Scenery::empty(MapKind::Forest))
    }

    #[test]
    fn test_character_new() {
        let c = Character::new(SpellKind::Laser);
        assert_eq!(c.health, character::MAX_HEALTH);
        assert_eq!(c.spell, SpellKind::Laser);
        assert_eq!(c.movement, MovementState::Idle);
        assert!(!c.is_invulnerable(0));
    }

    #[test]
    fn test_invulnerability_expires() {
        let mut c = Character::default();
        c.invulnerable_until = Some(1000);
        assert!(c.is_invulnerable(999));
        assert!(!c.is_invulnerable(1000));
    }

    #[test]
    fn test_directional_input_normalized() {
        let mut input = DirectionalInput::default();
        input.set(Direction::Forward, true);
        input.set(Direction::Right, true);
        let d = input.direction();
        assert!((d.length() - 1.0).abs() < 1e-5);
        assert!(d.x > 0.0 && d.z < 0.0);

        input.set(Direction::Backward, true);
        // forward and backward cancel
        assert!(input.direction().approx_eq(Vec2::RIGHT, 1e-5));
    }

    #[test]
    fn test_spell_timers_remaining() {
        let mut timers = SpellTimers::default();
        assert_eq!(timers.remaining(SpellKind::Fireball, 500, 10), 0);
        timers.record(SpellKind::Fireball, 100);
        assert_eq!(timers.remaining(SpellKind::Fireball, 500, 300), 300);
        assert_eq!(timers.remaining(SpellKind::Fireball, 500, 700), 0);
        assert_eq!(timers.remaining(SpellKind::Laser, 100, 300), 0);
    }

    #[test]
    fn test_enemy_scaled_by_wave() {
        let e = Enemy::new(1, Vec2::ZERO, 3);
        assert!(e.is_alive());
        assert_eq!(e.score_value, 30);
        assert!((e.speed - enemy::speed_for_wave(3)).abs() < 1e-6);
    }

    #[test]
    fn test_entity_ids_skip_player() {
        let mut state = create_test_state();
        assert_ne!(state.next_entity_id(), PLAYER_ID);
        let a = state.next_entity_id();
        assert_eq!(state.next_entity_id(), a + 1);
    }

    #[test]
    fn test_character_speed_with_haste_reverts() {
        let mut state = create_test_state();
        let base = state.character_speed(0);
        state.wave.modifiers.buffs.push(TimedBuff {
            kind: BuffKind::Haste,
            expires_at: 5000,
        });
        assert!((state.character_speed(100) - base * 1.5).abs() < 1e-6);
        assert!((state.character_speed(5000) - base).abs() < 1e-6);
    }

    #[test]
    fn test_cooldown_upgrades_floor() {
        let mut state = create_test_state();
        assert_eq!(state.cooldown_for(SpellKind::Fireball, 0), 500);
        state.wave.modifiers.cooldown_multiplier = 0.6;
        assert_eq!(state.cooldown_for(SpellKind::Fireball, 0), 300);
        state.wave.modifiers.cooldown_multiplier = 0.01;
        assert_eq!(state.cooldown_for(SpellKind::Fireball, 0), 100);
        assert_eq!(state.cooldown_for(SpellKind::Laser, 0), 100);
    }

    #[test]
    fn test_rapid_fire_only_affects_fireball() {
        let mut state = create_test_state();
        state.wave.modifiers.buffs.push(TimedBuff {
            kind: BuffKind::RapidFire,
            expires_at: 5000,
        });
        assert_eq!(state.cooldown_for(SpellKind::Fireball, 10), 100);
        assert_eq!(state.cooldown_for(SpellKind::Lightning, 10), 1500);
        assert_eq!(state.cooldown_for(SpellKind::Fireball, 5000), 500);
    }

    #[test]
    fn test_score_multiplier_applied() {
        let mut wave = WaveState::default();
        wave.modifiers.score_multiplier = 2;
        assert_eq!(wave.add_score(10), 20);
        assert_eq!(wave.score, 20);
    }

    #[test]
    fn test_rebuild_scenery_allocates_fresh_ids() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(9);
        let mut state = create_test_state();
        state.rebuild_scenery(MapKind::Forest, &mut rng);
        let first: Vec<_> = state.obstacles().iter().map(|o| o.id).collect();
        state.rebuild_scenery(MapKind::Desert, &mut rng);
        assert_eq!(state.map(), MapKind::Desert);
        assert!(state.obstacles().iter().all(|o| !first.contains(&o.id)));
        let id = state.next_entity_id();
        assert!(state.obstacles().iter().all(|o| o.id < id));
    }

    #[test]
    fn test_reset_run_keeps_visual() {
        let mut state = create_test_state();
        state.character.visual = Some(VisualHandle(7));
        state.character.health = 10.0;
        state.enemies.push(Enemy::new(5, Vec2::ZERO, 1));
        state.wave.score = 99;
        state.reset_run(SpellKind::Lightning);
        assert_eq!(state.character.visual, Some(VisualHandle(7)));
        assert_eq!(state.character.health, character::MAX_HEALTH);
        assert!(state.enemies.is_empty());
        assert_eq!(state.wave.score, 0);
        assert_eq!(state.character.spell, SpellKind::Lightning);
    }

    #[test]
    fn test_spell_from_str() {
        assert_eq!("Laser".parse::<SpellKind>(), Ok(SpellKind::Laser));
        assert!("frost".parse::<SpellKind>().is_err());
    }
}
