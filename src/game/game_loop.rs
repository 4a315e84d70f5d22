//! Session state machine and per-tick orchestration
//!
//! The loop owns the session state and every collaborator. Hosts feed it
//! input events and frames stamped with wall-clock milliseconds; all gameplay
//! timing is read from the [`SimClock`], which stops while paused and while
//! the bonus-choice gate is open.

use hashbrown::HashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::game::clock::SimClock;
use crate::game::collision;
use crate::game::constants::{animation, character, enemy, wave};
use crate::game::events::{GameEvent, KillBonus};
use crate::game::progression::{unlock_rule, ProgressionState};
use crate::game::scenery::{MapKind, Scenery};
use crate::game::state::{EffectKind, EntityId, SessionState, SpellKind, WavePhase, PLAYER_ID};
use crate::game::systems::combat::{self, CastOutcome};
use crate::game::systems::{ai, movement, waves};
use crate::persistence::{self, ProgressStore};
use crate::surface::{
    ActorKind, ActorPose, AnimationCue, AssetProvider, HudSnapshot, InputEvent, MapEntry,
    MenuContext, MenuKind, UiSurface, VisualQueue, WorldRenderer,
};
use crate::util::vec2::Vec2;

/// How long transient messages stay up
const MESSAGE_MS: u64 = 2000;

/// Top-level mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    MainMenu,
    SpellSelect,
    Playing,
    Paused,
    GameOver,
}

#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    /// `None` seeds from entropy
    pub seed: Option<u64>,
    /// Used at startup if unlocked, otherwise forest
    pub start_map: MapKind,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            seed: None,
            start_map: MapKind::Forest,
        }
    }
}

/// Everything outside the simulation the loop talks to
pub struct Surfaces {
    pub renderer: Box<dyn WorldRenderer>,
    pub ui: Box<dyn UiSurface>,
    pub assets: Box<dyn AssetProvider>,
    /// Completion queue paired with `assets`
    pub visuals: VisualQueue,
    pub store: Box<dyn ProgressStore>,
}

pub struct GameLoop {
    mode: Mode,
    state: SessionState,
    progression: ProgressionState,
    clock: SimClock,
    rng: StdRng,
    surfaces: Surfaces,
    /// Ids currently placed in the renderer
    placed: HashSet<EntityId>,
    pointer_ndc: Option<[f32; 2]>,
    events: Vec<GameEvent>,
}

impl GameLoop {
    pub fn new(config: GameLoopConfig, mut surfaces: Surfaces) -> Self {
        let progression = persistence::load_or_default(surfaces.store.as_mut());
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let map = if progression.is_unlocked(config.start_map) {
            config.start_map
        } else {
            warn!("Map {} is locked, starting on forest", config.start_map);
            MapKind::Forest
        };
        let mut state = SessionState::new(Scenery::empty(map));
        state.rebuild_scenery(map, &mut rng);
        surfaces.assets.request_visual(PLAYER_ID, ActorKind::Character);

        let mut game_loop = Self {
            mode: Mode::MainMenu,
            state,
            progression,
            clock: SimClock::new(),
            rng,
            surfaces,
            placed: HashSet::new(),
            pointer_ndc: None,
            events: Vec::new(),
        };
        game_loop.show_menu(MenuKind::MainMenu);
        game_loop.sync_world();
        game_loop
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    /// Game-clock time at `wall_ms`
    pub fn game_time(&self, wall_ms: u64) -> u64 {
        self.clock.now(wall_ms)
    }

    /// Whether the driver should deliver ticks right now
    pub fn wants_ticks(&self) -> bool {
        self.mode == Mode::Playing && !self.state.wave.gate_open()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply one input event. Returns false if it is not valid in the current mode.
    pub fn handle_input(&mut self, event: InputEvent, wall_ms: u64) -> bool {
        let gate_open = self.state.wave.gate_open();
        match (self.mode, event) {
            (mode, InputEvent::PointerMove { ndc }) => {
                self.pointer_ndc = Some(ndc);
                if mode == Mode::Playing {
                    if let Some(point) = self.aim_point() {
                        movement::aim_at(&mut self.state.character, point);
                    }
                }
                true
            }
            (Mode::Playing | Mode::Paused, InputEvent::DirectionalKey { direction, pressed }) => {
                if let Some(cue) =
                    movement::apply_directional_key(&mut self.state.character, direction, pressed)
                {
                    self.play_cue(PLAYER_ID, cue);
                }
                true
            }
            (Mode::MainMenu, InputEvent::NewGame) => {
                self.set_mode(Mode::SpellSelect);
                self.show_menu(MenuKind::SpellSelect);
                true
            }
            (Mode::MainMenu, InputEvent::OpenMapSelect) => {
                self.show_menu(MenuKind::MapSelect);
                true
            }
            (Mode::MainMenu, InputEvent::SelectMap(map)) => self.select_map(map),
            (Mode::SpellSelect, InputEvent::SelectSpell(spell)) => {
                self.start_run(spell, wall_ms);
                true
            }
            (Mode::SpellSelect, InputEvent::QuitToMenu) => {
                self.set_mode(Mode::MainMenu);
                self.show_menu(MenuKind::MainMenu);
                true
            }
            (Mode::Playing, InputEvent::CastRequested) if !gate_open => {
                self.cast(wall_ms);
                true
            }
            (Mode::Playing, InputEvent::PauseToggle) if !gate_open => {
                self.clock.suspend(wall_ms);
                self.set_mode(Mode::Paused);
                self.show_menu(MenuKind::Pause);
                true
            }
            (Mode::Playing, InputEvent::ChooseBonus(index)) if gate_open => {
                self.choose_bonus(index, wall_ms)
            }
            (Mode::Paused, InputEvent::PauseToggle | InputEvent::Resume) => {
                self.clock.resume(wall_ms);
                self.surfaces.ui.hide_menu();
                self.set_mode(Mode::Playing);
                true
            }
            (Mode::Paused, InputEvent::QuitToMenu) => {
                self.record_score();
                self.persist();
                self.return_to_menu(wall_ms);
                true
            }
            (Mode::GameOver, InputEvent::AcknowledgeGameOver) => {
                self.persist();
                self.return_to_menu(wall_ms);
                true
            }
            (mode, event) => {
                debug!("Ignoring {:?} in {:?}", event, mode);
                false
            }
        }
    }

    /// Run one simulation tick. A no-op unless [`GameLoop::wants_ticks`].
    pub fn tick(&mut self, wall_ms: u64) -> Vec<GameEvent> {
        if !self.wants_ticks() {
            return self.drain_events();
        }
        debug_assert!(!self.clock.is_suspended());
        let now = self.clock.now(wall_ms);
        self.state.tick += 1;
        self.attach_visuals();
        self.state.wave.modifiers.expire_buffs(now);

        // Movement
        let speed = self.state.character_speed(now);
        movement::step(&mut self.state.character, speed);

        // Enemy AI
        ai::steer_enemies(&mut self.state);
        let died = ai::resolve_contacts(&mut self.state, now, &mut self.events);

        // Obstacles
        collision::resolve_obstacle_pushback(
            &mut self.state.character.position,
            self.state.scenery.obstacles(),
        );

        if died {
            self.enter_game_over();
            self.render(now);
            return self.drain_events();
        }

        // Combat
        let aim = self.aim_point();
        combat::update_effects(&mut self.state, now, aim);
        self.resolve_kills(now);

        // Waves
        let spawned = waves::process_spawns(&mut self.state, now, &mut self.rng, &mut self.events);
        for id in spawned {
            self.surfaces.assets.request_visual(id, ActorKind::Enemy);
        }
        if let Some(bonus) = waves::check_wave_complete(&mut self.state, now, &mut self.events) {
            let text = format!("Wave {} cleared! Bonus: +{}", self.state.wave.wave, bonus);
            self.surfaces.ui.show_transient_message(&text, MESSAGE_MS);
            self.record_score();
        }
        if waves::open_gate_if_due(&mut self.state, now, &mut self.rng, &mut self.events).is_some() {
            self.clock.suspend(wall_ms);
            self.show_menu(MenuKind::BonusChoice);
        }

        // Animation
        for enemy in &mut self.state.enemies {
            enemy.anim_time += animation::DELTA;
        }
        self.surfaces.renderer.advance_animations(animation::DELTA);

        self.sanitize();
        self.render(now);
        self.drain_events()
    }

    /// Persist before the host exits
    pub fn shutdown(&mut self) {
        if matches!(self.mode, Mode::Playing | Mode::Paused | Mode::GameOver) {
            self.record_score();
        }
        self.persist();
        info!("Session closed");
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!("Mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            self.events.push(GameEvent::ModeChanged(mode));
        }
    }

    fn start_run(&mut self, spell: SpellKind, wall_ms: u64) {
        self.state.reset_run(spell);
        self.surfaces.ui.hide_menu();
        self.set_mode(Mode::Playing);
        info!("Run started on {} with {}", self.state.map(), spell.name());

        let now = self.clock.now(wall_ms);
        waves::start_next_wave(&mut self.state, now, &mut self.events);
        self.announce_wave();
        self.update_hud(now);
    }

    fn announce_wave(&mut self) {
        let text = format!("Wave {}", self.state.wave.wave);
        self.surfaces.ui.show_transient_message(&text, MESSAGE_MS);
    }

    fn cast(&mut self, wall_ms: u64) {
        let now = self.clock.now(wall_ms);
        let aim = self.aim_point();
        let spell = self.state.character.spell;
        match combat::try_cast(&mut self.state, now, aim, &mut self.events) {
            CastOutcome::Cast(_) | CastOutcome::BeamStopped => {
                debug!("Cast {} at {}", spell.name(), now);
                self.play_cue(PLAYER_ID, AnimationCue::Cast);
                self.surfaces.ui.show_cooldown(spell, 1.0);
                // instant strikes land between ticks
                self.resolve_kills(now);
            }
            CastOutcome::Rejected { remaining_ms } => {
                let cooldown = self.state.cooldown_for(spell, now).max(1);
                let fraction = (remaining_ms as f32 / cooldown as f32).min(1.0);
                self.surfaces.ui.show_cooldown(spell, fraction);
            }
        }
    }

    fn choose_bonus(&mut self, index: usize, wall_ms: u64) -> bool {
        let valid = matches!(
            &self.state.wave.phase,
            WavePhase::AwaitingChoice { options } if index < options.len()
        );
        if !valid {
            return false;
        }
        self.clock.resume(wall_ms);
        let now = self.clock.now(wall_ms);
        let Some(chosen) = waves::choose_bonus(&mut self.state, index, now, &mut self.events) else {
            return false;
        };
        self.surfaces.ui.hide_menu();
        self.surfaces.ui.show_transient_message(chosen.label(), MESSAGE_MS);
        self.announce_wave();
        true
    }

    fn select_map(&mut self, map: MapKind) -> bool {
        if !self.progression.is_unlocked(map) {
            let text = match unlock_rule(map) {
                Some(rule) => format!(
                    "Score {} on {} to unlock {}",
                    rule.threshold, rule.prerequisite, map
                ),
                None => format!("{} is locked", map),
            };
            self.surfaces.ui.show_transient_message(&text, MESSAGE_MS);
            return false;
        }

        let spell = self.state.character.spell;
        self.state.rebuild_scenery(map, &mut self.rng);
        self.state.reset_run(spell);
        info!("Map changed to {}", map);
        self.events.push(GameEvent::MapChanged(map));
        self.sync_world();
        self.show_menu(MenuKind::MainMenu);
        true
    }

    /// Drop everything run-scoped, including queued spawns and any beam
    fn return_to_menu(&mut self, wall_ms: u64) {
        self.clock.resume(wall_ms);
        let spell = self.state.character.spell;
        self.state.reset_run(spell);
        let map = self.state.map();
        self.state.rebuild_scenery(map, &mut self.rng);
        self.play_cue(PLAYER_ID, AnimationCue::Idle);
        self.set_mode(Mode::MainMenu);
        self.sync_world();
        self.show_menu(MenuKind::MainMenu);
    }

    fn enter_game_over(&mut self) {
        let score = self.state.wave.score;
        self.record_score();
        self.persist();
        info!("Player died on wave {} with {} points", self.state.wave.wave, score);
        self.events.push(GameEvent::PlayerDied { score });
        self.set_mode(Mode::GameOver);
        self.show_menu(MenuKind::GameOver);
    }

    fn resolve_kills(&mut self, now: u64) {
        let start = self.events.len();
        let kills = combat::reap_dead(&mut self.state, &mut self.rng, now, &mut self.events);
        if kills == 0 {
            return;
        }
        debug!("{} kill(s), score {}", kills, self.state.wave.score);
        for event in &self.events[start..] {
            if let GameEvent::KillBonus(bonus) = event {
                let text = match bonus {
                    KillBonus::Score(points) => format!("Bonus: +{}", points),
                    KillBonus::Haste => "Speed boost!".to_string(),
                    KillBonus::RapidFire => "Rapid fire!".to_string(),
                };
                self.surfaces.ui.show_transient_message(&text, MESSAGE_MS);
            }
        }
        self.record_score();
    }

    /// Submit the running score; persists on a new high score
    fn record_score(&mut self) {
        let map = self.state.map();
        let score = self.state.wave.score;
        let outcome = self.progression.record_score(map, score);
        if !outcome.improved {
            return;
        }
        self.events.push(GameEvent::HighScore { map, score });
        for unlocked in outcome.newly_unlocked {
            info!("Map unlocked: {}", unlocked);
            self.events.push(GameEvent::MapUnlocked(unlocked));
            self.surfaces
                .ui
                .show_transient_message("New map unlocked!", MESSAGE_MS);
        }
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.surfaces.store.save(&self.progression) {
            warn!("Failed to save progression: {}", e);
        }
    }

    fn aim_point(&self) -> Option<Vec2> {
        self.pointer_ndc
            .and_then(|ndc| self.surfaces.renderer.raycast_ground_point(ndc))
            .filter(Vec2::is_finite)
    }

    fn play_cue(&mut self, id: EntityId, cue: AnimationCue) {
        if self.placed.contains(&id) {
            self.surfaces.renderer.play_animation_cue(id, cue);
        }
    }

    /// Attach finished visuals; completions for vanished entities are dropped
    fn attach_visuals(&mut self) {
        for ready in self.surfaces.visuals.drain() {
            if ready.entity == PLAYER_ID {
                self.state.character.visual = Some(ready.handle);
                continue;
            }
            match self.state.get_enemy_mut(ready.entity) {
                Some(enemy) => enemy.visual = Some(ready.handle),
                None => debug!("Dropping visual for missing entity {}", ready.entity),
            }
        }
    }

    /// Repair non-finite positions before they spread through the simulation
    fn sanitize(&mut self) {
        let c = &mut self.state.character;
        if !c.position.is_finite() {
            warn!("Fixed non-finite character position");
            c.position = Vec2::ZERO;
        }
        if !c.facing.is_finite() {
            c.facing = 0.0;
            c.target_facing = 0.0;
        }
        let center = c.position;
        for e in &mut self.state.enemies {
            if !e.position.is_finite() {
                warn!("Fixed non-finite position for enemy {}", e.id);
                e.position = center + Vec2::RIGHT * wave::SPAWN_RING_RADIUS;
            }
        }
        debug_assert!(health_in_range(&self.state));
        debug_assert!(self.state.wave.killed <= self.state.wave.required);
    }

    fn render(&mut self, now: u64) {
        self.sync_world();
        self.update_hud(now);
        self.surfaces.renderer.present();
    }

    /// Reconcile renderer actors with the model: place what is ready, remove what is gone
    fn sync_world(&mut self) {
        let renderer = &mut self.surfaces.renderer;
        let mut live: HashSet<EntityId> = HashSet::with_capacity(self.placed.len());

        let c = &self.state.character;
        if c.visual.is_some() && self.mode != Mode::MainMenu {
            let pose = ActorPose {
                position: c.position,
                height: character::GROUND_HEIGHT,
                heading: c.facing,
            };
            renderer.place_actor(PLAYER_ID, ActorKind::Character, pose);
            live.insert(PLAYER_ID);
        }

        for e in self.state.enemies.iter().filter(|e| e.visual.is_some()) {
            let pose = ActorPose {
                position: e.position,
                height: enemy::RENDER_HEIGHT,
                heading: e.facing,
            };
            renderer.place_actor(e.id, ActorKind::Enemy, pose);
            live.insert(e.id);
        }

        for fx in &self.state.effects {
            let (kind, heading) = match &fx.kind {
                EffectKind::Projectile { direction, .. } => (ActorKind::Fireball, direction.heading()),
                EffectKind::Beam { direction, .. } => (ActorKind::LaserBeam, direction.heading()),
                EffectKind::Bolt { end } => (ActorKind::LightningBolt, (*end - fx.position).heading()),
                EffectKind::Impact => (ActorKind::Impact, 0.0),
                EffectKind::Explosion => (ActorKind::Explosion, 0.0),
                EffectKind::ShieldFlash => (ActorKind::ShieldFlash, 0.0),
            };
            let pose = ActorPose {
                position: fx.position,
                height: character::GROUND_HEIGHT,
                heading,
            };
            renderer.place_actor(fx.id, kind, pose);
            live.insert(fx.id);
        }

        // obstacles never move, place once
        for o in self.state.obstacles() {
            if !self.placed.contains(&o.id) {
                let pose = ActorPose {
                    position: o.position,
                    height: 0.0,
                    heading: 0.0,
                };
                renderer.place_actor(o.id, ActorKind::Obstacle(o.kind), pose);
            }
            live.insert(o.id);
        }

        for id in self.placed.difference(&live) {
            renderer.remove_actor(*id);
        }
        self.placed = live;
    }

    fn update_hud(&mut self, now: u64) {
        let c = &self.state.character;
        let w = &self.state.wave;
        let cooldown = self.state.cooldown_for(c.spell, now);
        let remaining = c.timers.remaining(c.spell, cooldown, now);
        let hud = HudSnapshot {
            health: c.health,
            max_health: c.max_health,
            score: w.score,
            score_multiplier: w.modifiers.score_multiplier,
            wave: w.wave,
            kills: w.killed,
            required: w.required,
            shield_charges: w.modifiers.shield_charges,
            spell: c.spell,
            cooldown_fraction: if cooldown > 0 {
                remaining as f32 / cooldown as f32
            } else {
                0.0
            },
        };
        self.surfaces.ui.update_hud(&hud);
    }

    fn menu_context(&self) -> MenuContext {
        let w = &self.state.wave;
        MenuContext {
            score: w.score,
            wave: w.wave,
            kills: w.killed,
            current_map: Some(self.state.map()),
            maps: MapKind::ALL
                .iter()
                .map(|&map| MapEntry {
                    map,
                    unlocked: self.progression.is_unlocked(map),
                    high_score: self.progression.high_score(map),
                    requirement: unlock_rule(map),
                })
                .collect(),
            spells: SpellKind::ALL.to_vec(),
            offers: match &w.phase {
                WavePhase::AwaitingChoice { options } => options.to_vec(),
                _ => Vec::new(),
            },
        }
    }

    fn show_menu(&mut self, kind: MenuKind) {
        let context = self.menu_context();
        self.surfaces.ui.show_menu(kind, &context);
    }
}

fn health_in_range(state: &SessionState) -> bool {
    let c = &state.character;
    c.health >= 0.0 && c.health <= c.max_health
}
