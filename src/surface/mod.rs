//! Boundaries between the simulation core and its host
//!
//! The core never draws, plays audio or touches the DOM. It drives a
//! [`WorldRenderer`] and a [`UiSurface`], asks an [`AssetProvider`] for
//! visuals and receives [`InputEvent`]s.

pub mod assets;
pub mod autopilot;
pub mod headless;
pub mod input;

#[cfg(test)]
pub(crate) mod testing;

use serde::{Deserialize, Serialize};

use crate::game::progression::UnlockRule;
use crate::game::scenery::{MapKind, ObstacleKind};
use crate::game::state::{EntityId, SpellKind, Upgrade};
use crate::util::vec2::Vec2;

pub use assets::{AssetProvider, VisualQueue, VisualReady, VisualSender};
pub use input::InputEvent;

/// Opaque handle to a loaded visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// What the renderer should draw for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Character,
    Enemy,
    Obstacle(ObstacleKind),
    Fireball,
    LightningBolt,
    LaserBeam,
    Impact,
    Explosion,
    ShieldFlash,
}

/// Pose of an actor in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorPose {
    pub position: Vec2,
    pub height: f32,
    pub heading: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationCue {
    Idle,
    Move,
    Cast,
}

/// Scene presentation. `place_actor` is an upsert keyed by entity id.
pub trait WorldRenderer {
    fn place_actor(&mut self, id: EntityId, kind: ActorKind, pose: ActorPose);
    fn remove_actor(&mut self, id: EntityId);
    fn play_animation_cue(&mut self, id: EntityId, cue: AnimationCue);
    /// Ground-plane point under a normalized device coordinate, if any
    fn raycast_ground_point(&self, ndc: [f32; 2]) -> Option<Vec2>;
    fn advance_animations(&mut self, dt: f32);
    fn present(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    MainMenu,
    MapSelect,
    SpellSelect,
    Pause,
    BonusChoice,
    GameOver,
}

/// One row of the map picker
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub map: MapKind,
    pub unlocked: bool,
    pub high_score: u64,
    pub requirement: Option<UnlockRule>,
}

/// Data a menu needs to render itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuContext {
    pub score: u64,
    pub wave: u32,
    pub kills: u32,
    pub current_map: Option<MapKind>,
    pub maps: Vec<MapEntry>,
    pub spells: Vec<SpellKind>,
    pub offers: Vec<Upgrade>,
}

/// Per-tick HUD values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudSnapshot {
    pub health: f32,
    pub max_health: f32,
    pub score: u64,
    pub score_multiplier: u64,
    pub wave: u32,
    pub kills: u32,
    pub required: u32,
    pub shield_charges: u32,
    pub spell: SpellKind,
    /// Remaining cooldown of `spell` in [0, 1]
    pub cooldown_fraction: f32,
}

/// Menus, HUD and transient messages
pub trait UiSurface {
    fn show_transient_message(&mut self, text: &str, duration_ms: u64);
    fn show_menu(&mut self, kind: MenuKind, context: &MenuContext);
    fn hide_menu(&mut self);
    fn update_hud(&mut self, hud: &HudSnapshot);
    /// Remaining cooldown fraction in [0, 1] for the equipped spell
    fn show_cooldown(&mut self, spell: SpellKind, remaining_fraction: f32);
}
