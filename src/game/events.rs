//! Gameplay events emitted by systems and drained from the game loop

use crate::game::game_loop::Mode;
use crate::game::scenery::MapKind;
use crate::game::state::{EntityId, SpellKind, Upgrade};
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KillBonus {
    /// Flat score, already multiplied
    Score(u64),
    Haste,
    RapidFire,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ModeChanged(Mode),
    WaveStarted { wave: u32, required: u32 },
    EnemySpawned { id: EntityId, position: Vec2 },
    /// `score` is what the kill credited after multipliers
    EnemyKilled { id: EntityId, score: u64 },
    KillBonus(KillBonus),
    SpellCast(SpellKind),
    BeamStopped,
    CastRejected { spell: SpellKind, remaining_ms: u64 },
    PlayerHit { damage: f32, health: f32 },
    ShieldAbsorbed { remaining: u32 },
    PlayerDied { score: u64 },
    WaveCleared { wave: u32, bonus: u64 },
    BonusOffered([Upgrade; 3]),
    UpgradeApplied(Upgrade),
    HighScore { map: MapKind, score: u64 },
    MapUnlocked(MapKind),
    MapChanged(MapKind),
}
