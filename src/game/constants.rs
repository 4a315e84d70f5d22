//! Gameplay tuning constants
//!
//! Distances are world units on the ground plane, speeds are units per tick,
//! times are milliseconds of game clock.

/// Player character constants
pub mod character {
    /// Maximum (and starting) health
    pub const MAX_HEALTH: f32 = 100.0;
    /// Base movement speed per tick
    pub const BASE_SPEED: f32 = 0.06;
    /// Fraction of the remaining facing error closed each tick
    pub const TURN_RATE: f32 = 0.1;
    /// Below this facing error the character snaps to the target
    pub const TURN_SNAP: f32 = 0.01;
    /// Standing height above the ground plane
    pub const GROUND_HEIGHT: f32 = 0.3;
    /// Damage ignored for this long after a hit (ms)
    pub const INVULNERABILITY_MS: u64 = 1000;
}

/// Enemy constants
pub mod enemy {
    pub const HEALTH: f32 = 100.0;
    /// Speed at wave 0; see [`speed_for_wave`]
    pub const BASE_SPEED: f32 = 0.03;
    pub const SPEED_PER_WAVE: f32 = 0.005;
    pub const SCORE_PER_WAVE: u64 = 10;
    /// Distance below which two enemies push apart
    pub const SEPARATION_THRESHOLD: f32 = 1.0;
    /// Step applied to each enemy of an overlapping pair
    pub const SEPARATION_STEP: f32 = 0.05;
    /// Enemy-vs-player contact distance (tighter than the default threshold)
    pub const CONTACT_THRESHOLD: f32 = 0.7;
    pub const CONTACT_DAMAGE: f32 = 10.0;
    /// Enemy knock-back after landing a hit on health
    pub const HIT_PUSHBACK: f32 = 0.1;
    /// Enemy knock-back after a shield absorbs the hit
    pub const SHIELD_PUSHBACK: f32 = 0.5;
    /// Height enemies are rendered at
    pub const RENDER_HEIGHT: f32 = 0.4;

    pub fn speed_for_wave(wave: u32) -> f32 {
        BASE_SPEED + wave as f32 * SPEED_PER_WAVE
    }

    pub fn score_for_wave(wave: u32) -> u64 {
        SCORE_PER_WAVE * wave as u64
    }
}

/// Fireball (projectile) constants
pub mod fireball {
    pub const COOLDOWN_MS: u64 = 500;
    pub const BASE_DAMAGE: f32 = 50.0;
    pub const SPEED: f32 = 0.2;
    /// Travel distance after which the projectile is discarded
    pub const MAX_RANGE: f32 = 20.0;
    pub const HIT_THRESHOLD: f32 = 0.6;
    /// Heading offsets (radians) of the side shots when multishot is active
    pub const MULTISHOT_OFFSET: f32 = 0.3;
    /// Launch point distance ahead of the caster
    pub const SPAWN_OFFSET: f32 = 0.75;
}

/// Lifetimes of cosmetic effects, in ticks
pub mod effects {
    pub const IMPACT_TICKS: u32 = 16;
    pub const EXPLOSION_TICKS: u32 = 50;
    pub const SHIELD_FLASH_TICKS: u32 = 20;
}

/// Lightning (instant area strike) constants
pub mod lightning {
    pub const COOLDOWN_MS: u64 = 1500;
    pub const DAMAGE: f32 = 75.0;
    /// Strike point is clamped to this distance from the caster
    pub const MAX_RANGE: f32 = 12.0;
    pub const RADIUS: f32 = 2.5;
    /// Cosmetic bolt lifetime in ticks
    pub const FLASH_TICKS: u32 = 8;
}

/// Laser (continuous beam) constants
pub mod laser {
    pub const COOLDOWN_MS: u64 = 100;
    pub const DAMAGE_PER_PULSE: f32 = 5.0;
    pub const DAMAGE_INTERVAL_MS: u64 = 100;
    pub const LENGTH: f32 = 20.0;
    /// Perpendicular distance from the beam axis that still takes damage
    pub const WIDTH_THRESHOLD: f32 = 0.8;
    pub const MAX_DURATION_MS: u64 = 5000;
}

/// Temporary kill-bonus constants
pub mod kill_bonus {
    /// Chance that a kill rolls a bonus
    pub const CHANCE: f64 = 0.2;
    /// Score bonus is `SCORE_PER_WAVE * wave * multiplier`
    pub const SCORE_PER_WAVE: u64 = 50;
    pub const SPEED_FACTOR: f32 = 1.5;
    /// Fireball cooldown while rapid fire is active
    pub const RAPID_FIRE_COOLDOWN_MS: u64 = 100;
    pub const DURATION_MS: u64 = 5000;
}

/// Wave orchestration constants
pub mod wave {
    pub const BASE_ENEMIES: u32 = 5;
    pub const ENEMIES_PER_WAVE: u32 = 2;
    /// Delay between successive staggered spawns (ms)
    pub const SPAWN_STAGGER_MS: u64 = 500;
    /// Radius of the spawn ring around the player
    pub const SPAWN_RING_RADIUS: f32 = 15.0;
    /// Clear bonus is `CLEAR_BONUS_PER_WAVE * wave * multiplier`
    pub const CLEAR_BONUS_PER_WAVE: u64 = 100;
    /// Gap between the clear announcement and the bonus-choice gate (ms)
    pub const GATE_DELAY_MS: u64 = 3000;
    /// Number of upgrades offered at the gate
    pub const BONUS_CHOICES: usize = 3;

    pub fn enemies_required(wave: u32) -> u32 {
        BASE_ENEMIES + wave.saturating_sub(1) * ENEMIES_PER_WAVE
    }
}

/// Permanent upgrade constants (bonus-choice gate)
pub mod upgrade {
    pub const DAMAGE_FACTOR: f32 = 1.5;
    pub const SPEED_FACTOR: f32 = 1.25;
    pub const COOLDOWN_FACTOR: f32 = 0.6;
    /// Upgraded cooldowns never drop below this (ms)
    pub const COOLDOWN_FLOOR_MS: u64 = 100;
    pub const SHIELD_CHARGES: u32 = 3;
    pub const SCORE_FACTOR: u64 = 2;
}

/// Map layout constants
pub mod map {
    /// Half the side of the square playfield
    pub const HALF_SIZE: f32 = 15.0;
    /// Border posts sit this far outside the playfield edge
    pub const BORDER_OFFSET: f32 = 1.0;
    pub const BORDER_SPACING: f32 = 1.0;
    pub const BORDER_RADIUS: f32 = 1.0;
    /// Fixed push-out step when the character overlaps an obstacle
    pub const PUSHBACK: f32 = 0.5;
}

/// Progression constants
pub mod progression {
    /// Forest high score needed to unlock the desert
    pub const DESERT_THRESHOLD: u64 = 5000;
    /// Desert high score needed to unlock the cave
    pub const CAVE_THRESHOLD: u64 = 10000;
}

/// Animation constants
pub mod animation {
    /// Fixed per-tick animation delta (seconds), independent of frame timing
    pub const DELTA: f32 = 0.016;
    /// Crossfade between idle and locomotion clips (seconds)
    pub const CROSSFADE: f32 = 0.5;
}
