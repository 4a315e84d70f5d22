use std::path::PathBuf;

use thiserror::Error;

use crate::game::game_loop::GameLoopConfig;
use crate::game::scenery::MapKind;
use crate::game::state::SpellKind;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("tick_rate must be 1-240, got {0}")]
    TickRate(u32),
    #[error("input_capacity must be at least 1")]
    InputCapacity,
    #[error("save_path cannot be empty")]
    EmptySavePath,
}

/// Runtime configuration for the headless driver
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Where progression is saved
    pub save_path: PathBuf,
    /// Frames per second delivered to the loop
    pub tick_rate: u32,
    /// Wall-clock run length in seconds; 0 runs until the character dies
    pub run_seconds: u64,
    /// Fixed seed for reproducible runs
    pub rng_seed: Option<u64>,
    pub start_map: MapKind,
    pub start_spell: SpellKind,
    /// Bounded input queue size
    pub input_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("fireball_save.json"),
            tick_rate: 60,
            run_seconds: 30,
            rng_seed: None,
            start_map: MapKind::Forest,
            start_spell: SpellKind::Fireball,
            input_capacity: 256,
        }
    }
}

impl GameConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SAVE_PATH") {
            if path.trim().is_empty() {
                tracing::warn!("SAVE_PATH is empty, using default");
            } else {
                config.save_path = PathBuf::from(path);
            }
        }

        if let Ok(rate) = std::env::var("TICK_RATE") {
            match rate.parse::<u32>() {
                Ok(parsed) if (1..=240).contains(&parsed) => config.tick_rate = parsed,
                Ok(_) => tracing::warn!("TICK_RATE must be 1-240, using default"),
                Err(_) => tracing::warn!("Invalid TICK_RATE '{}', using default", rate),
            }
        }

        if let Ok(secs) = std::env::var("RUN_SECONDS") {
            if let Ok(parsed) = secs.parse::<u64>() {
                config.run_seconds = parsed;
            } else {
                tracing::warn!("Invalid RUN_SECONDS '{}', using default", secs);
            }
        }

        if let Ok(seed) = std::env::var("RNG_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.rng_seed = Some(parsed);
            } else {
                tracing::warn!("Invalid RNG_SEED '{}', seeding from entropy", seed);
            }
        }

        if let Ok(map) = std::env::var("START_MAP") {
            match map.parse::<MapKind>() {
                Ok(parsed) => config.start_map = parsed,
                Err(e) => tracing::warn!("{}, using forest", e),
            }
        }

        if let Ok(spell) = std::env::var("START_SPELL") {
            match spell.parse::<SpellKind>() {
                Ok(parsed) => config.start_spell = parsed,
                Err(e) => tracing::warn!("{}, using fireball", e),
            }
        }

        if let Ok(cap) = std::env::var("INPUT_CAPACITY") {
            match cap.parse::<usize>() {
                Ok(parsed) if parsed > 0 => config.input_capacity = parsed,
                _ => tracing::warn!("Invalid INPUT_CAPACITY '{}', using default", cap),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=240).contains(&self.tick_rate) {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        if self.input_capacity == 0 {
            return Err(ConfigError::InputCapacity);
        }
        if self.save_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptySavePath);
        }
        Ok(())
    }

    /// Milliseconds between frames
    pub fn frame_ms(&self) -> u64 {
        (1000 / self.tick_rate.max(1) as u64).max(1)
    }

    pub fn loop_config(&self) -> GameLoopConfig {
        GameLoopConfig {
            seed: self.rng_seed,
            start_map: self.start_map,
        }
    }
}
