//! Cross-session progression: unlocked maps and per-map high scores
//!
//! Unlocks are monotonic. A map opens once the high score on the map before
//! it reaches that map's threshold.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::constants::progression::{CAVE_THRESHOLD, DESERT_THRESHOLD};
use crate::game::scenery::MapKind;

/// What has to be scored, and where, to open a map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockRule {
    pub prerequisite: MapKind,
    pub threshold: u64,
}

/// Unlock rule for `map`; `None` for maps that start unlocked
pub fn unlock_rule(map: MapKind) -> Option<UnlockRule> {
    match map {
        MapKind::Forest => None,
        MapKind::Desert => Some(UnlockRule {
            prerequisite: MapKind::Forest,
            threshold: DESERT_THRESHOLD,
        }),
        MapKind::Cave => Some(UnlockRule {
            prerequisite: MapKind::Desert,
            threshold: CAVE_THRESHOLD,
        }),
    }
}

/// Result of submitting a finished (or in-progress) run's score
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreOutcome {
    /// The submitted score beat the stored high score
    pub improved: bool,
    pub newly_unlocked: SmallVec<[MapKind; 2]>,
}

/// Persisted progression record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionState {
    unlocked_maps: Vec<MapKind>,
    #[serde(default)]
    map_high_scores: HashMap<MapKind, u64>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            unlocked_maps: vec![MapKind::Forest],
            map_high_scores: MapKind::ALL.iter().map(|&m| (m, 0)).collect(),
        }
    }
}

impl ProgressionState {
    pub fn is_unlocked(&self, map: MapKind) -> bool {
        self.unlocked_maps.contains(&map)
    }

    pub fn unlocked_maps(&self) -> &[MapKind] {
        &self.unlocked_maps
    }

    pub fn high_score(&self, map: MapKind) -> u64 {
        self.map_high_scores.get(&map).copied().unwrap_or(0)
    }

    /// Record `score` for `map` if it beats the stored value, then apply unlock rules
    pub fn record_score(&mut self, map: MapKind, score: u64) -> ScoreOutcome {
        let mut outcome = ScoreOutcome::default();
        if score > self.high_score(map) {
            self.map_high_scores.insert(map, score);
            outcome.improved = true;
            outcome.newly_unlocked = self.check_unlocks();
        }
        outcome
    }

    /// Unlock every map whose rule is satisfied; returns the ones newly opened
    pub fn check_unlocks(&mut self) -> SmallVec<[MapKind; 2]> {
        let mut opened = SmallVec::new();
        for map in MapKind::ALL {
            if self.is_unlocked(map) {
                continue;
            }
            if let Some(rule) = unlock_rule(map) {
                if self.high_score(rule.prerequisite) >= rule.threshold {
                    self.unlocked_maps.push(map);
                    opened.push(map);
                }
            }
        }
        opened
    }

    /// Repair a loaded record: forest always open, no duplicates, every map scored
    pub fn normalized(mut self) -> Self {
        let mut seen = SmallVec::<[MapKind; 3]>::new();
        self.unlocked_maps.retain(|m| {
            if seen.contains(m) {
                false
            } else {
                seen.push(*m);
                true
            }
        });
        if !self.is_unlocked(MapKind::Forest) {
            self.unlocked_maps.insert(0, MapKind::Forest);
        }
        for map in MapKind::ALL {
            self.map_high_scores.entry(map).or_insert(0);
        }
        self.check_unlocks();
        self
    }
}
