//! Map scenery: static obstacles and the border ring
//!
//! Each map scatters its own obstacle kinds inside the playfield and is
//! enclosed by a ring of border posts just outside [`map::HALF_SIZE`].

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::constants::map;
use crate::game::state::EntityId;
use crate::util::vec2::Vec2;

/// Selectable arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    Forest,
    Desert,
    Cave,
}

impl MapKind {
    pub const ALL: [MapKind; 3] = [MapKind::Forest, MapKind::Desert, MapKind::Cave];

    pub fn name(&self) -> &'static str {
        match self {
            MapKind::Forest => "forest",
            MapKind::Desert => "desert",
            MapKind::Cave => "cave",
        }
    }

    /// Scatter groups for this map
    fn layout(&self) -> &'static [ScatterGroup] {
        match self {
            MapKind::Forest => FOREST_LAYOUT,
            MapKind::Desert => DESERT_LAYOUT,
            MapKind::Cave => CAVE_LAYOUT,
        }
    }
}

const FOREST_LAYOUT: &[ScatterGroup] = &[
    ScatterGroup::new(ObstacleKind::Tree, 15, 1.0, 12.5),
    ScatterGroup::new(ObstacleKind::Rock, 10, 1.0, 10.0),
];

const DESERT_LAYOUT: &[ScatterGroup] = &[
    ScatterGroup::new(ObstacleKind::Cactus, 8, 2.0, 12.5),
    ScatterGroup::new(ObstacleKind::DesertRock, 12, 2.0, 10.0),
    ScatterGroup::new(ObstacleKind::Dune, 6, 1.75, 12.5),
];

const CAVE_LAYOUT: &[ScatterGroup] = &[
    ScatterGroup::new(ObstacleKind::Stalagmite, 12, 1.2, 12.5),
    ScatterGroup::new(ObstacleKind::Crystal, 8, 1.2, 10.0),
];

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forest" => Ok(MapKind::Forest),
            "desert" => Ok(MapKind::Desert),
            "cave" => Ok(MapKind::Cave),
            other => Err(format!("unknown map '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Tree,
    Rock,
    Cactus,
    DesertRock,
    Dune,
    Stalagmite,
    Crystal,
    Boundary,
}

/// Static blocker the character is pushed out of
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: EntityId,
    pub position: Vec2,
    /// Collision radius for this obstacle
    pub radius: f32,
    pub kind: ObstacleKind,
}

struct ScatterGroup {
    kind: ObstacleKind,
    count: usize,
    radius: f32,
    /// Positions are uniform in [-extent, extent) on both axes
    extent: f32,
}

impl ScatterGroup {
    const fn new(kind: ObstacleKind, count: usize, radius: f32, extent: f32) -> Self {
        Self {
            kind,
            count,
            radius,
            extent,
        }
    }
}

/// The obstacle set of the active map
#[derive(Debug, Clone)]
pub struct Scenery {
    map: MapKind,
    obstacles: Vec<Obstacle>,
}

impl Scenery {
    /// Map with no obstacles at all
    pub fn empty(map: MapKind) -> Self {
        Self {
            map,
            obstacles: Vec::new(),
        }
    }

    /// Scatter the map's obstacles and ring the playfield with border posts.
    /// Ids are allocated upward from `first_id`.
    pub fn generate<R: Rng>(map: MapKind, rng: &mut R, first_id: EntityId) -> Self {
        let mut obstacles = Vec::new();
        let mut next_id = first_id;
        let mut push = |position: Vec2, radius: f32, kind: ObstacleKind| {
            obstacles.push(Obstacle {
                id: next_id,
                position,
                radius,
                kind,
            });
            next_id += 1;
        };

        for group in map.layout() {
            for _ in 0..group.count {
                let x = rng.gen_range(-group.extent..group.extent);
                let z = rng.gen_range(-group.extent..group.extent);
                push(Vec2::new(x, z), group.radius, group.kind);
            }
        }

        for position in border_ring() {
            push(position, map::BORDER_RADIUS, ObstacleKind::Boundary);
        }

        Self { map, obstacles }
    }

    pub fn map(&self) -> MapKind {
        self.map
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// First id not used by this scenery
    pub fn next_free_id(&self) -> EntityId {
        self.obstacles.iter().map(|o| o.id + 1).max().unwrap_or(0)
    }
}

/// Post positions along the four edges, corners included once
fn border_ring() -> Vec<Vec2> {
    let edge = map::HALF_SIZE + map::BORDER_OFFSET;
    let steps = (2.0 * edge / map::BORDER_SPACING).round() as i32;
    let mut posts = Vec::with_capacity(steps as usize * 4);
    for i in 0..steps {
        let t = -edge + i as f32 * map::BORDER_SPACING;
        // each edge owns its starting corner
        posts.push(Vec2::new(t, -edge));
        posts.push(Vec2::new(edge, t));
        posts.push(Vec2::new(-t, edge));
        posts.push(Vec2::new(-edge, -t));
    }
    posts
}
