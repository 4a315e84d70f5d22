use serde::{Deserialize, Serialize};

use crate::game::scenery::MapKind;
use crate::game::state::{Direction, SpellKind};

/// Input delivered to the game loop by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    DirectionalKey { direction: Direction, pressed: bool },
    /// Pointer position in normalized device coordinates ([-1, 1] both axes)
    PointerMove { ndc: [f32; 2] },
    CastRequested,
    PauseToggle,
    NewGame,
    /// Open the map picker from the main menu
    OpenMapSelect,
    SelectMap(MapKind),
    SelectSpell(SpellKind),
    /// Index into the offered upgrades
    ChooseBonus(usize),
    Resume,
    QuitToMenu,
    AcknowledgeGameOver,
}
