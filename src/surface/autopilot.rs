//! Scripted input source for headless runs
//!
//! Plays the game through the same [`InputSender`] a real host would use:
//! starts a run, strafes left and right, aims at the nearest enemy and casts
//! whenever it can. Bonus choices always take the first offer.

use tracing::debug;

use crate::game::game_loop::{GameLoop, Mode};
use crate::game::input_buffer::InputSender;
use crate::game::state::{Direction, SpellKind};
use crate::surface::headless::ndc_toward;
use crate::surface::InputEvent;
use crate::util::vec2::Vec2;

/// Time spent strafing in one direction (wall ms)
const STRAFE_MS: u64 = 2000;

pub struct Autopilot {
    sender: InputSender,
    spell: SpellKind,
    strafe: Option<Direction>,
    next_strafe_at: u64,
}

impl Autopilot {
    pub fn new(sender: InputSender, spell: SpellKind) -> Self {
        Self {
            sender,
            spell,
            strafe: None,
            next_strafe_at: 0,
        }
    }

    /// Queue this frame's input for the loop's current mode
    pub fn plan(&mut self, game: &GameLoop, wall_ms: u64) {
        match game.mode() {
            Mode::MainMenu => self.send(wall_ms, InputEvent::NewGame),
            Mode::SpellSelect => self.send(wall_ms, InputEvent::SelectSpell(self.spell)),
            Mode::Paused => self.send(wall_ms, InputEvent::Resume),
            Mode::Playing if game.state().wave.gate_open() => {
                self.send(wall_ms, InputEvent::ChooseBonus(0))
            }
            Mode::Playing => self.fight(game, wall_ms),
            Mode::GameOver => {}
        }
    }

    fn fight(&mut self, game: &GameLoop, wall_ms: u64) {
        if wall_ms >= self.next_strafe_at {
            let next = match self.strafe {
                Some(Direction::Left) => Direction::Right,
                _ => Direction::Left,
            };
            if let Some(current) = self.strafe {
                self.send(wall_ms, InputEvent::DirectionalKey { direction: current, pressed: false });
            }
            self.send(wall_ms, InputEvent::DirectionalKey { direction: next, pressed: true });
            self.strafe = Some(next);
            self.next_strafe_at = wall_ms + STRAFE_MS;
        }

        let state = game.state();
        let me = state.character.position;
        let Some(target) = nearest_enemy(game, me) else {
            return;
        };
        self.send(wall_ms, InputEvent::PointerMove { ndc: ndc_toward(me, target) });

        // a second laser cast would switch the beam off
        if self.spell == SpellKind::Laser && state.active_beam().is_some() {
            return;
        }
        self.send(wall_ms, InputEvent::CastRequested);
    }

    fn send(&self, wall_ms: u64, event: InputEvent) {
        if let Err(e) = self.sender.try_send(wall_ms, event) {
            debug!("Dropped autopilot input {:?}: {}", event, e);
        }
    }
}

fn nearest_enemy(game: &GameLoop, from: Vec2) -> Option<Vec2> {
    game.state()
        .enemies
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| e.position)
        .min_by(|a, b| from.distance_to(*a).total_cmp(&from.distance_to(*b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::game_loop::{GameLoopConfig, Surfaces};
    use crate::game::input_buffer::InputBuffer;
    use crate::game::state::Enemy;
    use crate::persistence::MemoryStore;
    use crate::surface::testing::{RecordingAssets, RecordingRenderer, RecordingUi};
    use crate::surface::VisualQueue;

    fn create_test_game() -> GameLoop {
        let visuals = VisualQueue::new();
        let surfaces = Surfaces {
            renderer: Box::new(RecordingRenderer::default()),
            ui: Box::new(RecordingUi::default()),
            assets: Box::new(RecordingAssets::new(visuals.sender())),
            visuals,
            store: Box::new(MemoryStore::new()),
        };
        let config = GameLoopConfig {
            seed: Some(3),
            ..GameLoopConfig::default()
        };
        GameLoop::new(config, surfaces)
    }

    fn events(buffer: &InputBuffer) -> Vec<InputEvent> {
        buffer.drain().into_iter().map(|m| m.event).collect()
    }

    #[test]
    fn test_autopilot_starts_a_run() {
        let mut game = create_test_game();
        let buffer = InputBuffer::new(16);
        let mut pilot = Autopilot::new(buffer.sender(), SpellKind::Lightning);

        pilot.plan(&game, 0);
        let queued = events(&buffer);
        assert_eq!(queued, vec![InputEvent::NewGame]);
        game.handle_input(queued[0], 0);

        pilot.plan(&game, 0);
        assert_eq!(events(&buffer), vec![InputEvent::SelectSpell(SpellKind::Lightning)]);
    }

    #[test]
    fn test_autopilot_aims_and_casts() {
        let mut game = create_test_game();
        game.handle_input(InputEvent::NewGame, 0);
        game.handle_input(InputEvent::SelectSpell(SpellKind::Fireball), 0);
        let id = game.state_mut().next_entity_id();
        game.state_mut().enemies.push(Enemy::new(id, Vec2::new(3.0, 0.0), 1));

        let buffer = InputBuffer::new(16);
        let mut pilot = Autopilot::new(buffer.sender(), SpellKind::Fireball);
        pilot.plan(&game, 0);
        let queued = events(&buffer);
        assert!(queued.contains(&InputEvent::DirectionalKey {
            direction: Direction::Left,
            pressed: true
        }));
        assert!(queued.contains(&InputEvent::PointerMove {
            ndc: ndc_toward(Vec2::ZERO, Vec2::new(3.0, 0.0))
        }));
        assert_eq!(queued.last(), Some(&InputEvent::CastRequested));

        // strafe flips after the interval
        pilot.plan(&game, STRAFE_MS);
        let queued = events(&buffer);
        assert_eq!(
            queued[0],
            InputEvent::DirectionalKey { direction: Direction::Left, pressed: false }
        );
        assert_eq!(
            queued[1],
            InputEvent::DirectionalKey { direction: Direction::Right, pressed: true }
        );
    }

    #[test]
    fn test_autopilot_keeps_beam_on() {
        let mut game = create_test_game();
        game.handle_input(InputEvent::NewGame, 0);
        game.handle_input(InputEvent::SelectSpell(SpellKind::Laser), 0);
        let id = game.state_mut().next_entity_id();
        game.state_mut().enemies.push(Enemy::new(id, Vec2::new(0.0, 4.0), 1));
        game.handle_input(InputEvent::CastRequested, 0);
        assert!(game.state().active_beam().is_some());

        let buffer = InputBuffer::new(16);
        let mut pilot = Autopilot::new(buffer.sender(), SpellKind::Laser);
        pilot.plan(&game, 0);
        assert!(!events(&buffer).contains(&InputEvent::CastRequested));
    }
}
