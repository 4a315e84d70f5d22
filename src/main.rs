use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use spellfire_arena::config::GameConfig;
use spellfire_arena::game::game_loop::{GameLoop, Mode, Surfaces};
use spellfire_arena::game::input_buffer::InputBuffer;
use spellfire_arena::persistence::JsonFileStore;
use spellfire_arena::surface::autopilot::Autopilot;
use spellfire_arena::surface::headless::{HeadlessRenderer, InstantAssets, LogUi};
use spellfire_arena::surface::{InputEvent, VisualQueue};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Spellfire Arena v{}", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: {} Hz, save={}, map={}, spell={}",
        config.tick_rate,
        config.save_path.display(),
        config.start_map,
        config.start_spell.name()
    );

    let visuals = VisualQueue::new();
    let surfaces = Surfaces {
        renderer: Box::new(HeadlessRenderer::new()),
        ui: Box::new(LogUi::default()),
        assets: Box::new(InstantAssets::new(visuals.sender())),
        visuals,
        store: Box::new(JsonFileStore::new(&config.save_path)),
    };
    let mut game = GameLoop::new(config.loop_config(), surfaces);
    let inputs = InputBuffer::new(config.input_capacity);
    let mut pilot = Autopilot::new(inputs.sender(), config.start_spell);

    let started = Instant::now();
    let deadline_ms = (config.run_seconds > 0).then(|| config.run_seconds * 1000);
    let mut interval = tokio::time::interval(Duration::from_millis(config.frame_ms()));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let run = async {
        loop {
            interval.tick().await;
            let wall_ms = started.elapsed().as_millis() as u64;

            pilot.plan(&game, wall_ms);
            for message in inputs.drain() {
                game.handle_input(message.event, message.wall_ms);
            }
            for event in game.tick(wall_ms) {
                debug!(?event, "game event");
            }

            if game.mode() == Mode::GameOver {
                let wave = &game.state().wave;
                info!("Game over on wave {} with {} points", wave.wave, wave.score);
                game.handle_input(InputEvent::AcknowledgeGameOver, wall_ms);
                break;
            }
            if deadline_ms.is_some_and(|limit| wall_ms >= limit) {
                let wave = &game.state().wave;
                info!("Run time elapsed on wave {} with {} points", wave.wave, wave.score);
                break;
            }
        }
    };

    tokio::select! {
        _ = run => {}
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        }
    }

    game.shutdown();
    let progression = game.progression();
    for &map in progression.unlocked_maps() {
        info!("High score on {}: {}", map, progression.high_score(map));
    }
    info!("Stopped");

    Ok(())
}
