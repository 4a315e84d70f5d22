pub mod clock;
pub mod collision;
pub mod constants;
pub mod events;
pub mod game_loop;
pub mod input_buffer;
pub mod progression;
pub mod scenery;
pub mod state;
pub mod systems;
