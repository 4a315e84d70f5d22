pub mod ai;
pub mod combat;
pub mod movement;
pub mod waves;
