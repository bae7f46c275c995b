// Draft model: players, positions, roster rules and the snake-draft loop.

pub mod pick;
pub mod player;
pub mod roster;
pub mod rules;
pub mod state;
