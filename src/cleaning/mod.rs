// Cleaning stages: duplicate removal and trash-word filtering.

pub mod duplicates;
pub mod traits;
pub mod trash;
