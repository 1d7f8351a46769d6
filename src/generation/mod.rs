//! World generation: noise terrain and simple test shapes

pub mod terrain;
pub mod shapes;

pub use terrain::{TerrainGenerator, TerrainParams};
pub use shapes::{generate_pillars, single_voxel};
