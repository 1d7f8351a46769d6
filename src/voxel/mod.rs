//! Voxel occupancy grids and their resolution hierarchy

pub mod grid;
pub mod hierarchy;

pub use grid::{VoxelGrid, BlockWord, BLOCK_EDGE, BLOCK_VOXELS};
pub use hierarchy::GridHierarchy;
