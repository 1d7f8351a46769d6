//! Voxray - hierarchical DDA raycasting over bitpacked voxel grids

pub mod core;
pub mod math;
pub mod voxel;
pub mod raycast;
pub mod lighting;
pub mod render;
pub mod scene;
pub mod generation;
