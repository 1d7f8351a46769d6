//! Ray traversal through voxel grids and grid hierarchies

pub mod hit;
pub mod dda;
pub mod recursive;
pub mod tracer;

pub use hit::{RayHit, Side};
pub use dda::{raycast, raycast_segment, raycast_with, occupancy_probe, DdaState, DdaStop, Probe};
pub use recursive::{raycast_recursive, raycast_recursive_lod, raycast_recursive_with, RefinePolicy, DEFAULT_LOD_FACTOR};
pub use tracer::{trace, GridTracer, MipmapTracer, TraceParams, TraceResult, Tracer};
