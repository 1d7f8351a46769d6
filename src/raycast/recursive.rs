//! Multi-resolution traversal
//!
//! Walks the coarse levels of a [`GridHierarchy`] to skip empty space and only
//! refines into finer levels near a hit. Each finer level continues from the
//! position where the coarser level stopped, not from the original origin.

use glam::{IVec3, Vec3};

use super::dda::{occupancy_probe, raycast_with, Probe};
use super::hit::RayHit;
use crate::voxel::grid::VoxelGrid;
use crate::voxel::hierarchy::GridHierarchy;

/// Default LOD distance factor, in voxels of the finer level
pub const DEFAULT_LOD_FACTOR: f32 = 32.0;

/// How far a coarse hit is refined
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RefinePolicy {
    /// Always refine down to the finest level
    #[default]
    Full,
    /// Refine only while the hit cell is closer to the ray origin than
    /// `factor` voxels of the finer level
    Lod { factor: f32 },
    /// Never refine into a level whose largest dimension exceeds this
    MaxDims(u32),
}

impl RefinePolicy {
    /// Decide whether a hit at `grid` should be refined into `finer`
    pub fn should_refine(&self, origin: Vec3, hit: &RayHit, grid: &VoxelGrid, finer: &VoxelGrid) -> bool {
        match *self {
            RefinePolicy::Full => true,
            RefinePolicy::Lod { factor } => {
                let center = (hit.map_pos.as_vec3() + Vec3::splat(0.5)) * grid.voxel_size();
                origin.distance(center) < factor * finer.voxel_size()
            }
            RefinePolicy::MaxDims(max) => finer.dims().max_element() <= max,
        }
    }
}

/// Cast a ray through the whole hierarchy, refining every hit to the finest level
pub fn raycast_recursive(hierarchy: &GridHierarchy, origin: Vec3, direction: Vec3) -> RayHit {
    raycast_recursive_with(
        hierarchy,
        hierarchy.coarsest_index(),
        origin,
        direction,
        RefinePolicy::Full,
        |g, p| occupancy_probe(g, p, direction),
    )
}

/// Cast a ray through the hierarchy, refining only hits within `factor`
/// finer voxels of the origin
pub fn raycast_recursive_lod(hierarchy: &GridHierarchy, origin: Vec3, direction: Vec3, factor: f32) -> RayHit {
    raycast_recursive_with(
        hierarchy,
        hierarchy.coarsest_index(),
        origin,
        direction,
        RefinePolicy::Lod { factor },
        |g, p| occupancy_probe(g, p, direction),
    )
}

/// General hierarchical raycast starting at `start_level`.
///
/// On the finest level the origin is first moved back by one `direction`
/// unit, which keeps a ray that starts against a surface from reporting
/// itself as inside it.
pub fn raycast_recursive_with<F>(
    hierarchy: &GridHierarchy,
    start_level: usize,
    origin: Vec3,
    direction: Vec3,
    policy: RefinePolicy,
    mut probe: F,
) -> RayHit
where
    F: FnMut(&VoxelGrid, IVec3) -> Probe,
{
    let mut level = start_level.min(hierarchy.coarsest_index());
    let mut ray_pos = origin;

    loop {
        let grid = &hierarchy.levels()[level];
        if level == 0 {
            ray_pos -= direction;
        }

        let mut hit = raycast_with(grid, ray_pos, direction, &mut probe);
        hit.level = level;

        let Some(finer) = hierarchy.finer(level) else {
            return hit;
        };

        if !hit.is_hit() || !policy.should_refine(origin, &hit, grid, finer) {
            return hit;
        }

        ray_pos = hit.position;
        level -= 1;
    }
}

/// Hierarchical version of [`super::dda::raycast_segment`]
pub fn raycast_segment_recursive(hierarchy: &GridHierarchy, start: Vec3, end: Vec3) -> RayHit {
    let direction = (end - start).normalize_or_zero();
    let hit = raycast_recursive(hierarchy, start, direction);

    if direction != Vec3::ZERO && hit.is_hit() && start.distance(hit.position) < start.distance(end) {
        hit
    } else {
        RayHit { side: None, ..hit }
    }
}

impl GridHierarchy {
    /// See [`raycast_recursive`]
    pub fn raycast(&self, origin: Vec3, direction: Vec3) -> RayHit {
        raycast_recursive(self, origin, direction)
    }

    /// See [`raycast_recursive_lod`]
    pub fn raycast_lod(&self, origin: Vec3, direction: Vec3, factor: f32) -> RayHit {
        raycast_recursive_lod(self, origin, direction, factor)
    }

    /// See [`raycast_segment_recursive`]
    pub fn raycast_segment(&self, start: Vec3, end: Vec3) -> RayHit {
        raycast_segment_recursive(self, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::dda::raycast;
    use crate::raycast::hit::Side;

    fn corner_world(size: u32) -> GridHierarchy {
        let mut grid = VoxelGrid::cube(size, 1.0).unwrap();
        let c = size as i32 - 1;
        grid.set(c, c, c, true);
        GridHierarchy::build(grid, 4).unwrap()
    }

    #[test]
    fn test_single_voxel_world_refines_to_finest() {
        let hierarchy = corner_world(1024);
        assert_eq!(hierarchy.len(), 9);

        let dir = Vec3::ONE.normalize();

        // The coarsest level alone already sees the voxel
        let coarse = raycast(hierarchy.coarsest(), Vec3::ZERO, dir);
        assert!(coarse.is_hit());
        assert_eq!(coarse.map_pos, IVec3::splat(3));

        let hit = raycast_recursive(&hierarchy, Vec3::ZERO, dir);
        assert!(hit.is_hit());
        assert_eq!(hit.level, 0);
        assert_eq!(hit.map_pos, IVec3::splat(1023));
        assert!(hit.position.x > 1000.0);
        assert_ne!(hit.side, Some(Side::Inside));
    }

    #[test]
    fn test_manual_level_walk_matches() {
        let hierarchy = corner_world(256);
        let dir = Vec3::ONE.normalize();

        let mut pos = Vec3::ZERO;
        let mut hit = None;
        for level in (1..hierarchy.len()).rev() {
            let h = raycast(&hierarchy.levels()[level], pos, dir);
            assert!(h.is_hit(), "level {}", level);
            pos = h.position;
            hit = Some(h);
        }
        assert!(hit.is_some());

        let finest = raycast(hierarchy.finest(), pos - dir, dir);
        assert_eq!(finest.map_pos, raycast_recursive(&hierarchy, Vec3::ZERO, dir).map_pos);
    }

    #[test]
    fn test_empty_world_misses() {
        let hierarchy = GridHierarchy::build(VoxelGrid::cube(64, 1.0).unwrap(), 4).unwrap();
        let hit = raycast_recursive(&hierarchy, Vec3::new(3.0, 40.0, 5.0), Vec3::new(0.2, -0.9, 0.1).normalize());
        assert!(!hit.is_hit());
        assert_eq!(hit.code(), 0);
        assert_eq!(hit.level, hierarchy.coarsest_index());
    }

    #[test]
    fn test_matches_finest_grid() {
        let mut grid = VoxelGrid::cube(64, 1.0).unwrap();
        grid.fill_box(IVec3::ZERO, IVec3::new(64, 4, 64), true);
        grid.fill_box(IVec3::new(10, 4, 10), IVec3::new(14, 20, 14), true);
        grid.fill_box(IVec3::new(40, 4, 21), IVec3::new(43, 30, 27), true);
        grid.fill_box(IVec3::new(30, 4, 50), IVec3::new(31, 12, 51), true);
        let hierarchy = GridHierarchy::build(grid, 4).unwrap();

        let origins = [
            Vec3::new(2.3, 40.1, 2.7),
            Vec3::new(60.2, 38.4, 7.9),
            Vec3::new(31.7, 45.3, 30.2),
        ];
        let directions = [
            Vec3::new(0.31, -0.52, 0.27),
            Vec3::new(-0.43, -0.61, 0.37),
            Vec3::new(0.11, -0.93, -0.29),
            Vec3::new(-0.71, -0.21, -0.13),
        ];

        for origin in origins {
            for dir in directions {
                let dir = dir.normalize();
                let expected = raycast(hierarchy.finest(), origin, dir);
                let hit = raycast_recursive(&hierarchy, origin, dir);
                assert_eq!(hit.is_hit(), expected.is_hit(), "{} {}", origin, dir);
                if expected.is_hit() {
                    assert_eq!(hit.level, 0);
                    assert_eq!(hit.map_pos, expected.map_pos, "{} {}", origin, dir);
                    assert_eq!(hit.side, expected.side, "{} {}", origin, dir);
                }
            }
        }
    }

    #[test]
    fn test_lod_stops_early_for_distant_hits() {
        let mut grid = VoxelGrid::cube(64, 1.0).unwrap();
        grid.set(60, 60, 60, true);
        let hierarchy = GridHierarchy::build(grid, 4).unwrap();

        let origin = Vec3::splat(0.5);
        let dir = (Vec3::splat(60.5) - origin).normalize();

        let hit = raycast_recursive_lod(&hierarchy, origin, dir, DEFAULT_LOD_FACTOR);
        assert!(hit.is_hit());
        assert_eq!(hit.level, 2);
        assert_eq!(hit.map_pos, IVec3::splat(15));

        let near_only = raycast_recursive_lod(&hierarchy, origin, dir, 1.0);
        assert_eq!(near_only.level, hierarchy.coarsest_index());

        let full = raycast_recursive_lod(&hierarchy, origin, dir, 1.0e6);
        assert_eq!(full.level, 0);
        assert_eq!(full.map_pos, IVec3::splat(60));
    }

    #[test]
    fn test_max_dims_policy() {
        let hierarchy = corner_world(64);
        let dir = Vec3::ONE.normalize();

        let hit = raycast_recursive_with(
            &hierarchy,
            hierarchy.coarsest_index(),
            Vec3::ZERO,
            dir,
            RefinePolicy::MaxDims(16),
            |g, p| occupancy_probe(g, p, dir),
        );
        assert!(hit.is_hit());
        assert_eq!(hit.level, 2);
        assert_eq!(hit.map_pos, IVec3::splat(15));
    }

    #[test]
    fn test_start_below_coarsest() {
        let hierarchy = corner_world(64);
        let dir = Vec3::ONE.normalize();

        let hit = raycast_recursive_with(&hierarchy, 1, Vec3::ZERO, dir, RefinePolicy::Full, |g, p| {
            occupancy_probe(g, p, dir)
        });
        assert_eq!(hit.level, 0);
        assert_eq!(hit.map_pos, IVec3::splat(63));
    }

    #[test]
    fn test_segment_stops_at_end() {
        let mut grid = VoxelGrid::cube(32, 1.0).unwrap();
        grid.fill_box(IVec3::new(20, 0, 0), IVec3::new(21, 32, 32), true);
        let hierarchy = GridHierarchy::build(grid, 4).unwrap();

        let start = Vec3::new(2.5, 10.5, 10.5);
        assert!(!hierarchy.raycast_segment(start, Vec3::new(15.5, 10.5, 10.5)).is_hit());

        let hit = hierarchy.raycast_segment(start, Vec3::new(28.5, 10.5, 10.5));
        assert!(hit.is_hit());
        assert_eq!(hit.map_pos, IVec3::new(20, 10, 10));
        assert_eq!(hit.side, Some(Side::PosX));
    }
}
