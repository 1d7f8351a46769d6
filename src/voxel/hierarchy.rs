//! Multi-resolution grid hierarchy.
//!
//! Levels are stored finest first:
//! - Level 0: full resolution, authoritative occupancy
//! - Level i + 1: `compress()` of level i (half the voxels per axis, twice the voxel size)
//!
//! Traversal starts at the coarsest level and walks toward level 0, so the
//! accessors are named by resolution (`finer` / `coarser`) rather than by
//! tree position.

use glam::UVec3;

use super::grid::VoxelGrid;
use crate::core::{Error, Result};

/// Chain of progressively coarser occupancy grids
#[derive(Clone, Debug)]
pub struct GridHierarchy {
    levels: Vec<VoxelGrid>,
}

impl GridHierarchy {
    /// Create a single-level hierarchy
    pub fn new(finest: VoxelGrid) -> Self {
        Self { levels: vec![finest] }
    }

    /// Compress `finest` repeatedly until the largest dimension is at most
    /// `coarsest_dim` or some axis is down to a single voxel.
    pub fn build(finest: VoxelGrid, coarsest_dim: u32) -> Result<Self> {
        let mut hierarchy = Self::new(finest);
        while hierarchy.coarsest().dims().max_element() > coarsest_dim
            && hierarchy.coarsest().dims().min_element() > 1
        {
            hierarchy.push_coarser()?;
        }

        log::info!(
            "Built grid hierarchy: {} levels, {} -> {}, {:.1} KB",
            hierarchy.len(),
            hierarchy.finest().dims(),
            hierarchy.coarsest().dims(),
            hierarchy.memory_usage() as f64 / 1024.0
        );

        Ok(hierarchy)
    }

    /// Assemble a hierarchy from explicit levels, finest first.
    ///
    /// Each level must halve the dimensions and double the voxel size of the
    /// one before it.
    pub fn from_levels(levels: Vec<VoxelGrid>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::InvalidHierarchy("no levels".to_string()));
        }

        for (i, pair) in levels.windows(2).enumerate() {
            let (finer, coarser) = (&pair[0], &pair[1]);
            if finer.dims() != coarser.dims() * 2 {
                return Err(Error::InvalidHierarchy(format!(
                    "level {} dims {} is not half of level {} dims {}",
                    i + 1,
                    coarser.dims(),
                    i,
                    finer.dims()
                )));
            }
            if (finer.voxel_size() * 2.0 - coarser.voxel_size()).abs() > f32::EPSILON * coarser.voxel_size() {
                return Err(Error::InvalidHierarchy(format!(
                    "level {} voxel size {} is not double level {} voxel size {}",
                    i + 1,
                    coarser.voxel_size(),
                    i,
                    finer.voxel_size()
                )));
            }
        }

        Ok(Self { levels })
    }

    /// Compress the current coarsest level once and append the result
    pub fn push_coarser(&mut self) -> Result<&VoxelGrid> {
        let next = self.coarsest().compress()?;
        self.levels.push(next);
        Ok(self.coarsest())
    }

    /// Recompute every coarse level from the finest one
    pub fn rebuild(&mut self) -> Result<()> {
        for i in 1..self.levels.len() {
            self.levels[i] = self.levels[i - 1].compress()?;
        }
        Ok(())
    }

    /// Write a voxel into the finest level.
    ///
    /// Coarse levels are not updated; call [`GridHierarchy::rebuild`] afterwards.
    pub fn set_voxel(&mut self, x: i32, y: i32, z: i32, value: bool) {
        self.levels[0].set(x, y, z, value);
    }

    /// All levels, finest first
    pub fn levels(&self) -> &[VoxelGrid] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&VoxelGrid> {
        self.levels.get(index)
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false: a hierarchy holds at least its finest level
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Full resolution level
    pub fn finest(&self) -> &VoxelGrid {
        &self.levels[0]
    }

    /// Lowest resolution level
    pub fn coarsest(&self) -> &VoxelGrid {
        &self.levels[self.coarsest_index()]
    }

    pub fn coarsest_index(&self) -> usize {
        self.levels.len() - 1
    }

    /// Next higher resolution level, if any
    pub fn finer(&self, index: usize) -> Option<&VoxelGrid> {
        index.checked_sub(1).and_then(|i| self.levels.get(i))
    }

    /// Next lower resolution level, if any
    pub fn coarser(&self, index: usize) -> Option<&VoxelGrid> {
        self.levels.get(index + 1)
    }

    /// Dimensions of every level, finest first
    pub fn level_dims(&self) -> Vec<UVec3> {
        self.levels.iter().map(VoxelGrid::dims).collect()
    }

    /// Total memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.levels.iter().map(VoxelGrid::memory_usage).sum()
    }
}

impl From<VoxelGrid> for GridHierarchy {
    fn from(finest: VoxelGrid) -> Self {
        Self::new(finest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    #[test]
    fn test_build_levels() {
        let mut grid = VoxelGrid::cube(64, 0.5).unwrap();
        grid.set(63, 0, 10, true);

        let hierarchy = GridHierarchy::build(grid, 4).unwrap();
        assert_eq!(hierarchy.len(), 5);
        assert_eq!(
            hierarchy.level_dims(),
            vec![UVec3::splat(64), UVec3::splat(32), UVec3::splat(16), UVec3::splat(8), UVec3::splat(4)]
        );
        assert_eq!(hierarchy.coarsest().voxel_size(), 8.0);
        assert!(hierarchy.coarsest().get(3, 0, 0));
        assert_eq!(hierarchy.coarsest_index(), 4);
    }

    #[test]
    fn test_build_stops_at_single_voxel_axis() {
        let grid = VoxelGrid::new(UVec3::new(32, 2, 32), 1.0).unwrap();
        let hierarchy = GridHierarchy::build(grid, 1).unwrap();
        assert_eq!(hierarchy.coarsest().dims(), UVec3::new(16, 1, 16));
    }

    #[test]
    fn test_finer_and_coarser() {
        let hierarchy = GridHierarchy::build(VoxelGrid::cube(16, 1.0).unwrap(), 4).unwrap();

        assert!(hierarchy.finer(0).is_none());
        assert_eq!(hierarchy.coarser(0).unwrap().dims(), UVec3::splat(8));
        assert_eq!(hierarchy.finer(2).unwrap().dims(), UVec3::splat(8));
        assert!(hierarchy.coarser(2).is_none());
    }

    #[test]
    fn test_from_levels_validates() {
        let fine = VoxelGrid::cube(16, 1.0).unwrap();
        let coarse = fine.compress().unwrap();
        assert!(GridHierarchy::from_levels(vec![fine.clone(), coarse]).is_ok());

        let wrong_dims = VoxelGrid::cube(4, 2.0).unwrap();
        assert!(GridHierarchy::from_levels(vec![fine.clone(), wrong_dims]).is_err());

        let wrong_size = VoxelGrid::cube(8, 3.0).unwrap();
        assert!(GridHierarchy::from_levels(vec![fine, wrong_size]).is_err());

        assert!(GridHierarchy::from_levels(Vec::new()).is_err());
    }

    #[test]
    fn test_set_voxel_then_rebuild() {
        let mut hierarchy = GridHierarchy::build(VoxelGrid::cube(16, 1.0).unwrap(), 4).unwrap();

        hierarchy.set_voxel(9, 9, 9, true);
        // Coarse levels are stale until rebuilt
        assert!(!hierarchy.coarsest().is_occupied(IVec3::splat(2)));

        hierarchy.rebuild().unwrap();
        assert!(hierarchy.coarsest().is_occupied(IVec3::splat(2)));
        assert!(hierarchy.level(1).unwrap().is_occupied(IVec3::splat(4)));
    }
}
