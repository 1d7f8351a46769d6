//! Hand-built test worlds

use glam::{IVec3, UVec3};

use crate::core::Result;
use crate::voxel::VoxelGrid;

/// Solid one-voxel floor across the whole grid at y = 0
pub fn floor(grid: &mut VoxelGrid) {
    let dims = grid.dims().as_ivec3();
    grid.fill_box(IVec3::ZERO, IVec3::new(dims.x, 1, dims.z), true);
}

/// Vertical column of `height` voxels standing on y = 0
pub fn column(grid: &mut VoxelGrid, x: i32, z: i32, height: i32) {
    grid.fill_box(IVec3::new(x, 0, z), IVec3::new(x + 1, height, z + 1), true);
}

/// Floor plus a 2x2 pillar of half the grid height at the center
pub fn generate_pillars(size: u32, voxel_size: f32) -> Result<VoxelGrid> {
    let mut grid = VoxelGrid::cube(size, voxel_size)?;
    floor(&mut grid);

    let mid = (size / 2) as i32;
    for (dx, dz) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        column(&mut grid, mid + dx, mid + dz, mid);
    }

    Ok(grid)
}

/// Empty grid with one occupied voxel
pub fn single_voxel(dims: UVec3, voxel_size: f32, pos: IVec3) -> Result<VoxelGrid> {
    let mut grid = VoxelGrid::new(dims, voxel_size)?;
    grid.set(pos.x, pos.y, pos.z, true);
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pillars() {
        let grid = generate_pillars(64, 1.0).unwrap();
        assert_eq!(grid.count(), 64 * 64 + 4 * 31);
        assert!(grid.get(32, 31, 33));
        assert!(!grid.get(32, 32, 32));
        assert!(grid.get(0, 0, 63));
        assert!(!grid.get(0, 1, 0));
    }

    #[test]
    fn test_single_voxel() {
        let grid = single_voxel(UVec3::splat(4), 4.0, IVec3::ONE).unwrap();
        assert_eq!(grid.count(), 1);
        assert!(grid.get(1, 1, 1));
        assert!(single_voxel(UVec3::splat(3), 1.0, IVec3::ZERO).is_err());
    }
}
