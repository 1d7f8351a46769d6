//! Bitpacked binary occupancy grid
//!
//! Occupancy is packed into 4x4x4 blocks, one `u64` word per block. A zero
//! word means every voxel of the block is empty, which `get` and `compress`
//! use as a fast reject.
//!
//! Word layout: block `(bx, by, bz)` lives at `bx + bz * bnx + by * bnx * bnz`
//! and voxel `(x, y, z)` inside it is bit `x%4 + (z%4)*4 + (y%4)*16`.

use glam::{IVec3, UVec3, Vec3};

use crate::core::{Error, Result};
use crate::math::Aabb;

/// Edge length of one packing block in voxels
pub const BLOCK_EDGE: u32 = 4;

/// Voxels per packing block (one bit each)
pub const BLOCK_VOXELS: u32 = BLOCK_EDGE * BLOCK_EDGE * BLOCK_EDGE;

/// Storage word holding one packing block
pub type BlockWord = u64;

const _: () = assert!(BLOCK_VOXELS == BlockWord::BITS);

/// Bit offset of a voxel inside its block
fn bit_offset(x: u32, y: u32, z: u32) -> u32 {
    x % BLOCK_EDGE + (z % BLOCK_EDGE) * BLOCK_EDGE + (y % BLOCK_EDGE) * BLOCK_EDGE * BLOCK_EDGE
}

fn bit_mask(x: u32, y: u32, z: u32) -> BlockWord {
    1 << bit_offset(x, y, z)
}

/// One resolution level of a binary occupancy volume
///
/// Dimensions must be powers of two. Grids smaller than one block on an axis
/// (reached by repeated compression) round their storage up to a whole block.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    /// Number of voxels per axis
    dims: UVec3,
    /// Number of packing blocks per axis
    blocks: UVec3,
    /// World-space edge length of one voxel
    voxel_size: f32,
    words: Vec<BlockWord>,
}

impl VoxelGrid {
    /// Create an empty grid with the given dimensions and voxel size
    pub fn new(dims: UVec3, voxel_size: f32) -> Result<Self> {
        for (axis, n) in ["x", "y", "z"].into_iter().zip(dims.to_array()) {
            if n == 0 || !n.is_power_of_two() {
                return Err(Error::InvalidGrid(format!(
                    "{} dimension {} is not a positive power of two",
                    axis, n
                )));
            }
        }

        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(Error::InvalidGrid(format!(
                "voxel size {} must be positive and finite",
                voxel_size
            )));
        }

        let blocks = (dims + UVec3::splat(BLOCK_EDGE - 1)) / BLOCK_EDGE;
        let len = blocks.x as usize * blocks.y as usize * blocks.z as usize;

        Ok(Self {
            dims,
            blocks,
            voxel_size,
            words: vec![0; len],
        })
    }

    /// Create an empty cubic grid
    pub fn cube(size: u32, voxel_size: f32) -> Result<Self> {
        Self::new(UVec3::splat(size), voxel_size)
    }

    /// Number of voxels per axis
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// World-space edge length of one voxel
    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// World-space extent of the whole grid
    pub fn world_size(&self) -> Vec3 {
        self.dims.as_vec3() * self.voxel_size
    }

    /// World-space bounding box, from the origin to `world_size`
    pub fn bounds(&self) -> Aabb {
        Aabb::from_size(self.world_size())
    }

    /// Raw packed storage, in block layout order
    pub fn words(&self) -> &[BlockWord] {
        &self.words
    }

    /// Approximate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.words.len() * std::mem::size_of::<BlockWord>()
    }

    /// Check whether a map coordinate lies inside the grid
    pub fn contains(&self, pos: IVec3) -> bool {
        pos.cmpge(IVec3::ZERO).all() && pos.as_uvec3().cmplt(self.dims).all()
    }

    fn word_index(&self, x: u32, y: u32, z: u32) -> usize {
        let (bx, by, bz) = (
            (x / BLOCK_EDGE) as usize,
            (y / BLOCK_EDGE) as usize,
            (z / BLOCK_EDGE) as usize,
        );
        let row = self.blocks.x as usize;
        let plane = row * self.blocks.z as usize;
        bx + bz * row + by * plane
    }

    /// Minimum voxel coordinate covered by the block at `index`
    fn block_origin(&self, index: usize) -> UVec3 {
        let row = self.blocks.x as usize;
        let plane = row * self.blocks.z as usize;
        let by = index / plane;
        let bz = (index % plane) / row;
        let bx = index % row;
        UVec3::new(bx as u32, by as u32, bz as u32) * BLOCK_EDGE
    }

    fn locate(&self, x: i32, y: i32, z: i32) -> Option<(usize, BlockWord)> {
        if !self.contains(IVec3::new(x, y, z)) {
            return None;
        }
        let (x, y, z) = (x as u32, y as u32, z as u32);
        Some((self.word_index(x, y, z), bit_mask(x, y, z)))
    }

    /// Read one voxel. Out-of-range coordinates read as empty.
    pub fn get(&self, x: i32, y: i32, z: i32) -> bool {
        let Some((index, mask)) = self.locate(x, y, z) else {
            log::debug!("VoxelGrid::get: invalid xyz ({}, {}, {}) for dims {}", x, y, z, self.dims);
            return false;
        };

        let word = self.words[index];
        word != 0 && word & mask != 0
    }

    /// Read one voxel by map coordinate
    pub fn is_occupied(&self, pos: IVec3) -> bool {
        self.get(pos.x, pos.y, pos.z)
    }

    /// Write one voxel. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i32, y: i32, z: i32, value: bool) {
        let Some((index, mask)) = self.locate(x, y, z) else {
            log::warn!("VoxelGrid::set: invalid xyz ({}, {}, {}) for dims {}", x, y, z, self.dims);
            return;
        };

        let word = &mut self.words[index];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Packed word of the block containing `(x, y, z)`
    pub fn block_word(&self, x: i32, y: i32, z: i32) -> Option<BlockWord> {
        self.locate(x, y, z).map(|(index, _)| self.words[index])
    }

    /// Write every voxel in the half-open box `[min, max)`, clamped to the grid
    pub fn fill_box(&mut self, min: IVec3, max: IVec3, value: bool) {
        let min = min.max(IVec3::ZERO);
        let max = max.min(self.dims.as_ivec3());

        for y in min.y..max.y {
            for z in min.z..max.z {
                for x in min.x..max.x {
                    self.set(x, y, z, value);
                }
            }
        }
    }

    /// Reset every voxel to empty
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Number of occupied voxels
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True if no voxel is occupied
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Build the next coarser grid: half the voxels per axis, twice the voxel size.
    ///
    /// A coarse voxel is occupied iff any of its 2x2x2 finer voxels is, so a
    /// coarse level never under-reports occupancy.
    pub fn compress(&self) -> Result<VoxelGrid> {
        if self.dims.cmplt(UVec3::splat(2)).any() {
            return Err(Error::InvalidGrid(format!(
                "cannot compress grid with dims {}",
                self.dims
            )));
        }

        let mut coarse = VoxelGrid::new(self.dims / 2, self.voxel_size * 2.0)?;

        for (index, &word) in self.words.iter().enumerate() {
            if word == 0 {
                continue;
            }

            let origin = self.block_origin(index);
            let mut bits = word;
            while bits != 0 {
                let bit = bits.trailing_zeros();
                bits &= bits - 1;

                let local = UVec3::new(
                    bit % BLOCK_EDGE,
                    bit / (BLOCK_EDGE * BLOCK_EDGE),
                    (bit / BLOCK_EDGE) % BLOCK_EDGE,
                );
                let c = (origin + local) / 2;
                let coarse_index = coarse.word_index(c.x, c.y, c.z);
                coarse.words[coarse_index] |= bit_mask(c.x, c.y, c.z);
            }
        }

        Ok(coarse)
    }
}
