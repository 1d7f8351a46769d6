//! Noise-based heightmap terrain

use glam::IVec3;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::voxel::VoxelGrid;

/// Parameters controlling terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub seed: u32,
    pub scale: f32,        // Horizontal scale in voxels (larger = smoother)
    pub height_scale: f32, // Max column height in voxels
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // FBM persistence (0.5 typical)
    pub lacunarity: f32,   // FBM lacunarity (2.0 typical)
    /// Columns within this many voxels of the X/Z edges stay empty
    pub margin: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 100.0,
            height_scale: 64.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            margin: 1,
        }
    }
}

/// Heightmap generator using fractal Brownian motion (FBM)
pub struct TerrainGenerator {
    params: TerrainParams,
    noise: Fbm<Perlin>,
}

impl TerrainGenerator {
    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Terrain height in voxels at map position (x, z), in `[0, height_scale]`
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let nx = (x / self.params.scale) as f64;
        let nz = (z / self.params.scale) as f64;

        // Fbm output is roughly [-1, 1]
        let normalized = ((self.noise.get([nx, nz]) + 1.0) / 2.0).clamp(0.0, 1.0);
        (normalized * self.params.height_scale as f64) as f32
    }

    /// Fill `grid` with solid columns up to the terrain height.
    ///
    /// Heights are sampled in parallel, then written column by column.
    /// Returns the number of voxels set.
    pub fn fill(&self, grid: &mut VoxelGrid) -> usize {
        let dims = grid.dims();
        let margin = self.params.margin.min(dims.x / 2).min(dims.z / 2);

        let columns: Vec<(i32, i32)> = (margin..dims.z - margin)
            .flat_map(|z| (margin..dims.x - margin).map(move |x| (x as i32, z as i32)))
            .collect();

        let start = std::time::Instant::now();
        let heights: Vec<i32> = columns
            .par_iter()
            .map(|&(x, z)| {
                let h = self.height_at(x as f32 + 0.5, z as f32 + 0.5);
                (h as i32).clamp(0, dims.y as i32)
            })
            .collect();

        let mut total = 0;
        for (&(x, z), &h) in columns.iter().zip(&heights) {
            grid.fill_box(IVec3::new(x, 0, z), IVec3::new(x + 1, h, z + 1), true);
            total += h as usize;
        }

        log::info!(
            "Generated terrain: {} columns, {} voxels in {:.1}ms",
            columns.len(),
            total,
            start.elapsed().as_secs_f64() * 1000.0
        );

        total
    }
}
