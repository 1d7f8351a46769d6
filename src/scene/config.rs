//! Scene configuration loaded from JSON

use std::path::Path;

use glam::{IVec3, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::generation::{generate_pillars, single_voxel, TerrainGenerator, TerrainParams};
use crate::render::RenderConfig;
use crate::voxel::VoxelGrid;

/// What fills the finest grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldKind {
    /// FBM heightmap
    #[default]
    Terrain,
    /// Floor with a pillar in the middle
    Pillars,
    /// One voxel at the grid center
    SingleVoxel,
}

/// Configuration for a rendered scene.
///
/// Every field is optional in the file; missing ones take their defaults.
/// Vectors are stored as `[x, y, z]` arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub world: WorldKind,
    /// Voxels per axis of the finest grid (power of two)
    pub world_size: u32,
    pub voxel_size: f32,
    /// Stop compressing once the coarsest level is at most this many voxels per axis
    pub coarsest_dim: u32,
    pub terrain: TerrainParams,
    pub camera_position: [f32; 3],
    /// Point the camera here; when unset `yaw`/`pitch` are used
    pub camera_target: Option<[f32; 3]>,
    /// Radians
    pub yaw: f32,
    /// Radians
    pub pitch: f32,
    pub focal_length: f32,
    pub width: u32,
    pub height: u32,
    pub sun_position: [f32; 3],
    pub render: RenderConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            world: WorldKind::Terrain,
            world_size: 256,
            voxel_size: 1.0,
            coarsest_dim: 4,
            terrain: TerrainParams {
                height_scale: 96.0,
                ..Default::default()
            },
            camera_position: [1.0, 100.0, 1.0],
            camera_target: Some([128.0, 20.0, 128.0]),
            yaw: 0.0,
            pitch: 0.0,
            focal_length: 0.66,
            width: 320,
            height: 180,
            sun_position: [64.0, 400.0, -128.0],
            render: RenderConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values that would make the scene unusable
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "resolution {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if !(self.focal_length > 0.0) {
            return Err(Error::Config(format!(
                "focal length {} must be positive",
                self.focal_length
            )));
        }
        if self.coarsest_dim == 0 {
            return Err(Error::Config("coarsest_dim must be at least 1".to_string()));
        }
        if let Some(factor) = self.render.lod_factor {
            if !(factor > 0.0) {
                return Err(Error::Config(format!("lod factor {} must be positive", factor)));
            }
        }
        Ok(())
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::from_array(self.camera_position)
    }

    pub fn sun_position(&self) -> Vec3 {
        Vec3::from_array(self.sun_position)
    }

    /// Generate the finest grid described by this config
    pub fn build_world(&self) -> Result<VoxelGrid> {
        match self.world {
            WorldKind::Terrain => {
                let mut grid = VoxelGrid::cube(self.world_size, self.voxel_size)?;
                TerrainGenerator::new(self.terrain.clone()).fill(&mut grid);
                Ok(grid)
            }
            WorldKind::Pillars => generate_pillars(self.world_size, self.voxel_size),
            WorldKind::SingleVoxel => {
                let center = IVec3::splat((self.world_size / 2) as i32);
                single_voxel(UVec3::splat(self.world_size), self.voxel_size, center)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ShadingMode, Traversal};

    #[test]
    fn test_default_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenes").join("test.json");

        let mut config = SceneConfig::default();
        config.world = WorldKind::Pillars;
        config.render.mode = ShadingMode::Shadowed;
        config.render.lod_factor = Some(16.0);
        config.save(&path).unwrap();

        assert_eq!(SceneConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(
            &path,
            r#"{ "world": "single_voxel", "world_size": 16, "render": { "traversal": "mipmap" } }"#,
        )
        .unwrap();

        let config = SceneConfig::load(&path).unwrap();
        assert_eq!(config.world, WorldKind::SingleVoxel);
        assert_eq!(config.world_size, 16);
        assert_eq!(config.render.traversal, Traversal::Mipmap);
        assert_eq!(config.render.mode, ShadingMode::Faces);
        assert_eq!(config.width, 320);
        assert_eq!(config.terrain.octaves, 4);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = SceneConfig::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Io(_))));

        let bad_json = dir.path().join("bad.json");
        std::fs::write(&bad_json, "{ world_size: ").unwrap();
        assert!(matches!(SceneConfig::load(&bad_json), Err(Error::Json(_))));

        let bad_value = dir.path().join("zero.json");
        std::fs::write(&bad_value, r#"{ "width": 0 }"#).unwrap();
        assert!(matches!(SceneConfig::load(&bad_value), Err(Error::Config(_))));
    }

    #[test]
    fn test_build_world() {
        let config = SceneConfig {
            world: WorldKind::SingleVoxel,
            world_size: 16,
            ..Default::default()
        };
        let grid = config.build_world().unwrap();
        assert_eq!(grid.count(), 1);
        assert!(grid.get(8, 8, 8));

        let config = SceneConfig {
            world_size: 24,
            ..Default::default()
        };
        assert!(matches!(config.build_world(), Err(Error::InvalidGrid(_))));
    }
}
