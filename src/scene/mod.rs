//! Scene context: the voxel world, the camera and the light

pub mod config;

pub use config::{SceneConfig, WorldKind};

use glam::Vec3;

use crate::core::Result;
use crate::render::RaycastingCamera;
use crate::voxel::GridHierarchy;

/// Everything a frame needs, owned in one place
pub struct Scene {
    pub hierarchy: GridHierarchy,
    pub camera: RaycastingCamera,
    /// World-space position of the point light used for shading
    pub sun: Vec3,
}

impl Scene {
    pub fn new(hierarchy: GridHierarchy, camera: RaycastingCamera, sun: Vec3) -> Self {
        Self { hierarchy, camera, sun }
    }

    /// Generate the world, build its hierarchy and place the camera
    pub fn from_config(config: &SceneConfig) -> Result<Self> {
        config.validate()?;

        let grid = config.build_world()?;
        let hierarchy = GridHierarchy::build(grid, config.coarsest_dim)?;

        let mut camera = RaycastingCamera::new(config.width, config.height, config.focal_length);
        camera.position = config.camera_position();
        match config.camera_target {
            Some(target) => camera.look_at(Vec3::from_array(target)),
            None => camera.set_rotation(config.yaw, config.pitch),
        }

        log::info!(
            "Scene ready: {:?} world, {} voxels, camera at {}",
            config.world,
            hierarchy.finest().count(),
            camera.position
        );

        Ok(Self::new(hierarchy, camera, config.sun_position()))
    }

    /// Edit one voxel of the finest level and rebuild the coarser levels
    pub fn set_voxel(&mut self, x: i32, y: i32, z: i32, value: bool) -> Result<()> {
        self.hierarchy.set_voxel(x, y, z, value);
        self.hierarchy.rebuild()
    }
}
