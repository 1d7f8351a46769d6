//! Offscreen frame rendering

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::shading::{shade, Rgba, ShadingMode, SKY};
use crate::core::Result;
use crate::math::Ray;
use crate::raycast::{occupancy_probe, raycast_recursive_with, MipmapTracer, RayHit, RefinePolicy, TraceParams, Tracer};
use crate::scene::Scene;

/// Which traversal answers primary rays
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// Coarse-to-fine hierarchical DDA
    #[default]
    Recursive,
    /// Step-budgeted mipmap tracer
    Mipmap,
}

/// Per-frame render settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: ShadingMode,
    pub traversal: Traversal,
    /// Stop refining hits farther than this many finer voxels, `None` to always refine
    pub lod_factor: Option<f32>,
    /// Total probe limit for the mipmap tracer, 0 for none
    pub max_steps: u32,
    /// Test shadows against the face center instead of the exact hit point
    pub face_center: bool,
    /// Light level of faces turned away from the sun
    pub ambient: f32,
    pub sky_color: Rgba,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: ShadingMode::Faces,
            traversal: Traversal::Recursive,
            lod_factor: None,
            max_steps: 0,
            face_center: true,
            ambient: 0.3,
            sky_color: SKY,
        }
    }
}

/// RGBA8 image, rows top to bottom
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        image::save_buffer(
            path.as_ref(),
            self.as_bytes(),
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}

/// Answer one primary ray with the configured traversal
pub fn cast_ray(scene: &Scene, config: &RenderConfig, ray: &Ray) -> RayHit {
    let direction = ray.direction;
    match config.traversal {
        Traversal::Recursive => {
            let policy = config
                .lod_factor
                .map_or(RefinePolicy::Full, |factor| RefinePolicy::Lod { factor });
            raycast_recursive_with(
                &scene.hierarchy,
                scene.hierarchy.coarsest_index(),
                ray.origin,
                direction,
                policy,
                |g, p| occupancy_probe(g, p, direction),
            )
        }
        Traversal::Mipmap => {
            let params = TraceParams::new(ray.origin, direction).with_max_steps(config.max_steps);
            MipmapTracer::new(&scene.hierarchy).trace(&params).to_ray_hit()
        }
    }
}

/// Render the scene from its camera, one rayon task per row
pub fn render_frame(scene: &Scene, config: &RenderConfig) -> Frame {
    let (width, height) = scene.camera.resolution();
    let mut frame = Frame::new(width, height);
    let bounds = scene.hierarchy.finest().bounds();

    let start = std::time::Instant::now();
    frame
        .pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, pixel) in row.iter_mut().enumerate() {
                let ray = scene.camera.ray_for_pixel(x as u32, y as u32);
                *pixel = if ray.intersects_aabb(&bounds).is_none() {
                    config.sky_color
                } else {
                    shade(scene, config, &cast_ray(scene, config, &ray))
                };
            }
        });

    log::info!(
        "Rendered {}x{} frame ({:?}, {:?}) in {:.1}ms",
        width,
        height,
        config.mode,
        config.traversal,
        start.elapsed().as_secs_f64() * 1000.0
    );

    frame
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::generation::generate_pillars;
    use crate::render::camera::RaycastingCamera;
    use crate::render::shading::{face_color, BLACK};
    use crate::raycast::{raycast, Side};
    use crate::voxel::GridHierarchy;

    fn pillars_scene() -> Scene {
        let grid = generate_pillars(64, 1.0).unwrap();
        let hierarchy = GridHierarchy::build(grid, 4).unwrap();
        let mut camera = RaycastingCamera::new(32, 18, 0.66);
        camera.position = Vec3::new(32.5, 48.0, 2.0);
        camera.look_at(Vec3::new(32.5, 0.0, 40.0));
        Scene::new(hierarchy, camera, Vec3::new(10.0, 200.0, 10.0))
    }

    #[test]
    fn test_frame_bytes() {
        let mut frame = Frame::new(3, 2);
        frame.pixels[4] = [1, 2, 3, 4];
        assert_eq!(frame.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(&frame.as_bytes()[16..20], &[1, 2, 3, 4]);
        assert_eq!(frame.pixel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(frame.pixel(3, 0), None);
    }

    #[test]
    fn test_render_faces() {
        let scene = pillars_scene();
        let frame = render_frame(&scene, &RenderConfig::default());
        assert_eq!(frame.pixels().len(), 32 * 18);

        // Looking down at the floor from above it: bottom rows see the top faces
        assert_eq!(frame.pixel(16, 17), Some(face_color(Side::NegY)));
        assert!(frame.pixels().iter().any(|&p| p == face_color(Side::NegY)));
    }

    #[test]
    fn test_sky_when_looking_away() {
        let mut scene = pillars_scene();
        scene.camera.set_rotation(0.0, 1.2);
        scene.camera.position = Vec3::new(32.0, 80.0, 32.0);
        let frame = render_frame(&scene, &RenderConfig::default());
        assert!(frame.pixels().iter().all(|&p| p == SKY));
    }

    #[test]
    fn test_traversals_match_finest_grid() {
        let mut scene = pillars_scene();
        scene.camera = RaycastingCamera::new(64, 36, 0.66);
        scene.camera.position = Vec3::new(32.5, 48.0, 2.0);
        scene.camera.look_at(Vec3::new(32.5, 0.0, 40.0));

        let recursive_config = RenderConfig::default();
        let mipmap_config = RenderConfig {
            traversal: Traversal::Mipmap,
            ..Default::default()
        };

        for y in 0..36 {
            for x in 0..64 {
                let ray = scene.camera.ray_for_pixel(x, y);
                let expected = raycast(scene.hierarchy.finest(), ray.origin, ray.direction);

                for config in [&recursive_config, &mipmap_config] {
                    let hit = cast_ray(&scene, config, &ray);
                    let at = format!("{:?} at ({}, {})", config.traversal, x, y);
                    assert_eq!(hit.is_hit(), expected.is_hit(), "{}", at);
                    if expected.is_hit() {
                        assert_eq!(hit.side, expected.side, "{}", at);
                        assert_eq!(hit.map_pos, expected.map_pos, "{}", at);
                    }
                }
            }
        }

        let recursive = render_frame(&scene, &recursive_config);
        let mipmap = render_frame(&scene, &mipmap_config);
        assert!(!recursive.pixels().contains(&BLACK));
        assert!(!mipmap.pixels().contains(&BLACK));
        assert_eq!(recursive, mipmap);
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        let scene = pillars_scene();
        render_frame(&scene, &RenderConfig::default()).save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (32, 18));
    }
}
