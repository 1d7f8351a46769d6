//! Per-pixel color from a raycast hit

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use super::frame::RenderConfig;
use crate::lighting::{diffuse_light_ambient, face_center};
use crate::raycast::{RayHit, Side};
use crate::scene::Scene;

pub type Rgba = [u8; 4];

pub const SKY: Rgba = [102, 191, 255, 255];
pub const BLACK: Rgba = [0, 0, 0, 255];
const BROWN: Rgba = [127, 106, 79, 255];
const DARK_BROWN: Rgba = [76, 63, 47, 255];
const GREEN: Rgba = [0, 228, 48, 255];

/// How hits are turned into colors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingMode {
    /// Flat color per face axis
    #[default]
    Faces,
    /// Face color scaled by the angle to the sun
    Diffuse,
    /// Diffuse, plus a second ray toward the sun for hard shadows
    Shadowed,
}

/// Flat color of a face: tops and bottoms green, sides brown
pub fn face_color(side: Side) -> Rgba {
    match side {
        Side::PosX | Side::NegX => BROWN,
        Side::PosY | Side::NegY => GREEN,
        Side::PosZ | Side::NegZ => DARK_BROWN,
        Side::Inside => BLACK,
    }
}

fn scale(color: Rgba, light: f32) -> Rgba {
    let light = light.clamp(0.0, 1.0);
    [
        (color[0] as f32 * light) as u8,
        (color[1] as f32 * light) as u8,
        (color[2] as f32 * light) as u8,
        color[3],
    ]
}

/// Color one pixel
pub fn shade(scene: &Scene, config: &RenderConfig, hit: &RayHit) -> Rgba {
    let Some(side) = hit.side else {
        return config.sky_color;
    };
    if side == Side::Inside {
        return BLACK;
    }

    let base = face_color(side);
    match config.mode {
        ShadingMode::Faces => base,
        ShadingMode::Diffuse => {
            let light_dir = (scene.sun - hit.position).normalize_or_zero();
            scale(base, diffuse_light_ambient(side, light_dir, config.ambient))
        }
        ShadingMode::Shadowed => {
            let light_dir = (scene.sun - hit.position).normalize_or_zero();
            if sun_visible(scene, config, hit, side) {
                scale(base, diffuse_light_ambient(side, light_dir, config.ambient))
            } else {
                scale(base, config.ambient)
            }
        }
    }
}

/// Cast from the sun toward the hit and check it lands on the same face.
///
/// With `face_center` set every pixel of a face tests the same point, so the
/// whole face is either lit or shadowed.
fn sun_visible(scene: &Scene, config: &RenderConfig, hit: &RayHit, side: Side) -> bool {
    let voxel_size = scene.hierarchy.levels()[hit.level].voxel_size();
    let target = if config.face_center {
        face_center(side, hit.position, hit.map_pos, voxel_size)
    } else {
        hit.position
    };

    let dir = (target - scene.sun).normalize_or_zero();
    if dir == Vec3::ZERO {
        return true;
    }

    let sun_hit = scene.hierarchy.raycast(scene.sun, dir);
    if !sun_hit.is_hit() {
        return true;
    }

    sun_hit.side == hit.side && same_cell(&sun_hit, hit)
}

/// Compare map positions across levels by shifting the finer one down
fn same_cell(a: &RayHit, b: &RayHit) -> bool {
    let shift = |p: IVec3, by: usize| IVec3::new(p.x >> by, p.y >> by, p.z >> by);
    if a.level <= b.level {
        shift(a.map_pos, b.level - a.level) == b.map_pos
    } else {
        shift(b.map_pos, a.level - b.level) == a.map_pos
    }
}
