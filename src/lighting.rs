//! Face normals and simple diffuse lighting for raycast hits
//!
//! Light directions point from the surface toward the light.

use glam::{IVec3, Vec3};

use crate::raycast::Side;

/// Outward surface normal of the struck face.
///
/// The normal opposes the step that entered the voxel. `Inside` has no face
/// and gives the zero vector.
pub fn hit_normal(side: Side) -> Vec3 {
    match side {
        Side::PosX => Vec3::NEG_X,
        Side::NegX => Vec3::X,
        Side::PosY => Vec3::NEG_Y,
        Side::NegY => Vec3::Y,
        Side::PosZ => Vec3::NEG_Z,
        Side::NegZ => Vec3::Z,
        Side::Inside => Vec3::ZERO,
    }
}

/// Snap a hit point to the center of the struck face.
///
/// The hit axis keeps the exact hit coordinate; the two other axes move to
/// the center of voxel `map_pos`. Sampling one point per face avoids shadow
/// acne when lighting is not computed per pixel. `Inside` returns `hit_pos`.
pub fn face_center(side: Side, hit_pos: Vec3, map_pos: IVec3, voxel_size: f32) -> Vec3 {
    let Some(axis) = side.axis() else {
        return hit_pos;
    };

    let mut center = (map_pos.as_vec3() + Vec3::splat(0.5)) * voxel_size;
    center[axis] = hit_pos[axis];
    center
}

/// Lambert term of the struck face, in `[0, 1]`
pub fn diffuse_light(side: Side, light_dir: Vec3) -> f32 {
    hit_normal(side).dot(light_dir).clamp(0.0, 1.0)
}

/// Diffuse term remapped to `[ambient, 1]` so unlit faces keep some light
pub fn diffuse_light_ambient(side: Side, light_dir: Vec3, ambient: f32) -> f32 {
    let ambient = ambient.clamp(0.0, 1.0);
    ambient + (1.0 - ambient) * diffuse_light(side, light_dir)
}
