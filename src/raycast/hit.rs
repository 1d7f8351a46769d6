//! Hit face codes and ray hit results

use glam::{IVec3, Vec3};

/// Which face of a voxel a ray struck.
///
/// Named by the step that entered the voxel: `PosX` means the ray stepped
/// along +X, so it struck the voxel's -X face and the outward normal is -X.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
    /// The ray started inside an occupied voxel, no face was crossed
    Inside,
}

impl Side {
    /// The six real faces
    pub const FACES: [Side; 6] = [
        Side::PosX,
        Side::NegX,
        Side::PosY,
        Side::NegY,
        Side::PosZ,
        Side::NegZ,
    ];

    /// Side entered by stepping `step` (+1 or -1) along `axis` (0 = X, 1 = Y, 2 = Z)
    pub fn from_step(axis: usize, step: i32) -> Self {
        match (axis, step < 0) {
            (0, false) => Side::PosX,
            (0, true) => Side::NegX,
            (1, false) => Side::PosY,
            (1, true) => Side::NegY,
            (_, false) => Side::PosZ,
            (_, true) => Side::NegZ,
        }
    }

    /// Signed face code: axis number (1..=3) times step sign, 4 for `Inside`
    pub fn code(self) -> i32 {
        match self {
            Side::PosX => 1,
            Side::NegX => -1,
            Side::PosY => 2,
            Side::NegY => -2,
            Side::PosZ => 3,
            Side::NegZ => -3,
            Side::Inside => 4,
        }
    }

    /// Inverse of [`Side::code`]. 0 (no hit) and unknown codes give `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Side::PosX),
            -1 => Some(Side::NegX),
            2 => Some(Side::PosY),
            -2 => Some(Side::NegY),
            3 => Some(Side::PosZ),
            -3 => Some(Side::NegZ),
            4 => Some(Side::Inside),
            _ => None,
        }
    }

    /// Axis index crossed (0 = X, 1 = Y, 2 = Z), `None` for `Inside`
    pub fn axis(self) -> Option<usize> {
        match self {
            Side::PosX | Side::NegX => Some(0),
            Side::PosY | Side::NegY => Some(1),
            Side::PosZ | Side::NegZ => Some(2),
            Side::Inside => None,
        }
    }

    /// Step sign taken to enter the voxel, 0 for `Inside`
    pub fn step(self) -> i32 {
        self.code().signum() * i32::from(self != Side::Inside)
    }
}

/// Result of a raycast against a grid or hierarchy
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Face struck, `None` if nothing was hit
    pub side: Option<Side>,
    /// World-space position where the traversal stopped
    pub position: Vec3,
    /// Map coordinate where the traversal stopped, in the grid that produced it
    pub map_pos: IVec3,
    /// Hierarchy level that produced the result (0 = finest)
    pub level: usize,
}

impl RayHit {
    /// True if an occupied voxel was struck
    pub fn is_hit(&self) -> bool {
        self.side.is_some()
    }

    /// Signed face code, 0 when nothing was hit
    pub fn code(&self) -> i32 {
        self.side.map_or(0, Side::code)
    }
}
