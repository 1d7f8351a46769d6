//! Pinhole camera that generates one primary ray per pixel

use glam::{EulerRot, Quat, Vec3};

use crate::math::Ray;

/// Steepest pitch allowed, just short of straight up or down
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Camera for CPU raycasting.
///
/// With zero yaw and pitch it looks along +Z with +Y up. The image plane is
/// one unit wide and sits `focal_length` in front of the eye, so a smaller
/// focal length gives a wider view.
#[derive(Clone, Debug)]
pub struct RaycastingCamera {
    /// World position
    pub position: Vec3,
    /// Rotation around +Y in radians
    yaw: f32,
    /// Rotation above the horizon in radians
    pitch: f32,
    /// Distance from the eye to the image plane
    pub focal_length: f32,
    width: u32,
    height: u32,
    rotation: Quat,
}

impl RaycastingCamera {
    pub fn new(width: u32, height: u32, focal_length: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            focal_length,
            width: width.max(1),
            height: height.max(1),
            rotation: Quat::IDENTITY,
        }
    }

    /// Image resolution in pixels
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Current (yaw, pitch) in radians
    pub fn angles(&self) -> (f32, f32) {
        (self.yaw, self.pitch)
    }

    /// Set absolute yaw and pitch; pitch is clamped short of the poles
    pub fn set_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, -self.pitch, 0.0);
    }

    /// Turn by the given yaw and pitch deltas
    pub fn rotate(&mut self, dyaw: f32, dpitch: f32) {
        self.set_rotation(self.yaw + dyaw, self.pitch + dpitch);
    }

    /// Point the camera at `target`
    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.set_rotation(dir.x.atan2(dir.z), dir.y.asin());
    }

    /// View direction
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Screen-right direction
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::NEG_X
    }

    /// Screen-up direction
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Walk relative to the view: `forward` and `right` move in the
    /// horizontal plane, `up` along world +Y
    pub fn move_by(&mut self, forward: f32, right: f32, up: f32) {
        let (sin, cos) = self.yaw.sin_cos();
        let flat_forward = Vec3::new(sin, 0.0, cos);
        let flat_right = Vec3::new(-cos, 0.0, sin);
        self.position += flat_forward * forward + flat_right * right + Vec3::Y * up;
    }

    /// Primary ray through the center of pixel (x, y), row 0 at the top
    pub fn ray_for_pixel(&self, x: u32, y: u32) -> Ray {
        let u = (x as f32 + 0.5) / self.width as f32 - 0.5;
        let v = (0.5 - (y as f32 + 0.5) / self.height as f32) / self.aspect();

        let dir = self.forward() * self.focal_length + self.right() * u + self.up() * v;
        Ray::new(self.position, dir)
    }
}

impl Default for RaycastingCamera {
    fn default() -> Self {
        Self::new(320, 180, 0.66)
    }
}
