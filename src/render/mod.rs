//! CPU rendering: camera rays, shading and offscreen frames

pub mod camera;
pub mod shading;
pub mod frame;

pub use camera::RaycastingCamera;
pub use shading::{shade, ShadingMode};
pub use frame::{cast_ray, render_frame, Frame, RenderConfig, Traversal};
