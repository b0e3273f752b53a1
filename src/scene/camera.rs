//! First-person perspective camera.
//!
//! The camera is part of the serializable scene model, so it stores plain
//! arrays and angles rather than graphics-library types; matrices are built
//! on demand with cgmath.

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

fn default_aspect() -> f32 {
    1.0
}

/// Perspective camera with a yaw/pitch orientation.
///
/// Aspect is derived from the viewport and recomputed on every resize, so it
/// is not part of the persisted projection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: [f32; 3],
    /// Rotation about +Y in radians; 0.0 looks down -Z.
    pub yaw: f32,
    /// Rotation towards +Y in radians, clamped well short of the poles.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    #[serde(skip, default = "default_aspect")]
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 50.0],
            yaw: 0.0,
            pitch: 0.0,
            fovy_deg: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            aspect: 1.0,
        }
    }
}

impl Camera {
    /// Unit vector the camera is looking along.
    pub fn forward(&self) -> Vector3<f32> {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vector3::new(-sy * cp, sp, -cy * cp).normalize()
    }

    /// Unit vector to the camera's right, parallel to the XZ plane.
    pub fn right(&self) -> Vector3<f32> {
        let (sy, cy) = self.yaw.sin_cos();
        Vector3::new(cy, 0.0, -sy)
    }

    /// Moves parallel to the XZ plane along the view direction, ignoring
    /// pitch, matching pointer-lock navigation.
    pub fn move_forward(&mut self, distance: f32) {
        let (sy, cy) = self.yaw.sin_cos();
        let flat = Vector3::new(-sy, 0.0, -cy);
        self.translate(flat * distance);
    }

    /// Strafes along the camera's local X axis.
    pub fn move_right(&mut self, distance: f32) {
        let right = self.right();
        self.translate(right * distance);
    }

    fn translate(&mut self, delta: Vector3<f32>) {
        self.position[0] += delta.x;
        self.position[1] += delta.y;
        self.position[2] += delta.z;
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::new(self.position[0], self.position[1], self.position[2]);
        let view = Matrix4::look_to_rh(eye, self.forward(), Vector3::unit_y());
        let proj = OPENGL_TO_WGPU_MATRIX
            * perspective(Deg(self.fovy_deg), self.aspect, self.znear, self.zfar);
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_projection_is_idempotent() {
        let mut once = Camera::default();
        once.resize_projection(1200, 800);
        let mut twice = Camera::default();
        twice.resize_projection(1200, 800);
        twice.resize_projection(1200, 800);
        assert_eq!(once, twice);
    }

    #[test]
    fn zero_height_resize_is_ignored() {
        let mut camera = Camera::default();
        camera.resize_projection(1200, 800);
        let before = camera.aspect;
        camera.resize_projection(1200, 0);
        assert_eq!(camera.aspect, before);
    }

    #[test]
    fn forward_at_zero_yaw_is_negative_z() {
        let mut camera = Camera::default();
        camera.move_forward(0.25);
        assert!((camera.position[2] - 49.75).abs() < 1e-5);
        assert!((camera.position[0]).abs() < 1e-6);
        assert!((camera.position[1]).abs() < 1e-6);
    }

    #[test]
    fn strafe_at_zero_yaw_is_along_x() {
        let mut camera = Camera::default();
        camera.move_right(-0.25);
        assert!((camera.position[0] + 0.25).abs() < 1e-5);
        assert!((camera.position[2] - 50.0).abs() < 1e-6);
    }

    #[test]
    fn forward_displacement_ignores_pitch() {
        let mut camera = Camera::default();
        camera.pitch = 0.8;
        camera.move_forward(1.0);
        // Movement stays in the XZ plane regardless of where we look.
        assert_eq!(camera.position[1], 0.0);
        assert!((camera.position[2] - 49.0).abs() < 1e-5);
    }
}
