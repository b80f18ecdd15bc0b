use glam::{Mat4, Vec3, Vec4};

/// Projection used by a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Orthographic box, `[left, right] × [bottom, top] × [near, far]`.
    Orthographic {
        /// Half extent along x and y.
        half_extent: f32,
        /// Near plane.
        znear: f32,
        /// Far plane.
        zfar: f32,
    },
    /// Perspective frustum.
    Perspective {
        /// Vertical field of view in degrees.
        fovy: f32,
        /// Near plane.
        znear: f32,
        /// Far plane.
        zfar: f32,
    },
}

/// Camera defined by eye position, look-at center and a projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub center: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Projection parameters.
    pub projection: Projection,
}

impl Camera {
    /// Camera at `eye` looking at `center` with +Y up.
    #[must_use]
    pub fn new(eye: Vec3, center: Vec3, projection: Projection) -> Self {
        Self {
            eye,
            center,
            up: Vec3::Y,
            aspect: 1.0,
            projection,
        }
    }

    /// World-to-view matrix.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    /// View-to-clip matrix. Both variants map depth to `[0, 1]`.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Orthographic {
                half_extent,
                znear,
                zfar,
            } => Mat4::orthographic_rh(
                -half_extent,
                half_extent,
                -half_extent,
                half_extent,
                znear,
                zfar,
            ),
            Projection::Perspective { fovy, znear, zfar } => {
                Mat4::perspective_rh(fovy.to_radians(), self.aspect, znear, zfar)
            }
        }
    }

    /// Update the aspect ratio after a resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Translate eye and center together by `delta`, given in view space
    /// (`-Z` is forward).
    pub fn move_local(&mut self, delta: Vec3) {
        let world = self.view().inverse() * Vec4::from((delta, 0.0));
        self.eye += world.truncate();
        self.center += world.truncate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ortho() -> Projection {
        Projection::Orthographic {
            half_extent: 2.0,
            znear: -1.0,
            zfar: 6.0,
        }
    }

    #[test]
    fn forward_moves_towards_center() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, ortho());
        camera.move_local(Vec3::new(0.0, 0.0, -0.1));
        assert!((camera.eye.z - 2.9).abs() < 1e-6);
        assert!((camera.center.z + 0.1).abs() < 1e-6);
    }

    #[test]
    fn strafe_keeps_view_direction() {
        let mut camera = Camera::new(Vec3::new(2.5, 0.5, 2.5), Vec3::ZERO, ortho());
        let before = (camera.center - camera.eye).normalize();
        camera.move_local(Vec3::new(0.1, 0.0, 0.0));
        let after = (camera.center - camera.eye).normalize();
        assert!(before.abs_diff_eq(after, 1e-6));
    }

    #[test]
    fn perspective_uses_aspect() {
        let mut camera = Camera::new(
            Vec3::Z * 3.0,
            Vec3::ZERO,
            Projection::Perspective {
                fovy: 65.0,
                znear: 0.1,
                zfar: 10.0,
            },
        );
        camera.resize(800, 600);
        assert!((camera.aspect - 4.0 / 3.0).abs() < 1e-6);
        camera.resize(800, 0);
        assert!((camera.aspect - 4.0 / 3.0).abs() < 1e-6);
        let proj = camera.projection_matrix();
        assert!((proj.x_axis.x * camera.aspect - proj.y_axis.y).abs() < 1e-5);
    }
}
