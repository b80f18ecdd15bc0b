//! Accumulated model rotation driven by mouse drags.

use glam::{Mat4, Vec3};

/// Default radians per pixel of drag.
pub const DEFAULT_SENSITIVITY: f32 = 0.01;

/// Rotates a model around the camera's current up and right axes.
///
/// Drag deltas are interpreted in camera space, so dragging right always
/// spins the model around the screen's vertical axis no matter how the
/// view is oriented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turntable {
    rotation: Mat4,
    drag_active: bool,
    sensitivity: f32,
}

impl Default for Turntable {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

impl Turntable {
    /// Identity rotation with the given sensitivity.
    #[must_use]
    pub fn new(sensitivity: f32) -> Self {
        Self {
            rotation: Mat4::IDENTITY,
            drag_active: false,
            sensitivity,
        }
    }

    /// Rotate by `phi` around the view's up axis, then by `theta` around
    /// its right axis. Both are scaled by the sensitivity.
    pub fn drag_by(&mut self, phi: f32, theta: f32, view: &Mat4) {
        let inverse = view.inverse();
        let y_axis = inverse.y_axis.truncate().normalize_or(Vec3::Y);
        let x_axis = inverse.x_axis.truncate().normalize_or(Vec3::X);

        self.rotation = Mat4::from_axis_angle(y_axis, phi * self.sensitivity) * self.rotation;
        self.rotation = Mat4::from_axis_angle(x_axis, theta * self.sensitivity) * self.rotation;
    }

    /// Accumulated rotation.
    #[must_use]
    pub fn rotation_matrix(&self) -> Mat4 {
        self.rotation
    }

    /// Replace the accumulated rotation.
    pub fn set_rotation_matrix(&mut self, rotation: Mat4) {
        self.rotation = rotation;
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    /// Start or end a drag.
    pub fn set_drag_active(&mut self, active: bool) {
        self.drag_active = active;
    }

    /// Radians per unit of drag.
    #[must_use]
    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Change the drag sensitivity.
    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn horizontal_drag_spins_around_view_up() {
        let mut turntable = Turntable::new(1.0);
        turntable.drag_by(FRAC_PI_2, 0.0, &Mat4::IDENTITY);
        let x = turntable.rotation_matrix().transform_vector3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn axes_follow_the_view() {
        // View rolled 90° about Z: the screen's up axis is world -X.
        let view = Mat4::from_rotation_z(FRAC_PI_2);
        let mut turntable = Turntable::new(1.0);
        turntable.drag_by(FRAC_PI_2, 0.0, &view);
        let up = view.inverse().y_axis.truncate();
        let moved = turntable.rotation_matrix().transform_vector3(up);
        assert!(moved.abs_diff_eq(up, 1e-6));
    }

    #[test]
    fn sensitivity_scales_drag() {
        let mut slow = Turntable::default();
        let mut fast = Turntable::new(1.0);
        slow.drag_by(100.0, 0.0, &Mat4::IDENTITY);
        fast.drag_by(1.0, 0.0, &Mat4::IDENTITY);
        assert!(slow
            .rotation_matrix()
            .abs_diff_eq(fast.rotation_matrix(), 1e-5));
        assert_eq!(slow.sensitivity(), DEFAULT_SENSITIVITY);
    }

    #[test]
    fn drag_flag_toggles() {
        let mut turntable = Turntable::default();
        assert!(!turntable.drag_active());
        turntable.set_drag_active(true);
        assert!(turntable.drag_active());
        turntable.set_rotation_matrix(Mat4::from_rotation_y(1.0));
        assert_ne!(turntable.rotation_matrix(), Mat4::IDENTITY);
    }
}
