use glam::Mat4;

/// Left-handed perspective projection described by the size of the view plane
/// at the near clip distance. Depth maps to 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub view_width: f32,
    pub view_height: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            view_width: 1.0,
            view_height: 0.75,
            near: 0.5,
            far: 40.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        let fov_y = 2.0 * (self.view_height / (2.0 * self.near)).atan();
        Mat4::perspective_lh(fov_y, self.view_width / self.view_height, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::*;

    #[test]
    fn matches_view_plane_perspective() {
        let p = Projection::default();
        let range = p.far / (p.far - p.near);
        let expected = Mat4::from_cols(
            Vec4::new(2.0 * p.near / p.view_width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * p.near / p.view_height, 0.0, 0.0),
            Vec4::new(0.0, 0.0, range, 1.0),
            Vec4::new(0.0, 0.0, -range * p.near, 0.0),
        );
        assert!(p.matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn clip_planes_map_to_unit_depth() {
        let m = Projection::default().matrix();
        let near = m.project_point3(Vec3::new(0.0, 0.0, 0.5));
        let far = m.project_point3(Vec3::new(0.0, 0.0, 40.0));
        assert!((near.z - 0.0).abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
    }
}
