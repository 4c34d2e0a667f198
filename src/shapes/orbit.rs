use std::f32::consts::PI;

use glam::{EulerRot, Mat4, Vec3};
use rand::{
    distributions::{Distribution, Uniform},
    Rng,
};

/// Distance the whole orbit is pushed away from the viewer.
pub const ORBIT_DEPTH: f32 = 20.0;

/// Ranges the per-instance motion parameters are drawn from.
#[derive(Debug, Clone)]
pub struct MotionDistributions {
    /// Initial orbital angles.
    pub angle: Uniform<f32>,
    /// Spin rates (roll, pitch, yaw).
    pub spin: Uniform<f32>,
    /// Orbital rates (theta, phi, chi).
    pub orbit: Uniform<f32>,
    pub radius: Uniform<f32>,
}

impl Default for MotionDistributions {
    fn default() -> Self {
        Self {
            angle: Uniform::new(0.0, PI * 2.0),
            spin: Uniform::new(0.0, PI * 2.0),
            orbit: Uniform::new(0.0, PI * 0.3),
            radius: Uniform::new(6.0, 20.0),
        }
    }
}

/// A body spinning about its own axes while orbiting the origin.
///
/// Angles are integrated with `angle += rate * dt` and never wrapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitMotion {
    pub radius: f32,

    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub theta: f32,
    pub phi: f32,
    pub chi: f32,

    // radians per second
    pub droll: f32,
    pub dpitch: f32,
    pub dyaw: f32,
    pub dtheta: f32,
    pub dphi: f32,
    pub dchi: f32,
}

impl OrbitMotion {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, dists: &MotionDistributions) -> Self {
        // Sampling order is part of what a seed reproduces.
        let radius = dists.radius.sample(rng);
        let theta = dists.angle.sample(rng);
        let phi = dists.angle.sample(rng);
        let chi = dists.angle.sample(rng);
        let droll = dists.spin.sample(rng);
        let dpitch = dists.spin.sample(rng);
        let dyaw = dists.spin.sample(rng);
        let dtheta = dists.orbit.sample(rng);
        let dphi = dists.orbit.sample(rng);
        let dchi = dists.orbit.sample(rng);

        Self {
            radius,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            theta,
            phi,
            chi,
            droll,
            dpitch,
            dyaw,
            dtheta,
            dphi,
            dchi,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.roll += self.droll * dt;
        self.pitch += self.dpitch * dt;
        self.yaw += self.dyaw * dt;
        self.theta += self.dtheta * dt;
        self.phi += self.dphi * dt;
        self.chi += self.dchi * dt;
    }

    /// Spin in place, move out to the orbit radius, rotate around the origin,
    /// then push everything away from the viewer.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, ORBIT_DEPTH))
            * roll_pitch_yaw(self.theta, self.phi, self.chi)
            * Mat4::from_translation(Vec3::new(self.radius, 0.0, 0.0))
            * roll_pitch_yaw(self.pitch, self.yaw, self.roll)
    }
}

/// Rotation about Z by `roll`, then X by `pitch`, then Y by `yaw`.
fn roll_pitch_yaw(pitch: f32, yaw: f32, roll: f32) -> Mat4 {
    Mat4::from_euler(EulerRot::YXZ, yaw, pitch, roll)
}
