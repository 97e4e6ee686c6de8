pub mod pointer;

use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::SimConfig;
use crate::particle::ParticleSet;
use pointer::PointerParams;

/// Apply gravity and pointer attraction to particle velocities (Clavet
/// external-force stage).
pub fn apply_external_forces(
    particles: &mut ParticleSet,
    cfg: &SimConfig,
    gravity_enabled: bool,
    pointer: &PointerParams,
    prev_pointer: Vec2,
    dt: f32,
) {
    let count = particles.count;
    let ParticleSet {
        position, velocity, ..
    } = particles;

    let kick = |pos: Vec2, vel: &mut Vec2| {
        if gravity_enabled {
            vel.y -= cfg.gravity * dt;
        }
        *vel += pointer::attract_impulse(pos, pointer, prev_pointer, cfg.gravity, cfg.attract_radius, dt);
    };

    #[cfg(feature = "parallel")]
    velocity[..count]
        .par_iter_mut()
        .zip(position[..count].par_iter())
        .for_each(|(vel, &pos)| kick(pos, vel));

    #[cfg(not(feature = "parallel"))]
    for (vel, &pos) in velocity[..count].iter_mut().zip(position[..count].iter()) {
        kick(pos, vel);
    }
}

/// Per-particle external acceleration for the PBF prediction step.
pub fn external_acceleration(
    pos: Vec2,
    cfg: &SimConfig,
    gravity_enabled: bool,
    pointer: &PointerParams,
) -> Vec2 {
    let mut acc = Vec2::ZERO;
    if gravity_enabled {
        acc.y -= cfg.gravity;
    }
    acc + pointer::attract_acceleration(pos, pointer, cfg.gravity, cfg.attract_radius)
}
