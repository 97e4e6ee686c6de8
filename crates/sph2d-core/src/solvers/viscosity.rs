use glam::{Vec2, Vec4};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::particle::ParticleSet;

/// Any impulse component whose magnitude exceeds this is scaled down by
/// it (blow-up guard).
const IMPULSE_COMPONENT_LIMIT: f32 = 10_000.0;

/// Apply pairwise viscosity impulses to approaching neighbour pairs.
///
/// Each unordered pair is processed once, ordered by creation id, and
/// produces equal and opposite velocity impulses. The impulses are
/// computed in a read-only phase and applied in a second phase; each
/// side evaluates the pair from identical inputs, so the pairing stays
/// exact.
pub fn apply_viscosity(particles: &mut ParticleSet, linear: f32, quadratic: f32, dt: f32) {
    let count = particles.count;
    let ParticleSet {
        position,
        velocity,
        radius,
        neighbours,
        id,
        ..
    } = particles;
    let position: &[Vec2] = position;
    let radius: &[f32] = radius;
    let id: &[u64] = id;
    let neighbours: &[Vec<u32>] = neighbours;
    // Stage-entry velocities; the read phase never sees its own writes.
    let velocity_in: &[Vec2] = velocity;

    let received = move |i: usize| -> Vec2 {
        let mut delta = Vec2::ZERO;
        for &n in &neighbours[i] {
            let n = n as usize;
            // Evaluate the pair with the lower-id particle first.
            let (a, b) = if id[i] < id[n] { (i, n) } else { (n, i) };
            let impulse = pair_impulse(a, b, position, velocity_in, radius, linear, quadratic, dt);
            delta += if i == a { -impulse } else { impulse };
        }
        delta
    };

    #[cfg(feature = "parallel")]
    let deltas: Vec<Vec2> = (0..count).into_par_iter().map(received).collect();

    #[cfg(not(feature = "parallel"))]
    let deltas: Vec<Vec2> = (0..count).map(received).collect();

    for (vel, delta) in velocity[..count].iter_mut().zip(deltas) {
        *vel += delta;
    }
}

/// Impulse exchanged by the ordered pair `(a, b)`, as applied to `b`
/// (negated for `a`). Zero for separating or coincident pairs.
#[allow(clippy::too_many_arguments)]
fn pair_impulse(
    a: usize,
    b: usize,
    position: &[Vec2],
    velocity: &[Vec2],
    radius: &[f32],
    linear: f32,
    quadratic: f32,
    dt: f32,
) -> Vec2 {
    let v = position[b] - position[a];
    let length = v.length();
    if length == 0.0 {
        return Vec2::ZERO;
    }
    let vn = v / length;

    // Inward velocity component; only approaching pairs are damped.
    let u = (velocity[a] - velocity[b]).dot(vn);
    if u <= 0.0 {
        return Vec2::ZERO;
    }

    let q = 1.0 - length / radius[a];
    let mut impulse = 0.5 * dt * q * (linear * u + quadratic * u * u) * vn;
    if impulse.x.abs() > IMPULSE_COMPONENT_LIMIT {
        impulse.x /= IMPULSE_COMPONENT_LIMIT;
    }
    if impulse.y.abs() > IMPULSE_COMPONENT_LIMIT {
        impulse.y /= IMPULSE_COMPONENT_LIMIT;
    }
    impulse
}

/// Blend each particle's colour toward the average of itself and its
/// neighbours. Visual only; the driver runs this on a fixed cadence.
pub fn mix_colours(particles: &mut ParticleSet) {
    let count = particles.count;
    let ParticleSet {
        color, neighbours, ..
    } = particles;

    let mixed: Vec<Vec4> = (0..count)
        .map(|i| {
            let mut sum = color[i];
            for &n in &neighbours[i] {
                sum += color[n as usize];
            }
            let avg = sum / (neighbours[i].len() + 1) as f32;
            // Alpha stays density-derived, not mixed.
            Vec4::new(avg.x, avg.y, avg.z, color[i].w)
        })
        .collect();

    color[..count].copy_from_slice(&mixed);
}
