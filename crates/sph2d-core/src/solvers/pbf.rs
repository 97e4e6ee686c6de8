use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::collision::{self, BoundaryLine};
use crate::config::SimConfig;
use crate::error::DivergedError;
use crate::forces;
use crate::forces::pointer::PointerParams;
use crate::kernels::Kernels;
use crate::particle::ParticleSet;

/// Predict positions from external forces and reset the per-frame solver
/// transients.
pub fn predict(
    particles: &mut ParticleSet,
    cfg: &SimConfig,
    gravity_enabled: bool,
    pointer: &PointerParams,
    dt: f32,
) {
    let count = particles.count;
    let ParticleSet {
        position,
        predicted,
        velocity,
        lambda,
        pressure_force,
        ..
    } = particles;

    for i in 0..count {
        velocity[i] += forces::external_acceleration(position[i], cfg, gravity_enabled, pointer) * dt;
        predicted[i] = position[i] + velocity[i] * dt;
        lambda[i] = 0.0;
        pressure_force[i] = Vec2::ZERO;
    }
}

/// Run the fixed-iteration Jacobi constraint solve on predicted
/// positions.
///
/// Each iteration: a lambda pass (read-only across the population), a
/// position-correction pass that also resolves line collisions against
/// the predicted position, and a population-wide apply of the
/// accumulated corrections. A non-finite lambda aborts the solve.
pub fn solve(
    particles: &mut ParticleSet,
    kernels: &Kernels,
    lines: &[BoundaryLine],
    cfg: &SimConfig,
    dt: f32,
) -> Result<(), DivergedError> {
    let radius_sq = kernels.radius() * kernels.radius();
    for _ in 0..cfg.solver_iterations {
        compute_lambdas(particles, kernels, cfg)?;
        compute_corrections(particles, kernels, lines, cfg, radius_sq, dt);
        apply_corrections(particles);
    }
    Ok(())
}

/// Recover velocities from the position change and commit predicted
/// positions.
pub fn finalize(particles: &mut ParticleSet, dt: f32) {
    let count = particles.count;
    let inv_dt = 1.0 / dt;
    let ParticleSet {
        position,
        predicted,
        velocity,
        ..
    } = particles;

    for i in 0..count {
        velocity[i] = (predicted[i] - position[i]) * inv_dt;
        position[i] = predicted[i];
    }
}

/// Lambda pass.
///
/// A particle's neighbour list includes itself by convention. The
/// constraint gradient splits into the "a neighbour moves" term (one
/// spiky gradient per neighbour) and the "this particle moves" term,
/// expanded over the particle's own neighbours when the self entry is
/// reached.
fn compute_lambdas(
    particles: &mut ParticleSet,
    kernels: &Kernels,
    cfg: &SimConfig,
) -> Result<(), DivergedError> {
    let count = particles.count;
    let ParticleSet {
        predicted,
        neighbours,
        rest_density,
        lambda,
        ..
    } = particles;
    let predicted: &[Vec2] = predicted;
    let neighbours: &[Vec<u32>] = neighbours;
    let rest_density: &[f32] = rest_density;

    let lambda_of = |i: usize| -> f32 {
        let pos_i = predicted[i];
        let inv_rest = 1.0 / rest_density[i];

        let mut density = 0.0_f32;
        let mut gradient = 0.0_f32;
        for &n in &neighbours[i] {
            let n = n as usize;
            density += kernels.poly6(pos_i, predicted[n]);

            if n != i {
                gradient += (-kernels.spiky_gradient(pos_i, predicted[n]) * inv_rest)
                    .length_squared();
            } else {
                for &nn in &neighbours[n] {
                    let nn = nn as usize;
                    if nn != n {
                        gradient += (kernels.spiky_gradient(predicted[n], predicted[nn])
                            * inv_rest)
                            .length_squared();
                    }
                }
            }
        }

        -(density * inv_rest - 1.0) / (gradient + cfg.relaxation)
    };

    #[cfg(feature = "parallel")]
    let computed: Vec<f32> = (0..count).into_par_iter().map(lambda_of).collect();

    #[cfg(not(feature = "parallel"))]
    let computed: Vec<f32> = (0..count).map(lambda_of).collect();

    for (slot, value) in lambda[..count].iter_mut().zip(computed) {
        if !value.is_finite() {
            return Err(DivergedError);
        }
        *slot = value;
    }
    Ok(())
}

/// Position-correction pass.
///
/// Corrections are computed read-only across the whole population, then
/// collisions adjust each particle's own predicted position. The
/// accumulated corrections are applied afterwards by
/// [`apply_corrections`], never interleaved.
fn compute_corrections(
    particles: &mut ParticleSet,
    kernels: &Kernels,
    lines: &[BoundaryLine],
    cfg: &SimConfig,
    radius_sq: f32,
    dt: f32,
) {
    let count = particles.count;
    let ParticleSet {
        predicted,
        delta,
        velocity,
        neighbours,
        lambda,
        rest_density,
        ..
    } = particles;

    {
        let predicted_in: &[Vec2] = predicted;
        let neighbours: &[Vec<u32>] = neighbours;
        let lambda: &[f32] = lambda;
        let rest_density: &[f32] = rest_density;

        let delta_of = |i: usize| -> Vec2 {
            let pos_i = predicted_in[i];
            let mut d = Vec2::ZERO;
            for &n in &neighbours[i] {
                let n = n as usize;
                if n != i {
                    d += (lambda[i] + lambda[n]) * kernels.spiky_gradient(pos_i, predicted_in[n]);
                }
            }
            d /= rest_density[i];

            // Explosion guard: a correction larger than the smoothing
            // radius is discarded for this iteration.
            if d.length_squared() > radius_sq {
                return Vec2::ZERO;
            }
            d
        };

        #[cfg(feature = "parallel")]
        {
            let computed: Vec<Vec2> = (0..count).into_par_iter().map(delta_of).collect();
            delta[..count].copy_from_slice(&computed);
        }

        #[cfg(not(feature = "parallel"))]
        for i in 0..count {
            delta[i] = delta_of(i);
        }
    }

    // Collisions write only the particle's own predicted position.
    #[cfg(feature = "parallel")]
    predicted[..count]
        .par_iter_mut()
        .zip(velocity[..count].par_iter())
        .for_each(|(pred, &vel)| {
            collision::resolve_collisions_predicted(pred, vel, lines, cfg.collision_radius, dt);
        });

    #[cfg(not(feature = "parallel"))]
    for i in 0..count {
        collision::resolve_collisions_predicted(
            &mut predicted[i],
            velocity[i],
            lines,
            cfg.collision_radius,
            dt,
        );
    }
}

fn apply_corrections(particles: &mut ParticleSet) {
    let count = particles.count;
    let ParticleSet {
        predicted, delta, ..
    } = particles;

    for (pred, d) in predicted[..count].iter_mut().zip(delta[..count].iter()) {
        *pred += *d;
    }
}
