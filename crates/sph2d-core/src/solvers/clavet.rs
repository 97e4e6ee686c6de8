use glam::Vec2;

use crate::particle::ParticleSet;

/// Pressure-sum guard band. Outside it both pressures are zeroed to stop
/// runaway densities from propagating NaN or infinity.
const PRESSURE_EPSILON: f32 = 1.0e-6;
const PRESSURE_CAP: f32 = 1.0e6;

/// One explicit double-density-relaxation pass.
///
/// Density and near-density are sampled with quadratic and cubic spike
/// kernels (`q = 1 - |sep| / radius`), converted to pressures against the
/// particle's rest density, and relieved by directly displacing
/// positions.
///
/// Each neighbour is displaced eagerly inside the loop; the particle's
/// own counter-displacement is accumulated and applied once after it.
/// Every pairwise interaction still produces equal and opposite pushes,
/// but changing the eager/deferred ordering changes solver behaviour, so
/// the pass runs sequentially over particles: later particles see
/// earlier displacements.
pub fn double_density_relaxation(
    particles: &mut ParticleSet,
    stiffness: f32,
    stiffness_near: f32,
    dt: f32,
) {
    let count = particles.count;
    let ParticleSet {
        position,
        neighbours,
        radius,
        rest_density,
        density,
        density_near,
        pressure,
        pressure_near,
        ..
    } = particles;

    for i in 0..count {
        let pos_i = position[i];
        let inv_radius = 1.0 / radius[i];

        // Sample neighbour density with the quadratic/cubic spikes.
        let mut rho = 0.0_f32;
        let mut rho_near = 0.0_f32;
        for &n in &neighbours[i] {
            let q = 1.0 - (position[n as usize] - pos_i).length() * inv_radius;
            rho += q * q;
            rho_near += q * q * q;
        }
        density[i] = rho;
        density_near[i] = rho_near;

        // A higher rest density raises the relaxation target and with it
        // the surface tension.
        let mut press = stiffness * (rho - rest_density[i]);
        let mut press_near = stiffness_near * rho_near;

        // Keep within a sensible range to avoid infinity/NaN.
        if press + press_near < PRESSURE_EPSILON || press + press_near > PRESSURE_CAP {
            press = 0.0;
            press_near = 0.0;
        }
        pressure[i] = press;
        pressure_near[i] = press_near;

        let mut dx = Vec2::ZERO;
        for &n in &neighbours[i] {
            let n = n as usize;
            let v = position[n] - pos_i;
            if v == Vec2::ZERO {
                continue;
            }
            let length = v.length();
            let q = 1.0 - length * inv_radius;
            let displacement = 0.5 * dt * dt * (press * q + press_near * q * q) * v / length;
            position[n] += displacement;
            dx -= displacement;
        }
        position[i] += dx;
    }
}
