use glam::{Vec2, Vec4};
use sph2d_core::grid::SpatialHashGrid;
use sph2d_core::particle::ParticleSet;
use sph2d_core::solvers::{clavet, viscosity};

const DT: f32 = 1.0 / 60.0;
const CELL: f32 = 20.0;

fn grid() -> SpatialHashGrid {
    SpatialHashGrid::new(CELL, 48, 27)
}

fn pair(separation: f32, rest_density: f32) -> ParticleSet {
    let mut set = ParticleSet::new();
    set.spawn(Vec2::ZERO, rest_density, 40.0, Vec4::ONE);
    set.spawn(Vec2::new(separation, 0.0), rest_density, 40.0, Vec4::ONE);
    set
}

#[test]
fn test_viscosity_impulses_are_equal_and_opposite() {
    let mut particles = pair(10.0, 100.0);
    particles.velocity[0] = Vec2::new(5.0, 0.0);
    particles.velocity[1] = Vec2::new(-5.0, 0.0);

    let mut grid = grid();
    grid.update_neighbours(&mut particles, CELL * CELL);
    viscosity::apply_viscosity(&mut particles, 0.001, 0.01, DT);

    let dv0 = particles.velocity[0] - Vec2::new(5.0, 0.0);
    let dv1 = particles.velocity[1] - Vec2::new(-5.0, 0.0);

    assert!(dv0.x < 0.0, "approaching pair must be damped, got {dv0}");
    assert!(
        (dv0 + dv1).length() < 1e-6,
        "impulses must pair up exactly: {dv0} vs {dv1}"
    );
}

#[test]
fn test_viscosity_ignores_separating_pair() {
    let mut particles = pair(10.0, 100.0);
    particles.velocity[0] = Vec2::new(-5.0, 0.0);
    particles.velocity[1] = Vec2::new(5.0, 0.0);

    let mut grid = grid();
    grid.update_neighbours(&mut particles, CELL * CELL);
    viscosity::apply_viscosity(&mut particles, 0.001, 0.01, DT);

    assert_eq!(particles.velocity[0], Vec2::new(-5.0, 0.0));
    assert_eq!(particles.velocity[1], Vec2::new(5.0, 0.0));
}

#[test]
fn test_viscosity_survives_coincident_particles() {
    let mut particles = pair(0.0, 100.0);
    particles.velocity[0] = Vec2::new(1.0, 0.0);

    let mut grid = grid();
    grid.update_neighbours(&mut particles, CELL * CELL);
    viscosity::apply_viscosity(&mut particles, 0.001, 0.01, DT);

    assert!(particles.velocity[0].is_finite());
    assert!(particles.velocity[1].is_finite());
}

#[test]
fn test_relaxation_separates_overpressured_pair() {
    // Rest density 0 makes any sampled density an overpressure, so the
    // clamp band is not entered and the pair must be pushed apart.
    let mut particles = pair(10.0, 0.0);

    let mut grid = grid();
    grid.update_neighbours(&mut particles, CELL * CELL);
    clavet::double_density_relaxation(&mut particles, 15.0, 600.0, DT);

    let distance = (particles.position[1] - particles.position[0]).length();
    assert!(
        distance > 10.0,
        "overpressured pair should separate, distance = {distance}"
    );
    assert!(particles.pressure[0] > 0.0);
}

#[test]
fn test_relaxation_clamps_negative_pressure_sum() {
    // With the default rest density of 100 a lone pair samples far less
    // density than rest, putting the pressure sum below the guard band.
    let mut particles = pair(10.0, 100.0);

    let mut grid = grid();
    grid.update_neighbours(&mut particles, CELL * CELL);
    clavet::double_density_relaxation(&mut particles, 15.0, 600.0, DT);

    assert_eq!(particles.pressure[0], 0.0);
    assert_eq!(particles.pressure_near[0], 0.0);
    assert_eq!(particles.position[0], Vec2::ZERO, "clamped pair must not move");
    assert_eq!(particles.position[1], Vec2::new(10.0, 0.0));
}

#[test]
fn test_relaxation_records_density_samples() {
    let mut particles = pair(10.0, 100.0);

    let mut grid = grid();
    grid.update_neighbours(&mut particles, CELL * CELL);
    clavet::double_density_relaxation(&mut particles, 15.0, 600.0, DT);

    // q = 1 - 10/40 = 0.75 from the single neighbour.
    let expected = 0.75 * 0.75;
    assert!(
        (particles.density[0] - expected).abs() < 1e-5,
        "density = {}, expected {expected}",
        particles.density[0]
    );
    let expected_near = 0.75 * 0.75 * 0.75;
    assert!((particles.density_near[0] - expected_near).abs() < 1e-5);
}

#[test]
fn test_relaxation_skips_coincident_neighbours() {
    let mut particles = pair(0.0, 0.0);

    let mut grid = grid();
    grid.update_neighbours(&mut particles, CELL * CELL);
    clavet::double_density_relaxation(&mut particles, 15.0, 600.0, DT);

    assert!(particles.position[0].is_finite());
    assert!(particles.position[1].is_finite());
}
