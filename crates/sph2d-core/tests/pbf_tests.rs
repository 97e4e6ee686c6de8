use glam::{Vec2, Vec4};
use sph2d_core::config::SimConfig;
use sph2d_core::error::DivergedError;
use sph2d_core::grid::SpatialHashGrid;
use sph2d_core::kernels::Kernels;
use sph2d_core::particle::ParticleSet;
use sph2d_core::solvers::pbf;
use sph2d_core::{Simulation, SolverKind};

const DT: f32 = 1.0 / 60.0;

fn components() -> (SimConfig, Kernels, SpatialHashGrid) {
    let cfg = SimConfig::pbf();
    let kernels = Kernels::new(cfg.smoothing_radius);
    let grid = SpatialHashGrid::new(cfg.cell_size, cfg.half_columns, cfg.half_rows);
    (cfg, kernels, grid)
}

#[test]
fn test_lambda_for_isolated_particle() {
    let (cfg, kernels, mut grid) = components();
    let mut particles = ParticleSet::new();
    particles.spawn(Vec2::ZERO, cfg.rest_density, cfg.interaction_radius, Vec4::ONE);

    grid.update_neighbours_predicted(&mut particles, cfg.smoothing_radius * cfg.smoothing_radius);
    pbf::solve(&mut particles, &kernels, &[], &cfg, DT).expect("solve should not diverge");

    // Self density only: rho = poly6(0), gradient sum 0, so
    // lambda = -(rho / rho0 - 1) / relaxation.
    let rho = kernels.poly6(Vec2::ZERO, Vec2::ZERO);
    let expected = -(rho / cfg.rest_density - 1.0) / cfg.relaxation;
    assert!(
        (particles.lambda[0] - expected).abs() < expected.abs() * 1e-4,
        "lambda = {}, expected {expected}",
        particles.lambda[0]
    );
}

#[test]
fn test_coincident_particles_do_not_diverge() {
    let (cfg, kernels, mut grid) = components();
    let mut particles = ParticleSet::new();
    let p = Vec2::new(10.0, 10.0);
    particles.spawn(p, cfg.rest_density, cfg.interaction_radius, Vec4::ONE);
    particles.spawn(p, cfg.rest_density, cfg.interaction_radius, Vec4::ONE);

    grid.update_neighbours_predicted(&mut particles, cfg.smoothing_radius * cfg.smoothing_radius);
    let result = pbf::solve(&mut particles, &kernels, &[], &cfg, DT);

    assert!(
        result.is_ok(),
        "zero-separation gradients are guarded and must not raise the fatal condition"
    );
    assert!(particles.lambda[0].is_finite());
    assert!(particles.lambda[1].is_finite());
}

#[test]
fn test_zero_rest_density_diverges() {
    let mut sim = Simulation::new(SolverKind::Pbf);
    sim.tune().rest_density = 0.0;
    sim.spawn_particle(Vec2::ZERO, Vec4::ONE);

    assert_eq!(sim.step(DT), Err(DivergedError));
}

#[test]
fn test_dense_cluster_gets_pushed_apart() {
    let (cfg, kernels, mut grid) = components();
    let mut particles = ParticleSet::new();
    // A tight 3x3 cluster well above rest density.
    for i in 0..3 {
        for j in 0..3 {
            particles.spawn(
                Vec2::new(i as f32 * 2.0, j as f32 * 2.0),
                cfg.rest_density,
                cfg.interaction_radius,
                Vec4::ONE,
            );
        }
    }

    grid.update_neighbours_predicted(&mut particles, cfg.smoothing_radius * cfg.smoothing_radius);
    let spread_before: f32 = (0..particles.count)
        .map(|i| (particles.predicted[i] - Vec2::new(2.0, 2.0)).length())
        .sum();

    pbf::solve(&mut particles, &kernels, &[], &cfg, DT).expect("solve should not diverge");

    let spread_after: f32 = (0..particles.count)
        .map(|i| (particles.predicted[i] - Vec2::new(2.0, 2.0)).length())
        .sum();
    assert!(
        spread_after > spread_before,
        "compressed cluster should expand: {spread_before} -> {spread_after}"
    );
}

#[test]
fn test_finalize_recovers_velocity_from_position_change() {
    let (cfg, _, _) = components();
    let mut particles = ParticleSet::new();
    particles.spawn(Vec2::ZERO, cfg.rest_density, cfg.interaction_radius, Vec4::ONE);
    particles.predicted[0] = Vec2::new(1.0, -2.0);

    pbf::finalize(&mut particles, 0.5);

    assert_eq!(particles.velocity[0], Vec2::new(2.0, -4.0));
    assert_eq!(particles.position[0], Vec2::new(1.0, -2.0));
}

#[test]
fn test_zero_dt_step_is_a_no_op() {
    let mut sim = Simulation::new(SolverKind::Pbf);
    sim.spawn_block(Vec2::ZERO, None);
    let before = sim.positions();

    sim.step(0.0).expect("zero-dt step must not diverge");

    assert_eq!(sim.positions(), before);
}

#[test]
fn test_predict_applies_gravity_to_velocity() {
    let (cfg, _, _) = components();
    let mut particles = ParticleSet::new();
    particles.spawn(Vec2::ZERO, cfg.rest_density, cfg.interaction_radius, Vec4::ONE);

    pbf::predict(
        &mut particles,
        &cfg,
        true,
        &Default::default(),
        DT,
    );

    assert!(
        (particles.velocity[0].y + cfg.gravity * DT).abs() < 1e-4,
        "gravity must integrate into velocity, got {}",
        particles.velocity[0].y
    );
    let expected = particles.velocity[0] * DT;
    assert!((particles.predicted[0] - expected).length() < 1e-6);
}
