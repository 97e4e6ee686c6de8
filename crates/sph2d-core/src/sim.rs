use glam::{Vec2, Vec4};

use crate::collision::{self, BoundaryLine, LineVertex};
use crate::config::SimConfig;
use crate::error::DivergedError;
use crate::forces;
use crate::forces::pointer::PointerParams;
use crate::grid::SpatialHashGrid;
use crate::kernels::Kernels;
use crate::particle::{ParticleSet, ParticleVertex};
use crate::solvers::{clavet, pbf, viscosity, SolverKind};

/// Half edge length of a spawned block, in particles (20x20 total).
const BLOCK_HALF_EDGE: i32 = 10;
/// Spacing between spawned block particles.
const BLOCK_SPACING: f32 = 10.0;

const DEFAULT_COLOR: Vec4 = Vec4::ONE;
const OUTLINE_COLOR: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// Simulation driver.
///
/// Owns the particle store, the spatial hash grid, the kernel library and
/// both boundary line lists, and orchestrates the fixed per-frame
/// pipeline of the solver chosen at construction. A renderer integrates
/// purely through the command and snapshot methods.
pub struct Simulation {
    pub particles: ParticleSet,
    config: SimConfig,
    kind: SolverKind,
    grid: SpatialHashGrid,
    kernels: Kernels,
    /// Cosmetic outline geometry.
    lines: Vec<BoundaryLine>,
    /// Collision geometry, editable at runtime.
    collision_lines: Vec<BoundaryLine>,
    pointer: PointerParams,
    prev_pointer: Vec2,
    gravity_enabled: bool,
    drawing_line: bool,
    color_mix_accum: f32,
}

impl Simulation {
    /// Construct with the solver's default configuration.
    pub fn new(kind: SolverKind) -> Self {
        let config = match kind {
            SolverKind::Clavet => SimConfig::clavet(),
            SolverKind::Pbf => SimConfig::pbf(),
        };
        Self::with_config(kind, config)
    }

    /// Construct with an explicit configuration. Grid geometry and the
    /// kernel smoothing radius are snapshotted here.
    pub fn with_config(kind: SolverKind, config: SimConfig) -> Self {
        let grid = SpatialHashGrid::new(config.cell_size, config.half_columns, config.half_rows);
        let (hw, hh) = (grid.half_width(), grid.half_height());

        // Cosmetic outline of the domain rectangle.
        let lines = vec![
            BoundaryLine::with_color(Vec2::new(-hw, -hh), Vec2::new(hw, -hh), OUTLINE_COLOR),
            BoundaryLine::with_color(Vec2::new(hw, -hh), Vec2::new(hw, hh), OUTLINE_COLOR),
            BoundaryLine::with_color(Vec2::new(hw, hh), Vec2::new(-hw, hh), OUTLINE_COLOR),
            BoundaryLine::with_color(Vec2::new(-hw, hh), Vec2::new(-hw, -hh), OUTLINE_COLOR),
        ];

        log::debug!("simulation created: {kind:?} solver, domain {}x{}", hw * 2.0, hh * 2.0);

        Self {
            particles: ParticleSet::new(),
            kernels: Kernels::new(config.smoothing_radius),
            config,
            kind,
            grid,
            lines,
            collision_lines: Vec::new(),
            pointer: PointerParams::default(),
            prev_pointer: Vec2::ZERO,
            gravity_enabled: true,
            drawing_line: false,
            color_mix_accum: 0.0,
        }
    }

    // ------------------------------------------------------------------
    // Per-frame pipeline
    // ------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    ///
    /// An `Err` means the solve diverged; the frame's output must not be
    /// used and the caller decides whether to reset or abort.
    pub fn step(&mut self, dt: f32) -> Result<(), DivergedError> {
        match self.kind {
            SolverKind::Clavet => {
                self.step_clavet(dt);
                Ok(())
            }
            SolverKind::Pbf => self.step_pbf(dt),
        }
    }

    fn step_clavet(&mut self, dt: f32) {
        let dt = dt.min(self.config.max_dt);
        if dt < 1.0e-9 || self.particles.is_empty() {
            return;
        }
        let cfg = self.config;

        forces::apply_external_forces(
            &mut self.particles,
            &cfg,
            self.gravity_enabled,
            &self.pointer,
            self.prev_pointer,
            dt,
        );
        self.prev_pointer = self.pointer.position;

        // Viscosity runs on the previous frame's neighbour lists, before
        // positions move.
        viscosity::apply_viscosity(&mut self.particles, cfg.linear_viscosity, cfg.quadratic_viscosity, dt);
        self.color_mix_accum += dt;
        if self.color_mix_accum >= cfg.color_mix_interval {
            self.color_mix_accum = 0.0;
            viscosity::mix_colours(&mut self.particles);
        }

        self.advance(dt);
        self.grid
            .update_neighbours(&mut self.particles, cfg.cell_size * cfg.cell_size);
        clavet::double_density_relaxation(&mut self.particles, cfg.stiffness, cfg.stiffness_near, dt);
        collision::resolve_collisions(&mut self.particles, &self.collision_lines, cfg.collision_radius, dt);
        self.update_velocity(dt);
        self.update_colors();
    }

    fn step_pbf(&mut self, dt: f32) -> Result<(), DivergedError> {
        if dt.abs() < 1.0e-9 {
            return Ok(());
        }
        let cfg = self.config;

        pbf::predict(&mut self.particles, &cfg, self.gravity_enabled, &self.pointer, dt);
        self.prev_pointer = self.pointer.position;

        self.grid.update_neighbours_predicted(
            &mut self.particles,
            cfg.smoothing_radius * cfg.smoothing_radius,
        );

        if let Err(err) = pbf::solve(&mut self.particles, &self.kernels, &self.collision_lines, &cfg, dt) {
            log::warn!("aborting step: {err}");
            return Err(err);
        }

        pbf::finalize(&mut self.particles, dt);
        Ok(())
    }

    /// Prediction-relaxation position advance, then strict domain-exit
    /// removal.
    fn advance(&mut self, dt: f32) {
        let count = self.particles.count;
        let ParticleSet {
            position,
            position_prev,
            velocity,
            ..
        } = &mut self.particles;

        for i in 0..count {
            position_prev[i] = position[i];
            position[i] += velocity[i] * dt;
        }

        let removed = self
            .particles
            .retain_in_bounds(self.grid.half_width(), self.grid.half_height());
        if removed > 0 {
            log::debug!("removed {removed} particles leaving the domain");
        }
    }

    fn update_velocity(&mut self, dt: f32) {
        let count = self.particles.count;
        let inv_dt = 1.0 / dt;
        let ParticleSet {
            position,
            position_prev,
            velocity,
            ..
        } = &mut self.particles;

        for i in 0..count {
            velocity[i] = (position[i] - position_prev[i]) * inv_dt;
        }
    }

    /// Density-derived opacity.
    fn update_colors(&mut self) {
        for i in 0..self.particles.count {
            let rho = self.particles.density[i];
            self.particles.color[i].w = if rho > 0.0 { 1.0 - 1.0 / rho } else { 0.0 };
        }
    }

    // ------------------------------------------------------------------
    // External stimulus
    // ------------------------------------------------------------------

    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Pointer world position and attract button state for the coming
    /// frames.
    pub fn set_pointer(&mut self, position: Vec2, attract: bool) {
        self.pointer = PointerParams { position, attract };
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    /// Spawn one particle with the configured rest density and
    /// interaction radius. Returns its creation-order id.
    pub fn spawn_particle(&mut self, position: Vec2, color: Vec4) -> u64 {
        self.particles.spawn(
            position,
            self.config.rest_density,
            self.config.interaction_radius,
            color,
        )
    }

    /// Spawn a 20x20 block of particles centred on `center` at 10-unit
    /// spacing.
    pub fn spawn_block(&mut self, center: Vec2, color_override: Option<Vec4>) {
        let color = color_override.unwrap_or(DEFAULT_COLOR);
        for i in -BLOCK_HALF_EDGE..BLOCK_HALF_EDGE {
            for j in -BLOCK_HALF_EDGE..BLOCK_HALF_EDGE {
                let offset = Vec2::new(i as f32, j as f32) * BLOCK_SPACING;
                self.spawn_particle(center + offset, color);
            }
        }
        log::debug!("spawned {} particles at {center}", (2 * BLOCK_HALF_EDGE).pow(2));
    }

    pub fn clear_particles(&mut self) {
        self.particles.clear();
    }

    // ------------------------------------------------------------------
    // Boundary lines
    // ------------------------------------------------------------------

    /// Add a cosmetic line (no collision response).
    pub fn add_line(&mut self, start: Vec2, end: Vec2, color: Vec4) {
        self.lines.push(BoundaryLine::with_color(start, end, color));
    }

    /// Add a collision line. Degenerate dots are silently discarded.
    pub fn add_collision_line(&mut self, start: Vec2, end: Vec2) {
        let line = BoundaryLine::new(start, end);
        if !line.is_dot() {
            self.collision_lines.push(line);
        }
    }

    /// Start drawing a collision line at `position`. An unfinished draw
    /// is committed first.
    pub fn begin_line_draw(&mut self, position: Vec2) {
        if self.drawing_line {
            self.end_line_draw();
        }
        self.collision_lines.push(BoundaryLine::new(position, position));
        self.drawing_line = true;
    }

    /// Move the end point of the line being drawn.
    pub fn update_line_draw(&mut self, position: Vec2) {
        if self.drawing_line {
            if let Some(line) = self.collision_lines.last_mut() {
                line.end = position;
            }
        }
    }

    /// Commit the line being drawn, silently discarding a degenerate dot.
    pub fn end_line_draw(&mut self) {
        if self.drawing_line {
            if self.collision_lines.last().is_some_and(|line| line.is_dot()) {
                self.collision_lines.pop();
            }
            self.drawing_line = false;
        }
    }

    pub fn remove_last_collision_line(&mut self) {
        self.collision_lines.pop();
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn particle_count(&self) -> usize {
        self.particles.count
    }

    /// Current particle positions, in store order.
    pub fn positions(&self) -> Vec<Vec2> {
        self.particles.position[..self.particles.count].to_vec()
    }

    /// Current particle colours, parallel to [`Self::positions`].
    pub fn colors(&self) -> Vec<Vec4> {
        self.particles.color[..self.particles.count].to_vec()
    }

    /// Cosmetic and collision lines combined, in render order.
    pub fn lines(&self) -> Vec<BoundaryLine> {
        let mut all = self.lines.clone();
        all.extend_from_slice(&self.collision_lines);
        all
    }

    pub fn collision_line_count(&self) -> usize {
        self.collision_lines.len()
    }

    /// Flat particle vertex buffer for a renderer.
    pub fn particle_vertices(&self) -> Vec<ParticleVertex> {
        self.particles.vertices()
    }

    /// Flat line vertex buffer for a renderer (two vertices per line).
    pub fn line_vertices(&self) -> Vec<LineVertex> {
        collision::line_vertices(&self.lines())
    }

    /// Domain half extents `(half_width, half_height)`.
    pub fn domain_half_extents(&self) -> Vec2 {
        Vec2::new(self.grid.half_width(), self.grid.half_height())
    }

    pub fn solver_kind(&self) -> SolverKind {
        self.kind
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Mutable access to the tunables, the only mutation path after
    /// construction. Grid geometry and the kernel smoothing radius were
    /// snapshotted at construction and are not re-read.
    pub fn tune(&mut self) -> &mut SimConfig {
        &mut self.config
    }
}
