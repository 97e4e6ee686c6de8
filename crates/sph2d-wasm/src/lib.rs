use glam::{Vec2, Vec4};
use wasm_bindgen::prelude::*;

use sph2d_core::collision::LineVertex;
use sph2d_core::particle::ParticleVertex;
use sph2d_core::{Simulation, SolverKind};

/// Browser-facing wrapper around the simulation.
///
/// Exposes flat `f32` buffers (particle position + colour vertices, two
/// vertices per boundary line) that the JS renderer reads directly from
/// wasm memory after each step.
#[wasm_bindgen]
pub struct FluidWorld {
    sim: Simulation,
    particle_buffer: Vec<ParticleVertex>,
    line_buffer: Vec<LineVertex>,
}

#[wasm_bindgen]
impl FluidWorld {
    #[wasm_bindgen(constructor)]
    pub fn new(use_pbf: bool) -> FluidWorld {
        let kind = if use_pbf {
            SolverKind::Pbf
        } else {
            SolverKind::Clavet
        };
        web_sys::console::log_1(&format!("WASM FluidWorld created: {kind:?} solver").into());

        let mut world = FluidWorld {
            sim: Simulation::new(kind),
            particle_buffer: Vec::new(),
            line_buffer: Vec::new(),
        };
        world.write_buffers();
        world
    }

    /// Step the simulation; returns the physics time in milliseconds.
    /// Throws if the solve diverged.
    #[wasm_bindgen]
    pub fn step(&mut self, dt: f32) -> Result<f32, JsError> {
        let start = js_sys::Date::now();
        self.sim
            .step(dt)
            .map_err(|err| JsError::new(&err.to_string()))?;
        self.write_buffers();
        Ok((js_sys::Date::now() - start) as f32)
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.sim.particle_count()
    }

    #[wasm_bindgen]
    pub fn particle_buffer_ptr(&self) -> *const f32 {
        bytemuck::cast_slice::<ParticleVertex, f32>(&self.particle_buffer).as_ptr()
    }

    #[wasm_bindgen]
    pub fn particle_buffer_byte_length(&self) -> usize {
        self.particle_buffer.len() * std::mem::size_of::<ParticleVertex>()
    }

    #[wasm_bindgen]
    pub fn line_buffer_ptr(&self) -> *const f32 {
        bytemuck::cast_slice::<LineVertex, f32>(&self.line_buffer).as_ptr()
    }

    #[wasm_bindgen]
    pub fn line_buffer_byte_length(&self) -> usize {
        self.line_buffer.len() * std::mem::size_of::<LineVertex>()
    }

    #[wasm_bindgen]
    pub fn set_pointer(&mut self, x: f32, y: f32, attract: bool) {
        self.sim.set_pointer(Vec2::new(x, y), attract);
    }

    #[wasm_bindgen]
    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.sim.set_gravity_enabled(enabled);
    }

    /// Spawn a 20x20 particle block with the default colour.
    #[wasm_bindgen]
    pub fn spawn_block(&mut self, x: f32, y: f32) {
        self.sim.spawn_block(Vec2::new(x, y), None);
        self.write_buffers();
    }

    /// Spawn a 20x20 particle block with an RGBA colour override.
    #[wasm_bindgen]
    pub fn spawn_block_colored(&mut self, x: f32, y: f32, r: f32, g: f32, b: f32, a: f32) {
        self.sim
            .spawn_block(Vec2::new(x, y), Some(Vec4::new(r, g, b, a)));
        self.write_buffers();
    }

    #[wasm_bindgen]
    pub fn clear_particles(&mut self) {
        self.sim.clear_particles();
        self.write_buffers();
    }

    #[wasm_bindgen]
    pub fn begin_line_draw(&mut self, x: f32, y: f32) {
        self.sim.begin_line_draw(Vec2::new(x, y));
        self.write_buffers();
    }

    #[wasm_bindgen]
    pub fn update_line_draw(&mut self, x: f32, y: f32) {
        self.sim.update_line_draw(Vec2::new(x, y));
        self.write_buffers();
    }

    #[wasm_bindgen]
    pub fn end_line_draw(&mut self) {
        self.sim.end_line_draw();
        self.write_buffers();
    }

    #[wasm_bindgen]
    pub fn remove_last_line(&mut self) {
        self.sim.remove_last_collision_line();
        self.write_buffers();
    }

    #[wasm_bindgen]
    pub fn add_collision_line(&mut self, start_x: f32, start_y: f32, end_x: f32, end_y: f32) {
        self.sim
            .add_collision_line(Vec2::new(start_x, start_y), Vec2::new(end_x, end_y));
        self.write_buffers();
    }

    #[wasm_bindgen]
    pub fn set_gravity(&mut self, gravity: f32) {
        self.sim.tune().gravity = gravity;
    }

    #[wasm_bindgen]
    pub fn set_clavet_config(
        &mut self,
        rest_density: f32,
        stiffness: f32,
        stiffness_near: f32,
        linear_viscosity: f32,
        quadratic_viscosity: f32,
    ) {
        let cfg = self.sim.tune();
        cfg.rest_density = rest_density;
        cfg.stiffness = stiffness;
        cfg.stiffness_near = stiffness_near;
        cfg.linear_viscosity = linear_viscosity;
        cfg.quadratic_viscosity = quadratic_viscosity;
    }

    #[wasm_bindgen]
    pub fn set_pbf_config(&mut self, rest_density: f32, relaxation: f32, solver_iterations: u32) {
        let cfg = self.sim.tune();
        cfg.rest_density = rest_density;
        cfg.relaxation = relaxation;
        cfg.solver_iterations = solver_iterations;
    }
}

impl FluidWorld {
    fn write_buffers(&mut self) {
        self.particle_buffer = self.sim.particle_vertices();
        self.line_buffer = self.sim.line_vertices();
    }
}
