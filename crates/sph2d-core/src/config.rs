/// Simulation tunables.
///
/// A config value is passed in at construction and mutated afterwards
/// only through [`crate::sim::Simulation::tune`]. The grid geometry
/// (`cell_size`, `half_columns`, `half_rows`) and `smoothing_radius` are
/// snapshotted at construction and ignored by later tuning.
#[derive(Clone, Copy, Debug)]
pub struct SimConfig {
    /// Upper bound on the Clavet integration timestep; incoming frame
    /// deltas are clamped to it.
    pub max_dt: f32,
    pub gravity: f32,
    /// Particle interaction radius (Clavet spike kernels).
    pub interaction_radius: f32,
    pub linear_viscosity: f32,
    pub quadratic_viscosity: f32,
    pub rest_density: f32,
    pub stiffness: f32,
    pub stiffness_near: f32,
    /// Smoothing radius for the PBF kernel library.
    pub smoothing_radius: f32,
    /// Lambda denominator relaxation (PBF).
    pub relaxation: f32,
    /// Jacobi iterations per PBF step.
    pub solver_iterations: u32,
    pub cell_size: f32,
    pub half_columns: i32,
    pub half_rows: i32,
    pub collision_radius: f32,
    /// Pointer attraction falloff radius.
    pub attract_radius: f32,
    /// Seconds between colour-mixing passes (Clavet, visual only).
    pub color_mix_interval: f32,
}

impl SimConfig {
    /// Defaults for the Clavet double-density-relaxation pipeline.
    pub fn clavet() -> Self {
        Self {
            max_dt: 1.0 / 60.0,
            gravity: 500.0,
            interaction_radius: 40.0,
            linear_viscosity: 0.001,
            quadratic_viscosity: 0.01,
            rest_density: 100.0,
            stiffness: 15.0,
            stiffness_near: 600.0,
            smoothing_radius: 20.0,
            relaxation: 1.1,
            solver_iterations: 3,
            cell_size: 20.0,
            half_columns: 1920 / 20 / 2,
            half_rows: 1080 / 20 / 2,
            collision_radius: 20.0,
            attract_radius: 150.0,
            color_mix_interval: 0.1,
        }
    }

    /// Defaults for the position-based-fluids pipeline. The grid cell
    /// size equals the smoothing radius.
    pub fn pbf() -> Self {
        Self {
            gravity: 400.0,
            rest_density: 0.00045,
            attract_radius: 200.0,
            ..Self::clavet()
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::clavet()
    }
}
