use glam::{IVec2, Vec2, Vec4};

/// SoA particle storage.
///
/// Every per-particle attribute lives in its own column and all columns
/// are kept in lockstep by the spawn and removal paths. Slot indices are
/// only stable between mutations; `id` is the stable creation-order
/// identity, unique per store and immutable after creation.
pub struct ParticleSet {
    pub count: usize,
    pub position: Vec<Vec2>,
    /// Position at the start of the advance step (Clavet velocity recovery).
    pub position_prev: Vec<Vec2>,
    /// Predicted position for constraint solving (PBF).
    pub predicted: Vec<Vec2>,
    /// Accumulated position correction for the current iteration (PBF).
    pub delta: Vec<Vec2>,
    pub velocity: Vec<Vec2>,
    /// RGBA; the alpha channel carries the density-derived opacity.
    pub color: Vec<Vec4>,
    pub rest_density: Vec<f32>,
    /// Interaction radius; may vary per particle.
    pub radius: Vec<f32>,
    // Clavet relaxation transients, recomputed every frame.
    pub density: Vec<f32>,
    pub density_near: Vec<f32>,
    pub pressure: Vec<f32>,
    pub pressure_near: Vec<f32>,
    // PBF solver transients.
    /// Density-constraint Lagrange multiplier (lambda).
    pub lambda: Vec<f32>,
    pub pressure_force: Vec<Vec2>,
    /// Integer grid cell coordinate, recomputed every frame.
    pub grid_key: Vec<IVec2>,
    /// Neighbour slot indices, fully rebuilt every frame. The inner
    /// storage is reused across frames.
    pub neighbours: Vec<Vec<u32>>,
    /// Creation-order id.
    pub id: Vec<u64>,
    next_id: u64,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self {
            count: 0,
            position: Vec::new(),
            position_prev: Vec::new(),
            predicted: Vec::new(),
            delta: Vec::new(),
            velocity: Vec::new(),
            color: Vec::new(),
            rest_density: Vec::new(),
            radius: Vec::new(),
            density: Vec::new(),
            density_near: Vec::new(),
            pressure: Vec::new(),
            pressure_near: Vec::new(),
            lambda: Vec::new(),
            pressure_force: Vec::new(),
            grid_key: Vec::new(),
            neighbours: Vec::new(),
            id: Vec::new(),
            next_id: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append a particle at rest. Returns its creation-order id.
    pub fn spawn(&mut self, position: Vec2, rest_density: f32, radius: f32, color: Vec4) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.position.push(position);
        self.position_prev.push(position);
        self.predicted.push(position);
        self.delta.push(Vec2::ZERO);
        self.velocity.push(Vec2::ZERO);
        self.color.push(color);
        self.rest_density.push(rest_density);
        self.radius.push(radius);
        self.density.push(0.0);
        self.density_near.push(0.0);
        self.pressure.push(0.0);
        self.pressure_near.push(0.0);
        self.lambda.push(0.0);
        self.pressure_force.push(Vec2::ZERO);
        self.grid_key.push(IVec2::ZERO);
        self.neighbours.push(Vec::new());
        self.id.push(id);
        self.count += 1;

        id
    }

    /// Remove every particle. Id allocation is not reset.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Remove particles strictly outside the domain half-extents,
    /// preserving order. Positions exactly on a boundary are kept.
    /// Returns the number of removed particles.
    pub fn retain_in_bounds(&mut self, half_width: f32, half_height: f32) -> usize {
        let mut write = 0;
        for read in 0..self.count {
            let p = self.position[read];
            if p.x < -half_width || p.x > half_width || p.y < -half_height || p.y > half_height {
                continue;
            }
            if write != read {
                self.position[write] = self.position[read];
                self.position_prev[write] = self.position_prev[read];
                self.predicted[write] = self.predicted[read];
                self.delta[write] = self.delta[read];
                self.velocity[write] = self.velocity[read];
                self.color[write] = self.color[read];
                self.rest_density[write] = self.rest_density[read];
                self.radius[write] = self.radius[read];
                self.density[write] = self.density[read];
                self.density_near[write] = self.density_near[read];
                self.pressure[write] = self.pressure[read];
                self.pressure_near[write] = self.pressure_near[read];
                self.lambda[write] = self.lambda[read];
                self.pressure_force[write] = self.pressure_force[read];
                self.grid_key[write] = self.grid_key[read];
                self.neighbours.swap(write, read);
                self.id[write] = self.id[read];
            }
            write += 1;
        }
        let removed = self.count - write;
        self.truncate(write);
        removed
    }

    fn truncate(&mut self, len: usize) {
        self.position.truncate(len);
        self.position_prev.truncate(len);
        self.predicted.truncate(len);
        self.delta.truncate(len);
        self.velocity.truncate(len);
        self.color.truncate(len);
        self.rest_density.truncate(len);
        self.radius.truncate(len);
        self.density.truncate(len);
        self.density_near.truncate(len);
        self.pressure.truncate(len);
        self.pressure_near.truncate(len);
        self.lambda.truncate(len);
        self.pressure_force.truncate(len);
        self.grid_key.truncate(len);
        self.neighbours.truncate(len);
        self.id.truncate(len);
        self.count = len;
    }

    /// Flat position + colour vertices a renderer can upload directly.
    pub fn vertices(&self) -> Vec<ParticleVertex> {
        (0..self.count)
            .map(|i| ParticleVertex {
                position: self.position[i].to_array(),
                color: self.color[i].to_array(),
            })
            .collect()
    }
}

impl Default for ParticleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat particle vertex layout: 24 bytes, position then RGBA.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_assigns_monotonic_ids() {
        let mut set = ParticleSet::new();
        let a = set.spawn(Vec2::ZERO, 100.0, 40.0, Vec4::ONE);
        let b = set.spawn(Vec2::ONE, 100.0, 40.0, Vec4::ONE);
        set.clear();
        let c = set.spawn(Vec2::ZERO, 100.0, 40.0, Vec4::ONE);
        assert!(a < b && b < c, "ids must keep increasing: {a} {b} {c}");
        assert_eq!(set.count, 1);
    }

    #[test]
    fn test_retain_in_bounds_is_strict() {
        let mut set = ParticleSet::new();
        set.spawn(Vec2::new(960.0, 0.0), 100.0, 40.0, Vec4::ONE);
        set.spawn(Vec2::new(960.5, 0.0), 100.0, 40.0, Vec4::ONE);
        set.spawn(Vec2::new(0.0, -540.0), 100.0, 40.0, Vec4::ONE);
        set.spawn(Vec2::new(0.0, -540.5), 100.0, 40.0, Vec4::ONE);

        let removed = set.retain_in_bounds(960.0, 540.0);

        assert_eq!(removed, 2);
        assert_eq!(set.count, 2);
        assert_eq!(set.position[0], Vec2::new(960.0, 0.0));
        assert_eq!(set.position[1], Vec2::new(0.0, -540.0));
    }

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<ParticleVertex>(), 24);
        let verts = [ParticleVertex {
            position: [1.0, 2.0],
            color: [0.1, 0.2, 0.3, 1.0],
        }];
        let floats: &[f32] = bytemuck::cast_slice(&verts);
        assert_eq!(floats, &[1.0, 2.0, 0.1, 0.2, 0.3, 1.0]);
    }
}
