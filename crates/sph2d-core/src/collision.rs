use glam::{Vec2, Vec4};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::particle::ParticleSet;

/// Damping applied to the reflected displacement of an approaching
/// contact (PBF variant).
const REFLECT_DAMPING: f32 = 0.8;

/// Outward push speed for a resting contact (PBF variant).
const RESTING_PUSH: f32 = 50.0;

/// A boundary segment.
///
/// Used both as cosmetic outline geometry and as collision geometry. A
/// line whose endpoints coincide is a degenerate "dot" and is never kept
/// as a collision primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryLine {
    pub start: Vec2,
    pub end: Vec2,
    pub color_start: Vec4,
    pub color_end: Vec4,
}

impl BoundaryLine {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self::with_color(start, end, Vec4::ONE)
    }

    pub fn with_color(start: Vec2, end: Vec2, color: Vec4) -> Self {
        Self {
            start,
            end,
            color_start: color,
            color_end: color,
        }
    }

    /// Segment direction vector (not normalized).
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        self.start == self.end
    }
}

/// Flat line vertex layout: 24 bytes, position then RGBA. Two vertices
/// per line.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Build the two render vertices for each line.
pub fn line_vertices(lines: &[BoundaryLine]) -> Vec<LineVertex> {
    let mut vertices = Vec::with_capacity(lines.len() * 2);
    for line in lines {
        vertices.push(LineVertex {
            position: line.start.to_array(),
            color: line.color_start.to_array(),
        });
        vertices.push(LineVertex {
            position: line.end.to_array(),
            color: line.color_end.to_array(),
        });
    }
    vertices
}

/// Push particles out of penetrated boundary segments (Clavet variant).
///
/// Quadratic-in-penetration repulsion along the segment's left normal,
/// applied directly to `position`. No velocity check: approaching and
/// resting contacts are treated alike.
pub fn resolve_collisions(
    particles: &mut ParticleSet,
    lines: &[BoundaryLine],
    collision_radius: f32,
    dt: f32,
) {
    let count = particles.count;
    let position = &mut particles.position;

    #[cfg(feature = "parallel")]
    position[..count]
        .par_iter_mut()
        .for_each(|pos| *pos = push_out(*pos, lines, collision_radius, dt));

    #[cfg(not(feature = "parallel"))]
    for pos in position[..count].iter_mut() {
        *pos = push_out(*pos, lines, collision_radius, dt);
    }
}

fn push_out(mut pos: Vec2, lines: &[BoundaryLine], collision_radius: f32, dt: f32) -> Vec2 {
    for line in lines {
        if line.is_dot() {
            continue;
        }
        let dir = line.direction();
        let f = (pos - line.start).dot(dir) / dir.length_squared();
        if !(0.0..=1.0).contains(&f) {
            continue;
        }
        let dist_sq = (f * dir - (pos - line.start)).length_squared();
        if dist_sq < collision_radius * collision_radius {
            let normal = dir.perp().normalize();
            let depth = collision_radius - dist_sq.sqrt();
            pos += normal * depth * depth * dt;
        }
    }
    pos
}

/// Push one predicted position out of penetrated boundary segments (PBF
/// variant).
///
/// An approaching contact (velocity component into the line) gets a
/// damped reflected displacement; a resting contact gets a small constant
/// outward push.
pub fn resolve_collisions_predicted(
    predicted: &mut Vec2,
    velocity: Vec2,
    lines: &[BoundaryLine],
    collision_radius: f32,
    dt: f32,
) {
    for line in lines {
        if line.is_dot() {
            continue;
        }
        let dir = line.direction();
        let to_particle = *predicted - line.start;
        let f = to_particle.dot(dir) / dir.length_squared();
        if f <= 0.0 || f >= 1.0 {
            continue;
        }
        let dist_sq = (f * dir - to_particle).length_squared();
        if dist_sq < collision_radius * collision_radius {
            let normal = dir.perp().normalize();
            if velocity.dot(dir.perp()) < 0.0 {
                let reflect = -2.0 * velocity.dot(normal) * normal;
                *predicted += reflect * REFLECT_DAMPING * dt;
            } else {
                *predicted += normal * RESTING_PUSH * dt;
            }
        }
    }
}
