use glam::{IVec2, Vec2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::particle::ParticleSet;

/// Uniform spatial hash grid over a bounded rectangular domain.
///
/// Each particle is splatted into its own cell and the 8 surrounding
/// cells, so a single-bucket lookup already covers everything within one
/// cell radius. Buckets are cleared (capacity kept) and rebuilt every
/// frame; there is no cross-frame state.
pub struct SpatialHashGrid {
    cell_size: f32,
    half_columns: i32,
    half_rows: i32,
    rows: i32,
    /// Flat bucket arena indexed by the reduced cell hash.
    buckets: Vec<Vec<u32>>,
}

impl SpatialHashGrid {
    pub fn new(cell_size: f32, half_columns: i32, half_rows: i32) -> Self {
        let columns = half_columns * 2 + 1;
        let rows = half_rows * 2 + 1;
        Self {
            cell_size,
            half_columns,
            half_rows,
            rows,
            buckets: (0..columns * rows).map(|_| Vec::new()).collect(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn half_width(&self) -> f32 {
        self.cell_size * self.half_columns as f32
    }

    pub fn half_height(&self) -> f32 {
        self.cell_size * self.half_rows as f32
    }

    /// Integer cell coordinate of a position.
    #[inline]
    pub fn key_of(&self, pos: Vec2) -> IVec2 {
        IVec2::new(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Cell hash, reduced into the bucket table.
    ///
    /// `x + y * rows` is not a perfect hash: distinct cells outside the
    /// configured half extents can alias. Accepted approximation, valid
    /// only within the domain bounds; callers always re-filter by
    /// distance.
    #[inline]
    fn bucket_index(&self, x: i32, y: i32) -> usize {
        (x + y * self.rows).rem_euclid(self.buckets.len() as i32) as usize
    }

    /// Rebuild buckets and neighbour lists from current positions.
    /// Neighbour lists exclude the particle itself.
    pub fn update_neighbours(&mut self, particles: &mut ParticleSet, cutoff_sq: f32) {
        self.build_buckets(particles, false);
        self.finalize_neighbours(particles, cutoff_sq, false, false);
    }

    /// Rebuild buckets and neighbour lists from predicted positions.
    /// Neighbour lists include the particle itself.
    pub fn update_neighbours_predicted(&mut self, particles: &mut ParticleSet, cutoff_sq: f32) {
        self.build_buckets(particles, true);
        self.finalize_neighbours(particles, cutoff_sq, true, true);
    }

    /// Clear buckets, drop out-of-domain particles, then splat every
    /// remaining particle into its 3x3 cell block.
    fn build_buckets(&mut self, particles: &mut ParticleSet, use_predicted: bool) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }

        let removed = particles.retain_in_bounds(self.half_width(), self.half_height());
        if removed > 0 {
            log::debug!("removed {removed} particles outside the domain");
        }

        for i in 0..particles.count {
            let pos = if use_predicted {
                particles.predicted[i]
            } else {
                particles.position[i]
            };
            let key = self.key_of(pos);
            particles.grid_key[i] = key;

            for x in key.x - 1..=key.x + 1 {
                for y in key.y - 1..=key.y + 1 {
                    let bucket = self.bucket_index(x, y);
                    self.buckets[bucket].push(i as u32);
                }
            }
        }
    }

    /// Second, read-only pass: filter each particle's own bucket (which
    /// already holds the 3x3 splat) down to its neighbour list.
    fn finalize_neighbours(
        &self,
        particles: &mut ParticleSet,
        cutoff_sq: f32,
        use_predicted: bool,
        include_self: bool,
    ) {
        let count = particles.count;
        let ParticleSet {
            position,
            predicted,
            grid_key,
            neighbours,
            ..
        } = particles;
        let source: &[Vec2] = if use_predicted { predicted } else { position };
        let grid_key: &[IVec2] = grid_key;

        let fill = |i: usize, list: &mut Vec<u32>| {
            list.clear();
            let key = grid_key[i];
            let pos = source[i];
            for &j in &self.buckets[self.bucket_index(key.x, key.y)] {
                if !include_self && j as usize == i {
                    continue;
                }
                if (pos - source[j as usize]).length_squared() < cutoff_sq {
                    list.push(j);
                }
            }
        };

        #[cfg(feature = "parallel")]
        neighbours[..count]
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, list)| fill(i, list));

        #[cfg(not(feature = "parallel"))]
        for (i, list) in neighbours[..count].iter_mut().enumerate() {
            fill(i, list);
        }
    }

    /// Broad-phase query: the union of bucket contents for cells along the
    /// segment's rasterization, swept with one-cell offsets. The result
    /// may contain duplicates; callers filter by exact distance.
    pub fn query_segment(&self, start: Vec2, end: Vec2) -> Vec<u32> {
        let mut found = Vec::new();

        for sample in 0..3 {
            let mut dx = end.x - start.x;
            let mut dy = end.y - start.y;
            match sample {
                1 => {
                    dx += self.cell_size;
                    dy += self.cell_size;
                }
                2 => {
                    dx -= self.cell_size;
                    dy -= self.cell_size;
                }
                _ => {}
            }

            let start_cell = self.key_of(start);
            let end_cell = self.key_of(end);
            if start_cell == end_cell {
                found.extend(&self.buckets[self.bucket_index(start_cell.x, start_cell.y)]);
                return found;
            }

            let length = dx.abs().max(dy.abs());
            dx /= length;
            dy /= length;
            let mut x = start.x + 0.5 * sign(dx);
            let mut y = start.y + 0.5 * sign(dy);

            let mut travelled = 0.0;
            while travelled < length {
                let cell = self.key_of(Vec2::new(x, y));
                found.extend(&self.buckets[self.bucket_index(cell.x, cell.y)]);
                x += dx;
                y += dy;
                travelled += 1.0;
            }
        }

        found
    }
}

/// `sign(x)`: returns -1.0, 0.0, or 1.0.
#[inline]
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
