//! Uniform-grid spatial hash for fixed-radius neighbor queries.
//!
//! Particles are binned by their quantized cell coordinate
//! `floor(position / cell_size)`, hashed into a fixed power-of-two bucket
//! table. Storage is sorted-index + offset arrays rather than a map of
//! vectors, so a rebuild is a counting sort over reused allocations and a
//! query never allocates. The domain is unbounded: any finite position
//! hashes somewhere, and distinct cells sharing a bucket only add
//! candidates that the exact distance filter then discards.

use glam::Vec3;

/// Per-axis hash multipliers (Teschner et al. 2003).
const HASH_PRIME_X: u32 = 73_856_093;
const HASH_PRIME_Y: u32 = 19_349_663;
const HASH_PRIME_Z: u32 = 83_492_791;

/// Smallest bucket table used; tables grow (power of two) with particle
/// count and never shrink, so per-tick rebuilds reuse allocations.
const MIN_TABLE_SIZE: usize = 4096;

/// Hashed uniform grid, rebuilt from scratch each tick.
///
/// Cell size must be at least the largest smoothing radius in play so the
/// 27-cell (3x3x3) neighborhood of a particle's cell covers every possible
/// in-range neighbor.
#[derive(Debug)]
pub struct NeighborGrid {
    cell_size: f32,
    table_mask: u32,
    /// Bucket id per particle, parallel to the positions last built from.
    bucket_ids: Vec<u32>,
    /// Particle indices grouped by bucket.
    sorted_indices: Vec<u32>,
    /// Start offset in `sorted_indices` for each bucket.
    bucket_offsets: Vec<u32>,
    /// Number of particles in each bucket.
    bucket_counts: Vec<u32>,
    /// Scratch write cursors for the scatter phase, reused across builds.
    write_heads: Vec<u32>,
}

impl Default for NeighborGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl NeighborGrid {
    /// Create an empty grid. Allocation happens on the first [`build`].
    ///
    /// [`build`]: NeighborGrid::build
    pub fn new() -> Self {
        Self {
            cell_size: 0.0,
            table_mask: 0,
            bucket_ids: Vec::new(),
            sorted_indices: Vec::new(),
            bucket_offsets: Vec::new(),
            bucket_counts: Vec::new(),
            write_heads: Vec::new(),
        }
    }

    /// Cell size of the most recent build.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Quantized cell coordinate of a position.
    #[inline]
    fn cell_coord(&self, p: Vec3) -> (i32, i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
            (p.z / self.cell_size).floor() as i32,
        )
    }

    /// Bucket id for a cell coordinate.
    #[inline]
    fn hash_cell(&self, cx: i32, cy: i32, cz: i32) -> u32 {
        let h = (cx as u32).wrapping_mul(HASH_PRIME_X)
            ^ (cy as u32).wrapping_mul(HASH_PRIME_Y)
            ^ (cz as u32).wrapping_mul(HASH_PRIME_Z);
        h & self.table_mask
    }

    /// Rebuild the grid from current particle positions.
    ///
    /// `cell_size` is chosen by the caller as the largest smoothing radius
    /// across all registered parameter sets.
    pub fn build(&mut self, positions: &[Vec3], cell_size: f32) {
        assert!(cell_size > 0.0, "cell_size must be positive");
        self.cell_size = cell_size;
        let n = positions.len();

        // Grow-only table sized for low average occupancy.
        let table_size = self
            .bucket_counts
            .len()
            .max((2 * n).next_power_of_two())
            .max(MIN_TABLE_SIZE);
        self.table_mask = (table_size - 1) as u32;

        // --- 1. Hash each particle's cell ---
        self.bucket_ids.clear();
        self.bucket_ids.reserve(n);
        for &p in positions {
            let (cx, cy, cz) = self.cell_coord(p);
            self.bucket_ids.push(self.hash_cell(cx, cy, cz));
        }

        // --- 2. Count particles per bucket ---
        self.bucket_counts.clear();
        self.bucket_counts.resize(table_size, 0);
        for &b in &self.bucket_ids {
            self.bucket_counts[b as usize] += 1;
        }

        // --- 3. Prefix-sum to get bucket offsets ---
        self.bucket_offsets.clear();
        self.bucket_offsets.resize(table_size, 0);
        let mut running = 0u32;
        for c in 0..table_size {
            self.bucket_offsets[c] = running;
            running += self.bucket_counts[c];
        }

        // --- 4. Scatter particle indices into sorted order ---
        self.sorted_indices.resize(n, 0);
        self.write_heads.clear();
        self.write_heads.extend_from_slice(&self.bucket_offsets);
        for i in 0..n {
            let b = self.bucket_ids[i] as usize;
            let slot = self.write_heads[b] as usize;
            self.sorted_indices[slot] = i as u32;
            self.write_heads[b] += 1;
        }
    }

    /// Visit every neighbor of `particle_idx` within `radius`.
    ///
    /// Probes the 27 (3x3x3) cells around the particle's cell and invokes
    /// `f` with each neighbor index whose exact squared distance is within
    /// `radius * radius`. The query particle itself is skipped; callers
    /// that need a self term add it explicitly. `radius` must not exceed
    /// the cell size of the last build or in-range neighbors two cells
    /// away would be missed.
    pub fn for_each_neighbor<F>(
        &self,
        particle_idx: usize,
        positions: &[Vec3],
        radius: f32,
        mut f: F,
    ) where
        F: FnMut(usize),
    {
        if self.bucket_counts.is_empty() {
            return;
        }
        let p = positions[particle_idx];
        let (cx, cy, cz) = self.cell_coord(p);
        let radius_sq = radius * radius;

        // Distinct cells can hash to the same bucket; remember which
        // buckets were scanned so no candidate is yielded twice.
        let mut visited = [0u32; 27];
        let mut visited_len = 0;

        for dz in -1i32..=1 {
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let bucket = self.hash_cell(
                        cx.wrapping_add(dx),
                        cy.wrapping_add(dy),
                        cz.wrapping_add(dz),
                    );
                    if visited[..visited_len].contains(&bucket) {
                        continue;
                    }
                    visited[visited_len] = bucket;
                    visited_len += 1;

                    let start = self.bucket_offsets[bucket as usize] as usize;
                    let count = self.bucket_counts[bucket as usize] as usize;
                    for s in start..start + count {
                        let j = self.sorted_indices[s] as usize;
                        if j == particle_idx {
                            continue;
                        }
                        let d = p - positions[j];
                        if d.length_squared() <= radius_sq {
                            f(j);
                        }
                    }
                }
            }
        }
    }

    /// Collect the exact neighbor set of `particle_idx` within `radius`.
    ///
    /// Allocating convenience for tests and diagnostics; hot paths use
    /// [`for_each_neighbor`](NeighborGrid::for_each_neighbor).
    pub fn neighbors(&self, particle_idx: usize, positions: &[Vec3], radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_neighbor(particle_idx, positions, radius, |j| out.push(j));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random positions for brute-force comparison.
    fn scattered_positions(n: usize, extent: f32) -> Vec<Vec3> {
        let mut state = 0x2545_f491u64;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / (1u64 << 31) as f32 - 0.5) * 2.0 * extent
        };
        (0..n).map(|_| Vec3::new(next(), next(), next())).collect()
    }

    fn brute_force(i: usize, positions: &[Vec3], radius: f32) -> Vec<usize> {
        let r_sq = radius * radius;
        (0..positions.len())
            .filter(|&j| j != i && positions[i].distance_squared(positions[j]) <= r_sq)
            .collect()
    }

    #[test]
    fn single_particle_has_no_neighbors() {
        let mut grid = NeighborGrid::new();
        let positions = [Vec3::splat(0.5)];
        grid.build(&positions, 1.0);
        assert!(grid.neighbors(0, &positions, 1.0).is_empty());
    }

    #[test]
    fn query_before_build_is_empty() {
        let grid = NeighborGrid::new();
        let positions = [Vec3::ZERO];
        assert!(grid.neighbors(0, &positions, 1.0).is_empty());
    }

    #[test]
    fn two_close_particles_see_each_other() {
        let mut grid = NeighborGrid::new();
        let positions = [Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.51, 0.5, 0.5)];
        grid.build(&positions, 0.2);
        assert_eq!(grid.neighbors(0, &positions, 0.2), vec![1]);
        assert_eq!(grid.neighbors(1, &positions, 0.2), vec![0]);
    }

    #[test]
    fn far_particles_are_filtered() {
        let mut grid = NeighborGrid::new();
        let positions = [Vec3::splat(0.1), Vec3::splat(0.9)];
        grid.build(&positions, 0.2);
        assert!(grid.neighbors(0, &positions, 0.2).is_empty());
    }

    #[test]
    fn pairs_across_cell_boundaries_are_found() {
        let cell = 0.2;
        let mut grid = NeighborGrid::new();
        // Either side of a cell boundary, well within the radius.
        let positions = [Vec3::new(0.19, 0.5, 0.5), Vec3::new(0.21, 0.5, 0.5)];
        grid.build(&positions, cell);
        assert_eq!(grid.neighbors(0, &positions, cell), vec![1]);
    }

    #[test]
    fn negative_coordinates_quantize_correctly() {
        // floor() keeps cells distinct across the origin; a pair
        // straddling it must still be neighbors.
        let mut grid = NeighborGrid::new();
        let positions = [Vec3::new(-0.05, -0.05, -0.05), Vec3::new(0.05, 0.05, 0.05)];
        grid.build(&positions, 1.0);
        assert_eq!(grid.neighbors(0, &positions, 1.0), vec![1]);
    }

    #[test]
    fn coincident_particles_are_neighbors_but_not_self() {
        let mut grid = NeighborGrid::new();
        let positions = [Vec3::splat(2.0), Vec3::splat(2.0), Vec3::splat(2.0)];
        grid.build(&positions, 1.0);
        let mut n = grid.neighbors(1, &positions, 1.0);
        n.sort_unstable();
        assert_eq!(n, vec![0, 2]);
    }

    #[test]
    fn matches_brute_force_on_scattered_cloud() {
        let positions = scattered_positions(120, 3.0);
        let cell = 1.0;
        let mut grid = NeighborGrid::new();
        grid.build(&positions, cell);

        for radius in [0.5, 0.9, 1.0] {
            for i in 0..positions.len() {
                let mut got = grid.neighbors(i, &positions, radius);
                got.sort_unstable();
                let expected = brute_force(i, &positions, radius);
                assert_eq!(
                    got, expected,
                    "neighbor mismatch for particle {i} at radius {radius}"
                );
            }
        }
    }

    #[test]
    fn rebuild_tracks_moved_particles() {
        let mut grid = NeighborGrid::new();
        let mut positions = vec![Vec3::ZERO, Vec3::new(0.3, 0.0, 0.0)];
        grid.build(&positions, 1.0);
        assert_eq!(grid.neighbors(0, &positions, 1.0), vec![1]);

        positions[1] = Vec3::new(10.0, 0.0, 0.0);
        grid.build(&positions, 1.0);
        assert!(grid.neighbors(0, &positions, 1.0).is_empty());
    }

    #[test]
    fn build_on_empty_slice_is_fine() {
        let mut grid = NeighborGrid::new();
        grid.build(&[], 1.0);
        assert_eq!(grid.cell_size(), 1.0);
    }
}
