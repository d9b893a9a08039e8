use std::collections::HashSet;
use std::fmt;

use glam::Vec3;

/// A 2D chunk coordinate in the world grid (ignoring the Y axis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world position: floor division of x and z by `chunk_size`.
    pub fn from_position(pos: Vec3, chunk_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_size).floor() as i32,
            z: (pos.z / chunk_size).floor() as i32,
        }
    }

    /// World-space origin of the chunk (`coord * chunk_size`, y = 0).
    pub fn origin(&self, chunk_size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * chunk_size, 0.0, self.z as f32 * chunk_size)
    }

    /// Chebyshev (square) distance in chunks.
    pub fn chebyshev(&self, other: ChunkCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// All chunks within a square radius of a center chunk, inclusive.
///
/// Coordinates saturate at the `i32` edge of the grid, so a window there holds
/// fewer than `(2r+1)^2` chunks.
pub fn window(center: ChunkCoord, radius: i32) -> HashSet<ChunkCoord> {
    let side = (2 * radius + 1).max(0) as usize;
    let mut result = HashSet::with_capacity(side * side);
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            result.insert(ChunkCoord::new(
                center.x.saturating_add(dx),
                center.z.saturating_add(dz),
            ));
        }
    }
    result
}

/// Chunks whose origin lies inside the square `[-size/2, size/2]` on x and z.
pub fn bounded_window(size: f32, chunk_size: f32) -> HashSet<ChunkCoord> {
    let half = size / 2.0;
    let lo = (-half / chunk_size).ceil() as i32;
    let hi = (half / chunk_size).floor() as i32;
    let mut result = HashSet::new();
    for x in lo..=hi {
        for z in lo..=hi {
            result.insert(ChunkCoord::new(x, z));
        }
    }
    result
}
