// World access seams and a dense in-memory block grid.
//
// The engine never owns the live world; it reads it through two small
// traits. `BlockAccessor` returns the block state at a position, with the
// convention that anything outside the loaded region reads as
// `BlockStateId::VOID_AIR`. `LevelHeightAccessor` answers whether a Y
// coordinate lies outside the dimension's build height, which is how a
// `VOID_AIR` read is told apart from "below bedrock / above the sky limit".
//
// `BlockGrid` is a dense box of block states stored as a flat `Vec`
// indexed by `x + z * size_x + y * size_x * size_z` relative to its origin.
// Reads outside the box return `VOID_AIR`; writes outside are no-ops. It
// backs tests, benchmarks and the scripted bot, and is a reasonable
// snapshot type for callers that copy a chunk neighborhood out of their
// own world representation.
//
// See also: `constraint.rs` for `is_out_of_level`, which combines the two
// traits, `graph.rs` for the per-query lazy fetch through `BlockAccessor`,
// `bot.rs` where a bot connection exposes its current level.
//
// **Critical constraint: snapshot semantics.** The graph assumes a block
// accessor returns the same answer for the same position within one
// query. Accessors over a live world must not be mutated concurrently with
// an expansion.

use crate::block::BlockStateId;
use crate::types::Vec3i;

// ---------------------------------------------------------------------------
// Accessor traits
// ---------------------------------------------------------------------------

/// Read access to block states.
pub trait BlockAccessor {
    /// Block state at `pos`; `VOID_AIR` outside the loaded region.
    fn block_state(&self, pos: Vec3i) -> BlockStateId;
}

/// Vertical limits of a dimension.
pub trait LevelHeightAccessor {
    fn min_build_height(&self) -> i32;

    /// Number of buildable layers above `min_build_height`.
    fn height(&self) -> i32;

    fn max_build_height(&self) -> i32 {
        self.min_build_height() + self.height()
    }

    fn is_outside_build_height(&self, y: i32) -> bool {
        y < self.min_build_height() || y >= self.max_build_height()
    }
}

impl<T: BlockAccessor + ?Sized> BlockAccessor for &T {
    fn block_state(&self, pos: Vec3i) -> BlockStateId {
        (**self).block_state(pos)
    }
}

/// Fixed build limits, e.g. the overworld's `-64..320`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildHeight {
    pub min_y: i32,
    pub height: i32,
}

impl BuildHeight {
    pub const OVERWORLD: BuildHeight = BuildHeight {
        min_y: -64,
        height: 384,
    };
}

impl LevelHeightAccessor for BuildHeight {
    fn min_build_height(&self) -> i32 {
        self.min_y
    }

    fn height(&self) -> i32 {
        self.height
    }
}

// ---------------------------------------------------------------------------
// Dense grid
// ---------------------------------------------------------------------------

/// Dense box of block states.
#[derive(Clone, Debug)]
pub struct BlockGrid {
    /// Flat storage: index = x + z * size_x + y * size_x * size_z.
    states: Vec<BlockStateId>,
    origin: Vec3i,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
    build_height: BuildHeight,
}

impl BlockGrid {
    /// A grid of air whose minimum corner is `origin`. The build height
    /// defaults to the overworld's.
    pub fn new(origin: Vec3i, size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = (size_x as usize) * (size_y as usize) * (size_z as usize);
        Self {
            states: vec![BlockStateId::AIR; total],
            origin,
            size_x,
            size_y,
            size_z,
            build_height: BuildHeight::OVERWORLD,
        }
    }

    pub fn with_build_height(mut self, build_height: BuildHeight) -> Self {
        self.build_height = build_height;
        self
    }

    pub fn origin(&self) -> Vec3i {
        self.origin
    }

    pub fn in_bounds(&self, pos: Vec3i) -> bool {
        self.index(pos).is_some()
    }

    fn index(&self, pos: Vec3i) -> Option<usize> {
        let local = pos.minus(self.origin);
        if local.x < 0
            || local.y < 0
            || local.z < 0
            || local.x as u32 >= self.size_x
            || local.y as u32 >= self.size_y
            || local.z as u32 >= self.size_z
        {
            return None;
        }
        let (x, y, z) = (local.x as usize, local.y as usize, local.z as usize);
        let sx = self.size_x as usize;
        let sz = self.size_z as usize;
        Some(x + z * sx + y * sx * sz)
    }

    /// State at `pos`; `VOID_AIR` outside the grid.
    pub fn get(&self, pos: Vec3i) -> BlockStateId {
        self.index(pos)
            .map_or(BlockStateId::VOID_AIR, |i| self.states[i])
    }

    /// Set the state at `pos`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: Vec3i, state: BlockStateId) {
        if let Some(i) = self.index(pos) {
            self.states[i] = state;
        }
    }

    /// Fill the inclusive box `min..=max` with `state`.
    pub fn fill(&mut self, min: Vec3i, max: Vec3i, state: BlockStateId) {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    self.set(Vec3i::new(x, y, z), state);
                }
            }
        }
    }

    /// Count of positions holding `state`.
    pub fn count(&self, state: BlockStateId) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }
}

impl BlockAccessor for BlockGrid {
    fn block_state(&self, pos: Vec3i) -> BlockStateId {
        self.get(pos)
    }
}

impl LevelHeightAccessor for BlockGrid {
    fn min_build_height(&self) -> i32 {
        self.build_height.min_y
    }

    fn height(&self) -> i32 {
        self.build_height.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_all_air() {
        let grid = BlockGrid::new(Vec3i::new(-2, 60, -2), 4, 4, 4);
        assert_eq!(grid.count(BlockStateId::AIR), 64);
        assert_eq!(grid.get(Vec3i::new(-2, 60, -2)), BlockStateId::AIR);
    }

    #[test]
    fn out_of_bounds_reads_void_air() {
        let grid = BlockGrid::new(Vec3i::ZERO, 2, 2, 2);
        assert_eq!(grid.get(Vec3i::new(2, 0, 0)), BlockStateId::VOID_AIR);
        assert_eq!(grid.get(Vec3i::new(0, -1, 0)), BlockStateId::VOID_AIR);
    }

    #[test]
    fn out_of_bounds_write_is_noop() {
        let mut grid = BlockGrid::new(Vec3i::ZERO, 2, 2, 2);
        grid.set(Vec3i::new(5, 5, 5), BlockStateId(7));
        assert_eq!(grid.count(BlockStateId(7)), 0);
    }

    #[test]
    fn set_get_and_fill_respect_origin() {
        let mut grid = BlockGrid::new(Vec3i::new(10, 0, 10), 3, 3, 3);
        grid.set(Vec3i::new(11, 1, 12), BlockStateId(5));
        assert_eq!(grid.get(Vec3i::new(11, 1, 12)), BlockStateId(5));
        grid.fill(Vec3i::new(10, 0, 10), Vec3i::new(12, 0, 12), BlockStateId(3));
        assert_eq!(grid.count(BlockStateId(3)), 9);
    }

    #[test]
    fn build_height_bounds() {
        let h = BuildHeight::OVERWORLD;
        assert!(!h.is_outside_build_height(-64));
        assert!(h.is_outside_build_height(-65));
        assert!(!h.is_outside_build_height(319));
        assert!(h.is_outside_build_height(320));
    }
}
