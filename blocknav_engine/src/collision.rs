// Collision shapes and the precomputed voxel collision tables.
//
// A block state's collision shape is a small list of axis-aligned boxes in
// unit-block space (`[0,1]³`). The graph never intersects shapes at query
// time; instead `CollisionTables::build()` sweeps the bot's bounding box
// (half-width 0.3, 1.8 tall) along every movement line once at startup and
// records a boolean per (state × direction × body part [× side]):
//
// - diagonal table: does the state, sitting in the corner column on `side`
//   of a diagonal move, touch the swept box?
// - simple table: does the state, sitting in the target column of a move in
//   any of the eight directions, touch the box sweeping into that column?
//
// Both are flat `Box<[bool]>` arrays indexed by block-state id, so lookups
// are O(1) and the tables are freely shared across threads.
//
// See also: `block.rs` for the registry that owns the shapes,
// `constraint.rs` where `collides_at_edge` consults the diagonal table,
// `graph.rs` where the simple table refines target-edge free checks.
//
// **Critical constraint: immutability.** Tables are built once per registry
// and never mutated; rebuild them if the registry changes.

use crate::block::{BlockRegistry, BlockStateId};
use crate::types::{BodyPart, MovementDirection, MovementSide, Vec3i};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Horizontal half-extent of the bot's bounding box.
pub const BOT_HALF_WIDTH: f64 = 0.3;

/// Height of the bot's bounding box.
pub const BOT_HEIGHT: f64 = 1.8;

/// Fractions along the movement line where the swept box is sampled.
const SWEEP_SAMPLES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Touching faces do not count as a collision.
const EPSILON: f64 = 1e-7;

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Axis-aligned box in block-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    pub const FULL: Aabb = Aabb::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);

    pub const fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Strict overlap on all three axes.
    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| {
            self.min[axis] < other.max[axis] - EPSILON && self.max[axis] > other.min[axis] + EPSILON
        })
    }

    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> Aabb {
        Aabb::new(
            [self.min[0] + dx, self.min[1] + dy, self.min[2] + dz],
            [self.max[0] + dx, self.max[1] + dy, self.max[2] + dz],
        )
    }
}

/// The collision shape of one block state. Empty for air, fluids and
/// plants; a single `Aabb::FULL` for ordinary solid blocks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionShape(pub SmallVec<[Aabb; 2]>);

impl CollisionShape {
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    pub fn full() -> Self {
        Self::from_box(Aabb::FULL)
    }

    pub fn from_box(aabb: Aabb) -> Self {
        let mut boxes = SmallVec::new();
        boxes.push(aabb);
        Self(boxes)
    }

    pub fn boxes(&self) -> &[Aabb] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when a single box covers the whole unit cube.
    pub fn is_full_block(&self) -> bool {
        self.0.len() == 1 && self.0[0] == Aabb::FULL
    }

    /// True when some box spans the full top face (a slab in the upper
    /// half, a full block). Used to detect a bot standing inside a block.
    pub fn is_top_full(&self) -> bool {
        self.0.iter().any(|b| {
            b.min[0] <= EPSILON
                && b.min[2] <= EPSILON
                && b.max[0] >= 1.0 - EPSILON
                && b.max[2] >= 1.0 - EPSILON
                && b.max[1] >= 1.0 - EPSILON
        })
    }

    /// Highest point of the shape, 0 for empty shapes.
    pub fn max_y(&self) -> f64 {
        self.0.iter().map(|b| b.max[1]).fold(0.0, f64::max)
    }

    /// Does any box of this shape, placed at block-local origin
    /// `(ox, 0, oz)`, overlap `probe`?
    fn intersects_at(&self, ox: f64, oz: f64, probe: &Aabb) -> bool {
        self.0
            .iter()
            .any(|b| b.translated(ox, 0.0, oz).intersects(probe))
    }
}

// ---------------------------------------------------------------------------
// Sweep geometry
// ---------------------------------------------------------------------------

/// Vertical extent of `part` inside the block it occupies. The body only
/// reaches 0.8 into its block while standing; the head block is only
/// entered while jumping, so the whole block counts.
fn part_range(part: BodyPart) -> (f64, f64) {
    match part {
        BodyPart::Feet => (0.0, 1.0),
        BodyPart::Body => (0.0, BOT_HEIGHT - 1.0),
        BodyPart::Head => (0.0, 1.0),
    }
}

/// Does `shape`, placed in the column at `(cx, cz)` relative to the start
/// column, touch the bot box while it sweeps from the start column centre
/// towards the centre of the column at `(dx, dz)`?
fn sweep_collides(
    shape: &CollisionShape,
    (dx, dz): (i32, i32),
    (cx, cz): (i32, i32),
    part: BodyPart,
) -> bool {
    if shape.is_empty() {
        return false;
    }
    let (y_min, y_max) = part_range(part);
    SWEEP_SAMPLES.iter().any(|&t| {
        let px = 0.5 + t * f64::from(dx);
        let pz = 0.5 + t * f64::from(dz);
        let probe = Aabb::new(
            [px - BOT_HALF_WIDTH, y_min, pz - BOT_HALF_WIDTH],
            [px + BOT_HALF_WIDTH, y_max, pz + BOT_HALF_WIDTH],
        );
        shape.intersects_at(f64::from(cx), f64::from(cz), &probe)
    })
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

const DIAGONALS: usize = 4;
const DIRECTIONS: usize = MovementDirection::ALL.len();
const PARTS: usize = BodyPart::ALL.len();
const SIDES: usize = MovementSide::ALL.len();
const DIAGONAL_STRIDE: usize = DIAGONALS * PARTS * SIDES;
const SIMPLE_STRIDE: usize = DIRECTIONS * PARTS;

/// Precomputed per-state collision answers for the bot's swept box.
#[derive(Clone, Debug)]
pub struct CollisionTables {
    /// `[state][diagonal][part][side]`, flattened.
    diagonal: Box<[bool]>,
    /// `[state][direction][part]`, flattened.
    simple: Box<[bool]>,
    state_count: usize,
}

impl CollisionTables {
    /// Build both tables for every state in `registry`.
    pub fn build(registry: &BlockRegistry) -> Self {
        let state_count = registry.state_count();
        let mut diagonal = vec![false; state_count * DIAGONAL_STRIDE];
        let mut simple = vec![false; state_count * SIMPLE_STRIDE];

        for (state, data) in registry.states() {
            let shape = &data.shape;
            if shape.is_empty() {
                continue;
            }
            let base = state.0 as usize;

            for dir in MovementDirection::ALL {
                let delta = dir.delta();
                for part in BodyPart::ALL {
                    let idx = base * SIMPLE_STRIDE + dir.index() * PARTS + part.index();
                    simple[idx] = sweep_collides(shape, delta, delta, part);
                }

                let Some(diag) = dir.diagonal_index() else {
                    continue;
                };
                for side in MovementSide::ALL {
                    let Some(corner) = dir.corner(side) else {
                        continue;
                    };
                    let corner_pos = corner.offset(Vec3i::ZERO);
                    for part in BodyPart::ALL {
                        let idx = base * DIAGONAL_STRIDE
                            + diag * PARTS * SIDES
                            + part.index() * SIDES
                            + side.index();
                        diagonal[idx] =
                            sweep_collides(shape, delta, (corner_pos.x, corner_pos.z), part);
                    }
                }
            }
        }

        log::debug!(
            "Built collision tables for {state_count} block states ({} diagonal, {} simple entries)",
            diagonal.len(),
            simple.len()
        );

        Self {
            diagonal: diagonal.into_boxed_slice(),
            simple: simple.into_boxed_slice(),
            state_count,
        }
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Does `state` in the `side` corner column of the diagonal move `dir`
    /// touch `part` of the bot? Unknown states and straight directions
    /// answer `true`.
    pub fn collides_diagonal(
        &self,
        state: BlockStateId,
        dir: MovementDirection,
        part: BodyPart,
        side: MovementSide,
    ) -> bool {
        let Some(diag) = dir.diagonal_index() else {
            return true;
        };
        let idx = state.0 as usize * DIAGONAL_STRIDE
            + diag * PARTS * SIDES
            + part.index() * SIDES
            + side.index();
        self.diagonal.get(idx).copied().unwrap_or(true)
    }

    /// Does `state` in the target column of a move towards `dir` touch
    /// `part` of the bot on its way to the column centre? Unknown states
    /// answer `true`.
    pub fn collides_simple(
        &self,
        state: BlockStateId,
        dir: MovementDirection,
        part: BodyPart,
    ) -> bool {
        let idx = state.0 as usize * SIMPLE_STRIDE + dir.index() * PARTS + part.index();
        self.simple.get(idx).copied().unwrap_or(true)
    }
}
