// Path constraint: the policy surface the graph consults per query.
//
// `PathConstraint` is a stateless strategy object. The graph never decides
// on its own whether a block may be broken, a position built on, or a
// diagonal squeezed through; it asks the constraint. Tests substitute
// permissive or restrictive implementations without touching the graph,
// and callers layer their own rules (protected regions, no-dig zones) the
// same way.
//
// `DefaultPathConstraint` is the stock policy, configured from `NavConfig`:
// - items: placeable means "places a full, stable, harmless block", tools
//   are anything with a tool spec;
// - out of level: a `VOID_AIR` read inside build height (the chunk is not
//   loaded yet); below or above build height is merely empty;
// - breaking: only inside build height, only diggable types unless
//   `allow_breaking_undiggable`, never types listed in `avoid_breaking`;
// - diagonal squeeze: backed by the collision tables, or any non-empty
//   shape when squeezing is disabled;
// - `modify_as_needed`: adds a proximity penalty near hostile entities.
//
// See also: `graph.rs` for every call site, `collision.rs` for the diagonal
// table behind `collides_at_edge`, `config.rs` for the switches.
//
// **Critical constraint: purity.** Answers must depend only on the
// arguments and the constraint's own immutable fields; graph queries are
// issued concurrently and repeated after recalculation.

use crate::block::{BlockRegistry, BlockStateId, BlockTypeId};
use crate::collision::CollisionTables;
use crate::config::NavConfig;
use crate::graph::GraphInstruction;
use crate::inventory::ItemStack;
use crate::types::{BodyPart, MovementDirection, MovementSide, Vec3i};
use crate::world::{BuildHeight, LevelHeightAccessor};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// A corner block a diagonal move brushes past.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeCollision {
    pub pos: Vec3i,
    pub state: BlockStateId,
    pub direction: MovementDirection,
    pub part: BodyPart,
    pub side: MovementSide,
}

pub trait PathConstraint: Send + Sync {
    /// Usable as a bridging/towering block.
    fn is_placeable(&self, item: &ItemStack) -> bool;

    /// Worth considering as a mining tool.
    fn is_tool(&self, item: &ItemStack) -> bool;

    /// `state` at `pos` means the world there is not loaded yet.
    fn is_out_of_level(&self, state: BlockStateId, pos: Vec3i) -> bool;

    fn can_break_block(&self, pos: Vec3i, state: BlockStateId) -> bool;

    fn can_place_block(&self, pos: Vec3i) -> bool;

    fn can_break_block_type(&self, block: BlockTypeId) -> bool;

    /// Does the corner block touch the bot while it cuts the diagonal?
    fn collides_at_edge(&self, query: &EdgeCollision) -> bool;

    /// Adjust or veto an edge before it reaches the searcher.
    fn modify_as_needed(&self, instruction: GraphInstruction) -> Option<GraphInstruction> {
        Some(instruction)
    }

    fn does_usable_blocks_decrease_when_placed(&self) -> bool {
        true
    }

    fn can_blocks_drop_when_broken(&self) -> bool {
        true
    }

    fn break_block_penalty(&self) -> f64 {
        crate::costs::BREAK_BLOCK_PENALTY
    }

    fn place_block_penalty(&self) -> f64 {
        crate::costs::PLACE_BLOCK_PENALTY
    }

    fn can_break_blocks(&self) -> bool {
        true
    }

    fn can_place_blocks(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Default policy
// ---------------------------------------------------------------------------

/// A mob that chases the bot within `follow_range` blocks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostileEntity {
    pub pos: Vec3i,
    pub follow_range: f64,
}

#[derive(Clone, Debug)]
pub struct DefaultPathConstraint {
    registry: Arc<BlockRegistry>,
    tables: Arc<CollisionTables>,
    height: BuildHeight,
    allow_breaking: bool,
    allow_placing: bool,
    allow_breaking_undiggable: bool,
    avoid_breaking: FxHashSet<BlockTypeId>,
    squeeze_through_diagonals: bool,
    break_penalty: f64,
    place_penalty: f64,
    creative_placement: bool,
    avoid_harmful_entities: bool,
    max_enemy_penalty: f64,
    hostiles: Vec<HostileEntity>,
}

impl DefaultPathConstraint {
    /// Build the policy, computing collision tables for `registry`.
    pub fn new(
        registry: Arc<BlockRegistry>,
        config: &NavConfig,
        level: impl LevelHeightAccessor,
    ) -> Self {
        let tables = Arc::new(CollisionTables::build(&registry));
        Self::with_tables(registry, tables, config, level)
    }

    /// Build the policy around tables shared with other constraints.
    pub fn with_tables(
        registry: Arc<BlockRegistry>,
        tables: Arc<CollisionTables>,
        config: &NavConfig,
        level: impl LevelHeightAccessor,
    ) -> Self {
        let mut avoid_breaking = FxHashSet::default();
        for name in &config.avoid_breaking {
            match registry.block_by_name(name) {
                Some(id) => {
                    avoid_breaking.insert(id);
                }
                None => log::warn!("avoid_breaking names unknown block `{name}`"),
            }
        }
        Self {
            registry,
            tables,
            height: BuildHeight {
                min_y: level.min_build_height(),
                height: level.height(),
            },
            allow_breaking: config.allow_block_breaking,
            allow_placing: config.allow_block_placing,
            allow_breaking_undiggable: config.allow_breaking_undiggable,
            avoid_breaking,
            squeeze_through_diagonals: config.squeeze_through_diagonals,
            break_penalty: config.break_block_penalty,
            place_penalty: config.place_block_penalty,
            creative_placement: config.creative_block_placement,
            avoid_harmful_entities: config.avoid_harmful_entities,
            max_enemy_penalty: config.max_enemy_penalty,
            hostiles: Vec::new(),
        }
    }

    /// Snapshot of hostile mobs to steer around.
    pub fn with_hostile_entities(mut self, hostiles: Vec<HostileEntity>) -> Self {
        self.hostiles = hostiles;
        self
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn tables(&self) -> &Arc<CollisionTables> {
        &self.tables
    }

    /// Linear proximity penalty summed over hostile entities.
    pub fn enemy_penalty(&self, pos: Vec3i) -> f64 {
        self.hostiles
            .iter()
            .filter(|e| e.follow_range > 0.0)
            .map(|e| {
                let distance = pos.distance(e.pos);
                if distance <= e.follow_range {
                    self.max_enemy_penalty * (e.follow_range - distance) / e.follow_range
                } else {
                    0.0
                }
            })
            .sum()
    }
}

impl PathConstraint for DefaultPathConstraint {
    fn is_placeable(&self, item: &ItemStack) -> bool {
        self.registry.is_safe_full_block_item(item.item)
    }

    fn is_tool(&self, item: &ItemStack) -> bool {
        self.registry.is_tool_item(item.item)
    }

    fn is_out_of_level(&self, state: BlockStateId, pos: Vec3i) -> bool {
        self.registry.state(state).block_type == BlockTypeId::VOID_AIR
            && !self.height.is_outside_build_height(pos.y)
    }

    fn can_break_block(&self, pos: Vec3i, state: BlockStateId) -> bool {
        self.can_break_blocks()
            && !self.height.is_outside_build_height(pos.y)
            && self.can_break_block_type(self.registry.state(state).block_type)
    }

    fn can_place_block(&self, pos: Vec3i) -> bool {
        self.can_place_blocks() && !self.height.is_outside_build_height(pos.y)
    }

    fn can_break_block_type(&self, block: BlockTypeId) -> bool {
        if self.avoid_breaking.contains(&block) {
            return false;
        }
        self.allow_breaking_undiggable || self.registry.is_diggable(block)
    }

    fn collides_at_edge(&self, query: &EdgeCollision) -> bool {
        let empty = self.registry.shape(query.state).is_empty();
        if !self.squeeze_through_diagonals {
            return !empty;
        }
        if empty {
            return false;
        }
        self.tables
            .collides_diagonal(query.state, query.direction, query.part, query.side)
    }

    fn modify_as_needed(&self, mut instruction: GraphInstruction) -> Option<GraphInstruction> {
        if self.avoid_harmful_entities {
            let penalty = self.enemy_penalty(instruction.target);
            if penalty > 0.0 {
                instruction.cost += penalty;
            }
        }
        Some(instruction)
    }

    fn does_usable_blocks_decrease_when_placed(&self) -> bool {
        !self.creative_placement
    }

    fn break_block_penalty(&self) -> f64 {
        self.break_penalty
    }

    fn place_block_penalty(&self) -> f64 {
        self.place_penalty
    }

    fn can_break_blocks(&self) -> bool {
        self.allow_breaking
    }

    fn can_place_blocks(&self) -> bool {
        self.allow_placing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionDirection;

    fn constraint(config: NavConfig) -> DefaultPathConstraint {
        DefaultPathConstraint::new(
            Arc::new(BlockRegistry::standard()),
            &config,
            BuildHeight::OVERWORLD,
        )
    }

    #[test]
    fn void_air_is_out_of_level_only_inside_build_height() {
        let c = constraint(NavConfig::default());
        assert!(c.is_out_of_level(BlockStateId::VOID_AIR, Vec3i::new(0, 64, 0)));
        assert!(!c.is_out_of_level(BlockStateId::VOID_AIR, Vec3i::new(0, -100, 0)));
        assert!(!c.is_out_of_level(BlockStateId::AIR, Vec3i::new(0, 64, 0)));
    }

    #[test]
    fn undiggable_blocks_need_the_override() {
        let c = constraint(NavConfig::default());
        let bedrock = c.registry().state_by_name("bedrock").unwrap();
        let stone = c.registry().state_by_name("stone").unwrap();
        let pos = Vec3i::new(0, 10, 0);
        assert!(!c.can_break_block(pos, bedrock));
        assert!(c.can_break_block(pos, stone));
        assert!(!c.can_break_block(Vec3i::new(0, 400, 0), stone));

        let permissive = constraint(NavConfig {
            allow_breaking_undiggable: true,
            ..NavConfig::default()
        });
        assert!(permissive.can_break_block(pos, bedrock));
    }

    #[test]
    fn avoid_list_and_global_switches() {
        let c = constraint(NavConfig {
            avoid_breaking: vec!["glass".to_string()],
            allow_block_placing: false,
            ..NavConfig::default()
        });
        let glass = c.registry().state_by_name("glass").unwrap();
        assert!(!c.can_break_block(Vec3i::ZERO, glass));
        assert!(!c.can_place_block(Vec3i::ZERO));

        let no_break = constraint(NavConfig {
            allow_block_breaking: false,
            ..NavConfig::default()
        });
        let dirt = no_break.registry().state_by_name("dirt").unwrap();
        assert!(!no_break.can_break_block(Vec3i::ZERO, dirt));
    }

    #[test]
    fn squeezing_can_be_disabled() {
        let cactus_query = |c: &DefaultPathConstraint| EdgeCollision {
            pos: Vec3i::ZERO,
            state: c.registry().state_by_name("cactus").unwrap(),
            direction: MovementDirection::NorthEast,
            part: BodyPart::Feet,
            side: MovementSide::Left,
        };
        let squeeze = constraint(NavConfig::default());
        let panel = squeeze.registry().states_of_name("oak_trapdoor").unwrap()[1];
        let trapdoor_query = EdgeCollision {
            state: panel,
            ..cactus_query(&squeeze)
        };
        assert!(squeeze.collides_at_edge(&cactus_query(&squeeze)));
        // An open trapdoor on the far edge of the corner block stays clear
        // of the swept box.
        assert!(!squeeze.collides_at_edge(&trapdoor_query));

        let strict = constraint(NavConfig {
            squeeze_through_diagonals: false,
            ..NavConfig::default()
        });
        assert!(strict.collides_at_edge(&trapdoor_query));
    }

    #[test]
    fn hostile_proximity_penalty_falls_off_linearly() {
        let c = constraint(NavConfig::default()).with_hostile_entities(vec![HostileEntity {
            pos: Vec3i::new(10, 0, 0),
            follow_range: 10.0,
        }]);
        let instruction = |x: i32| GraphInstruction {
            target: Vec3i::new(x, 0, 0),
            direction: ActionDirection::Up,
            cost: 1.0,
            block_item_delta: 0,
            actions: Default::default(),
        };
        let near = c.modify_as_needed(instruction(5)).unwrap();
        assert!((near.cost - 26.0).abs() < 1e-9);
        let far = c.modify_as_needed(instruction(-5)).unwrap();
        assert_eq!(far.cost, 1.0);
    }

    #[test]
    fn creative_placement_does_not_deplete() {
        let c = constraint(NavConfig {
            creative_block_placement: true,
            ..NavConfig::default()
        });
        assert!(!c.does_usable_blocks_decrease_when_placed());
    }
}
