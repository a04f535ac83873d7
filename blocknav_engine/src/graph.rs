// The Minecraft movement graph: per-node expansion into weighted edges.
//
// `MinecraftGraph::insert_actions(node, incoming, callback)` is the only
// entry point a searcher needs. It walks the frozen subscription table from
// `action.rs` once, in descending fan-out order:
//
// 1. Fresh per-query `ActionState`s are created for every template, minus
//    the one that would undo the incoming edge and those that cannot apply
//    at all (no tower without blocks, no digging when breaking is off).
// 2. For each offset key, the block at `node + offset` is fetched lazily,
//    only once a live subscriber wants it, and never twice. A `VOID_AIR`
//    read the constraint calls out of level aborts the whole query with
//    `GraphError::OutOfLevel`; nothing emitted so far is meaningful then.
// 3. Each live subscriber applies its meaning. `Step::Impossible` drops the
//    template's state for the rest of the query; once a template's counter
//    reaches zero it is turned into a `GraphInstruction`, passed through
//    `PathConstraint::modify_as_needed` and handed to the callback.
//
// Per-template decisions are first-write-wins: the first full block found
// among the against candidates is the one placed against, and a corner
// cost is applied at most once.
//
// See also: `action.rs` for the templates and the table, `constraint.rs`
// for every policy call made here, `inventory.rs` for mining costs,
// `world_action.rs` for turning `PlannedAction`s into executable steps.
//
// **Critical constraint: query-local state.** Everything mutable lives in
// the `Vec<Option<ActionState>>` built per call. `MinecraftGraph` only
// holds shared references, so queries for different nodes run in parallel
// (`expand_many`).

use crate::action::{
    ActionRegistry, ActionTemplate, MAX_BREAK_SLOTS, MovementKind, Subscription,
};
use crate::block::{BlockRegistry, BlockStateId};
use crate::collision::CollisionTables;
use crate::constraint::{EdgeCollision, PathConstraint};
use crate::costs::{CORNER_SLIDE, fall_cost, tower_cost};
use crate::error::GraphError;
use crate::inventory::ProjectedInventory;
use crate::types::{ActionDirection, BlockFace, BodyPart, MovementDirection, Vec3i};
use crate::world::BlockAccessor;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One step of an edge, as data. Converted into a stateful `WorldAction`
/// when execution begins.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlannedAction {
    /// Walk (or fall) to the block position `target`.
    Move { target: Vec3i, diagonal: bool },
    /// Jump across a one-block gap.
    GapJump { target: Vec3i },
    Break { pos: Vec3i, face: BlockFace },
    /// Place a block at `pos` by clicking `face` of `against`.
    Place {
        pos: Vec3i,
        against: Vec3i,
        face: BlockFace,
    },
    /// Jump and place a block at `pos`, the position the feet just left.
    JumpAndPlaceBelow {
        pos: Vec3i,
        against: Vec3i,
        face: BlockFace,
    },
}

impl PlannedAction {
    /// Where the bot should be once this step is done, if it moves.
    pub fn target(&self) -> Option<Vec3i> {
        match *self {
            PlannedAction::Move { target, .. } | PlannedAction::GapJump { target } => Some(target),
            PlannedAction::JumpAndPlaceBelow { pos, .. } => Some(pos.add(0, 1, 0)),
            PlannedAction::Break { .. } | PlannedAction::Place { .. } => None,
        }
    }
}

/// A weighted edge out of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphInstruction {
    /// Absolute feet position after the edge.
    pub target: Vec3i,
    /// Fed back as `incoming` when expanding `target`.
    pub direction: ActionDirection,
    pub cost: f64,
    /// Change in usable block items: +1 per broken block that drops one,
    /// -1 per placed block.
    pub block_item_delta: i32,
    pub actions: SmallVec<[PlannedAction; 4]>,
}

// ---------------------------------------------------------------------------
// Per-query state
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
struct MiningPlan {
    pos: Vec3i,
    face: BlockFace,
    cost: f64,
    will_drop: bool,
}

/// Mutable evaluation state of one template for one query.
#[derive(Clone, Debug, Default)]
struct ActionState {
    remaining: u16,
    breaks: [Option<MiningPlan>; MAX_BREAK_SLOTS],
    /// Bit per slot: the block is already passable.
    no_need_to_break: u8,
    /// Bit per slot: breaking the block would let something in.
    unsafe_to_break: u8,
    requires_against: bool,
    against: Option<(Vec3i, BlockFace)>,
    corner_applied: bool,
    extra_cost: f64,
    /// Highest safe landing offset of a dig-down.
    landing: Option<i32>,
    /// Highest non-free offset a dig-down falls through.
    obstruct: Option<i32>,
}

enum Step {
    Continue,
    Impossible,
}

fn slot_bit(slot: u8) -> u8 {
    1 << slot
}

/// Only walks that allow block actions, and the vertical moves, ever break.
fn may_break(template: &ActionTemplate) -> bool {
    match template.kind {
        MovementKind::Simple {
            allow_block_actions,
            ..
        } => allow_block_actions,
        MovementKind::Parkour { .. } => false,
        MovementKind::Down | MovementKind::Up => true,
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Read-only view over everything one expansion needs.
pub struct MinecraftGraph<'a> {
    actions: &'a ActionRegistry,
    tables: &'a CollisionTables,
    level: &'a (dyn BlockAccessor + Sync),
    inventory: &'a ProjectedInventory,
    constraint: &'a dyn PathConstraint,
}

impl<'a> MinecraftGraph<'a> {
    pub fn new(
        actions: &'a ActionRegistry,
        tables: &'a CollisionTables,
        level: &'a (dyn BlockAccessor + Sync),
        inventory: &'a ProjectedInventory,
        constraint: &'a dyn PathConstraint,
    ) -> Self {
        Self {
            actions,
            tables,
            level,
            inventory,
            constraint,
        }
    }

    pub fn inventory(&self) -> &ProjectedInventory {
        self.inventory
    }

    fn registry(&self) -> &BlockRegistry {
        self.inventory.registry()
    }

    /// Expand `node`, calling `callback` with every edge as soon as it is
    /// resolved. `incoming` is the direction of the edge that led here.
    pub fn insert_actions(
        &self,
        node: Vec3i,
        incoming: Option<ActionDirection>,
        mut callback: impl FnMut(GraphInstruction),
    ) -> Result<(), GraphError> {
        let backtrack = incoming.map(ActionDirection::opposite);
        let mut states: Vec<Option<ActionState>> = self
            .actions
            .templates()
            .iter()
            .map(|template| {
                (Some(template.direction) != backtrack && self.applies(template, node)).then(|| {
                    ActionState {
                        remaining: template.subscription_count,
                        ..ActionState::default()
                    }
                })
            })
            .collect();

        for (offset, subscribers) in self.actions.entries() {
            let pos = node.plus(offset);
            let mut fetched: Option<(BlockStateId, bool)> = None;
            for subscriber in subscribers {
                let index = subscriber.action as usize;
                let Some(state) = states[index].as_mut() else {
                    continue;
                };
                let (block, free) = match fetched {
                    Some(block) => block,
                    None => {
                        let block = self.level.block_state(pos);
                        if self.constraint.is_out_of_level(block, pos) {
                            log::debug!("Expansion of {node} reached unloaded block {pos}");
                            return Err(GraphError::OutOfLevel { pos });
                        }
                        let entry = (block, self.registry().is_free(block));
                        fetched = Some(entry);
                        entry
                    }
                };
                let template = self.actions.template(subscriber.action);
                let step = self.evaluate(
                    template,
                    state,
                    subscriber.subscription,
                    offset,
                    pos,
                    block,
                    free,
                );
                match step {
                    Step::Continue => {
                        state.remaining -= 1;
                        if state.remaining == 0
                            && let Some(finished) = states[index].take()
                        {
                            self.emit(node, template, finished, &mut callback);
                        }
                    }
                    Step::Impossible => states[index] = None,
                }
            }
        }
        Ok(())
    }

    /// Collect the edges of `node` into a `Vec`.
    pub fn expand(
        &self,
        node: Vec3i,
        incoming: Option<ActionDirection>,
    ) -> Result<Vec<GraphInstruction>, GraphError> {
        let mut edges = Vec::new();
        self.insert_actions(node, incoming, |edge| edges.push(edge))?;
        Ok(edges)
    }

    /// Expand many frontier nodes in parallel. Results keep input order.
    pub fn expand_many(
        &self,
        queries: &[(Vec3i, Option<ActionDirection>)],
    ) -> Vec<Result<Vec<GraphInstruction>, GraphError>> {
        queries
            .par_iter()
            .map(|&(node, incoming)| self.expand(node, incoming))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Policy helpers
    // -----------------------------------------------------------------------

    /// Templates that can be ruled out before reading any block.
    fn applies(&self, template: &ActionTemplate, node: Vec3i) -> bool {
        match template.kind {
            MovementKind::Up => self.can_place_at(node),
            MovementKind::Down => self.constraint.can_break_blocks(),
            _ => true,
        }
    }

    fn can_place_at(&self, pos: Vec3i) -> bool {
        self.constraint.can_place_blocks()
            && self.inventory.usable_block_item_count() > 0
            && self.constraint.can_place_block(pos)
    }

    fn plan_break(&self, pos: Vec3i, block: BlockStateId, face: BlockFace) -> Option<MiningPlan> {
        let block_type = self.registry().state(block).block_type;
        if !self.constraint.can_break_blocks()
            || !self.constraint.can_break_block(pos, block)
            || !self.constraint.can_break_block_type(block_type)
            || !self.registry().has_source_item(block_type)
        {
            return None;
        }
        let costs = self.inventory.mining_costs(block)?;
        Some(MiningPlan {
            pos,
            face,
            cost: costs.mining_cost,
            will_drop: costs.will_drop_usable_block_item,
        })
    }

    /// A non-free target-edge block the swept bot box never touches.
    fn passes_edge(
        &self,
        block: BlockStateId,
        edge: Option<(MovementDirection, BodyPart)>,
    ) -> bool {
        edge.is_some_and(|(direction, part)| {
            !self.registry().is_fluid(block)
                && !self.tables.collides_simple(block, direction, part)
        })
    }

    // -----------------------------------------------------------------------
    // Subscription meanings
    // -----------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        template: &ActionTemplate,
        state: &mut ActionState,
        subscription: Subscription,
        offset: Vec3i,
        pos: Vec3i,
        block: BlockStateId,
        free: bool,
    ) -> Step {
        let registry = self.registry();
        match subscription {
            Subscription::Free { slot, face, edge } => {
                let breaks = may_break(template);
                if free || self.passes_edge(block, edge) {
                    // A dig-down needs something to dig.
                    if template.kind == MovementKind::Down {
                        return Step::Impossible;
                    }
                    if breaks {
                        state.no_need_to_break |= slot_bit(slot);
                    }
                    return Step::Continue;
                }
                if !breaks || state.unsafe_to_break & slot_bit(slot) != 0 {
                    return Step::Impossible;
                }
                match (
                    self.plan_break(pos, block, face),
                    state.breaks.get_mut(slot as usize),
                ) {
                    (Some(plan), Some(cell)) => {
                        *cell = Some(plan);
                        Step::Continue
                    }
                    _ => Step::Impossible,
                }
            }
            Subscription::BreakSafety { slot, kind } => {
                let unsafe_block = kind.is_unsafe(registry, block);
                if template.kind == MovementKind::Down {
                    // The dig is mandatory, so any unsafe neighbour rules it out.
                    return if unsafe_block {
                        Step::Impossible
                    } else {
                        Step::Continue
                    };
                }
                let bit = slot_bit(slot);
                if state.no_need_to_break & bit != 0
                    || state.unsafe_to_break & bit != 0
                    || !unsafe_block
                {
                    return Step::Continue;
                }
                if state
                    .breaks
                    .get(slot as usize)
                    .is_some_and(Option::is_some)
                {
                    return Step::Impossible;
                }
                state.unsafe_to_break |= bit;
                Step::Continue
            }
            Subscription::Solid => {
                if registry.is_safe_to_stand_on(block) {
                    return Step::Continue;
                }
                let bridges = matches!(
                    template.kind,
                    MovementKind::Simple {
                        allow_block_actions: true,
                        ..
                    }
                );
                if bridges && registry.is_replaceable(block) && self.can_place_at(pos) {
                    state.requires_against = true;
                    return Step::Continue;
                }
                Step::Impossible
            }
            Subscription::AgainstPlace { face } => {
                if state.against.is_none() && registry.is_full_block(block) {
                    state.against = Some((pos, face));
                }
                Step::Continue
            }
            Subscription::CornerCost => {
                if state.corner_applied {
                    return Step::Continue;
                }
                if registry.is_full_block(block) {
                    state.extra_cost += CORNER_SLIDE;
                    state.corner_applied = true;
                    Step::Continue
                } else if registry.is_hurt_on_touch(block) {
                    Step::Impossible
                } else {
                    Step::Continue
                }
            }
            Subscription::DiagonalSqueeze {
                direction,
                part,
                side,
            } => {
                let query = EdgeCollision {
                    pos,
                    state: block,
                    direction,
                    part,
                    side,
                };
                if registry.is_fluid(block) || self.constraint.collides_at_edge(&query) {
                    Step::Impossible
                } else {
                    Step::Continue
                }
            }
            Subscription::ParkourGap => {
                if registry.is_safe_to_stand_on(block) {
                    Step::Impossible
                } else {
                    Step::Continue
                }
            }
            Subscription::DownLanding => {
                if registry.is_safe_to_stand_on(block) {
                    state.landing = state.landing.max(Some(offset.y));
                }
                Step::Continue
            }
            Subscription::DownObstruct => {
                if !free {
                    state.obstruct = state.obstruct.max(Some(offset.y));
                }
                Step::Continue
            }
        }
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    fn emit(
        &self,
        node: Vec3i,
        template: &ActionTemplate,
        state: ActionState,
        callback: &mut impl FnMut(GraphInstruction),
    ) {
        let Some(instruction) = self.instruction(node, template, &state) else {
            return;
        };
        log::trace!(
            "Edge {node} -> {} ({}) cost {:.3}",
            instruction.target,
            instruction.direction,
            instruction.cost
        );
        if let Some(instruction) = self.constraint.modify_as_needed(instruction) {
            callback(instruction);
        }
    }

    fn instruction(
        &self,
        node: Vec3i,
        template: &ActionTemplate,
        state: &ActionState,
    ) -> Option<GraphInstruction> {
        let mut cost = template.base_cost + state.extra_cost;
        let mut block_item_delta = 0;
        let mut actions: SmallVec<[PlannedAction; 4]> = SmallVec::new();
        for plan in state.breaks.iter().flatten() {
            cost += plan.cost;
            if plan.will_drop {
                block_item_delta += 1;
            }
            actions.push(PlannedAction::Break {
                pos: plan.pos,
                face: plan.face,
            });
        }
        let depletes = i32::from(self.constraint.does_usable_blocks_decrease_when_placed());
        let mut target = node.plus(template.target);

        match template.kind {
            MovementKind::Simple { direction, .. } => {
                if state.requires_against {
                    let (against, face) = state.against?;
                    cost += self.constraint.place_block_penalty();
                    block_item_delta -= depletes;
                    actions.push(PlannedAction::Place {
                        pos: target.sub(0, 1, 0),
                        against,
                        face,
                    });
                }
                actions.push(PlannedAction::Move {
                    target,
                    diagonal: direction.is_diagonal(),
                });
            }
            MovementKind::Parkour { .. } => {
                actions.push(PlannedAction::GapJump { target });
            }
            MovementKind::Down => {
                let landing = state.landing?;
                if state.obstruct.is_some_and(|y| y > landing) {
                    return None;
                }
                cost += fall_cost(u32::try_from(-landing - 1).ok()?)?;
                target = node.add(0, landing + 1, 0);
            }
            MovementKind::Up => {
                cost += tower_cost(self.constraint.place_block_penalty());
                block_item_delta -= depletes;
                actions.push(PlannedAction::JumpAndPlaceBelow {
                    pos: node,
                    against: node.sub(0, 1, 0),
                    face: BlockFace::Top,
                });
            }
        }

        Some(GraphInstruction {
            target,
            direction: template.direction,
            cost,
            block_item_delta,
            actions,
        })
    }
}
