// blocknav_engine: block-world navigation for Minecraft bots.
//
// This crate turns a voxel level into a weighted movement graph for a
// player-sized bot and executes routes through that graph tick by tick.
// It owns no network session and no search algorithm: a searcher expands
// nodes through `MinecraftGraph`, and a bot connection is driven through
// the `BotConnection` trait.
//
// Module overview:
// - `types.rs`:        Vec3i/Vec3d, block faces, movement directions, body parts.
// - `block.rs`:        BlockRegistry: block types, states, collision shapes, items.
// - `collision.rs`:    Precomputed swept-box collision tables per block state.
// - `world.rs`:        BlockAccessor / LevelHeightAccessor + the dense BlockGrid.
// - `costs.rs`:        Movement cost constants and the mining tick formula.
// - `inventory.rs`:    PlayerInventory and ProjectedInventory (memoized mining costs).
// - `config.rs`:       NavConfig: every tunable, JSON-loadable.
// - `constraint.rs`:   PathConstraint policy trait + DefaultPathConstraint.
// - `action.rs`:       Frozen action templates and the offset subscription table.
// - `graph.rs`:        MinecraftGraph::insert_actions: per-node edge expansion.
// - `bot.rs`:          BotConnection trait, entity pose, control inputs.
// - `world_action.rs`: WorldAction trait, walking and gap-jump steps.
// - `equip.rs`:        Tool and block choice, hotbar/storage swaps.
// - `block_break.rs`:  Dig step.
// - `block_place.rs`:  Bridge and tower placement steps.
// - `executor.rs`:     PathExecutor: the per-tick step state machine.
// - `controller.rs`:   PathController: background recalculation and lifecycle.
// - `error.rs`:        GraphError, ExecutionError, SearchError.
// - `testing.rs`:      RecordingBot, behind the `test-support` feature.
//
// **Critical constraint: shared tables are read-only.** The registry,
// collision tables and action registry are built once and never mutated.
// Every graph query keeps its working state on its own stack, so any
// number of queries may run in parallel against the same tables.

pub mod action;
pub mod block;
pub mod block_break;
pub mod block_place;
pub mod bot;
pub mod collision;
pub mod config;
pub mod constraint;
pub mod controller;
pub mod costs;
pub mod equip;
pub mod error;
pub mod executor;
pub mod graph;
pub mod inventory;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;
pub mod world;
pub mod world_action;
