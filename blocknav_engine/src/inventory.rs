// Player inventory model and the projected inventory used for planning.
//
// `PlayerInventory` mirrors the player's 36 storage slots (hotbar 0..9,
// main storage 9..36), the selected hotbar slot, and the cursor stack a
// container click picks up. It supports the two operations equipping needs:
// selecting a hotbar slot and clicking a slot (swap with the cursor).
//
// `ProjectedInventory` is the immutable planning snapshot. It is
// partitioned through the path constraint's `is_placeable` / `is_tool`
// predicates into a count of usable block items and a deduplicated list of
// usable tools, with the empty hand as the final candidate. Mining costs
// are memoized per block type in `OnceLock` cells owned by this snapshot,
// so repeated lookups during one search return the same `&BlockMiningCosts`
// and concurrent graph expansions can fill the cache without locks.
//
// See also: `costs.rs` for the dig-speed formula, `constraint.rs` for the
// placeable/tool predicates and the break penalty, `graph.rs` which reads
// `mining_costs()` for every block a candidate move must break.
//
// **Critical constraint: snapshot ownership.** A memo cache belongs to one
// `ProjectedInventory`. Never share costs across snapshots built from
// different inventories; build a new snapshot when the inventory changes.

use crate::block::{BlockRegistry, BlockStateId, ItemTypeId};
use crate::constraint::PathConstraint;
use crate::costs::{self, MiningEnvironment, TICKS_PER_BLOCK};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Hotbar slots are `0..HOTBAR_SIZE` of the storage array.
pub const HOTBAR_SIZE: usize = 9;
pub const STORAGE_SIZE: usize = 36;

// ---------------------------------------------------------------------------
// Item stacks and the live inventory
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemTypeId,
    pub count: u32,
    /// Efficiency enchantment level, 0 when absent.
    #[serde(default)]
    pub efficiency: u8,
}

impl ItemStack {
    pub fn new(item: ItemTypeId, count: u32) -> Self {
        Self {
            item,
            count,
            efficiency: 0,
        }
    }

    pub fn with_efficiency(mut self, level: u8) -> Self {
        self.efficiency = level;
        self
    }

    /// Same item and enchantments, ignoring count.
    pub fn same_kind(&self, other: &ItemStack) -> bool {
        self.item == other.item && self.efficiency == other.efficiency
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerInventory {
    /// Always `STORAGE_SIZE` long.
    pub storage: Vec<Option<ItemStack>>,
    /// Selected hotbar index, `0..HOTBAR_SIZE`.
    pub selected: usize,
    /// Stack currently held on the cursor by a container click.
    pub cursor: Option<ItemStack>,
}

impl Default for PlayerInventory {
    fn default() -> Self {
        Self {
            storage: vec![None; STORAGE_SIZE],
            selected: 0,
            cursor: None,
        }
    }
}

impl PlayerInventory {
    pub fn held(&self) -> Option<&ItemStack> {
        self.storage.get(self.selected).and_then(Option::as_ref)
    }

    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.storage.get(slot).and_then(Option::as_ref)
    }

    pub fn is_hotbar(slot: usize) -> bool {
        slot < HOTBAR_SIZE
    }

    /// Put `stack` in the first empty slot, hotbar first. Returns the slot.
    pub fn insert(&mut self, stack: ItemStack) -> Option<usize> {
        let slot = self.storage.iter().position(Option::is_none)?;
        self.storage[slot] = Some(stack);
        Some(slot)
    }

    /// Select a hotbar slot. Out-of-range slots are ignored.
    pub fn select(&mut self, slot: usize) {
        if Self::is_hotbar(slot) {
            self.selected = slot;
        }
    }

    /// A container left-click: swap the cursor with the slot contents.
    pub fn click(&mut self, slot: usize) {
        if let Some(contents) = self.storage.get_mut(slot) {
            std::mem::swap(contents, &mut self.cursor);
        }
    }

    /// Remove one item from the held stack, e.g. after placing a block.
    pub fn consume_held(&mut self) {
        if let Some(slot) = self.storage.get_mut(self.selected)
            && let Some(stack) = slot
        {
            stack.count = stack.count.saturating_sub(1);
            if stack.count == 0 {
                *slot = None;
            }
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemStack> {
        self.storage.iter().flatten().chain(self.cursor.iter())
    }
}

// ---------------------------------------------------------------------------
// Projected inventory
// ---------------------------------------------------------------------------

/// Best way to break one block type with a given snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMiningCosts {
    /// Ticks converted to cost, plus the break penalty.
    pub mining_cost: f64,
    pub ticks: u32,
    /// `None` means the empty hand.
    pub best_tool: Option<ItemStack>,
    pub will_drop_usable_block_item: bool,
}

/// Immutable planning view of the inventory.
#[derive(Debug)]
pub struct ProjectedInventory {
    registry: Arc<BlockRegistry>,
    usable_block_item_count: u32,
    /// Deduplicated tools, then `None` for the empty hand.
    usable_tools: Vec<Option<ItemStack>>,
    break_penalty: f64,
    blocks_drop: bool,
    /// One cell per block type.
    mining_costs: Box<[OnceLock<Option<BlockMiningCosts>>]>,
}

impl ProjectedInventory {
    /// Snapshot a live inventory, cursor included.
    pub fn from_player(
        inventory: &PlayerInventory,
        registry: Arc<BlockRegistry>,
        constraint: &dyn PathConstraint,
    ) -> Self {
        let items: Vec<ItemStack> = inventory.items().copied().collect();
        Self::from_items(&items, registry, constraint)
    }

    /// Snapshot a raw item list, for planning without a live player.
    pub fn from_items(
        items: &[ItemStack],
        registry: Arc<BlockRegistry>,
        constraint: &dyn PathConstraint,
    ) -> Self {
        let mut usable_block_item_count = 0u32;
        let mut usable_tools: Vec<Option<ItemStack>> = Vec::new();
        for stack in items {
            if stack.count == 0 {
                continue;
            }
            if constraint.is_placeable(stack) {
                usable_block_item_count += stack.count;
            } else if constraint.is_tool(stack) {
                let single = ItemStack { count: 1, ..*stack };
                if !usable_tools.iter().flatten().any(|t| t.same_kind(&single)) {
                    usable_tools.push(Some(single));
                }
            }
        }
        usable_tools.push(None);

        let mining_costs = (0..registry.block_type_count())
            .map(|_| OnceLock::new())
            .collect();
        Self {
            registry,
            usable_block_item_count,
            usable_tools,
            break_penalty: constraint.break_block_penalty(),
            blocks_drop: constraint.can_blocks_drop_when_broken(),
            mining_costs,
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn usable_block_item_count(&self) -> u32 {
        self.usable_block_item_count
    }

    /// Tools worth trying, deduplicated, with the empty hand last.
    pub fn usable_tools(&self) -> &[Option<ItemStack>] {
        &self.usable_tools
    }

    /// Cost of breaking the block at `state`, memoized per block type.
    /// `None` when no candidate can break it.
    pub fn mining_costs(&self, state: BlockStateId) -> Option<&BlockMiningCosts> {
        let block = self.registry.state(state).block_type;
        let cell = self.mining_costs.get(block.0 as usize)?;
        cell.get_or_init(|| self.compute_mining_costs(state))
            .as_ref()
    }

    fn compute_mining_costs(&self, state: BlockStateId) -> Option<BlockMiningCosts> {
        let block = self.registry.state(state).block_type;
        let env = MiningEnvironment::default();
        let mut best: Option<(u32, Option<ItemStack>, bool)> = None;
        for tool in &self.usable_tools {
            let result =
                costs::required_mining_ticks(&self.registry, tool.as_ref(), block, &env);
            let Some(result) = result else {
                continue;
            };
            if best.is_none_or(|(ticks, _, _)| result.ticks < ticks) {
                let drops = self.blocks_drop
                    && result.correct_tool
                    && self.registry.drops_usable_block_item(block);
                best = Some((result.ticks, *tool, drops));
            }
        }
        let (ticks, best_tool, will_drop_usable_block_item) = best?;
        log::trace!(
            "Mining {} takes {ticks} ticks with {best_tool:?}",
            self.registry.block_type(block)
        );
        Some(BlockMiningCosts {
            mining_cost: f64::from(ticks) / TICKS_PER_BLOCK + self.break_penalty,
            ticks,
            best_tool,
            will_drop_usable_block_item,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;
    use crate::constraint::DefaultPathConstraint;
    use crate::world::BuildHeight;

    fn setup(items: &[(&str, u32)]) -> ProjectedInventory {
        let registry = Arc::new(BlockRegistry::standard());
        let constraint = DefaultPathConstraint::new(
            registry.clone(),
            &NavConfig::default(),
            BuildHeight::OVERWORLD,
        );
        let stacks: Vec<ItemStack> = items
            .iter()
            .map(|(name, count)| ItemStack::new(registry.item_by_name(name).unwrap(), *count))
            .collect();
        ProjectedInventory::from_items(&stacks, registry, &constraint)
    }

    #[test]
    fn partitions_blocks_and_tools() {
        let inv = setup(&[
            ("cobblestone", 32),
            ("dirt", 10),
            ("sand", 5),
            ("iron_pickaxe", 1),
            ("iron_pickaxe", 1),
            ("stick", 3),
        ]);
        // Sand falls and is not a safe bridging block.
        assert_eq!(inv.usable_block_item_count(), 42);
        assert_eq!(inv.usable_tools().len(), 2);
        assert!(inv.usable_tools()[0].is_some());
        assert_eq!(inv.usable_tools().last(), Some(&None));
    }

    #[test]
    fn mining_costs_are_memoized_by_identity() {
        let inv = setup(&[("wooden_pickaxe", 1)]);
        let stone = inv.registry().state_by_name("stone").unwrap();
        let first = inv.mining_costs(stone).unwrap();
        let second = inv.mining_costs(stone).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.ticks, 23);
        assert!(first.best_tool.is_some());
        assert!(first.will_drop_usable_block_item);
    }

    #[test]
    fn slab_states_share_one_cache_cell() {
        let inv = setup(&[]);
        let slabs = inv.registry().states_of_name("oak_slab").unwrap();
        let a = inv.mining_costs(slabs[0]).unwrap();
        let b = inv.mining_costs(slabs[2]).unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        // A pickaxe does nothing for dirt, so hand and pickaxe tie and the
        // earlier candidate (the tool) is kept.
        let inv = setup(&[("iron_pickaxe", 1)]);
        let dirt = inv.registry().state_by_name("dirt").unwrap();
        let pick = inv.registry().item_by_name("iron_pickaxe").unwrap();
        let costs = inv.mining_costs(dirt).unwrap();
        assert_eq!(costs.ticks, 15);
        assert_eq!(costs.best_tool.map(|t| t.item), Some(pick));
    }

    #[test]
    fn no_tools_means_empty_hand() {
        let inv = setup(&[("cobblestone", 4)]);
        let stone = inv.registry().state_by_name("stone").unwrap();
        let costs = inv.mining_costs(stone).unwrap();
        assert_eq!(costs.best_tool, None);
        assert_eq!(costs.ticks, 150);
        assert!(!costs.will_drop_usable_block_item);
    }

    #[test]
    fn unbreakable_blocks_have_no_cost() {
        let inv = setup(&[("diamond_pickaxe", 1)]);
        let bedrock = inv.registry().state_by_name("bedrock").unwrap();
        assert!(inv.mining_costs(bedrock).is_none());
        assert!(inv.mining_costs(bedrock).is_none());
    }

    #[test]
    fn cost_includes_break_penalty() {
        let inv = setup(&[]);
        let dirt = inv.registry().state_by_name("dirt").unwrap();
        let costs = inv.mining_costs(dirt).unwrap();
        let expected = 15.0 / TICKS_PER_BLOCK + costs::BREAK_BLOCK_PENALTY;
        assert!((costs.mining_cost - expected).abs() < 1e-9);
    }

    #[test]
    fn click_swaps_with_cursor() {
        let registry = BlockRegistry::standard();
        let pick = ItemStack::new(registry.item_by_name("iron_pickaxe").unwrap(), 1);
        let mut inv = PlayerInventory::default();
        inv.storage[20] = Some(pick);
        inv.click(20);
        assert_eq!(inv.cursor, Some(pick));
        assert!(inv.get(20).is_none());
        inv.click(0);
        assert_eq!(inv.held(), Some(&pick));
        assert!(inv.cursor.is_none());
    }

    #[test]
    fn consume_held_empties_slot() {
        let registry = BlockRegistry::standard();
        let dirt = ItemStack::new(registry.item_by_name("dirt").unwrap(), 1);
        let mut inv = PlayerInventory::default();
        inv.insert(dirt);
        inv.consume_held();
        assert!(inv.held().is_none());
    }
}
