// Block and item registry: the per-state tables the graph reads.
//
// A `BlockStateId` is an opaque index into `BlockRegistry::states`; each
// state points at its `BlockType` (hardness, tool requirements, fluid and
// falling flags, hazard flags, source item) and carries its own collision
// shape. Items are registered alongside blocks because mining and placement
// both need to cross between the two (tool speed against a block type; the
// block a block item places; the item a block drops).
//
// The registry is data, not code. It can be deserialized from JSON
// (`BlockRegistry::from_json`) or assembled with `RegistryData` in code;
// `BlockRegistry::standard()` is a compact built-in table of common blocks
// used by tests, benchmarks and demos. Two sentinel states always exist:
// `BlockStateId::AIR` (id 0) and `BlockStateId::VOID_AIR` (id 1), the
// latter being what block accessors return for unloaded positions.
//
// See also: `collision.rs` for shape geometry and the tables built from the
// states here, `costs.rs` for the mining-time formula that reads tool and
// hardness data, `constraint.rs` for the policy layered on these
// predicates.
//
// **Critical constraint: immutability.** A registry is frozen once built.
// Collision tables and action templates are derived from it and shared
// read-only across threads.

use crate::collision::{Aabb, CollisionShape};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Index of a block state in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockStateId(pub u32);

impl BlockStateId {
    pub const AIR: BlockStateId = BlockStateId(0);
    /// Returned for positions outside the loaded region.
    pub const VOID_AIR: BlockStateId = BlockStateId(1);
}

/// Index of a block type in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockTypeId(pub u16);

impl BlockTypeId {
    pub const AIR: BlockTypeId = BlockTypeId(0);
    pub const VOID_AIR: BlockTypeId = BlockTypeId(1);
}

/// Index of an item type in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemTypeId(pub u16);

// ---------------------------------------------------------------------------
// Definitions (serde-facing)
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluidKind {
    #[default]
    None,
    Water,
    Lava,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Pickaxe,
    Axe,
    Shovel,
    Hoe,
    Sword,
    Shears,
}

/// Mining capability of a tool item.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub kind: ToolKind,
    /// Harvest tier: 0 wood/gold, 1 stone, 2 iron, 3 diamond, 4 netherite.
    pub tier: u8,
    /// Base speed multiplier against blocks this tool harvests.
    pub speed: f32,
}

/// One block type as it appears in registry JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockTypeDef {
    pub name: String,
    /// Seconds-ish hardness; negative means unbreakable.
    #[serde(default)]
    pub destroy_time: f32,
    #[serde(default)]
    pub requires_correct_tool: bool,
    #[serde(default)]
    pub harvest_tool: Option<ToolKind>,
    #[serde(default)]
    pub harvest_tier: u8,
    #[serde(default)]
    pub fluid: FluidKind,
    #[serde(default)]
    pub falling: bool,
    #[serde(default)]
    pub replaceable: bool,
    /// Damages entities that brush against it (cactus, berry bush).
    #[serde(default)]
    pub hurt_on_touch: bool,
    /// Damages entities standing on top of it (magma).
    #[serde(default)]
    pub hurt_on_stand: bool,
    /// Name of the item this block drops when broken.
    #[serde(default)]
    pub drops: Option<String>,
    /// One collision shape per state; the first is the default state.
    #[serde(default = "default_states")]
    pub states: Vec<CollisionShape>,
}

fn default_states() -> Vec<CollisionShape> {
    vec![CollisionShape::full()]
}

/// One item type as it appears in registry JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemTypeDef {
    pub name: String,
    #[serde(default)]
    pub tool: Option<ToolSpec>,
    /// Name of the block type this item places.
    #[serde(default)]
    pub places: Option<String>,
}

/// Serializable registry document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistryData {
    #[serde(default)]
    pub blocks: Vec<BlockTypeDef>,
    #[serde(default)]
    pub items: Vec<ItemTypeDef>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },
    #[error("block `{block}` drops unknown item `{item}`")]
    UnknownDrop { block: String, item: String },
    #[error("item `{item}` places unknown block `{block}`")]
    UnknownPlacedBlock { item: String, block: String },
    #[error("block `{0}` declares no states")]
    NoStates(String),
}

// ---------------------------------------------------------------------------
// Resolved registry entries
// ---------------------------------------------------------------------------

/// A block type with cross-references resolved to ids.
#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockTypeId,
    pub name: String,
    pub destroy_time: f32,
    pub requires_correct_tool: bool,
    pub harvest_tool: Option<ToolKind>,
    pub harvest_tier: u8,
    pub fluid: FluidKind,
    pub falling: bool,
    pub replaceable: bool,
    pub hurt_on_touch: bool,
    pub hurt_on_stand: bool,
    pub drops: Option<ItemTypeId>,
    pub default_state: BlockStateId,
    pub state_count: u32,
}

#[derive(Clone, Debug)]
pub struct BlockStateData {
    pub block_type: BlockTypeId,
    pub shape: CollisionShape,
}

#[derive(Clone, Debug)]
pub struct ItemType {
    pub id: ItemTypeId,
    pub name: String,
    pub tool: Option<ToolSpec>,
    pub places: Option<BlockTypeId>,
}

/// Frozen block/item tables.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    types: Vec<BlockType>,
    states: Vec<BlockStateData>,
    items: Vec<ItemType>,
    block_names: FxHashMap<String, BlockTypeId>,
    item_names: FxHashMap<String, ItemTypeId>,
}

impl BlockRegistry {
    /// Parse a `RegistryData` JSON document and build the registry.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let data: RegistryData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// Build the registry. `air` and `void_air` are always registered
    /// first, so `data` must not declare them.
    pub fn from_data(data: RegistryData) -> Result<Self, RegistryError> {
        let mut registry = BlockRegistry {
            types: Vec::new(),
            states: Vec::new(),
            items: Vec::new(),
            block_names: FxHashMap::default(),
            item_names: FxHashMap::default(),
        };

        for item in &data.items {
            if registry.item_names.contains_key(&item.name) {
                return Err(RegistryError::DuplicateName {
                    kind: "item",
                    name: item.name.clone(),
                });
            }
            let id = ItemTypeId(registry.items.len() as u16);
            registry.item_names.insert(item.name.clone(), id);
            registry.items.push(ItemType {
                id,
                name: item.name.clone(),
                tool: item.tool,
                places: None,
            });
        }

        let sentinels = [sentinel_def("air"), sentinel_def("void_air")];
        for def in sentinels.iter().chain(data.blocks.iter()) {
            registry.push_block(def)?;
        }

        for item in &data.items {
            let Some(block_name) = &item.places else {
                continue;
            };
            let block = registry.block_names.get(block_name).copied().ok_or_else(|| {
                RegistryError::UnknownPlacedBlock {
                    item: item.name.clone(),
                    block: block_name.clone(),
                }
            })?;
            if let Some(id) = registry.item_names.get(&item.name) {
                registry.items[id.0 as usize].places = Some(block);
            }
        }

        log::debug!(
            "Block registry ready: {} types, {} states, {} items",
            registry.types.len(),
            registry.states.len(),
            registry.items.len()
        );
        Ok(registry)
    }

    fn push_block(&mut self, def: &BlockTypeDef) -> Result<(), RegistryError> {
        if self.block_names.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName {
                kind: "block",
                name: def.name.clone(),
            });
        }
        if def.states.is_empty() {
            return Err(RegistryError::NoStates(def.name.clone()));
        }
        let drops = match &def.drops {
            Some(item) => Some(self.item_names.get(item).copied().ok_or_else(|| {
                RegistryError::UnknownDrop {
                    block: def.name.clone(),
                    item: item.clone(),
                }
            })?),
            None => None,
        };

        let id = BlockTypeId(self.types.len() as u16);
        let default_state = BlockStateId(self.states.len() as u32);
        for shape in &def.states {
            self.states.push(BlockStateData {
                block_type: id,
                shape: shape.clone(),
            });
        }
        self.block_names.insert(def.name.clone(), id);
        self.types.push(BlockType {
            id,
            name: def.name.clone(),
            destroy_time: def.destroy_time,
            requires_correct_tool: def.requires_correct_tool,
            harvest_tool: def.harvest_tool,
            harvest_tier: def.harvest_tier,
            fluid: def.fluid,
            falling: def.falling,
            replaceable: def.replaceable,
            hurt_on_touch: def.hurt_on_touch,
            hurt_on_stand: def.hurt_on_stand,
            drops,
            default_state,
            state_count: def.states.len() as u32,
        });
        Ok(())
    }

    // -- Lookups ------------------------------------------------------------

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> impl Iterator<Item = (BlockStateId, &BlockStateData)> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, data)| (BlockStateId(i as u32), data))
    }

    /// State data; unknown ids resolve to `void_air`.
    pub fn state(&self, state: BlockStateId) -> &BlockStateData {
        self.states
            .get(state.0 as usize)
            .unwrap_or(&self.states[BlockStateId::VOID_AIR.0 as usize])
    }

    pub fn block_type_of(&self, state: BlockStateId) -> &BlockType {
        self.block_type(self.state(state).block_type)
    }

    pub fn block_type(&self, id: BlockTypeId) -> &BlockType {
        self.types
            .get(id.0 as usize)
            .unwrap_or(&self.types[BlockTypeId::VOID_AIR.0 as usize])
    }

    pub fn block_type_count(&self) -> usize {
        self.types.len()
    }

    pub fn shape(&self, state: BlockStateId) -> &CollisionShape {
        &self.state(state).shape
    }

    pub fn item(&self, id: ItemTypeId) -> Option<&ItemType> {
        self.items.get(id.0 as usize)
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockTypeId> {
        self.block_names.get(name).copied()
    }

    pub fn item_by_name(&self, name: &str) -> Option<ItemTypeId> {
        self.item_names.get(name).copied()
    }

    /// Default state of the named block type.
    pub fn state_by_name(&self, name: &str) -> Option<BlockStateId> {
        self.block_by_name(name)
            .map(|id| self.block_type(id).default_state)
    }

    /// All states of the named block type, default first.
    pub fn states_of_name(&self, name: &str) -> Option<Vec<BlockStateId>> {
        let ty = self.block_type(self.block_by_name(name)?);
        Some(
            (0..ty.state_count)
                .map(|i| BlockStateId(ty.default_state.0 + i))
                .collect(),
        )
    }

    // -- Block predicates ---------------------------------------------------

    pub fn is_air(&self, state: BlockStateId) -> bool {
        let ty = self.state(state).block_type;
        ty == BlockTypeId::AIR || ty == BlockTypeId::VOID_AIR
    }

    /// Walkable space: no collision and not a fluid.
    pub fn is_free(&self, state: BlockStateId) -> bool {
        self.shape(state).is_empty() && self.block_type_of(state).fluid == FluidKind::None
    }

    pub fn is_fluid(&self, state: BlockStateId) -> bool {
        self.block_type_of(state).fluid != FluidKind::None
    }

    pub fn is_full_block(&self, state: BlockStateId) -> bool {
        self.shape(state).is_full_block()
    }

    pub fn is_top_full_block(&self, state: BlockStateId) -> bool {
        self.shape(state).is_top_full()
    }

    /// A block the bot can stand on without taking damage.
    pub fn is_safe_to_stand_on(&self, state: BlockStateId) -> bool {
        let ty = self.block_type_of(state);
        self.is_full_block(state) && !ty.hurt_on_stand && ty.fluid == FluidKind::None
    }

    pub fn is_hurt_on_touch(&self, state: BlockStateId) -> bool {
        self.block_type_of(state).hurt_on_touch
    }

    pub fn is_replaceable(&self, state: BlockStateId) -> bool {
        self.block_type_of(state).replaceable
    }

    pub fn is_falling(&self, state: BlockStateId) -> bool {
        self.block_type_of(state).falling
    }

    /// Breakable by a survival player at all.
    pub fn is_diggable(&self, id: BlockTypeId) -> bool {
        let ty = self.block_type(id);
        id != BlockTypeId::AIR
            && id != BlockTypeId::VOID_AIR
            && ty.destroy_time >= 0.0
            && ty.fluid == FluidKind::None
    }

    /// Whether breaking the block yields an item at all.
    pub fn has_source_item(&self, id: BlockTypeId) -> bool {
        self.block_type(id).drops.is_some()
    }

    /// Height of the top surface of the block at a position, relative to
    /// the block's own origin.
    pub fn top_of_shape(&self, state: BlockStateId) -> f64 {
        self.shape(state).max_y()
    }

    // -- Item predicates ----------------------------------------------------

    pub fn is_tool_item(&self, item: ItemTypeId) -> bool {
        self.item(item).is_some_and(|i| i.tool.is_some())
    }

    /// Places a full, stable, harmless block: safe to build bridges and
    /// towers out of.
    pub fn is_safe_full_block_item(&self, item: ItemTypeId) -> bool {
        let Some(block) = self.item(item).and_then(|i| i.places) else {
            return false;
        };
        let ty = self.block_type(block);
        self.is_full_block(ty.default_state)
            && !ty.falling
            && !ty.hurt_on_touch
            && !ty.hurt_on_stand
            && ty.fluid == FluidKind::None
    }

    /// Destroy time of the block an item places, if it places one.
    pub fn placed_block_hardness(&self, item: ItemTypeId) -> Option<f32> {
        self.item(item)
            .and_then(|i| i.places)
            .map(|b| self.block_type(b).destroy_time)
    }

    /// True when breaking a block of this type can drop something the bot
    /// could place again.
    pub fn drops_usable_block_item(&self, id: BlockTypeId) -> bool {
        self.block_type(id)
            .drops
            .is_some_and(|item| self.is_safe_full_block_item(item))
    }

    // -- Built-in table -----------------------------------------------------

    /// A compact vanilla-like registry: common terrain, hazards, a few
    /// partial shapes and the standard tool tiers.
    pub fn standard() -> Self {
        let data = standard_data();
        match Self::from_data(data) {
            Ok(registry) => registry,
            // The built-in table is static data covered by tests.
            Err(e) => unreachable!("built-in registry is inconsistent: {e}"),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn sentinel_def(name: &str) -> BlockTypeDef {
    BlockTypeDef {
        name: name.to_string(),
        destroy_time: 0.0,
        requires_correct_tool: false,
        harvest_tool: None,
        harvest_tier: 0,
        fluid: FluidKind::None,
        falling: false,
        replaceable: true,
        hurt_on_touch: false,
        hurt_on_stand: false,
        drops: None,
        states: vec![CollisionShape::empty()],
    }
}

// ---------------------------------------------------------------------------
// Built-in data
// ---------------------------------------------------------------------------

/// `tool` is `(kind, minimum tier, required for drops)`.
fn block(
    name: &str,
    destroy_time: f32,
    tool: Option<(ToolKind, u8, bool)>,
    drops: Option<&str>,
) -> BlockTypeDef {
    let (harvest_tool, harvest_tier, requires_correct_tool) = match tool {
        Some((kind, tier, required)) => (Some(kind), tier, required),
        None => (None, 0, false),
    };
    BlockTypeDef {
        name: name.to_string(),
        destroy_time,
        requires_correct_tool,
        harvest_tool,
        harvest_tier,
        fluid: FluidKind::None,
        falling: false,
        replaceable: false,
        hurt_on_touch: false,
        hurt_on_stand: false,
        drops: drops.map(str::to_string),
        states: default_states(),
    }
}

fn tool(name: &str, kind: ToolKind, tier: u8, speed: f32) -> ItemTypeDef {
    ItemTypeDef {
        name: name.to_string(),
        tool: Some(ToolSpec { kind, tier, speed }),
        places: None,
    }
}

fn block_item(name: &str) -> ItemTypeDef {
    ItemTypeDef {
        name: name.to_string(),
        tool: None,
        places: Some(name.to_string()),
    }
}

const PX: f64 = 1.0 / 16.0;

fn standard_data() -> RegistryData {
    use ToolKind::{Axe, Pickaxe, Shovel};

    let mut blocks = vec![
        block("stone", 1.5, Some((Pickaxe, 0, true)), Some("cobblestone")),
        block("cobblestone", 2.0, Some((Pickaxe, 0, true)), Some("cobblestone")),
        block("dirt", 0.5, Some((Shovel, 0, false)), Some("dirt")),
        block("grass_block", 0.6, Some((Shovel, 0, false)), Some("dirt")),
        block("oak_planks", 2.0, Some((Axe, 0, false)), Some("oak_planks")),
        block("oak_log", 2.0, Some((Axe, 0, false)), Some("oak_log")),
        block("obsidian", 50.0, Some((Pickaxe, 3, true)), Some("obsidian")),
        block("glass", 0.3, None, None),
        block("bedrock", -1.0, None, None),
    ];

    let mut sand = block("sand", 0.5, Some((Shovel, 0, false)), Some("sand"));
    sand.falling = true;
    let mut gravel = block("gravel", 0.6, Some((Shovel, 0, false)), Some("gravel"));
    gravel.falling = true;

    let mut water = block("water", 100.0, None, None);
    water.fluid = FluidKind::Water;
    water.replaceable = true;
    water.states = vec![CollisionShape::empty()];
    let mut lava = block("lava", 100.0, None, None);
    lava.fluid = FluidKind::Lava;
    lava.replaceable = true;
    lava.states = vec![CollisionShape::empty()];

    let mut short_grass = block("short_grass", 0.0, None, None);
    short_grass.replaceable = true;
    short_grass.states = vec![CollisionShape::empty()];

    let mut cactus = block("cactus", 0.4, None, Some("cactus"));
    cactus.hurt_on_touch = true;
    cactus.states = vec![CollisionShape::from_box(Aabb::new(
        [PX, 0.0, PX],
        [1.0 - PX, 1.0 - PX, 1.0 - PX],
    ))];

    let mut magma = block("magma_block", 0.5, Some((Pickaxe, 0, true)), Some("magma_block"));
    magma.hurt_on_stand = true;

    let mut slab = block("oak_slab", 2.0, Some((Axe, 0, false)), Some("oak_slab"));
    slab.states = vec![
        CollisionShape::from_box(Aabb::new([0.0; 3], [1.0, 0.5, 1.0])),
        CollisionShape::from_box(Aabb::new([0.0, 0.5, 0.0], [1.0; 3])),
        CollisionShape::full(),
    ];

    let mut trapdoor = block("oak_trapdoor", 3.0, Some((Axe, 0, false)), Some("oak_trapdoor"));
    trapdoor.states = vec![
        // Closed, bottom half.
        CollisionShape::from_box(Aabb::new([0.0; 3], [1.0, 3.0 * PX, 1.0])),
        // Open against the north edge.
        CollisionShape::from_box(Aabb::new([0.0; 3], [1.0, 1.0, 3.0 * PX])),
    ];

    blocks.extend([sand, gravel, water, lava, short_grass, cactus, magma, slab, trapdoor]);

    let mut items = vec![
        tool("wooden_pickaxe", Pickaxe, 0, 2.0),
        tool("stone_pickaxe", Pickaxe, 1, 4.0),
        tool("iron_pickaxe", Pickaxe, 2, 6.0),
        tool("diamond_pickaxe", Pickaxe, 3, 8.0),
        tool("wooden_shovel", Shovel, 0, 2.0),
        tool("iron_shovel", Shovel, 2, 6.0),
        tool("iron_axe", Axe, 2, 6.0),
        ItemTypeDef {
            name: "stick".to_string(),
            tool: None,
            places: None,
        },
    ];
    items.extend(
        [
            "cobblestone",
            "dirt",
            "sand",
            "gravel",
            "oak_planks",
            "oak_log",
            "obsidian",
            "cactus",
            "magma_block",
            "oak_slab",
            "oak_trapdoor",
            "stone",
        ]
        .into_iter()
        .map(block_item),
    );

    RegistryData { blocks, items }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_have_fixed_ids() {
        let registry = BlockRegistry::standard();
        assert_eq!(registry.state_by_name("air"), Some(BlockStateId::AIR));
        assert_eq!(registry.state_by_name("void_air"), Some(BlockStateId::VOID_AIR));
        assert!(registry.is_air(BlockStateId::AIR));
        assert!(registry.is_air(BlockStateId::VOID_AIR));
        assert!(registry.is_free(BlockStateId::AIR));
    }

    #[test]
    fn unknown_state_resolves_to_void_air() {
        let registry = BlockRegistry::standard();
        let bogus = BlockStateId(u32::MAX);
        assert_eq!(registry.state(bogus).block_type, BlockTypeId::VOID_AIR);
    }

    #[test]
    fn standing_and_freedom_predicates() {
        let registry = BlockRegistry::standard();
        let stone = registry.state_by_name("stone").unwrap();
        let water = registry.state_by_name("water").unwrap();
        let magma = registry.state_by_name("magma_block").unwrap();
        let grass = registry.state_by_name("short_grass").unwrap();
        assert!(registry.is_safe_to_stand_on(stone));
        assert!(!registry.is_safe_to_stand_on(water));
        assert!(!registry.is_safe_to_stand_on(magma));
        assert!(!registry.is_free(water), "fluids are never free");
        assert!(registry.is_free(grass));
        assert!(registry.is_replaceable(grass));
    }

    #[test]
    fn diggability() {
        let registry = BlockRegistry::standard();
        let bedrock = registry.block_by_name("bedrock").unwrap();
        let water = registry.block_by_name("water").unwrap();
        let stone = registry.block_by_name("stone").unwrap();
        assert!(!registry.is_diggable(bedrock));
        assert!(!registry.is_diggable(water));
        assert!(!registry.is_diggable(BlockTypeId::AIR));
        assert!(registry.is_diggable(stone));
        assert!(registry.has_source_item(stone));
        assert!(!registry.has_source_item(registry.block_by_name("glass").unwrap()));
    }

    #[test]
    fn block_items_are_classified() {
        let registry = BlockRegistry::standard();
        let cobble = registry.item_by_name("cobblestone").unwrap();
        let sand = registry.item_by_name("sand").unwrap();
        let slab = registry.item_by_name("oak_slab").unwrap();
        let pick = registry.item_by_name("iron_pickaxe").unwrap();
        assert!(registry.is_safe_full_block_item(cobble));
        assert!(!registry.is_safe_full_block_item(sand), "falling blocks");
        assert!(!registry.is_safe_full_block_item(slab), "partial blocks");
        assert!(!registry.is_safe_full_block_item(pick));
        assert!(registry.is_tool_item(pick));
        assert!(registry.drops_usable_block_item(registry.block_by_name("stone").unwrap()));
    }

    #[test]
    fn slab_states_are_contiguous() {
        let registry = BlockRegistry::standard();
        let states = registry.states_of_name("oak_slab").unwrap();
        assert_eq!(states.len(), 3);
        assert_eq!(states[1].0, states[0].0 + 1);
        assert!(registry.is_full_block(states[2]));
        assert!(registry.is_top_full_block(states[1]));
        assert_eq!(registry.top_of_shape(states[0]), 0.5);
    }

    #[test]
    fn registry_loads_from_json() {
        let json = r#"{
            "items": [{"name": "rock", "places": "rock"}],
            "blocks": [{"name": "rock", "destroy_time": 1.0, "drops": "rock"}]
        }"#;
        let registry = BlockRegistry::from_json(json).unwrap();
        let rock = registry.block_by_name("rock").unwrap();
        assert!(registry.is_full_block(registry.block_type(rock).default_state));
        assert!(registry.drops_usable_block_item(rock));
    }

    #[test]
    fn registry_rejects_dangling_references() {
        let json = r#"{"blocks": [{"name": "rock", "drops": "pebble"}]}"#;
        assert!(matches!(
            BlockRegistry::from_json(json),
            Err(RegistryError::UnknownDrop { .. })
        ));
        let json = r#"{"blocks": [{"name": "air"}]}"#;
        assert!(matches!(
            BlockRegistry::from_json(json),
            Err(RegistryError::DuplicateName { .. })
        ));
    }
}
