// In-memory bot connection for tests, benches and the scenario crate.
//
// `RecordingBot` owns a `BlockGrid` and a `PlayerInventory` and applies
// the effects a server would: a finished dig clears the block, a place
// puts the held item's block into the clicked neighbor and uses one item.
// Every outgoing call is appended to `events` so tests can assert the
// exact packet sequence an action produced.
//
// It does not simulate movement. Tests move the bot with `teleport`; the
// scenario crate wraps it with a small kinematic step.
//
// Compiled for this crate's tests and for dependents that enable the
// `test-support` feature.

use crate::block::{BlockRegistry, BlockStateId};
use crate::bot::{BotConnection, ControlState, EntityPose};
use crate::costs::{MiningEnvironment, required_mining_ticks};
use crate::inventory::{ItemStack, PlayerInventory};
use crate::types::{BlockFace, Vec3d, Vec3i};
use crate::world::{BlockAccessor, BlockGrid};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum BotEvent {
    Rotate { yaw: f32, pitch: f32 },
    SendRotation,
    SelectHotbar(usize),
    Click(usize),
    StartBreak(Vec3i, BlockFace),
    BreakProgress,
    FinishBreak(Vec3i, BlockFace),
    Place { against: Vec3i, face: BlockFace },
}

pub struct RecordingBot {
    pub registry: Arc<BlockRegistry>,
    pub level: BlockGrid,
    pub pose: EntityPose,
    pub controls: ControlState,
    pub inventory: PlayerInventory,
    pub environment: MiningEnvironment,
    pub events: Vec<BotEvent>,
}

impl RecordingBot {
    /// A bot standing at the bottom centre of `feet` with an empty
    /// inventory.
    pub fn new(registry: Arc<BlockRegistry>, level: BlockGrid, feet: Vec3i) -> Self {
        Self {
            registry,
            level,
            pose: EntityPose::standing_at(feet),
            controls: ControlState::default(),
            inventory: PlayerInventory::default(),
            environment: MiningEnvironment::default(),
            events: Vec::new(),
        }
    }

    /// Add a stack of the named item to the first free slot.
    ///
    /// Panics on unknown item names or a full inventory.
    pub fn give(&mut self, name: &str, count: u32) -> usize {
        let item = self
            .registry
            .item_by_name(name)
            .unwrap_or_else(|| panic!("unknown item {name}"));
        self.inventory
            .insert(ItemStack::new(item, count))
            .unwrap_or_else(|| panic!("no room for {name}"))
    }

    pub fn teleport(&mut self, position: Vec3d) {
        self.pose.position = position;
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn held_breaks_instantly(&self, pos: Vec3i) -> bool {
        let block = self.registry.block_type_of(self.level.get(pos)).id;
        required_mining_ticks(&self.registry, self.inventory.held(), block, &self.environment)
            .is_some_and(|r| r.ticks == 0)
    }
}

impl BotConnection for RecordingBot {
    fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    fn level(&self) -> &dyn BlockAccessor {
        &self.level
    }

    fn pose(&self) -> EntityPose {
        self.pose
    }

    fn set_rotation(&mut self, yaw: f32, pitch: f32) {
        self.pose.yaw = yaw;
        self.pose.pitch = pitch;
        self.events.push(BotEvent::Rotate { yaw, pitch });
    }

    fn send_rotation(&mut self) {
        self.events.push(BotEvent::SendRotation);
    }

    fn controls(&mut self) -> &mut ControlState {
        &mut self.controls
    }

    fn inventory(&self) -> &PlayerInventory {
        &self.inventory
    }

    fn select_hotbar_slot(&mut self, slot: usize) {
        self.inventory.select(slot);
        self.events.push(BotEvent::SelectHotbar(slot));
    }

    fn click_slot(&mut self, slot: usize) {
        self.inventory.click(slot);
        self.events.push(BotEvent::Click(slot));
    }

    fn start_breaking(&mut self, pos: Vec3i, face: BlockFace) {
        self.events.push(BotEvent::StartBreak(pos, face));
        if self.held_breaks_instantly(pos) {
            self.level.set(pos, BlockStateId::AIR);
        }
    }

    fn continue_breaking(&mut self) {
        self.events.push(BotEvent::BreakProgress);
    }

    fn finish_breaking(&mut self, pos: Vec3i, face: BlockFace) {
        self.events.push(BotEvent::FinishBreak(pos, face));
        self.level.set(pos, BlockStateId::AIR);
    }

    fn place_against(&mut self, against: Vec3i, face: BlockFace) {
        self.events.push(BotEvent::Place { against, face });
        let target = face.offset(against);
        let registry = &self.registry;
        if registry.is_free(self.level.get(against))
            || !registry.is_replaceable(self.level.get(target))
        {
            return;
        }
        let Some(block) = self
            .inventory
            .held()
            .and_then(|stack| registry.item(stack.item))
            .and_then(|item| item.places)
        else {
            return;
        };
        self.level.set(target, registry.block_type(block).default_state);
        self.inventory.consume_held();
    }

    fn mining_environment(&self) -> MiningEnvironment {
        self.environment
    }
}
