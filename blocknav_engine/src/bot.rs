// The bot connection seam used by world actions.
//
// World actions never talk to a network session directly. They read and
// drive the bot through `BotConnection`: the current level and registry,
// the entity pose, the movement control inputs, the inventory and the
// handful of packets path execution needs (held-slot change, container
// click, dig start/progress/stop, place against a face).
//
// Control inputs are plain state (`ControlState`); the connection turns
// them into movement packets on its own schedule. Actions reset them at
// the start of every tick and set only what they need, so a step that
// stops ticking leaves the bot standing still.
//
// See also: `world_action.rs`, `block_break.rs` and `block_place.rs` for
// the actions that drive this trait, `testing.rs` for the recording
// implementation used in tests.

use crate::block::BlockRegistry;
use crate::costs::MiningEnvironment;
use crate::inventory::PlayerInventory;
use crate::types::{BlockFace, Vec3d, Vec3i};
use crate::world::BlockAccessor;
use serde::{Deserialize, Serialize};

/// Eye height of a standing player.
pub const STANDING_EYE_HEIGHT: f64 = 1.62;

/// Position and orientation of the bot entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityPose {
    /// Feet position.
    pub position: Vec3d,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
    pub eye_height: f64,
}

impl EntityPose {
    /// Standing at the bottom centre of `feet`, facing south.
    pub fn standing_at(feet: Vec3i) -> Self {
        Self {
            position: feet.bottom_center(),
            yaw: 0.0,
            pitch: 0.0,
            on_ground: true,
            eye_height: STANDING_EYE_HEIGHT,
        }
    }

    pub fn eye_position(&self) -> Vec3d {
        self.position.offset(0.0, self.eye_height, 0.0)
    }

    /// The block the feet are in.
    pub fn block_position(&self) -> Vec3i {
        Vec3i::from_position(self.position)
    }
}

/// Movement inputs, as if held on a keyboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jumping: bool,
    pub sneaking: bool,
    pub sprinting: bool,
}

impl ControlState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

pub trait BotConnection {
    fn registry(&self) -> &BlockRegistry;

    /// The level as currently known to the client.
    fn level(&self) -> &dyn BlockAccessor;

    fn pose(&self) -> EntityPose;

    /// Turn locally; the rotation goes out with the next movement packet.
    fn set_rotation(&mut self, yaw: f32, pitch: f32);

    /// Send the current rotation right away.
    fn send_rotation(&mut self);

    fn controls(&mut self) -> &mut ControlState;

    fn inventory(&self) -> &PlayerInventory;

    /// Change the held hotbar slot (`0..HOTBAR_SIZE`).
    fn select_hotbar_slot(&mut self, slot: usize);

    /// Left-click a player inventory slot, swapping it with the cursor.
    fn click_slot(&mut self, slot: usize);

    fn start_breaking(&mut self, pos: Vec3i, face: BlockFace);

    /// Per-tick dig progress (arm swing).
    fn continue_breaking(&mut self);

    fn finish_breaking(&mut self, pos: Vec3i, face: BlockFace);

    /// Use the held item on `face` of the block at `against`.
    fn place_against(&mut self, against: Vec3i, face: BlockFace);

    fn mining_environment(&self) -> MiningEnvironment;
}

/// Aim the eyes at `target`. Returns whether the rotation changed.
pub fn look_at(bot: &mut dyn BotConnection, target: Vec3d) -> bool {
    let pose = bot.pose();
    let (yaw, pitch) = pose.eye_position().rotation_towards(target);
    if yaw == pose.yaw && pitch == pose.pitch {
        return false;
    }
    bot.set_rotation(yaw, pitch);
    true
}
