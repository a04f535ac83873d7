// Movement cost constants and the block mining-time model.
//
// Costs are expressed in "blocks walked": walking one block straight costs
// 1, and every other action is converted into the same unit through
// `TICKS_PER_BLOCK` (game ticks a player needs to walk one block at normal
// speed). A searcher can therefore use plain Euclidean distance as an
// admissible heuristic.
//
// `required_mining_ticks()` reproduces the game's dig-speed formula: the
// held tool's speed if it is the right kind for the block, the efficiency
// bonus, haste and mining fatigue, the in-water and airborne penalties, and
// the harvest divisor (30 when the block will drop, 100 otherwise). The
// result is the number of ticks the break packet sequence must span.
//
// See also: `inventory.rs` for the per-snapshot memoization of the best
// tool per block type, `block_break.rs` which recomputes ticks with the
// live mining environment just before breaking.

use crate::block::{BlockRegistry, BlockTypeId};
use crate::inventory::ItemStack;

/// A normal server runs at 20 ticks per second.
pub const TICKS_PER_SECOND: f64 = 20.0;
/// Normal player walking speed in blocks per second.
pub const BLOCKS_PER_SECOND: f64 = 4.317;
pub const TICKS_PER_BLOCK: f64 = TICKS_PER_SECOND / BLOCKS_PER_SECOND;

pub const STRAIGHT: f64 = 1.0;
pub const DIAGONAL: f64 = std::f64::consts::SQRT_2;

/// Default extra cost per broken block, so walking around is preferred.
pub const BREAK_BLOCK_PENALTY: f64 = 2.0;
/// Default extra cost per placed block.
pub const PLACE_BLOCK_PENALTY: f64 = 5.0;

/// ~9 ticks to jump, decelerate and land one block higher.
pub const JUMP_UP_BLOCK: f64 = 9.0 / TICKS_PER_BLOCK;
/// ~12 ticks to jump and land on the same level.
pub const JUMP_LAND_GROUND: f64 = 12.0 / TICKS_PER_BLOCK;
/// A gap jump is a full jump plus two blocks of forward travel.
pub const ONE_GAP_JUMP: f64 = JUMP_LAND_GROUND + STRAIGHT + STRAIGHT;

pub const FALL_1: f64 = 5.63 / TICKS_PER_BLOCK;
pub const FALL_2: f64 = 7.79 / TICKS_PER_BLOCK;
pub const FALL_3: f64 = 9.48 / TICKS_PER_BLOCK;

/// Sliding around a solid corner is closer to walking two blocks than to
/// the straight diagonal.
pub const CORNER_SLIDE: f64 = 2.0 - DIAGONAL;

/// Jump in place and place a block beneath, given a place penalty.
pub fn tower_cost(place_penalty: f64) -> f64 {
    JUMP_UP_BLOCK + place_penalty
}

/// Fall cost by blocks dropped; `None` beyond three.
pub fn fall_cost(blocks: u32) -> Option<f64> {
    match blocks {
        1 => Some(FALL_1),
        2 => Some(FALL_2),
        3 => Some(FALL_3),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Mining time
// ---------------------------------------------------------------------------

/// Player state that affects dig speed. Planning uses `default()`: on the
/// ground, dry, no effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MiningEnvironment {
    pub on_ground: bool,
    pub eye_in_water: bool,
    pub aqua_affinity: bool,
    /// Haste amplifier (0 = Haste I).
    pub haste: Option<u8>,
    /// Mining fatigue amplifier (0 = Mining Fatigue I).
    pub mining_fatigue: Option<u8>,
}

impl Default for MiningEnvironment {
    fn default() -> Self {
        Self {
            on_ground: true,
            eye_in_water: false,
            aqua_affinity: false,
            haste: None,
            mining_fatigue: None,
        }
    }
}

/// Absorbs f32 hardness values like 0.6 that widen to just above the exact
/// decimal.
const TICK_ROUNDING_SLACK: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickResult {
    pub ticks: u32,
    /// The held tool harvests the block, so it drops its item.
    pub correct_tool: bool,
}

/// Whether `tool` (or the empty hand) harvests a block of type `block`.
pub fn has_correct_tool_for_drops(
    registry: &BlockRegistry,
    tool: Option<&ItemStack>,
    block: BlockTypeId,
) -> bool {
    let ty = registry.block_type(block);
    if !ty.requires_correct_tool {
        return true;
    }
    let Some(spec) = tool.and_then(|s| registry.item(s.item)).and_then(|i| i.tool) else {
        return false;
    };
    ty.harvest_tool == Some(spec.kind) && spec.tier >= ty.harvest_tier
}

/// Game ticks needed to break `block` holding `tool`. `None` for
/// unbreakable blocks.
pub fn required_mining_ticks(
    registry: &BlockRegistry,
    tool: Option<&ItemStack>,
    block: BlockTypeId,
    env: &MiningEnvironment,
) -> Option<TickResult> {
    let ty = registry.block_type(block);
    if ty.destroy_time < 0.0 {
        return None;
    }
    let correct_tool = has_correct_tool_for_drops(registry, tool, block);
    if ty.destroy_time == 0.0 {
        return Some(TickResult {
            ticks: 0,
            correct_tool,
        });
    }

    let mut speed = 1.0f64;
    if let Some(stack) = tool
        && let Some(spec) = registry.item(stack.item).and_then(|i| i.tool)
        && ty.harvest_tool == Some(spec.kind)
    {
        speed = f64::from(spec.speed);
    }
    if speed > 1.0
        && let Some(efficiency) = tool.map(|s| s.efficiency).filter(|&e| e > 0)
    {
        let level = f64::from(efficiency);
        speed += level * level + 1.0;
    }
    if let Some(amp) = env.haste {
        speed *= 1.0 + 0.2 * (f64::from(amp) + 1.0);
    }
    if let Some(amp) = env.mining_fatigue {
        speed *= match amp {
            0 => 0.3,
            1 => 0.09,
            2 => 0.0027,
            _ => 8.1e-4,
        };
    }
    if env.eye_in_water && !env.aqua_affinity {
        speed /= 5.0;
    }
    if !env.on_ground {
        speed /= 5.0;
    }

    // Per-tick progress is `speed / destroy_time / divisor`; a block whose
    // progress reaches 1 in a single tick breaks instantly.
    let divisor = if correct_tool { 30.0 } else { 100.0 };
    let raw_ticks = f64::from(ty.destroy_time) * divisor / speed;
    let ticks = if raw_ticks <= 1.0 {
        0
    } else {
        (raw_ticks - TICK_ROUNDING_SLACK).ceil() as u32
    };
    Some(TickResult {
        ticks,
        correct_tool,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(registry: &BlockRegistry, name: &str) -> ItemStack {
        ItemStack::new(registry.item_by_name(name).unwrap(), 1)
    }

    #[test]
    fn stone_by_hand_and_with_pickaxe() {
        let registry = BlockRegistry::standard();
        let stone = registry.block_by_name("stone").unwrap();
        let env = MiningEnvironment::default();

        let hand = required_mining_ticks(&registry, None, stone, &env).unwrap();
        assert_eq!(hand.ticks, 150);
        assert!(!hand.correct_tool);

        let pick = stack(&registry, "wooden_pickaxe");
        let wooden = required_mining_ticks(&registry, Some(&pick), stone, &env).unwrap();
        assert_eq!(wooden.ticks, 23);
        assert!(wooden.correct_tool);
    }

    #[test]
    fn wrong_tool_kind_gets_no_speed() {
        let registry = BlockRegistry::standard();
        let stone = registry.block_by_name("stone").unwrap();
        let shovel = stack(&registry, "iron_shovel");
        let env = MiningEnvironment::default();
        let with_shovel = required_mining_ticks(&registry, Some(&shovel), stone, &env).unwrap();
        let by_hand = required_mining_ticks(&registry, None, stone, &env).unwrap();
        assert_eq!(with_shovel, by_hand);
    }

    #[test]
    fn obsidian_needs_diamond_tier_for_drops() {
        let registry = BlockRegistry::standard();
        let obsidian = registry.block_by_name("obsidian").unwrap();
        let iron = stack(&registry, "iron_pickaxe");
        let diamond = stack(&registry, "diamond_pickaxe");
        assert!(!has_correct_tool_for_drops(&registry, Some(&iron), obsidian));
        assert!(has_correct_tool_for_drops(&registry, Some(&diamond), obsidian));
    }

    #[test]
    fn unbreakable_and_instant_blocks() {
        let registry = BlockRegistry::standard();
        let env = MiningEnvironment::default();
        let bedrock = registry.block_by_name("bedrock").unwrap();
        assert!(required_mining_ticks(&registry, None, bedrock, &env).is_none());
        let grass = registry.block_by_name("short_grass").unwrap();
        assert_eq!(
            required_mining_ticks(&registry, None, grass, &env).unwrap().ticks,
            0
        );
    }

    #[test]
    fn airborne_and_underwater_are_slower() {
        let registry = BlockRegistry::standard();
        let dirt = registry.block_by_name("dirt").unwrap();
        let ground = MiningEnvironment::default();
        let base = required_mining_ticks(&registry, None, dirt, &ground)
            .unwrap()
            .ticks;
        let airborne = MiningEnvironment {
            on_ground: false,
            ..ground
        };
        let swimming = MiningEnvironment {
            eye_in_water: true,
            ..ground
        };
        let air_ticks = required_mining_ticks(&registry, None, dirt, &airborne)
            .unwrap()
            .ticks;
        let water_ticks = required_mining_ticks(&registry, None, dirt, &swimming)
            .unwrap()
            .ticks;
        assert_eq!(air_ticks, base * 5);
        assert_eq!(water_ticks, base * 5);
    }

    #[test]
    fn efficiency_and_haste_speed_up() {
        let registry = BlockRegistry::standard();
        let stone = registry.block_by_name("stone").unwrap();
        let env = MiningEnvironment::default();
        let plain = stack(&registry, "iron_pickaxe");
        let mut enchanted = plain;
        enchanted.efficiency = 3;
        let hasted = MiningEnvironment {
            haste: Some(1),
            ..env
        };
        let base = required_mining_ticks(&registry, Some(&plain), stone, &env)
            .unwrap()
            .ticks;
        let eff = required_mining_ticks(&registry, Some(&enchanted), stone, &env)
            .unwrap()
            .ticks;
        let haste = required_mining_ticks(&registry, Some(&plain), stone, &hasted)
            .unwrap()
            .ticks;
        assert!(eff < base);
        assert!(haste < base);
    }

    #[test]
    fn cost_constants_are_consistent() {
        assert!((tower_cost(PLACE_BLOCK_PENALTY) - (JUMP_UP_BLOCK + 5.0)).abs() < 1e-12);
        assert!(ONE_GAP_JUMP > 2.0 * STRAIGHT);
        assert!(FALL_1 < FALL_2 && FALL_2 < FALL_3);
        assert!((DIAGONAL + CORNER_SLIDE - 2.0).abs() < 1e-12);
        assert_eq!(fall_cost(2), Some(FALL_2));
        assert_eq!(fall_cost(4), None);
    }
}
